// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripherals shared by the nRF51 and nRF52 families.

#![no_std]

pub mod lpcomp;
pub mod peripheral;
pub mod pinmux;
pub mod timer;
pub mod twi;
pub mod uart;
