// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripheral drivers for the nRF52 family.
#![no_std]
#![recursion_limit = "256"]

pub mod usbd;

pub use nrf5x::{lpcomp, peripheral, pinmux, timer, twi, uart};
