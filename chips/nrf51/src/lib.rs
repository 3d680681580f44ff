// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripheral drivers for the nRF51 family.
//!
//! The peripherals the nRF51 shares with the nRF52 live in `nrf5x` and are
//! re-exported here.

#![no_std]

pub mod adc;

pub use nrf5x::{lpcomp, peripheral, pinmux, timer, twi, uart};
