// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! RF Core command structures.
//!
//! The RF Core is a Cortex-M0 running TI firmware. The system CPU builds a
//! command in RAM and posts its address to the doorbell; the firmware reads
//! the structure, executes it and writes progress back into its `status`
//! field. Every structure here therefore has the exact C layout the firmware
//! expects: natural alignment, 4-byte aligned start, pointers stored as
//! 32-bit addresses.

pub mod mailbox;

pub mod ble;
pub mod common;
pub mod ieee;
pub mod prop;
