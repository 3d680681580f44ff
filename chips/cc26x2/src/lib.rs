// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Radio support for the CC13x2/CC26x2 family: the command structures the
//! RF Core firmware executes and the doorbell used to hand them over.
#![no_std]

#[macro_use]
extern crate bitfield;

pub mod radio;
pub mod rfc;
