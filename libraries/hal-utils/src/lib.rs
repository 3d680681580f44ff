// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Shared support types for the peripheral access crates.
//!
//! Every chip crate in this workspace reaches its memory-mapped peripherals
//! through a [`StaticRef`] and reports failures with an [`ErrorCode`].

#![no_std]

pub mod errorcode;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
mod static_ref;

pub use crate::errorcode::ErrorCode;
pub use crate::static_ref::StaticRef;

/// Re-export of the `tock-registers` crate items used by the chip crates.
pub mod registers {
    pub use tock_registers::fields::{Field, FieldValue};
    pub use tock_registers::interfaces;
    pub use tock_registers::registers::InMemoryRegister;
    pub use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
    pub use tock_registers::{register_bitfields, register_structs};
    pub use tock_registers::{LocalRegisterCopy, RegisterLongName};
}

/// Re-export of the `tock-cells` types used to hold driver clients.
pub mod cells {
    pub use tock_cells::optional_cell::OptionalCell;
}
