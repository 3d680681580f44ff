// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! In-memory register blocks for host tests.
//!
//! Only built with the `fake` feature, which the chip crates enable for
//! their dev builds.

extern crate std;

use crate::StaticRef;
use std::boxed::Box;

/// Leak a zeroed register block and wrap it like an MMIO base address.
/// `T` must be a register block, which is valid when all zeroes.
pub fn registers<T>() -> StaticRef<T> {
    // SAFETY: register blocks are built from plain integer cells.
    let block: *mut T = Box::into_raw(Box::new(unsafe { core::mem::zeroed::<T>() }));
    unsafe { StaticRef::new(block) }
}

fn word<T>(base: &StaticRef<T>, offset: usize) -> *mut u32 {
    assert!(
        offset % 4 == 0 && offset + 4 <= core::mem::size_of::<T>(),
        "offset {:#x} outside the register block",
        offset
    );
    base.as_ptr().cast::<u8>().wrapping_add(offset).cast::<u32>().cast_mut()
}

/// Raw word at `offset` bytes from the start of the block.
pub fn read<T>(base: &StaticRef<T>, offset: usize) -> u32 {
    unsafe { core::ptr::read_volatile(word(base, offset)) }
}

/// Store a raw word, used to emulate hardware-owned registers.
pub fn write<T>(base: &StaticRef<T>, offset: usize, value: u32) {
    unsafe { core::ptr::write_volatile(word(base, offset), value) }
}
