// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Task and event registers addressed by offset.
//!
//! Every nRF5x peripheral places its tasks at the start of its register block
//! and its events at `0x100`. Each register is one 32-bit word: writing `1`
//! to a task starts it, and an event reads non-zero once it has fired until
//! software writes `0` back. The PPI needs the absolute address of these
//! registers, so tasks and events are identified by their byte offset from
//! the peripheral base address rather than by a struct field.

use hal_utils::registers::interfaces::{Readable, Writeable};
use hal_utils::registers::ReadWrite;
use hal_utils::StaticRef;

/// A task or event register, identified by its byte offset from the
/// peripheral base address.
///
/// # Safety
///
/// `offset()` must name a 32-bit task or event word inside the register
/// block the value is used with, for every value of the implementing type.
pub unsafe trait RegisterOffset: Copy {
    fn offset(self) -> usize;
}

/// Implement [`RegisterOffset`] for `#[repr(usize)]` enums whose
/// discriminants are register offsets. The `unsafe` marker carries the
/// promise the trait requires.
#[macro_export]
macro_rules! register_offsets {
    (unsafe $($name:ty),+ $(,)?) => {
        $(
            unsafe impl $crate::peripheral::RegisterOffset for $name {
                fn offset(self) -> usize {
                    self as usize
                }
            }
        )+
    };
}

fn register_at<R, O: RegisterOffset>(base: &StaticRef<R>, reg: O) -> &ReadWrite<u32> {
    debug_assert!(reg.offset() + 4 <= core::mem::size_of::<R>());
    // SAFETY: `RegisterOffset` implementations only name words inside the
    // block `base` points at.
    unsafe {
        &*base
            .as_ptr()
            .cast::<u8>()
            .add(reg.offset())
            .cast::<ReadWrite<u32>>()
    }
}

/// Start `task`.
pub fn task_trigger<R, O: RegisterOffset>(base: &StaticRef<R>, task: O) {
    register_at(base, task).set(1);
}

/// Absolute address of `task`, for use as a PPI task endpoint.
pub fn task_address_get<R, O: RegisterOffset>(base: &StaticRef<R>, task: O) -> u32 {
    (base.as_ptr() as usize + task.offset()) as u32
}

/// Clear `event`.
pub fn event_clear<R, O: RegisterOffset>(base: &StaticRef<R>, event: O) {
    let register = register_at(base, event);
    register.set(0);
    // Read back so the write has left the Cortex-M4 write buffer before the
    // interrupt handler returns.
    let _ = register.get();
}

/// Whether `event` has fired since it was last cleared.
pub fn event_check<R, O: RegisterOffset>(base: &StaticRef<R>, event: O) -> bool {
    register_at(base, event).get() != 0
}

/// Absolute address of `event`, for use as a PPI event endpoint.
pub fn event_address_get<R, O: RegisterOffset>(base: &StaticRef<R>, event: O) -> u32 {
    (base.as_ptr() as usize + event.offset()) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_utils::fake;

    #[repr(C)]
    struct Block {
        words: [u32; 0x48],
    }

    #[derive(Copy, Clone)]
    #[repr(usize)]
    enum Reg {
        Start = 0x004,
        Ready = 0x104,
    }

    register_offsets!(unsafe Reg);

    #[test]
    fn task_trigger_writes_one() {
        let base = fake::registers::<Block>();
        task_trigger(&base, Reg::Start);
        assert_eq!(fake::read(&base, 0x004), 1);
        assert_eq!(fake::read(&base, 0x000), 0);
    }

    #[test]
    fn event_clear_and_check() {
        let base = fake::registers::<Block>();
        assert!(!event_check(&base, Reg::Ready));
        fake::write(&base, 0x104, 1);
        assert!(event_check(&base, Reg::Ready));
        event_clear(&base, Reg::Ready);
        assert!(!event_check(&base, Reg::Ready));
    }

    #[test]
    fn addresses_are_base_plus_offset() {
        let base = fake::registers::<Block>();
        let start = base.as_ptr() as usize;
        assert_eq!(task_address_get(&base, Reg::Start), (start + 4) as u32);
        assert_eq!(event_address_get(&base, Reg::Ready), (start + 0x104) as u32);
    }
}
