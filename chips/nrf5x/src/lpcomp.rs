// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Low-power comparator (LPCOMP)
//!
//! Compares one analog input against a fraction of VDD or an external
//! reference and raises UP, DOWN or CROSS events as the input moves past the
//! threshold. The comparator also runs in System OFF where ANADETECT selects
//! which crossing wakes the chip.

use hal_utils::registers::interfaces::{Readable, Writeable};
use hal_utils::registers::{
    register_bitfields, register_structs, FieldValue, ReadOnly, ReadWrite, WriteOnly,
};
use hal_utils::StaticRef;

use crate::peripheral;

register_structs! {
    pub LpcompRegisters {
        (0x000 => tasks_start: WriteOnly<u32>),
        (0x004 => tasks_stop: WriteOnly<u32>),
        (0x008 => tasks_sample: WriteOnly<u32>),
        (0x00C => _reserved0),
        (0x100 => events_ready: ReadWrite<u32>),
        (0x104 => events_down: ReadWrite<u32>),
        (0x108 => events_up: ReadWrite<u32>),
        (0x10C => events_cross: ReadWrite<u32>),
        (0x110 => _reserved1),
        (0x200 => shorts: ReadWrite<u32, Shorts::Register>),
        (0x204 => _reserved2),
        (0x304 => intenset: ReadWrite<u32, Interrupt::Register>),
        (0x308 => intenclr: ReadWrite<u32, Interrupt::Register>),
        (0x30C => _reserved3),
        /// Result of last compare, input above threshold when set
        (0x400 => result: ReadOnly<u32, CompResult::Register>),
        (0x404 => _reserved4),
        (0x500 => enable: ReadWrite<u32, Enable::Register>),
        (0x504 => psel: ReadWrite<u32, Psel::Register>),
        (0x508 => refsel: ReadWrite<u32, RefSel::Register>),
        (0x50C => extrefsel: ReadWrite<u32, ExtRefSel::Register>),
        (0x510 => _reserved5),
        (0x520 => anadetect: ReadWrite<u32, AnaDetect::Register>),
        (0x524 => _reserved6),
        /// nRF52 only
        (0x538 => hyst: ReadWrite<u32, Hyst::Register>),
        (0x53C => @END),
    }
}

register_bitfields![u32,
    pub Shorts [
        READY_SAMPLE OFFSET(0) NUMBITS(1),
        READY_STOP OFFSET(1) NUMBITS(1),
        DOWN_STOP OFFSET(2) NUMBITS(1),
        UP_STOP OFFSET(3) NUMBITS(1),
        CROSS_STOP OFFSET(4) NUMBITS(1)
    ],
    pub Interrupt [
        READY OFFSET(0) NUMBITS(1),
        DOWN OFFSET(1) NUMBITS(1),
        UP OFFSET(2) NUMBITS(1),
        CROSS OFFSET(3) NUMBITS(1)
    ],
    CompResult [
        ABOVE OFFSET(0) NUMBITS(1)
    ],
    Enable [
        ENABLE OFFSET(0) NUMBITS(2) [
            Disabled = 0,
            Enabled = 1
        ]
    ],
    Psel [
        PSEL OFFSET(0) NUMBITS(3)
    ],
    RefSel [
        REFSEL OFFSET(0) NUMBITS(4)
    ],
    ExtRefSel [
        EXTREFSEL OFFSET(0) NUMBITS(1)
    ],
    AnaDetect [
        ANADETECT OFFSET(0) NUMBITS(2)
    ],
    Hyst [
        HYST OFFSET(0) NUMBITS(1)
    ]
];

pub const LPCOMP_BASE: StaticRef<LpcompRegisters> =
    unsafe { StaticRef::new(0x40013000 as *const LpcompRegisters) };

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum LpcompTask {
    Start = 0x000,
    Stop = 0x004,
    Sample = 0x008,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum LpcompEvent {
    Ready = 0x100,
    Down = 0x104,
    Up = 0x108,
    Cross = 0x10C,
}

crate::register_offsets!(unsafe LpcompTask, LpcompEvent);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ExtRef {
    AnalogReference0 = 0,
    AnalogReference1 = 1,
}

/// Comparator threshold.
///
/// The sixteenth steps are only available on the nRF52.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    Supply1_8,
    Supply2_8,
    Supply3_8,
    Supply4_8,
    Supply5_8,
    Supply6_8,
    Supply7_8,
    External(ExtRef),
    Supply1_16,
    Supply3_16,
    Supply5_16,
    Supply7_16,
    Supply9_16,
    Supply11_16,
    Supply13_16,
    Supply15_16,
}

impl Reference {
    /// REFSEL encoding.
    pub fn refsel(self) -> u32 {
        match self {
            Reference::Supply1_8 => 0,
            Reference::Supply2_8 => 1,
            Reference::Supply3_8 => 2,
            Reference::Supply4_8 => 3,
            Reference::Supply5_8 => 4,
            Reference::Supply6_8 => 5,
            Reference::Supply7_8 => 6,
            Reference::External(_) => 7,
            Reference::Supply1_16 => 8,
            Reference::Supply3_16 => 9,
            Reference::Supply5_16 => 10,
            Reference::Supply7_16 => 11,
            Reference::Supply9_16 => 12,
            Reference::Supply11_16 => 13,
            Reference::Supply13_16 => 14,
            Reference::Supply15_16 => 15,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Input {
    AIN0 = 0,
    AIN1 = 1,
    AIN2 = 2,
    AIN3 = 3,
    AIN4 = 4,
    AIN5 = 5,
    AIN6 = 6,
    AIN7 = 7,
}

/// Which crossing generates the ANADETECT signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Detect {
    Cross = 0,
    Up = 1,
    Down = 2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Hysteresis {
    NoHyst = 0,
    Hyst50mV = 1,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LpcompConfig {
    pub reference: Reference,
    pub detection: Detect,
    /// `None` leaves HYST alone. The register only exists on nRF52.
    pub hysteresis: Option<Hysteresis>,
}

impl Default for LpcompConfig {
    fn default() -> Self {
        LpcompConfig {
            reference: Reference::Supply4_8,
            detection: Detect::Cross,
            hysteresis: None,
        }
    }
}

pub struct Lpcomp {
    registers: StaticRef<LpcompRegisters>,
}

impl Lpcomp {
    pub const fn new(registers: StaticRef<LpcompRegisters>) -> Lpcomp {
        Lpcomp { registers }
    }

    /// Program threshold, detection and hysteresis. An external reference
    /// also selects the reference pin.
    pub fn configure(&self, config: &LpcompConfig) {
        if let Reference::External(pin) = config.reference {
            self.registers
                .extrefsel
                .write(ExtRefSel::EXTREFSEL.val(pin as u32));
        }
        self.registers
            .refsel
            .write(RefSel::REFSEL.val(config.reference.refsel()));
        self.registers
            .anadetect
            .write(AnaDetect::ANADETECT.val(config.detection as u32));
        if let Some(hysteresis) = config.hysteresis {
            self.registers
                .hyst
                .write(Hyst::HYST.val(hysteresis as u32));
        }
        log::debug!("lpcomp configured: {:?}", config);
    }

    pub fn input_select(&self, input: Input) {
        self.registers.psel.write(Psel::PSEL.val(input as u32));
    }

    pub fn enable(&self) {
        self.registers.enable.write(Enable::ENABLE::Enabled);
    }

    pub fn disable(&self) {
        self.registers.enable.write(Enable::ENABLE::Disabled);
    }

    /// Whether the input was above the threshold at the last sample.
    pub fn result_get(&self) -> bool {
        self.registers.result.is_set(CompResult::ABOVE)
    }

    pub fn task_trigger(&self, task: LpcompTask) {
        peripheral::task_trigger(&self.registers, task);
    }

    pub fn task_address_get(&self, task: LpcompTask) -> u32 {
        peripheral::task_address_get(&self.registers, task)
    }

    pub fn event_clear(&self, event: LpcompEvent) {
        peripheral::event_clear(&self.registers, event);
    }

    pub fn event_check(&self, event: LpcompEvent) -> bool {
        peripheral::event_check(&self.registers, event)
    }

    pub fn event_address_get(&self, event: LpcompEvent) -> u32 {
        peripheral::event_address_get(&self.registers, event)
    }

    pub fn shorts_enable(&self, mask: FieldValue<u32, Shorts::Register>) {
        let shorts = self.registers.shorts.get();
        self.registers.shorts.set(shorts | mask.value);
    }

    pub fn shorts_disable(&self, mask: FieldValue<u32, Shorts::Register>) {
        let shorts = self.registers.shorts.get();
        self.registers.shorts.set(shorts & !mask.value);
    }

    pub fn int_enable(&self, mask: FieldValue<u32, Interrupt::Register>) {
        self.registers.intenset.write(mask);
    }

    pub fn int_disable(&self, mask: FieldValue<u32, Interrupt::Register>) {
        self.registers.intenclr.write(mask);
    }

    pub fn int_enable_check(&self, mask: FieldValue<u32, Interrupt::Register>) -> bool {
        self.registers.intenset.get() & mask.value != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_utils::fake;
    use crate::peripheral::RegisterOffset;
    use core::mem::offset_of;

    fn lpcomp() -> Lpcomp {
        Lpcomp::new(fake::registers::<LpcompRegisters>())
    }

    #[test]
    fn offsets_match_register_block() {
        assert_eq!(LpcompTask::Sample.offset(), offset_of!(LpcompRegisters, tasks_sample));
        assert_eq!(LpcompEvent::Cross.offset(), offset_of!(LpcompRegisters, events_cross));
        assert_eq!(offset_of!(LpcompRegisters, anadetect), 0x520);
        assert_eq!(offset_of!(LpcompRegisters, hyst), 0x538);
    }

    #[test]
    fn reference_encoding() {
        assert_eq!(Reference::Supply1_8.refsel(), 0);
        assert_eq!(Reference::Supply7_8.refsel(), 6);
        assert_eq!(Reference::External(ExtRef::AnalogReference1).refsel(), 7);
        assert_eq!(Reference::Supply1_16.refsel(), 8);
        assert_eq!(Reference::Supply15_16.refsel(), 15);
    }

    #[test]
    fn configure_supply_reference() {
        let lpcomp = lpcomp();
        lpcomp.configure(&LpcompConfig {
            reference: Reference::Supply3_8,
            detection: Detect::Up,
            hysteresis: Some(Hysteresis::Hyst50mV),
        });
        assert_eq!(fake::read(&lpcomp.registers, 0x508), 2);
        assert_eq!(fake::read(&lpcomp.registers, 0x50C), 0);
        assert_eq!(fake::read(&lpcomp.registers, 0x520), 1);
        assert_eq!(fake::read(&lpcomp.registers, 0x538), 1);
    }

    #[test]
    fn configure_external_reference() {
        let lpcomp = lpcomp();
        lpcomp.configure(&LpcompConfig {
            reference: Reference::External(ExtRef::AnalogReference1),
            ..LpcompConfig::default()
        });
        assert_eq!(fake::read(&lpcomp.registers, 0x508), 7);
        assert_eq!(fake::read(&lpcomp.registers, 0x50C), 1);
        assert_eq!(fake::read(&lpcomp.registers, 0x520), 0);
    }

    #[test]
    fn default_config_leaves_hysteresis_alone() {
        let lpcomp = lpcomp();
        fake::write(&lpcomp.registers, 0x538, 0xA5);
        lpcomp.configure(&LpcompConfig::default());
        assert_eq!(fake::read(&lpcomp.registers, 0x538), 0xA5);
        assert_eq!(fake::read(&lpcomp.registers, 0x508), 3);
    }

    #[test]
    fn sampling() {
        let lpcomp = lpcomp();
        lpcomp.input_select(Input::AIN5);
        lpcomp.enable();
        lpcomp.shorts_enable(Shorts::READY_SAMPLE::SET);
        lpcomp.int_enable(Interrupt::UP::SET + Interrupt::DOWN::SET);
        lpcomp.task_trigger(LpcompTask::Start);
        assert_eq!(fake::read(&lpcomp.registers, 0x504), 5);
        assert_eq!(fake::read(&lpcomp.registers, 0x500), 1);
        assert_eq!(fake::read(&lpcomp.registers, 0x200), 1);
        assert_eq!(fake::read(&lpcomp.registers, 0x304), 0b0110);
        assert_eq!(fake::read(&lpcomp.registers, 0x000), 1);

        assert!(!lpcomp.result_get());
        fake::write(&lpcomp.registers, 0x400, 1);
        assert!(lpcomp.result_get());
    }
}
