// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Analog to digital converter (ADC) of the nRF51
//!
//! A successive approximation converter with one conversion at a time. The
//! input pin is picked with the PSEL bitmask in CONFIG, START begins a
//! conversion, and END fires when RESULT holds the sample.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let adc = Adc::new(ADC_BASE);
//! adc.configure(&AdcConfig::default());
//! let sample = adc.convert_single(Input::AIN2);
//! ```

use hal_utils::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hal_utils::registers::{
    register_bitfields, register_structs, FieldValue, ReadOnly, ReadWrite, WriteOnly,
};
use hal_utils::StaticRef;
use nrf5x::peripheral;

register_structs! {
    pub AdcRegisters {
        /// Start an ADC conversion
        (0x000 => tasks_start: WriteOnly<u32>),
        /// Stop ADC
        (0x004 => tasks_stop: WriteOnly<u32>),
        (0x008 => _reserved0),
        /// ADC conversion complete
        (0x100 => events_end: ReadWrite<u32>),
        (0x104 => _reserved1),
        (0x304 => intenset: ReadWrite<u32, Interrupt::Register>),
        (0x308 => intenclr: ReadWrite<u32, Interrupt::Register>),
        (0x30C => _reserved2),
        /// ADC busy register
        (0x400 => busy: ReadOnly<u32, Busy::Register>),
        (0x404 => _reserved3),
        (0x500 => enable: ReadWrite<u32, Enable::Register>),
        /// ADC configuration register
        (0x504 => config: ReadWrite<u32, Config::Register>),
        /// Result of ADC conversion
        (0x508 => result: ReadOnly<u32>),
        (0x50C => @END),
    }
}

register_bitfields![u32,
    pub Interrupt [
        END OFFSET(0) NUMBITS(1)
    ],
    Busy [
        BUSY OFFSET(0) NUMBITS(1)
    ],
    Enable [
        ENABLE OFFSET(0) NUMBITS(2) [
            Disabled = 0,
            Enabled = 1
        ]
    ],
    Config [
        /// Bit resolution
        RES OFFSET(0) NUMBITS(2) [],
        /// Input selection and prescaling
        INPSEL OFFSET(2) NUMBITS(3) [],
        /// Reference selection
        REFSEL OFFSET(5) NUMBITS(2) [],
        /// Analog input pins, one bit per AIN
        PSEL OFFSET(8) NUMBITS(8) [],
        /// External reference pin
        EXTREFSEL OFFSET(16) NUMBITS(2) []
    ]
];

pub const ADC_BASE: StaticRef<AdcRegisters> =
    unsafe { StaticRef::new(0x40007000 as *const AdcRegisters) };

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum AdcTask {
    Start = 0x000,
    Stop = 0x004,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum AdcEvent {
    End = 0x100,
}

nrf5x::register_offsets!(unsafe AdcTask, AdcEvent);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Resolution {
    Bit8 = 0,
    Bit9 = 1,
    Bit10 = 2,
}

/// INPSEL: what is sampled and how it is scaled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Scaling {
    InputFullScale = 0,
    InputTwoThirds = 1,
    InputOneThird = 2,
    SupplyTwoThirds = 5,
    SupplyOneThird = 6,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ExtRef {
    AnalogReference0 = 1,
    AnalogReference1 = 2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// 1.2 V band gap
    Vbg,
    External(ExtRef),
    SupplyOneHalf,
    SupplyOneThird,
}

impl Reference {
    fn refsel(self) -> u32 {
        match self {
            Reference::Vbg => 0,
            Reference::External(_) => 1,
            Reference::SupplyOneHalf => 2,
            Reference::SupplyOneThird => 3,
        }
    }

    fn extrefsel(self) -> u32 {
        match self {
            Reference::External(pin) => pin as u32,
            _ => 0,
        }
    }
}

/// PSEL values; the field is a bitmask with at most one input set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Input {
    Disabled = 0,
    AIN0 = 1 << 0,
    AIN1 = 1 << 1,
    AIN2 = 1 << 2,
    AIN3 = 1 << 3,
    AIN4 = 1 << 4,
    AIN5 = 1 << 5,
    AIN6 = 1 << 6,
    AIN7 = 1 << 7,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AdcConfig {
    pub resolution: Resolution,
    pub scaling: Scaling,
    pub reference: Reference,
}

impl Default for AdcConfig {
    fn default() -> Self {
        AdcConfig {
            resolution: Resolution::Bit10,
            scaling: Scaling::InputFullScale,
            reference: Reference::Vbg,
        }
    }
}

pub struct Adc {
    registers: StaticRef<AdcRegisters>,
}

impl Adc {
    pub const fn new(registers: StaticRef<AdcRegisters>) -> Adc {
        Adc { registers }
    }

    /// Write a complete CONFIG word. The input is left disconnected; pick
    /// one with `input_select`.
    pub fn configure(&self, config: &AdcConfig) {
        self.input_select(Input::Disabled);
        self.registers.config.write(
            Config::RES.val(config.resolution as u32)
                + Config::INPSEL.val(config.scaling as u32)
                + Config::REFSEL.val(config.reference.refsel())
                + Config::EXTREFSEL.val(config.reference.extrefsel())
                + Config::PSEL.val(Input::Disabled as u32),
        );
        log::debug!("adc configured: {:?}", config);
    }

    /// Connect `input` to the converter. Any input other than `Disabled`
    /// also enables the ADC.
    pub fn input_select(&self, input: Input) {
        self.registers.config.modify(Config::PSEL.val(input as u32));
        if input == Input::Disabled {
            self.disable();
        } else {
            self.enable();
        }
    }

    pub fn task_trigger(&self, task: AdcTask) {
        peripheral::task_trigger(&self.registers, task);
    }

    pub fn task_address_get(&self, task: AdcTask) -> u32 {
        peripheral::task_address_get(&self.registers, task)
    }

    pub fn event_clear(&self, event: AdcEvent) {
        peripheral::event_clear(&self.registers, event);
    }

    pub fn event_check(&self, event: AdcEvent) -> bool {
        peripheral::event_check(&self.registers, event)
    }

    pub fn event_address_get(&self, event: AdcEvent) -> u32 {
        peripheral::event_address_get(&self.registers, event)
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

    /// Whether a conversion is in progress.
    pub fn busy_check(&self) -> bool {
        self.registers.busy.is_set(Busy::BUSY)
    }

    pub fn enable(&self) {
        self.registers.enable.write(Enable::ENABLE::Enabled);
    }

    pub fn disable(&self) {
        self.registers.enable.write(Enable::ENABLE::Disabled);
    }

    pub fn enable_check(&self) -> bool {
        self.registers.enable.matches_all(Enable::ENABLE::Enabled)
    }

    pub fn result_get(&self) -> i32 {
        self.registers.result.get() as i32
    }

    pub fn start(&self) {
        self.task_trigger(AdcTask::Start);
    }

    pub fn stop(&self) {
        self.task_trigger(AdcTask::Stop);
    }

    /// Whether the last conversion has finished.
    pub fn conversion_finished(&self) -> bool {
        self.event_check(AdcEvent::End)
    }

    /// Sample `input` once and return the result.
    ///
    /// Blocks until the END event fires. There is no timeout: the datasheet
    /// guarantees END a fixed number of cycles after START.
    pub fn convert_single(&self, input: Input) -> i32 {
        self.input_select(input);
        self.start();
        while !self.conversion_finished() {}
        self.event_clear(AdcEvent::End);
        let value = self.result_get();
        self.stop();
        log::trace!("adc {:?} -> {}", input, value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_utils::fake;
    use core::mem::offset_of;
    use nrf5x::peripheral::RegisterOffset;

    fn adc() -> Adc {
        Adc::new(fake::registers::<AdcRegisters>())
    }

    #[test]
    fn offsets_match_register_block() {
        assert_eq!(AdcTask::Stop.offset(), offset_of!(AdcRegisters, tasks_stop));
        assert_eq!(AdcEvent::End.offset(), offset_of!(AdcRegisters, events_end));
        assert_eq!(offset_of!(AdcRegisters, busy), 0x400);
        assert_eq!(offset_of!(AdcRegisters, config), 0x504);
        assert_eq!(offset_of!(AdcRegisters, result), 0x508);
    }

    #[test]
    fn configure_packs_config_word() {
        let adc = adc();
        fake::write(&adc.registers, 0x504, 0xFFFF_FFFF);
        adc.configure(&AdcConfig {
            resolution: Resolution::Bit9,
            scaling: Scaling::SupplyOneThird,
            reference: Reference::SupplyOneHalf,
        });
        // RES=1, INPSEL=6, REFSEL=2, PSEL cleared, no external reference
        assert_eq!(fake::read(&adc.registers, 0x504), 1 | (6 << 2) | (2 << 5));
        assert!(!adc.enable_check());
    }

    #[test]
    fn configure_external_reference() {
        let adc = adc();
        adc.configure(&AdcConfig {
            reference: Reference::External(ExtRef::AnalogReference1),
            ..AdcConfig::default()
        });
        assert_eq!(fake::read(&adc.registers, 0x504), 2 | (1 << 5) | (2 << 16));
    }

    #[test]
    fn input_select_preserves_config_and_enables() {
        let adc = adc();
        adc.configure(&AdcConfig::default());
        adc.input_select(Input::AIN6);
        assert_eq!(fake::read(&adc.registers, 0x504), 2 | (0x40 << 8));
        assert!(adc.enable_check());
        adc.input_select(Input::Disabled);
        assert_eq!(fake::read(&adc.registers, 0x504), 2);
        assert!(!adc.enable_check());
    }

    #[test]
    fn convert_single_runs_start_end_stop() {
        let adc = adc();
        adc.configure(&AdcConfig::default());
        // The conversion has already completed as far as the fake block is
        // concerned.
        fake::write(&adc.registers, 0x100, 1);
        fake::write(&adc.registers, 0x508, 0x2A5);

        assert_eq!(adc.convert_single(Input::AIN2), 0x2A5);

        assert_eq!(fake::read(&adc.registers, 0x000), 1);
        assert_eq!(fake::read(&adc.registers, 0x004), 1);
        assert_eq!(fake::read(&adc.registers, 0x100), 0);
        assert_eq!((fake::read(&adc.registers, 0x504) >> 8) & 0xFF, 1 << 2);
        assert!(adc.enable_check());
    }

    #[test]
    fn busy_and_interrupts() {
        let adc = adc();
        assert!(!adc.busy_check());
        fake::write(&adc.registers, 0x400, 1);
        assert!(adc.busy_check());

        adc.int_enable(Interrupt::END::SET);
        assert_eq!(fake::read(&adc.registers, 0x304), 1);
        assert!(adc.int_enable_check(Interrupt::END::SET));
        adc.int_disable(Interrupt::END::SET);
        assert_eq!(fake::read(&adc.registers, 0x308), 1);
    }
}
