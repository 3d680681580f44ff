// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Timer/Counter driver for nRF5x
//!
//! The TIMER runs on the high-frequency clock divided by
//! `2^PRESCALER`. It either counts clock ticks (timer mode) or `COUNT` task
//! triggers (counter mode), and compares the running value against up to
//! six capture/compare registers. TIMER0..2 have four CC registers, TIMER3
//! and TIMER4 on the nRF52 have six.
//!
//! This module exposes the register level operations (tasks, events,
//! shortcuts, interrupts, mode and width selection) and a small [`Timer`]
//! driver that arms compare channels and forwards compare events to a
//! [`TimerClient`].

use core::convert::TryFrom;
use hal_utils::cells::OptionalCell;
use hal_utils::registers::interfaces::{Readable, Writeable};
use hal_utils::registers::{
    register_bitfields, register_structs, FieldValue, ReadWrite, WriteOnly,
};
use hal_utils::{ErrorCode, StaticRef};

use crate::peripheral;

/// Largest number of capture/compare registers on any instance.
pub const MAX_CC_CHANNELS: usize = 6;

register_structs! {
    pub TimerRegisters {
        /// Start Timer
        (0x000 => tasks_start: WriteOnly<u32>),
        /// Stop Timer
        (0x004 => tasks_stop: WriteOnly<u32>),
        /// Increment Timer (Counter mode only)
        (0x008 => tasks_count: WriteOnly<u32>),
        /// Clear time
        (0x00C => tasks_clear: WriteOnly<u32>),
        /// Shut down timer
        (0x010 => tasks_shutdown: WriteOnly<u32>),
        (0x014 => _reserved0),
        /// Capture Timer value to CC[n] register
        (0x040 => tasks_capture: [WriteOnly<u32>; MAX_CC_CHANNELS]),
        (0x058 => _reserved1),
        /// Compare event on CC[n] match
        (0x140 => events_compare: [ReadWrite<u32>; MAX_CC_CHANNELS]),
        (0x158 => _reserved2),
        /// Shortcut register
        (0x200 => shorts: ReadWrite<u32, Shorts::Register>),
        (0x204 => _reserved3),
        /// Enable interrupt
        (0x304 => intenset: ReadWrite<u32, Interrupt::Register>),
        /// Disable interrupt
        (0x308 => intenclr: ReadWrite<u32, Interrupt::Register>),
        (0x30C => _reserved4),
        /// Timer mode selection
        (0x504 => mode: ReadWrite<u32, Mode::Register>),
        /// Configure the number of bits used by the TIMER
        (0x508 => bitmode: ReadWrite<u32, BitMode::Register>),
        (0x50C => _reserved5),
        /// Timer prescaler register
        (0x510 => prescaler: ReadWrite<u32, Prescaler::Register>),
        (0x514 => _reserved6),
        /// Capture/Compare register n
        (0x540 => cc: [ReadWrite<u32>; MAX_CC_CHANNELS]),
        (0x558 => @END),
    }
}

register_bitfields![u32,
    /// Shortcuts, one bit per CC channel.
    pub Shorts [
        /// COMPARE[n] event clears the timer
        COMPARE_CLEAR OFFSET(0) NUMBITS(6) [],
        /// COMPARE[n] event stops the timer
        COMPARE_STOP OFFSET(8) NUMBITS(6) []
    ],
    /// Interrupts, one bit per CC channel.
    pub Interrupt [
        COMPARE OFFSET(16) NUMBITS(6) []
    ],
    Mode [
        MODE OFFSET(0) NUMBITS(2) [
            Timer = 0,
            Counter = 1,
            LowPowerCounter = 2
        ]
    ],
    BitMode [
        BITMODE OFFSET(0) NUMBITS(2) [
            Bit16 = 0,
            Bit08 = 1,
            Bit24 = 2,
            Bit32 = 3
        ]
    ],
    Prescaler [
        PRESCALER OFFSET(0) NUMBITS(4) []
    ]
];

pub const TIMER0_BASE: StaticRef<TimerRegisters> =
    unsafe { StaticRef::new(0x40008000 as *const TimerRegisters) };
pub const TIMER1_BASE: StaticRef<TimerRegisters> =
    unsafe { StaticRef::new(0x40009000 as *const TimerRegisters) };
pub const TIMER2_BASE: StaticRef<TimerRegisters> =
    unsafe { StaticRef::new(0x4000A000 as *const TimerRegisters) };
/// nRF52 only.
pub const TIMER3_BASE: StaticRef<TimerRegisters> =
    unsafe { StaticRef::new(0x4001A000 as *const TimerRegisters) };
/// nRF52 only.
pub const TIMER4_BASE: StaticRef<TimerRegisters> =
    unsafe { StaticRef::new(0x4001B000 as *const TimerRegisters) };

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum TimerTask {
    Start = 0x000,
    Stop = 0x004,
    Count = 0x008,
    Clear = 0x00C,
    Shutdown = 0x010,
    Capture0 = 0x040,
    Capture1 = 0x044,
    Capture2 = 0x048,
    Capture3 = 0x04C,
    Capture4 = 0x050,
    Capture5 = 0x054,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum TimerEvent {
    Compare0 = 0x140,
    Compare1 = 0x144,
    Compare2 = 0x148,
    Compare3 = 0x14C,
    Compare4 = 0x150,
    Compare5 = 0x154,
}

crate::register_offsets!(unsafe TimerTask, TimerEvent);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TimerMode {
    Timer = 0,
    Counter = 1,
    /// nRF52 only.
    LowPowerCounter = 2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum BitWidth {
    Bit16 = 0,
    Bit8 = 1,
    Bit24 = 2,
    Bit32 = 3,
}

/// Timer clock, `16 MHz >> PRESCALER`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Frequency {
    Freq16MHz = 0,
    Freq8MHz = 1,
    Freq4MHz = 2,
    Freq2MHz = 3,
    Freq1MHz = 4,
    Freq500kHz = 5,
    Freq250kHz = 6,
    Freq125kHz = 7,
    Freq62500Hz = 8,
    Freq31250Hz = 9,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum CcChannel {
    CC0 = 0,
    CC1 = 1,
    CC2 = 2,
    CC3 = 3,
    CC4 = 4,
    CC5 = 5,
}

const CHANNELS: [CcChannel; MAX_CC_CHANNELS] = [
    CcChannel::CC0,
    CcChannel::CC1,
    CcChannel::CC2,
    CcChannel::CC3,
    CcChannel::CC4,
    CcChannel::CC5,
];

/// Task capturing the timer value into `channel`.
pub fn capture_task_get(channel: CcChannel) -> TimerTask {
    match channel {
        CcChannel::CC0 => TimerTask::Capture0,
        CcChannel::CC1 => TimerTask::Capture1,
        CcChannel::CC2 => TimerTask::Capture2,
        CcChannel::CC3 => TimerTask::Capture3,
        CcChannel::CC4 => TimerTask::Capture4,
        CcChannel::CC5 => TimerTask::Capture5,
    }
}

/// Event raised when the timer matches `channel`.
pub fn compare_event_get(channel: CcChannel) -> TimerEvent {
    match channel {
        CcChannel::CC0 => TimerEvent::Compare0,
        CcChannel::CC1 => TimerEvent::Compare1,
        CcChannel::CC2 => TimerEvent::Compare2,
        CcChannel::CC3 => TimerEvent::Compare3,
        CcChannel::CC4 => TimerEvent::Compare4,
        CcChannel::CC5 => TimerEvent::Compare5,
    }
}

/// Interrupt mask bit of the compare event of `channel`.
pub fn compare_int_get(channel: CcChannel) -> FieldValue<u32, Interrupt::Register> {
    Interrupt::COMPARE.val(1 << channel as u32)
}

/// Number of ticks in `time_us` microseconds at `frequency`.
pub fn us_to_ticks(time_us: u32, frequency: Frequency) -> Result<u32, ErrorCode> {
    let ticks = (u64::from(time_us) * 16) >> (frequency as u32);
    u32::try_from(ticks).map_err(|_| ErrorCode::SIZE)
}

/// Number of ticks in `time_ms` milliseconds at `frequency`.
pub fn ms_to_ticks(time_ms: u32, frequency: Frequency) -> Result<u32, ErrorCode> {
    let ticks = (u64::from(time_ms) * 16000) >> (frequency as u32);
    u32::try_from(ticks).map_err(|_| ErrorCode::SIZE)
}

pub trait TimerClient {
    /// Called from `handle_interrupt` once per compare channel that fired.
    fn compare(&self, channel: CcChannel);
}

pub struct Timer<'a> {
    registers: StaticRef<TimerRegisters>,
    cc_channels: usize,
    client: OptionalCell<&'a dyn TimerClient>,
}

impl<'a> Timer<'a> {
    /// `cc_channels` is 4 for TIMER0..2 and 6 for TIMER3..4.
    pub const fn new(registers: StaticRef<TimerRegisters>, cc_channels: usize) -> Timer<'a> {
        Timer {
            registers,
            cc_channels,
            client: OptionalCell::empty(),
        }
    }

    pub fn set_client(&self, client: &'a dyn TimerClient) {
        self.client.set(client);
    }

    fn check_channel(&self, channel: CcChannel) -> Result<(), ErrorCode> {
        if (channel as usize) < self.cc_channels {
            Ok(())
        } else {
            Err(ErrorCode::INVAL)
        }
    }

    pub fn task_trigger(&self, task: TimerTask) {
        peripheral::task_trigger(&self.registers, task);
    }

    pub fn task_address_get(&self, task: TimerTask) -> u32 {
        peripheral::task_address_get(&self.registers, task)
    }

    pub fn event_clear(&self, event: TimerEvent) {
        peripheral::event_clear(&self.registers, event);
    }

    pub fn event_check(&self, event: TimerEvent) -> bool {
        peripheral::event_check(&self.registers, event)
    }

    pub fn event_address_get(&self, event: TimerEvent) -> u32 {
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

    pub fn mode_set(&self, mode: TimerMode) {
        self.registers.mode.write(Mode::MODE.val(mode as u32));
    }

    pub fn mode_get(&self) -> TimerMode {
        match self.registers.mode.read(Mode::MODE) {
            0 => TimerMode::Timer,
            1 => TimerMode::Counter,
            _ => TimerMode::LowPowerCounter,
        }
    }

    pub fn bit_width_set(&self, width: BitWidth) {
        self.registers
            .bitmode
            .write(BitMode::BITMODE.val(width as u32));
    }

    pub fn bit_width_get(&self) -> BitWidth {
        match self.registers.bitmode.read(BitMode::BITMODE) {
            0 => BitWidth::Bit16,
            1 => BitWidth::Bit8,
            2 => BitWidth::Bit24,
            _ => BitWidth::Bit32,
        }
    }

    pub fn frequency_set(&self, frequency: Frequency) {
        self.registers
            .prescaler
            .write(Prescaler::PRESCALER.val(frequency as u32));
    }

    /// Prescaler values above 9 run the timer at the slowest clock.
    pub fn frequency_get(&self) -> Frequency {
        match self.registers.prescaler.read(Prescaler::PRESCALER) {
            0 => Frequency::Freq16MHz,
            1 => Frequency::Freq8MHz,
            2 => Frequency::Freq4MHz,
            3 => Frequency::Freq2MHz,
            4 => Frequency::Freq1MHz,
            5 => Frequency::Freq500kHz,
            6 => Frequency::Freq250kHz,
            7 => Frequency::Freq125kHz,
            8 => Frequency::Freq62500Hz,
            _ => Frequency::Freq31250Hz,
        }
    }

    pub fn cc_write(&self, channel: CcChannel, value: u32) -> Result<(), ErrorCode> {
        self.check_channel(channel)?;
        self.registers.cc[channel as usize].set(value);
        Ok(())
    }

    pub fn cc_read(&self, channel: CcChannel) -> Result<u32, ErrorCode> {
        self.check_channel(channel)?;
        Ok(self.registers.cc[channel as usize].get())
    }

    pub fn start(&self) {
        self.registers.tasks_start.set(1);
    }

    pub fn stop(&self) {
        self.registers.tasks_stop.set(1);
    }

    pub fn clear(&self) {
        self.registers.tasks_clear.set(1);
    }

    /// Latch the running value into `channel` and return it.
    pub fn capture(&self, channel: CcChannel) -> Result<u32, ErrorCode> {
        self.check_channel(channel)?;
        self.registers.tasks_capture[channel as usize].set(1);
        Ok(self.registers.cc[channel as usize].get())
    }

    /// Arm `channel` to fire at `value` and enable its interrupt.
    pub fn set_compare(&self, channel: CcChannel, value: u32) -> Result<(), ErrorCode> {
        self.cc_write(channel, value)?;
        self.event_clear(compare_event_get(channel));
        self.int_enable(compare_int_get(channel));
        log::trace!("timer compare {:?} armed at {}", channel, value);
        Ok(())
    }

    /// Disarm `channel`.
    pub fn clear_compare(&self, channel: CcChannel) -> Result<(), ErrorCode> {
        self.check_channel(channel)?;
        self.int_disable(compare_int_get(channel));
        self.event_clear(compare_event_get(channel));
        Ok(())
    }

    pub fn handle_interrupt(&self) {
        for channel in CHANNELS.iter().copied().take(self.cc_channels) {
            let event = compare_event_get(channel);
            if self.event_check(event) {
                self.event_clear(event);
                self.client.map(|client| client.compare(channel));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use hal_utils::fake;
    use crate::peripheral::RegisterOffset;
    use core::cell::Cell;
    use core::mem::offset_of;

    fn timer(cc_channels: usize) -> Timer<'static> {
        Timer::new(fake::registers::<TimerRegisters>(), cc_channels)
    }

    #[test]
    fn offsets_match_register_block() {
        assert_eq!(TimerTask::Start.offset(), offset_of!(TimerRegisters, tasks_start));
        assert_eq!(TimerTask::Clear.offset(), offset_of!(TimerRegisters, tasks_clear));
        assert_eq!(
            TimerTask::Capture0.offset(),
            offset_of!(TimerRegisters, tasks_capture)
        );
        assert_eq!(
            TimerEvent::Compare0.offset(),
            offset_of!(TimerRegisters, events_compare)
        );
        assert_eq!(TimerEvent::Compare5.offset(), 0x154);
        assert_eq!(offset_of!(TimerRegisters, cc), 0x540);
    }

    #[test]
    fn channel_lookups() {
        assert_eq!(capture_task_get(CcChannel::CC3), TimerTask::Capture3);
        assert_eq!(compare_event_get(CcChannel::CC4), TimerEvent::Compare4);
        assert_eq!(compare_int_get(CcChannel::CC0).value, 1 << 16);
        assert_eq!(compare_int_get(CcChannel::CC5).value, 1 << 21);
    }

    #[test]
    fn tick_conversion() {
        assert_eq!(us_to_ticks(1000, Frequency::Freq16MHz), Ok(16000));
        assert_eq!(us_to_ticks(1000, Frequency::Freq1MHz), Ok(1000));
        assert_eq!(ms_to_ticks(1, Frequency::Freq31250Hz), Ok(31));
        assert_eq!(ms_to_ticks(1000, Frequency::Freq16MHz), Ok(16_000_000));
        assert_eq!(
            us_to_ticks(u32::MAX, Frequency::Freq16MHz),
            Err(ErrorCode::SIZE)
        );
        assert_eq!(
            ms_to_ticks(u32::MAX, Frequency::Freq31250Hz),
            Err(ErrorCode::SIZE)
        );
    }

    #[test]
    fn configuration_round_trips_through_registers() {
        let timer = timer(4);
        timer.mode_set(TimerMode::Counter);
        timer.bit_width_set(BitWidth::Bit24);
        timer.frequency_set(Frequency::Freq125kHz);
        assert_eq!(fake::read(&timer.registers, 0x504), 1);
        assert_eq!(fake::read(&timer.registers, 0x508), 2);
        assert_eq!(fake::read(&timer.registers, 0x510), 7);
        assert_eq!(timer.mode_get(), TimerMode::Counter);
        assert_eq!(timer.bit_width_get(), BitWidth::Bit24);
        assert_eq!(timer.frequency_get(), Frequency::Freq125kHz);
    }

    #[test]
    fn shorts_are_read_modify_write() {
        let timer = timer(4);
        timer.shorts_enable(Shorts::COMPARE_CLEAR.val(0b0001));
        timer.shorts_enable(Shorts::COMPARE_STOP.val(0b0001));
        assert_eq!(fake::read(&timer.registers, 0x200), 0x0101);
        timer.shorts_disable(Shorts::COMPARE_CLEAR.val(0b0001));
        assert_eq!(fake::read(&timer.registers, 0x200), 0x0100);
    }

    #[test]
    fn cc_access_is_limited_to_instance_channels() {
        let timer = timer(4);
        assert_eq!(timer.cc_write(CcChannel::CC3, 0x1234), Ok(()));
        assert_eq!(timer.cc_read(CcChannel::CC3), Ok(0x1234));
        assert_eq!(fake::read(&timer.registers, 0x54C), 0x1234);
        assert_eq!(timer.cc_write(CcChannel::CC4, 1), Err(ErrorCode::INVAL));
        assert_eq!(timer.capture(CcChannel::CC5), Err(ErrorCode::INVAL));
    }

    #[test]
    fn set_compare_arms_channel() {
        let timer = timer(6);
        fake::write(&timer.registers, 0x150, 1);
        assert_eq!(timer.set_compare(CcChannel::CC4, 500), Ok(()));
        assert_eq!(fake::read(&timer.registers, 0x550), 500);
        assert!(!timer.event_check(TimerEvent::Compare4));
        assert_eq!(fake::read(&timer.registers, 0x304), 1 << 20);
        assert!(timer.int_enable_check(compare_int_get(CcChannel::CC4)));
    }

    struct Recorder {
        fired: Cell<u32>,
    }

    impl TimerClient for Recorder {
        fn compare(&self, channel: CcChannel) {
            self.fired.set(self.fired.get() | 1 << channel as u32);
        }
    }

    #[test]
    fn interrupt_clears_and_reports_fired_channels() {
        let recorder: &'static Recorder = std::boxed::Box::leak(std::boxed::Box::new(Recorder {
            fired: Cell::new(0),
        }));
        let timer = timer(4);
        timer.set_client(recorder);
        fake::write(&timer.registers, 0x144, 1);
        fake::write(&timer.registers, 0x14C, 1);
        timer.handle_interrupt();
        assert_eq!(recorder.fired.get(), 0b1010);
        assert!(!timer.event_check(TimerEvent::Compare1));
        assert!(!timer.event_check(TimerEvent::Compare3));
    }

    #[test]
    fn start_stop_clear_write_tasks() {
        let timer = timer(4);
        timer.start();
        timer.clear();
        assert_eq!(fake::read(&timer.registers, 0x000), 1);
        assert_eq!(fake::read(&timer.registers, 0x00C), 1);
        assert_eq!(fake::read(&timer.registers, 0x004), 0);
        timer.task_trigger(TimerTask::Stop);
        assert_eq!(fake::read(&timer.registers, 0x004), 1);
    }
}
