// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Two-wire interface master without EasyDMA (TWI)
//!
//! Bytes are moved one at a time through RXD/TXD. The byte boundary (BB)
//! event can be shortcut to SUSPEND or STOP so the bus is held between
//! bytes while software services the data register.

use hal_utils::registers::interfaces::{Readable, Writeable};
use hal_utils::registers::{
    register_bitfields, register_structs, FieldValue, LocalRegisterCopy, ReadOnly, ReadWrite,
    WriteOnly,
};
use hal_utils::StaticRef;

use crate::peripheral;
use crate::pinmux::Pinmux;

register_structs! {
    pub TwiRegisters {
        (0x000 => tasks_startrx: WriteOnly<u32>),
        (0x004 => _reserved0),
        (0x008 => tasks_starttx: WriteOnly<u32>),
        (0x00C => _reserved1),
        (0x014 => tasks_stop: WriteOnly<u32>),
        (0x018 => _reserved2),
        (0x01C => tasks_suspend: WriteOnly<u32>),
        (0x020 => tasks_resume: WriteOnly<u32>),
        (0x024 => _reserved3),
        (0x104 => events_stopped: ReadWrite<u32>),
        (0x108 => events_rxdready: ReadWrite<u32>),
        (0x10C => _reserved4),
        (0x11C => events_txdsent: ReadWrite<u32>),
        (0x120 => _reserved5),
        (0x124 => events_error: ReadWrite<u32>),
        (0x128 => _reserved6),
        (0x138 => events_bb: ReadWrite<u32>),
        (0x13C => _reserved7),
        (0x148 => events_suspended: ReadWrite<u32>),
        (0x14C => _reserved8),
        (0x200 => shorts: ReadWrite<u32, Shorts::Register>),
        (0x204 => _reserved9),
        (0x304 => intenset: ReadWrite<u32, Interrupt::Register>),
        (0x308 => intenclr: ReadWrite<u32, Interrupt::Register>),
        (0x30C => _reserved10),
        (0x4C4 => errorsrc: ReadWrite<u32, ErrorSrc::Register>),
        (0x4C8 => _reserved11),
        (0x500 => enable: ReadWrite<u32, Enable::Register>),
        (0x504 => _reserved12),
        (0x508 => pselscl: ReadWrite<u32>),
        (0x50C => pselsda: ReadWrite<u32>),
        (0x510 => _reserved13),
        (0x518 => rxd: ReadOnly<u32, Data::Register>),
        (0x51C => txd: ReadWrite<u32, Data::Register>),
        (0x520 => _reserved14),
        (0x524 => frequency: ReadWrite<u32>),
        (0x528 => _reserved15),
        (0x588 => address: ReadWrite<u32, Address::Register>),
        (0x58C => @END),
    }
}

register_bitfields![u32,
    pub Shorts [
        /// BB event suspends the bus
        BB_SUSPEND OFFSET(0) NUMBITS(1),
        /// BB event stops the bus
        BB_STOP OFFSET(1) NUMBITS(1)
    ],
    pub Interrupt [
        STOPPED OFFSET(1) NUMBITS(1),
        RXDREADY OFFSET(2) NUMBITS(1),
        TXDSENT OFFSET(7) NUMBITS(1),
        ERROR OFFSET(9) NUMBITS(1),
        BB OFFSET(14) NUMBITS(1),
        SUSPENDED OFFSET(18) NUMBITS(1)
    ],
    pub ErrorSrc [
        /// A new byte arrived before RXD was read
        OVERRUN OFFSET(0) NUMBITS(1),
        /// NACK received after sending the address
        ANACK OFFSET(1) NUMBITS(1),
        /// NACK received after sending a data byte
        DNACK OFFSET(2) NUMBITS(1)
    ],
    Enable [
        ENABLE OFFSET(0) NUMBITS(4) [
            ON = 5,
            OFF = 0
        ]
    ],
    Data [
        DATA OFFSET(0) NUMBITS(8)
    ],
    Address [
        ADDRESS OFFSET(0) NUMBITS(7)
    ]
];

pub const TWI0_BASE: StaticRef<TwiRegisters> =
    unsafe { StaticRef::new(0x40003000 as *const TwiRegisters) };
pub const TWI1_BASE: StaticRef<TwiRegisters> =
    unsafe { StaticRef::new(0x40004000 as *const TwiRegisters) };

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum TwiTask {
    StartRx = 0x000,
    StartTx = 0x008,
    Stop = 0x014,
    Suspend = 0x01C,
    Resume = 0x020,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum TwiEvent {
    Stopped = 0x104,
    RxdReady = 0x108,
    TxdSent = 0x11C,
    Error = 0x124,
    ByteBoundary = 0x138,
    Suspended = 0x148,
}

crate::register_offsets!(unsafe TwiTask, TwiEvent);

/// FREQUENCY register words.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Frequency {
    K100 = 0x01980000,
    K250 = 0x04000000,
    /// nRF51 word. nRF52 documents `0x06400000`; both give about 400 kbps.
    K400 = 0x06680000,
}

pub struct Twi {
    registers: StaticRef<TwiRegisters>,
}

impl Twi {
    pub const fn new(registers: StaticRef<TwiRegisters>) -> Twi {
        Twi { registers }
    }

    pub fn task_trigger(&self, task: TwiTask) {
        peripheral::task_trigger(&self.registers, task);
    }

    pub fn task_address_get(&self, task: TwiTask) -> u32 {
        peripheral::task_address_get(&self.registers, task)
    }

    pub fn event_clear(&self, event: TwiEvent) {
        peripheral::event_clear(&self.registers, event);
    }

    pub fn event_check(&self, event: TwiEvent) -> bool {
        peripheral::event_check(&self.registers, event)
    }

    pub fn event_address_get(&self, event: TwiEvent) -> u32 {
        peripheral::event_address_get(&self.registers, event)
    }

    /// Replace the shortcut configuration with `mask`.
    pub fn shorts_set(&self, mask: FieldValue<u32, Shorts::Register>) {
        self.registers.shorts.write(mask);
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

    /// Read the latched error sources and clear them.
    pub fn errorsrc_get_and_clear(&self) -> LocalRegisterCopy<u32, ErrorSrc::Register> {
        let errors = self.registers.errorsrc.extract();
        self.registers.errorsrc.set(errors.get());
        errors
    }

    pub fn enable(&self) {
        self.registers.enable.write(Enable::ENABLE::ON);
    }

    pub fn disable(&self) {
        self.registers.enable.write(Enable::ENABLE::OFF);
    }

    pub fn pins_set(&self, scl: Pinmux, sda: Pinmux) {
        self.registers.pselscl.set(scl.into());
        self.registers.pselsda.set(sda.into());
    }

    pub fn frequency_set(&self, frequency: Frequency) {
        self.registers.frequency.set(frequency as u32);
    }

    pub fn rxd_get(&self) -> u8 {
        self.registers.rxd.read(Data::DATA) as u8
    }

    pub fn txd_set(&self, byte: u8) {
        self.registers.txd.write(Data::DATA.val(byte as u32));
    }

    /// Set the 7-bit address of the slave.
    pub fn address_set(&self, address: u8) {
        self.registers
            .address
            .write(Address::ADDRESS.val(address as u32));
    }
}
