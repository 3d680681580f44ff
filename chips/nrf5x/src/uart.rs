// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Universal asynchronous receiver/transmitter without EasyDMA (UART)
//!
//! One byte at a time moves through the RXD and TXD registers. The RXDRDY and
//! TXDRDY events report that a byte arrived or left; ERRORSRC latches the
//! reason of an ERROR event until software clears it.

use hal_utils::registers::interfaces::{Readable, Writeable};
use hal_utils::registers::{
    register_bitfields, register_structs, FieldValue, LocalRegisterCopy, ReadOnly, ReadWrite,
    WriteOnly,
};
use hal_utils::{ErrorCode, StaticRef};

use crate::peripheral;
use crate::pinmux::Pinmux;

register_structs! {
    pub UartRegisters {
        (0x000 => tasks_startrx: WriteOnly<u32>),
        (0x004 => tasks_stoprx: WriteOnly<u32>),
        (0x008 => tasks_starttx: WriteOnly<u32>),
        (0x00C => tasks_stoptx: WriteOnly<u32>),
        (0x010 => _reserved0),
        (0x01C => tasks_suspend: WriteOnly<u32>),
        (0x020 => _reserved1),
        (0x100 => events_cts: ReadWrite<u32>),
        (0x104 => events_ncts: ReadWrite<u32>),
        (0x108 => events_rxdrdy: ReadWrite<u32>),
        (0x10C => _reserved2),
        (0x11C => events_txdrdy: ReadWrite<u32>),
        (0x120 => _reserved3),
        (0x124 => events_error: ReadWrite<u32>),
        (0x128 => _reserved4),
        (0x144 => events_rxto: ReadWrite<u32>),
        (0x148 => _reserved5),
        (0x200 => shorts: ReadWrite<u32, Shorts::Register>),
        (0x204 => _reserved6),
        (0x304 => intenset: ReadWrite<u32, Interrupt::Register>),
        (0x308 => intenclr: ReadWrite<u32, Interrupt::Register>),
        (0x30C => _reserved7),
        /// Error source, write 1 to clear a bit
        (0x480 => errorsrc: ReadWrite<u32, ErrorSrc::Register>),
        (0x484 => _reserved8),
        (0x500 => enable: ReadWrite<u32, Enable::Register>),
        (0x504 => _reserved9),
        (0x508 => pselrts: ReadWrite<u32>),
        (0x50C => pseltxd: ReadWrite<u32>),
        (0x510 => pselcts: ReadWrite<u32>),
        (0x514 => pselrxd: ReadWrite<u32>),
        /// RX data received in previous transfers, double buffered
        (0x518 => rxd: ReadOnly<u32, Data::Register>),
        (0x51C => txd: WriteOnly<u32, Data::Register>),
        (0x520 => _reserved10),
        (0x524 => baudrate: ReadWrite<u32>),
        (0x528 => _reserved11),
        (0x56C => config: ReadWrite<u32, Config::Register>),
        (0x570 => @END),
    }
}

register_bitfields![u32,
    pub Shorts [
        /// CTS event starts the receiver
        CTS_STARTRX OFFSET(3) NUMBITS(1),
        /// NCTS event stops the receiver
        NCTS_STOPRX OFFSET(4) NUMBITS(1)
    ],
    pub Interrupt [
        CTS OFFSET(0) NUMBITS(1),
        NCTS OFFSET(1) NUMBITS(1),
        RXDRDY OFFSET(2) NUMBITS(1),
        TXDRDY OFFSET(7) NUMBITS(1),
        ERROR OFFSET(9) NUMBITS(1),
        RXTO OFFSET(17) NUMBITS(1)
    ],
    pub ErrorSrc [
        OVERRUN OFFSET(0) NUMBITS(1),
        PARITY OFFSET(1) NUMBITS(1),
        FRAMING OFFSET(2) NUMBITS(1),
        BREAK OFFSET(3) NUMBITS(1)
    ],
    Enable [
        ENABLE OFFSET(0) NUMBITS(3) [
            ON = 4,
            OFF = 0
        ]
    ],
    Data [
        DATA OFFSET(0) NUMBITS(8)
    ],
    Config [
        HWFC OFFSET(0) NUMBITS(1) [
            Disabled = 0,
            Enabled = 1
        ],
        PARITY OFFSET(1) NUMBITS(3) [
            Excluded = 0,
            Included = 7
        ]
    ]
];

pub const UART0_BASE: StaticRef<UartRegisters> =
    unsafe { StaticRef::new(0x40002000 as *const UartRegisters) };

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum UartTask {
    StartRx = 0x000,
    StopRx = 0x004,
    StartTx = 0x008,
    StopTx = 0x00C,
    Suspend = 0x01C,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum UartEvent {
    Cts = 0x100,
    Ncts = 0x104,
    RxdRdy = 0x108,
    TxdRdy = 0x11C,
    Error = 0x124,
    RxTo = 0x144,
}

crate::register_offsets!(unsafe UartTask, UartEvent);

/// BAUDRATE register words from the datasheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Baudrate {
    Baud1200 = 0x0004F000,
    Baud2400 = 0x0009D000,
    Baud4800 = 0x0013B000,
    Baud9600 = 0x00275000,
    Baud14400 = 0x003B0000,
    Baud19200 = 0x004EA000,
    Baud28800 = 0x0075F000,
    Baud38400 = 0x009D5000,
    Baud57600 = 0x00EBF000,
    Baud76800 = 0x013A9000,
    Baud115200 = 0x01D7E000,
    Baud230400 = 0x03AFB000,
    Baud250000 = 0x04000000,
    Baud460800 = 0x075F7000,
    /// nRF51 word. nRF52 documents `0x0F000000` for the same rate.
    Baud921600 = 0x0EBEDFA4,
    Baud1M = 0x10000000,
}

impl Baudrate {
    /// Baud rate setting for `rate` bits per second.
    pub fn from_rate(rate: u32) -> Result<Baudrate, ErrorCode> {
        match rate {
            1200 => Ok(Baudrate::Baud1200),
            2400 => Ok(Baudrate::Baud2400),
            4800 => Ok(Baudrate::Baud4800),
            9600 => Ok(Baudrate::Baud9600),
            14400 => Ok(Baudrate::Baud14400),
            19200 => Ok(Baudrate::Baud19200),
            28800 => Ok(Baudrate::Baud28800),
            38400 => Ok(Baudrate::Baud38400),
            57600 => Ok(Baudrate::Baud57600),
            76800 => Ok(Baudrate::Baud76800),
            115200 => Ok(Baudrate::Baud115200),
            230400 => Ok(Baudrate::Baud230400),
            250000 => Ok(Baudrate::Baud250000),
            460800 => Ok(Baudrate::Baud460800),
            921600 => Ok(Baudrate::Baud921600),
            1000000 => Ok(Baudrate::Baud1M),
            _ => Err(ErrorCode::INVAL),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parity {
    Excluded,
    /// Even parity
    Included,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HwFlowControl {
    Disabled,
    Enabled,
}

pub struct Uart {
    registers: StaticRef<UartRegisters>,
}

impl Uart {
    pub const fn new(registers: StaticRef<UartRegisters>) -> Uart {
        Uart { registers }
    }

    pub fn task_trigger(&self, task: UartTask) {
        peripheral::task_trigger(&self.registers, task);
    }

    pub fn task_address_get(&self, task: UartTask) -> u32 {
        peripheral::task_address_get(&self.registers, task)
    }

    pub fn event_clear(&self, event: UartEvent) {
        peripheral::event_clear(&self.registers, event);
    }

    pub fn event_check(&self, event: UartEvent) -> bool {
        peripheral::event_check(&self.registers, event)
    }

    pub fn event_address_get(&self, event: UartEvent) -> u32 {
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

    pub fn txrx_pins_set(&self, txd: Pinmux, rxd: Pinmux) {
        self.registers.pseltxd.set(txd.into());
        self.registers.pselrxd.set(rxd.into());
    }

    pub fn txrx_pins_disconnect(&self) {
        self.txrx_pins_set(Pinmux::disconnected(), Pinmux::disconnected());
    }

    pub fn hwfc_pins_set(&self, rts: Pinmux, cts: Pinmux) {
        self.registers.pselrts.set(rts.into());
        self.registers.pselcts.set(cts.into());
    }

    pub fn hwfc_pins_disconnect(&self) {
        self.hwfc_pins_set(Pinmux::disconnected(), Pinmux::disconnected());
    }

    pub fn rxd_get(&self) -> u8 {
        self.registers.rxd.read(Data::DATA) as u8
    }

    pub fn txd_set(&self, byte: u8) {
        self.registers.txd.write(Data::DATA.val(byte as u32));
    }

    pub fn baudrate_set(&self, baudrate: Baudrate) {
        self.registers.baudrate.set(baudrate as u32);
    }

    pub fn configure(&self, parity: Parity, hwfc: HwFlowControl) {
        let parity = match parity {
            Parity::Excluded => Config::PARITY::Excluded,
            Parity::Included => Config::PARITY::Included,
        };
        let hwfc = match hwfc {
            HwFlowControl::Disabled => Config::HWFC::Disabled,
            HwFlowControl::Enabled => Config::HWFC::Enabled,
        };
        self.registers.config.write(parity + hwfc);
        log::debug!("uart config {:#x}", self.registers.config.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_utils::fake;
    use crate::peripheral::RegisterOffset;
    use core::mem::offset_of;

    fn uart() -> Uart {
        Uart::new(fake::registers::<UartRegisters>())
    }

    #[test]
    fn offsets_match_register_block() {
        assert_eq!(UartTask::StartRx.offset(), offset_of!(UartRegisters, tasks_startrx));
        assert_eq!(UartTask::Suspend.offset(), offset_of!(UartRegisters, tasks_suspend));
        assert_eq!(UartEvent::TxdRdy.offset(), offset_of!(UartRegisters, events_txdrdy));
        assert_eq!(UartEvent::RxTo.offset(), offset_of!(UartRegisters, events_rxto));
        assert_eq!(offset_of!(UartRegisters, baudrate), 0x524);
        assert_eq!(offset_of!(UartRegisters, config), 0x56C);
    }

    #[test]
    fn baudrate_words() {
        assert_eq!(Baudrate::from_rate(115200), Ok(Baudrate::Baud115200));
        assert_eq!(Baudrate::Baud115200 as u32, 0x01D7E000);
        assert_eq!(Baudrate::Baud1M as u32, 0x10000000);
        assert_eq!(Baudrate::from_rate(115201), Err(ErrorCode::INVAL));

        let uart = uart();
        uart.baudrate_set(Baudrate::Baud9600);
        assert_eq!(fake::read(&uart.registers, 0x524), 0x00275000);
    }

    #[test]
    fn configure_packs_parity_and_flow_control() {
        let uart = uart();
        uart.configure(Parity::Included, HwFlowControl::Enabled);
        assert_eq!(fake::read(&uart.registers, 0x56C), 0b1111);
        uart.configure(Parity::Excluded, HwFlowControl::Enabled);
        assert_eq!(fake::read(&uart.registers, 0x56C), 0b0001);
    }

    #[test]
    fn pins_and_enable() {
        let uart = uart();
        uart.txrx_pins_set(Pinmux::new(6), Pinmux::new(8));
        uart.hwfc_pins_set(Pinmux::new(5), Pinmux::new(7));
        uart.enable();
        assert_eq!(fake::read(&uart.registers, 0x50C), 6);
        assert_eq!(fake::read(&uart.registers, 0x514), 8);
        assert_eq!(fake::read(&uart.registers, 0x508), 5);
        assert_eq!(fake::read(&uart.registers, 0x510), 7);
        assert_eq!(fake::read(&uart.registers, 0x500), 4);

        uart.hwfc_pins_disconnect();
        assert_eq!(fake::read(&uart.registers, 0x508), 0xFFFF_FFFF);
        uart.disable();
        assert_eq!(fake::read(&uart.registers, 0x500), 0);
    }

    #[test]
    fn data_registers() {
        let uart = uart();
        fake::write(&uart.registers, 0x518, 0x1A5);
        assert_eq!(uart.rxd_get(), 0xA5);
        uart.txd_set(0x42);
        assert_eq!(fake::read(&uart.registers, 0x51C), 0x42);
    }

    #[test]
    fn errorsrc_is_cleared_by_writing_back() {
        let uart = uart();
        fake::write(&uart.registers, 0x480, 0b0101);
        let errors = uart.errorsrc_get_and_clear();
        assert!(errors.is_set(ErrorSrc::OVERRUN));
        assert!(errors.is_set(ErrorSrc::FRAMING));
        assert!(!errors.is_set(ErrorSrc::PARITY));
        // The fake block has no write-one-to-clear logic, the write-back is
        // what the hardware sees.
        assert_eq!(fake::read(&uart.registers, 0x480), 0b0101);
    }

    #[test]
    fn interrupts_and_shorts() {
        let uart = uart();
        uart.int_enable(Interrupt::RXDRDY::SET + Interrupt::ERROR::SET);
        assert_eq!(fake::read(&uart.registers, 0x304), (1 << 2) | (1 << 9));
        assert!(uart.int_enable_check(Interrupt::ERROR::SET));
        assert!(!uart.int_enable_check(Interrupt::TXDRDY::SET));
        uart.int_disable(Interrupt::RXTO::SET);
        assert_eq!(fake::read(&uart.registers, 0x308), 1 << 17);

        uart.shorts_enable(Shorts::CTS_STARTRX::SET + Shorts::NCTS_STOPRX::SET);
        assert_eq!(fake::read(&uart.registers, 0x200), 0b11000);
    }
}
