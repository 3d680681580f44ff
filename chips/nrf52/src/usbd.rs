// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Universal Serial Bus Device with EasyDMA (USBD)
//!
//! Register level access to the nRF52840 USB device controller. Endpoints
//! are addressed the USB way: the low nibble is the endpoint number and bit
//! 7 is set for IN endpoints. Endpoint 8 is the isochronous endpoint in
//! either direction; 0 to 7 are control, bulk or interrupt endpoints.
//!
//! Every data transfer goes through EasyDMA: point the endpoint block at a
//! RAM buffer with [`Usbd::ep_easydma_set`], trigger the endpoint's start
//! task and wait for its end event.

use hal_utils::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hal_utils::registers::{
    register_bitfields, register_structs, FieldValue, LocalRegisterCopy, ReadOnly, ReadWrite,
    WriteOnly,
};
use hal_utils::{ErrorCode, StaticRef};
use nrf5x::peripheral::{self, RegisterOffset};

pub const USBD_BASE: StaticRef<UsbdRegisters> =
    unsafe { StaticRef::new(0x40027000 as *const UsbdRegisters) };

/// Number of non-isochronous endpoints in each direction.
pub const NUM_ENDPOINTS: usize = 8;

/// Endpoint number of the isochronous endpoints.
pub const ISO_ENDPOINT: u8 = 8;

/// Largest EasyDMA transfer on a bulk, interrupt or control endpoint.
pub const EP_MAXCNT: u32 = 64;

/// Largest EasyDMA transfer on an isochronous endpoint.
pub const ISO_MAXCNT: u32 = 1023;

register_structs! {
    pub UsbdRegisters {
        (0x000 => _reserved0),
        /// Capture EPIN[n].PTR/MAXCNT and start sending on endpoint IN n
        (0x004 => tasks_startepin: [WriteOnly<u32>; NUM_ENDPOINTS]),
        (0x024 => tasks_startisoin: WriteOnly<u32>),
        /// Capture EPOUT[n].PTR/MAXCNT and start receiving on endpoint OUT n
        (0x028 => tasks_startepout: [WriteOnly<u32>; NUM_ENDPOINTS]),
        (0x048 => tasks_startisoout: WriteOnly<u32>),
        /// Allow the OUT data stage on control endpoint 0
        (0x04C => tasks_ep0rcvout: WriteOnly<u32>),
        /// Allow the status stage on control endpoint 0
        (0x050 => tasks_ep0status: WriteOnly<u32>),
        /// STALL data and status stage on control endpoint 0
        (0x054 => tasks_ep0stall: WriteOnly<u32>),
        /// Force D+ and D- to the state in DPDMVALUE
        (0x058 => tasks_dpdmdrive: WriteOnly<u32>),
        /// Give D+ and D- back to the USB engine
        (0x05C => tasks_dpdmnodrive: WriteOnly<u32>),
        (0x060 => _reserved1),
        (0x100 => events_usbreset: ReadWrite<u32>),
        (0x104 => events_started: ReadWrite<u32>),
        (0x108 => events_endepin: [ReadWrite<u32>; NUM_ENDPOINTS]),
        (0x128 => events_ep0datadone: ReadWrite<u32>),
        (0x12C => events_endisoin: ReadWrite<u32>),
        (0x130 => events_endepout: [ReadWrite<u32>; NUM_ENDPOINTS]),
        (0x150 => events_endisoout: ReadWrite<u32>),
        (0x154 => events_sof: ReadWrite<u32>),
        /// See EVENTCAUSE
        (0x158 => events_usbevent: ReadWrite<u32>),
        (0x15C => events_ep0setup: ReadWrite<u32>),
        /// See EPDATASTATUS
        (0x160 => events_epdata: ReadWrite<u32>),
        (0x164 => _reserved2),
        (0x200 => shorts: ReadWrite<u32, Shorts::Register>),
        (0x204 => _reserved3),
        (0x300 => inten: ReadWrite<u32, Interrupt::Register>),
        (0x304 => intenset: ReadWrite<u32, Interrupt::Register>),
        (0x308 => intenclr: ReadWrite<u32, Interrupt::Register>),
        (0x30C => _reserved4),
        /// Details on what caused the USBEVENT event, write 1 to clear
        (0x400 => eventcause: ReadWrite<u32, EventCause::Register>),
        (0x404 => _reserved5),
        (0x420 => halted_epin: [ReadOnly<u32, Halted::Register>; NUM_ENDPOINTS]),
        (0x440 => _reserved6),
        (0x444 => halted_epout: [ReadOnly<u32, Halted::Register>; NUM_ENDPOINTS]),
        (0x464 => _reserved7),
        /// Endpoints whose EasyDMA registers have been captured
        (0x468 => epstatus: ReadWrite<u32, EndpointStatus::Register>),
        /// Endpoints on which an acknowledged data transfer took place
        (0x46C => epdatastatus: ReadWrite<u32, EndpointStatus::Register>),
        (0x470 => usbaddr: ReadOnly<u32, UsbAddress::Register>),
        (0x474 => _reserved8),
        (0x480 => bmrequesttype: ReadOnly<u32, Byte::Register>),
        (0x484 => brequest: ReadOnly<u32, Byte::Register>),
        (0x488 => wvaluel: ReadOnly<u32, Byte::Register>),
        (0x48C => wvalueh: ReadOnly<u32, Byte::Register>),
        (0x490 => windexl: ReadOnly<u32, Byte::Register>),
        (0x494 => windexh: ReadOnly<u32, Byte::Register>),
        (0x498 => wlengthl: ReadOnly<u32, Byte::Register>),
        (0x49C => wlengthh: ReadOnly<u32, Byte::Register>),
        /// Bytes received last on OUT[n], write to allow the next transfer
        (0x4A0 => size_epout: [ReadWrite<u32, EndpointSize::Register>; NUM_ENDPOINTS]),
        (0x4C0 => size_isoout: ReadOnly<u32, IsoEndpointSize::Register>),
        (0x4C4 => _reserved9),
        (0x500 => enable: ReadWrite<u32, Usb::Register>),
        (0x504 => usbpullup: ReadWrite<u32, UsbPullup::Register>),
        (0x508 => dpdmvalue: ReadWrite<u32, DpDmValue::Register>),
        (0x50C => dtoggle: ReadWrite<u32, Toggle::Register>),
        (0x510 => epinen: ReadWrite<u32, EndpointEnable::Register>),
        (0x514 => epouten: ReadWrite<u32, EndpointEnable::Register>),
        (0x518 => epstall: WriteOnly<u32, EndpointStall::Register>),
        (0x51C => isosplit: ReadWrite<u32, IsoSplit::Register>),
        /// Start of frame counter
        (0x520 => framecntr: ReadOnly<u32, FrameCounter::Register>),
        (0x524 => _reserved10),
        (0x52C => lowpower: ReadWrite<u32, LowPower::Register>),
        (0x530 => isoinconfig: ReadWrite<u32, IsoInConfig::Register>),
        (0x534 => _reserved11),
        (0x600 => epin: [EndpointRegisters; NUM_ENDPOINTS]),
        (0x6A0 => isoin: EndpointRegisters),
        (0x6B4 => _reserved12),
        (0x700 => epout: [EndpointRegisters; NUM_ENDPOINTS]),
        (0x7A0 => isoout: EndpointRegisters),
        (0x7B4 => @END),
    },

    /// EasyDMA channel of one endpoint
    pub EndpointRegisters {
        (0x00 => ptr: ReadWrite<u32>),
        (0x04 => maxcnt: ReadWrite<u32, Count::Register>),
        /// Bytes transferred by the last EasyDMA transaction
        (0x08 => amount: ReadOnly<u32, Amount::Register>),
        (0x0C => _reserved),
        (0x14 => @END),
    }
}

register_bitfields! [u32,
    pub Shorts [
        EP0DATADONE_STARTEPIN0 OFFSET(0) NUMBITS(1),
        EP0DATADONE_STARTEPOUT0 OFFSET(1) NUMBITS(1),
        EP0DATADONE_EP0STATUS OFFSET(2) NUMBITS(1),
        ENDEPOUT0_EP0STATUS OFFSET(3) NUMBITS(1),
        ENDEPOUT0_EP0RCVOUT OFFSET(4) NUMBITS(1)
    ],

    pub Interrupt [
        USBRESET OFFSET(0) NUMBITS(1),
        STARTED OFFSET(1) NUMBITS(1),
        ENDEPIN OFFSET(2) NUMBITS(8),
        EP0DATADONE OFFSET(10) NUMBITS(1),
        ENDISOIN OFFSET(11) NUMBITS(1),
        ENDEPOUT OFFSET(12) NUMBITS(8),
        ENDISOOUT OFFSET(20) NUMBITS(1),
        SOF OFFSET(21) NUMBITS(1),
        USBEVENT OFFSET(22) NUMBITS(1),
        EP0SETUP OFFSET(23) NUMBITS(1),
        EPDATA OFFSET(24) NUMBITS(1)
    ],

    pub EventCause [
        ISOOUTCRC OFFSET(0) NUMBITS(1),
        SUSPEND OFFSET(8) NUMBITS(1),
        RESUME OFFSET(9) NUMBITS(1),
        USBWUALLOWED OFFSET(10) NUMBITS(1),
        READY OFFSET(11) NUMBITS(1)
    ],

    Halted [
        GETSTATUS OFFSET(0) NUMBITS(16) [
            NotHalted = 0,
            Halted = 1
        ]
    ],

    /// One bit per endpoint: IN at bit n, OUT at bit 16 + n
    pub EndpointStatus [
        EPIN OFFSET(0) NUMBITS(9),
        EPOUT OFFSET(16) NUMBITS(9)
    ],

    UsbAddress [
        ADDR OFFSET(0) NUMBITS(7)
    ],

    Byte [
        VALUE OFFSET(0) NUMBITS(8)
    ],

    EndpointSize [
        SIZE OFFSET(0) NUMBITS(7)
    ],

    IsoEndpointSize [
        SIZE OFFSET(0) NUMBITS(10),
        ZERO OFFSET(16) NUMBITS(1)
    ],

    Usb [
        ENABLE OFFSET(0) NUMBITS(1) [
            OFF = 0,
            ON = 1
        ]
    ],

    UsbPullup [
        CONNECT OFFSET(0) NUMBITS(1) [
            Disabled = 0,
            Enabled = 1
        ]
    ],

    DpDmValue [
        STATE OFFSET(0) NUMBITS(5) []
    ],

    Toggle [
        EP OFFSET(0) NUMBITS(3) [],
        IO OFFSET(7) NUMBITS(1) [
            Out = 0,
            In = 1
        ],
        VALUE OFFSET(8) NUMBITS(2) [
            Nop = 0,
            Data0 = 1,
            Data1 = 2
        ]
    ],

    EndpointEnable [
        EP OFFSET(0) NUMBITS(8) [],
        ISO OFFSET(8) NUMBITS(1) []
    ],

    EndpointStall [
        EP OFFSET(0) NUMBITS(3) [],
        IO OFFSET(7) NUMBITS(1) [
            Out = 0,
            In = 1
        ],
        STALL OFFSET(8) NUMBITS(1) [
            UnStall = 0,
            Stall = 1
        ]
    ],

    IsoSplit [
        SPLIT OFFSET(0) NUMBITS(16) []
    ],

    FrameCounter [
        FRAMECNTR OFFSET(0) NUMBITS(11)
    ],

    LowPower [
        LOWPOWER OFFSET(0) NUMBITS(1) [
            ForceNormal = 0,
            LowPower = 1
        ]
    ],

    IsoInConfig [
        RESPONSE OFFSET(0) NUMBITS(1) []
    ],

    Count [
        MAXCNT OFFSET(0) NUMBITS(10)
    ],

    Amount [
        AMOUNT OFFSET(0) NUMBITS(10)
    ]
];

/// USB endpoint address. Only addresses of endpoints the USBD has, 0 to 8
/// in either direction, can be built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Endpoint(u8);

impl Endpoint {
    /// Direction bit of an endpoint address, set for IN.
    pub const DIR_IN: u8 = 0x80;

    pub const EP0_IN: Endpoint = Endpoint(Self::DIR_IN);
    pub const EP0_OUT: Endpoint = Endpoint(0);
    pub const ISO_IN: Endpoint = Endpoint(Self::DIR_IN | ISO_ENDPOINT);
    pub const ISO_OUT: Endpoint = Endpoint(ISO_ENDPOINT);

    /// IN endpoint `n`, `INVAL` unless `n` is in `0..=8`.
    pub const fn epin(n: u8) -> Result<Endpoint, ErrorCode> {
        if n > ISO_ENDPOINT {
            return Err(ErrorCode::INVAL);
        }
        Ok(Endpoint(Self::DIR_IN | n))
    }

    /// OUT endpoint `n`, `INVAL` unless `n` is in `0..=8`.
    pub const fn epout(n: u8) -> Result<Endpoint, ErrorCode> {
        if n > ISO_ENDPOINT {
            return Err(ErrorCode::INVAL);
        }
        Ok(Endpoint(n))
    }

    /// Parse an endpoint address as found in descriptors.
    pub fn from_address(address: u8) -> Result<Endpoint, ErrorCode> {
        if address & !Self::DIR_IN & 0xF0 != 0 || address & 0x0F > ISO_ENDPOINT {
            return Err(ErrorCode::INVAL);
        }
        Ok(Endpoint(address))
    }

    pub const fn address(self) -> u8 {
        self.0
    }

    pub const fn number(self) -> u8 {
        self.0 & 0x0F
    }

    pub const fn is_in(self) -> bool {
        self.0 & Self::DIR_IN != 0
    }

    pub const fn is_iso(self) -> bool {
        self.number() == ISO_ENDPOINT
    }

    fn index(self) -> usize {
        self.number() as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UsbdTask {
    /// STARTEPIN[n], STARTISOIN, STARTEPOUT[n] or STARTISOOUT
    StartEp(Endpoint),
    Ep0RcvOut,
    Ep0Status,
    Ep0Stall,
    DpDmDrive,
    DpDmNoDrive,
}

// SAFETY: `Endpoint` numbers are at most 8, so every offset is one of the
// task words below 0x060.
unsafe impl RegisterOffset for UsbdTask {
    fn offset(self) -> usize {
        match self {
            // STARTISOIN and STARTISOOUT follow the eight regular words.
            UsbdTask::StartEp(ep) if ep.is_in() => 0x004 + 4 * ep.index(),
            UsbdTask::StartEp(ep) => 0x028 + 4 * ep.index(),
            UsbdTask::Ep0RcvOut => 0x04C,
            UsbdTask::Ep0Status => 0x050,
            UsbdTask::Ep0Stall => 0x054,
            UsbdTask::DpDmDrive => 0x058,
            UsbdTask::DpDmNoDrive => 0x05C,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UsbdEvent {
    UsbReset,
    Started,
    /// ENDEPIN[n], ENDISOIN, ENDEPOUT[n] or ENDISOOUT
    EndEp(Endpoint),
    Ep0DataDone,
    Sof,
    UsbEvent,
    Ep0Setup,
    EpData,
}

// SAFETY: `Endpoint` numbers are at most 8, so every offset is one of the
// event words between 0x100 and 0x160.
unsafe impl RegisterOffset for UsbdEvent {
    fn offset(self) -> usize {
        match self {
            UsbdEvent::UsbReset => 0x100,
            UsbdEvent::Started => 0x104,
            // EP0DATADONE sits between ENDEPIN[7] and ENDISOIN.
            UsbdEvent::EndEp(ep) if ep.is_iso() && ep.is_in() => 0x12C,
            UsbdEvent::EndEp(ep) if ep.is_in() => 0x108 + 4 * ep.index(),
            UsbdEvent::EndEp(ep) => 0x130 + 4 * ep.index(),
            UsbdEvent::Ep0DataDone => 0x128,
            UsbdEvent::Sof => 0x154,
            UsbdEvent::UsbEvent => 0x158,
            UsbdEvent::Ep0Setup => 0x15C,
            UsbdEvent::EpData => 0x160,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataToggle {
    Data0,
    Data1,
}

/// States DPDMDRIVE forces on the data lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum DpDmState {
    Resume = 1,
    J = 2,
    K = 4,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum IsoSplitMode {
    /// The full ISO buffer serves one direction
    OneDir = 0x0000,
    /// Lower half for IN, upper half for OUT
    HalfIn = 0x0080,
}

/// Answer of the ISO IN endpoint to an IN token with no data ready.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum IsoInResponse {
    NoResp = 0,
    ZeroData = 1,
}

/// The 8 byte SETUP packet of the last control transfer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SetupPacket {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

/// Start task for the EasyDMA transfer of `ep`.
pub fn ep_start_task(ep: Endpoint) -> UsbdTask {
    UsbdTask::StartEp(ep)
}

/// Event fired when the EasyDMA transfer of `ep` has finished.
pub fn ep_end_event(ep: Endpoint) -> UsbdEvent {
    UsbdEvent::EndEp(ep)
}

/// Interrupt enable bit of the end event of `ep`.
pub fn ep_int_mask(ep: Endpoint) -> FieldValue<u32, Interrupt::Register> {
    let shift = match (ep.is_in(), ep.is_iso()) {
        (true, true) => 11,
        (true, false) => 2 + ep.index(),
        (false, true) => 20,
        (false, false) => 12 + ep.index(),
    };
    FieldValue::<u32, Interrupt::Register>::new(1, shift, 1)
}

/// Bit of `ep` in EPSTATUS and EPDATASTATUS.
pub fn ep_status_mask(ep: Endpoint) -> u32 {
    let bit = if ep.is_in() { 0 } else { 16 };
    1 << (bit + ep.index())
}

pub struct Usbd {
    registers: StaticRef<UsbdRegisters>,
}

impl Usbd {
    pub const fn new(registers: StaticRef<UsbdRegisters>) -> Usbd {
        Usbd { registers }
    }

    pub fn enable(&self) {
        self.registers.enable.write(Usb::ENABLE::ON);
    }

    pub fn disable(&self) {
        self.registers.enable.write(Usb::ENABLE::OFF);
    }

    pub fn enable_check(&self) -> bool {
        self.registers.enable.matches_all(Usb::ENABLE::ON)
    }

    pub fn task_trigger(&self, task: UsbdTask) {
        peripheral::task_trigger(&self.registers, task);
    }

    pub fn task_address_get(&self, task: UsbdTask) -> u32 {
        peripheral::task_address_get(&self.registers, task)
    }

    pub fn event_clear(&self, event: UsbdEvent) {
        peripheral::event_clear(&self.registers, event);
    }

    pub fn event_check(&self, event: UsbdEvent) -> bool {
        peripheral::event_check(&self.registers, event)
    }

    /// Clear `event` if it has fired and report whether it had.
    pub fn event_get_and_clear(&self, event: UsbdEvent) -> bool {
        let fired = self.event_check(event);
        if fired {
            self.event_clear(event);
        }
        fired
    }

    pub fn event_address_get(&self, event: UsbdEvent) -> u32 {
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

    pub fn shorts_enable(&self, mask: FieldValue<u32, Shorts::Register>) {
        self.registers
            .shorts
            .set(self.registers.shorts.get() | mask.value);
    }

    pub fn shorts_disable(&self, mask: FieldValue<u32, Shorts::Register>) {
        self.registers
            .shorts
            .set(self.registers.shorts.get() & !mask.value);
    }

    pub fn shorts_get(&self) -> u32 {
        self.registers.shorts.get()
    }

    pub fn eventcause_get(&self) -> LocalRegisterCopy<u32, EventCause::Register> {
        self.registers.eventcause.extract()
    }

    /// Clear the causes set in `mask`. EVENTCAUSE is write one to clear.
    pub fn eventcause_clear(&self, mask: FieldValue<u32, EventCause::Register>) {
        self.registers.eventcause.write(mask);
    }

    pub fn eventcause_get_and_clear(&self) -> LocalRegisterCopy<u32, EventCause::Register> {
        let cause = self.registers.eventcause.extract();
        self.registers.eventcause.set(cause.get());
        cause
    }

    /// Raw GETSTATUS halt state of `ep`, ready to be returned to the host.
    /// The isochronous endpoints cannot be halted and always report 0.
    pub fn halt_check(&self, ep: Endpoint) -> u32 {
        if ep.is_iso() {
            return 0;
        }
        if ep.is_in() {
            self.registers.halted_epin[ep.index()].read(Halted::GETSTATUS)
        } else {
            self.registers.halted_epout[ep.index()].read(Halted::GETSTATUS)
        }
    }

    /// Isochronous endpoints cannot be stalled, EPSTALL only encodes
    /// endpoints 0 to 7.
    pub fn ep_stall(&self, ep: Endpoint) -> Result<(), ErrorCode> {
        if ep.is_iso() {
            return Err(ErrorCode::INVAL);
        }
        self.registers.epstall.write(
            EndpointStall::EP.val(ep.index() as u32)
                + EndpointStall::IO.val(ep.is_in() as u32)
                + EndpointStall::STALL::Stall,
        );
        Ok(())
    }

    pub fn ep_unstall(&self, ep: Endpoint) -> Result<(), ErrorCode> {
        if ep.is_iso() {
            return Err(ErrorCode::INVAL);
        }
        self.registers.epstall.write(
            EndpointStall::EP.val(ep.index() as u32)
                + EndpointStall::IO.val(ep.is_in() as u32)
                + EndpointStall::STALL::UnStall,
        );
        Ok(())
    }

    pub fn ep_stall_check(&self, ep: Endpoint) -> bool {
        self.halt_check(ep) != 0
    }

    fn ep_enable_register(&self, ep: Endpoint) -> &ReadWrite<u32, EndpointEnable::Register> {
        if ep.is_in() {
            &self.registers.epinen
        } else {
            &self.registers.epouten
        }
    }

    pub fn ep_enable(&self, ep: Endpoint) {
        let register = self.ep_enable_register(ep);
        register.set(register.get() | 1 << ep.index());
    }

    pub fn ep_disable(&self, ep: Endpoint) {
        let register = self.ep_enable_register(ep);
        register.set(register.get() & !(1 << ep.index()));
    }

    pub fn ep_enable_check(&self, ep: Endpoint) -> bool {
        self.ep_enable_register(ep).get() & 1 << ep.index() != 0
    }

    /// Disable every endpoint except control endpoint 0.
    pub fn ep_all_disable(&self) {
        self.registers.epinen.write(EndpointEnable::EP.val(1));
        self.registers.epouten.write(EndpointEnable::EP.val(1));
    }

    pub fn epstatus_get_and_clear(&self) -> u32 {
        let status = self.registers.epstatus.get();
        self.registers.epstatus.set(status);
        status
    }

    pub fn epdatastatus_get_and_clear(&self) -> u32 {
        let status = self.registers.epdatastatus.get();
        self.registers.epdatastatus.set(status);
        status
    }

    pub fn usbaddr_get(&self) -> u8 {
        self.registers.usbaddr.read(UsbAddress::ADDR) as u8
    }

    pub fn setup_get(&self) -> SetupPacket {
        let regs = &*self.registers;
        let word = |lo: &ReadOnly<u32, Byte::Register>, hi: &ReadOnly<u32, Byte::Register>| {
            (lo.read(Byte::VALUE) | hi.read(Byte::VALUE) << 8) as u16
        };
        SetupPacket {
            request_type: regs.bmrequesttype.read(Byte::VALUE) as u8,
            request: regs.brequest.read(Byte::VALUE) as u8,
            value: word(&regs.wvaluel, &regs.wvalueh),
            index: word(&regs.windexl, &regs.windexh),
            length: word(&regs.wlengthl, &regs.wlengthh),
        }
    }

    /// Bytes received on a non-isochronous OUT endpoint.
    pub fn epout_size_get(&self, ep: Endpoint) -> Result<usize, ErrorCode> {
        if ep.is_in() || ep.is_iso() {
            return Err(ErrorCode::INVAL);
        }
        Ok(self.registers.size_epout[ep.index()].read(EndpointSize::SIZE) as usize)
    }

    /// Bytes received on the isochronous OUT endpoint in the last frame.
    /// `None` if nothing arrived, `Some(0)` for a zero length packet.
    pub fn episoout_size_get(&self) -> Option<usize> {
        let size = self.registers.size_isoout.extract();
        match size.read(IsoEndpointSize::SIZE) {
            0 if !size.is_set(IsoEndpointSize::ZERO) => None,
            n => Some(n as usize),
        }
    }

    /// Let the host send the next packet to a non-isochronous OUT endpoint.
    pub fn epout_clear(&self, ep: Endpoint) -> Result<(), ErrorCode> {
        if ep.is_in() || ep.is_iso() {
            return Err(ErrorCode::INVAL);
        }
        self.registers.size_epout[ep.index()].set(0);
        Ok(())
    }

    pub fn pullup_enable(&self) {
        self.registers
            .usbpullup
            .write(UsbPullup::CONNECT::Enabled);
    }

    pub fn pullup_disable(&self) {
        self.registers
            .usbpullup
            .write(UsbPullup::CONNECT::Disabled);
    }

    pub fn pullup_check(&self) -> bool {
        self.registers
            .usbpullup
            .matches_all(UsbPullup::CONNECT::Enabled)
    }

    pub fn dpdmvalue_set(&self, state: DpDmState) {
        self.registers
            .dpdmvalue
            .write(DpDmValue::STATE.val(state as u32));
    }

    /// Isochronous endpoints have no data toggle.
    pub fn dtoggle_set(&self, ep: Endpoint, toggle: DataToggle) -> Result<(), ErrorCode> {
        if ep.is_iso() {
            return Err(ErrorCode::INVAL);
        }
        let value = match toggle {
            DataToggle::Data0 => Toggle::VALUE::Data0,
            DataToggle::Data1 => Toggle::VALUE::Data1,
        };
        self.registers.dtoggle.write(
            Toggle::EP.val(ep.index() as u32) + Toggle::IO.val(ep.is_in() as u32) + value,
        );
        Ok(())
    }

    /// Select `ep` in DTOGGLE and read back its data toggle. `None` for the
    /// isochronous endpoints.
    pub fn dtoggle_get(&self, ep: Endpoint) -> Option<DataToggle> {
        if ep.is_iso() {
            return None;
        }
        self.registers.dtoggle.write(
            Toggle::EP.val(ep.index() as u32)
                + Toggle::IO.val(ep.is_in() as u32)
                + Toggle::VALUE::Nop,
        );
        match self.registers.dtoggle.read_as_enum(Toggle::VALUE) {
            Some(Toggle::VALUE::Value::Data0) => Some(DataToggle::Data0),
            Some(Toggle::VALUE::Value::Data1) => Some(DataToggle::Data1),
            _ => None,
        }
    }

    pub fn isosplit_set(&self, mode: IsoSplitMode) {
        self.registers
            .isosplit
            .write(IsoSplit::SPLIT.val(mode as u32));
    }

    pub fn isosplit_get(&self) -> IsoSplitMode {
        match self.registers.isosplit.read(IsoSplit::SPLIT) {
            0x0080 => IsoSplitMode::HalfIn,
            _ => IsoSplitMode::OneDir,
        }
    }

    pub fn framecntr_get(&self) -> u32 {
        self.registers.framecntr.read(FrameCounter::FRAMECNTR)
    }

    /// Enter low power mode. Only valid while the bus is suspended.
    pub fn lowpower_enable(&self) {
        self.registers.lowpower.write(LowPower::LOWPOWER::LowPower);
    }

    pub fn lowpower_disable(&self) {
        self.registers
            .lowpower
            .write(LowPower::LOWPOWER::ForceNormal);
    }

    pub fn lowpower_check(&self) -> bool {
        self.registers
            .lowpower
            .matches_all(LowPower::LOWPOWER::LowPower)
    }

    pub fn isoinconfig_set(&self, response: IsoInResponse) {
        self.registers
            .isoinconfig
            .write(IsoInConfig::RESPONSE.val(response as u32));
    }

    pub fn isoinconfig_get(&self) -> IsoInResponse {
        if self.registers.isoinconfig.read(IsoInConfig::RESPONSE) == 1 {
            IsoInResponse::ZeroData
        } else {
            IsoInResponse::NoResp
        }
    }

    fn ep_dma(&self, ep: Endpoint) -> &EndpointRegisters {
        match (ep.is_in(), ep.is_iso()) {
            (true, true) => &self.registers.isoin,
            (true, false) => &self.registers.epin[ep.index()],
            (false, true) => &self.registers.isoout,
            (false, false) => &self.registers.epout[ep.index()],
        }
    }

    /// Point the EasyDMA channel of `ep` at `maxcnt` bytes of RAM at `ptr`.
    /// Takes effect when the endpoint's start task is triggered. `SIZE` if
    /// `maxcnt` is past [`EP_MAXCNT`], or [`ISO_MAXCNT`] for isochronous
    /// endpoints.
    pub fn ep_easydma_set(&self, ep: Endpoint, ptr: u32, maxcnt: u32) -> Result<(), ErrorCode> {
        let limit = if ep.is_iso() { ISO_MAXCNT } else { EP_MAXCNT };
        if maxcnt > limit {
            return Err(ErrorCode::SIZE);
        }
        let dma = self.ep_dma(ep);
        dma.ptr.set(ptr);
        dma.maxcnt.write(Count::MAXCNT.val(maxcnt));
        log::trace!("usbd ep {:#04x}: dma {:#010x} len {}", ep.address(), ptr, maxcnt);
        Ok(())
    }

    /// Bytes moved by the last EasyDMA transfer of `ep`.
    pub fn ep_amount_get(&self, ep: Endpoint) -> u32 {
        self.ep_dma(ep).amount.read(Amount::AMOUNT)
    }

    pub fn inten_get(&self) -> u32 {
        self.registers.inten.get()
    }

    pub fn inten_modify(&self, value: FieldValue<u32, Interrupt::Register>) {
        self.registers.inten.modify(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_utils::fake;
    use core::mem::{offset_of, size_of};

    fn usbd() -> Usbd {
        Usbd::new(fake::registers::<UsbdRegisters>())
    }

    fn epin(n: u8) -> Endpoint {
        Endpoint::epin(n).unwrap()
    }

    fn epout(n: u8) -> Endpoint {
        Endpoint::epout(n).unwrap()
    }

    #[test]
    fn register_layout() {
        assert_eq!(size_of::<EndpointRegisters>(), 0x14);
        assert_eq!(offset_of!(UsbdRegisters, eventcause), 0x400);
        assert_eq!(offset_of!(UsbdRegisters, halted_epout), 0x444);
        assert_eq!(offset_of!(UsbdRegisters, epstatus), 0x468);
        assert_eq!(offset_of!(UsbdRegisters, size_isoout), 0x4C0);
        assert_eq!(offset_of!(UsbdRegisters, framecntr), 0x520);
        assert_eq!(offset_of!(UsbdRegisters, isoinconfig), 0x530);
        assert_eq!(offset_of!(UsbdRegisters, isoin), 0x6A0);
        assert_eq!(offset_of!(UsbdRegisters, isoout), 0x7A0);
    }

    #[test]
    fn task_and_event_offsets() {
        assert_eq!(
            UsbdTask::StartEp(epin(3)).offset(),
            offset_of!(UsbdRegisters, tasks_startepin) + 12
        );
        assert_eq!(
            UsbdTask::StartEp(Endpoint::ISO_OUT).offset(),
            offset_of!(UsbdRegisters, tasks_startisoout)
        );
        assert_eq!(
            UsbdTask::DpDmNoDrive.offset(),
            offset_of!(UsbdRegisters, tasks_dpdmnodrive)
        );
        assert_eq!(
            UsbdEvent::EndEp(epout(7)).offset(),
            offset_of!(UsbdRegisters, events_endepout) + 28
        );
        assert_eq!(
            UsbdEvent::EpData.offset(),
            offset_of!(UsbdRegisters, events_epdata)
        );
    }

    #[test]
    fn endpoint_addresses() {
        let ep = epin(2);
        assert_eq!(ep.address(), 0x82);
        assert!(ep.is_in());
        assert!(!ep.is_iso());
        assert!(epout(8).is_iso());
        assert_eq!(Endpoint::from_address(0x81), Ok(epin(1)));
        assert_eq!(Endpoint::epin(9), Err(ErrorCode::INVAL));
        assert_eq!(Endpoint::epout(0x10), Err(ErrorCode::INVAL));
        assert_eq!(Endpoint::from_address(0x09), Err(ErrorCode::INVAL));
        assert_eq!(Endpoint::from_address(0x41), Err(ErrorCode::INVAL));
    }

    #[test]
    fn endpoint_tasks_events_and_masks() {
        assert_eq!(ep_start_task(epin(4)), UsbdTask::StartEp(epin(4)));
        assert_eq!(ep_end_event(epout(1)), UsbdEvent::EndEp(epout(1)));
        assert_eq!(ep_int_mask(epin(0)).value, 1 << 2);
        assert_eq!(ep_int_mask(epin(8)).value, 1 << 11);
        assert_eq!(ep_int_mask(epout(7)).value, 1 << 19);
        assert_eq!(ep_int_mask(epout(8)).value, 1 << 20);
        assert_eq!(ep_status_mask(epout(2)), 1 << 18);
    }

    #[test]
    fn event_get_and_clear() {
        let usbd = usbd();
        assert!(!usbd.event_get_and_clear(UsbdEvent::Ep0Setup));
        fake::write(&usbd.registers, 0x15C, 1);
        assert!(usbd.event_get_and_clear(UsbdEvent::Ep0Setup));
        assert_eq!(fake::read(&usbd.registers, 0x15C), 0);
    }

    #[test]
    fn stall_and_dtoggle_encoding() {
        let usbd = usbd();
        assert_eq!(usbd.ep_stall(epin(3)), Ok(()));
        assert_eq!(fake::read(&usbd.registers, 0x518), 0x183);
        assert_eq!(usbd.ep_unstall(epout(3)), Ok(()));
        assert_eq!(fake::read(&usbd.registers, 0x518), 0x003);

        assert_eq!(usbd.dtoggle_set(epin(1), DataToggle::Data1), Ok(()));
        assert_eq!(fake::read(&usbd.registers, 0x50C), 0x281);
        assert_eq!(usbd.dtoggle_set(epout(5), DataToggle::Data0), Ok(()));
        assert_eq!(fake::read(&usbd.registers, 0x50C), 0x105);
    }

    #[test]
    fn iso_endpoints_have_no_stall_or_toggle() {
        let usbd = usbd();
        assert_eq!(usbd.ep_stall(Endpoint::ISO_IN), Err(ErrorCode::INVAL));
        assert_eq!(usbd.ep_unstall(Endpoint::ISO_OUT), Err(ErrorCode::INVAL));
        assert_eq!(fake::read(&usbd.registers, 0x518), 0);

        assert_eq!(
            usbd.dtoggle_set(Endpoint::ISO_IN, DataToggle::Data1),
            Err(ErrorCode::INVAL)
        );
        assert_eq!(usbd.dtoggle_get(Endpoint::ISO_OUT), None);
        assert_eq!(fake::read(&usbd.registers, 0x50C), 0);
    }

    #[test]
    fn endpoint_tasks_and_events_are_distinct() {
        let tasks = [
            UsbdTask::StartEp(Endpoint::EP0_IN),
            UsbdTask::StartEp(epin(7)),
            UsbdTask::StartEp(Endpoint::ISO_IN),
            UsbdTask::StartEp(Endpoint::EP0_OUT),
            UsbdTask::StartEp(epout(7)),
            UsbdTask::StartEp(Endpoint::ISO_OUT),
            UsbdTask::Ep0RcvOut,
        ];
        let offsets = tasks.map(|task| task.offset());
        assert_eq!(offsets, [0x004, 0x020, 0x024, 0x028, 0x044, 0x048, 0x04C]);
        assert_eq!(
            UsbdTask::StartEp(Endpoint::ISO_IN).offset(),
            offset_of!(UsbdRegisters, tasks_startisoin)
        );

        let events = [
            UsbdEvent::EndEp(epin(7)),
            UsbdEvent::Ep0DataDone,
            UsbdEvent::EndEp(Endpoint::ISO_IN),
            UsbdEvent::EndEp(Endpoint::EP0_OUT),
            UsbdEvent::EndEp(Endpoint::ISO_OUT),
            UsbdEvent::Sof,
        ];
        let offsets = events.map(|event| event.offset());
        assert_eq!(offsets, [0x124, 0x128, 0x12C, 0x130, 0x150, 0x154]);
        assert!(offsets.iter().all(|&o| o + 4 <= size_of::<UsbdRegisters>()));
    }

    #[test]
    fn halt_state() {
        let usbd = usbd();
        fake::write(&usbd.registers, 0x444 + 4 * 2, 1);
        assert!(usbd.ep_stall_check(epout(2)));
        assert!(!usbd.ep_stall_check(epin(2)));
        assert_eq!(usbd.halt_check(epin(8)), 0);
    }

    #[test]
    fn endpoint_enable_bits() {
        let usbd = usbd();
        usbd.ep_enable(epin(8));
        usbd.ep_enable(epout(3));
        assert_eq!(fake::read(&usbd.registers, 0x510), 1 << 8);
        assert_eq!(fake::read(&usbd.registers, 0x514), 1 << 3);
        assert!(usbd.ep_enable_check(epout(3)));
        usbd.ep_disable(epout(3));
        assert!(!usbd.ep_enable_check(epout(3)));
        usbd.ep_all_disable();
        assert_eq!(fake::read(&usbd.registers, 0x510), 1);
    }

    #[test]
    fn status_registers_clear_what_they_report() {
        let usbd = usbd();
        fake::write(&usbd.registers, 0x46C, 0x0002_0004);
        assert_eq!(usbd.epdatastatus_get_and_clear(), 0x0002_0004);
        // Write one to clear: the value read is written back.
        assert_eq!(fake::read(&usbd.registers, 0x46C), 0x0002_0004);

        fake::write(&usbd.registers, 0x400, 1 << 8);
        assert!(usbd.eventcause_get_and_clear().is_set(EventCause::SUSPEND));
    }

    #[test]
    fn setup_packet_assembly() {
        let usbd = usbd();
        for (i, byte) in [0x80u32, 0x06, 0x00, 0x01, 0x00, 0x00, 0x40, 0x00]
            .iter()
            .enumerate()
        {
            fake::write(&usbd.registers, 0x480 + 4 * i, *byte);
        }
        assert_eq!(
            usbd.setup_get(),
            SetupPacket {
                request_type: 0x80,
                request: 0x06,
                value: 0x0100,
                index: 0,
                length: 0x40,
            }
        );
    }

    #[test]
    fn out_sizes() {
        let usbd = usbd();
        fake::write(&usbd.registers, 0x4A0 + 4, 64);
        assert_eq!(usbd.epout_size_get(epout(1)), Ok(64));
        assert_eq!(
            usbd.epout_size_get(epin(1)),
            Err(ErrorCode::INVAL)
        );
        assert_eq!(usbd.epout_clear(epout(1)), Ok(()));
        assert_eq!(usbd.epout_size_get(epout(1)), Ok(0));

        assert_eq!(usbd.episoout_size_get(), None);
        fake::write(&usbd.registers, 0x4C0, 1 << 16);
        assert_eq!(usbd.episoout_size_get(), Some(0));
        fake::write(&usbd.registers, 0x4C0, 300);
        assert_eq!(usbd.episoout_size_get(), Some(300));
    }

    #[test]
    fn easydma_channels() {
        let usbd = usbd();
        assert_eq!(usbd.ep_easydma_set(epin(1), 0x2000_0100, 64), Ok(()));
        assert_eq!(fake::read(&usbd.registers, 0x600 + 0x14), 0x2000_0100);
        assert_eq!(fake::read(&usbd.registers, 0x604 + 0x14), 64);

        assert_eq!(usbd.ep_easydma_set(Endpoint::ISO_OUT, 0x2000_0400, 512), Ok(()));
        assert_eq!(fake::read(&usbd.registers, 0x7A0), 0x2000_0400);
        assert_eq!(fake::read(&usbd.registers, 0x7A4), 512);

        fake::write(&usbd.registers, 0x708 + 2 * 0x14, 17);
        assert_eq!(usbd.ep_amount_get(epout(2)), 17);
    }

    #[test]
    fn easydma_length_past_the_channel_limit() {
        let usbd = usbd();
        assert_eq!(
            usbd.ep_easydma_set(epout(1), 0x2000_0100, 65),
            Err(ErrorCode::SIZE)
        );
        assert_eq!(
            usbd.ep_easydma_set(Endpoint::ISO_IN, 0x2000_0100, 1024),
            Err(ErrorCode::SIZE)
        );
        assert_eq!(fake::read(&usbd.registers, 0x700 + 0x14), 0);
        assert_eq!(fake::read(&usbd.registers, 0x6A4), 0);
        assert_eq!(usbd.ep_easydma_set(Endpoint::ISO_IN, 0x2000_0100, 1023), Ok(()));
        assert_eq!(fake::read(&usbd.registers, 0x6A4), 1023);
    }

    #[test]
    fn misc_configuration() {
        let usbd = usbd();
        usbd.enable();
        assert!(usbd.enable_check());
        usbd.pullup_enable();
        assert!(usbd.pullup_check());
        usbd.isosplit_set(IsoSplitMode::HalfIn);
        assert_eq!(usbd.isosplit_get(), IsoSplitMode::HalfIn);
        usbd.isoinconfig_set(IsoInResponse::ZeroData);
        assert_eq!(usbd.isoinconfig_get(), IsoInResponse::ZeroData);
        usbd.lowpower_enable();
        assert!(usbd.lowpower_check());
        usbd.lowpower_disable();
        assert!(!usbd.lowpower_check());
        fake::write(&usbd.registers, 0x520, 0x7FF);
        assert_eq!(usbd.framecntr_get(), 0x7FF);

        usbd.shorts_enable(Shorts::EP0DATADONE_EP0STATUS::SET + Shorts::ENDEPOUT0_EP0RCVOUT::SET);
        assert_eq!(usbd.shorts_get(), 0b10100);
        usbd.shorts_disable(Shorts::EP0DATADONE_EP0STATUS::SET);
        assert_eq!(usbd.shorts_get(), 0b10000);
    }
}
