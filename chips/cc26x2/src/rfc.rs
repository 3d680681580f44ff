// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! RF Core doorbell
//!
//! The radio is run by a separate Cortex-M0 executing TI firmware. The
//! system CPU talks to it through the doorbell: a pointer to a command
//! structure in shared RAM (or a direct command word) is written to CMDR,
//! the RF Core acknowledges through RFACKIFG and reports whether it accepted
//! the command in CMDSTA. Progress of radio operations is then reported
//! through the CPE interrupt flags and the `status` field of the command.
//!
//! This driver only moves commands and interrupts across the doorbell. What
//! the commands do is up to the firmware.

use hal_utils::cells::OptionalCell;
use hal_utils::registers::interfaces::{ReadWriteable, Readable, Writeable};
use hal_utils::registers::{register_bitfields, register_structs, FieldValue, ReadOnly, ReadWrite};
use hal_utils::{ErrorCode, StaticRef};

use crate::radio::common::{CMD_ABORT, CMD_BUS_REQUEST, CMD_GET_RSSI, CMD_PING, CMD_STOP};
use crate::radio::mailbox::{CmdstaResult, DirectCommand, ImmediateCommand, RadioCommand};

register_structs! {
    pub RfcDbellRegisters {
        /// Command pointer or direct command word
        (0x00 => cmdr: ReadWrite<u32>),
        (0x04 => cmdsta: ReadOnly<u32, Status::Register>),
        (0x08 => rfhwifg: ReadWrite<u32, RfHwInterrupts::Register>),
        (0x0C => rfhwien: ReadWrite<u32, RfHwInterrupts::Register>),
        (0x10 => rfcpeifg: ReadWrite<u32, CpeInterrupts::Register>),
        (0x14 => rfcpeien: ReadWrite<u32, CpeInterrupts::Register>),
        /// Set bits route the flag to CPE1 instead of CPE0
        (0x18 => rfcpeisl: ReadWrite<u32, CpeInterrupts::Register>),
        (0x1C => rfackifg: ReadWrite<u32, CmdAck::Register>),
        (0x20 => sysgpoctl: ReadWrite<u32, Gpo::Register>),
        (0x24 => @END),
    },
    pub RfcPwcRegisters {
        (0x00 => pwmclken: ReadWrite<u32, ClockEnable::Register>),
        (0x04 => @END),
    }
}

register_bitfields![u32,
    Status [
        RESULT OFFSET(0) NUMBITS(8) [],
        RETBYTE1 OFFSET(8) NUMBITS(8) [],
        RETBYTE2 OFFSET(16) NUMBITS(8) [],
        RETBYTE3 OFFSET(24) NUMBITS(8) []
    ],
    pub RfHwInterrupts [
        /// Frequency synthesizer calibration accelerator
        FSCA OFFSET(1) NUMBITS(1) [],
        MDMDONE OFFSET(2) NUMBITS(1) [],
        MDMIN OFFSET(3) NUMBITS(1) [],
        MDMOUT OFFSET(4) NUMBITS(1) [],
        MDMSOFT OFFSET(5) NUMBITS(1) [],
        TRCTK OFFSET(6) NUMBITS(1) [],
        RFEDONE OFFSET(8) NUMBITS(1) [],
        RFESOFT0 OFFSET(9) NUMBITS(1) [],
        RFESOFT1 OFFSET(10) NUMBITS(1) [],
        RFESOFT2 OFFSET(11) NUMBITS(1) [],
        RATCH0 OFFSET(12) NUMBITS(1) [],
        RATCH1 OFFSET(13) NUMBITS(1) [],
        RATCH2 OFFSET(14) NUMBITS(1) [],
        RATCH3 OFFSET(15) NUMBITS(1) [],
        RATCH4 OFFSET(16) NUMBITS(1) [],
        RATCH5 OFFSET(17) NUMBITS(1) [],
        RATCH6 OFFSET(18) NUMBITS(1) [],
        RATCH7 OFFSET(19) NUMBITS(1) []
    ],
    pub CpeInterrupts [
        /// A radio operation in a chain has finished
        COMMAND_DONE OFFSET(0) NUMBITS(1) [],
        LAST_COMMAND_DONE OFFSET(1) NUMBITS(1) [],
        /// IEEE 802.15.4 foreground operations
        FG_COMMAND_DONE OFFSET(2) NUMBITS(1) [],
        LAST_FG_COMMAND_DONE OFFSET(3) NUMBITS(1) [],
        TX_DONE OFFSET(4) NUMBITS(1) [],
        TX_ACK OFFSET(5) NUMBITS(1) [],
        TX_CTRL OFFSET(6) NUMBITS(1) [],
        TX_CTRL_ACK OFFSET(7) NUMBITS(1) [],
        TX_CTRL_ACK_ACK OFFSET(8) NUMBITS(1) [],
        TX_RETRANS OFFSET(9) NUMBITS(1) [],
        TX_ENTRY_DONE OFFSET(10) NUMBITS(1) [],
        /// CMD_BLE_ADV_PAYLOAD took effect
        TX_BUFFER_CHANGED OFFSET(11) NUMBITS(1) [],
        BG_COMMAND_SUSPENDED OFFSET(12) NUMBITS(1) [],
        IRQ13 OFFSET(13) NUMBITS(1) [],
        IRQ14 OFFSET(14) NUMBITS(1) [],
        IRQ15 OFFSET(15) NUMBITS(1) [],
        RX_OK OFFSET(16) NUMBITS(1) [],
        RX_NOK OFFSET(17) NUMBITS(1) [],
        RX_IGNORED OFFSET(18) NUMBITS(1) [],
        RX_EMPTY OFFSET(19) NUMBITS(1) [],
        RX_CTRL OFFSET(20) NUMBITS(1) [],
        RX_CTRL_ACK OFFSET(21) NUMBITS(1) [],
        RX_BUF_FULL OFFSET(22) NUMBITS(1) [],
        RX_ENTRY_DONE OFFSET(23) NUMBITS(1) [],
        RX_DATA_WRITTEN OFFSET(24) NUMBITS(1) [],
        RX_N_DATA_WRITTEN OFFSET(25) NUMBITS(1) [],
        RX_ABORTED OFFSET(26) NUMBITS(1) [],
        IRQ27 OFFSET(27) NUMBITS(1) [],
        SYNTH_NO_LOCK OFFSET(28) NUMBITS(1) [],
        MODULES_UNLOCKED OFFSET(29) NUMBITS(1) [],
        BOOT_DONE OFFSET(30) NUMBITS(1) [],
        /// The CPE needs a reset
        INTERNAL_ERROR OFFSET(31) NUMBITS(1) []
    ],
    CmdAck [
        CMDACK OFFSET(0) NUMBITS(1) []
    ],
    Gpo [
        GPOCTL0 OFFSET(0) NUMBITS(4) [],
        GPOCTL1 OFFSET(4) NUMBITS(4) [],
        GPOCTL2 OFFSET(8) NUMBITS(4) [],
        GPOCTL3 OFFSET(12) NUMBITS(4) []
    ],
    pub ClockEnable [
        RFC OFFSET(0) NUMBITS(1) [],
        /// Set together with CPERAM to boot the CPE
        CPE OFFSET(1) NUMBITS(1) [],
        CPERAM OFFSET(2) NUMBITS(1) [],
        MDM OFFSET(3) NUMBITS(1) [],
        MDMRAM OFFSET(4) NUMBITS(1) [],
        RFE OFFSET(5) NUMBITS(1) [],
        RFERAM OFFSET(6) NUMBITS(1) [],
        RAT OFFSET(7) NUMBITS(1) [],
        PHA OFFSET(8) NUMBITS(1) [],
        FSCA OFFSET(9) NUMBITS(1) [],
        RFCTRC OFFSET(10) NUMBITS(1) []
    ]
];

pub const RFC_PWC_BASE: StaticRef<RfcPwcRegisters> =
    unsafe { StaticRef::new(0x4004_0000 as *const RfcPwcRegisters) };
pub const RFC_DBELL_BASE: StaticRef<RfcDbellRegisters> =
    unsafe { StaticRef::new(0x4004_1000 as *const RfcDbellRegisters) };

/// Start of the RF Core RAM as seen from the system CPU.
pub const RFC_RAM_BASE: usize = 0x2100_0000;

/// Signals that can be routed to the RF Core GPO pins.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum GpoSource {
    CpeGpo0 = 0x0,
    CpeGpo1 = 0x1,
    CpeGpo2 = 0x2,
    CpeGpo3 = 0x3,
    MceGpo0 = 0x4,
    MceGpo1 = 0x5,
    MceGpo2 = 0x6,
    MceGpo3 = 0x7,
    RfeGpo0 = 0x8,
    RfeGpo1 = 0x9,
    RfeGpo2 = 0xA,
    RfeGpo3 = 0xB,
    RatGpo0 = 0xC,
    RatGpo1 = 0xD,
    RatGpo2 = 0xE,
    RatGpo3 = 0xF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfcInterrupt {
    Cpe0,
    Cpe1,
    CmdAck,
    Hardware,
}

pub trait RFCoreClient {
    /// The RF Core answered a command posted without waiting.
    fn command_acknowledged(&self, result: Result<u32, ErrorCode>);
    /// A radio operation in a chain finished.
    fn command_done(&self);
    /// The last radio operation of a chain finished.
    fn last_command_done(&self);
    /// The CPE reported an internal error and must be restarted.
    fn internal_error(&self) {}
}

/// Interpret a CMDSTA word. On success the whole word is returned, the
/// upper three bytes carry command specific return values.
pub fn cmdsta_to_result(cmdsta: u32) -> Result<u32, ErrorCode> {
    match CmdstaResult::try_from(cmdsta as u8) {
        Ok(CmdstaResult::Done) => Ok(cmdsta),
        Ok(CmdstaResult::Pending) => Err(ErrorCode::BUSY),
        Ok(CmdstaResult::IllegalPointer) => Err(ErrorCode::INVAL),
        Ok(CmdstaResult::UnknownCommand) => Err(ErrorCode::NOSUPPORT),
        Ok(CmdstaResult::UnknownDirCommand) => Err(ErrorCode::NOSUPPORT),
        Ok(CmdstaResult::ContextError) => Err(ErrorCode::OFF),
        Ok(CmdstaResult::SchedulingError) => Err(ErrorCode::BUSY),
        Ok(CmdstaResult::ParError) => Err(ErrorCode::INVAL),
        Ok(CmdstaResult::QueueError) => Err(ErrorCode::FAIL),
        Ok(CmdstaResult::QueueBusy) => Err(ErrorCode::BUSY),
        Err(_) => Err(ErrorCode::FAIL),
    }
}

pub struct RFCore<'a> {
    dbell: StaticRef<RfcDbellRegisters>,
    pwc: StaticRef<RfcPwcRegisters>,
    client: OptionalCell<&'a dyn RFCoreClient>,
}

impl<'a> RFCore<'a> {
    pub const fn new(
        dbell: StaticRef<RfcDbellRegisters>,
        pwc: StaticRef<RfcPwcRegisters>,
    ) -> RFCore<'a> {
        RFCore {
            dbell,
            pwc,
            client: OptionalCell::empty(),
        }
    }

    pub fn set_client(&self, client: &'a dyn RFCoreClient) {
        self.client.set(client);
    }

    /// Clock every RF Core module except the tracer. The RFC power domain
    /// must already be on.
    pub fn enable_clocks(&self) {
        self.pwc.pwmclken.write(
            ClockEnable::RFC::SET
                + ClockEnable::CPE::SET
                + ClockEnable::CPERAM::SET
                + ClockEnable::MDM::SET
                + ClockEnable::MDMRAM::SET
                + ClockEnable::RFE::SET
                + ClockEnable::RFERAM::SET
                + ClockEnable::RAT::SET
                + ClockEnable::PHA::SET
                + ClockEnable::FSCA::SET,
        );
    }

    pub fn disable_clocks(&self) {
        self.pwc.pwmclken.set(0);
    }

    pub fn clocks_enabled(&self) -> bool {
        self.pwc.pwmclken.is_set(ClockEnable::CPE)
    }

    /// Hand a radio operation to the RF Core and wait for it to be accepted.
    ///
    /// The command must stay in place, and must not be touched other than
    /// through volatile reads of its status, until the RF Core reports it
    /// done.
    pub fn post<C: RadioCommand>(&self, command: &mut C) -> Result<(), ErrorCode> {
        log::debug!("rfc: post radio op {:#06x}", C::COMMAND_NO);
        self.post_pointer(command.address()).map(|_| ())
    }

    /// Hand an immediate command to the RF Core. Results the firmware
    /// writes back into the structure are valid once this returns `Ok`.
    pub fn post_immediate<C: ImmediateCommand>(&self, command: &mut C) -> Result<u32, ErrorCode> {
        log::debug!("rfc: post immediate {:#06x}", C::COMMAND_NO);
        self.post_pointer(command.address())
    }

    pub fn post_direct(&self, command: DirectCommand) -> Result<u32, ErrorCode> {
        log::debug!("rfc: post direct {:#06x}", command.command_no());
        self.submit(command.value())
    }

    fn post_pointer(&self, address: u32) -> Result<u32, ErrorCode> {
        if address & 0x3 != 0 {
            return Err(ErrorCode::INVAL);
        }
        self.submit(address)
    }

    /// Write CMDR and spin until the RF Core acknowledges.
    fn submit(&self, word: u32) -> Result<u32, ErrorCode> {
        self.send(word)?;
        self.wait_ack(word)
    }

    /// Clear any stale acknowledgement and ring the doorbell.
    fn send(&self, word: u32) -> Result<(), ErrorCode> {
        if self.dbell.cmdr.get() != 0 {
            return Err(ErrorCode::BUSY);
        }
        self.ack_interrupt();
        self.dbell.cmdr.set(word);
        Ok(())
    }

    fn wait_ack(&self, word: u32) -> Result<u32, ErrorCode> {
        while !self.dbell.rfackifg.is_set(CmdAck::CMDACK) {}
        self.ack_interrupt();

        let result = cmdsta_to_result(self.dbell.cmdsta.get());
        if let Err(e) = result {
            log::warn!(
                "rfc: command {:#010x} rejected, cmdsta {:#04x}: {:?}",
                word,
                self.dbell.cmdsta.read(Status::RESULT),
                e
            );
        }
        result
    }

    /// Write CMDR and return at once. The outcome is delivered through
    /// `command_acknowledged` when the CmdAck interrupt fires.
    pub fn post_nowait<C: RadioCommand>(&self, command: &mut C) -> Result<(), ErrorCode> {
        let address = command.address();
        if address & 0x3 != 0 {
            return Err(ErrorCode::INVAL);
        }
        log::debug!("rfc: post radio op {:#06x}, no wait", C::COMMAND_NO);
        self.send(address)
    }

    /// Result of the last command accepted or rejected by the RF Core.
    pub fn cmdsta(&self) -> Result<u32, ErrorCode> {
        cmdsta_to_result(self.dbell.cmdsta.get())
    }

    pub fn ack_interrupt(&self) {
        self.dbell.rfackifg.set(0);
    }

    pub fn ping(&self) -> Result<(), ErrorCode> {
        self.post_direct(DirectCommand::new(CMD_PING)).map(|_| ())
    }

    /// Keep the system bus powered for the RF Core while the system CPU
    /// sleeps.
    pub fn bus_request(&self, needed: bool) -> Result<(), ErrorCode> {
        self.post_direct(DirectCommand::with_u8(CMD_BUS_REQUEST, needed as u8))
            .map(|_| ())
    }

    /// Current RSSI in dBm.
    pub fn get_rssi(&self) -> Result<i8, ErrorCode> {
        self.post_direct(DirectCommand::new(CMD_GET_RSSI)).map(rssi)
    }

    /// End the running operation at once.
    pub fn abort(&self) -> Result<(), ErrorCode> {
        self.post_direct(DirectCommand::new(CMD_ABORT)).map(|_| ())
    }

    /// End the running operation gracefully.
    pub fn stop(&self) -> Result<(), ErrorCode> {
        self.post_direct(DirectCommand::new(CMD_STOP)).map(|_| ())
    }

    pub fn enable_cpe_interrupts(&self, mask: FieldValue<u32, CpeInterrupts::Register>) {
        self.dbell.rfcpeien.modify(mask);
    }

    pub fn disable_cpe_interrupts(&self, mask: FieldValue<u32, CpeInterrupts::Register>) {
        let enabled = self.dbell.rfcpeien.get();
        self.dbell.rfcpeien.set(enabled & !mask.value);
        self.clear_cpe_interrupts(mask.value);
    }

    /// Route the flags in `mask` to the CPE1 interrupt line, the rest to CPE0.
    pub fn cpe_vector_select(&self, mask: FieldValue<u32, CpeInterrupts::Register>) {
        self.dbell.rfcpeisl.set(mask.value);
    }

    pub fn enable_hw_interrupts(&self, mask: FieldValue<u32, RfHwInterrupts::Register>) {
        self.dbell.rfhwien.modify(mask);
    }

    pub fn disable_hw_interrupts(&self) {
        self.dbell.rfhwien.set(0);
        self.dbell.rfhwifg.set(0);
    }

    pub fn gpo_select(&self, gpo: usize, source: GpoSource) {
        let field = match gpo {
            0 => Gpo::GPOCTL0,
            1 => Gpo::GPOCTL1,
            2 => Gpo::GPOCTL2,
            _ => Gpo::GPOCTL3,
        };
        self.dbell.sysgpoctl.modify(field.val(source as u32));
    }

    // Flags are cleared by writing 0, ones leave a flag untouched.
    fn clear_cpe_interrupts(&self, flags: u32) {
        self.dbell.rfcpeifg.set(!flags);
    }

    pub fn handle_interrupt(&self, interrupt: RfcInterrupt) {
        match interrupt {
            RfcInterrupt::CmdAck => {
                let result = self.cmdsta();
                self.ack_interrupt();
                self.client
                    .map(|client| client.command_acknowledged(result));
            }
            RfcInterrupt::Cpe0 => {
                let flags = self.dbell.rfcpeifg.get() & !self.dbell.rfcpeisl.get();
                self.clear_cpe_interrupts(flags);
                let flags = CpeFlags::new(flags);
                if flags.is_set(CpeInterrupts::COMMAND_DONE) {
                    self.client.map(|client| client.command_done());
                }
                if flags.is_set(CpeInterrupts::LAST_COMMAND_DONE) {
                    self.client.map(|client| client.last_command_done());
                }
            }
            RfcInterrupt::Cpe1 => {
                let flags = self.dbell.rfcpeifg.get() & self.dbell.rfcpeisl.get();
                self.clear_cpe_interrupts(flags);
                if CpeFlags::new(flags).is_set(CpeInterrupts::INTERNAL_ERROR) {
                    log::error!("rfc: CPE internal error");
                    self.client.map(|client| client.internal_error());
                }
            }
            RfcInterrupt::Hardware => {
                let flags = self.dbell.rfhwifg.get();
                log::trace!("rfc: hardware interrupt {:#x}", flags);
                self.dbell.rfhwifg.set(!flags);
            }
        }
    }
}

type CpeFlags = hal_utils::registers::LocalRegisterCopy<u32, CpeInterrupts::Register>;

/// RSSI byte returned in CMDSTA bits 16..24.
fn rssi(cmdsta: u32) -> i8 {
    (cmdsta >> 16) as u8 as i8
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use hal_utils::fake;
    use crate::radio::common::{CmdGetFwInfo, CmdNop};
    use core::cell::Cell;
    use core::mem::offset_of;

    fn rfcore() -> RFCore<'static> {
        RFCore::new(
            fake::registers::<RfcDbellRegisters>(),
            fake::registers::<RfcPwcRegisters>(),
        )
    }

    #[test]
    fn register_layout() {
        assert_eq!(offset_of!(RfcDbellRegisters, cmdsta), 0x04);
        assert_eq!(offset_of!(RfcDbellRegisters, rfcpeifg), 0x10);
        assert_eq!(offset_of!(RfcDbellRegisters, rfackifg), 0x1C);
        assert_eq!(offset_of!(RfcDbellRegisters, sysgpoctl), 0x20);
    }

    #[test]
    fn clocks() {
        let rfc = rfcore();
        rfc.enable_clocks();
        assert_eq!(fake::read(&rfc.pwc, 0x00), 0x3FF);
        assert!(rfc.clocks_enabled());
        rfc.disable_clocks();
        assert!(!rfc.clocks_enabled());
    }

    #[test]
    fn post_writes_pointer_and_reads_cmdsta() {
        let rfc = rfcore();
        let nop = CmdNop::new();
        assert_eq!(rfc.send(nop.address()), Ok(()));
        assert_eq!(fake::read(&rfc.dbell, 0x00), nop.address());

        fake::write(&rfc.dbell, 0x1C, 1);
        fake::write(&rfc.dbell, 0x04, 0x0000_0101);
        assert_eq!(rfc.wait_ack(nop.address()), Ok(0x0101));
        assert_eq!(fake::read(&rfc.dbell, 0x1C), 0);
    }

    #[test]
    fn stale_ack_is_cleared_before_posting() {
        let rfc = rfcore();
        let info = CmdGetFwInfo::new();
        fake::write(&rfc.dbell, 0x1C, 1);
        fake::write(&rfc.dbell, 0x04, 0x01);

        assert_eq!(rfc.send(info.address()), Ok(()));
        assert_eq!(fake::read(&rfc.dbell, 0x1C), 0);
        assert_eq!(fake::read(&rfc.dbell, 0x00), info.address());

        let mut nop = CmdNop::new();
        fake::write(&rfc.dbell, 0x00, 0);
        fake::write(&rfc.dbell, 0x1C, 1);
        assert_eq!(rfc.post_nowait(&mut nop), Ok(()));
        assert_eq!(fake::read(&rfc.dbell, 0x1C), 0);
    }

    #[test]
    fn rejected_and_busy_commands() {
        let rfc = rfcore();
        let ping = DirectCommand::new(CMD_PING).value();
        assert_eq!(rfc.send(ping), Ok(()));
        assert_eq!(fake::read(&rfc.dbell, 0x00), 0x0406_0001);
        fake::write(&rfc.dbell, 0x1C, 1);
        fake::write(&rfc.dbell, 0x04, 0x82);
        assert_eq!(rfc.wait_ack(ping), Err(ErrorCode::NOSUPPORT));

        // CMDR still holds the ping, the doorbell has not consumed it.
        assert_eq!(rfc.abort(), Err(ErrorCode::BUSY));
        assert_eq!(fake::read(&rfc.dbell, 0x00), 0x0406_0001);
    }

    #[test]
    fn misaligned_pointer_is_refused() {
        let rfc = rfcore();
        assert_eq!(rfc.post_pointer(0x2000_0002), Err(ErrorCode::INVAL));
        assert_eq!(fake::read(&rfc.dbell, 0x00), 0);
    }

    #[test]
    fn direct_commands() {
        assert_eq!(DirectCommand::new(CMD_GET_RSSI).value(), 0x0403_0001);
        assert_eq!(
            DirectCommand::with_u8(CMD_BUS_REQUEST, true as u8).value(),
            0x040E_0101
        );
        assert_eq!(rssi(0x00C4_0001), -60);
        assert_eq!(rssi(0x0014_0001), 20);
    }

    #[test]
    fn cmdsta_mapping() {
        assert_eq!(cmdsta_to_result(0x1234_5601), Ok(0x1234_5601));
        assert_eq!(cmdsta_to_result(0x00), Err(ErrorCode::BUSY));
        assert_eq!(cmdsta_to_result(0x81), Err(ErrorCode::INVAL));
        assert_eq!(cmdsta_to_result(0x85), Err(ErrorCode::OFF));
        assert_eq!(cmdsta_to_result(0x88), Err(ErrorCode::FAIL));
        assert_eq!(cmdsta_to_result(0x7F), Err(ErrorCode::FAIL));
    }

    #[test]
    fn interrupt_masks() {
        let rfc = rfcore();
        rfc.enable_cpe_interrupts(
            CpeInterrupts::COMMAND_DONE::SET + CpeInterrupts::LAST_COMMAND_DONE::SET,
        );
        assert_eq!(fake::read(&rfc.dbell, 0x14), 0b11);
        rfc.disable_cpe_interrupts(CpeInterrupts::COMMAND_DONE::SET);
        assert_eq!(fake::read(&rfc.dbell, 0x14), 0b10);
        assert_eq!(fake::read(&rfc.dbell, 0x10), !0b01);

        rfc.cpe_vector_select(CpeInterrupts::INTERNAL_ERROR::SET);
        assert_eq!(fake::read(&rfc.dbell, 0x18), 1 << 31);

        rfc.gpo_select(2, GpoSource::RatGpo1);
        assert_eq!(fake::read(&rfc.dbell, 0x20), 0xD00);
    }

    struct Recorder {
        acked: Cell<Option<Result<u32, ErrorCode>>>,
        done: Cell<usize>,
        last_done: Cell<usize>,
        errors: Cell<usize>,
    }

    impl RFCoreClient for Recorder {
        fn command_acknowledged(&self, result: Result<u32, ErrorCode>) {
            self.acked.set(Some(result));
        }

        fn command_done(&self) {
            self.done.set(self.done.get() + 1);
        }

        fn last_command_done(&self) {
            self.last_done.set(self.last_done.get() + 1);
        }

        fn internal_error(&self) {
            self.errors.set(self.errors.get() + 1);
        }
    }

    fn recorder() -> &'static Recorder {
        std::boxed::Box::leak(std::boxed::Box::new(Recorder {
            acked: Cell::new(None),
            done: Cell::new(0),
            last_done: Cell::new(0),
            errors: Cell::new(0),
        }))
    }

    #[test]
    fn cpe_interrupts_reach_the_client() {
        let rfc = rfcore();
        let client = recorder();
        rfc.set_client(client);

        fake::write(&rfc.dbell, 0x10, 0b11 | 1 << 16);
        rfc.handle_interrupt(RfcInterrupt::Cpe0);
        assert_eq!(client.done.get(), 1);
        assert_eq!(client.last_done.get(), 1);
        assert_eq!(fake::read(&rfc.dbell, 0x10), !(0b11 | 1 << 16));

        rfc.cpe_vector_select(CpeInterrupts::INTERNAL_ERROR::SET);
        fake::write(&rfc.dbell, 0x10, 1 << 31);
        rfc.handle_interrupt(RfcInterrupt::Cpe0);
        assert_eq!(client.errors.get(), 0);
        rfc.handle_interrupt(RfcInterrupt::Cpe1);
        assert_eq!(client.errors.get(), 1);
    }

    #[test]
    fn nowait_post_completes_on_ack_interrupt() {
        let rfc = rfcore();
        let client = recorder();
        rfc.set_client(client);

        let mut nop = CmdNop::new();
        assert_eq!(rfc.post_nowait(&mut nop), Ok(()));
        assert_eq!(rfc.post_nowait(&mut nop), Err(ErrorCode::BUSY));
        assert_eq!(fake::read(&rfc.dbell, 0x00), nop.address());

        fake::write(&rfc.dbell, 0x1C, 1);
        fake::write(&rfc.dbell, 0x04, 0x86);
        rfc.handle_interrupt(RfcInterrupt::CmdAck);
        assert_eq!(client.acked.get(), Some(Err(ErrorCode::BUSY)));
        assert_eq!(fake::read(&rfc.dbell, 0x1C), 0);
    }
}
