// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Definitions shared by every RF Core command: the radio operation header,
//! triggers and conditions, status words, data queues and the encoding of
//! direct commands.

use core::fmt;

/// Radio timer (RAT) time stamp, 4 MHz ticks.
pub type RatTime = u32;

bitfield! {
    /// When a radio operation, or the end of one, takes place.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Trigger(u8);
    impl Debug;
    pub trigger_type, set_trigger_type: 3, 0;
    /// Allow CMD_TRIGGER to fire this trigger as an alternative
    pub enable_cmd, set_enable_cmd: 4;
    /// Trigger number used by CMD_TRIGGER, 0 to 3
    pub trigger_no, set_trigger_no: 6, 5;
    /// Start immediately if an absolute trigger time is already in the past
    pub past_trigger, set_past_trigger: 7;
}

impl Trigger {
    pub fn new(kind: TriggerType) -> Trigger {
        let mut trigger = Trigger(0);
        trigger.set_trigger_type(kind as u8);
        trigger
    }

    /// Same as `new`, but fire at once if the time has already passed.
    pub fn or_past(kind: TriggerType) -> Trigger {
        let mut trigger = Trigger::new(kind);
        trigger.set_past_trigger(true);
        trigger
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerType {
    Now = 0,
    Never = 1,
    AbsTime = 2,
    RelSubmit = 3,
    RelStart = 4,
    RelPrevStart = 5,
    RelFirstStart = 6,
    RelPrevEnd = 7,
    RelEvt1 = 8,
    RelEvt2 = 9,
    External = 10,
}

/// Bit of a raw trigger byte selecting "fire now if already past".
pub const TRIG_PAST_BM: u8 = 0x80;

bitfield! {
    /// Whether to run the next operation in the chain after this one.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Condition(u8);
    impl Debug;
    pub rule, set_rule: 3, 0;
    /// Number of operations to skip for the skip rules
    pub n_skip, set_n_skip: 7, 4;
}

impl Condition {
    pub fn new(rule: ConditionRule) -> Condition {
        let mut condition = Condition(0);
        condition.set_rule(rule as u8);
        condition
    }

    pub fn skip(rule: ConditionRule, n: u8) -> Condition {
        let mut condition = Condition::new(rule);
        condition.set_n_skip(n);
        condition
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ConditionRule {
    Always = 0,
    Never = 1,
    StopOnFalse = 2,
    StopOnTrue = 3,
    SkipOnFalse = 4,
    SkipOnTrue = 5,
}

/// Header shared by every radio operation command.
///
/// Only 14 bytes long: the first payload field of a command follows at
/// offset 14.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Default)]
pub struct RadioOp {
    pub command_no: u16,
    /// Written by the RF Core, see [`CommandStatus`]
    pub status: u16,
    /// Next operation in the chain, 0 for none
    pub p_next_op: u32,
    pub start_time: RatTime,
    pub start_trigger: Trigger,
    pub condition: Condition,
}

impl RadioOp {
    pub fn new(command_no: u16) -> RadioOp {
        RadioOp {
            command_no,
            status: CommandStatus::Idle as u16,
            p_next_op: 0,
            start_time: 0,
            start_trigger: Trigger::new(TriggerType::Now),
            condition: Condition::new(ConditionRule::Never),
        }
    }

    /// Status word as last written by the RF Core.
    pub fn status(&self) -> u16 {
        // The RF Core writes this field behind the compiler's back. Read it
        // bytewise since the header itself is only 1-byte aligned.
        let bytes = unsafe {
            core::ptr::read_volatile(core::ptr::addr_of!(self.status).cast::<[u8; 2]>())
        };
        u16::from_ne_bytes(bytes)
    }

    /// Run `next` after this operation, subject to `condition`.
    pub fn chain<C: RadioCommand>(&mut self, next: &C, rule: ConditionRule) {
        self.p_next_op = next.address();
        self.condition = Condition::new(rule);
    }
}

/// A radio operation command.
pub trait RadioCommand: Default {
    const COMMAND_NO: u16;

    fn op(&self) -> &RadioOp;
    fn op_mut(&mut self) -> &mut RadioOp;

    /// A zeroed command with its number set, idle, triggered now and not
    /// chained to anything.
    fn new() -> Self {
        let mut command = Self::default();
        *command.op_mut() = RadioOp::new(Self::COMMAND_NO);
        command
    }

    /// Address the RF Core is given for this command.
    fn address(&self) -> u32 {
        self as *const Self as usize as u32
    }

    /// Decoded status, `None` for words this crate does not know.
    fn status(&self) -> Option<CommandStatus> {
        CommandStatus::try_from(self.op().status()).ok()
    }
}

/// A command without the radio operation header. These execute at once
/// and report through CMDSTA only.
pub trait ImmediateCommand: Default {
    const COMMAND_NO: u16;

    fn new() -> Self;

    fn address(&self) -> u32 {
        self as *const Self as usize as u32
    }
}

/// Define a radio operation command struct.
macro_rules! radio_op {
    (
        $(#[$attr:meta])*
        $name:ident = $number:expr;
        { $($(#[$fattr:meta])* $fvis:vis $field:ident: $ty:ty),* $(,)? }
    ) => {
        $(#[$attr])*
        #[repr(C, align(4))]
        #[derive(Copy, Clone, Debug, Default)]
        pub struct $name {
            pub op: $crate::radio::mailbox::RadioOp,
            $($(#[$fattr])* $fvis $field: $ty,)*
        }

        impl $crate::radio::mailbox::RadioCommand for $name {
            const COMMAND_NO: u16 = $number;

            fn op(&self) -> &$crate::radio::mailbox::RadioOp {
                &self.op
            }

            fn op_mut(&mut self) -> &mut $crate::radio::mailbox::RadioOp {
                &mut self.op
            }
        }
    };
}

/// Define an immediate command struct.
macro_rules! immediate_command {
    (
        $(#[$attr:meta])*
        $name:ident = $number:expr;
        { $($(#[$fattr:meta])* $fvis:vis $field:ident: $ty:ty),* $(,)? }
    ) => {
        $(#[$attr])*
        #[repr(C, align(4))]
        #[derive(Copy, Clone, Debug, Default)]
        pub struct $name {
            pub command_no: u16,
            $($(#[$fattr])* $fvis $field: $ty,)*
        }

        impl $crate::radio::mailbox::ImmediateCommand for $name {
            const COMMAND_NO: u16 = $number;

            #[allow(clippy::needless_update)]
            fn new() -> Self {
                $name {
                    command_no: $number,
                    ..Default::default()
                }
            }
        }
    };
}

pub(crate) use {immediate_command, radio_op};

/// Status word of a radio operation.
///
/// Bits 11 and 10 give the category: `0b00` still running, `0b01` finished
/// normally, `0b10` finished with an error. The upper nibble selects the
/// protocol.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum CommandStatus {
    Idle = 0x0000,
    Pending = 0x0001,
    Active = 0x0002,
    Skipped = 0x0003,

    DoneOk = 0x0400,
    DoneCountdown = 0x0401,
    DoneRxErr = 0x0402,
    DoneTimeout = 0x0403,
    DoneStopped = 0x0404,
    DoneAbort = 0x0405,
    DoneFailed = 0x0406,

    ErrorPastStart = 0x0800,
    ErrorStartTrig = 0x0801,
    ErrorCondition = 0x0802,
    ErrorPar = 0x0803,
    ErrorPointer = 0x0804,
    ErrorCmdId = 0x0805,
    ErrorWrongBg = 0x0806,
    ErrorNoSetup = 0x0807,
    ErrorNoFs = 0x0808,
    ErrorSynthProg = 0x0809,
    ErrorTxUnf = 0x080A,
    ErrorRxOvf = 0x080B,
    ErrorNoRx = 0x080C,
    ErrorPending = 0x080D,

    BleDoneOk = 0x1400,
    BleDoneRxTimeout = 0x1401,
    BleDoneNoSync = 0x1402,
    BleDoneRxErr = 0x1403,
    BleDoneConnect = 0x1404,
    BleDoneMaxNack = 0x1405,
    BleDoneEnded = 0x1406,
    BleDoneAbort = 0x1407,
    BleDoneStopped = 0x1408,
    BleDoneAux = 0x1409,
    BleDoneConnectChSel0 = 0x140A,
    BleDoneScanRsp = 0x140B,
    BleErrorPar = 0x1800,
    BleErrorRxBuf = 0x1801,
    BleErrorNoSetup = 0x1802,
    BleErrorNoFs = 0x1803,
    BleErrorSynthProg = 0x1804,
    BleErrorRxOvf = 0x1805,
    BleErrorTxUnf = 0x1806,
    BleErrorAux = 0x1807,

    IeeeSuspended = 0x2001,
    IeeeDoneOk = 0x2400,
    IeeeDoneBusy = 0x2401,
    IeeeDoneStopped = 0x2402,
    IeeeDoneAck = 0x2403,
    IeeeDoneAckPend = 0x2404,
    IeeeDoneTimeout = 0x2405,
    IeeeDoneBgEnd = 0x2406,
    IeeeDoneAbort = 0x2407,
    IeeeErrorPar = 0x2800,
    IeeeErrorNoSetup = 0x2801,
    IeeeErrorNoFs = 0x2802,
    IeeeErrorSynthProg = 0x2803,
    IeeeErrorRxOvf = 0x2804,
    IeeeErrorTxUnf = 0x2805,

    PropDoneOk = 0x3400,
    PropDoneRxTimeout = 0x3401,
    PropDoneBreak = 0x3402,
    PropDoneEnded = 0x3403,
    PropDoneStopped = 0x3404,
    PropDoneAbort = 0x3405,
    PropDoneRxErr = 0x3406,
    PropDoneIdle = 0x3407,
    PropDoneBusy = 0x3408,
    PropDoneIdleTimeout = 0x3409,
    PropDoneBusyTimeout = 0x340A,
    PropErrorPar = 0x3800,
    PropErrorRxBuf = 0x3801,
    PropErrorRxFull = 0x3802,
    PropErrorNoSetup = 0x3803,
    PropErrorNoFs = 0x3804,
    PropErrorRxOvf = 0x3805,
    PropErrorTxUnf = 0x3806,
}

impl CommandStatus {
    const ALL: &'static [CommandStatus] = {
        use CommandStatus::*;
        &[
            Idle,
            Pending,
            Active,
            Skipped,
            DoneOk,
            DoneCountdown,
            DoneRxErr,
            DoneTimeout,
            DoneStopped,
            DoneAbort,
            DoneFailed,
            ErrorPastStart,
            ErrorStartTrig,
            ErrorCondition,
            ErrorPar,
            ErrorPointer,
            ErrorCmdId,
            ErrorWrongBg,
            ErrorNoSetup,
            ErrorNoFs,
            ErrorSynthProg,
            ErrorTxUnf,
            ErrorRxOvf,
            ErrorNoRx,
            ErrorPending,
            BleDoneOk,
            BleDoneRxTimeout,
            BleDoneNoSync,
            BleDoneRxErr,
            BleDoneConnect,
            BleDoneMaxNack,
            BleDoneEnded,
            BleDoneAbort,
            BleDoneStopped,
            BleDoneAux,
            BleDoneConnectChSel0,
            BleDoneScanRsp,
            BleErrorPar,
            BleErrorRxBuf,
            BleErrorNoSetup,
            BleErrorNoFs,
            BleErrorSynthProg,
            BleErrorRxOvf,
            BleErrorTxUnf,
            BleErrorAux,
            IeeeSuspended,
            IeeeDoneOk,
            IeeeDoneBusy,
            IeeeDoneStopped,
            IeeeDoneAck,
            IeeeDoneAckPend,
            IeeeDoneTimeout,
            IeeeDoneBgEnd,
            IeeeDoneAbort,
            IeeeErrorPar,
            IeeeErrorNoSetup,
            IeeeErrorNoFs,
            IeeeErrorSynthProg,
            IeeeErrorRxOvf,
            IeeeErrorTxUnf,
            PropDoneOk,
            PropDoneRxTimeout,
            PropDoneBreak,
            PropDoneEnded,
            PropDoneStopped,
            PropDoneAbort,
            PropDoneRxErr,
            PropDoneIdle,
            PropDoneBusy,
            PropDoneIdleTimeout,
            PropDoneBusyTimeout,
            PropErrorPar,
            PropErrorRxBuf,
            PropErrorRxFull,
            PropErrorNoSetup,
            PropErrorNoFs,
            PropErrorRxOvf,
            PropErrorTxUnf,
        ]
    };

    /// The operation has not finished yet.
    pub fn is_running(self) -> bool {
        (self as u16) & 0x0C00 == 0
    }

    /// The operation finished normally.
    pub fn is_done(self) -> bool {
        (self as u16) & 0x0C00 == 0x0400
    }

    /// The operation finished with an error.
    pub fn is_error(self) -> bool {
        (self as u16) & 0x0C00 == 0x0800
    }
}

impl TryFrom<u16> for CommandStatus {
    type Error = u16;

    fn try_from(raw: u16) -> Result<CommandStatus, u16> {
        CommandStatus::ALL
            .iter()
            .copied()
            .find(|status| *status as u16 == raw)
            .ok_or(raw)
    }
}

/// Result byte of CMDSTA, written by the RF Core when it accepts or rejects
/// a command posted to CMDR.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CmdstaResult {
    Pending = 0x00,
    Done = 0x01,
    IllegalPointer = 0x81,
    UnknownCommand = 0x82,
    UnknownDirCommand = 0x83,
    ContextError = 0x85,
    SchedulingError = 0x86,
    ParError = 0x87,
    QueueError = 0x88,
    QueueBusy = 0x89,
}

impl TryFrom<u8> for CmdstaResult {
    type Error = u8;

    fn try_from(raw: u8) -> Result<CmdstaResult, u8> {
        Ok(match raw {
            0x00 => CmdstaResult::Pending,
            0x01 => CmdstaResult::Done,
            0x81 => CmdstaResult::IllegalPointer,
            0x82 => CmdstaResult::UnknownCommand,
            0x83 => CmdstaResult::UnknownDirCommand,
            0x85 => CmdstaResult::ContextError,
            0x86 => CmdstaResult::SchedulingError,
            0x87 => CmdstaResult::ParError,
            0x88 => CmdstaResult::QueueError,
            0x89 => CmdstaResult::QueueBusy,
            other => return Err(other),
        })
    }
}

impl fmt::Display for CmdstaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A command value written straight into CMDR instead of a pointer.
///
/// Bit 0 is set so the RF Core can tell it from a 4-aligned address. The
/// command number occupies the upper half word; the lower half may carry a
/// one or two byte parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DirectCommand(u32);

impl DirectCommand {
    pub const fn new(command_no: u16) -> DirectCommand {
        DirectCommand((command_no as u32) << 16 | 1)
    }

    pub const fn with_u8(command_no: u16, param: u8) -> DirectCommand {
        DirectCommand((command_no as u32) << 16 | (param as u32) << 8 | 1)
    }

    /// The low two bits of `param` are lost.
    pub const fn with_u16(command_no: u16, param: u16) -> DirectCommand {
        DirectCommand((command_no as u32) << 16 | (param as u32 & 0xFFFC) | 1)
    }

    pub const fn command_no(self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<DirectCommand> for u32 {
    fn from(command: DirectCommand) -> u32 {
        command.0
    }
}

/// Queue of data entries the RF Core reads packets from or writes them to.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct DataQueue {
    /// Entry the RF Core uses next, 0 when the queue is empty
    pub p_curr_entry: u32,
    /// Last entry, 0 for a circular queue
    pub p_last_entry: u32,
}

impl DataQueue {
    /// Queue over a circular list starting at `first`.
    pub fn circular(first: u32) -> DataQueue {
        DataQueue {
            p_curr_entry: first,
            p_last_entry: 0,
        }
    }
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct DataEntryConfig(u8);
    impl Debug;
    /// See [`DataEntryType`]
    pub entry_type, set_entry_type: 1, 0;
    /// Size of the length field prefixed to each element, 0 to 2 bytes
    pub len_sz, set_len_sz: 3, 2;
    /// Partial read entries: raise RX_DATA_WRITTEN every 16 * irqIntv bytes
    pub irq_intv, set_irq_intv: 7, 4;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DataEntryType {
    General = 0,
    MultiElement = 1,
    Pointer = 2,
    Partial = 3,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DataEntryStatus {
    Pending = 0,
    Active = 1,
    Busy = 2,
    Finished = 3,
    Unfinished = 4,
}

/// Header of every data entry. General entries carry their data right
/// after it.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct DataEntry {
    pub p_next_entry: u32,
    /// See [`DataEntryStatus`]
    pub status: u8,
    pub config: DataEntryConfig,
    /// Bytes of data following the header, or of the buffer for pointer
    /// entries
    pub length: u16,
}

impl DataEntry {
    pub fn new(kind: DataEntryType, len_sz: u8, length: u16) -> DataEntry {
        let mut config = DataEntryConfig(0);
        config.set_entry_type(kind as u8);
        config.set_len_sz(len_sz);
        DataEntry {
            p_next_entry: 0,
            status: DataEntryStatus::Pending as u8,
            config,
            length,
        }
    }
}

/// Data entry whose buffer lives elsewhere.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct DataEntryPointer {
    pub header: DataEntry,
    pub p_data: u32,
}

/// Data entry holding several received elements; data follows.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct DataEntryMultiElement {
    pub header: DataEntry,
    pub num_elements: u16,
    /// Index of the next byte the RF Core writes
    pub next_index: u16,
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct PartialPktStatus(u16);
    impl Debug;
    pub num_elements, set_num_elements: 12, 0;
    /// A packet is being written into the entry
    pub entry_open, set_entry_open: 13;
    /// The first element continues a packet from the previous entry
    pub first_cont, set_first_cont: 14;
    /// The last element continues into the next entry
    pub last_cont, set_last_cont: 15;
}

/// Partial read data entry; data follows.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct DataEntryPartial {
    pub header: DataEntry,
    pub pkt_status: PartialPktStatus,
    pub next_index: u16,
}
