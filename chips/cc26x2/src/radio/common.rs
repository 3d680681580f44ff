// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Protocol independent commands: radio setup, synthesizer control, radio
//! timer handling, data queue maintenance and the test modes.

use super::mailbox::{immediate_command, radio_op, RatTime, Trigger};

pub const CMD_NOP: u16 = 0x0801;
pub const CMD_RADIO_SETUP: u16 = 0x0802;
pub const CMD_FS: u16 = 0x0803;
pub const CMD_FS_OFF: u16 = 0x0804;
pub const CMD_RX_TEST: u16 = 0x0807;
pub const CMD_TX_TEST: u16 = 0x0808;
pub const CMD_SYNC_STOP_RAT: u16 = 0x0809;
pub const CMD_SYNC_START_RAT: u16 = 0x080A;
pub const CMD_COUNT: u16 = 0x080B;
pub const CMD_FS_POWERUP: u16 = 0x080C;
pub const CMD_FS_POWERDOWN: u16 = 0x080D;
pub const CMD_SCH_IMM: u16 = 0x0810;
pub const CMD_COUNT_BRANCH: u16 = 0x0812;
pub const CMD_PATTERN_CHECK: u16 = 0x0813;
pub const CMD_RESYNC_RAT: u16 = 0x0816;

pub const CMD_ABORT: u16 = 0x0401;
pub const CMD_STOP: u16 = 0x0402;
pub const CMD_GET_RSSI: u16 = 0x0403;
pub const CMD_TRIGGER: u16 = 0x0404;
pub const CMD_START_RAT: u16 = 0x0405;
pub const CMD_PING: u16 = 0x0406;
pub const CMD_DISABLE_RAT_CH: u16 = 0x0408;
pub const CMD_ARM_RAT_CH: u16 = 0x0409;
pub const CMD_DISARM_RAT_CH: u16 = 0x040A;
pub const CMD_BUS_REQUEST: u16 = 0x040E;
pub const CMD_SET_CMD_START_IRQ: u16 = 0x0411;
pub const CMD_READ_RFREG: u16 = 0x0601;
pub const CMD_SET_RAT_CPT: u16 = 0x0603;
pub const CMD_SET_RAT_OUTPUT: u16 = 0x0604;
pub const CMD_UPDATE_HPOSC_FREQ: u16 = 0x0608;

pub const CMD_UPDATE_RADIO_SETUP: u16 = 0x0001;
pub const CMD_GET_FW_INFO: u16 = 0x0002;
pub const CMD_ADD_DATA_ENTRY: u16 = 0x0005;
pub const CMD_REMOVE_DATA_ENTRY: u16 = 0x0006;
pub const CMD_FLUSH_QUEUE: u16 = 0x0007;
pub const CMD_CLEAR_RX: u16 = 0x0008;
pub const CMD_REMOVE_PENDING_ENTRIES: u16 = 0x0009;
pub const CMD_SET_RAT_CMP: u16 = 0x000A;
pub const CMD_SET_TX_POWER: u16 = 0x0010;
pub const CMD_UPDATE_FS: u16 = 0x0011;
pub const CMD_MODIFY_FS: u16 = 0x0013;
pub const CMD_SET_TX20_POWER: u16 = 0x0014;
pub const CMD_CHANGE_PA: u16 = 0x0015;

/// Values of the `mode` byte of CMD_RADIO_SETUP.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RadioMode {
    Ble = 0x00,
    Ieee802154 = 0x01,
    TwoMbitGfsk = 0x02,
    FiveMbitCodedQpsk = 0x05,
    Ble2Mbit = 0x06,
    BleCoded = 0x07,
    Unchanged = 0xFF,
}

bitfield! {
    /// Front end and analog configuration of the setup commands.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SetupConfig(u16);
    impl Debug;
    pub front_end_mode, set_front_end_mode: 2, 0;
    /// 0: internal bias, 1: external bias
    pub bias_mode, set_bias_mode: 3;
    pub analog_cfg_mode, set_analog_cfg_mode: 9, 4;
    /// Leave the synthesizer powered down after setup
    pub no_fs_power_up, set_no_fs_power_up: 10;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SynthConf(u8);
    impl Debug;
    /// Start the synthesizer in TX mode
    pub tx_mode, set_tx_mode: 0;
    pub ref_freq, set_ref_freq: 6, 1;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct RxTestConfig(u8);
    impl Debug;
    /// Write received samples to the RF Core data FIFO
    pub ena_fifo, set_ena_fifo: 0;
    pub fs_off, set_fs_off: 1;
    /// Run continuously without waiting for a sync word
    pub no_sync, set_no_sync: 2;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct TxTestConfig(u8);
    impl Debug;
    /// Send an unmodulated carrier instead of `tx_word`
    pub use_cw, set_use_cw: 0;
    pub fs_off, set_fs_off: 1;
    pub whiten_mode, set_whiten_mode: 3, 2;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct PatternOpt(u16);
    impl Debug;
    /// 0: true if equal, 1: true if not equal, 2: greater, 3: less
    pub operation, set_operation: 1, 0;
    pub byte_rev, set_byte_rev: 2;
    pub bit_rev, set_bit_rev: 3;
    pub sign_extend, set_sign_extend: 8, 4;
    /// Compare against the last received value instead of `p_value`
    pub rx_val, set_rx_val: 9;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct RatCptConfig(u16);
    impl Debug;
    pub input_src, set_input_src: 7, 3;
    pub rat_ch, set_rat_ch: 11, 8;
    pub repeated, set_repeated: 12;
    /// 0: rising edge, 1: falling edge, 2: both edges
    pub input_mode, set_input_mode: 14, 13;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct RatOutputConfig(u16);
    impl Debug;
    pub output_sel, set_output_sel: 4, 2;
    pub output_mode, set_output_mode: 7, 5;
    pub rat_ch, set_rat_ch: 11, 8;
}

radio_op! {
    /// Do nothing; useful as a chain anchor or a delayed trigger.
    CmdNop = CMD_NOP;
    {}
}

radio_op! {
    /// Power up the radio in a given mode and apply register overrides.
    CmdRadioSetup = CMD_RADIO_SETUP;
    {
        /// See [`RadioMode`]
        pub mode: u8,
        pub lo_divider: u8,
        pub config: SetupConfig,
        pub tx_power: u16,
        pub p_reg_override: u32,
    }
}

radio_op! {
    /// Radio setup for devices with the 20 dBm PA: separate override lists
    /// for the standard and high power amplifier.
    CmdRadioSetupPa = CMD_RADIO_SETUP;
    {
        pub mode: u8,
        pub lo_divider: u8,
        pub config: SetupConfig,
        pub tx_power: u16,
        pub p_reg_override: u32,
        pub p_reg_override_tx_std: u32,
        pub p_reg_override_tx20: u32,
    }
}

radio_op! {
    /// Program and start the frequency synthesizer.
    CmdFs = CMD_FS;
    {
        /// MHz
        pub frequency: u16,
        /// Fractional part, 1/65536 MHz
        pub fract_freq: u16,
        pub synth_conf: SynthConf,
        _reserved0: u8,
        _reserved1: u8,
        _reserved2: u8,
        _reserved3: u16,
    }
}

radio_op! {
    CmdFsOff = CMD_FS_OFF;
    {}
}

radio_op! {
    CmdRxTest = CMD_RX_TEST;
    {
        pub config: RxTestConfig,
        pub end_trigger: Trigger,
        pub sync_word: u32,
        pub end_time: RatTime,
    }
}

radio_op! {
    CmdTxTest = CMD_TX_TEST;
    {
        pub config: TxTestConfig,
        _reserved0: u8,
        /// Repeated 16-bit pattern to send
        pub tx_word: u16,
        _reserved1: u8,
        pub end_trigger: Trigger,
        pub sync_word: u32,
        pub end_time: RatTime,
    }
}

radio_op! {
    /// Stop the radio timer and report its offset in `rat0`.
    CmdSyncStopRat = CMD_SYNC_STOP_RAT;
    {
        _reserved0: u16,
        pub rat0: RatTime,
    }
}

radio_op! {
    /// Start the radio timer synchronised to the RTC using `rat0`.
    CmdSyncStartRat = CMD_SYNC_START_RAT;
    {
        _reserved0: u16,
        pub rat0: RatTime,
    }
}

radio_op! {
    CmdResyncRat = CMD_RESYNC_RAT;
    {
        _reserved0: u16,
        pub rat0: RatTime,
    }
}

radio_op! {
    /// Decrement `counter`; true while it stays non-zero.
    CmdCount = CMD_COUNT;
    {
        pub counter: u16,
    }
}

radio_op! {
    CmdFsPowerup = CMD_FS_POWERUP;
    {
        _reserved0: u16,
        pub p_reg_override: u32,
    }
}

radio_op! {
    CmdFsPowerdown = CMD_FS_POWERDOWN;
    {}
}

radio_op! {
    /// Run an immediate command at a scheduled time.
    CmdSchImm = CMD_SCH_IMM;
    {
        _reserved0: u16,
        /// Value that would have been written to CMDR
        pub cmdr_val: u32,
        /// CMDSTA returned by the immediate command
        pub cmdsta_val: u32,
    }
}

radio_op! {
    /// Decrement `counter` and branch to `p_next_op_if_ok` while non-zero.
    CmdCountBranch = CMD_COUNT_BRANCH;
    {
        pub counter: u16,
        pub p_next_op_if_ok: u32,
    }
}

radio_op! {
    /// Compare a word in memory with a pattern and branch on the result.
    CmdPatternCheck = CMD_PATTERN_CHECK;
    {
        pub pattern_opt: PatternOpt,
        pub p_next_op_if_ok: u32,
        pub p_value: u32,
        pub mask: u32,
        pub compare_val: u32,
    }
}

immediate_command! {
    CmdAbort = CMD_ABORT;
    {}
}

immediate_command! {
    CmdStop = CMD_STOP;
    {}
}

immediate_command! {
    CmdGetRssi = CMD_GET_RSSI;
    {}
}

immediate_command! {
    /// Apply a new override list to a running setup.
    CmdUpdateRadioSetup = CMD_UPDATE_RADIO_SETUP;
    {
        _reserved0: u16,
        pub p_reg_override: u32,
    }
}

immediate_command! {
    CmdTrigger = CMD_TRIGGER;
    {
        pub trigger_no: u8,
    }
}

immediate_command! {
    /// Filled in by the RF Core.
    CmdGetFwInfo = CMD_GET_FW_INFO;
    {
        pub version_no: u16,
        /// First free RF Core RAM address
        pub start_offset: u16,
        pub free_ram_sz: u16,
        /// Bitmap of available RAT channels
        pub avail_rat_ch: u16,
    }
}

immediate_command! {
    CmdStartRat = CMD_START_RAT;
    {}
}

immediate_command! {
    CmdPing = CMD_PING;
    {}
}

immediate_command! {
    CmdReadRfreg = CMD_READ_RFREG;
    {
        pub address: u16,
        pub value: u32,
    }
}

immediate_command! {
    CmdAddDataEntry = CMD_ADD_DATA_ENTRY;
    {
        _reserved0: u16,
        pub p_queue: u32,
        pub p_entry: u32,
    }
}

immediate_command! {
    CmdRemoveDataEntry = CMD_REMOVE_DATA_ENTRY;
    {
        _reserved0: u16,
        pub p_queue: u32,
        pub p_entry: u32,
    }
}

immediate_command! {
    CmdFlushQueue = CMD_FLUSH_QUEUE;
    {
        _reserved0: u16,
        pub p_queue: u32,
        pub p_first_entry: u32,
    }
}

immediate_command! {
    CmdClearRx = CMD_CLEAR_RX;
    {
        _reserved0: u16,
        pub p_queue: u32,
    }
}

immediate_command! {
    CmdRemovePendingEntries = CMD_REMOVE_PENDING_ENTRIES;
    {
        _reserved0: u16,
        pub p_queue: u32,
        pub p_first_entry: u32,
    }
}

immediate_command! {
    CmdSetRatCmp = CMD_SET_RAT_CMP;
    {
        pub rat_ch: u8,
        _reserved0: u8,
        pub compare_time: RatTime,
    }
}

immediate_command! {
    CmdSetRatCpt = CMD_SET_RAT_CPT;
    {
        pub config: RatCptConfig,
    }
}

immediate_command! {
    CmdDisableRatCh = CMD_DISABLE_RAT_CH;
    {
        pub rat_ch: u8,
    }
}

immediate_command! {
    CmdSetRatOutput = CMD_SET_RAT_OUTPUT;
    {
        pub config: RatOutputConfig,
    }
}

immediate_command! {
    CmdArmRatCh = CMD_ARM_RAT_CH;
    {
        pub rat_ch: u8,
    }
}

immediate_command! {
    CmdDisarmRatCh = CMD_DISARM_RAT_CH;
    {
        pub rat_ch: u8,
    }
}

immediate_command! {
    CmdSetTxPower = CMD_SET_TX_POWER;
    {
        pub tx_power: u16,
    }
}

immediate_command! {
    CmdSetTx20Power = CMD_SET_TX20_POWER;
    {
        _reserved0: u16,
        pub tx20_power: u32,
    }
}

immediate_command! {
    /// Switch between the standard and the 20 dBm amplifier.
    CmdChangePa = CMD_CHANGE_PA;
    {
        _reserved0: u16,
        pub p_reg_override: u32,
    }
}

immediate_command! {
    CmdUpdateHposcFreq = CMD_UPDATE_HPOSC_FREQ;
    {
        /// Relative frequency offset, 2^-22 units
        pub freq_offset: i16,
    }
}

immediate_command! {
    /// Retune the running synthesizer. Laid out so that `frequency` lines
    /// up with the same field of CMD_FS.
    CmdUpdateFs = CMD_UPDATE_FS;
    {
        _reserved0: u16,
        _reserved1: u32,
        _reserved2: u32,
        _reserved3: u16,
        pub frequency: u16,
        pub fract_freq: u16,
    }
}

immediate_command! {
    CmdModifyFs = CMD_MODIFY_FS;
    {
        pub frequency: u16,
        pub fract_freq: u16,
    }
}

immediate_command! {
    /// Keep the system bus available to the RF Core while the system CPU
    /// sleeps.
    CmdBusRequest = CMD_BUS_REQUEST;
    {
        pub sys_bus_needed: u8,
    }
}

immediate_command! {
    CmdSetCmdStartIrq = CMD_SET_CMD_START_IRQ;
    {
        pub ena: u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::mailbox::{
        CommandStatus, ConditionRule, ImmediateCommand, RadioCommand, TriggerType,
    };
    use core::mem::{align_of, offset_of, size_of};

    #[test]
    fn header_only_operations() {
        assert_eq!(size_of::<CmdNop>(), 16);
        assert_eq!(size_of::<CmdFsOff>(), 16);
        assert_eq!(size_of::<CmdFsPowerdown>(), 16);
        assert_eq!(align_of::<CmdNop>(), 4);
    }

    #[test]
    fn radio_setup_layout() {
        assert_eq!(offset_of!(CmdRadioSetup, mode), 14);
        assert_eq!(offset_of!(CmdRadioSetup, lo_divider), 15);
        assert_eq!(offset_of!(CmdRadioSetup, config), 16);
        assert_eq!(offset_of!(CmdRadioSetup, tx_power), 18);
        assert_eq!(offset_of!(CmdRadioSetup, p_reg_override), 20);
        assert_eq!(size_of::<CmdRadioSetup>(), 24);

        assert_eq!(offset_of!(CmdRadioSetupPa, p_reg_override_tx20), 28);
        assert_eq!(size_of::<CmdRadioSetupPa>(), 32);
        assert_eq!(CmdRadioSetupPa::COMMAND_NO, CmdRadioSetup::COMMAND_NO);
    }

    #[test]
    fn synthesizer_layouts() {
        assert_eq!(offset_of!(CmdFs, frequency), 14);
        assert_eq!(offset_of!(CmdFs, fract_freq), 16);
        assert_eq!(offset_of!(CmdFs, synth_conf), 18);
        assert_eq!(size_of::<CmdFs>(), 24);

        assert_eq!(offset_of!(CmdUpdateFs, frequency), offset_of!(CmdFs, frequency));
        assert_eq!(size_of::<CmdUpdateFs>(), 20);
        assert_eq!(size_of::<CmdModifyFs>(), 8);
        assert_eq!(offset_of!(CmdFsPowerup, p_reg_override), 16);
    }

    #[test]
    fn test_mode_layouts() {
        assert_eq!(offset_of!(CmdRxTest, end_trigger), 15);
        assert_eq!(offset_of!(CmdRxTest, sync_word), 16);
        assert_eq!(offset_of!(CmdRxTest, end_time), 20);
        assert_eq!(offset_of!(CmdTxTest, tx_word), 16);
        assert_eq!(offset_of!(CmdTxTest, end_trigger), 19);
        assert_eq!(offset_of!(CmdTxTest, end_time), 24);
        assert_eq!(size_of::<CmdTxTest>(), 28);
    }

    #[test]
    fn rat_and_flow_control_layouts() {
        assert_eq!(offset_of!(CmdSyncStartRat, rat0), 16);
        assert_eq!(size_of::<CmdSyncStopRat>(), 20);
        assert_eq!(offset_of!(CmdSchImm, cmdsta_val), 20);
        assert_eq!(offset_of!(CmdCountBranch, p_next_op_if_ok), 16);
        assert_eq!(offset_of!(CmdPatternCheck, compare_val), 28);
        assert_eq!(size_of::<CmdPatternCheck>(), 32);
        assert_eq!(size_of::<CmdCount>(), 16);
    }

    #[test]
    fn immediate_layouts() {
        assert_eq!(size_of::<CmdAbort>(), 4);
        assert_eq!(size_of::<CmdTrigger>(), 4);
        assert_eq!(offset_of!(CmdGetFwInfo, avail_rat_ch), 8);
        assert_eq!(size_of::<CmdGetFwInfo>(), 12);
        assert_eq!(offset_of!(CmdReadRfreg, value), 4);
        assert_eq!(offset_of!(CmdAddDataEntry, p_entry), 8);
        assert_eq!(offset_of!(CmdSetRatCmp, compare_time), 4);
        assert_eq!(offset_of!(CmdSetTx20Power, tx20_power), 4);
        assert_eq!(size_of::<CmdUpdateHposcFreq>(), 4);
    }

    #[test]
    fn new_commands_carry_their_number() {
        let setup = CmdRadioSetup::new();
        assert_eq!({ setup.op.command_no }, 0x0802);
        assert_eq!(setup.status(), Some(CommandStatus::Idle));
        assert_eq!(setup.op.start_trigger.trigger_type(), TriggerType::Now as u8);

        let ping = CmdPing::new();
        assert_eq!(ping.command_no, 0x0406);
        let info = CmdGetFwInfo::new();
        assert_eq!(info.command_no, CMD_GET_FW_INFO);
        assert_eq!(info.free_ram_sz, 0);
    }

    #[test]
    fn chaining_links_operations() {
        let fs = CmdFs::new();
        let mut setup = CmdRadioSetup::new();
        setup.op.chain(&fs, ConditionRule::StopOnFalse);
        assert_eq!({ setup.op.p_next_op }, fs.address());
        assert_eq!(setup.op.condition.rule(), ConditionRule::StopOnFalse as u8);
    }

    #[test]
    fn rat_capture_config_bits() {
        let mut config = RatCptConfig(0);
        config.set_input_src(22);
        config.set_rat_ch(5);
        config.set_repeated(true);
        config.set_input_mode(1);
        assert_eq!(config.0, (22 << 3) | (5 << 8) | (1 << 12) | (1 << 13));
    }
}
