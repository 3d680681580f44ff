// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Bluetooth Low Energy commands.
//!
//! All BLE 4 radio operations share one layout and differ only in their
//! command number and in what `p_params`/`p_output` point to, so they are a
//! single struct generic over the number. The same holds for the BLE 5
//! operations, which add PHY selection and transmit power.

use super::common::SetupConfig;
use super::mailbox::{immediate_command, radio_op, DataQueue, RadioCommand, RadioOp, RatTime, Trigger};

pub const CMD_BLE_SLAVE: u16 = 0x1801;
pub const CMD_BLE_MASTER: u16 = 0x1802;
pub const CMD_BLE_ADV: u16 = 0x1803;
pub const CMD_BLE_ADV_DIR: u16 = 0x1804;
pub const CMD_BLE_ADV_NC: u16 = 0x1805;
pub const CMD_BLE_ADV_SCAN: u16 = 0x1806;
pub const CMD_BLE_SCANNER: u16 = 0x1807;
pub const CMD_BLE_INITIATOR: u16 = 0x1808;
pub const CMD_BLE_GENERIC_RX: u16 = 0x1809;
pub const CMD_BLE_TX_TEST: u16 = 0x180A;
pub const CMD_BLE_ADV_PAYLOAD: u16 = 0x1001;
pub const CMD_BLE5_RADIO_SETUP: u16 = 0x1820;
pub const CMD_BLE5_SLAVE: u16 = 0x1821;
pub const CMD_BLE5_MASTER: u16 = 0x1822;
pub const CMD_BLE5_ADV_EXT: u16 = 0x1823;
pub const CMD_BLE5_ADV_AUX: u16 = 0x1824;
pub const CMD_BLE5_SCANNER: u16 = 0x1827;
pub const CMD_BLE5_INITIATOR: u16 = 0x1828;
pub const CMD_BLE5_GENERIC_RX: u16 = 0x1829;
pub const CMD_BLE5_TX_TEST: u16 = 0x182A;
pub const CMD_BLE5_ADV: u16 = 0x182B;
pub const CMD_BLE5_ADV_DIR: u16 = 0x182C;
pub const CMD_BLE5_ADV_NC: u16 = 0x182D;
pub const CMD_BLE5_ADV_SCAN: u16 = 0x182E;

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Whitening(u8);
    impl Debug;
    /// Initial whitener value, used only with `override_`
    pub init, set_init: 6, 0;
    pub override_, set_override: 7;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct PhyMode(u8);
    impl Debug;
    /// See [`MainMode`]
    pub main_mode, set_main_mode: 1, 0;
    /// Coded PHY: 0 for S = 8, 1 for S = 2
    pub coding, set_coding: 7, 2;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct DefaultPhy(u8);
    impl Debug;
    pub main_mode, set_main_mode: 1, 0;
    pub coding, set_coding: 2;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MainMode {
    OneMbps = 0,
    TwoMbps = 1,
    Coded = 2,
}

impl PhyMode {
    pub fn new(mode: MainMode) -> PhyMode {
        let mut phy = PhyMode(0);
        phy.set_main_mode(mode as u8);
        phy
    }
}

bitfield! {
    /// What the RF Core does with received packets.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct RxConfig(u8);
    impl Debug;
    pub auto_flush_ignored, set_auto_flush_ignored: 0;
    pub auto_flush_crc_err, set_auto_flush_crc_err: 1;
    pub auto_flush_empty, set_auto_flush_empty: 2;
    pub include_len_byte, set_include_len_byte: 3;
    pub include_crc, set_include_crc: 4;
    pub append_rssi, set_append_rssi: 5;
    pub append_status, set_append_status: 6;
    pub append_timestamp, set_append_timestamp: 7;
}

bitfield! {
    /// Link layer sequence state of a connection.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SeqStat(u8);
    impl Debug;
    pub last_rx_sn, set_last_rx_sn: 0;
    pub last_tx_sn, set_last_tx_sn: 1;
    pub next_tx_sn, set_next_tx_sn: 2;
    pub first_pkt, set_first_pkt: 3;
    pub auto_empty, set_auto_empty: 4;
    pub ll_ctrl_tx, set_ll_ctrl_tx: 5;
    pub ll_ctrl_ack_rx, set_ll_ctrl_ack_rx: 6;
    pub ll_ctrl_ack_pending, set_ll_ctrl_ack_pending: 7;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct AdvConfig(u8);
    impl Debug;
    pub adv_filter_policy, set_adv_filter_policy: 1, 0;
    pub device_addr_type, set_device_addr_type: 2;
    pub peer_addr_type, set_peer_addr_type: 3;
    pub strict_len_filter, set_strict_len_filter: 4;
    /// Advertise support for channel selection algorithm 2
    pub ch_sel, set_ch_sel: 5;
    pub priv_ign_mode, set_priv_ign_mode: 6;
    pub rpa_mode, set_rpa_mode: 7;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct AuxAdvConfig(u8);
    impl Debug;
    pub adv_filter_policy, set_adv_filter_policy: 1, 0;
    pub device_addr_type, set_device_addr_type: 2;
    pub target_addr_type, set_target_addr_type: 3;
    pub strict_len_filter, set_strict_len_filter: 4;
    pub directed, set_directed: 5;
    pub priv_ign_mode, set_priv_ign_mode: 6;
    pub rpa_mode, set_rpa_mode: 7;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct ExtAdvConfig(u8);
    impl Debug;
    pub device_addr_type, set_device_addr_type: 2;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct BehConfig(u8);
    impl Debug;
    /// End after a scan response instead of continuing to advertise
    pub scan_rsp_end_type, set_scan_rsp_end_type: 0;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct ScanConfig(u8);
    impl Debug;
    pub scan_filter_policy, set_scan_filter_policy: 0;
    pub active_scan, set_active_scan: 1;
    pub device_addr_type, set_device_addr_type: 2;
    pub rpa_filter_policy, set_rpa_filter_policy: 3;
    pub strict_len_filter, set_strict_len_filter: 4;
    pub auto_wl_ignore, set_auto_wl_ignore: 5;
    pub end_on_rpt, set_end_on_rpt: 6;
    pub rpa_mode, set_rpa_mode: 7;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct BackoffPar(u8);
    impl Debug;
    pub log_upper_limit, set_log_upper_limit: 3, 0;
    pub last_succeeded, set_last_succeeded: 4;
    pub last_failed, set_last_failed: 5;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct InitConfig(u8);
    impl Debug;
    pub use_white_list, set_use_white_list: 0;
    pub dynamic_win_offset, set_dynamic_win_offset: 1;
    pub device_addr_type, set_device_addr_type: 2;
    pub peer_addr_type, set_peer_addr_type: 3;
    pub strict_len_filter, set_strict_len_filter: 4;
    pub ch_sel, set_ch_sel: 5;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct TxTestConfig(u8);
    impl Debug;
    pub override_default, set_override_default: 0;
    pub use_prbs9, set_use_prbs9: 1;
    pub use_prbs15, set_use_prbs15: 2;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct ExtFilterConfig(u8);
    impl Debug;
    pub check_adi, set_check_adi: 0;
    pub auto_adi_update, set_auto_adi_update: 1;
    pub apply_duplicate_filtering, set_apply_duplicate_filtering: 2;
    pub auto_wl_ignore, set_auto_wl_ignore: 3;
    pub auto_adi_process, set_auto_adi_process: 4;
    pub exclusive_sid, set_exclusive_sid: 5;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct AdiStatus(u8);
    impl Debug;
    pub last_accepted_sid, set_last_accepted_sid: 3, 0;
    pub state, set_state: 6, 4;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct PktStatus(u8);
    impl Debug;
    pub time_stamp_valid, set_time_stamp_valid: 0;
    pub last_crc_err, set_last_crc_err: 1;
    pub last_ignored, set_last_ignored: 2;
    pub last_empty, set_last_empty: 3;
    pub last_ctrl, set_last_ctrl: 4;
    /// More data bit of the last packet
    pub last_md, set_last_md: 5;
    pub last_ack, set_last_ack: 6;
}

/// A BLE 4 radio operation. `N` is the command number.
#[repr(C, align(4))]
#[derive(Copy, Clone, Debug, Default)]
pub struct BleRadioOp<const N: u16> {
    pub op: RadioOp,
    pub channel: u8,
    pub whitening: Whitening,
    pub p_params: u32,
    pub p_output: u32,
}

/// A BLE 5 radio operation. `N` is the command number.
#[repr(C, align(4))]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5RadioOp<const N: u16> {
    pub op: RadioOp,
    pub channel: u8,
    pub whitening: Whitening,
    pub phy_mode: PhyMode,
    /// Extra RX time, in microseconds, for long range links
    pub range_delay: u8,
    pub tx_power: u16,
    pub p_params: u32,
    pub p_output: u32,
    /// 20 dBm PA setting; only used on devices that have one
    pub tx20_power: u32,
}

impl<const N: u16> RadioCommand for BleRadioOp<N> {
    const COMMAND_NO: u16 = N;

    fn op(&self) -> &RadioOp {
        &self.op
    }

    fn op_mut(&mut self) -> &mut RadioOp {
        &mut self.op
    }
}

impl<const N: u16> RadioCommand for Ble5RadioOp<N> {
    const COMMAND_NO: u16 = N;

    fn op(&self) -> &RadioOp {
        &self.op
    }

    fn op_mut(&mut self) -> &mut RadioOp {
        &mut self.op
    }
}

impl<const N: u16> BleRadioOp<N> {
    pub fn set_params<P>(&mut self, params: &P) {
        self.p_params = params as *const P as usize as u32;
    }

    pub fn set_output<O>(&mut self, output: &O) {
        self.p_output = output as *const O as usize as u32;
    }
}

impl<const N: u16> Ble5RadioOp<N> {
    pub fn set_params<P>(&mut self, params: &P) {
        self.p_params = params as *const P as usize as u32;
    }

    pub fn set_output<O>(&mut self, output: &O) {
        self.p_output = output as *const O as usize as u32;
    }
}

/// Params: [`SlavePar`], output: [`MasterSlaveOutput`]
pub type CmdBleSlave = BleRadioOp<CMD_BLE_SLAVE>;
/// Params: [`MasterPar`], output: [`MasterSlaveOutput`]
pub type CmdBleMaster = BleRadioOp<CMD_BLE_MASTER>;
/// Params: [`AdvPar`], output: [`AdvOutput`]
pub type CmdBleAdv = BleRadioOp<CMD_BLE_ADV>;
pub type CmdBleAdvDir = BleRadioOp<CMD_BLE_ADV_DIR>;
pub type CmdBleAdvNc = BleRadioOp<CMD_BLE_ADV_NC>;
pub type CmdBleAdvScan = BleRadioOp<CMD_BLE_ADV_SCAN>;
/// Params: [`ScannerPar`], output: [`ScannerOutput`]
pub type CmdBleScanner = BleRadioOp<CMD_BLE_SCANNER>;
/// Params: [`InitiatorPar`], output: [`InitiatorOutput`]
pub type CmdBleInitiator = BleRadioOp<CMD_BLE_INITIATOR>;
/// Params: [`GenericRxPar`], output: [`GenericRxOutput`]
pub type CmdBleGenericRx = BleRadioOp<CMD_BLE_GENERIC_RX>;
/// Params: [`TxTestPar`], output: [`TxTestOutput`]
pub type CmdBleTxTest = BleRadioOp<CMD_BLE_TX_TEST>;

/// Params: [`Ble5SlavePar`], output: [`MasterSlaveOutput`]
pub type CmdBle5Slave = Ble5RadioOp<CMD_BLE5_SLAVE>;
/// Params: [`Ble5MasterPar`], output: [`MasterSlaveOutput`]
pub type CmdBle5Master = Ble5RadioOp<CMD_BLE5_MASTER>;
/// Params: [`Ble5AdvExtPar`], output: [`AdvOutput`]
pub type CmdBle5AdvExt = Ble5RadioOp<CMD_BLE5_ADV_EXT>;
/// Params: [`Ble5AdvAuxPar`], output: [`AdvOutput`]
pub type CmdBle5AdvAux = Ble5RadioOp<CMD_BLE5_ADV_AUX>;
/// Params: [`Ble5ScannerPar`], output: [`Ble5ScanInitOutput`]
pub type CmdBle5Scanner = Ble5RadioOp<CMD_BLE5_SCANNER>;
/// Params: [`Ble5InitiatorPar`], output: [`Ble5ScanInitOutput`]
pub type CmdBle5Initiator = Ble5RadioOp<CMD_BLE5_INITIATOR>;
pub type CmdBle5GenericRx = Ble5RadioOp<CMD_BLE5_GENERIC_RX>;
pub type CmdBle5TxTest = Ble5RadioOp<CMD_BLE5_TX_TEST>;
pub type CmdBle5Adv = Ble5RadioOp<CMD_BLE5_ADV>;
pub type CmdBle5AdvDir = Ble5RadioOp<CMD_BLE5_ADV_DIR>;
pub type CmdBle5AdvNc = Ble5RadioOp<CMD_BLE5_ADV_NC>;
pub type CmdBle5AdvScan = Ble5RadioOp<CMD_BLE5_ADV_SCAN>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AdvPayloadType {
    AdvData = 0,
    ScanRspData = 1,
}

immediate_command! {
    /// Replace the advertising or scan response data of a running
    /// advertiser.
    CmdBleAdvPayload = CMD_BLE_ADV_PAYLOAD;
    {
        /// See [`AdvPayloadType`]
        pub payload_type: u8,
        pub new_len: u8,
        pub p_new_data: u32,
        pub p_params: u32,
    }
}

radio_op! {
    CmdBle5RadioSetup = CMD_BLE5_RADIO_SETUP;
    {
        pub default_phy: DefaultPhy,
        pub lo_divider: u8,
        pub config: SetupConfig,
        pub tx_power: u16,
        pub p_reg_override_common: u32,
        pub p_reg_override_1mbps: u32,
        pub p_reg_override_2mbps: u32,
        pub p_reg_override_coded: u32,
    }
}

radio_op! {
    CmdBle5RadioSetupPa = CMD_BLE5_RADIO_SETUP;
    {
        pub default_phy: DefaultPhy,
        pub lo_divider: u8,
        pub config: SetupConfig,
        pub tx_power: u16,
        pub p_reg_override_common: u32,
        pub p_reg_override_1mbps: u32,
        pub p_reg_override_2mbps: u32,
        pub p_reg_override_coded: u32,
        pub p_reg_override_tx_std: u32,
        pub p_reg_override_tx20: u32,
    }
}

/// Parameters shared by the connection roles.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct MasterSlavePar {
    pub p_rx_q: u32,
    pub p_tx_q: u32,
    pub rx_config: RxConfig,
    pub seq_stat: SeqStat,
    /// Consecutive NACKs before giving up, 0 for no limit
    pub max_nack: u8,
    /// Packets to send in one connection event, 0 for no limit
    pub max_pkt: u8,
    pub access_address: u32,
    pub crc_init0: u8,
    pub crc_init1: u8,
    pub crc_init2: u8,
}

impl MasterSlavePar {
    pub fn set_queues(&mut self, rx: &DataQueue, tx: &DataQueue) {
        self.p_rx_q = rx as *const DataQueue as usize as u32;
        self.p_tx_q = tx as *const DataQueue as usize as u32;
    }

    /// The 24-bit CRC initialisation value, low byte first.
    pub fn set_crc_init(&mut self, crc_init: u32) {
        self.crc_init0 = crc_init as u8;
        self.crc_init1 = (crc_init >> 8) as u8;
        self.crc_init2 = (crc_init >> 16) as u8;
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct SlavePar {
    pub p_rx_q: u32,
    pub p_tx_q: u32,
    pub rx_config: RxConfig,
    pub seq_stat: SeqStat,
    pub max_nack: u8,
    pub max_pkt: u8,
    pub access_address: u32,
    pub crc_init0: u8,
    pub crc_init1: u8,
    pub crc_init2: u8,
    /// Ends the operation if no sync is found on the first packet
    pub timeout_trigger: Trigger,
    pub timeout_time: RatTime,
    _reserved0: u16,
    _reserved1: u8,
    pub end_trigger: Trigger,
    pub end_time: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct MasterPar {
    pub p_rx_q: u32,
    pub p_tx_q: u32,
    pub rx_config: RxConfig,
    pub seq_stat: SeqStat,
    pub max_nack: u8,
    pub max_pkt: u8,
    pub access_address: u32,
    pub crc_init0: u8,
    pub crc_init1: u8,
    pub crc_init2: u8,
    pub end_trigger: Trigger,
    pub end_time: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct AdvPar {
    pub p_rx_q: u32,
    pub rx_config: RxConfig,
    pub adv_config: AdvConfig,
    pub adv_len: u8,
    pub scan_rsp_len: u8,
    pub p_adv_data: u32,
    pub p_scan_rsp_data: u32,
    /// Own 48-bit address as three half words
    pub p_device_address: u32,
    pub p_white_list: u32,
    pub beh_config: BehConfig,
    _reserved0: u8,
    _reserved1: u8,
    pub end_trigger: Trigger,
    pub end_time: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ScannerPar {
    pub p_rx_q: u32,
    pub rx_config: RxConfig,
    pub scan_config: ScanConfig,
    /// Seed of the backoff generator, must not be 0
    pub random_state: u16,
    pub backoff_count: u16,
    pub backoff_par: BackoffPar,
    pub scan_req_len: u8,
    pub p_scan_req_data: u32,
    pub p_device_address: u32,
    pub p_white_list: u32,
    _reserved0: u16,
    pub timeout_trigger: Trigger,
    pub end_trigger: Trigger,
    pub timeout_time: RatTime,
    pub end_time: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct InitiatorPar {
    pub p_rx_q: u32,
    pub rx_config: RxConfig,
    pub init_config: InitConfig,
    _reserved0: u8,
    pub connect_req_len: u8,
    pub p_connect_req_data: u32,
    pub p_device_address: u32,
    pub p_white_list: u32,
    /// Anchor time of the first connection event
    pub connect_time: RatTime,
    _reserved1: u16,
    pub timeout_trigger: Trigger,
    pub end_trigger: Trigger,
    pub timeout_time: RatTime,
    pub end_time: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct GenericRxPar {
    pub p_rx_q: u32,
    pub rx_config: RxConfig,
    /// Restart reception after each packet instead of ending
    pub repeat: u8,
    _reserved0: u16,
    pub access_address: u32,
    pub crc_init0: u8,
    pub crc_init1: u8,
    pub crc_init2: u8,
    pub end_trigger: Trigger,
    pub end_time: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct TxTestPar {
    /// 0 for unlimited
    pub num_packets: u16,
    pub payload_length: u8,
    pub packet_type: u8,
    pub period: RatTime,
    pub config: TxTestConfig,
    pub byte_val: u8,
    _reserved0: u8,
    pub end_trigger: Trigger,
    pub end_time: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5SlavePar {
    pub p_rx_q: u32,
    pub p_tx_q: u32,
    pub rx_config: RxConfig,
    pub seq_stat: SeqStat,
    pub max_nack: u8,
    pub max_pkt: u8,
    pub access_address: u32,
    pub crc_init0: u8,
    pub crc_init1: u8,
    pub crc_init2: u8,
    pub timeout_trigger: Trigger,
    pub timeout_time: RatTime,
    pub max_rx_pkt_len: u8,
    /// Maximum length on the coded PHY
    pub max_len_low_rate: u8,
    _reserved0: u8,
    pub end_trigger: Trigger,
    pub end_time: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5MasterPar {
    pub p_rx_q: u32,
    pub p_tx_q: u32,
    pub rx_config: RxConfig,
    pub seq_stat: SeqStat,
    pub max_nack: u8,
    pub max_pkt: u8,
    pub access_address: u32,
    pub crc_init0: u8,
    pub crc_init1: u8,
    pub crc_init2: u8,
    pub end_trigger: Trigger,
    pub end_time: RatTime,
    pub max_rx_pkt_len: u8,
    pub max_len_low_rate: u8,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5AdvExtPar {
    pub adv_config: ExtAdvConfig,
    _reserved0: u8,
    _reserved1: u8,
    pub aux_ptr_target_type: u8,
    pub aux_ptr_target_time: RatTime,
    pub p_adv_pkt: u32,
    pub p_device_address: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5AdvAuxPar {
    pub p_rx_q: u32,
    pub rx_config: RxConfig,
    pub adv_config: AuxAdvConfig,
    pub beh_config: BehConfig,
    pub aux_ptr_target_type: u8,
    pub aux_ptr_target_time: RatTime,
    pub p_adv_pkt: u32,
    pub p_rsp_pkt: u32,
    pub p_device_address: u32,
    pub p_white_list: u32,
}

/// Where and when to listen for an auxiliary packet.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5AuxChRes {
    pub rx_start_time: RatTime,
    /// Units of 0.25 us
    pub rx_listen_time: u16,
    pub channel_no: u8,
    pub phy_mode: u8,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5ScannerPar {
    pub p_rx_q: u32,
    pub rx_config: RxConfig,
    pub scan_config: ScanConfig,
    pub random_state: u16,
    pub backoff_count: u16,
    pub backoff_par: BackoffPar,
    pub ext_filter_config: ExtFilterConfig,
    pub adi_status: AdiStatus,
    _reserved0: u8,
    _reserved1: u16,
    pub p_device_address: u32,
    pub p_white_list: u32,
    pub p_adi_list: u32,
    pub max_wait_time_for_aux_ch: u16,
    pub timeout_trigger: Trigger,
    pub end_trigger: Trigger,
    pub timeout_time: RatTime,
    pub end_time: RatTime,
    /// Written by the RF Core when an auxiliary pointer is received
    pub aux_ch: Ble5AuxChRes,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5InitiatorPar {
    pub p_rx_q: u32,
    pub rx_config: RxConfig,
    pub init_config: InitConfig,
    pub random_state: u16,
    pub backoff_count: u16,
    pub backoff_par: BackoffPar,
    pub connect_req_len: u8,
    pub p_connect_req_data: u32,
    pub p_device_address: u32,
    pub p_white_list: u32,
    pub connect_time: RatTime,
    pub max_wait_time_for_aux_ch: u16,
    pub timeout_trigger: Trigger,
    pub end_trigger: Trigger,
    pub timeout_time: RatTime,
    pub end_time: RatTime,
    pub aux_ch: Ble5AuxChRes,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct MasterSlaveOutput {
    pub n_tx: u8,
    pub n_tx_ack: u8,
    pub n_tx_ctrl: u8,
    pub n_tx_ctrl_ack: u8,
    pub n_tx_ctrl_ack_ack: u8,
    pub n_tx_retrans: u8,
    pub n_tx_entry_done: u8,
    pub n_rx_ok: u8,
    pub n_rx_ctrl: u8,
    pub n_rx_ctrl_ack: u8,
    pub n_rx_nok: u8,
    pub n_rx_ignored: u8,
    pub n_rx_empty: u8,
    pub n_rx_buf_full: u8,
    pub last_rssi: i8,
    pub pkt_status: PktStatus,
    pub time_stamp: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct AdvOutput {
    pub n_tx_adv_ind: u16,
    pub n_tx_scan_rsp: u8,
    pub n_rx_scan_req: u8,
    pub n_rx_connect_req: u8,
    pub n_tx_connect_rsp: u8,
    pub n_rx_nok: u16,
    pub n_rx_ignored: u16,
    pub n_rx_buf_full: u8,
    pub last_rssi: i8,
    pub time_stamp: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ScannerOutput {
    pub n_tx_scan_req: u16,
    pub n_backed_off_scan_req: u16,
    pub n_rx_adv_ok: u16,
    pub n_rx_adv_ignored: u16,
    pub n_rx_adv_nok: u16,
    pub n_rx_scan_rsp_ok: u16,
    pub n_rx_scan_rsp_ignored: u16,
    pub n_rx_scan_rsp_nok: u16,
    pub n_rx_adv_buf_full: u8,
    pub n_rx_scan_rsp_buf_full: u8,
    pub last_rssi: i8,
    _reserved0: u8,
    pub time_stamp: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct InitiatorOutput {
    pub n_tx_connect_req: u8,
    pub n_rx_adv_ok: u8,
    pub n_rx_adv_ignored: u16,
    pub n_rx_adv_nok: u16,
    pub n_rx_adv_buf_full: u8,
    pub last_rssi: i8,
    pub time_stamp: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5ScanInitOutput {
    pub n_tx_req: u16,
    pub n_backed_off_req: u16,
    pub n_rx_adv_ok: u16,
    pub n_rx_adv_ignored: u16,
    pub n_rx_adv_nok: u16,
    pub n_rx_rsp_ok: u16,
    pub n_rx_rsp_ignored: u16,
    pub n_rx_rsp_nok: u16,
    pub n_rx_adv_buf_full: u8,
    pub n_rx_rsp_buf_full: u8,
    pub last_rssi: i8,
    _reserved0: u8,
    pub time_stamp: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct GenericRxOutput {
    pub n_rx_ok: u16,
    pub n_rx_nok: u16,
    pub n_rx_buf_full: u16,
    pub last_rssi: i8,
    _reserved0: u8,
    pub time_stamp: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct TxTestOutput {
    pub n_tx: u16,
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct ExtHdrInfo(u8);
    impl Debug;
    pub length, set_length: 5, 0;
    pub adv_mode, set_adv_mode: 7, 6;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct ExtHdrConfig(u8);
    impl Debug;
    /// Leave out AdvA even if the flags say it is present
    pub skip_adv_a, set_skip_adv_a: 0;
    pub skip_target_a, set_skip_target_a: 1;
    pub device_addr_type, set_device_addr_type: 2;
    pub target_addr_type, set_target_addr_type: 3;
}

/// An extended advertising packet as pointed to by `p_adv_pkt`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Ble5ExtAdvEntry {
    pub ext_hdr_info: ExtHdrInfo,
    pub ext_hdr_flags: u8,
    pub ext_hdr_config: ExtHdrConfig,
    pub adv_data_len: u8,
    pub p_ext_header: u32,
    pub p_adv_data: u32,
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct WhiteListConf(u8);
    impl Debug;
    pub enable, set_enable: 0;
    /// 0: public, 1: random
    pub addr_type, set_addr_type: 1;
    pub wl_ign, set_wl_ign: 2;
    pub priv_ign, set_priv_ign: 4;
}

/// White list entry. `size` is only read from the first entry and gives
/// the number of entries in the list.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct WhiteListEntry {
    pub size: u8,
    pub conf: WhiteListConf,
    pub address: u16,
    pub address_hi: u32,
}

impl WhiteListEntry {
    /// Enabled entry for a 48-bit device address.
    pub fn new(address: u64, random: bool) -> WhiteListEntry {
        let mut conf = WhiteListConf(0);
        conf.set_enable(true);
        conf.set_addr_type(random);
        WhiteListEntry {
            size: 0,
            conf,
            address: address as u16,
            address_hi: (address >> 16) as u32,
        }
    }
}

bitfield! {
    /// Advertising data ID list entry.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Ble5AdiEntry(u16);
    impl Debug;
    pub adv_data_id, set_adv_data_id: 11, 0;
    pub mode, set_mode: 13, 12;
}

bitfield! {
    /// Status byte appended to received packets.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct BleRxStatus(u8);
    impl Debug;
    pub channel, set_channel: 5, 0;
    pub ignore, set_ignore: 6;
    pub crc_err, set_crc_err: 7;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Ble5RxStatus(u16);
    impl Debug;
    pub channel, set_channel: 5, 0;
    pub ignore, set_ignore: 6;
    pub crc_err, set_crc_err: 7;
    pub phy_mode, set_phy_mode: 9, 8;
}
