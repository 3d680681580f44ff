// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Proprietary mode commands: generic (G)FSK/OOK packet radio with
//! configurable preamble, sync word, header and CRC.

use hal_utils::ErrorCode;

use super::common::SetupConfig;
use super::mailbox::{immediate_command, radio_op, DataQueue, RatTime, Trigger};

pub const CMD_PROP_TX: u16 = 0x3801;
pub const CMD_PROP_RX: u16 = 0x3802;
pub const CMD_PROP_TX_ADV: u16 = 0x3803;
pub const CMD_PROP_RX_ADV: u16 = 0x3804;
pub const CMD_PROP_CS: u16 = 0x3805;
pub const CMD_PROP_RADIO_SETUP: u16 = 0x3806;
pub const CMD_PROP_RADIO_DIV_SETUP: u16 = 0x3807;
pub const CMD_PROP_RX_SNIFF: u16 = 0x3808;
pub const CMD_PROP_RX_ADV_SNIFF: u16 = 0x3809;
pub const CMD_PROP_SET_LEN: u16 = 0x3401;
pub const CMD_PROP_RESTART_RX: u16 = 0x3402;

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Modulation(u16);
    impl Debug;
    /// See [`ModType`]
    pub mod_type, set_mod_type: 2, 0;
    /// Frequency deviation in units of 250 Hz times the step size
    pub deviation, set_deviation: 13, 3;
    pub deviation_step_sz, set_deviation_step_sz: 15, 14;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ModType {
    Fsk = 0,
    Gfsk = 1,
    Ook = 2,
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SymbolRate(u32);
    impl Debug;
    pub pre_scale, set_pre_scale: 7, 0;
    pub rate_word, set_rate_word: 28, 8;
    pub decim_mode, set_decim_mode: 31, 29;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct PreamConf(u8);
    impl Debug;
    pub n_pream_bytes, set_n_pream_bytes: 5, 0;
    pub pream_mode, set_pream_mode: 7, 6;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct FormatConf(u16);
    impl Debug;
    /// Sync word length in bits
    pub n_sw_bits, set_n_sw_bits: 5, 0;
    pub bit_reversal, set_bit_reversal: 6;
    pub msb_first, set_msb_first: 7;
    pub fec_mode, set_fec_mode: 11, 8;
    pub whiten_mode, set_whiten_mode: 15, 13;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct TxPktConf(u8);
    impl Debug;
    pub fs_off, set_fs_off: 0;
    pub use_crc, set_use_crc: 3;
    /// Send `pktLen` as a length byte before the payload
    pub var_len, set_var_len: 4;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct RxPktConf(u8);
    impl Debug;
    pub fs_off, set_fs_off: 0;
    /// Keep receiving after a packet with a good CRC
    pub repeat_ok, set_repeat_ok: 1;
    pub repeat_nok, set_repeat_nok: 2;
    pub use_crc, set_use_crc: 3;
    pub var_len, set_var_len: 4;
    pub chk_address, set_chk_address: 5;
    /// 0: the end trigger cuts a packet short, 1: it waits for the packet
    pub end_type, set_end_type: 6;
    /// 0: stop on a filtered packet, 1: restart the receiver
    pub filter_op, set_filter_op: 7;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct TxAdvPktConf(u8);
    impl Debug;
    pub fs_off, set_fs_off: 0;
    pub use_crc, set_use_crc: 3;
    pub crc_inc_sw, set_crc_inc_sw: 4;
    pub crc_inc_hdr, set_crc_inc_hdr: 5;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct RxAdvPktConf(u8);
    impl Debug;
    pub fs_off, set_fs_off: 0;
    pub repeat_ok, set_repeat_ok: 1;
    pub repeat_nok, set_repeat_nok: 2;
    pub use_crc, set_use_crc: 3;
    pub crc_inc_sw, set_crc_inc_sw: 4;
    pub crc_inc_hdr, set_crc_inc_hdr: 5;
    pub end_type, set_end_type: 6;
    pub filter_op, set_filter_op: 7;
}

bitfield! {
    /// What goes into the RX queue with each packet.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct RxConf(u8);
    impl Debug;
    pub auto_flush_ignored, set_auto_flush_ignored: 0;
    pub auto_flush_crc_err, set_auto_flush_crc_err: 1;
    pub include_hdr, set_include_hdr: 3;
    pub include_crc, set_include_crc: 4;
    pub append_rssi, set_append_rssi: 5;
    pub append_timestamp, set_append_timestamp: 6;
    pub append_status, set_append_status: 7;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct StartConf(u8);
    impl Debug;
    pub ext_tx_trig, set_ext_tx_trig: 0;
    pub input_mode, set_input_mode: 2, 1;
    pub source, set_source: 7, 3;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct HdrConf(u16);
    impl Debug;
    pub num_hdr_bits, set_num_hdr_bits: 5, 0;
    pub len_pos, set_len_pos: 10, 6;
    pub num_len_bits, set_num_len_bits: 15, 11;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct AddrConf(u16);
    impl Debug;
    /// 0: address after the header, 1: address inside the header
    pub addr_type, set_addr_type: 0;
    pub addr_size, set_addr_size: 5, 1;
    pub addr_pos, set_addr_pos: 10, 6;
    pub num_addr, set_num_addr: 15, 11;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct CsConf(u8);
    impl Debug;
    pub ena_rssi, set_ena_rssi: 0;
    pub ena_corr, set_ena_corr: 1;
    /// 0: busy if either source is busy, 1: only if both are
    pub operation, set_operation: 2;
    /// 0: keep sensing on busy, 1: end on busy
    pub busy_op, set_busy_op: 3;
    pub idle_op, set_idle_op: 4;
    /// Result reported when the end trigger fires while undecided
    pub timeout_res, set_timeout_res: 5;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct CorrConfig(u8);
    impl Debug;
    pub num_corr_inv, set_num_corr_inv: 3, 0;
    pub num_corr_busy, set_num_corr_busy: 7, 4;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct CsFsConf(u8);
    impl Debug;
    pub fs_off_idle, set_fs_off_idle: 0;
    pub fs_off_busy, set_fs_off_busy: 1;
}

/// Carrier sense settings, shared by CMD_PROP_CS and the sniff receivers.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct CarrierSense {
    pub cs_conf: CsConf,
    pub rssi_thr: i8,
    /// Consecutive RSSI samples below the threshold before declaring idle
    pub num_rssi_idle: u8,
    pub num_rssi_busy: u8,
    pub corr_period: u16,
    pub corr_config: CorrConfig,
    pub cs_end_trigger: Trigger,
    pub cs_end_time: RatTime,
}

radio_op! {
    CmdPropTx = CMD_PROP_TX;
    {
        pub pkt_conf: TxPktConf,
        pub pkt_len: u8,
        pub sync_word: u32,
        pub p_pkt: u32,
    }
}

radio_op! {
    CmdPropRx = CMD_PROP_RX;
    {
        pub pkt_conf: RxPktConf,
        pub rx_conf: RxConf,
        pub sync_word: u32,
        /// 0 for unlimited
        pub max_pkt_len: u8,
        pub address0: u8,
        pub address1: u8,
        pub end_trigger: Trigger,
        pub end_time: RatTime,
        pub p_queue: u32,
        /// [`PropRxOutput`]
        pub p_output: u32,
    }
}

radio_op! {
    CmdPropTxAdv = CMD_PROP_TX_ADV;
    {
        pub pkt_conf: TxAdvPktConf,
        pub num_hdr_bits: u8,
        /// 0 for unlimited length fed from a queue
        pub pkt_len: u16,
        pub start_conf: StartConf,
        pub pre_trigger: Trigger,
        pub pre_time: RatTime,
        pub sync_word: u32,
        pub p_pkt: u32,
    }
}

radio_op! {
    CmdPropRxAdv = CMD_PROP_RX_ADV;
    {
        pub pkt_conf: RxAdvPktConf,
        pub rx_conf: RxConf,
        pub sync_word0: u32,
        /// Alternative sync word, 0 if unused
        pub sync_word1: u32,
        pub max_pkt_len: u16,
        pub hdr_conf: HdrConf,
        pub addr_conf: AddrConf,
        /// Added to the received length field to get the payload length
        pub len_offset: i8,
        pub end_trigger: Trigger,
        pub end_time: RatTime,
        pub p_addr: u32,
        pub p_queue: u32,
        pub p_output: u32,
    }
}

radio_op! {
    /// Carrier sense without reception.
    CmdPropCs = CMD_PROP_CS;
    {
        pub cs_fs_conf: CsFsConf,
        _reserved0: u8,
        pub cs: CarrierSense,
    }
}

radio_op! {
    CmdPropRadioSetup = CMD_PROP_RADIO_SETUP;
    {
        pub modulation: Modulation,
        pub symbol_rate: SymbolRate,
        pub rx_bw: u8,
        pub pream_conf: PreamConf,
        pub format_conf: FormatConf,
        pub config: SetupConfig,
        pub tx_power: u16,
        pub p_reg_override: u32,
    }
}

radio_op! {
    CmdPropRadioSetupPa = CMD_PROP_RADIO_SETUP;
    {
        pub modulation: Modulation,
        pub symbol_rate: SymbolRate,
        pub rx_bw: u8,
        pub pream_conf: PreamConf,
        pub format_conf: FormatConf,
        pub config: SetupConfig,
        pub tx_power: u16,
        pub p_reg_override: u32,
        pub p_reg_override_tx_std: u32,
        pub p_reg_override_tx20: u32,
    }
}

radio_op! {
    /// Setup for devices with a frequency divider in front of the
    /// synthesizer (sub-GHz and 2.4 GHz on the same chip).
    CmdPropRadioDivSetup = CMD_PROP_RADIO_DIV_SETUP;
    {
        pub modulation: Modulation,
        pub symbol_rate: SymbolRate,
        pub rx_bw: u8,
        pub pream_conf: PreamConf,
        pub format_conf: FormatConf,
        pub config: SetupConfig,
        pub tx_power: u16,
        pub p_reg_override: u32,
        /// MHz
        pub center_freq: u16,
        /// Intermediate frequency, 0x8000 for the default
        pub int_freq: i16,
        pub lo_divider: u8,
    }
}

radio_op! {
    CmdPropRadioDivSetupPa = CMD_PROP_RADIO_DIV_SETUP;
    {
        pub modulation: Modulation,
        pub symbol_rate: SymbolRate,
        pub rx_bw: u8,
        pub pream_conf: PreamConf,
        pub format_conf: FormatConf,
        pub config: SetupConfig,
        pub tx_power: u16,
        pub p_reg_override: u32,
        pub center_freq: u16,
        pub int_freq: i16,
        pub lo_divider: u8,
        _reserved0: u8,
        _reserved1: u16,
        pub p_reg_override_tx_std: u32,
        pub p_reg_override_tx20: u32,
    }
}

radio_op! {
    /// CmdPropRx preceded by carrier sense; the receiver only starts if the
    /// channel turns out busy.
    CmdPropRxSniff = CMD_PROP_RX_SNIFF;
    {
        pub pkt_conf: RxPktConf,
        pub rx_conf: RxConf,
        pub sync_word: u32,
        pub max_pkt_len: u8,
        pub address0: u8,
        pub address1: u8,
        pub end_trigger: Trigger,
        pub end_time: RatTime,
        pub p_queue: u32,
        pub p_output: u32,
        pub cs: CarrierSense,
    }
}

radio_op! {
    CmdPropRxAdvSniff = CMD_PROP_RX_ADV_SNIFF;
    {
        pub pkt_conf: RxAdvPktConf,
        pub rx_conf: RxConf,
        pub sync_word0: u32,
        pub sync_word1: u32,
        pub max_pkt_len: u16,
        pub hdr_conf: HdrConf,
        pub addr_conf: AddrConf,
        pub len_offset: i8,
        pub end_trigger: Trigger,
        pub end_time: RatTime,
        pub p_addr: u32,
        pub p_queue: u32,
        pub p_output: u32,
        pub cs: CarrierSense,
    }
}

impl CmdPropRx {
    pub fn set_queue(&mut self, queue: &DataQueue) {
        self.p_queue = queue as *const DataQueue as usize as u32;
    }

    pub fn set_output(&mut self, output: &PropRxOutput) {
        self.p_output = output as *const PropRxOutput as usize as u32;
    }
}

impl CmdPropTx {
    /// Send `packet` as the payload. Packets longer than 255 bytes need
    /// CmdPropTxAdv and are refused with `SIZE`.
    pub fn set_packet(&mut self, packet: &[u8]) -> Result<(), ErrorCode> {
        let len = u8::try_from(packet.len()).map_err(|_| ErrorCode::SIZE)?;
        self.p_pkt = packet.as_ptr() as usize as u32;
        self.pkt_len = len;
        Ok(())
    }
}

immediate_command! {
    /// Set the length of a packet being received with unlimited length.
    CmdPropSetLen = CMD_PROP_SET_LEN;
    {
        pub rx_len: u16,
    }
}

immediate_command! {
    CmdPropRestartRx = CMD_PROP_RESTART_RX;
    {}
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct PropRxOutput {
    pub n_rx_ok: u16,
    pub n_rx_nok: u16,
    pub n_rx_ignored: u8,
    pub n_rx_stopped: u8,
    pub n_rx_buf_full: u8,
    pub last_rssi: i8,
    pub time_stamp: RatTime,
}

bitfield! {
    /// Status byte appended to received packets.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct PropRxStatus(u8);
    impl Debug;
    pub address_ind, set_address_ind: 4, 0;
    /// Which of the two sync words matched
    pub sync_word_id, set_sync_word_id: 5;
    /// 0: OK, 1: CRC error, 2: ignored, 3: aborted
    pub result, set_result: 7, 6;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::mailbox::{ImmediateCommand, RadioCommand};
    use core::mem::{offset_of, size_of};

    #[test]
    fn tx_rx_layouts() {
        assert_eq!(offset_of!(CmdPropTx, pkt_len), 15);
        assert_eq!(offset_of!(CmdPropTx, sync_word), 16);
        assert_eq!(offset_of!(CmdPropTx, p_pkt), 20);
        assert_eq!(size_of::<CmdPropTx>(), 24);

        assert_eq!(offset_of!(CmdPropRx, max_pkt_len), 20);
        assert_eq!(offset_of!(CmdPropRx, end_trigger), 23);
        assert_eq!(offset_of!(CmdPropRx, end_time), 24);
        assert_eq!(offset_of!(CmdPropRx, p_queue), 28);
        assert_eq!(offset_of!(CmdPropRx, p_output), 32);
        assert_eq!(size_of::<CmdPropRx>(), 36);
    }

    #[test]
    fn advanced_layouts() {
        assert_eq!(offset_of!(CmdPropTxAdv, pkt_len), 16);
        assert_eq!(offset_of!(CmdPropTxAdv, pre_trigger), 19);
        assert_eq!(offset_of!(CmdPropTxAdv, p_pkt), 28);
        assert_eq!(size_of::<CmdPropTxAdv>(), 32);

        assert_eq!(offset_of!(CmdPropRxAdv, max_pkt_len), 24);
        assert_eq!(offset_of!(CmdPropRxAdv, addr_conf), 28);
        assert_eq!(offset_of!(CmdPropRxAdv, len_offset), 30);
        assert_eq!(offset_of!(CmdPropRxAdv, end_time), 32);
        assert_eq!(offset_of!(CmdPropRxAdv, p_output), 44);
        assert_eq!(size_of::<CmdPropRxAdv>(), 48);
    }

    #[test]
    fn carrier_sense_layouts() {
        assert_eq!(size_of::<CarrierSense>(), 12);
        assert_eq!(offset_of!(CarrierSense, corr_period), 4);
        assert_eq!(offset_of!(CarrierSense, cs_end_time), 8);

        assert_eq!(offset_of!(CmdPropCs, cs), 16);
        assert_eq!(size_of::<CmdPropCs>(), 28);
        assert_eq!(offset_of!(CmdPropRxSniff, cs), 36);
        assert_eq!(size_of::<CmdPropRxSniff>(), 48);
        assert_eq!(offset_of!(CmdPropRxAdvSniff, cs), 48);
        assert_eq!(size_of::<CmdPropRxAdvSniff>(), 60);
    }

    #[test]
    fn setup_layouts() {
        assert_eq!(offset_of!(CmdPropRadioSetup, symbol_rate), 16);
        assert_eq!(offset_of!(CmdPropRadioSetup, rx_bw), 20);
        assert_eq!(offset_of!(CmdPropRadioSetup, format_conf), 22);
        assert_eq!(offset_of!(CmdPropRadioSetup, config), 24);
        assert_eq!(offset_of!(CmdPropRadioSetup, p_reg_override), 28);
        assert_eq!(size_of::<CmdPropRadioSetup>(), 32);
        assert_eq!(size_of::<CmdPropRadioSetupPa>(), 40);

        assert_eq!(offset_of!(CmdPropRadioDivSetup, center_freq), 32);
        assert_eq!(offset_of!(CmdPropRadioDivSetup, lo_divider), 36);
        assert_eq!(size_of::<CmdPropRadioDivSetup>(), 40);
        assert_eq!(offset_of!(CmdPropRadioDivSetupPa, p_reg_override_tx_std), 40);
        assert_eq!(size_of::<CmdPropRadioDivSetupPa>(), 48);
    }

    #[test]
    fn immediates_and_output() {
        assert_eq!(size_of::<CmdPropSetLen>(), 4);
        assert_eq!(CmdPropRestartRx::new().command_no, 0x3402);
        assert_eq!(offset_of!(PropRxOutput, last_rssi), 7);
        assert_eq!(size_of::<PropRxOutput>(), 12);
    }

    #[test]
    fn radio_setup_words() {
        let mut setup = CmdPropRadioDivSetup::new();
        assert_eq!({ setup.op.command_no }, 0x3807);

        setup.modulation.set_mod_type(ModType::Gfsk as u16);
        setup.modulation.set_deviation(100);
        assert_eq!(setup.modulation.0, (100 << 3) | 1);

        setup.symbol_rate.set_pre_scale(0xF);
        setup.symbol_rate.set_rate_word(0x8000);
        assert_eq!(setup.symbol_rate.0, 0x0080_000F);

        setup.format_conf.set_n_sw_bits(32);
        setup.format_conf.set_msb_first(true);
        assert_eq!(setup.format_conf.0, 0x00A0);
    }

    #[test]
    fn packet_helpers() {
        let packet = [0u8; 20];
        let mut tx = CmdPropTx::new();
        assert_eq!(tx.set_packet(&packet), Ok(()));
        assert_eq!(tx.pkt_len, 20);
        assert_eq!(tx.p_pkt, packet.as_ptr() as usize as u32);

        let status = PropRxStatus(0b0110_0011);
        assert_eq!(status.address_ind(), 3);
        assert!(status.sync_word_id());
        assert_eq!(status.result(), 1);
    }

    #[test]
    fn oversized_packet_is_refused() {
        let packet = [0u8; 300];
        let mut tx = CmdPropTx::new();
        assert_eq!(tx.set_packet(&packet), Err(ErrorCode::SIZE));
        assert_eq!(tx.pkt_len, 0);
        assert_eq!(tx.p_pkt, 0);

        let largest = [0u8; 255];
        assert_eq!(tx.set_packet(&largest), Ok(()));
        assert_eq!(tx.pkt_len, 255);
    }
}
