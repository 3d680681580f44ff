// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! IEEE 802.15.4 commands.
//!
//! `CmdIeeeRx` runs as a background operation; TX, CSMA and RX_ACK run in
//! the foreground on top of it and share its receiver.

use hal_utils::ErrorCode;

use super::mailbox::{immediate_command, radio_op, DataQueue, RatTime, Trigger};

pub const CMD_IEEE_RX: u16 = 0x2801;
pub const CMD_IEEE_ED_SCAN: u16 = 0x2802;
pub const CMD_IEEE_TX: u16 = 0x2C01;
pub const CMD_IEEE_CSMA: u16 = 0x2C02;
pub const CMD_IEEE_RX_ACK: u16 = 0x2C03;
pub const CMD_IEEE_ABORT_BG: u16 = 0x2C04;
pub const CMD_IEEE_MOD_CCA: u16 = 0x2001;
pub const CMD_IEEE_MOD_FILT: u16 = 0x2002;
pub const CMD_IEEE_MOD_SRC_MATCH: u16 = 0x2003;
pub const CMD_IEEE_ABORT_FG: u16 = 0x2401;
pub const CMD_IEEE_STOP_FG: u16 = 0x2402;
pub const CMD_IEEE_CCA_REQ: u16 = 0x2403;

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct RxConfig(u8);
    impl Debug;
    pub auto_flush_crc, set_auto_flush_crc: 0;
    pub auto_flush_ign, set_auto_flush_ign: 1;
    pub include_phy_hdr, set_include_phy_hdr: 2;
    pub include_crc, set_include_crc: 3;
    pub append_rssi, set_append_rssi: 4;
    pub append_corr_crc, set_append_corr_crc: 5;
    /// Append the index of the matching source address entry
    pub append_src_ind, set_append_src_ind: 6;
    pub append_timestamp, set_append_timestamp: 7;
}

bitfield! {
    /// Frame filtering and automatic acknowledgement options.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct FrameFiltOpt(u16);
    impl Debug;
    pub frame_filt_en, set_frame_filt_en: 0;
    /// Stop receiving a frame as soon as it fails filtering
    pub frame_filt_stop, set_frame_filt_stop: 1;
    pub auto_ack_en, set_auto_ack_en: 2;
    pub slotted_ack_en, set_slotted_ack_en: 3;
    pub auto_pend_en, set_auto_pend_en: 4;
    pub default_pend, set_default_pend: 5;
    pub pend_data_req_only, set_pend_data_req_only: 6;
    pub pan_coord, set_pan_coord: 7;
    pub max_frame_version, set_max_frame_version: 9, 8;
    pub fcf_reserved_mask, set_fcf_reserved_mask: 12, 10;
    pub modify_ft_filter, set_modify_ft_filter: 14, 13;
    pub strict_len_filter, set_strict_len_filter: 15;
}

bitfield! {
    /// Frame types accepted by the filter, one bit per type 0 to 7.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct FrameTypes(u8);
    impl Debug;
    pub accept_beacon, set_accept_beacon: 0;
    pub accept_data, set_accept_data: 1;
    pub accept_ack, set_accept_ack: 2;
    pub accept_mac_cmd, set_accept_mac_cmd: 3;
    pub accept_reserved4, set_accept_reserved4: 4;
    pub accept_reserved5, set_accept_reserved5: 5;
    pub accept_reserved6, set_accept_reserved6: 6;
    pub accept_reserved7, set_accept_reserved7: 7;
}

bitfield! {
    /// Clear channel assessment sources and how they combine.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct CcaOpt(u8);
    impl Debug;
    pub cca_en_energy, set_cca_en_energy: 0;
    pub cca_en_corr, set_cca_en_corr: 1;
    pub cca_en_sync, set_cca_en_sync: 2;
    /// 0: busy if either energy or correlation, 1: only if both
    pub cca_corr_op, set_cca_corr_op: 3;
    pub cca_sync_op, set_cca_sync_op: 4;
    pub cca_corr_thr, set_cca_corr_thr: 6, 5;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct TxOpt(u8);
    impl Debug;
    pub include_phy_hdr, set_include_phy_hdr: 0;
    pub include_crc, set_include_crc: 1;
    pub payload_len_msb, set_payload_len_msb: 7, 3;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct CsmaConfig(u8);
    impl Debug;
    /// Initial contention window, slotted CSMA only
    pub init_cw, set_init_cw: 4, 0;
    pub slotted, set_slotted: 5;
    pub rx_off_mode, set_rx_off_mode: 7, 6;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SrcMatchOptions(u8);
    impl Debug;
    pub enable, set_enable: 0;
    /// Set the frame pending bit in ACKs to this source
    pub src_pend, set_src_pend: 1;
    /// 0: short address entry, 1: extended address entry
    pub entry_type, set_entry_type: 2;
}

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct CcaInfo(u8);
    impl Debug;
    /// See [`CcaState`]
    pub cca_state, set_cca_state: 1, 0;
    pub cca_energy, set_cca_energy: 3, 2;
    pub cca_corr, set_cca_corr: 5, 4;
    pub cca_sync, set_cca_sync: 6;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CcaState {
    Idle = 0,
    Busy = 1,
    Invalid = 2,
}

radio_op! {
    /// Background receiver: filters, acknowledges and queues frames until
    /// the end trigger.
    CmdIeeeRx = CMD_IEEE_RX;
    {
        /// 11 to 26, or 0 to keep the current synthesizer frequency
        pub channel: u8,
        pub rx_config: RxConfig,
        pub p_rx_q: u32,
        pub p_output: u32,
        pub frame_filt_opt: FrameFiltOpt,
        pub frame_types: FrameTypes,
        pub cca_opt: CcaOpt,
        pub cca_rssi_thr: i8,
        _reserved0: u8,
        pub num_ext_entries: u8,
        pub num_short_entries: u8,
        pub p_ext_entry_list: u32,
        pub p_short_entry_list: u32,
        pub local_ext_addr: u64,
        pub local_short_addr: u16,
        pub local_pan_id: u16,
        _reserved1: u16,
        _reserved2: u8,
        pub end_trigger: Trigger,
        pub end_time: RatTime,
    }
}

impl CmdIeeeRx {
    pub fn set_queue(&mut self, queue: &DataQueue) {
        self.p_rx_q = queue as *const DataQueue as usize as u32;
    }

    pub fn set_output(&mut self, output: &IeeeRxOutput) {
        self.p_output = output as *const IeeeRxOutput as usize as u32;
    }

    /// Source matching list for short addresses. The list is followed in
    /// memory by the enable and pending bitmaps the RF Core maintains.
    /// At most 255 entries, `SIZE` otherwise.
    pub fn set_short_entries(&mut self, entries: &[ShortAddrEntry]) -> Result<(), ErrorCode> {
        let count = u8::try_from(entries.len()).map_err(|_| ErrorCode::SIZE)?;
        self.p_short_entry_list = entries.as_ptr() as usize as u32;
        self.num_short_entries = count;
        Ok(())
    }
}

radio_op! {
    /// Energy detect scan.
    CmdIeeeEdScan = CMD_IEEE_ED_SCAN;
    {
        pub channel: u8,
        pub cca_opt: CcaOpt,
        pub cca_rssi_thr: i8,
        _reserved0: u8,
        /// Written by the RF Core
        pub max_rssi: i8,
        pub end_trigger: Trigger,
        pub end_time: RatTime,
    }
}

radio_op! {
    CmdIeeeTx = CMD_IEEE_TX;
    {
        pub tx_opt: TxOpt,
        pub payload_len: u8,
        pub p_payload: u32,
        /// Written by the RF Core: start of the transmitted frame
        pub time_stamp: RatTime,
    }
}

radio_op! {
    /// Unslotted or slotted CSMA-CA, normally chained to a CmdIeeeTx.
    CmdIeeeCsma = CMD_IEEE_CSMA;
    {
        pub random_state: u16,
        pub mac_max_be: u8,
        pub mac_max_csma_backoffs: u8,
        pub csma_config: CsmaConfig,
        /// Number of backoffs so far
        pub nb: u8,
        /// Current backoff exponent
        pub be: u8,
        pub remaining_periods: u8,
        pub last_rssi: i8,
        pub end_trigger: Trigger,
        pub last_time_stamp: RatTime,
        pub end_time: RatTime,
    }
}

radio_op! {
    /// Wait for the acknowledgement of a transmitted frame.
    CmdIeeeRxAck = CMD_IEEE_RX_ACK;
    {
        pub seq_no: u8,
        pub end_trigger: Trigger,
        pub end_time: RatTime,
    }
}

radio_op! {
    CmdIeeeAbortBg = CMD_IEEE_ABORT_BG;
    {}
}

immediate_command! {
    /// Change the CCA options of a running background receiver.
    CmdIeeeModCca = CMD_IEEE_MOD_CCA;
    {
        pub new_cca_opt: CcaOpt,
        pub new_cca_rssi_thr: i8,
    }
}

immediate_command! {
    CmdIeeeModFilt = CMD_IEEE_MOD_FILT;
    {
        pub new_frame_filt_opt: FrameFiltOpt,
        pub new_frame_types: FrameTypes,
    }
}

immediate_command! {
    CmdIeeeModSrcMatch = CMD_IEEE_MOD_SRC_MATCH;
    {
        pub options: SrcMatchOptions,
        pub entry_no: u8,
    }
}

immediate_command! {
    CmdIeeeAbortFg = CMD_IEEE_ABORT_FG;
    {}
}

immediate_command! {
    CmdIeeeStopFg = CMD_IEEE_STOP_FG;
    {}
}

immediate_command! {
    CmdIeeeCcaReq = CMD_IEEE_CCA_REQ;
    {
        pub current_rssi: i8,
        pub max_rssi: i8,
        pub cca_info: CcaInfo,
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct IeeeRxOutput {
    pub n_tx_ack: u8,
    pub n_rx_beacon: u8,
    pub n_rx_data: u8,
    pub n_rx_ack: u8,
    pub n_rx_mac_cmd: u8,
    pub n_rx_reserved: u8,
    pub n_rx_nok: u8,
    pub n_rx_ignored: u8,
    pub n_rx_buf_full: u8,
    pub last_rssi: i8,
    pub max_rssi: i8,
    _reserved0: u8,
    pub beacon_time_stamp: RatTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ShortAddrEntry {
    pub short_addr: u16,
    pub pan_id: u16,
}

bitfield! {
    /// Status byte appended to received frames.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct IeeeRxCorrCrc(u8);
    impl Debug;
    pub corr, set_corr: 5, 0;
    pub ignore, set_ignore: 6;
    pub crc_err, set_crc_err: 7;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::mailbox::{ImmediateCommand, RadioCommand};
    use core::mem::{align_of, offset_of, size_of};

    #[test]
    fn rx_layout() {
        assert_eq!(offset_of!(CmdIeeeRx, channel), 14);
        assert_eq!(offset_of!(CmdIeeeRx, rx_config), 15);
        assert_eq!(offset_of!(CmdIeeeRx, p_rx_q), 16);
        assert_eq!(offset_of!(CmdIeeeRx, frame_filt_opt), 24);
        assert_eq!(offset_of!(CmdIeeeRx, cca_rssi_thr), 28);
        assert_eq!(offset_of!(CmdIeeeRx, num_short_entries), 31);
        assert_eq!(offset_of!(CmdIeeeRx, p_short_entry_list), 36);
        assert_eq!(offset_of!(CmdIeeeRx, local_ext_addr), 40);
        assert_eq!(offset_of!(CmdIeeeRx, local_pan_id), 50);
        assert_eq!(offset_of!(CmdIeeeRx, end_trigger), 55);
        assert_eq!(offset_of!(CmdIeeeRx, end_time), 56);
        assert_eq!(size_of::<CmdIeeeRx>(), 64);
        assert_eq!(align_of::<CmdIeeeRx>(), 8);
    }

    #[test]
    fn foreground_layouts() {
        assert_eq!(offset_of!(CmdIeeeEdScan, max_rssi), 18);
        assert_eq!(offset_of!(CmdIeeeEdScan, end_time), 20);
        assert_eq!(offset_of!(CmdIeeeTx, p_payload), 16);
        assert_eq!(size_of::<CmdIeeeTx>(), 24);
        assert_eq!(offset_of!(CmdIeeeCsma, csma_config), 18);
        assert_eq!(offset_of!(CmdIeeeCsma, end_trigger), 23);
        assert_eq!(offset_of!(CmdIeeeCsma, end_time), 28);
        assert_eq!(size_of::<CmdIeeeCsma>(), 32);
        assert_eq!(offset_of!(CmdIeeeRxAck, end_time), 16);
        assert_eq!(size_of::<CmdIeeeAbortBg>(), 16);
    }

    #[test]
    fn immediate_layouts() {
        assert_eq!(size_of::<CmdIeeeModCca>(), 4);
        assert_eq!(offset_of!(CmdIeeeModFilt, new_frame_types), 4);
        assert_eq!(size_of::<CmdIeeeModFilt>(), 8);
        assert_eq!(offset_of!(CmdIeeeModSrcMatch, entry_no), 3);
        assert_eq!(offset_of!(CmdIeeeCcaReq, cca_info), 4);
        assert_eq!(size_of::<IeeeRxOutput>(), 16);
        assert_eq!(size_of::<ShortAddrEntry>(), 4);
    }

    #[test]
    fn commands_are_numbered() {
        assert_eq!({ CmdIeeeCsma::new().op.command_no }, 0x2C02);
        assert_eq!(CmdIeeeStopFg::new().command_no, 0x2402);
        assert_eq!(CmdIeeeEdScan::COMMAND_NO, 0x2802);
    }

    #[test]
    fn auto_ack_filter_options() {
        let mut filt = FrameFiltOpt(0);
        filt.set_frame_filt_en(true);
        filt.set_auto_ack_en(true);
        filt.set_max_frame_version(2);
        assert_eq!(filt.0, 0b10_0000_0101);

        let mut tx = TxOpt(0);
        tx.set_payload_len_msb(0x1F);
        assert_eq!(tx.0, 0xF8);
    }

    #[test]
    fn receiver_links() {
        let queue = DataQueue::default();
        let entries = [ShortAddrEntry { short_addr: 0x1234, pan_id: 0xABCD }; 3];
        let mut rx = CmdIeeeRx::new();
        rx.set_queue(&queue);
        assert_eq!(rx.set_short_entries(&entries), Ok(()));
        assert_eq!(rx.p_rx_q, &queue as *const DataQueue as usize as u32);
        assert_eq!(rx.num_short_entries, 3);
        assert_eq!(rx.p_short_entry_list, entries.as_ptr() as usize as u32);

        let too_many = [ShortAddrEntry { short_addr: 0, pan_id: 0 }; 256];
        assert_eq!(rx.set_short_entries(&too_many), Err(ErrorCode::SIZE));
        assert_eq!(rx.num_short_entries, 3);
    }

    #[test]
    fn cca_report() {
        let info = CcaInfo(0b0100_0101);
        assert_eq!(info.cca_state(), CcaState::Busy as u8);
        assert_eq!(info.cca_energy(), 1);
        assert!(info.cca_sync());

        let status = IeeeRxCorrCrc(0x80 | 0x20);
        assert_eq!(status.corr(), 0x20);
        assert!(status.crc_err());
    }
}
