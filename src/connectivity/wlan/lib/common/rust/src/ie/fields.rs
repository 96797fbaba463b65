// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    bitfield::bitfield,
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

macro_rules! pub_const {
    ($name:ident, $val:expr) => {
        pub const $name: Self = Self($val);
    };
}

/// Declares a newtype over the raw `u8` value of a multi-bit subfield, convertible both ways so
/// it can be used with `from into` bitfield accessors.
macro_rules! subfield_newtype {
    ($name:ident) => {
        #[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Hash, Clone, Copy, Default)]
        pub struct $name(pub u8);

        impl From<u8> for $name {
            fn from(raw: u8) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.0
            }
        }
    };
}

bitfield! {
    // IEEE Std 802.11-2016, 9.4.2.3
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy)]
    pub struct SupportedRate(u8);
    impl Debug;
    bool;
    pub u8, rate, set_rate: 6, 0;
    pub basic, set_basic: 7;
}

impl SupportedRate {
    pub fn with_basic(mut self, basic: bool) -> Self {
        self.set_basic(basic);
        self
    }
}

// IEEE Std 802.11-2016, 9.4.2.56
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct HtCapabilities {
    pub ht_cap_info: HtCapabilityInfo, // u16
    pub ampdu_params: AmpduParams,     // u8
    pub mcs_set: SupportedMcsSet,      // u128
    pub ht_ext_cap: HtExtCapabilities, // u16
    pub txbf_cap: TxBfCapability,      // u32
    pub asel_cap: AselCapability,      // u8
}

subfield_newtype!(ChanWidthSet);
impl ChanWidthSet {
    pub_const!(TWENTY_ONLY, 0);
    pub_const!(TWENTY_FORTY, 1);
}

subfield_newtype!(SmPowerSave);
impl SmPowerSave {
    pub_const!(STATIC, 0);
    pub_const!(DYNAMIC, 1);
    // 2 reserved
    pub_const!(DISABLED, 3);
}

subfield_newtype!(MaxAmsduLen);
impl MaxAmsduLen {
    pub_const!(OCTETS_3839, 0);
    pub_const!(OCTETS_7935, 1);
}

bitfield! {
    // IEEE Std 802.11-2016, 9.4.2.56.2
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Default)]
    pub struct HtCapabilityInfo(u16);
    impl Debug;
    bool;
    pub ldpc_coding_cap, set_ldpc_coding_cap: 0;
    // IEEE Std 802.11-2016, 9.4.2.56.2: Supported Channel Width Set
    pub u8, from into ChanWidthSet, chan_width_set, set_chan_width_set: 1, 1;
    // Spatial Multiplexing Power Save
    pub u8, from into SmPowerSave, sm_power_save, set_sm_power_save: 3, 2;
    pub greenfield, set_greenfield: 4;
    pub short_gi_20, set_short_gi_20: 5;
    pub short_gi_40, set_short_gi_40: 6;
    pub tx_stbc, set_tx_stbc: 7;
    // maximum number of spatial streams. Up to 3.
    pub u8, rx_stbc, set_rx_stbc: 9, 8;
    pub delayed_block_ack, set_delayed_block_ack: 10;
    pub u8, from into MaxAmsduLen, max_amsdu_len, set_max_amsdu_len: 11, 11;
    // DSSS/CCK Mode in 40 MHz
    pub dsss_in_40, set_dsss_in_40: 12;
    // 13 reserved
    pub intolerant_40, set_intolerant_40: 14;
    pub lsig_txop_protect, set_lsig_txop_protect: 15;
}

subfield_newtype!(MinMpduStartSpacing);
impl MinMpduStartSpacing {
    pub_const!(NO_RESTRICT, 0);
    pub_const!(QUATER_USEC, 1);
    pub_const!(HALF_USEC, 2);
    pub_const!(ONE_USEC, 3);
    pub_const!(TWO_USEC, 4);
    pub_const!(FOUR_USEC, 5);
    pub_const!(EIGHT_USEC, 6);
    pub_const!(SIXTEEN_USEC, 7);
}

bitfield! {
    // IEEE Std 802.11-2016, 9.4.2.56.3
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Default)]
    pub struct AmpduParams(u8);
    impl Debug;
    u8;
    // Maximum A-MPDU Length Exponent.
    pub u8, exponent, set_exponent: 1, 0;
    // Minimum MPDU Start Spacing.
    pub u8, from into MinMpduStartSpacing, min_start_spacing, set_min_start_spacing: 4, 2;
}

impl AmpduParams {
    pub fn max_ampdu_len(&self) -> usize {
        (1 << (13 + self.exponent())) - 1 as usize
    }
}

bitfield! {
    // IEEE Std 802.11-2016, 9.4.2.56.4
    // HT-MCS table in IEEE Std 802.11-2016, Annex B.4.17.2
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Default)]
    pub struct SupportedMcsSet(u128);
    impl Debug;
    bool;
    pub u128, rx_mcs, set_rx_mcs: 76, 0;
    // in Mbps
    pub u16, rx_highest_rate, set_rx_highest_rate: 89, 80;
    pub tx_set_defined, set_tx_set_defined: 96;
    pub tx_rx_diff, set_tx_rx_diff: 97;
    // Off-by-one: 0 means one spatial stream.
    pub u8, tx_max_ss, set_tx_max_ss: 99, 98;
    // Transmit Unequal Modulation.
    pub tx_ueqm, set_tx_ueqm: 100;
}

impl SupportedMcsSet {
    pub fn supports_mcs(&self, mcs_index: u8) -> bool {
        mcs_index <= 76 && (self.rx_mcs() & (1 << mcs_index)) != 0
    }
}

bitfield! {
    // IEEE Std 802.11-2016, 9.4.2.56.5
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Default)]
    pub struct HtExtCapabilities(u16);
    impl Debug;
    bool;
    pub pco, set_pco: 0;
    pub u8, pco_transition, set_pco_transition: 2, 1;
    pub u8, mcs_feedback, set_mcs_feedback: 9, 8;
    pub htc_ht_support, set_htc_ht_support: 10;
    pub rd_responder, set_rd_responder: 11;
}

// IEEE Std 802.11-2016, 9.4.2.56.6
// The individual transmit beamforming subfields are not interpreted here.
#[repr(C)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Debug, Default)]
pub struct TxBfCapability(pub u32);

// IEEE Std 802.11-2016, 9.4.2.56.7
#[repr(C)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Debug, Default)]
pub struct AselCapability(pub u8);

// IEEE Std 802.11-2016, 9.4.2.57
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct HtOperation {
    pub primary_chan: u8, // Primary 20 MHz channel.
    // HT Operation Information is 40-bit field so it has to be split
    pub ht_op_info_head: HtOpInfoHead,     // u8
    pub ht_op_info_tail: HtOpInfoTail,     // u32
    pub basic_ht_mcs_set: SupportedMcsSet, // u128
}

impl HtOperation {
    pub fn ht_op_info_head(&self) -> HtOpInfoHead {
        self.ht_op_info_head
    }
}

subfield_newtype!(SecChanOffset);
impl SecChanOffset {
    pub_const!(SECONDARY_NONE, 0); // No secondary channel
    pub_const!(SECONDARY_ABOVE, 1); // Secondary channel is above the primary channel
    // 2 reserved
    pub_const!(SECONDARY_BELOW, 3); // Secondary channel is below the primary channel
}

subfield_newtype!(StaChanWidth);
impl StaChanWidth {
    pub_const!(TWENTY_MHZ, 0);
    pub_const!(ANY, 1); // Any in the Supported Channel Width set
}

bitfield! {
    // IEEE Std 802.11-2016, Figure 9-339
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Default)]
    pub struct HtOpInfoHead(u8);
    impl Debug;
    bool;
    pub u8, from into SecChanOffset, secondary_chan_offset, set_secondary_chan_offset: 1, 0;
    pub u8, from into StaChanWidth, sta_chan_width, set_sta_chan_width: 2, 2;
    pub rifs_mode_permitted, set_rifs_mode_permitted: 3;
}

// IEEE Std 802.11-2016, Figure 9-339, continued. Bit offsets start from bit 8 of the HT
// Operation Information field.
#[repr(C)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Debug, Default)]
pub struct HtOpInfoTail(pub u32);

// IEEE Std 802.11-2016, 9.4.2.158
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct VhtCapabilities {
    pub vht_cap_info: VhtCapabilitiesInfo, // u32
    pub vht_mcs_nss: VhtMcsNssSet,         // u64
}

subfield_newtype!(MaxMpduLen);
impl MaxMpduLen {
    pub_const!(OCTECTS_3895, 0);
    pub_const!(OCTECTS_7991, 1);
    pub_const!(OCTECTS_11454, 2);
    // 3 reserved
}

bitfield! {
    // IEEE Std 802.11-2016, 9.4.2.158.2
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Default)]
    pub struct VhtCapabilitiesInfo(u32);
    impl Debug;
    bool;
    pub u8, from into MaxMpduLen, max_mpdu_len, set_max_mpdu_len: 1, 0;
    pub u8, supported_cbw_set, set_supported_cbw_set: 3, 2;
    pub rx_ldpc, set_rx_ldpc: 4;
    pub sgi_cbw80, set_sgi_cbw80: 5;
    pub sgi_cbw160, set_sgi_cbw160: 6;
    pub tx_stbc, set_tx_stbc: 7;
    pub u8, rx_stbc, set_rx_stbc: 10, 8;
    pub su_bfer, set_su_bfer: 11;
    pub su_bfee, set_su_bfee: 12;
    pub u8, bfee_sts, set_bfee_sts: 15, 13;
    pub u8, num_sounding, set_num_sounding: 18, 16;
    pub mu_bfer, set_mu_bfer: 19;
    pub mu_bfee, set_mu_bfee: 20;
    pub txop_ps, set_txop_ps: 21;
    pub htc_vht, set_htc_vht: 22;
    pub u8, max_ampdu_exponent, set_max_ampdu_exponent: 25, 23;
    pub u8, link_adapt, set_link_adapt: 27, 26;
    pub rx_ant_pattern, set_rx_ant_pattern: 28;
    pub tx_ant_pattern, set_tx_ant_pattern: 29;
    pub u8, ext_nss_bw, set_ext_nss_bw: 31, 30;
}

bitfield! {
    // IEEE Std 802.11-2016, 9.4.2.158.3
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Default)]
    pub struct VhtMcsNssSet(u64);
    impl Debug;
    bool;
    pub u16, from into VhtMcsNssMap, rx_max_mcs, set_rx_max_mcs: 15, 0;
    pub u16, rx_max_data_rate, set_rx_max_data_rate: 28, 16;
    pub u8, max_nsts, set_max_nsts: 31, 29;
    pub u16, from into VhtMcsNssMap, tx_max_mcs, set_tx_max_mcs: 47, 32;
    pub u16, tx_max_data_rate, set_tx_max_data_rate: 60, 48;
    pub ext_nss_bw, set_ext_nss_bw: 61;
}

subfield_newtype!(VhtMcsSet);
impl VhtMcsSet {
    pub_const!(UP_TO_7, 0);
    pub_const!(UP_TO_8, 1);
    pub_const!(UP_TO_9, 2);
    pub_const!(NONE, 3);
}

bitfield! {
    // IEEE Std 802.11-2016, Figure 9-562: two bits per spatial stream, streams 1 to 8.
    #[repr(C)]
    #[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Clone, Copy, Default)]
    pub struct VhtMcsNssMap(u16);
    impl Debug;
    u8;
    pub u8, from into VhtMcsSet, ss, set_ss: 1, 0, 8;
}

impl From<u16> for VhtMcsNssMap {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<VhtMcsNssMap> for u16 {
    fn from(map: VhtMcsNssMap) -> u16 {
        map.0
    }
}

// IEEE Std 802.11-2016, 9.4.2.159
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct VhtOperation {
    pub vht_cbw: u8,
    pub center_freq_seg0: u8, // Channel index
    pub center_freq_seg1: u8, // Channel index
    pub basic_mcs_nss: VhtMcsNssMap, // u16
}

impl VhtOperation {
    pub const CBW_20_40: u8 = 0;
    pub const CBW_80_160_80P80: u8 = 1;
}
