// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::big_endian::BigEndianU16,
    bitfield::bitfield,
    byteorder::{ByteOrder, LittleEndian},
    std::fmt,
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

pub mod eth;
pub mod mgmt;

pub use {eth::*, mgmt::*};

pub type MacAddr = [u8; 6];
pub const BCAST_ADDR: MacAddr = [0xFF; 6];

/// IEEE Std 802.11-2016, 9.2.4.3.2: the individual/group bit of an address.
pub fn is_group_addr(addr: &MacAddr) -> bool {
    addr[0] & 0x01 != 0
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Default)]
pub struct Bssid(pub MacAddr);

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x?}", self.0)
    }
}

// IEEE Std 802.11-2016, 9.2.4.1.3
// Frame types:
pub const FRAME_TYPE_MGMT: u16 = 0;
pub const FRAME_TYPE_CTRL: u16 = 1;
pub const FRAME_TYPE_DATA: u16 = 2;

// Data subtypes:
pub const DATA_SUBTYPE_DATA: u16 = 0x00;
pub const DATA_SUBTYPE_NULL_DATA: u16 = 0x04;
pub const DATA_SUBTYPE_QOS_DATA: u16 = 0x08;
pub const DATA_SUBTYPE_NULL_QOS_DATA: u16 = 0x0C;

// IEEE Std 802.11-2016, 9.2.4.1.3, Table 9-1
pub const BITMASK_NULL: u16 = 1 << 2;
pub const BITMASK_QOS: u16 = 1 << 3;

// RFC 1042
pub const LLC_SNAP_EXTENSION: u8 = 0xAA;
pub const LLC_SNAP_UNNUMBERED_INFO: u8 = 0x03;
pub const LLC_SNAP_OUI: [u8; 3] = [0, 0, 0];

bitfield! {
    /// IEEE Std 802.11-2016, 9.2.4.1.1
    #[derive(AsBytes, FromBytes, PartialEq, Eq, Clone, Copy, Default)]
    #[repr(C)]
    pub struct FrameControl(u16);
    impl Debug;
    bool;
    pub u16, protocol_version, set_protocol_version: 1, 0;
    pub u16, frame_type, set_frame_type: 3, 2;
    pub u16, frame_subtype, set_frame_subtype: 7, 4;
    pub to_ds, set_to_ds: 8;
    pub from_ds, set_from_ds: 9;
    pub more_fragments, set_more_fragments: 10;
    pub retry, set_retry: 11;
    pub power_mgmt, set_power_mgmt: 12;
    pub more_data, set_more_data: 13;
    pub protected, set_protected: 14;
    pub htc_order, set_htc_order: 15;
}

impl FrameControl {
    pub fn raw(&self) -> u16 {
        self.0
    }

    pub fn is_null_data(&self) -> bool {
        self.frame_type() == FRAME_TYPE_DATA && self.frame_subtype() & BITMASK_NULL != 0
    }

    pub fn is_qos(&self) -> bool {
        self.frame_subtype() & BITMASK_QOS != 0
    }
}

bitfield! {
    /// IEEE Std 802.11-2016, 9.2.4.4
    #[derive(AsBytes, FromBytes, PartialEq, Eq, Clone, Copy, Default)]
    #[repr(C)]
    pub struct SequenceControl(u16);
    impl Debug;
    u16;
    pub u16, frag_num, set_frag_num: 3, 0;
    pub u16, seq_num, set_seq_num: 15, 4;
}

bitfield! {
    /// IEEE Std 802.11-2016, 9.2.4.5.1, Table 9-6
    #[derive(AsBytes, FromBytes, PartialEq, Eq, Clone, Copy, Default)]
    #[repr(C)]
    pub struct QosControl(u16);
    impl Debug;
    bool;
    pub u8, tid, set_tid: 3, 0;
    pub eosp, set_eosp: 4;
    pub u8, ack_policy, set_ack_policy: 6, 5;
    pub amsdu_present, set_amsdu_present: 7;
    // interpretation varies
    pub u8, high_byte, set_high_byte: 15, 8;
}

// IEEE Std 802.11-2016, 9.2.4.6
#[derive(AsBytes, FromBytes, PartialEq, Eq, Clone, Copy, Debug, Default)]
#[repr(C)]
pub struct HtControl(pub u32);

// IEEE Std 802.11-2016, 9.3.2.1
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct FixedDataHdrFields {
    pub frame_ctrl: FrameControl,
    pub duration: u16,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: SequenceControl,
}

impl FixedDataHdrFields {
    pub fn frame_ctrl(&self) -> FrameControl {
        self.frame_ctrl
    }

    pub fn seq_ctrl(&self) -> SequenceControl {
        self.seq_ctrl
    }
}

// IEEE Std 802.11-2016, Table 9-26 defines DA, SA, RA, TA, BSSID
pub fn data_dst_addr(hdr: &FixedDataHdrFields) -> MacAddr {
    let fc = hdr.frame_ctrl();
    if fc.to_ds() {
        hdr.addr3
    } else {
        hdr.addr1
    }
}

pub fn data_src_addr(hdr: &FixedDataHdrFields, addr4: Option<MacAddr>) -> Option<MacAddr> {
    let fc = hdr.frame_ctrl();
    match (fc.to_ds(), fc.from_ds()) {
        (_, false) => Some(hdr.addr2),
        (false, true) => Some(hdr.addr3),
        (true, true) => addr4,
    }
}

pub fn data_transmitter_addr(hdr: &FixedDataHdrFields) -> MacAddr {
    hdr.addr2
}

pub fn data_receiver_addr(hdr: &FixedDataHdrFields) -> MacAddr {
    hdr.addr1
}

/// BSSID: basic service set ID
pub fn data_bssid(hdr: &FixedDataHdrFields) -> Option<MacAddr> {
    let fc = hdr.frame_ctrl();
    match (fc.to_ds(), fc.from_ds()) {
        (false, false) => Some(hdr.addr3),
        (false, true) => Some(hdr.addr2),
        (true, false) => Some(hdr.addr1),
        (true, true) => None,
    }
}

// RFC 1042
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, packed)]
pub struct LlcHdr {
    pub dsap: u8,
    pub ssap: u8,
    pub control: u8,
    pub oui: [u8; 3],
    pub protocol_id: BigEndianU16,
}

impl LlcHdr {
    pub fn protocol_id(&self) -> u16 {
        self.protocol_id.to_native()
    }
}

#[derive(Debug)]
pub struct LlcFrame<B: ByteSlice> {
    pub hdr: LayoutVerified<B, LlcHdr>,
    pub body: B,
}

impl<B: ByteSlice> LlcFrame<B> {
    pub fn parse(bytes: B) -> Option<Self> {
        let (hdr, body) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
        Some(Self { hdr, body })
    }
}

/// A typed, validated view of a received MAC frame. Parsing never yields a partially valid
/// frame: a buffer too short for any header field present according to the frame control
/// field is rejected as a whole.
#[derive(Debug)]
pub enum MacFrame<B: ByteSlice> {
    Mgmt {
        // Management Header: fixed fields
        mgmt_hdr: LayoutVerified<B, MgmtHdr>,
        // Management Header: optional fields
        ht_ctrl: Option<HtControl>,
        // Body
        body: B,
    },
    Data {
        // Data Header: fixed fields
        fixed_fields: LayoutVerified<B, FixedDataHdrFields>,
        // Data Header: optional fields
        addr4: Option<MacAddr>,
        qos_ctrl: Option<QosControl>,
        ht_ctrl: Option<HtControl>,
        // Body
        body: B,
    },
    Unsupported {
        frame_ctrl: FrameControl,
    },
}

impl<B: ByteSlice> MacFrame<B> {
    pub fn parse(bytes: B) -> Option<MacFrame<B>> {
        let fc = FrameControl(LittleEndian::read_u16(bytes.get(0..2)?));
        match fc.frame_type() {
            FRAME_TYPE_MGMT => {
                let (mgmt_hdr, rest) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                let (ht_ctrl, body) = if fc.htc_order() {
                    let (ht_ctrl, rest) = read_u32(rest)?;
                    (Some(HtControl(ht_ctrl)), rest)
                } else {
                    (None, rest)
                };
                Some(MacFrame::Mgmt { mgmt_hdr, ht_ctrl, body })
            }
            FRAME_TYPE_DATA => {
                let (fixed_fields, rest) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                let (addr4, rest) = if fc.to_ds() && fc.from_ds() {
                    let (addr4, rest) =
                        LayoutVerified::<B, MacAddr>::new_unaligned_from_prefix(rest)?;
                    (Some(*addr4), rest)
                } else {
                    (None, rest)
                };
                let (qos_ctrl, rest) = if fc.is_qos() {
                    let (qos_ctrl, rest) = read_u16(rest)?;
                    (Some(QosControl(qos_ctrl)), rest)
                } else {
                    (None, rest)
                };
                let (ht_ctrl, body) = if fc.htc_order() {
                    let (ht_ctrl, rest) = read_u32(rest)?;
                    (Some(HtControl(ht_ctrl)), rest)
                } else {
                    (None, rest)
                };
                Some(MacFrame::Data { fixed_fields, addr4, qos_ctrl, ht_ctrl, body })
            }
            _ => Some(MacFrame::Unsupported { frame_ctrl: fc }),
        }
    }
}

fn read_u16<B: ByteSlice>(bytes: B) -> Option<(u16, B)> {
    let (value, rest) = LayoutVerified::<B, [u8; 2]>::new_unaligned_from_prefix(bytes)?;
    Some((LittleEndian::read_u16(&value[..]), rest))
}

fn read_u32<B: ByteSlice>(bytes: B) -> Option<(u32, B)> {
    let (value, rest) = LayoutVerified::<B, [u8; 4]>::new_unaligned_from_prefix(bytes)?;
    Some((LittleEndian::read_u32(&value[..]), rest))
}

#[cfg(test)]
mod tests {
    use {super::*, crate::assert_variant};

    #[test]
    fn group_addresses() {
        assert!(is_group_addr(&BCAST_ADDR));
        assert!(is_group_addr(&[0x01, 0x00, 0x5E, 0, 0, 1]));
        assert!(is_group_addr(&[0x33, 0x33, 0, 0, 0, 1]));
        assert!(!is_group_addr(&[0x02, 1, 1, 1, 1, 1]));
        assert!(!is_group_addr(&[0x00, 0x1B, 0x63, 0, 0, 1]));
    }

    #[rustfmt::skip]
    fn qos_data_frame() -> Vec<u8> {
        vec![
            // Data Header
            0b1000_10_00, 0b000000_1_0, // fc: qos data, from_ds
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x10, 0, // sequence control
            0x06, 0, // qos control
            // LLC
            0xAA, 0xAA, 0x03, 0, 0, 0, 0x08, 0x00,
            // payload
            7, 7, 7,
        ]
    }

    #[test]
    fn parse_qos_data_frame() {
        let bytes = qos_data_frame();
        assert_variant!(
            MacFrame::parse(&bytes[..]),
            Some(MacFrame::Data { fixed_fields, addr4, qos_ctrl, ht_ctrl, body }) => {
                assert_eq!(fixed_fields.frame_ctrl().frame_type(), FRAME_TYPE_DATA);
                assert_eq!(fixed_fields.seq_ctrl().seq_num(), 1);
                assert_eq!(addr4, None);
                assert_eq!(qos_ctrl.map(|q| q.tid()), Some(6));
                assert_eq!(ht_ctrl, None);
                assert_eq!(data_src_addr(&fixed_fields, addr4), Some([3; 6]));
                assert_eq!(data_dst_addr(&fixed_fields), [1; 6]);
                assert_eq!(data_bssid(&fixed_fields), Some([2; 6]));
                let llc = LlcFrame::parse(body).expect("LLC header too short");
                assert_eq!(llc.hdr.protocol_id(), 0x0800);
                assert_eq!(llc.body, &[7, 7, 7][..]);
            }
        );
    }

    #[test]
    fn parse_truncated_qos_data_frame() {
        let bytes = qos_data_frame();
        // Cut the frame in the middle of the QoS control field.
        assert!(MacFrame::parse(&bytes[..25]).is_none());
        assert!(MacFrame::parse(&bytes[..1]).is_none());
    }

    #[test]
    fn parse_mgmt_frame_with_ht_control() {
        #[rustfmt::skip]
        let bytes = vec![
            0b1011_00_00, 0b1000_0000, // fc: auth, htc_order
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x10, 0, // sequence control
            0xaa, 0xbb, 0xcc, 0xdd, // ht control
            9, 9, // body
        ];
        assert_variant!(
            MacFrame::parse(&bytes[..]),
            Some(MacFrame::Mgmt { mgmt_hdr, ht_ctrl, body }) => {
                assert_eq!(mgmt_hdr.frame_ctrl().frame_subtype(), MGMT_SUBTYPE_AUTH);
                assert_eq!({ mgmt_hdr.addr2 }, [2; 6]);
                assert_eq!(ht_ctrl, Some(HtControl(0xddccbbaa)));
                assert_eq!(body, &[9, 9][..]);
            }
        );
    }

    #[test]
    fn parse_ctrl_frame_is_unsupported() {
        let bytes = [0b1011_01_00, 0, 0, 0];
        assert_variant!(
            MacFrame::parse(&bytes[..]),
            Some(MacFrame::Unsupported { frame_ctrl }) => {
                assert_eq!(frame_ctrl.frame_type(), FRAME_TYPE_CTRL);
            }
        );
    }

    #[test]
    fn null_data_frame_control() {
        let mut fc = FrameControl(0);
        fc.set_frame_type(FRAME_TYPE_DATA);
        fc.set_frame_subtype(DATA_SUBTYPE_NULL_DATA);
        fc.set_power_mgmt(true);
        assert!(fc.is_null_data());
        assert!(!fc.is_qos());
        assert_eq!(fc.raw(), 0b0001_0000_0100_1000);
    }
}
