// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod reason;
mod status;

pub use {reason::*, status::*};

use {
    crate::mac::{FrameControl, MacAddr, SequenceControl},
    bitfield::bitfield,
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

// IEEE Std 802.11-2016, 9.2.4.1.3, Table 9-1
pub const MGMT_SUBTYPE_ASSOC_REQ: u16 = 0x00;
pub const MGMT_SUBTYPE_ASSOC_RESP: u16 = 0x01;
pub const MGMT_SUBTYPE_REASSOC_REQ: u16 = 0x02;
pub const MGMT_SUBTYPE_REASSOC_RESP: u16 = 0x03;
pub const MGMT_SUBTYPE_PROBE_REQ: u16 = 0x04;
pub const MGMT_SUBTYPE_PROBE_RESP: u16 = 0x05;
pub const MGMT_SUBTYPE_BEACON: u16 = 0x08;
pub const MGMT_SUBTYPE_DISASSOC: u16 = 0x0A;
pub const MGMT_SUBTYPE_AUTH: u16 = 0x0B;
pub const MGMT_SUBTYPE_DEAUTH: u16 = 0x0C;
pub const MGMT_SUBTYPE_ACTION: u16 = 0x0D;

bitfield! {
    /// IEEE Std 802.11-2016, 9.4.1.4
    #[derive(AsBytes, FromBytes, PartialEq, Eq, Clone, Copy, Default, Hash)]
    #[repr(C)]
    pub struct CapabilityInfo(u16);
    impl Debug;
    bool;
    pub ess, set_ess: 0;
    pub ibss, set_ibss: 1;
    pub cf_pollable, set_cf_pollable: 2;
    pub cf_poll_req, set_cf_poll_req: 3;
    pub privacy, set_privacy: 4;
    pub short_preamble, set_short_preamble: 5;
    // 6..=7 reserved
    pub spectrum_mgmt, set_spectrum_mgmt: 8;
    pub qos, set_qos: 9;
    pub short_slot_time, set_short_slot_time: 10;
    pub apsd, set_apsd: 11;
    pub radio_measurement, set_radio_measurement: 12;
    // 13 reserved
    pub delayed_block_ack, set_delayed_block_ack: 14;
    pub immediate_block_ack, set_immediate_block_ack: 15;
}

impl CapabilityInfo {
    pub fn raw(&self) -> u16 {
        self.0
    }
}

// IEEE Std 802.11-2016, 9.4.1.1
#[repr(C)]
#[derive(AsBytes, FromBytes, PartialEq, Eq, Copy, Clone, Debug, Default)]
pub struct AuthAlgorithmNumber(pub u16);

impl AuthAlgorithmNumber {
    pub const OPEN: Self = Self(0);
    pub const SHARED_KEY: Self = Self(1);
    pub const FAST_BSS_TRANSITION: Self = Self(2);
    pub const SAE: Self = Self(3);
    // 4-65534 Reserved
    pub const VENDOR_SPECIFIC: Self = Self(65535);
}

// IEEE Std 802.11-2016, 9.3.3.2
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct MgmtHdr {
    pub frame_ctrl: FrameControl,
    pub duration: u16,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: SequenceControl,
}

impl MgmtHdr {
    pub fn frame_ctrl(&self) -> FrameControl {
        self.frame_ctrl
    }

    pub fn seq_ctrl(&self) -> SequenceControl {
        self.seq_ctrl
    }
}

// IEEE Std 802.11-2016, 9.3.3.3
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct BeaconHdr {
    pub timestamp: u64,
    pub beacon_interval: u16,
    // IEEE Std 802.11-2016, 9.4.1.4
    pub capabilities: CapabilityInfo,
}

impl BeaconHdr {
    pub fn beacon_interval(&self) -> u16 {
        self.beacon_interval
    }

    pub fn capabilities(&self) -> CapabilityInfo {
        self.capabilities
    }
}

// IEEE Std 802.11-2016, 9.3.3.12
#[derive(Default, FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AuthHdr {
    pub auth_alg_num: AuthAlgorithmNumber,
    pub auth_txn_seq_num: u16,
    pub status_code: StatusCode,
}

impl AuthHdr {
    pub fn auth_alg_num(&self) -> AuthAlgorithmNumber {
        self.auth_alg_num
    }

    pub fn auth_txn_seq_num(&self) -> u16 {
        self.auth_txn_seq_num
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }
}

// IEEE Std 802.11-2016, 9.3.3.13
#[derive(Default, FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct DeauthHdr {
    pub reason_code: ReasonCode,
}

impl DeauthHdr {
    pub fn reason_code(&self) -> ReasonCode {
        self.reason_code
    }
}

// IEEE Std 802.11-2016, 9.3.3.5
#[derive(Default, FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct DisassocHdr {
    pub reason_code: ReasonCode,
}

impl DisassocHdr {
    pub fn reason_code(&self) -> ReasonCode {
        self.reason_code
    }
}

// IEEE Std 802.11-2016, 9.3.3.6
#[derive(Default, FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AssocReqHdr {
    // IEEE Std 802.11-2016, 9.4.1.4
    pub capabilities: CapabilityInfo,
    pub listen_interval: u16,
}

impl AssocReqHdr {
    pub fn capabilities(&self) -> CapabilityInfo {
        self.capabilities
    }

    pub fn listen_interval(&self) -> u16 {
        self.listen_interval
    }
}

// IEEE Std 802.11-2016, 9.3.3.7
#[derive(Default, FromBytes, AsBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AssocRespHdr {
    // IEEE Std 802.11-2016, 9.4.1.4
    pub capabilities: CapabilityInfo,
    pub status_code: StatusCode,
    pub aid: u16,
}

impl AssocRespHdr {
    pub fn capabilities(&self) -> CapabilityInfo {
        self.capabilities
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// The two most significant bits of the AID field are always set on the wire.
    pub fn aid(&self) -> u16 {
        self.aid & 0x3FFF
    }
}

#[derive(Debug)]
pub enum MgmtBody<B: ByteSlice> {
    Beacon { bcn_hdr: LayoutVerified<B, BeaconHdr>, elements: B },
    Authentication { auth_hdr: LayoutVerified<B, AuthHdr>, elements: B },
    AssociationReq { assoc_req_hdr: LayoutVerified<B, AssocReqHdr>, elements: B },
    AssociationResp { assoc_resp_hdr: LayoutVerified<B, AssocRespHdr>, elements: B },
    Deauthentication { deauth_hdr: LayoutVerified<B, DeauthHdr>, elements: B },
    Disassociation { disassoc_hdr: LayoutVerified<B, DisassocHdr>, elements: B },
    Unsupported { subtype: u16 },
}

impl<B: ByteSlice> MgmtBody<B> {
    /// Returns None if the body is too short for the fixed fields of its subtype.
    pub fn parse(subtype: u16, bytes: B) -> Option<Self> {
        match subtype {
            MGMT_SUBTYPE_BEACON => {
                let (bcn_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::Beacon { bcn_hdr, elements })
            }
            MGMT_SUBTYPE_AUTH => {
                let (auth_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::Authentication { auth_hdr, elements })
            }
            MGMT_SUBTYPE_ASSOC_REQ => {
                let (assoc_req_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::AssociationReq { assoc_req_hdr, elements })
            }
            MGMT_SUBTYPE_ASSOC_RESP => {
                let (assoc_resp_hdr, elements) =
                    LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::AssociationResp { assoc_resp_hdr, elements })
            }
            MGMT_SUBTYPE_DEAUTH => {
                let (deauth_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::Deauthentication { deauth_hdr, elements })
            }
            MGMT_SUBTYPE_DISASSOC => {
                let (disassoc_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::Disassociation { disassoc_hdr, elements })
            }
            subtype => Some(MgmtBody::Unsupported { subtype }),
        }
    }
}
