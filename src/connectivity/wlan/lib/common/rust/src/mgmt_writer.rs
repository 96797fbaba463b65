// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::mac::{Bssid, FrameControl, MacAddr, MgmtHdr, SequenceControl, FRAME_TYPE_MGMT};

fn mgmt_frame_ctrl(subtype: u16) -> FrameControl {
    let mut frame_ctrl = FrameControl(0);
    frame_ctrl.set_frame_type(FRAME_TYPE_MGMT);
    frame_ctrl.set_frame_subtype(subtype);
    frame_ctrl
}

/// Header for a management frame sent by a client to its AP.
pub fn mgmt_hdr_to_ap(
    subtype: u16,
    bssid: Bssid,
    client_addr: MacAddr,
    seq_ctrl: SequenceControl,
) -> MgmtHdr {
    MgmtHdr {
        frame_ctrl: mgmt_frame_ctrl(subtype),
        duration: 0,
        addr1: bssid.0,
        addr2: client_addr,
        addr3: bssid.0,
        seq_ctrl,
    }
}

/// Header for a management frame sent by an AP to one of its clients.
pub fn mgmt_hdr_from_ap(
    subtype: u16,
    client_addr: MacAddr,
    bssid: Bssid,
    seq_ctrl: SequenceControl,
) -> MgmtHdr {
    MgmtHdr {
        frame_ctrl: mgmt_frame_ctrl(subtype),
        duration: 0,
        addr1: client_addr,
        addr2: bssid.0,
        addr3: bssid.0,
        seq_ctrl,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::mac::MGMT_SUBTYPE_AUTH, zerocopy::AsBytes};

    #[test]
    fn to_ap() {
        let hdr = mgmt_hdr_to_ap(MGMT_SUBTYPE_AUTH, Bssid([1; 6]), [2; 6], SequenceControl(0x10));
        #[rustfmt::skip]
        let expected: &[u8] = &[
            0b1011_0000, 0, // frame control
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            1, 1, 1, 1, 1, 1, // addr3
            0x10, 0, // sequence control
        ];
        assert_eq!(hdr.as_bytes(), expected);
    }

    #[test]
    fn from_ap() {
        let hdr = mgmt_hdr_from_ap(MGMT_SUBTYPE_AUTH, [2; 6], Bssid([1; 6]), SequenceControl(0));
        assert_eq!(hdr.frame_ctrl().frame_subtype(), MGMT_SUBTYPE_AUTH);
        assert_eq!({ hdr.addr1 }, [2; 6]);
        assert_eq!({ hdr.addr2 }, [1; 6]);
        assert_eq!({ hdr.addr3 }, [1; 6]);
    }
}
