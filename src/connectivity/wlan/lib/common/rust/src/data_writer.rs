// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    big_endian::BigEndianU16,
    mac::{self, Bssid, FixedDataHdrFields, FrameControl, MacAddr, SequenceControl},
};

pub fn data_hdr_client_to_ap(
    mut frame_ctrl: FrameControl,
    bssid: Bssid,
    client_addr: MacAddr,
    seq_ctrl: SequenceControl,
) -> FixedDataHdrFields {
    frame_ctrl.set_frame_type(mac::FRAME_TYPE_DATA);
    frame_ctrl.set_to_ds(true);
    frame_ctrl.set_from_ds(false);
    FixedDataHdrFields {
        frame_ctrl,
        duration: 0,
        addr1: bssid.0,
        addr2: client_addr,
        addr3: bssid.0,
        seq_ctrl,
    }
}

/// Header for a frame relayed by the AP: `src_addr` is the original sender, which is the AP
/// itself for frames it originates.
pub fn data_hdr_ap_to_client(
    mut frame_ctrl: FrameControl,
    dst_addr: MacAddr,
    bssid: Bssid,
    src_addr: MacAddr,
    seq_ctrl: SequenceControl,
) -> FixedDataHdrFields {
    frame_ctrl.set_frame_type(mac::FRAME_TYPE_DATA);
    frame_ctrl.set_to_ds(false);
    frame_ctrl.set_from_ds(true);
    FixedDataHdrFields {
        frame_ctrl,
        duration: 0,
        addr1: dst_addr,
        addr2: bssid.0,
        addr3: src_addr,
        seq_ctrl,
    }
}

pub fn make_snap_llc_hdr(protocol_id: u16) -> mac::LlcHdr {
    mac::LlcHdr {
        dsap: mac::LLC_SNAP_EXTENSION,
        ssap: mac::LLC_SNAP_EXTENSION,
        control: mac::LLC_SNAP_UNNUMBERED_INFO,
        oui: mac::LLC_SNAP_OUI,
        protocol_id: BigEndianU16::from_native(protocol_id),
    }
}
