// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Builders for the complete frames the MLME transmits.

use {
    crate::error::Error,
    wlan_common::{
        appendable::Appendable,
        big_endian::BigEndianU16,
        data_writer,
        ie::{self, HtCapabilities, HtOperation, SupportedRate, VhtCapabilities, VhtOperation},
        mac::{
            AssocReqHdr, AssocRespHdr, AuthAlgorithmNumber, AuthHdr, CapabilityInfo, DeauthHdr,
            DisassocHdr, EthernetIIHdr, FixedDataHdrFields, MacAddr, MgmtHdr, ReasonCode,
            SequenceControl, StatusCode, DATA_SUBTYPE_NULL_DATA,
        },
    },
};

pub fn seq_ctrl(seq_num: u32) -> SequenceControl {
    let mut seq_ctrl = SequenceControl(0);
    seq_ctrl.set_seq_num(seq_num as u16);
    seq_ctrl
}

pub fn write_auth_frame(
    mgmt_hdr: MgmtHdr,
    auth_alg_num: AuthAlgorithmNumber,
    auth_txn_seq_num: u16,
    status_code: StatusCode,
) -> Result<Vec<u8>, Error> {
    let mut buf = vec![];
    buf.append_value(&mgmt_hdr)?;
    buf.append_value(&AuthHdr { auth_alg_num, auth_txn_seq_num, status_code })?;
    Ok(buf)
}

pub fn write_deauth_frame(mgmt_hdr: MgmtHdr, reason_code: ReasonCode) -> Result<Vec<u8>, Error> {
    let mut buf = vec![];
    buf.append_value(&mgmt_hdr)?;
    buf.append_value(&DeauthHdr { reason_code })?;
    Ok(buf)
}

pub fn write_disassoc_frame(
    mgmt_hdr: MgmtHdr,
    reason_code: ReasonCode,
) -> Result<Vec<u8>, Error> {
    let mut buf = vec![];
    buf.append_value(&mgmt_hdr)?;
    buf.append_value(&DisassocHdr { reason_code })?;
    Ok(buf)
}

pub struct AssocReqFields<'a> {
    pub capabilities: CapabilityInfo,
    pub listen_interval: u16,
    pub ssid: &'a [u8],
    pub rates: &'a [SupportedRate],
    pub ht_cap: Option<HtCapabilities>,
    pub vht_cap: Option<VhtCapabilities>,
    pub rsne: Option<&'a [u8]>,
}

pub fn write_assoc_req_frame(
    mgmt_hdr: MgmtHdr,
    fields: AssocReqFields<'_>,
) -> Result<Vec<u8>, Error> {
    let mut buf = vec![];
    buf.append_value(&mgmt_hdr)?;
    buf.append_value(&AssocReqHdr {
        capabilities: fields.capabilities,
        listen_interval: fields.listen_interval,
    })?;
    ie::write_ssid(&mut buf, fields.ssid)?;
    ie::write_rates(&mut buf, fields.rates)?;
    if let Some(rsne) = fields.rsne {
        ie::write_rsne(&mut buf, rsne)?;
    }
    if let Some(ht_cap) = fields.ht_cap.as_ref() {
        ie::write_ht_capabilities(&mut buf, ht_cap)?;
    }
    if let Some(vht_cap) = fields.vht_cap.as_ref() {
        ie::write_vht_capabilities(&mut buf, vht_cap)?;
    }
    Ok(buf)
}

pub struct AssocRespFields<'a> {
    pub capabilities: CapabilityInfo,
    pub status_code: StatusCode,
    pub aid: u16,
    pub rates: &'a [SupportedRate],
    pub ht_cap: Option<HtCapabilities>,
    pub ht_op: Option<HtOperation>,
    pub vht_cap: Option<VhtCapabilities>,
    pub vht_op: Option<VhtOperation>,
}

impl<'a> AssocRespFields<'a> {
    /// A response carrying nothing but the refusal status.
    pub fn refusal(capabilities: CapabilityInfo, status_code: StatusCode) -> Self {
        Self {
            capabilities,
            status_code,
            aid: 0,
            rates: &[],
            ht_cap: None,
            ht_op: None,
            vht_cap: None,
            vht_op: None,
        }
    }
}

pub fn write_assoc_resp_frame(
    mgmt_hdr: MgmtHdr,
    fields: AssocRespFields<'_>,
) -> Result<Vec<u8>, Error> {
    let mut buf = vec![];
    buf.append_value(&mgmt_hdr)?;
    // The two most significant bits of the AID are set on the wire.
    let aid = if fields.aid == 0 { 0 } else { fields.aid | 0xC000 };
    buf.append_value(&AssocRespHdr {
        capabilities: fields.capabilities,
        status_code: fields.status_code,
        aid,
    })?;
    if !fields.rates.is_empty() {
        ie::write_rates(&mut buf, fields.rates)?;
    }
    if let Some(ht_cap) = fields.ht_cap.as_ref() {
        ie::write_ht_capabilities(&mut buf, ht_cap)?;
    }
    if let Some(ht_op) = fields.ht_op.as_ref() {
        ie::write_ht_operation(&mut buf, ht_op)?;
    }
    if let Some(vht_cap) = fields.vht_cap.as_ref() {
        ie::write_vht_capabilities(&mut buf, vht_cap)?;
    }
    if let Some(vht_op) = fields.vht_op.as_ref() {
        ie::write_vht_operation(&mut buf, vht_op)?;
    }
    Ok(buf)
}

/// A data frame carrying `payload` behind an LLC/SNAP header announcing `ether_type`.
pub fn write_data_frame(
    data_hdr: FixedDataHdrFields,
    ether_type: u16,
    payload: &[u8],
) -> Result<Vec<u8>, Error> {
    let mut buf = vec![];
    buf.append_value(&data_hdr)?;
    buf.append_value(&data_writer::make_snap_llc_hdr(ether_type))?;
    buf.append_bytes(payload)?;
    Ok(buf)
}

pub fn write_null_data_frame(mut data_hdr: FixedDataHdrFields) -> Result<Vec<u8>, Error> {
    let mut frame_ctrl = data_hdr.frame_ctrl();
    frame_ctrl.set_frame_subtype(DATA_SUBTYPE_NULL_DATA);
    data_hdr.frame_ctrl = frame_ctrl;
    let mut buf = vec![];
    buf.append_value(&data_hdr)?;
    Ok(buf)
}

/// An Ethernet II frame as handed to the network stack.
pub fn write_eth_frame(
    dst_addr: MacAddr,
    src_addr: MacAddr,
    ether_type: u16,
    payload: &[u8],
) -> Result<Vec<u8>, Error> {
    let mut buf = vec![];
    buf.append_value(&EthernetIIHdr {
        da: dst_addr,
        sa: src_addr,
        ether_type: BigEndianU16::from_native(ether_type),
    })?;
    buf.append_bytes(payload)?;
    Ok(buf)
}

#[cfg(test)]
pub mod test_utils {
    use {
        super::*,
        wlan_common::{
            mac::{BeaconHdr, Bssid, BCAST_ADDR, MGMT_SUBTYPE_BEACON},
            mgmt_writer,
        },
    };

    pub fn write_beacon_frame(
        bssid: Bssid,
        beacon_interval: u16,
        ssid: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let hdr =
            mgmt_writer::mgmt_hdr_from_ap(MGMT_SUBTYPE_BEACON, BCAST_ADDR, bssid, seq_ctrl(0));
        let mut capabilities = CapabilityInfo(0);
        capabilities.set_ess(true);
        let mut buf = vec![];
        buf.append_value(&hdr)?;
        buf.append_value(&BeaconHdr { timestamp: 0, beacon_interval, capabilities })?;
        ie::write_ssid(&mut buf, ssid)?;
        Ok(buf)
    }
}
