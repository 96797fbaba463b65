// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Negotiation of the association context between the local station and its peer.
//!
//! Both roles feed the capabilities advertised in Association Request/Response elements
//! through the same negotiator. The negotiated context never advertises anything either side
//! lacks: HT is kept only if both sides support HT and VHT only if both support HT and VHT.

use {
    crate::error::Error,
    anyhow::format_err,
    wlan_common::{
        channel::Channel,
        ie::{
            self,
            intersect::{
                intersect_ht_capabilities, intersect_rates, intersect_vht_capabilities, ApRates,
                ClientRates,
            },
            ChanWidthSet, HtCapabilities, HtOperation, Id, SupportedRate, VhtCapabilities,
            VhtOperation,
        },
        mac::{CapabilityInfo, MacAddr},
    },
};

/// Capabilities a station advertises about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct StaCapabilities {
    pub capability_info: CapabilityInfo,
    pub rates: Vec<SupportedRate>,
    pub ht_cap: Option<HtCapabilities>,
    pub vht_cap: Option<VhtCapabilities>,
}

/// The elements of an Association Request or Response the MLME cares about.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssocElements {
    pub ssid: Option<Vec<u8>>,
    pub rates: Vec<SupportedRate>,
    pub ht_cap: Option<HtCapabilities>,
    pub ht_op: Option<HtOperation>,
    pub vht_cap: Option<VhtCapabilities>,
    pub vht_op: Option<VhtOperation>,
    /// The complete element, header included.
    pub rsne: Option<Vec<u8>>,
}

impl AssocElements {
    pub fn into_capabilities(self, capability_info: CapabilityInfo) -> StaCapabilities {
        StaCapabilities {
            capability_info,
            rates: self.rates,
            ht_cap: self.ht_cap,
            vht_cap: self.vht_cap,
        }
    }
}

/// Parses an element chain. Unknown elements are skipped; any known element with an invalid
/// length, or a chain that does not end on an element boundary, fails the whole parse. Only the
/// first occurrence of each element is kept.
pub fn parse_assoc_elements(bytes: &[u8]) -> Result<AssocElements, Error> {
    let mut out = AssocElements::default();
    let mut seen_rates = false;
    for (id, body) in ie::read_all(bytes)? {
        match id {
            Id::SSID if out.ssid.is_none() => out.ssid = Some(ie::parse_ssid(body)?.to_vec()),
            Id::SUPPORTED_RATES if !seen_rates => {
                seen_rates = true;
                let rates = ie::parse_supported_rates(body)?;
                // Extended rates may precede the basic element in malformed but tolerated
                // frames; keep the basic element's rates first.
                let mut all = rates.to_vec();
                all.extend_from_slice(&out.rates[..]);
                out.rates = all;
            }
            Id::EXT_SUPPORTED_RATES => {
                out.rates.extend_from_slice(&ie::parse_extended_supported_rates(body)?[..])
            }
            Id::HT_CAPABILITIES if out.ht_cap.is_none() => {
                out.ht_cap = Some(*ie::parse_ht_capabilities(body)?)
            }
            Id::HT_OPERATION if out.ht_op.is_none() => {
                out.ht_op = Some(*ie::parse_ht_operation(body)?)
            }
            Id::VHT_CAPABILITIES if out.vht_cap.is_none() => {
                out.vht_cap = Some(*ie::parse_vht_capabilities(body)?)
            }
            Id::VHT_OPERATION if out.vht_op.is_none() => {
                out.vht_op = Some(*ie::parse_vht_operation(body)?)
            }
            Id::RSNE if out.rsne.is_none() => {
                let mut rsne = Vec::with_capacity(body.len() + 2);
                rsne.push(Id::RSNE.0);
                rsne.push(body.len() as u8);
                rsne.extend_from_slice(body);
                out.rsne = Some(rsne);
            }
            _ => (),
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedCapabilities {
    pub capability_info: CapabilityInfo,
    pub rates: Vec<SupportedRate>,
    pub ht_cap: Option<HtCapabilities>,
    pub vht_cap: Option<VhtCapabilities>,
    pub is_cbw40_rx: bool,
    pub is_cbw40_tx: bool,
}

/// Intersects the capabilities of the AP and its client. The only way negotiation fails is a
/// rate mismatch: the client lacks one of the AP's basic rates or shares no rate at all.
pub fn negotiate(
    ap: &StaCapabilities,
    client: &StaCapabilities,
    channel: Channel,
) -> Result<NegotiatedCapabilities, Error> {
    let rates = intersect_rates(ApRates(ap.rates.clone()), ClientRates(client.rates.clone()))
        .map_err(|e| format_err!("rate negotiation failed: {}", e))?;

    let ht_cap = match (ap.ht_cap.as_ref(), client.ht_cap.as_ref()) {
        (Some(a), Some(c)) => Some(intersect_ht_capabilities(a, c)),
        _ => None,
    };
    let vht_cap = match (ht_cap, ap.vht_cap.as_ref(), client.vht_cap.as_ref()) {
        (Some(_), Some(a), Some(c)) => Some(intersect_vht_capabilities(a, c)),
        _ => None,
    };

    let is_cbw40_rx = match ht_cap {
        Some(ht_cap) => {
            let ht_cap_info = ht_cap.ht_cap_info;
            ht_cap_info.chan_width_set() == ChanWidthSet::TWENTY_FORTY
        }
        None => false,
    };
    let is_cbw40_tx = is_cbw40_rx && channel.has_secondary_channel();

    let mut capability_info =
        CapabilityInfo(ap.capability_info.raw() & client.capability_info.raw());
    capability_info.set_ess(ap.capability_info.ess());
    capability_info.set_privacy(ap.capability_info.privacy());

    Ok(NegotiatedCapabilities { capability_info, rates, ht_cap, vht_cap, is_cbw40_rx, is_cbw40_tx })
}

/// Everything the device needs to serve an association.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationContext {
    pub peer_addr: MacAddr,
    pub aid: u16,
    pub listen_interval: u16,
    pub channel: Channel,
    pub negotiated: NegotiatedCapabilities,
    pub ht_op: Option<HtOperation>,
    pub vht_op: Option<VhtOperation>,
}

impl AssociationContext {
    pub fn new(
        peer_addr: MacAddr,
        aid: u16,
        listen_interval: u16,
        channel: Channel,
        negotiated: NegotiatedCapabilities,
        ht_op: Option<HtOperation>,
        vht_op: Option<VhtOperation>,
    ) -> Self {
        // Operation elements are meaningless without the matching negotiated capabilities.
        let ht_op = ht_op.filter(|_| negotiated.ht_cap.is_some());
        let vht_op = vht_op.filter(|_| negotiated.vht_cap.is_some());
        Self { peer_addr, aid, listen_interval, channel, negotiated, ht_op, vht_op }
    }

    pub fn has_ht(&self) -> bool {
        self.negotiated.ht_cap.is_some()
    }

    pub fn has_vht(&self) -> bool {
        self.negotiated.vht_cap.is_some()
    }
}

#[cfg(test)]
pub mod test_utils {
    use {
        super::*,
        wlan_common::ie::{
            AmpduParams, AselCapability, HtCapabilityInfo, HtExtCapabilities, HtOpInfoHead,
            HtOpInfoTail, MaxAmsduLen, SupportedMcsSet, TxBfCapability, VhtCapabilitiesInfo,
            VhtMcsNssMap, VhtMcsNssSet,
        },
    };

    pub fn fake_rates() -> Vec<SupportedRate> {
        vec![
            SupportedRate(0x02).with_basic(true),
            SupportedRate(0x04).with_basic(true),
            SupportedRate(0x0b),
            SupportedRate(0x16),
            SupportedRate(0x0c),
            SupportedRate(0x12),
            SupportedRate(0x18),
            SupportedRate(0x24),
            SupportedRate(0x30),
            SupportedRate(0x48),
        ]
    }

    pub fn fake_ht_capabilities() -> HtCapabilities {
        let mut ht_cap_info = HtCapabilityInfo(0);
        ht_cap_info.set_chan_width_set(ChanWidthSet::TWENTY_FORTY);
        ht_cap_info.set_short_gi_20(true);
        ht_cap_info.set_short_gi_40(true);
        ht_cap_info.set_max_amsdu_len(MaxAmsduLen::OCTETS_7935);
        let mut ampdu_params = AmpduParams(0);
        ampdu_params.set_exponent(3);
        let mut mcs_set = SupportedMcsSet(0);
        mcs_set.set_rx_mcs(0xffff);
        mcs_set.set_tx_set_defined(true);
        HtCapabilities {
            ht_cap_info,
            ampdu_params,
            mcs_set,
            ht_ext_cap: HtExtCapabilities(0),
            txbf_cap: TxBfCapability(0),
            asel_cap: AselCapability(0),
        }
    }

    pub fn fake_ht_operation() -> HtOperation {
        HtOperation {
            primary_chan: 36,
            ht_op_info_head: HtOpInfoHead(0),
            ht_op_info_tail: HtOpInfoTail(0),
            basic_ht_mcs_set: SupportedMcsSet(0xff),
        }
    }

    pub fn fake_vht_capabilities() -> VhtCapabilities {
        let mut vht_cap_info = VhtCapabilitiesInfo(0);
        vht_cap_info.set_sgi_cbw80(true);
        vht_cap_info.set_max_ampdu_exponent(7);
        let mut vht_mcs_nss = VhtMcsNssSet(0);
        vht_mcs_nss.set_rx_max_mcs(VhtMcsNssMap(0xfffe));
        vht_mcs_nss.set_tx_max_mcs(VhtMcsNssMap(0xfffe));
        VhtCapabilities { vht_cap_info, vht_mcs_nss }
    }

    pub fn fake_vht_operation() -> VhtOperation {
        VhtOperation {
            vht_cbw: VhtOperation::CBW_80_160_80P80,
            center_freq_seg0: 42,
            center_freq_seg1: 0,
            basic_mcs_nss: VhtMcsNssMap(0xfffc),
        }
    }

    pub fn fake_capabilities(ht: bool, vht: bool) -> StaCapabilities {
        let mut capability_info = CapabilityInfo(0);
        capability_info.set_ess(true);
        capability_info.set_short_preamble(true);
        StaCapabilities {
            capability_info,
            rates: fake_rates(),
            ht_cap: if ht { Some(fake_ht_capabilities()) } else { None },
            vht_cap: if vht { Some(fake_vht_capabilities()) } else { None },
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{test_utils::*, *},
        test_case::test_case,
        wlan_common::{assert_variant, channel::Cbw, ie::write_ht_capabilities},
    };

    fn chan(cbw: Cbw) -> Channel {
        Channel::new(36, cbw)
    }

    #[test_case(true, true, true, true => (true, true); "both vht")]
    #[test_case(true, true, true, false => (true, false); "client lacks vht")]
    #[test_case(true, false, true, true => (true, false); "ap lacks vht")]
    #[test_case(false, true, true, true => (false, false); "ap lacks ht")]
    #[test_case(true, true, false, true => (false, false); "vht never without ht")]
    fn ht_and_vht_presence(
        ap_ht: bool,
        ap_vht: bool,
        client_ht: bool,
        client_vht: bool,
    ) -> (bool, bool) {
        let ap = fake_capabilities(ap_ht, ap_vht);
        let client = fake_capabilities(client_ht, client_vht);
        let negotiated = negotiate(&ap, &client, chan(Cbw::Cbw80)).expect("negotiation failed");
        (negotiated.ht_cap.is_some(), negotiated.vht_cap.is_some())
    }

    #[test]
    fn negotiation_is_symmetric_for_ht_and_vht() {
        let ap = fake_capabilities(true, true);
        let mut client = fake_capabilities(true, true);
        let mut info = { client.ht_cap.unwrap().ht_cap_info };
        info.set_chan_width_set(ChanWidthSet::TWENTY_ONLY);
        info.set_short_gi_40(false);
        let mut ht_cap = client.ht_cap.unwrap();
        ht_cap.ht_cap_info = info;
        client.ht_cap = Some(ht_cap);

        let a = negotiate(&ap, &client, chan(Cbw::Cbw40)).expect("negotiation failed");
        let b = negotiate(&client, &ap, chan(Cbw::Cbw40)).expect("negotiation failed");
        assert_eq!(a.ht_cap, b.ht_cap);
        assert_eq!(a.vht_cap, b.vht_cap);
        let out_info = { a.ht_cap.unwrap().ht_cap_info };
        assert_eq!(out_info.chan_width_set(), ChanWidthSet::TWENTY_ONLY);
        assert!(!out_info.short_gi_40());
        assert!(out_info.short_gi_20());
        assert!(!a.is_cbw40_rx);
        assert!(!a.is_cbw40_tx);
    }

    #[test_case(Cbw::Cbw20 => false; "no secondary channel")]
    #[test_case(Cbw::Cbw40 => true; "secondary channel")]
    fn cbw40_tx_requires_secondary_channel(cbw: Cbw) -> bool {
        let caps = fake_capabilities(true, false);
        let negotiated = negotiate(&caps, &caps, chan(cbw)).expect("negotiation failed");
        assert!(negotiated.is_cbw40_rx);
        negotiated.is_cbw40_tx
    }

    #[test]
    fn capability_info_keeps_ap_ess_and_privacy() {
        let mut ap = fake_capabilities(false, false);
        ap.capability_info.set_privacy(true);
        ap.capability_info.set_short_slot_time(true);
        let mut client = fake_capabilities(false, false);
        client.capability_info.set_ess(false);
        client.capability_info.set_short_preamble(false);

        let negotiated = negotiate(&ap, &client, chan(Cbw::Cbw20)).expect("negotiation failed");
        assert!(negotiated.capability_info.ess());
        assert!(negotiated.capability_info.privacy());
        assert!(!negotiated.capability_info.short_preamble());
        assert!(!negotiated.capability_info.short_slot_time());
    }

    #[test]
    fn basic_rate_mismatch_fails() {
        let ap = fake_capabilities(false, false);
        let mut client = fake_capabilities(false, false);
        // Drop the AP's basic rate 0x02.
        client.rates.retain(|r| r.rate() != 0x02);
        assert_variant!(negotiate(&ap, &client, chan(Cbw::Cbw20)), Err(Error::Internal(_)));
    }

    #[test]
    fn parse_elements() {
        #[rustfmt::skip]
        let mut bytes = vec![
            0, 3, b'f', b'o', b'o', // SSID
            1, 2, 0x82, 0x84, // Supported Rates
            50, 1, 0x0c, // Extended Supported Rates
            48, 2, 1, 0, // RSNE
            221, 1, 0, // Vendor specific, ignored
        ];
        write_ht_capabilities(&mut bytes, &fake_ht_capabilities()).expect("writing HT caps");

        let elements = parse_assoc_elements(&bytes[..]).expect("parsing failed");
        assert_eq!(elements.ssid, Some(b"foo".to_vec()));
        assert_eq!(
            elements.rates,
            vec![SupportedRate(0x82), SupportedRate(0x84), SupportedRate(0x0c)]
        );
        assert_eq!(elements.rsne, Some(vec![48, 2, 1, 0]));
        assert_eq!(elements.ht_cap, Some(fake_ht_capabilities()));
        assert_eq!(elements.vht_cap, None);
    }

    #[test]
    fn parse_rejects_inconsistent_element_length() {
        // HT Capabilities must be exactly 26 bytes long.
        let bytes = [45, 3, 1, 2, 3];
        assert_variant!(parse_assoc_elements(&bytes[..]), Err(Error::ParsingFrame(_)));
    }

    #[test]
    fn parse_rejects_truncated_chain() {
        let bytes = [0, 3, b'f', b'o'];
        assert_variant!(parse_assoc_elements(&bytes[..]), Err(Error::ParsingFrame(_)));
    }

    #[test]
    fn context_drops_operations_without_capabilities() {
        let caps = fake_capabilities(false, false);
        let negotiated = negotiate(&caps, &caps, chan(Cbw::Cbw20)).expect("negotiation failed");
        let ctx = AssociationContext::new(
            [1; 6],
            1,
            10,
            chan(Cbw::Cbw20),
            negotiated,
            Some(fake_ht_operation()),
            Some(fake_vht_operation()),
        );
        assert!(!ctx.has_ht());
        assert!(!ctx.has_vht());
        assert_eq!(ctx.ht_op, None);
        assert_eq!(ctx.vht_op, None);
    }
}
