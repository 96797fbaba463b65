// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Capability intersection. Every combined field is no more capable than the same field on
//! either side. Capability flags are ANDed while counts and sizes take the minimum. Restrictions
//! such as 40 MHz intolerance or a minimum MPDU spacing hold if either side imposes them.

use {
    crate::ie::{
        AmpduParams, AselCapability, HtCapabilities, HtCapabilityInfo, HtExtCapabilities,
        SupportedMcsSet, SupportedRate, TxBfCapability, VhtCapabilities, VhtCapabilitiesInfo,
        VhtMcsNssMap, VhtMcsNssSet, VhtMcsSet,
    },
    anyhow::{format_err, Error},
    std::{cmp::{max, min}, collections::HashSet},
};

pub struct ApRates(pub Vec<SupportedRate>);
pub struct ClientRates(pub Vec<SupportedRate>);

/// Returns the rates specified by the AP that are also supported by the client, with basic bits
/// following their values in the AP.
/// Returns Error if intersection fails.
/// Note: The client MUST support ALL the basic rates specified by the AP or the intersection fails.
pub fn intersect_rates(ap: ApRates, client: ClientRates) -> Result<Vec<SupportedRate>, Error> {
    let mut ap = ap.0;
    let client = client.0.into_iter().map(|r| r.rate()).collect::<HashSet<_>>();
    if ap.iter().any(|ra| ra.basic() && !client.contains(&ra.rate())) {
        return Err(format_err!("At least one basic rate not supported."));
    }

    ap.retain(|ra| client.contains(&ra.rate()));
    if ap.is_empty() {
        Err(format_err!("Client does not support any AP rates."))
    } else {
        Ok(ap)
    }
}

fn intersect_ht_cap_info(a: HtCapabilityInfo, b: HtCapabilityInfo) -> HtCapabilityInfo {
    let mut out = HtCapabilityInfo(0);
    out.set_ldpc_coding_cap(a.ldpc_coding_cap() && b.ldpc_coding_cap());
    out.set_chan_width_set(min(a.chan_width_set(), b.chan_width_set()));
    out.set_sm_power_save(min(a.sm_power_save(), b.sm_power_save()));
    out.set_greenfield(a.greenfield() && b.greenfield());
    out.set_short_gi_20(a.short_gi_20() && b.short_gi_20());
    out.set_short_gi_40(a.short_gi_40() && b.short_gi_40());
    out.set_tx_stbc(a.tx_stbc() && b.tx_stbc());
    out.set_rx_stbc(min(a.rx_stbc(), b.rx_stbc()));
    out.set_delayed_block_ack(a.delayed_block_ack() && b.delayed_block_ack());
    out.set_max_amsdu_len(min(a.max_amsdu_len(), b.max_amsdu_len()));
    out.set_dsss_in_40(a.dsss_in_40() && b.dsss_in_40());
    out.set_intolerant_40(a.intolerant_40() || b.intolerant_40());
    out.set_lsig_txop_protect(a.lsig_txop_protect() && b.lsig_txop_protect());
    out
}

fn intersect_ampdu_params(a: AmpduParams, b: AmpduParams) -> AmpduParams {
    let mut out = AmpduParams(0);
    out.set_exponent(min(a.exponent(), b.exponent()));
    // A longer minimum spacing is the stricter requirement.
    out.set_min_start_spacing(max(a.min_start_spacing(), b.min_start_spacing()));
    out
}

fn intersect_mcs_set(a: SupportedMcsSet, b: SupportedMcsSet) -> SupportedMcsSet {
    let mut out = SupportedMcsSet(0);
    out.set_rx_mcs(a.rx_mcs() & b.rx_mcs());
    out.set_rx_highest_rate(min(a.rx_highest_rate(), b.rx_highest_rate()));
    out.set_tx_set_defined(a.tx_set_defined() && b.tx_set_defined());
    out.set_tx_rx_diff(a.tx_rx_diff() && b.tx_rx_diff());
    out.set_tx_max_ss(min(a.tx_max_ss(), b.tx_max_ss()));
    out.set_tx_ueqm(a.tx_ueqm() && b.tx_ueqm());
    out
}

pub fn intersect_ht_capabilities(a: &HtCapabilities, b: &HtCapabilities) -> HtCapabilities {
    let (a, b) = (*a, *b);
    HtCapabilities {
        ht_cap_info: intersect_ht_cap_info(a.ht_cap_info, b.ht_cap_info),
        ampdu_params: intersect_ampdu_params(a.ampdu_params, b.ampdu_params),
        mcs_set: intersect_mcs_set(a.mcs_set, b.mcs_set),
        // Subfields below are not interpreted; keep only what both sides set.
        ht_ext_cap: HtExtCapabilities(a.ht_ext_cap.0 & b.ht_ext_cap.0),
        txbf_cap: TxBfCapability(a.txbf_cap.0 & b.txbf_cap.0),
        asel_cap: AselCapability(a.asel_cap.0 & b.asel_cap.0),
    }
}

fn intersect_vht_cap_info(a: VhtCapabilitiesInfo, b: VhtCapabilitiesInfo) -> VhtCapabilitiesInfo {
    let mut out = VhtCapabilitiesInfo(0);
    out.set_max_mpdu_len(min(a.max_mpdu_len(), b.max_mpdu_len()));
    out.set_supported_cbw_set(min(a.supported_cbw_set(), b.supported_cbw_set()));
    out.set_rx_ldpc(a.rx_ldpc() && b.rx_ldpc());
    out.set_sgi_cbw80(a.sgi_cbw80() && b.sgi_cbw80());
    out.set_sgi_cbw160(a.sgi_cbw160() && b.sgi_cbw160());
    out.set_tx_stbc(a.tx_stbc() && b.tx_stbc());
    out.set_rx_stbc(min(a.rx_stbc(), b.rx_stbc()));
    out.set_su_bfer(a.su_bfer() && b.su_bfer());
    out.set_su_bfee(a.su_bfee() && b.su_bfee());
    out.set_bfee_sts(min(a.bfee_sts(), b.bfee_sts()));
    out.set_num_sounding(min(a.num_sounding(), b.num_sounding()));
    out.set_mu_bfer(a.mu_bfer() && b.mu_bfer());
    out.set_mu_bfee(a.mu_bfee() && b.mu_bfee());
    out.set_txop_ps(a.txop_ps() && b.txop_ps());
    out.set_htc_vht(a.htc_vht() && b.htc_vht());
    out.set_max_ampdu_exponent(min(a.max_ampdu_exponent(), b.max_ampdu_exponent()));
    out.set_link_adapt(min(a.link_adapt(), b.link_adapt()));
    out.set_rx_ant_pattern(a.rx_ant_pattern() && b.rx_ant_pattern());
    out.set_tx_ant_pattern(a.tx_ant_pattern() && b.tx_ant_pattern());
    out.set_ext_nss_bw(min(a.ext_nss_bw(), b.ext_nss_bw()));
    out
}

/// Per spatial stream: unsupported on either side stays unsupported, otherwise the lower
/// MCS ceiling wins.
pub fn intersect_vht_mcs_nss_map(a: VhtMcsNssMap, b: VhtMcsNssMap) -> VhtMcsNssMap {
    let mut out = VhtMcsNssMap(0);
    for ss in 0..8 {
        let (x, y) = (a.ss(ss), b.ss(ss));
        let combined =
            if x == VhtMcsSet::NONE || y == VhtMcsSet::NONE { VhtMcsSet::NONE } else { min(x, y) };
        out.set_ss(ss, combined);
    }
    out
}

fn intersect_vht_mcs_nss(a: VhtMcsNssSet, b: VhtMcsNssSet) -> VhtMcsNssSet {
    let mut out = VhtMcsNssSet(0);
    out.set_rx_max_mcs(intersect_vht_mcs_nss_map(a.rx_max_mcs(), b.rx_max_mcs()));
    out.set_rx_max_data_rate(min(a.rx_max_data_rate(), b.rx_max_data_rate()));
    out.set_max_nsts(min(a.max_nsts(), b.max_nsts()));
    out.set_tx_max_mcs(intersect_vht_mcs_nss_map(a.tx_max_mcs(), b.tx_max_mcs()));
    out.set_tx_max_data_rate(min(a.tx_max_data_rate(), b.tx_max_data_rate()));
    out.set_ext_nss_bw(a.ext_nss_bw() && b.ext_nss_bw());
    out
}

pub fn intersect_vht_capabilities(a: &VhtCapabilities, b: &VhtCapabilities) -> VhtCapabilities {
    let (a, b) = (*a, *b);
    VhtCapabilities {
        vht_cap_info: intersect_vht_cap_info(a.vht_cap_info, b.vht_cap_info),
        vht_mcs_nss: intersect_vht_mcs_nss(a.vht_mcs_nss, b.vht_mcs_nss),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::ie::{ChanWidthSet, MinMpduStartSpacing},
    };

    impl SupportedRate {
        fn new_basic(rate: u8) -> Self {
            Self(rate).with_basic(true)
        }
    }

    #[test]
    fn some_basic_rate_missing() {
        let ap = vec![SupportedRate::new_basic(120), SupportedRate::new_basic(111)];
        let client = vec![SupportedRate(111)];
        // AP basic rate 120 is not supported, resulting in an Error
        let error = intersect_rates(ApRates(ap), ClientRates(client)).unwrap_err();
        assert!(format!("{}", error).contains("At least one basic rate not supported."));
    }

    #[test]
    fn all_basic_rates_supported() {
        let ap = vec![SupportedRate::new_basic(120), SupportedRate(111)];
        let client = vec![SupportedRate(120)];
        assert_eq!(
            vec![SupportedRate::new_basic(120)],
            intersect_rates(ApRates(ap), ClientRates(client)).unwrap()
        );
    }

    #[test]
    fn no_rates_are_supported() {
        let ap = vec![SupportedRate(120)];
        let client = vec![];
        let error = intersect_rates(ApRates(ap), ClientRates(client)).unwrap_err();
        assert!(format!("{}", error).contains("Client does not support any AP rates."));
    }

    #[test]
    fn preserve_ap_rates_basicness() {
        let ap = vec![SupportedRate(120), SupportedRate(111)];
        let client = vec![SupportedRate::new_basic(120)];
        // AP side 120 is not basic so the result should be non-basic.
        assert_eq!(
            vec![SupportedRate(120)],
            intersect_rates(ApRates(ap), ClientRates(client)).unwrap()
        );
    }

    fn ht_cap(
        ht_cap_info: HtCapabilityInfo,
        ampdu_params: AmpduParams,
        mcs_set: SupportedMcsSet,
    ) -> HtCapabilities {
        HtCapabilities {
            ht_cap_info,
            ampdu_params,
            mcs_set,
            ht_ext_cap: HtExtCapabilities(0x0401),
            txbf_cap: TxBfCapability(0xffff_ffff),
            asel_cap: AselCapability(0x01),
        }
    }

    #[test]
    fn ht_capabilities_never_exceed_either_side() {
        let mut info_a = HtCapabilityInfo(0);
        info_a.set_chan_width_set(ChanWidthSet::TWENTY_FORTY);
        info_a.set_short_gi_20(true);
        info_a.set_short_gi_40(true);
        info_a.set_rx_stbc(2);
        let mut info_b = HtCapabilityInfo(0);
        info_b.set_chan_width_set(ChanWidthSet::TWENTY_ONLY);
        info_b.set_short_gi_20(true);
        info_b.set_rx_stbc(1);

        let mut ampdu_a = AmpduParams(0);
        ampdu_a.set_exponent(3);
        ampdu_a.set_min_start_spacing(MinMpduStartSpacing::HALF_USEC);
        let mut ampdu_b = AmpduParams(0);
        ampdu_b.set_exponent(1);
        ampdu_b.set_min_start_spacing(MinMpduStartSpacing::EIGHT_USEC);

        let mut mcs_a = SupportedMcsSet(0);
        mcs_a.set_rx_mcs(0xffff);
        mcs_a.set_tx_max_ss(1);
        let mut mcs_b = SupportedMcsSet(0);
        mcs_b.set_rx_mcs(0x00ff);
        mcs_b.set_tx_max_ss(0);

        let a = ht_cap(info_a, ampdu_a, mcs_a);
        let mut b = ht_cap(info_b, ampdu_b, mcs_b);
        b.ht_ext_cap = HtExtCapabilities(0x0001);
        b.asel_cap = AselCapability(0);

        let out = intersect_ht_capabilities(&a, &b);
        let info = { out.ht_cap_info };
        assert_eq!(info.chan_width_set(), ChanWidthSet::TWENTY_ONLY);
        assert!(info.short_gi_20());
        assert!(!info.short_gi_40());
        assert_eq!(info.rx_stbc(), 1);

        let ampdu = { out.ampdu_params };
        assert_eq!(ampdu.exponent(), 1);
        assert_eq!(ampdu.min_start_spacing(), MinMpduStartSpacing::EIGHT_USEC);

        let mcs = { out.mcs_set };
        assert_eq!(mcs.rx_mcs(), 0x00ff);
        assert_eq!(mcs.tx_max_ss(), 0);

        assert_eq!({ out.ht_ext_cap }.0, 0x0001);
        assert_eq!({ out.txbf_cap }.0, 0xffff_ffff);
        assert_eq!({ out.asel_cap }.0, 0);

        // Symmetric.
        assert_eq!(out, intersect_ht_capabilities(&b, &a));
    }

    #[test]
    fn forty_mhz_intolerance_from_either_side() {
        let mut intolerant = HtCapabilityInfo(0);
        intolerant.set_intolerant_40(true);
        let a = ht_cap(intolerant, AmpduParams(0), SupportedMcsSet(0));
        let b = ht_cap(HtCapabilityInfo(0), AmpduParams(0), SupportedMcsSet(0));
        assert!({ intersect_ht_capabilities(&a, &b).ht_cap_info }.intolerant_40());
        assert!({ intersect_ht_capabilities(&b, &a).ht_cap_info }.intolerant_40());
        assert!(!{ intersect_ht_capabilities(&b, &b).ht_cap_info }.intolerant_40());
    }

    #[test]
    fn vht_mcs_nss_map_per_stream() {
        // a: ss1 UP_TO_9, ss2 UP_TO_8, rest NONE
        // b: ss1 UP_TO_7, ss2 NONE, ss3 UP_TO_9, rest NONE
        let a = VhtMcsNssMap(0xfff6);
        let b = VhtMcsNssMap(0xffec);
        assert_eq!(b.ss(0), VhtMcsSet::UP_TO_7);
        assert_eq!(b.ss(2), VhtMcsSet::UP_TO_9);
        let out = intersect_vht_mcs_nss_map(a, b);
        assert_eq!(out.ss(0), VhtMcsSet::UP_TO_7);
        assert_eq!(out.ss(1), VhtMcsSet::NONE);
        assert_eq!(out.ss(2), VhtMcsSet::NONE);
        assert_eq!(out.ss(7), VhtMcsSet::NONE);
    }

    #[test]
    fn vht_capabilities_never_exceed_either_side() {
        let mut info_a = VhtCapabilitiesInfo(0);
        info_a.set_supported_cbw_set(2);
        info_a.set_sgi_cbw80(true);
        info_a.set_max_ampdu_exponent(7);
        let mut info_b = VhtCapabilitiesInfo(0);
        info_b.set_supported_cbw_set(0);
        info_b.set_sgi_cbw80(true);
        info_b.set_su_bfee(true);
        info_b.set_max_ampdu_exponent(3);

        let mut mcs_a = VhtMcsNssSet(0);
        mcs_a.set_rx_max_mcs(VhtMcsNssMap(0xfffa));
        mcs_a.set_tx_max_data_rate(866);
        let mut mcs_b = VhtMcsNssSet(0);
        mcs_b.set_rx_max_mcs(VhtMcsNssMap(0xfffc));
        mcs_b.set_tx_max_data_rate(433);

        let a = VhtCapabilities { vht_cap_info: info_a, vht_mcs_nss: mcs_a };
        let b = VhtCapabilities { vht_cap_info: info_b, vht_mcs_nss: mcs_b };
        let out = intersect_vht_capabilities(&a, &b);

        let info = { out.vht_cap_info };
        assert_eq!(info.supported_cbw_set(), 0);
        assert!(info.sgi_cbw80());
        assert!(!info.su_bfee());
        assert_eq!(info.max_ampdu_exponent(), 3);

        let mcs = { out.vht_mcs_nss };
        assert_eq!(mcs.rx_max_mcs(), VhtMcsNssMap(0xfffc));
        assert_eq!(mcs.tx_max_data_rate(), 433);
        assert_eq!(out, intersect_vht_capabilities(&b, &a));
    }
}
