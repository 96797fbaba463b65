// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        assoc_context::{
            negotiate, parse_assoc_elements, AssociationContext, NegotiatedCapabilities,
            StaCapabilities,
        },
        client::{lost_bss::LostBssCounter, Context, TimedEvent},
        device::{LinkStatus, RxInfo},
        error::{Error, Status},
        frame_writer::AssocReqFields,
        sme::{
            AssociateConfirm, AssociateRequest, AssociateResultCode, AuthenticateConfirm,
            AuthenticateRequest, AuthenticateResultCode, AuthenticationType, BssDescription,
            ControlledPortState, DeauthenticateConfirm, DeauthenticateIndication,
            DeauthenticateRequest, DisassociateConfirm, DisassociateIndication,
            DisassociateRequest, EapolConfirm, EapolIndication, EapolRequest, EapolResultCode,
            MlmeEvent, SignalReportIndication,
        },
        timer::TimeoutId,
    },
    log::{error, info, warn},
    std::time::Duration,
    wlan_common::{
        ewma_signal::EwmaSignal,
        ie::{HtOperation, VhtOperation},
        mac::{
            is_group_addr, AssocRespHdr, AuthHdr, Bssid, CapabilityInfo, FixedDataHdrFields,
            LlcFrame, MacAddr, MgmtBody, MgmtHdr, ReasonCode, StatusCode, ETHER_TYPE_EAPOL,
        },
        time::Time,
    },
};

const SIGNAL_EWMA_WEIGHT: usize = 10;

/// Whether the joined BSS is still considered reachable after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    BssLost,
}

#[derive(Debug)]
struct Signal {
    rssi_dbm: EwmaSignal,
    snr_db: EwmaSignal,
}

impl Signal {
    fn new(rx_info: RxInfo) -> Self {
        Self {
            rssi_dbm: EwmaSignal::new(SIGNAL_EWMA_WEIGHT, rx_info.rssi_dbm),
            snr_db: EwmaSignal::new(SIGNAL_EWMA_WEIGHT, rx_info.snr_db),
        }
    }

    fn update(&mut self, rx_info: RxInfo) {
        self.rssi_dbm.update_average(rx_info.rssi_dbm);
        self.snr_db.update_average(rx_info.snr_db);
    }
}

/// An established association and the bookkeeping watching it for beacon loss.
#[derive(Debug)]
pub struct Association {
    pub aid: u16,
    pub port_open: bool,
    lost_bss: LostBssCounter,
    /// None while the client is off-channel.
    status_check: Option<TimeoutId>,
    /// Beacon-less time up to this point is already accounted for in `lost_bss`.
    last_accounted: Time,
    signal: Signal,
}

#[derive(Debug)]
pub enum State {
    Joined,
    Authenticating { auth_type: AuthenticationType, timeout: TimeoutId },
    Authenticated,
    Associating { listen_interval: u16, timeout: TimeoutId },
    Associated(Association),
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Joined => "joined",
            State::Authenticating { .. } => "authenticating",
            State::Authenticated => "authenticated",
            State::Associating { .. } => "associating",
            State::Associated(_) => "associated",
        }
    }
}

fn assoc_result_code(status_code: StatusCode) -> AssociateResultCode {
    match status_code {
        StatusCode::DENIED_NO_MORE_STAS => AssociateResultCode::RefusedApOutOfMemory,
        StatusCode::REFUSED_BASIC_RATES_MISMATCH => AssociateResultCode::RefusedBasicRatesMismatch,
        StatusCode::REFUSED_CAPABILITIES_MISMATCH => {
            AssociateResultCode::RefusedCapabilitiesMismatch
        }
        StatusCode::DENIED_OTHER_REASON => AssociateResultCode::RefusedExternalReason,
        StatusCode::REFUSED_TEMPORARILY => AssociateResultCode::RefusedTemporarily,
        _ => AssociateResultCode::RefusedReasonUnspecified,
    }
}

/// The session of this client with the AP of the joined BSS.
pub struct Client {
    bss: BssDescription,
    state: State,
}

impl Client {
    pub fn new(bss: BssDescription) -> Self {
        Self { bss, state: State::Joined }
    }

    pub fn bss(&self) -> &BssDescription {
        &self.bss
    }

    pub fn bssid(&self) -> Bssid {
        self.bss.bssid
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn aid(&self) -> Option<u16> {
        match &self.state {
            State::Associated(assoc) => Some(assoc.aid),
            _ => None,
        }
    }

    pub fn is_port_open(&self) -> bool {
        match &self.state {
            State::Associated(assoc) => assoc.port_open,
            _ => false,
        }
    }

    fn status_check_interval(&self, ctx: &Context) -> Duration {
        self.bss.beacon_period.times(ctx.config.status_check_interval_bcn_count)
    }

    /// Leaving a state cancels its timeout. Leaving `Associated` also tears down the
    /// association on the device and takes the link down.
    fn move_to(&mut self, ctx: &mut Context, next: State) {
        match &self.state {
            State::Authenticating { timeout, .. } | State::Associating { timeout, .. } => {
                ctx.timer.cancel(*timeout)
            }
            State::Associated(assoc) => {
                if let Some(id) = assoc.status_check {
                    ctx.timer.cancel(id);
                }
                ctx.device.clear_assoc(&self.bss.bssid.0);
                if let Err(status) = ctx.device.set_eth_link_down() {
                    error!("failed to take link down: {}", status);
                }
            }
            State::Joined | State::Authenticated => (),
        }
        info!("{:02x?}: {} -> {}", self.bss.bssid.0, self.state.name(), next.name());
        self.state = next;
    }

    /// Returns the session to `Joined`, e.g. before joining another BSS.
    pub fn release(&mut self, ctx: &mut Context) {
        self.move_to(ctx, State::Joined);
    }

    fn send_auth_conf(
        &self,
        ctx: &Context,
        auth_type: AuthenticationType,
        result_code: AuthenticateResultCode,
    ) {
        ctx.send_mlme_event(MlmeEvent::AuthenticateConf {
            resp: AuthenticateConfirm {
                peer_sta_address: self.bss.bssid.0,
                auth_type,
                result_code,
            },
        });
    }

    fn send_assoc_conf(&self, ctx: &Context, result_code: AssociateResultCode, aid: u16) {
        ctx.send_mlme_event(MlmeEvent::AssociateConf {
            resp: AssociateConfirm { result_code, association_id: aid },
        });
    }

    pub fn handle_authenticate_req(
        &mut self,
        ctx: &mut Context,
        req: AuthenticateRequest,
    ) -> Result<(), Error> {
        match self.state {
            State::Joined | State::Authenticated => (),
            _ => {
                warn!("authenticate request while {}", self.state.name());
                self.send_auth_conf(ctx, req.auth_type, AuthenticateResultCode::Refused);
                return Ok(());
            }
        }
        if req.peer_sta_address != self.bss.bssid.0 {
            warn!("authenticate request for {:02x?}, not the joined BSS", req.peer_sta_address);
            self.send_auth_conf(ctx, req.auth_type, AuthenticateResultCode::Refused);
            return Ok(());
        }
        if req.auth_type != AuthenticationType::OpenSystem {
            warn!("{:?} authentication is not supported", req.auth_type);
            self.send_auth_conf(ctx, req.auth_type, AuthenticateResultCode::Refused);
            return Ok(());
        }

        if let Err(e) = ctx.send_auth_frame(self.bss.bssid, req.auth_type.auth_alg_num()) {
            self.send_auth_conf(ctx, req.auth_type, AuthenticateResultCode::Refused);
            return Err(e);
        }
        let timeout = ctx.timer.schedule_after(
            self.bss.beacon_period.times(req.auth_failure_timeout),
            TimedEvent::AuthTimeout,
        );
        self.move_to(ctx, State::Authenticating { auth_type: req.auth_type, timeout });
        Ok(())
    }

    fn handle_auth_frame(&mut self, ctx: &mut Context, auth_hdr: AuthHdr) {
        let auth_type = match self.state {
            State::Authenticating { auth_type, .. } => auth_type,
            _ => {
                warn!("ignoring authentication frame while {}", self.state.name());
                return;
            }
        };
        if auth_hdr.auth_alg_num() != auth_type.auth_alg_num() || auth_hdr.auth_txn_seq_num() != 2
        {
            warn!(
                "ignoring authentication frame with algorithm {} and sequence number {}",
                auth_hdr.auth_alg_num().0,
                auth_hdr.auth_txn_seq_num()
            );
            return;
        }
        let status_code = auth_hdr.status_code();
        if status_code.is_success() {
            self.move_to(ctx, State::Authenticated);
            self.send_auth_conf(ctx, auth_type, AuthenticateResultCode::Success);
        } else {
            warn!("authentication rejected with status {}", status_code.0);
            self.move_to(ctx, State::Joined);
            self.send_auth_conf(ctx, auth_type, AuthenticateResultCode::AuthenticationRejected);
        }
    }

    pub fn handle_associate_req(
        &mut self,
        ctx: &mut Context,
        req: AssociateRequest,
    ) -> Result<(), Error> {
        match self.state {
            State::Authenticated => (),
            _ => {
                warn!("associate request while {}", self.state.name());
                self.send_assoc_conf(ctx, AssociateResultCode::RefusedNotAuthenticated, 0);
                return Ok(());
            }
        }

        let fields = AssocReqFields {
            capabilities: req.capability_info,
            listen_interval: req.listen_interval,
            ssid: &self.bss.ssid[..],
            rates: &req.rates[..],
            ht_cap: req.ht_cap,
            vht_cap: req.vht_cap,
            rsne: req.rsne.as_ref().map(|rsne| &rsne[..]),
        };
        if let Err(e) = ctx.send_assoc_req_frame(self.bss.bssid, fields) {
            self.send_assoc_conf(ctx, AssociateResultCode::RefusedReasonUnspecified, 0);
            return Err(e);
        }
        let timeout = ctx.timer.schedule_after(
            self.bss.beacon_period.times(ctx.config.assoc_timeout_bcn_count),
            TimedEvent::AssocTimeout,
        );
        self.move_to(ctx, State::Associating { listen_interval: req.listen_interval, timeout });
        Ok(())
    }

    fn negotiate_with_ap(
        &self,
        ctx: &Context,
        capability_info: CapabilityInfo,
        elements: &[u8],
    ) -> Result<(NegotiatedCapabilities, Option<HtOperation>, Option<VhtOperation>), Error> {
        // Only what the AP granted in its response counts, not what it advertised earlier.
        let elements = parse_assoc_elements(elements)?;
        let ap = StaCapabilities {
            capability_info,
            rates: elements.rates,
            ht_cap: elements.ht_cap,
            vht_cap: elements.vht_cap,
        };
        let negotiated = negotiate(&ap, &ctx.device.info().capabilities(), self.bss.channel)?;
        let ht_op = elements.ht_op.filter(|_| negotiated.ht_cap.is_some());
        let vht_op = elements.vht_op.filter(|_| negotiated.vht_cap.is_some());
        Ok((negotiated, ht_op, vht_op))
    }

    fn handle_assoc_resp_frame(
        &mut self,
        ctx: &mut Context,
        assoc_resp_hdr: AssocRespHdr,
        elements: &[u8],
        rx_info: RxInfo,
    ) -> Result<(), Error> {
        let listen_interval = match self.state {
            State::Associating { listen_interval, .. } => listen_interval,
            _ => {
                warn!("ignoring association response while {}", self.state.name());
                return Ok(());
            }
        };

        let status_code = assoc_resp_hdr.status_code();
        if !status_code.is_success() {
            warn!("association refused with status {}", status_code.0);
            self.move_to(ctx, State::Authenticated);
            self.send_assoc_conf(ctx, assoc_result_code(status_code), 0);
            return Ok(());
        }

        let aid = assoc_resp_hdr.aid();
        let (negotiated, ht_op, vht_op) =
            match self.negotiate_with_ap(ctx, assoc_resp_hdr.capabilities(), elements) {
                Ok(negotiated) => negotiated,
                Err(e) => {
                    error!("cannot use association granted by the AP: {}", e);
                    self.move_to(ctx, State::Authenticated);
                    self.send_assoc_conf(ctx, AssociateResultCode::RefusedCapabilitiesMismatch, 0);
                    return ctx.send_disassoc_frame(self.bss.bssid, ReasonCode::UNSPECIFIED_REASON);
                }
            };
        let assoc_ctx = AssociationContext::new(
            self.bss.bssid.0,
            aid,
            listen_interval,
            self.bss.channel,
            negotiated,
            ht_op,
            vht_op,
        );
        if let Err(status) = ctx.device.configure_assoc(assoc_ctx) {
            self.move_to(ctx, State::Authenticated);
            self.send_assoc_conf(ctx, AssociateResultCode::RefusedReasonUnspecified, 0);
            if let Err(e) = ctx.send_disassoc_frame(self.bss.bssid, ReasonCode::UNSPECIFIED_REASON)
            {
                error!("{}", e);
            }
            return Err(Error::Status("error configuring association".to_string(), status));
        }

        let port_open = !self.bss.is_protected();
        let status_check =
            ctx.timer.schedule_after(self.status_check_interval(ctx), TimedEvent::StatusCheck);
        let assoc = Association {
            aid,
            port_open,
            lost_bss: LostBssCounter::start(
                self.bss.beacon_period,
                ctx.config.auto_deauth_timeout_bcn_count,
            ),
            status_check: Some(status_check),
            last_accounted: ctx.timer.now(),
            signal: Signal::new(rx_info),
        };
        self.move_to(ctx, State::Associated(assoc));
        if port_open {
            if let Err(status) = ctx.device.set_eth_link_up() {
                error!("failed to bring link up: {}", status);
            }
        }
        self.send_assoc_conf(ctx, AssociateResultCode::Success, aid);
        Ok(())
    }

    fn handle_beacon(&mut self, ctx: &mut Context, rx_info: RxInfo) {
        if let State::Associated(assoc) = &mut self.state {
            assoc.lost_bss.reset();
            assoc.last_accounted = ctx.timer.now();
            assoc.signal.update(rx_info);
        }
    }

    fn handle_deauth_frame(&mut self, ctx: &mut Context, reason_code: ReasonCode) {
        if let State::Joined = self.state {
            return;
        }
        info!("deauthenticated by AP, reason {}", reason_code.0);
        self.move_to(ctx, State::Joined);
        ctx.send_mlme_event(MlmeEvent::DeauthenticateInd {
            ind: DeauthenticateIndication {
                peer_sta_address: self.bss.bssid.0,
                reason_code,
                locally_initiated: false,
            },
        });
    }

    fn handle_disassoc_frame(&mut self, ctx: &mut Context, reason_code: ReasonCode) {
        if let State::Associated(_) = self.state {
            info!("disassociated by AP, reason {}", reason_code.0);
            self.move_to(ctx, State::Authenticated);
            ctx.send_mlme_event(MlmeEvent::DisassociateInd {
                ind: DisassociateIndication {
                    peer_sta_address: self.bss.bssid.0,
                    reason_code,
                    locally_initiated: false,
                },
            });
        }
    }

    /// Frames from other BSSs are ignored.
    pub fn handle_mgmt_frame(
        &mut self,
        ctx: &mut Context,
        mgmt_hdr: MgmtHdr,
        body: &[u8],
        rx_info: RxInfo,
    ) -> Result<(), Error> {
        if { mgmt_hdr.addr3 } != self.bss.bssid.0 {
            return Ok(());
        }
        let subtype = mgmt_hdr.frame_ctrl().frame_subtype();
        match MgmtBody::parse(subtype, body) {
            Some(MgmtBody::Beacon { .. }) => self.handle_beacon(ctx, rx_info),
            Some(MgmtBody::Authentication { auth_hdr, .. }) => {
                self.handle_auth_frame(ctx, *auth_hdr)
            }
            Some(MgmtBody::AssociationResp { assoc_resp_hdr, elements }) => {
                return self.handle_assoc_resp_frame(ctx, *assoc_resp_hdr, elements, rx_info);
            }
            Some(MgmtBody::Deauthentication { deauth_hdr, .. }) => {
                self.handle_deauth_frame(ctx, deauth_hdr.reason_code())
            }
            Some(MgmtBody::Disassociation { disassoc_hdr, .. }) => {
                self.handle_disassoc_frame(ctx, disassoc_hdr.reason_code())
            }
            Some(MgmtBody::AssociationReq { .. }) | Some(MgmtBody::Unsupported { .. }) => (),
            None => warn!("dropping malformed management frame of subtype {}", subtype),
        }
        Ok(())
    }

    pub fn handle_data_frame(
        &mut self,
        ctx: &mut Context,
        hdr: FixedDataHdrFields,
        body: &[u8],
    ) -> Result<(), Error> {
        let frame_ctrl = hdr.frame_ctrl();
        if frame_ctrl.to_ds() || !frame_ctrl.from_ds() || { hdr.addr2 } != self.bss.bssid.0 {
            return Ok(());
        }
        let receiver = { hdr.addr1 };
        if receiver != ctx.iface_mac && !is_group_addr(&receiver) {
            return Ok(());
        }
        let port_open = match &self.state {
            State::Associated(assoc) => assoc.port_open,
            _ => {
                warn!("dropping data frame while {}", self.state.name());
                return Ok(());
            }
        };
        if frame_ctrl.is_null_data() {
            return Ok(());
        }
        let llc_frame = match LlcFrame::parse(body) {
            Some(llc_frame) => llc_frame,
            None => {
                warn!("dropping data frame without LLC header ({} bytes)", body.len());
                return Ok(());
            }
        };
        let (dst_addr, src_addr) = (hdr.addr1, hdr.addr3);
        let ether_type = llc_frame.hdr.protocol_id();
        if ether_type == ETHER_TYPE_EAPOL {
            ctx.send_mlme_event(MlmeEvent::EapolInd {
                ind: EapolIndication { src_addr, dst_addr, data: llc_frame.body.to_vec() },
            });
            return Ok(());
        }
        if self.bss.is_protected() && !port_open {
            warn!("dropping data frame: controlled port is closed");
            return Ok(());
        }
        ctx.deliver_eth_frame(dst_addr, src_addr, ether_type, llc_frame.body)
    }

    pub fn handle_eth_frame(
        &mut self,
        ctx: &mut Context,
        dst_addr: MacAddr,
        src_addr: MacAddr,
        ether_type: u16,
        body: &[u8],
    ) -> Result<(), Error> {
        let port_open = match &self.state {
            State::Associated(assoc) => assoc.port_open,
            _ => {
                warn!("dropping ethernet frame while {}", self.state.name());
                return Ok(());
            }
        };
        let protected = self.bss.is_protected();
        if protected && !port_open {
            warn!("dropping ethernet frame: controlled port is closed");
            return Ok(());
        }
        ctx.send_data_frame(self.bss.bssid, src_addr, dst_addr, protected, ether_type, body)
    }

    pub fn handle_eapol_req(&mut self, ctx: &mut Context, req: EapolRequest) -> Result<(), Error> {
        let result = match &self.state {
            State::Associated(assoc) => ctx.send_data_frame(
                self.bss.bssid,
                req.src_addr,
                req.dst_addr,
                self.bss.is_protected() && assoc.port_open,
                ETHER_TYPE_EAPOL,
                &req.data[..],
            ),
            _ => Err(Error::Status(
                format!("EAPOL request while {}", self.state.name()),
                Status::BAD_STATE,
            )),
        };
        let result_code = match result {
            Ok(()) => EapolResultCode::Success,
            Err(_) => EapolResultCode::TransmissionFailure,
        };
        ctx.send_mlme_event(MlmeEvent::EapolConf {
            resp: EapolConfirm { result_code, dst_addr: req.dst_addr },
        });
        result
    }

    pub fn handle_deauthenticate_req(
        &mut self,
        ctx: &mut Context,
        req: DeauthenticateRequest,
    ) -> Result<(), Error> {
        let result = ctx.send_deauth_frame(self.bss.bssid, req.reason_code);
        self.move_to(ctx, State::Joined);
        ctx.send_mlme_event(MlmeEvent::DeauthenticateConf {
            resp: DeauthenticateConfirm { peer_sta_address: req.peer_sta_address },
        });
        result
    }

    pub fn handle_disassociate_req(
        &mut self,
        ctx: &mut Context,
        req: DisassociateRequest,
    ) -> Result<(), Error> {
        let status = match self.state {
            State::Associated(_) => {
                self.move_to(ctx, State::Authenticated);
                match ctx.send_disassoc_frame(self.bss.bssid, req.reason_code) {
                    Ok(()) => Status::OK,
                    Err(e) => {
                        error!("{}", e);
                        Status::INTERNAL
                    }
                }
            }
            _ => {
                warn!("disassociate request while {}", self.state.name());
                Status::BAD_STATE
            }
        };
        ctx.send_mlme_event(MlmeEvent::DisassociateConf { resp: DisassociateConfirm { status } });
        Ok(())
    }

    pub fn handle_set_controlled_port(
        &mut self,
        ctx: &mut Context,
        state: ControlledPortState,
    ) -> Result<(), Error> {
        let name = self.state.name();
        match &mut self.state {
            State::Associated(assoc) => {
                assoc.port_open = state == ControlledPortState::Open;
                ctx.device.set_eth_link(LinkStatus::from(state)).map_err(|status| {
                    Error::Status("error setting link status".to_string(), status)
                })
            }
            _ => Err(Error::Status(
                format!("cannot set controlled port while {}", name),
                Status::BAD_STATE,
            )),
        }
    }

    pub fn handle_timed_event(
        &mut self,
        ctx: &mut Context,
        id: TimeoutId,
        event: TimedEvent,
    ) -> Liveness {
        match event {
            TimedEvent::AuthTimeout => match self.state {
                State::Authenticating { auth_type, timeout } if timeout == id => {
                    warn!("authentication timed out");
                    self.move_to(ctx, State::Joined);
                    self.send_auth_conf(ctx, auth_type, AuthenticateResultCode::AuthFailureTimeout);
                }
                _ => info!("ignoring stale authentication timeout"),
            },
            TimedEvent::AssocTimeout => match self.state {
                State::Associating { timeout, .. } if timeout == id => {
                    warn!("association timed out");
                    self.move_to(ctx, State::Authenticated);
                    self.send_assoc_conf(ctx, AssociateResultCode::RefusedTemporarily, 0);
                }
                _ => info!("ignoring stale association timeout"),
            },
            TimedEvent::StatusCheck => return self.handle_status_check(ctx, id),
        }
        Liveness::Alive
    }

    /// Reports the signal and accounts the time since the last beacon. Deauthenticates once
    /// the BSS went unheard for the configured number of beacon periods.
    fn handle_status_check(&mut self, ctx: &mut Context, id: TimeoutId) -> Liveness {
        let bssid = self.bss.bssid;
        let interval = self.status_check_interval(ctx);
        let assoc = match &mut self.state {
            State::Associated(assoc) if assoc.status_check == Some(id) => assoc,
            _ => return Liveness::Alive,
        };
        if ctx.config.signal_report_enabled {
            ctx.send_mlme_event(MlmeEvent::SignalReport {
                ind: SignalReportIndication {
                    rssi_dbm: assoc.signal.rssi_dbm.value(),
                    snr_db: assoc.signal.snr_db.value(),
                },
            });
        }

        let now = ctx.timer.now();
        assoc.lost_bss.add_time(now.duration_since(assoc.last_accounted));
        assoc.last_accounted = now;
        if !assoc.lost_bss.should_deauthenticate() {
            assoc.status_check = Some(ctx.timer.schedule_after(interval, TimedEvent::StatusCheck));
            return Liveness::Alive;
        }

        assoc.status_check = None;
        warn!(
            "no beacon from {:02x?} for {:?}, deauthenticating",
            bssid.0,
            assoc.lost_bss.time_since_last_beacon()
        );
        let reason_code = ReasonCode::LEAVING_NETWORK_DEAUTH;
        if let Err(e) = ctx.send_deauth_frame(bssid, reason_code) {
            error!("{}", e);
        }
        ctx.send_mlme_event(MlmeEvent::DeauthenticateInd {
            ind: DeauthenticateIndication {
                peer_sta_address: bssid.0,
                reason_code,
                locally_initiated: true,
            },
        });
        self.move_to(ctx, State::Joined);
        Liveness::BssLost
    }

    /// Stops accounting beacon-less time until the client is back on the BSS channel.
    pub fn pre_switch_off_channel(&mut self, ctx: &mut Context) {
        if let State::Associated(assoc) = &mut self.state {
            if let Some(id) = assoc.status_check.take() {
                ctx.timer.cancel(id);
                let now = ctx.timer.now();
                assoc.lost_bss.add_time(now.duration_since(assoc.last_accounted));
                assoc.last_accounted = now;
            }
        }
    }

    /// Resumes status checks one full interval from now.
    pub fn handle_back_on_channel(&mut self, ctx: &mut Context) {
        let interval = self.status_check_interval(ctx);
        if let State::Associated(assoc) = &mut self.state {
            if assoc.status_check.is_none() {
                assoc.last_accounted = ctx.timer.now();
                assoc.status_check =
                    Some(ctx.timer.schedule_after(interval, TimedEvent::StatusCheck));
            }
        }
    }
}
