// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        ap::{
            infra_bss::BssParams,
            power_save::{BufferedFrame, PsBuffer},
            Context, TimedEvent,
        },
        assoc_context::{self, AssociationContext, NegotiatedCapabilities},
        error::{Error, Status},
        frame_writer::AssocRespFields,
        sme::{
            AssociateIndication, AssociateResultCode, AuthenticateIndication,
            AuthenticateResultCode, AuthenticationType, ControlledPortState,
            DeauthenticateIndication, DisassociateIndication, EapolConfirm, EapolIndication,
            EapolResultCode, MlmeEvent,
        },
        timer::TimeoutId,
    },
    log::{info, warn},
    wlan_common::mac::{
        AuthAlgorithmNumber, CapabilityInfo, FrameControl, LlcFrame, MacAddr, ReasonCode,
        StatusCode, ETHER_TYPE_EAPOL,
    },
};

/// Largest AID an AP may assign.
const MAX_AID: u16 = 2007;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    AuthTimeout,
    AssocTimeout,
}

#[derive(Debug)]
pub enum State {
    Deauthenticated,
    Authenticating { auth_type: AuthenticationType, timeout: TimeoutId },
    Authenticated,
    Associating { timeout: TimeoutId, listen_interval: u16, negotiated: NegotiatedCapabilities },
    Associated { aid: u16, port_open: bool },
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Deauthenticated => "deauthenticated",
            State::Authenticating { .. } => "authenticating",
            State::Authenticated => "authenticated",
            State::Associating { .. } => "associating",
            State::Associated { .. } => "associated",
        }
    }

    fn timeout(&self) -> Option<TimeoutId> {
        match self {
            State::Authenticating { timeout, .. } | State::Associating { timeout, .. } => {
                Some(*timeout)
            }
            _ => None,
        }
    }
}

fn auth_status_code(result_code: AuthenticateResultCode) -> StatusCode {
    match result_code {
        AuthenticateResultCode::Success => StatusCode::SUCCESS,
        AuthenticateResultCode::Refused => StatusCode::REFUSED_REASON_UNSPECIFIED,
        AuthenticateResultCode::AuthenticationRejected => StatusCode::CHALLENGE_FAILURE,
        AuthenticateResultCode::AuthFailureTimeout => StatusCode::REJECTED_SEQUENCE_TIMEOUT,
    }
}

fn assoc_status_code(result_code: AssociateResultCode) -> StatusCode {
    match result_code {
        AssociateResultCode::Success => StatusCode::SUCCESS,
        AssociateResultCode::RefusedReasonUnspecified
        | AssociateResultCode::RefusedNotAuthenticated => StatusCode::REFUSED_REASON_UNSPECIFIED,
        AssociateResultCode::RefusedCapabilitiesMismatch => {
            StatusCode::REFUSED_CAPABILITIES_MISMATCH
        }
        AssociateResultCode::RefusedExternalReason => StatusCode::DENIED_OTHER_REASON,
        AssociateResultCode::RefusedApOutOfMemory => StatusCode::DENIED_NO_MORE_STAS,
        AssociateResultCode::RefusedBasicRatesMismatch => StatusCode::REFUSED_BASIC_RATES_MISMATCH,
        AssociateResultCode::RefusedTemporarily => StatusCode::REFUSED_TEMPORARILY,
    }
}

/// The AP's session with one client.
pub struct RemoteClient {
    pub addr: MacAddr,
    state: State,
    ps_buffer: PsBuffer,
}

impl RemoteClient {
    pub fn new(addr: MacAddr, ps_queue_limit: usize) -> Self {
        Self { addr, state: State::Deauthenticated, ps_buffer: PsBuffer::new(ps_queue_limit) }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn aid(&self) -> Option<u16> {
        match self.state {
            State::Associated { aid, .. } => Some(aid),
            _ => None,
        }
    }

    /// A deauthenticated client has no session left worth keeping.
    pub fn is_deauthenticated(&self) -> bool {
        match self.state {
            State::Deauthenticated => true,
            _ => false,
        }
    }

    pub fn is_associated(&self) -> bool {
        self.aid().is_some()
    }

    pub fn is_port_open(&self) -> bool {
        match self.state {
            State::Associated { port_open, .. } => port_open,
            _ => false,
        }
    }

    pub fn is_dozing(&self) -> bool {
        self.ps_buffer.is_dozing()
    }

    pub fn ps_queue_len(&self) -> usize {
        self.ps_buffer.len()
    }

    fn move_to(&mut self, ctx: &mut Context, state: State) {
        if let Some(timeout) = self.state.timeout() {
            ctx.timer.cancel(timeout);
        }
        if let State::Associated { .. } = self.state {
            self.ps_buffer.clear();
        }
        info!("client {:02x?}: {} -> {}", self.addr, self.state.name(), state.name());
        self.state = state;
    }

    /// Drops every trace of the association, both locally and on the device.
    fn leave_association(&mut self, ctx: &mut Context, state: State) {
        ctx.device.clear_assoc(&self.addr);
        self.move_to(ctx, state);
    }

    /// Cancels outstanding timeouts and tears the association down. Called before the record is
    /// destroyed.
    pub fn release(&mut self, ctx: &mut Context) {
        self.leave_association(ctx, State::Deauthenticated);
    }

    fn protect_frames(&self, bss: &BssParams) -> bool {
        bss.is_protected() && self.is_port_open()
    }

    pub fn handle_auth_frame(
        &mut self,
        ctx: &mut Context,
        bss: &BssParams,
        auth_alg_num: AuthAlgorithmNumber,
    ) -> Result<(), Error> {
        if let State::Authenticating { .. } = self.state {
            info!("ignoring retransmitted authentication frame from {:02x?}", self.addr);
            return Ok(());
        }
        let auth_type = match AuthenticationType::from_auth_alg_num(auth_alg_num) {
            Some(auth_type) => auth_type,
            None => {
                warn!(
                    "unsupported authentication algorithm {} from {:02x?}",
                    auth_alg_num.0, self.addr
                );
                return ctx.send_auth_frame(
                    self.addr,
                    auth_alg_num,
                    StatusCode::UNSUPPORTED_AUTH_ALGORITHM,
                );
            }
        };
        ctx.send_mlme_event(MlmeEvent::AuthenticateInd {
            ind: AuthenticateIndication { peer_sta_address: self.addr, auth_type },
        });
        let bcn_count = ctx.config.auth_timeout_bcn_count;
        let timeout = ctx.schedule_after_beacons(
            bss.beacon_period,
            bcn_count,
            TimedEvent::Client(self.addr, ClientEvent::AuthTimeout),
        );
        self.move_to(ctx, State::Authenticating { auth_type, timeout });
        Ok(())
    }

    pub fn handle_auth_resp(
        &mut self,
        ctx: &mut Context,
        result_code: AuthenticateResultCode,
    ) -> Result<(), Error> {
        let auth_type = match self.state {
            State::Authenticating { auth_type, .. } => auth_type,
            _ => {
                return Err(Error::Status(
                    format!(
                        "authenticate response for {:02x?} while {}",
                        self.addr,
                        self.state.name()
                    ),
                    Status::BAD_STATE,
                ))
            }
        };
        if result_code == AuthenticateResultCode::Success {
            self.move_to(ctx, State::Authenticated);
        } else {
            warn!("SME refused authentication of {:02x?}: {:?}", self.addr, result_code);
            self.leave_association(ctx, State::Deauthenticated);
        }
        ctx.send_auth_frame(self.addr, auth_type.auth_alg_num(), auth_status_code(result_code))
    }

    pub fn handle_assoc_req_frame(
        &mut self,
        ctx: &mut Context,
        bss: &BssParams,
        capability_info: CapabilityInfo,
        listen_interval: u16,
        elements: &[u8],
    ) -> Result<(), Error> {
        match self.state {
            State::Authenticated | State::Associated { .. } => (),
            State::Associating { .. } => {
                info!("ignoring retransmitted association request from {:02x?}", self.addr);
                return Ok(());
            }
            State::Deauthenticated | State::Authenticating { .. } => {
                self.leave_association(ctx, State::Deauthenticated);
                return ctx.reject_class2_frame(self.addr);
            }
        }

        let elements = match assoc_context::parse_assoc_elements(elements) {
            Ok(elements) => elements,
            Err(e) => {
                warn!("refusing association of {:02x?}: {}", self.addr, e);
                return ctx.send_assoc_resp_frame(
                    self.addr,
                    AssocRespFields::refusal(
                        bss.capability_info(),
                        StatusCode::REFUSED_CAPABILITIES_MISMATCH,
                    ),
                );
            }
        };
        let ssid = elements.ssid.clone();
        let rates = elements.rates.clone();
        let rsne = elements.rsne.clone();
        let client_caps = elements.into_capabilities(capability_info);
        let negotiated =
            match assoc_context::negotiate(&bss.capabilities, &client_caps, bss.channel) {
                Ok(negotiated) => negotiated,
                Err(e) => {
                    warn!("refusing association of {:02x?}: {}", self.addr, e);
                    return ctx.send_assoc_resp_frame(
                        self.addr,
                        AssocRespFields::refusal(
                            bss.capability_info(),
                            StatusCode::REFUSED_BASIC_RATES_MISMATCH,
                        ),
                    );
                }
            };

        ctx.send_mlme_event(MlmeEvent::AssociateInd {
            ind: AssociateIndication {
                peer_sta_address: self.addr,
                capability_info,
                listen_interval,
                ssid,
                rates,
                rsne,
            },
        });
        let bcn_count = ctx.config.assoc_timeout_bcn_count;
        let timeout = ctx.schedule_after_beacons(
            bss.beacon_period,
            bcn_count,
            TimedEvent::Client(self.addr, ClientEvent::AssocTimeout),
        );
        self.move_to(ctx, State::Associating { timeout, listen_interval, negotiated });
        Ok(())
    }

    pub fn handle_assoc_resp(
        &mut self,
        ctx: &mut Context,
        bss: &BssParams,
        result_code: AssociateResultCode,
        aid: u16,
    ) -> Result<(), Error> {
        let (listen_interval, negotiated) = match &self.state {
            State::Associating { listen_interval, negotiated, .. } => {
                (*listen_interval, negotiated.clone())
            }
            _ => {
                return Err(Error::Status(
                    format!(
                        "associate response for {:02x?} while {}",
                        self.addr,
                        self.state.name()
                    ),
                    Status::BAD_STATE,
                ))
            }
        };

        if result_code != AssociateResultCode::Success {
            warn!("SME refused association of {:02x?}: {:?}", self.addr, result_code);
            self.leave_association(ctx, State::Authenticated);
            return ctx.send_assoc_resp_frame(
                self.addr,
                AssocRespFields::refusal(bss.capability_info(), assoc_status_code(result_code)),
            );
        }

        if aid == 0 || aid > MAX_AID {
            self.leave_association(ctx, State::Authenticated);
            ctx.send_assoc_resp_frame(
                self.addr,
                AssocRespFields::refusal(
                    bss.capability_info(),
                    StatusCode::REFUSED_REASON_UNSPECIFIED,
                ),
            )?;
            return Err(Error::Status(format!("invalid AID {}", aid), Status::INVALID_ARGS));
        }

        let assoc_ctx = AssociationContext::new(
            self.addr,
            aid,
            listen_interval,
            bss.channel,
            negotiated.clone(),
            None,
            None,
        );
        if let Err(status) = ctx.device.configure_assoc(assoc_ctx) {
            self.move_to(ctx, State::Authenticated);
            ctx.send_assoc_resp_frame(
                self.addr,
                AssocRespFields::refusal(
                    bss.capability_info(),
                    StatusCode::REFUSED_REASON_UNSPECIFIED,
                ),
            )?;
            return Err(Error::Status(
                format!("failed to configure association of {:02x?}", self.addr),
                status,
            ));
        }

        let port_open = !bss.is_protected();
        self.move_to(ctx, State::Associated { aid, port_open });
        ctx.send_assoc_resp_frame(
            self.addr,
            AssocRespFields {
                capabilities: bss.capability_info(),
                status_code: StatusCode::SUCCESS,
                aid,
                rates: &negotiated.rates[..],
                ht_cap: negotiated.ht_cap,
                ht_op: None,
                vht_cap: negotiated.vht_cap,
                vht_op: None,
            },
        )
    }

    pub fn handle_timed_event(&mut self, ctx: &mut Context, id: TimeoutId, event: ClientEvent) {
        if self.state.timeout() != Some(id) {
            info!("ignoring stale {:?} for {:02x?}", event, self.addr);
            return;
        }
        match event {
            ClientEvent::AuthTimeout => {
                info!("authentication of {:02x?} timed out", self.addr);
                self.leave_association(ctx, State::Deauthenticated);
            }
            ClientEvent::AssocTimeout => {
                info!("association of {:02x?} timed out", self.addr);
                self.leave_association(ctx, State::Authenticated);
            }
        }
    }

    pub fn handle_set_controlled_port(&mut self, state: ControlledPortState) -> Result<(), Error> {
        match &mut self.state {
            State::Associated { port_open, .. } => {
                *port_open = state == ControlledPortState::Open;
                info!("controlled port of {:02x?} is now {:?}", self.addr, state);
                Ok(())
            }
            other => Err(Error::Status(
                format!("cannot set controlled port of {:02x?} while {}", self.addr, other.name()),
                Status::BAD_STATE,
            )),
        }
    }

    pub fn handle_deauth_frame(&mut self, ctx: &mut Context, reason_code: ReasonCode) {
        if self.is_deauthenticated() {
            info!("ignoring deauthentication from deauthenticated client {:02x?}", self.addr);
            return;
        }
        info!("client {:02x?} deauthenticated: {:?}", self.addr, reason_code);
        self.release(ctx);
        ctx.send_mlme_event(MlmeEvent::DeauthenticateInd {
            ind: DeauthenticateIndication {
                peer_sta_address: self.addr,
                reason_code,
                locally_initiated: false,
            },
        });
    }

    pub fn handle_disassoc_frame(&mut self, ctx: &mut Context, reason_code: ReasonCode) {
        if !self.is_associated() {
            warn!("ignoring disassociation from unassociated client {:02x?}", self.addr);
            return;
        }
        info!("client {:02x?} disassociated: {:?}", self.addr, reason_code);
        self.leave_association(ctx, State::Authenticated);
        ctx.send_mlme_event(MlmeEvent::DisassociateInd {
            ind: DisassociateIndication {
                peer_sta_address: self.addr,
                reason_code,
                locally_initiated: false,
            },
        });
    }

    /// Returns the status reported to the SME in its disassociate confirm.
    pub fn handle_disassoc_req(
        &mut self,
        ctx: &mut Context,
        reason_code: ReasonCode,
    ) -> Result<Status, Error> {
        if !self.is_associated() {
            warn!("disassociate request for unassociated client {:02x?}", self.addr);
            return Ok(Status::BAD_STATE);
        }
        self.leave_association(ctx, State::Authenticated);
        ctx.send_disassoc_frame(self.addr, reason_code)?;
        Ok(Status::OK)
    }

    pub fn handle_data_frame(
        &mut self,
        ctx: &mut Context,
        bss: &BssParams,
        frame_ctrl: FrameControl,
        dst_addr: MacAddr,
        body: &[u8],
    ) -> Result<(), Error> {
        match self.state {
            State::Associated { .. } => (),
            State::Deauthenticated | State::Authenticating { .. } => {
                self.leave_association(ctx, State::Deauthenticated);
                return ctx.reject_class2_frame(self.addr);
            }
            State::Authenticated | State::Associating { .. } => {
                self.leave_association(ctx, State::Authenticated);
                return ctx.reject_class3_frame(self.addr);
            }
        }

        if frame_ctrl.is_null_data() {
            return self.handle_power_mgmt(ctx, bss, frame_ctrl.power_mgmt());
        }

        let llc_frame = match LlcFrame::parse(body) {
            Some(llc_frame) => llc_frame,
            None => {
                warn!("dropping data frame without LLC header from {:02x?}", self.addr);
                return Ok(());
            }
        };
        let ether_type = llc_frame.hdr.protocol_id();
        if ether_type == ETHER_TYPE_EAPOL {
            ctx.send_mlme_event(MlmeEvent::EapolInd {
                ind: EapolIndication {
                    src_addr: self.addr,
                    dst_addr,
                    data: llc_frame.body.to_vec(),
                },
            });
            return Ok(());
        }
        if bss.is_protected() && !self.is_port_open() {
            warn!("dropping data frame from {:02x?}: controlled port closed", self.addr);
            return Ok(());
        }
        ctx.deliver_eth_frame(dst_addr, self.addr, ether_type, llc_frame.body)
    }

    fn handle_power_mgmt(
        &mut self,
        ctx: &mut Context,
        bss: &BssParams,
        dozing: bool,
    ) -> Result<(), Error> {
        if dozing {
            if !self.ps_buffer.is_dozing() {
                info!("client {:02x?} entered power save", self.addr);
            }
            self.ps_buffer.set_dozing(true);
            return Ok(());
        }
        if self.ps_buffer.is_dozing() {
            info!("client {:02x?} left power save", self.addr);
        }
        self.ps_buffer.set_dozing(false);

        let protected = self.protect_frames(bss);
        let frames = self.ps_buffer.drain();
        let count = frames.len();
        for (i, frame) in frames.into_iter().enumerate() {
            let more_data = i + 1 < count;
            ctx.send_data_frame(
                self.addr,
                frame.src_addr,
                protected,
                more_data,
                frame.ether_type,
                &frame.body[..],
            )?;
        }
        Ok(())
    }

    /// Transmits an MSDU from the network stack, or holds it back while the client dozes.
    pub fn handle_eth_frame(
        &mut self,
        ctx: &mut Context,
        bss: &BssParams,
        src_addr: MacAddr,
        ether_type: u16,
        body: &[u8],
    ) -> Result<(), Error> {
        if !self.is_associated() {
            warn!("dropping frame to unassociated client {:02x?}", self.addr);
            return Ok(());
        }
        if bss.is_protected() && !self.is_port_open() {
            warn!("dropping frame to {:02x?}: controlled port closed", self.addr);
            return Ok(());
        }
        if self.ps_buffer.is_dozing() {
            self.ps_buffer.enqueue(BufferedFrame { src_addr, ether_type, body: body.to_vec() });
            return Ok(());
        }
        let protected = self.protect_frames(bss);
        ctx.send_data_frame(self.addr, src_addr, protected, false, ether_type, body)
    }

    /// EAPOL frames bypass the controlled port but still require an association.
    pub fn handle_eapol_req(
        &mut self,
        ctx: &mut Context,
        bss: &BssParams,
        src_addr: MacAddr,
        data: &[u8],
    ) -> Result<(), Error> {
        let result = if self.is_associated() {
            let protected = self.protect_frames(bss);
            ctx.send_data_frame(self.addr, src_addr, protected, false, ETHER_TYPE_EAPOL, data)
        } else {
            Err(Error::Status(
                format!("EAPOL request for {:02x?} while {}", self.addr, self.state.name()),
                Status::BAD_STATE,
            ))
        };
        let result_code = match result {
            Ok(()) => EapolResultCode::Success,
            Err(_) => EapolResultCode::TransmissionFailure,
        };
        ctx.send_mlme_event(MlmeEvent::EapolConf {
            resp: EapolConfirm { result_code, dst_addr: self.addr },
        });
        result
    }
}
