// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        ap::{remote_client::RemoteClient, Context, TimedEvent},
        assoc_context::StaCapabilities,
        device::BssConfig,
        error::{Error, Status},
        key::KeyConfig,
        sme::{
            AssociateResponse, AuthenticateResponse, DeauthenticateConfirm,
            DeauthenticateRequest, DisassociateConfirm, DisassociateRequest, EapolConfirm,
            EapolRequest, EapolResultCode, MlmeEvent, SetControlledPortRequest, SetKeyResult,
            SetKeysConfirm, SetKeysRequest, StartRequest,
        },
        timer::TimeoutId,
    },
    log::{error, info, warn},
    std::collections::HashMap,
    wlan_common::{
        channel::Channel,
        mac::{
            data_src_addr, is_group_addr, CapabilityInfo, FixedDataHdrFields, MacAddr, MgmtBody,
            MgmtHdr, ReasonCode,
        },
        TimeUnit,
    },
};

/// Parameters of the running BSS, fixed from start to stop.
#[derive(Debug, Clone, PartialEq)]
pub struct BssParams {
    pub ssid: Vec<u8>,
    pub beacon_period: TimeUnit,
    pub dtim_period: u8,
    pub channel: Channel,
    pub rsne: Option<Vec<u8>>,
    /// What the AP advertises to its clients.
    pub capabilities: StaCapabilities,
}

impl BssParams {
    pub fn is_protected(&self) -> bool {
        self.rsne.is_some()
    }

    pub fn capability_info(&self) -> CapabilityInfo {
        self.capabilities.capability_info
    }
}

pub struct InfraBss {
    pub params: BssParams,
    clients: HashMap<MacAddr, RemoteClient>,
}

impl InfraBss {
    /// Tunes the device to the BSS channel and configures it to host the BSS.
    pub fn start(ctx: &mut Context, req: StartRequest) -> Result<Self, Error> {
        ctx.device
            .set_channel(req.channel)
            .map_err(|s| Error::Status(format!("failed to set channel {}", req.channel), s))?;
        ctx.device
            .configure_bss(BssConfig {
                bssid: ctx.bssid,
                remote: false,
                beacon_period: req.beacon_period,
                channel: req.channel,
            })
            .map_err(|s| Error::Status("failed to configure BSS".to_string(), s))?;

        let info = ctx.device.info();
        let mut capability_info = info.capability_info;
        capability_info.set_ess(true);
        capability_info.set_ibss(false);
        capability_info.set_privacy(req.rsne.is_some());
        let rates = if req.rates.is_empty() { info.rates } else { req.rates };
        let capabilities =
            StaCapabilities { capability_info, rates, ht_cap: info.ht_cap, vht_cap: info.vht_cap };

        info!("started BSS {:?} on channel {}", String::from_utf8_lossy(&req.ssid), req.channel);
        Ok(Self {
            params: BssParams {
                ssid: req.ssid,
                beacon_period: req.beacon_period,
                dtim_period: req.dtim_period,
                channel: req.channel,
                rsne: req.rsne,
                capabilities,
            },
            clients: HashMap::new(),
        })
    }

    /// Deauthenticates every client and releases the device.
    pub fn stop(mut self, ctx: &mut Context) -> Result<(), Error> {
        for (addr, mut client) in self.clients.drain() {
            client.release(ctx);
            if let Err(e) = ctx.send_deauth_frame(addr, ReasonCode::LEAVING_NETWORK_DEAUTH) {
                error!("failed to deauthenticate {:02x?}: {}", addr, e);
            }
            ctx.seq_mgr.remove(&addr);
        }
        ctx.timer.cancel_all();
        info!("stopped BSS {:?}", String::from_utf8_lossy(&self.params.ssid));
        ctx.device.clear_bss().map_err(|s| Error::Status("failed to clear BSS".to_string(), s))
    }

    pub fn client(&self, addr: &MacAddr) -> Option<&RemoteClient> {
        self.clients.get(addr)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Drops the record of a client whose exchange ended without authentication.
    fn forget_if_deauthenticated(&mut self, ctx: &mut Context, addr: &MacAddr) {
        if self.clients.get(addr).map_or(false, RemoteClient::is_deauthenticated) {
            info!("forgetting client {:02x?}", addr);
            self.clients.remove(addr);
            ctx.seq_mgr.remove(addr);
        }
    }

    fn client_mut(&mut self, addr: &MacAddr) -> Result<&mut RemoteClient, Error> {
        self.clients.get_mut(addr).ok_or_else(|| {
            Error::Status(format!("unknown client {:02x?}", addr), Status::NOT_FOUND)
        })
    }

    pub fn handle_mgmt_frame(
        &mut self,
        ctx: &mut Context,
        mgmt_hdr: MgmtHdr,
        body: &[u8],
    ) -> Result<(), Error> {
        let bssid = { mgmt_hdr.addr3 };
        if bssid != ctx.bssid.0 {
            return Ok(());
        }
        let client_addr = { mgmt_hdr.addr2 };
        let subtype = mgmt_hdr.frame_ctrl().frame_subtype();
        let body = match MgmtBody::parse(subtype, body) {
            Some(body) => body,
            None => {
                warn!("dropping malformed management frame from {:02x?}", client_addr);
                return Ok(());
            }
        };
        let params = &self.params;
        let result = match body {
            MgmtBody::Authentication { auth_hdr, .. } => {
                if auth_hdr.auth_txn_seq_num() != 1 {
                    warn!(
                        "dropping authentication frame with sequence number {} from {:02x?}",
                        auth_hdr.auth_txn_seq_num(),
                        client_addr
                    );
                    return Ok(());
                }
                let ps_queue_limit = ctx.config.ps_queue_limit;
                let client = self
                    .clients
                    .entry(client_addr)
                    .or_insert_with(|| RemoteClient::new(client_addr, ps_queue_limit));
                client.handle_auth_frame(ctx, params, auth_hdr.auth_alg_num())
            }
            MgmtBody::AssociationReq { assoc_req_hdr, elements } => {
                match self.clients.get_mut(&client_addr) {
                    Some(client) => client.handle_assoc_req_frame(
                        ctx,
                        params,
                        assoc_req_hdr.capabilities(),
                        assoc_req_hdr.listen_interval(),
                        elements,
                    ),
                    None => ctx.reject_class2_frame(client_addr),
                }
            }
            MgmtBody::Deauthentication { deauth_hdr, .. } => {
                if let Some(mut client) = self.clients.remove(&client_addr) {
                    client.handle_deauth_frame(ctx, deauth_hdr.reason_code());
                    ctx.seq_mgr.remove(&client_addr);
                }
                Ok(())
            }
            MgmtBody::Disassociation { disassoc_hdr, .. } => {
                if let Some(client) = self.clients.get_mut(&client_addr) {
                    client.handle_disassoc_frame(ctx, disassoc_hdr.reason_code());
                }
                Ok(())
            }
            _ => Ok(()),
        };
        self.forget_if_deauthenticated(ctx, &client_addr);
        result
    }

    pub fn handle_data_frame(
        &mut self,
        ctx: &mut Context,
        fixed_fields: FixedDataHdrFields,
        body: &[u8],
    ) -> Result<(), Error> {
        let frame_ctrl = fixed_fields.frame_ctrl();
        if !frame_ctrl.to_ds() || frame_ctrl.from_ds() {
            warn!("dropping data frame not addressed to the distribution system");
            return Ok(());
        }
        let bssid = { fixed_fields.addr1 };
        if bssid != ctx.bssid.0 {
            return Ok(());
        }
        let src_addr = match data_src_addr(&fixed_fields, None) {
            Some(src_addr) => src_addr,
            None => return Ok(()),
        };
        let dst_addr = { fixed_fields.addr3 };
        let result = match self.clients.get_mut(&src_addr) {
            Some(client) => {
                client.handle_data_frame(ctx, &self.params, frame_ctrl, dst_addr, body)
            }
            None => ctx.reject_class2_frame(src_addr),
        };
        self.forget_if_deauthenticated(ctx, &src_addr);
        result
    }

    pub fn handle_eth_frame(
        &mut self,
        ctx: &mut Context,
        dst_addr: MacAddr,
        src_addr: MacAddr,
        ether_type: u16,
        body: &[u8],
    ) -> Result<(), Error> {
        if is_group_addr(&dst_addr) {
            let protected = self.params.is_protected();
            return ctx.send_data_frame(dst_addr, src_addr, protected, false, ether_type, body);
        }
        match self.clients.get_mut(&dst_addr) {
            Some(client) => client.handle_eth_frame(ctx, &self.params, src_addr, ether_type, body),
            None => {
                warn!("dropping frame to unknown client {:02x?}", dst_addr);
                Ok(())
            }
        }
    }

    pub fn handle_auth_resp(
        &mut self,
        ctx: &mut Context,
        resp: AuthenticateResponse,
    ) -> Result<(), Error> {
        let addr = resp.peer_sta_address;
        let result = self.client_mut(&addr)?.handle_auth_resp(ctx, resp.result_code);
        self.forget_if_deauthenticated(ctx, &addr);
        result
    }

    pub fn handle_assoc_resp(
        &mut self,
        ctx: &mut Context,
        resp: AssociateResponse,
    ) -> Result<(), Error> {
        let client = self.clients.get_mut(&resp.peer_sta_address).ok_or_else(|| {
            Error::Status(
                format!("unknown client {:02x?}", resp.peer_sta_address),
                Status::NOT_FOUND,
            )
        })?;
        client.handle_assoc_resp(ctx, &self.params, resp.result_code, resp.association_id)
    }

    pub fn handle_deauth_req(
        &mut self,
        ctx: &mut Context,
        req: DeauthenticateRequest,
    ) -> Result<(), Error> {
        let addr = req.peer_sta_address;
        if let Some(mut client) = self.clients.remove(&addr) {
            client.release(ctx);
        }
        let result = ctx.send_deauth_frame(addr, req.reason_code);
        ctx.seq_mgr.remove(&addr);
        ctx.send_mlme_event(MlmeEvent::DeauthenticateConf {
            resp: DeauthenticateConfirm { peer_sta_address: addr },
        });
        result
    }

    pub fn handle_disassoc_req(
        &mut self,
        ctx: &mut Context,
        req: DisassociateRequest,
    ) -> Result<(), Error> {
        let result = match self.clients.get_mut(&req.peer_sta_address) {
            Some(client) => client.handle_disassoc_req(ctx, req.reason_code),
            None => Ok(Status::NOT_FOUND),
        };
        let status = match &result {
            Ok(status) => *status,
            Err(_) => Status::INTERNAL,
        };
        ctx.send_mlme_event(MlmeEvent::DisassociateConf {
            resp: DisassociateConfirm { status },
        });
        result.map(|_| ())
    }

    pub fn handle_set_keys(&mut self, ctx: &mut Context, req: SetKeysRequest) -> Result<(), Error> {
        let protected = self.params.is_protected();
        let results = req
            .keylist
            .iter()
            .map(|desc| {
                let status = if !protected {
                    warn!("ignoring key {} for unprotected BSS", desc.key_id);
                    Status::NOT_SUPPORTED
                } else {
                    match ctx.device.set_key(KeyConfig::from(desc)) {
                        Ok(()) => Status::OK,
                        Err(status) => {
                            error!("failed to install key {}: {}", desc.key_id, status);
                            status
                        }
                    }
                };
                SetKeyResult { key_id: desc.key_id, status }
            })
            .collect();
        ctx.send_mlme_event(MlmeEvent::SetKeysConf { conf: SetKeysConfirm { results } });
        Ok(())
    }

    pub fn handle_set_controlled_port(
        &mut self,
        _ctx: &mut Context,
        req: SetControlledPortRequest,
    ) -> Result<(), Error> {
        self.client_mut(&req.peer_sta_address)?.handle_set_controlled_port(req.state)
    }

    pub fn handle_eapol_req(&mut self, ctx: &mut Context, req: EapolRequest) -> Result<(), Error> {
        match self.clients.get_mut(&req.dst_addr) {
            Some(client) => client.handle_eapol_req(ctx, &self.params, req.src_addr, &req.data[..]),
            None => {
                ctx.send_mlme_event(MlmeEvent::EapolConf {
                    resp: EapolConfirm {
                        result_code: EapolResultCode::TransmissionFailure,
                        dst_addr: req.dst_addr,
                    },
                });
                Err(Error::Status(
                    format!("unknown client {:02x?}", req.dst_addr),
                    Status::NOT_FOUND,
                ))
            }
        }
    }

    pub fn handle_timed_event(&mut self, ctx: &mut Context, id: TimeoutId, event: TimedEvent) {
        match event {
            TimedEvent::Client(addr, event) => {
                match self.clients.get_mut(&addr) {
                    Some(client) => client.handle_timed_event(ctx, id, event),
                    None => info!("ignoring {:?} for released client {:02x?}", event, addr),
                }
                self.forget_if_deauthenticated(ctx, &addr);
            }
        }
    }
}
