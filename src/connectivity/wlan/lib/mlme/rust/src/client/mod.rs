// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The client role: joins one BSS, authenticates and associates with its AP and watches the
//! association for beacon loss.

mod channel_listener;
mod lost_bss;
mod state;

pub use {
    channel_listener::{
        switch_channel, ChannelListener, ChannelListenerState, MlmeChannelListener,
    },
    lost_bss::LostBssCounter,
    state::{Association, Client, Liveness, State},
};

use {
    crate::{
        device::{BssConfig, Device, RxInfo, TxFlags},
        error::{Error, Status},
        frame_writer::{self, AssocReqFields},
        key::KeyConfig,
        sme::{
            AssociateConfirm, AssociateResultCode, AuthenticateConfirm, AuthenticateResultCode,
            BssDescription, DeauthenticateConfirm, DisassociateConfirm, EapolConfirm,
            EapolResultCode, JoinConfirm, JoinRequest, JoinResultCode, MlmeEvent, MlmeRequest,
            SetKeyResult, SetKeysConfirm, SetKeysRequest,
        },
        timer::{Scheduler, TimerManager},
        MlmeImpl,
    },
    log::{error, info, warn},
    wlan_common::{
        channel::Channel,
        data_writer,
        mac::{
            AuthAlgorithmNumber, Bssid, EthernetFrame, FrameControl, MacAddr, MacFrame, MgmtHdr,
            ReasonCode, StatusCode, ETHER_TYPE_EAPOL, MGMT_SUBTYPE_ASSOC_REQ, MGMT_SUBTYPE_AUTH,
            MGMT_SUBTYPE_DEAUTH, MGMT_SUBTYPE_DISASSOC,
        },
        mgmt_writer,
        sequence::SequenceManager,
        time::Time,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Beacon periods between two association status checks.
    pub status_check_interval_bcn_count: u32,
    /// On-channel beacon periods without a beacon from the BSS before the client gives up on it.
    pub auto_deauth_timeout_bcn_count: u32,
    /// Beacon periods the AP has to answer an association request.
    pub assoc_timeout_bcn_count: u32,
    pub signal_report_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            status_check_interval_bcn_count: 10,
            auto_deauth_timeout_bcn_count: 100,
            assoc_timeout_bcn_count: 20,
            signal_report_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedEvent {
    AuthTimeout,
    AssocTimeout,
    /// Periodic check of an established association.
    StatusCheck,
}

pub struct Context {
    pub config: ClientConfig,
    pub device: Device,
    pub timer: TimerManager<TimedEvent>,
    pub seq_mgr: SequenceManager,
    pub iface_mac: MacAddr,
}

impl Context {
    pub fn new(config: ClientConfig, device: Device, timer: TimerManager<TimedEvent>) -> Self {
        let iface_mac = device.info().sta_addr;
        Self { config, device, timer, seq_mgr: SequenceManager::new(), iface_mac }
    }

    pub fn send_mlme_event(&self, event: MlmeEvent) {
        self.device.send_mlme_event(event)
    }

    fn mgmt_hdr(&mut self, subtype: u16, bssid: Bssid) -> MgmtHdr {
        let seq_num = self.seq_mgr.next_sns1(&bssid.0);
        mgmt_writer::mgmt_hdr_to_ap(subtype, bssid, self.iface_mac, frame_writer::seq_ctrl(seq_num))
    }

    fn send_wlan_frame(&mut self, frame: Vec<u8>, flags: TxFlags, kind: &str) -> Result<(), Error> {
        self.device
            .send_wlan_frame(frame, flags)
            .map_err(|s| Error::Status(format!("error sending {} frame", kind), s))
    }

    pub fn send_auth_frame(
        &mut self,
        bssid: Bssid,
        auth_alg_num: AuthAlgorithmNumber,
    ) -> Result<(), Error> {
        let hdr = self.mgmt_hdr(MGMT_SUBTYPE_AUTH, bssid);
        let frame = frame_writer::write_auth_frame(hdr, auth_alg_num, 1, StatusCode::SUCCESS)?;
        self.send_wlan_frame(frame, TxFlags::NONE, "authentication")
    }

    pub fn send_assoc_req_frame(
        &mut self,
        bssid: Bssid,
        fields: AssocReqFields<'_>,
    ) -> Result<(), Error> {
        let hdr = self.mgmt_hdr(MGMT_SUBTYPE_ASSOC_REQ, bssid);
        let frame = frame_writer::write_assoc_req_frame(hdr, fields)?;
        self.send_wlan_frame(frame, TxFlags::NONE, "association request")
    }

    pub fn send_deauth_frame(
        &mut self,
        bssid: Bssid,
        reason_code: ReasonCode,
    ) -> Result<(), Error> {
        let hdr = self.mgmt_hdr(MGMT_SUBTYPE_DEAUTH, bssid);
        let frame = frame_writer::write_deauth_frame(hdr, reason_code)?;
        self.send_wlan_frame(frame, TxFlags::NONE, "deauthentication")
    }

    pub fn send_disassoc_frame(
        &mut self,
        bssid: Bssid,
        reason_code: ReasonCode,
    ) -> Result<(), Error> {
        let hdr = self.mgmt_hdr(MGMT_SUBTYPE_DISASSOC, bssid);
        let frame = frame_writer::write_disassoc_frame(hdr, reason_code)?;
        self.send_wlan_frame(frame, TxFlags::NONE, "disassociation")
    }

    /// Sends an MSDU through the AP of `bssid` to its final destination `dst_addr`.
    pub fn send_data_frame(
        &mut self,
        bssid: Bssid,
        src_addr: MacAddr,
        dst_addr: MacAddr,
        protected: bool,
        ether_type: u16,
        payload: &[u8],
    ) -> Result<(), Error> {
        let mut frame_ctrl = FrameControl(0);
        frame_ctrl.set_protected(protected);
        let seq_num = self.seq_mgr.next_sns1(&dst_addr);
        let mut hdr = data_writer::data_hdr_client_to_ap(
            frame_ctrl,
            bssid,
            src_addr,
            frame_writer::seq_ctrl(seq_num),
        );
        hdr.addr3 = dst_addr;
        let frame = frame_writer::write_data_frame(hdr, ether_type, payload)?;
        let mut flags = if protected { TxFlags::PROTECTED } else { TxFlags::NONE };
        if ether_type == ETHER_TYPE_EAPOL {
            flags = TxFlags(flags.0 | TxFlags::FAVOR_RELIABILITY.0);
        }
        self.send_wlan_frame(frame, flags, "data")
    }

    pub fn deliver_eth_frame(
        &mut self,
        dst_addr: MacAddr,
        src_addr: MacAddr,
        ether_type: u16,
        payload: &[u8],
    ) -> Result<(), Error> {
        let frame = frame_writer::write_eth_frame(dst_addr, src_addr, ether_type, payload)?;
        self.device
            .deliver_eth_frame(&frame[..])
            .map_err(|s| Error::Status("error delivering ethernet frame".to_string(), s))
    }
}

fn not_joined() -> Error {
    Error::Status("not joined to any BSS".to_string(), Status::BAD_STATE)
}

pub struct ClientMlme {
    ctx: Context,
    sta: Option<Client>,
    chan_listener: ChannelListenerState,
}

impl ClientMlme {
    pub fn sta(&self) -> Option<&Client> {
        self.sta.as_ref()
    }

    /// Moves the device to `channel`, e.g. for off-channel work. Beacon loss is not accounted
    /// while away from the channel of the joined BSS.
    pub fn switch_channel(&mut self, channel: Channel) -> Result<(), Error> {
        let mut listener = self.chan_listener.bind(&mut self.ctx, self.sta.as_mut());
        switch_channel(&mut listener, channel)
    }

    fn join_bss(&mut self, bss: &BssDescription) -> Result<(), Error> {
        self.ctx
            .device
            .set_channel(bss.channel)
            .map_err(|s| Error::Status(format!("error setting channel {:?}", bss.channel), s))?;
        self.ctx
            .device
            .configure_bss(BssConfig {
                bssid: bss.bssid,
                remote: true,
                beacon_period: bss.beacon_period,
                channel: bss.channel,
            })
            .map_err(|s| Error::Status("error configuring BSS".to_string(), s))
    }

    fn handle_join(&mut self, req: JoinRequest) -> Result<(), Error> {
        if let Some(mut sta) = self.sta.take() {
            info!("leaving BSS {:02x?} to join another one", sta.bssid().0);
            sta.release(&mut self.ctx);
            self.ctx.timer.cancel_all();
        }
        self.chan_listener.main_channel = None;

        let bss = req.selected_bss;
        let result_code = match self.join_bss(&bss) {
            Ok(()) => {
                info!("joined BSS {:02x?} on {:?}", bss.bssid.0, bss.channel);
                self.chan_listener.main_channel = Some(bss.channel);
                self.sta = Some(Client::new(bss));
                JoinResultCode::Success
            }
            Err(e) => {
                error!("failed to join BSS: {}", e);
                JoinResultCode::InternalError
            }
        };
        self.ctx.send_mlme_event(MlmeEvent::JoinConf { resp: JoinConfirm { result_code } });
        Ok(())
    }

    /// Forgets the joined BSS after it was lost.
    fn leave_bss(&mut self) {
        self.sta = None;
        self.chan_listener.main_channel = None;
        self.ctx.timer.cancel_all();
        if let Err(status) = self.ctx.device.clear_bss() {
            error!("failed to clear BSS: {}", status);
        }
    }

    fn handle_set_keys(&mut self, req: SetKeysRequest) -> Result<(), Error> {
        let protected = self.sta.as_ref().map(|sta| sta.bss().is_protected());
        let results = req
            .keylist
            .iter()
            .map(|desc| {
                let status = match protected {
                    None => Status::BAD_STATE,
                    Some(false) => {
                        warn!("ignoring key {} for unprotected BSS", desc.key_id);
                        Status::NOT_SUPPORTED
                    }
                    Some(true) => match self.ctx.device.set_key(KeyConfig::from(desc)) {
                        Ok(()) => Status::OK,
                        Err(status) => {
                            error!("failed to install key {}: {}", desc.key_id, status);
                            status
                        }
                    },
                };
                SetKeyResult { key_id: desc.key_id, status }
            })
            .collect();
        self.ctx.send_mlme_event(MlmeEvent::SetKeysConf { conf: SetKeysConfirm { results } });
        Ok(())
    }

    /// Answers requests that need a joined BSS with a failed confirm.
    fn refuse_not_joined(&mut self, req: MlmeRequest) -> Result<(), Error> {
        warn!("{} request while not joined", req.name());
        let event = match req {
            MlmeRequest::Authenticate(req) => Some(MlmeEvent::AuthenticateConf {
                resp: AuthenticateConfirm {
                    peer_sta_address: req.peer_sta_address,
                    auth_type: req.auth_type,
                    result_code: AuthenticateResultCode::Refused,
                },
            }),
            MlmeRequest::Associate(_) => Some(MlmeEvent::AssociateConf {
                resp: AssociateConfirm {
                    result_code: AssociateResultCode::RefusedNotAuthenticated,
                    association_id: 0,
                },
            }),
            MlmeRequest::Deauthenticate(req) => Some(MlmeEvent::DeauthenticateConf {
                resp: DeauthenticateConfirm { peer_sta_address: req.peer_sta_address },
            }),
            MlmeRequest::Disassociate(_) => Some(MlmeEvent::DisassociateConf {
                resp: DisassociateConfirm { status: Status::BAD_STATE },
            }),
            MlmeRequest::Eapol(req) => Some(MlmeEvent::EapolConf {
                resp: EapolConfirm {
                    result_code: EapolResultCode::TransmissionFailure,
                    dst_addr: req.dst_addr,
                },
            }),
            _ => None,
        };
        if let Some(event) = event {
            self.ctx.send_mlme_event(event);
        }
        Err(not_joined())
    }
}

impl MlmeImpl for ClientMlme {
    type Config = ClientConfig;
    type TimerEvent = TimedEvent;

    fn new(config: ClientConfig, device: Device, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            ctx: Context::new(config, device, TimerManager::new(scheduler)),
            sta: None,
            chan_listener: ChannelListenerState::default(),
        }
    }

    fn handle_mlme_request(&mut self, req: MlmeRequest) -> Result<(), Error> {
        match req {
            MlmeRequest::Join(req) => return self.handle_join(req),
            MlmeRequest::SetKeys(req) => return self.handle_set_keys(req),
            MlmeRequest::Start(_)
            | MlmeRequest::Stop(_)
            | MlmeRequest::AuthenticateResp(_)
            | MlmeRequest::AssociateResp(_) => {
                return Err(Error::NotSupported(format!("{} request in client role", req.name())))
            }
            _ => (),
        }
        let sta = match self.sta.as_mut() {
            Some(sta) => sta,
            None => return self.refuse_not_joined(req),
        };
        let ctx = &mut self.ctx;
        match req {
            MlmeRequest::Authenticate(req) => sta.handle_authenticate_req(ctx, req),
            MlmeRequest::Associate(req) => sta.handle_associate_req(ctx, req),
            MlmeRequest::Deauthenticate(req) => sta.handle_deauthenticate_req(ctx, req),
            MlmeRequest::Disassociate(req) => sta.handle_disassociate_req(ctx, req),
            MlmeRequest::SetControlledPort(req) => sta.handle_set_controlled_port(ctx, req.state),
            MlmeRequest::Eapol(req) => sta.handle_eapol_req(ctx, req),
            _ => Ok(()),
        }
    }

    fn handle_mac_frame_rx(&mut self, bytes: &[u8], rx_info: RxInfo) {
        let sta = match self.sta.as_mut() {
            Some(sta) => sta,
            None => return,
        };
        let result = match MacFrame::parse(bytes) {
            Some(MacFrame::Mgmt { mgmt_hdr, body, .. }) => {
                sta.handle_mgmt_frame(&mut self.ctx, *mgmt_hdr, body, rx_info)
            }
            Some(MacFrame::Data { fixed_fields, body, .. }) => {
                sta.handle_data_frame(&mut self.ctx, *fixed_fields, body)
            }
            Some(MacFrame::Unsupported { .. }) => Ok(()),
            None => {
                warn!("dropping malformed frame ({} bytes)", bytes.len());
                Ok(())
            }
        };
        if let Err(e) = result {
            error!("failed to handle frame: {}", e);
        }
    }

    fn handle_eth_frame_tx(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let sta = self.sta.as_mut().ok_or_else(not_joined)?;
        let frame = EthernetFrame::parse(bytes).ok_or(Error::BufferTooSmall)?;
        let (dst_addr, src_addr) = (frame.hdr.da, frame.hdr.sa);
        sta.handle_eth_frame(&mut self.ctx, dst_addr, src_addr, frame.hdr.ether_type(), frame.body)
    }

    fn handle_timeout(&mut self, now: Time) {
        while let Some((id, event)) = self.ctx.timer.expire_next(now) {
            let sta = match self.sta.as_mut() {
                Some(sta) => sta,
                None => {
                    info!("ignoring {:?}: not joined", event);
                    continue;
                }
            };
            if let Liveness::BssLost = sta.handle_timed_event(&mut self.ctx, id, event) {
                self.leave_bss();
            }
        }
        self.ctx.timer.rearm();
    }

    fn access_device(&mut self) -> &mut Device {
        &mut self.ctx.device
    }
}
