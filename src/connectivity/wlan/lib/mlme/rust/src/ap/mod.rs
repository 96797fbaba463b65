// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The AP role: one infrastructure BSS hosted by this device and a session per remote client.

mod infra_bss;
mod power_save;
mod remote_client;

pub use {
    infra_bss::{BssParams, InfraBss},
    power_save::{BufferedFrame, PsBuffer},
    remote_client::{ClientEvent, RemoteClient, State},
};

use {
    crate::{
        device::{Device, RxInfo, TxFlags},
        error::{Error, Status},
        frame_writer::{self, AssocRespFields},
        sme::{
            BssType, DeauthenticateIndication, DisassociateIndication, MlmeEvent, MlmeRequest,
            StartConfirm, StartRequest, StartResultCode, StopConfirm, StopRequest,
            StopResultCode,
        },
        timer::{Scheduler, TimeoutId, TimerManager},
        MlmeImpl,
    },
    log::{error, info, warn},
    wlan_common::{
        data_writer,
        mac::{
            AuthAlgorithmNumber, Bssid, EthernetFrame, FrameControl, MacAddr, MacFrame,
            ReasonCode, StatusCode, ETHER_TYPE_EAPOL, MGMT_SUBTYPE_ASSOC_RESP, MGMT_SUBTYPE_AUTH,
            MGMT_SUBTYPE_DEAUTH, MGMT_SUBTYPE_DISASSOC,
        },
        mgmt_writer,
        sequence::SequenceManager,
        time::Time,
        TimeUnit,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Beacon periods a client has to complete authentication once the SME was notified.
    pub auth_timeout_bcn_count: u32,
    /// Beacon periods the SME has to answer an association request.
    pub assoc_timeout_bcn_count: u32,
    /// Frames buffered per dozing client before the oldest one is dropped.
    pub ps_queue_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { auth_timeout_bcn_count: 60, assoc_timeout_bcn_count: 60, ps_queue_limit: 64 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedEvent {
    Client(MacAddr, ClientEvent),
}

/// Everything a session needs besides its own record: the driver, the clock and the
/// per-receiver sequence numbers.
pub struct Context {
    pub config: Config,
    pub device: Device,
    pub timer: TimerManager<TimedEvent>,
    pub seq_mgr: SequenceManager,
    pub bssid: Bssid,
}

impl Context {
    pub fn new(config: Config, device: Device, timer: TimerManager<TimedEvent>) -> Self {
        let bssid = Bssid(device.info().sta_addr);
        Self { config, device, timer, seq_mgr: SequenceManager::new(), bssid }
    }

    pub fn send_mlme_event(&self, event: MlmeEvent) {
        self.device.send_mlme_event(event)
    }

    pub fn schedule_after_beacons(
        &mut self,
        beacon_period: TimeUnit,
        bcn_count: u32,
        event: TimedEvent,
    ) -> TimeoutId {
        self.timer.schedule_after(beacon_period.times(bcn_count), event)
    }

    fn mgmt_hdr(&mut self, subtype: u16, addr: MacAddr) -> wlan_common::mac::MgmtHdr {
        let seq_num = self.seq_mgr.next_sns1(&addr);
        mgmt_writer::mgmt_hdr_from_ap(subtype, addr, self.bssid, frame_writer::seq_ctrl(seq_num))
    }

    fn send_wlan_frame(
        &mut self,
        frame: Vec<u8>,
        flags: TxFlags,
        kind: &str,
    ) -> Result<(), Error> {
        self.device
            .send_wlan_frame(frame, flags)
            .map_err(|s| Error::Status(format!("error sending {} frame", kind), s))
    }

    pub fn send_auth_frame(
        &mut self,
        addr: MacAddr,
        auth_alg_num: AuthAlgorithmNumber,
        status_code: StatusCode,
    ) -> Result<(), Error> {
        let hdr = self.mgmt_hdr(MGMT_SUBTYPE_AUTH, addr);
        let frame = frame_writer::write_auth_frame(hdr, auth_alg_num, 2, status_code)?;
        self.send_wlan_frame(frame, TxFlags::NONE, "authentication")
    }

    pub fn send_assoc_resp_frame(
        &mut self,
        addr: MacAddr,
        fields: AssocRespFields<'_>,
    ) -> Result<(), Error> {
        let hdr = self.mgmt_hdr(MGMT_SUBTYPE_ASSOC_RESP, addr);
        let frame = frame_writer::write_assoc_resp_frame(hdr, fields)?;
        self.send_wlan_frame(frame, TxFlags::NONE, "association response")
    }

    pub fn send_deauth_frame(
        &mut self,
        addr: MacAddr,
        reason_code: ReasonCode,
    ) -> Result<(), Error> {
        let hdr = self.mgmt_hdr(MGMT_SUBTYPE_DEAUTH, addr);
        let frame = frame_writer::write_deauth_frame(hdr, reason_code)?;
        self.send_wlan_frame(frame, TxFlags::NONE, "deauthentication")
    }

    pub fn send_disassoc_frame(
        &mut self,
        addr: MacAddr,
        reason_code: ReasonCode,
    ) -> Result<(), Error> {
        let hdr = self.mgmt_hdr(MGMT_SUBTYPE_DISASSOC, addr);
        let frame = frame_writer::write_disassoc_frame(hdr, reason_code)?;
        self.send_wlan_frame(frame, TxFlags::NONE, "disassociation")
    }

    pub fn send_data_frame(
        &mut self,
        dst_addr: MacAddr,
        src_addr: MacAddr,
        protected: bool,
        more_data: bool,
        ether_type: u16,
        payload: &[u8],
    ) -> Result<(), Error> {
        let mut frame_ctrl = FrameControl(0);
        frame_ctrl.set_protected(protected);
        frame_ctrl.set_more_data(more_data);
        let seq_num = self.seq_mgr.next_sns1(&dst_addr);
        let hdr = data_writer::data_hdr_ap_to_client(
            frame_ctrl,
            dst_addr,
            self.bssid,
            src_addr,
            frame_writer::seq_ctrl(seq_num),
        );
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

    /// Answers a class 2 frame from a station that is not authenticated.
    pub fn reject_class2_frame(&mut self, addr: MacAddr) -> Result<(), Error> {
        warn!("class 2 frame from unauthenticated client {:02x?}", addr);
        self.send_mlme_event(MlmeEvent::DeauthenticateInd {
            ind: DeauthenticateIndication {
                peer_sta_address: addr,
                reason_code: ReasonCode::INVALID_CLASS2FRAME,
                locally_initiated: true,
            },
        });
        self.send_deauth_frame(addr, ReasonCode::INVALID_CLASS2FRAME)
    }

    /// Answers a class 3 frame from a station that is authenticated but not associated.
    pub fn reject_class3_frame(&mut self, addr: MacAddr) -> Result<(), Error> {
        warn!("class 3 frame from unassociated client {:02x?}", addr);
        self.send_mlme_event(MlmeEvent::DisassociateInd {
            ind: DisassociateIndication {
                peer_sta_address: addr,
                reason_code: ReasonCode::INVALID_CLASS3FRAME,
                locally_initiated: true,
            },
        });
        self.send_disassoc_frame(addr, ReasonCode::INVALID_CLASS3FRAME)
    }
}

pub struct Ap {
    ctx: Context,
    bss: Option<InfraBss>,
}

fn no_bss() -> Error {
    Error::Status("no BSS is running".to_string(), Status::BAD_STATE)
}

impl Ap {
    pub fn is_started(&self) -> bool {
        self.bss.is_some()
    }

    pub fn bss(&self) -> Option<&InfraBss> {
        self.bss.as_ref()
    }

    fn handle_start(&mut self, req: StartRequest) -> Result<(), Error> {
        let result_code = if self.bss.is_some() {
            warn!("received start request while a BSS is already running");
            StartResultCode::BssAlreadyStartedOrJoined
        } else if req.bss_type != BssType::Infrastructure {
            warn!("refusing to start a {:?} BSS", req.bss_type);
            StartResultCode::NotSupported
        } else {
            match InfraBss::start(&mut self.ctx, req) {
                Ok(bss) => {
                    self.bss = Some(bss);
                    StartResultCode::Success
                }
                Err(e) => {
                    error!("failed to start BSS: {}", e);
                    StartResultCode::InternalError
                }
            }
        };
        self.ctx.send_mlme_event(MlmeEvent::StartConf { resp: StartConfirm { result_code } });
        Ok(())
    }

    fn handle_stop(&mut self, req: StopRequest) -> Result<(), Error> {
        let result = match self.bss.take() {
            None => {
                warn!("received stop request while no BSS is running");
                Ok(StopResultCode::BssAlreadyStopped)
            }
            Some(bss) => {
                if bss.params.ssid != req.ssid {
                    warn!("stop request names SSID {:?}, stopping {:?}", req.ssid, bss.params.ssid);
                }
                bss.stop(&mut self.ctx).map(|()| StopResultCode::Success)
            }
        };
        let result_code = match &result {
            Ok(code) => *code,
            Err(_) => StopResultCode::InternalError,
        };
        self.ctx.send_mlme_event(MlmeEvent::StopConf { resp: StopConfirm { result_code } });
        result.map(|_| ())
    }
}

impl MlmeImpl for Ap {
    type Config = Config;
    type TimerEvent = TimedEvent;

    fn new(config: Config, device: Device, scheduler: Box<dyn Scheduler>) -> Self {
        Self { ctx: Context::new(config, device, TimerManager::new(scheduler)), bss: None }
    }

    fn handle_mlme_request(&mut self, req: MlmeRequest) -> Result<(), Error> {
        let bss = match req {
            MlmeRequest::Start(req) => return self.handle_start(req),
            MlmeRequest::Stop(req) => return self.handle_stop(req),
            MlmeRequest::Join(_) | MlmeRequest::Authenticate(_) | MlmeRequest::Associate(_) => {
                return Err(Error::NotSupported(format!("{} request in AP role", req.name())))
            }
            _ => self.bss.as_mut().ok_or_else(no_bss)?,
        };
        let ctx = &mut self.ctx;
        match req {
            MlmeRequest::AuthenticateResp(resp) => bss.handle_auth_resp(ctx, resp),
            MlmeRequest::AssociateResp(resp) => bss.handle_assoc_resp(ctx, resp),
            MlmeRequest::Deauthenticate(req) => bss.handle_deauth_req(ctx, req),
            MlmeRequest::Disassociate(req) => bss.handle_disassoc_req(ctx, req),
            MlmeRequest::SetKeys(req) => bss.handle_set_keys(ctx, req),
            MlmeRequest::SetControlledPort(req) => bss.handle_set_controlled_port(ctx, req),
            MlmeRequest::Eapol(req) => bss.handle_eapol_req(ctx, req),
            _ => Ok(()),
        }
    }

    fn handle_mac_frame_rx(&mut self, bytes: &[u8], _rx_info: RxInfo) {
        let bss = match self.bss.as_mut() {
            Some(bss) => bss,
            None => {
                warn!("dropping frame received while no BSS is running");
                return;
            }
        };
        let result = match MacFrame::parse(bytes) {
            Some(MacFrame::Mgmt { mgmt_hdr, body, .. }) => {
                bss.handle_mgmt_frame(&mut self.ctx, *mgmt_hdr, body)
            }
            Some(MacFrame::Data { fixed_fields, body, .. }) => {
                bss.handle_data_frame(&mut self.ctx, *fixed_fields, body)
            }
            Some(MacFrame::Unsupported { frame_ctrl }) => {
                warn!("dropping unsupported frame type {}", frame_ctrl.frame_type());
                Ok(())
            }
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
        let bss = self.bss.as_mut().ok_or_else(no_bss)?;
        let frame = EthernetFrame::parse(bytes).ok_or(Error::BufferTooSmall)?;
        let (dst_addr, src_addr) = (frame.hdr.da, frame.hdr.sa);
        bss.handle_eth_frame(&mut self.ctx, dst_addr, src_addr, frame.hdr.ether_type(), frame.body)
    }

    fn handle_timeout(&mut self, now: Time) {
        while let Some((id, event)) = self.ctx.timer.expire_next(now) {
            match self.bss.as_mut() {
                Some(bss) => bss.handle_timed_event(&mut self.ctx, id, event),
                None => info!("ignoring {:?}: no BSS is running", event),
            }
        }
        self.ctx.timer.rearm();
    }

    fn access_device(&mut self) -> &mut Device {
        &mut self.ctx.device
    }
}
