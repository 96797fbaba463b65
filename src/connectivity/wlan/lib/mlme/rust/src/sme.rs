// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Messages exchanged with the SME. Requests flow into the MLME through an unbounded stream;
//! confirms and indications flow back through an `MlmeEventSink`.

use {
    crate::error::Status,
    futures::channel::mpsc,
    wlan_common::{
        channel::Channel,
        ie::{HtCapabilities, HtOperation, SupportedRate, VhtCapabilities, VhtOperation},
        mac::{AuthAlgorithmNumber, Bssid, CapabilityInfo, MacAddr, ReasonCode},
        sink::UnboundedSink,
        TimeUnit,
    },
};

pub type MlmeEventSink = UnboundedSink<MlmeEvent>;
pub type MlmeEventStream = mpsc::UnboundedReceiver<MlmeEvent>;
pub type MlmeRequestStream = mpsc::UnboundedReceiver<MlmeRequest>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationType {
    OpenSystem,
    SharedKey,
    FastBssTransition,
    Sae,
}

impl AuthenticationType {
    pub fn from_auth_alg_num(auth_alg_num: AuthAlgorithmNumber) -> Option<Self> {
        match auth_alg_num {
            AuthAlgorithmNumber::OPEN => Some(Self::OpenSystem),
            AuthAlgorithmNumber::SHARED_KEY => Some(Self::SharedKey),
            AuthAlgorithmNumber::FAST_BSS_TRANSITION => Some(Self::FastBssTransition),
            AuthAlgorithmNumber::SAE => Some(Self::Sae),
            _ => None,
        }
    }

    pub fn auth_alg_num(self) -> AuthAlgorithmNumber {
        match self {
            Self::OpenSystem => AuthAlgorithmNumber::OPEN,
            Self::SharedKey => AuthAlgorithmNumber::SHARED_KEY,
            Self::FastBssTransition => AuthAlgorithmNumber::FAST_BSS_TRANSITION,
            Self::Sae => AuthAlgorithmNumber::SAE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlledPortState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BssType {
    Infrastructure,
    Independent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartResultCode {
    Success,
    BssAlreadyStartedOrJoined,
    NotSupported,
    InternalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopResultCode {
    Success,
    BssAlreadyStopped,
    InternalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinResultCode {
    Success,
    JoinFailureTimeout,
    InternalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticateResultCode {
    Success,
    Refused,
    AuthenticationRejected,
    AuthFailureTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociateResultCode {
    Success,
    RefusedReasonUnspecified,
    RefusedNotAuthenticated,
    RefusedCapabilitiesMismatch,
    RefusedExternalReason,
    RefusedApOutOfMemory,
    RefusedBasicRatesMismatch,
    RefusedTemporarily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EapolResultCode {
    Success,
    TransmissionFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Group,
    Pairwise,
    PeerKey,
    Igtk,
}

/// The BSS a client joins, as found by a scan performed elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct BssDescription {
    pub bssid: Bssid,
    pub ssid: Vec<u8>,
    pub bss_type: BssType,
    pub beacon_period: TimeUnit,
    pub channel: Channel,
    pub capability_info: CapabilityInfo,
    pub rates: Vec<SupportedRate>,
    pub ht_cap: Option<HtCapabilities>,
    pub ht_op: Option<HtOperation>,
    pub vht_cap: Option<VhtCapabilities>,
    pub vht_op: Option<VhtOperation>,
    pub rsne: Option<Vec<u8>>,
}

impl BssDescription {
    pub fn is_protected(&self) -> bool {
        self.rsne.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartRequest {
    pub ssid: Vec<u8>,
    pub bss_type: BssType,
    pub beacon_period: TimeUnit,
    pub dtim_period: u8,
    pub channel: Channel,
    pub rates: Vec<SupportedRate>,
    pub rsne: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopRequest {
    pub ssid: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub selected_bss: BssDescription,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticateRequest {
    pub peer_sta_address: MacAddr,
    pub auth_type: AuthenticationType,
    /// In beacon periods.
    pub auth_failure_timeout: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticateResponse {
    pub peer_sta_address: MacAddr,
    pub auth_type: AuthenticationType,
    pub result_code: AuthenticateResultCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociateRequest {
    pub peer_sta_address: MacAddr,
    pub capability_info: CapabilityInfo,
    pub listen_interval: u16,
    pub rates: Vec<SupportedRate>,
    pub ht_cap: Option<HtCapabilities>,
    pub vht_cap: Option<VhtCapabilities>,
    pub rsne: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociateResponse {
    pub peer_sta_address: MacAddr,
    pub result_code: AssociateResultCode,
    pub association_id: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeauthenticateRequest {
    pub peer_sta_address: MacAddr,
    pub reason_code: ReasonCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisassociateRequest {
    pub peer_sta_address: MacAddr,
    pub reason_code: ReasonCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetKeyDescriptor {
    pub key: Vec<u8>,
    pub key_id: u16,
    pub key_type: KeyType,
    pub address: MacAddr,
    pub rsc: u64,
    pub cipher_suite_oui: [u8; 3],
    pub cipher_suite_type: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetKeysRequest {
    pub keylist: Vec<SetKeyDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetControlledPortRequest {
    pub peer_sta_address: MacAddr,
    pub state: ControlledPortState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EapolRequest {
    pub src_addr: MacAddr,
    pub dst_addr: MacAddr,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MlmeRequest {
    Start(StartRequest),
    Stop(StopRequest),
    Join(JoinRequest),
    Authenticate(AuthenticateRequest),
    AuthenticateResp(AuthenticateResponse),
    Associate(AssociateRequest),
    AssociateResp(AssociateResponse),
    Deauthenticate(DeauthenticateRequest),
    Disassociate(DisassociateRequest),
    SetKeys(SetKeysRequest),
    SetControlledPort(SetControlledPortRequest),
    Eapol(EapolRequest),
}

impl MlmeRequest {
    pub fn name(&self) -> &'static str {
        match self {
            MlmeRequest::Start(_) => "start",
            MlmeRequest::Stop(_) => "stop",
            MlmeRequest::Join(_) => "join",
            MlmeRequest::Authenticate(_) => "authenticate",
            MlmeRequest::AuthenticateResp(_) => "authenticate_resp",
            MlmeRequest::Associate(_) => "associate",
            MlmeRequest::AssociateResp(_) => "associate_resp",
            MlmeRequest::Deauthenticate(_) => "deauthenticate",
            MlmeRequest::Disassociate(_) => "disassociate",
            MlmeRequest::SetKeys(_) => "set_keys",
            MlmeRequest::SetControlledPort(_) => "set_controlled_port",
            MlmeRequest::Eapol(_) => "eapol",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartConfirm {
    pub result_code: StartResultCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopConfirm {
    pub result_code: StopResultCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinConfirm {
    pub result_code: JoinResultCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticateConfirm {
    pub peer_sta_address: MacAddr,
    pub auth_type: AuthenticationType,
    pub result_code: AuthenticateResultCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticateIndication {
    pub peer_sta_address: MacAddr,
    pub auth_type: AuthenticationType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociateConfirm {
    pub result_code: AssociateResultCode,
    pub association_id: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociateIndication {
    pub peer_sta_address: MacAddr,
    pub capability_info: CapabilityInfo,
    pub listen_interval: u16,
    pub ssid: Option<Vec<u8>>,
    pub rates: Vec<SupportedRate>,
    pub rsne: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeauthenticateConfirm {
    pub peer_sta_address: MacAddr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeauthenticateIndication {
    pub peer_sta_address: MacAddr,
    pub reason_code: ReasonCode,
    /// True when the MLME itself decided to deauthenticate, e.g. after losing the BSS.
    pub locally_initiated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisassociateConfirm {
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisassociateIndication {
    pub peer_sta_address: MacAddr,
    pub reason_code: ReasonCode,
    pub locally_initiated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetKeyResult {
    pub key_id: u16,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetKeysConfirm {
    pub results: Vec<SetKeyResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EapolConfirm {
    pub result_code: EapolResultCode,
    pub dst_addr: MacAddr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EapolIndication {
    pub src_addr: MacAddr,
    pub dst_addr: MacAddr,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalReportIndication {
    pub rssi_dbm: i8,
    pub snr_db: i8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MlmeEvent {
    StartConf { resp: StartConfirm },
    StopConf { resp: StopConfirm },
    JoinConf { resp: JoinConfirm },
    AuthenticateConf { resp: AuthenticateConfirm },
    AuthenticateInd { ind: AuthenticateIndication },
    AssociateConf { resp: AssociateConfirm },
    AssociateInd { ind: AssociateIndication },
    DeauthenticateConf { resp: DeauthenticateConfirm },
    DeauthenticateInd { ind: DeauthenticateIndication },
    DisassociateConf { resp: DisassociateConfirm },
    DisassociateInd { ind: DisassociateIndication },
    SetKeysConf { conf: SetKeysConfirm },
    EapolConf { resp: EapolConfirm },
    EapolInd { ind: EapolIndication },
    SignalReport { ind: SignalReportIndication },
}
