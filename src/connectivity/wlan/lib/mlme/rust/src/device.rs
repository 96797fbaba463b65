// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        assoc_context::{AssociationContext, StaCapabilities},
        error::Status,
        key::KeyConfig,
        sme::{ControlledPortState, MlmeEvent, MlmeEventSink},
    },
    log::error,
    wlan_common::{
        channel::Channel,
        ie::{HtCapabilities, SupportedRate, VhtCapabilities},
        mac::{Bssid, CapabilityInfo, MacAddr},
        TimeUnit,
    },
};

#[cfg(test)]
pub use test_utils::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus(u8);
impl LinkStatus {
    pub const DOWN: Self = Self(0);
    pub const UP: Self = Self(1);
}

impl From<ControlledPortState> for LinkStatus {
    fn from(state: ControlledPortState) -> Self {
        match state {
            ControlledPortState::Open => Self::UP,
            ControlledPortState::Closed => Self::DOWN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxFlags(pub u32);
impl TxFlags {
    pub const NONE: Self = Self(0);
    pub const PROTECTED: Self = Self(1);
    pub const FAVOR_RELIABILITY: Self = Self(1 << 1);
}

/// Metadata the driver attaches to a received frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RxInfo {
    pub channel: Channel,
    pub rssi_dbm: i8,
    pub snr_db: i8,
}

/// Identity and capabilities of the local interface.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub sta_addr: MacAddr,
    pub capability_info: CapabilityInfo,
    pub rates: Vec<SupportedRate>,
    pub ht_cap: Option<HtCapabilities>,
    pub vht_cap: Option<VhtCapabilities>,
}

impl DeviceInfo {
    pub fn capabilities(&self) -> StaCapabilities {
        StaCapabilities {
            capability_info: self.capability_info,
            rates: self.rates.clone(),
            ht_cap: self.ht_cap,
            vht_cap: self.vht_cap,
        }
    }
}

/// BSS parameters pushed to the device when an AP starts or a client joins.
#[derive(Debug, Clone, PartialEq)]
pub struct BssConfig {
    pub bssid: Bssid,
    /// False if the BSS is hosted by this device.
    pub remote: bool,
    pub beacon_period: TimeUnit,
    pub channel: Channel,
}

/// This trait abstracts how the driver performs operations, so tests can substitute a fake
/// without mocking the driver itself.
pub trait DeviceOps {
    fn info(&self) -> DeviceInfo;
    /// Delivers an Ethernet II frame to the network stack.
    fn deliver_eth_frame(&mut self, frame: &[u8]) -> Result<(), Status>;
    /// Transmits a fully formed MAC frame over the air.
    fn send_wlan_frame(&mut self, frame: Vec<u8>, flags: TxFlags) -> Result<(), Status>;
    fn channel(&self) -> Channel;
    fn set_channel(&mut self, channel: Channel) -> Result<(), Status>;
    fn set_key(&mut self, key: KeyConfig) -> Result<(), Status>;
    fn configure_bss(&mut self, config: BssConfig) -> Result<(), Status>;
    fn clear_bss(&mut self) -> Result<(), Status>;
    fn set_eth_link(&mut self, status: LinkStatus) -> Result<(), Status>;
    fn configure_assoc(&mut self, assoc_ctx: AssociationContext) -> Result<(), Status>;
    fn clear_assoc(&mut self, addr: &MacAddr) -> Result<(), Status>;
}

/// A `Device` allows transmitting frames and MLME messages.
pub struct Device {
    ops: Box<dyn DeviceOps>,
    event_sink: MlmeEventSink,
}

impl Device {
    pub fn new(ops: Box<dyn DeviceOps>, event_sink: MlmeEventSink) -> Self {
        Self { ops, event_sink }
    }

    pub fn send_mlme_event(&self, event: MlmeEvent) {
        self.event_sink.send(event)
    }

    pub fn info(&self) -> DeviceInfo {
        self.ops.info()
    }

    pub fn deliver_eth_frame(&mut self, frame: &[u8]) -> Result<(), Status> {
        self.ops.deliver_eth_frame(frame)
    }

    pub fn send_wlan_frame(&mut self, frame: Vec<u8>, flags: TxFlags) -> Result<(), Status> {
        self.ops.send_wlan_frame(frame, flags)
    }

    pub fn channel(&self) -> Channel {
        self.ops.channel()
    }

    pub fn set_channel(&mut self, channel: Channel) -> Result<(), Status> {
        self.ops.set_channel(channel)
    }

    pub fn set_key(&mut self, key: KeyConfig) -> Result<(), Status> {
        self.ops.set_key(key)
    }

    pub fn configure_bss(&mut self, config: BssConfig) -> Result<(), Status> {
        self.ops.configure_bss(config)
    }

    pub fn clear_bss(&mut self) -> Result<(), Status> {
        self.ops.clear_bss()
    }

    pub fn set_eth_link(&mut self, status: LinkStatus) -> Result<(), Status> {
        self.ops.set_eth_link(status)
    }

    pub fn set_eth_link_up(&mut self) -> Result<(), Status> {
        self.ops.set_eth_link(LinkStatus::UP)
    }

    pub fn set_eth_link_down(&mut self) -> Result<(), Status> {
        self.ops.set_eth_link(LinkStatus::DOWN)
    }

    pub fn configure_assoc(&mut self, assoc_ctx: AssociationContext) -> Result<(), Status> {
        self.ops.configure_assoc(assoc_ctx)
    }

    /// Failures are logged: clearing is part of teardown and never stops it.
    pub fn clear_assoc(&mut self, addr: &MacAddr) {
        if let Err(status) = self.ops.clear_assoc(addr) {
            error!("failed to clear association context for {:02x?}: {}", addr, status);
        }
    }
}

#[cfg(test)]
mod test_utils {
    use {
        super::*,
        crate::{
            assoc_context::test_utils::{fake_ht_capabilities, fake_rates},
            sme::MlmeEventStream,
        },
        futures::channel::mpsc,
        parking_lot::Mutex,
        std::{collections::HashMap, sync::Arc},
        wlan_common::{channel::Cbw, sink::UnboundedSink},
    };

    pub const FAKE_STA_ADDR: MacAddr = [0x02, 7, 7, 7, 7, 7];

    pub struct FakeDeviceState {
        pub info: DeviceInfo,
        pub eth_queue: Vec<Vec<u8>>,
        pub wlan_queue: Vec<(Vec<u8>, TxFlags)>,
        pub channel: Channel,
        pub keys: Vec<KeyConfig>,
        pub bss_cfg: Option<BssConfig>,
        pub link_status: LinkStatus,
        pub assocs: HashMap<MacAddr, AssociationContext>,
        pub mlme_event_stream: MlmeEventStream,
        pub fail_wlan_tx: bool,
        pub fail_set_channel: bool,
        pub fail_set_key: bool,
        pub fail_configure_assoc: bool,
    }

    impl FakeDeviceState {
        pub fn next_mlme_event(&mut self) -> Option<MlmeEvent> {
            self.mlme_event_stream.try_next().ok().flatten()
        }

        pub fn drain_mlme_events(&mut self) -> Vec<MlmeEvent> {
            std::iter::from_fn(|| self.next_mlme_event()).collect()
        }

        pub fn reset(&mut self) {
            self.eth_queue.clear();
            self.wlan_queue.clear();
        }
    }

    /// Wrapper struct that can share mutable access to the internal FakeDeviceState.
    #[derive(Clone)]
    pub struct FakeDevice {
        state: Arc<Mutex<FakeDeviceState>>,
    }

    impl FakeDevice {
        /// Returns a `Device` backed by a fake driver, and the state the fake records into.
        pub fn new() -> (Device, Arc<Mutex<FakeDeviceState>>) {
            let (event_sink, mlme_event_stream) = mpsc::unbounded();
            let state = Arc::new(Mutex::new(FakeDeviceState {
                info: fake_device_info(),
                eth_queue: vec![],
                wlan_queue: vec![],
                channel: Channel::new(0, Cbw::Cbw20),
                keys: vec![],
                bss_cfg: None,
                link_status: LinkStatus::DOWN,
                assocs: HashMap::new(),
                mlme_event_stream,
                fail_wlan_tx: false,
                fail_set_channel: false,
                fail_set_key: false,
                fail_configure_assoc: false,
            }));
            let fake = FakeDevice { state: state.clone() };
            (Device::new(Box::new(fake), UnboundedSink::new(event_sink)), state)
        }
    }

    pub fn fake_device_info() -> DeviceInfo {
        let mut capability_info = CapabilityInfo(0);
        capability_info.set_short_preamble(true);
        DeviceInfo {
            sta_addr: FAKE_STA_ADDR,
            capability_info,
            rates: fake_rates(),
            ht_cap: Some(fake_ht_capabilities()),
            vht_cap: None,
        }
    }

    impl DeviceOps for FakeDevice {
        fn info(&self) -> DeviceInfo {
            self.state.lock().info.clone()
        }

        fn deliver_eth_frame(&mut self, frame: &[u8]) -> Result<(), Status> {
            self.state.lock().eth_queue.push(frame.to_vec());
            Ok(())
        }

        fn send_wlan_frame(&mut self, frame: Vec<u8>, flags: TxFlags) -> Result<(), Status> {
            let mut state = self.state.lock();
            if state.fail_wlan_tx {
                return Err(Status::IO);
            }
            state.wlan_queue.push((frame, flags));
            Ok(())
        }

        fn channel(&self) -> Channel {
            self.state.lock().channel
        }

        fn set_channel(&mut self, channel: Channel) -> Result<(), Status> {
            let mut state = self.state.lock();
            if state.fail_set_channel {
                return Err(Status::IO_REFUSED);
            }
            state.channel = channel;
            Ok(())
        }

        fn set_key(&mut self, key: KeyConfig) -> Result<(), Status> {
            let mut state = self.state.lock();
            if state.fail_set_key {
                return Err(Status::INTERNAL);
            }
            state.keys.push(key);
            Ok(())
        }

        fn configure_bss(&mut self, config: BssConfig) -> Result<(), Status> {
            self.state.lock().bss_cfg.replace(config);
            Ok(())
        }

        fn clear_bss(&mut self) -> Result<(), Status> {
            self.state.lock().bss_cfg.take();
            Ok(())
        }

        fn set_eth_link(&mut self, status: LinkStatus) -> Result<(), Status> {
            self.state.lock().link_status = status;
            Ok(())
        }

        fn configure_assoc(&mut self, assoc_ctx: AssociationContext) -> Result<(), Status> {
            let mut state = self.state.lock();
            if state.fail_configure_assoc {
                return Err(Status::INTERNAL);
            }
            state.assocs.insert(assoc_ctx.peer_addr, assoc_ctx);
            Ok(())
        }

        fn clear_assoc(&mut self, addr: &MacAddr) -> Result<(), Status> {
            self.state.lock().assocs.remove(addr);
            Ok(())
        }
    }
}
