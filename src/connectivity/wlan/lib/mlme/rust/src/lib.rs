// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! This crate implements IEEE Std 802.11-2016 MLME as a library for hardware that supports
//! SoftMAC. The implementation is divided between client and AP stations, with shared
//! components for timers, association negotiation and frame writing. See the [`client`] and
//! [`ap`] modules.
//!
//! [`ap`]: crate::ap
//! [`client`]: crate::client

pub mod ap;
pub mod assoc_context;
pub mod client;
pub mod device;
pub mod error;
pub mod frame_writer;
pub mod key;
pub mod sme;
pub mod timer;

pub use wlan_common as common;

use {
    anyhow::bail,
    device::{Device, RxInfo},
    error::Error,
    futures::{channel::mpsc, select, StreamExt},
    log::{error, info},
    sme::{MlmeRequest, MlmeRequestStream},
    timer::Scheduler,
    wlan_common::time::Time,
};

pub trait MlmeImpl {
    type Config;
    type TimerEvent;
    fn new(config: Self::Config, device: Device, scheduler: Box<dyn Scheduler>) -> Self;
    fn handle_mlme_request(&mut self, req: MlmeRequest) -> Result<(), Error>;
    fn handle_mac_frame_rx(&mut self, bytes: &[u8], rx_info: RxInfo);
    fn handle_eth_frame_tx(&mut self, bytes: &[u8]) -> Result<(), Error>;
    /// Fires every timeout due at `now`, then re-arms the scheduler.
    fn handle_timeout(&mut self, now: Time);
    fn access_device(&mut self) -> &mut Device;
}

#[derive(Debug)]
pub enum DriverEvent {
    // Indicates that the device is being removed and our main loop should exit.
    Stop,
    // Indicates receipt of a MAC frame from a peer.
    MacFrameRx { bytes: Vec<u8>, rx_info: RxInfo },
    // Requests transmission of an ethernet frame over the air.
    EthFrameTx { bytes: Vec<u8> },
    // The deadline last handed to the scheduler has passed.
    Wake { now: Time },
}

pub async fn mlme_main_loop<T: MlmeImpl>(
    config: T::Config,
    device: Device,
    scheduler: Box<dyn Scheduler>,
    mlme_request_stream: MlmeRequestStream,
    driver_event_stream: mpsc::UnboundedReceiver<DriverEvent>,
) {
    let mlme_impl = T::new(config, device, scheduler);
    let result = main_loop_impl(mlme_impl, mlme_request_stream, driver_event_stream).await;
    match result {
        Ok(()) => info!("MLME event loop exited gracefully."),
        Err(e) => error!("MLME event loop exited with error: {:?}", e),
    }
}

/// Begin processing MLME events.
/// Does not return until iface destruction is requested via DriverEvent::Stop, unless
/// one of the event streams terminates.
async fn main_loop_impl<T: MlmeImpl>(
    mut mlme_impl: T,
    // A stream of requests coming from the parent SME of this MLME.
    mut mlme_request_stream: MlmeRequestStream,
    // A stream of events initiated by the driver.
    mut driver_event_stream: mpsc::UnboundedReceiver<DriverEvent>,
) -> Result<(), anyhow::Error> {
    loop {
        select! {
            // Process requests from SME.
            mlme_request = mlme_request_stream.next() => match mlme_request {
                Some(req) => {
                    let method_name = req.name();
                    if let Err(e) = mlme_impl.handle_mlme_request(req) {
                        info!("Failed to handle mlme {} request: {}", method_name, e);
                    }
                }
                None => bail!("MLME request stream terminated unexpectedly."),
            },
            // Process events from the driver.
            driver_event = driver_event_stream.next() => match driver_event {
                Some(event) => match event {
                    // DriverEvent::Stop indicates a safe shutdown.
                    DriverEvent::Stop => return Ok(()),
                    DriverEvent::MacFrameRx { bytes, rx_info } => {
                        mlme_impl.handle_mac_frame_rx(&bytes[..], rx_info);
                    }
                    DriverEvent::EthFrameTx { bytes } => {
                        if let Err(e) = mlme_impl.handle_eth_frame_tx(&bytes[..]) {
                            info!("Failed to handle eth frame: {}", e);
                        }
                    }
                    DriverEvent::Wake { now } => mlme_impl.handle_timeout(now),
                },
                None => bail!("Driver event stream terminated unexpectedly."),
            },
        }
    }
}
