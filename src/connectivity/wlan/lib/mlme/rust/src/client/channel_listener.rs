// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        client::{Client, Context},
        device::Device,
        error::Error,
    },
    log::{debug, info},
    wlan_common::channel::Channel,
};

/// Listeners to channel switches performed on behalf of the client.
pub trait ChannelListener {
    fn device(&mut self) -> &mut Device;

    /// Triggered before switching to a new channel. Emitted even if the channel does not change.
    fn on_pre_switch_channel(&mut self, from: Channel, to: Channel);
    /// Triggered once the device settled on `to`, which is the channel it was already on if the
    /// switch failed.
    fn on_post_switch_channel(&mut self, from: Channel, to: Channel);
}

/// Moves the device to `to`, notifying `listener` around the switch.
pub fn switch_channel<L: ChannelListener>(listener: &mut L, to: Channel) -> Result<(), Error> {
    let from = listener.device().channel();
    listener.on_pre_switch_channel(from, to);
    let result = listener.device().set_channel(to);
    let settled = listener.device().channel();
    listener.on_post_switch_channel(from, settled);
    result.map_err(|s| Error::Status(format!("error switching to channel {:?}", to), s))
}

#[derive(Default)]
pub struct ChannelListenerState {
    /// The channel of the joined BSS, if any.
    pub(crate) main_channel: Option<Channel>,
}

impl ChannelListenerState {
    pub fn bind<'a>(
        &'a mut self,
        ctx: &'a mut Context,
        station: Option<&'a mut Client>,
    ) -> MlmeChannelListener<'a> {
        MlmeChannelListener { state: self, ctx, station }
    }
}

pub struct MlmeChannelListener<'a> {
    state: &'a mut ChannelListenerState,
    ctx: &'a mut Context,
    station: Option<&'a mut Client>,
}

impl<'a> ChannelListener for MlmeChannelListener<'a> {
    fn device(&mut self) -> &mut Device {
        &mut self.ctx.device
    }

    fn on_pre_switch_channel(&mut self, from: Channel, to: Channel) {
        let main_channel = match self.state.main_channel {
            Some(chan) => chan,
            None => return,
        };
        let station = match &mut self.station {
            Some(station) => station,
            None => return,
        };
        // on -> off channel
        if from == main_channel && to != main_channel {
            info!("leaving main channel {:?} for {:?}", main_channel, to);
            station.pre_switch_off_channel(&mut self.ctx);
        }
    }

    fn on_post_switch_channel(&mut self, _from: Channel, to: Channel) {
        let main_channel = match self.state.main_channel {
            Some(chan) => chan,
            None => return,
        };
        let station = match &mut self.station {
            Some(station) => station,
            None => return,
        };
        // off -> on channel, or a failed attempt to leave it
        if to == main_channel {
            debug!("on main channel {:?}", main_channel);
            station.handle_back_on_channel(&mut self.ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{device::FakeDevice, error::Status},
        std::{cell::RefCell, rc::Rc},
        wlan_common::{assert_variant, channel::Cbw},
    };

    #[derive(Debug, PartialEq)]
    enum LEvent {
        PreSwitch { from: Channel, to: Channel },
        PostSwitch { from: Channel, to: Channel },
    }

    struct MockListener<'a> {
        events: Rc<RefCell<Vec<LEvent>>>,
        device: &'a mut Device,
    }

    impl ChannelListener for MockListener<'_> {
        fn device(&mut self) -> &mut Device {
            self.device
        }

        fn on_pre_switch_channel(&mut self, from: Channel, to: Channel) {
            self.events.borrow_mut().push(LEvent::PreSwitch { from, to });
        }

        fn on_post_switch_channel(&mut self, from: Channel, to: Channel) {
            self.events.borrow_mut().push(LEvent::PostSwitch { from, to });
        }
    }

    const MAIN: Channel = Channel { primary: 6, cbw: Cbw::Cbw20 };
    const OTHER: Channel = Channel { primary: 11, cbw: Cbw::Cbw20 };

    #[test]
    fn switch_notifies_around_channel_change() {
        let (mut device, state) = FakeDevice::new();
        state.lock().channel = MAIN;
        let events = Rc::new(RefCell::new(vec![]));
        let mut listener = MockListener { events: Rc::clone(&events), device: &mut device };

        switch_channel(&mut listener, OTHER).expect("switch failed");
        assert_eq!(state.lock().channel, OTHER);
        assert_eq!(
            events.borrow_mut().drain(..).collect::<Vec<_>>(),
            vec![
                LEvent::PreSwitch { from: MAIN, to: OTHER },
                LEvent::PostSwitch { from: MAIN, to: OTHER },
            ]
        );
    }

    #[test]
    fn failed_switch_reports_channel_in_effect() {
        let (mut device, state) = FakeDevice::new();
        state.lock().channel = MAIN;
        state.lock().fail_set_channel = true;
        let events = Rc::new(RefCell::new(vec![]));
        let mut listener = MockListener { events: Rc::clone(&events), device: &mut device };

        let result = switch_channel(&mut listener, OTHER);
        assert_variant!(result, Err(Error::Status(_, Status::IO_REFUSED)));
        assert_eq!(
            events.borrow_mut().drain(..).collect::<Vec<_>>(),
            vec![
                LEvent::PreSwitch { from: MAIN, to: OTHER },
                LEvent::PostSwitch { from: MAIN, to: MAIN },
            ]
        );
    }
}
