// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {futures::channel::mpsc, log::debug};

#[derive(Debug)]
pub struct UnboundedSink<T> {
    sink: mpsc::UnboundedSender<T>,
}

impl<T> UnboundedSink<T> {
    pub fn new(sink: mpsc::UnboundedSender<T>) -> Self {
        UnboundedSink { sink }
    }

    pub fn send(&self, msg: T) {
        match self.sink.unbounded_send(msg) {
            Ok(()) => {}
            Err(e) => {
                if e.is_full() {
                    panic!("Did not expect an unbounded channel to be full: {:?}", e);
                }
                // If the other side has disconnected, we can still technically function,
                // so only note the drop.
                debug!("receiver gone, dropping message");
            }
        }
    }
}

impl<T> Clone for UnboundedSink<T> {
    fn clone(&self) -> Self {
        UnboundedSink { sink: self.sink.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_after_receiver_dropped_is_ignored() {
        let (sender, receiver) = mpsc::unbounded();
        let sink = UnboundedSink::new(sender);
        sink.send(1u8);
        drop(receiver);
        sink.send(2u8);
    }

    #[test]
    fn send_delivers_in_order() {
        let (sender, mut receiver) = mpsc::unbounded();
        let sink = UnboundedSink::new(sender);
        sink.send(1u8);
        sink.clone().send(2u8);
        assert_eq!(receiver.try_next().unwrap(), Some(1));
        assert_eq!(receiver.try_next().unwrap(), Some(2));
    }
}
