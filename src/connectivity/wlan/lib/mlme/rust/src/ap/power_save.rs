// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {log::warn, std::collections::VecDeque, wlan_common::mac::MacAddr};

/// An outbound MSDU held back while its receiver dozes. The MAC header is built at flush time
/// since the protection and "more data" bits depend on the state at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedFrame {
    pub src_addr: MacAddr,
    pub ether_type: u16,
    pub body: Vec<u8>,
}

/// Per-peer power-save state and its bounded FIFO of pending frames.
#[derive(Debug)]
pub struct PsBuffer {
    dozing: bool,
    frames: VecDeque<BufferedFrame>,
    limit: usize,
}

impl PsBuffer {
    pub fn new(limit: usize) -> Self {
        Self { dozing: false, frames: VecDeque::new(), limit }
    }

    pub fn is_dozing(&self) -> bool {
        self.dozing
    }

    pub fn set_dozing(&mut self, dozing: bool) {
        self.dozing = dozing;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Queues `frame`, dropping the oldest queued frame if the buffer is full.
    pub fn enqueue(&mut self, frame: BufferedFrame) {
        if self.limit == 0 {
            warn!("power-save buffer has no capacity, dropping frame");
            return;
        }
        if self.frames.len() >= self.limit {
            if let Some(dropped) = self.frames.pop_front() {
                warn!(
                    "power-save buffer full ({} frames), dropping oldest frame ({} bytes)",
                    self.limit,
                    dropped.body.len()
                );
            }
        }
        self.frames.push_back(frame);
    }

    /// Removes every queued frame, oldest first.
    pub fn drain(&mut self) -> Vec<BufferedFrame> {
        self.frames.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.dozing = false;
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> BufferedFrame {
        BufferedFrame { src_addr: [tag; 6], ether_type: 0x0800, body: vec![tag] }
    }

    #[test]
    fn drain_is_fifo() {
        let mut buf = PsBuffer::new(8);
        buf.enqueue(frame(1));
        buf.enqueue(frame(2));
        buf.enqueue(frame(3));
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.drain(), vec![frame(1), frame(2), frame(3)]);
        assert!(buf.is_empty());
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let mut buf = PsBuffer::new(2);
        buf.enqueue(frame(1));
        buf.enqueue(frame(2));
        buf.enqueue(frame(3));
        assert_eq!(buf.drain(), vec![frame(2), frame(3)]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut buf = PsBuffer::new(0);
        buf.enqueue(frame(1));
        assert!(buf.is_empty());
    }

    #[test]
    fn clear_wakes_and_empties() {
        let mut buf = PsBuffer::new(4);
        buf.set_dozing(true);
        buf.enqueue(frame(1));
        buf.clear();
        assert!(!buf.is_dozing());
        assert!(buf.is_empty());
    }
}
