// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::mac::MacAddr, std::collections::HashMap};

/// Sequence numbers are 12 bits wide.
const SEQ_NUM_MODULO: u32 = 1 << 12;

/// Hands out per-receiver sequence numbers for outgoing frames. The first number handed out for
/// a receiver is 1, and numbers wrap around after 4095.
#[derive(Debug, Default)]
pub struct SequenceManager {
    sns1: HashMap<MacAddr, u32>,
}

impl SequenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number for a frame addressed to `addr`.
    pub fn next_sns1(&mut self, addr: &MacAddr) -> u32 {
        let sns = self.sns1.entry(*addr).or_insert(0);
        *sns = (*sns + 1) % SEQ_NUM_MODULO;
        *sns
    }

    /// Forgets the counter for `addr`, e.g. once a peer is released.
    pub fn remove(&mut self, addr: &MacAddr) {
        self.sns1.remove(addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_counters_per_peer() {
        let mut seq_mgr = SequenceManager::new();
        assert_eq!(seq_mgr.next_sns1(&[1; 6]), 1);
        assert_eq!(seq_mgr.next_sns1(&[1; 6]), 2);
        assert_eq!(seq_mgr.next_sns1(&[2; 6]), 1);
        assert_eq!(seq_mgr.next_sns1(&[1; 6]), 3);
    }

    #[test]
    fn wraps_around() {
        let mut seq_mgr = SequenceManager::new();
        for _ in 0..4095 {
            seq_mgr.next_sns1(&[1; 6]);
        }
        assert_eq!(seq_mgr.next_sns1(&[1; 6]), 0);
        assert_eq!(seq_mgr.next_sns1(&[1; 6]), 1);
    }

    #[test]
    fn remove_restarts_counter() {
        let mut seq_mgr = SequenceManager::new();
        seq_mgr.next_sns1(&[1; 6]);
        seq_mgr.remove(&[1; 6]);
        assert_eq!(seq_mgr.next_sns1(&[1; 6]), 1);
    }
}
