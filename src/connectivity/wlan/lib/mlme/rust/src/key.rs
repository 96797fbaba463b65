// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::sme::{KeyType, SetKeyDescriptor},
    wlan_common::mac::MacAddr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    None,
    Rx,
    Tx,
    RxTx,
}

/// A key as installed on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    pub protection: Protection,
    pub cipher_oui: [u8; 3],
    pub cipher_type: u8,
    pub key_type: KeyType,
    pub peer_addr: MacAddr,
    pub key_idx: u8,
    pub key: Vec<u8>,
    pub rsc: u64,
}

impl From<&SetKeyDescriptor> for KeyConfig {
    fn from(desc: &SetKeyDescriptor) -> Self {
        Self {
            protection: Protection::RxTx,
            cipher_oui: desc.cipher_suite_oui,
            cipher_type: desc.cipher_suite_type,
            key_type: desc.key_type,
            peer_addr: desc.address,
            key_idx: desc.key_id as u8,
            key: desc.key.clone(),
            rsc: desc.rsc,
        }
    }
}
