// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    byteorder::{BigEndian, ByteOrder},
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BigEndianU16(pub [u8; 2]);

impl BigEndianU16 {
    pub fn from_native(native: u16) -> Self {
        let mut buf = [0, 0];
        BigEndian::write_u16(&mut buf, native);
        BigEndianU16(buf)
    }

    pub fn to_native(&self) -> u16 {
        BigEndian::read_u16(&self.0)
    }

    pub fn set_from_native(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.0, value);
    }
}
