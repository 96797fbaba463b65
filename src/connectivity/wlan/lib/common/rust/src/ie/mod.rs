// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod fields;
mod reader;
mod write;

pub mod intersect;
pub mod rates_writer;

pub use {fields::*, reader::*, write::*};

use {
    crate::error::{FrameParseError, FrameParseResult},
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

pub const IE_MAX_LEN: usize = 255;
pub const SSID_MAX_LEN: usize = 32;
pub const SUPPORTED_RATES_MAX_LEN: usize = 8;

#[repr(C)]
#[derive(AsBytes, FromBytes, Unaligned, PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct Id(pub u8);

// IEEE Std 802.11-2016, 9.4.2.1, Table 9-77
impl Id {
    pub const SSID: Self = Self(0);
    pub const SUPPORTED_RATES: Self = Self(1);
    pub const DSSS_PARAM_SET: Self = Self(3);
    pub const TIM: Self = Self(5);
    pub const COUNTRY: Self = Self(7);
    pub const HT_CAPABILITIES: Self = Self(45);
    pub const RSNE: Self = Self(48);
    pub const EXT_SUPPORTED_RATES: Self = Self(50);
    pub const HT_OPERATION: Self = Self(61);
    pub const VHT_CAPABILITIES: Self = Self(191);
    pub const VHT_OPERATION: Self = Self(192);
    pub const VENDOR_SPECIFIC: Self = Self(221);
    pub const EXTENSION: Self = Self(255);
}

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct Header {
    pub id: Id,
    pub body_len: u8,
}

pub fn parse_ssid<B: ByteSlice>(raw_body: B) -> FrameParseResult<B> {
    if raw_body.len() > SSID_MAX_LEN {
        Err(FrameParseError::new(format!(
            "SSID is too long (max: {} bytes, got: {})",
            SSID_MAX_LEN,
            raw_body.len()
        )))
    } else {
        Ok(raw_body)
    }
}

pub fn parse_supported_rates<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, [SupportedRate]>> {
    if raw_body.is_empty() {
        return Err(FrameParseError::new("Empty Supported Rates element"));
    }
    if raw_body.len() > SUPPORTED_RATES_MAX_LEN {
        return Err(FrameParseError::new("Too many Supported Rates"));
    }
    LayoutVerified::new_slice_unaligned(raw_body)
        .ok_or_else(|| FrameParseError::new("Invalid Supported Rates element"))
}

pub fn parse_extended_supported_rates<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, [SupportedRate]>> {
    if raw_body.is_empty() {
        return Err(FrameParseError::new("Empty Extended Supported Rates element"));
    }
    LayoutVerified::new_slice_unaligned(raw_body)
        .ok_or_else(|| FrameParseError::new("Invalid Extended Supported Rates element"))
}

fn parse_fixed<B: ByteSlice, T: FromBytes + Unaligned>(
    raw_body: B,
    name: &str,
) -> FrameParseResult<LayoutVerified<B, T>> {
    LayoutVerified::new_unaligned(raw_body)
        .ok_or_else(|| FrameParseError::new(format!("Invalid length of {} element", name)))
}

pub fn parse_ht_capabilities<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, HtCapabilities>> {
    parse_fixed(raw_body, "HT Capabilities")
}

pub fn parse_ht_operation<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, HtOperation>> {
    parse_fixed(raw_body, "HT Operation")
}

pub fn parse_vht_capabilities<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, VhtCapabilities>> {
    parse_fixed(raw_body, "VHT Capabilities")
}

pub fn parse_vht_operation<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, VhtOperation>> {
    parse_fixed(raw_body, "VHT Operation")
}
