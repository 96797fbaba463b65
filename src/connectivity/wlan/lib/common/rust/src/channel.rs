// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::fmt;

/// Channel bandwidth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cbw {
    Cbw20,
    Cbw40,
    Cbw40Below,
    Cbw80,
    Cbw160,
    Cbw80P80 { secondary80: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Channel {
    pub primary: u8,
    pub cbw: Cbw,
}

impl Channel {
    pub fn new(primary: u8, cbw: Cbw) -> Self {
        Self { primary, cbw }
    }

    pub fn is_2ghz(&self) -> bool {
        self.primary >= 1 && self.primary <= 14
    }

    pub fn is_5ghz(&self) -> bool {
        self.primary > 14
    }

    /// A channel wider than 20 MHz carries a secondary 20 MHz channel above or below the primary.
    pub fn has_secondary_channel(&self) -> bool {
        self.cbw != Cbw::Cbw20
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cbw {
            Cbw::Cbw20 => write!(f, "{}", self.primary),
            Cbw::Cbw40 => write!(f, "{}+", self.primary),
            Cbw::Cbw40Below => write!(f, "{}-", self.primary),
            Cbw::Cbw80 => write!(f, "{}V", self.primary),
            Cbw::Cbw160 => write!(f, "{}W", self.primary),
            Cbw::Cbw80P80 { secondary80 } => write!(f, "{}+{}P", self.primary, secondary80),
        }
    }
}
