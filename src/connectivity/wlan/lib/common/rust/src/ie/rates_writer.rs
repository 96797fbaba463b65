// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        appendable::Appendable,
        error::FrameWriteError,
        ie::{
            write_ext_supported_rates, write_supported_rates, IE_MAX_LEN, SUPPORTED_RATES_MAX_LEN,
        },
    },
    zerocopy::ByteSlice,
};

/// Splits a list of rates between the Supported Rates and Extended Supported Rates elements.
pub struct RatesWriter<S>(S);

impl<S: ByteSlice> RatesWriter<S> {
    pub fn try_new(rates: S) -> Result<RatesWriter<S>, FrameWriteError> {
        if rates.len() == 0 {
            Err(FrameWriteError::new_invalid_data("no rates to write"))
        } else if rates.len() > SUPPORTED_RATES_MAX_LEN + IE_MAX_LEN {
            Err(FrameWriteError::new_invalid_data("rates will not fit in elements"))
        } else {
            Ok(RatesWriter(rates))
        }
    }

    pub fn write_supported_rates<B: Appendable + ?Sized>(
        &self,
        buf: &mut B,
    ) -> Result<(), FrameWriteError> {
        let num_rates = std::cmp::min(self.0.len(), SUPPORTED_RATES_MAX_LEN);
        write_supported_rates(buf, &self.0[..num_rates])
    }

    pub fn write_ext_supported_rates<B: Appendable + ?Sized>(
        &self,
        buf: &mut B,
    ) -> Result<(), FrameWriteError> {
        if self.0.len() > SUPPORTED_RATES_MAX_LEN {
            write_ext_supported_rates(buf, &self.0[SUPPORTED_RATES_MAX_LEN..])
        } else {
            Ok(())
        }
    }
}
