// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

/// Exponentially weighted moving average of a signal measurement in dBm (or dB for SNR).
///
/// Measurements arrive as `i8`. Due to integer rounding, small updates to an `i8` average may
/// never move it (avg(-50, -51) rounds to -50, so updates of -51 would never be reflected).
/// The average is therefore kept as an f64.
#[derive(Clone, Debug, PartialEq)]
pub struct EwmaSignal {
    current: f64,
    weighting_factor: f64,
}

impl EwmaSignal {
    pub fn new(n: usize, initial: i8) -> Self {
        Self { current: initial.into(), weighting_factor: n as f64 }
    }

    pub fn value(&self) -> i8 {
        self.current.round() as i8
    }

    // Linear rather than logarithmic averaging.
    pub fn update_average(&mut self, sample: i8) {
        let weight = 2.0 / (1.0 + self.weighting_factor);
        self.current = weight * f64::from(sample) + (1.0 - weight) * self.current
    }
}
