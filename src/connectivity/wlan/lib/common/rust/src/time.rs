// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::{
    convert::TryFrom,
    ops::{Add, Sub},
    time::Duration,
};

/// Representation of N IEEE 802.11 TimeUnits.
/// A TimeUnit is defined as 1024 micro seconds.
/// Note: Be careful with arithmetic operations on a TimeUnit. A TimeUnit is limited to 2 octets
/// and can easily overflow. However, there is usually no need to ever work with TUs > 0xFFFF.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeUnit(pub u16);

impl TimeUnit {
    pub const DEFAULT_BEACON_INTERVAL: Self = Self(100);

    pub fn into_micros(self) -> u64 {
        self.0 as u64 * 1024
    }

    /// Length of `count` consecutive periods of this many TUs.
    pub fn times(self, count: u32) -> Duration {
        Duration::from(self) * count
    }
}

impl From<TimeUnit> for Duration {
    fn from(tu: TimeUnit) -> Duration {
        Duration::from_micros(tu.into_micros())
    }
}

/// A point on the monotonic clock, in nanoseconds since an arbitrary origin.
/// The origin is owned by whoever drives the clock (the driver in production, a fake scheduler
/// in tests); all comparisons only make sense between times from the same clock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(i64);

impl Time {
    pub const INFINITE_PAST: Self = Self(i64::MIN);

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn into_nanos(self) -> i64 {
        self.0
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn duration_since(self, earlier: Time) -> Duration {
        if self.0 <= earlier.0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos((i128::from(self.0) - i128::from(earlier.0)) as u64)
        }
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, d: Duration) -> Time {
        let nanos = i64::try_from(d.as_nanos()).unwrap_or(i64::MAX);
        Time(self.0.saturating_add(nanos))
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, earlier: Time) -> Duration {
        self.duration_since(earlier)
    }
}
