// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {std::time::Duration, wlan_common::TimeUnit};

/// Counts the on-channel time during which the associated BSS has not been heard from. Used to
/// decide when to trigger auto deauth.
#[derive(Debug)]
pub struct LostBssCounter {
    /// Time without a beacon after which the BSS is declared lost.
    full_timeout: Duration,

    /// Reset to zero as soon as a beacon is seen.
    time_since_last_beacon: Duration,
}

/// Time is added whenever the association status check fires, and when the client leaves the
/// channel. Time spent off-channel is never added since no beacon could have been received.
impl LostBssCounter {
    pub fn start(beacon_period: TimeUnit, full_timeout_beacon_count: u32) -> Self {
        Self {
            full_timeout: beacon_period.times(full_timeout_beacon_count),
            time_since_last_beacon: Duration::from_nanos(0),
        }
    }

    pub fn reset(&mut self) {
        self.time_since_last_beacon = Duration::from_nanos(0);
    }

    pub fn should_deauthenticate(&self) -> bool {
        self.time_since_last_beacon >= self.full_timeout
    }

    pub fn add_time(&mut self, time: Duration) {
        self.time_since_last_beacon += time;
    }

    pub fn time_since_last_beacon(&self) -> Duration {
        self.time_since_last_beacon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BEACON_PERIOD: TimeUnit = TimeUnit(42);
    const TEST_TIMEOUT_BCN_COUNT: u32 = 1000;

    #[test]
    fn single_uninterrupted_period() {
        let mut counter = LostBssCounter::start(TEST_BEACON_PERIOD, TEST_TIMEOUT_BCN_COUNT);
        // about to timeout but not yet.
        counter.add_time(TEST_BEACON_PERIOD.times(TEST_TIMEOUT_BCN_COUNT - 1));
        assert!(!counter.should_deauthenticate());
        // any more time will trigger auto deauth
        counter.add_time(TEST_BEACON_PERIOD.times(1));
        assert!(counter.should_deauthenticate());
    }

    #[test]
    fn beacon_received_midway() {
        let mut counter = LostBssCounter::start(TEST_BEACON_PERIOD, TEST_TIMEOUT_BCN_COUNT);
        counter.add_time(TEST_BEACON_PERIOD.times(TEST_TIMEOUT_BCN_COUNT - 1));
        assert!(!counter.should_deauthenticate());

        // Beacon received some time later, resetting the timeout.
        counter.reset();
        assert_eq!(counter.time_since_last_beacon(), Duration::from_nanos(0));

        counter.add_time(TEST_BEACON_PERIOD.times(1));
        assert!(!counter.should_deauthenticate());
        // But if no beacon is received for a full timeout, auto-deauth will trigger
        counter.add_time(TEST_BEACON_PERIOD.times(TEST_TIMEOUT_BCN_COUNT - 1));
        assert!(counter.should_deauthenticate());
    }

    #[test]
    fn partial_intervals_add_up() {
        let mut counter = LostBssCounter::start(TEST_BEACON_PERIOD, TEST_TIMEOUT_BCN_COUNT);
        counter.add_time(
            TEST_BEACON_PERIOD.times(TEST_TIMEOUT_BCN_COUNT) - Duration::from_nanos(1),
        );
        assert!(!counter.should_deauthenticate());
        counter.add_time(Duration::from_nanos(1));
        assert!(counter.should_deauthenticate());
    }
}
