// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Crate wlan-common hosts common libraries
//! to be used for WLAN SME, MLME, and binaries written in Rust.

pub mod appendable;
pub mod big_endian;
pub mod channel;
pub mod data_writer;
pub mod error;
pub mod ewma_signal;
pub mod ie;
pub mod mac;
pub mod mgmt_writer;
pub mod sequence;
pub mod sink;
pub mod time;

pub use time::TimeUnit;

/// Asserts that `$e` matches `$variant`, optionally running `$e_block` with the bindings of the
/// matched pattern. Panics with the actual value otherwise.
#[macro_export]
macro_rules! assert_variant {
    ($e:expr, $variant:pat) => {
        $crate::assert_variant!($e, $variant => {})
    };
    ($e:expr, $variant:pat => $e_block:expr) => {
        match $e {
            $variant => $e_block,
            other => panic!("unexpected variant: {:?}", other),
        }
    };
}
