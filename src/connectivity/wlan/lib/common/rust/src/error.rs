// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::appendable::BufferTooSmall, thiserror::Error};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameWriteError {
    #[error("Buffer is too small")]
    BufferTooSmall,
    #[error("Attempted to write an invalid frame: {0}")]
    InvalidData(String),
}

impl FrameWriteError {
    pub fn new_invalid_data<S: Into<String>>(msg: S) -> Self {
        FrameWriteError::InvalidData(msg.into())
    }
}

impl From<BufferTooSmall> for FrameWriteError {
    fn from(_error: BufferTooSmall) -> Self {
        FrameWriteError::BufferTooSmall
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Error parsing frame: {0}")]
pub struct FrameParseError(pub(crate) String);

impl FrameParseError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        FrameParseError(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

pub type FrameParseResult<T> = Result<T, FrameParseError>;
