// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::fmt,
    thiserror::Error,
    wlan_common::{
        appendable::BufferTooSmall,
        error::{FrameParseError, FrameWriteError},
    },
};

/// Status code reported by the driver for a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(i32);

impl Status {
    pub const OK: Self = Self(0);
    pub const INTERNAL: Self = Self(-1);
    pub const NOT_SUPPORTED: Self = Self(-2);
    pub const NO_RESOURCES: Self = Self(-3);
    pub const INVALID_ARGS: Self = Self(-10);
    pub const BAD_STATE: Self = Self(-20);
    pub const NOT_FOUND: Self = Self(-25);
    pub const BUFFER_TOO_SMALL: Self = Self(-15);
    pub const IO: Self = Self(-40);
    pub const IO_REFUSED: Self = Self(-41);
    pub const IO_INVALID: Self = Self(-42);

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> i32 {
        self.0
    }

    /// Converts a raw driver return value into a `Result`.
    pub fn ok(raw: i32) -> Result<(), Status> {
        if raw == Self::OK.0 {
            Ok(())
        } else {
            Err(Self(raw))
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::OK => "OK",
            Self::INTERNAL => "INTERNAL",
            Self::NOT_SUPPORTED => "NOT_SUPPORTED",
            Self::NO_RESOURCES => "NO_RESOURCES",
            Self::INVALID_ARGS => "INVALID_ARGS",
            Self::BAD_STATE => "BAD_STATE",
            Self::NOT_FOUND => "NOT_FOUND",
            Self::BUFFER_TOO_SMALL => "BUFFER_TOO_SMALL",
            Self::IO => "IO",
            Self::IO_REFUSED => "IO_REFUSED",
            Self::IO_INVALID => "IO_INVALID",
            Self(raw) => return write!(f, "status {}", raw),
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("provided buffer to small")]
    BufferTooSmall,
    #[error("error parsing frame: {0}")]
    ParsingFrame(#[source] FrameParseError),
    #[error("error writing frame: {0}")]
    WritingFrame(#[source] FrameWriteError),
    #[error("{0}")]
    Internal(#[source] anyhow::Error),
    #[error("{0}; {1}")]
    Status(String, Status),
    #[error("operation not supported: {0}")]
    NotSupported(String),
}

impl From<Error> for Status {
    fn from(e: Error) -> Self {
        match e {
            Error::BufferTooSmall => Status::BUFFER_TOO_SMALL,
            Error::Internal(_) => Status::INTERNAL,
            Error::ParsingFrame(_) => Status::IO_INVALID,
            Error::WritingFrame(_) => Status::IO_REFUSED,
            Error::Status(_, status) => status,
            Error::NotSupported(_) => Status::NOT_SUPPORTED,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Internal(e)
    }
}

impl From<FrameParseError> for Error {
    fn from(e: FrameParseError) -> Self {
        Error::ParsingFrame(e)
    }
}

impl From<FrameWriteError> for Error {
    fn from(e: FrameWriteError) -> Self {
        Error::WritingFrame(e)
    }
}

impl From<BufferTooSmall> for Error {
    fn from(_: BufferTooSmall) -> Self {
        Error::BufferTooSmall
    }
}

#[cfg(test)]
mod tests {
    use {super::*, anyhow::format_err};

    #[test]
    fn test_error_into_status() {
        let status = Status::from(Error::Status("foo".to_string(), Status::OK));
        assert_eq!(status, Status::OK);

        let status = Status::from(Error::Status("foo".to_string(), Status::NOT_SUPPORTED));
        assert_eq!(status, Status::NOT_SUPPORTED);

        let status = Status::from(Error::Internal(format_err!("lorem")));
        assert_eq!(status, Status::INTERNAL);

        let status = Status::from(Error::WritingFrame(FrameWriteError::BufferTooSmall));
        assert_eq!(status, Status::IO_REFUSED);

        let status = Status::from(Error::from(BufferTooSmall));
        assert_eq!(status, Status::BUFFER_TOO_SMALL);

        let status = Status::from(Error::from(FrameParseError::new("truncated")));
        assert_eq!(status, Status::IO_INVALID);
    }

    #[test]
    fn test_raw_status() {
        assert_eq!(Status::ok(0), Ok(()));
        assert_eq!(Status::ok(-40), Err(Status::IO));
        assert_eq!(Status::from_raw(-2).into_raw(), -2);
        assert_eq!(format!("{}", Status::BAD_STATE), "BAD_STATE");
        assert_eq!(format!("{}", Status::from_raw(-99)), "status -99");
    }

    #[test]
    fn test_error_display() {
        let e = Error::Status("error setting channel".to_string(), Status::IO);
        assert_eq!(format!("{}", e), "error setting channel; IO");
    }
}
