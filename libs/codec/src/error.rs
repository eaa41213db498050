//! Codec errors
//!
//! Decode errors carry the dotted document path of the offending field so a
//! skipped record can be diagnosed from the log line alone.

use thiserror::Error;

/// Result alias for document decoding
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Failure to turn one raw store document into a position record
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// Field absent or explicitly null
    #[error("Missing required field: {path}")]
    MissingField { path: String },

    /// Field present but of an unusable JSON type
    #[error("Field {path} has wrong shape: expected {expected}")]
    WrongShape {
        path: String,
        expected: &'static str,
    },

    /// String or wrapper that does not parse as a finite decimal number
    #[error("Field {path} is not numeric: {value}")]
    NotNumeric { path: String, value: String },

    /// Numeric but outside the representable range (e.g. negative timestamp)
    #[error("Field {path} out of range: {value}")]
    OutOfRange { path: String, value: String },

    #[error("Vehicle identifier is empty")]
    EmptyIdentifier,
}

impl DecodeError {
    pub(crate) fn missing(path: &str) -> Self {
        Self::MissingField {
            path: path.to_string(),
        }
    }

    pub(crate) fn wrong_shape(path: &str, expected: &'static str) -> Self {
        Self::WrongShape {
            path: path.to_string(),
            expected,
        }
    }

    pub(crate) fn not_numeric(path: &str, value: impl ToString) -> Self {
        Self::NotNumeric {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn out_of_range(path: &str, value: impl ToString) -> Self {
        Self::OutOfRange {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    /// Dotted path of the offending field, if the error concerns one
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingField { path }
            | Self::WrongShape { path, .. }
            | Self::NotNumeric { path, .. }
            | Self::OutOfRange { path, .. } => Some(path),
            Self::EmptyIdentifier => None,
        }
    }
}

/// Failure to read back an encoded feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Invalid GTFS-realtime payload: {0}")]
    Protobuf(#[from] prost::DecodeError),
}
