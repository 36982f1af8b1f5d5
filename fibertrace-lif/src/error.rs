//! Error types for fibertrace-lif.

use thiserror::Error;

/// Result type alias for container parsing.
pub type Result<T> = std::result::Result<T, Error>;

/// Container parsing error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Structural violation of the container layout.
    #[error("invalid container format: {0}")]
    InvalidFormat(String),

    /// Container declares a format version this crate does not read.
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u32),

    /// The file ends before a declared field or payload.
    #[error("truncated container: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// The metadata XML is missing or malformed.
    #[error("metadata error: {0}")]
    Metadata(String),
}
