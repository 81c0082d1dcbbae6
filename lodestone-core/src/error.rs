//! Error types for core primitives.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding or validating core types.
#[derive(Debug, Error)]
pub enum Error {
    /// SCALE decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] parity_scale_codec::Error),

    /// Hex decoding failed.
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// A hash or account literal had the wrong length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        got: usize,
    },

    /// A Merkle proof was structurally malformed.
    #[error("invalid merkle proof: {0}")]
    InvalidProof(String),
}
