//! Error types for the parachain connection.

use thiserror::Error;

use lodestone_core::Hash;

/// Result type for parachain operations.
pub type Result<T> = std::result::Result<T, ParachainError>;

/// Errors that can occur while reading the parachain.
#[derive(Debug, Error)]
pub enum ParachainError {
    /// RPC transport or server error.
    #[error("RPC call failed: {0}")]
    Rpc(String),

    /// No block exists at the requested height.
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// No header exists for the requested hash.
    #[error("header {0} not found")]
    HeaderNotFound(Hash),

    /// A payload failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] lodestone_core::Error),

    /// The node returned a structurally invalid payload.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Event query transport error.
    #[error("event query failed: {0}")]
    EventQuery(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<jsonrpsee::core::ClientError> for ParachainError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        ParachainError::Rpc(e.to_string())
    }
}

impl From<reqwest::Error> for ParachainError {
    fn from(e: reqwest::Error) -> Self {
        ParachainError::EventQuery(e.to_string())
    }
}
