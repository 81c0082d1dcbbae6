//! Error types for the relay-chain connection.

use thiserror::Error;

/// Result type for relay-chain operations.
pub type Result<T> = std::result::Result<T, RelaychainError>;

/// Errors that can occur while reading the relay chain.
#[derive(Debug, Error)]
pub enum RelaychainError {
    /// RPC transport or server error.
    #[error("RPC call failed: {0}")]
    Rpc(String),

    /// No block exists at the requested height.
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// A payload failed to decode.
    #[error("codec error: {0}")]
    Codec(#[from] lodestone_core::Error),

    /// The node returned a structurally invalid payload.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<jsonrpsee::core::ClientError> for RelaychainError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        RelaychainError::Rpc(e.to_string())
    }
}
