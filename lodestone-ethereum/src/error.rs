//! Error types for the Ethereum connection.

use thiserror::Error;

/// Result type for Ethereum operations.
pub type Result<T> = std::result::Result<T, EthereumError>;

/// Errors that can occur while reading the inbound channel.
#[derive(Debug, Error)]
pub enum EthereumError {
    /// RPC connection error.
    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    /// RPC call error.
    #[error("RPC call failed: {0}")]
    RpcCall(String),

    /// Invalid contract address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Network mismatch.
    #[error("network mismatch: expected chain {expected}, got {got}")]
    NetworkMismatch {
        /// Expected chain ID.
        expected: u64,
        /// Actual chain ID.
        got: u64,
    },

    /// The contract returned a malformed value.
    #[error("contract error: {0}")]
    Contract(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Alloy transport error.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<alloy::transports::TransportError> for EthereumError {
    fn from(e: alloy::transports::TransportError) -> Self {
        EthereumError::Transport(e.to_string())
    }
}
