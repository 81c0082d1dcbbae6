//! Relay-chain connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::RelaychainError;

/// Configuration for the relay-chain connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaychainConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl RelaychainConfig {
    /// Create a new configuration.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: 30,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), RelaychainError> {
        if self.endpoint.is_empty() {
            return Err(RelaychainError::Config("RPC endpoint is required".into()));
        }
        Ok(())
    }
}
