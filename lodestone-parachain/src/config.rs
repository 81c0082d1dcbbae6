//! Parachain connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::ParachainError;

/// Configuration for the parachain connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParachainConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,

    /// Endpoint of the event-query sidecar.
    ///
    /// Decoding runtime events requires chain metadata, which the sidecar
    /// owns; the relayer only consumes its typed responses.
    pub event_query_endpoint: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ParachainConfig {
    /// Create a new configuration.
    pub fn new(endpoint: impl Into<String>, event_query_endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            event_query_endpoint: event_query_endpoint.into(),
            timeout_secs: 30,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ParachainError> {
        if self.endpoint.is_empty() {
            return Err(ParachainError::Config("RPC endpoint is required".into()));
        }
        if self.event_query_endpoint.is_empty() {
            return Err(ParachainError::Config(
                "event query endpoint is required".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let config = ParachainConfig::new("http://127.0.0.1:9933", "http://127.0.0.1:8088");
        assert!(config.validate().is_ok());

        assert!(ParachainConfig::new("", "http://127.0.0.1:8088")
            .validate()
            .is_err());
        assert!(ParachainConfig::new("http://127.0.0.1:9933", "")
            .validate()
            .is_err());
    }
}
