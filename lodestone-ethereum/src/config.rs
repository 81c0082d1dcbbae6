//! Ethereum connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::EthereumError;

/// Configuration for the Ethereum connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthereumConfig {
    /// RPC endpoint URL.
    pub rpc_url: String,

    /// Address of the basic inbound channel contract (`0x`-prefixed hex).
    pub inbound_channel: String,

    /// Expected chain ID; checked on connect when set.
    pub chain_id: Option<u64>,

    /// Connection timeout in seconds.
    pub timeout_secs: u64,
}

impl EthereumConfig {
    /// Create a new configuration.
    pub fn new(rpc_url: impl Into<String>, inbound_channel: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            inbound_channel: inbound_channel.into(),
            chain_id: None,
            timeout_secs: 30,
        }
    }

    /// Set the expected chain ID.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Set the connection timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), EthereumError> {
        if self.rpc_url.is_empty() {
            return Err(EthereumError::Config("RPC URL is required".into()));
        }

        let address = self
            .inbound_channel
            .strip_prefix("0x")
            .unwrap_or(&self.inbound_channel);
        if address.len() != 40 || hex::decode(address).is_err() {
            return Err(EthereumError::Config(format!(
                "invalid inbound channel address: {}",
                self.inbound_channel
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = EthereumConfig::new(
            "http://127.0.0.1:8545",
            "0x4283d8996e5a7f4ca2b1c8c8e9ad72c9a7a9dd92",
        )
        .with_chain_id(11155111);
        assert!(config.validate().is_ok());
        assert_eq!(config.chain_id, Some(11155111));
    }

    #[test]
    fn test_rejects_bad_address() {
        let config = EthereumConfig::new("http://127.0.0.1:8545", "0x1234");
        assert!(config.validate().is_err());

        let config = EthereumConfig::new("", "0x4283d8996e5a7f4ca2b1c8c8e9ad72c9a7a9dd92");
        assert!(config.validate().is_err());
    }
}
