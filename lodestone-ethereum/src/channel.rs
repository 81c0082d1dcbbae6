//! Inbound-channel reads.
//!
//! The scanner needs exactly one view of Ethereum: the highest nonce the
//! basic inbound channel has delivered per account. The call is evaluated
//! against pending state so that an in-flight delivery transaction is not
//! re-relayed.

use alloy::eips::BlockId;
use alloy::network::TransactionBuilder;
use alloy::primitives::{keccak256, Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use tracing::info;

use lodestone_core::AccountId;

use crate::config::EthereumConfig;
use crate::error::{EthereumError, Result};

/// Read access to the basic inbound channel contract.
#[async_trait]
pub trait InboundChannelApi: Send + Sync {
    /// The highest delivered nonce for `account`, evaluated with pending
    /// state.
    async fn nonce(&self, account: &AccountId) -> Result<u64>;
}

/// Ethereum connection backed by an alloy HTTP provider.
pub struct Connection {
    provider: RootProvider<Http<Client>>,
    channel_address: Address,
}

impl Connection {
    /// Create a connection without probing the node.
    pub fn new(config: &EthereumConfig) -> Result<Self> {
        config.validate()?;

        let provider = ProviderBuilder::new().on_http(
            config
                .rpc_url
                .parse()
                .map_err(|e: url::ParseError| EthereumError::RpcConnection(e.to_string()))?,
        );

        let channel_address: Address = config
            .inbound_channel
            .parse()
            .map_err(|_| EthereumError::InvalidAddress(config.inbound_channel.clone()))?;

        Ok(Self {
            provider,
            channel_address,
        })
    }

    /// Create a connection and verify the node is reachable on the expected
    /// chain.
    pub async fn connect(config: &EthereumConfig) -> Result<Self> {
        let connection = Self::new(config)?;

        let chain_id = connection.provider.get_chain_id().await?;
        if let Some(expected) = config.chain_id {
            if chain_id != expected {
                return Err(EthereumError::NetworkMismatch {
                    expected,
                    got: chain_id,
                });
            }
        }
        info!(chain_id, channel = %connection.channel_address, "connected to ethereum node");

        Ok(connection)
    }

    /// Build calldata for `nonce(bytes32)`.
    fn nonce_calldata(account: &AccountId) -> Vec<u8> {
        let selector = &keccak256(b"nonce(bytes32)")[..4];
        let mut data = Vec::with_capacity(4 + 32);
        data.extend_from_slice(selector);
        data.extend_from_slice(account.as_bytes());
        data
    }

    /// Decode a `uint64` from a 32-byte ABI return word.
    fn decode_u64_word(output: &[u8]) -> Result<u64> {
        if output.len() != 32 {
            return Err(EthereumError::Contract(format!(
                "expected a 32-byte return word, got {} bytes",
                output.len()
            )));
        }
        if output[..24].iter().any(|b| *b != 0) {
            return Err(EthereumError::Contract(
                "nonce does not fit in a u64".into(),
            ));
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&output[24..32]);
        Ok(u64::from_be_bytes(word))
    }
}

#[async_trait]
impl InboundChannelApi for Connection {
    async fn nonce(&self, account: &AccountId) -> Result<u64> {
        let calldata = Self::nonce_calldata(account);

        let tx = TransactionRequest::default()
            .with_to(self.channel_address)
            .with_input(Bytes::from(calldata));

        let output = self
            .provider
            .call(&tx)
            .block(BlockId::pending())
            .await
            .map_err(|e| EthereumError::RpcCall(e.to_string()))?;

        Self::decode_u64_word(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_calldata_layout() {
        let account = AccountId::from_bytes([0x11; 32]);
        let calldata = Connection::nonce_calldata(&account);

        assert_eq!(calldata.len(), 36);
        assert_eq!(&calldata[..4], &keccak256(b"nonce(bytes32)")[..4]);
        assert_eq!(&calldata[4..], account.as_bytes());
    }

    #[test]
    fn test_decode_u64_word() {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&42u64.to_be_bytes());
        assert_eq!(Connection::decode_u64_word(&word).unwrap(), 42);
    }

    #[test]
    fn test_decode_rejects_overflow_and_short_output() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(Connection::decode_u64_word(&word).is_err());
        assert!(Connection::decode_u64_word(&[0u8; 16]).is_err());
    }
}
