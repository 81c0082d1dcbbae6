//! Mock inbound channel for tests and development.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use lodestone_core::AccountId;

use crate::channel::InboundChannelApi;
use crate::error::{EthereumError, Result};

/// In-memory implementation of [`InboundChannelApi`].
///
/// Unknown accounts report nonce 0, matching the contract's default
/// storage value.
#[derive(Default)]
pub struct MockInboundChannel {
    nonces: RwLock<HashMap<AccountId, u64>>,
    fail_with: RwLock<Option<String>>,
}

impl MockInboundChannel {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delivered nonce for an account.
    pub fn set_nonce(&self, account: AccountId, nonce: u64) {
        self.nonces.write().insert(account, nonce);
    }

    /// Make every subsequent call fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail_with.write() = Some(message.into());
    }

    /// Clear a previously configured failure.
    pub fn clear_failure(&self) {
        *self.fail_with.write() = None;
    }
}

#[async_trait]
impl InboundChannelApi for MockInboundChannel {
    async fn nonce(&self, account: &AccountId) -> Result<u64> {
        if let Some(message) = self.fail_with.read().clone() {
            return Err(EthereumError::RpcCall(message));
        }
        Ok(self.nonces.read().get(account).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_nonce_defaults_to_zero() {
        let mock = MockInboundChannel::new();
        let account = AccountId::from_bytes([1u8; 32]);
        assert_eq!(mock.nonce(&account).await.unwrap(), 0);

        mock.set_nonce(account, 7);
        assert_eq!(mock.nonce(&account).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockInboundChannel::new();
        mock.fail_with("connection reset");
        assert!(mock.nonce(&AccountId::default()).await.is_err());

        mock.clear_failure();
        assert!(mock.nonce(&AccountId::default()).await.is_ok());
    }
}
