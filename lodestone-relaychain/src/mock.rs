//! Mock relay chain for tests and development.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use lodestone_core::merkle::keccak256;
use lodestone_core::{Hash, Header};

use crate::connection::{ParaHead, RelaychainApi};
use crate::error::{RelaychainError, Result};

/// Deterministic block hash for a mock relay block.
pub fn mock_relay_hash(number: u64) -> Hash {
    let mut data = b"relay-block".to_vec();
    data.extend_from_slice(&number.to_le_bytes());
    keccak256(&data)
}

#[derive(Debug, Clone)]
struct MockRelayBlock {
    hash: Hash,
    heads: BTreeMap<u32, Header>,
}

/// In-memory implementation of [`RelaychainApi`].
#[derive(Default)]
pub struct MockRelaychain {
    blocks: RwLock<BTreeMap<u64, MockRelayBlock>>,
}

impl MockRelaychain {
    /// Create an empty mock chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relay block with the given parachain heads.
    pub fn insert_block(&self, number: u64, heads: Vec<(u32, Header)>) {
        self.blocks.write().insert(
            number,
            MockRelayBlock {
                hash: mock_relay_hash(number),
                heads: heads.into_iter().collect(),
            },
        );
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<MockRelayBlock> {
        self.blocks
            .read()
            .values()
            .find(|block| block.hash == *hash)
            .cloned()
    }
}

#[async_trait]
impl RelaychainApi for MockRelaychain {
    async fn block_hash(&self, number: u64) -> Result<Hash> {
        self.blocks
            .read()
            .get(&number)
            .map(|block| block.hash)
            .ok_or(RelaychainError::BlockNotFound(number))
    }

    async fn parachain_head(&self, relay_hash: &Hash, para_id: u32) -> Result<Option<Header>> {
        let block = self
            .block_by_hash(relay_hash)
            .ok_or_else(|| RelaychainError::Rpc(format!("unknown relay block {}", relay_hash)))?;
        Ok(block.heads.get(&para_id).cloned())
    }

    async fn parachain_heads(&self, relay_hash: &Hash) -> Result<Vec<ParaHead>> {
        let block = self
            .block_by_hash(relay_hash)
            .ok_or_else(|| RelaychainError::Rpc(format!("unknown relay block {}", relay_hash)))?;
        Ok(block
            .heads
            .into_iter()
            .map(|(para_id, header)| ParaHead { para_id, header })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(number: u32) -> Header {
        Header {
            parent_hash: Hash::ZERO,
            number,
            state_root: Hash::ZERO,
            extrinsics_root: Hash::ZERO,
            digest: vec![],
        }
    }

    #[tokio::test]
    async fn test_heads_are_sorted_by_para_id() {
        let relay = MockRelaychain::new();
        relay.insert_block(1001, vec![(2004, header(5)), (1013, header(97))]);

        let hash = relay.block_hash(1001).await.unwrap();
        let heads = relay.parachain_heads(&hash).await.unwrap();
        assert_eq!(
            heads.iter().map(|h| h.para_id).collect::<Vec<_>>(),
            vec![1013, 2004]
        );
    }

    #[tokio::test]
    async fn test_unregistered_parachain() {
        let relay = MockRelaychain::new();
        relay.insert_block(1001, vec![(1013, header(97))]);

        let hash = relay.block_hash(1001).await.unwrap();
        assert_eq!(relay.parachain_head(&hash, 9999).await.unwrap(), None);
        assert!(relay
            .parachain_head(&hash, 1013)
            .await
            .unwrap()
            .is_some());
    }
}
