//! Mock parachain for tests and development.
//!
//! Builds an in-memory chain whose commitment blocks carry real Keccak
//! Merkle trees over their bundles, so fetched proofs verify against the
//! digest hashes exactly as they would on a live chain.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parity_scale_codec::Encode;
use parking_lot::RwLock;

use lodestone_core::merkle::{keccak256, merkle_proof, merkle_root};
use lodestone_core::{
    AccountId, AuxiliaryDigestItem, ChannelId, CommittedEvent, DigestItem, Hash, Header,
    MessageBundle, RawMerkleProof,
};

use crate::connection::{ParachainApi, PersistedValidationData};
use crate::error::{ParachainError, Result};
use crate::events::EventQueryApi;

/// Deterministic block hash for a mock parachain block.
pub fn mock_block_hash(number: u64) -> Hash {
    let mut data = b"para-block".to_vec();
    data.extend_from_slice(&number.to_le_bytes());
    keccak256(&data)
}

/// One block of the mock chain.
#[derive(Debug, Clone)]
pub struct MockBlock {
    /// Block hash.
    pub hash: Hash,
    /// Header, including any commitment digest item.
    pub header: Header,
    /// The `Committed` event, if the block committed.
    pub committed: Option<CommittedEvent>,
    /// `ValidationData` visible at this block.
    pub validation_data: Option<PersistedValidationData>,
    /// Outbound channel nonces visible at this block.
    pub nonces: HashMap<AccountId, u64>,
    proofs: Vec<RawMerkleProof>,
}

impl MockBlock {
    /// A block without commitments.
    pub fn plain(number: u64) -> Self {
        Self {
            hash: mock_block_hash(number),
            header: mock_header(number, vec![]),
            committed: None,
            validation_data: None,
            nonces: HashMap::new(),
            proofs: Vec::new(),
        }
    }

    /// A block committing the given bundles on the basic channel.
    ///
    /// The commitment root, digest item, event and all bundle proofs are
    /// derived from the bundles' SCALE encodings.
    pub fn with_commitment(number: u64, bundles: Vec<MessageBundle>) -> Self {
        let leaves: Vec<Vec<u8>> = bundles.iter().map(|bundle| bundle.encode()).collect();
        let root = merkle_root(&leaves);

        let digest_item = DigestItem::Other(
            AuxiliaryDigestItem::Commitment {
                channel: ChannelId::Basic,
                hash: root,
            }
            .encode(),
        );

        let proofs = (0..leaves.len())
            .map(|i| merkle_proof(&leaves, i).expect("index in range"))
            .collect();

        Self {
            hash: mock_block_hash(number),
            header: mock_header(number, vec![digest_item]),
            committed: Some(CommittedEvent {
                hash: root,
                bundles,
            }),
            validation_data: None,
            nonces: HashMap::new(),
            proofs,
        }
    }

    /// Set the validation data visible at this block.
    pub fn with_validation_data(mut self, relay_parent_number: u32) -> Self {
        self.validation_data = Some(PersistedValidationData {
            parent_head: vec![],
            relay_parent_number,
            relay_parent_storage_root: Hash::ZERO,
            max_pov_size: 5 * 1024 * 1024,
        });
        self
    }

    /// Set an outbound nonce visible at this block.
    pub fn with_nonce(mut self, account: AccountId, nonce: u64) -> Self {
        self.nonces.insert(account, nonce);
        self
    }

    /// Drop the `Committed` event while keeping the digest item.
    pub fn without_event(mut self) -> Self {
        self.committed = None;
        self
    }

    /// Override the hash reported by the `Committed` event.
    pub fn with_event_hash(mut self, hash: Hash) -> Self {
        if let Some(event) = &mut self.committed {
            event.hash = hash;
        }
        self
    }

    /// The commitment root announced in this block's digest, if any.
    pub fn commitment_root(&self) -> Option<Hash> {
        let items = lodestone_core::auxiliary_digest_items(&self.header.digest).ok()?;
        items.iter().find_map(AuxiliaryDigestItem::as_basic_commitment)
    }
}

fn mock_header(number: u64, digest: Vec<DigestItem>) -> Header {
    Header {
        parent_hash: if number == 0 {
            Hash::ZERO
        } else {
            mock_block_hash(number - 1)
        },
        number: number as u32,
        state_root: keccak256(&number.to_be_bytes()),
        extrinsics_root: keccak256(&number.to_le_bytes()),
        digest,
    }
}

/// In-memory implementation of [`ParachainApi`] and [`EventQueryApi`].
#[derive(Default)]
pub struct MockParachain {
    blocks: RwLock<BTreeMap<u64, MockBlock>>,
    proofs: RwLock<HashMap<(Hash, u64), RawMerkleProof>>,
}

impl MockParachain {
    /// Create an empty mock chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block, registering its bundle proofs under its commitment
    /// root.
    pub fn insert(&self, mut block: MockBlock) {
        let number = u64::from(block.header.number);
        let proofs = std::mem::take(&mut block.proofs);
        if let Some(root) = block.commitment_root() {
            let mut map = self.proofs.write();
            for proof in proofs {
                map.insert((root, proof.leaf_index), proof);
            }
        }
        self.blocks.write().insert(number, block);
    }

    /// Tamper with a stored proof so its recomputed root no longer matches
    /// the commitment.
    pub fn corrupt_proof(&self, commitment: Hash, leaf_index: u64) {
        if let Some(proof) = self.proofs.write().get_mut(&(commitment, leaf_index)) {
            proof.leaf.push(0xff);
        }
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<MockBlock> {
        self.blocks
            .read()
            .values()
            .find(|block| block.hash == *hash)
            .cloned()
    }
}

#[async_trait]
impl ParachainApi for MockParachain {
    async fn block_hash(&self, number: u64) -> Result<Hash> {
        self.blocks
            .read()
            .get(&number)
            .map(|block| block.hash)
            .ok_or(ParachainError::BlockNotFound(number))
    }

    async fn header(&self, hash: &Hash) -> Result<Header> {
        self.block_by_hash(hash)
            .map(|block| block.header)
            .ok_or(ParachainError::HeaderNotFound(*hash))
    }

    async fn outbound_nonce(&self, account: &AccountId, at: &Hash) -> Result<Option<u64>> {
        let block = self
            .block_by_hash(at)
            .ok_or(ParachainError::HeaderNotFound(*at))?;
        Ok(block.nonces.get(account).copied())
    }

    async fn validation_data(&self, at: &Hash) -> Result<Option<PersistedValidationData>> {
        let block = self
            .block_by_hash(at)
            .ok_or(ParachainError::HeaderNotFound(*at))?;
        Ok(block.validation_data)
    }

    async fn merkle_proof(&self, commitment: &Hash, leaf_index: u64) -> Result<RawMerkleProof> {
        self.proofs
            .read()
            .get(&(*commitment, leaf_index))
            .cloned()
            .ok_or_else(|| {
                ParachainError::Rpc(format!(
                    "no proof for commitment {} at index {}",
                    commitment, leaf_index
                ))
            })
    }
}

#[async_trait]
impl EventQueryApi for MockParachain {
    async fn committed_event(&self, block_hash: &Hash) -> Result<Option<CommittedEvent>> {
        let block = self
            .block_by_hash(block_hash)
            .ok_or(ParachainError::HeaderNotFound(*block_hash))?;
        Ok(block.committed)
    }
}

#[cfg(test)]
mod tests {
    use lodestone_core::MerkleProof;

    use super::*;

    fn bundle(account: u8, nonce: u64) -> MessageBundle {
        MessageBundle {
            account: AccountId::from_bytes([account; 32]),
            nonce,
            messages: vec![],
        }
    }

    #[tokio::test]
    async fn test_commitment_block_proofs_verify() {
        let chain = MockParachain::new();
        let block = MockBlock::with_commitment(97, vec![bundle(1, 6), bundle(2, 4)]);
        let root = block.commitment_root().unwrap();
        chain.insert(block);

        for index in 0..2 {
            let raw = chain.merkle_proof(&root, index).await.unwrap();
            let verified = MerkleProof::from_raw(raw).unwrap();
            assert_eq!(verified.root, root);
        }
    }

    #[tokio::test]
    async fn test_corrupt_proof_breaks_root() {
        let chain = MockParachain::new();
        let block = MockBlock::with_commitment(90, vec![bundle(1, 6)]);
        let root = block.commitment_root().unwrap();
        chain.insert(block);

        chain.corrupt_proof(root, 0);
        let raw = chain.merkle_proof(&root, 0).await.unwrap();
        let verified = MerkleProof::from_raw(raw).unwrap();
        assert_ne!(verified.root, root);
    }

    #[tokio::test]
    async fn test_block_lookup() {
        let chain = MockParachain::new();
        chain.insert(MockBlock::plain(5));

        let hash = chain.block_hash(5).await.unwrap();
        let header = chain.header(&hash).await.unwrap();
        assert_eq!(header.number, 5);
        assert!(chain.block_hash(6).await.is_err());
    }
}
