//! Relay-chain JSON-RPC connection.
//!
//! The scanner needs two views of the relay chain: the head a given
//! parachain had registered at a relay block, and the full head registry at
//! a relay block (the input to an MMR-leaf membership proof downstream).
//!
//! `Paras::Heads` values are opaque head data: a SCALE `Vec<u8>` wrapping
//! the SCALE encoding of the parachain header, so reads decode twice.

use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use parity_scale_codec::{Decode, Encode};
use serde::Deserialize;
use tracing::info;

use lodestone_core::storage::StorageKey;
use lodestone_core::{Hash, Header};

use crate::config::RelaychainConfig;
use crate::error::{RelaychainError, Result};

/// Number of storage keys fetched per `state_getKeysPaged` request.
const KEY_PAGE_SIZE: u32 = 256;

/// One entry of the parachain-head registry at a relay block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParaHead {
    /// Parachain id.
    pub para_id: u32,
    /// The registered head.
    pub header: Header,
}

/// Read access to the relay chain.
#[async_trait]
pub trait RelaychainApi: Send + Sync {
    /// Block hash at the given height.
    async fn block_hash(&self, number: u64) -> Result<Hash>;

    /// The head registered for `para_id` at the given relay block, or
    /// `None` if the parachain is not registered there.
    async fn parachain_head(&self, relay_hash: &Hash, para_id: u32) -> Result<Option<Header>>;

    /// All registered parachain heads at the given relay block, ordered by
    /// ascending para id.
    async fn parachain_heads(&self, relay_hash: &Hash) -> Result<Vec<ParaHead>>;
}

/// Relay-chain connection backed by a jsonrpsee HTTP client.
pub struct Connection {
    client: HttpClient,
}

/// Result entry of `state_queryStorageAt`.
#[derive(Debug, Deserialize)]
struct StorageChangeSet {
    #[allow(dead_code)]
    block: String,
    changes: Vec<(String, Option<String>)>,
}

impl Connection {
    /// Create a connection without probing the node.
    pub fn new(config: &RelaychainConfig) -> Result<Self> {
        config.validate()?;

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(config.timeout_secs))
            .build(&config.endpoint)
            .map_err(|e| RelaychainError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create a connection and verify the node is reachable.
    pub async fn connect(config: &RelaychainConfig) -> Result<Self> {
        let connection = Self::new(config)?;

        let chain: String = connection
            .client
            .request("system_chain", rpc_params![])
            .await?;
        info!(chain, endpoint = %config.endpoint, "connected to relay chain node");

        Ok(connection)
    }

    /// All keys under a prefix at a block, following pagination.
    async fn keys_with_prefix(&self, prefix: &StorageKey, at: &Hash) -> Result<Vec<String>> {
        let mut keys: Vec<String> = Vec::new();
        let mut start_key: Option<String> = None;

        loop {
            let page: Vec<String> = self
                .client
                .request(
                    "state_getKeysPaged",
                    rpc_params![
                        prefix.to_hex_prefixed(),
                        KEY_PAGE_SIZE,
                        start_key.clone(),
                        at.to_hex_prefixed()
                    ],
                )
                .await?;

            let full_page = page.len() == KEY_PAGE_SIZE as usize;
            start_key = page.last().cloned();
            keys.extend(page);

            if !full_page {
                return Ok(keys);
            }
        }
    }
}

/// Decode the opaque head data stored in `Paras::Heads`.
fn decode_opaque_head(value: &[u8]) -> Result<Header> {
    let head_data = Vec::<u8>::decode(&mut &value[..]).map_err(lodestone_core::Error::Codec)?;
    Ok(Header::decode(&mut head_data.as_slice()).map_err(lodestone_core::Error::Codec)?)
}

/// Decode the para id from the tail of a `Paras::Heads` storage key.
///
/// Key layout: pallet/item prefix (32) + twox64 of the id (8) + the id
/// itself (4, little endian).
fn para_id_from_key(key: &[u8]) -> Result<u32> {
    if key.len() != 44 {
        return Err(RelaychainError::InvalidPayload(format!(
            "unexpected heads key length: {}",
            key.len()
        )));
    }
    let mut id = [0u8; 4];
    id.copy_from_slice(&key[40..44]);
    Ok(u32::from_le_bytes(id))
}

fn decode_hex(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.strip_prefix("0x").unwrap_or(payload);
    Ok(hex::decode(payload).map_err(lodestone_core::Error::Hex)?)
}

#[async_trait]
impl RelaychainApi for Connection {
    async fn block_hash(&self, number: u64) -> Result<Hash> {
        let hash: Option<String> = self
            .client
            .request("chain_getBlockHash", rpc_params![number])
            .await?;

        let hash = hash.ok_or(RelaychainError::BlockNotFound(number))?;
        Ok(Hash::from_hex(&hash)?)
    }

    async fn parachain_head(&self, relay_hash: &Hash, para_id: u32) -> Result<Option<Header>> {
        let key = StorageKey::map_twox64_concat("Paras", "Heads", &para_id.encode());

        let value: Option<String> = self
            .client
            .request(
                "state_getStorage",
                rpc_params![key.to_hex_prefixed(), relay_hash.to_hex_prefixed()],
            )
            .await?;

        value
            .as_deref()
            .map(|v| decode_opaque_head(&decode_hex(v)?))
            .transpose()
    }

    async fn parachain_heads(&self, relay_hash: &Hash) -> Result<Vec<ParaHead>> {
        let prefix = StorageKey::plain("Paras", "Heads");
        let keys = self.keys_with_prefix(&prefix, relay_hash).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let change_sets: Vec<StorageChangeSet> = self
            .client
            .request(
                "state_queryStorageAt",
                rpc_params![keys, relay_hash.to_hex_prefixed()],
            )
            .await?;

        let mut heads = Vec::new();
        for change_set in change_sets {
            for (key, value) in change_set.changes {
                let Some(value) = value else { continue };
                let para_id = para_id_from_key(&decode_hex(&key)?)?;
                let header = decode_opaque_head(&decode_hex(&value)?)?;
                heads.push(ParaHead { para_id, header });
            }
        }

        heads.sort_by_key(|head| head.para_id);
        Ok(heads)
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

    #[test]
    fn test_opaque_head_double_decode() {
        let original = header(97);
        let opaque = original.encode().encode();
        assert_eq!(decode_opaque_head(&opaque).unwrap(), original);
    }

    #[test]
    fn test_para_id_from_key() {
        let key = StorageKey::map_twox64_concat("Paras", "Heads", &1013u32.encode());
        assert_eq!(para_id_from_key(key.as_bytes()).unwrap(), 1013);
        assert!(para_id_from_key(&[0u8; 10]).is_err());
    }
}
