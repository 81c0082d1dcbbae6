//! Parachain JSON-RPC connection.

use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use parity_scale_codec::{Decode, Encode};
use tracing::info;

use lodestone_core::storage::StorageKey;
use lodestone_core::{AccountId, Hash, Header, RawMerkleProof};

use crate::config::ParachainConfig;
use crate::error::{ParachainError, Result};
use crate::json::{decode_hex, HeaderJson};

/// The parachain state record anchoring a block to its relay parent.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct PersistedValidationData {
    /// Encoded parent head data.
    pub parent_head: Vec<u8>,
    /// Relay block against which this parachain block was authored.
    pub relay_parent_number: u32,
    /// Storage root of that relay block.
    pub relay_parent_storage_root: Hash,
    /// Maximum proof-of-validity size.
    pub max_pov_size: u32,
}

/// Read access to the parachain.
#[async_trait]
pub trait ParachainApi: Send + Sync {
    /// Block hash at the given height.
    async fn block_hash(&self, number: u64) -> Result<Hash>;

    /// Header for the given block hash.
    async fn header(&self, hash: &Hash) -> Result<Header>;

    /// The outbound channel's generated nonce for `account`, read from
    /// state at `at`. `None` if the storage entry is absent.
    async fn outbound_nonce(&self, account: &AccountId, at: &Hash) -> Result<Option<u64>>;

    /// `ParachainSystem::ValidationData` at `at`.
    async fn validation_data(&self, at: &Hash) -> Result<Option<PersistedValidationData>>;

    /// Bundle-inclusion proof for `leaf_index` under `commitment`.
    async fn merkle_proof(&self, commitment: &Hash, leaf_index: u64) -> Result<RawMerkleProof>;
}

/// Parachain connection backed by a jsonrpsee HTTP client.
pub struct Connection {
    client: HttpClient,
}

impl Connection {
    /// Create a connection without probing the node.
    pub fn new(config: &ParachainConfig) -> Result<Self> {
        config.validate()?;

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(config.timeout_secs))
            .build(&config.endpoint)
            .map_err(|e| ParachainError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create a connection and verify the node is reachable.
    pub async fn connect(config: &ParachainConfig) -> Result<Self> {
        let connection = Self::new(config)?;

        let chain: String = connection
            .client
            .request("system_chain", rpc_params![])
            .await?;
        info!(chain, endpoint = %config.endpoint, "connected to parachain node");

        Ok(connection)
    }

    /// Raw storage read at a block.
    async fn storage_raw(&self, key: &StorageKey, at: &Hash) -> Result<Option<Vec<u8>>> {
        let value: Option<String> = self
            .client
            .request(
                "state_getStorage",
                rpc_params![key.to_hex_prefixed(), at.to_hex_prefixed()],
            )
            .await?;

        value.as_deref().map(decode_hex).transpose()
    }
}

#[async_trait]
impl ParachainApi for Connection {
    async fn block_hash(&self, number: u64) -> Result<Hash> {
        let hash: Option<String> = self
            .client
            .request("chain_getBlockHash", rpc_params![number])
            .await?;

        let hash = hash.ok_or(ParachainError::BlockNotFound(number))?;
        Ok(Hash::from_hex(&hash)?)
    }

    async fn header(&self, hash: &Hash) -> Result<Header> {
        let header: Option<HeaderJson> = self
            .client
            .request("chain_getHeader", rpc_params![hash.to_hex_prefixed()])
            .await?;

        header
            .ok_or(ParachainError::HeaderNotFound(*hash))?
            .into_header()
    }

    async fn outbound_nonce(&self, account: &AccountId, at: &Hash) -> Result<Option<u64>> {
        let key = StorageKey::map_identity("BasicOutboundChannel", "Nonce", account.as_bytes());

        self.storage_raw(&key, at)
            .await?
            .map(|bytes| u64::decode(&mut bytes.as_slice()).map_err(lodestone_core::Error::Codec))
            .transpose()
            .map_err(ParachainError::from)
    }

    async fn validation_data(&self, at: &Hash) -> Result<Option<PersistedValidationData>> {
        let key = StorageKey::plain("ParachainSystem", "ValidationData");

        self.storage_raw(&key, at)
            .await?
            .map(|bytes| {
                PersistedValidationData::decode(&mut bytes.as_slice())
                    .map_err(lodestone_core::Error::Codec)
            })
            .transpose()
            .map_err(ParachainError::from)
    }

    async fn merkle_proof(&self, commitment: &Hash, leaf_index: u64) -> Result<RawMerkleProof> {
        let payload: String = self
            .client
            .request(
                "basicOutboundChannel_getMerkleProof",
                rpc_params![commitment.to_hex_prefixed(), leaf_index],
            )
            .await?;

        let bytes = decode_hex(&payload)?;
        Ok(RawMerkleProof::decode(&mut bytes.as_slice()).map_err(lodestone_core::Error::Codec)?)
    }
}
