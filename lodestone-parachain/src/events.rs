//! Out-of-band query for the outbound channel's `Committed` event.
//!
//! Runtime events cannot be decoded from raw storage without chain
//! metadata, so that concern lives in a sidecar service. The scanner only
//! needs one question answered per block: did the basic outbound channel
//! commit, and with which bundles?

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lodestone_core::{AccountId, CommittedEvent, Hash, Message, MessageBundle};

use crate::error::{ParachainError, Result};
use crate::json::decode_hex;

/// Query capability for the `Committed` event.
#[async_trait]
pub trait EventQueryApi: Send + Sync {
    /// The `BasicOutboundChannel.Committed` event for the block, if one was
    /// emitted.
    async fn committed_event(&self, block_hash: &Hash) -> Result<Option<CommittedEvent>>;
}

/// Event query backed by the HTTP sidecar.
pub struct HttpEventQuery {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEventQuery {
    /// Create a query client against the given sidecar endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct EventQueryRequest<'a> {
    block_hash: &'a str,
}

#[derive(Deserialize)]
struct CommittedEventJson {
    hash: String,
    bundles: Vec<BundleJson>,
}

#[derive(Deserialize)]
struct BundleJson {
    account: String,
    nonce: u64,
    messages: Vec<MessageJson>,
}

#[derive(Deserialize)]
struct MessageJson {
    target: String,
    payload: String,
}

impl CommittedEventJson {
    fn into_event(self) -> Result<CommittedEvent> {
        let mut bundles = Vec::with_capacity(self.bundles.len());
        for bundle in self.bundles {
            let mut messages = Vec::with_capacity(bundle.messages.len());
            for message in bundle.messages {
                let target_bytes = decode_hex(&message.target)?;
                let target: [u8; 20] = target_bytes.as_slice().try_into().map_err(|_| {
                    ParachainError::InvalidPayload(format!(
                        "message target must be 20 bytes, got {}",
                        target_bytes.len()
                    ))
                })?;
                messages.push(Message {
                    target,
                    payload: decode_hex(&message.payload)?,
                });
            }
            bundles.push(MessageBundle {
                account: AccountId::from_hex(&bundle.account)?,
                nonce: bundle.nonce,
                messages,
            });
        }

        Ok(CommittedEvent {
            hash: Hash::from_hex(&self.hash)?,
            bundles,
        })
    }
}

#[async_trait]
impl EventQueryApi for HttpEventQuery {
    async fn committed_event(&self, block_hash: &Hash) -> Result<Option<CommittedEvent>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EventQueryRequest {
                block_hash: &block_hash.to_hex_prefixed(),
            })
            .send()
            .await?
            .error_for_status()?;

        let event: Option<CommittedEventJson> = response.json().await?;
        debug!(block_hash = %block_hash, found = event.is_some(), "queried committed event");

        event.map(CommittedEventJson::into_event).transpose()
    }
}
