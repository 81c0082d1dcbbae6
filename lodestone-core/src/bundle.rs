//! Message bundles committed by the basic outbound channel.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::hash::{AccountId, Hash};

/// A single outbound message inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Message {
    /// Target contract on the sink chain.
    pub target: [u8; 20],
    /// Opaque call payload.
    pub payload: Vec<u8>,
}

/// A per-account group of messages inside a commitment.
///
/// The commitment root announced in the header digest is the Merkle root
/// over the SCALE encodings of all bundles committed in that block.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct MessageBundle {
    /// Account the bundle belongs to.
    pub account: AccountId,
    /// Sequence number assigned by the channel, strictly monotonic per
    /// account.
    pub nonce: u64,
    /// The bundled messages.
    pub messages: Vec<Message>,
}

/// The `Committed` event emitted by the basic outbound channel.
///
/// Announces the bundles that constitute a commitment together with the
/// commitment hash, which must match the hash in the corresponding header
/// digest item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedEvent {
    /// Commitment root, as reported by the event.
    pub hash: Hash,
    /// Bundles in Merkle-leaf order.
    pub bundles: Vec<MessageBundle>,
}
