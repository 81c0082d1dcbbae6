//! Parachain block headers and their digest items.
//!
//! Headers are carried whole through the relay pipeline so downstream
//! consumers can re-encode them byte-exactly. Only the `Other` digest
//! variant is interpreted: its payload holds the auxiliary digest items the
//! outbound channel emits, of which the `Commitment` variant announces a
//! commitment root produced in that block.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::Hash;

/// Consensus engine identifier inside consensus-related digest variants.
pub type ConsensusEngineId = [u8; 4];

/// A single entry of a header digest.
///
/// Variant indices follow the Substrate runtime encoding. Everything except
/// `Other` is opaque to the relayer and carried only for re-encoding.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum DigestItem {
    /// Runtime-defined payload; auxiliary digest items live here.
    #[codec(index = 0)]
    Other(Vec<u8>),
    /// A consensus message.
    #[codec(index = 4)]
    Consensus(ConsensusEngineId, Vec<u8>),
    /// A seal produced by the block author.
    #[codec(index = 5)]
    Seal(ConsensusEngineId, Vec<u8>),
    /// A pre-runtime digest.
    #[codec(index = 6)]
    PreRuntime(ConsensusEngineId, Vec<u8>),
    /// Runtime environment change marker.
    #[codec(index = 8)]
    RuntimeEnvironmentUpdated,
}

/// A parachain block header.
///
/// The block number is encoded compact on the wire, as in the Substrate
/// header layout.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Header {
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Block number.
    #[codec(compact)]
    pub number: u32,
    /// State trie root.
    pub state_root: Hash,
    /// Extrinsics trie root.
    pub extrinsics_root: Hash,
    /// Digest entries.
    pub digest: Vec<DigestItem>,
}

/// The channel that produced a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum ChannelId {
    /// The basic delivery channel.
    #[codec(index = 0)]
    Basic,
    /// The incentivized delivery channel (reserved, not relayed).
    #[codec(index = 1)]
    Incentivized,
}

/// An auxiliary digest item emitted by an outbound channel.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum AuxiliaryDigestItem {
    /// A channel produced a commitment with the given Merkle root in this
    /// block.
    #[codec(index = 0)]
    Commitment {
        /// Channel that committed.
        channel: ChannelId,
        /// Merkle root over the committed bundles.
        hash: Hash,
    },
}

impl AuxiliaryDigestItem {
    /// The commitment hash, if this item announces a basic-channel
    /// commitment.
    pub fn as_basic_commitment(&self) -> Option<Hash> {
        match self {
            AuxiliaryDigestItem::Commitment {
                channel: ChannelId::Basic,
                hash,
            } => Some(*hash),
            _ => None,
        }
    }
}

/// Extract the auxiliary digest items from a header digest.
///
/// Decodes the payload of every `Other` entry. A payload that fails to
/// decode is an error: on the source chain only the outbound channels emit
/// `Other` digests, so a malformed one indicates chain/RPC disagreement.
pub fn auxiliary_digest_items(digest: &[DigestItem]) -> Result<Vec<AuxiliaryDigestItem>> {
    let mut items = Vec::new();
    for entry in digest {
        if let DigestItem::Other(payload) = entry {
            items.push(AuxiliaryDigestItem::decode(&mut payload.as_slice())?);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with_digest(digest: Vec<DigestItem>) -> Header {
        Header {
            parent_hash: Hash::from_bytes([1u8; 32]),
            number: 97,
            state_root: Hash::from_bytes([2u8; 32]),
            extrinsics_root: Hash::from_bytes([3u8; 32]),
            digest,
        }
    }

    #[test]
    fn test_header_scale_roundtrip() {
        let header = header_with_digest(vec![
            DigestItem::PreRuntime(*b"aura", vec![1, 2, 3]),
            DigestItem::Other(
                AuxiliaryDigestItem::Commitment {
                    channel: ChannelId::Basic,
                    hash: Hash::from_bytes([9u8; 32]),
                }
                .encode(),
            ),
        ]);

        let encoded = header.encode();
        let decoded = Header::decode(&mut &encoded[..]).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_number_is_compact() {
        // A block number below 64 encodes as a single byte.
        let header = header_with_digest(vec![]);
        let mut small = header.clone();
        small.number = 5;
        let encoded = small.encode();
        // parent(32) + compact number(1) + state(32) + extrinsics(32) + empty vec(1)
        assert_eq!(encoded.len(), 98);
    }

    #[test]
    fn test_extract_basic_commitment() {
        let commitment = AuxiliaryDigestItem::Commitment {
            channel: ChannelId::Basic,
            hash: Hash::from_bytes([7u8; 32]),
        };
        let header = header_with_digest(vec![
            DigestItem::Seal(*b"aura", vec![0xff]),
            DigestItem::Other(commitment.encode()),
        ]);

        let items = auxiliary_digest_items(&header.digest).unwrap();
        assert_eq!(items, vec![commitment]);
        assert_eq!(
            items[0].as_basic_commitment(),
            Some(Hash::from_bytes([7u8; 32]))
        );
    }

    #[test]
    fn test_incentivized_commitment_is_not_basic() {
        let item = AuxiliaryDigestItem::Commitment {
            channel: ChannelId::Incentivized,
            hash: Hash::from_bytes([7u8; 32]),
        };
        assert_eq!(item.as_basic_commitment(), None);
    }

    #[test]
    fn test_malformed_other_payload_is_error() {
        let header = header_with_digest(vec![DigestItem::Other(vec![0xde, 0xad])]);
        assert!(auxiliary_digest_items(&header.digest).is_err());
    }

    #[test]
    fn test_non_other_digests_are_skipped() {
        let header = header_with_digest(vec![
            DigestItem::Consensus(*b"BEEF", vec![1]),
            DigestItem::RuntimeEnvironmentUpdated,
        ]);
        assert!(auxiliary_digest_items(&header.digest).unwrap().is_empty());
    }
}
