//! Core primitives for the Lodestone bridge relayer.
//!
//! This crate carries the types shared by every chain surface and by the
//! scanner:
//!
//! - 32-byte [`Hash`] and [`AccountId`] newtypes
//! - the parachain [`Header`] with its SCALE digest, and the auxiliary
//!   digest items the outbound channel emits
//! - [`MessageBundle`] and the `Committed` event payload
//! - Keccak-256 bundle Merkle proofs ([`merkle`])
//! - Substrate storage-key construction ([`storage`])
//!
//! Everything here is pure data and hashing; no I/O.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod bundle;
mod error;
mod hash;
mod header;

pub mod merkle;
pub mod storage;

pub use bundle::{CommittedEvent, Message, MessageBundle};
pub use error::{Error, Result};
pub use hash::{AccountId, Hash};
pub use header::{
    auxiliary_digest_items, AuxiliaryDigestItem, ChannelId, ConsensusEngineId, DigestItem, Header,
};
pub use merkle::{MerkleProof, RawMerkleProof};
