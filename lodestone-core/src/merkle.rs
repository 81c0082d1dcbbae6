//! Keccak-256 Merkle proofs over committed bundles.
//!
//! A commitment root is the Merkle root over the SCALE encodings of the
//! bundles committed in one block. The parachain RPC returns a
//! [`RawMerkleProof`] for one bundle; [`MerkleProof::from_raw`] recomputes
//! the root from the leaf and sibling path, so a verified proof's `root`
//! can be compared directly against the commitment hash announced in the
//! header digest.
//!
//! Parent hashing is `keccak256(left || right)`. Sibling position is a
//! 64-bit bitfield derived from the leaf index: bit `i` set means the
//! sibling sits on the left at level `i`.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::error::{Error, Result};
use crate::hash::Hash;

/// Hash arbitrary data with Keccak-256.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut keccak = Keccak::v256();
    keccak.update(data);
    let mut out = [0u8; 32];
    keccak.finalize(&mut out);
    Hash::from_bytes(out)
}

/// Hash two child hashes to produce a parent hash.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut keccak = Keccak::v256();
    keccak.update(left.as_bytes());
    keccak.update(right.as_bytes());
    let mut out = [0u8; 32];
    keccak.finalize(&mut out);
    Hash::from_bytes(out)
}

/// A bundle-inclusion proof as returned by the parachain RPC, SCALE encoded.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct RawMerkleProof {
    /// Root claimed by the prover.
    pub root: Hash,
    /// Sibling hashes, leaf level first.
    pub proof: Vec<Hash>,
    /// Total number of leaves in the tree.
    pub number_of_leaves: u64,
    /// Index of the proven leaf.
    pub leaf_index: u64,
    /// The leaf data (a SCALE-encoded bundle).
    pub leaf: Vec<u8>,
}

/// A verified bundle-inclusion proof.
///
/// `root` is recomputed from `leaf` and the sibling path, never taken from
/// the prover's claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Root recomputed from the leaf and sibling path.
    pub root: Hash,
    /// Sibling hashes, leaf level first.
    pub inner_hashes: Vec<Hash>,
    /// Sibling-position bitfield: bit `i` set means the sibling is on the
    /// left at level `i`.
    pub hash_sides: u64,
    /// The leaf data.
    pub leaf: Vec<u8>,
}

impl MerkleProof {
    /// Rebuild a proof from its raw RPC form, recomputing the root.
    pub fn from_raw(raw: RawMerkleProof) -> Result<Self> {
        if raw.proof.len() > 64 {
            return Err(Error::InvalidProof(format!(
                "sibling path too long: {}",
                raw.proof.len()
            )));
        }
        if raw.number_of_leaves == 0 {
            return Err(Error::InvalidProof("empty tree".into()));
        }
        if raw.leaf_index >= raw.number_of_leaves {
            return Err(Error::InvalidProof(format!(
                "leaf index {} out of range for {} leaves",
                raw.leaf_index, raw.number_of_leaves
            )));
        }

        let hash_sides = raw.leaf_index;
        let root = compute_root(&raw.leaf, &raw.proof, hash_sides);

        Ok(Self {
            root,
            inner_hashes: raw.proof,
            hash_sides,
            leaf: raw.leaf,
        })
    }
}

/// Fold a leaf and sibling path into a root.
fn compute_root(leaf: &[u8], siblings: &[Hash], hash_sides: u64) -> Hash {
    let mut current = keccak256(leaf);
    for (level, sibling) in siblings.iter().enumerate() {
        current = if hash_sides >> level & 1 == 1 {
            hash_pair(sibling, &current)
        } else {
            hash_pair(&current, sibling)
        };
    }
    current
}

/// Compute the Merkle root over a set of leaves.
///
/// Leaves are padded to the next power of two by repeating the last leaf
/// hash. An empty set yields the zero hash.
pub fn merkle_root(leaves: &[Vec<u8>]) -> Hash {
    if leaves.is_empty() {
        return Hash::ZERO;
    }

    let mut hashes: Vec<Hash> = leaves.iter().map(|leaf| keccak256(leaf)).collect();

    let target_len = hashes.len().next_power_of_two();
    if let Some(last) = hashes.last().copied() {
        while hashes.len() < target_len {
            hashes.push(last);
        }
    }

    while hashes.len() > 1 {
        let mut next = Vec::with_capacity(hashes.len() / 2);
        for pair in hashes.chunks(2) {
            next.push(hash_pair(&pair[0], &pair[1]));
        }
        hashes = next;
    }

    hashes[0]
}

/// Generate a proof for the leaf at `index`.
///
/// Returns `None` if the index is out of range. The same padding rule as
/// [`merkle_root`] applies, so the proof folds back to that root.
pub fn merkle_proof(leaves: &[Vec<u8>], index: usize) -> Option<RawMerkleProof> {
    if index >= leaves.len() {
        return None;
    }

    let mut hashes: Vec<Hash> = leaves.iter().map(|leaf| keccak256(leaf)).collect();

    let target_len = hashes.len().next_power_of_two();
    if let Some(last) = hashes.last().copied() {
        while hashes.len() < target_len {
            hashes.push(last);
        }
    }

    let mut proof = Vec::new();
    let mut idx = index;

    while hashes.len() > 1 {
        let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
        proof.push(hashes[sibling_idx]);

        let mut next = Vec::with_capacity(hashes.len() / 2);
        for pair in hashes.chunks(2) {
            next.push(hash_pair(&pair[0], &pair[1]));
        }
        hashes = next;
        idx /= 2;
    }

    Some(RawMerkleProof {
        root: hashes[0],
        proof,
        number_of_leaves: leaves.len() as u64,
        leaf_index: index as u64,
        leaf: leaves[index].clone(),
    })
}
