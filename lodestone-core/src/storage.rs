//! Substrate storage-key construction.
//!
//! Keys follow the standard layout: `twox128(pallet) ++ twox128(item)` for
//! plain values, with the map key appended after the item prefix. The
//! outbound channel's nonce map uses an identity-encoded account key; the
//! relay chain's parachain-heads map uses `twox64concat`.

use std::fmt;

use twox_hash::XxHash64;

/// Compute the twox128 hash of `data`: two XxHash64 runs with seeds 0 and 1,
/// little-endian concatenated.
pub fn twox128(data: &[u8]) -> [u8; 16] {
    use std::hash::Hasher;

    let mut out = [0u8; 16];
    for seed in 0..2u64 {
        let mut hasher = XxHash64::with_seed(seed);
        hasher.write(data);
        out[seed as usize * 8..(seed as usize + 1) * 8]
            .copy_from_slice(&hasher.finish().to_le_bytes());
    }
    out
}

/// Compute the twox64concat hasher output for a map key: the first 8 bytes
/// of twox128 followed by the key bytes themselves.
pub fn twox64_concat(key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + key.len());
    out.extend_from_slice(&twox128(key)[..8]);
    out.extend_from_slice(key);
    out
}

/// A constructed storage key, ready for `state_getStorage`.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageKey(pub Vec<u8>);

impl StorageKey {
    /// Key of a plain (non-map) storage value.
    pub fn plain(pallet: &str, item: &str) -> Self {
        let mut key = Vec::with_capacity(32);
        key.extend_from_slice(&twox128(pallet.as_bytes()));
        key.extend_from_slice(&twox128(item.as_bytes()));
        Self(key)
    }

    /// Key of a map entry whose key is appended identity-encoded.
    pub fn map_identity(pallet: &str, item: &str, map_key: &[u8]) -> Self {
        let mut key = Self::plain(pallet, item).0;
        key.extend_from_slice(map_key);
        Self(key)
    }

    /// Key of a map entry hashed with twox64concat.
    pub fn map_twox64_concat(pallet: &str, item: &str, map_key: &[u8]) -> Self {
        let mut key = Self::plain(pallet, item).0;
        key.extend_from_slice(&twox64_concat(map_key));
        Self(key)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The `0x`-prefixed hex form used on the RPC wire.
    pub fn to_hex_prefixed(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", hex::encode(&self.0))
    }
}
