//! JSON wire forms returned by the node RPC.
//!
//! `chain_getHeader` reports headers as JSON with hex-string fields and the
//! digest as a list of SCALE-encoded log entries; this module converts that
//! form into the core [`Header`].

use parity_scale_codec::Decode;
use serde::{Deserialize, Serialize};

use lodestone_core::{DigestItem, Hash, Header};

use crate::error::{ParachainError, Result};

/// Header as returned by `chain_getHeader`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderJson {
    /// Parent hash, `0x`-prefixed.
    pub parent_hash: String,
    /// Block number as a hex string.
    pub number: String,
    /// State root, `0x`-prefixed.
    pub state_root: String,
    /// Extrinsics root, `0x`-prefixed.
    pub extrinsics_root: String,
    /// Digest log entries.
    pub digest: DigestJson,
}

/// Digest wrapper inside [`HeaderJson`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestJson {
    /// SCALE-encoded log entries, `0x`-prefixed.
    pub logs: Vec<String>,
}

impl HeaderJson {
    /// Convert into the core header, decoding every digest log.
    pub fn into_header(self) -> Result<Header> {
        let number_hex = self.number.strip_prefix("0x").unwrap_or(&self.number);
        let number = u32::from_str_radix(number_hex, 16)
            .map_err(|e| ParachainError::InvalidPayload(format!("block number: {}", e)))?;

        let mut digest = Vec::with_capacity(self.digest.logs.len());
        for log in &self.digest.logs {
            let bytes = decode_hex(log)?;
            digest.push(
                DigestItem::decode(&mut bytes.as_slice())
                    .map_err(lodestone_core::Error::Codec)?,
            );
        }

        Ok(Header {
            parent_hash: Hash::from_hex(&self.parent_hash)?,
            number,
            state_root: Hash::from_hex(&self.state_root)?,
            extrinsics_root: Hash::from_hex(&self.extrinsics_root)?,
            digest,
        })
    }
}

/// Decode a `0x`-prefixed hex payload.
pub fn decode_hex(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.strip_prefix("0x").unwrap_or(payload);
    Ok(hex::decode(payload).map_err(lodestone_core::Error::Hex)?)
}
