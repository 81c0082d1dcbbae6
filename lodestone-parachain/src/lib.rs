//! Parachain connection for the Lodestone bridge relayer.
//!
//! Exposes the parachain reads the scanner depends on: block hashes,
//! headers with their digest items, outbound-channel nonces,
//! `ValidationData`, bundle-inclusion Merkle proofs, and the out-of-band
//! `Committed`-event query.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod connection;
mod error;
mod events;
mod json;

pub mod mock;

pub use config::ParachainConfig;
pub use connection::{Connection, ParachainApi, PersistedValidationData};
pub use error::{ParachainError, Result};
pub use events::{EventQueryApi, HttpEventQuery};
pub use json::{DigestJson, HeaderJson};
