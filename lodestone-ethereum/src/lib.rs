//! Ethereum connection for the Lodestone bridge relayer.
//!
//! The relayer core is read-only on Ethereum: its single concern is the
//! basic inbound channel's `nonce(bytes32)` view, evaluated against pending
//! state. Submission, gas management and contract bindings live elsewhere.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod channel;
mod config;
mod error;

pub mod mock;

pub use channel::{Connection, InboundChannelApi};
pub use config::EthereumConfig;
pub use error::{EthereumError, Result};
