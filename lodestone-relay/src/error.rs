//! Error types for the scanner.

use thiserror::Error;

use lodestone_core::{AccountId, Hash};
use lodestone_ethereum::EthereumError;
use lodestone_parachain::ParachainError;
use lodestone_relaychain::RelaychainError;

/// Errors that abort a scan.
///
/// Transport errors surface verbatim from the chain connections; the
/// remaining variants are structural contract violations between what the
/// chains report. All of them discard partial results. The one soft
/// condition, a bundle proof whose recomputed root does not match its
/// commitment, only becomes `ProofRootMismatch` under strict verification;
/// the lenient default absorbs it per account.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Ethereum connection error.
    #[error("ethereum: {0}")]
    Ethereum(#[from] EthereumError),

    /// Parachain connection error.
    #[error("parachain: {0}")]
    Parachain(#[from] ParachainError),

    /// Relay-chain connection error.
    #[error("relay chain: {0}")]
    Relaychain(#[from] RelaychainError),

    /// The relay chain does not know the parachain at the expected block.
    #[error("parachain {0} is not registered on the relay chain")]
    NotRegistered(u32),

    /// A commitment digest item has no matching `Committed` event.
    #[error("committed event not found in block {block}")]
    EventsMissing {
        /// Parachain block number.
        block: u64,
    },

    /// Digest item and `Committed` event disagree on the commitment hash.
    #[error(
        "commitment hash mismatch in block {block}: digest has {digest}, event has {event}"
    )]
    CommitmentHashMismatch {
        /// Parachain block number.
        block: u64,
        /// Hash announced in the header digest.
        digest: Hash,
        /// Hash reported by the event.
        event: Hash,
    },

    /// `ValidationData` is absent for a candidate block.
    #[error("validation data not found for parachain block {block}")]
    ValidationDataMissing {
        /// Parachain block number.
        block: u64,
    },

    /// No relay block in the finalization window includes the candidate.
    #[error("no relay block in [{start}, {end}) includes parachain block {para_block}")]
    InclusionNotFound {
        /// Parachain block number searched for.
        para_block: u64,
        /// First relay block of the window.
        start: u64,
        /// One past the last relay block of the window.
        end: u64,
    },

    /// A bundle proof's recomputed root does not match the commitment
    /// (strict verification only).
    #[error("proof root {computed} does not match commitment {expected} for account {account}")]
    ProofRootMismatch {
        /// Account whose bundle the proof covers.
        account: AccountId,
        /// Root recomputed from the fetched proof.
        computed: Hash,
        /// Commitment hash from the header digest.
        expected: Hash,
    },

    /// The caller's cancellation handle fired.
    #[error("scan cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
