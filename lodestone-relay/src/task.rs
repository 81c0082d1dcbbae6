//! The unit of work a scan produces.

use lodestone_core::{Header, MerkleProof, MessageBundle};
use lodestone_relaychain::ParaHead;

/// A bundle together with its inclusion proof.
///
/// The proof's recomputed root equals the commitment hash announced in the
/// digest item of the block the bundle was committed in.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleProof {
    /// The committed bundle.
    pub bundle: MessageBundle,
    /// Proof tying the bundle to the commitment root.
    pub proof: MerkleProof,
}

/// Everything a consumer needs to build an MMR-leaf membership proof for a
/// task's parachain block.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofInput {
    /// Id of the relayed parachain.
    pub para_id: u32,
    /// Relay block in which the parachain block was included.
    pub relay_block_number: u64,
    /// All parachain heads at that relay block, ascending by para id.
    pub para_heads: Vec<ParaHead>,
}

/// One parachain block with undelivered commitments.
///
/// Produced by a scan in ascending block-number order and consumed by the
/// delivery pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Header of the parachain block carrying the commitment.
    pub header: Header,
    /// Proofs for the undelivered bundles found in this block.
    pub basic_channel_proofs: Vec<BundleProof>,
    /// Inclusion context, attached after the walk.
    pub proof_input: Option<ProofInput>,
}
