//! Backward walk over parachain blocks to find undelivered commitments.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use lodestone_core::{
    auxiliary_digest_items, AccountId, AuxiliaryDigestItem, Hash, MerkleProof, MessageBundle,
};
use lodestone_parachain::{EventQueryApi, ParachainApi, ParachainError};

use crate::cancel::CancelToken;
use crate::error::ScanError;
use crate::task::{BundleProof, Task};

/// Scans parachain blocks backwards from a starting head until every
/// account's first missing nonce has been found or ruled out.
///
/// Each account moves through a two-state machine, searching to done. An
/// account is done once its target nonce is collected, once a bundle with a
/// smaller nonce shows the target is not committed yet, or once a bundle
/// proof for it fails root verification (lenient mode). The walk ends when
/// no account is searching or the chain start is reached.
pub(crate) struct CommitmentWalker<'a> {
    parachain: &'a dyn ParachainApi,
    events: &'a dyn EventQueryApi,
    strict_proofs: bool,
}

impl<'a> CommitmentWalker<'a> {
    pub(crate) fn new(
        parachain: &'a dyn ParachainApi,
        events: &'a dyn EventQueryApi,
        strict_proofs: bool,
    ) -> Self {
        Self {
            parachain,
            events,
            strict_proofs,
        }
    }

    /// Walk from `start` down to block 1, collecting one task per block
    /// that yields at least one bundle proof. Tasks are returned in
    /// ascending block-number order.
    pub(crate) async fn walk(
        &self,
        start: u64,
        targets: &BTreeMap<AccountId, u64>,
        cancel: &CancelToken,
    ) -> Result<Vec<Task>, ScanError> {
        let mut searching: BTreeSet<AccountId> = targets.keys().copied().collect();
        let mut tasks: Vec<Task> = Vec::new();
        let mut current = start;

        while !searching.is_empty() && current > 0 {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            debug!(block = current, "checking header");

            let block_hash = self.parachain.block_hash(current).await?;
            let header = self.parachain.header(&block_hash).await?;

            let digest_items =
                auxiliary_digest_items(&header.digest).map_err(ParachainError::from)?;
            let commitments: Vec<Hash> = digest_items
                .iter()
                .filter_map(AuxiliaryDigestItem::as_basic_commitment)
                .collect();

            if commitments.is_empty() {
                current -= 1;
                continue;
            }

            let event = self.events.committed_event(&block_hash).await?;

            let mut proofs: Vec<BundleProof> = Vec::new();
            for digest_hash in commitments {
                if searching.is_empty() {
                    break;
                }

                let event = event
                    .as_ref()
                    .ok_or(ScanError::EventsMissing { block: current })?;
                if event.hash != digest_hash {
                    return Err(ScanError::CommitmentHashMismatch {
                        block: current,
                        digest: digest_hash,
                        event: event.hash,
                    });
                }

                let collected = self
                    .scan_bundle_proofs(digest_hash, targets, &mut searching, &event.bundles)
                    .await?;
                proofs.extend(collected);
            }

            if !proofs.is_empty() {
                tasks.push(Task {
                    header,
                    basic_channel_proofs: proofs,
                    proof_input: None,
                });
            }

            current -= 1;
        }

        tasks.sort_by_key(|task| task.header.number);
        Ok(tasks)
    }

    /// Inspect the bundles of one commitment in leaf order, fetching and
    /// verifying a proof for every bundle that belongs to a searching
    /// account.
    async fn scan_bundle_proofs(
        &self,
        digest_hash: Hash,
        targets: &BTreeMap<AccountId, u64>,
        searching: &mut BTreeSet<AccountId>,
        bundles: &[MessageBundle],
    ) -> Result<Vec<BundleProof>, ScanError> {
        let mut proofs = Vec::new();

        for (index, bundle) in bundles.iter().enumerate() {
            if !searching.contains(&bundle.account) {
                continue;
            }

            let target = targets[&bundle.account];

            // A smaller nonce means the target has not been committed yet;
            // commitments are emitted every few blocks, so nothing earlier
            // in the chain can hold it either.
            if bundle.nonce < target {
                debug!(
                    account = %bundle.account,
                    nonce = bundle.nonce,
                    target,
                    "halting scan for account: messages not committed yet"
                );
                searching.remove(&bundle.account);
                continue;
            }

            let raw = self
                .parachain
                .merkle_proof(&digest_hash, index as u64)
                .await?;
            let proof = MerkleProof::from_raw(raw).map_err(ParachainError::from)?;

            if proof.root != digest_hash {
                if self.strict_proofs {
                    return Err(ScanError::ProofRootMismatch {
                        account: bundle.account,
                        computed: proof.root,
                        expected: digest_hash,
                    });
                }
                warn!(
                    account = %bundle.account,
                    computed = %proof.root,
                    expected = %digest_hash,
                    "halting scan for account: bundle proof root does not match the commitment hash"
                );
                searching.remove(&bundle.account);
                continue;
            }

            let found_target = bundle.nonce == target;
            proofs.push(BundleProof {
                bundle: bundle.clone(),
                proof,
            });
            if found_target {
                searching.remove(&bundle.account);
            }
        }

        Ok(proofs)
    }
}
