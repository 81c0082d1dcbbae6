//! The scan entry point.

use std::sync::Arc;

use tracing::{debug, info};

use lodestone_ethereum::InboundChannelApi;
use lodestone_parachain::{EventQueryApi, ParachainApi};
use lodestone_relaychain::RelaychainApi;

use crate::cancel::CancelToken;
use crate::config::RelayConfig;
use crate::error::ScanError;
use crate::inclusion::InclusionResolver;
use crate::nonces::undelivered_nonces;
use crate::task::Task;
use crate::walker::CommitmentWalker;

/// Discovers parachain message commitments that need to be relayed and can
/// be proven under the MMR root attested at a given BEEFY block.
///
/// A scan works in four steps:
///
/// 1. Compare channel nonces on both sides of the bridge; exit early if
///    nothing is undelivered.
/// 2. Walk parachain blocks backwards from the head finalized at the BEEFY
///    anchor to find the commitments carrying the missing nonces.
/// 3. Fetch and verify a bundle-inclusion proof for every missing bundle.
/// 4. For every block with collected proofs, determine the relay block that
///    included it and snapshot the parachain-head registry there.
///
/// The scanner holds its chain connections for its lifetime and keeps no
/// other state; repeating a scan against unchanged chains yields the same
/// tasks.
pub struct Scanner {
    config: RelayConfig,
    inbound: Arc<dyn InboundChannelApi>,
    parachain: Arc<dyn ParachainApi>,
    relaychain: Arc<dyn RelaychainApi>,
    events: Arc<dyn EventQueryApi>,
}

impl Scanner {
    /// Create a scanner over the given connections.
    pub fn new(
        config: RelayConfig,
        inbound: Arc<dyn InboundChannelApi>,
        parachain: Arc<dyn ParachainApi>,
        relaychain: Arc<dyn RelaychainApi>,
        events: Arc<dyn EventQueryApi>,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self {
            config,
            inbound,
            parachain,
            relaychain,
            events,
        })
    }

    /// Scan without a cancellation handle.
    pub async fn scan(&self, beefy_block_number: u64) -> Result<Vec<Task>, ScanError> {
        self.scan_with_cancel(beefy_block_number, CancelToken::never())
            .await
    }

    /// Scan for all commitments provable at `beefy_block_number`.
    ///
    /// Returns the complete task list in ascending parachain block order,
    /// or the first hard error; on cancellation partial results are
    /// discarded.
    pub async fn scan_with_cancel(
        &self,
        beefy_block_number: u64,
        cancel: CancelToken,
    ) -> Result<Vec<Task>, ScanError> {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        // BEEFY attests what was final at the previous relay block, so the
        // last finalized parachain head is read there.
        let anchor = beefy_block_number.saturating_sub(1);
        let relay_hash = self.relaychain.block_hash(anchor).await?;

        let para_head = self
            .relaychain
            .parachain_head(&relay_hash, self.config.para_id)
            .await?
            .ok_or(ScanError::NotRegistered(self.config.para_id))?;

        let last_para_block = u64::from(para_head.number);
        let para_hash = self.parachain.block_hash(last_para_block).await?;

        let targets = undelivered_nonces(
            &*self.inbound,
            &*self.parachain,
            &self.config.accounts,
            &para_hash,
            &cancel,
        )
        .await?;

        if targets.is_empty() {
            debug!(last_para_block, "all nonces delivered, nothing to relay");
            return Ok(Vec::new());
        }

        info!(
            accounts = targets.len(),
            last_para_block, "nonces are mismatched, scanning for commitments that need to be relayed"
        );

        let walker = CommitmentWalker::new(
            &*self.parachain,
            &*self.events,
            self.config.strict_proof_verification,
        );
        let mut tasks = walker.walk(last_para_block, &targets, &cancel).await?;

        let resolver =
            InclusionResolver::new(&*self.parachain, &*self.relaychain, self.config.para_id);
        resolver.resolve(&mut tasks, &cancel).await?;

        Ok(tasks)
    }
}
