//! Resolution of the relay block that included each candidate parachain
//! block.

use tracing::debug;

use lodestone_parachain::ParachainApi;
use lodestone_relaychain::RelaychainApi;

use crate::cancel::CancelToken;
use crate::error::ScanError;
use crate::task::{ProofInput, Task};

/// The process for finalizing a backed parachain header times out after
/// this many relay blocks.
pub(crate) const FINALIZATION_TIMEOUT: u64 = 4;

/// Attaches a [`ProofInput`] to every task: the relay block in which the
/// task's parachain block was included (usually 2-3 blocks after the block
/// it was backed in) and the full parachain-head registry at that relay
/// block.
pub(crate) struct InclusionResolver<'a> {
    parachain: &'a dyn ParachainApi,
    relaychain: &'a dyn RelaychainApi,
    para_id: u32,
}

impl<'a> InclusionResolver<'a> {
    pub(crate) fn new(
        parachain: &'a dyn ParachainApi,
        relaychain: &'a dyn RelaychainApi,
        para_id: u32,
    ) -> Self {
        Self {
            parachain,
            relaychain,
            para_id,
        }
    }

    pub(crate) async fn resolve(
        &self,
        tasks: &mut [Task],
        cancel: &CancelToken,
    ) -> Result<(), ScanError> {
        for task in tasks {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }

            debug!(
                para_block = task.header.number,
                "gathering proof input for parachain header"
            );

            let relay_block_number = self
                .find_inclusion_block(u64::from(task.header.number))
                .await?;

            let relay_hash = self.relaychain.block_hash(relay_block_number).await?;
            let para_heads = self.relaychain.parachain_heads(&relay_hash).await?;

            task.proof_input = Some(ProofInput {
                para_id: self.para_id,
                relay_block_number,
                para_heads,
            });
        }

        Ok(())
    }

    /// Find the relay block in which the parachain block was included.
    ///
    /// The search starts one past the block's relay parent and is bounded
    /// by [`FINALIZATION_TIMEOUT`]: a backed candidate either makes it into
    /// the finalized registry within that window or is dropped, so a longer
    /// scan could only mask a bug.
    async fn find_inclusion_block(&self, para_block: u64) -> Result<u64, ScanError> {
        let para_hash = self.parachain.block_hash(para_block).await?;

        let validation_data = self
            .parachain
            .validation_data(&para_hash)
            .await?
            .ok_or(ScanError::ValidationDataMissing { block: para_block })?;

        let start = u64::from(validation_data.relay_parent_number) + 1;
        for relay_number in start..start + FINALIZATION_TIMEOUT {
            let relay_hash = self.relaychain.block_hash(relay_number).await?;
            let head = self
                .relaychain
                .parachain_head(&relay_hash, self.para_id)
                .await?
                .ok_or(ScanError::NotRegistered(self.para_id))?;

            if u64::from(head.number) == para_block {
                return Ok(relay_number);
            }
        }

        Err(ScanError::InclusionNotFound {
            para_block,
            start,
            end: start + FINALIZATION_TIMEOUT,
        })
    }
}
