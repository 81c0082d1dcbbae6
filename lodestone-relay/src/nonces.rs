//! Nonce comparison between the two sides of the bridge.

use std::collections::BTreeMap;

use tracing::info;

use lodestone_core::{AccountId, Hash};
use lodestone_ethereum::InboundChannelApi;
use lodestone_parachain::ParachainApi;

use crate::cancel::CancelToken;
use crate::error::ScanError;

/// Compare delivered and generated nonces for every watched account.
///
/// Returns `account -> first missing nonce` for accounts whose parachain
/// nonce is ahead of the delivered one. The Ethereum read uses pending
/// state; the parachain read uses state at `para_hash`, the head the scan
/// anchors on, never the latest block.
pub(crate) async fn undelivered_nonces(
    inbound: &dyn InboundChannelApi,
    parachain: &dyn ParachainApi,
    accounts: &[AccountId],
    para_hash: &Hash,
    cancel: &CancelToken,
) -> Result<BTreeMap<AccountId, u64>, ScanError> {
    let mut targets = BTreeMap::new();

    for account in accounts {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let eth_nonce = inbound.nonce(account).await?;
        info!(
            account = %account,
            nonce = eth_nonce,
            "checked latest nonce delivered to the inbound channel"
        );

        let para_nonce = parachain
            .outbound_nonce(account, para_hash)
            .await?
            .unwrap_or(0);
        info!(
            account = %account,
            nonce = para_nonce,
            "checked latest nonce generated by the outbound channel"
        );

        if para_nonce > eth_nonce {
            targets.insert(*account, eth_nonce + 1);
        }
    }

    Ok(targets)
}
