//! End-to-end scan scenarios against mock chains.
//!
//! Every commitment block built here carries a real Keccak Merkle tree
//! over its bundles, so the proofs the scanner fetches verify exactly as
//! they would against a live chain.

use std::sync::Arc;

use lodestone_core::{AccountId, Hash, Header, Message, MessageBundle};
use lodestone_ethereum::mock::MockInboundChannel;
use lodestone_parachain::mock::{MockBlock, MockParachain};
use lodestone_relay::{CancelToken, RelayConfig, ScanError, Scanner};
use lodestone_relaychain::mock::MockRelaychain;

const PARA_ID: u32 = 1013;
const BEEFY_BLOCK: u64 = 2000;

fn account(tag: u8) -> AccountId {
    AccountId::from_bytes([tag; 32])
}

fn bundle(account_tag: u8, nonce: u64) -> MessageBundle {
    MessageBundle {
        account: account(account_tag),
        nonce,
        messages: vec![Message {
            target: [0xee; 20],
            payload: vec![nonce as u8],
        }],
    }
}

fn bare_header(number: u32) -> Header {
    Header {
        parent_hash: Hash::ZERO,
        number,
        state_root: Hash::ZERO,
        extrinsics_root: Hash::ZERO,
        digest: vec![],
    }
}

struct Fixture {
    eth: Arc<MockInboundChannel>,
    para: Arc<MockParachain>,
    relay: Arc<MockRelaychain>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            eth: Arc::new(MockInboundChannel::new()),
            para: Arc::new(MockParachain::new()),
            relay: Arc::new(MockRelaychain::new()),
        }
    }

    fn scanner(&self, config: RelayConfig) -> Scanner {
        Scanner::new(
            config,
            self.eth.clone(),
            self.para.clone(),
            self.relay.clone(),
            self.para.clone(),
        )
        .expect("valid config")
    }

    /// Register the relay block the scan anchors on (`BEEFY_BLOCK - 1`)
    /// with the given parachain head.
    fn set_anchor(&self, head: Header) {
        self.relay
            .insert_block(BEEFY_BLOCK - 1, vec![(PARA_ID, head)]);
    }
}

/// S1: nonces already equal; the result is empty and no block walk occurs.
///
/// Only the head block exists on the mock parachain, so any walk I/O would
/// surface as a block-not-found error.
#[tokio::test]
async fn scan_with_no_drift_is_empty() {
    let f = Fixture::new();
    let a = account(1);
    f.eth.set_nonce(a, 5);

    let head = MockBlock::plain(100).with_nonce(a, 5);
    f.set_anchor(head.header.clone());
    f.para.insert(head);

    let tasks = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]))
        .scan(BEEFY_BLOCK)
        .await
        .unwrap();
    assert!(tasks.is_empty());
}

/// S2: one missing nonce, one commitment, full proof-input assembly.
#[tokio::test]
async fn scan_single_missing_nonce() {
    let f = Fixture::new();
    let a = account(1);
    f.eth.set_nonce(a, 5);

    let head = MockBlock::plain(100).with_nonce(a, 6);
    f.set_anchor(head.header.clone());
    f.para.insert(head);
    f.para.insert(MockBlock::plain(99));
    f.para.insert(MockBlock::plain(98));

    let commit = MockBlock::with_commitment(97, vec![bundle(1, 6)]).with_validation_data(1000);
    let commit_header = commit.header.clone();
    let root = commit.commitment_root().unwrap();
    f.para.insert(commit);

    // Backed at relay 1000; not yet visible at 1001, included at 1002.
    f.relay
        .insert_block(1001, vec![(PARA_ID, bare_header(96))]);
    f.relay.insert_block(
        1002,
        vec![(PARA_ID, commit_header.clone()), (2087, bare_header(40))],
    );

    let tasks = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]))
        .scan(BEEFY_BLOCK)
        .await
        .unwrap();

    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.header, commit_header);
    assert_eq!(task.basic_channel_proofs.len(), 1);

    let proof = &task.basic_channel_proofs[0];
    assert_eq!(proof.bundle.account, a);
    assert_eq!(proof.bundle.nonce, 6);
    assert_eq!(proof.proof.root, root);

    let input = task.proof_input.as_ref().unwrap();
    assert_eq!(input.para_id, PARA_ID);
    assert_eq!(input.relay_block_number, 1002);
    assert_eq!(
        input.para_heads.iter().map(|h| h.para_id).collect::<Vec<_>>(),
        vec![PARA_ID, 2087]
    );
    let ours = input
        .para_heads
        .iter()
        .find(|h| h.para_id == PARA_ID)
        .unwrap();
    assert_eq!(ours.header, task.header);
}

/// S3: two accounts across three commitment blocks. Account B finishes at
/// the newest commitment; account A collects a proof from each block down
/// to its first missing nonce.
#[tokio::test]
async fn scan_multi_account_multi_block() {
    let f = Fixture::new();
    let a = account(1);
    let b = account(2);
    f.eth.set_nonce(a, 5);
    f.eth.set_nonce(b, 3);

    let head = MockBlock::plain(100).with_nonce(a, 8).with_nonce(b, 4);
    f.set_anchor(head.header.clone());
    f.para.insert(head);
    f.para.insert(MockBlock::plain(99));

    let commit_98 =
        MockBlock::with_commitment(98, vec![bundle(1, 8), bundle(2, 4)]).with_validation_data(1010);
    let commit_95 = MockBlock::with_commitment(95, vec![bundle(1, 7)]).with_validation_data(1007);
    let commit_92 = MockBlock::with_commitment(92, vec![bundle(1, 6)]).with_validation_data(1004);

    f.relay
        .insert_block(1011, vec![(PARA_ID, commit_98.header.clone())]);
    f.relay
        .insert_block(1008, vec![(PARA_ID, commit_95.header.clone())]);
    f.relay
        .insert_block(1005, vec![(PARA_ID, commit_92.header.clone())]);

    f.para.insert(commit_98);
    f.para.insert(MockBlock::plain(97));
    f.para.insert(MockBlock::plain(96));
    f.para.insert(commit_95);
    f.para.insert(MockBlock::plain(94));
    f.para.insert(MockBlock::plain(93));
    f.para.insert(commit_92);

    let scanner = f.scanner(RelayConfig::new(PARA_ID, vec![a, b]));
    let tasks = scanner.scan(BEEFY_BLOCK).await.unwrap();

    let numbers: Vec<u32> = tasks.iter().map(|t| t.header.number).collect();
    assert_eq!(numbers, vec![92, 95, 98]);

    let nonces_for = |account: AccountId| -> Vec<u64> {
        tasks
            .iter()
            .flat_map(|t| &t.basic_channel_proofs)
            .filter(|p| p.bundle.account == account)
            .map(|p| p.bundle.nonce)
            .collect()
    };
    assert_eq!(nonces_for(a), vec![6, 7, 8]);
    assert_eq!(nonces_for(b), vec![4]);

    // Every collected nonce is at or above the account's first missing one.
    for proof in tasks.iter().flat_map(|t| &t.basic_channel_proofs) {
        let target = if proof.bundle.account == a { 6 } else { 4 };
        assert!(proof.bundle.nonce >= target);
    }

    // Idempotence: an identical scan yields identical tasks.
    let again = scanner.scan(BEEFY_BLOCK).await.unwrap();
    assert_eq!(again, tasks);
}

/// S4: the target nonce is not committed anywhere yet; seeing a smaller
/// nonce halts the account and the scan comes back empty.
#[tokio::test]
async fn scan_halts_on_uncommitted_nonce() {
    let f = Fixture::new();
    let a = account(1);
    f.eth.set_nonce(a, 5);

    let head = MockBlock::plain(100).with_nonce(a, 6);
    f.set_anchor(head.header.clone());
    f.para.insert(head);
    f.para.insert(MockBlock::plain(99));
    f.para
        .insert(MockBlock::with_commitment(98, vec![bundle(1, 5)]).with_validation_data(1000));

    let tasks = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]))
        .scan(BEEFY_BLOCK)
        .await
        .unwrap();
    assert!(tasks.is_empty());
}

/// S5: a proof that fails root verification halts only its account; the
/// other account's proof is still delivered and no error surfaces.
#[tokio::test]
async fn scan_survives_proof_root_mismatch() {
    let f = Fixture::new();
    let a = account(1);
    let b = account(2);
    f.eth.set_nonce(a, 5);
    f.eth.set_nonce(b, 2);

    let head = MockBlock::plain(92).with_nonce(a, 6).with_nonce(b, 3);
    f.set_anchor(head.header.clone());
    f.para.insert(head);
    f.para.insert(MockBlock::plain(91));

    let commit =
        MockBlock::with_commitment(90, vec![bundle(1, 6), bundle(2, 3)]).with_validation_data(1000);
    let commit_header = commit.header.clone();
    let root = commit.commitment_root().unwrap();
    f.para.insert(commit);
    f.para.corrupt_proof(root, 0);

    f.relay
        .insert_block(1001, vec![(PARA_ID, commit_header)]);

    let tasks = f
        .scanner(RelayConfig::new(PARA_ID, vec![a, b]))
        .scan(BEEFY_BLOCK)
        .await
        .unwrap();

    assert_eq!(tasks.len(), 1);
    let proofs = &tasks[0].basic_channel_proofs;
    assert_eq!(proofs.len(), 1);
    assert_eq!(proofs[0].bundle.account, b);
}

/// Under strict verification the same mismatch is a hard error.
#[tokio::test]
async fn strict_mode_fails_on_proof_root_mismatch() {
    let f = Fixture::new();
    let a = account(1);
    f.eth.set_nonce(a, 5);

    let head = MockBlock::plain(92).with_nonce(a, 6);
    f.set_anchor(head.header.clone());
    f.para.insert(head);
    f.para.insert(MockBlock::plain(91));

    let commit = MockBlock::with_commitment(90, vec![bundle(1, 6)]).with_validation_data(1000);
    let root = commit.commitment_root().unwrap();
    f.para.insert(commit);
    f.para.corrupt_proof(root, 0);

    let result = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]).with_strict_proofs())
        .scan(BEEFY_BLOCK)
        .await;
    assert!(matches!(result, Err(ScanError::ProofRootMismatch { .. })));
}

/// S6: the candidate never shows up in the four-block inclusion window.
#[tokio::test]
async fn scan_fails_when_inclusion_window_exhausted() {
    let f = Fixture::new();
    let a = account(1);
    f.eth.set_nonce(a, 5);

    let head = MockBlock::plain(100).with_nonce(a, 6);
    f.set_anchor(head.header.clone());
    f.para.insert(head);
    f.para.insert(MockBlock::plain(99));
    f.para.insert(MockBlock::plain(98));
    f.para
        .insert(MockBlock::with_commitment(97, vec![bundle(1, 6)]).with_validation_data(1000));

    for relay_number in 1001..1005 {
        f.relay
            .insert_block(relay_number, vec![(PARA_ID, bare_header(95))]);
    }

    let result = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]))
        .scan(BEEFY_BLOCK)
        .await;
    assert!(matches!(
        result,
        Err(ScanError::InclusionNotFound {
            para_block: 97,
            start: 1001,
            end: 1005,
        })
    ));
}

/// A commitment digest item with no matching event is chain/RPC
/// disagreement, not something to skip.
#[tokio::test]
async fn scan_fails_on_missing_event() {
    let f = Fixture::new();
    let a = account(1);
    f.eth.set_nonce(a, 5);

    let head = MockBlock::plain(98).with_nonce(a, 6);
    f.set_anchor(head.header.clone());
    f.para.insert(head);
    f.para.insert(
        MockBlock::with_commitment(97, vec![bundle(1, 6)])
            .with_validation_data(1000)
            .without_event(),
    );

    let result = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]))
        .scan(BEEFY_BLOCK)
        .await;
    assert!(matches!(
        result,
        Err(ScanError::EventsMissing { block: 97 })
    ));
}

/// Digest item and event disagreeing on the commitment hash is fatal.
#[tokio::test]
async fn scan_fails_on_commitment_hash_mismatch() {
    let f = Fixture::new();
    let a = account(1);
    f.eth.set_nonce(a, 5);

    let head = MockBlock::plain(98).with_nonce(a, 6);
    f.set_anchor(head.header.clone());
    f.para.insert(head);
    f.para.insert(
        MockBlock::with_commitment(97, vec![bundle(1, 6)])
            .with_validation_data(1000)
            .with_event_hash(Hash::from_bytes([0xde; 32])),
    );

    let result = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]))
        .scan(BEEFY_BLOCK)
        .await;
    assert!(matches!(
        result,
        Err(ScanError::CommitmentHashMismatch { block: 97, .. })
    ));
}

/// An unregistered parachain at the anchor block fails the scan.
#[tokio::test]
async fn scan_fails_when_parachain_not_registered() {
    let f = Fixture::new();
    f.relay
        .insert_block(BEEFY_BLOCK - 1, vec![(999, bare_header(1))]);

    let result = f
        .scanner(RelayConfig::new(PARA_ID, vec![account(1)]))
        .scan(BEEFY_BLOCK)
        .await;
    assert!(matches!(result, Err(ScanError::NotRegistered(PARA_ID))));
}

/// Bundles for accounts outside the watched set are ignored.
#[tokio::test]
async fn scan_skips_unwatched_accounts() {
    let f = Fixture::new();
    let a = account(1);
    f.eth.set_nonce(a, 5);

    let head = MockBlock::plain(98).with_nonce(a, 6);
    f.set_anchor(head.header.clone());
    f.para.insert(head);

    let commit = MockBlock::with_commitment(97, vec![bundle(9, 50), bundle(1, 6)])
        .with_validation_data(1000);
    let commit_header = commit.header.clone();
    f.para.insert(commit);
    f.relay.insert_block(1001, vec![(PARA_ID, commit_header)]);

    let tasks = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]))
        .scan(BEEFY_BLOCK)
        .await
        .unwrap();

    assert_eq!(tasks.len(), 1);
    let proofs = &tasks[0].basic_channel_proofs;
    assert_eq!(proofs.len(), 1);
    assert_eq!(proofs[0].bundle.account, a);
}

/// A fired cancellation handle aborts the scan with no partial results.
#[tokio::test]
async fn cancelled_scan_returns_cancelled() {
    let f = Fixture::new();
    let a = account(1);

    let head = MockBlock::plain(100).with_nonce(a, 6);
    f.set_anchor(head.header.clone());
    f.para.insert(head);

    let (handle, token) = CancelToken::channel();
    handle.cancel();

    let result = f
        .scanner(RelayConfig::new(PARA_ID, vec![a]))
        .scan_with_cancel(BEEFY_BLOCK, token)
        .await;
    assert!(matches!(result, Err(ScanError::Cancelled)));
}
