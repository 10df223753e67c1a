//! Transaction replacement (speed-up/cancel) submission
//!
//! Signs both intents of a replacement pair, dispatches the original and
//! then the replacement, and waits up to a caller-supplied grace period for
//! both submission outcomes. A rejection of either submission never blocks
//! the other; only a signing failure aborts the procedure before anything
//! reaches the network.

use crate::chain::Broadcast;
use crate::error::{OpsError, OpsResult};
use crate::tx::intent::{ReplacementPair, TxIntent};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Bytes, H256};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Terminal result of one submission, as reported by the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Accepted into the mempool
    Accepted(H256),
    /// Rejected before acceptance
    Rejected(String),
}

/// Outcomes of the two submissions. `None` means the outcome was not
/// observed within the grace period and is lost.
#[derive(Debug, Default)]
pub struct ReplacementReport {
    pub original: Option<SubmissionOutcome>,
    pub replacement: Option<SubmissionOutcome>,
}

/// Submits a replacement pair through a broadcast seam
pub struct ReplacementSubmitter<B: Broadcast> {
    broadcaster: Arc<B>,
    wallet: LocalWallet,
    chain_id: u64,
}

impl<B: Broadcast> ReplacementSubmitter<B> {
    pub fn new(broadcaster: Arc<B>, wallet: LocalWallet, chain_id: u64) -> Self {
        Self {
            broadcaster,
            wallet: wallet.with_chain_id(chain_id),
            chain_id,
        }
    }

    /// Run the replacement procedure.
    ///
    /// The original submission is dispatched before the replacement, but the
    /// two outcomes resolve independently; `grace` bounds the wait for both.
    pub async fn run(
        &self,
        pair: &ReplacementPair,
        grace: Duration,
    ) -> OpsResult<ReplacementReport> {
        // Signing is pure with respect to shared state; a failure here is
        // fatal and nothing has reached the network yet.
        let original_raw = self.sign(&pair.original).await?;
        let replacement_raw = self.sign(&pair.replacement).await?;

        let original_slot = Mutex::new(None);
        let replacement_slot = Mutex::new(None);

        let submissions = async {
            tokio::join!(
                self.submit("original", original_raw, &original_slot),
                self.submit("replacement", replacement_raw, &replacement_slot),
            );
        };

        if timeout(grace, submissions).await.is_err() {
            warn!(
                "Grace period of {:?} elapsed before both submission outcomes were observed",
                grace
            );
        }

        Ok(ReplacementReport {
            original: original_slot.into_inner().ok().flatten(),
            replacement: replacement_slot.into_inner().ok().flatten(),
        })
    }

    /// Sign an intent, producing the raw transaction bytes
    async fn sign(&self, intent: &TxIntent) -> OpsResult<Bytes> {
        let tx = intent.to_typed(self.chain_id);
        let signature = self
            .wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| OpsError::Wallet(e.to_string()))?;
        Ok(tx.rlp_signed(&signature))
    }

    /// Submit raw bytes and record the outcome as soon as it resolves
    async fn submit(&self, label: &str, raw: Bytes, slot: &Mutex<Option<SubmissionOutcome>>) {
        let outcome = match self.broadcaster.broadcast(raw).await {
            Ok(hash) => {
                info!("The hash of the {} transaction is {:?}", label, hash);
                SubmissionOutcome::Accepted(hash)
            }
            Err(e) => {
                warn!("Submitting the {} transaction failed: {}", label, e);
                SubmissionOutcome::Rejected(e.to_string())
            }
        };
        if let Ok(mut slot) = slot.lock() {
            *slot = Some(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use ethers::types::U256;
    use std::collections::VecDeque;

    const GOERLI: u64 = 5;

    fn wallet() -> LocalWallet {
        "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
            .parse()
            .unwrap()
    }

    fn intent(gas: u64, priority_fee: u64) -> TxIntent {
        TxIntent {
            to: wallet().address(),
            value: U256::zero(),
            gas: U256::from(gas),
            max_priority_fee_per_gas: U256::from(priority_fee),
            max_fee_per_gas: U256::from(priority_fee) + U256::from(30_000_000_000u64),
            nonce: 158,
        }
    }

    fn pair() -> ReplacementPair {
        ReplacementPair::new(
            intent(53_000, 2_000_000_180),
            intent(930_000, 110_000_010_080),
        )
        .unwrap()
    }

    /// Broadcast double that records calls and replays scripted outcomes
    struct ScriptedBroadcast {
        calls: Mutex<Vec<Bytes>>,
        outcomes: Mutex<VecDeque<OpsResult<H256>>>,
    }

    impl ScriptedBroadcast {
        fn new(outcomes: Vec<OpsResult<H256>>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outcomes: Mutex::new(outcomes.into()),
            }
        }
    }

    #[async_trait]
    impl Broadcast for ScriptedBroadcast {
        async fn broadcast(&self, raw: Bytes) -> OpsResult<H256> {
            self.calls.lock().unwrap().push(raw);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra broadcast")
        }
    }

    /// Broadcast double whose outcomes never resolve
    struct StallingBroadcast;

    #[async_trait]
    impl Broadcast for StallingBroadcast {
        async fn broadcast(&self, _raw: Bytes) -> OpsResult<H256> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn same_nonce_pair_signs_to_distinct_bytes() {
        let submitter =
            ReplacementSubmitter::new(Arc::new(StallingBroadcast), wallet(), GOERLI);
        let pair = pair();
        let original = submitter.sign(&pair.original).await.unwrap();
        let replacement = submitter.sign(&pair.replacement).await.unwrap();
        assert_ne!(original, replacement);
    }

    #[tokio::test]
    async fn submits_original_before_replacement() {
        let hash = H256::repeat_byte(0x11);
        let broadcaster = Arc::new(ScriptedBroadcast::new(vec![Ok(hash), Ok(hash)]));
        let submitter = ReplacementSubmitter::new(broadcaster.clone(), wallet(), GOERLI);
        let pair = pair();

        submitter
            .run(&pair, Duration::from_secs(3))
            .await
            .unwrap();

        // ECDSA signing is deterministic, so re-signing the original intent
        // reproduces the bytes the submitter must have dispatched first.
        let expected_original = submitter.sign(&pair.original).await.unwrap();
        let calls = broadcaster.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], expected_original);
        assert_ne!(calls[1], expected_original);
    }

    #[tokio::test]
    async fn original_rejection_does_not_block_replacement() {
        let hash = H256::repeat_byte(0x22);
        let broadcaster = Arc::new(ScriptedBroadcast::new(vec![
            Err(OpsError::Submission("nonce too low".to_string())),
            Ok(hash),
        ]));
        let submitter = ReplacementSubmitter::new(broadcaster.clone(), wallet(), GOERLI);

        let report = submitter
            .run(&pair(), Duration::from_secs(3))
            .await
            .unwrap();

        assert_eq!(broadcaster.calls.lock().unwrap().len(), 2);
        assert!(matches!(
            report.original,
            Some(SubmissionOutcome::Rejected(ref reason)) if reason.contains("nonce too low")
        ));
        assert_eq!(report.replacement, Some(SubmissionOutcome::Accepted(hash)));
    }

    #[tokio::test(start_paused = true)]
    async fn grace_period_bounds_wait_for_outcomes() {
        let submitter =
            ReplacementSubmitter::new(Arc::new(StallingBroadcast), wallet(), GOERLI);
        let grace = Duration::from_millis(3000);

        let started = tokio::time::Instant::now();
        let report = submitter.run(&pair(), grace).await.unwrap();

        // The wait ends exactly when the one-shot timer fires; unresolved
        // outcomes are lost.
        assert!(started.elapsed() >= grace);
        assert!(report.original.is_none());
        assert!(report.replacement.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn returns_early_when_both_outcomes_resolve() {
        let hash = H256::repeat_byte(0x33);
        let broadcaster = Arc::new(ScriptedBroadcast::new(vec![Ok(hash), Ok(hash)]));
        let submitter = ReplacementSubmitter::new(broadcaster, wallet(), GOERLI);
        let grace = Duration::from_millis(3000);

        let started = tokio::time::Instant::now();
        let report = submitter.run(&pair(), grace).await.unwrap();

        assert!(started.elapsed() < grace);
        assert_eq!(report.original, Some(SubmissionOutcome::Accepted(hash)));
        assert_eq!(report.replacement, Some(SubmissionOutcome::Accepted(hash)));
    }
}
