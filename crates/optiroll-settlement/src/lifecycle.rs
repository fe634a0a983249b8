//! Batch lifecycle engine.
//!
//! Owns every status change of a batch:
//!
//! | action     | from                 | to          | ledger            |
//! |------------|----------------------|-------------|-------------------|
//! | `verify`   | `PENDING`            | `VERIFIED`  | apply             |
//! | `finalize` | `VERIFIED` (expired) | `FINALIZED` | none              |
//! | `challenge`| `VERIFIED` (open)    | `REJECTED`  | reverse           |
//! | `reject`   | `PENDING`/`VERIFIED` | `REJECTED`  | reverse if needed |
//!
//! Each transition runs under its batch's lock from status read to commit,
//! and legal moves come from [`BatchStatus::can_transition_to`]. Repeating
//! a transition that already happened is a no-op success.

use std::sync::Arc;

use optiroll_batcher::{Batcher, PendingPool};
use optiroll_commitment::CommitmentTree;
use optiroll_store::{SettlementStore, TimedStore};
use optiroll_types::{
    Batch, BatchId, BatchStatus, Clock, EngineConfig, Hash32, Receipt, ReceiptType, Result,
    RollupError, SettlementAnchor, SettlementEvent, Transaction, constants,
};

use crate::fraud::{DefaultFraudPolicy, FraudKind, FraudPolicy, FraudVerdict};
use crate::ledger::Ledger;
use crate::locks::BatchLocks;

/// A challenge that proved fraud and rejected its batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeOutcome {
    pub batch_id: BatchId,
    pub fraud: FraudKind,
    /// The batch record after rejection.
    pub batch: Batch,
}

/// Drives batches through their lifecycle and keeps the ledger in step.
pub struct BatchLifecycle {
    store: Arc<dyn SettlementStore>,
    batcher: Batcher,
    ledger: Ledger,
    locks: BatchLocks,
    policy: Arc<dyn FraudPolicy>,
    clock: Arc<dyn Clock>,
    challenge_period: chrono::Duration,
    config: EngineConfig,
}

impl BatchLifecycle {
    /// Open an engine over `store`. Every store call is bounded by
    /// `config.store_timeout`. Balances already in the store become the
    /// ledger's conservation baseline.
    ///
    /// # Errors
    /// - `Configuration` if `config` is invalid
    /// - `StoreUnavailable` if the initial balance scan fails
    pub async fn open(
        store: Arc<dyn SettlementStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let challenge_period = config.challenge_period_chrono()?;
        let store: Arc<dyn SettlementStore> =
            Arc::new(TimedStore::new(store, config.store_timeout()));
        let ledger = Ledger::open(store.clone(), config.settlement_guard_capacity).await?;
        let batcher = Batcher::new(store.clone(), clock.clone(), config.max_batch_size);

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            challenge_period_secs = config.challenge_period_secs,
            store_timeout_ms = config.store_timeout_ms,
            max_batch_size = config.max_batch_size,
            "Batch lifecycle engine started"
        );
        Ok(Self {
            store,
            batcher,
            ledger,
            locks: BatchLocks::new(),
            policy: Arc::new(DefaultFraudPolicy),
            clock,
            challenge_period,
            config,
        })
    }

    /// Replace the fraud policy used by [`challenge`](Self::challenge).
    #[must_use]
    pub fn with_fraud_policy(mut self, policy: Arc<dyn FraudPolicy>) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // -----------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------

    /// Commit `transactions` into a new `PENDING` batch. Duplicates are not
    /// refused; after verification they are grounds for a double-spend
    /// challenge.
    pub async fn submit(&self, transactions: Vec<Transaction>) -> Result<Batch> {
        let batch = self.batcher.create_batch(transactions).await?;
        self.record(ReceiptType::BatchSubmitted, &batch, None).await;
        Ok(batch)
    }

    /// Seal `pool` and commit its contents as one `PENDING` batch. On
    /// failure the transactions stay in the pool.
    pub async fn submit_pool(&self, pool: &mut PendingPool) -> Result<Batch> {
        let batch = self.batcher.commit_pool(pool).await?;
        self.record(ReceiptType::BatchSubmitted, &batch, None).await;
        Ok(batch)
    }

    // -----------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------

    /// `PENDING → VERIFIED`: apply the batch to the ledger and open the
    /// challenge window.
    ///
    /// # Errors
    /// - `BatchNotFound`, `IllegalTransition` (from a terminal state)
    /// - `InsufficientBalance`: the batch stays `PENDING`
    /// - `StoreUnavailable`: nothing changed
    pub async fn verify(&self, batch_id: BatchId) -> Result<Batch> {
        let _guard = self.locks.acquire(batch_id).await;
        let batch = self.load(batch_id).await?;
        if batch.status == BatchStatus::Verified {
            tracing::debug!(batch = %batch_id, "Verify repeated; already verified");
            return Ok(batch);
        }
        ensure_transition(&batch, BatchStatus::Verified, "verify")?;

        let now = self.clock.now();
        let deadline = now.checked_add_signed(self.challenge_period).ok_or_else(|| {
            RollupError::Internal(format!("challenge deadline overflows for batch {batch_id}"))
        })?;
        let mut verified = batch;
        verified.status = BatchStatus::Verified;
        verified.verified_at = Some(now);
        verified.challenge_deadline = Some(deadline);

        self.ledger.apply_batch(&verified).await?;
        self.record(ReceiptType::BatchVerified, &verified, None).await;

        tracing::info!(
            batch = %batch_id,
            root = verified.root_hex(),
            deadline = %deadline,
            "Batch verified; challenge window open"
        );
        Ok(verified)
    }

    /// `VERIFIED → FINALIZED` once the challenge window has elapsed.
    ///
    /// # Errors
    /// - `ChallengeWindowOpen` before the deadline; the batch stays `VERIFIED`
    /// - `IllegalTransition` from `PENDING` or `REJECTED`
    pub async fn finalize(&self, batch_id: BatchId) -> Result<Batch> {
        let _guard = self.locks.acquire(batch_id).await;
        let batch = self.load(batch_id).await?;
        if batch.status == BatchStatus::Finalized {
            tracing::debug!(batch = %batch_id, "Finalize repeated; already finalized");
            return Ok(batch);
        }
        ensure_transition(&batch, BatchStatus::Finalized, "finalize")?;

        let deadline = batch.challenge_deadline.ok_or_else(|| {
            RollupError::Internal(format!("verified batch {batch_id} has no deadline"))
        })?;
        let now = self.clock.now();
        if now < deadline {
            return Err(RollupError::ChallengeWindowOpen { batch_id, deadline });
        }

        let mut finalized = batch;
        finalized.status = BatchStatus::Finalized;
        finalized.finalized_at = Some(now);
        self.store.save_batch(&finalized).await?;
        self.record(ReceiptType::BatchFinalized, &finalized, None).await;

        tracing::info!(batch = %batch_id, root = finalized.root_hex(), "Batch finalized");
        Ok(finalized)
    }

    /// Dispute a verified batch with a transaction and its inclusion proof
    /// against the batch's recorded root.
    ///
    /// A proof that does not reconstruct the root, or a proven transaction
    /// that shows no fraud under the policy, fails with `InvalidProof` and
    /// leaves the batch untouched. Demonstrated fraud rejects the batch and
    /// reverses its ledger effect.
    ///
    /// # Errors
    /// - `IllegalTransition` on a `PENDING` batch
    /// - `ChallengeWindowClosed` on a terminal batch or past the deadline
    /// - `InvalidProof` as above
    pub async fn challenge(
        &self,
        batch_id: BatchId,
        disputed: &Transaction,
        proof: &[Hash32],
    ) -> Result<ChallengeOutcome> {
        let _guard = self.locks.acquire(batch_id).await;
        let batch = self.load(batch_id).await?;
        if batch.status == BatchStatus::Pending {
            return Err(illegal(batch_id, batch.status, "challenge"));
        }
        if batch.status.is_terminal() || !batch.challenge_window_open(self.clock.now()) {
            return Err(RollupError::ChallengeWindowClosed {
                batch_id,
                deadline: batch.challenge_deadline,
            });
        }

        if proof.len() > constants::MAX_PROOF_DEPTH {
            return Err(self
                .refuse_challenge(&batch, format!("proof longer than {} levels", constants::MAX_PROOF_DEPTH))
                .await);
        }
        if !CommitmentTree::verify(disputed, proof, &batch.transactions_root) {
            return Err(self
                .refuse_challenge(&batch, "proof does not reconstruct the batch root".into())
                .await);
        }

        let fraud = match self.policy.evaluate(&batch, disputed) {
            FraudVerdict::Valid => {
                return Err(self
                    .refuse_challenge(&batch, "no fraud demonstrated".into())
                    .await);
            }
            FraudVerdict::Fraud(kind) => kind,
        };

        tracing::warn!(
            batch = %batch_id,
            fraud = %fraud,
            tx = hex::encode(disputed.canonical_hash()),
            "Challenge upheld"
        );
        let batch = self.reject_locked(batch, fraud.to_string()).await?;
        Ok(ChallengeOutcome {
            batch_id,
            fraud,
            batch,
        })
    }

    /// Operator rejection from `PENDING` or `VERIFIED`; a verified batch has
    /// its ledger effect reversed.
    ///
    /// # Errors
    /// - `IllegalTransition` from `FINALIZED`
    /// - `BalanceUnderflow` if a recipient already spent what the batch
    ///   credited; the batch stays `VERIFIED`
    pub async fn reject(&self, batch_id: BatchId, reason: &str) -> Result<Batch> {
        let _guard = self.locks.acquire(batch_id).await;
        let batch = self.load(batch_id).await?;
        if batch.status == BatchStatus::Rejected {
            tracing::debug!(batch = %batch_id, "Reject repeated; already rejected");
            return Ok(batch);
        }
        ensure_transition(&batch, BatchStatus::Rejected, "reject")?;
        self.reject_locked(batch, reason.to_string()).await
    }

    /// Apply a signal from the primary settlement layer.
    pub async fn handle_event(&self, event: SettlementEvent) -> Result<Batch> {
        tracing::debug!(batch = %event.batch_id(), ?event, "Settlement event received");
        match event {
            SettlementEvent::Verified { batch_id } => self.verify(batch_id).await,
            SettlementEvent::Finalized { batch_id } => self.finalize(batch_id).await,
        }
    }

    /// Finalize every verified batch whose challenge window has elapsed.
    /// Returns the ids finalized by this sweep.
    pub async fn finalize_expired(&self) -> Result<Vec<BatchId>> {
        let now = self.clock.now();
        let due: Vec<BatchId> = self
            .store
            .list_batches()
            .await?
            .into_iter()
            .filter(|b| {
                b.status == BatchStatus::Verified
                    && b.challenge_deadline.is_some_and(|deadline| deadline <= now)
            })
            .map(|b| b.id)
            .collect();

        let mut finalized = Vec::with_capacity(due.len());
        for batch_id in due {
            match self.finalize(batch_id).await {
                Ok(batch) if batch.status == BatchStatus::Finalized => finalized.push(batch_id),
                Ok(_) => {}
                // Rejected by a concurrent challenge between scan and lock.
                Err(RollupError::IllegalTransition { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        if !finalized.is_empty() {
            tracing::info!(count = finalized.len(), "Expired batches finalized");
        }
        Ok(finalized)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// # Errors
    /// `BatchNotFound` if no batch has this id.
    pub async fn batch(&self, batch_id: BatchId) -> Result<Batch> {
        self.load(batch_id).await
    }

    /// All batches, oldest first, optionally filtered by status.
    pub async fn batches(&self, status: Option<BatchStatus>) -> Result<Vec<Batch>> {
        let mut batches = self.store.list_batches().await?;
        if let Some(status) = status {
            batches.retain(|b| b.status == status);
        }
        Ok(batches)
    }

    /// Audit trail of `batch_id`, in issue order.
    pub async fn receipts(&self, batch_id: BatchId) -> Result<Vec<Receipt>> {
        self.store.receipts(batch_id).await
    }

    /// Inclusion proof for the transaction at `index` of a stored batch.
    ///
    /// # Errors
    /// `BatchNotFound`, or `IndexOutOfRange` past the last transaction.
    pub async fn proof(&self, batch_id: BatchId, index: usize) -> Result<Vec<Hash32>> {
        let batch = self.load(batch_id).await?;
        CommitmentTree::build(&batch.transactions)?.proof(index)
    }

    /// Anchor record of a stored batch for the primary settlement layer.
    pub async fn anchor(&self, batch_id: BatchId) -> Result<SettlementAnchor> {
        Ok(Batcher::anchor(&self.load(batch_id).await?))
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    async fn load(&self, batch_id: BatchId) -> Result<Batch> {
        self.store
            .load_batch(batch_id)
            .await?
            .ok_or(RollupError::BatchNotFound(batch_id))
    }

    /// Caller holds the batch lock; `batch` is `PENDING` or `VERIFIED`.
    async fn reject_locked(&self, batch: Batch, reason: String) -> Result<Batch> {
        let batch_id = batch.id;
        let was_verified = batch.status == BatchStatus::Verified;
        let mut rejected = batch;
        rejected.status = BatchStatus::Rejected;
        rejected.rejection_reason = Some(reason.clone());

        if was_verified {
            self.ledger.reverse_batch(&rejected).await?;
        } else {
            self.store.save_batch(&rejected).await?;
        }
        self.record(ReceiptType::BatchRejected, &rejected, Some(reason.clone()))
            .await;

        tracing::warn!(batch = %batch_id, %reason, reversed = was_verified, "Batch rejected");
        Ok(rejected)
    }

    async fn refuse_challenge(&self, batch: &Batch, reason: String) -> RollupError {
        tracing::warn!(batch = %batch.id, %reason, "Challenge rejected");
        self.record(ReceiptType::ChallengeRejected, batch, Some(reason.clone()))
            .await;
        RollupError::InvalidProof { reason }
    }

    /// Receipts are audit output; a failed append is logged and does not
    /// undo the transition it describes.
    async fn record(&self, receipt_type: ReceiptType, batch: &Batch, detail: Option<String>) {
        let receipt = Receipt::issue(receipt_type, batch, detail, self.clock.now());
        if let Err(err) = self.store.append_receipt(&receipt).await {
            tracing::error!(
                batch = %batch.id,
                receipt = %receipt_type,
                error = %err,
                "Failed to append receipt"
            );
        }
    }
}

/// `IllegalTransition` unless the status table allows `batch` to move to
/// `target`.
fn ensure_transition(batch: &Batch, target: BatchStatus, action: &'static str) -> Result<()> {
    if batch.status.can_transition_to(target) {
        Ok(())
    } else {
        Err(illegal(batch.id, batch.status, action))
    }
}

fn illegal(batch_id: BatchId, from: BatchStatus, action: &'static str) -> RollupError {
    RollupError::IllegalTransition {
        batch_id,
        from,
        action,
    }
}
