//! Transport-agnostic service over the lifecycle engine.
//!
//! Three surfaces:
//! - **Challenge**: open to anyone; the only mutation untrusted callers have.
//! - **Query**: read-only views of batches, balances, proofs, receipts.
//! - **Operator**: submissions, deposits, settlement signals, finalization
//!   and rejection, each gated by the injected [`Authorizer`].

use std::sync::Arc;

use optiroll_batcher::PendingPool;
use optiroll_settlement::BatchLifecycle;
use optiroll_types::{Address, BatchStatus, Result, RollupError, SettlementEvent};
use tokio::sync::Mutex;

use crate::auth::{Action, Authorizer, Caller};
use crate::requests::{
    ChallengeRequest, DepositRequest, RejectRequest, SubmitTransactionsRequest,
    TransactionRequest, parse_batch_id,
};
use crate::views::{
    AnchorView, BalanceView, BatchView, ChallengeResponse, ProofView, ReceiptView, hex32,
};

pub struct RollupService {
    engine: Arc<BatchLifecycle>,
    authorizer: Arc<dyn Authorizer>,
    /// Transfers accepted one at a time, committed together on seal.
    pending: Mutex<PendingPool>,
}

impl RollupService {
    pub fn new(engine: Arc<BatchLifecycle>, authorizer: Arc<dyn Authorizer>) -> Self {
        let pending = PendingPool::with_capacity(engine.config().max_batch_size);
        Self {
            engine,
            authorizer,
            pending: Mutex::new(pending),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<BatchLifecycle> {
        &self.engine
    }

    // -----------------------------------------------------------------
    // Challenge
    // -----------------------------------------------------------------

    /// Dispute a verified batch. Never fails; the outcome and any error
    /// code are in the response.
    pub async fn challenge(&self, request: &ChallengeRequest) -> ChallengeResponse {
        let parsed = match request.parse() {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!(error = %err, "Malformed challenge");
                return refused(&err, None);
            }
        };

        match self
            .engine
            .challenge(parsed.batch_id, &parsed.disputed, &parsed.proof)
            .await
        {
            Ok(outcome) => ChallengeResponse {
                accepted: true,
                batch_status: Some(outcome.batch.status),
                reason: outcome.fraud.to_string(),
                error_code: None,
            },
            Err(err) => {
                let status = self
                    .engine
                    .batch(parsed.batch_id)
                    .await
                    .ok()
                    .map(|b| b.status);
                refused(&err, status)
            }
        }
    }

    // -----------------------------------------------------------------
    // Query
    // -----------------------------------------------------------------

    pub async fn get_batch(&self, batch_id: &str) -> Result<BatchView> {
        let batch = self.engine.batch(parse_batch_id(batch_id)?).await?;
        Ok(BatchView::from(&batch))
    }

    /// Batches oldest first; `status` filters by name (`"verified"`, ...).
    pub async fn list_batches(&self, status: Option<&str>) -> Result<Vec<BatchView>> {
        let status = status.map(str::parse::<BatchStatus>).transpose()?;
        let batches = self.engine.batches(status).await?;
        Ok(batches.iter().map(BatchView::from).collect())
    }

    pub async fn get_balance(&self, address: &str) -> Result<BalanceView> {
        let address = Address::parse(address)?;
        let balance = self.engine.ledger().balance(&address).await?;
        Ok(BalanceView {
            address: address.to_string(),
            balance,
        })
    }

    pub async fn list_balances(&self) -> Result<Vec<BalanceView>> {
        let entries = self.engine.ledger().balances().await?;
        Ok(entries.iter().map(BalanceView::from).collect())
    }

    /// Inclusion proof for transaction `index` of a batch, ready to be sent
    /// back in a [`ChallengeRequest`].
    pub async fn get_proof(&self, batch_id: &str, index: usize) -> Result<ProofView> {
        let id = parse_batch_id(batch_id)?;
        let batch = self.engine.batch(id).await?;
        let proof = self.engine.proof(id, index).await?;
        let transaction = batch
            .transactions
            .get(index)
            .ok_or(RollupError::IndexOutOfRange {
                index,
                leaf_count: batch.transaction_count(),
            })?;
        Ok(ProofView {
            batch_id: id.to_string(),
            index,
            transaction: TransactionRequest::from(transaction),
            transactions_root: hex32(&batch.transactions_root),
            merkle_proof: proof.iter().map(hex32).collect(),
        })
    }

    pub async fn receipts(&self, batch_id: &str) -> Result<Vec<ReceiptView>> {
        let receipts = self.engine.receipts(parse_batch_id(batch_id)?).await?;
        Ok(receipts.iter().map(ReceiptView::from).collect())
    }

    pub async fn get_anchor(&self, batch_id: &str) -> Result<AnchorView> {
        let anchor = self.engine.anchor(parse_batch_id(batch_id)?).await?;
        Ok(AnchorView::from(&anchor))
    }

    // -----------------------------------------------------------------
    // Operator
    // -----------------------------------------------------------------

    /// Commit a full set of transfers as one pending batch.
    pub async fn submit_transactions(
        &self,
        caller: &Caller,
        request: &SubmitTransactionsRequest,
    ) -> Result<BatchView> {
        self.authorize(caller, Action::SubmitTransactions)?;
        let batch = self.engine.submit(request.parse()?).await?;
        Ok(BatchView::from(&batch))
    }

    /// Queue one transfer for the next sealed batch. Returns the queue depth.
    pub async fn enqueue(&self, caller: &Caller, request: &TransactionRequest) -> Result<usize> {
        self.authorize(caller, Action::SubmitTransactions)?;
        let transaction = request.parse()?;
        let mut pending = self.pending.lock().await;
        pending.push(transaction)?;
        Ok(pending.len())
    }

    /// Commit everything queued by [`enqueue`](Self::enqueue) as one batch.
    pub async fn seal_pending(&self, caller: &Caller) -> Result<BatchView> {
        self.authorize(caller, Action::SubmitTransactions)?;
        let mut pending = self.pending.lock().await;
        let batch = self.engine.submit_pool(&mut pending).await?;
        Ok(BatchView::from(&batch))
    }

    pub async fn deposit(&self, caller: &Caller, request: &DepositRequest) -> Result<BalanceView> {
        self.authorize(caller, Action::Deposit)?;
        let (address, amount) = request.parse()?;
        let balance = self.engine.ledger().deposit(address, amount).await?;
        Ok(BalanceView {
            address: address.to_string(),
            balance,
        })
    }

    /// Relay a signal from the primary settlement layer.
    pub async fn handle_settlement_event(
        &self,
        caller: &Caller,
        event: SettlementEvent,
    ) -> Result<BatchView> {
        self.authorize(caller, Action::SettlementSignal)?;
        let batch = self.engine.handle_event(event).await?;
        Ok(BatchView::from(&batch))
    }

    /// Same as [`handle_settlement_event`](Self::handle_settlement_event)
    /// for a raw JSON payload such as `{"type":"verified","batch_id":"…"}`.
    pub async fn handle_settlement_json(&self, caller: &Caller, payload: &str) -> Result<BatchView> {
        let event: SettlementEvent =
            serde_json::from_str(payload).map_err(|e| RollupError::InvalidRequest {
                reason: format!("invalid settlement event: {e}"),
            })?;
        self.handle_settlement_event(caller, event).await
    }

    pub async fn finalize(&self, caller: &Caller, batch_id: &str) -> Result<BatchView> {
        self.authorize(caller, Action::Finalize)?;
        let batch = self.engine.finalize(parse_batch_id(batch_id)?).await?;
        Ok(BatchView::from(&batch))
    }

    /// Finalize every batch whose challenge window has elapsed.
    pub async fn finalize_expired(&self, caller: &Caller) -> Result<Vec<String>> {
        self.authorize(caller, Action::Finalize)?;
        let ids = self.engine.finalize_expired().await?;
        Ok(ids.iter().map(ToString::to_string).collect())
    }

    pub async fn reject(&self, caller: &Caller, request: &RejectRequest) -> Result<BatchView> {
        self.authorize(caller, Action::Reject)?;
        if request.reason.trim().is_empty() {
            return Err(RollupError::InvalidRequest {
                reason: "rejection reason must not be empty".into(),
            });
        }
        let batch = self
            .engine
            .reject(parse_batch_id(&request.batch_id)?, &request.reason)
            .await?;
        Ok(BatchView::from(&batch))
    }

    fn authorize(&self, caller: &Caller, action: Action) -> Result<()> {
        self.authorizer
            .authorize(caller, action)
            .inspect_err(|err| tracing::warn!(%caller, %action, error = %err, "Unauthorized call"))
    }
}

fn refused(err: &RollupError, batch_status: Option<BatchStatus>) -> ChallengeResponse {
    ChallengeResponse {
        accepted: false,
        batch_status,
        reason: err.to_string(),
        error_code: Some(err.code()),
    }
}
