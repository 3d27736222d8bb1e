use chrono::{DateTime, Utc};
use dochub_common::Vnd;
use thiserror::Error;

use crate::{
    db_types::{NewTransaction, Transaction, TransactionId, TransactionKind, UserBalance},
    traits::{CancellationOutcome, SettlementOutcome, SettlementUpdate},
};

/// The storage contract for the payment engine.
///
/// Everything the reconciler knows about persistence goes through this trait:
/// * transaction rows, keyed by id, order code, or the gateway's settlement id,
/// * the two guarded transitions (settle, cancel), each a compare-and-set on the current status executed inside a
///   single database transaction,
/// * the user balance, credited atomically with a top-up settlement.
///
/// Implementations must guarantee that [`settle_transaction`](Self::settle_transaction) and
/// [`cancel_transaction`](Self::cancel_transaction) are linearizable per row: when a webhook delivery, a status
/// poll and a cancellation race, exactly one of them performs its transition and the others observe the winner.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    async fn fetch_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// Look a transaction up by its payer-facing reference code. If a code collision ever produces more than one
    /// row, the most recently created one wins.
    async fn fetch_transaction_by_order_code(&self, code: &str) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// Look a transaction up by the gateway's settlement id. This powers the webhook idempotency gate.
    async fn fetch_transaction_by_gateway_id(
        &self,
        gateway_id: &str,
    ) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// The open gateway payment request for this (user, kind, target) combination, if one exists. Used to reuse a
    /// pending transaction instead of minting a duplicate on every client retry.
    async fn fetch_pending_payment_request(
        &self,
        user_id: &str,
        kind: TransactionKind,
        target_ref: Option<&str>,
    ) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// Whether the user already owns this item. Checked before any transaction row is created.
    async fn has_completed_purchase(
        &self,
        user_id: &str,
        kind: TransactionKind,
        target_ref: Option<&str>,
    ) -> Result<bool, PaymentGatewayError>;

    /// Insert a new transaction in `Pending` state. The id is assigned here and never changes; neither does the
    /// amount.
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, PaymentGatewayError>;

    /// Record the payer-facing side of a payment request: the reference code and the expiry deadline. Does not
    /// touch the status.
    async fn attach_payment_request(
        &self,
        id: &TransactionId,
        order_code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Transaction, PaymentGatewayError>;

    /// The guarded settlement transition: `Pending` → `Completed`, recording the settlement id and raw payload,
    /// and crediting the user's balance for top-ups, all in one atomic unit. The update is conditioned on the row
    /// still being `Pending`; a lost race is reported through [`SettlementOutcome`], never by double-applying.
    async fn settle_transaction(
        &self,
        id: &TransactionId,
        settlement: SettlementUpdate,
    ) -> Result<SettlementOutcome, PaymentGatewayError>;

    /// The guarded cancellation transition. Conditioned on the row not being `Completed`; cancelling an already
    /// cancelled transaction is a no-op success.
    async fn cancel_transaction(&self, id: &TransactionId) -> Result<CancellationOutcome, PaymentGatewayError>;

    /// Fetch the user row, creating it with a zero balance if it does not exist yet.
    async fn fetch_or_create_user(&self, user_id: &str) -> Result<UserBalance, PaymentGatewayError>;

    async fn fetch_user_balance(&self, user_id: &str) -> Result<Vnd, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested transaction {0} does not exist")]
    TransactionNotFound(TransactionId),
    #[error("The user account {0} does not exist")]
    UserNotFound(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
