use chrono::{DateTime, Utc};
use dochub_common::Vnd;
use serde::Serialize;

use crate::db_types::{PaymentStatus, Transaction, TransactionId};

/// Everything the payer needs to make the transfer. Returned by
/// [`create_payment_request`](crate::PaymentFlowApi::create_payment_request).
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInfo {
    pub transaction_id: TransactionId,
    pub bank_account: String,
    pub bank_name: String,
    pub account_name: String,
    pub amount: Vnd,
    /// What to type into the transfer memo: the order code, virtual-account prefixed if one is configured.
    pub reference: String,
    /// Link to a scannable QR image encoding the same details.
    pub qr_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Snapshot of a transaction's settlement state, as reported to polling clients.
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub transaction_id: TransactionId,
    pub status: PaymentStatus,
    pub amount: Vnd,
    pub gateway_transaction_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// True when the request is still pending but its payment window has lapsed.
    pub expired: bool,
}

impl From<Transaction> for StatusInfo {
    fn from(t: Transaction) -> Self {
        let expired = t.is_expired(Utc::now());
        Self {
            transaction_id: t.id,
            status: t.status,
            amount: t.amount,
            gateway_transaction_id: t.gateway_transaction_id,
            expires_at: t.expires_at,
            expired,
        }
    }
}

/// The ways a webhook delivery can be acknowledged as successful. Rejections travel as
/// [`PaymentFlowError`](crate::PaymentFlowError) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAck {
    /// This delivery settled the transaction.
    Settled(TransactionId),
    /// The transaction was already settled (replayed delivery, or the poller won). Nothing was changed.
    AlreadyProcessed(TransactionId),
    /// The notification is authentic but not ours to act on (e.g. an outgoing transfer). Acknowledged so the
    /// gateway stops retrying.
    Ignored(&'static str),
}

impl WebhookAck {
    pub fn message(&self) -> String {
        match self {
            WebhookAck::Settled(id) => format!("Payment processed successfully for transaction {id}"),
            WebhookAck::AlreadyProcessed(_) => "Transaction already processed".to_string(),
            WebhookAck::Ignored(reason) => format!("Notification ignored: {reason}"),
        }
    }
}
