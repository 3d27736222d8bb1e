use dochub_common::Vnd;

use crate::db_types::Transaction;

/// The fields recorded when a transaction settles. `raw_notification` is whatever the gateway reported, kept
/// verbatim for audit.
#[derive(Debug, Clone)]
pub struct SettlementUpdate {
    pub gateway_transaction_id: String,
    /// The amount the gateway reported, which is what gets credited for top-ups. It may differ from the
    /// transaction amount by up to the configured tolerance.
    pub paid_amount: Vnd,
    pub raw_notification: String,
}

/// Result of a settlement attempt. The compare-and-set either wins (`Settled`), or reveals what got there first.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// This call performed the transition (and the balance credit, for top-ups).
    Settled(Transaction),
    /// Another path settled the transaction already. Nothing was changed.
    AlreadySettled(Transaction),
    /// The transaction reached a terminal non-completed state first (cancelled or failed). Nothing was changed.
    NotPending(Transaction),
}

/// Result of a cancellation attempt, mirror-image of [`SettlementOutcome`].
#[derive(Debug, Clone)]
pub enum CancellationOutcome {
    Cancelled(Transaction),
    /// Cancelling twice is a no-op, not an error.
    AlreadyCancelled(Transaction),
    /// The transaction settled first. A settled payment is never retroactively cancelled.
    SettledConflict(Transaction),
}
