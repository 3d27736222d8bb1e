use std::fmt::Debug;

use chrono::Utc;
use dochub_common::Vnd;
use log::*;
use sepay_tools::{
    qr_image_url,
    verify_api_key,
    verify_signature,
    GatewayTransaction,
    SepayApi,
    SepayConfig,
    WebhookNotification,
};

use crate::{
    api::{errors::PaymentFlowError, payment_objects::{PaymentInfo, StatusInfo, WebhookAck}},
    db_types::{NewTransaction, PaymentMethod, PaymentStatus, Transaction, TransactionId, TransactionKind},
    helpers::{display_reference, extract_order_code, order_code},
    traits::{CancellationOutcome, PaymentGatewayDatabase, SettlementOutcome, SettlementUpdate},
};

/// `PaymentFlowApi` is the primary API for the gateway payment lifecycle: building payment requests, reconciling
/// webhook notifications, answering status polls, and cancelling abandoned payments.
///
/// Webhook delivery and status polling can both try to settle the same transaction; they converge on
/// [`Self::commit_settlement`], whose storage-level compare-and-set makes sure the transition (and a top-up's
/// balance credit) happens exactly once no matter how the two paths race.
pub struct PaymentFlowApi<B> {
    db: B,
    gateway: SepayApi,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B, gateway: SepayApi) -> Self {
        Self { db, gateway }
    }

    fn config(&self) -> &SepayConfig {
        self.gateway.config()
    }
}

impl<B> PaymentFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Build (or refresh) the payment request for one purchase or top-up.
    ///
    /// An open `Pending` gateway transaction for the same (user, kind, target) is reused rather than duplicated, so
    /// a client hammering "show me the QR again" cannot litter the store with orphaned pending rows. The reused
    /// transaction keeps its original amount: amounts are immutable once a code may already be in a payer's hands.
    pub async fn create_payment_request(
        &self,
        user_id: &str,
        kind: TransactionKind,
        target_ref: Option<String>,
        amount: Vnd,
    ) -> Result<PaymentInfo, PaymentFlowError> {
        let config = self.config();
        if !config.is_enabled() {
            return Err(PaymentFlowError::GatewayDisabled);
        }
        if !amount.is_positive() {
            return Err(PaymentFlowError::InvalidAmount(amount));
        }
        // Top-ups are repeatable by nature; the one-completed-purchase rule only guards item purchases, and it
        // runs before any row is created.
        if kind != TransactionKind::Topup && self.db.has_completed_purchase(user_id, kind, target_ref.as_deref()).await?
        {
            return Err(PaymentFlowError::AlreadyPurchased);
        }
        self.db.fetch_or_create_user(user_id).await?;
        let transaction = match self.db.fetch_pending_payment_request(user_id, kind, target_ref.as_deref()).await? {
            Some(t) => {
                debug!("🔄️💰️ Reusing pending transaction [{}] for user {user_id}", t.id);
                t
            },
            None => {
                let new = NewTransaction::sepay(user_id, kind, target_ref, amount);
                self.db.insert_transaction(new).await?
            },
        };
        let code = order_code(&transaction.id);
        let expires_at = Utc::now() + config.payment_timeout;
        let transaction = self.db.attach_payment_request(&transaction.id, &code, expires_at).await?;
        let reference = display_reference(config.virtual_account.as_deref(), &code);
        let qr_url = qr_image_url(config, transaction.amount, &reference)?;
        info!("🔄️💰️ Payment request [{code}] ready for transaction [{}], {}", transaction.id, transaction.amount);
        Ok(PaymentInfo {
            transaction_id: transaction.id,
            bank_account: config.bank_account.clone(),
            bank_name: config.bank_name.clone(),
            account_name: config.account_name.clone(),
            amount: transaction.amount,
            reference,
            qr_url,
            expires_at,
        })
    }

    /// Reconcile one webhook delivery.
    ///
    /// The notification is untrusted, possibly replayed, and possibly out of order. Every step up to the final
    /// commit is read-only; the commit itself is conditioned on the row still being pending, so replays and races
    /// fall out as idempotent acknowledgements rather than double-settlements.
    pub async fn process_notification(
        &self,
        auth_header: Option<&str>,
        signature: Option<&str>,
        payload: &[u8],
    ) -> Result<WebhookAck, PaymentFlowError> {
        let config = self.config();
        // Authentication first. Nothing is parsed or looked up for an unauthenticated caller, and the error gives
        // no hint whether any transaction would have matched.
        let authentic = match (signature, auth_header) {
            (Some(sig), _) => verify_signature(&config.secret_key, payload, sig),
            (None, Some(header)) => verify_api_key(&config.secret_key, header),
            (None, None) => false,
        };
        if !authentic {
            warn!("🔄️🚨️ Webhook delivery failed authentication");
            return Err(PaymentFlowError::AuthenticationFailed);
        }
        let notification =
            WebhookNotification::from_payload(payload).map_err(|e| PaymentFlowError::InvalidPayload(e.to_string()))?;
        // Idempotency gate: a settlement id we have already recorded means this is a replay.
        if let Some(existing) = self.db.fetch_transaction_by_gateway_id(&notification.id).await? {
            if existing.status == PaymentStatus::Completed {
                debug!("🔄️💰️ Replayed webhook for settled transaction [{}]", existing.id);
                return Ok(WebhookAck::AlreadyProcessed(existing.id));
            }
        }
        if !notification.is_credit() {
            trace!("🔄️💰️ Ignoring non-credit notification {}", notification.id);
            return Ok(WebhookAck::Ignored("not an incoming credit"));
        }
        let code = extract_order_code(&notification.content).ok_or(PaymentFlowError::NoOrderCodeFound)?;
        let transaction = self
            .db
            .fetch_transaction_by_order_code(&code)
            .await?
            .ok_or(PaymentFlowError::TransactionNotFound)?;
        let raw = String::from_utf8_lossy(payload).into_owned();
        self.commit_settlement(&transaction, notification.amount, &notification.id, &raw).await
    }

    /// Report the current settlement state, asking the gateway directly if the webhook seems to be taking its time.
    ///
    /// A settled transaction is answered from the local row without touching the network. For a pending gateway
    /// payment, the recent-transaction listing is scanned for a transfer carrying our reference code; a hit goes
    /// through the same guarded commit as the webhook path. Any gateway error is logged and swallowed: a status
    /// poll never fails just because the gateway is unreachable.
    pub async fn check_status(&self, id: &TransactionId) -> Result<StatusInfo, PaymentFlowError> {
        let transaction = self.db.fetch_transaction(id).await?.ok_or(PaymentFlowError::TransactionNotFound)?;
        if transaction.status != PaymentStatus::Pending
            || transaction.payment_method != PaymentMethod::Sepay
            || !self.config().is_enabled()
        {
            return Ok(StatusInfo::from(transaction));
        }
        let Some(code) = transaction.order_code.clone() else {
            // A pending transaction with no payment request attached has nothing to match on yet.
            return Ok(StatusInfo::from(transaction));
        };
        match self.gateway.recent_transactions(self.config().list_limit).await {
            Ok(entries) => {
                if let Some(entry) = find_matching_transfer(&entries, &code, transaction.amount, self.config()) {
                    info!("🔄️💰️ Gateway listing matched transaction [{}] to transfer {}", transaction.id, entry.id);
                    let raw = serde_json::to_string(entry).unwrap_or_default();
                    if let Err(e) = self.commit_settlement(&transaction, entry.amount_in, &entry.id, &raw).await {
                        // The poll still answers with local state; a competing path may have settled or cancelled.
                        warn!("🔄️💰️ Could not settle transaction [{}] from listing match. {e}", transaction.id);
                    }
                }
            },
            Err(e) => {
                warn!("🔄️💰️ Could not query the gateway listing API. Falling back to local state. {e}");
            },
        }
        let transaction = self.db.fetch_transaction(id).await?.ok_or(PaymentFlowError::TransactionNotFound)?;
        Ok(StatusInfo::from(transaction))
    }

    /// Abandon a pending payment. Settled payments are never retroactively cancelled; cancelling twice is a
    /// silent success.
    pub async fn cancel(&self, id: &TransactionId) -> Result<Transaction, PaymentFlowError> {
        match self.db.cancel_transaction(id).await? {
            CancellationOutcome::Cancelled(t) => {
                info!("🔄️❌️ Transaction [{}] cancelled", t.id);
                Ok(t)
            },
            CancellationOutcome::AlreadyCancelled(t) => Ok(t),
            CancellationOutcome::SettledConflict(_) => Err(PaymentFlowError::CannotCancelCompleted),
        }
    }

    /// The single settlement commit both completion paths funnel into.
    ///
    /// Performs the state check, the amount tolerance check, and the guarded commit. The storage-level
    /// compare-and-set decides every race: whichever of webhook delivery, poller match, or cancellation commits
    /// first wins, and this function translates the loser's view into an idempotent acknowledgement or a rejection.
    async fn commit_settlement(
        &self,
        transaction: &Transaction,
        paid: Vnd,
        gateway_id: &str,
        raw_notification: &str,
    ) -> Result<WebhookAck, PaymentFlowError> {
        match transaction.status {
            PaymentStatus::Completed => return Ok(WebhookAck::AlreadyProcessed(transaction.id.clone())),
            PaymentStatus::Pending => {},
            // Terminal, not completed: this payment will never settle. Deliberately the same response as an
            // unknown code.
            _ => return Err(PaymentFlowError::TransactionNotFound),
        }
        let tolerance = self.config().amount_tolerance;
        if transaction.amount.abs_diff(paid) > tolerance {
            warn!(
                "🔄️🚨️ Amount mismatch for transaction [{}]: expected {}, notified {paid}",
                transaction.id, transaction.amount
            );
            return Err(PaymentFlowError::AmountMismatch { expected: transaction.amount, actual: paid });
        }
        let settlement = SettlementUpdate {
            gateway_transaction_id: gateway_id.to_string(),
            paid_amount: paid,
            raw_notification: raw_notification.to_string(),
        };
        match self.db.settle_transaction(&transaction.id, settlement).await? {
            SettlementOutcome::Settled(t) => {
                info!("🔄️✅️ Transaction [{}] settled: {} via gateway id {gateway_id}", t.id, t.amount);
                Ok(WebhookAck::Settled(t.id))
            },
            SettlementOutcome::AlreadySettled(t) => {
                debug!("🔄️💰️ Transaction [{}] was settled by a concurrent path", t.id);
                Ok(WebhookAck::AlreadyProcessed(t.id))
            },
            SettlementOutcome::NotPending(t) => {
                warn!("🔄️💰️ Transaction [{}] reached state {} before this settlement", t.id, t.status);
                Err(PaymentFlowError::TransactionNotFound)
            },
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Scan a gateway listing for a transfer that pays the given code. Bank memos carry surrounding noise and
/// unpredictable case, so the match is a case-insensitive substring; the amount must clear the same tolerance the
/// webhook path applies.
fn find_matching_transfer<'a>(
    entries: &'a [GatewayTransaction],
    code: &str,
    expected: Vnd,
    config: &SepayConfig,
) -> Option<&'a GatewayTransaction> {
    let needle = code.to_lowercase();
    entries
        .iter()
        .find(|e| e.transaction_content.to_lowercase().contains(&needle)
            && e.amount_in.abs_diff(expected) <= config.amount_tolerance)
}
