use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, PaymentMethod, PaymentStatus, Transaction, TransactionId, TransactionKind},
    traits::{PaymentGatewayError, SettlementUpdate},
};

/// Inserts a new transaction in `Pending` state using the given connection. This is not atomic on its own. You can
/// embed this call inside a transaction if you need atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_transaction(
    new: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, PaymentGatewayError> {
    let id = TransactionId::new_random();
    let transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                id,
                user_id,
                kind,
                target_ref,
                amount,
                status,
                payment_method
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(new.user_id)
    .bind(new.kind.to_string())
    .bind(new.target_ref)
    .bind(new.amount)
    .bind(PaymentStatus::Pending.to_string())
    .bind(new.payment_method.to_string())
    .fetch_one(conn)
    .await?;
    Ok(transaction)
}

pub async fn fetch_transaction(
    id: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let transaction =
        sqlx::query_as("SELECT * FROM transactions WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(transaction)
}

/// If two ids ever collide on the same code, the newest row wins. See the collision note in DESIGN.md.
pub async fn fetch_transaction_by_order_code(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let transaction =
        sqlx::query_as("SELECT * FROM transactions WHERE order_code = $1 ORDER BY created_at DESC LIMIT 1")
            .bind(code)
            .fetch_optional(conn)
            .await?;
    Ok(transaction)
}

pub async fn fetch_transaction_by_gateway_id(
    gateway_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let transaction = sqlx::query_as("SELECT * FROM transactions WHERE gateway_transaction_id = $1")
        .bind(gateway_id)
        .fetch_optional(conn)
        .await?;
    Ok(transaction)
}

/// The open gateway payment request for this (user, kind, target), newest first. `target_ref IS $3` rather than
/// `=` so that NULL (top-ups) compares equal to NULL.
pub async fn fetch_pending_payment_request(
    user_id: &str,
    kind: TransactionKind,
    target_ref: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let transaction = sqlx::query_as(
        r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND kind = $2 AND target_ref IS $3 AND status = $4 AND payment_method = $5
            ORDER BY created_at DESC LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(kind.to_string())
    .bind(target_ref)
    .bind(PaymentStatus::Pending.to_string())
    .bind(PaymentMethod::Sepay.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(transaction)
}

pub async fn has_completed_purchase(
    user_id: &str,
    kind: TransactionKind,
    target_ref: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
            SELECT EXISTS (
                SELECT 1 FROM transactions
                WHERE user_id = $1 AND kind = $2 AND target_ref IS $3 AND status = $4
            )
        "#,
    )
    .bind(user_id)
    .bind(kind.to_string())
    .bind(target_ref)
    .bind(PaymentStatus::Completed.to_string())
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

pub async fn attach_payment_request(
    id: &TransactionId,
    order_code: &str,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Transaction, PaymentGatewayError> {
    let result: Option<Transaction> = sqlx::query_as(
        r#"
            UPDATE transactions SET order_code = $2, expires_at = $3, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *
        "#,
    )
    .bind(id.as_str())
    .bind(order_code)
    .bind(expires_at)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| PaymentGatewayError::TransactionNotFound(id.clone()))
}

/// The settlement compare-and-set. Only a `Pending` row is updated; a concurrent settle, cancel, or expiry that
/// got there first leaves this update matching zero rows, and the caller inspects the row to find out what won.
pub(crate) async fn try_settle(
    id: &TransactionId,
    settlement: &SettlementUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PaymentGatewayError> {
    let result: Option<Transaction> = sqlx::query_as(
        r#"
            UPDATE transactions
            SET status = $2, gateway_transaction_id = $3, raw_notification = $4, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = $5
            RETURNING *
        "#,
    )
    .bind(id.as_str())
    .bind(PaymentStatus::Completed.to_string())
    .bind(settlement.gateway_transaction_id.as_str())
    .bind(settlement.raw_notification.as_str())
    .bind(PaymentStatus::Pending.to_string())
    .fetch_optional(conn)
    .await?;
    if let Some(t) = &result {
        debug!("📝️ Transaction [{}] settled with gateway id {}", t.id, settlement.gateway_transaction_id);
    }
    Ok(result)
}

/// The cancellation compare-and-set. Only a live (`Pending` or `Failed`) row is transitioned; the caller inspects
/// the row on a zero-row match to distinguish "already cancelled" from "settled first".
pub(crate) async fn try_cancel(
    id: &TransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PaymentGatewayError> {
    let result: Option<Transaction> = sqlx::query_as(
        r#"
            UPDATE transactions SET status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status IN ($3, $4)
            RETURNING *
        "#,
    )
    .bind(id.as_str())
    .bind(PaymentStatus::Cancelled.to_string())
    .bind(PaymentStatus::Pending.to_string())
    .bind(PaymentStatus::Failed.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}
