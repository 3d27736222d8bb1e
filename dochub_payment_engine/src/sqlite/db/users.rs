use dochub_common::Vnd;
use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::UserBalance, traits::PaymentGatewayError};

pub async fn fetch_or_create_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<UserBalance, PaymentGatewayError> {
    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    let user: UserBalance = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_one(conn).await?;
    Ok(user)
}

pub async fn fetch_user_balance(user_id: &str, conn: &mut SqliteConnection) -> Result<Vnd, PaymentGatewayError> {
    let balance: Option<(Vnd,)> =
        sqlx::query_as("SELECT balance FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    balance.map(|(b,)| b).ok_or_else(|| PaymentGatewayError::UserNotFound(user_id.to_string()))
}

/// Add `amount` to the user's balance. Callers run this inside the same database transaction as the status
/// transition that justifies the credit.
pub(crate) async fn credit_balance(
    user_id: &str,
    amount: Vnd,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentGatewayError> {
    let result = sqlx::query("UPDATE users SET balance = balance + $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(user_id)
        .bind(amount)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PaymentGatewayError::UserNotFound(user_id.to_string()));
    }
    debug!("📝️ Credited {amount} to user {user_id}");
    Ok(())
}
