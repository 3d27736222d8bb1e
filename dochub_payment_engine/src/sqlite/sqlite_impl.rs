//! `SqliteDatabase` is a concrete implementation of a DocHub payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. The guarded transitions (settle, cancel) run inside sqlx transactions; an early return drops the
//! transaction and rolls everything back, so a failed balance credit can never leave a half-settled row behind.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use dochub_common::Vnd;
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, transactions, users};
use crate::{
    db_types::{NewTransaction, PaymentStatus, Transaction, TransactionId, TransactionKind, UserBalance},
    traits::{
        CancellationOutcome,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        SettlementOutcome,
        SettlementUpdate,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connect using the URL from the environment (`DHP_DATABASE_URL`), or the default store.
    pub async fn new(max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PaymentGatewayError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_transaction(id, &mut conn).await?)
    }

    async fn fetch_transaction_by_order_code(&self, code: &str) -> Result<Option<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_transaction_by_order_code(code, &mut conn).await?)
    }

    async fn fetch_transaction_by_gateway_id(
        &self,
        gateway_id: &str,
    ) -> Result<Option<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_transaction_by_gateway_id(gateway_id, &mut conn).await?)
    }

    async fn fetch_pending_payment_request(
        &self,
        user_id: &str,
        kind: TransactionKind,
        target_ref: Option<&str>,
    ) -> Result<Option<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_pending_payment_request(user_id, kind, target_ref, &mut conn).await?)
    }

    async fn has_completed_purchase(
        &self,
        user_id: &str,
        kind: TransactionKind,
        target_ref: Option<&str>,
    ) -> Result<bool, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::has_completed_purchase(user_id, kind, target_ref, &mut conn).await?)
    }

    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let transaction = transactions::insert_transaction(transaction, &mut conn).await?;
        debug!("📝️ Transaction [{}] inserted for user {}", transaction.id, transaction.user_id);
        Ok(transaction)
    }

    async fn attach_payment_request(
        &self,
        id: &TransactionId,
        order_code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Transaction, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::attach_payment_request(id, order_code, expires_at, &mut conn).await
    }

    async fn settle_transaction(
        &self,
        id: &TransactionId,
        settlement: SettlementUpdate,
    ) -> Result<SettlementOutcome, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let settled = transactions::try_settle(id, &settlement, &mut *tx).await?;
        let outcome = match settled {
            Some(transaction) => {
                if transaction.kind == TransactionKind::Topup {
                    users::credit_balance(&transaction.user_id, settlement.paid_amount, &mut *tx).await?;
                }
                tx.commit().await?;
                SettlementOutcome::Settled(transaction)
            },
            None => {
                // Lost the compare-and-set. Read the row to see what got there first.
                let current = transactions::fetch_transaction(id, &mut *tx)
                    .await?
                    .ok_or_else(|| PaymentGatewayError::TransactionNotFound(id.clone()))?;
                tx.commit().await?;
                match current.status {
                    PaymentStatus::Completed => SettlementOutcome::AlreadySettled(current),
                    _ => SettlementOutcome::NotPending(current),
                }
            },
        };
        Ok(outcome)
    }

    async fn cancel_transaction(&self, id: &TransactionId) -> Result<CancellationOutcome, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let cancelled = transactions::try_cancel(id, &mut *tx).await?;
        let outcome = match cancelled {
            Some(transaction) => {
                info!("📝️ Transaction [{}] cancelled", transaction.id);
                tx.commit().await?;
                CancellationOutcome::Cancelled(transaction)
            },
            None => {
                let current = transactions::fetch_transaction(id, &mut *tx)
                    .await?
                    .ok_or_else(|| PaymentGatewayError::TransactionNotFound(id.clone()))?;
                tx.commit().await?;
                match current.status {
                    PaymentStatus::Cancelled => CancellationOutcome::AlreadyCancelled(current),
                    _ => CancellationOutcome::SettledConflict(current),
                }
            },
        };
        Ok(outcome)
    }

    async fn fetch_or_create_user(&self, user_id: &str) -> Result<UserBalance, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_or_create_user(user_id, &mut conn).await
    }

    async fn fetch_user_balance(&self, user_id: &str) -> Result<Vnd, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_balance(user_id, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
