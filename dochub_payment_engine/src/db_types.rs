use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dochub_common::Vnd;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------    TransactionId     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    /// Ids are assigned once, at creation, and never change.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TransactionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------    PaymentStatus     ---------------------------------------------------------
/// The lifecycle state of a transaction. `Pending` is the only state money can still arrive in; the other three are
/// terminal and a transaction never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Created, payable, not yet settled.
    Pending,
    /// Settled. `gateway_transaction_id` is recorded exactly when a transaction enters this state.
    Completed,
    /// The gateway reported a failed transfer.
    Failed,
    /// Abandoned by the user or an admin before settlement.
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------   TransactionKind    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Purchase of a single document.
    Document,
    /// Purchase of a document package.
    Package,
    /// Account balance top-up. Settlement credits the user's balance.
    Topup,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Document => write!(f, "Document"),
            TransactionKind::Package => write!(f, "Package"),
            TransactionKind::Topup => write!(f, "Topup"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Document" => Ok(Self::Document),
            "Package" => Ok(Self::Package),
            "Topup" => Ok(Self::Topup),
            s => Err(ConversionError(format!("Invalid transaction kind: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Paid from the user's stored balance. Settles synchronously in catalog code; never reconciled here.
    Balance,
    /// Paid by bank transfer through the gateway. The only method the reconciler acts on.
    Sepay,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Balance => write!(f, "Balance"),
            PaymentMethod::Sepay => write!(f, "Sepay"),
        }
    }
}

//--------------------------------------     Transaction      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: String,
    pub kind: TransactionKind,
    /// The purchased document or package id. `None` for top-ups.
    pub target_ref: Option<String>,
    /// Immutable once the row is inserted.
    pub amount: Vnd,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    /// The reference code the payer puts in the transfer memo. Indexed; webhook lookup matches against this.
    pub order_code: Option<String>,
    /// The gateway's settlement id. Unique; present exactly when `status` is `Completed`.
    pub gateway_transaction_id: Option<String>,
    /// Last raw notification payload, kept for audit.
    pub raw_notification: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// A pending payment request past its expiry is stale: still completable if money arrives, but clients should
    /// offer the payer a fresh request.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == PaymentStatus::Pending && self.expires_at.map(|t| t < now).unwrap_or(false)
    }
}

//--------------------------------------    NewTransaction    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: String,
    pub kind: TransactionKind,
    pub target_ref: Option<String>,
    pub amount: Vnd,
    pub payment_method: PaymentMethod,
}

impl NewTransaction {
    /// A new gateway-payable transaction in `Pending` state.
    pub fn sepay(user_id: impl Into<String>, kind: TransactionKind, target_ref: Option<String>, amount: Vnd) -> Self {
        Self { user_id: user_id.into(), kind, target_ref, amount, payment_method: PaymentMethod::Sepay }
    }
}

//--------------------------------------     UserBalance      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserBalance {
    pub id: String,
    pub balance: Vnd,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
