use std::fmt::Display;

use dochub_common::Vnd;
use dochub_payment_engine::db_types::TransactionKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of `POST /api/payments`. The user id arrives from the (out-of-scope) session layer upstream; this core
/// trusts its callers on identity and enforces only payment rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentParams {
    pub user_id: String,
    pub kind: TransactionKind,
    #[serde(default)]
    pub target_ref: Option<String>,
    pub amount: Vnd,
}
