use dochub_common::Vnd;
use sepay_tools::SepayApiError;
use thiserror::Error;

use crate::traits::PaymentGatewayError;

/// Everything that can go wrong in the payment flows. Business rejections are ordinary values of this type crossing
/// the API boundary; only `DatabaseError` and `GatewayApi` describe infrastructure trouble and warrant a retry by
/// the caller.
#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Gateway payments are not enabled")]
    GatewayDisabled,
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(Vnd),
    #[error("This item has already been purchased")]
    AlreadyPurchased,
    #[error("Webhook authentication failed")]
    AuthenticationFailed,
    #[error("Could not decode the notification payload. {0}")]
    InvalidPayload(String),
    #[error("No order code found in the transfer content")]
    NoOrderCodeFound,
    /// Also returned when the code matches a transaction that is no longer payable (cancelled or failed): the
    /// response shape deliberately does not reveal whether the code ever existed.
    #[error("No payable transaction matches this notification")]
    TransactionNotFound,
    #[error("Amount mismatch: expected {expected}, notified {actual}")]
    AmountMismatch { expected: Vnd, actual: Vnd },
    #[error("A completed payment cannot be cancelled")]
    CannotCancelCompleted,
    #[error("Gateway API error: {0}")]
    GatewayApi(String),
    #[error("Internal storage error: {0}")]
    DatabaseError(String),
}

impl From<PaymentGatewayError> for PaymentFlowError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::TransactionNotFound(_) => Self::TransactionNotFound,
            PaymentGatewayError::UserNotFound(u) => Self::DatabaseError(format!("User account {u} does not exist")),
            PaymentGatewayError::DatabaseError(e) => Self::DatabaseError(e),
        }
    }
}

impl From<SepayApiError> for PaymentFlowError {
    fn from(e: SepayApiError) -> Self {
        Self::GatewayApi(e.to_string())
    }
}

impl PaymentFlowError {
    /// Whether a retry by the upstream gateway could ever succeed. Used by the webhook boundary to pick between
    /// "acknowledge and drop" and "signal retry".
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::GatewayApi(_))
    }
}
