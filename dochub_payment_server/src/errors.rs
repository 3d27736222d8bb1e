use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use dochub_payment_engine::PaymentFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    PaymentFlow(PaymentFlowError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::PaymentFlow(e) => match e {
                PaymentFlowError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
                PaymentFlowError::TransactionNotFound => StatusCode::NOT_FOUND,
                PaymentFlowError::GatewayDisabled
                | PaymentFlowError::InvalidAmount(_)
                | PaymentFlowError::AlreadyPurchased
                | PaymentFlowError::InvalidPayload(_)
                | PaymentFlowError::NoOrderCodeFound
                | PaymentFlowError::AmountMismatch { .. }
                | PaymentFlowError::CannotCancelCompleted => StatusCode::BAD_REQUEST,
                PaymentFlowError::GatewayApi(_) | PaymentFlowError::DatabaseError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                },
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "message": self.to_string() }).to_string())
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        Self::PaymentFlow(e)
    }
}
