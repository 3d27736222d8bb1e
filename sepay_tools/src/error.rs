use thiserror::Error;

#[derive(Debug, Error)]
pub enum SepayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Gateway request failed: {0}")]
    RequestError(String),
    #[error("Gateway returned HTTP {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Gateway envelope reported status {0}")]
    EnvelopeStatus(i64),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
