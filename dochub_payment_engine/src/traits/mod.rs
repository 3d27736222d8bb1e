//! The traits that a storage backend must implement to drive the payment engine.

mod data_objects;
mod payment_gateway_database;

pub use data_objects::{CancellationOutcome, SettlementOutcome, SettlementUpdate};
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
