//! Client-side integration with the SePay bank-transfer gateway.
//!
//! SePay has no payment "session" concept. A merchant displays a bank account and a short reference code; the payer
//! makes an ordinary bank transfer carrying that code in the free-text memo. Settlement is reported back over two
//! channels: a signed webhook pushed to the merchant, and a polled transaction-listing API. This crate covers the
//! plumbing for both channels: configuration, webhook authentication, payload decoding tolerant of the gateway's
//! key-name drift, the listing client, and the QR image link shown to the payer.

mod api;
mod auth;
mod config;
mod data_objects;
mod error;
mod helpers;

pub use api::SepayApi;
pub use auth::{calculate_signature, verify_api_key, verify_signature};
pub use config::SepayConfig;
pub use data_objects::{GatewayTransaction, WebhookNotification};
pub use error::SepayApiError;
pub use helpers::{parse_vnd_amount, qr_image_url};
