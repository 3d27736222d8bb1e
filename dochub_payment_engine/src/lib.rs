//! DocHub Payment Engine
//!
//! The reconciliation core of the DocHub document marketplace: it owns the purchase/top-up transaction record and
//! every mutation of it. A transaction is created `Pending` when a payment request is built, and can only leave that
//! state through the webhook reconciler, the status poller, or an explicit cancellation. The two settlement paths
//! (webhook push and on-demand poll) converge on a single compare-and-set commit so that duplicate or racing
//! deliveries settle a transaction exactly once.
//!
//! The crate is split in two:
//! 1. Storage ([`mod@sqlite`] behind the [`traits::PaymentGatewayDatabase`] trait). SQLite is the shipped backend;
//!    the trait is the seam for anything else. Database value types live in [`db_types`] and are public.
//! 2. The flow API ([`PaymentFlowApi`]): payment-request creation, webhook reconciliation, status polling and
//!    cancellation, written against the storage trait.

mod api;
pub mod db_types;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{PaymentFlowApi, PaymentFlowError, PaymentInfo, StatusInfo, WebhookAck};
