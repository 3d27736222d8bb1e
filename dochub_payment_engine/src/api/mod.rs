mod errors;
mod payment_flow_api;
mod payment_objects;

pub use errors::PaymentFlowError;
pub use payment_flow_api::PaymentFlowApi;
pub use payment_objects::{PaymentInfo, StatusInfo, WebhookAck};
