//! # DocHub payment server
//! This module hosts the HTTP boundary of the payment gateway. It is responsible for:
//! Listening for incoming webhook deliveries from the SePay gateway.
//! Exposing payment-request creation, status polling and cancellation to marketplace clients.
//! Translating flow-level results into transport responses.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/payments`: Create (or refresh) a gateway payment request.
//! * `POST /api/webhook/sepay`: The webhook route for receiving settlement notifications from the gateway.
//! * `GET /api/payments/{id}/status`: Settlement status, with an on-demand gateway poll for pending payments.
//! * `POST /api/payments/{id}/cancel`: Abandon a pending payment.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
