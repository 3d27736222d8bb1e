//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the storage backend and get registered with the concrete type in
//! [`crate::server::create_server_instance`].

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use dochub_payment_engine::{
    db_types::TransactionId,
    traits::PaymentGatewayDatabase,
    PaymentFlowApi,
    PaymentFlowError,
};
use log::*;

use crate::{
    data_objects::{CreatePaymentParams, JsonResponse},
    errors::ServerError,
};

/// The header carrying the HMAC signature of the raw body, when the gateway is configured for signature auth.
pub const SIGNATURE_HEADER: &str = "X-Sepay-Signature";

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//---------------------------------------------- Create payment ----------------------------------------------
/// Route handler for payment-request creation.
///
/// Builds (or refreshes) the pending transaction and returns the bank details, reference code, QR link and expiry
/// the client should display. Repeating the call for the same (user, item) is safe and returns the same
/// transaction.
pub async fn create_payment<B: PaymentGatewayDatabase>(
    body: web::Json<CreatePaymentParams>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST payment request for user {} ({})", params.user_id, params.kind);
    let info = api.create_payment_request(&params.user_id, params.kind, params.target_ref, params.amount).await?;
    Ok(HttpResponse::Ok().json(info))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
/// Route handler for gateway settlement notifications.
///
/// The status-code policy, chosen once and applied consistently:
/// * authentication failure → 401 (the gateway is misconfigured; retrying cannot help, but the operator must see
///   auth failures distinctly),
/// * malformed payloads and business rejections (no code, no match, amount mismatch) → 200 with
///   `success: false`, because the gateway retries any non-2xx and none of these can succeed on retry,
/// * infrastructure errors → 500, so the gateway retries after the store recovers. The commit is atomic, so a
///   retried delivery lands on a clean row either way.
pub async fn sepay_webhook<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️🏦️ Received webhook delivery: {} bytes", body.len());
    let signature = header_value(&req, SIGNATURE_HEADER);
    let auth = header_value(&req, "Authorization");
    let result = match api.process_notification(auth.as_deref(), signature.as_deref(), &body).await {
        Ok(ack) => {
            info!("💻️🏦️ Webhook delivery acknowledged: {}", ack.message());
            JsonResponse::success(ack.message())
        },
        Err(PaymentFlowError::AuthenticationFailed) => {
            return Err(ServerError::PaymentFlow(PaymentFlowError::AuthenticationFailed));
        },
        Err(e) if e.is_retryable() => {
            error!("💻️🏦️ Webhook processing hit an internal error. {e}");
            return Err(ServerError::BackendError(e.to_string()));
        },
        Err(e) => {
            warn!("💻️🏦️ Webhook delivery rejected: {e}");
            JsonResponse::failure(e)
        },
    };
    Ok(HttpResponse::Ok().json(result))
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers().get(name).and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}

//----------------------------------------------    Status  ----------------------------------------------------
/// Route handler for the status poll.
///
/// Answers from the local record when it is conclusive; otherwise asks the gateway's listing API whether the
/// money has arrived (see the engine's poller for the fallback rules).
pub async fn payment_status<B: PaymentGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = TransactionId::from(path.into_inner());
    debug!("💻️ GET status for transaction [{id}]");
    let status = api.check_status(&id).await?;
    Ok(HttpResponse::Ok().json(status))
}

//----------------------------------------------    Cancel  ----------------------------------------------------
pub async fn cancel_payment<B: PaymentGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = TransactionId::from(path.into_inner());
    debug!("💻️ POST cancel for transaction [{id}]");
    let transaction = api.cancel(&id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Payment cancelled for transaction {}", transaction.id))))
}
