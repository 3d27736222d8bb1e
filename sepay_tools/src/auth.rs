//! Webhook authentication.
//!
//! SePay instances are configured with one of two webhook credential styles: an HMAC-SHA256 signature over the raw
//! request body, carried in a dedicated header as hex, or a static API key embedded in the `Authorization` header.
//! Real deployments have been observed sending the key as `Apikey <key>`, `Bearer <key>` or the bare token, with
//! the scheme word in arbitrary case, so extraction must not assume a fixed wrapper.

use dochub_common::Secret;
use hmac::{Hmac, Mac};
use log::warn;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`. Used to sign simulated webhooks as well as to verify
/// inbound ones.
pub fn calculate_signature(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify the hex signature for the raw request body. The comparison runs inside the MAC verifier, which is
/// constant-time. An empty secret never verifies.
pub fn verify_signature(secret: &Secret<String>, payload: &[u8], signature: &str) -> bool {
    if secret.reveal().is_empty() {
        warn!("🔐️ Webhook signature received but no secret key is configured. Rejecting.");
        return false;
    }
    let provided = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let mut mac = HmacSha256::new_from_slice(secret.reveal().as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(payload);
    mac.verify_slice(&provided).is_ok()
}

/// Pull the credential token out of an `Authorization` header value, ignoring any scheme words in front of it.
/// The key is always the final whitespace-separated token.
fn extract_api_key(header: &str) -> &str {
    header.split_whitespace().last().unwrap_or("")
}

/// Compare the API key in the auth header against the configured secret. The comparison goes through the MAC
/// verifier, which is constant-time.
pub fn verify_api_key(expected: &Secret<String>, auth_header: &str) -> bool {
    let expected = expected.reveal();
    if expected.is_empty() {
        warn!("🔐️ Webhook API key received but no secret key is configured. Rejecting.");
        return false;
    }
    let candidate = extract_api_key(auth_header);
    let mut reference = HmacSha256::new_from_slice(expected.as_bytes()).expect("HMAC accepts keys of any size");
    reference.update(expected.as_bytes());
    let reference = reference.finalize().into_bytes();
    let mut mac = HmacSha256::new_from_slice(expected.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(candidate.as_bytes());
    mac.verify_slice(&reference).is_ok()
}
