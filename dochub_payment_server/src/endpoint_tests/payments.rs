use actix_web::http::StatusCode;
use dochub_common::Vnd;

use super::helpers::{create_params, get, post, post_json, post_webhook, test_db, webhook_payload, AUTH_HEADER};

#[actix_web::test]
async fn create_payment_returns_display_details() {
    let db = test_db().await;
    let params = create_params("alice", "Document", Some("doc-9"), Vnd::from(56_000));
    let (status, body) = post_json("/api/payments", params, db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bank_account"], "9924666");
    assert_eq!(body["bank_name"], "ACB");
    assert_eq!(body["amount"], 56_000);
    assert!(body["reference"].as_str().unwrap().starts_with("DH"));
    assert!(body["qr_url"].as_str().unwrap().contains("des=DH"));
    assert!(body["expires_at"].is_string());
}

#[actix_web::test]
async fn create_payment_is_idempotent_per_item() {
    let db = test_db().await;
    let params = create_params("bob", "Package", Some("pkg-1"), Vnd::from(90_000));
    let (_, first) = post_json("/api/payments", params.clone(), db.clone()).await;
    let (_, second) = post_json("/api/payments", params, db).await;
    assert_eq!(first["transaction_id"], second["transaction_id"]);
}

#[actix_web::test]
async fn purchasing_an_owned_item_is_rejected() {
    let db = test_db().await;
    let params = create_params("carol", "Document", Some("doc-5"), Vnd::from(30_000));
    let (_, created) = post_json("/api/payments", params.clone(), db.clone()).await;
    let reference = created["reference"].as_str().unwrap().to_string();
    let payload = webhook_payload("SEP-10", "in", 30_000, &reference);
    post_webhook(&payload, Some(AUTH_HEADER), db.clone()).await;

    let (status, body) = post_json("/api/payments", params, db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn status_of_unknown_transaction_is_404() {
    let db = test_db().await;
    let (status, _) = get("/api/payments/no-such-id/status", db).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn status_poll_survives_an_unreachable_gateway() {
    let db = test_db().await;
    let params = create_params("dave", "Document", Some("doc-6"), Vnd::from(10_000));
    let (_, created) = post_json("/api/payments", params, db.clone()).await;
    let id = created["transaction_id"].as_str().unwrap().to_string();

    // The test config points the listing API at an unroutable address; the poll must still answer.
    let (status, body) = get(&format!("/api/payments/{id}/status"), db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Pending");
}

#[actix_web::test]
async fn cancel_then_cancel_again_is_fine() {
    let db = test_db().await;
    let params = create_params("erin", "Document", Some("doc-7"), Vnd::from(10_000));
    let (_, created) = post_json("/api/payments", params, db.clone()).await;
    let id = created["transaction_id"].as_str().unwrap().to_string();

    let (status, body) = post(&format!("/api/payments/{id}/cancel"), db.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let (status, _) = post(&format!("/api/payments/{id}/cancel"), db).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn cancelling_a_settled_payment_is_rejected() {
    let db = test_db().await;
    let params = create_params("frank", "Document", Some("doc-8"), Vnd::from(20_000));
    let (_, created) = post_json("/api/payments", params, db.clone()).await;
    let id = created["transaction_id"].as_str().unwrap().to_string();
    let reference = created["reference"].as_str().unwrap().to_string();
    let payload = webhook_payload("SEP-11", "in", 20_000, &reference);
    post_webhook(&payload, Some(AUTH_HEADER), db.clone()).await;

    let (status, body) = post(&format!("/api/payments/{id}/cancel"), db).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
