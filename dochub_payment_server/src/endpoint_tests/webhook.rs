use actix_web::http::StatusCode;
use dochub_common::Vnd;

use super::helpers::{create_params, get, post_json, post_webhook, test_db, webhook_payload, AUTH_HEADER};

#[actix_web::test]
async fn webhook_without_credentials_is_unauthorized() {
    let db = test_db().await;
    let payload = webhook_payload("SEP-1", "in", 50_000, "DHAAAA1111");
    let (status, body) = post_webhook(&payload, None, db).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn webhook_with_wrong_key_is_unauthorized() {
    let db = test_db().await;
    let payload = webhook_payload("SEP-2", "in", 50_000, "DHAAAA1111");
    let (status, _) = post_webhook(&payload, Some("Apikey nope"), db).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn webhook_settles_a_payment_end_to_end() {
    let db = test_db().await;
    let params = create_params("alice", "Document", Some("doc-1"), Vnd::from(50_000));
    let (status, created) = post_json("/api/payments", params, db.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let reference = created["reference"].as_str().expect("no reference in payment info").to_string();
    let id = created["transaction_id"].as_str().expect("no id in payment info").to_string();

    let payload = webhook_payload("SEP-3", "in", 50_000, &format!("NGUYEN VAN A {reference}"));
    let (status, body) = post_webhook(&payload, Some(AUTH_HEADER), db.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, info) = get(&format!("/api/payments/{id}/status"), db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["status"], "Completed");
    assert_eq!(info["gateway_transaction_id"], "SEP-3");
}

#[actix_web::test]
async fn business_rejections_are_acknowledged_with_200() {
    let db = test_db().await;
    let params = create_params("bob", "Document", Some("doc-2"), Vnd::from(50_000));
    let (_, created) = post_json("/api/payments", params, db.clone()).await;
    let reference = created["reference"].as_str().unwrap().to_string();

    // Amount far outside tolerance: rejected, but with a 2xx so the gateway stops retrying.
    let payload = webhook_payload("SEP-4", "in", 40_000, &reference);
    let (status, body) = post_webhook(&payload, Some(AUTH_HEADER), db.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    // Same policy for a memo with no code in it.
    let payload = webhook_payload("SEP-5", "in", 50_000, "no code in this memo");
    let (status, body) = post_webhook(&payload, Some(AUTH_HEADER), db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn replayed_webhook_is_acknowledged() {
    let db = test_db().await;
    let params = create_params("carol", "Topup", None, Vnd::from(100_000));
    let (_, created) = post_json("/api/payments", params, db.clone()).await;
    let reference = created["reference"].as_str().unwrap().to_string();

    let payload = webhook_payload("SEP-6", "in", 100_000, &reference);
    let (status, first) = post_webhook(&payload, Some(AUTH_HEADER), db.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    let (status, second) = post_webhook(&payload, Some(AUTH_HEADER), db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["success"], true);
    assert!(second["message"].as_str().unwrap().contains("already processed"));
}
