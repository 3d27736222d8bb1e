//! Webhook reconciliation flows: settlement, idempotency, tolerance, direction, and the races between competing
//! completion paths.

mod support;

use dochub_common::Vnd;
use dochub_payment_engine::{
    db_types::{PaymentStatus, TransactionKind},
    traits::PaymentGatewayDatabase,
    PaymentFlowError,
    WebhookAck,
};
use sepay_tools::calculate_signature;
use support::{flow_api, prepare_db, test_config, webhook_payload, AUTH_HEADER, TEST_SECRET};

#[tokio::test]
async fn webhook_settles_a_pending_document_purchase() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api
        .create_payment_request("alice", TransactionKind::Document, Some("doc-101".to_string()), Vnd::from(50_000))
        .await
        .expect("Error creating payment request");

    let content = format!("NGUYEN VAN A {}", info.reference);
    let payload = webhook_payload("SEP-1001", "in", Vnd::from(50_000), &content);
    let ack = api.process_notification(Some(AUTH_HEADER), None, &payload).await.expect("Webhook rejected");
    assert_eq!(ack, WebhookAck::Settled(info.transaction_id.clone()));

    let tx = db.fetch_transaction(&info.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.status, PaymentStatus::Completed);
    assert_eq!(tx.gateway_transaction_id.as_deref(), Some("SEP-1001"));
    assert!(tx.raw_notification.is_some());
    // Item purchases never touch the balance.
    assert_eq!(db.fetch_user_balance("alice").await.unwrap(), Vnd::from(0));
}

#[tokio::test]
async fn replayed_webhook_changes_nothing() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api
        .create_payment_request("bob", TransactionKind::Topup, None, Vnd::from(100_000))
        .await
        .unwrap();

    let payload = webhook_payload("SEP-2002", "in", Vnd::from(100_000), &info.reference);
    let first = api.process_notification(Some(AUTH_HEADER), None, &payload).await.unwrap();
    assert_eq!(first, WebhookAck::Settled(info.transaction_id.clone()));
    assert_eq!(db.fetch_user_balance("bob").await.unwrap(), Vnd::from(100_000));

    let second = api.process_notification(Some(AUTH_HEADER), None, &payload).await.unwrap();
    assert_eq!(second, WebhookAck::AlreadyProcessed(info.transaction_id.clone()));
    // Settled once, credited once.
    assert_eq!(db.fetch_user_balance("bob").await.unwrap(), Vnd::from(100_000));
    let tx = db.fetch_transaction(&info.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.gateway_transaction_id.as_deref(), Some("SEP-2002"));
}

#[tokio::test]
async fn amount_on_the_tolerance_boundary_settles() {
    let db = prepare_db().await;
    let api = flow_api(db, test_config());
    let info = api
        .create_payment_request("carol", TransactionKind::Document, Some("doc-7".to_string()), Vnd::from(50_000))
        .await
        .unwrap();

    // The default tolerance is 1000₫; a transfer short by exactly that much still settles.
    let payload = webhook_payload("SEP-3003", "in", Vnd::from(49_000), &info.reference);
    let ack = api.process_notification(Some(AUTH_HEADER), None, &payload).await.unwrap();
    assert_eq!(ack, WebhookAck::Settled(info.transaction_id));
}

#[tokio::test]
async fn amount_one_unit_beyond_tolerance_rejects() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api
        .create_payment_request("dave", TransactionKind::Document, Some("doc-8".to_string()), Vnd::from(50_000))
        .await
        .unwrap();

    let payload = webhook_payload("SEP-4004", "in", Vnd::from(48_999), &info.reference);
    let err = api.process_notification(Some(AUTH_HEADER), None, &payload).await.expect_err("Expected a rejection");
    assert!(matches!(err, PaymentFlowError::AmountMismatch { .. }));
    // The transaction stays payable: the payer can send a corrected transfer.
    let tx = db.fetch_transaction(&info.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.status, PaymentStatus::Pending);
    assert_eq!(tx.gateway_transaction_id, None);
}

#[tokio::test]
async fn debit_notifications_never_mutate() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api
        .create_payment_request("erin", TransactionKind::Document, Some("doc-9".to_string()), Vnd::from(50_000))
        .await
        .unwrap();

    // Content matches perfectly; direction says outgoing. Acknowledged so the gateway stops retrying, but nothing
    // is touched.
    let payload = webhook_payload("SEP-5005", "out", Vnd::from(50_000), &info.reference);
    let ack = api.process_notification(Some(AUTH_HEADER), None, &payload).await.unwrap();
    assert!(matches!(ack, WebhookAck::Ignored(_)));
    let tx = db.fetch_transaction(&info.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn cancelled_transactions_never_settle() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api
        .create_payment_request("frank", TransactionKind::Document, Some("doc-10".to_string()), Vnd::from(50_000))
        .await
        .unwrap();
    api.cancel(&info.transaction_id).await.unwrap();

    let payload = webhook_payload("SEP-6006", "in", Vnd::from(50_000), &info.reference);
    let err = api.process_notification(Some(AUTH_HEADER), None, &payload).await.expect_err("Expected a rejection");
    assert!(matches!(err, PaymentFlowError::TransactionNotFound));
    let tx = db.fetch_transaction(&info.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.status, PaymentStatus::Cancelled);
}

#[tokio::test]
async fn topup_settlement_credits_the_notified_amount() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api.create_payment_request("grace", TransactionKind::Topup, None, Vnd::from(100_000)).await.unwrap();

    let content = format!("grace napping {}", info.reference.to_lowercase());
    let payload = webhook_payload("SEP-7007", "in", Vnd::from(100_000), &content);
    let ack = api.process_notification(Some(AUTH_HEADER), None, &payload).await.unwrap();
    assert_eq!(ack, WebhookAck::Settled(info.transaction_id));
    assert_eq!(db.fetch_user_balance("grace").await.unwrap(), Vnd::from(100_000));
}

#[tokio::test]
async fn concurrent_deliveries_settle_exactly_once() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api.create_payment_request("heidi", TransactionKind::Topup, None, Vnd::from(75_000)).await.unwrap();

    let payload = webhook_payload("SEP-8008", "in", Vnd::from(75_000), &info.reference);
    let (a, b) = tokio::join!(
        api.process_notification(Some(AUTH_HEADER), None, &payload),
        api.process_notification(Some(AUTH_HEADER), None, &payload),
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    let settled = outcomes.iter().filter(|o| matches!(o, WebhookAck::Settled(_))).count();
    assert_eq!(settled, 1, "exactly one delivery may perform the settlement: {outcomes:?}");
    assert_eq!(db.fetch_user_balance("heidi").await.unwrap(), Vnd::from(75_000));
}

#[tokio::test]
async fn hmac_signature_authenticates_the_raw_body() {
    let db = prepare_db().await;
    let api = flow_api(db, test_config());
    let info = api
        .create_payment_request("ivan", TransactionKind::Document, Some("doc-11".to_string()), Vnd::from(60_000))
        .await
        .unwrap();

    let payload = webhook_payload("SEP-9009", "in", Vnd::from(60_000), &info.reference);
    let signature = calculate_signature(TEST_SECRET, &payload);
    let ack = api.process_notification(None, Some(&signature), &payload).await.unwrap();
    assert_eq!(ack, WebhookAck::Settled(info.transaction_id));
}

#[tokio::test]
async fn authentication_failures_reject_before_any_lookup() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api
        .create_payment_request("judy", TransactionKind::Document, Some("doc-12".to_string()), Vnd::from(60_000))
        .await
        .unwrap();

    let payload = webhook_payload("SEP-1010", "in", Vnd::from(60_000), &info.reference);
    for (auth, signature) in [
        (Some("Apikey wrong-key"), None),
        (None, Some("0f0f0f0f")),
        (None, None),
    ] {
        let err = api.process_notification(auth, signature, &payload).await.expect_err("Expected auth failure");
        assert!(matches!(err, PaymentFlowError::AuthenticationFailed));
    }
    let tx = db.fetch_transaction(&info.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn unparseable_payloads_are_rejected() {
    let db = prepare_db().await;
    let api = flow_api(db, test_config());
    let err = api
        .process_notification(Some(AUTH_HEADER), None, b"this is not json")
        .await
        .expect_err("Expected a rejection");
    assert!(matches!(err, PaymentFlowError::InvalidPayload(_)));
}

#[tokio::test]
async fn content_without_a_code_is_rejected() {
    let db = prepare_db().await;
    let api = flow_api(db, test_config());
    let payload = webhook_payload("SEP-1111", "in", Vnd::from(10_000), "no reference in this memo");
    let err = api.process_notification(Some(AUTH_HEADER), None, &payload).await.expect_err("Expected a rejection");
    assert!(matches!(err, PaymentFlowError::NoOrderCodeFound));
}

#[tokio::test]
async fn unknown_codes_are_rejected() {
    let db = prepare_db().await;
    let api = flow_api(db, test_config());
    let payload = webhook_payload("SEP-1212", "in", Vnd::from(10_000), "chuyen tien DHAAAA1111");
    let err = api.process_notification(Some(AUTH_HEADER), None, &payload).await.expect_err("Expected a rejection");
    assert!(matches!(err, PaymentFlowError::TransactionNotFound));
}

#[tokio::test]
async fn cancellation_is_idempotent_and_final() {
    let db = prepare_db().await;
    let api = flow_api(db, test_config());
    let info = api
        .create_payment_request("kate", TransactionKind::Document, Some("doc-13".to_string()), Vnd::from(20_000))
        .await
        .unwrap();

    let cancelled = api.cancel(&info.transaction_id).await.unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);
    // Cancelling again succeeds silently.
    let again = api.cancel(&info.transaction_id).await.unwrap();
    assert_eq!(again.status, PaymentStatus::Cancelled);
}

#[tokio::test]
async fn settled_payments_cannot_be_cancelled() {
    let db = prepare_db().await;
    let api = flow_api(db.clone(), test_config());
    let info = api
        .create_payment_request("liam", TransactionKind::Document, Some("doc-14".to_string()), Vnd::from(20_000))
        .await
        .unwrap();
    let payload = webhook_payload("SEP-1313", "in", Vnd::from(20_000), &info.reference);
    api.process_notification(Some(AUTH_HEADER), None, &payload).await.unwrap();

    let err = api.cancel(&info.transaction_id).await.expect_err("Expected a rejection");
    assert!(matches!(err, PaymentFlowError::CannotCancelCompleted));
    let tx = db.fetch_transaction(&info.transaction_id).await.unwrap().unwrap();
    assert_eq!(tx.status, PaymentStatus::Completed);
}
