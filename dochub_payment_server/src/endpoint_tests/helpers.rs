use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use dochub_common::{Secret, Vnd};
use dochub_payment_engine::{sqlite::db::run_migrations, PaymentFlowApi, SqliteDatabase};
use sepay_tools::{SepayApi, SepayConfig};
use serde_json::Value;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::server::configure_routes;

pub const TEST_SECRET: &str = "endpoint-test-secret";
pub const AUTH_HEADER: &str = "Apikey endpoint-test-secret";

pub async fn test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let path = std::env::temp_dir().join(format!("dochub_server_test_{}.db", rand::random::<u64>()));
    let url = format!("sqlite://{}", path.display());
    Sqlite::create_database(&url).await.expect("Error creating test database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
    run_migrations(db.pool()).await.expect("Error running migrations");
    db
}

pub fn test_config() -> SepayConfig {
    SepayConfig {
        enabled: true,
        api_key: Secret::new("test-api-key".to_string()),
        secret_key: Secret::new(TEST_SECRET.to_string()),
        bank_account: "9924666".to_string(),
        bank_name: "ACB".to_string(),
        account_name: "DOC HUB".to_string(),
        // Unroutable on purpose: endpoint tests exercise the poller's local fallback, never a live gateway.
        api_base: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    }
}

async fn call(req: TestRequest, db: SqliteDatabase) -> (StatusCode, Value) {
    let gateway = SepayApi::new(test_config()).expect("Error creating gateway client");
    let api = PaymentFlowApi::new(db, gateway);
    let app = App::new().app_data(web::Data::new(api)).configure(configure_routes::<SqliteDatabase>);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let bytes = test::read_body(res).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn post_json(path: &str, body: Value, db: SqliteDatabase) -> (StatusCode, Value) {
    call(TestRequest::post().uri(path).set_json(body), db).await
}

pub async fn post_webhook(payload: &[u8], auth: Option<&str>, db: SqliteDatabase) -> (StatusCode, Value) {
    let mut req = TestRequest::post().uri("/api/webhook/sepay").set_payload(payload.to_vec());
    if let Some(auth) = auth {
        req = req.insert_header(("Authorization", auth));
    }
    call(req, db).await
}

pub async fn get(path: &str, db: SqliteDatabase) -> (StatusCode, Value) {
    call(TestRequest::get().uri(path), db).await
}

pub async fn post(path: &str, db: SqliteDatabase) -> (StatusCode, Value) {
    call(TestRequest::post().uri(path), db).await
}

pub fn create_params(user_id: &str, kind: &str, target_ref: Option<&str>, amount: Vnd) -> Value {
    serde_json::json!({
        "user_id": user_id,
        "kind": kind,
        "target_ref": target_ref,
        "amount": amount.value(),
    })
}

pub fn webhook_payload(settlement_id: &str, direction: &str, amount: i64, content: &str) -> Vec<u8> {
    serde_json::json!({
        "id": settlement_id,
        "transferType": direction,
        "transferAmount": amount,
        "transferContent": content,
        "content": content,
    })
    .to_string()
    .into_bytes()
}
