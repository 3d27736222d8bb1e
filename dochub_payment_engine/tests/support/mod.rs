//! Shared scaffolding for the engine integration tests: a throwaway SQLite database with the schema applied, and a
//! flow API wired to a test gateway configuration.
#![allow(dead_code)]

use dochub_common::{Secret, Vnd};
use dochub_payment_engine::{sqlite::db::run_migrations, PaymentFlowApi, SqliteDatabase};
use sepay_tools::{SepayApi, SepayConfig};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const TEST_SECRET: &str = "test-webhook-secret";
pub const AUTH_HEADER: &str = "Apikey test-webhook-secret";

pub fn random_db_url() -> String {
    let path = std::env::temp_dir().join(format!("dochub_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn prepare_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = random_db_url();
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
        ..Default::default()
    }
}

pub fn flow_api(db: SqliteDatabase, config: SepayConfig) -> PaymentFlowApi<SqliteDatabase> {
    let gateway = SepayApi::new(config).expect("Error creating gateway client");
    PaymentFlowApi::new(db, gateway)
}

/// A webhook body the way the gateway sends it, with both current and legacy content keys populated.
pub fn webhook_payload(settlement_id: &str, direction: &str, amount: Vnd, content: &str) -> Vec<u8> {
    serde_json::json!({
        "id": settlement_id,
        "gateway": "ACB",
        "transactionDate": "2025-01-10 10:00:00",
        "accountNumber": "9924666",
        "transferType": direction,
        "transferAmount": amount.value(),
        "transferContent": content,
        "content": content,
    })
    .to_string()
    .into_bytes()
}
