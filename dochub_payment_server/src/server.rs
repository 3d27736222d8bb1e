use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use dochub_payment_engine::{sqlite::db::run_migrations, traits::PaymentGatewayDatabase, PaymentFlowApi, SqliteDatabase};
use log::*;
use sepay_tools::SepayApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{cancel_payment, create_payment, health, payment_status, sepay_webhook},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let gateway = SepayApi::new(config.sepay).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = HttpServer::new(move || {
        let payments_api = PaymentFlowApi::new(db.clone(), gateway.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("dhp::access_log"))
            .app_data(web::Data::new(payments_api))
            .configure(configure_routes::<SqliteDatabase>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    info!("🚀️ Server instance created for {host}:{port}");
    Ok(srv)
}

/// Route table, shared between the real server and the endpoint tests. The `PaymentFlowApi<B>` instance must
/// already be registered as app data.
pub fn configure_routes<B: PaymentGatewayDatabase + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::scope("/api")
            .service(web::resource("/payments").route(web::post().to(create_payment::<B>)))
            .service(web::resource("/payments/{id}/status").route(web::get().to(payment_status::<B>)))
            .service(web::resource("/payments/{id}/cancel").route(web::post().to(cancel_payment::<B>)))
            .service(web::resource("/webhook/sepay").route(web::post().to(sepay_webhook::<B>))),
    );
}
