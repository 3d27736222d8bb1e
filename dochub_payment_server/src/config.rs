use std::env;

use log::*;
use sepay_tools::SepayConfig;

const DEFAULT_DHP_HOST: &str = "127.0.0.1";
const DEFAULT_DHP_PORT: u16 = 8360;

/// Server configuration, assembled once in `main` from the environment and handed to [`crate::server::run_server`].
/// Nothing below the boundary reads environment variables.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Gateway credentials and behaviour knobs, injected into the payment engine.
    pub sepay: SepayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DHP_HOST.to_string(),
            port: DEFAULT_DHP_PORT,
            database_url: String::default(),
            sepay: SepayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("DHP_HOST").ok().unwrap_or_else(|| DEFAULT_DHP_HOST.into());
        let port = env::var("DHP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for DHP_PORT. {e} Using the default, {DEFAULT_DHP_PORT}, instead."
                    );
                    DEFAULT_DHP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_DHP_PORT);
        let database_url = env::var("DHP_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ DHP_DATABASE_URL is not set. Please set it to the URL for the payments database.");
            String::default()
        });
        let sepay = SepayConfig::from_env_or_default();
        if !sepay.is_enabled() {
            warn!("🪛️ SePay is disabled or missing credentials. Payment requests will be refused.");
        }
        Self { host, port, database_url, sepay }
    }
}
