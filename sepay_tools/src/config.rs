use std::time::Duration;

use dochub_common::{parse_boolean_flag, Secret, Vnd};
use log::*;

const DEFAULT_API_BASE: &str = "https://my.sepay.vn/userapi";
const DEFAULT_QR_BASE: &str = "https://qr.sepay.vn/img";
const DEFAULT_PAYMENT_TIMEOUT_SECS: i64 = 900;
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIST_LIMIT: u32 = 20;
const DEFAULT_AMOUNT_TOLERANCE: i64 = 1000;

/// Gateway configuration, read from the environment exactly once at process start and passed by reference into
/// anything that talks to SePay. Business logic never reads environment variables itself.
#[derive(Debug, Clone)]
pub struct SepayConfig {
    /// Master switch. When off, payment requests are refused and the poller never makes an outbound call.
    pub enabled: bool,
    /// Bearer token for the transaction-listing API.
    pub api_key: Secret<String>,
    /// Shared secret for webhook authentication (HMAC signature or API-key header, whichever the gateway is
    /// configured to send).
    pub secret_key: Secret<String>,
    pub bank_account: String,
    pub bank_name: String,
    pub account_name: String,
    /// Optional virtual-account routing prefix. When set, the payer-facing reference is "<va> <code>", so the
    /// reference contains a space and must be URL-encoded wherever it is embedded in a link.
    pub virtual_account: Option<String>,
    /// How long a displayed payment request stays payable.
    pub payment_timeout: chrono::Duration,
    /// Outbound HTTP timeout for the listing API. Short on purpose: a status poll must never hang on the gateway.
    pub api_timeout: Duration,
    /// Number of recent gateway transactions the status poller scans.
    pub list_limit: u32,
    /// Absolute tolerance when comparing a gateway-reported amount to the expected amount.
    pub amount_tolerance: Vnd,
    pub api_base: String,
    pub qr_base: String,
}

impl Default for SepayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: Secret::default(),
            secret_key: Secret::default(),
            bank_account: String::default(),
            bank_name: "VCB".to_string(),
            account_name: String::default(),
            virtual_account: None,
            payment_timeout: chrono::Duration::seconds(DEFAULT_PAYMENT_TIMEOUT_SECS),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            list_limit: DEFAULT_LIST_LIMIT,
            amount_tolerance: Vnd::from(DEFAULT_AMOUNT_TOLERANCE),
            api_base: DEFAULT_API_BASE.to_string(),
            qr_base: DEFAULT_QR_BASE.to_string(),
        }
    }
}

impl SepayConfig {
    pub fn from_env_or_default() -> Self {
        let enabled = parse_boolean_flag(std::env::var("SEPAY_ENABLED").ok(), true);
        let api_key = Secret::new(std::env::var("SEPAY_API_KEY").unwrap_or_else(|_| {
            error!("🏦️ SEPAY_API_KEY is not set. The status poller will not be able to query the gateway.");
            String::default()
        }));
        let secret_key = Secret::new(std::env::var("SEPAY_SECRET_KEY").unwrap_or_else(|_| {
            error!("🏦️ SEPAY_SECRET_KEY is not set. All webhook deliveries will be rejected.");
            String::default()
        }));
        let bank_account = std::env::var("SEPAY_BANK_ACCOUNT").unwrap_or_else(|_| {
            error!("🏦️ SEPAY_BANK_ACCOUNT is not set. Payers will not see a usable account number.");
            String::default()
        });
        let bank_name = std::env::var("SEPAY_BANK_NAME").unwrap_or_else(|_| {
            info!("🏦️ SEPAY_BANK_NAME is not set. Using VCB as default.");
            "VCB".to_string()
        });
        let account_name = std::env::var("SEPAY_ACCOUNT_NAME").unwrap_or_else(|_| {
            warn!("🏦️ SEPAY_ACCOUNT_NAME is not set. Using an empty account name.");
            String::default()
        });
        let virtual_account = std::env::var("SEPAY_VIRTUAL_ACCOUNT").ok().filter(|s| !s.trim().is_empty());
        let payment_timeout = std::env::var("SEPAY_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🏦️ Invalid value for SEPAY_TIMEOUT ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(chrono::Duration::seconds)
            .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_PAYMENT_TIMEOUT_SECS));
        let api_timeout = std::env::var("SEPAY_API_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🏦️ Invalid value for SEPAY_API_TIMEOUT ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_API_TIMEOUT_SECS));
        let list_limit = std::env::var("SEPAY_LIST_LIMIT")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🏦️ Invalid value for SEPAY_LIST_LIMIT ({s}). {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_LIST_LIMIT);
        let amount_tolerance = std::env::var("SEPAY_AMOUNT_TOLERANCE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🏦️ Invalid value for SEPAY_AMOUNT_TOLERANCE ({s}). {e}. Using the default."))
                    .ok()
            })
            .map(Vnd::from)
            .unwrap_or(Vnd::from(DEFAULT_AMOUNT_TOLERANCE));
        let api_base = std::env::var("SEPAY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let qr_base = std::env::var("SEPAY_QR_BASE").unwrap_or_else(|_| DEFAULT_QR_BASE.to_string());
        Self {
            enabled,
            api_key,
            secret_key,
            bank_account,
            bank_name,
            account_name,
            virtual_account,
            payment_timeout,
            api_timeout,
            list_limit,
            amount_tolerance,
            api_base,
            qr_base,
        }
    }

    /// The gateway is usable only when it is switched on *and* credentials are present.
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.api_key.reveal().is_empty()
    }
}
