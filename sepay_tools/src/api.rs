use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use crate::{data_objects::ListEnvelope, GatewayTransaction, SepayApiError, SepayConfig};

/// Thin client for the gateway's merchant API. Only the transaction listing is consumed; the status poller scans it
/// for transfers whose memo carries one of our reference codes.
#[derive(Clone)]
pub struct SepayApi {
    config: SepayConfig,
    client: Arc<Client>,
}

impl SepayApi {
    pub fn new(config: SepayConfig) -> Result<Self, SepayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.api_key.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| SepayApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.api_timeout)
            .build()
            .map_err(|e| SepayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &SepayConfig {
        &self.config
    }

    /// Fetch the most recent `limit` transactions on the merchant account.
    pub async fn recent_transactions(&self, limit: u32) -> Result<Vec<GatewayTransaction>, SepayApiError> {
        let url = format!("{}/transactions/list", self.config.api_base);
        trace!("🏦️ Fetching {limit} recent gateway transactions");
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| SepayApiError::RequestError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| SepayApiError::RequestError(e.to_string()))?;
            return Err(SepayApiError::QueryError { status, message });
        }
        let envelope = response.json::<ListEnvelope>().await.map_err(|e| SepayApiError::JsonError(e.to_string()))?;
        if envelope.status != 200 {
            return Err(SepayApiError::EnvelopeStatus(envelope.status));
        }
        let transactions = envelope.messages.transactions;
        trace!("🏦️ Gateway returned {} transactions", transactions.len());
        Ok(transactions)
    }
}
