use dochub_common::Vnd;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::SepayApiError, helpers::parse_vnd_amount};

/// One entry from the gateway's transaction-listing API. `Serialize` is derived so a matched entry can be stored
/// verbatim as a transaction's audit payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTransaction {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub transaction_content: String,
    #[serde(deserialize_with = "amount_field", default)]
    pub amount_in: Vnd,
}

/// Envelope around the listing response: `{"status": 200, "messages": {"transactions": [...]}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope {
    pub status: i64,
    #[serde(default)]
    pub messages: TransactionList,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TransactionList {
    #[serde(default)]
    pub transactions: Vec<GatewayTransaction>,
}

/// A decoded webhook delivery.
///
/// The gateway has shipped several key spellings for the same fields over time (`transferContent` vs `content`,
/// `transferAmount` vs `amount`, numeric vs string ids), and some deliveries carry two spellings at once. Decoding
/// therefore goes through a raw struct of optionals and coalesces, rather than relying on serde aliases, which
/// reject duplicate keys.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookNotification {
    /// Gateway-assigned settlement id. This is the idempotency key for repeated delivery.
    pub id: String,
    /// Transfer direction: "in" for credits. Absent means credit; some gateway versions omit it.
    pub transfer_type: Option<String>,
    /// The free-text transfer memo, as keyed in by the payer plus whatever the bank appended.
    pub content: String,
    pub amount: Vnd,
}

#[derive(Debug, Default, Deserialize)]
struct RawNotification {
    id: Option<Value>,
    transaction_id: Option<Value>,
    #[serde(rename = "transferType")]
    transfer_type_camel: Option<String>,
    transfer_type: Option<String>,
    #[serde(rename = "transferContent")]
    transfer_content: Option<String>,
    transaction_content: Option<String>,
    content: Option<String>,
    #[serde(rename = "transferAmount")]
    transfer_amount: Option<Value>,
    amount: Option<Value>,
}

impl WebhookNotification {
    pub fn from_payload(payload: &[u8]) -> Result<Self, SepayApiError> {
        let raw: RawNotification =
            serde_json::from_slice(payload).map_err(|e| SepayApiError::JsonError(e.to_string()))?;
        let id = raw
            .id
            .or(raw.transaction_id)
            .as_ref()
            .and_then(value_to_string)
            .ok_or_else(|| SepayApiError::JsonError("notification has no settlement id".to_string()))?;
        let amount = raw
            .transfer_amount
            .or(raw.amount)
            .ok_or_else(|| SepayApiError::JsonError("notification has no amount".to_string()))?;
        let amount = value_to_vnd(&amount)?;
        let content = raw.transfer_content.or(raw.content).or(raw.transaction_content).unwrap_or_default();
        let transfer_type = raw.transfer_type_camel.or(raw.transfer_type);
        Ok(Self { id, transfer_type, content, amount })
    }

    /// Whether this notification describes money arriving in the merchant account. Debits and any other direction
    /// are acknowledged but never reconciled.
    pub fn is_credit(&self) -> bool {
        self.transfer_type.as_deref().map_or(true, |t| t.eq_ignore_ascii_case("in"))
    }
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_vnd(v: &Value) -> Result<Vnd, SepayApiError> {
    match v {
        Value::String(s) => parse_vnd_amount(s),
        // Going through the token text keeps floats out of the money path even when the gateway sends `50000.0`.
        Value::Number(n) => parse_vnd_amount(&n.to_string()),
        other => Err(SepayApiError::InvalidCurrencyAmount(other.to_string())),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: serde::Deserializer<'de> {
    let v = Value::deserialize(deserializer)?;
    value_to_string(&v).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn amount_field<'de, D>(deserializer: D) -> Result<Vnd, D::Error>
where D: serde::Deserializer<'de> {
    let v = Value::deserialize(deserializer)?;
    value_to_vnd(&v).map_err(serde::de::Error::custom)
}
