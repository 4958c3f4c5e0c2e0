//! Parsing of inbound payment processor notifications.
//!
//! The processor posts `{"type": "payment", "data": {"id": "123"}}` (older integrations send `topic` instead of
//! `type`, and the id may be a JSON number). The legacy IPN flavour carries the same information in the query string:
//! `?topic=payment&id=123`. Anything about a topic other than payments is acknowledged and ignored.
use std::collections::HashMap;

use serde_json::Value;

use crate::store_api::errors::OrderFlowError;

const PAYMENT_TOPIC: &str = "payment";
const MAX_PAYMENT_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The status of the payment with this processor id may have changed.
    Payment { payment_id: String },
    /// A notification about something other than a payment.
    Ignored { topic: String },
}

impl Notification {
    pub fn payment<S: Into<String>>(payment_id: S) -> Self {
        Self::Payment { payment_id: payment_id.into() }
    }

    /// Parses a JSON notification body.
    pub fn from_json(body: &[u8]) -> Result<Self, OrderFlowError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| OrderFlowError::MalformedNotification(format!("body is not JSON: {e}")))?;
        if !value.is_object() {
            return Err(malformed("body is not a JSON object"));
        }
        let topic = match value.get("type").or_else(|| value.get("topic")) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => return Err(malformed("topic is not a string")),
        };
        let id = value.get("data").and_then(|d| d.get("id")).or_else(|| value.get("id"));
        Self::classify(topic, id.map(id_to_string).transpose()?)
    }

    /// Parses the legacy query-string form.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, OrderFlowError> {
        let topic = params.get("topic").or_else(|| params.get("type")).map(String::as_str);
        let id = params.get("data.id").or_else(|| params.get("id")).cloned();
        Self::classify(topic, id)
    }

    fn classify(topic: Option<&str>, id: Option<String>) -> Result<Self, OrderFlowError> {
        match topic.map(str::trim) {
            Some(t) if !t.eq_ignore_ascii_case(PAYMENT_TOPIC) => Ok(Self::Ignored { topic: t.to_string() }),
            _ => {
                let id = id.ok_or_else(|| malformed("no payment id"))?;
                validate_payment_id(&id)?;
                Ok(Self::Payment { payment_id: id })
            },
        }
    }
}

fn malformed(reason: &str) -> OrderFlowError {
    OrderFlowError::MalformedNotification(reason.to_string())
}

fn id_to_string(value: &Value) -> Result<String, OrderFlowError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) if n.is_u64() => Ok(n.to_string()),
        _ => Err(malformed("payment id must be a string or a positive integer")),
    }
}

fn validate_payment_id(id: &str) -> Result<(), OrderFlowError> {
    if id.is_empty() {
        return Err(malformed("payment id is empty"));
    }
    if id.len() > MAX_PAYMENT_ID_LEN || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(OrderFlowError::MalformedNotification(format!("'{id}' is not a valid payment id")));
    }
    Ok(())
}
