//! Inbound envelope parsing and structural validation.

use serde_json::{Map, Value};

use super::outcome::RelayOutcome;

pub const DEFAULT_SENDER_ID: &str = "unknown_sender";
pub const DEFAULT_MODEL: &str = "llama3";

/// A validated relay request. Lives for the duration of one inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub destination_address: String,
    pub payload: String,
    pub sender_id: String,
    pub model_hint: String,
}

/// Parse `body` and extract the relay fields.
///
/// Fields that are present but not strings are treated as absent.
pub fn validate(body: &[u8], default_model: &str) -> Result<RelayRequest, RelayOutcome> {
    let parsed: Value = serde_json::from_slice(body).map_err(|_| RelayOutcome::MalformedInput)?;
    let Value::Object(fields) = parsed else {
        return Err(RelayOutcome::MalformedInput);
    };

    let (Some(destination_address), Some(payload)) = (
        non_empty(&fields, "target_llm_url"),
        non_empty(&fields, "llm_prompt"),
    ) else {
        return Err(RelayOutcome::MissingFields);
    };

    Ok(RelayRequest {
        destination_address: destination_address.to_string(),
        payload: payload.to_string(),
        sender_id: string_field(&fields, "sender_id")
            .unwrap_or(DEFAULT_SENDER_ID)
            .to_string(),
        model_hint: string_field(&fields, "llm_model")
            .unwrap_or(default_model)
            .to_string(),
    })
}

fn string_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn non_empty<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    string_field(fields, key).filter(|s| !s.is_empty())
}
