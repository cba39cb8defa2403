//! Outcome taxonomy and the outward response envelope.
//!
//! Every step of the relay pipeline reports its result as a
//! [`RelayOutcome`]. The handler turns the final outcome into a
//! status code and a JSON body with [`RelayOutcome::into_envelope`].

use axum::http::StatusCode;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Unauthorized,
    MalformedInput,
    MissingFields,
    InvalidDestination,
    DestinationNotAllowed { host: String },
    PayloadTooLarge,
    Success {
        sender_id: String,
        text: String,
        raw: Value,
    },
    UpstreamError { status: u16, body: Value },
    ConnectError { reason: String },
    TimeoutError,
    MalformedUpstreamJson,
    UpstreamTooLarge { limit: usize },
    InternalError { detail: String },
}

/// Coarse outcome class, used for logging and the `/health` counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Relayed,
    Rejected,
    Failed,
}

impl RelayOutcome {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MalformedInput | Self::MissingFields | Self::InvalidDestination => {
                StatusCode::BAD_REQUEST
            }
            Self::DestinationNotAllowed { .. } => StatusCode::FORBIDDEN,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Success { .. } => StatusCode::OK,
            Self::UpstreamError { .. }
            | Self::MalformedUpstreamJson
            | Self::UpstreamTooLarge { .. } => StatusCode::BAD_GATEWAY,
            Self::ConnectError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn class(&self) -> OutcomeClass {
        match self {
            Self::Success { .. } => OutcomeClass::Relayed,
            Self::Unauthorized
            | Self::MalformedInput
            | Self::MissingFields
            | Self::InvalidDestination
            | Self::DestinationNotAllowed { .. }
            | Self::PayloadTooLarge => OutcomeClass::Rejected,
            Self::UpstreamError { .. }
            | Self::ConnectError { .. }
            | Self::TimeoutError
            | Self::MalformedUpstreamJson
            | Self::UpstreamTooLarge { .. }
            | Self::InternalError { .. } => OutcomeClass::Failed,
        }
    }

    /// Consume the outcome and build the outward `(status, body)` pair.
    #[must_use]
    pub fn into_envelope(self) -> (StatusCode, Value) {
        let status = self.status();
        let body = match self {
            Self::Unauthorized => error_body("Unauthorized: Invalid or missing API key"),
            Self::MalformedInput => error_body("Invalid JSON format"),
            Self::MissingFields => {
                error_body("Missing 'target_llm_url' or 'llm_prompt' in request")
            }
            Self::InvalidDestination => error_body("Invalid 'target_llm_url' format"),
            Self::DestinationNotAllowed { host } => {
                error_body(&format!("Destination not allowed: {host}"))
            }
            Self::PayloadTooLarge => error_body("Request body too large"),
            Self::Success {
                sender_id,
                text,
                raw,
            } => json!({
                "status": "success",
                "original_sender_id": sender_id,
                "llm_response": text,
                "llm_raw_response": raw,
            }),
            Self::UpstreamError { status, body } => {
                let message = upstream_message(&body);
                json!({
                    "error": format!("Target LLM error: {status} - {message}"),
                    "details": body,
                })
            }
            Self::ConnectError { reason } => {
                error_body(&format!("Failed to connect to target LLM: {reason}"))
            }
            Self::TimeoutError => error_body("Timeout connecting to target LLM"),
            Self::MalformedUpstreamJson => error_body("Target LLM returned invalid JSON response"),
            Self::UpstreamTooLarge { limit } => error_body(&format!(
                "Target LLM response too large (limit {limit} bytes)"
            )),
            Self::InternalError { detail } => {
                error_body(&format!("Internal server error: {detail}"))
            }
        };
        (status, body)
    }
}

fn error_body(message: &str) -> Value {
    json!({ "error": message })
}

/// The upstream `error` field when it is a string, else the compact body.
fn upstream_message(body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(s)) => s.clone(),
        _ => body.to_string(),
    }
}
