//! The relay pipeline and its HTTP handler.
//!
//! [`relay_handler`] is mounted at [`RELAY_PATH`]. It hands each request
//! to [`RelayService::handle`], which runs the stages in order and stops at
//! the first one that produces a terminal [`RelayOutcome`]:
//!
//! 1. [`auth`] -- shared-secret check on `X-API-Key`.
//! 2. [`request`] -- JSON parsing and required-field validation.
//! 3. [`guard`] -- scheme/host checks and the destination policy.
//! 4. [`forward`] -- the single outbound call, bounded by a timeout.
//!
//! The outcome is then rendered by [`outcome`] into a status and JSON body.

pub mod auth;
pub mod forward;
pub mod guard;
pub mod outcome;
pub mod request;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::server::{AppState, Stats};
use auth::Credential;
use forward::ForwardingClient;
use guard::DestinationPolicy;
use outcome::{OutcomeClass, RelayOutcome};

pub const RELAY_PATH: &str = "/relay_llm_message";
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Per-request composition of the relay stages. Holds only immutable
/// settings and the shared outbound client.
pub struct RelayService {
    pub credential: Credential,
    pub policy: DestinationPolicy,
    pub forwarder: ForwardingClient,
    pub default_model: String,
}

impl RelayService {
    pub async fn handle(
        &self,
        headers: &HeaderMap,
        peer: SocketAddr,
        body: Result<Bytes, BytesRejection>,
        correlation_id: &str,
    ) -> RelayOutcome {
        match self.run(headers, peer, body, correlation_id).await {
            Ok(outcome) | Err(outcome) => outcome,
        }
    }

    async fn run(
        &self,
        headers: &HeaderMap,
        peer: SocketAddr,
        body: Result<Bytes, BytesRejection>,
        correlation_id: &str,
    ) -> Result<RelayOutcome, RelayOutcome> {
        auth::authorize(&self.credential, headers, peer, correlation_id)?;

        let body = body.map_err(|rejection| body_rejection(&rejection, correlation_id))?;
        let request = request::validate(&body, &self.default_model)?;
        let destination = guard::check_destination(&request.destination_address, &self.policy)?;

        tracing::info!(
            correlation_id = %correlation_id,
            sender_id = %request.sender_id,
            model = %request.model_hint,
            destination_host = destination.host_str().unwrap_or_default(),
            prompt_bytes = request.payload.len(),
            "relaying prompt"
        );

        Ok(self
            .forwarder
            .forward(&destination, &request, correlation_id)
            .await)
    }
}

fn body_rejection(rejection: &BytesRejection, correlation_id: &str) -> RelayOutcome {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(correlation_id = %correlation_id, "request body over limit");
        RelayOutcome::PayloadTooLarge
    } else {
        tracing::warn!(
            correlation_id = %correlation_id,
            error = %rejection.body_text(),
            "failed to read request body"
        );
        RelayOutcome::InternalError {
            detail: "failed to read request body".into(),
        }
    }
}

pub async fn relay_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let correlation_id = headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let outcome = state
        .relay
        .handle(&headers, peer, body, &correlation_id)
        .await;

    record(&state.stats, &outcome);
    let class = outcome.class();
    let (status, envelope) = outcome.into_envelope();

    if class == OutcomeClass::Failed {
        tracing::warn!(
            correlation_id = %correlation_id,
            status = status.as_u16(),
            error = envelope["error"].as_str().unwrap_or_default(),
            "relay failed"
        );
    }

    let mut response = (status, Json(envelope)).into_response();
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

fn record(stats: &Stats, outcome: &RelayOutcome) {
    let counter = match outcome.class() {
        OutcomeClass::Relayed => &stats.relayed,
        OutcomeClass::Rejected => &stats.rejected,
        OutcomeClass::Failed => &stats.failed,
    };
    counter.fetch_add(1, Ordering::Relaxed);
}
