//! Single-attempt outbound call to the destination.
//!
//! Sends one `POST` with `{model, prompt, stream: false}` and waits for the
//! complete response under a single deadline that covers connect, headers
//! and body. There are no retries. If the inbound connection goes away the
//! handler future is dropped and the in-flight call with it.

use std::time::{Duration, Instant};

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use super::outcome::RelayOutcome;
use super::request::RelayRequest;
use crate::server::HttpClient;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_RESPONSE_BODY: usize = 16 * 1024 * 1024;

#[derive(Debug, Serialize)]
struct OutboundBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Clone)]
pub struct ForwardingClient {
    client: HttpClient,
    timeout: Duration,
    max_response_body: usize,
}

enum CallError {
    Build(String),
    Transport(String),
    TooLarge,
}

impl ForwardingClient {
    #[must_use]
    pub fn new(client: HttpClient, timeout: Duration, max_response_body: usize) -> Self {
        Self {
            client,
            timeout,
            max_response_body,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[allow(clippy::cast_possible_truncation)]
    pub async fn forward(
        &self,
        destination: &Url,
        request: &RelayRequest,
        correlation_id: &str,
    ) -> RelayOutcome {
        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.call(destination, request)).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, body) = match result {
            Ok(Ok(reply)) => reply,
            Ok(Err(CallError::Build(detail))) => {
                tracing::error!(
                    correlation_id = %correlation_id,
                    error = %detail,
                    "failed to build outbound request"
                );
                return RelayOutcome::InternalError { detail };
            }
            Ok(Err(CallError::TooLarge)) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    destination = %destination,
                    limit = self.max_response_body,
                    latency_ms,
                    "destination response too large"
                );
                return RelayOutcome::UpstreamTooLarge {
                    limit: self.max_response_body,
                };
            }
            Ok(Err(CallError::Transport(reason))) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    destination = %destination,
                    error = %reason,
                    latency_ms,
                    "destination unreachable"
                );
                return RelayOutcome::ConnectError { reason };
            }
            Err(_) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    destination = %destination,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "destination timed out"
                );
                return RelayOutcome::TimeoutError;
            }
        };

        tracing::info!(
            correlation_id = %correlation_id,
            destination = %destination,
            status = status.as_u16(),
            latency_ms,
            "destination responded"
        );

        map_reply(request, status, &body)
    }

    async fn call(
        &self,
        destination: &Url,
        request: &RelayRequest,
    ) -> Result<(StatusCode, bytes::Bytes), CallError> {
        let payload = serde_json::to_vec(&OutboundBody {
            model: &request.model_hint,
            prompt: &request.payload,
            stream: false,
        })
        .map_err(|e| CallError::Build(e.to_string()))?;

        let uri: hyper::Uri = destination
            .as_str()
            .parse()
            .map_err(|e: http::uri::InvalidUri| CallError::Build(e.to_string()))?;

        let outbound = hyper::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(Full::new(bytes::Bytes::from(payload)))
            .map_err(|e| CallError::Build(e.to_string()))?;

        let response = self
            .client
            .request(outbound)
            .await
            .map_err(|e| CallError::Transport(error_chain(&e)))?;

        let status = response.status();
        let body = Limited::new(response.into_body(), self.max_response_body)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<LengthLimitError>() {
                    CallError::TooLarge
                } else {
                    CallError::Transport(format!("body read error: {}", error_chain(&*e)))
                }
            })?
            .to_bytes();

        Ok((status, body))
    }
}

fn map_reply(request: &RelayRequest, status: StatusCode, body: &[u8]) -> RelayOutcome {
    if status == StatusCode::OK {
        let Ok(raw) = serde_json::from_slice::<Value>(body) else {
            return RelayOutcome::MalformedUpstreamJson;
        };
        let text = raw
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return RelayOutcome::Success {
            sender_id: request.sender_id.clone(),
            text,
            raw,
        };
    }

    let body = serde_json::from_slice::<Value>(body)
        .unwrap_or_else(|_| json!({ "error": String::from_utf8_lossy(body) }));
    RelayOutcome::UpstreamError {
        status: status.as_u16(),
        body,
    }
}

/// Flatten an error and its sources into `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
