//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload containing the relay
//! version, git build, cargo profile, uptime, the effective destination
//! policy, and cumulative outcome counters. The endpoint is not authenticated and
//! never exposes the shared secret.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub build: String,
    pub profile: String,
    pub uptime_seconds: u64,
    pub upstream_timeout_seconds: u64,
    pub policy: PolicyHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct PolicyHealth {
    pub allow_hosts: Vec<String>,
    pub deny_cidrs: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_relayed: u64,
    pub requests_rejected: u64,
    pub requests_failed: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let relay = &state.relay;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: env!("LLM_RELAY_GIT_SHORT").to_string(),
        profile: env!("LLM_RELAY_BUILD_PROFILE").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        upstream_timeout_seconds: relay.forwarder.timeout().as_secs(),
        policy: PolicyHealth {
            allow_hosts: relay.policy.allow_hosts(),
            deny_cidrs: relay.policy.deny_cidrs(),
        },
        stats: StatsResponse {
            requests_relayed: state.stats.relayed.load(Ordering::Relaxed),
            requests_rejected: state.stats.rejected.load(Ordering::Relaxed),
            requests_failed: state.stats.failed.load(Ordering::Relaxed),
        },
    })
}
