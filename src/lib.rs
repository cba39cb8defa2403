//! llm-relay is an authenticated single-hop HTTP relay.
//!
//! A caller posts a prompt together with a destination URL; the relay
//! checks the shared secret, validates the envelope and the destination,
//! forwards `{model, prompt, stream: false}` to the destination in a
//! single attempt with a bounded timeout, and maps whatever happens into
//! a stable JSON envelope with a meaningful status code.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, health).
//! - [`config`] -- Resolved, validated runtime settings.
//! - [`error`] -- Process-level error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`relay`] -- The relay pipeline: authentication, validation, destination
//!   policy, forwarding, and outcome mapping.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod relay;
pub mod server;
