//! `llm-relay run` — start the relay server.
//!
//! Resolves and validates settings, starts the Axum HTTP server, and
//! drains in-flight requests on SIGTERM / Ctrl+C before exiting.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::validation::describe_policy;
use crate::config::RelaySettings;
use crate::error::RelayError;
use crate::logging;
use crate::relay::RELAY_PATH;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), RelayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let settings = RelaySettings::from_args(&args)?;

    if settings.default_secret {
        tracing::warn!("using the default shared secret; set RELAY_API_KEY before exposing this relay");
    }
    if settings.policy.is_open() {
        tracing::warn!(
            "destination policy is open; any http(s) host is reachable through the relay \
             (restrict with --allow-host / --deny-cidr)"
        );
    }

    let policy = describe_policy(&settings.policy.allow_hosts(), &settings.policy.deny_cidrs());
    let timeout_secs = settings.timeout.as_secs();

    let state = Arc::new(AppState::new(settings));
    let router = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        path = RELAY_PATH,
        timeout_secs,
        policy = %policy,
        "llm-relay started"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("llm-relay stopped");
    Ok(())
}
