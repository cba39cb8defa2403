//! Integration tests for the HTTP server, health endpoint, and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use llm_relay::config::RelaySettings;
use llm_relay::health::HealthResponse;
use llm_relay::relay::guard::DestinationPolicy;
use llm_relay::server::{self, AppState};

async fn start_test_server() -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let mut settings = RelaySettings::with_secret("test-key");
    settings.policy =
        DestinationPolicy::new(&["ollama".into()], &["169.254.0.0/16".into()]).unwrap();
    let state = Arc::new(AppState::new(settings));

    let router = server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx)
}

#[tokio::test]
async fn health_endpoint_returns_healthy() {
    let (addr, shutdown) = start_test_server().await;

    let url = format!("http://{addr}/health");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.upstream_timeout_seconds, 300);
    assert_eq!(health.policy.allow_hosts, vec!["ollama"]);
    assert_eq!(health.policy.deny_cidrs, vec!["169.254.0.0/16"]);
    assert_eq!(health.stats.requests_relayed, 0);
    assert_eq!(health.stats.requests_rejected, 0);
    assert_eq!(health.stats.requests_failed, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_version_matches_crate() {
    let (addr, shutdown) = start_test_server().await;

    let url = format!("http://{addr}/health");
    let health: HealthResponse = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert!(!health.build.is_empty());
    assert!(
        ["debug", "release", "unknown"].contains(&health.profile.as_str()),
        "{}",
        health.profile
    );

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_counts_rejections() {
    let (addr, shutdown) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/relay_llm_message"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let health: HealthResponse = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.stats.requests_rejected, 1);
    assert_eq!(health.stats.requests_relayed, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unknown_path_returns_json_404() {
    let (addr, shutdown) = start_test_server().await;

    let resp = reqwest::get(format!("http://{addr}/nonexistent"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Not found");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn get_on_relay_path_is_method_not_allowed() {
    let (addr, shutdown) = start_test_server().await;

    let resp = reqwest::get(format!("http://{addr}/relay_llm_message"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let (addr, shutdown) = start_test_server().await;

    // Verify server is running
    let url = format!("http://{addr}/health");
    assert!(reqwest::get(&url).await.is_ok());

    let _ = shutdown.send(());

    // Give it a moment to shut down
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    // Server should no longer accept connections
    let result = reqwest::get(&url).await;
    assert!(result.is_err());
}
