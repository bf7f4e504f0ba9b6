//! Tests for the reqwest-backed JSON source against a local axum server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use pd_core::config::GithubConfig;
use pd_core::error::PdError;
use pd_github::{GithubOrgClient, HttpJsonSource, JsonSource};
use serde_json::{json, Value};

#[derive(Clone)]
struct ServerState {
    base: String,
    hits: Arc<AtomicUsize>,
}

async fn org_handler(
    State(state): State<ServerState>,
    Path(org): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    Json(json!({
        "login": org,
        "repos_url": format!("{}/orgs/{org}/repos", state.base),
        "seen_user_agent": header_str(header::USER_AGENT),
        "seen_accept": header_str(header::ACCEPT),
    }))
}

async fn repos_handler(State(state): State<ServerState>) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {"name": "repo1", "license": {"key": "mit"}},
        {"name": "repo2", "license": {"key": "apache-2.0"}},
    ]))
}

/// Start a server on an ephemeral port; returns its base URL and hit counter.
async fn spawn_server() -> (String, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/orgs/{org}", get(org_handler))
        .route("/orgs/{org}/repos", get(repos_handler))
        .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }))
        .with_state(ServerState {
            base: base.clone(),
            hits: hits.clone(),
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base, hits)
}

fn config_for(base: &str) -> GithubConfig {
    GithubConfig {
        api_base: base.to_string(),
        ..GithubConfig::default()
    }
}

#[tokio::test]
async fn get_json_issues_one_request_per_call() {
    let (base, hits) = spawn_server().await;
    let source = HttpJsonSource::new(&config_for(&base)).unwrap();
    let url = format!("{base}/orgs/holberton");

    let first = source.get_json(&url).await.unwrap();
    assert_eq!(first["login"], "holberton");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    source.get_json(&url).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn requests_carry_user_agent_and_accept() {
    let (base, _hits) = spawn_server().await;
    let config = config_for(&base);
    let source = HttpJsonSource::new(&config).unwrap();

    let payload = source.get_json(&format!("{base}/orgs/x")).await.unwrap();
    assert_eq!(payload["seen_user_agent"], config.user_agent.as_str());
    assert_eq!(payload["seen_accept"], "application/vnd.github+json");
}

#[tokio::test]
async fn non_success_status_is_an_error_naming_the_url() {
    let (base, _hits) = spawn_server().await;
    let source = HttpJsonSource::new(&config_for(&base)).unwrap();

    let missing = format!("{base}/nothing-here");
    match source.get_json(&missing).await {
        Err(PdError::HttpStatus { status, url }) => {
            assert_eq!(status, 404);
            assert_eq!(url, missing);
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }

    let broken = source.get_json(&format!("{base}/broken")).await;
    assert!(matches!(broken, Err(PdError::HttpStatus { status: 500, .. })));
}

#[tokio::test]
async fn org_client_end_to_end() {
    let (base, hits) = spawn_server().await;
    let client = GithubOrgClient::from_config("abc", &config_for(&base)).unwrap();

    assert_eq!(client.public_repos(None).await.unwrap(), vec!["repo1", "repo2"]);
    assert_eq!(client.public_repos(Some("apache-2.0")).await.unwrap(), vec!["repo2"]);
    // One org fetch, two repo fetches.
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}
