//! Mock blockchain-data provider exposing REST and GraphQL routes.
//!
//! Simulates server latency, periodic rate limiting (429 + Retry-After) and
//! random server errors so the full benchmark path can be exercised locally.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Configuration for the mock provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockServerConfig {
    /// Port to listen on (0 for random)
    pub port: u16,
    /// Base simulated latency per request in milliseconds
    pub latency_ms: u64,
    /// Extra uniformly random latency in milliseconds
    pub jitter_ms: u64,
    /// Answer every Nth request with 429
    pub rate_limit_every: Option<u64>,
    /// Retry-After value sent with 429 responses
    pub retry_after_secs: u64,
    /// Error rate (0.0 to 1.0)
    pub error_rate: f64,
    /// When set, requests must carry this key in `X-API-Key` or `Authorization`
    pub api_key: Option<String>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            latency_ms: 20,
            jitter_ms: 0,
            rate_limit_every: None,
            retry_after_secs: 1,
            error_rate: 0.0,
            api_key: None,
        }
    }
}

struct MockState {
    config: MockServerConfig,
    requests: AtomicU64,
}

/// Mock provider server
pub struct MockProviderServer {
    config: MockServerConfig,
    state: Option<Arc<MockState>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    port: u16,
}

impl MockProviderServer {
    /// Create a new mock server with the given configuration
    pub fn new(config: MockServerConfig) -> Self {
        Self {
            config,
            state: None,
            shutdown_tx: None,
            port: 0,
        }
    }

    /// Start the mock server and return the actual port
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("127.0.0.1:{}", self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();
        self.port = port;

        let state = Arc::new(MockState {
            config: self.config.clone(),
            requests: AtomicU64::new(0),
        });
        self.state = Some(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let app = Router::new()
            .route("/graphql", post(handle_graphql))
            .route("/*path", get(handle_rest))
            .with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        tracing::debug!(port = port, "Mock provider listening");

        Ok(port)
    }

    /// Get the server's URL
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Requests received so far, including rejected ones
    pub fn requests(&self) -> u64 {
        self.state
            .as_ref()
            .map(|s| s.requests.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockProviderServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Shared prologue: count, authorize, delay, then maybe inject a failure
async fn simulate(state: &MockState, headers: &HeaderMap) -> Option<Response> {
    let n = state.requests.fetch_add(1, Ordering::SeqCst) + 1;
    let config = &state.config;

    if let Some(key) = &config.api_key {
        if !is_authorized(headers, key) {
            return Some((StatusCode::UNAUTHORIZED, "Missing or invalid API key").into_response());
        }
    }

    let delay = {
        let mut rng = rand::thread_rng();
        let jitter = if config.jitter_ms > 0 {
            rng.gen_range(0..=config.jitter_ms)
        } else {
            0
        };
        if config.error_rate > 0.0 && rng.gen::<f64>() < config.error_rate {
            return Some((StatusCode::INTERNAL_SERVER_ERROR, "Simulated error").into_response());
        }
        config.latency_ms + jitter
    };
    tokio::time::sleep(Duration::from_millis(delay)).await;

    if let Some(every) = config.rate_limit_every {
        if every > 0 && n % every == 0 {
            return Some(
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, config.retry_after_secs.to_string())],
                    "Rate limit exceeded",
                )
                    .into_response(),
            );
        }
    }

    None
}

fn is_authorized(headers: &HeaderMap, key: &str) -> bool {
    let api_key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));
    api_key == Some(key) || authorization == Some(key)
}

/// Handle REST GET requests on any path
async fn handle_rest(State(state): State<Arc<MockState>>, headers: HeaderMap, uri: Uri) -> Response {
    if let Some(rejection) = simulate(&state, &headers).await {
        return rejection;
    }

    Json(serde_json::json!({
        "path": uri.path(),
        "query": uri.query().unwrap_or_default(),
        "result": [
            { "symbol": "WETH", "balance": "1250000000000000000", "decimals": 18 },
            { "symbol": "USDC", "balance": "420000000", "decimals": 6 }
        ]
    }))
    .into_response()
}

/// Handle GraphQL POST requests
async fn handle_graphql(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if let Some(rejection) = simulate(&state, &headers).await {
        return rejection;
    }

    if !body["query"].is_string() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "errors": [{ "message": "Missing query" }] })),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "data": {
            "getTokenPrices": [{ "priceUsd": 3150.42, "networkId": 1 }]
        }
    }))
    .into_response()
}
