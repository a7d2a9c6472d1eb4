// Integration tests for Chain API Bench
//
// These tests run the full stack (reqwest transports, executor, runner,
// statistics, comparison) against the local mock provider server.

use std::collections::HashMap;

use chain_api_bench::{
    bench::{
        BenchConfig, BenchmarkRunner, MockProviderServer, MockServerConfig, TransportKind, Winner,
    },
    http_client::HttpTransport,
    providers::{build_plan, Provider, TestAddresses, TestId},
    suite::run_suite,
};

const KEY: &str = "integration-key";

// ==================================================================================================
// Test Helpers
// ==================================================================================================

/// Methodology with shortened delays so tests finish quickly
fn fast_config() -> BenchConfig {
    BenchConfig {
        base_delay_ms: 5,
        backoff_cap_ms: 50,
        timeout_ms: 2_000,
        ..Default::default()
    }
}

async fn start_mock(config: MockServerConfig) -> MockProviderServer {
    let mut server = MockProviderServer::new(MockServerConfig {
        api_key: Some(KEY.to_string()),
        ..config
    });
    server.start().await.expect("Failed to start mock provider");
    server
}

fn credentials(key: &str) -> HashMap<Provider, String> {
    Provider::ALL
        .into_iter()
        .map(|p| (p, key.to_string()))
        .collect()
}

fn runner(config: BenchConfig) -> BenchmarkRunner<HttpTransport> {
    let transport = HttpTransport::new().expect("Failed to create transport");
    BenchmarkRunner::new(transport, config)
}

fn endpoint_for(
    server: &MockProviderServer,
    provider: Provider,
    test: TestId,
    key: &str,
) -> chain_api_bench::bench::EndpointDescriptor {
    provider
        .endpoint(test, &TestAddresses::default(), key, Some(&server.url()))
        .unwrap()
        .expect("provider should support test")
}

// ==================================================================================================
// Runner Tests
// ==================================================================================================

#[tokio::test]
async fn test_rest_run_measures_every_iteration() {
    let server = start_mock(MockServerConfig {
        latency_ms: 30,
        ..Default::default()
    })
    .await;
    let endpoint = endpoint_for(&server, Provider::Moralis, TestId::TokenBalances, KEY);
    assert_eq!(endpoint.kind(), TransportKind::Rest);

    let result = runner(fast_config())
        .run(&endpoint, &endpoint.auth_headers(), 3)
        .await;

    assert_eq!(result.latencies.len(), 3);
    assert_eq!(result.errors, 0);
    assert_eq!(result.timeouts, 0);
    assert!(result.latencies.iter().all(|&ms| ms >= 30.0));
    // 2 warm-ups + 3 measured
    assert_eq!(server.requests(), 5);

    let sample = result
        .sample_payload
        .as_deref()
        .expect("first call should be captured");
    let body: serde_json::Value = serde_json::from_str(sample).unwrap();
    assert!(body["path"].as_str().unwrap().ends_with("/erc20"));
    assert_eq!(body["query"], "chain=eth");

    let stats = result.statistics();
    assert_eq!(stats.success_rate, 100.0);
    assert!(stats.min <= stats.p50 && stats.p50 <= stats.p95 && stats.p99 <= stats.max);
}

#[tokio::test]
async fn test_graphql_run_succeeds() {
    let server = start_mock(MockServerConfig {
        latency_ms: 5,
        ..Default::default()
    })
    .await;
    let endpoint = endpoint_for(&server, Provider::Codex, TestId::TokenPrice, KEY);
    assert_eq!(endpoint.kind(), TransportKind::GraphQl);

    let result = runner(fast_config())
        .run(&endpoint, &endpoint.auth_headers(), 2)
        .await;

    assert_eq!(result.latencies.len(), 2);
    let sample = result.sample_payload.unwrap();
    assert!(sample.contains("getTokenPrices"));
}

#[tokio::test]
async fn test_rate_limited_calls_are_retried_transparently() {
    let server = start_mock(MockServerConfig {
        latency_ms: 1,
        rate_limit_every: Some(3),
        retry_after_secs: 1,
        ..Default::default()
    })
    .await;
    let endpoint = endpoint_for(&server, Provider::GoldRush, TestId::NativeBalance, KEY);

    let result = runner(fast_config())
        .run(&endpoint, &endpoint.auth_headers(), 4)
        .await;

    // Requests 3 and 6 are limited; both iterations recover on retry
    assert_eq!(result.latencies.len(), 4);
    assert_eq!(result.errors, 0);
    assert_eq!(server.requests(), 8);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = start_mock(MockServerConfig {
        latency_ms: 1_000,
        ..Default::default()
    })
    .await;
    let endpoint = endpoint_for(&server, Provider::Moralis, TestId::NativeBalance, KEY);
    let config = BenchConfig {
        timeout_ms: 100,
        ..fast_config()
    };

    let result = runner(config)
        .run(&endpoint, &endpoint.auth_headers(), 3)
        .await;
    let stats = result.statistics();

    assert_eq!(stats.timeouts, 3);
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.success_rate, 0.0);
    assert_eq!(stats.avg, 0.0);
    assert!(result.sample_payload.is_none());
}

#[tokio::test]
async fn test_stalled_connect_is_a_timeout() {
    // Fill the accept queue of a listener that never accepts
    let socket = tokio::net::TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();
    let mut _held = Vec::new();
    for _ in 0..4 {
        let connect = tokio::net::TcpStream::connect(addr);
        if let Ok(Ok(stream)) =
            tokio::time::timeout(std::time::Duration::from_millis(100), connect).await
        {
            _held.push(stream);
        }
    }

    let endpoint = Provider::Moralis
        .endpoint(
            TestId::NativeBalance,
            &TestAddresses::default(),
            KEY,
            Some(&format!("http://{}", addr)),
        )
        .unwrap()
        .unwrap();
    let config = BenchConfig {
        timeout_ms: 300,
        ..fast_config()
    };

    let result = runner(config)
        .run(&endpoint, &endpoint.auth_headers(), 2)
        .await;

    assert_eq!(result.timeouts, 2);
    assert_eq!(result.errors, 0);
    assert!(result.latencies.is_empty());
}

#[tokio::test]
async fn test_rejected_credentials_count_as_errors() {
    let server = start_mock(MockServerConfig {
        latency_ms: 1,
        ..Default::default()
    })
    .await;
    let endpoint = endpoint_for(&server, Provider::Moralis, TestId::TokenPrice, "wrong-key");

    let result = runner(fast_config())
        .run(&endpoint, &endpoint.auth_headers(), 2)
        .await;

    assert_eq!(result.errors, 2);
    assert!(result.latencies.is_empty());
}

// ==================================================================================================
// Suite Tests
// ==================================================================================================

#[tokio::test]
async fn test_full_suite_against_mock() {
    let server = start_mock(MockServerConfig {
        latency_ms: 2,
        jitter_ms: 3,
        ..Default::default()
    })
    .await;
    let addresses = TestAddresses::default();
    let root = server.url();
    let plan = build_plan(
        &Provider::ALL,
        &TestId::ALL,
        &addresses,
        &credentials(KEY),
        Some(&root),
    )
    .unwrap();
    // moralis and goldrush cover all four tests, codex only token_price
    assert_eq!(plan.len(), 9);

    let config = fast_config();
    let outcome = run_suite(&runner(config.clone()), &plan, 2).await;

    assert_eq!(outcome.entries.len(), 9);
    assert!(outcome.entries.iter().all(|e| e.stats.success_rate == 100.0));
    // token_price: 3 pairs; the other three tests: 1 pair each
    assert_eq!(outcome.comparisons.len(), 6);
    assert!(outcome
        .comparisons
        .iter()
        .all(|row| row.winner != Winner::Undecided));

    let report = outcome.report(&config, 2, &addresses);
    let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
    assert_eq!(json["warmupCalls"], 2);
    assert!(json["results"]["codex_token_price"]["p95"].as_f64().unwrap() > 0.0);
    assert!(json["results"]["goldrush_wallet_transactions"].is_object());
}
