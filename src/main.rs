use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;

use chain_api_bench::bench::{BenchConfig, BenchmarkRunner, MockProviderServer, MockServerConfig};
use chain_api_bench::config::{self, Cli, Commands, RunSettings, StandaloneArgs};
use chain_api_bench::http_client::HttpTransport;
use chain_api_bench::providers::{build_plan, Provider, TestAddresses, TestId};
use chain_api_bench::suite::{run_suite, SuiteOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv();
    let cli = Cli::parse();

    // Initialize logging with a configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    match cli.command {
        Commands::Run(args) => {
            let settings = RunSettings::load(args)?;
            run(settings).await
        }
        Commands::Standalone(args) => standalone(args).await,
    }
}

async fn run(settings: RunSettings) -> Result<()> {
    let bench_config = BenchConfig::default();

    let plan = build_plan(
        &settings.providers,
        &settings.tests,
        &settings.addresses,
        &settings.credentials,
        None,
    )?;
    if plan.is_empty() {
        anyhow::bail!("No selected provider supports any of the selected tests");
    }

    tracing::info!(
        tests = plan.len(),
        iterations = settings.iterations,
        warmup_calls = bench_config.warmup_calls,
        "Starting latency benchmark"
    );

    let transport = HttpTransport::new()?;
    let runner = BenchmarkRunner::new(transport, bench_config.clone());
    let outcome = run_suite(&runner, &plan, settings.iterations).await;

    let report = outcome.report(&bench_config, settings.iterations, &settings.addresses);
    present(&outcome, &report, settings.json);

    if let Some(dir) = &settings.output_dir {
        let path = report
            .save(dir)
            .with_context(|| format!("Failed to save report to {}", dir.display()))?;
        tracing::info!(path = %path.display(), "Report saved");
    }

    Ok(())
}

async fn standalone(args: StandaloneArgs) -> Result<()> {
    if args.iterations == 0 {
        anyhow::bail!("iterations must be a positive integer");
    }

    let api_key = "standalone-key".to_string();
    let mut mock_server = MockProviderServer::new(MockServerConfig {
        latency_ms: args.latency_ms,
        jitter_ms: args.jitter_ms,
        rate_limit_every: args.rate_limit_every,
        error_rate: args.error_rate,
        api_key: Some(api_key.clone()),
        ..Default::default()
    });
    let port = mock_server.start().await?;
    println!("Mock provider started on port {}", port);

    let credentials: HashMap<Provider, String> = Provider::ALL
        .into_iter()
        .map(|p| (p, api_key.clone()))
        .collect();
    let addresses = TestAddresses::default();
    let root = mock_server.url();
    let plan = build_plan(
        &Provider::ALL,
        &TestId::ALL,
        &addresses,
        &credentials,
        Some(&root),
    )?;

    let bench_config = BenchConfig::default();
    let transport = HttpTransport::new()?;
    let runner = BenchmarkRunner::new(transport, bench_config.clone());
    let outcome = run_suite(&runner, &plan, args.iterations).await;

    let report = outcome.report(&bench_config, args.iterations, &addresses);
    present(&outcome, &report, args.json);

    mock_server.stop();
    Ok(())
}

fn present(
    outcome: &SuiteOutcome,
    report: &chain_api_bench::bench::BenchmarkReport,
    json_output: bool,
) {
    if json_output {
        println!("{}", report.to_json());
        return;
    }

    report.print_table();
    report.print_comparisons();

    for (key, result) in &outcome.results {
        if let Some(sample) = &result.sample_payload {
            let preview: String = sample.chars().take(200).collect();
            println!("Sample response [{}]: {}", key, preview);
        }
    }
}
