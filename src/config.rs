use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::bench::config::DEFAULT_ITERATIONS;
use crate::error::{BenchError, Result};
use crate::providers::{Provider, TestAddresses, TestId, DEFAULT_TOKEN, DEFAULT_WALLET};

/// Latency benchmark for blockchain data API providers
#[derive(Parser, Debug)]
#[command(name = "chain-api-bench", author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Benchmark the real provider APIs
    Run(RunArgs),

    /// Benchmark a local mock provider (no credentials needed)
    Standalone(StandaloneArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Measured iterations per test
    #[arg(short = 'n', long, env = "BENCH_ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Providers to benchmark (comma-separated)
    #[arg(
        short = 'p',
        long,
        env = "BENCH_PROVIDERS",
        value_delimiter = ',',
        default_values_t = Provider::ALL.to_vec()
    )]
    pub providers: Vec<Provider>,

    /// Tests to run (comma-separated)
    #[arg(
        short = 't',
        long,
        env = "BENCH_TESTS",
        value_delimiter = ',',
        default_values_t = TestId::ALL.to_vec()
    )]
    pub tests: Vec<TestId>,

    /// Wallet address used by balance and history tests
    #[arg(long, env = "BENCH_WALLET_ADDRESS", default_value = DEFAULT_WALLET)]
    pub wallet_address: String,

    /// Token address used by price tests
    #[arg(long, env = "BENCH_TOKEN_ADDRESS", default_value = DEFAULT_TOKEN)]
    pub token_address: String,

    /// Directory the JSON report is written to
    #[arg(short = 'o', long, env = "BENCH_OUTPUT_DIR", default_value = "results")]
    pub output: PathBuf,

    /// Do not write the JSON report
    #[arg(long)]
    pub no_save: bool,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StandaloneArgs {
    /// Measured iterations per test
    #[arg(short = 'n', long, default_value_t = 5)]
    pub iterations: usize,

    /// Mock server base latency in milliseconds
    #[arg(long, default_value_t = 40)]
    pub latency_ms: u64,

    /// Mock server random extra latency in milliseconds
    #[arg(long, default_value_t = 20)]
    pub jitter_ms: u64,

    /// Answer every Nth request with 429
    #[arg(long)]
    pub rate_limit_every: Option<u64>,

    /// Mock server error rate (0.0 to 1.0)
    #[arg(long, default_value_t = 0.0)]
    pub error_rate: f64,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Fully resolved settings for a `run`
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub iterations: usize,
    pub providers: Vec<Provider>,
    pub tests: Vec<TestId>,
    pub addresses: TestAddresses,
    /// `None` when saving is disabled
    pub output_dir: Option<PathBuf>,
    pub json: bool,
    pub credentials: HashMap<Provider, String>,
}

impl RunSettings {
    /// Load settings from the process environment (after `.env`)
    pub fn load(args: RunArgs) -> Result<Self> {
        Self::resolve(args, |name| std::env::var(name).ok())
    }

    /// Resolve CLI arguments, reading credentials through `lookup`
    pub fn resolve(args: RunArgs, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if args.iterations == 0 {
            return Err(BenchError::Config(
                "iterations must be a positive integer".to_string(),
            ));
        }

        let providers = dedup(args.providers);
        let tests = dedup(args.tests);

        let mut credentials = HashMap::new();
        for provider in &providers {
            match lookup(provider.credential_env())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
            {
                Some(key) => {
                    credentials.insert(*provider, key);
                }
                None => tracing::warn!(
                    provider = provider.name(),
                    env = provider.credential_env(),
                    "No credential configured, skipping provider"
                ),
            }
        }

        if credentials.is_empty() {
            let names: Vec<&str> = providers.iter().map(|p| p.credential_env()).collect();
            return Err(BenchError::Config(format!(
                "no provider credentials found (set one of: {})",
                names.join(", ")
            )));
        }

        Ok(Self {
            iterations: args.iterations,
            providers,
            tests,
            addresses: TestAddresses {
                wallet: args.wallet_address,
                token: args.token_address,
            },
            output_dir: (!args.no_save).then_some(args.output),
            json: args.json,
            credentials,
        })
    }
}

/// Load `.env` into the process environment if present
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn dedup<T: PartialEq + Copy>(items: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
