//! # wsload CLI
//!
//! Load tester for a GraphQL workspace/table backend: each virtual user
//! creates a workspace, promotes it, creates a table, writes and reads
//! records, then tears everything down again.
//!
//! ## Usage
//!
//! ```bash
//! # Fixed profile: 10 users, one journey each
//! WSLOAD_AUTH_TOKEN=... wsload --vus 10 --iterations 1
//!
//! # Ramping profile from a config file
//! WSLOAD_AUTH_TOKEN=... wsload --config wsload.toml
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wsload_runner::{auth_token_from_env, LoadTestConfig, LoadTestRunner, Profile};

#[derive(Parser)]
#[command(name = "wsload")]
#[command(version)]
#[command(about = "Workspace lifecycle load tester", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target GraphQL endpoint (overrides the config file)
    #[arg(short, long)]
    target: Option<String>,

    /// Fixed profile: number of virtual users (overrides the config file)
    #[arg(long)]
    vus: Option<u32>,

    /// Fixed profile: iterations per virtual user
    #[arg(long)]
    iterations: Option<u64>,

    /// Use the built-in stepped ramping profile instead of a fixed one
    #[arg(long, conflicts_with_all = ["vus", "iterations"])]
    ramping: bool,

    /// Skip TLS certificate validation
    #[arg(long)]
    insecure: bool,

    /// Write the run summary to a JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = match &cli.config {
        Some(path) => LoadTestConfig::from_file(path)?,
        None => LoadTestConfig::default(),
    };

    if let Some(target) = cli.target {
        config.target_url = target;
    }
    if cli.insecure {
        config.insecure_skip_tls_verify = true;
    }
    if cli.ramping {
        config.profile = Profile::default_ramping();
    } else if cli.vus.is_some() || cli.iterations.is_some() {
        let (default_vus, default_iterations) = match &config.profile {
            Profile::Fixed {
                vus,
                iterations_per_vu,
            } => (*vus, *iterations_per_vu),
            _ => (10, 1),
        };
        config.profile = Profile::Fixed {
            vus: cli.vus.unwrap_or(default_vus),
            iterations_per_vu: cli.iterations.unwrap_or(default_iterations),
        };
    }

    // Pre-flight: a missing token fails here, before any request is issued
    let auth_token = auth_token_from_env()?;

    let runner = LoadTestRunner::new(config, auth_token)?;
    let summary = runner.run().await;
    summary.print_report();

    if let Some(path) = cli.output {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json)?;
        info!("results saved to {}", path.display());
    }

    if summary.iterations_aborted > 0 {
        std::process::exit(1);
    }
    Ok(())
}
