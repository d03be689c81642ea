//! Map scenario replay tool.
//!
//! Prints a JSON snapshot of the map after replaying a scenario.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use map_common::AppConfig;
use map_replay::{Replay, Scenario};

#[derive(Parser, Debug)]
#[command(name = "map-replay")]
#[command(about = "Replay map interaction scenarios against headless map surfaces")]
struct Args {
    /// Map configuration (JSON or YAML)
    #[arg(short, long, env = "MAP_CONFIG")]
    config: PathBuf,

    /// Scenario file (YAML or JSON)
    #[arg(short, long)]
    scenario: PathBuf,

    /// Override the layer cache capacity from the configuration
    #[arg(long, env = "MAP_CACHE_CAPACITY")]
    cache_capacity: Option<usize>,

    /// Log level
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Pretty-print the snapshot
    #[arg(long)]
    pretty: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    let mut config = AppConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration: {}", args.config.display()))?;
    if let Some(capacity) = args.cache_capacity {
        config.map.cache_capacity = capacity;
    }
    let scenario = Scenario::from_file(&args.scenario)?;

    info!(
        scenario = scenario.name.as_deref().unwrap_or("unnamed"),
        steps = scenario.steps.len(),
        "Replaying scenario"
    );

    let mut replay = Replay::new(config, &scenario)?;
    replay.run(&scenario).await?;

    let snapshot = replay.snapshot();
    let output = if args.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", output);

    info!(
        failures = snapshot.failures.len(),
        rejected_steps = snapshot.step_errors.len(),
        "Replay finished"
    );
    Ok(())
}
