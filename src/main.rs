//! telemetry-dial agent
//!
//! # Architecture Overview
//!
//! ```text
//!   control endpoint / snapshot file
//!              │
//!              ▼
//!   ┌────────────────────┐     ┌──────────────────┐
//!   │    control loop    │────▶│  level registry  │──▶ logger tree native levels
//!   │ fetch/parse/apply  │     │ active + sampling│──▶ suppression hook (console)
//!   └─────────┬──────────┘     └────────┬─────────┘
//!             │                         │
//!             ▼                         ▼
//!   ┌────────────────────┐     ┌──────────────────┐
//!   │  dynamic sampler   │     │   record gate    │──▶ export sink
//!   └────────────────────┘     └──────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use clap::Parser;
use telemetry_dial::config::{load_config, AgentConfig};
use telemetry_dial::levels::LevelRegistry;
use telemetry_dial::lifecycle::{build_logger_tree, signals, Agent};
use telemetry_dial::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "telemetry-dial")]
#[command(about = "Runtime log level and sampling control agent", long_about = None)]
struct Args {
    /// Agent configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AgentConfig::default(),
    };

    let tree = Arc::new(build_logger_tree(&config)?);
    let registry = Arc::new(LevelRegistry::create(tree.clone()));
    logging::init_logging(&config.observability, tree, registry.clone())?;

    tracing::info!("telemetry-dial v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let agent = Agent::start(&config, registry).await?;

    signals::wait_for_signal().await;
    tracing::info!("Shutdown signal received");

    agent.stop(Duration::from_secs(5)).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
