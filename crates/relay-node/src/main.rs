//! # Relay Node
//!
//! Entry point for the relay agent.
//!
//! ## Startup Sequence
//!
//! 1. Parse CLI arguments
//! 2. Load configuration (file, then `AGENT_*` environment overrides)
//! 3. Validate configuration (key material, limits, TLS paths)
//! 4. Initialize logging (`RUST_LOG`, else the config `debug` flag)
//! 5. Build the envelope codec and command executor
//! 6. Serve HTTPS until Ctrl+C, then drain in-flight requests

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use relay_gateway::{AgentConfig, CommandExecutor, RelayService};

/// Grace period for in-flight requests on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "relay-node")]
#[command(about = "Secure query relay agent", version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "AGENT_CONFIG")]
    config: Option<PathBuf>,
}

/// Load configuration from file and environment.
fn load_config(path: Option<&PathBuf>) -> Result<AgentConfig> {
    let mut config = match path {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AgentConfig::default(),
    };

    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    config.validate().context("invalid configuration")?;

    Ok(config)
}

fn init_logging(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_ref())?;
    init_logging(config.debug)?;

    if config.debug {
        warn!("Debug logging is on; decoded query payloads will be logged");
    }

    let executor = Arc::new(CommandExecutor::new(&config.execution));
    let service = Arc::new(RelayService::new(config, executor).context("failed to build relay")?);

    let mut server = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.serve().await })
    };

    info!("Relay is running. Press Ctrl+C to stop.");

    tokio::select! {
        result = &mut server => {
            result.context("server task failed")??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            service.shutdown(SHUTDOWN_GRACE);
            server.await.context("server task failed")??;
        }
    }

    info!("Relay stopped");
    Ok(())
}
