//! Pollify server
//!
//! Run with: cargo run --bin pollify
//!
//! # Configuration
//!
//! Read from `--config`, else the first of `~/.config/pollify/config.toml`,
//! `/etc/pollify/config.toml`, `./config.toml`. Environment variables
//! override the file:
//! - `POLLIFY_DATA_DIR`: Data directory
//! - `POLLIFY_API_HOST` / `POLLIFY_API_PORT`: Bind address (default: 0.0.0.0:8090)
//! - `POLLIFY_VOTER_IP_SOURCE`: `peer` or `forwarded`
//! - `POLLIFY_IP_LOOKUP_URL`: Public IP lookup endpoint
//! - `POLLIFY_SESSION_TTL_HOURS`: Session lifetime
//! - `POLLIFY_LOG_LEVEL` / `POLLIFY_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Full filter directives, wins over the level above

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pollify::api::{serve, spawn_session_purge, AppState};
use pollify::config::Config;
use pollify::store::{Store, StoreConfig};

#[derive(Parser)]
#[command(name = "pollify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pollify poll server")]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Data directory
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    pollify::logging::init(&config.logging);
    tracing::info!("Starting Pollify server v{}", env!("CARGO_PKG_VERSION"));

    let addr = config.bind_addr()?;
    tracing::info!("Data directory: {}", config.storage.data_dir);
    tracing::info!("Voter IP source: {}", config.voter.ip_source);

    let store = Arc::new(Store::open(&StoreConfig::new(&config.storage.data_dir))?);
    tracing::info!("Store opened at {:?}", store.path());

    let purge_every = Duration::from_secs(config.auth.session_purge_interval_secs.max(60));
    let purge = spawn_session_purge(Arc::clone(&store), purge_every);

    let state = AppState::new(store, config)?;

    tracing::info!("Starting server on {}", addr);
    serve(state).await?;

    purge.abort();
    tracing::info!("Pollify server stopped");
    Ok(())
}
