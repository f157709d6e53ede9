//! Punchlist server binary.

use anyhow::Result;
use clap::Parser;
use punchlist::storage::StoreBackend;
use punchlist_server::config::ServerConfig;
use punchlist_server::http;
use punchlist_server::routes::Router;
use punchlist_server::state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Punchlist - per-project issue tracking over HTTP
///
/// Serves the issue API on `/api/issues/{project}`. Without `--data` the
/// store is in-memory and lost on exit; with `--data` every mutation is
/// snapshotted to a JSONL file.
#[derive(Parser, Debug)]
#[command(name = "punchlist-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the HTTP listener to
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// JSONL snapshot file; omit for a purely in-memory store
    #[arg(long)]
    data: Option<PathBuf>,

    /// YAML configuration file (flags win over file values)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    // Can be controlled via RUST_LOG environment variable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("punchlist=info,punchlist_server=info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ServerConfig::load(path).await?,
        None => ServerConfig::default(),
    };
    let config = config.merge_flags(args.bind, args.data);

    let backend = match &config.data_file {
        Some(path) => StoreBackend::Jsonl(path.clone()),
        None => StoreBackend::Memory,
    };

    let state = AppState::open(backend).await?;
    let router = Router::new(state.clone());

    tracing::info!(bind = %config.bind, "starting punchlist server");
    http::serve(config.bind, router).await?;

    // Flush the snapshot on the way out
    state.save().await?;
    tracing::info!("punchlist server stopped");

    Ok(())
}
