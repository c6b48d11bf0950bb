//! LineKV - A Line-Oriented TCP Key-Value Server
//!
//! This is the main entry point for the LineKV server.
//! It parses flags, opens the record store, binds the listener and runs the
//! accept loop until Ctrl+C or SIGTERM.

use anyhow::Context;
use clap::Parser;
use linekv::{
    shutdown_signal, CommandExecutor, Server, ServerConfig, StoreConfig, DEFAULT_HOST,
    DEFAULT_PORT,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// LineKV server
#[derive(Parser, Debug)]
#[command(name = "linekv")]
#[command(about = "Line-oriented TCP key-value server")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Close a connection when a single read waits longer than this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    read_timeout: Option<u64>,

    /// SQLite database file; entries are kept in memory when omitted
    #[arg(short, long, value_name = "PATH")]
    database: Option<PathBuf>,
}

impl Args {
    fn into_configs(self) -> (ServerConfig, StoreConfig) {
        let server = ServerConfig {
            host: self.host,
            port: self.port,
            read_timeout: self.read_timeout.map(Duration::from_secs),
        };
        let store = match self.database {
            Some(path) => StoreConfig::Sqlite(path),
            None => StoreConfig::Memory,
        };
        (server, store)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, store_config) = Args::parse().into_configs();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    info!(version = linekv::VERSION, "LineKV starting");

    let store = store_config
        .open()
        .with_context(|| format!("failed to open record store {:?}", store_config))?;
    match &store_config {
        StoreConfig::Memory => info!("Using in-memory record store"),
        StoreConfig::Sqlite(path) => info!(path = %path.display(), "Using sqlite record store"),
    }

    let server = Server::bind(&config, CommandExecutor::from_boxed(store)).await?;
    info!(address = %server.local_addr()?, "Ready to accept connections");

    // Set up graceful shutdown on Ctrl+C or SIGTERM
    let shutdown = shutdown_signal().context("failed to install signal handlers")?;
    let sessions = Arc::clone(server.sessions());

    server
        .run_until(shutdown)
        .await
        .context("accept loop failed")?;

    let stats = sessions.stats();
    info!(
        connections = stats.connections_accepted,
        commands = stats.commands_processed,
        bytes_read = stats.bytes_read,
        bytes_written = stats.bytes_written,
        still_connected = stats.active_sessions,
        "Server shutdown complete"
    );
    Ok(())
}
