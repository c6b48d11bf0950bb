//! Server configuration.

use crate::storage::{MemoryStore, RecordStore, SqliteStore, StoreResult};
use std::path::PathBuf;
use std::time::Duration;

/// The default port LineKV listens on
pub const DEFAULT_PORT: u16 = 8080;

/// The default host LineKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Which record store backs the server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreConfig {
    /// Entries live in process memory and vanish on exit
    #[default]
    Memory,
    /// Entries live in the `key_value_pairs` table of a SQLite file
    Sqlite(PathBuf),
}

impl StoreConfig {
    /// Opens the configured store.
    pub fn open(&self) -> StoreResult<Box<dyn RecordStore>> {
        Ok(match self {
            StoreConfig::Memory => Box::new(MemoryStore::new()),
            StoreConfig::Sqlite(path) => Box::new(SqliteStore::open(path)?),
        })
    }
}

/// Listener settings. The record store is configured separately through
/// [`StoreConfig`] and handed to the server already opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on (0 picks a free port)
    pub port: u16,
    /// Limit on each socket read; `None` lets idle clients wait forever
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
