//! # LineKV - A Line-Oriented TCP Key-Value Server
//!
//! LineKV accepts TCP clients that speak a plain text protocol, one command
//! per line, and keeps the entries in a relational table (SQLite) or in
//! memory.
//!
//! ## Features
//!
//! - **Text Protocol**: `PUT`, `GET`, `DELETE` and `LIST`, one line each way
//! - **Serialized Store Access**: one lock orders every store operation
//! - **Pluggable Store**: anything implementing [`storage::RecordStore`]
//! - **Async I/O**: Built on Tokio, one task per client connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              LineKV                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Executor   │                  │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │         │                  │                  │                         │
//! │         ▼                  ▼                  ▼                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────────────┐     │
//! │  │  Session    │    │   Line      │    │  Mutex<dyn RecordStore>  │     │
//! │  │  Registry   │    │   Parser    │    │  Memory │ SQLite         │     │
//! │  └─────────────┘    └─────────────┘    └──────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use linekv::{CommandExecutor, MemoryStore, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let executor = CommandExecutor::new(MemoryStore::new());
//!     let server = Server::bind(&ServerConfig::default(), executor).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! ```text
//! > PUT foo bar
//! < Inserted foo bar
//! > PUT foo baz
//! < Updated foo baz
//! > GET foo
//! < baz
//! > LIST
//! < foo: baz
//! > DELETE foo
//! < Deleted foo
//! > GET foo
//! < Error: key foo not found
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: Line parser, commands and responses
//! - [`storage`]: The record store trait and its memory and SQLite stores
//! - [`commands`]: Executes commands under the store lock
//! - [`connection`]: Per-client read loop and session bookkeeping
//! - [`server`]: Listener and accept loop
//! - [`config`]: Server configuration

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandExecutor;
pub use config::{ServerConfig, StoreConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use connection::{handle_connection, SessionRegistry, SessionStats};
pub use protocol::{parse, Command, ParseError, Response};
pub use server::{shutdown_signal, Server, ServerError};
pub use storage::{MemoryStore, RecordStore, SqliteStore};

/// Version of LineKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
