//! Connection Handler Module
//!
//! This module manages individual client connections to LineKV.
//! Each client connection is handled by its own async task, and every task
//! shares the same command executor and session registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (server.rs)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept() + register session
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read line   │───>│ Parse line  │───>│ Execute cmd │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      ┌─────────────┐        │
//! │                                      │ Send resp   │        │
//! │                                      └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use linekv::connection::{handle_connection, SessionRegistry};
//! use linekv::commands::CommandExecutor;
//! use linekv::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! let sessions = Arc::new(SessionRegistry::new());
//! let executor = CommandExecutor::new(MemoryStore::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! let session = sessions.register(addr);
//! tokio::spawn(handle_connection(stream, session, executor.clone(), None));
//! ```

pub mod handler;
pub mod session;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, MAX_LINE_LENGTH};
pub use session::{Session, SessionId, SessionInfo, SessionRegistry, SessionStats};
