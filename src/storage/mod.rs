//! Record Store Module
//!
//! This module defines the narrow CRUD interface the server uses to reach its
//! backing store, plus the two stores that ship with LineKV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  trait RecordStore                          │
//! │   get · exists · insert · update · delete · list            │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//!      ┌──────────────────┐            ┌──────────────────┐
//!      │   MemoryStore    │            │   SqliteStore    │
//!      │   (BTreeMap)     │            │ key_value_pairs  │
//!      └──────────────────┘            └──────────────────┘
//! ```
//!
//! Stores are not required to be `Sync`. The command executor owns the only
//! handle and serializes every call behind a single lock, so implementations
//! can assume exclusive access for the duration of a call.
//!
//! ## Example
//!
//! ```
//! use linekv::storage::{MemoryStore, RecordStore};
//!
//! let mut store = MemoryStore::new();
//! store.insert("name", "Ariz").unwrap();
//! assert_eq!(store.get("name").unwrap(), Some("Ariz".to_string()));
//! assert!(store.exists("name").unwrap());
//! ```

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The SQLite backend rejected a statement
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An insert targeted a key that is already present
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Any other backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The CRUD interface over unique string keys.
///
/// `update` on an absent key and `delete` on an absent key are both no-ops,
/// matching SQL `UPDATE`/`DELETE` semantics. `list` returns entries in
/// ascending key order.
pub trait RecordStore: Send {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Returns whether `key` is present.
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Adds a new entry. Fails if `key` is already present.
    fn insert(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Replaces the value of an existing entry.
    fn update(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key` if present.
    fn delete(&mut self, key: &str) -> StoreResult<()>;

    /// Returns every entry, ordered by key.
    fn list(&self) -> StoreResult<Vec<(String, String)>>;
}
