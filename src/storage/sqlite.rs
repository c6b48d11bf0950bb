//! SQLite Record Store
//!
//! Persists entries in a single relational table:
//!
//! ```sql
//! CREATE TABLE key_value_pairs (
//!     key   TEXT PRIMARY KEY,
//!     value TEXT NOT NULL
//! );
//! ```
//!
//! The table is created on open if it does not exist. The store holds one
//! `rusqlite::Connection`; the executor's lock is what serializes access to it.

use super::{RecordStore, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS key_value_pairs (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

/// Record store backed by a SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened sqlite database");
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM key_value_pairs WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        let found: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM key_value_pairs WHERE key = ?1)",
            params![key],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn insert(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO key_value_pairs (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn update(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE key_value_pairs SET value = ?1 WHERE key = ?2",
            params![value, key],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM key_value_pairs WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM key_value_pairs ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let entries = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
