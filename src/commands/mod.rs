//! Command Execution Module
//!
//! This module implements the command processing layer for LineKV.
//! It receives parsed commands, executes them against the record store under
//! a single lock, and returns the response to send back.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Line Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandExecutor │  (this module)
//! │                 │
//! │  - Lock store   │
//! │  - Execute      │
//! │  - Respond      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  RecordStore    │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PUT key value`
//! - `GET key`
//! - `DELETE key`
//! - `LIST`

pub mod executor;

// Re-export the main command executor
pub use executor::{CommandExecutor, SharedStore};
