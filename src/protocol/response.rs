//! Response Types
//!
//! Every command produces exactly one [`Response`], written to the client as a
//! single line terminated by `\n`.
//!
//! ## Wire Format
//!
//! ```text
//! Inserted foo bar          PUT on a new key
//! Updated foo baz           PUT on an existing key
//! baz                       GET
//! Deleted foo               DELETE
//! a: 1, b: 2                LIST (empty line when the store is empty)
//! Error: key foo not found  any failure
//! ```

use super::command::ParseError;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Line terminator for responses.
pub const NEWLINE: u8 = b'\n';

/// Separator placed between LIST entries.
pub const LIST_SEPARATOR: &str = ", ";

/// Command-level failures reported back to the client.
///
/// None of these close the connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The request line could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// GET on a key that is not in the store
    #[error("key {0} not found")]
    NotFound(String),

    /// The record store failed; details are logged server side only
    #[error("store failure")]
    StoreFailure,
}

/// The result of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// PUT created a new entry
    Inserted { key: String, value: String },

    /// PUT overwrote an existing entry
    Updated { key: String, value: String },

    /// GET found a value
    Value(String),

    /// DELETE completed (whether or not the key existed)
    Deleted(String),

    /// LIST output, ordered by key
    List(Vec<(String, String)>),

    /// Any command-level failure
    Error(CommandError),
}

impl Response {
    /// Returns `true` if this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Serializes the response as one newline-terminated line.
    pub fn serialize(&self) -> Bytes {
        let mut line = self.to_string();
        line.push(NEWLINE as char);
        Bytes::from(line)
    }
}

impl From<CommandError> for Response {
    fn from(err: CommandError) -> Self {
        Response::Error(err)
    }
}

impl From<ParseError> for Response {
    fn from(err: ParseError) -> Self {
        Response::Error(CommandError::Parse(err))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Inserted { key, value } => write!(f, "Inserted {} {}", key, value),
            Response::Updated { key, value } => write!(f, "Updated {} {}", key, value),
            Response::Value(value) => f.write_str(value),
            Response::Deleted(key) => write!(f, "Deleted {}", key),
            Response::List(entries) => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(LIST_SEPARATOR)?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                Ok(())
            }
            Response::Error(err) => write!(f, "Error: {}", err),
        }
    }
}
