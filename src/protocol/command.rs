//! Command Parsing
//!
//! Turns one request line into a [`Command`]. The grammar is whitespace
//! separated tokens: a case-insensitive verb followed by its arguments.
//!
//! ```text
//! PUT <key> <value>
//! GET <key>
//! DELETE <key>
//! LIST
//! ```
//!
//! Values cannot contain whitespace. A `PUT` with more than two arguments is
//! rejected instead of being truncated to its first two tokens.

use std::fmt;
use thiserror::Error;

/// The first token of a request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Put,
    Get,
    Delete,
    List,
}

impl Verb {
    /// Looks up a verb, ignoring ASCII case.
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("PUT") {
            Some(Verb::Put)
        } else if token.eq_ignore_ascii_case("GET") {
            Some(Verb::Get)
        } else if token.eq_ignore_ascii_case("DELETE") {
            Some(Verb::Delete)
        } else if token.eq_ignore_ascii_case("LIST") {
            Some(Verb::List)
        } else {
            None
        }
    }

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Put => "PUT",
            Verb::Get => "GET",
            Verb::Delete => "DELETE",
            Verb::List => "LIST",
        }
    }

    /// Number of arguments the verb takes.
    fn arity(&self) -> usize {
        match self {
            Verb::Put => 2,
            Verb::Get | Verb::Delete => 1,
            Verb::List => 0,
        }
    }

    /// Human readable argument list, used in error messages.
    fn usage(&self) -> &'static str {
        match self {
            Verb::Put => "key and value",
            Verb::Get | Verb::Delete => "key",
            Verb::List => "no arguments",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert or overwrite a key
    Put { key: String, value: String },

    /// Read a key
    Get { key: String },

    /// Remove a key (idempotent)
    Delete { key: String },

    /// Enumerate every entry
    List,
}

impl Command {
    /// Returns the verb this command was parsed from.
    pub fn verb(&self) -> Verb {
        match self {
            Command::Put { .. } => Verb::Put,
            Command::Get { .. } => Verb::Get,
            Command::Delete { .. } => Verb::Delete,
            Command::List => Verb::List,
        }
    }

    /// Returns `true` for commands that change the store.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Command::Put { .. } | Command::Delete { .. })
    }
}

/// Errors produced while parsing a request line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line held no tokens
    #[error("empty command is not allowed")]
    EmptyCommand,

    /// The first token is not a known verb
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Fewer arguments than the verb requires
    #[error("{} command requires {}", .0, usage(.0))]
    MissingArgument(Verb),

    /// More arguments than the verb accepts
    #[error("{} command accepts only {}", .0, usage(.0))]
    TooManyArguments(Verb),

    /// The line is not valid UTF-8
    #[error("command is not valid UTF-8")]
    InvalidUtf8,
}

fn usage(verb: &Verb) -> &'static str {
    verb.usage()
}

/// Parses one request line (without its trailing newline).
///
/// # Example
///
/// ```
/// use linekv::protocol::{parse, Command};
///
/// let cmd = parse("put name Ariz").unwrap();
/// assert_eq!(
///     cmd,
///     Command::Put { key: "name".to_string(), value: "Ariz".to_string() }
/// );
/// ```
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut tokens = line.split_whitespace();

    let verb_token = tokens.next().ok_or(ParseError::EmptyCommand)?;
    let verb = Verb::from_token(verb_token)
        .ok_or_else(|| ParseError::UnknownCommand(verb_token.to_string()))?;

    let args: Vec<&str> = tokens.collect();

    // LIST ignores anything after the verb
    if verb == Verb::List {
        return Ok(Command::List);
    }

    if args.len() < verb.arity() {
        return Err(ParseError::MissingArgument(verb));
    }
    if args.len() > verb.arity() {
        return Err(ParseError::TooManyArguments(verb));
    }

    let key = args[0].to_string();
    let command = match verb {
        Verb::Put => Command::Put {
            key,
            value: args[1].to_string(),
        },
        Verb::Get => Command::Get { key },
        Verb::Delete => Command::Delete { key },
        Verb::List => Command::List,
    };

    Ok(command)
}
