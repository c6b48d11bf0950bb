//! Line Protocol Implementation
//!
//! LineKV speaks a plain text protocol: one UTF-8 command per `\n`-terminated
//! line, one response line per command.
//!
//! ## Modules
//!
//! - `command`: Tokenizes a request line into a `Command`
//! - `response`: The `Response` enum and its wire serialization
//!
//! ## Example
//!
//! ```
//! use linekv::protocol::{parse, Command, Response};
//!
//! // Parsing an incoming line
//! let cmd = parse("GET name").unwrap();
//! assert_eq!(cmd, Command::Get { key: "name".to_string() });
//!
//! // Creating responses
//! let response = Response::Value("Ariz".to_string());
//! assert_eq!(&response.serialize()[..], b"Ariz\n");
//! ```

pub mod command;
pub mod response;

// Re-export commonly used types for convenience
pub use command::{parse, Command, ParseError, Verb};
pub use response::{CommandError, Response};
