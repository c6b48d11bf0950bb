//! Connection Handler Module
//!
//! This module handles individual client connections to LineKV.
//! Each client gets its own handler task that runs in a loop,
//! reading lines and sending responses.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects, session registered by the listener
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │  Reading                     │ <──────┐
//!    │  read until a '\n' arrives   │        │
//!    └───────────┬──────────────────┘        │
//!                ▼                           │
//!    ┌──────────────────────────────┐        │
//!    │  Dispatching                 │        │
//!    │  parse line, execute command │        │
//!    └───────────┬──────────────────┘        │
//!                ▼                           │
//!    ┌──────────────────────────────┐        │
//!    │  Writing                     │ ───────┘
//!    │  one response line           │
//!    └──────────────────────────────┘
//!        │
//!        ▼  end of stream / read error / timeout
//! 4. Closed: socket dropped, session deregistered
//! ```
//!
//! Command errors (bad syntax, missing key, store failure) are answered with
//! an `Error: ...` line and the loop continues. Only connection errors end it.
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut`. TCP may deliver half a line or
//! several lines per read, so complete lines are split off the front of the
//! buffer and any remainder waits for the next read.

use super::session::Session;
use crate::commands::CommandExecutor;
use crate::protocol::{parse, ParseError, Response};
use bytes::{Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, trace, warn};

/// Longest line accepted before the connection is dropped (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Handles a single client connection.
///
/// Generic over the stream so tests can drive it with an in-memory mock;
/// the server uses `TcpStream`.
pub struct ConnectionHandler<S> {
    /// The client stream
    stream: BufWriter<S>,

    /// Registration in the active session set
    session: Session,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// The command executor (shared store)
    executor: CommandExecutor,

    /// Limit on how long a single read may wait
    read_timeout: Option<Duration>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The client stream
    /// * `session` - The session registered for this connection
    /// * `executor` - The command executor
    /// * `read_timeout` - Optional limit for each read; `None` waits forever
    pub fn new(
        stream: S,
        session: Session,
        executor: CommandExecutor,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            stream: BufWriter::new(stream),
            session,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            executor,
            read_timeout,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Returns `Ok(())` when the client closes the connection. Dropping
    /// `self` at the end releases the stream and deregisters the session.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        let client = self.session.addr();
        let session = self.session.id();
        info!(client = %client, session, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %client, session, "Client disconnected"),
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %client, session, "Connection reset by client")
            }
            Err(e) => warn!(client = %client, session, error = %e, "Connection error"),
        }

        result
    }

    /// The read-dispatch-write loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(line) = self.next_line() {
                let response = self.dispatch(&line).await;
                self.send_response(&response).await?;
            }

            if !self.read_more_data().await? {
                // A final line without a terminator still gets an answer
                if !self.buffer.is_empty() {
                    let line = self.buffer.split().freeze();
                    let response = self.dispatch(&line).await;
                    self.send_response(&response).await?;
                }
                return Ok(());
            }
        }
    }

    /// Splits the next complete line off the buffer, including its `\n`.
    fn next_line(&mut self) -> Option<Bytes> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let line = self.buffer.split_to(end + 1).freeze();
        trace!(
            client = %self.session.addr(),
            len = line.len(),
            remaining = self.buffer.len(),
            "Framed line"
        );
        Some(line)
    }

    /// Parses and executes one raw line.
    async fn dispatch(&self, raw: &[u8]) -> Response {
        let raw = trim_line_ending(raw);

        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(_) => return Response::from(ParseError::InvalidUtf8),
        };

        let response = match parse(line) {
            Ok(command) => self.executor.execute(command).await,
            Err(e) => {
                debug!(client = %self.session.addr(), error = %e, "Rejected command");
                Response::from(e)
            }
        };

        self.session.registry().command_processed();
        response
    }

    /// Reads more data from the stream into the buffer.
    ///
    /// Returns `Ok(false)` at end of stream.
    async fn read_more_data(&mut self) -> Result<bool, ConnectionError> {
        // Every complete line has been consumed, so this is one unterminated line
        if self.buffer.len() >= MAX_LINE_LENGTH {
            error!(
                client = %self.session.addr(),
                size = self.buffer.len(),
                "Line length limit exceeded"
            );
            return Err(ConnectionError::LineTooLong(MAX_LINE_LENGTH));
        }

        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let read = self.stream.get_mut().read_buf(&mut self.buffer);
        let n = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| ConnectionError::Timeout(limit))??,
            None => read.await?,
        };

        if n == 0 {
            return Ok(false);
        }

        self.session.registry().bytes_read(n);
        trace!(client = %self.session.addr(), bytes = n, "Read data");

        Ok(true)
    }

    /// Sends a response line to the client.
    async fn send_response(&mut self, response: &Response) -> Result<(), ConnectionError> {
        let bytes = response.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.session.registry().bytes_written(bytes.len());
        trace!(
            client = %self.session.addr(),
            bytes = bytes.len(),
            "Sent response"
        );
        Ok(())
    }
}

/// Strips a trailing `\n` and an optional `\r` before it.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read waited longer than the configured limit
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// The client sent a line longer than the limit
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion. Errors have already been logged by `run`.
pub async fn handle_connection<S>(
    stream: S,
    session: Session,
    executor: CommandExecutor,
    read_timeout: Option<Duration>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, session, executor, read_timeout);
    let _ = handler.run().await;
}
