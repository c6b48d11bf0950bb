//! TCP Listener and Dispatcher
//!
//! Binds the listening socket and runs the accept loop. Every accepted
//! connection is registered in the [`SessionRegistry`] and then handed to its
//! own tokio task, so a slow client never holds up `accept`.
//!
//! ```text
//!   accept() ──> register session ──> tokio::spawn(handle_connection)
//!      ▲                                          │
//!      └──────────────── loop ◄───────────────────┘
//! ```
//!
//! There is no connection limit. An accept error ends the loop and is
//! returned to the caller. Stopping the loop does not touch connections that
//! were already handed off; they run until their own sockets close.
//!
//! [`shutdown_signal`] is the stop future the binary passes to
//! [`Server::run_until`]: it fires on Ctrl+C and, on Unix, on SIGTERM.

use crate::commands::CommandExecutor;
use crate::config::ServerConfig;
use crate::connection::{handle_connection, SessionRegistry};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// Errors that stop the whole server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// `accept` failed; the accept loop has stopped
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// Any other socket error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A bound LineKV server.
pub struct Server {
    listener: TcpListener,
    executor: CommandExecutor,
    sessions: Arc<SessionRegistry>,
    read_timeout: Option<Duration>,
}

impl Server {
    /// Binds the listening socket described by `config`. Every connection
    /// runs its commands through `executor`.
    pub async fn bind(config: &ServerConfig, executor: CommandExecutor) -> Result<Self, ServerError> {
        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!(address = %addr, "Listening");

        Ok(Self {
            listener,
            executor,
            sessions: Arc::new(SessionRegistry::new()),
            read_timeout: config.read_timeout,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns the active session set.
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Runs the accept loop until `accept` fails.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes or `accept` fails.
    ///
    /// When `shutdown` wins, the listener is closed and `Ok(())` is returned.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), ServerError> {
        tokio::select! {
            result = self.accept_loop() => result,
            _ = shutdown => {
                info!("Accept loop stopped");
                Ok(())
            }
        }
    }

    /// Main loop that accepts incoming connections
    async fn accept_loop(&self) -> Result<(), ServerError> {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    return Err(ServerError::Accept(e));
                }
            };

            let session = self.sessions.register(addr);
            let executor = self.executor.clone();
            let read_timeout = self.read_timeout;

            // Spawn a task to handle this connection
            tokio::spawn(async move {
                handle_connection(stream, session, executor, read_timeout).await;
            });
        }
    }
}

/// Returns a future that resolves once the process is asked to stop.
///
/// The SIGTERM handler is installed before this returns, so a SIGTERM sent
/// while the server is still starting is not lost.
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    #[cfg(unix)]
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    Ok(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            sigterm.recv().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!(signal = "SIGINT", "Shutdown signal received, stopping server..."),
            _ = terminate => info!(signal = "SIGTERM", "Shutdown signal received, stopping server..."),
        }
    })
}
