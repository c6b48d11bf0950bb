//! Session Bookkeeping
//!
//! The [`SessionRegistry`] is the active session set: one entry per live
//! client connection, mutated only under its own lock. It also keeps a few
//! process-wide counters.
//!
//! A [`Session`] is the registration handle owned by a connection handler.
//! Dropping it removes the entry, so a session cannot outlive its handler
//! whichever way the handler exits.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// Identifies one client session for the lifetime of the process.
pub type SessionId = u64;

/// What the registry knows about a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    /// Peer address of the client
    pub addr: SocketAddr,
    /// When the connection was accepted
    pub connected_at: Instant,
}

/// Point-in-time copy of the registry counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub active_sessions: usize,
    pub connections_accepted: u64,
    pub commands_processed: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// The process-wide set of active sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Live sessions keyed by id
    sessions: Mutex<HashMap<SessionId, SessionInfo>>,
    /// Source of session ids
    next_id: AtomicU64,
    /// Total number of connections accepted
    connections_accepted: AtomicU64,
    /// Total commands processed
    commands_processed: AtomicU64,
    /// Total bytes read
    bytes_read: AtomicU64,
    /// Total bytes written
    bytes_written: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session for a newly accepted connection.
    pub fn register(self: &Arc<Self>, addr: SocketAddr) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let info = SessionInfo {
            id,
            addr,
            connected_at: Instant::now(),
        };

        self.sessions.lock().insert(id, info);
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        trace!(session = id, client = %addr, "Session registered");

        Session {
            id,
            addr,
            registry: Arc::clone(self),
        }
    }

    fn deregister(&self, id: SessionId) {
        self.sessions.lock().remove(&id);
        trace!(session = id, "Session removed");
    }

    /// Returns `true` if the session is still registered.
    pub fn is_active(&self, id: SessionId) -> bool {
        self.sessions.lock().contains_key(&id)
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Copies out every live session, ordered by id.
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self.sessions.lock().values().cloned().collect();
        sessions.sort_by_key(|s| s.id);
        sessions
    }

    /// Reads every counter at once.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            active_sessions: self.active_count(),
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// A registered client session. Deregisters itself on drop.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    addr: SocketAddr,
    registry: Arc<SessionRegistry>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
