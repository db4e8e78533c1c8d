//! Mutual exclusion for shared broker sessions.

use std::sync::{Mutex, PoisonError};

/// Serializes access to a shared broker session.
///
/// Broker client sessions are generally not safe for unsynchronized use from
/// multiple threads, while the connectors, producers, consumers, and messages
/// created from one session all keep touching it. Every such operation
/// funnels through one `SessionSynchronizer` (shared via `Arc`), so at most
/// one session-touching operation is in flight at any time, across all
/// threads. Operations from different threads execute in some total,
/// unspecified serial order; there is no fairness guarantee.
///
/// The gate is deliberately coarse and exclusive rather than partially
/// concurrent: broker client calls behind it are expected to be short and
/// non-blocking. The wrapped operation must not call back into the same
/// synchronizer; the lock is not reentrant.
#[derive(Debug, Default)]
pub struct SessionSynchronizer {
    gate: Mutex<()>,
}

impl SessionSynchronizer {
    /// Create a synchronizer for one shared session
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` while holding the session gate.
    ///
    /// Blocks the calling thread until the gate is free, runs `op`, and
    /// releases the gate on every exit path. The result or error of `op`
    /// propagates unchanged; the gate never suppresses, retries, or times
    /// out. A panic in an earlier operation does not wedge later callers.
    pub fn atomically<T, E>(&self, op: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        op()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
