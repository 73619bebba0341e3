//! Connection state and statistics.

use crate::error::ReaderError;
use parking_lot::RwLock;
use std::time::Instant;

/// Where the poll loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// `start()` has not been called.
    NotStarted,
    /// Performing the greeting exchange.
    AcquiringSession,
    /// Declaring subscriptions for the current session.
    Subscribing,
    /// Fetching and applying change batches.
    Streaming,
    /// Waiting after a failure before reconnecting.
    BackingOff,
    /// The loop ended after a shutdown request.
    Stopped,
}

impl ConnectionState {
    /// Returns true while the poll loop is alive.
    pub fn is_running(&self) -> bool {
        !matches!(self, ConnectionState::NotStarted | ConnectionState::Stopped)
    }

    /// Returns true if the loop is talking to the server.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionState::AcquiringSession
                | ConnectionState::Subscribing
                | ConnectionState::Streaming
        )
    }
}

/// Statistics about the connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStats {
    /// Sessions opened.
    pub sessions_acquired: u64,
    /// Change batches fetched and decoded.
    pub batches_received: u64,
    /// Events delivered to a sink.
    pub events_dispatched: u64,
    /// Events for tables without a subscription.
    pub events_dropped: u64,
    /// Loop failures (each one triggers a back-off).
    pub failures: u64,
    /// Last failure message.
    pub last_error: Option<String>,
    /// When the last batch was received.
    pub last_batch_time: Option<Instant>,
}

/// Dispatch counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BatchOutcome {
    pub(crate) dispatched: u64,
    pub(crate) dropped: u64,
}

/// State shared between the connection handle and its poll loop.
#[derive(Debug)]
pub(crate) struct SharedStatus {
    state: RwLock<ConnectionState>,
    stats: RwLock<ConnectionStats>,
}

impl SharedStatus {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::NotStarted),
            stats: RwLock::new(ConnectionStats::default()),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    pub(crate) fn stats(&self) -> ConnectionStats {
        self.stats.read().clone()
    }

    pub(crate) fn record_session(&self) {
        self.stats.write().sessions_acquired += 1;
    }

    pub(crate) fn record_batch(&self, outcome: BatchOutcome) {
        let mut stats = self.stats.write();
        stats.batches_received += 1;
        stats.events_dispatched += outcome.dispatched;
        stats.events_dropped += outcome.dropped;
        stats.last_batch_time = Some(Instant::now());
    }

    pub(crate) fn record_failure(&self, error: &ReaderError) {
        let mut stats = self.stats.write();
        stats.failures += 1;
        stats.last_error = Some(error.to_string());
    }
}
