//! The poll loop: acquire session → subscribe → stream → back off.

use crate::error::{ReaderError, ReaderResult};
use crate::registry::SubscriptionRegistry;
use crate::session::SessionManager;
use crate::state::{BatchOutcome, ConnectionState, SharedStatus};
use crate::transport::ReaderTransport;
use nosqlreader_protocol::decode;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

/// Runs `fut` unless shutdown is requested first.
///
/// A dropped shutdown sender counts as a shutdown request.
async fn until_shutdown<F: Future>(
    shutdown: &mut watch::Receiver<bool>,
    fut: F,
) -> ReaderResult<F::Output> {
    tokio::select! {
        biased;
        _ = shutdown.wait_for(|stop| *stop) => Err(ReaderError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Background task driving one connection.
pub(crate) struct PollLoop<T: ReaderTransport> {
    pub(crate) transport: Arc<T>,
    pub(crate) registry: Arc<SubscriptionRegistry>,
    pub(crate) session: Arc<SessionManager>,
    pub(crate) status: Arc<SharedStatus>,
    pub(crate) reconnect_delay: Duration,
    pub(crate) shutdown: watch::Receiver<bool>,
}

impl<T: ReaderTransport> PollLoop<T> {
    /// Runs until shutdown. Every failure is logged, then retried after the
    /// reconnect delay.
    pub(crate) async fn run(mut self) {
        info!(tables = self.registry.count(), "connect loop started");

        loop {
            let error = match self.run_session().await {
                Ok(never) => match never {},
                Err(ReaderError::Cancelled) => break,
                Err(e) => e,
            };

            error!(state = ?self.status.state(), error = %error, "connect loop failed");
            self.status.record_failure(&error);
            self.status.set_state(ConnectionState::BackingOff);

            let delay = tokio::time::sleep(self.reconnect_delay);
            if until_shutdown(&mut self.shutdown, delay).await.is_err() {
                break;
            }
        }

        self.status.set_state(ConnectionState::Stopped);
        info!("connect loop stopped");
    }

    /// One pass through the state machine. Only returns on failure.
    async fn run_session(&mut self) -> ReaderResult<Infallible> {
        self.status.set_state(ConnectionState::AcquiringSession);
        let session_id = match self.session.current() {
            Some(id) => id,
            None => {
                let acquire = self.session.acquire(self.transport.as_ref());
                let id = until_shutdown(&mut self.shutdown, acquire).await??;
                self.status.record_session();
                id
            }
        };

        // A subscribe failure keeps the session; the next pass reuses it.
        self.status.set_state(ConnectionState::Subscribing);
        for table_name in self.registry.table_names() {
            let subscribe = self.transport.subscribe(&session_id, table_name);
            until_shutdown(&mut self.shutdown, subscribe).await??;
            debug!(session = %session_id, table = table_name, "subscribed");
        }

        self.status.set_state(ConnectionState::Streaming);
        let result = self.stream(&session_id).await;

        self.session.invalidate();
        info!(session = %session_id, "session is disconnected");
        result
    }

    /// Fetches and applies batches until something fails.
    async fn stream(&mut self, session_id: &str) -> ReaderResult<Infallible> {
        loop {
            let fetch = self.transport.get_changes(session_id);
            let batch = until_shutdown(&mut self.shutdown, fetch).await??;
            self.apply_batch(&batch)?;
        }
    }

    /// Decodes a batch and dispatches its events in order.
    fn apply_batch(&self, batch: &[u8]) -> ReaderResult<()> {
        let mut outcome = BatchOutcome::default();
        let result = self.dispatch_all(batch, &mut outcome);
        self.status.record_batch(outcome);
        debug!(
            bytes = batch.len(),
            dispatched = outcome.dispatched,
            dropped = outcome.dropped,
            "applied change batch"
        );
        result
    }

    fn dispatch_all(&self, batch: &[u8], outcome: &mut BatchOutcome) -> ReaderResult<()> {
        for event in decode(batch) {
            let event = event?;
            if self.registry.dispatch(&event)? {
                outcome.dispatched += 1;
            } else {
                trace!(table = event.table_name, "dropping event for unsubscribed table");
                outcome.dropped += 1;
            }
        }
        Ok(())
    }
}
