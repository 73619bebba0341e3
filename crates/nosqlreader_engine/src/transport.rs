//! Transport layer abstraction for the DataReader endpoints.

use crate::error::{ReaderError, ReaderResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A reader transport performs the three calls the poll loop needs.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-memory servers, mocks for testing).
/// Each call is a suspension point of the poll loop.
pub trait ReaderTransport: Send + Sync + 'static {
    /// Opens a session, returning its id.
    fn greeting(
        &self,
        app_name: &str,
        app_version: &str,
    ) -> impl Future<Output = ReaderResult<String>> + Send;

    /// Declares interest in a table for a session.
    fn subscribe(
        &self,
        session_id: &str,
        table_name: &str,
    ) -> impl Future<Output = ReaderResult<()>> + Send;

    /// Fetches the next change batch for a session, as raw wire bytes.
    fn get_changes(&self, session_id: &str) -> impl Future<Output = ReaderResult<Vec<u8>>> + Send;
}

/// A call observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// Greeting call.
    Greeting {
        /// Application name.
        app_name: String,
        /// Client version.
        app_version: String,
    },
    /// Subscribe call.
    Subscribe {
        /// Session id.
        session_id: String,
        /// Table name.
        table_name: String,
    },
    /// Change fetch.
    GetChanges {
        /// Session id.
        session_id: String,
    },
}

/// A scripted transport for testing.
///
/// Queued results are consumed in order. When a queue is empty the mock
/// falls back to a default: greetings issue `session-1`, `session-2`, …,
/// subscribes succeed, and change fetches wait `idle_delay` and return an
/// empty batch.
#[derive(Debug)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    greetings: Mutex<VecDeque<ReaderResult<String>>>,
    subscribes: Mutex<VecDeque<ReaderResult<()>>>,
    batches: Mutex<VecDeque<ReaderResult<Vec<u8>>>>,
    next_session: AtomicU64,
    idle_delay: Duration,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            greetings: Mutex::new(VecDeque::new()),
            subscribes: Mutex::new(VecDeque::new()),
            batches: Mutex::new(VecDeque::new()),
            next_session: AtomicU64::new(1),
            idle_delay: Duration::from_millis(5),
        }
    }

    /// Sets how long an empty change fetch waits before returning.
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    /// Queues the result of the next unscripted greeting.
    pub fn push_greeting(&self, result: ReaderResult<String>) {
        self.greetings.lock().push_back(result);
    }

    /// Queues the result of the next subscribe call.
    pub fn push_subscribe(&self, result: ReaderResult<()>) {
        self.subscribes.lock().push_back(result);
    }

    /// Queues a change batch.
    pub fn push_batch(&self, batch: Vec<u8>) {
        self.batches.lock().push_back(Ok(batch));
    }

    /// Queues a failing change fetch.
    pub fn push_batch_error(&self, error: ReaderError) {
        self.batches.lock().push_back(Err(error));
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// Number of greeting calls made.
    pub fn greeting_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, TransportCall::Greeting { .. }))
            .count()
    }

    /// Returns `(session, table)` for every subscribe call, in order.
    pub fn subscriptions(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                TransportCall::Subscribe {
                    session_id,
                    table_name,
                } => Some((session_id.clone(), table_name.clone())),
                _ => None,
            })
            .collect()
    }

    /// Number of scripted batches not yet fetched.
    pub fn pending_batches(&self) -> usize {
        self.batches.lock().len()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderTransport for MockTransport {
    async fn greeting(&self, app_name: &str, app_version: &str) -> ReaderResult<String> {
        self.record(TransportCall::Greeting {
            app_name: app_name.to_string(),
            app_version: app_version.to_string(),
        });
        let scripted = self.greetings.lock().pop_front();
        scripted.unwrap_or_else(|| {
            let n = self.next_session.fetch_add(1, Ordering::SeqCst);
            Ok(format!("session-{n}"))
        })
    }

    async fn subscribe(&self, session_id: &str, table_name: &str) -> ReaderResult<()> {
        self.record(TransportCall::Subscribe {
            session_id: session_id.to_string(),
            table_name: table_name.to_string(),
        });
        let scripted = self.subscribes.lock().pop_front();
        scripted.unwrap_or(Ok(()))
    }

    async fn get_changes(&self, session_id: &str) -> ReaderResult<Vec<u8>> {
        self.record(TransportCall::GetChanges {
            session_id: session_id.to_string(),
        });
        let scripted = self.batches.lock().pop_front();
        match scripted {
            Some(result) => result,
            None => {
                tokio::time::sleep(self.idle_delay).await;
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_defaults() {
        let transport = MockTransport::new();

        assert_eq!(transport.greeting("app", "1").await.unwrap(), "session-1");
        assert_eq!(transport.greeting("app", "1").await.unwrap(), "session-2");
        transport.subscribe("session-2", "orders").await.unwrap();
        assert!(transport.get_changes("session-2").await.unwrap().is_empty());

        assert_eq!(transport.greeting_count(), 2);
        assert_eq!(
            transport.subscriptions(),
            vec![("session-2".to_string(), "orders".to_string())]
        );
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn mock_transport_scripted_results() {
        let transport = MockTransport::new();
        transport.push_greeting(Ok("fixed".into()));
        transport.push_subscribe(Err(ReaderError::Transport("503".into())));
        transport.push_batch(vec![1, 2, 3]);
        transport.push_batch_error(ReaderError::Transport("reset".into()));

        assert_eq!(transport.greeting("app", "1").await.unwrap(), "fixed");
        assert!(transport.subscribe("fixed", "orders").await.is_err());
        assert_eq!(transport.get_changes("fixed").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(transport.pending_batches(), 1);
        assert!(transport.get_changes("fixed").await.is_err());
        assert_eq!(transport.pending_batches(), 0);
    }
}
