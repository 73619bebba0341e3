//! Session manager.

use crate::error::{ReaderError, ReaderResult};
use crate::transport::ReaderTransport;
use parking_lot::Mutex;
use tracing::info;

/// Owns the current session id.
///
/// At most one session is current. The manager never retries; the poll
/// loop decides when to call [`acquire`](Self::acquire) again.
#[derive(Debug)]
pub struct SessionManager {
    app_name: String,
    app_version: String,
    current: Mutex<Option<String>>,
}

impl SessionManager {
    /// Creates a manager with no current session.
    pub fn new(app_name: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            current: Mutex::new(None),
        }
    }

    /// Application name sent with the greeting.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Client version sent with the greeting.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Opens a new session through the greeting exchange and makes it current.
    ///
    /// # Errors
    ///
    /// Returns `Session` if the greeting fails or yields no usable id.
    pub async fn acquire<T: ReaderTransport>(&self, transport: &T) -> ReaderResult<String> {
        let session_id = transport
            .greeting(&self.app_name, &self.app_version)
            .await
            .map_err(|e| match e {
                ReaderError::Session(_) => e,
                other => ReaderError::Session(other.to_string()),
            })?;

        if session_id.trim().is_empty() {
            return Err(ReaderError::Session("server issued an empty session id".into()));
        }

        *self.current.lock() = Some(session_id.clone());
        info!(session = %session_id, "new session");
        Ok(session_id)
    }

    /// Returns the current session id.
    pub fn current(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Clears the current session, returning it. Idempotent.
    pub fn invalidate(&self) -> Option<String> {
        self.current.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportCall};

    #[tokio::test]
    async fn acquire_sets_current() {
        let transport = MockTransport::new();
        let manager = SessionManager::new("billing", "1.0.0");
        assert!(manager.current().is_none());

        let id = manager.acquire(&transport).await.unwrap();
        assert_eq!(manager.current(), Some(id));
        assert_eq!(
            transport.calls(),
            vec![TransportCall::Greeting {
                app_name: "billing".into(),
                app_version: "1.0.0".into(),
            }]
        );
    }

    #[tokio::test]
    async fn acquire_failure_is_session_error() {
        let transport = MockTransport::new();
        transport.push_greeting(Err(ReaderError::Transport("connection refused".into())));
        let manager = SessionManager::new("billing", "1.0.0");

        let err = manager.acquire(&transport).await.unwrap_err();
        assert!(matches!(err, ReaderError::Session(ref m) if m.contains("connection refused")));
        assert!(manager.current().is_none());
    }

    #[tokio::test]
    async fn empty_session_id_is_rejected() {
        let transport = MockTransport::new();
        transport.push_greeting(Ok(String::new()));
        let manager = SessionManager::new("billing", "1.0.0");

        assert!(matches!(
            manager.acquire(&transport).await,
            Err(ReaderError::Session(_))
        ));
        assert!(manager.current().is_none());
    }

    #[tokio::test]
    async fn invalidate_is_idempotent() {
        let transport = MockTransport::new();
        let manager = SessionManager::new("billing", "1.0.0");
        let id = manager.acquire(&transport).await.unwrap();

        assert_eq!(manager.invalidate(), Some(id));
        assert_eq!(manager.invalidate(), None);
        assert!(manager.current().is_none());
    }
}
