//! Public connection object.

use crate::config::ReaderConfig;
use crate::error::{ReaderError, ReaderResult};
use crate::poll::PollLoop;
use crate::registry::{SubscriptionHandle, SubscriptionRegistry};
use crate::session::SessionManager;
use crate::sink::{MemoryTableSink, TableSink};
use crate::state::{ConnectionState, ConnectionStats, SharedStatus};
use crate::transport::ReaderTransport;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Registry lifecycle. `Frozen` doubles as the "started" latch.
enum Registry {
    Open(SubscriptionRegistry),
    Frozen(Arc<SubscriptionRegistry>),
}

/// A connection that mirrors remote tables into local sinks.
///
/// Register every table with [`subscribe`](Self::subscribe), then call
/// [`start`](Self::start) once. The poll loop runs on the Tokio runtime
/// until [`shutdown`](Self::shutdown) is called or the connection is
/// dropped.
///
/// # Example
///
/// ```rust,ignore
/// let connection = DataReaderConnection::new(config, transport);
/// let orders = connection.subscribe_memory("orders")?;
/// connection.start()?;
/// // ...
/// connection.shutdown().await;
/// ```
pub struct DataReaderConnection<T: ReaderTransport> {
    config: ReaderConfig,
    transport: Arc<T>,
    session: Arc<SessionManager>,
    status: Arc<SharedStatus>,
    registry: Mutex<Registry>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: ReaderTransport> DataReaderConnection<T> {
    /// Creates a connection. Nothing happens until [`start`](Self::start).
    pub fn new(config: ReaderConfig, transport: T) -> Self {
        let session = SessionManager::new(config.app_name.clone(), config.app_version.clone());
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            transport: Arc::new(transport),
            session: Arc::new(session),
            status: Arc::new(SharedStatus::new()),
            registry: Mutex::new(Registry::Open(SubscriptionRegistry::new())),
            shutdown,
            task: Mutex::new(None),
        }
    }

    /// Registers a sink for a table.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSubscription` if the table is already registered
    /// and `SubscribeAfterStart` once the connection has started.
    pub fn subscribe(
        &self,
        table_name: impl Into<String>,
        sink: Arc<dyn TableSink>,
    ) -> ReaderResult<SubscriptionHandle> {
        let table_name = table_name.into();
        match &mut *self.registry.lock() {
            Registry::Open(registry) => registry.register(table_name, sink),
            Registry::Frozen(_) => Err(ReaderError::SubscribeAfterStart(table_name)),
        }
    }

    /// Registers a [`MemoryTableSink`] for a table and returns it.
    ///
    /// # Errors
    ///
    /// Same as [`subscribe`](Self::subscribe).
    pub fn subscribe_memory(
        &self,
        table_name: impl Into<String>,
    ) -> ReaderResult<Arc<MemoryTableSink>> {
        let sink = Arc::new(MemoryTableSink::new());
        self.subscribe(table_name, sink.clone())?;
        Ok(sink)
    }

    /// Starts the poll loop on the current Tokio runtime.
    ///
    /// Concurrent calls race safely: the first one wins.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyStarted` on a second call, `NoSubscriptions` if no
    /// table is registered and `NoRuntime` outside a Tokio runtime.
    pub fn start(&self) -> ReaderResult<()> {
        let mut registry = self.registry.lock();
        let (frozen, runtime) = match &mut *registry {
            Registry::Frozen(_) => return Err(ReaderError::AlreadyStarted),
            Registry::Open(open) => {
                if open.is_empty() {
                    return Err(ReaderError::NoSubscriptions);
                }
                let runtime =
                    tokio::runtime::Handle::try_current().map_err(|_| ReaderError::NoRuntime)?;
                (Arc::new(std::mem::take(open)), runtime)
            }
        };
        *registry = Registry::Frozen(Arc::clone(&frozen));

        info!(
            app = %self.config.app_name,
            version = %self.config.app_version,
            tables = frozen.count(),
            "starting reader connection"
        );

        let poll_loop = PollLoop {
            transport: Arc::clone(&self.transport),
            registry: frozen,
            session: Arc::clone(&self.session),
            status: Arc::clone(&self.status),
            reconnect_delay: self.config.reconnect_delay,
            shutdown: self.shutdown.subscribe(),
        };
        self.status.set_state(ConnectionState::AcquiringSession);
        *self.task.lock() = Some(runtime.spawn(poll_loop.run()));
        Ok(())
    }

    /// Stops the poll loop and waits for it to finish.
    ///
    /// The loop observes the request at its next suspension point. Calling
    /// this before `start()` makes a later start exit immediately.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "connect loop task failed");
            }
        }
    }

    /// Returns true once `start()` has succeeded.
    pub fn is_started(&self) -> bool {
        matches!(*self.registry.lock(), Registry::Frozen(_))
    }

    /// Number of registered tables.
    pub fn subscription_count(&self) -> usize {
        match &*self.registry.lock() {
            Registry::Open(registry) => registry.count(),
            Registry::Frozen(registry) => registry.count(),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> ConnectionState {
        self.status.state()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> ConnectionStats {
        self.status.stats()
    }

    /// Returns the current session id.
    pub fn session_id(&self) -> Option<String> {
        self.session.current()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}
