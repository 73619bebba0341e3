//! Watch command implementation.

use crate::client::ReqwestClient;
use nosqlreader_engine::{
    DataReaderConnection, HttpTransport, ReaderConfig, ReaderResult, SyncEvent, TableSink,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Arguments of the watch command.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Server base URL.
    pub host: String,
    /// Tables to subscribe to, in order.
    pub tables: Vec<String>,
    pub app_name: String,
    pub app_version: String,
    pub reconnect_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Stop after this many seconds; `None` waits for Ctrl-C.
    pub duration_secs: Option<u64>,
    /// Log payload text instead of sizes.
    pub payloads: bool,
}

/// Sink that logs every event it receives.
#[derive(Debug)]
struct LogSink {
    payloads: bool,
    received: AtomicU64,
}

impl LogSink {
    fn new(payloads: bool) -> Self {
        Self {
            payloads,
            received: AtomicU64::new(0),
        }
    }

    fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

impl TableSink for LogSink {
    fn apply_event(&self, event: &SyncEvent<'_>) -> ReaderResult<()> {
        self.received.fetch_add(1, Ordering::Relaxed);
        if self.payloads {
            info!(
                table = event.table_name,
                event = %event.event_type,
                payload = %String::from_utf8_lossy(event.payload),
                "event"
            );
        } else {
            info!(
                table = event.table_name,
                event = %event.event_type,
                bytes = event.payload.len(),
                "event"
            );
        }
        Ok(())
    }
}

/// Runs the watch command until Ctrl-C or the requested duration elapses.
pub fn run(options: WatchOptions) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(watch(options))
}

async fn watch(options: WatchOptions) -> Result<(), Box<dyn std::error::Error>> {
    let client = ReqwestClient::new(Duration::from_secs(options.request_timeout_secs))?;
    let transport = HttpTransport::new(options.host.clone(), client);
    let config = ReaderConfig::new(options.app_name, options.app_version)
        .with_reconnect_delay(Duration::from_millis(options.reconnect_delay_ms));

    let connection = DataReaderConnection::new(config, transport);
    let mut sinks = Vec::with_capacity(options.tables.len());
    for table in &options.tables {
        let sink = Arc::new(LogSink::new(options.payloads));
        connection.subscribe(table.clone(), sink.clone())?;
        sinks.push((table.clone(), sink));
    }

    connection.start()?;
    info!(host = %options.host, tables = ?options.tables, "watching");

    match options.duration_secs {
        Some(secs) => {
            tokio::select! {
                result = tokio::signal::ctrl_c() => result?,
                () = tokio::time::sleep(Duration::from_secs(secs)) => {}
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    connection.shutdown().await;

    let stats = connection.stats();
    println!("Watch Summary");
    println!("=============");
    println!("Sessions:         {}", stats.sessions_acquired);
    println!("Batches:          {}", stats.batches_received);
    println!("Events applied:   {}", stats.events_dispatched);
    println!("Events dropped:   {}", stats.events_dropped);
    println!("Failures:         {}", stats.failures);
    if let Some(error) = &stats.last_error {
        println!("Last error:       {error}");
    }
    for (table, sink) in &sinks {
        println!("  {table}: {} events", sink.received());
    }

    Ok(())
}
