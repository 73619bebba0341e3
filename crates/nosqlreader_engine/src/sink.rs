//! Table sinks: the local side that applies decoded events.

use crate::error::ReaderResult;
use nosqlreader_protocol::{OwnedSyncEvent, SyncEvent, SyncEventType};
use parking_lot::RwLock;

/// Receives the events of one subscribed table.
///
/// Called synchronously on the poll loop, once per event, in delivery
/// order. The sink owns the interpretation of the payload. It must not
/// block for long: no further batches are fetched until it returns.
/// Returning an error ends the current session; the loop reconnects and
/// the server resends a snapshot.
pub trait TableSink: Send + Sync {
    /// Applies one event.
    fn apply_event(&self, event: &SyncEvent<'_>) -> ReaderResult<()>;
}

impl<F> TableSink for F
where
    F: Fn(&SyncEvent<'_>) -> ReaderResult<()> + Send + Sync,
{
    fn apply_event(&self, event: &SyncEvent<'_>) -> ReaderResult<()> {
        self(event)
    }
}

/// A sink that keeps a copy of every event it receives.
#[derive(Debug, Default)]
pub struct MemoryTableSink {
    events: RwLock<Vec<OwnedSyncEvent>>,
}

impl MemoryTableSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all received events.
    pub fn events(&self) -> Vec<OwnedSyncEvent> {
        self.events.read().clone()
    }

    /// Returns the event types received, in order.
    pub fn event_types(&self) -> Vec<SyncEventType> {
        self.events.read().iter().map(|e| e.event_type).collect()
    }

    /// Returns the payload of the most recent snapshot (`InitTable`), if any.
    pub fn last_snapshot(&self) -> Option<Vec<u8>> {
        self.events
            .read()
            .iter()
            .rev()
            .find(|e| e.event_type == SyncEventType::InitTable)
            .map(|e| e.payload.clone())
    }

    /// Number of received events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Forgets all received events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl TableSink for MemoryTableSink {
    fn apply_event(&self, event: &SyncEvent<'_>) -> ReaderResult<()> {
        self.events.write().push(event.to_owned_event());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReaderError;

    #[test]
    fn memory_sink_records_events() {
        let sink = MemoryTableSink::new();
        assert!(sink.is_empty());

        sink.apply_event(&SyncEvent::new("t", SyncEventType::InitTable, b"[1]"))
            .unwrap();
        sink.apply_event(&SyncEvent::new("t", SyncEventType::UpdateRows, b"[2]"))
            .unwrap();
        sink.apply_event(&SyncEvent::new("t", SyncEventType::InitTable, b"[3]"))
            .unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(
            sink.event_types(),
            vec![
                SyncEventType::InitTable,
                SyncEventType::UpdateRows,
                SyncEventType::InitTable
            ]
        );
        assert_eq!(sink.last_snapshot(), Some(b"[3]".to_vec()));

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn closures_are_sinks() {
        let sink = |event: &SyncEvent<'_>| {
            if event.payload.is_empty() {
                Err(ReaderError::sink(event.table_name, "empty payload"))
            } else {
                Ok(())
            }
        };

        assert!(sink
            .apply_event(&SyncEvent::new("t", SyncEventType::UpdateRows, b"x"))
            .is_ok());
        assert!(sink
            .apply_event(&SyncEvent::new("t", SyncEventType::UpdateRows, b""))
            .is_err());
    }
}
