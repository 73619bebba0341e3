//! Subscription registry.

use crate::error::{ReaderError, ReaderResult};
use crate::sink::TableSink;
use nosqlreader_protocol::SyncEvent;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Handle returned for a registered subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    table_name: String,
    position: usize,
}

impl SubscriptionHandle {
    /// Subscribed table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Registration order (0-based); subscribe declarations follow it.
    pub fn position(&self) -> usize {
        self.position
    }
}

struct Subscription {
    table_name: String,
    sink: Arc<dyn TableSink>,
}

/// Maps table names to sinks.
///
/// Written before the connection starts, read-only afterwards.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: Vec<Subscription>,
    by_table: HashMap<String, usize>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sink for a table.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSubscription` if the table is already registered.
    pub fn register(
        &mut self,
        table_name: impl Into<String>,
        sink: Arc<dyn TableSink>,
    ) -> ReaderResult<SubscriptionHandle> {
        let table_name = table_name.into();
        if self.by_table.contains_key(&table_name) {
            return Err(ReaderError::DuplicateSubscription(table_name));
        }

        let position = self.subscriptions.len();
        self.by_table.insert(table_name.clone(), position);
        self.subscriptions.push(Subscription {
            table_name: table_name.clone(),
            sink,
        });

        Ok(SubscriptionHandle {
            table_name,
            position,
        })
    }

    /// Delivers an event to its table's sink.
    ///
    /// Returns `Ok(false)` when no sink is registered for the table; such
    /// events are dropped.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error.
    pub fn dispatch(&self, event: &SyncEvent<'_>) -> ReaderResult<bool> {
        match self.sink(event.table_name) {
            Some(sink) => {
                sink.apply_event(event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns the sink registered for a table.
    pub fn sink(&self, table_name: &str) -> Option<&Arc<dyn TableSink>> {
        self.by_table
            .get(table_name)
            .map(|&i| &self.subscriptions[i].sink)
    }

    /// Returns true if the table is registered.
    pub fn contains(&self, table_name: &str) -> bool {
        self.by_table.contains_key(table_name)
    }

    /// Registered table names, in registration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.iter().map(|s| s.table_name.as_str())
    }

    /// Number of registered tables.
    pub fn count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("tables", &self.table_names().collect::<Vec<_>>())
            .finish()
    }
}
