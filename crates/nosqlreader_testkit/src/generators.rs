//! Property-based test generators using proptest.
//!
//! Strategies produce events that always fit the wire format: table names
//! never contain `=` and headers stay under the length limit.

use nosqlreader_protocol::{OwnedSyncEvent, SyncEventType};
use proptest::prelude::*;

/// Strategy for generating event types.
pub fn event_type_strategy() -> impl Strategy<Value = SyncEventType> {
    prop::sample::select(SyncEventType::ALL.to_vec())
}

/// Strategy for generating table names.
pub fn table_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_\\-]{0,47}").expect("Invalid regex")
}

/// Strategy for generating payloads (arbitrary bytes).
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for generating a JSON-ish row payload.
pub fn json_rows_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(("[a-z]{1,8}", any::<i64>()), 0..8).prop_map(|rows| {
        let items: Vec<String> = rows
            .iter()
            .map(|(key, value)| format!("{{\"{key}\":{value}}}"))
            .collect();
        format!("[{}]", items.join(",")).into_bytes()
    })
}

/// Strategy for generating a single event.
pub fn sync_event_strategy() -> impl Strategy<Value = OwnedSyncEvent> {
    (table_name_strategy(), event_type_strategy(), payload_strategy())
        .prop_map(|(table, event_type, payload)| OwnedSyncEvent::new(table, event_type, payload))
}

/// Strategy for generating an ordered batch of events.
pub fn batch_strategy(max_events: usize) -> impl Strategy<Value = Vec<OwnedSyncEvent>> {
    prop::collection::vec(sync_event_strategy(), 0..=max_events)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
