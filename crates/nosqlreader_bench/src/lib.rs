//! Benchmark utilities.

use nosqlreader_protocol::{encode_events, OwnedSyncEvent, SyncEventType};
use rand::Rng;

/// Generate random payload bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate events spread over `tables` tables with random types.
pub fn generate_events(count: usize, tables: usize, payload_size: usize) -> Vec<OwnedSyncEvent> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let event_type = SyncEventType::ALL[rng.gen_range(0..SyncEventType::ALL.len())];
            OwnedSyncEvent::new(
                format!("table_{}", i % tables.max(1)),
                event_type,
                random_data(payload_size),
            )
        })
        .collect()
}

/// Encode generated events into one change batch.
pub fn generate_batch(count: usize, payload_size: usize) -> Vec<u8> {
    let events = generate_events(count, 8, payload_size);
    encode_events(events.iter().map(OwnedSyncEvent::as_event)).unwrap_or_default()
}
