//! Event and batch fixtures.

use nosqlreader_protocol::{BatchWriter, OwnedSyncEvent, SyncEventType};

/// Builds an `InitTable` event.
pub fn init_table(table: &str, payload: impl Into<Vec<u8>>) -> OwnedSyncEvent {
    OwnedSyncEvent::new(table, SyncEventType::InitTable, payload)
}

/// Builds an `InitPartitions` event.
pub fn init_partitions(table: &str, payload: impl Into<Vec<u8>>) -> OwnedSyncEvent {
    OwnedSyncEvent::new(table, SyncEventType::InitPartitions, payload)
}

/// Builds an `UpdateRows` event.
pub fn update_rows(table: &str, payload: impl Into<Vec<u8>>) -> OwnedSyncEvent {
    OwnedSyncEvent::new(table, SyncEventType::UpdateRows, payload)
}

/// Builds a `DeleteRows` event.
pub fn delete_rows(table: &str, payload: impl Into<Vec<u8>>) -> OwnedSyncEvent {
    OwnedSyncEvent::new(table, SyncEventType::DeleteRows, payload)
}

/// Encodes events into one change batch.
///
/// # Panics
///
/// Panics if an event does not fit the wire format (header over 255 bytes).
pub fn encode_batch(events: &[OwnedSyncEvent]) -> Vec<u8> {
    let mut writer = BatchWriter::new();
    for event in events {
        writer
            .push(&event.as_event())
            .expect("fixture event must fit the wire format");
    }
    writer.finish()
}

/// The reference record: `initTable=Foo` with payload `01 02 03`.
pub fn reference_record() -> Vec<u8> {
    let mut bytes = vec![13u8];
    bytes.extend_from_slice(b"initTable=Foo");
    bytes.extend_from_slice(&3i32.to_le_bytes());
    bytes.extend_from_slice(&[0x01, 0x02, 0x03]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosqlreader_protocol::decode_all;

    #[test]
    fn reference_record_matches_encoder() {
        assert_eq!(
            encode_batch(&[init_table("Foo", vec![0x01, 0x02, 0x03])]),
            reference_record()
        );
    }

    #[test]
    fn builders_set_event_type() {
        let events = [
            init_table("t", "[]"),
            init_partitions("t", "{}"),
            update_rows("t", "[1]"),
            delete_rows("t", "[2]"),
        ];
        let batch = encode_batch(&events);
        let decoded = decode_all(&batch).unwrap();
        assert_eq!(
            decoded.iter().map(|e| e.event_type).collect::<Vec<_>>(),
            SyncEventType::ALL.to_vec()
        );
    }
}
