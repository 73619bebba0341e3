//! Decoded synchronization events.

use crate::error::{ProtocolError, ProtocolResult};
use std::fmt;

/// Kind of change carried by a sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncEventType {
    /// Full table snapshot; replaces everything held for the table.
    InitTable,
    /// Snapshot of one or more partitions.
    InitPartitions,
    /// Rows inserted or replaced.
    UpdateRows,
    /// Rows removed.
    DeleteRows,
}

impl SyncEventType {
    /// All event types, in wire-token order.
    pub const ALL: [SyncEventType; 4] = [
        SyncEventType::InitTable,
        SyncEventType::InitPartitions,
        SyncEventType::UpdateRows,
        SyncEventType::DeleteRows,
    ];

    /// Returns the token used in the record header.
    pub fn as_token(&self) -> &'static str {
        match self {
            SyncEventType::InitTable => "initTable",
            SyncEventType::InitPartitions => "initPartitions",
            SyncEventType::UpdateRows => "updateRows",
            SyncEventType::DeleteRows => "deleteRows",
        }
    }

    /// Parses a header token. Matching is exact and case-sensitive.
    pub fn from_token(token: &str) -> ProtocolResult<Self> {
        match token {
            "initTable" => Ok(SyncEventType::InitTable),
            "initPartitions" => Ok(SyncEventType::InitPartitions),
            "updateRows" => Ok(SyncEventType::UpdateRows),
            "deleteRows" => Ok(SyncEventType::DeleteRows),
            other => Err(ProtocolError::UnknownEventType(other.to_string())),
        }
    }

    /// Returns true for the snapshot kinds (`InitTable`, `InitPartitions`).
    pub fn is_snapshot(&self) -> bool {
        matches!(self, SyncEventType::InitTable | SyncEventType::InitPartitions)
    }
}

impl fmt::Display for SyncEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// One decoded change notification.
///
/// Borrows from the batch buffer it was decoded from. The payload covers
/// exactly the bytes declared by its length prefix and is not interpreted
/// by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEvent<'a> {
    /// Table the event belongs to.
    pub table_name: &'a str,
    /// Kind of change.
    pub event_type: SyncEventType,
    /// Raw payload bytes.
    pub payload: &'a [u8],
}

impl<'a> SyncEvent<'a> {
    /// Creates a new event view.
    pub fn new(table_name: &'a str, event_type: SyncEventType, payload: &'a [u8]) -> Self {
        Self {
            table_name,
            event_type,
            payload,
        }
    }

    /// Copies the event out of its buffer.
    pub fn to_owned_event(&self) -> OwnedSyncEvent {
        OwnedSyncEvent {
            table_name: self.table_name.to_string(),
            event_type: self.event_type,
            payload: self.payload.to_vec(),
        }
    }
}

/// An owned copy of a [`SyncEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedSyncEvent {
    /// Table the event belongs to.
    pub table_name: String,
    /// Kind of change.
    pub event_type: SyncEventType,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl OwnedSyncEvent {
    /// Creates a new owned event.
    pub fn new(
        table_name: impl Into<String>,
        event_type: SyncEventType,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            event_type,
            payload: payload.into(),
        }
    }

    /// Borrows the event as a [`SyncEvent`].
    pub fn as_event(&self) -> SyncEvent<'_> {
        SyncEvent::new(&self.table_name, self.event_type, &self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_mapping() {
        for event_type in SyncEventType::ALL {
            let token = event_type.as_token();
            assert_eq!(SyncEventType::from_token(token).unwrap(), event_type);
            assert_eq!(event_type.to_string(), token);
        }
    }

    #[test]
    fn token_is_case_sensitive() {
        assert!(matches!(
            SyncEventType::from_token("InitTable"),
            Err(ProtocolError::UnknownEventType(_))
        ));
        assert!(SyncEventType::from_token("").is_err());
    }

    #[test]
    fn snapshot_kinds() {
        assert!(SyncEventType::InitTable.is_snapshot());
        assert!(SyncEventType::InitPartitions.is_snapshot());
        assert!(!SyncEventType::UpdateRows.is_snapshot());
        assert!(!SyncEventType::DeleteRows.is_snapshot());
    }

    #[test]
    fn owned_event_conversion() {
        let owned = OwnedSyncEvent::new("orders", SyncEventType::UpdateRows, vec![1, 2]);
        let view = owned.as_event();
        assert_eq!(view.table_name, "orders");
        assert_eq!(view.payload, &[1, 2]);
        assert_eq!(view.to_owned_event(), owned);
    }
}
