//! Change-batch decoder.

use crate::error::{ProtocolError, ProtocolResult};
use crate::event::{SyncEvent, SyncEventType};
use std::iter::FusedIterator;

/// Decodes a change batch lazily.
///
/// The returned reader yields one `ProtocolResult<SyncEvent>` per record in
/// buffer order. Reaching the end of the buffer on a record boundary ends
/// the sequence; any other shortfall is an error. After the first error the
/// reader yields nothing more.
pub fn decode(buffer: &[u8]) -> SyncEventReader<'_> {
    SyncEventReader::new(buffer)
}

/// Decodes a whole change batch, failing on the first malformed record.
///
/// # Errors
///
/// Returns the first [`ProtocolError`] encountered.
pub fn decode_all(buffer: &[u8]) -> ProtocolResult<Vec<SyncEvent<'_>>> {
    decode(buffer).collect()
}

/// Parses a record header of the form `eventType=tableName`.
///
/// The split happens at the first `=`, so the table name may itself contain
/// `=` and may be empty.
///
/// # Errors
///
/// Returns `MalformedHeader` if there is no `=` and `UnknownEventType` if the
/// token before it is not one of the four event types.
pub fn parse_header(header: &str) -> ProtocolResult<(SyncEventType, &str)> {
    let (token, table_name) = header
        .split_once('=')
        .ok_or_else(|| ProtocolError::MalformedHeader(header.to_string()))?;
    let event_type = SyncEventType::from_token(token)?;
    Ok((event_type, table_name))
}

/// A cursor over the records of one change batch.
#[derive(Debug, Clone)]
pub struct SyncEventReader<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> SyncEventReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Byte offset of the next record.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns true once the batch is exhausted or a record failed to decode.
    pub fn is_finished(&self) -> bool {
        self.failed || self.pos >= self.data.len()
    }

    /// Reads the next record.
    ///
    /// Returns `Ok(None)` at a clean end of batch.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for truncated or malformed records.
    pub fn read_event(&mut self) -> ProtocolResult<Option<SyncEvent<'a>>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }

        let header_len = usize::from(self.read_byte()?);
        let header_bytes = self.read_bytes(header_len, "header")?;
        let header = std::str::from_utf8(header_bytes).map_err(|_| ProtocolError::InvalidUtf8)?;
        let (event_type, table_name) = parse_header(header)?;

        let declared = self.read_i32_le()?;
        let payload_len =
            usize::try_from(declared).map_err(|_| ProtocolError::NegativeLength(declared))?;
        let payload = self.read_bytes(payload_len, "payload")?;

        Ok(Some(SyncEvent::new(table_name, event_type, payload)))
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    #[inline]
    fn read_byte(&mut self) -> ProtocolResult<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(ProtocolError::UnexpectedEof {
                context: "header length",
                needed: 1,
                available: 0,
            })?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize, context: &'static str) -> ProtocolResult<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(ProtocolError::UnexpectedEof {
                context,
                needed: len,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    #[inline]
    fn read_i32_le(&mut self) -> ProtocolResult<i32> {
        let bytes = self.read_bytes(4, "payload length")?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl<'a> Iterator for SyncEventReader<'a> {
    type Item = ProtocolResult<SyncEvent<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for SyncEventReader<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BatchWriter;
    use crate::event::OwnedSyncEvent;
    use proptest::prelude::*;

    fn record(header: &[u8], declared_len: i32, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![header.len() as u8];
        buf.extend_from_slice(header);
        buf.extend_from_slice(&declared_len.to_le_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn decodes_single_record() {
        let buf = record(b"initTable=Foo", 3, &[0x01, 0x02, 0x03]);

        let mut reader = decode(&buf);
        let event = reader.next().unwrap().unwrap();
        assert_eq!(event.table_name, "Foo");
        assert_eq!(event.event_type, SyncEventType::InitTable);
        assert_eq!(event.payload, &[0x01, 0x02, 0x03]);
        assert!(reader.next().is_none());
        assert_eq!(reader.position(), buf.len());
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        assert!(decode(&[]).next().is_none());
        assert!(decode_all(&[]).unwrap().is_empty());
    }

    #[test]
    fn preserves_record_order() {
        let mut buf = record(b"initTable=a", 1, &[1]);
        buf.extend(record(b"updateRows=b", 2, &[2, 2]));
        buf.extend(record(b"deleteRows=a", 0, &[]));
        buf.extend(record(b"initPartitions=c", 1, &[3]));

        let events = decode_all(&buf).unwrap();
        let summary: Vec<_> = events
            .iter()
            .map(|e| (e.table_name, e.event_type, e.payload.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a", SyncEventType::InitTable, 1),
                ("b", SyncEventType::UpdateRows, 2),
                ("a", SyncEventType::DeleteRows, 0),
                ("c", SyncEventType::InitPartitions, 1),
            ]
        );
    }

    #[test]
    fn payload_does_not_overlap_next_record() {
        let mut buf = record(b"updateRows=t", 2, &[0xAA, 0xBB]);
        buf.extend(record(b"updateRows=t", 1, &[0xCC]));

        let events = decode_all(&buf).unwrap();
        assert_eq!(events[0].payload, &[0xAA, 0xBB]);
        assert_eq!(events[1].payload, &[0xCC]);
    }

    #[test]
    fn truncated_payload_is_error() {
        let mut buf = record(b"updateRows=t", 10, &[1, 2, 3]);
        let mut reader = decode(&buf);
        assert_eq!(
            reader.next().unwrap(),
            Err(ProtocolError::UnexpectedEof {
                context: "payload",
                needed: 10,
                available: 3,
            })
        );
        assert!(reader.next().is_none());

        // A complete record before the truncated one is still yielded first.
        let mut prefixed = record(b"initTable=t", 0, &[]);
        prefixed.append(&mut buf);
        let results: Vec<_> = decode(&prefixed).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn truncated_length_prefix_is_error() {
        let mut buf = vec![12u8];
        buf.extend_from_slice(b"updateRows=t");
        buf.extend_from_slice(&[0x01, 0x00]);

        let err = decode_all(&buf).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedEof {
                context: "payload length",
                ..
            }
        ));
    }

    #[test]
    fn truncated_header_is_error() {
        let buf = [20u8, b'i', b'n'];
        let err = decode_all(&buf).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnexpectedEof {
                context: "header",
                needed: 20,
                available: 2,
            }
        );
    }

    #[test]
    fn zero_length_header_is_malformed() {
        let buf = record(b"", 0, &[]);
        let err = decode_all(&buf).unwrap_err();
        assert_eq!(err, ProtocolError::MalformedHeader(String::new()));
    }

    #[test]
    fn header_without_separator_is_malformed() {
        let buf = record(b"initTable", 0, &[]);
        assert!(matches!(
            decode_all(&buf),
            Err(ProtocolError::MalformedHeader(_))
        ));
    }

    #[test]
    fn unknown_token_is_error() {
        let buf = record(b"dropTable=t", 0, &[]);
        assert_eq!(
            decode_all(&buf).unwrap_err(),
            ProtocolError::UnknownEventType("dropTable".into())
        );
    }

    #[test]
    fn negative_length_is_error() {
        let buf = record(b"updateRows=t", -1, &[]);
        assert_eq!(
            decode_all(&buf).unwrap_err(),
            ProtocolError::NegativeLength(-1)
        );
    }

    #[test]
    fn invalid_utf8_header_is_error() {
        let buf = record(&[0xFF, b'=', b't'], 0, &[]);
        assert_eq!(decode_all(&buf).unwrap_err(), ProtocolError::InvalidUtf8);
    }

    #[test]
    fn header_split_at_first_separator() {
        assert_eq!(
            parse_header("updateRows=a=b").unwrap(),
            (SyncEventType::UpdateRows, "a=b")
        );
        assert_eq!(
            parse_header("deleteRows=").unwrap(),
            (SyncEventType::DeleteRows, "")
        );
    }

    #[test]
    fn reader_is_restartable_per_buffer() {
        let buf = record(b"initTable=t", 1, &[9]);
        let first: Vec<_> = decode(&buf).map(|r| r.unwrap().to_owned_event()).collect();
        let second: Vec<_> = decode(&buf).map(|r| r.unwrap().to_owned_event()).collect();
        assert_eq!(first, second);
    }

    fn event_strategy() -> impl Strategy<Value = OwnedSyncEvent> {
        (
            prop::sample::select(SyncEventType::ALL.to_vec()),
            "[A-Za-z0-9_=-]{0,40}",
            prop::collection::vec(any::<u8>(), 0..64),
        )
            .prop_map(|(event_type, table, payload)| OwnedSyncEvent::new(table, event_type, payload))
    }

    proptest! {
        #[test]
        fn encode_then_decode_reproduces_events(
            events in prop::collection::vec(event_strategy(), 0..16)
        ) {
            let mut writer = BatchWriter::new();
            for event in &events {
                writer.push(&event.as_event()).unwrap();
            }
            let buf = writer.finish();

            let decoded: Vec<OwnedSyncEvent> = decode_all(&buf)
                .unwrap()
                .iter()
                .map(SyncEvent::to_owned_event)
                .collect();
            prop_assert_eq!(decoded, events);
        }

        #[test]
        fn truncated_batches_never_panic(
            events in prop::collection::vec(event_strategy(), 1..8),
            cut in any::<prop::sample::Index>(),
        ) {
            let mut writer = BatchWriter::new();
            for event in &events {
                writer.push(&event.as_event()).unwrap();
            }
            let buf = writer.finish();
            let end = cut.index(buf.len());

            // Whatever the cut point, decoding stops on a record boundary or errors.
            let results: Vec<_> = decode(&buf[..end]).collect();
            let ok = results.iter().filter(|r| r.is_ok()).count();
            prop_assert!(ok <= events.len());
            prop_assert!(results.iter().skip(ok).all(|r| r.is_err()));
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            for result in decode(&bytes) {
                let _ = result;
            }
        }
    }
}
