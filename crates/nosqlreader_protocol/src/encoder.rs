//! Change-batch encoder.
//!
//! Client code never sends batches; this is the inverse of the decoder,
//! used to build server responses in tests, fake servers and benchmarks.

use crate::error::{ProtocolError, ProtocolResult};
use crate::event::SyncEvent;

/// Maximum encoded header length (the prefix is one byte).
pub const MAX_HEADER_LEN: usize = u8::MAX as usize;

/// Incrementally builds a change batch.
#[derive(Debug, Default, Clone)]
pub struct BatchWriter {
    buf: Vec<u8>,
    events: usize,
}

impl BatchWriter {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns `HeaderTooLong` if `eventType=tableName` exceeds 255 bytes and
    /// `PayloadTooLarge` if the payload does not fit an `i32` length.
    pub fn push(&mut self, event: &SyncEvent<'_>) -> ProtocolResult<()> {
        let token = event.event_type.as_token();
        let header_len = token.len() + 1 + event.table_name.len();
        let header_prefix =
            u8::try_from(header_len).map_err(|_| ProtocolError::HeaderTooLong(header_len))?;
        let payload_len = i32::try_from(event.payload.len())
            .map_err(|_| ProtocolError::PayloadTooLarge(event.payload.len()))?;

        self.buf.reserve(1 + header_len + 4 + event.payload.len());
        self.buf.push(header_prefix);
        self.buf.extend_from_slice(token.as_bytes());
        self.buf.push(b'=');
        self.buf.extend_from_slice(event.table_name.as_bytes());
        self.buf.extend_from_slice(&payload_len.to_le_bytes());
        self.buf.extend_from_slice(event.payload);
        self.events += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.events
    }

    /// Returns true if no records were written.
    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Returns the encoded batch.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Encodes a sequence of events into one batch.
///
/// # Errors
///
/// Propagates the first error from [`BatchWriter::push`].
pub fn encode_events<'a, I>(events: I) -> ProtocolResult<Vec<u8>>
where
    I: IntoIterator<Item = SyncEvent<'a>>,
{
    let mut writer = BatchWriter::new();
    for event in events {
        writer.push(&event)?;
    }
    Ok(writer.finish())
}
