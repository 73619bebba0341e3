//! Decode command implementation.

use nosqlreader_protocol::SyncEventReader;
use serde::Serialize;
use std::path::Path;

/// Longest payload preview printed, in characters.
const PREVIEW_CHARS: usize = 80;

/// Event representation for output.
#[derive(Debug, Serialize)]
pub struct EventInfo {
    /// Offset of the record in the batch.
    pub offset: usize,
    /// Table name.
    pub table: String,
    /// Event type token.
    pub event_type: String,
    /// Payload size in bytes.
    pub payload_size: usize,
    /// Payload as text, when it is valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// Result of dumping a batch.
#[derive(Debug, Serialize)]
pub struct DecodeReport {
    /// Size of the batch in bytes.
    pub size: usize,
    /// Events decoded before the end or the first error.
    pub events: Vec<EventInfo>,
    /// Decoding error, if the batch is malformed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the decode command.
pub fn run(
    input: &Path,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("batch file not found: {}", input.display()).into());
    }

    let data = std::fs::read(input)?;
    let report = decode_batch(&data, limit);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print_text_output(&report);
        }
    }

    match report.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Decodes up to `limit` events, stopping at the first malformed record.
pub fn decode_batch(data: &[u8], limit: Option<usize>) -> DecodeReport {
    let max_events = limit.unwrap_or(usize::MAX);
    let mut reader = SyncEventReader::new(data);
    let mut events = Vec::new();
    let mut error = None;

    while events.len() < max_events {
        let offset = reader.position();
        match reader.read_event() {
            Ok(Some(event)) => events.push(EventInfo {
                offset,
                table: event.table_name.to_string(),
                event_type: event.event_type.as_token().to_string(),
                payload_size: event.payload.len(),
                payload: std::str::from_utf8(event.payload).ok().map(str::to_string),
            }),
            Ok(None) => break,
            Err(e) => {
                error = Some(format!("offset {offset}: {e}"));
                break;
            }
        }
    }

    DecodeReport {
        size: data.len(),
        events,
        error,
    }
}

fn print_text_output(report: &DecodeReport) {
    println!(
        "Change Batch ({} events, {} bytes)",
        report.events.len(),
        report.size
    );
    println!("================");
    println!();

    for event in &report.events {
        print!(
            "[{:08}] {:15} {:24} {:>8} bytes",
            event.offset, event.event_type, event.table, event.payload_size
        );
        if let Some(text) = &event.payload {
            let preview: String = text.chars().take(PREVIEW_CHARS).collect();
            print!("  {preview}");
        }
        println!();
    }

    if let Some(error) = &report.error {
        println!();
        println!("ERROR: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosqlreader_testkit::{encode_batch, init_table, reference_record, update_rows};
    use std::io::Write;

    #[test]
    fn reports_reference_record() {
        let report = decode_batch(&reference_record(), None);
        assert_eq!(report.size, 21);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].table, "Foo");
        assert_eq!(report.events[0].event_type, "initTable");
        assert_eq!(report.events[0].payload_size, 3);
        assert!(report.error.is_none());
    }

    #[test]
    fn offsets_and_limit() {
        let batch = encode_batch(&[
            init_table("orders", "[]"),
            update_rows("orders", "[1]"),
            update_rows("orders", "[2]"),
        ]);
        let report = decode_batch(&batch, Some(2));
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.events[0].offset, 0);
        // 1 + "initTable=orders" + 4 + "[]"
        assert_eq!(report.events[1].offset, 23);
        assert_eq!(report.events[1].payload.as_deref(), Some("[1]"));
    }

    #[test]
    fn keeps_events_before_error() {
        let mut batch = encode_batch(&[update_rows("orders", "[1]")]);
        batch.extend_from_slice(&[4, b'a', b'b']);
        let report = decode_batch(&batch, None);
        assert_eq!(report.events.len(), 1);
        let error = report.error.unwrap();
        assert!(error.starts_with("offset 25"), "{error}");
    }

    #[test]
    fn run_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&reference_record()).unwrap();
        run(file.path(), None, "json").unwrap();

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        bad.write_all(&[3, b'x']).unwrap();
        assert!(run(bad.path(), None, "text").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("absent.bin"), None, "text").is_err());
    }
}
