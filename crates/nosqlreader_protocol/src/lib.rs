//! # NoSQL Reader Protocol
//!
//! Wire format and protocol types for the NoSQL data reader.
//!
//! This crate provides:
//! - `SyncEvent` and `SyncEventType` for decoded change notifications
//! - A lazy decoder for `GetChanges` response bodies
//! - `BatchWriter` for building change batches (fixtures, fake servers)
//! - The greeting response model
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Wire format
//!
//! A change batch is zero or more records laid out back to back:
//!
//! ```text
//! [u8 header length L][L bytes UTF-8 "eventType=tableName"][i32 LE length N][N bytes payload]
//! ```
//!
//! The batch ends exactly at the end of the buffer.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod event;
mod greeting;

pub use decoder::{decode, decode_all, parse_header, SyncEventReader};
pub use encoder::{encode_events, BatchWriter, MAX_HEADER_LEN};
pub use error::{ProtocolError, ProtocolResult};
pub use event::{OwnedSyncEvent, SyncEvent, SyncEventType};
pub use greeting::GreetingResponse;
