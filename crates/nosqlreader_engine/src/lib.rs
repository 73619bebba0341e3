//! # NoSQL Reader Engine
//!
//! Client-side synchronization engine that mirrors remote NoSQL tables
//! into local sinks by polling a DataReader endpoint.
//!
//! This crate provides:
//! - Subscription registry (table name → sink)
//! - Session manager (greeting exchange, invalidation)
//! - Poll loop (acquire session → subscribe → stream → back off)
//! - Transport abstraction with an HTTP implementation over a pluggable client
//! - In-memory sink and mock transport for tests
//!
//! ## Architecture
//!
//! One background task per connection runs the poll loop:
//! 1. Acquire a session if none is current
//! 2. Declare every subscription, in registration order
//! 3. Fetch change batches, decode them, dispatch events to sinks in order
//! 4. On failure, back off and start over
//!
//! ## Key Invariants
//!
//! - Subscriptions are registered before `start()` and frozen afterwards
//! - Events are applied in decode order, batches in fetch order
//! - A streaming failure invalidates the session; a subscribe failure does not
//! - Events for tables nobody subscribed to are dropped silently

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod error;
mod http;
mod poll;
mod registry;
mod session;
mod sink;
mod state;
mod transport;

pub use config::{ReaderConfig, DEFAULT_RECONNECT_DELAY};
pub use connection::DataReaderConnection;
pub use error::{ReaderError, ReaderResult};
pub use http::{HostProvider, HttpClient, HttpRequest, HttpTransport};
pub use registry::{SubscriptionHandle, SubscriptionRegistry};
pub use session::SessionManager;
pub use sink::{MemoryTableSink, TableSink};
pub use state::{ConnectionState, ConnectionStats};
pub use transport::{MockTransport, ReaderTransport, TransportCall};

pub use nosqlreader_protocol::{OwnedSyncEvent, SyncEvent, SyncEventType};
