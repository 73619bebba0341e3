//! # NoSQL Reader Testkit
//!
//! Test utilities for the NoSQL data reader.
//!
//! This crate provides:
//! - Event and batch fixtures
//! - An in-memory DataReader server with failure injection
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nosqlreader_testkit::prelude::*;
//!
//! let server = FakeDataReaderServer::new();
//! server.set_snapshot("orders", b"[]".to_vec());
//! let session = server.greeting("app", "1.0").unwrap();
//! server.subscribe(&session, "orders").unwrap();
//! let batch = server.get_changes(&session).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod server;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::server::*;
}

pub use fixtures::*;
pub use generators::*;
pub use server::*;
