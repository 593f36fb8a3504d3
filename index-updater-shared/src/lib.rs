//! # Index Updater Shared
//!
//! Shared types and data structures for the index updater system.
//!
//! This crate defines the dynamic value model used to navigate trigger
//! records and data-source results, and the partial-update document type
//! consumed by the sink.

pub mod types;

pub use types::{DataValue, FieldOperation, PropertyAccess, UpdateDocument};
