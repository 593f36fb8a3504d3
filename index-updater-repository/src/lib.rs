//! # Index Updater Repository
//!
//! This crate provides the sink abstraction for the index updater: the
//! [`UpdateSink`] trait for submitting and committing batches of
//! partial-update documents, the [`SinkError`] type, and an in-memory
//! implementation used by tests and dry runs.

pub mod errors;
pub mod interfaces;
pub mod memory;

pub use errors::SinkError;
pub use interfaces::UpdateSink;
pub use memory::MemorySink;
