//! Error types for sink operations.

pub mod sink_error;

pub use sink_error::SinkError;
