//! Trait definitions for sink backends.

pub mod update_sink;

pub use update_sink::UpdateSink;
