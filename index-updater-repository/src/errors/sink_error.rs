//! Sink error types.
//!
//! This module defines the unified error type for all sink operations.
//! Failures here are fatal for the enclosing update operation; retry policy
//! is left to the caller.

use thiserror::Error;

/// Unified errors from sink operations.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// Failed to establish a connection to the sink backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to submit a batch of documents.
    #[error("Add error: {0}")]
    AddError(String),

    /// Failed to commit submitted documents.
    #[error("Commit error: {0}")]
    CommitError(String),

    /// Failed to serialize documents for the sink backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SinkError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an add error.
    pub fn add(msg: impl Into<String>) -> Self {
        Self::AddError(msg.into())
    }

    /// Create a commit error.
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::CommitError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}
