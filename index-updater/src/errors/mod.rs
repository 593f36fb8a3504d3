//! Error types for the index updater engine.
//!
//! The variants distinguish recoverable per-record outcomes from fatal
//! ones: configuration errors are never retried, data-source failures are
//! fatal only for required sources, field resolution and type conversion
//! failures are fatal for the affected record, and sink failures abort the
//! whole operation.

use index_updater_repository::SinkError;
use thiserror::Error;

/// Errors that can occur while building and submitting update documents.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Invalid or missing configuration. Fatal at load or first use.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A data source failed after exhausting its retries.
    #[error("Data source '{source_name}' failed: {message}")]
    DataSource {
        /// The configured data source name.
        source_name: String,
        /// Failure detail.
        message: String,
    },

    /// A required field or identifier part resolved to no value.
    #[error("Field '{field}' failed to resolve: {message}")]
    FieldResolution {
        /// The target field name.
        field: String,
        /// Failure detail.
        message: String,
    },

    /// A value could not be converted to the mapping's target type.
    #[error("Field '{field}' failed type conversion: {message}")]
    TypeConversion {
        /// The target field name.
        field: String,
        /// Failure detail.
        message: String,
    },

    /// Error from the sink. Fatal for the whole operation.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Fail-fast abort of a batch operation, carrying progress made before
    /// the failing record.
    #[error("Batch aborted at record {index} after {succeeded} successful records: {source}")]
    Aborted {
        /// Zero-based index of the failing record.
        index: usize,
        /// Number of records built successfully before the abort.
        succeeded: usize,
        /// The underlying record failure.
        #[source]
        source: Box<UpdateError>,
    },
}

impl UpdateError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a data source error.
    pub fn data_source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a field resolution error.
    pub fn field_resolution(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldResolution {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a type conversion error.
    pub fn type_conversion(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeConversion {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a configuration error (never retried).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
