//! Update sink trait definition.
//!
//! This module defines the abstract interface for the store receiving
//! partial-update documents, allowing for different backend implementations
//! (Solr, OpenSearch, in-memory, etc.).

use async_trait::async_trait;

use crate::errors::SinkError;
use index_updater_shared::UpdateDocument;

/// Abstracts the store receiving and committing built documents.
///
/// Implementations are injected into the batch processor to enable
/// dependency injection and easy testing with mock implementations.
///
/// Documents submitted through [`add`](UpdateSink::add) become visible only
/// after a [`commit`](UpdateSink::commit) for the same collection. The
/// engine issues exactly one commit per update operation, after the last
/// chunk has been submitted.
#[async_trait]
pub trait UpdateSink: Send + Sync {
    /// Submit a batch of partial-update documents to a collection.
    ///
    /// # Arguments
    ///
    /// * `collection` - The target collection name
    /// * `documents` - The documents to submit
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the batch was accepted
    /// * `Err(SinkError)` - If submission fails; the failure is fatal for
    ///   the enclosing update operation
    async fn add(&self, collection: &str, documents: &[UpdateDocument]) -> Result<(), SinkError>;

    /// Finalize visibility of all documents added since the last commit.
    ///
    /// # Arguments
    ///
    /// * `collection` - The collection to commit
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the commit succeeded
    /// * `Err(SinkError)` - If the commit fails
    async fn commit(&self, collection: &str) -> Result<(), SinkError>;
}
