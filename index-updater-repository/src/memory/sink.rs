//! In-memory [`UpdateSink`] implementation.
//!
//! Buffers added documents per collection and moves them to the committed
//! set on commit. Used by the test suites and by dry runs of the engine
//! where no real search backend is configured.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::SinkError;
use crate::interfaces::UpdateSink;
use index_updater_shared::UpdateDocument;

#[derive(Default)]
struct CollectionState {
    pending: Vec<UpdateDocument>,
    committed: Vec<UpdateDocument>,
    commits: usize,
}

/// Sink that keeps submitted documents in process memory.
#[derive(Default)]
pub struct MemorySink {
    collections: Mutex<HashMap<String, CollectionState>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents added to a collection but not yet committed.
    pub fn pending_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map(|state| state.pending.len())
            .unwrap_or(0)
    }

    /// Documents visible in a collection after commits.
    pub fn committed_documents(&self, collection: &str) -> Vec<UpdateDocument> {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map(|state| state.committed.clone())
            .unwrap_or_default()
    }

    /// Number of commits issued for a collection.
    pub fn commit_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map(|state| state.commits)
            .unwrap_or(0)
    }
}

#[async_trait]
impl UpdateSink for MemorySink {
    async fn add(&self, collection: &str, documents: &[UpdateDocument]) -> Result<(), SinkError> {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let state = collections.entry(collection.to_string()).or_default();
        state.pending.extend_from_slice(documents);

        debug!(
            collection = collection,
            added = documents.len(),
            pending = state.pending.len(),
            "Buffered documents in memory sink"
        );
        Ok(())
    }

    async fn commit(&self, collection: &str) -> Result<(), SinkError> {
        let mut collections = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let state = collections.entry(collection.to_string()).or_default();
        let flushed = state.pending.len();
        let pending = std::mem::take(&mut state.pending);
        state.committed.extend(pending);
        state.commits += 1;

        debug!(
            collection = collection,
            flushed = flushed,
            visible = state.committed.len(),
            "Committed memory sink collection"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(id: &str) -> UpdateDocument {
        let mut doc = UpdateDocument::new("id", id);
        doc.set_field("status", json!("ACTIVE"));
        doc
    }

    #[tokio::test]
    async fn test_add_buffers_until_commit() {
        let sink = MemorySink::new();

        sink.add("orders", &[document("A"), document("B")])
            .await
            .unwrap();

        assert_eq!(sink.pending_count("orders"), 2);
        assert!(sink.committed_documents("orders").is_empty());

        sink.commit("orders").await.unwrap();

        assert_eq!(sink.pending_count("orders"), 0);
        assert_eq!(sink.committed_documents("orders").len(), 2);
        assert_eq!(sink.commit_count("orders"), 1);
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let sink = MemorySink::new();

        sink.add("orders", &[document("A")]).await.unwrap();
        sink.add("customers", &[document("B")]).await.unwrap();
        sink.commit("orders").await.unwrap();

        assert_eq!(sink.committed_documents("orders").len(), 1);
        assert!(sink.committed_documents("customers").is_empty());
        assert_eq!(sink.pending_count("customers"), 1);
    }

    #[tokio::test]
    async fn test_commit_without_adds_is_empty() {
        let sink = MemorySink::new();

        sink.commit("orders").await.unwrap();

        assert!(sink.committed_documents("orders").is_empty());
        assert_eq!(sink.commit_count("orders"), 1);
    }
}
