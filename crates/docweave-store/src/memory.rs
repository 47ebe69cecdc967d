//! In-memory [`DocumentStore`] implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docweave_core::{Document, PromotionTier, Result};
use parking_lot::RwLock;
use tracing::debug;

use crate::traits::DocumentStore;

/// Thread-safe in-memory document store.
///
/// Counts every store call so callers can assert on access patterns.
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Build a store pre-populated with `docs`.
    pub fn with_documents(docs: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        for doc in docs {
            store.upsert(doc);
        }
        store
    }

    /// Insert or replace a document. Returns the previous record, if any.
    pub fn upsert(&self, doc: Document) -> Option<Document> {
        self.docs.write().insert(doc.id().to_string(), doc)
    }

    pub fn remove(&self, id: &str) -> Option<Document> {
        self.docs.write().remove(id)
    }

    /// Change a document's promotion tier. Returns false if the id is unknown.
    pub fn set_tier(&self, id: &str, tier: PromotionTier) -> bool {
        match self.docs.write().get_mut(id) {
            Some(doc) => {
                doc.reference.tier = tier;
                debug!("Promotion tier of {} set to {}", id, tier);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of [`DocumentStore`] calls served so far.
    pub fn access_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        self.record_call();
        Ok(self.docs.read().get(id).cloned())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Document>> {
        self.record_call();
        let docs = self.docs.read();
        Ok(ids.iter().filter_map(|id| docs.get(id).cloned()).collect())
    }

    async fn all_documents(&self) -> Result<Vec<Document>> {
        self.record_call();
        let mut all: Vec<Document> = self.docs.read().values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(all)
    }
}
