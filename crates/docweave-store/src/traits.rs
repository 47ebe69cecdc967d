//! Abstract document store.

use async_trait::async_trait;
use docweave_core::{Document, Result};

/// Source of document records for graph rebuilds and reference resolution.
///
/// Implementations must be `Send + Sync`; every method may perform IO and is
/// called without any graph lock held.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by canonical id.
    async fn get(&self, id: &str) -> Result<Option<Document>>;

    /// Fetch several documents in one call. Ids that do not exist are
    /// omitted from the result; order of the result is unspecified.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Document>>;

    /// Enumerate every document with its content, used for full rebuilds.
    async fn all_documents(&self) -> Result<Vec<Document>>;
}
