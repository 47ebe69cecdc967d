//! Docweave Resolve: expands a retrieved result set along document links.
//!
//! [`CrossReferenceResolver`] walks relations breadth-first from the seed
//! documents, consulting a [`LinkCache`] before re-extracting relations and
//! fetching each level's targets from the store in one batched call.

pub mod cache;
pub mod resolver;
pub mod truncate;
pub mod types;

pub use cache::{CacheStats, CachedLinks, LinkCache, LinkResolutionCache, NoopLinkCache};
pub use resolver::CrossReferenceResolver;
pub use truncate::{truncate_content, TRUNCATION_MARKER};
pub use types::*;
