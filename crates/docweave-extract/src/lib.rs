//! Docweave Extract: turns document content and declared metadata into
//! normalized [`Relation`](docweave_core::Relation) lists.

pub mod markdown;
pub mod normalize;

pub use markdown::MarkdownExtractor;
pub use normalize::{normalize_target, SkipReason, Target};

use docweave_core::{Relation, Result};

/// Relation extraction contract consumed by the graph and the resolver.
///
/// Implementations return deduplicated relations whose targets are canonical
/// document ids. A malformed individual entry is skipped, never fatal; an
/// `Err` means the whole document could not be processed and callers treat
/// its relations as empty.
pub trait RelationExtractor: Send + Sync {
    fn extract(&self, content: &str, declared: &[String], source_id: &str)
        -> Result<Vec<Relation>>;
}
