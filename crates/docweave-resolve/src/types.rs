//! Resolver types.

use std::time::Duration;

use docweave_core::{DocumentRef, EngineConfig, RelationKind};
use serde::{Deserialize, Serialize};

/// Bounds for one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    pub max_depth: usize,
    pub max_linked_docs: usize,
    pub truncation_budget_chars: usize,
    /// References at this depth or shallower (closer to the seeds) carry
    /// content; deeper ones only carry the summary.
    pub full_content_max_depth: usize,
    pub timeout: Duration,
}

impl ResolveOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_linked_docs: config.max_linked_docs,
            truncation_budget_chars: config.truncation_budget_chars,
            full_content_max_depth: config.full_content_max_depth,
            timeout: config.resolve_timeout(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_linked_docs(mut self, max_linked_docs: usize) -> Self {
        self.max_linked_docs = max_linked_docs;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether these bounds allow any resolution at all.
    pub fn is_enabled(&self) -> bool {
        self.max_depth > 0 && self.max_linked_docs > 0
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// A linked document found during expansion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReference {
    pub document: DocumentRef,
    /// Document whose relation led here.
    pub source_id: String,
    pub depth: usize,
    pub kind: RelationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// Content (possibly truncated) or summary, depending on depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub truncated: bool,
}

/// Why a link target could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnresolvedReason {
    #[serde(rename = "not found")]
    NotFound,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
        }
    }
}

/// A link target that is not in the document store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedReference {
    pub target: String,
    pub source_id: String,
    pub depth: usize,
    pub kind: RelationKind,
    pub reason: UnresolvedReason,
}

/// Result of a resolution. Always well-formed, including after a timeout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResult {
    pub resolved: Vec<ResolvedReference>,
    pub unresolved: Vec<UnresolvedReference>,
    pub resolved_count: usize,
    pub unresolved_count: usize,
    pub timed_out: bool,
}

impl ResolveResult {
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.unresolved.is_empty()
    }

    pub(crate) fn finish(mut self) -> Self {
        self.resolved_count = self.resolved.len();
        self.unresolved_count = self.unresolved.len();
        self
    }
}
