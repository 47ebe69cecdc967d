//! Runtime types.

use docweave_core::EngineConfig;
use docweave_graph::GraphStats;
use docweave_rank::ContextEntry;
use docweave_resolve::{CacheStats, ResolvedReference, UnresolvedReference};
use serde::Serialize;

/// What a document-updated event did to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphUpdate {
    /// Outgoing edges replaced with this many relations.
    Linked(usize),
    /// The document no longer exists in the store and was dropped.
    Removed,
    /// The store could not be read; the graph was left untouched.
    Skipped,
}

/// Final context handed to answer synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledContext {
    /// Directly retrieved documents, mandatory ones first.
    pub entries: Vec<ContextEntry>,
    /// Documents reached by following links from `entries`.
    pub references: Vec<ResolvedReference>,
    pub unresolved: Vec<UnresolvedReference>,
    pub resolved_count: usize,
    pub unresolved_count: usize,
    /// Link expansion hit its deadline; `references` may be incomplete.
    pub timed_out: bool,
}

/// Engine status information.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub graph: GraphStats,
    pub cache: CacheStats,
    pub config: EngineConfig,
}
