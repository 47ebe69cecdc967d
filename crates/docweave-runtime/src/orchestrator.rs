//! Context engine: graph maintenance, link expansion and ranking behind one
//! handle.

use std::collections::HashMap;
use std::sync::Arc;

use docweave_core::{Document, EngineConfig, Relation, Result, ScoredDocument};
use docweave_extract::{MarkdownExtractor, RelationExtractor};
use docweave_graph::{GraphStats, LinkGraph};
use docweave_rank::{ContextEntry, PromotionBooster, ResultMerger};
use docweave_resolve::{
    CrossReferenceResolver, LinkCache, LinkResolutionCache, ResolveOptions, ResolveResult,
};
use docweave_store::DocumentStore;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::types::*;

/// Top-level engine that owns the link graph and wires the store, the
/// extractor and the link cache into it.
pub struct ContextEngine {
    config: EngineConfig,
    graph: Arc<LinkGraph>,
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn RelationExtractor>,
    cache: Arc<dyn LinkCache>,
    resolver: CrossReferenceResolver,
    /// Serializes structural maintenance. A rebuild holds it from
    /// enumeration through the swap, so no update lands on a graph that is
    /// about to be replaced. Queries never take it.
    maintenance: Mutex<()>,
}

impl ContextEngine {
    /// Create an engine with the markdown extractor and a bounded link cache
    /// sized from `config`.
    pub fn new(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        let cache = Arc::new(LinkResolutionCache::new(
            config.cache_max_entries,
            config.cache_ttl(),
        ));
        Self::with_components(store, Arc::new(MarkdownExtractor::new()), cache, config)
    }

    /// Create with explicit collaborators (for testing or custom formats).
    pub fn with_components(
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn RelationExtractor>,
        cache: Arc<dyn LinkCache>,
        config: EngineConfig,
    ) -> Self {
        let resolver = CrossReferenceResolver::new(store.clone(), extractor.clone(), cache.clone());
        info!(
            "Context engine initialized: max_depth={}, max_linked_docs={}, cache_max_entries={}",
            config.max_depth, config.max_linked_docs, config.cache_max_entries
        );
        Self {
            config,
            graph: Arc::new(LinkGraph::new()),
            store,
            extractor,
            cache,
            resolver,
            maintenance: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<LinkGraph> {
        &self.graph
    }

    // ---------------------------------------------------------------
    // Graph maintenance
    // ---------------------------------------------------------------

    /// Document-changed event: re-read `id` and replace its outgoing edges.
    ///
    /// Errors are logged and never returned; when this completes the graph
    /// already reflects the outcome. Waits for an in-flight rebuild.
    pub async fn on_document_updated(&self, id: &str) -> GraphUpdate {
        let _maintenance = self.maintenance.lock().await;
        let doc = match self.store.get(id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                self.graph.remove_document(id);
                self.cache.invalidate(id);
                debug!("{} is gone from the store; dropped from link graph", id);
                return GraphUpdate::Removed;
            }
            Err(e) => {
                warn!("Failed to load {} for link update: {}", id, e);
                return GraphUpdate::Skipped;
            }
        };

        self.cache.invalidate(id);
        let relations = self.relations_for(&doc);
        let count = relations.len();
        self.graph.update_document_relations(id, relations);
        GraphUpdate::Linked(count)
    }

    /// Apply several document-changed events. They are queued behind one
    /// another on the maintenance lock.
    pub async fn on_documents_updated(&self, ids: &[String]) -> Vec<GraphUpdate> {
        join_all(ids.iter().map(|id| self.on_document_updated(id))).await
    }

    /// Document-removed event. Waits for an in-flight rebuild.
    pub async fn on_document_removed(&self, id: &str) -> bool {
        let _maintenance = self.maintenance.lock().await;
        self.cache.invalidate(id);
        self.graph.remove_document(id)
    }

    /// Rebuild the whole graph from the store. Readers keep seeing the old
    /// graph until the new one is swapped in.
    pub async fn rebuild(&self) -> Result<GraphStats> {
        let _maintenance = self.maintenance.lock().await;
        let docs = self.store.all_documents().await?;
        let total = docs.len();
        let all: Vec<(String, Vec<Relation>)> = docs
            .iter()
            .map(|doc| (doc.id().to_string(), self.relations_for(doc)))
            .collect();
        let stats = self.graph.rebuild_from_documents(all);
        info!("Rebuilt link graph from {} documents", total);
        Ok(stats)
    }

    /// Relations of `doc` via the link cache, extracting on a miss.
    /// Extraction failures yield no relations.
    fn relations_for(&self, doc: &Document) -> Vec<Relation> {
        match self.cache.get(doc.id(), doc.fingerprint()) {
            Ok(Some(hit)) => return hit.relations,
            Ok(None) => {}
            Err(e) => debug!("Link cache unavailable for {}: {}", doc.id(), e),
        }

        let relations = match self
            .extractor
            .extract(&doc.content, &doc.declared_relations, doc.id())
        {
            Ok(relations) => relations,
            Err(e) => {
                warn!("Relation extraction failed for {}: {}", doc.id(), e);
                return Vec::new();
            }
        };

        let existence: HashMap<String, bool> = relations
            .iter()
            .map(|r| {
                let indexed = self.graph.contains(&r.target) && !self.graph.is_placeholder(&r.target);
                (r.target.clone(), indexed)
            })
            .collect();
        if let Err(e) = self
            .cache
            .put(doc.id(), doc.fingerprint(), relations.clone(), existence)
        {
            debug!("Link cache write skipped for {}: {}", doc.id(), e);
        }
        relations
    }

    // ---------------------------------------------------------------
    // Graph queries
    // ---------------------------------------------------------------

    pub fn linked_documents(&self, start: &str, max_depth: usize, max_count: usize) -> Vec<String> {
        self.graph.linked_documents(start, max_depth, max_count)
    }

    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        self.graph.detect_cycles()
    }

    pub fn would_create_cycle(&self, source: &str, target: &str) -> bool {
        self.graph.would_create_cycle(source, target)
    }

    // ---------------------------------------------------------------
    // Context assembly
    // ---------------------------------------------------------------

    /// Resolution bounds from the engine configuration.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::from_config(&self.config)
    }

    /// Expand `seeds` along their links.
    pub async fn resolve(&self, seeds: &[Document], options: &ResolveOptions) -> Result<ResolveResult> {
        self.resolver.resolve(seeds, options).await
    }

    /// Boost, pick mandatory critical documents and merge into one list.
    pub fn boost_and_merge(
        &self,
        raw_results: &[ScoredDocument],
        mandatory_min_relevance: f64,
        max_results: usize,
    ) -> Vec<ContextEntry> {
        let boosted = PromotionBooster::apply_and_sort(raw_results);
        let mandatory = PromotionBooster::mandatory_critical(raw_results, mandatory_min_relevance);
        ResultMerger::merge(&mandatory, &boosted, max_results)
    }

    /// Full pipeline for one query's similarity hits: rank, merge, then
    /// expand the merged documents along their links.
    pub async fn assemble_context(&self, candidates: &[ScoredDocument]) -> Result<AssembledContext> {
        let entries = self.boost_and_merge(
            candidates,
            self.config.critical_min_relevance,
            self.config.max_context_results,
        );
        let options = self.resolve_options();
        if entries.is_empty() || !options.is_enabled() {
            return Ok(AssembledContext {
                entries,
                ..Default::default()
            });
        }

        let ids: Vec<String> = entries.iter().map(|e| e.id().to_string()).collect();
        let mut by_id: HashMap<String, Document> = self
            .store
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|doc| (doc.id().to_string(), doc))
            .collect();
        let seeds: Vec<Document> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        if seeds.len() < ids.len() {
            debug!(
                "{} ranked documents missing from the store; not expanded",
                ids.len() - seeds.len()
            );
        }

        let result = self.resolve(&seeds, &options).await?;
        Ok(AssembledContext {
            entries,
            references: result.resolved,
            unresolved: result.unresolved,
            resolved_count: result.resolved_count,
            unresolved_count: result.unresolved_count,
            timed_out: result.timed_out,
        })
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            graph: self.graph.stats(),
            cache: self.cache.stats(),
            config: self.config.clone(),
        }
    }
}
