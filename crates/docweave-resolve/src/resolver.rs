//! Cross-reference resolver: bounded breadth-first expansion of a seed set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use docweave_core::{Document, Relation, RelationKind, Result};
use docweave_extract::RelationExtractor;
use docweave_store::DocumentStore;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::LinkCache;
use crate::truncate::truncate_content;
use crate::types::*;

/// A target first seen at the current level.
struct Discovery {
    target: String,
    source_id: String,
    kind: RelationKind,
    anchor: Option<String>,
}

/// Freshly extracted relations waiting for the level's existence data
/// before they are cached.
struct PendingPut {
    id: String,
    fingerprint: String,
    relations: Vec<Relation>,
}

/// Expands directly retrieved documents along their relations.
pub struct CrossReferenceResolver {
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn RelationExtractor>,
    cache: Arc<dyn LinkCache>,
}

impl CrossReferenceResolver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn RelationExtractor>,
        cache: Arc<dyn LinkCache>,
    ) -> Self {
        Self {
            store,
            extractor,
            cache,
        }
    }

    /// Resolve references reachable from `seeds`.
    ///
    /// Targets are marked visited the moment they are discovered, so each
    /// document is expanded at most once however many paths reach it, and
    /// seeds never reappear. Once the deadline passes, whatever has been
    /// resolved is returned with `timed_out` set. Store failures propagate.
    pub async fn resolve(&self, seeds: &[Document], options: &ResolveOptions) -> Result<ResolveResult> {
        let mut result = ResolveResult::default();
        if !options.is_enabled() || seeds.is_empty() {
            return Ok(result);
        }
        let deadline = Instant::now() + options.timeout;

        let mut visited: HashSet<String> = HashSet::new();
        let mut known: HashMap<String, bool> = HashMap::new();
        let mut frontier: Vec<Document> = Vec::with_capacity(seeds.len());
        for seed in seeds {
            if visited.insert(seed.id().to_string()) {
                known.insert(seed.id().to_string(), true);
                frontier.push(seed.clone());
            }
        }

        'levels: for depth in 1..=options.max_depth {
            if frontier.is_empty() || result.resolved.len() >= options.max_linked_docs {
                break;
            }

            let mut discovered: Vec<Discovery> = Vec::new();
            let mut pending: Vec<PendingPut> = Vec::new();
            for doc in &frontier {
                if Instant::now() >= deadline {
                    result.timed_out = true;
                    self.flush(pending, &known);
                    break 'levels;
                }
                for relation in self.relations_for(doc, &mut pending) {
                    if visited.insert(relation.target.clone()) {
                        discovered.push(Discovery {
                            target: relation.target,
                            source_id: doc.id().to_string(),
                            kind: relation.kind,
                            anchor: relation.anchor,
                        });
                    }
                }
            }
            if discovered.is_empty() {
                self.flush(pending, &known);
                break;
            }

            let ids: Vec<String> = discovered.iter().map(|d| d.target.clone()).collect();
            let fetched = match tokio::time::timeout_at(deadline, self.store.get_many(&ids)).await {
                Ok(fetched) => fetched?,
                Err(_) => {
                    result.timed_out = true;
                    self.flush(pending, &known);
                    break;
                }
            };
            let mut by_id: HashMap<String, Document> = fetched
                .into_iter()
                .map(|doc| (doc.id().to_string(), doc))
                .collect();
            for id in &ids {
                known.insert(id.clone(), by_id.contains_key(id));
            }
            self.flush(pending, &known);

            let mut next_frontier = Vec::new();
            for found in discovered {
                if result.resolved.len() >= options.max_linked_docs {
                    break;
                }
                match by_id.remove(&found.target) {
                    Some(doc) => {
                        result.resolved.push(Self::reference(&doc, found, depth, options));
                        next_frontier.push(doc);
                    }
                    None => result.unresolved.push(UnresolvedReference {
                        target: found.target,
                        source_id: found.source_id,
                        depth,
                        kind: found.kind,
                        reason: UnresolvedReason::NotFound,
                    }),
                }
            }
            debug!(
                "Resolution depth {}: {} resolved, {} unresolved so far",
                depth,
                result.resolved.len(),
                result.unresolved.len()
            );
            frontier = next_frontier;
        }

        if result.timed_out {
            info!(
                "Resolution deadline reached after {} references",
                result.resolved.len()
            );
        }
        Ok(result.finish())
    }

    /// Relations of `doc`: cache hit, else extract and queue for caching.
    /// Extraction failure yields no relations.
    fn relations_for(&self, doc: &Document, pending: &mut Vec<PendingPut>) -> Vec<Relation> {
        match self.cache.get(doc.id(), doc.fingerprint()) {
            Ok(Some(hit)) => return hit.relations,
            Ok(None) => {}
            Err(e) => debug!("Link cache unavailable for {}: {}", doc.id(), e),
        }

        match self
            .extractor
            .extract(&doc.content, &doc.declared_relations, doc.id())
        {
            Ok(relations) => {
                pending.push(PendingPut {
                    id: doc.id().to_string(),
                    fingerprint: doc.fingerprint().to_string(),
                    relations: relations.clone(),
                });
                relations
            }
            Err(e) => {
                warn!("Relation extraction failed for {}: {}", doc.id(), e);
                Vec::new()
            }
        }
    }

    fn flush(&self, pending: Vec<PendingPut>, known: &HashMap<String, bool>) {
        for put in pending {
            let existence = put
                .relations
                .iter()
                .filter_map(|r| known.get(&r.target).map(|e| (r.target.clone(), *e)))
                .collect();
            if let Err(e) = self
                .cache
                .put(&put.id, &put.fingerprint, put.relations, existence)
            {
                debug!("Link cache write skipped for {}: {}", put.id, e);
            }
        }
    }

    fn reference(
        doc: &Document,
        found: Discovery,
        depth: usize,
        options: &ResolveOptions,
    ) -> ResolvedReference {
        let (content, truncated) = if depth <= options.full_content_max_depth {
            let (text, truncated) = truncate_content(&doc.content, options.truncation_budget_chars);
            (Some(text), truncated)
        } else {
            (doc.reference.summary.clone(), false)
        };
        ResolvedReference {
            document: doc.reference.clone(),
            source_id: found.source_id,
            depth,
            kind: found.kind,
            anchor: found.anchor,
            content,
            truncated,
        }
    }
}
