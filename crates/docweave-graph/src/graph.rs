//! Document link graph over canonical document ids.
//!
//! Flat id-keyed adjacency maps behind a single `RwLock`: traversals take the
//! read lock, structural mutations take the write lock for the in-memory
//! step only. A rebuild constructs the replacement off-lock and swaps it in,
//! so readers observe either the old or the new graph, never a mix.

use std::collections::{HashMap, HashSet, VecDeque};

use docweave_core::Relation;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cycles;

/// Graph size counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub vertex_count: usize,
    pub edge_count: usize,
    /// Vertices whose links have been set by an update or rebuild.
    pub document_count: usize,
    /// Vertices that exist only because something links to them.
    pub placeholder_count: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct GraphInner {
    /// Every vertex has an entry; targets are deduplicated, in first-seen order.
    pub(crate) outgoing: HashMap<String, Vec<String>>,
    pub(crate) incoming: HashMap<String, HashSet<String>>,
    /// Individual relation entries behind each vertex's edges.
    relations: HashMap<String, Vec<Relation>>,
    documents: HashSet<String>,
}

impl GraphInner {
    fn ensure_vertex(&mut self, id: &str) {
        if !self.outgoing.contains_key(id) {
            self.outgoing.insert(id.to_string(), Vec::new());
            self.incoming.insert(id.to_string(), HashSet::new());
        }
    }

    /// Replace every outgoing edge of `id`.
    fn set_links(&mut self, id: &str, targets: Vec<String>, relations: Vec<Relation>) {
        self.ensure_vertex(id);

        let old = self
            .outgoing
            .get_mut(id)
            .map(std::mem::take)
            .unwrap_or_default();
        for target in &old {
            if let Some(sources) = self.incoming.get_mut(target) {
                sources.remove(id);
            }
        }

        let mut seen = HashSet::with_capacity(targets.len());
        let mut deduped = Vec::with_capacity(targets.len());
        for target in targets {
            if seen.insert(target.clone()) {
                deduped.push(target);
            }
        }
        for target in &deduped {
            self.ensure_vertex(target);
            if let Some(sources) = self.incoming.get_mut(target) {
                sources.insert(id.to_string());
            }
        }
        self.outgoing.insert(id.to_string(), deduped);
        self.relations.insert(id.to_string(), relations);
        self.documents.insert(id.to_string());

        for target in old {
            self.prune_placeholder(&target);
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(targets) = self.outgoing.remove(id) else {
            return false;
        };
        let sources = self.incoming.remove(id).unwrap_or_default();
        self.relations.remove(id);
        self.documents.remove(id);

        for target in &targets {
            if let Some(back) = self.incoming.get_mut(target) {
                back.remove(id);
            }
        }
        for source in &sources {
            if let Some(out) = self.outgoing.get_mut(source) {
                out.retain(|t| t != id);
            }
            if let Some(rels) = self.relations.get_mut(source) {
                rels.retain(|r| r.target != id);
            }
        }
        for target in targets {
            self.prune_placeholder(&target);
        }
        true
    }

    /// Drop a placeholder nobody links to any more.
    fn prune_placeholder(&mut self, id: &str) {
        let orphaned = !self.documents.contains(id)
            && self.incoming.get(id).is_some_and(HashSet::is_empty)
            && self.outgoing.get(id).is_some_and(Vec::is_empty);
        if orphaned {
            self.outgoing.remove(id);
            self.incoming.remove(id);
        }
    }

    fn stats(&self) -> GraphStats {
        let vertex_count = self.outgoing.len();
        let document_count = self.documents.len();
        GraphStats {
            vertex_count,
            edge_count: self.outgoing.values().map(Vec::len).sum(),
            document_count,
            placeholder_count: vertex_count.saturating_sub(document_count),
        }
    }
}

/// Concurrency-safe directed graph of document links.
#[derive(Debug, Default)]
pub struct LinkGraph {
    inner: RwLock<GraphInner>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all outgoing edges of `id` with `targets`.
    ///
    /// Unseen targets become placeholder vertices; target existence is not
    /// validated. Re-applying the same target set is a no-op.
    pub fn update_document_links<I, S>(&self, id: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        let count = targets.len();
        self.inner.write().set_links(id, targets, Vec::new());
        debug!("Updated links for {}: {} targets", id, count);
    }

    /// Like [`update_document_links`](Self::update_document_links), keeping
    /// the individual relation entries for reporting.
    pub fn update_document_relations(&self, id: &str, relations: Vec<Relation>) {
        let targets: Vec<String> = relations.iter().map(|r| r.target.clone()).collect();
        let count = relations.len();
        self.inner.write().set_links(id, targets, relations);
        debug!("Updated links for {}: {} relations", id, count);
    }

    /// Remove `id` and every edge touching it. Returns false if absent.
    pub fn remove_document(&self, id: &str) -> bool {
        let removed = self.inner.write().remove(id);
        if removed {
            debug!("Removed {} from link graph", id);
        }
        removed
    }

    /// Discard the graph and rebuild it from `(document id, relations)` pairs.
    ///
    /// A later pair for the same id replaces an earlier one.
    pub fn rebuild_from_documents<I>(&self, all: I) -> GraphStats
    where
        I: IntoIterator<Item = (String, Vec<Relation>)>,
    {
        let mut fresh = GraphInner::default();
        for (id, relations) in all {
            let targets = relations.iter().map(|r| r.target.clone()).collect();
            fresh.set_links(&id, targets, relations);
        }
        let stats = fresh.stats();
        *self.inner.write() = fresh;
        info!(
            "Link graph rebuilt: {} vertices ({} placeholders), {} edges",
            stats.vertex_count, stats.placeholder_count, stats.edge_count
        );
        stats
    }

    /// Whether adding `source → target` would close a cycle, i.e. `target`
    /// already reaches `source`. Advisory only; cycles are never rejected.
    pub fn would_create_cycle(&self, source: &str, target: &str) -> bool {
        if source == target {
            return true;
        }
        let inner = self.inner.read();
        let mut visited: HashSet<&str> = HashSet::from([target]);
        let mut queue: VecDeque<&str> = VecDeque::from([target]);
        while let Some(node) = queue.pop_front() {
            for next in inner.outgoing.get(node).into_iter().flatten() {
                if next == source {
                    return true;
                }
                if visited.insert(next.as_str()) {
                    queue.push_back(next.as_str());
                }
            }
        }
        false
    }

    /// All cycles closed by a back edge during a colored DFS, each rotated
    /// to start at its smallest id, sorted.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        cycles::detect(&self.inner.read())
    }

    /// Ids reachable from `start` within `max_depth` hops, excluding `start`,
    /// in breadth-then-discovery order, at most `max_count` of them.
    pub fn linked_documents(&self, start: &str, max_depth: usize, max_count: usize) -> Vec<String> {
        let mut result = Vec::new();
        if max_depth == 0 || max_count == 0 {
            return result;
        }
        let inner = self.inner.read();
        if !inner.outgoing.contains_key(start) {
            return result;
        }

        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(start, 0)]);
        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for next in inner.outgoing.get(node).into_iter().flatten() {
                if visited.insert(next.as_str()) {
                    result.push(next.clone());
                    if result.len() >= max_count {
                        return result;
                    }
                    queue.push_back((next.as_str(), depth + 1));
                }
            }
        }
        result
    }

    /// Outgoing targets of `id`, in first-seen order.
    pub fn outgoing(&self, id: &str) -> Vec<String> {
        self.inner.read().outgoing.get(id).cloned().unwrap_or_default()
    }

    /// Ids linking to `id`, sorted.
    pub fn backlinks(&self, id: &str) -> Vec<String> {
        let mut sources: Vec<String> = self
            .inner
            .read()
            .incoming
            .get(id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        sources.sort();
        sources
    }

    /// Relation entries recorded for `id` by its latest update.
    pub fn relations_of(&self, id: &str) -> Vec<Relation> {
        self.inner.read().relations.get(id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().outgoing.contains_key(id)
    }

    pub fn is_placeholder(&self, id: &str) -> bool {
        let inner = self.inner.read();
        inner.outgoing.contains_key(id) && !inner.documents.contains(id)
    }

    pub fn stats(&self) -> GraphStats {
        self.inner.read().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_core::RelationKind;
    use std::sync::Arc;

    fn rel(source: &str, target: &str, kind: RelationKind) -> Relation {
        Relation {
            source: source.into(),
            target: target.into(),
            kind,
            anchor: None,
            line: None,
        }
    }

    fn chain() -> LinkGraph {
        let g = LinkGraph::new();
        g.update_document_links("a.md", ["b.md"]);
        g.update_document_links("b.md", ["c.md"]);
        g.update_document_links("c.md", Vec::<String>::new());
        g
    }

    #[test]
    fn test_update_replaces_not_merges() {
        let g = LinkGraph::new();
        g.update_document_links("a.md", ["b.md", "c.md"]);
        g.update_document_links("a.md", ["d.md"]);
        assert_eq!(g.outgoing("a.md"), vec!["d.md"]);
        assert!(g.backlinks("b.md").is_empty());
    }

    #[test]
    fn test_update_is_idempotent() {
        let g = LinkGraph::new();
        g.update_document_links("a.md", ["b.md", "c.md", "b.md"]);
        let first = (g.outgoing("a.md"), g.stats());
        g.update_document_links("a.md", ["b.md", "c.md", "b.md"]);
        assert_eq!((g.outgoing("a.md"), g.stats()), first);
        assert_eq!(first.0, vec!["b.md", "c.md"]);
    }

    #[test]
    fn test_placeholders_created_and_pruned() {
        let g = LinkGraph::new();
        g.update_document_links("a.md", ["ghost.md"]);
        assert!(g.is_placeholder("ghost.md"));
        assert_eq!(g.stats().placeholder_count, 1);

        g.update_document_links("a.md", Vec::<String>::new());
        assert!(!g.contains("ghost.md"));
    }

    #[test]
    fn test_remove_keeps_shared_placeholder() {
        let g = LinkGraph::new();
        g.update_document_links("a.md", ["ghost.md"]);
        g.update_document_links("b.md", ["ghost.md"]);
        assert!(g.remove_document("a.md"));
        assert!(g.contains("ghost.md"));
        assert_eq!(g.backlinks("ghost.md"), vec!["b.md"]);
        assert!(!g.remove_document("a.md"));
    }

    #[test]
    fn test_removed_document_never_reachable() {
        let g = chain();
        g.update_document_links("x.md", ["b.md"]);
        g.remove_document("b.md");
        for start in ["a.md", "c.md", "x.md"] {
            assert!(!g.linked_documents(start, 10, 10).contains(&"b.md".to_string()));
        }
        assert!(g.outgoing("a.md").is_empty());
    }

    #[test]
    fn test_relation_entries_retained() {
        let g = LinkGraph::new();
        g.update_document_relations(
            "a.md",
            vec![
                rel("a.md", "b.md", RelationKind::MarkdownLink),
                rel("a.md", "b.md", RelationKind::DeclaredRelation),
            ],
        );
        assert_eq!(g.outgoing("a.md"), vec!["b.md"]);
        assert_eq!(g.relations_of("a.md").len(), 2);
        assert_eq!(g.stats().edge_count, 1);
    }

    #[test]
    fn test_linked_documents_bounds() {
        let g = chain();
        assert!(g.linked_documents("a.md", 0, 10).is_empty());
        assert!(g.linked_documents("a.md", 3, 0).is_empty());
        assert_eq!(g.linked_documents("a.md", 1, 10), vec!["b.md"]);
        assert_eq!(g.linked_documents("a.md", 2, 10), vec!["b.md", "c.md"]);
        assert_eq!(g.linked_documents("a.md", 5, 1), vec!["b.md"]);
        assert!(g.linked_documents("unknown.md", 2, 10).is_empty());
    }

    #[test]
    fn test_linked_documents_breadth_first() {
        let g = LinkGraph::new();
        g.update_document_links("a.md", ["b.md", "c.md"]);
        g.update_document_links("b.md", ["d.md"]);
        g.update_document_links("c.md", ["e.md", "a.md"]);
        assert_eq!(
            g.linked_documents("a.md", 2, 10),
            vec!["b.md", "c.md", "d.md", "e.md"]
        );
    }

    #[test]
    fn test_would_create_cycle() {
        let g = chain();
        assert!(g.would_create_cycle("c.md", "a.md"));
        assert!(!g.would_create_cycle("a.md", "c.md"));
        assert!(g.would_create_cycle("a.md", "a.md"));
        // advisory only: nothing was rejected or added
        g.update_document_links("c.md", ["a.md"]);
        assert_eq!(g.detect_cycles().len(), 1);
    }

    #[test]
    fn test_rebuild_swaps_whole_graph() {
        let g = chain();
        let stats = g.rebuild_from_documents(vec![
            ("x.md".to_string(), vec![rel("x.md", "y.md", RelationKind::MarkdownLink)]),
        ]);
        assert_eq!(stats.vertex_count, 2);
        assert!(!g.contains("a.md"));
        assert!(g.is_placeholder("y.md"));
    }

    #[test]
    fn test_concurrent_readers_during_rebuilds() {
        let g = Arc::new(LinkGraph::new());
        let old: Vec<(String, Vec<Relation>)> = (0..50)
            .map(|i| {
                let id = format!("old{}.md", i);
                let next = format!("old{}.md", (i + 1) % 50);
                (id.clone(), vec![rel(&id, &next, RelationKind::MarkdownLink)])
            })
            .collect();
        let new: Vec<(String, Vec<Relation>)> = (0..50)
            .map(|i| {
                let id = format!("new{}.md", i);
                let next = format!("new{}.md", (i + 1) % 50);
                (id.clone(), vec![rel(&id, &next, RelationKind::MarkdownLink)])
            })
            .collect();
        g.rebuild_from_documents(old.clone());

        let writer = {
            let g = Arc::clone(&g);
            std::thread::spawn(move || {
                for i in 0..100 {
                    let batch = if i % 2 == 0 { new.clone() } else { old.clone() };
                    g.rebuild_from_documents(batch);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let g = Arc::clone(&g);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let stats = g.stats();
                        // never a mix of the two generations
                        assert_eq!(stats.vertex_count, 50);
                        assert_eq!(stats.edge_count, 50);
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
