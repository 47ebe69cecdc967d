//! End-to-end behaviour of the context engine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docweave_core::{Document, EngineConfig, Error, PromotionTier, Result, ScoredDocument};
use docweave_rank::PromotionBooster;
use docweave_resolve::{ResolveOptions, UnresolvedReason};
use docweave_runtime::{ContextEngine, GraphUpdate};
use docweave_store::{DocumentStore, FsDocumentStore, MemoryStore};

fn memory(docs: &[(&str, &str)]) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_documents(
        docs.iter().map(|(id, content)| Document::new(*id, *content)),
    ))
}

async fn seed(store: &MemoryStore, id: &str) -> Document {
    store.get(id).await.unwrap().unwrap()
}

fn options(depth: usize, max: usize) -> ResolveOptions {
    ResolveOptions::default()
        .with_max_depth(depth)
        .with_max_linked_docs(max)
}

#[tokio::test]
async fn test_chain_resolves_by_depth() {
    let store = memory(&[("a.md", "[b](b.md)"), ("b.md", "[c](c.md)"), ("c.md", "")]);
    let engine = ContextEngine::new(store.clone(), EngineConfig::default());

    let result = engine
        .resolve(&[seed(&store, "a.md").await], &options(2, 5))
        .await
        .unwrap();
    let found: Vec<(&str, usize)> = result
        .resolved
        .iter()
        .map(|r| (r.document.id.as_str(), r.depth))
        .collect();
    assert_eq!(found, vec![("b.md", 1), ("c.md", 2)]);
    assert!(result.unresolved.is_empty());
}

#[tokio::test]
async fn test_missing_target_is_unresolved() {
    let store = memory(&[("a.md", "See [gone](missing.md).")]);
    let engine = ContextEngine::new(store.clone(), EngineConfig::default());

    let result = engine
        .resolve(&[seed(&store, "a.md").await], &options(1, 5))
        .await
        .unwrap();
    assert!(result.resolved.is_empty());
    assert_eq!(result.unresolved.len(), 1);
    assert_eq!(result.unresolved[0].target, "missing.md");
    assert_eq!(result.unresolved[0].reason, UnresolvedReason::NotFound);
    assert_eq!(result.unresolved_count, 1);
}

#[tokio::test]
async fn test_mutual_links_resolve_once() {
    let store = memory(&[("a.md", "[b](b.md)"), ("b.md", "[a](a.md)")]);
    let engine = ContextEngine::new(store.clone(), EngineConfig::default());

    let result = engine
        .resolve(&[seed(&store, "a.md").await], &options(5, 10))
        .await
        .unwrap();
    assert_eq!(result.resolved.len(), 1);
    assert_eq!(result.resolved[0].document.id, "b.md");
}

#[test]
fn test_important_boost_reorders() {
    let x = ScoredDocument::new(Document::new("x.md", "").reference, 0.9);
    let y = ScoredDocument::new(
        Document::new("y.md", "").with_tier(PromotionTier::Important).reference,
        0.7,
    );
    let sorted = PromotionBooster::apply_and_sort(&[x, y]);
    assert_eq!(sorted[0].id(), "y.md");
    assert!((sorted[0].boosted_score - 1.05).abs() < 1e-9);
    assert_eq!(sorted[1].boosted_score, 0.9);
}

#[test]
fn test_critical_floor() {
    let z = ScoredDocument::new(
        Document::new("z.md", "").with_tier(PromotionTier::Critical).reference,
        0.55,
    );
    let candidates = [z];
    assert_eq!(PromotionBooster::mandatory_critical(&candidates, 0.5).len(), 1);
    assert!(PromotionBooster::mandatory_critical(&candidates, 0.6).is_empty());
}

#[tokio::test]
async fn test_zero_budget_touches_nothing() {
    let store = memory(&[("a.md", "[b](b.md)"), ("b.md", "")]);
    let engine = ContextEngine::new(store.clone(), EngineConfig::default());
    let doc = Document::new("a.md", "[b](b.md)");

    let result = engine.resolve(&[doc], &options(3, 0)).await.unwrap();
    assert!(result.is_empty());
    assert!(!result.timed_out);
    assert_eq!(store.access_count(), 0);
    let cache = engine.status().cache;
    assert_eq!(cache.hits + cache.misses, 0);
}

#[tokio::test]
async fn test_three_cycle_terminates() {
    let store = memory(&[("a.md", "[b](b.md)"), ("b.md", "[c](c.md)"), ("c.md", "[a](a.md)")]);
    let engine = ContextEngine::new(store.clone(), EngineConfig::default());
    engine.rebuild().await.unwrap();

    assert_eq!(engine.detect_cycles(), vec![vec!["a.md", "b.md", "c.md"]]);

    let result = engine
        .resolve(&[seed(&store, "a.md").await], &options(50, 50))
        .await
        .unwrap();
    let ids: Vec<&str> = result.resolved.iter().map(|r| r.document.id.as_str()).collect();
    assert_eq!(ids, vec!["b.md", "c.md"]);
}

#[tokio::test]
async fn test_cycle_set_is_deterministic() {
    let docs = [
        ("a.md", "[b](b.md) [d](d.md)"),
        ("b.md", "[a](a.md) [c](c.md)"),
        ("c.md", "[c2](c2.md)"),
        ("c2.md", "[c](c.md)"),
        ("d.md", ""),
    ];
    let mut previous = None;
    for _ in 0..3 {
        let engine = ContextEngine::new(memory(&docs), EngineConfig::default());
        engine.rebuild().await.unwrap();
        let mut cycles = engine.detect_cycles();
        cycles.sort();
        assert_eq!(cycles.len(), 2);
        if let Some(prev) = previous.replace(cycles.clone()) {
            assert_eq!(prev, cycles);
        }
    }
}

#[tokio::test]
async fn test_removed_document_is_never_linked() {
    let store = memory(&[
        ("a.md", "[b](b.md) [c](c.md)"),
        ("b.md", "[c](c.md)"),
        ("c.md", "[a](a.md)"),
    ]);
    let engine = ContextEngine::new(store.clone(), EngineConfig::default());
    engine.rebuild().await.unwrap();
    assert!(engine.linked_documents("a.md", 3, 10).contains(&"c.md".to_string()));

    assert!(engine.on_document_removed("c.md").await);
    for start in ["a.md", "b.md"] {
        assert!(!engine.linked_documents(start, 10, 100).contains(&"c.md".to_string()));
        assert!(engine.linked_documents(start, 0, 100).is_empty());
    }
}

#[tokio::test]
async fn test_unchanged_update_is_idempotent() {
    let store = memory(&[("a.md", "[b](b.md) [c](c.md)")]);
    let engine = ContextEngine::new(store, EngineConfig::default());

    engine.on_document_updated("a.md").await;
    let first = (engine.graph().outgoing("a.md"), engine.graph().stats());
    assert_eq!(engine.on_document_updated("a.md").await, GraphUpdate::Linked(2));
    let second = (engine.graph().outgoing("a.md"), engine.graph().stats());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cap_holds_for_wide_graphs() {
    let mut docs = vec![Document::new(
        "hub.md",
        (0..200).map(|i| format!("[n{i}](n{i}.md)")).collect::<Vec<_>>().join("\n"),
    )];
    for i in 0..200 {
        docs.push(Document::new(format!("n{i}.md"), format!("[hub](hub.md) [m{i}](m{i}.md)")));
        docs.push(Document::new(format!("m{i}.md"), ""));
    }
    let store = Arc::new(MemoryStore::with_documents(docs));
    let engine = ContextEngine::new(store.clone(), EngineConfig::default());

    for max in [1, 7, 150, 400] {
        let result = engine
            .resolve(&[seed(&store, "hub.md").await], &options(4, max))
            .await
            .unwrap();
        assert!(result.resolved.len() <= max);
        assert_eq!(result.resolved_count, result.resolved.len());
    }
}

struct DownStore;

#[async_trait]
impl DocumentStore for DownStore {
    async fn get(&self, _: &str) -> Result<Option<Document>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn get_many(&self, _: &[String]) -> Result<Vec<Document>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn all_documents(&self) -> Result<Vec<Document>> {
        Err(Error::Store("connection refused".into()))
    }
}

#[tokio::test]
async fn test_store_outage() {
    let engine = ContextEngine::new(Arc::new(DownStore), EngineConfig::default());

    // maintenance swallows the failure, queries surface it
    assert_eq!(engine.on_document_updated("a.md").await, GraphUpdate::Skipped);
    assert!(engine.rebuild().await.is_err());
    let err = engine
        .resolve(&[Document::new("a.md", "[b](b.md)")], &options(1, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}

struct SlowStore {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        self.inner.get(id).await
    }
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Document>> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.inner.get_many(ids).await
    }
    async fn all_documents(&self) -> Result<Vec<Document>> {
        self.inner.all_documents().await
    }
}

#[tokio::test]
async fn test_deadline_yields_flagged_empty_result() {
    let store = SlowStore {
        inner: MemoryStore::with_documents([
            Document::new("a.md", "[b](b.md)"),
            Document::new("b.md", ""),
        ]),
    };
    let engine = ContextEngine::new(Arc::new(store), EngineConfig::default());
    let opts = options(2, 5).with_timeout(Duration::from_millis(20));

    let result = engine
        .resolve(&[Document::new("a.md", "[b](b.md)")], &opts)
        .await
        .unwrap();
    assert!(result.timed_out);
    assert!(result.is_empty());
    assert_eq!(result.resolved_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queries_during_rebuilds() {
    let docs: Vec<Document> = (0..50)
        .map(|i| Document::new(format!("d{i}.md"), format!("[next](d{}.md)", (i + 1) % 50)))
        .collect();
    let engine = Arc::new(ContextEngine::new(
        Arc::new(MemoryStore::with_documents(docs)),
        EngineConfig::default(),
    ));
    engine.rebuild().await.unwrap();

    let mut readers = Vec::new();
    for _ in 0..4 {
        let engine = engine.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                // any snapshot is the full ring
                assert_eq!(engine.linked_documents("d0.md", 100, 100).len(), 49);
                tokio::task::yield_now().await;
            }
        }));
    }
    for _ in 0..20 {
        engine.rebuild().await.unwrap();
    }
    for reader in readers {
        reader.await.unwrap();
    }
}

/// Enumeration takes a snapshot, then stalls before returning it.
struct StallingEnumeration {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl DocumentStore for StallingEnumeration {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        self.inner.get(id).await
    }
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Document>> {
        self.inner.get_many(ids).await
    }
    async fn all_documents(&self) -> Result<Vec<Document>> {
        let snapshot = self.inner.all_documents().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        snapshot
    }
}

#[tokio::test]
async fn test_update_during_rebuild_is_not_lost() {
    let inner = memory(&[("a.md", "[b](b.md)"), ("b.md", ""), ("c.md", "")]);
    let engine = Arc::new(ContextEngine::new(
        Arc::new(StallingEnumeration { inner: inner.clone() }),
        EngineConfig::default(),
    ));

    let rebuilding = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.rebuild().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    inner.upsert(Document::new("a.md", "[c](c.md)"));
    assert_eq!(engine.on_document_updated("a.md").await, GraphUpdate::Linked(1));
    assert_eq!(engine.graph().outgoing("a.md"), vec!["c.md"]);

    rebuilding.await.unwrap().unwrap();
    assert_eq!(engine.graph().outgoing("a.md"), vec!["c.md"]);
}

#[tokio::test]
async fn test_remove_during_rebuild_is_not_lost() {
    let inner = memory(&[("a.md", "[b](b.md)"), ("b.md", "[a](a.md)")]);
    let engine = Arc::new(ContextEngine::new(
        Arc::new(StallingEnumeration { inner: inner.clone() }),
        EngineConfig::default(),
    ));

    let rebuilding = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.rebuild().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    inner.remove("b.md");
    engine.on_document_removed("b.md").await;
    rebuilding.await.unwrap().unwrap();
    assert!(!engine.linked_documents("a.md", 5, 10).contains(&"b.md".to_string()));
}

#[test]
fn test_mandatory_floor_rejects_negative_and_nan_scores() {
    let critical = |id: &str, raw: f64| {
        ScoredDocument::new(
            Document::new(id, "").with_tier(PromotionTier::Critical).reference,
            raw,
        )
    };
    let candidates = [critical("neg.md", -0.2), critical("nan.md", f64::NAN), critical("ok.md", 0.1)];
    let engine = ContextEngine::new(Arc::new(MemoryStore::new()), EngineConfig::default());

    let mandatory = PromotionBooster::mandatory_critical(&candidates, 0.0);
    let ids: Vec<&str> = mandatory.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec!["ok.md"]);

    let merged = engine.boost_and_merge(&candidates, 0.0, 10);
    assert_eq!(merged.len(), 3);
    assert!(merged[0].mandatory && merged[0].id() == "ok.md");
    assert!(merged[1..].iter().all(|e| !e.mandatory));
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[tokio::test]
async fn test_markdown_directory_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "guides/deploy.md",
        "# Deploy\n\nShip it after reading [checks](checks.md#pre).\n",
    );
    write(
        dir.path(),
        "guides/checks.md",
        "---\nrelated: [../policy/security.md, ../nowhere.md]\n---\n# Checks\n\nRun the suite.\n",
    );
    write(
        dir.path(),
        "policy/security.md",
        "---\ntitle: Security Policy\npromotion: critical\n---\nNo secrets in logs.\n",
    );

    let store = Arc::new(FsDocumentStore::new(dir.path()).unwrap());
    let config = EngineConfig {
        max_depth: 2,
        full_content_max_depth: 1,
        ..Default::default()
    };
    let engine = ContextEngine::new(store.clone(), config);
    let stats = engine.rebuild().await.unwrap();
    assert_eq!(stats.document_count, 3);
    assert_eq!(stats.placeholder_count, 1);
    assert_eq!(engine.graph().backlinks("guides/checks.md"), vec!["guides/deploy.md"]);

    let deploy = store.get("guides/deploy.md").await.unwrap().unwrap();
    let context = engine
        .assemble_context(&[ScoredDocument::new(deploy.reference, 0.8)])
        .await
        .unwrap();

    assert_eq!(context.entries.len(), 1);
    let refs: Vec<(&str, usize)> = context
        .references
        .iter()
        .map(|r| (r.document.id.as_str(), r.depth))
        .collect();
    assert_eq!(refs, vec![("guides/checks.md", 1), ("policy/security.md", 2)]);
    assert_eq!(context.references[0].anchor.as_deref(), Some("pre"));
    assert!(context.references[0].content.as_deref().unwrap().contains("Run the suite."));
    assert_eq!(context.references[1].document.tier, PromotionTier::Critical);
    assert_eq!(context.unresolved.len(), 1);
    assert_eq!(context.unresolved[0].target, "nowhere.md");

    let json = serde_json::to_value(&context).unwrap();
    assert_eq!(json["resolvedCount"], 2);
    assert_eq!(json["unresolvedCount"], 1);
    assert_eq!(json["timedOut"], false);
}
