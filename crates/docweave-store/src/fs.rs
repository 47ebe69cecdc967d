//! Markdown-directory [`DocumentStore`].
//!
//! Every file under the root with a document extension (`.md`, `.mdx`,
//! `.markdown`) is a document whose id is its root-relative, `/`-separated
//! path. Hidden files and directories are
//! skipped. Blocking filesystem access runs on the tokio blocking pool.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use docweave_core::{has_document_extension, Document, Error, PromotionTier, Result};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::frontmatter::{split_front_matter, FrontMatter};
use crate::traits::DocumentStore;

/// Longest summary derived from a document body, in characters.
pub const SUMMARY_MAX_CHARS: usize = 280;

/// Serves documents from a directory of markdown files.
#[derive(Clone)]
pub struct FsDocumentStore {
    root: Arc<PathBuf>,
}

impl FsDocumentStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::Store(format!(
                "document root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: Arc::new(root.to_path_buf()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || f(root.as_path()))
            .await
            .map_err(|e| Error::Internal(format!("blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let id = id.to_string();
        self.blocking(move |root| load_by_id(root, &id)).await
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Document>> {
        let ids = ids.to_vec();
        self.blocking(move |root| {
            let mut docs = Vec::with_capacity(ids.len());
            for id in &ids {
                if let Some(doc) = load_by_id(root, id)? {
                    docs.push(doc);
                }
            }
            Ok(docs)
        })
        .await
    }

    async fn all_documents(&self) -> Result<Vec<Document>> {
        self.blocking(|root| {
            let mut paths = collect_documents(root);
            paths.sort();

            let mut docs = Vec::with_capacity(paths.len());
            for path in &paths {
                let Some(id) = relative_id(root, path) else {
                    continue;
                };
                match std::fs::read_to_string(path) {
                    Ok(content) => docs.push(parse_document(&id, content)),
                    Err(e) => warn!("Skipping unreadable document {}: {}", path.display(), e),
                }
            }
            info!("Enumerated {} documents under {}", docs.len(), root.display());
            Ok(docs)
        })
        .await
    }
}

fn load_by_id(root: &Path, id: &str) -> Result<Option<Document>> {
    let Some(path) = path_for_id(root, id) else {
        debug!("Rejecting non-canonical document id: {}", id);
        return Ok(None);
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some(parse_document(id, content))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Map an id onto a file under `root`, refusing anything that could escape it.
fn path_for_id(root: &Path, id: &str) -> Option<PathBuf> {
    let rel = Path::new(id);
    let canonical = rel.components().all(|c| matches!(c, Component::Normal(_)));
    if id.is_empty() || !canonical || !has_document_extension(id) {
        return None;
    }
    Some(root.join(rel))
}

fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn collect_documents(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable path under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && has_document_extension(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect()
}

/// Build a [`Document`] from raw file content.
pub fn parse_document(id: &str, content: String) -> Document {
    let (parsed, body) = split_front_matter(&content);
    let fm = parsed.unwrap_or_else(|e| {
        warn!("{}: ignoring malformed front matter: {}", id, e);
        FrontMatter::default()
    });

    let title = fm
        .title
        .clone()
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| file_stem(id));
    let summary = fm.summary.clone().or_else(|| first_paragraph(body));
    let tier = match fm.promotion.as_deref() {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("{}: {}; treating as standard", id, e);
            PromotionTier::Standard
        }),
        None => PromotionTier::Standard,
    };
    let related = fm.related.clone();

    let mut doc = Document::new(id, content)
        .with_title(title)
        .with_tier(tier)
        .with_declared_relations(related);
    doc.reference.summary = summary;
    doc
}

fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .filter_map(|l| l.strip_prefix("# "))
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

fn first_paragraph(body: &str) -> Option<String> {
    let para = body
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#'))?;
    let flat = para.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SUMMARY_MAX_CHARS {
        Some(flat)
    } else {
        let cut: String = flat.chars().take(SUMMARY_MAX_CHARS).collect();
        Some(format!("{}…", cut.trim_end()))
    }
}

fn file_stem(id: &str) -> String {
    Path::new(id)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(id)
        .to_string()
}
