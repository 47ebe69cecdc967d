//! Data types for documents, relations, and scored search hits.

use serde::{Deserialize, Serialize};

use crate::fingerprint::fingerprint;

/// File extensions (lowercase) that denote documents. Stores index exactly
/// these and extractors only link to them.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdx", "markdown"];

/// Whether `path` ends in one of [`DOCUMENT_EXTENSIONS`], ignoring case.
pub fn has_document_extension(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Curated importance classification of a document.
///
/// Ordered `Standard < Important < Critical`. Set by an external mutation and
/// consumed read-only by ranking.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PromotionTier {
    #[default]
    Standard,
    Important,
    Critical,
}

impl std::fmt::Display for PromotionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Important => write!(f, "important"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for PromotionTier {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "" => Ok(Self::Standard),
            "important" => Ok(Self::Important),
            "critical" => Ok(Self::Critical),
            other => Err(crate::Error::Config(format!(
                "unknown promotion tier: {}",
                other
            ))),
        }
    }
}

/// Lightweight reference to an indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Canonical root-relative path, `/`-separated.
    pub id: String,
    /// SHA-256 of the content; changes iff the content changes.
    pub fingerprint: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub char_count: usize,
    #[serde(default)]
    pub tier: PromotionTier,
}

/// A full document record as held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub reference: DocumentRef,
    pub content: String,
    /// Raw entries of the "related documents" metadata field.
    #[serde(default)]
    pub declared_relations: Vec<String>,
}

impl Document {
    /// Build a document from its id and content, deriving fingerprint,
    /// character count and a title defaulting to the id.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        let id = id.into();
        let content = content.into();
        Self {
            reference: DocumentRef {
                fingerprint: fingerprint(&content),
                title: id.clone(),
                summary: None,
                char_count: content.chars().count(),
                tier: PromotionTier::Standard,
                id,
            },
            content,
            declared_relations: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.reference.title = title.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.reference.summary = Some(summary.into());
        self
    }

    pub fn with_tier(mut self, tier: PromotionTier) -> Self {
        self.reference.tier = tier;
        self
    }

    pub fn with_declared_relations<I, S>(mut self, related: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_relations = related.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> &str {
        &self.reference.id
    }

    pub fn fingerprint(&self) -> &str {
        &self.reference.fingerprint
    }
}

/// Provenance of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Inline `[text](path.md)` link in the body.
    MarkdownLink,
    /// Entry of the declared "related documents" metadata field.
    DeclaredRelation,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkdownLink => write!(f, "markdown_link"),
            Self::DeclaredRelation => write!(f, "declared_relation"),
        }
    }
}

/// A directed reference from one document to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// 1-based line in the source; `None` for declared relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// A similarity-search hit handed to ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: DocumentRef,
    pub raw_score: f64,
}

impl ScoredDocument {
    pub fn new(document: DocumentRef, raw_score: f64) -> Self {
        Self {
            document,
            raw_score,
        }
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn tier(&self) -> PromotionTier {
        self.document.tier
    }
}
