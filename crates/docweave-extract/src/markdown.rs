//! Markdown relation extractor: inline links plus declared related documents.

use std::collections::HashSet;

use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, Options};
use docweave_core::{Relation, RelationKind, Result};
use tracing::debug;

use crate::normalize::{normalize_target, SkipReason};
use crate::RelationExtractor;

pub use docweave_core::DOCUMENT_EXTENSIONS as DEFAULT_EXTENSIONS;

/// Extracts relations from markdown bodies and declared relation lists.
///
/// Inline links are reported first in document order, then declared
/// relations in declaration order. The body is parsed as CommonMark, so
/// links in code spans and code blocks are ignored, images are not links,
/// and reference-style or line-wrapped links are found.
#[derive(Debug, Clone)]
pub struct MarkdownExtractor {
    extensions: Vec<&'static str>,
}

impl MarkdownExtractor {
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.to_vec(),
        }
    }

    /// Restrict link targets to the given lowercase extensions.
    pub fn with_extensions(extensions: &[&'static str]) -> Self {
        Self {
            extensions: extensions.to_vec(),
        }
    }

    fn inline_links(&self, content: &str, source_id: &str, out: &mut Collector) {
        let mut options = Options::default();
        options.extension.front_matter_delimiter = Some("---".to_string());

        let arena = Arena::new();
        let root = parse_document(&arena, content, &options);
        for node in root.descendants() {
            let url = match &node.data.borrow().value {
                NodeValue::Link(link) => link.url.clone(),
                _ => continue,
            };
            match normalize_target(source_id, &url, &self.extensions) {
                Ok(t) => out.push(Relation {
                    source: source_id.to_string(),
                    target: t.id,
                    kind: RelationKind::MarkdownLink,
                    anchor: t.anchor,
                    line: Some(node_line(node)),
                }),
                Err(reason) => log_skip(source_id, &url, reason),
            }
        }
    }

    fn declared(&self, declared: &[String], source_id: &str, out: &mut Collector) {
        for raw in declared {
            match normalize_target(source_id, raw, &self.extensions) {
                Ok(t) => out.push(Relation {
                    source: source_id.to_string(),
                    target: t.id,
                    kind: RelationKind::DeclaredRelation,
                    anchor: t.anchor,
                    line: None,
                }),
                Err(reason) => log_skip(source_id, raw, reason),
            }
        }
    }
}

impl Default for MarkdownExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationExtractor for MarkdownExtractor {
    fn extract(
        &self,
        content: &str,
        declared: &[String],
        source_id: &str,
    ) -> Result<Vec<Relation>> {
        let mut out = Collector::default();
        self.inline_links(content, source_id, &mut out);
        self.declared(declared, source_id, &mut out);
        Ok(out.relations)
    }
}

/// Keeps first occurrence per (target, kind, anchor).
#[derive(Default)]
struct Collector {
    seen: HashSet<(String, RelationKind, Option<String>)>,
    relations: Vec<Relation>,
}

impl Collector {
    fn push(&mut self, relation: Relation) {
        let key = (
            relation.target.clone(),
            relation.kind,
            relation.anchor.clone(),
        );
        if self.seen.insert(key) {
            self.relations.push(relation);
        }
    }
}

fn node_line(node: &AstNode<'_>) -> usize {
    let line = node.data.borrow().sourcepos.start.line;
    (line as usize).max(1)
}

fn log_skip(source_id: &str, raw: &str, reason: SkipReason) {
    match reason {
        SkipReason::Malformed | SkipReason::OutOfRoot => {
            tracing::warn!("{}: skipping link {:?} ({})", source_id, raw, reason)
        }
        _ => debug!("{}: skipping link {:?} ({})", source_id, raw, reason),
    }
}
