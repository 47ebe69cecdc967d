//! Link target normalization: raw link text → canonical document id.

use std::fmt;

/// A normalized link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub anchor: Option<String>,
}

/// Why a raw target was not turned into a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Absolute URL (`https:`, `mailto:`, `//host`).
    External,
    /// `#anchor` or a path resolving back to the source document.
    SameDocument,
    /// `..` climbs above the indexed root.
    OutOfRoot,
    /// Not a document extension the extractor indexes.
    UnsupportedExtension,
    Malformed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::External => "external url",
            Self::SameDocument => "same-document reference",
            Self::OutOfRoot => "target outside indexed root",
            Self::UnsupportedExtension => "unsupported extension",
            Self::Malformed => "malformed target",
        };
        f.write_str(s)
    }
}

/// Normalize `raw` as written in `source_id`.
///
/// Relative paths resolve against the source's directory, a leading `/`
/// resolves against the root. `.` and `..` segments are collapsed; climbing
/// past the root is rejected. A `#fragment` is split off as the anchor and
/// a `?query` is dropped.
pub fn normalize_target(
    source_id: &str,
    raw: &str,
    extensions: &[&str],
) -> std::result::Result<Target, SkipReason> {
    let raw = raw.trim().trim_start_matches('<').trim_end_matches('>');
    if raw.is_empty() || raw.chars().any(char::is_control) {
        return Err(SkipReason::Malformed);
    }
    if raw.starts_with('#') {
        return Err(SkipReason::SameDocument);
    }
    if raw.starts_with("//") || has_scheme(raw) {
        return Err(SkipReason::External);
    }

    let (path_part, anchor) = match raw.split_once('#') {
        Some((p, a)) => (p, Some(a.to_string()).filter(|a| !a.is_empty())),
        None => (raw, None),
    };
    let path_part = path_part.split('?').next().unwrap_or("");
    let path_part = path_part.replace("%20", " ");
    if path_part.is_empty() {
        return Err(SkipReason::Malformed);
    }

    let mut segments: Vec<&str> = Vec::new();
    if !path_part.starts_with('/') {
        if let Some((dir, _)) = source_id.rsplit_once('/') {
            segments.extend(dir.split('/').filter(|s| !s.is_empty()));
        }
    }
    for segment in path_part.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(SkipReason::OutOfRoot);
                }
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Err(SkipReason::Malformed);
    }

    let id = segments.join("/");
    let ext = id
        .rsplit_once('.')
        .map(|(_, e)| e.to_lowercase())
        .unwrap_or_default();
    if !extensions.iter().any(|allowed| *allowed == ext) {
        return Err(SkipReason::UnsupportedExtension);
    }
    if id == source_id {
        return Err(SkipReason::SameDocument);
    }
    Ok(Target { id, anchor })
}

fn has_scheme(raw: &str) -> bool {
    match raw.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
