//! YAML front matter for markdown documents.
//!
//! Only the keys the engine consumes are read: `title`, `summary`
//! (or `description`), `promotion` (or `tier`) and `related` (or
//! `related_documents`). Other keys are ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// A leading `---` fence closed by `---` or `...`.
static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?(?:---|\.\.\.)[ \t]*(?:\r?\n|\z)").unwrap()
});

/// Recognised front-matter fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "description")]
    pub summary: Option<String>,
    #[serde(default, alias = "tier")]
    pub promotion: Option<String>,
    #[serde(default, alias = "related_documents", deserialize_with = "one_or_many")]
    pub related: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let items = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(item)) => vec![item],
        Some(OneOrMany::Many(items)) => items,
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

/// Split a document into its parsed front matter and its body.
///
/// Content without a closed leading fence has no front matter and is
/// returned whole. A fenced header that is not valid YAML yields the
/// parse error; the body after the fence is returned either way.
pub fn split_front_matter(input: &str) -> (Result<FrontMatter, serde_yaml::Error>, &str) {
    let Some(caps) = FENCE_RE.captures(input) else {
        return (Ok(FrontMatter::default()), input);
    };
    let body = caps.get(0).map_or(input, |m| &input[m.end()..]);
    let header = caps.get(1).map_or("", |m| m.as_str());
    if header.trim().is_empty() {
        return (Ok(FrontMatter::default()), body);
    }
    (serde_yaml::from_str(header), body)
}
