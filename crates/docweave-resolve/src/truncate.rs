//! Content truncation at paragraph or word boundaries.

/// Appended to content cut by [`truncate_content`].
pub const TRUNCATION_MARKER: &str = "\n\n[… truncated]";

/// Cut `content` to at most `budget` characters (plus the marker).
///
/// Prefers the last paragraph break within the budget, then the last
/// whitespace, as long as either falls in the second half of the budget;
/// otherwise cuts hard at the budget. Returns the text and whether it was
/// truncated.
pub fn truncate_content(content: &str, budget: usize) -> (String, bool) {
    let Some((end, _)) = content.char_indices().nth(budget) else {
        return (content.to_string(), false);
    };
    let half = content
        .char_indices()
        .nth(budget / 2)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let prefix = &content[..end];
    let rest = &content[end..];

    let cut = if rest.starts_with("\n\n") {
        end
    } else if let Some(p) = prefix.rfind("\n\n").filter(|p| *p >= half) {
        p
    } else if rest.starts_with(char::is_whitespace) {
        end
    } else if let Some(p) = prefix.rfind(char::is_whitespace).filter(|p| *p >= half) {
        p
    } else {
        end
    };

    let mut out = prefix[..cut].trim_end().to_string();
    out.push_str(TRUNCATION_MARKER);
    (out, true)
}
