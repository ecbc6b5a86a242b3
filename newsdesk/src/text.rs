use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("valid entity regex"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Strips markup tags and HTML entity escapes, collapses whitespace runs to a
/// single space and trims the result. Total: any input yields a string.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    // Tags become spaces so adjacent block elements don't glue words together.
    let without_tags = TAG_RE.replace_all(raw, " ");
    let without_entities = ENTITY_RE.replace_all(&without_tags, "");
    SPACE_RE.replace_all(&without_entities, " ").trim().to_string()
}

/// Same as [`normalize`] for optional input; absent text yields "".
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}
