use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern is a valid regex"))
}

/// Removes HTML-like tags and trims the result. Applying it twice yields the
/// same text as applying it once.
pub fn strip_markup(raw: &str) -> String {
    let without_tags = tag_pattern().replace_all(raw, "");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}
