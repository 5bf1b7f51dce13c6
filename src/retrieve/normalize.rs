// src/retrieve/normalize.rs
//! Raw provider records → `ContentItem`.
//!
//! Two layers:
//! - `clean_text` works on raw scraped/API strings (entities, tags, quotes, whitespace).
//! - `normalize_item` works on already-built items and is idempotent.

use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

use super::types::ContentItem;

/// Max characters kept from any single raw field.
pub const MAX_FIELD_CHARS: usize = 1500;

/// A provider-specific record before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub link: Option<String>,
}

/// Clean a raw field: decode entities, strip tags, fold typographic quotes,
/// collapse whitespace, cap length.
pub fn clean_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace + cap
    let mut out = collapse_ws(&out);
    if out.chars().count() > MAX_FIELD_CHARS {
        out = out.chars().take(MAX_FIELD_CHARS).collect();
        out.truncate(out.trim_end().len());
    }
    out
}

/// Collapse runs of whitespace (incl. NBSP) into single spaces and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve `link` to an absolute URL. Relative links are joined onto `base`.
/// Returns `None` for blank links or relative links without a base.
pub fn resolve_link(link: &str, base: Option<&Url>) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    match Url::parse(link) {
        Ok(u) => Some(u.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.and_then(|b| b.join(link).ok()).map(|u| u.to_string())
        }
        Err(_) => None,
    }
}

/// Build a validated item from a raw record. Missing title, snippet or link → `None`.
pub fn normalize_record(
    provider: &str,
    seq: usize,
    raw: RawRecord,
    base: Option<&Url>,
) -> Option<ContentItem> {
    let title = raw.title.as_deref().map(clean_text).filter(|t| !t.is_empty())?;
    let snippet = raw
        .snippet
        .as_deref()
        .map(clean_text)
        .filter(|s| !s.is_empty())?;
    let link = raw.link?;

    normalize_item(
        ContentItem {
            id: format!("{provider}-{seq}"),
            text: format!("{title}. {snippet}"),
            source: link,
            title: Some(title),
        },
        base,
    )
}

/// Trim/collapse fields and resolve the source. Applying it twice is a no-op.
pub fn normalize_item(item: ContentItem, base: Option<&Url>) -> Option<ContentItem> {
    let text = collapse_ws(&item.text);
    if text.is_empty() {
        return None;
    }
    let title = match item.title {
        Some(t) => {
            let t = collapse_ws(&t);
            if t.is_empty() {
                return None;
            }
            Some(t)
        }
        None => None,
    };
    let source = resolve_link(&item.source, base)?;

    Some(ContentItem {
        id: item.id.trim().to_string(),
        text,
        source,
        title,
    })
}
