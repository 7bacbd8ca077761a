//! Tag token extraction and classification.
//!
//! # Responsibility
//! - Extract typed tag tokens from raw note text.
//! - Provide the single category dispatch used everywhere in the engine.
//! - Detect leading journal dates in freshly typed text.
//!
//! # Invariants
//! - Extraction is pure; it never consults or mutates engine state.
//! - Malformed or partial tokens are simply not matched, never an error.
//! - Tokens are deduplicated by exact string, first-seen order preserved.

use crate::model::tag::TagCategory;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub mod priority;

/// Tokens are a sigil plus identifier characters. Delimited scan requires a
/// trailing separator so an in-progress token is not matched mid-keystroke.
static TAG_DELIMITED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([#@>+])([A-Za-z0-9_.\-]+)[ ,.;:]").expect("valid delimited tag regex"));
static TAG_IMMEDIATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([#@>+])([A-Za-z0-9_.\-]+)").expect("valid immediate tag regex"));
static DATE_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date shape regex"));
static LEADING_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})\b").expect("valid leading date regex"));

/// Extraction mode for [`extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagScan {
    /// Requires a trailing space or `, . ; :` after the token. Used while
    /// scanning text that is still being typed.
    Delimited,
    /// Matches without a trailing delimiter. Used for saved note text so a
    /// tag at the very end of a note is always recognized.
    Immediate,
}

/// Extracts tag tokens from `text`, deduplicated in first-seen order.
pub fn extract(text: &str, scan: TagScan) -> Vec<String> {
    let pattern = match scan {
        TagScan::Delimited => &TAG_DELIMITED_RE,
        TagScan::Immediate => &TAG_IMMEDIATE_RE,
    };

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for caps in pattern.captures_iter(text) {
        let token = format!("{}{}", &caps[1], &caps[2]);
        if seen.insert(token.clone()) {
            found.push(token);
        }
    }
    found
}

/// Classifies one token into its category.
///
/// This is the only place in the engine that inspects sigils or date shapes;
/// every other layer goes through it.
pub fn classify(token: &str) -> TagCategory {
    if let Some(sigil) = token.chars().next() {
        if let Some(category) = TagCategory::from_sigil(sigil) {
            return category;
        }
    }
    if DATE_SHAPE_RE.is_match(token) && NaiveDate::parse_from_str(token, "%Y-%m-%d").is_ok() {
        return TagCategory::Journal;
    }
    TagCategory::Fulltext
}

/// Strips the category sigil, returning the identifier the remote service
/// expects in its URL paths. Journal and fulltext tokens pass through.
pub fn bare_name(token: &str) -> &str {
    match token.chars().next() {
        Some(sigil) if TagCategory::from_sigil(sigil).is_some() => &token[sigil.len_utf8()..],
        _ => token,
    }
}

/// Returns the journal date anchored at the very start of trimmed text.
///
/// A date appearing mid-text is not a leading date.
pub fn leading_date(text: &str) -> Option<NaiveDate> {
    let caps = LEADING_DATE_RE.captures(text.trim())?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}

/// Replaces whole-token occurrences of `old` with `new`.
///
/// An occurrence followed by another identifier character is a longer token
/// that merely shares the prefix and is left untouched, so renaming `#a`
/// never corrupts `#ab`.
pub fn replace_token(text: &str, old: &str, new: &str) -> String {
    if old.is_empty() {
        return text.to_string();
    }
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(old) {
        let after = &rest[pos + old.len()..];
        result.push_str(&rest[..pos]);
        if after.chars().next().map_or(true, |c| !is_token_char(c)) {
            result.push_str(new);
        } else {
            result.push_str(old);
        }
        rest = after;
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::{bare_name, classify, extract, leading_date, TagScan};
    use crate::model::tag::TagCategory;

    #[test]
    fn delimited_scan_skips_token_still_being_typed() {
        let found = extract("call @alice about #errand", TagScan::Delimited);
        assert_eq!(found, vec!["@alice".to_string()]);
    }

    #[test]
    fn immediate_scan_matches_trailing_token() {
        let found = extract("call @alice about #errand", TagScan::Immediate);
        assert_eq!(found, vec!["@alice".to_string(), "#errand".to_string()]);
    }

    #[test]
    fn extraction_deduplicates_preserving_first_seen_order() {
        let found = extract("#b #a #b #a ", TagScan::Delimited);
        assert_eq!(found, vec!["#b".to_string(), "#a".to_string()]);
    }

    #[test]
    fn bare_sigil_without_identifier_is_not_a_token() {
        assert!(extract("# and @ and > and + ", TagScan::Delimited).is_empty());
    }

    #[test]
    fn classify_follows_the_sigil_table() {
        assert_eq!(classify("#proj"), TagCategory::Projects);
        assert_eq!(classify("@alice"), TagCategory::Persons);
        assert_eq!(classify(">standup"), TagCategory::Events);
        assert_eq!(classify("+idea"), TagCategory::Generic);
        assert_eq!(classify("2024-01-05"), TagCategory::Journal);
        assert_eq!(classify("milk"), TagCategory::Fulltext);
    }

    #[test]
    fn date_shaped_but_invalid_calendar_date_is_fulltext() {
        assert_eq!(classify("2024-13-99"), TagCategory::Fulltext);
    }

    #[test]
    fn bare_name_strips_sigil_for_sigiled_categories_only() {
        assert_eq!(bare_name("#proj"), "proj");
        assert_eq!(bare_name("@alice"), "alice");
        assert_eq!(bare_name("2024-01-05"), "2024-01-05");
        assert_eq!(bare_name("milk"), "milk");
    }

    #[test]
    fn replace_token_respects_token_boundaries() {
        use super::replace_token;
        assert_eq!(
            replace_token("work on #a and #ab today", "#a", "#x"),
            "work on #x and #ab today"
        );
        assert_eq!(replace_token("#a, then (#a)", "#a", "#xyz"), "#xyz, then (#xyz)");
        assert_eq!(replace_token("ends with #a", "#a", "#x"), "ends with #x");
    }

    #[test]
    fn leading_date_anchors_at_start_only() {
        assert!(leading_date("note about 2024-01-05 meeting").is_none());
        assert_eq!(
            leading_date("  2024-01-05 standup notes"),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }
}
