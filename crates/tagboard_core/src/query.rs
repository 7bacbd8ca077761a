//! Query resolution over cached notes.
//!
//! # Responsibility
//! - Classify a raw query string into its resolution strategy.
//! - Resolve tag, date and fulltext queries against a note snapshot.
//!
//! # Invariants
//! - Resolution is pure over its inputs; it never fetches.
//! - Tag queries expand to the tag's whole subtree and additionally match
//!   the query text as a substring, so prose mentions surface too.
//! - Results are ordered by timestamp with a stable sort, so equal
//!   timestamps keep cache order.

use crate::forest::TagForest;
use crate::model::note::Note;
use crate::model::tag::TagCategory;
use crate::parser;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Resolution strategy for one query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Sigiled tag query, descendant-expanded.
    Tag,
    /// `YYYY-MM-DD` journal day.
    Date,
    /// Case-insensitive substring search.
    Fulltext,
}

/// Maps a query string to its strategy.
pub fn classify_query(query: &str) -> QueryKind {
    match parser::classify(query) {
        TagCategory::Journal => QueryKind::Date,
        TagCategory::Fulltext => QueryKind::Fulltext,
        _ => QueryKind::Tag,
    }
}

/// Resolves `query` against a note snapshot.
pub fn resolve(notes: &[Note], forest: &TagForest, query: &str) -> Vec<Note> {
    let mut matched: Vec<Note> = match classify_query(query) {
        QueryKind::Date => match NaiveDate::parse_from_str(query, "%Y-%m-%d") {
            Ok(date) => notes
                .iter()
                .filter(|note| note.date == date)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        },
        QueryKind::Tag => {
            let mut wanted: BTreeSet<String> = forest.descendants_of(query);
            wanted.insert(query.to_string());
            let needle = query.to_lowercase();
            notes
                .iter()
                .filter(|note| {
                    note.tags.iter().any(|tag| wanted.contains(tag))
                        || note.text.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect()
        }
        QueryKind::Fulltext => {
            let needle = query.to_lowercase();
            if needle.is_empty() {
                Vec::new()
            } else {
                notes
                    .iter()
                    .filter(|note| note.text.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            }
        }
    };

    matched.sort_by_key(|note| note.timestamp);
    matched
}
