//! Tag domain model and category table.
//!
//! # Responsibility
//! - Define the tag record used by the forest and the tag registry.
//! - Own the fixed sigil/category table consumed by the parser.
//!
//! # Invariants
//! - `name` includes its leading sigil (when the category has one).
//! - `category` is never stored; it is derived from `name` on demand so no
//!   two call sites can drift apart.
//! - A tag's `parent`, if set, names another tag; cycles are rejected at the
//!   mutation boundary.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Typed tag category, derived from the name's sigil or date shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagCategory {
    /// `#` project tags.
    Projects,
    /// `@` person tags.
    Persons,
    /// `>` event tags.
    Events,
    /// `+` generic tags.
    Generic,
    /// Bare `YYYY-MM-DD` journal dates.
    Journal,
    /// Anything else; resolved as a substring search.
    Fulltext,
}

impl TagCategory {
    /// All categories, sigiled first.
    pub const ALL: [TagCategory; 6] = [
        TagCategory::Projects,
        TagCategory::Persons,
        TagCategory::Events,
        TagCategory::Generic,
        TagCategory::Journal,
        TagCategory::Fulltext,
    ];

    /// Returns the leading sigil for sigiled categories.
    pub fn sigil(self) -> Option<char> {
        match self {
            TagCategory::Projects => Some('#'),
            TagCategory::Persons => Some('@'),
            TagCategory::Events => Some('>'),
            TagCategory::Generic => Some('+'),
            TagCategory::Journal | TagCategory::Fulltext => None,
        }
    }

    /// Maps a sigil character back to its category.
    pub fn from_sigil(sigil: char) -> Option<TagCategory> {
        match sigil {
            '#' => Some(TagCategory::Projects),
            '@' => Some(TagCategory::Persons),
            '>' => Some(TagCategory::Events),
            '+' => Some(TagCategory::Generic),
            _ => None,
        }
    }

    /// Stable name used in REST paths and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            TagCategory::Projects => "Projects",
            TagCategory::Persons => "Persons",
            TagCategory::Events => "Events",
            TagCategory::Generic => "Generic",
            TagCategory::Journal => "Journal",
            TagCategory::Fulltext => "Fulltext",
        }
    }
}

impl Display for TagCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the flat tag registry.
///
/// The forest is rebuilt from a list of these on every tag reload; the
/// record itself never carries tree structure beyond the `parent` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Full token including its sigil, e.g. `#errands`.
    pub name: String,
    /// Optional parent tag name. Dangling parents are tolerated.
    pub parent: Option<String>,
    /// Whether this tag renders in the hierarchical tree view.
    #[serde(default)]
    pub treed: bool,
    /// Optional free-text annotation; annotated tags survive note removal.
    pub content: Option<String>,
}

impl Tag {
    /// Creates a fresh registry entry with default visibility and no parent.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            treed: false,
            content: None,
        }
    }

    /// Derives the category from the tag name.
    pub fn category(&self) -> TagCategory {
        crate::parser::classify(&self.name)
    }

    /// Returns the name without its category sigil.
    pub fn bare_name(&self) -> &str {
        crate::parser::bare_name(&self.name)
    }

    /// Returns whether this tag carries a non-blank annotation.
    pub fn has_annotation(&self) -> bool {
        self.content
            .as_deref()
            .is_some_and(|content| !content.trim().is_empty())
    }
}
