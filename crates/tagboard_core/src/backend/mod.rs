//! Backend abstraction over the remote note service.
//!
//! # Responsibility
//! - Define the trait the store drives for every remote operation.
//! - Define the backend error surface shared by all implementations.
//!
//! # Invariants
//! - Backend operations are all-or-nothing; a failed call leaves the remote
//!   state untouched.
//! - `Unauthorized` is the one error callers must treat as session-fatal.
//!
//! # See also
//! - [`memory`] for the in-process implementation used by tests and the CLI.
//! - [`crate::store`] for the caching layer on top of this trait.

use crate::model::note::{Note, NoteId};
use crate::model::tag::{Tag, TagCategory};
use chrono::NaiveDate;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod session;

pub use memory::MemoryBackend;
pub use session::{SessionCache, SessionToken};

pub type BackendResult<T> = Result<T, BackendError>;

/// Errors surfaced by a backend implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The session token is missing or no longer valid.
    Unauthorized,
    /// Sign-in rejected the supplied credentials.
    InvalidCredentials,
    NoteNotFound(NoteId),
    TagNotFound(String),
    /// The category cannot be used for this operation (e.g. fulltext has no
    /// remote representation).
    UnsupportedCategory(TagCategory),
    InvalidDate(String),
    /// Reparenting would make the tag an ancestor of itself.
    CycleDetected { tag: String, parent: String },
    /// Network-level failure talking to the service.
    Transport(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Unauthorized => write!(f, "session is not authorized"),
            BackendError::InvalidCredentials => write!(f, "invalid username or password"),
            BackendError::NoteNotFound(id) => write!(f, "note not found: {id}"),
            BackendError::TagNotFound(name) => write!(f, "tag not found: {name}"),
            BackendError::UnsupportedCategory(category) => {
                write!(f, "category has no remote representation: {category}")
            }
            BackendError::InvalidDate(raw) => write!(f, "invalid date: {raw}"),
            BackendError::CycleDetected { tag, parent } => {
                write!(f, "reparenting {tag} under {parent} would create a cycle")
            }
            BackendError::Transport(detail) => write!(f, "transport failure: {detail}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Structural edit applied to one tag.
///
/// Fields left `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTreePatch {
    pub treed: Option<bool>,
    /// `Some(None)` detaches the tag from its parent.
    pub parent: Option<Option<String>>,
    pub content: Option<Option<String>>,
    /// New bare name; renames ripple through note texts and children.
    pub rename: Option<String>,
}

/// Result of creating or editing a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePatch {
    pub note: Note,
    /// Tags auto-created because the note text introduced them.
    pub new_tags: Vec<Tag>,
    /// Tags garbage-collected because no note or annotation holds them.
    pub removed_tags: Vec<String>,
}

/// Result of deleting a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedNote {
    pub note: Note,
    pub removed_tags: Vec<String>,
}

/// Remote note service operations.
///
/// The store is generic over this trait; swapping in [`MemoryBackend`] gives
/// a fully offline engine.
pub trait NoteBackend {
    /// Exchanges credentials for a session token.
    fn signin(&mut self, username: &str, password: &str) -> BackendResult<SessionToken>;

    /// Full tag registry snapshot.
    fn list_tags(&self) -> BackendResult<Vec<Tag>>;

    /// All notes carrying a task marker.
    fn list_tasks(&self) -> BackendResult<Vec<Note>>;

    /// Notes matching one tag or journal query, descendant-expanded for
    /// sigiled categories and sorted by `(date, timestamp)`.
    fn notes_by_query(&self, category: TagCategory, bare: &str) -> BackendResult<Vec<Note>>;

    /// Creates a note, deriving tags and task state from the text.
    fn create_note(&mut self, text: &str, date: NaiveDate) -> BackendResult<NotePatch>;

    /// Replaces a note's text (and optionally its date), rederiving tags.
    fn patch_note(
        &mut self,
        id: NoteId,
        text: &str,
        date: Option<NaiveDate>,
    ) -> BackendResult<NotePatch>;

    /// Deletes a note, garbage-collecting tags it alone held.
    fn delete_note(&mut self, id: NoteId) -> BackendResult<DeletedNote>;

    /// Applies a structural patch to one tag.
    fn patch_tag_tree(
        &mut self,
        category: TagCategory,
        bare: &str,
        patch: &TagTreePatch,
    ) -> BackendResult<Tag>;
}
