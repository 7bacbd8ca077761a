//! Local note and tag cache over a backend.
//!
//! # Responsibility
//! - Cache notes and the tag registry fetched from the backend.
//! - Drive every backend mutation and fold its side effects back into the
//!   cache in one step.
//! - Track which queries have already been hydrated from the backend.
//!
//! # Invariants
//! - The cache never holds two notes with the same id; merges replace in
//!   place and otherwise append, preserving insertion order.
//! - A query is marked loaded only after its fetch succeeded.
//! - Backend failures leave the cache untouched.
//!
//! # See also
//! - [`crate::backend`] for the trait this layer drives.
//! - [`crate::query`] for resolution over the cached notes.

use crate::backend::{BackendError, NoteBackend, TagTreePatch};
use crate::model::note::{Note, NoteId};
use crate::model::tag::{Tag, TagCategory};
use crate::parser;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the caching layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Backend(BackendError),
    NoteNotFound(NoteId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Backend(inner) => write!(f, "backend error: {inner}"),
            StoreError::NoteNotFound(id) => write!(f, "note not in cache: {id}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Backend(inner) => Some(inner),
            StoreError::NoteNotFound(_) => None,
        }
    }
}

impl From<BackendError> for StoreError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::NoteNotFound(id) => StoreError::NoteNotFound(id),
            other => StoreError::Backend(other),
        }
    }
}

/// Cached view of the backend's notes and tags.
pub struct NoteStore<B: NoteBackend> {
    backend: B,
    notes: Vec<Note>,
    tags: Vec<Tag>,
    loaded_queries: BTreeSet<String>,
}

impl<B: NoteBackend> NoteStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            notes: Vec::new(),
            tags: Vec::new(),
            loaded_queries: BTreeSet::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Initial hydration: tag registry plus all task notes.
    pub fn load(&mut self) -> StoreResult<()> {
        let tags = self.backend.list_tags()?;
        let tasks = self.backend.list_tasks()?;
        self.tags = tags;
        self.merge_notes(tasks);
        Ok(())
    }

    /// Folds fetched notes into the cache, replacing by id.
    fn merge_notes(&mut self, fetched: Vec<Note>) {
        for note in fetched {
            match self.notes.iter_mut().find(|cached| cached.id == note.id) {
                Some(cached) => *cached = note,
                None => self.notes.push(note),
            }
        }
    }

    /// Hydrates one query's notes from the backend, once.
    ///
    /// Fulltext queries resolve purely against the cache and never hit the
    /// backend.
    pub fn ensure_query_loaded(&mut self, query: &str) -> StoreResult<()> {
        let category = parser::classify(query);
        if category == TagCategory::Fulltext {
            return Ok(());
        }
        if self.loaded_queries.contains(query) {
            return Ok(());
        }
        let fetched = self
            .backend
            .notes_by_query(category, parser::bare_name(query))?;
        self.merge_notes(fetched);
        self.loaded_queries.insert(query.to_string());
        Ok(())
    }

    pub fn create(&mut self, text: &str, date: NaiveDate) -> StoreResult<Note> {
        let patch = self.backend.create_note(text, date)?;
        self.tags.extend(patch.new_tags);
        self.merge_notes(vec![patch.note.clone()]);
        Ok(patch.note)
    }

    pub fn edit(&mut self, id: NoteId, text: &str, date: Option<NaiveDate>) -> StoreResult<Note> {
        let patch = self.backend.patch_note(id, text, date)?;
        self.tags.extend(patch.new_tags);
        self.tags
            .retain(|tag| !patch.removed_tags.contains(&tag.name));
        self.merge_notes(vec![patch.note.clone()]);
        Ok(patch.note)
    }

    /// Deletes a note and returns the tag names the backend garbage-collected.
    pub fn delete(&mut self, id: NoteId) -> StoreResult<Vec<String>> {
        let deleted = self.backend.delete_note(id)?;
        self.notes.retain(|note| note.id != id);
        self.tags
            .retain(|tag| !deleted.removed_tags.contains(&tag.name));
        Ok(deleted.removed_tags)
    }

    /// Cached task notes, in cache order.
    pub fn tasks(&self) -> Vec<&Note> {
        self.notes.iter().filter(|note| note.is_task()).collect()
    }

    /// Refetches the tag registry, replacing the cached snapshot.
    pub fn reload_tags(&mut self) -> StoreResult<()> {
        self.tags = self.backend.list_tags()?;
        Ok(())
    }

    /// Applies a structural tag patch and mirrors its ripple effects locally.
    pub fn update_tag_tree(&mut self, name: &str, patch: &TagTreePatch) -> StoreResult<Tag> {
        let category = parser::classify(name);
        let bare = parser::bare_name(name).to_string();
        let updated = self.backend.patch_tag_tree(category, &bare, patch)?;

        if updated.name != name {
            for note in &mut self.notes {
                if note.has_tag(name) {
                    note.text = parser::replace_token(&note.text, name, &updated.name);
                    for tag in &mut note.tags {
                        if tag == name {
                            *tag = updated.name.clone();
                        }
                    }
                }
            }
        }
        self.reload_tags()?;
        Ok(updated)
    }

    /// Cached note counts per day of one month, zero-filled for empty days.
    pub fn note_counts_for_month(&self, year: i32, month: u32) -> BTreeMap<NaiveDate, usize> {
        (1..=31)
            .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
            .map(|date| {
                let count = self.notes.iter().filter(|note| note.date == date).count();
                (date, count)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteStore, StoreError};
    use crate::backend::{BackendError, MemoryBackend, NoteBackend};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn store() -> NoteStore<MemoryBackend> {
        let mut backend = MemoryBackend::new();
        backend.set_today(day(10));
        backend.signin("admin", "admin123").unwrap();
        NoteStore::new(backend)
    }

    #[test]
    fn create_mirrors_note_and_new_tags() {
        let mut store = store();
        let note = store.create("plan #trip", day(1)).unwrap();
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.tags().len(), 1);
        assert_eq!(store.get(note.id).map(|n| n.text.as_str()), Some("plan #trip"));
    }

    #[test]
    fn merge_replaces_in_place_keeping_order() {
        let mut store = store();
        let first = store.create("first #a", day(1)).unwrap();
        store.create("second #b", day(1)).unwrap();
        store.edit(first.id, "first edited #a", None).unwrap();
        assert_eq!(store.notes()[0].text, "first edited #a");
        assert_eq!(store.notes().len(), 2);
    }

    #[test]
    fn fulltext_query_never_hits_the_backend() {
        let mut store = store();
        store.backend().fail_next(BackendError::Transport("down".to_string()));
        assert!(store.ensure_query_loaded("milk").is_ok());
    }

    #[test]
    fn failed_hydration_is_retried_next_time() {
        let mut store = store();
        store.create("note #proj", day(1)).unwrap();
        store.backend().fail_next(BackendError::Transport("down".to_string()));
        assert!(store.ensure_query_loaded("#proj").is_err());
        assert!(store.ensure_query_loaded("#proj").is_ok());
    }

    #[test]
    fn missing_note_maps_to_store_error() {
        let mut store = store();
        let missing = Uuid::new_v4();
        assert_eq!(
            store.edit(missing, "text", None),
            Err(StoreError::NoteNotFound(missing))
        );
    }

    #[test]
    fn month_counts_are_zero_filled() {
        let mut store = store();
        store.create("a", day(5)).unwrap();
        store.create("b", day(5)).unwrap();
        let counts = store.note_counts_for_month(2024, 3);
        assert_eq!(counts.len(), 31);
        assert_eq!(counts.get(&day(5)), Some(&2));
        assert_eq!(counts.get(&day(6)), Some(&0));
    }
}
