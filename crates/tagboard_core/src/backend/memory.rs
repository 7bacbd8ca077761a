//! In-process backend implementation.
//!
//! # Responsibility
//! - Implement the full [`NoteBackend`] contract against in-memory state.
//! - Mirror the remote service's side effects: tag auto-creation, tag
//!   garbage collection, rename rippling, descendant-expanded queries.
//!
//! # Invariants
//! - Every mutation validates completely before touching state, so a failed
//!   call leaves notes and tags exactly as they were.
//! - Timestamps are strictly increasing across created notes.

use crate::backend::session::SessionToken;
use crate::backend::{
    BackendError, BackendResult, DeletedNote, NoteBackend, NotePatch, TagTreePatch,
};
use crate::model::note::{Note, NoteId};
use crate::model::tag::{Tag, TagCategory};
use crate::parser::{self, priority, TagScan};
use chrono::{Local, NaiveDate};
use std::cell::RefCell;
use std::collections::HashSet;
use uuid::Uuid;

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin123";

/// Offline [`NoteBackend`] used by the CLI and the test suite.
#[derive(Debug)]
pub struct MemoryBackend {
    notes: Vec<Note>,
    tags: Vec<Tag>,
    username: String,
    password: String,
    now_ms: i64,
    today: NaiveDate,
    fault: RefCell<Option<BackendError>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            tags: Vec::new(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            now_ms: 1_700_000_000_000,
            today: Local::now().date_naive(),
            fault: RefCell::new(None),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the date relative due tokens resolve against.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Arms a one-shot fault; the next backend call fails with it.
    pub fn fail_next(&self, error: BackendError) {
        *self.fault.borrow_mut() = Some(error);
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    fn take_fault(&self) -> BackendResult<()> {
        match self.fault.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn next_timestamp(&mut self) -> i64 {
        self.now_ms += 1_000;
        self.now_ms
    }

    fn tag_index(&self, name: &str) -> Option<usize> {
        self.tags.iter().position(|tag| tag.name == name)
    }

    /// Creates registry entries for tokens the text just introduced.
    fn create_missing_tags(&mut self, tokens: &[String]) -> Vec<Tag> {
        let mut created = Vec::new();
        for token in tokens {
            if self.tag_index(token).is_none() {
                let tag = Tag::new(token.clone());
                created.push(tag.clone());
                self.tags.push(tag);
            }
        }
        created
    }

    /// Drops candidate tags no note references and no annotation protects.
    fn collect_orphaned_tags(&mut self, candidates: &[String]) -> Vec<String> {
        let mut removed = Vec::new();
        for token in candidates {
            let referenced = self.notes.iter().any(|note| note.has_tag(token));
            let annotated = self
                .tag_index(token)
                .map(|index| self.tags[index].has_annotation())
                .unwrap_or(false);
            if !referenced && !annotated {
                if let Some(index) = self.tag_index(token) {
                    self.tags.remove(index);
                    removed.push(token.clone());
                }
            }
        }
        removed
    }

    fn sigiled_token(category: TagCategory, bare: &str) -> BackendResult<String> {
        match category.sigil() {
            Some(sigil) => Ok(format!("{sigil}{bare}")),
            None => Err(BackendError::UnsupportedCategory(category)),
        }
    }

    /// Walks the parent chain from `parent` upward; hitting `tag` means the
    /// proposed link closes a cycle.
    fn would_create_cycle(&self, tag: &str, parent: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(parent.to_string());
        while let Some(name) = current {
            if name == tag {
                return true;
            }
            if !visited.insert(name.clone()) {
                return true;
            }
            current = self
                .tag_index(&name)
                .and_then(|index| self.tags[index].parent.clone());
        }
        false
    }

    fn sort_query_result(notes: &mut Vec<Note>) {
        notes.sort_by(|a, b| (a.date, a.timestamp).cmp(&(b.date, b.timestamp)));
    }
}

impl NoteBackend for MemoryBackend {
    fn signin(&mut self, username: &str, password: &str) -> BackendResult<SessionToken> {
        self.take_fault()?;
        if username == self.username && password == self.password {
            Ok(SessionToken::new(Uuid::new_v4().to_string()))
        } else {
            Err(BackendError::InvalidCredentials)
        }
    }

    fn list_tags(&self) -> BackendResult<Vec<Tag>> {
        self.take_fault()?;
        Ok(self.tags.clone())
    }

    fn list_tasks(&self) -> BackendResult<Vec<Note>> {
        self.take_fault()?;
        let mut tasks: Vec<Note> = self
            .notes
            .iter()
            .filter(|note| note.is_task())
            .cloned()
            .collect();
        Self::sort_query_result(&mut tasks);
        Ok(tasks)
    }

    fn notes_by_query(&self, category: TagCategory, bare: &str) -> BackendResult<Vec<Note>> {
        self.take_fault()?;
        match category {
            TagCategory::Fulltext => Err(BackendError::UnsupportedCategory(category)),
            TagCategory::Journal => {
                let date = NaiveDate::parse_from_str(bare, "%Y-%m-%d")
                    .map_err(|_| BackendError::InvalidDate(bare.to_string()))?;
                let mut matched: Vec<Note> = self
                    .notes
                    .iter()
                    .filter(|note| note.date == date)
                    .cloned()
                    .collect();
                Self::sort_query_result(&mut matched);
                Ok(matched)
            }
            _ => {
                let token = Self::sigiled_token(category, bare)?;
                if self.tag_index(&token).is_none() {
                    return Err(BackendError::TagNotFound(token));
                }

                // Expand to the whole subtree via the flat parent links.
                let mut wanted: HashSet<String> = HashSet::from([token]);
                loop {
                    let before = wanted.len();
                    for tag in &self.tags {
                        if let Some(parent) = tag.parent.as_deref() {
                            if wanted.contains(parent) {
                                wanted.insert(tag.name.clone());
                            }
                        }
                    }
                    if wanted.len() == before {
                        break;
                    }
                }

                let mut matched: Vec<Note> = self
                    .notes
                    .iter()
                    .filter(|note| note.tags.iter().any(|tag| wanted.contains(tag)))
                    .cloned()
                    .collect();
                Self::sort_query_result(&mut matched);
                Ok(matched)
            }
        }
    }

    fn create_note(&mut self, text: &str, date: NaiveDate) -> BackendResult<NotePatch> {
        self.take_fault()?;
        let annotation = priority::extract_task_annotation(text, self.today);
        let tags = parser::extract(&annotation.text, TagScan::Immediate);
        let note = Note {
            id: Uuid::new_v4(),
            text: annotation.text,
            date,
            timestamp: self.next_timestamp(),
            tags: tags.clone(),
            task: annotation.priority,
            duedate: annotation.duedate,
        };
        let new_tags = self.create_missing_tags(&tags);
        self.notes.push(note.clone());
        Ok(NotePatch {
            note,
            new_tags,
            removed_tags: Vec::new(),
        })
    }

    fn patch_note(
        &mut self,
        id: NoteId,
        text: &str,
        date: Option<NaiveDate>,
    ) -> BackendResult<NotePatch> {
        self.take_fault()?;
        let index = self
            .notes
            .iter()
            .position(|note| note.id == id)
            .ok_or(BackendError::NoteNotFound(id))?;

        let annotation = priority::extract_task_annotation(text, self.today);
        let tags = parser::extract(&annotation.text, TagScan::Immediate);
        let previous_tags = std::mem::take(&mut self.notes[index].tags);

        let note = &mut self.notes[index];
        note.text = annotation.text;
        note.task = annotation.priority;
        note.duedate = annotation.duedate;
        note.tags = tags.clone();
        if let Some(date) = date {
            note.date = date;
        }
        let note = note.clone();

        let new_tags = self.create_missing_tags(&tags);
        let dropped: Vec<String> = previous_tags
            .into_iter()
            .filter(|token| !tags.contains(token))
            .collect();
        let removed_tags = self.collect_orphaned_tags(&dropped);

        Ok(NotePatch {
            note,
            new_tags,
            removed_tags,
        })
    }

    fn delete_note(&mut self, id: NoteId) -> BackendResult<DeletedNote> {
        self.take_fault()?;
        let index = self
            .notes
            .iter()
            .position(|note| note.id == id)
            .ok_or(BackendError::NoteNotFound(id))?;
        let note = self.notes.remove(index);
        let removed_tags = self.collect_orphaned_tags(&note.tags.clone());
        Ok(DeletedNote { note, removed_tags })
    }

    fn patch_tag_tree(
        &mut self,
        category: TagCategory,
        bare: &str,
        patch: &TagTreePatch,
    ) -> BackendResult<Tag> {
        self.take_fault()?;
        let token = Self::sigiled_token(category, bare)?;
        let index = self
            .tag_index(&token)
            .ok_or_else(|| BackendError::TagNotFound(token.clone()))?;

        if let Some(Some(parent)) = &patch.parent {
            if self.tag_index(parent).is_none() {
                return Err(BackendError::TagNotFound(parent.clone()));
            }
            if self.would_create_cycle(&token, parent) {
                return Err(BackendError::CycleDetected {
                    tag: token,
                    parent: parent.clone(),
                });
            }
        }

        if let Some(treed) = patch.treed {
            self.tags[index].treed = treed;
        }
        if let Some(parent) = &patch.parent {
            self.tags[index].parent = parent.clone();
        }
        if let Some(content) = &patch.content {
            self.tags[index].content = content.clone();
        }

        if let Some(new_bare) = &patch.rename {
            let new_token = Self::sigiled_token(category, new_bare)?;
            self.tags[index].name = new_token.clone();
            for tag in &mut self.tags {
                if tag.parent.as_deref() == Some(token.as_str()) {
                    tag.parent = Some(new_token.clone());
                }
            }
            for note in &mut self.notes {
                if note.has_tag(&token) {
                    note.text = parser::replace_token(&note.text, &token, &new_token);
                    for tag in &mut note.tags {
                        if tag == &token {
                            *tag = new_token.clone();
                        }
                    }
                }
            }
        }

        Ok(self.tags[index].clone())
    }
}
