//! Engine facade tying the layers together.
//!
//! # Responsibility
//! - Apply user intents against the store, forest, views and subscriptions.
//! - Keep every open view's resolved notes current after mutations.
//! - Drive the typing debounce and spawn views from settled editor text.
//!
//! # Invariants
//! - All mutations go through [`Engine::apply`]; nothing mutates the layers
//!   behind its back.
//! - An `Unauthorized` backend error clears the session and all views before
//!   surfacing as [`EngineError::SessionExpired`].
//! - After any successful mutation, every open view is re-resolved and the
//!   affected cells are published.
//!
//! # See also
//! - [`crate::reactive`] for how render sinks observe the engine.

use crate::backend::{BackendError, NoteBackend, TagTreePatch};
use crate::forest::{TagForest, TaskBubbling};
use crate::model::note::{Note, NoteId};
use crate::model::tag::Tag;
use crate::parser::{self, TagScan};
use crate::query;
use crate::reactive::{ReactiveStore, StateCell};
use crate::store::{NoteStore, StoreError};
use crate::view::{CloseOutcome, OpenOutcome, TypingDebounce, ViewRegistry};
use chrono::NaiveDate;
use log::{info, warn};
use std::fmt::{Display, Formatter};

use crate::backend::SessionCache;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced to the embedding shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Store(StoreError),
    /// The session died; views were cleared and a fresh sign-in is needed.
    SessionExpired,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Store(inner) => write!(f, "engine store error: {inner}"),
            EngineError::SessionExpired => write!(f, "session expired; sign in again"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Store(inner) => Some(inner),
            EngineError::SessionExpired => None,
        }
    }
}

/// One user-level request against the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    OpenView { query: String },
    CloseView { query: String },
    ActivateView { query: String },
    MaximizeView { query: String },
    CreateNote { text: String, date: Option<NaiveDate> },
    EditNote { id: NoteId, text: String, date: Option<NaiveDate> },
    DeleteNote { id: NoteId },
    /// Flips whether the tag shows in the hierarchical tree.
    ToggleTagVisibility { name: String },
    EditTagTree { name: String, patch: TagTreePatch },
    /// Buffers editor text; views spawn later via [`Engine::tick`].
    EditorInput { text: String, at_ms: u64 },
}

/// What a successfully applied intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    ViewOpened(OpenOutcome),
    ViewClosed(CloseOutcome),
    ViewActivated,
    ViewMaximized(bool),
    NoteCreated(Note),
    NoteEdited(Note),
    NoteDeleted { removed_tag_keys: Vec<String> },
    TagUpdated(Tag),
    InputBuffered,
}

/// Orchestrates store, forest, views, debounce and subscriptions.
pub struct Engine<B: NoteBackend> {
    store: NoteStore<B>,
    forest: TagForest,
    views: ViewRegistry,
    reactive: ReactiveStore,
    debounce: TypingDebounce,
    session: SessionCache,
    today: NaiveDate,
}

impl<B: NoteBackend> Engine<B> {
    pub fn new(backend: B, reactive: ReactiveStore, today: NaiveDate) -> Self {
        Self {
            store: NoteStore::new(backend),
            forest: TagForest::default(),
            views: ViewRegistry::new(),
            reactive,
            debounce: TypingDebounce::default(),
            session: SessionCache::default(),
            today,
        }
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn forest(&self) -> &TagForest {
        &self.forest
    }

    pub fn store(&self) -> &NoteStore<B> {
        &self.store
    }

    pub fn reactive(&self) -> &ReactiveStore {
        &self.reactive
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Exchanges credentials for a session.
    pub fn signin(&mut self, username: &str, password: &str) -> EngineResult<()> {
        match self.store.backend_mut().signin(username, password) {
            Ok(token) => {
                self.session.set(token);
                info!("event=signin status=ok user={username}");
                Ok(())
            }
            Err(error) => {
                warn!("event=signin status=rejected user={username}");
                Err(EngineError::Store(StoreError::Backend(error)))
            }
        }
    }

    /// Initial hydration: seals subscriptions, loads tags and tasks, and
    /// opens the pinned journal view for today.
    pub fn load(&mut self) -> EngineResult<()> {
        if !self.session.is_authenticated() {
            return Err(EngineError::SessionExpired);
        }
        self.reactive.seal();
        self.store.load().map_err(|e| self.fail(e))?;
        self.forest = TagForest::build(self.store.tags());

        let today_query = self.today.format("%Y-%m-%d").to_string();
        self.store
            .ensure_query_loaded(&today_query)
            .map_err(|e| self.fail(e))?;
        let notes = query::resolve(self.store.notes(), &self.forest, &today_query);
        self.views.open(&today_query, notes);
        self.views.pin(&today_query);

        for cell in StateCell::ALL {
            self.reactive.publish(cell);
        }
        info!("event=load status=ok tags={} notes={}", self.forest.len(), self.store.notes().len());
        Ok(())
    }

    /// Applies one intent, publishing whatever it invalidated.
    pub fn apply(&mut self, intent: Intent) -> EngineResult<Applied> {
        match intent {
            Intent::OpenView { query } => self.open_view(&query).map(Applied::ViewOpened),
            Intent::CloseView { query } => {
                let outcome = self.views.close(&query);
                self.reactive.publish(StateCell::Views);
                Ok(Applied::ViewClosed(outcome))
            }
            Intent::ActivateView { query } => {
                self.views.activate(&query);
                self.reactive.publish(StateCell::Views);
                Ok(Applied::ViewActivated)
            }
            Intent::MaximizeView { query } => {
                let maximized = self.views.toggle_maximize(&query).unwrap_or(false);
                self.reactive.publish(StateCell::Views);
                Ok(Applied::ViewMaximized(maximized))
            }
            Intent::CreateNote { text, date } => self.create_note(&text, date),
            Intent::EditNote { id, text, date } => self.edit_note(id, &text, date),
            Intent::DeleteNote { id } => self.delete_note(id),
            Intent::ToggleTagVisibility { name } => self.toggle_tag_visibility(&name),
            Intent::EditTagTree { name, patch } => self.edit_tag_tree(&name, &patch),
            Intent::EditorInput { text, at_ms } => {
                self.debounce.input(&text, at_ms);
                Ok(Applied::InputBuffered)
            }
        }
    }

    /// Advances the debounce clock; settled editor text spawns views for
    /// every complete tag token and any leading journal date. Returns the
    /// queries that were opened.
    pub fn tick(&mut self, now_ms: u64) -> EngineResult<Vec<String>> {
        let Some(text) = self.debounce.poll(now_ms) else {
            return Ok(Vec::new());
        };

        let mut queries = Vec::new();
        if let Some(date) = parser::leading_date(&text) {
            queries.push(date.format("%Y-%m-%d").to_string());
        }
        queries.extend(parser::extract(&text, TagScan::Delimited));

        let mut opened = Vec::new();
        for query in queries {
            // Text still being typed can reference tags the backend has never
            // seen; skip those instead of aborting the whole scan.
            match self.open_view(&query) {
                Ok(_) => opened.push(query),
                Err(EngineError::SessionExpired) => return Err(EngineError::SessionExpired),
                Err(error) => {
                    warn!("event=view_open query={query} status=skipped error={error}");
                }
            }
        }
        Ok(opened)
    }

    /// Current task notes bubbled under their visible tags.
    pub fn task_bubbling(&self) -> TaskBubbling {
        let tasks: Vec<Note> = self
            .store
            .tasks()
            .into_iter()
            .cloned()
            .collect();
        self.forest.bubble_tasks(&tasks)
    }

    fn open_view(&mut self, query: &str) -> EngineResult<OpenOutcome> {
        self.store
            .ensure_query_loaded(query)
            .map_err(|e| self.fail(e))?;
        let notes = query::resolve(self.store.notes(), &self.forest, query);
        let outcome = self.views.open(query, notes);
        self.reactive.publish(StateCell::Views);
        info!("event=view_open query={query} outcome={outcome:?}");
        Ok(outcome)
    }

    fn create_note(&mut self, text: &str, date: Option<NaiveDate>) -> EngineResult<Applied> {
        let date = date
            .or_else(|| parser::leading_date(text))
            .unwrap_or(self.today);
        let note = self.store.create(text, date).map_err(|e| self.fail(e))?;
        self.refresh_after_mutation();
        info!("event=note_create id={} date={}", note.id, note.date);
        Ok(Applied::NoteCreated(note))
    }

    fn edit_note(
        &mut self,
        id: NoteId,
        text: &str,
        date: Option<NaiveDate>,
    ) -> EngineResult<Applied> {
        let note = self.store.edit(id, text, date).map_err(|e| self.fail(e))?;
        self.refresh_after_mutation();
        Ok(Applied::NoteEdited(note))
    }

    /// Deletes a note. Views that listed it stay open and simply re-resolve
    /// without it.
    fn delete_note(&mut self, id: NoteId) -> EngineResult<Applied> {
        let removed_tag_keys = self.store.delete(id).map_err(|e| self.fail(e))?;
        self.refresh_after_mutation();
        info!("event=note_delete id={id} removed_tags={}", removed_tag_keys.len());
        Ok(Applied::NoteDeleted { removed_tag_keys })
    }

    fn toggle_tag_visibility(&mut self, name: &str) -> EngineResult<Applied> {
        let currently_treed = self
            .forest
            .get(name)
            .map(|node| node.tag.treed)
            .unwrap_or(false);
        let patch = TagTreePatch {
            treed: Some(!currently_treed),
            ..TagTreePatch::default()
        };
        self.edit_tag_tree(name, &patch)
    }

    fn edit_tag_tree(&mut self, name: &str, patch: &TagTreePatch) -> EngineResult<Applied> {
        let updated = self
            .store
            .update_tag_tree(name, patch)
            .map_err(|e| self.fail(e))?;
        self.refresh_after_mutation();
        Ok(Applied::TagUpdated(updated))
    }

    /// Rebuilds the forest, re-resolves every open view, and publishes the
    /// cells any mutation can touch.
    fn refresh_after_mutation(&mut self) {
        self.forest = TagForest::build(self.store.tags());
        for query in self.views.queries() {
            let notes = query::resolve(self.store.notes(), &self.forest, &query);
            self.views.update_notes(&query, notes);
        }
        for cell in StateCell::ALL {
            self.reactive.publish(cell);
        }
    }

    /// Maps a store failure, tearing the session down when it is fatal.
    fn fail(&mut self, error: StoreError) -> EngineError {
        if matches!(error, StoreError::Backend(BackendError::Unauthorized)) {
            warn!("event=session status=expired");
            self.session.clear();
            self.debounce.cancel();
            self.views.clear();
            self.reactive.publish(StateCell::Views);
            return EngineError::SessionExpired;
        }
        EngineError::Store(error)
    }
}
