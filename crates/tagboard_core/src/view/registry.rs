//! Open-view bookkeeping.
//!
//! # Responsibility
//! - Keep the ordered list of open views, keyed by their query string.
//! - Enforce single-active and pinned-view rules.
//!
//! # Invariants
//! - At most one view is active at any time.
//! - Opening an already-open query activates it instead of duplicating it.
//! - The pinned view (the journal view for today) refuses to close.
//! - Closing the active view activates the last remaining view, if any.

use crate::model::note::Note;
use crate::query::{classify_query, QueryKind};

/// One open query view and its resolved notes.
#[derive(Debug, Clone)]
pub struct View {
    pub query: String,
    pub kind: QueryKind,
    pub active: bool,
    pub maximized: bool,
    pub notes: Vec<Note>,
}

/// Outcome of an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Created,
    /// The query was already open; it was activated instead.
    Activated,
}

/// Outcome of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The view is pinned and stays open.
    Pinned,
    NotFound,
}

/// Ordered registry of open views.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: Vec<View>,
    pinned: Option<String>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or re-activates) the view for `query` and makes it active.
    pub fn open(&mut self, query: &str, notes: Vec<Note>) -> OpenOutcome {
        if self.views.iter().any(|view| view.query == query) {
            self.activate(query);
            return OpenOutcome::Activated;
        }
        self.deactivate_all();
        self.views.push(View {
            query: query.to_string(),
            kind: classify_query(query),
            active: true,
            maximized: false,
            notes,
        });
        OpenOutcome::Created
    }

    /// Makes `query` the single active view. An unknown query deactivates
    /// everything.
    pub fn activate(&mut self, query: &str) {
        for view in &mut self.views {
            view.active = view.query == query;
        }
    }

    /// Closes the view unless it is pinned. Closing the active view hands
    /// activity to the last remaining view.
    pub fn close(&mut self, query: &str) -> CloseOutcome {
        if self.pinned.as_deref() == Some(query) {
            return CloseOutcome::Pinned;
        }
        let Some(index) = self.views.iter().position(|view| view.query == query) else {
            return CloseOutcome::NotFound;
        };
        let was_active = self.views[index].active;
        self.views.remove(index);
        if was_active {
            if let Some(last) = self.views.last_mut() {
                last.active = true;
            }
        }
        CloseOutcome::Closed
    }

    /// Toggles the maximize flag, returning the new state.
    pub fn toggle_maximize(&mut self, query: &str) -> Option<bool> {
        let view = self.views.iter_mut().find(|view| view.query == query)?;
        view.maximized = !view.maximized;
        Some(view.maximized)
    }

    /// Replaces the resolved notes of one view.
    pub fn update_notes(&mut self, query: &str, notes: Vec<Note>) {
        if let Some(view) = self.views.iter_mut().find(|view| view.query == query) {
            view.notes = notes;
        }
    }

    /// Marks the view that refuses closing.
    pub fn pin(&mut self, query: &str) {
        self.pinned = Some(query.to_string());
    }

    /// Drops all views and the pin. Used when the session dies.
    pub fn clear(&mut self) {
        self.views.clear();
        self.pinned = None;
    }

    pub fn active(&self) -> Option<&View> {
        self.views.iter().find(|view| view.active)
    }

    pub fn get(&self, query: &str) -> Option<&View> {
        self.views.iter().find(|view| view.query == query)
    }

    pub fn queries(&self) -> Vec<String> {
        self.views.iter().map(|view| view.query.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    fn deactivate_all(&mut self) {
        for view in &mut self.views {
            view.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CloseOutcome, OpenOutcome, ViewRegistry};

    #[test]
    fn open_is_idempotent_and_activates() {
        let mut registry = ViewRegistry::new();
        assert_eq!(registry.open("#a", Vec::new()), OpenOutcome::Created);
        assert_eq!(registry.open("#b", Vec::new()), OpenOutcome::Created);
        assert_eq!(registry.open("#a", Vec::new()), OpenOutcome::Activated);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active().map(|v| v.query.as_str()), Some("#a"));
    }

    #[test]
    fn only_one_view_is_active() {
        let mut registry = ViewRegistry::new();
        registry.open("#a", Vec::new());
        registry.open("#b", Vec::new());
        assert_eq!(registry.iter().filter(|v| v.active).count(), 1);
        assert_eq!(registry.active().map(|v| v.query.as_str()), Some("#b"));
    }

    #[test]
    fn closing_active_view_activates_last_remaining() {
        let mut registry = ViewRegistry::new();
        registry.open("#a", Vec::new());
        registry.open("#b", Vec::new());
        registry.open("#c", Vec::new());
        assert_eq!(registry.close("#c"), CloseOutcome::Closed);
        assert_eq!(registry.active().map(|v| v.query.as_str()), Some("#b"));
    }

    #[test]
    fn closing_inactive_view_keeps_active_untouched() {
        let mut registry = ViewRegistry::new();
        registry.open("#a", Vec::new());
        registry.open("#b", Vec::new());
        assert_eq!(registry.close("#a"), CloseOutcome::Closed);
        assert_eq!(registry.active().map(|v| v.query.as_str()), Some("#b"));
    }

    #[test]
    fn activating_unknown_query_clears_selection() {
        let mut registry = ViewRegistry::new();
        registry.open("#a", Vec::new());
        registry.activate("#missing");
        assert!(registry.active().is_none());
    }

    #[test]
    fn pinned_view_refuses_to_close() {
        let mut registry = ViewRegistry::new();
        registry.open("2024-03-10", Vec::new());
        registry.pin("2024-03-10");
        assert_eq!(registry.close("2024-03-10"), CloseOutcome::Pinned);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn maximize_toggles() {
        let mut registry = ViewRegistry::new();
        registry.open("#a", Vec::new());
        assert_eq!(registry.toggle_maximize("#a"), Some(true));
        assert_eq!(registry.toggle_maximize("#a"), Some(false));
        assert_eq!(registry.toggle_maximize("#missing"), None);
    }

    #[test]
    fn unknown_close_reports_not_found() {
        let mut registry = ViewRegistry::new();
        assert_eq!(registry.close("#missing"), CloseOutcome::NotFound);
    }
}
