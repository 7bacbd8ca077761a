//! Subscription registry for render invalidation.
//!
//! # Responsibility
//! - Track which render sinks watch which state cell.
//! - Bump a revision counter and notify subscribers when a cell changes.
//!
//! # Invariants
//! - Subscriptions are declared up front and frozen by [`ReactiveStore::seal`];
//!   no sink appears or disappears mid-publish.
//! - A publish invokes each subscriber exactly once, in registration order.
//! - Revisions are monotonically increasing per cell and never reset.
//!
//! # See also
//! - [`crate::engine`] for the layer that publishes after every mutation.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Coarse-grained slices of engine state that sinks can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StateCell {
    Notes,
    Tags,
    Tasks,
    Views,
}

impl StateCell {
    pub const ALL: [StateCell; 4] = [
        StateCell::Notes,
        StateCell::Tags,
        StateCell::Tasks,
        StateCell::Views,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StateCell::Notes => "notes",
            StateCell::Tags => "tags",
            StateCell::Tasks => "tasks",
            StateCell::Views => "views",
        }
    }
}

impl Display for StateCell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of invalidation callbacks.
pub trait RenderSink {
    /// Called once per publish of a cell this sink subscribed to.
    fn cell_updated(&mut self, cell: StateCell, revision: u64);
}

/// Errors from subscription management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactiveError {
    /// Sink ids are lowercase ascii letters, digits, `_` or `-`.
    InvalidSinkId(String),
    DuplicateSinkId(String),
    SinkNotFound(String),
    /// The sink already watches this cell.
    DuplicateSubscription { sink: String, cell: StateCell },
    /// The store is sealed; the subscription set is frozen.
    Sealed,
}

impl Display for ReactiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReactiveError::InvalidSinkId(id) => write!(f, "invalid sink id: {id}"),
            ReactiveError::DuplicateSinkId(id) => write!(f, "sink id already registered: {id}"),
            ReactiveError::SinkNotFound(id) => write!(f, "sink not registered: {id}"),
            ReactiveError::DuplicateSubscription { sink, cell } => {
                write!(f, "sink {sink} already subscribed to {cell}")
            }
            ReactiveError::Sealed => write!(f, "subscription set is sealed"),
        }
    }
}

impl std::error::Error for ReactiveError {}

fn is_valid_sink_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Registry of render sinks and their per-cell subscriptions.
pub struct ReactiveStore {
    sinks: BTreeMap<String, Box<dyn RenderSink>>,
    subscriptions: BTreeMap<StateCell, Vec<String>>,
    revisions: BTreeMap<StateCell, u64>,
    sealed: bool,
}

impl Default for ReactiveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveStore {
    pub fn new() -> Self {
        Self {
            sinks: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
            revisions: StateCell::ALL.iter().map(|cell| (*cell, 0)).collect(),
            sealed: false,
        }
    }

    /// Registers a sink under a unique id.
    pub fn register_sink(
        &mut self,
        id: &str,
        sink: Box<dyn RenderSink>,
    ) -> Result<(), ReactiveError> {
        if self.sealed {
            return Err(ReactiveError::Sealed);
        }
        if !is_valid_sink_id(id) {
            return Err(ReactiveError::InvalidSinkId(id.to_string()));
        }
        if self.sinks.contains_key(id) {
            return Err(ReactiveError::DuplicateSinkId(id.to_string()));
        }
        self.sinks.insert(id.to_string(), sink);
        Ok(())
    }

    /// Subscribes a registered sink to one cell.
    pub fn subscribe(&mut self, id: &str, cell: StateCell) -> Result<(), ReactiveError> {
        if self.sealed {
            return Err(ReactiveError::Sealed);
        }
        if !self.sinks.contains_key(id) {
            return Err(ReactiveError::SinkNotFound(id.to_string()));
        }
        let subscribers = self.subscriptions.entry(cell).or_default();
        if subscribers.iter().any(|existing| existing == id) {
            return Err(ReactiveError::DuplicateSubscription {
                sink: id.to_string(),
                cell,
            });
        }
        subscribers.push(id.to_string());
        Ok(())
    }

    /// Freezes the subscription set. Idempotent.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Bumps the cell's revision and notifies its subscribers in
    /// registration order. Returns the new revision.
    pub fn publish(&mut self, cell: StateCell) -> u64 {
        let revision = self.revisions.entry(cell).or_insert(0);
        *revision += 1;
        let revision = *revision;

        let subscribers: Vec<String> = self
            .subscriptions
            .get(&cell)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        for id in subscribers {
            if let Some(sink) = self.sinks.get_mut(&id) {
                sink.cell_updated(cell, revision);
            }
        }
        revision
    }

    pub fn revision(&self, cell: StateCell) -> u64 {
        self.revisions.get(&cell).copied().unwrap_or(0)
    }

    pub fn subscriber_count(&self, cell: StateCell) -> usize {
        self.subscriptions.get(&cell).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::{ReactiveError, ReactiveStore, RenderSink, StateCell};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct CountingSink {
        calls: Rc<RefCell<Vec<(StateCell, u64)>>>,
    }

    impl RenderSink for CountingSink {
        fn cell_updated(&mut self, cell: StateCell, revision: u64) {
            self.calls.borrow_mut().push((cell, revision));
        }
    }

    fn counting_sink() -> (Box<CountingSink>, Rc<RefCell<Vec<(StateCell, u64)>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            Box::new(CountingSink {
                calls: Rc::clone(&calls),
            }),
            calls,
        )
    }

    #[test]
    fn sink_id_validation_matches_the_naming_rule() {
        let mut store = ReactiveStore::new();
        let (sink, _) = counting_sink();
        assert_eq!(
            store.register_sink("Bad Id", sink),
            Err(ReactiveError::InvalidSinkId("Bad Id".to_string()))
        );
        let (sink, _) = counting_sink();
        assert!(store.register_sink("tag-tree_2", sink).is_ok());
    }

    #[test]
    fn duplicate_sink_id_is_rejected() {
        let mut store = ReactiveStore::new();
        let (first, _) = counting_sink();
        let (second, _) = counting_sink();
        store.register_sink("panel", first).unwrap();
        assert_eq!(
            store.register_sink("panel", second),
            Err(ReactiveError::DuplicateSinkId("panel".to_string()))
        );
    }

    #[test]
    fn duplicate_subscription_is_rejected() {
        let mut store = ReactiveStore::new();
        let (sink, _) = counting_sink();
        store.register_sink("panel", sink).unwrap();
        store.subscribe("panel", StateCell::Notes).unwrap();
        assert!(matches!(
            store.subscribe("panel", StateCell::Notes),
            Err(ReactiveError::DuplicateSubscription { .. })
        ));
    }

    #[test]
    fn sealed_store_rejects_new_subscriptions() {
        let mut store = ReactiveStore::new();
        let (sink, _) = counting_sink();
        store.register_sink("panel", sink).unwrap();
        store.seal();
        assert_eq!(
            store.subscribe("panel", StateCell::Notes),
            Err(ReactiveError::Sealed)
        );
        let (late, _) = counting_sink();
        assert_eq!(store.register_sink("late", late), Err(ReactiveError::Sealed));
    }

    #[test]
    fn publish_invokes_each_subscriber_exactly_once() {
        let mut store = ReactiveStore::new();
        let (sink, calls) = counting_sink();
        store.register_sink("panel", sink).unwrap();
        store.subscribe("panel", StateCell::Notes).unwrap();
        store.subscribe("panel", StateCell::Tags).unwrap();
        store.seal();

        let revision = store.publish(StateCell::Notes);
        assert_eq!(revision, 1);
        assert_eq!(calls.borrow().as_slice(), &[(StateCell::Notes, 1)]);
    }

    #[test]
    fn revisions_are_monotonic_per_cell() {
        let mut store = ReactiveStore::new();
        store.seal();
        assert_eq!(store.publish(StateCell::Views), 1);
        assert_eq!(store.publish(StateCell::Views), 2);
        assert_eq!(store.revision(StateCell::Views), 2);
        assert_eq!(store.revision(StateCell::Notes), 0);
    }

    #[test]
    fn unsubscribed_cell_publish_notifies_nobody() {
        let mut store = ReactiveStore::new();
        let (sink, calls) = counting_sink();
        store.register_sink("panel", sink).unwrap();
        store.subscribe("panel", StateCell::Notes).unwrap();
        store.seal();
        store.publish(StateCell::Tags);
        assert!(calls.borrow().is_empty());
    }
}
