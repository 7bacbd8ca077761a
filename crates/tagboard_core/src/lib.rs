//! Tagboard core: tag-graph indexing, query resolution and view state for a
//! tagged-notes client.
//!
//! # Responsibility
//! - Parse typed tags and task markers out of note text.
//! - Cache notes and tags from a backend and resolve queries locally.
//! - Track open query views and notify render sinks on change.
//!
//! # See also
//! - [`engine`] for the single entry point shells drive.

pub mod backend;
pub mod engine;
pub mod forest;
pub mod logging;
pub mod model;
pub mod parser;
pub mod query;
pub mod reactive;
pub mod store;
pub mod view;

pub use backend::{BackendError, MemoryBackend, NoteBackend, TagTreePatch};
pub use engine::{Applied, Engine, EngineError, Intent};
pub use forest::TagForest;
pub use model::note::{Note, NoteId, TaskPriority};
pub use model::tag::{Tag, TagCategory};
pub use query::QueryKind;
pub use reactive::{ReactiveStore, RenderSink, StateCell};
pub use store::{NoteStore, StoreError};
pub use view::ViewRegistry;

/// Returns the core library version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
