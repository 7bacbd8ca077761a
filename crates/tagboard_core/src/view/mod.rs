//! Query views and editor debouncing.
//!
//! # Responsibility
//! - Track the ordered set of open query views and which one is active.
//! - Debounce editor keystrokes before they spawn views.
//!
//! # See also
//! - [`registry`] for open/activate/close/maximize semantics.
//! - [`debounce`] for the typing window.

pub mod debounce;
pub mod registry;

pub use debounce::{TypingDebounce, DEFAULT_DEBOUNCE_MS};
pub use registry::{CloseOutcome, OpenOutcome, View, ViewRegistry};
