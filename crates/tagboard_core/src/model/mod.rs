//! Domain model for notes and typed tags.
//!
//! # Responsibility
//! - Define the canonical data structures shared by every engine layer.
//! - Keep wire shapes aligned with the remote note service payloads.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - A note's `tags` are always derived from its text, never set by callers.

pub mod note;
pub mod tag;
