//! Keystroke debouncing for the editor.
//!
//! # Responsibility
//! - Hold the latest editor text until typing pauses for a full window.
//!
//! # Invariants
//! - Every keystroke restarts the window; only the latest text ever fires.
//! - A fired or cancelled window leaves nothing pending.

/// Window the editor waits after the last keystroke before scanning.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone)]
struct Pending {
    text: String,
    deadline_ms: u64,
}

/// Reset-on-keystroke debounce timer, driven by explicit clock readings so
/// it stays deterministic under test.
#[derive(Debug, Clone)]
pub struct TypingDebounce {
    window_ms: u64,
    pending: Option<Pending>,
}

impl Default for TypingDebounce {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl TypingDebounce {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pending: None,
        }
    }

    /// Records a keystroke, restarting the window.
    pub fn input(&mut self, text: &str, now_ms: u64) {
        self.pending = Some(Pending {
            text: text.to_string(),
            deadline_ms: now_ms + self.window_ms,
        });
    }

    /// Returns the settled text once the window has elapsed. Fires at most
    /// once per window.
    pub fn poll(&mut self, now_ms: u64) -> Option<String> {
        if self.pending.as_ref()?.deadline_ms <= now_ms {
            self.pending.take().map(|pending| pending.text)
        } else {
            None
        }
    }

    /// Drops any pending text without firing.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
