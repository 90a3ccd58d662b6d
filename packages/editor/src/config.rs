use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Tunables for history capture and persistence timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo steps kept
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_history_debounce_ms")]
    pub history_debounce_ms: u64,

    /// Delay before a crash-recovery draft is written
    #[serde(default = "default_draft_debounce_ms")]
    pub draft_debounce_ms: u64,

    #[serde(default = "default_true")]
    pub autosave_enabled: bool,

    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// How long a failed autosave keeps the error status before it resets
    #[serde(default = "default_error_display_ms")]
    pub error_display_ms: u64,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_history_debounce_ms() -> u64 {
    500
}

fn default_draft_debounce_ms() -> u64 {
    2_000
}

fn default_true() -> bool {
    true
}

fn default_autosave_debounce_ms() -> u64 {
    5_000
}

fn default_error_display_ms() -> u64 {
    3_000
}

impl EditorConfig {
    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history_debounce_ms)
    }

    pub fn draft_debounce(&self) -> Duration {
        Duration::from_millis(self.draft_debounce_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            history_debounce_ms: default_history_debounce_ms(),
            draft_debounce_ms: default_draft_debounce_ms(),
            autosave_enabled: default_true(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            error_display_ms: default_error_display_ms(),
        }
    }
}
