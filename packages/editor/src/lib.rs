//! # Pagecraft Editor
//!
//! Editing engine for block-tree pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: UI actions, key combos, clock ticks   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Editor state machine                │
//! │  - block edits through one commit path      │
//! │  - selection, hover, clipboard              │
//! │  - debounced snapshot history               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ persistence: drafts, autosave, merge-back   │
//! │  - DraftStore (local, crash recovery)       │
//! │  - PageApi (remote, async)                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Flat list is the source of truth**: trees are built on demand
//! 2. **Failed operations change nothing**: every `Err` leaves state intact
//! 3. **Time is an input**: timers are deadlines checked on `tick(now)`
//! 4. **Stale saves never win**: responses for an old revision only touch bookkeeping
//!
//! ## Usage
//!
//! ```rust
//! use pagecraft_editor::{Editor, EditorConfig, Template};
//! use pagecraft_document::Snapshot;
//!
//! let mut editor = Editor::new("home", Snapshot::default(), &EditorConfig::default());
//! let text = Template::new("tpl-text", "text");
//!
//! let id = editor.add_block(&text, None);
//! assert_eq!(editor.selected_block_id(), Some(id.as_str()));
//!
//! assert!(editor.undo());
//! assert!(editor.blocks().is_empty());
//! ```

mod catalog;
mod clipboard;
mod commands;
mod config;
mod debounce;
mod editor;
mod errors;
mod history;
mod notifications;
mod persistence;
mod session;

pub use catalog::{
    container_template_slug, DefaultConfig, InMemoryCatalog, Template, TemplateCatalog,
    FLEXBOX_CONTAINER_SLUG, GENERIC_CONTAINER_SLUG, GRID_CONTAINER_SLUG, SECTION_CONTAINER_SLUG,
};
pub use clipboard::ClipboardEntry;
pub use commands::{CommandOutcome, EditorCommand};
pub use config::EditorConfig;
pub use debounce::Debouncer;
pub use editor::{AutoSaveStatus, DeviceMode, Editor};
pub use errors::{EditorError, PersistenceError};
pub use history::{HistoryManager, DEFAULT_HISTORY_CAPACITY};
pub use notifications::{Notifier, TracingNotifier};
pub use persistence::{
    merge_saved_blocks, Draft, PageApi, PersistenceCoordinator, SaveOutcome, SaveRequest,
    TickOutcome,
};
pub use session::EditSession;
