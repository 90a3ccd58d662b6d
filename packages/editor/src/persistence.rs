//! # Persistence Coordinator
//!
//! Keeps a crash-recovery draft and the remote page store in step with the
//! editor.
//!
//! ```text
//! editor revision ──observe──▶ draft timer (2s)    ──▶ DraftStore
//!                          └─▶ autosave timer (5s) ──▶ prepare_save
//!                                                        │ PageApi::replace_page
//!                                                        │ PageApi::sync_blocks
//!                                                        ▼
//!                                                  complete_save
//! ```
//!
//! A save carries the editor revision it was taken at. When the response
//! arrives after further edits, only bookkeeping is updated and the newer
//! in-memory state is left alone.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pagecraft_common::{draft_key, DraftStore};
use pagecraft_document::{Block, PageData, Snapshot};

use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::editor::{AutoSaveStatus, Editor};
use crate::{EditorError, PersistenceError};

/// Locally persisted, unsynced copy of the editor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub blocks: Vec<Block>,
    pub page_data: PageData,
    pub timestamp: DateTime<Utc>,
}

impl Draft {
    pub fn capture(editor: &Editor) -> Self {
        Self {
            blocks: editor.blocks().to_vec(),
            page_data: editor.page_data().clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        Snapshot::new(self.blocks, self.page_data)
    }
}

/// Remote page store
#[allow(async_fn_in_trait)]
pub trait PageApi {
    /// Replace the page metadata
    async fn replace_page(&self, page_id: &str, page_data: &PageData) -> Result<(), PersistenceError>;

    /// Replace the page's full block list, returning the canonical blocks
    async fn sync_blocks(&self, page_id: &str, blocks: &[Block]) -> Result<Vec<Block>, PersistenceError>;
}

/// Everything a save needs, captured when it starts
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub page_id: String,
    pub revision: u64,
    pub snapshot: Snapshot,
    pub is_auto: bool,
    pub captured_at: DateTime<Utc>,
    fingerprint: String,
}

impl SaveRequest {
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Remote state adopted by the editor
    Saved,
    /// Saved, but the editor moved on while the request was in flight
    Stale,
    /// Autosave failed; the status shows the error for a while
    Failed(PersistenceError),
    /// Nothing to send
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub draft_written: bool,
    pub autosave_due: bool,
}

pub struct PersistenceCoordinator<S: DraftStore> {
    page_id: String,
    store: S,

    draft_timer: Debouncer,
    autosave_timer: Debouncer,
    autosave_enabled: bool,

    error_display: Duration,
    error_clears_at: Option<Instant>,

    observed_revision: u64,
    last_saved_fingerprint: Option<String>,
}

impl<S: DraftStore> PersistenceCoordinator<S> {
    pub fn new(page_id: impl Into<String>, store: S, config: &EditorConfig) -> Self {
        Self {
            page_id: page_id.into(),
            store,
            draft_timer: Debouncer::new(config.draft_debounce()),
            autosave_timer: Debouncer::new(config.autosave_debounce()),
            autosave_enabled: config.autosave_enabled,
            error_display: config.error_display(),
            error_clears_at: None,
            observed_revision: 0,
            last_saved_fingerprint: None,
        }
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn last_saved_fingerprint(&self) -> Option<&str> {
        self.last_saved_fingerprint.as_deref()
    }

    pub fn is_draft_pending(&self) -> bool {
        self.draft_timer.is_pending()
    }

    pub fn is_autosave_pending(&self) -> bool {
        self.autosave_timer.is_pending()
    }

    /// Restart the draft and autosave timers if the editor changed since the
    /// last call
    pub fn observe(&mut self, editor: &Editor) {
        if editor.revision() == self.observed_revision {
            return;
        }
        self.observed_revision = editor.revision();

        if editor.is_dirty() {
            self.draft_timer.schedule(editor.last_changed_at());
            if self.autosave_enabled {
                self.autosave_timer.schedule(editor.last_changed_at());
            }
        }
    }

    /// Drive the timers. Writes the draft when due; the caller runs the
    /// autosave when `autosave_due` is set.
    pub fn tick(&mut self, editor: &mut Editor, now: Instant) -> TickOutcome {
        self.observe(editor);
        let mut outcome = TickOutcome::default();

        if self.draft_timer.fire_if_due(now) && editor.is_dirty() {
            outcome.draft_written = self.write_draft(editor);
        }

        if self.error_clears_at.is_some_and(|at| now >= at) {
            self.error_clears_at = None;
            if editor.auto_save_status() == AutoSaveStatus::Error {
                editor.set_auto_save_status(AutoSaveStatus::Idle);
            }
        }

        if self.autosave_timer.fire_if_due(now) && editor.is_dirty() {
            if editor.is_saving() {
                // Try again once the in-flight save has landed
                self.autosave_timer.schedule(now);
            } else {
                outcome.autosave_due = true;
            }
        }
        outcome
    }

    // ========================================================================
    // Drafts
    // ========================================================================

    /// Persist the editor state as the page draft. Failures are logged and
    /// reported as `false`.
    pub fn write_draft(&mut self, editor: &Editor) -> bool {
        let key = draft_key(&self.page_id);
        let json = match serde_json::to_string(&Draft::capture(editor)) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to serialize draft");
                return false;
            }
        };

        match self.store.set(&key, &json) {
            Ok(()) => {
                tracing::debug!(key = %key, bytes = json.len(), "draft saved");
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to write draft");
                false
            }
        }
    }

    pub fn load_draft(&self) -> Result<Option<Draft>, EditorError> {
        let Some(json) = self.store.get(&draft_key(&self.page_id))? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn clear_draft(&mut self) {
        let key = draft_key(&self.page_id);
        if let Err(e) = self.store.remove(&key) {
            tracing::warn!(key = %key, error = %e, "failed to remove draft");
        }
    }

    /// Load a draft newer than the server state into the editor.
    ///
    /// The draft wins unconditionally when it is newer; there is no conflict
    /// detection against other writers. Returns whether a draft was applied.
    pub fn restore_draft(&mut self, editor: &mut Editor, server_loaded_at: DateTime<Utc>) -> bool {
        let draft = match self.load_draft() {
            Ok(Some(draft)) => draft,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(page_id = %self.page_id, error = %e, "ignoring unreadable draft");
                return false;
            }
        };

        if draft.timestamp <= server_loaded_at {
            tracing::debug!(page_id = %self.page_id, "draft older than server state");
            return false;
        }

        tracing::info!(
            page_id = %self.page_id,
            blocks = draft.blocks.len(),
            saved_at = %draft.timestamp,
            "restoring local draft"
        );
        editor.load_snapshot(draft.into_snapshot(), true);
        // The restored state is already on disk
        self.observed_revision = editor.revision();
        true
    }

    // ========================================================================
    // Saving
    // ========================================================================

    /// Start a save of the editor's current state.
    ///
    /// Returns `None` while another save is in flight, and for an autosave
    /// whose state matches what was last saved.
    pub fn prepare_save(&mut self, editor: &mut Editor, is_auto: bool) -> Option<SaveRequest> {
        if editor.is_saving() {
            tracing::debug!(page_id = %self.page_id, "save already in flight");
            return None;
        }

        let snapshot = editor.snapshot();
        let fingerprint = snapshot.fingerprint();
        if is_auto && self.last_saved_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            tracing::debug!(page_id = %self.page_id, "autosave skipped, nothing changed");
            return None;
        }

        if is_auto {
            self.autosave_timer.cancel();
            editor.set_auto_save_status(AutoSaveStatus::Saving);
        }
        editor.set_saving(true);

        Some(SaveRequest {
            page_id: self.page_id.clone(),
            revision: editor.revision(),
            snapshot,
            is_auto,
            captured_at: Utc::now(),
            fingerprint,
        })
    }

    /// Apply the result of the remote calls for `request`.
    ///
    /// A failed manual save is returned as `EditorError::Persistence`; a
    /// failed autosave becomes `SaveOutcome::Failed` and an error status that
    /// clears on the first `tick` at or after `now + error_display`.
    pub fn complete_save(
        &mut self,
        editor: &mut Editor,
        request: &SaveRequest,
        result: Result<Vec<Block>, PersistenceError>,
        now: Instant,
    ) -> Result<SaveOutcome, EditorError> {
        editor.set_saving(false);

        let canonical = match result {
            Ok(canonical) => canonical,
            Err(e) if request.is_auto => {
                tracing::warn!(page_id = %self.page_id, error = %e, "autosave failed");
                editor.set_auto_save_status(AutoSaveStatus::Error);
                self.error_clears_at = Some(now + self.error_display);
                return Ok(SaveOutcome::Failed(e));
            }
            Err(e) => {
                tracing::error!(page_id = %self.page_id, error = %e, "save failed");
                return Err(e.into());
            }
        };

        if editor.revision() != request.revision {
            tracing::info!(
                page_id = %self.page_id,
                sent = request.revision,
                current = editor.revision(),
                "save landed after newer edits"
            );
            self.last_saved_fingerprint = Some(request.fingerprint.clone());
            self.clear_draft_if_not_newer(request.captured_at);
            if request.is_auto {
                editor.set_auto_save_status(AutoSaveStatus::Idle);
            }
            return Ok(SaveOutcome::Stale);
        }

        let (merged, remap) = merge_saved_blocks(&request.snapshot.blocks, canonical);
        editor.apply_saved_blocks(merged, &remap);
        self.last_saved_fingerprint = Some(editor.snapshot().fingerprint());
        self.clear_draft();
        self.draft_timer.cancel();
        self.autosave_timer.cancel();
        editor.set_auto_save_status(AutoSaveStatus::Saved);

        tracing::info!(
            page_id = %self.page_id,
            blocks = editor.blocks().len(),
            remapped = remap.len(),
            "page saved"
        );
        Ok(SaveOutcome::Saved)
    }

    fn clear_draft_if_not_newer(&mut self, captured_at: DateTime<Utc>) {
        match self.load_draft() {
            Ok(Some(draft)) if draft.timestamp > captured_at => {
                tracing::debug!(page_id = %self.page_id, "keeping draft newer than stale save");
            }
            Ok(Some(_)) => self.clear_draft(),
            Ok(None) => {}
            Err(e) => tracing::warn!(page_id = %self.page_id, error = %e, "unreadable draft left in place"),
        }
    }
}

/// Correlate the canonical blocks returned by the server with the blocks
/// that were sent.
///
/// Blocks are matched by id, falling back to `(template_id, order)` for
/// blocks the server re-identified. Returns the merged list in server order
/// and the map from sent id to server id. Local `label` and
/// `layout_settings` survive when the server drops them.
///
/// The fallback is ambiguous when siblings share a template and their
/// orders collide; the first unmatched candidate wins.
pub fn merge_saved_blocks(sent: &[Block], canonical: Vec<Block>) -> (Vec<Block>, HashMap<String, String>) {
    let by_id: HashMap<&str, &Block> = sent.iter().map(|b| (b.id.as_str(), b)).collect();
    let canonical_ids: HashSet<String> = canonical.iter().map(|b| b.id.clone()).collect();
    let mut matched: HashSet<&str> = HashSet::new();
    let mut remap = HashMap::new();

    let mut merged: Vec<Block> = canonical
        .into_iter()
        .map(|mut remote| {
            let local = by_id.get(remote.id.as_str()).copied().or_else(|| {
                sent.iter().find(|b| {
                    !matched.contains(b.id.as_str())
                        && !canonical_ids.contains(&b.id)
                        && b.template_id == remote.template_id
                        && b.order == remote.order
                })
            });

            if let Some(local) = local {
                matched.insert(local.id.as_str());
                if local.id != remote.id {
                    remap.insert(local.id.clone(), remote.id.clone());
                }
                if remote.label.is_none() {
                    remote.label = local.label.clone();
                }
                if remote.layout_settings.is_none() {
                    remote.layout_settings = local.layout_settings.clone();
                }
            }
            remote.children = Vec::new();
            remote
        })
        .collect();

    for block in &mut merged {
        if let Some(new_parent) = block.parent_id.as_ref().and_then(|p| remap.get(p)) {
            block.parent_id = Some(new_parent.clone());
        }
    }

    (merged, remap)
}
