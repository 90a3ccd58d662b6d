//! # Edit Session
//!
//! Binds one editor to its draft store, remote page store, and notifier,
//! and runs the save flow between them.
//!
//! The coordinator's two-phase save is also usable directly, which lets a
//! host keep editing while the remote calls are in flight.

use std::time::Instant;

use chrono::{DateTime, Utc};

use pagecraft_common::DraftStore;
use pagecraft_document::{Block, Snapshot};

use crate::commands::{CommandOutcome, EditorCommand};
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::notifications::Notifier;
use crate::persistence::{PageApi, PersistenceCoordinator, SaveOutcome, SaveRequest, TickOutcome};
use crate::{EditorError, PersistenceError};

pub struct EditSession<S: DraftStore, A: PageApi, N: Notifier> {
    pub editor: Editor,
    pub persistence: PersistenceCoordinator<S>,
    api: A,
    notifier: N,
}

impl<S: DraftStore, A: PageApi, N: Notifier> EditSession<S, A, N> {
    pub fn new(editor: Editor, persistence: PersistenceCoordinator<S>, api: A, notifier: N) -> Self {
        Self {
            editor,
            persistence,
            api,
            notifier,
        }
    }

    /// Open a page loaded from the server at `server_loaded_at`, preferring
    /// a newer local draft if one exists
    pub fn open(
        page_id: &str,
        initial: Snapshot,
        server_loaded_at: DateTime<Utc>,
        store: S,
        api: A,
        notifier: N,
        config: &EditorConfig,
    ) -> Self {
        let editor = Editor::new(page_id, initial, config);
        let persistence = PersistenceCoordinator::new(page_id, store, config);
        let mut session = Self::new(editor, persistence, api, notifier);

        if session
            .persistence
            .restore_draft(&mut session.editor, server_loaded_at)
        {
            session.notifier.success("Restored unsaved changes");
        }
        session
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Drive history capture, draft writes, and autosave
    pub async fn tick(&mut self, now: Instant) -> Result<TickOutcome, EditorError> {
        self.editor.tick(now);
        let outcome = self.persistence.tick(&mut self.editor, now);
        if outcome.autosave_due {
            self.save_at(true, now).await?;
        }
        Ok(outcome)
    }

    /// Run a keyboard command, performing the save itself when asked
    pub async fn dispatch(&mut self, command: EditorCommand) -> Result<CommandOutcome, EditorError> {
        let outcome = self.editor.dispatch(command)?;
        if outcome == CommandOutcome::SaveRequested {
            self.save(false).await?;
        }
        Ok(outcome)
    }

    pub async fn save(&mut self, is_auto: bool) -> Result<SaveOutcome, EditorError> {
        self.save_at(is_auto, Instant::now()).await
    }

    /// Save with `now` as the clock for any follow-up timers
    pub async fn save_at(&mut self, is_auto: bool, now: Instant) -> Result<SaveOutcome, EditorError> {
        let Some(request) = self.persistence.prepare_save(&mut self.editor, is_auto) else {
            return Ok(SaveOutcome::Skipped);
        };
        let result = self.push_remote(&request).await;
        self.run_save(&request, result, now)
    }

    fn run_save(
        &mut self,
        request: &SaveRequest,
        result: Result<Vec<Block>, PersistenceError>,
        now: Instant,
    ) -> Result<SaveOutcome, EditorError> {
        match self.persistence.complete_save(&mut self.editor, request, result, now) {
            Ok(outcome) => {
                if !request.is_auto && matches!(outcome, SaveOutcome::Saved | SaveOutcome::Stale) {
                    self.notifier.success("Page saved");
                }
                Ok(outcome)
            }
            Err(e) => {
                self.notifier.error(&format!("Failed to save page: {}", e));
                Err(e)
            }
        }
    }

    /// Metadata first, then the full block list
    async fn push_remote(&self, request: &SaveRequest) -> Result<Vec<Block>, PersistenceError> {
        self.api
            .replace_page(&request.page_id, &request.snapshot.page_data)
            .await?;
        self.api
            .sync_blocks(&request.page_id, &request.snapshot.blocks)
            .await
    }
}
