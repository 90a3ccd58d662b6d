//! # Editor State Machine
//!
//! Owns the authoritative flat block list and page metadata together with
//! selection, hover, clipboard, and save-status bookkeeping.
//!
//! Every document change funnels through one commit path, which:
//! 1. replaces the block list (or page data)
//! 2. marks the editor dirty and bumps its revision
//! 3. schedules a debounced history capture
//!
//! Structural edits rebuild the tree, apply a tree operation, renormalize
//! sibling orders, and flatten back.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagecraft_document::{
    build_block_tree, can_drop_into, duplicate_block, find_block_by_id, find_block_by_id_mut,
    find_block_parent, flatten_block_tree, get_block_descendants, move_block_to_parent,
    normalize_block_orders, remove_block_from_tree, update_block_in_tree, Block, BlockPatch,
    ConfigMap, ConfigTab, ContainerType, IdGenerator, PageData, Snapshot,
};

use crate::catalog::{container_template_slug, InMemoryCatalog, Template, TemplateCatalog};
use crate::clipboard::ClipboardEntry;
use crate::config::EditorConfig;
use crate::history::HistoryManager;
use crate::EditorError;

/// Viewport the canvas is previewing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

pub struct Editor {
    blocks: Vec<Block>,
    page_data: PageData,

    selected_block_id: Option<String>,
    hovered_block_id: Option<String>,
    device_mode: DeviceMode,
    clipboard: Option<ClipboardEntry>,

    is_dirty: bool,
    is_saving: bool,
    auto_save_status: AutoSaveStatus,

    history: HistoryManager,
    ids: IdGenerator,
    catalog: Box<dyn TemplateCatalog>,

    /// Bumped on every in-memory document change
    revision: u64,
    last_changed_at: Instant,
}

impl Editor {
    pub fn new(page_id: &str, initial: Snapshot, config: &EditorConfig) -> Self {
        let mut ids = IdGenerator::new(page_id);
        ids.observe(initial.blocks.iter().map(|b| b.id.as_str()));

        Self {
            blocks: initial.blocks.clone(),
            page_data: initial.page_data.clone(),
            selected_block_id: None,
            hovered_block_id: None,
            device_mode: DeviceMode::default(),
            clipboard: None,
            is_dirty: false,
            is_saving: false,
            auto_save_status: AutoSaveStatus::Idle,
            history: HistoryManager::new(initial, config.history_capacity, config.history_debounce()),
            ids,
            catalog: Box::new(InMemoryCatalog::default()),
            revision: 0,
            last_changed_at: Instant::now(),
        }
    }

    pub fn with_catalog(mut self, catalog: impl TemplateCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block list materialized as a tree
    pub fn tree(&self) -> Vec<Block> {
        build_block_tree(&self.blocks)
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn page_data(&self) -> &PageData {
        &self.page_data
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.blocks.clone(), self.page_data.clone())
    }

    pub fn selected_block_id(&self) -> Option<&str> {
        self.selected_block_id.as_deref()
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.selected_block_id.as_deref().and_then(|id| self.block(id))
    }

    pub fn hovered_block_id(&self) -> Option<&str> {
        self.hovered_block_id.as_deref()
    }

    pub fn device_mode(&self) -> DeviceMode {
        self.device_mode
    }

    pub fn clipboard(&self) -> Option<&ClipboardEntry> {
        self.clipboard.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn auto_save_status(&self) -> AutoSaveStatus {
        self.auto_save_status
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_changed_at(&self) -> Instant {
        self.last_changed_at
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========================================================================
    // Commit path
    // ========================================================================

    fn commit_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.touch();
    }

    fn touch(&mut self) {
        self.is_dirty = true;
        self.revision += 1;
        self.last_changed_at = Instant::now();
        self.history.schedule(self.snapshot(), self.last_changed_at);
    }

    /// Normalize and flatten a tree, then commit it
    fn commit_tree(&mut self, tree: Vec<Block>) {
        let blocks = flatten_block_tree(&normalize_block_orders(&tree));
        self.commit_blocks(blocks);
    }

    fn require_block(&self, id: &str) -> Result<&Block, EditorError> {
        self.block(id)
            .ok_or_else(|| EditorError::BlockNotFound(id.to_string()))
    }

    fn sibling_count(&self, parent_id: Option<&str>) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.parent_id.as_deref() == parent_id)
            .count()
    }

    // ========================================================================
    // Block operations
    // ========================================================================

    /// Append a leaf block built from `template` under `parent_id` and select it
    pub fn add_block(&mut self, template: &Template, parent_id: Option<&str>) -> String {
        let id = self.ids.new_id();
        let mut block = Block::new(&id, &template.id);
        template.default_config.apply_to(&mut block);
        block.parent_id = parent_id.map(str::to_string);
        block.order = self.sibling_count(parent_id) as i64;

        let mut blocks = self.blocks.clone();
        blocks.push(block);
        self.commit_blocks(blocks);
        self.selected_block_id = Some(id.clone());

        tracing::debug!(block_id = %id, template = %template.slug, "block added");
        id
    }

    /// Append a container resolved from the well-known container templates.
    ///
    /// Fails without touching state when the template is not in the catalog.
    /// The generic container (`ContainerType::Block`) is created as a flexbox.
    pub fn add_container_block(
        &mut self,
        container_type: ContainerType,
        parent_id: Option<&str>,
    ) -> Result<String, EditorError> {
        let slug = container_template_slug(container_type);
        let Some(template) = self.catalog.by_slug(slug).cloned() else {
            tracing::warn!(slug, "container template not found");
            return Err(EditorError::TemplateResolution {
                slug: slug.to_string(),
            });
        };

        let resolved_type = match container_type {
            ContainerType::Block => ContainerType::Flexbox,
            other => other,
        };

        let id = self.ids.new_id();
        let mut block = Block::container(&id, &template.id, resolved_type);
        template.default_config.apply_to(&mut block);
        block.parent_id = parent_id.map(str::to_string);
        block.order = self.sibling_count(parent_id) as i64;

        let mut blocks = self.blocks.clone();
        blocks.push(block);
        self.commit_blocks(blocks);
        self.selected_block_id = Some(id.clone());

        tracing::debug!(block_id = %id, slug, "container added");
        Ok(id)
    }

    /// Replace one config partition of a block wholesale
    pub fn update_block_config(
        &mut self,
        id: &str,
        tab: ConfigTab,
        config: ConfigMap,
    ) -> Result<(), EditorError> {
        self.require_block(id)?;
        let blocks = update_block_in_tree(&self.blocks, id, &BlockPatch::config(tab, config));
        self.commit_blocks(blocks);
        Ok(())
    }

    /// Remove a block and its descendants
    pub fn remove_block(&mut self, id: &str) -> Result<(), EditorError> {
        self.require_block(id)?;
        let tree = self.tree();

        let mut removed: HashSet<String> = get_block_descendants(&tree, id)
            .into_iter()
            .map(|b| b.id.clone())
            .collect();
        removed.insert(id.to_string());

        self.commit_tree(remove_block_from_tree(&tree, id));

        if self.selected_block_id.as_ref().is_some_and(|s| removed.contains(s)) {
            self.selected_block_id = None;
        }
        if self.hovered_block_id.as_ref().is_some_and(|h| removed.contains(h)) {
            self.hovered_block_id = None;
        }

        tracing::debug!(block_id = id, removed = removed.len(), "block removed");
        Ok(())
    }

    /// Deep-copy a block right after itself and select the copy
    pub fn duplicate_block(&mut self, id: &str) -> Result<String, EditorError> {
        let mut tree = self.tree();
        let source = find_block_by_id(&tree, id)
            .ok_or_else(|| EditorError::BlockNotFound(id.to_string()))?;
        let copy = duplicate_block(source, &mut self.ids);
        let copy_id = copy.id.clone();
        let parent_id = find_block_parent(&tree, id).map(|p| p.id.clone());

        let Some(siblings) = siblings_mut(&mut tree, parent_id.as_deref()) else {
            return Err(EditorError::BlockNotFound(id.to_string()));
        };
        let position = siblings
            .iter()
            .position(|b| b.id == id)
            .map_or(siblings.len(), |p| p + 1);
        siblings.insert(position, copy);

        self.commit_tree(tree);
        self.selected_block_id = Some(copy_id.clone());
        Ok(copy_id)
    }

    /// Move a block under a new parent (or to the root level) at `new_order`.
    ///
    /// Moves that would put a block inside a leaf, inside itself, or inside
    /// its own subtree are rejected before the tree is touched.
    pub fn move_block(
        &mut self,
        id: &str,
        new_parent_id: Option<&str>,
        new_order: usize,
    ) -> Result<(), EditorError> {
        let tree = self.tree();
        let dragged = find_block_by_id(&tree, id)
            .ok_or_else(|| EditorError::BlockNotFound(id.to_string()))?;

        if let Some(target_id) = new_parent_id {
            let target = find_block_by_id(&tree, target_id)
                .ok_or_else(|| EditorError::BlockNotFound(target_id.to_string()))?;
            if !can_drop_into(dragged, target) {
                return Err(EditorError::IllegalMove {
                    block_id: id.to_string(),
                    target_id: target_id.to_string(),
                });
            }
        }

        let moved = move_block_to_parent(&tree, id, new_parent_id, new_order);
        self.commit_tree(moved);
        Ok(())
    }

    /// Replace the block list with an externally reordered one.
    ///
    /// `new_list` may be flat or a tree; a block's position among the
    /// entries sharing its parent becomes its `order`.
    pub fn reorder_blocks(&mut self, new_list: Vec<Block>) {
        let blocks = normalize_block_orders(&flatten_block_tree(&new_list));
        self.commit_blocks(blocks);
    }

    /// Move one sibling within its group and re-index the group
    pub fn reorder_siblings(
        &mut self,
        parent_id: Option<&str>,
        from_index: usize,
        to_index: usize,
    ) -> Result<(), EditorError> {
        let mut tree = self.tree();
        let Some(siblings) = siblings_mut(&mut tree, parent_id) else {
            return Err(EditorError::BlockNotFound(
                parent_id.unwrap_or_default().to_string(),
            ));
        };
        *siblings = pagecraft_document::reorder_blocks(siblings, from_index, to_index);
        self.commit_tree(tree);
        Ok(())
    }

    /// Flip visibility, returning the new value
    pub fn toggle_block_visibility(&mut self, id: &str) -> Result<bool, EditorError> {
        let visible = !self.require_block(id)?.is_visible;
        let blocks = update_block_in_tree(&self.blocks, id, &BlockPatch::visibility(visible));
        self.commit_blocks(blocks);
        Ok(visible)
    }

    // ========================================================================
    // Clipboard
    // ========================================================================

    /// Copy a block with its subtree
    pub fn copy_block(&mut self, id: &str) -> Result<(), EditorError> {
        let tree = self.tree();
        let block = find_block_by_id(&tree, id)
            .ok_or_else(|| EditorError::BlockNotFound(id.to_string()))?;
        self.clipboard = Some(ClipboardEntry::block(block.clone()));
        Ok(())
    }

    pub fn copy_style(&mut self, id: &str) -> Result<(), EditorError> {
        let style = self.require_block(id)?.style_config.clone();
        self.clipboard = Some(ClipboardEntry::style(style));
        Ok(())
    }

    /// Paste the clipboard block as the last child of `parent_id`, with fresh
    /// ids throughout, and select it
    pub fn paste_block(&mut self, parent_id: Option<&str>) -> Result<String, EditorError> {
        let source = match &self.clipboard {
            Some(ClipboardEntry::Block { data, .. }) => data.clone(),
            Some(other) => {
                return Err(EditorError::ClipboardMismatch {
                    expected: "block",
                    found: other.kind(),
                })
            }
            None => return Err(EditorError::ClipboardEmpty),
        };

        let mut copy = duplicate_block(&source, &mut self.ids);
        copy.parent_id = parent_id.map(str::to_string);
        let order = self.sibling_count(parent_id) as i64;
        let copy_id = copy.id.clone();

        let mut pasted = flatten_block_tree(std::slice::from_ref(&copy));
        pasted[0].order = order;

        let mut blocks = self.blocks.clone();
        blocks.extend(pasted);
        self.commit_blocks(blocks);
        self.selected_block_id = Some(copy_id.clone());
        Ok(copy_id)
    }

    /// Apply the clipboard style partition to a block
    pub fn paste_style(&mut self, id: &str) -> Result<(), EditorError> {
        let style = match &self.clipboard {
            Some(ClipboardEntry::Style { data, .. }) => data.clone(),
            Some(other) => {
                return Err(EditorError::ClipboardMismatch {
                    expected: "style",
                    found: other.kind(),
                })
            }
            None => return Err(EditorError::ClipboardEmpty),
        };
        self.update_block_config(id, ConfigTab::Style, style)
    }

    // ========================================================================
    // Page data, selection, view
    // ========================================================================

    pub fn update_page_data(&mut self, field: &str, value: Value) {
        self.page_data.set(field, value);
        self.touch();
    }

    pub fn select_block(&mut self, id: Option<&str>) {
        self.selected_block_id = id.map(str::to_string);
    }

    pub fn hover_block(&mut self, id: Option<&str>) {
        self.hovered_block_id = id.map(str::to_string);
    }

    pub fn set_device_mode(&mut self, mode: DeviceMode) {
        self.device_mode = mode;
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Fire the history capture if its timer has expired
    pub fn tick(&mut self, now: Instant) -> bool {
        self.history.tick(now)
    }

    /// Capture any pending history snapshot now
    pub fn flush_history(&mut self) -> bool {
        self.history.flush()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Restore a history snapshot without recording a new one
    fn restore(&mut self, snapshot: Snapshot) {
        self.blocks = snapshot.blocks;
        self.page_data = snapshot.page_data;
        self.is_dirty = true;
        self.revision += 1;
        self.last_changed_at = Instant::now();
        self.drop_dangling_selection();
    }

    fn drop_dangling_selection(&mut self) {
        if let Some(id) = self.selected_block_id.clone() {
            if self.block(&id).is_none() {
                self.selected_block_id = None;
            }
        }
        if let Some(id) = self.hovered_block_id.clone() {
            if self.block(&id).is_none() {
                self.hovered_block_id = None;
            }
        }
    }

    // ========================================================================
    // Persistence hooks
    // ========================================================================

    /// Replace the whole document, e.g. with a recovered draft.
    ///
    /// The loaded state counts as an unsaved edit. With `reset_history` the
    /// undo stack restarts at `snapshot`; otherwise the load is captured like
    /// any other change.
    pub fn load_snapshot(&mut self, snapshot: Snapshot, reset_history: bool) {
        self.ids.observe(snapshot.blocks.iter().map(|b| b.id.as_str()));
        self.blocks = snapshot.blocks.clone();
        self.page_data = snapshot.page_data.clone();
        self.drop_dangling_selection();

        if reset_history {
            self.history.reset(snapshot);
            self.is_dirty = true;
            self.revision += 1;
            self.last_changed_at = Instant::now();
        } else {
            self.touch();
        }
    }

    /// Adopt the canonical blocks returned by a save of the current revision.
    ///
    /// `id_remap` maps in-memory ids to the ids the server assigned; selection
    /// and hover follow their blocks. The history entry under the cursor is
    /// rewritten to the saved state.
    pub(crate) fn apply_saved_blocks(&mut self, blocks: Vec<Block>, id_remap: &HashMap<String, String>) {
        self.ids.observe(blocks.iter().map(|b| b.id.as_str()));
        self.blocks = blocks;
        for slot in [&mut self.selected_block_id, &mut self.hovered_block_id] {
            if let Some(new_id) = slot.as_ref().and_then(|id| id_remap.get(id)) {
                *slot = Some(new_id.clone());
            }
        }
        self.drop_dangling_selection();
        self.history.flush();
        self.history.replace_current(self.snapshot());
        self.is_dirty = false;
    }

    pub(crate) fn set_saving(&mut self, is_saving: bool) {
        self.is_saving = is_saving;
    }

    pub(crate) fn set_auto_save_status(&mut self, status: AutoSaveStatus) {
        self.auto_save_status = status;
    }
}

/// Sibling list for children of `parent_id`, or the root list
fn siblings_mut<'a>(tree: &'a mut Vec<Block>, parent_id: Option<&str>) -> Option<&'a mut Vec<Block>> {
    match parent_id {
        None => Some(tree),
        Some(parent_id) => find_block_by_id_mut(tree, parent_id).map(|parent| &mut parent.children),
    }
}
