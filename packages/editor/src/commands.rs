//! Keyboard command surface.
//!
//! Each command maps onto one editor operation. Commands that act on "the
//! current block" use the selection and are ignored when nothing is selected.

use serde::{Deserialize, Serialize};

use crate::{Editor, EditorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorCommand {
    Undo,
    Redo,
    Copy,
    CopyStyle,
    Paste,
    PasteStyle,
    Duplicate,
    Delete,
    Deselect,
    /// Selection holds a single block, so there is nothing to extend
    SelectAll,
    /// Executed by the edit session, which owns the remote side
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// A new block was created and selected
    Created(String),
    /// Nothing to act on (no selection, empty history)
    Ignored,
    SaveRequested,
}

impl Editor {
    pub fn dispatch(&mut self, command: EditorCommand) -> Result<CommandOutcome, EditorError> {
        tracing::debug!(?command, "dispatch");

        let selected = self.selected_block_id().map(str::to_string);
        let outcome = match (command, selected) {
            (EditorCommand::SelectAll, _) => CommandOutcome::Ignored,
            (EditorCommand::Undo, _) => applied(self.undo()),
            (EditorCommand::Redo, _) => applied(self.redo()),
            (EditorCommand::Deselect, _) => {
                self.select_block(None);
                CommandOutcome::Applied
            }
            (EditorCommand::Save, _) => CommandOutcome::SaveRequested,
            (EditorCommand::Paste, selected) => {
                if self.clipboard().is_none() {
                    return Ok(CommandOutcome::Ignored);
                }
                let parent = selected.and_then(|id| self.paste_target(&id));
                CommandOutcome::Created(self.paste_block(parent.as_deref())?)
            }
            (_, None) => CommandOutcome::Ignored,
            (EditorCommand::Copy, Some(id)) => {
                self.copy_block(&id)?;
                CommandOutcome::Applied
            }
            (EditorCommand::CopyStyle, Some(id)) => {
                self.copy_style(&id)?;
                CommandOutcome::Applied
            }
            (EditorCommand::PasteStyle, Some(id)) => {
                self.paste_style(&id)?;
                CommandOutcome::Applied
            }
            (EditorCommand::Duplicate, Some(id)) => CommandOutcome::Created(self.duplicate_block(&id)?),
            (EditorCommand::Delete, Some(id)) => {
                self.remove_block(&id)?;
                CommandOutcome::Applied
            }
        };
        Ok(outcome)
    }

    /// Paste into the selected container, or next to the selected leaf.
    /// Falls back to the root level when the selection is gone.
    fn paste_target(&self, selected: &str) -> Option<String> {
        let block = self.block(selected)?;
        if block.is_container() {
            Some(block.id.clone())
        } else {
            block.parent_id.clone()
        }
    }
}

fn applied(done: bool) -> CommandOutcome {
    if done {
        CommandOutcome::Applied
    } else {
        CommandOutcome::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditorConfig, Template};
    use pagecraft_document::{Block, ContainerType, PageData, Snapshot};

    fn editor_with(blocks: Vec<Block>) -> Editor {
        Editor::new("home", Snapshot::new(blocks, PageData::new()), &EditorConfig::default())
    }

    #[test]
    fn test_command_serialization() {
        let json = serde_json::to_string(&EditorCommand::CopyStyle).unwrap();
        assert_eq!(json, r#"{"type":"CopyStyle"}"#);

        let parsed: EditorCommand = serde_json::from_str(r#"{"type":"Undo"}"#).unwrap();
        assert_eq!(parsed, EditorCommand::Undo);
    }

    #[test]
    fn test_selection_commands_ignored_without_selection() {
        let mut editor = editor_with(vec![Block::new("a", "text")]);

        for command in [EditorCommand::Copy, EditorCommand::Duplicate, EditorCommand::Delete] {
            assert_eq!(editor.dispatch(command).unwrap(), CommandOutcome::Ignored);
        }
        assert_eq!(editor.blocks().len(), 1);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_paste_goes_into_selected_container() {
        let mut editor = editor_with(vec![
            Block::container("s", "section-container", ContainerType::Section),
            Block::new("t", "text").with_parent("s"),
        ]);

        editor.select_block(Some("t"));
        editor.dispatch(EditorCommand::Copy).unwrap();
        editor.select_block(Some("s"));

        let CommandOutcome::Created(id) = editor.dispatch(EditorCommand::Paste).unwrap() else {
            panic!("expected paste to create a block");
        };
        assert_eq!(editor.block(&id).unwrap().parent_id.as_deref(), Some("s"));
    }

    #[test]
    fn test_paste_next_to_selected_leaf() {
        let mut editor = editor_with(vec![
            Block::container("s", "section-container", ContainerType::Section),
            Block::new("t", "text").with_parent("s"),
        ]);
        editor.select_block(Some("t"));
        editor.dispatch(EditorCommand::Copy).unwrap();

        let CommandOutcome::Created(id) = editor.dispatch(EditorCommand::Paste).unwrap() else {
            panic!("expected paste to create a block");
        };
        let pasted = editor.block(&id).unwrap();
        assert_eq!(pasted.parent_id.as_deref(), Some("s"));
        assert_eq!(pasted.order, 1);
    }

    #[test]
    fn test_undo_with_empty_history_is_ignored() {
        let mut editor = editor_with(vec![]);
        assert_eq!(editor.dispatch(EditorCommand::Undo).unwrap(), CommandOutcome::Ignored);

        editor.add_block(&Template::new("tpl", "text"), None);
        assert_eq!(editor.dispatch(EditorCommand::Undo).unwrap(), CommandOutcome::Applied);
        assert!(editor.blocks().is_empty());
    }

    #[test]
    fn test_paste_with_empty_clipboard_is_ignored() {
        let mut editor = editor_with(vec![]);
        assert_eq!(editor.dispatch(EditorCommand::Paste).unwrap(), CommandOutcome::Ignored);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_select_all_keeps_single_selection() {
        let mut editor = editor_with(vec![Block::new("a", "text"), Block::new("b", "text")]);
        editor.select_block(Some("a"));

        let parsed: EditorCommand = serde_json::from_str(r#"{"type":"SelectAll"}"#).unwrap();
        assert_eq!(editor.dispatch(parsed).unwrap(), CommandOutcome::Ignored);
        assert_eq!(editor.selected_block_id(), Some("a"));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_save_and_deselect() {
        let mut editor = editor_with(vec![Block::new("a", "text")]);
        editor.select_block(Some("a"));

        assert_eq!(editor.dispatch(EditorCommand::Deselect).unwrap(), CommandOutcome::Applied);
        assert_eq!(editor.selected_block_id(), None);
        assert_eq!(
            editor.dispatch(EditorCommand::Save).unwrap(),
            CommandOutcome::SaveRequested
        );
    }
}
