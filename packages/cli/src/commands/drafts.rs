use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;
use pagecraft_common::{draft_key, DraftStore, FileDraftStore};
use pagecraft_editor::{Draft, Editor, EditorConfig, PersistenceCoordinator};
use std::path::{Path, PathBuf};

use super::load_page;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct DraftsArgs {
    #[command(subcommand)]
    pub command: DraftsCommand,
}

#[derive(Subcommand, Debug)]
pub enum DraftsCommand {
    /// List stored drafts
    List,

    /// Print a page's draft
    Show {
        /// Page identifier
        page: String,
    },

    /// Delete a page's draft
    Clear {
        /// Page identifier
        page: String,
    },

    /// Write a page's draft into its page document when the draft is newer
    /// than the file
    Restore {
        /// Page identifier
        page: String,

        /// Page document to update
        file: PathBuf,
    },
}

pub fn drafts(args: DraftsArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut store = FileDraftStore::open(config.get_drafts_dir(cwd))?;

    match args.command {
        DraftsCommand::List => list(&store),
        DraftsCommand::Show { page } => show(&store, &page),
        DraftsCommand::Clear { page } => {
            store.remove(&draft_key(&page))?;
            println!("{} Cleared draft for {}", "✓".green(), page.bold());
            Ok(())
        }
        DraftsCommand::Restore { page, file } => {
            if restore(store, &page, &file, &config.editor)? {
                println!("{} Restored draft for {} into {}", "✓".green(), page.bold(), file.display());
            } else {
                println!("   No draft for {} newer than {}", page.bold(), file.display());
            }
            Ok(())
        }
    }
}

fn list(store: &FileDraftStore) -> Result<()> {
    let keys = store.keys()?;
    if keys.is_empty() {
        println!("   No drafts in {}", store.dir().display());
        return Ok(());
    }

    for key in keys {
        let Some(page) = key.strip_prefix("draft-") else {
            continue;
        };
        match read_draft(store, &key) {
            Ok(Some(draft)) => println!(
                "{} {} blocks, saved {}",
                page.bold(),
                draft.blocks.len(),
                draft.timestamp.to_rfc3339().dimmed()
            ),
            Ok(None) => {}
            Err(err) => println!("{} {} {:#}", page.bold(), "unreadable:".red(), err),
        }
    }
    Ok(())
}

fn show(store: &FileDraftStore, page: &str) -> Result<()> {
    match read_draft(store, &draft_key(page))? {
        Some(draft) => {
            println!("{}", serde_json::to_string_pretty(&draft)?);
            Ok(())
        }
        None => Err(anyhow::anyhow!("No draft for page: {}", page)),
    }
}

/// Replay the draft through an editor so the written document is the state
/// the editor would reopen with. The draft is removed once written.
fn restore(store: FileDraftStore, page: &str, file: &Path, config: &EditorConfig) -> Result<bool> {
    let snapshot = load_page(file)?;
    let modified: DateTime<Utc> = std::fs::metadata(file)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to stat {}", file.display()))?
        .into();

    let mut editor = Editor::new(page, snapshot, config);
    let mut persistence = PersistenceCoordinator::new(page, store, config);
    if !persistence.restore_draft(&mut editor, modified) {
        return Ok(false);
    }

    let json = serde_json::to_string_pretty(&editor.snapshot())?;
    std::fs::write(file, json).with_context(|| format!("Failed to write {}", file.display()))?;
    persistence.clear_draft();
    tracing::info!(page, blocks = editor.blocks().len(), "draft written to page document");
    Ok(true)
}

fn read_draft(store: &FileDraftStore, key: &str) -> Result<Option<Draft>> {
    let Some(json) = store.get(key)? else {
        return Ok(None);
    };
    let draft = serde_json::from_str(&json).with_context(|| format!("Corrupt draft {}", key))?;
    Ok(Some(draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::{Block, ContainerType, PageData, Snapshot};

    fn write_page(path: &Path) {
        let page = Snapshot::new(
            vec![Block::container("s", "section-container", ContainerType::Section)],
            PageData::new(),
        );
        std::fs::write(path, serde_json::to_string(&page).unwrap()).unwrap();
    }

    fn store_draft(store: &mut FileDraftStore, timestamp: DateTime<Utc>) {
        let draft = Draft {
            blocks: vec![
                Block::container("s", "section-container", ContainerType::Section),
                Block::new("t", "text").with_parent("s"),
            ],
            page_data: PageData::new(),
            timestamp,
        };
        store
            .set(&draft_key("home"), &serde_json::to_string(&draft).unwrap())
            .unwrap();
    }

    #[test]
    fn test_restore_newer_draft_into_page() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("home.json");
        write_page(&file);

        let mut store = FileDraftStore::open(dir.path().join("drafts")).unwrap();
        store_draft(&mut store, Utc::now() + chrono::Duration::hours(1));

        assert!(restore(store, "home", &file, &EditorConfig::default()).unwrap());

        let page = load_page(&file).unwrap();
        assert_eq!(page.blocks.len(), 2);
        let store = FileDraftStore::open(dir.path().join("drafts")).unwrap();
        assert!(store.get(&draft_key("home")).unwrap().is_none());
    }

    #[test]
    fn test_older_draft_leaves_page_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("home.json");
        write_page(&file);

        let mut store = FileDraftStore::open(dir.path().join("drafts")).unwrap();
        store_draft(&mut store, Utc::now() - chrono::Duration::hours(1));

        assert!(!restore(store, "home", &file, &EditorConfig::default()).unwrap());

        assert_eq!(load_page(&file).unwrap().blocks.len(), 1);
        let store = FileDraftStore::open(dir.path().join("drafts")).unwrap();
        assert!(store.get(&draft_key("home")).unwrap().is_some());
    }
}
