//! Error types for the editor

use pagecraft_common::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("No template registered for slug: {slug}")]
    TemplateResolution { slug: String },

    #[error("Cannot move block {block_id} into {target_id}")]
    IllegalMove { block_id: String, target_id: String },

    #[error("Clipboard is empty")]
    ClipboardEmpty,

    #[error("Clipboard holds a {found} entry, expected {expected}")]
    ClipboardMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Save failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by the remote page store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Remote rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}
