use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pagecraft_document::{Block, ConfigMap};

/// What the editor clipboard holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipboardEntry {
    /// A block with its materialized subtree
    Block {
        data: Block,
        #[serde(rename = "copiedAt")]
        copied_at: DateTime<Utc>,
    },

    /// A style partition
    Style {
        data: ConfigMap,
        #[serde(rename = "copiedAt")]
        copied_at: DateTime<Utc>,
    },
}

impl ClipboardEntry {
    pub fn block(data: Block) -> Self {
        ClipboardEntry::Block {
            data,
            copied_at: Utc::now(),
        }
    }

    pub fn style(data: ConfigMap) -> Self {
        ClipboardEntry::Style {
            data,
            copied_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClipboardEntry::Block { .. } => "block",
            ClipboardEntry::Style { .. } => "style",
        }
    }

    pub fn copied_at(&self) -> DateTime<Utc> {
        match self {
            ClipboardEntry::Block { copied_at, .. } | ClipboardEntry::Style { copied_at, .. } => {
                *copied_at
            }
        }
    }
}
