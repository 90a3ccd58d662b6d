pub mod drafts;
pub mod normalize;
pub mod search;
pub mod tree;
pub mod validate;

pub use drafts::{drafts, DraftsArgs};
pub use normalize::{normalize, NormalizeArgs};
pub use search::{search, SearchArgs};
pub use tree::{tree, TreeArgs};
pub use validate::{validate, ValidateArgs};

use anyhow::{Context, Result};
use pagecraft_document::{build_block_tree, flatten_block_tree, Block, Snapshot};
use std::path::Path;

/// Read a page document (`{ blocks, pageData }`) from disk.
///
/// Blocks may be stored flat or as a tree; either way the result is flat.
pub(crate) fn load_page(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut page: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a page document", path.display()))?;

    if is_tree(&page.blocks) {
        page.blocks = flatten_block_tree(&page.blocks);
    }
    Ok(page)
}

pub(crate) fn load_tree(path: &Path) -> Result<Vec<Block>> {
    let page = load_page(path)?;
    Ok(build_block_tree(&page.blocks))
}

pub(crate) fn is_tree(blocks: &[Block]) -> bool {
    blocks.iter().any(|block| !block.children.is_empty())
}
