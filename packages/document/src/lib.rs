//! # Pagecraft Document
//!
//! Block-tree model and pure tree operations shared by the CMS page builder
//! and the product-description builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: Block / PageData / Snapshot       │
//! │  - flat list linked by parent_id            │
//! │  - build / flatten / search / mutate        │
//! │  - explicit structural validation           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: selection, clipboard, history,      │
//! │         autosave and draft recovery         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use pagecraft_document::{build_block_tree, flatten_block_tree, Block, ContainerType};
//!
//! let flat = vec![
//!     Block::container("s1", "section-container", ContainerType::Section),
//!     Block::new("t1", "text").with_parent("s1"),
//! ];
//!
//! let tree = build_block_tree(&flat);
//! assert_eq!(tree[0].children[0].id, "t1");
//!
//! let back = flatten_block_tree(&tree);
//! assert_eq!(back.len(), 2);
//! ```

pub mod block;
pub mod id_generator;
pub mod page;
pub mod search;
pub mod tree;
pub mod validate;

pub use block::{Block, BlockPatch, ConfigMap, ConfigTab, ContainerType, LayoutSettings};
pub use id_generator::{get_page_seed, IdGenerator, IdSource};
pub use page::{PageData, Snapshot};
pub use search::search_blocks;
pub use tree::{
    build_block_tree, can_drop_into, duplicate_block, find_block_by_id, find_block_by_id_mut,
    find_block_parent, flatten_block_tree, get_block_ancestors, get_block_descendants,
    move_block_to_parent, normalize_block_orders, remove_block_from_tree, reorder_blocks,
    update_block_in_tree,
};
pub use validate::{validate_block_list, validate_block_tree, StructuralViolation, ValidationReport};
