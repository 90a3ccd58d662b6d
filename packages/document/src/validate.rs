//! Structural validation.
//!
//! Mutators do not enforce tree invariants inline; callers run these checks
//! explicitly, e.g. before saving or from tests.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::Block;

/// A broken tree invariant, naming the offending block id
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "blockId", rename_all = "camelCase")]
pub enum StructuralViolation {
    #[error("Duplicate block id: {0}")]
    DuplicateId(String),

    #[error("Block {0} appears in its own ancestor chain")]
    Cycle(String),

    #[error("Block {0} is not a container but has children")]
    LeafWithChildren(String),
}

impl StructuralViolation {
    pub fn block_id(&self) -> &str {
        match self {
            StructuralViolation::DuplicateId(id)
            | StructuralViolation::Cycle(id)
            | StructuralViolation::LeafWithChildren(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<StructuralViolation>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<StructuralViolation>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check a materialized tree for duplicate ids, blocks nested under
/// themselves, and children on leaf blocks.
pub fn validate_block_tree(tree: &[Block]) -> ValidationReport {
    let mut walker = TreeWalker::default();
    let mut ancestors = Vec::new();
    walker.walk(tree, &mut ancestors);
    ValidationReport::from_errors(walker.errors)
}

#[derive(Default)]
struct TreeWalker<'a> {
    seen: HashSet<&'a str>,
    reported_duplicates: HashSet<&'a str>,
    errors: Vec<StructuralViolation>,
}

impl<'a> TreeWalker<'a> {
    fn walk(&mut self, blocks: &'a [Block], ancestors: &mut Vec<&'a str>) {
        for block in blocks {
            let id = block.id.as_str();

            if ancestors.contains(&id) {
                self.errors.push(StructuralViolation::Cycle(id.to_string()));
            }

            if !self.seen.insert(id) && self.reported_duplicates.insert(id) {
                self.errors.push(StructuralViolation::DuplicateId(id.to_string()));
            }

            if !block.is_container() && !block.children.is_empty() {
                self.errors
                    .push(StructuralViolation::LeafWithChildren(id.to_string()));
            }

            ancestors.push(id);
            self.walk(&block.children, ancestors);
            ancestors.pop();
        }
    }
}

/// The same checks against the authoritative flat list, following
/// `parent_id` links instead of materialized children.
pub fn validate_block_list(flat: &[Block]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut by_id: HashMap<&str, &Block> = HashMap::with_capacity(flat.len());
    let mut reported_duplicates = HashSet::new();

    for block in flat {
        let id = block.id.as_str();
        if by_id.insert(id, block).is_some() && reported_duplicates.insert(id) {
            errors.push(StructuralViolation::DuplicateId(id.to_string()));
        }
    }

    let mut reported_leaves = HashSet::new();
    for block in flat {
        if parent_chain_loops(block, &by_id) {
            errors.push(StructuralViolation::Cycle(block.id.clone()));
        }

        let parent = block.parent_id.as_deref().and_then(|pid| by_id.get(pid));
        if let Some(parent) = parent {
            if !parent.is_container() && reported_leaves.insert(parent.id.as_str()) {
                errors.push(StructuralViolation::LeafWithChildren(parent.id.clone()));
            }
        }
    }

    ValidationReport::from_errors(errors)
}

fn parent_chain_loops(block: &Block, by_id: &HashMap<&str, &Block>) -> bool {
    let mut visited = HashSet::new();
    let mut current = block.parent_id.as_deref();
    while let Some(parent_id) = current {
        if parent_id == block.id {
            return true;
        }
        if !visited.insert(parent_id) {
            // Loops further up, not through this block
            return false;
        }
        current = by_id.get(parent_id).and_then(|parent| parent.parent_id.as_deref());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_block_tree, ContainerType};

    fn section(id: &str) -> Block {
        Block::container(id, "section-container", ContainerType::Section)
    }

    #[test]
    fn test_valid_tree() {
        let tree = build_block_tree(&[section("s"), Block::new("t", "text").with_parent("s")]);
        let report = validate_block_tree(&tree);

        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_duplicate_id_is_named() {
        let tree = vec![section("s"), Block::new("s", "text")];
        let report = validate_block_tree(&tree);

        assert!(!report.is_valid);
        assert_eq!(report.errors, vec![StructuralViolation::DuplicateId("s".to_string())]);
        assert!(report.errors[0].to_string().contains("s"));
    }

    #[test]
    fn test_leaf_with_children() {
        let tree = vec![Block::new("leaf", "text").with_children(vec![Block::new("x", "text")])];
        let report = validate_block_tree(&tree);

        assert_eq!(
            report.errors,
            vec![StructuralViolation::LeafWithChildren("leaf".to_string())]
        );
    }

    #[test]
    fn test_block_nested_under_itself() {
        let tree = vec![section("a").with_children(vec![section("b").with_children(vec![section("a")])])];
        let report = validate_block_tree(&tree);

        assert!(report.errors.contains(&StructuralViolation::Cycle("a".to_string())));
        assert!(report.errors.contains(&StructuralViolation::DuplicateId("a".to_string())));
    }

    #[test]
    fn test_flat_list_cycle_and_leaf_parent() {
        let flat = vec![
            section("a").with_parent("b"),
            section("b").with_parent("a"),
            Block::new("leaf", "text"),
            Block::new("child", "text").with_parent("leaf"),
            Block::new("top", "text").with_parent("a"),
        ];
        let report = validate_block_list(&flat);

        assert!(report.errors.contains(&StructuralViolation::Cycle("a".to_string())));
        assert!(report.errors.contains(&StructuralViolation::Cycle("b".to_string())));
        assert!(report
            .errors
            .contains(&StructuralViolation::LeafWithChildren("leaf".to_string())));
        // Hanging off a cycle is not itself a cycle
        assert!(!report.errors.contains(&StructuralViolation::Cycle("top".to_string())));
    }
}
