//! # Tree Operations
//!
//! Pure functions converting between the flat, `parent_id`-linked block list
//! and its materialized tree, plus structural edits over the tree.
//!
//! ## Ownership model
//!
//! ```text
//! flat list  ──build_block_tree──▶  tree (children populated)
//!     ▲                                  │
//!     └────────flatten_block_tree────────┘
//! ```
//!
//! Every function borrows its input and returns a new value. Callers that
//! move blocks must check [`can_drop_into`] first; the mutators here do not
//! re-validate structure.

use std::collections::HashMap;

use crate::{Block, BlockPatch, IdSource};

/// Materialize a flat block list into a tree.
///
/// Runs in two passes: index every block by id, then attach each block to
/// its parent. A block whose `parent_id` resolves to nothing is recovered as
/// a root rather than dropped. Children are sorted by `order` (stable).
///
/// Blocks whose parent chain loops back on itself are unreachable from any
/// root; each such cycle is broken at its first block in input order, which
/// becomes a root.
pub fn build_block_tree(flat: &[Block]) -> Vec<Block> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(flat.len());
    for (position, block) in flat.iter().enumerate() {
        index.entry(block.id.as_str()).or_insert(position);
    }

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    let mut roots = Vec::new();
    let mut orphans = Vec::new();

    for (position, block) in flat.iter().enumerate() {
        match block.parent_id.as_deref() {
            None => roots.push(position),
            Some(parent_id) => match index.get(parent_id) {
                Some(&parent) if parent != position => children_of[parent].push(position),
                _ => {
                    tracing::warn!(
                        block_id = %block.id,
                        parent_id,
                        "parent not found, recovering block as root"
                    );
                    orphans.push(position);
                }
            },
        }
    }

    roots.extend(orphans.iter().copied());
    sort_by_order(&mut roots, flat);
    for children in &mut children_of {
        sort_by_order(children, flat);
    }

    let mut placed = vec![false; flat.len()];
    let mut tree: Vec<Block> = roots
        .iter()
        .filter_map(|&root| assemble(root, flat, &children_of, &mut placed))
        .collect();

    for position in 0..flat.len() {
        if placed[position] {
            continue;
        }
        tracing::warn!(
            block_id = %flat[position].id,
            "parent chain is cyclic, recovering block as root"
        );
        if let Some(block) = assemble(position, flat, &children_of, &mut placed) {
            tree.push(block);
        }
    }

    for block in &mut tree {
        block.parent_id = None;
    }

    tree
}

fn sort_by_order(positions: &mut [usize], flat: &[Block]) {
    positions.sort_by_key(|&position| flat[position].order);
}

fn assemble(
    position: usize,
    flat: &[Block],
    children_of: &[Vec<usize>],
    placed: &mut [bool],
) -> Option<Block> {
    if placed[position] {
        return None;
    }
    placed[position] = true;

    let mut block = flat[position].detached();
    block.children = children_of[position]
        .iter()
        .filter_map(|&child| assemble(child, flat, children_of, placed))
        .collect();
    Some(block)
}

/// Flatten a tree into its pre-order list.
///
/// `children` is stripped, descendants get `parent_id` from their position in
/// the tree, and every block's `order` becomes its sibling rank. Top-level
/// blocks keep their own `parent_id`, so a detached subtree flattens back
/// under the parent it names.
pub fn flatten_block_tree(tree: &[Block]) -> Vec<Block> {
    let mut flat = Vec::new();
    for (rank, block) in tree.iter().enumerate() {
        let parent_id = block.parent_id.clone();
        flatten_into(block, parent_id, rank, &mut flat);
    }
    flat
}

fn flatten_into(block: &Block, parent_id: Option<String>, rank: usize, flat: &mut Vec<Block>) {
    let mut detached = block.detached();
    detached.parent_id = parent_id;
    detached.order = rank as i64;
    flat.push(detached);

    for (child_rank, child) in block.children.iter().enumerate() {
        flatten_into(child, Some(block.id.clone()), child_rank, flat);
    }
}

pub fn find_block_by_id<'a>(tree: &'a [Block], id: &str) -> Option<&'a Block> {
    for block in tree {
        if block.id == id {
            return Some(block);
        }
        if let Some(found) = find_block_by_id(&block.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_block_by_id_mut<'a>(tree: &'a mut [Block], id: &str) -> Option<&'a mut Block> {
    for block in tree {
        if block.id == id {
            return Some(block);
        }
        if let Some(found) = find_block_by_id_mut(&mut block.children, id) {
            return Some(found);
        }
    }
    None
}

/// Immediate parent of `id`, or `None` for roots and unknown ids
pub fn find_block_parent<'a>(tree: &'a [Block], id: &str) -> Option<&'a Block> {
    for block in tree {
        if block.children.iter().any(|child| child.id == id) {
            return Some(block);
        }
        if let Some(found) = find_block_parent(&block.children, id) {
            return Some(found);
        }
    }
    None
}

/// Ancestors of `id`, ordered from the root down to the immediate parent
pub fn get_block_ancestors<'a>(tree: &'a [Block], id: &str) -> Vec<&'a Block> {
    let mut path = Vec::new();
    if path_to(tree, id, &mut path) {
        path
    } else {
        Vec::new()
    }
}

fn path_to<'a>(blocks: &'a [Block], id: &str, path: &mut Vec<&'a Block>) -> bool {
    for block in blocks {
        if block.id == id {
            return true;
        }
        path.push(block);
        if path_to(&block.children, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Every descendant of `id` in pre-order, excluding the block itself
pub fn get_block_descendants<'a>(tree: &'a [Block], id: &str) -> Vec<&'a Block> {
    let mut descendants = Vec::new();
    if let Some(block) = find_block_by_id(tree, id) {
        collect_descendants(block, &mut descendants);
    }
    descendants
}

fn collect_descendants<'a>(block: &'a Block, out: &mut Vec<&'a Block>) {
    for child in &block.children {
        out.push(child);
        collect_descendants(child, out);
    }
}

/// Merge `patch` into the block with the given id
pub fn update_block_in_tree(tree: &[Block], id: &str, patch: &BlockPatch) -> Vec<Block> {
    tree.iter()
        .map(|block| {
            if block.id == id {
                let mut updated = block.clone();
                patch.apply_to(&mut updated);
                updated
            } else if block.children.is_empty() {
                block.clone()
            } else {
                let mut updated = block.detached();
                updated.children = update_block_in_tree(&block.children, id, patch);
                updated
            }
        })
        .collect()
}

/// Remove the block and its entire subtree
pub fn remove_block_from_tree(tree: &[Block], id: &str) -> Vec<Block> {
    tree.iter()
        .filter(|block| block.id != id)
        .map(|block| {
            let mut kept = block.detached();
            kept.children = remove_block_from_tree(&block.children, id);
            kept
        })
        .collect()
}

/// Detach `id` and reattach it under `new_parent_id` at `new_order`, or at
/// the root level when `new_parent_id` is `None`.
///
/// `new_order` is clamped to the number of siblings. Sibling orders are not
/// renormalized; run [`normalize_block_orders`] afterwards. If the block or
/// the new parent cannot be found the tree is returned unchanged.
pub fn move_block_to_parent(
    tree: &[Block],
    id: &str,
    new_parent_id: Option<&str>,
    new_order: usize,
) -> Vec<Block> {
    let mut working = tree.to_vec();
    let Some(mut node) = take_block(&mut working, id) else {
        return tree.to_vec();
    };
    node.parent_id = new_parent_id.map(str::to_string);

    let siblings = match new_parent_id {
        None => &mut working,
        Some(parent_id) => match find_block_by_id_mut(&mut working, parent_id) {
            Some(parent) => &mut parent.children,
            None => return tree.to_vec(),
        },
    };

    let at = new_order.min(siblings.len());
    node.order = at as i64;
    siblings.insert(at, node);
    working
}

fn take_block(blocks: &mut Vec<Block>, id: &str) -> Option<Block> {
    if let Some(position) = blocks.iter().position(|block| block.id == id) {
        return Some(blocks.remove(position));
    }
    blocks
        .iter_mut()
        .find_map(|block| take_block(&mut block.children, id))
}

/// Deep clone `block` and its descendants, giving every node a fresh id.
///
/// The copy keeps the source's `parent_id` and sits one rank after it.
pub fn duplicate_block(block: &Block, ids: &mut impl IdSource) -> Block {
    let mut copy = clone_with_fresh_ids(block, block.parent_id.clone(), ids);
    copy.order = block.order + 1;
    copy
}

fn clone_with_fresh_ids(block: &Block, parent_id: Option<String>, ids: &mut impl IdSource) -> Block {
    let mut copy = block.detached();
    copy.id = ids.next_id();
    copy.parent_id = parent_id;
    copy.children = block
        .children
        .iter()
        .map(|child| clone_with_fresh_ids(child, Some(copy.id.clone()), ids))
        .collect();
    copy
}

/// Whether `dragged` may become a child of `target`.
///
/// This is the only guard against cycles: leaves never accept children, a
/// block cannot contain itself, and nothing may be dropped into its own
/// subtree.
pub fn can_drop_into(dragged: &Block, target: &Block) -> bool {
    if !target.is_container() {
        return false;
    }
    if dragged.id == target.id {
        return false;
    }
    !subtree_contains(dragged, &target.id)
}

fn subtree_contains(block: &Block, id: &str) -> bool {
    block
        .children
        .iter()
        .any(|child| child.id == id || subtree_contains(child, id))
}

/// Reassign `order` to a dense rank within every sibling group, recursively.
///
/// At the top level siblings are grouped by `parent_id` and ranked by
/// `(order, position)`, so this works on a flat list as well as on a tree.
/// List positions are kept. Nested children are already sorted and are ranked
/// by index.
pub fn normalize_block_orders(list: &[Block]) -> Vec<Block> {
    let mut groups: HashMap<Option<&str>, Vec<usize>> = HashMap::new();
    for (position, block) in list.iter().enumerate() {
        groups
            .entry(block.parent_id.as_deref())
            .or_default()
            .push(position);
    }

    let mut ranks = vec![0i64; list.len()];
    for positions in groups.values_mut() {
        // Stable, so equal orders keep their list position
        positions.sort_by_key(|&position| list[position].order);
        for (rank, &position) in positions.iter().enumerate() {
            ranks[position] = rank as i64;
        }
    }

    list.iter()
        .zip(ranks)
        .map(|(block, rank)| {
            let mut normalized = block.detached();
            normalized.order = rank;
            normalized.children = normalize_siblings(&block.children);
            normalized
        })
        .collect()
}

fn normalize_siblings(children: &[Block]) -> Vec<Block> {
    children
        .iter()
        .enumerate()
        .map(|(rank, child)| {
            let mut normalized = child.detached();
            normalized.order = rank as i64;
            normalized.children = normalize_siblings(&child.children);
            normalized
        })
        .collect()
}

/// Move one entry of a sibling list and re-index the whole list.
/// Out-of-range indices leave the list unchanged.
pub fn reorder_blocks(list: &[Block], from_index: usize, to_index: usize) -> Vec<Block> {
    let mut reordered = list.to_vec();
    if from_index >= reordered.len() || to_index >= reordered.len() {
        return reordered;
    }

    let moved = reordered.remove(from_index);
    reordered.insert(to_index, moved);
    for (rank, block) in reordered.iter_mut().enumerate() {
        block.order = rank as i64;
    }
    reordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigTab, ConfigMap, ContainerType};
    use serde_json::json;

    fn section(id: &str) -> Block {
        Block::container(id, "section-container", ContainerType::Section)
    }

    fn sample_flat() -> Vec<Block> {
        vec![
            section("s1").with_order(0),
            Block::new("t2", "text").with_parent("s1").with_order(1),
            Block::new("t1", "text").with_parent("s1").with_order(0),
            section("s2").with_order(1),
            Block::new("h1", "heading").with_parent("s2").with_order(0),
        ]
    }

    fn ids(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_build_attaches_and_sorts_children() {
        let tree = build_block_tree(&sample_flat());

        assert_eq!(ids(&tree), vec!["s1", "s2"]);
        assert_eq!(ids(&tree[0].children), vec!["t1", "t2"]);
        assert_eq!(ids(&tree[1].children), vec!["h1"]);
    }

    #[test]
    fn test_build_recovers_orphans_as_roots() {
        let flat = vec![
            section("s1"),
            Block::new("lost", "text").with_parent("missing").with_order(1),
        ];
        let tree = build_block_tree(&flat);

        assert_eq!(ids(&tree), vec!["s1", "lost"]);
        assert_eq!(tree[1].parent_id, None);
    }

    #[test]
    fn test_build_recovers_cyclic_chain() {
        let flat = vec![
            section("root"),
            section("a").with_parent("b"),
            section("b").with_parent("a"),
            Block::new("self", "text").with_parent("self"),
        ];
        let tree = build_block_tree(&flat);

        let flattened = flatten_block_tree(&tree);
        assert_eq!(flattened.len(), 4);
        assert!(find_block_by_id(&tree, "a").is_some());
        assert!(find_block_by_id(&tree, "b").is_some());
        assert!(find_block_by_id(&tree, "self").is_some());
    }

    #[test]
    fn test_flatten_is_preorder_with_ranks() {
        let flat = flatten_block_tree(&build_block_tree(&sample_flat()));

        assert_eq!(ids(&flat), vec!["s1", "t1", "t2", "s2", "h1"]);
        assert_eq!(flat[2].order, 1);
        assert_eq!(flat[2].parent_id.as_deref(), Some("s1"));
        assert!(flat.iter().all(|b| b.children.is_empty()));
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let flat = vec![
            section("a"),
            section("b").with_parent("a"),
            Block::new("c", "text").with_parent("b"),
            Block::new("d", "text").with_parent("a").with_order(1),
        ];
        let tree = build_block_tree(&flat);

        assert_eq!(ids_of(&get_block_ancestors(&tree, "c")), vec!["a", "b"]);
        assert_eq!(ids_of(&get_block_descendants(&tree, "a")), vec!["b", "c", "d"]);
        assert_eq!(find_block_parent(&tree, "c").map(|b| b.id.as_str()), Some("b"));
        assert!(find_block_parent(&tree, "a").is_none());
        assert!(get_block_ancestors(&tree, "nope").is_empty());
    }

    fn ids_of<'a>(blocks: &[&'a Block]) -> Vec<&'a str> {
        blocks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_update_merges_patch() {
        let tree = build_block_tree(&sample_flat());
        let mut content = ConfigMap::new();
        content.insert("text".to_string(), json!("Updated"));

        let updated = update_block_in_tree(&tree, "t2", &BlockPatch::config(ConfigTab::Content, content));

        let block = find_block_by_id(&updated, "t2").unwrap();
        assert_eq!(block.content_config["text"], json!("Updated"));
        // Untouched subtree is equal to the original
        assert_eq!(updated[1], tree[1]);
    }

    #[test]
    fn test_remove_cascades() {
        let tree = build_block_tree(&sample_flat());
        let remaining = flatten_block_tree(&remove_block_from_tree(&tree, "s1"));

        assert_eq!(ids(&remaining), vec!["s2", "h1"]);
    }

    #[test]
    fn test_move_between_parents() {
        let tree = build_block_tree(&sample_flat());
        let moved = move_block_to_parent(&tree, "t1", Some("s2"), 0);

        let s2 = find_block_by_id(&moved, "s2").unwrap();
        assert_eq!(ids(&s2.children), vec!["t1", "h1"]);
        assert_eq!(s2.children[0].parent_id.as_deref(), Some("s2"));
    }

    #[test]
    fn test_move_to_root_and_clamp() {
        let tree = build_block_tree(&sample_flat());
        let moved = move_block_to_parent(&tree, "h1", None, 99);

        assert_eq!(ids(&moved), vec!["s1", "s2", "h1"]);
        assert_eq!(moved[2].parent_id, None);
        assert_eq!(moved[2].order, 2);
    }

    #[test]
    fn test_move_to_unknown_parent_is_noop() {
        let tree = build_block_tree(&sample_flat());
        assert_eq!(move_block_to_parent(&tree, "t1", Some("ghost"), 0), tree);
        assert_eq!(move_block_to_parent(&tree, "ghost", None, 0), tree);
    }

    #[test]
    fn test_duplicate_assigns_fresh_ids() {
        let tree = build_block_tree(&sample_flat());
        let mut n = 0;
        let mut next = || {
            n += 1;
            format!("copy-{}", n)
        };

        let copy = duplicate_block(&tree[0], &mut next);

        assert_eq!(copy.id, "copy-1");
        assert_eq!(copy.order, tree[0].order + 1);
        assert_eq!(ids(&copy.children), vec!["copy-2", "copy-3"]);
        assert!(copy.children.iter().all(|c| c.parent_id.as_deref() == Some("copy-1")));
        assert_eq!(copy.children[0].template_id, tree[0].children[0].template_id);
    }

    #[test]
    fn test_can_drop_into() {
        let tree = build_block_tree(&[
            section("a"),
            section("b").with_parent("a"),
            section("c").with_parent("b"),
            Block::new("leaf", "text"),
        ]);
        let a = find_block_by_id(&tree, "a").unwrap();
        let c = find_block_by_id(&tree, "c").unwrap();
        let leaf = find_block_by_id(&tree, "leaf").unwrap();

        assert!(!can_drop_into(a, a));
        assert!(!can_drop_into(a, c));
        assert!(!can_drop_into(c, leaf));
        assert!(can_drop_into(c, a));
        assert!(can_drop_into(leaf, c));
    }

    #[test]
    fn test_normalize_flat_list_groups_by_parent() {
        let flat = vec![
            section("s1").with_order(4),
            Block::new("t1", "text").with_parent("s1").with_order(7),
            section("s2").with_order(9),
            Block::new("t2", "text").with_parent("s1").with_order(8),
        ];
        let normalized = normalize_block_orders(&flat);
        let orders: Vec<i64> = normalized.iter().map(|b| b.order).collect();

        assert_eq!(orders, vec![0, 0, 1, 1]);
        assert_eq!(normalize_block_orders(&normalized), normalized);
    }

    #[test]
    fn test_normalize_ranks_siblings_by_stored_order() {
        let flat = vec![
            Block::new("a", "text").with_order(1),
            Block::new("b", "text").with_order(0),
            Block::new("c", "text").with_order(1),
        ];
        let normalized = normalize_block_orders(&flat);
        let summary: Vec<(&str, i64)> = normalized
            .iter()
            .map(|b| (b.id.as_str(), b.order))
            .collect();

        assert_eq!(summary, vec![("a", 1), ("b", 0), ("c", 2)]);
        let tree = build_block_tree(&normalized);
        assert_eq!(ids(&tree), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reorder_swaps_orders() {
        let list = vec![Block::new("a", "text"), Block::new("b", "text").with_order(1)];
        let reordered = reorder_blocks(&list, 1, 0);

        assert_eq!(ids(&reordered), vec!["b", "a"]);
        assert_eq!(reordered[0].order, 0);
        assert_eq!(reordered[1].order, 1);
        assert_eq!(reorder_blocks(&list, 5, 0), list);
    }
}
