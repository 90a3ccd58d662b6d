use crate::Block;

/// Case-insensitive substring search over display labels and the serialized
/// content config. Results are in pre-order; the empty query matches every
/// block.
pub fn search_blocks<'a>(tree: &'a [Block], query: &str) -> Vec<&'a Block> {
    let needle = query.to_lowercase();
    let mut matches = Vec::new();
    collect_matches(tree, &needle, &mut matches);
    matches
}

fn collect_matches<'a>(blocks: &'a [Block], needle: &str, matches: &mut Vec<&'a Block>) {
    for block in blocks {
        if block_matches(block, needle) {
            matches.push(block);
        }
        collect_matches(&block.children, needle, matches);
    }
}

fn block_matches(block: &Block, needle: &str) -> bool {
    if block.display_label().to_lowercase().contains(needle) {
        return true;
    }
    serde_json::to_string(&block.content_config)
        .map(|content| content.to_lowercase().contains(needle))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_block_tree, ContainerType};
    use serde_json::json;

    fn tree() -> Vec<Block> {
        build_block_tree(&[
            Block::container("s", "section-container", ContainerType::Section).with_label("Hero"),
            Block::new("h", "heading")
                .with_parent("s")
                .with_content("text", json!("Big Summer SALE")),
            Block::new("p", "paragraph")
                .with_parent("s")
                .with_order(1)
                .with_content("text", json!("Free shipping")),
        ])
    }

    fn ids<'a>(blocks: &[&'a Block]) -> Vec<&'a str> {
        blocks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_matches_label_case_insensitively() {
        let tree = tree();
        assert_eq!(ids(&search_blocks(&tree, "hero")), vec!["s"]);
        assert_eq!(ids(&search_blocks(&tree, "HEADING")), vec!["h"]);
    }

    #[test]
    fn test_matches_content_config() {
        let tree = tree();
        assert_eq!(ids(&search_blocks(&tree, "summer sale")), vec!["h"]);
        assert_eq!(ids(&search_blocks(&tree, "shipping")), vec!["p"]);
        assert!(search_blocks(&tree, "checkout").is_empty());
    }

    #[test]
    fn test_empty_query_matches_all() {
        let tree = tree();
        assert_eq!(ids(&search_blocks(&tree, "")), vec!["s", "h", "p"]);
    }
}
