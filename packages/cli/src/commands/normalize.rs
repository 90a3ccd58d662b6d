use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_document::{build_block_tree, flatten_block_tree, normalize_block_orders, Snapshot};
use std::path::PathBuf;

use super::load_page;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Page document (.json)
    pub input: PathBuf,

    /// Output file; prints to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn normalize(args: NormalizeArgs, _cwd: &str) -> Result<()> {
    let page = load_page(&args.input)?;
    let normalized = normalize_page(page);
    let json = serde_json::to_string_pretty(&normalized)?;

    match args.output {
        Some(output) => {
            std::fs::write(&output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "{} {} → {}",
                "✓".green(),
                args.input.display(),
                output.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Rebuild the block list so that orders are dense and parents precede
/// their children
fn normalize_page(page: Snapshot) -> Snapshot {
    let tree = normalize_block_orders(&build_block_tree(&page.blocks));
    Snapshot::new(flatten_block_tree(&tree), page.page_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::{Block, ContainerType, PageData};

    #[test]
    fn test_normalize_page_compacts_orders() {
        let page = Snapshot::new(
            vec![
                Block::new("t2", "text").with_parent("s").with_order(40),
                Block::container("s", "section-container", ContainerType::Section).with_order(7),
                Block::new("t1", "text").with_parent("s").with_order(10),
                Block::new("orphan", "text").with_parent("gone").with_order(3),
            ],
            PageData::new(),
        );

        let normalized = normalize_page(page);

        let summary: Vec<(&str, Option<&str>, i64)> = normalized
            .blocks
            .iter()
            .map(|b| (b.id.as_str(), b.parent_id.as_deref(), b.order))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("orphan", None, 0),
                ("s", None, 1),
                ("t1", Some("s"), 0),
                ("t2", Some("s"), 1),
            ]
        );
    }
}
