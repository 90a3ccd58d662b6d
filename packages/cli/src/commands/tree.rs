use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_document::Block;
use std::path::PathBuf;

use super::load_tree;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Page document (.json)
    pub input: PathBuf,
}

pub fn tree(args: TreeArgs, _cwd: &str) -> Result<()> {
    let tree = load_tree(&args.input)?;
    let mut out = String::new();
    render(&tree, 0, &mut out);
    print!("{}", out);
    Ok(())
}

fn render(blocks: &[Block], depth: usize, out: &mut String) {
    for block in blocks {
        let mut line = format!(
            "{}{} {} {}",
            "  ".repeat(depth),
            block.id.bold(),
            block.container_type.as_str().cyan(),
            block.display_label()
        );
        if !block.is_visible {
            line.push_str(&format!(" {}", "(hidden)".dimmed()));
        }
        out.push_str(&line);
        out.push('\n');
        render(&block.children, depth + 1, out);
    }
}
