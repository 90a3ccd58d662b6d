use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_document::search_blocks;
use std::path::PathBuf;

use super::load_tree;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Page document (.json)
    pub input: PathBuf,

    /// Text to look for in labels and content
    pub query: String,
}

pub fn search(args: SearchArgs, _cwd: &str) -> Result<()> {
    let tree = load_tree(&args.input)?;
    let matches = search_blocks(&tree, &args.query);

    for block in &matches {
        println!(
            "{} {} {}",
            block.id.bold(),
            block.container_type.as_str().cyan(),
            block.display_label()
        );
    }

    println!();
    println!("   {} match(es)", matches.len());
    Ok(())
}
