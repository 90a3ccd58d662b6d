mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    drafts, normalize, search, tree, validate, DraftsArgs, NormalizeArgs, SearchArgs, TreeArgs,
    ValidateArgs,
};

/// Pagecraft CLI - inspect and repair block-tree page documents
#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check page documents for structural errors
    Validate(ValidateArgs),

    /// Print a page's block tree
    Tree(TreeArgs),

    /// Find blocks by label or content
    Search(SearchArgs),

    /// Rewrite a page with dense sibling orders
    Normalize(NormalizeArgs),

    /// Inspect and restore local crash-recovery drafts
    Drafts(DraftsArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Validate(args) => validate(args, &cwd),
        Command::Tree(args) => tree(args, &cwd),
        Command::Search(args) => search(args, &cwd),
        Command::Normalize(args) => normalize(args, &cwd),
        Command::Drafts(args) => drafts(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
