use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_document::{validate_block_list, validate_block_tree, Snapshot, ValidationReport};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::is_tree;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Page document (.json) or directory of page documents
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn validate(args: ValidateArgs, _cwd: &str) -> Result<()> {
    let files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        find_page_files(&args.input)
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    };

    let mut invalid_files = 0;
    let mut total_errors = 0;

    for file in &files {
        let report = match validate_file(file) {
            Ok(report) => report,
            Err(err) => {
                eprintln!("{} {}: {:#}", "✗".red(), file.display(), err);
                invalid_files += 1;
                continue;
            }
        };

        if args.format == "json" {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if report.is_valid {
            println!("{} {}", "✓".green(), file.display());
        } else {
            println!("{} {}", "✗".red(), file.display());
            for error in &report.errors {
                println!("  {} {}", "error".red().bold(), error);
            }
        }

        if !report.is_valid {
            invalid_files += 1;
            total_errors += report.errors.len();
        }
    }

    if args.format != "json" {
        println!();
        println!("   Files checked: {}", files.len());
        if total_errors > 0 {
            println!("   {} {}", "Errors:".red(), total_errors);
        }
    }

    if invalid_files > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn validate_file(path: &Path) -> Result<ValidationReport> {
    let content = fs::read_to_string(path)?;
    let page: Snapshot = serde_json::from_str(&content)?;
    tracing::debug!(file = %path.display(), blocks = page.blocks.len(), "validating");

    // Tree-shaped documents are checked as stored; flat ones by parent links
    if is_tree(&page.blocks) {
        Ok(validate_block_tree(&page.blocks))
    } else {
        Ok(validate_block_list(&page.blocks))
    }
}

fn find_page_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_reports_leaf_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        fs::write(
            &path,
            r#"{
                "blocks": [
                    { "id": "a", "templateId": "text" },
                    { "id": "b", "templateId": "text", "parentId": "a" }
                ],
                "pageData": { "title": "Broken" }
            }"#,
        )
        .unwrap();

        let report = validate_file(&path).unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.errors[0].block_id(), "a");
    }

    #[test]
    fn test_find_page_files_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("nested/b.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let mut files = find_page_files(dir.path());
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "json"));
    }
}
