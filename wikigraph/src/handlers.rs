use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use wikigraph_core::{CrawlRecord, GraphStore, StoreError};

// Helper functions for the import handler

/// Expand `~` in a user-supplied store path.
pub fn expand_store_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Parse a single line as a JSON crawl record; blank lines are skipped.
pub fn parse_record_line(line: &str) -> Option<CrawlRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(record) => Some(record),
        Err(e) => {
            eprintln!("[!] Skipping malformed record: {}", e);
            None
        }
    }
}

/// Load crawl records from a newline-delimited JSON file.
pub fn load_records_from_file(path: &Path) -> Result<Vec<CrawlRecord>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read records file {}: {}", path.display(), e))?;

    let records: Vec<CrawlRecord> = content.lines().filter_map(parse_record_line).collect();

    if records.is_empty() {
        return Err(format!("No valid records found in {}", path.display()));
    }

    Ok(records)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    let raw_path = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");
    let store_path = expand_store_path(raw_path);

    if force && store_path.exists() {
        fs::remove_file(&store_path)
            .with_context(|| format!("failed to remove {}", store_path.display()))?;
        println!("{} Removed existing store", "✓".yellow().bold());
    }

    GraphStore::create(&store_path)
        .with_context(|| format!("failed to create store at {}", store_path.display()))?;

    println!(
        "{} Store created: {}",
        "✓".green().bold(),
        store_path.display().to_string().bright_white()
    );
    Ok(())
}

pub fn handle_import(args: &ArgMatches, quiet: bool) -> Result<()> {
    let store_path = expand_store_path(args.get_one::<String>("store").unwrap());
    let records_path = args.get_one::<PathBuf>("records").unwrap();

    let mut store = GraphStore::open(&store_path)
        .with_context(|| format!("failed to open store at {}", store_path.display()))?;
    let records = load_records_from_file(records_path).map_err(anyhow::Error::msg)?;

    let bar = if quiet {
        None
    } else {
        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap(),
        );
        Some(pb)
    };

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for record in &records {
        match store.expand_record(record) {
            Ok(()) => imported += 1,
            Err(StoreError::AlreadyExpanded(name)) => {
                // Duplicate records in the spool are skipped, not fatal.
                warn!(article = %name, "already expanded, skipping");
                skipped += 1;
            }
            Err(e) => {
                if let Some(ref pb) = bar {
                    pb.abandon();
                }
                return Err(e)
                    .with_context(|| format!("import aborted at article '{}'", record.name));
            }
        }
        if let Some(ref pb) = bar {
            pb.inc(1);
        }
    }
    if let Some(pb) = bar {
        pb.finish_and_clear();
    }

    println!(
        "{} Imported {} records ({} skipped)",
        "✓".green().bold(),
        imported.to_string().bright_white(),
        skipped
    );
    println!(
        "{} Frontier now holds {} articles",
        "→".blue(),
        store.frontier().len().to_string().bright_white()
    );
    Ok(())
}

pub fn handle_stats(args: &ArgMatches) -> Result<()> {
    let store_path = expand_store_path(args.get_one::<String>("store").unwrap());
    let store = GraphStore::open(&store_path)
        .with_context(|| format!("failed to open store at {}", store_path.display()))?;

    let article_count = store.article_count()?;
    let frontier_size = article_count as usize - store.expanded_count();

    print_divider();
    println!("{}", "  WIKIGRAPH STORE".bright_white().bold());
    print_divider();
    println!("  articles:       {}", article_count);
    println!("  expanded:       {}", store.expanded_count());
    println!("  frontier:       {}", frontier_size);
    println!("  redirect names: {}", store.redirect_count()?);
    println!("  link edges:     {}", store.link_count()?);
    println!("  redirect edges: {}", store.redirect_edge_count()?);
    print_divider();
    Ok(())
}

pub fn handle_frontier(args: &ArgMatches) -> Result<()> {
    let store_path = expand_store_path(args.get_one::<String>("store").unwrap());
    let limit = *args.get_one::<usize>("limit").unwrap();

    let store = GraphStore::open(&store_path)
        .with_context(|| format!("failed to open store at {}", store_path.display()))?;

    let frontier = store.frontier();
    for name in frontier.iter().take(limit) {
        println!("{}", name);
    }
    if frontier.len() > limit {
        println!(
            "{} ... and {} more",
            "→".blue(),
            (frontier.len() - limit).to_string().bright_white()
        );
    }
    Ok(())
}
