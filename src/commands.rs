//! CLI command implementations.
//!
//! Each `run_*` function resolves what it needs, prints to stdout, and
//! returns `anyhow::Result` so `main` can report failures uniformly.

use anyhow::{bail, Result};
use chrono::{Local, NaiveDateTime};
use std::path::Path;

use crate::cleanup;
use crate::collection::MemoCollection;
use crate::config::Config;
use crate::error::MemoError;
use crate::models::{format_timestamp, NormalizedRecord};
use crate::references::ReferenceScanner;
use crate::resolver::DocumentResolver;
use crate::{export, stats, views};

/// Explicitly constructed engine components for one CLI invocation.
pub struct Harness {
    pub config: Config,
    pub resolver: DocumentResolver,
    pub scanner: ReferenceScanner,
}

impl Harness {
    pub fn new(config: Config) -> Result<Self> {
        let resolver = DocumentResolver::new(&config.content)?;
        let scanner = ReferenceScanner::new(&config.assets)?;
        Ok(Self {
            config,
            resolver,
            scanner,
        })
    }

    pub fn resolve(&self) -> MemoCollection {
        self.resolver.resolve_all()
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn lookup(collection: &MemoCollection, id: u64) -> Result<&NormalizedRecord> {
    collection
        .find_by_id(id)
        .ok_or_else(|| MemoError::NotFound(id).into())
}

fn print_row(record: &NormalizedRecord) {
    let tags: Vec<&str> = record.tags.iter().collect();
    println!(
        "{:>5}  {}  {}{}",
        record.id,
        format_timestamp(&record.date),
        record.title,
        if tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", tags.join(", "))
        }
    );
}

pub fn run_list(harness: &Harness, tag: Option<&str>, json: bool) -> Result<()> {
    let collection = harness.resolve();
    let records: Vec<&NormalizedRecord> = match tag {
        Some(t) => collection.find_by_tag(t),
        None => collection.iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No memos.");
        return Ok(());
    }
    for record in records {
        print_row(record);
    }
    Ok(())
}

pub fn run_get(harness: &Harness, id: u64, json: bool) -> Result<()> {
    let collection = harness.resolve();
    let record = lookup(&collection, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    let tags: Vec<&str> = record.tags.iter().collect();
    println!("--- Memo ---");
    println!("id:           {}", record.id);
    println!("title:        {}", record.title);
    if !record.slug.is_empty() {
        println!("slug:         {}", record.slug);
    }
    if !record.summary.is_empty() {
        println!("summary:      {}", record.summary);
    }
    println!("date:         {}", format_timestamp(&record.date));
    println!("age:          {}", views::time_ago(now(), record.date));
    println!("tags:         {}", tags.join(", "));
    println!("checklist:    {}", record.has_checklist);
    println!("source:       {}", record.source_path.display());
    println!();
    println!("--- Body ---");
    println!("{}", harness.scanner.rewrite_asset_links(&record.body));
    Ok(())
}

pub fn run_search(harness: &Harness, query: &str, json: bool) -> Result<()> {
    let query = query.trim();
    let min = harness.config.listing.min_query_chars;
    if query.chars().count() < min {
        bail!("search query must be at least {} characters", min);
    }

    let collection = harness.resolve();
    let hits = views::search_hits(&collection, query, now(), &harness.config.listing);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "query": query,
                "results": hits,
                "total": hits.len(),
            }))?
        );
        return Ok(());
    }
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for hit in &hits {
        println!("{:>5}  {:<16} {}", hit.id, hit.time_ago, hit.title);
        println!("       {}", hit.snippet.replace('\n', " "));
    }
    Ok(())
}

pub fn run_random(harness: &Harness, count: Option<usize>) -> Result<()> {
    let collection = harness.resolve();
    let count = count.unwrap_or(harness.config.listing.random_count);
    let picks = views::random_sample(
        &collection,
        count,
        &mut rand::thread_rng(),
        now(),
        &harness.config.listing,
    );
    println!("{}", serde_json::to_string_pretty(&picks)?);
    Ok(())
}

pub fn run_attachments(harness: &Harness, id: u64) -> Result<()> {
    let collection = harness.resolve();
    let record = lookup(&collection, id)?;
    let refs = cleanup::live_attachments(record, &harness.scanner)?;
    if refs.is_empty() {
        println!("No local attachments.");
        return Ok(());
    }
    for r in refs {
        println!("{}\t{}", r.original_url, r.storage_path.display());
    }
    Ok(())
}

pub fn run_delete(harness: &Harness, id: u64, dry_run: bool) -> Result<()> {
    let collection = harness.resolve();
    let record = lookup(&collection, id)?;
    let plan = cleanup::plan_removal(record, &collection, &harness.scanner)?;

    println!("memo:        {}", plan.document.display());
    for r in &plan.attachments {
        println!("attachment:  {}", r.storage_path.display());
    }
    for r in &plan.shared {
        println!("kept:        {} (referenced by another memo)", r.storage_path.display());
    }
    for r in &plan.refused {
        println!("refused:     {} (outside storage root)", r.storage_path.display());
    }

    if dry_run {
        println!("dry run: nothing removed");
        return Ok(());
    }

    let report = cleanup::execute(&plan)?;
    println!(
        "removed: {}  missing: {}  failed: {}",
        report.removed.len(),
        report.missing.len(),
        report.failed.len()
    );
    Ok(())
}

pub fn run_export(harness: &Harness, output: Option<&Path>) -> Result<()> {
    export::run_export(&harness.resolve(), output)
}

pub fn run_stats(harness: &Harness) -> Result<()> {
    let collection = harness.resolve();
    stats::print_stats(harness.resolver.root(), &stats::compute(&collection));
    Ok(())
}
