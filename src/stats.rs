//! Collection statistics.
//!
//! Provides a quick summary of what a resolution pass found: memo counts per
//! year, checklist usage, and tag frequencies. Used by `memo stats` to check
//! that a content tree resolves the way its author expects.

use std::collections::BTreeMap;

use crate::collection::MemoCollection;

/// Summary counts for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub total: usize,
    pub with_checklist: usize,
    pub per_year: BTreeMap<String, usize>,
    /// Tag frequencies, most frequent first, ties by name.
    pub tags: Vec<(String, usize)>,
}

pub fn compute(collection: &MemoCollection) -> CollectionStats {
    let mut per_year: BTreeMap<String, usize> = BTreeMap::new();
    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut with_checklist = 0;

    for record in collection {
        *per_year.entry(record.source_year.clone()).or_default() += 1;
        for tag in record.tags.iter() {
            *tag_counts.entry(tag).or_default() += 1;
        }
        if record.has_checklist {
            with_checklist += 1;
        }
    }

    let mut tags: Vec<(String, usize)> = tag_counts
        .into_iter()
        .map(|(t, n)| (t.to_string(), n))
        .collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    CollectionStats {
        total: collection.len(),
        with_checklist,
        per_year,
        tags,
    }
}

/// Print the stats block to stdout.
pub fn print_stats(root: &std::path::Path, stats: &CollectionStats) {
    println!("Memo Harness — Collection Stats");
    println!("===============================");
    println!();
    println!("  Root:        {}", root.display());
    println!("  Memos:       {}", stats.total);
    println!(
        "  Checklists:  {} / {} ({}%)",
        stats.with_checklist,
        stats.total,
        if stats.total > 0 {
            (stats.with_checklist * 100) / stats.total
        } else {
            0
        }
    );

    if !stats.per_year.is_empty() {
        println!();
        println!("  {:<8} {:>6}", "YEAR", "MEMOS");
        for (year, count) in &stats.per_year {
            println!("  {:<8} {:>6}", year, count);
        }
    }

    if !stats.tags.is_empty() {
        println!();
        println!("  {:<24} {:>6}", "TAG", "MEMOS");
        for (tag, count) in &stats.tags {
            println!("  {:<24} {:>6}", tag, count);
        }
    }
}
