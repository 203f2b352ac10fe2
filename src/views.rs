//! Derived, display-oriented fields computed from resolved records.
//!
//! Nothing here renders markup. These are the per-request values the listing
//! surfaces need next to a record: a display title, a relative age, a short
//! snippet, and a random selection for "more memos" panels.

use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::collection::MemoCollection;
use crate::config::ListingConfig;
use crate::models::{format_timestamp, NormalizedRecord, TagSet};

/// Human relative age of `then` as seen from `now`.
///
/// Whole days win; otherwise hours when the remainder exceeds an hour,
/// minutes when it exceeds a minute, else "just now". Future dates read as
/// "just now".
pub fn time_ago(now: NaiveDateTime, then: NaiveDateTime) -> String {
    let diff = now - then;
    if diff < chrono::Duration::zero() {
        return "just now".to_string();
    }

    let days = diff.num_days();
    if days > 0 {
        return plural(days, "day");
    }
    let secs = diff.num_seconds();
    if secs > 3600 {
        plural(secs / 3600, "hour")
    } else if secs > 60 {
        plural(secs / 60, "minute")
    } else {
        "just now".to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Truncate to `max` characters, appending `...` when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// First line of the trimmed body.
pub fn first_line(body: &str) -> &str {
    body.trim().lines().next().unwrap_or("")
}

/// Title to show for a record, and whether it is an explicit title.
///
/// A title equal to the file stem is treated as implicit, in which case the
/// first body line stands in for it.
pub fn display_title(record: &NormalizedRecord, max_chars: usize) -> (String, bool) {
    let explicit = !record.title.is_empty() && record.title != record.file_stem();
    if explicit {
        (record.title.clone(), true)
    } else {
        (truncate_chars(first_line(&record.body), max_chars), false)
    }
}

/// Compact listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoSummary {
    pub id: u64,
    pub title: String,
    pub has_title: bool,
    pub tags: TagSet,
    pub time_ago: String,
}

impl MemoSummary {
    pub fn from_record(record: &NormalizedRecord, now: NaiveDateTime, listing: &ListingConfig) -> Self {
        let (title, has_title) = display_title(record, listing.title_max_chars);
        Self {
            id: record.id,
            title,
            has_title,
            tags: record.tags.clone(),
            time_ago: time_ago(now, record.date),
        }
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: u64,
    pub title: String,
    pub snippet: String,
    pub tags: TagSet,
    pub timestamp: String,
    pub time_ago: String,
}

impl SearchHit {
    pub fn from_record(record: &NormalizedRecord, now: NaiveDateTime, listing: &ListingConfig) -> Self {
        Self {
            id: record.id,
            title: truncate_chars(first_line(&record.body), listing.title_max_chars),
            snippet: truncate_chars(&record.body, listing.snippet_max_chars),
            tags: record.tags.clone(),
            timestamp: format_timestamp(&record.date),
            time_ago: time_ago(now, record.date),
        }
    }
}

/// Search the collection and shape the matches, newest first.
pub fn search_hits(
    collection: &MemoCollection,
    query: &str,
    now: NaiveDateTime,
    listing: &ListingConfig,
) -> Vec<SearchHit> {
    collection
        .search(query)
        .into_iter()
        .map(|r| SearchHit::from_record(r, now, listing))
        .collect()
}

/// Up to `count` records picked uniformly at random.
///
/// When the collection holds no more than `count` records, all of them are
/// returned in collection order.
pub fn random_sample<R: Rng + ?Sized>(
    collection: &MemoCollection,
    count: usize,
    rng: &mut R,
    now: NaiveDateTime,
    listing: &ListingConfig,
) -> Vec<MemoSummary> {
    let records = collection.records();
    let picked: Vec<&NormalizedRecord> = if records.len() <= count {
        records.iter().collect()
    } else {
        records.choose_multiple(rng, count).collect()
    };
    picked
        .into_iter()
        .map(|r| MemoSummary::from_record(r, now, listing))
        .collect()
}
