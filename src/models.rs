//! Core data models used throughout Memo Harness.
//!
//! These types represent the raw files, resolved records, and attachment
//! references that flow through a resolution pass.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

/// Raw document read from disk before normalization.
///
/// Lives only for the duration of one resolution pass.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: PathBuf,
    /// File name including extension, e.g. `2023-05-01-hello.md`.
    pub filename: String,
    /// File name with its extension stripped.
    pub filename_without_ext: String,
    pub raw_bytes: Vec<u8>,
    /// Modification time in local wall-clock time.
    pub modified: NaiveDateTime,
}

/// Deduplicated tag collection.
///
/// Keeps the order of first appearance for stable display, but equality is
/// order-insensitive.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a tag unless an identical one is already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Case-insensitive exact membership test.
    pub fn contains_ignore_case(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.0.iter().any(|t| t.to_lowercase() == needle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|t| other.contains(t))
    }
}

impl Eq for TagSet {}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// Canonical memo record produced by a resolution pass.
///
/// `date` is always resolved; the last source in its fallback chain is the
/// file modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRecord {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub body: String,
    pub tags: TagSet,
    #[serde(serialize_with = "serialize_timestamp")]
    pub date: NaiveDateTime,
    pub has_checklist: bool,
    /// `cover_image_url` from the header, if any.
    pub cover_image_url: Option<String>,
    pub source_year: String,
    pub source_filename: String,
    pub source_path: PathBuf,
}

impl NormalizedRecord {
    /// File name without its extension.
    pub fn file_stem(&self) -> &str {
        crate::metadata::strip_extension(&self.source_filename)
    }
}

/// A locally hosted attachment found in a document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentReference {
    /// URL exactly as written in the body.
    pub original_url: String,
    /// Path of the attachment under the storage root.
    pub storage_path: PathBuf,
}

/// Timestamp wire format. Records keep a structured `NaiveDateTime`; this is
/// the only place it becomes a string.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn serialize_timestamp<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_timestamp(ts))
}
