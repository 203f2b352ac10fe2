//! Query views over one resolution pass.
//!
//! All lookups are linear scans over the records in their resolved order
//! (newest first), so every view returns results newest first as well.

use serde::Serialize;

use crate::models::NormalizedRecord;

/// The ordered output of a resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MemoCollection {
    records: Vec<NormalizedRecord>,
}

impl MemoCollection {
    /// Wrap records that are already in their final order.
    pub fn new(records: Vec<NormalizedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id. `None` is the not-found signal.
    pub fn find_by_id(&self, id: u64) -> Option<&NormalizedRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records carrying `tag`, compared case-insensitively and exactly.
    pub fn find_by_tag(&self, tag: &str) -> Vec<&NormalizedRecord> {
        self.records
            .iter()
            .filter(|r| r.tags.contains_ignore_case(tag))
            .collect()
    }

    /// Case-insensitive substring match across title, body and tags.
    ///
    /// Minimum query length is the caller's concern.
    pub fn search(&self, query: &str) -> Vec<&NormalizedRecord> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| matches_query(r, &needle))
            .collect()
    }
}

fn matches_query(record: &NormalizedRecord, needle: &str) -> bool {
    record.title.to_lowercase().contains(needle)
        || record.body.to_lowercase().contains(needle)
        || record.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

impl<'a> IntoIterator for &'a MemoCollection {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
