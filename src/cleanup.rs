//! Deleting a memo together with the attachments it owns.
//!
//! Attachments are discovered from the file as it is on disk at deletion
//! time, not from the resolved record. An attachment that another memo still
//! references is kept, and so is any path that would leave the storage root.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::collection::MemoCollection;
use crate::error::{MemoError, Result};
use crate::metadata;
use crate::models::{AttachmentReference, NormalizedRecord};
use crate::references::ReferenceScanner;

/// What deleting one memo would touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalPlan {
    pub document: PathBuf,
    /// Attachments owned only by this memo.
    pub attachments: Vec<AttachmentReference>,
    /// Attachments another memo also references.
    pub shared: Vec<AttachmentReference>,
    /// References whose path escapes the storage root.
    pub refused: Vec<AttachmentReference>,
}

/// Outcome of executing a [`RemovalPlan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Scan a memo's live file and the cover image for local attachments.
pub fn live_attachments(
    record: &NormalizedRecord,
    scanner: &ReferenceScanner,
) -> Result<Vec<AttachmentReference>> {
    let bytes = std::fs::read(&record.source_path).map_err(|source| MemoError::Read {
        path: record.source_path.clone(),
        source,
    })?;
    let (meta, body) = metadata::extract(&bytes, &record.source_path)?;

    let mut refs = scanner.scan(&body);
    if let Some(cover) = meta.as_ref().and_then(|m| m.text("cover_image_url")) {
        refs.extend(scanner.classify(cover));
    }

    let mut seen = HashSet::new();
    refs.retain(|r| seen.insert(r.storage_path.clone()));
    Ok(refs)
}

/// Work out what removing `record` would delete.
pub fn plan_removal(
    record: &NormalizedRecord,
    collection: &MemoCollection,
    scanner: &ReferenceScanner,
) -> Result<RemovalPlan> {
    let still_used: HashSet<PathBuf> = collection
        .iter()
        .filter(|other| other.id != record.id)
        .flat_map(|other| {
            let mut refs = scanner.scan(&other.body);
            refs.extend(
                other
                    .cover_image_url
                    .as_deref()
                    .and_then(|u| scanner.classify(u)),
            );
            refs
        })
        .map(|r| r.storage_path)
        .collect();

    let mut plan = RemovalPlan {
        document: record.source_path.clone(),
        ..RemovalPlan::default()
    };
    for reference in live_attachments(record, scanner)? {
        if !is_contained(scanner.storage_root(), &reference.storage_path) {
            plan.refused.push(reference);
        } else if still_used.contains(&reference.storage_path) {
            plan.shared.push(reference);
        } else {
            plan.attachments.push(reference);
        }
    }
    Ok(plan)
}

/// Delete the document, then each owned attachment.
///
/// Missing attachments are reported, not treated as errors. Failing to
/// remove the document itself aborts before any attachment is touched.
pub fn execute(plan: &RemovalPlan) -> Result<RemovalReport> {
    std::fs::remove_file(&plan.document).map_err(|source| MemoError::Remove {
        path: plan.document.clone(),
        source,
    })?;
    tracing::info!(path = %plan.document.display(), "removed memo");

    let mut report = RemovalReport {
        removed: vec![plan.document.clone()],
        ..RemovalReport::default()
    };
    for reference in &plan.attachments {
        let path = &reference.storage_path;
        match std::fs::remove_file(path) {
            Ok(()) => report.removed.push(path.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "attachment already gone");
                report.missing.push(path.clone());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove attachment");
                report.failed.push(path.clone());
            }
        }
    }
    Ok(report)
}

/// True when `path` stays inside `root` after lexical normalization.
fn is_contained(root: &Path, path: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}
