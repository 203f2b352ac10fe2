//! Reuse resolution passes while the content tree is unchanged.
//!
//! The fingerprint is a SHA-256 over every year directory and candidate
//! document: relative path, size and modification time. Any added, removed,
//! renamed or touched document changes it.

use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::UNIX_EPOCH;

use crate::collection::MemoCollection;
use crate::resolver::DocumentResolver;

struct CachedPass {
    fingerprint: String,
    collection: Arc<MemoCollection>,
}

/// A [`DocumentResolver`] that skips the re-scan when nothing changed.
///
/// Safe to share between threads; concurrent misses may each resolve, and
/// the last writer wins.
pub struct CachedResolver {
    resolver: DocumentResolver,
    cached: RwLock<Option<CachedPass>>,
}

impl CachedResolver {
    pub fn new(resolver: DocumentResolver) -> Self {
        Self {
            resolver,
            cached: RwLock::new(None),
        }
    }

    pub fn resolver(&self) -> &DocumentResolver {
        &self.resolver
    }

    /// Return the current collection, resolving again only if the tree changed.
    pub fn resolve(&self) -> Arc<MemoCollection> {
        let fingerprint = fingerprint(&self.resolver);

        if let Ok(guard) = self.cached.read() {
            if let Some(pass) = guard.as_ref() {
                if pass.fingerprint == fingerprint {
                    tracing::debug!("content tree unchanged; reusing resolution pass");
                    return Arc::clone(&pass.collection);
                }
            }
        }

        let collection = Arc::new(self.resolver.resolve_all());
        if let Ok(mut guard) = self.cached.write() {
            *guard = Some(CachedPass {
                fingerprint,
                collection: Arc::clone(&collection),
            });
        }
        collection
    }

    /// Drop any cached pass.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cached.write() {
            *guard = None;
        }
    }
}

/// Fingerprint the parts of the tree a resolution pass reads.
pub fn fingerprint(resolver: &DocumentResolver) -> String {
    let root = resolver.root();
    let mut entries = Vec::new();

    for year in resolver.year_dirs() {
        entries.push(describe(root, &year.path));
        for file in resolver.candidate_files(&year.path) {
            entries.push(describe(root, &file));
        }
    }
    entries.sort();

    let mut hasher = Sha256::new();
    for entry in &entries {
        hasher.update(entry.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn describe(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let (len, mtime) = match std::fs::metadata(path) {
        Ok(meta) => {
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or_default();
            (meta.len(), mtime)
        }
        Err(_) => (0, 0),
    };
    format!("{}\t{}\t{}", relative.display(), len, mtime)
}
