//! Directory walk and record assembly.
//!
//! Documents live at `<root>/<year>/<file>`. Year directories are names made
//! only of ASCII digits, visited in ascending lexical order. Inside a year,
//! files are visited in filesystem enumeration order and filtered by the
//! configured include/exclude globs (matched against the file name).
//!
//! Ids are assigned in discovery order, counting only documents that resolved.
//! The finished collection is stably sorted by date, newest first, so
//! documents sharing a timestamp keep their discovery order.

use chrono::{DateTime, Local};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::collection::MemoCollection;
use crate::config::ContentConfig;
use crate::error::{MemoError, Result};
use crate::metadata::{self, NormalizedFields};
use crate::models::{NormalizedRecord, RawDocument};

/// A year partition under the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearDir {
    pub name: String,
    pub path: PathBuf,
}

/// Resolves a content tree into a [`MemoCollection`].
#[derive(Debug, Clone)]
pub struct DocumentResolver {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl DocumentResolver {
    pub fn new(config: &ContentConfig) -> Result<Self> {
        Ok(Self {
            root: config.root.clone(),
            include: build_globset(&config.include_globs)?,
            exclude: build_globset(&config.exclude_globs)?,
            follow_symlinks: config.follow_symlinks,
        })
    }

    /// Resolver over `root` with the default `*.md` conventions.
    pub fn with_root(root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(&ContentConfig {
            root: root.into(),
            ..ContentConfig::default()
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one full resolution pass.
    ///
    /// A missing root yields an empty collection. Unreadable documents are
    /// logged and skipped.
    pub fn resolve_all(&self) -> MemoCollection {
        let mut records = Vec::new();
        let mut next_id: u64 = 1;
        let mut skipped = 0usize;

        for year in self.year_dirs() {
            for path in self.candidate_files(&year.path) {
                match resolve_file(&path) {
                    Ok(fields) => {
                        records.push(assemble(next_id, &year, &path, fields));
                        next_id += 1;
                    }
                    Err(e) => {
                        skipped += 1;
                        tracing::warn!(path = %path.display(), error = %e, "skipping document");
                    }
                }
            }
        }

        records.sort_by(|a, b| b.date.cmp(&a.date));
        tracing::debug!(
            root = %self.root.display(),
            resolved = records.len(),
            skipped,
            "resolution pass complete"
        );
        MemoCollection::new(records)
    }

    /// Year partitions in ascending lexical order.
    pub fn year_dirs(&self) -> Vec<YearDir> {
        if !self.root.is_dir() {
            tracing::warn!(root = %self.root.display(), "content root does not exist; no memos");
            return Vec::new();
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();

        let mut years = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot read content root entry");
                    continue;
                }
            };
            if entry.path_is_symlink() && !self.follow_symlinks {
                tracing::debug!(path = %entry.path().display(), "skipping symlinked entry");
                continue;
            }
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if is_year_name(&name) {
                years.push(YearDir {
                    name,
                    path: entry.into_path(),
                });
            }
        }
        years
    }

    /// Document files inside one year directory, in enumeration order.
    pub fn candidate_files(&self, year_path: &Path) -> Vec<PathBuf> {
        let walker = WalkDir::new(year_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_symlinks);

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(dir = %year_path.display(), error = %e, "cannot list year directory entry");
                    continue;
                }
            };
            if entry.path_is_symlink() && !self.follow_symlinks {
                tracing::debug!(path = %entry.path().display(), "skipping symlinked document");
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.exclude.is_match(name.as_ref()) || !self.include.is_match(name.as_ref()) {
                continue;
            }
            files.push(entry.into_path());
        }
        files
    }
}

/// Resolve every document under `root` using default conventions.
pub fn resolve_all(root: &Path) -> Result<MemoCollection> {
    Ok(DocumentResolver::with_root(root)?.resolve_all())
}

fn is_year_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Read a document file and its modification time.
pub fn read_document(path: &Path) -> Result<RawDocument> {
    let read_err = |source| MemoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let raw_bytes = std::fs::read(path).map_err(read_err)?;
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(read_err)?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let filename_without_ext = metadata::strip_extension(&filename).to_string();

    Ok(RawDocument {
        path: path.to_path_buf(),
        filename,
        filename_without_ext,
        raw_bytes,
        modified: DateTime::<Local>::from(modified).naive_local(),
    })
}

/// Resolved document content, not yet numbered.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub filename: String,
    pub body: String,
    pub fields: NormalizedFields,
}

/// Read and normalize a single document.
pub fn resolve_file(path: &Path) -> Result<ResolvedDocument> {
    let raw = read_document(path)?;
    let (meta, body) = metadata::extract(&raw.raw_bytes, &raw.path)?;
    if meta.is_none() && raw.raw_bytes.starts_with(b"---") {
        tracing::debug!(file = %raw.filename_without_ext, "header present but not usable");
    }
    let fields = metadata::normalize(meta.as_ref(), &body, &raw.filename, raw.modified);
    Ok(ResolvedDocument {
        filename: raw.filename,
        body,
        fields,
    })
}

fn assemble(id: u64, year: &YearDir, path: &Path, doc: ResolvedDocument) -> NormalizedRecord {
    let NormalizedFields {
        title,
        slug,
        summary,
        tags,
        date,
        has_checklist,
        cover_image_url,
    } = doc.fields;

    NormalizedRecord {
        id,
        title,
        slug,
        summary,
        body: doc.body,
        tags,
        date,
        has_checklist,
        cover_image_url,
        source_year: year.name.clone(),
        source_filename: doc.filename,
        source_path: path.to_path_buf(),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
