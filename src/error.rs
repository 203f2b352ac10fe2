//! Error taxonomy for document resolution.
//!
//! Only [`MemoError::Read`] and [`MemoError::Decode`] are produced while
//! resolving documents, and the resolver swallows both per document. Malformed
//! metadata values never become errors; they fall through to the next source.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the memo engine and its CLI.
#[derive(Error, Debug)]
pub enum MemoError {
    /// The document file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document file is not valid UTF-8.
    #[error("{path} is not valid UTF-8 text")]
    Decode { path: PathBuf },

    /// The document file could not be removed.
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No record carries the requested id.
    #[error("memo not found: {0}")]
    NotFound(u64),

    /// Configuration is present but invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An include or exclude glob failed to compile.
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),
}

pub type Result<T> = std::result::Result<T, MemoError>;
