//! # Memo Harness
//!
//! Resolves a year-partitioned directory of dated, tagged markdown memos into
//! normalized, queryable records.
//!
//! Each file may carry a front matter header, a dated file name, inline
//! `#tags` and checklist markers. The engine reconciles these sources into a
//! single record per file, with a fallback chain for every field so that a
//! record always resolves.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌────────────────┐
//! │  Resolver    │──▶│ Metadata + Dates │──▶│ MemoCollection │
//! │ root/<year>/ │   │  normalization   │   │ id/tag/search  │
//! └──────────────┘   └──────────────────┘   └───────┬────────┘
//!                                                   │
//!                       ┌───────────────────────────┤
//!                       ▼                           ▼
//!                 ┌────────────┐              ┌───────────┐
//!                 │ References │              │ CLI/views │
//!                 │ (cleanup)  │              │  (memo)   │
//!                 └────────────┘              └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! memo --root ./content list
//! memo --root ./content list --tag rust
//! memo --root ./content get 3
//! memo --root ./content search "deploy"
//! memo --config ./config/memo.toml delete 3 --dry-run
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`dates`] | Date fallback chain |
//! | [`metadata`] | Header splitting and field normalization |
//! | [`references`] | Local attachment discovery |
//! | [`resolver`] | Directory walk and record assembly |
//! | [`collection`] | Lookup, tag filter and search views |
//! | [`cache`] | Fingerprint-keyed results cache |
//! | [`views`] | Display titles, relative ages, snippets, random picks |
//! | [`cleanup`] | Memo and attachment removal |
//! | [`export`] | JSON export |
//! | [`stats`] | Collection statistics |
//! | [`error`] | Error types |

pub mod cache;
pub mod cleanup;
pub mod collection;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod metadata;
pub mod models;
pub mod references;
pub mod resolver;
pub mod stats;
pub mod views;

pub use collection::MemoCollection;
pub use error::MemoError;
pub use models::{AttachmentReference, NormalizedRecord, TagSet};
pub use resolver::DocumentResolver;
