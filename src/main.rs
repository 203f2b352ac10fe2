//! # Memo Harness CLI (`memo`)
//!
//! The `memo` binary resolves a memo content tree and prints records, search
//! results and statistics, and removes memos together with their attachments.
//!
//! ## Usage
//!
//! ```bash
//! memo [--config ./config/memo.toml] [--root ./content] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `memo list` | List memos, newest first (optionally `--tag`) |
//! | `memo get <id>` | Print one memo |
//! | `memo search "<query>"` | Case-insensitive search across title, body and tags |
//! | `memo random` | A random selection of memos |
//! | `memo attachments <id>` | Local attachments referenced by a memo |
//! | `memo delete <id>` | Remove a memo and the attachments only it uses |
//! | `memo export` | Dump every memo as JSON |
//! | `memo stats` | Per-year and per-tag counts |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `memo_harness=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use memo_harness::commands::{self, Harness};
use memo_harness::config;

/// Memo Harness CLI — resolve a directory of dated, tagged markdown memos.
///
/// Without `--config`, built-in defaults are used: documents under
/// `./content/<year>/*.md` and attachments under `./assets`.
#[derive(Parser)]
#[command(
    name = "memo",
    about = "Memo Harness — resolve a directory of dated, tagged markdown memos",
    version
)]
struct Cli {
    /// Path to a configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Content root, overriding `[content].root`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List memos, newest first.
    List {
        /// Only memos carrying this tag (case-insensitive).
        #[arg(long)]
        tag: Option<String>,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a single memo by id.
    Get {
        /// Memo id, as shown by `memo list`.
        id: u64,

        /// Print the record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search memo titles, bodies and tags.
    Search {
        /// The search query string.
        query: String,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a random selection of memos.
    Random {
        /// How many memos to pick (defaults to `[listing].random_count`).
        #[arg(long)]
        count: Option<usize>,
    },

    /// List the local attachments a memo references.
    Attachments {
        /// Memo id.
        id: u64,
    },

    /// Delete a memo and the attachments no other memo references.
    Delete {
        /// Memo id.
        id: u64,

        /// Show what would be removed without removing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Export all memos as JSON.
    Export {
        /// Output file (defaults to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print collection statistics.
    Stats,
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "memo_harness=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::Config::minimal(),
    };
    if let Some(root) = cli.root {
        cfg = cfg.with_root(root);
    }
    let harness = Harness::new(cfg)?;

    match cli.command {
        Commands::List { tag, json } => commands::run_list(&harness, tag.as_deref(), json)?,
        Commands::Get { id, json } => commands::run_get(&harness, id, json)?,
        Commands::Search { query, json } => commands::run_search(&harness, &query, json)?,
        Commands::Random { count } => commands::run_random(&harness, count)?,
        Commands::Attachments { id } => commands::run_attachments(&harness, id)?,
        Commands::Delete { id, dry_run } => commands::run_delete(&harness, id, dry_run)?,
        Commands::Export { output } => commands::run_export(&harness, output.as_deref())?,
        Commands::Stats => commands::run_stats(&harness)?,
    }

    Ok(())
}
