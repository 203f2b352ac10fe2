use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

/// Where documents live and which files count as documents.
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    #[serde(default = "default_content_root")]
    pub root: PathBuf,
    /// Matched against the file name inside a year directory.
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_content_root(),
            include_globs: default_include_globs(),
            exclude_globs: default_exclude_globs(),
            follow_symlinks: default_follow_symlinks(),
        }
    }
}

fn default_content_root() -> PathBuf {
    PathBuf::from("content")
}
fn default_follow_symlinks() -> bool {
    true
}
fn default_include_globs() -> Vec<String> {
    vec!["*.md".to_string()]
}
fn default_exclude_globs() -> Vec<String> {
    vec!["*.processed.md".to_string(), "*.processed".to_string()]
}

/// Attachment storage layout.
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    /// URL prefix under which attachments are served, e.g. `/assets/`.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Bare folder name that relative links point into.
    #[serde(default = "default_folder")]
    pub folder: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            public_prefix: default_public_prefix(),
            folder: default_folder(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("assets")
}
fn default_public_prefix() -> String {
    "/assets/".to_string()
}
fn default_folder() -> String {
    "assets".to_string()
}

/// Limits for the derived listing views.
#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    #[serde(default = "default_random_count")]
    pub random_count: usize,
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
    #[serde(default = "default_snippet_max_chars")]
    pub snippet_max_chars: usize,
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            random_count: default_random_count(),
            title_max_chars: default_title_max_chars(),
            snippet_max_chars: default_snippet_max_chars(),
            min_query_chars: default_min_query_chars(),
        }
    }
}

fn default_random_count() -> usize {
    10
}
fn default_title_max_chars() -> usize {
    50
}
fn default_snippet_max_chars() -> usize {
    200
}
fn default_min_query_chars() -> usize {
    2
}

impl Config {
    /// Built-in defaults, used when no config file is given.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Replace the content root, keeping everything else.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.content.root = root.into();
        self
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.content.include_globs.is_empty() {
        anyhow::bail!("content.include_globs must not be empty");
    }
    for pattern in config
        .content
        .include_globs
        .iter()
        .chain(&config.content.exclude_globs)
    {
        globset::Glob::new(pattern)
            .with_context(|| format!("Invalid glob in [content]: '{}'", pattern))?;
    }

    let prefix = &config.assets.public_prefix;
    if !prefix.starts_with('/') || !prefix.ends_with('/') {
        anyhow::bail!(
            "assets.public_prefix must start and end with '/', got '{}'",
            prefix
        );
    }
    if config.assets.folder.is_empty() || config.assets.folder.contains('/') {
        anyhow::bail!("assets.folder must be a single non-empty path segment");
    }

    if config.listing.random_count == 0 {
        anyhow::bail!("listing.random_count must be > 0");
    }
    if config.listing.title_max_chars == 0 || config.listing.snippet_max_chars == 0 {
        anyhow::bail!("listing.title_max_chars and listing.snippet_max_chars must be > 0");
    }

    Ok(())
}
