//! Local attachment discovery.
//!
//! Finds image references in a document body, written either as markdown
//! `![alt](url)` or as an HTML `<img src="...">` element, and maps the local
//! ones onto paths under the attachment storage root. External (`http`,
//! `https`, protocol-relative) and `data:` URLs are dropped.
//!
//! Markdown matches come first, then HTML matches, each in document order.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::AssetsConfig;
use crate::error::{MemoError, Result};
use crate::models::AttachmentReference;

fn markdown_image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"!\[[^\]]*\]\(\s*<?((?:[^()\s<>]|\([^()\s<>]*\))+)>?(?:\s+["'][^"']*["'])?\s*\)"#)
            .expect("valid markdown image regex")
    })
}

fn html_image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("valid img tag regex")
    })
}

/// Maps local image URLs onto the attachment storage root.
#[derive(Debug, Clone)]
pub struct ReferenceScanner {
    storage_root: PathBuf,
    public_prefix: String,
    folder: String,
    relative_link: Regex,
}

impl ReferenceScanner {
    pub fn new(config: &AssetsConfig) -> Result<Self> {
        let relative_link = Regex::new(&format!(r"(?:\.\./)+{}/", regex::escape(&config.folder)))
            .map_err(|e| MemoError::Config(format!("assets.folder: {}", e)))?;
        Ok(Self {
            storage_root: config.storage_root.clone(),
            public_prefix: config.public_prefix.clone(),
            folder: config.folder.clone(),
            relative_link,
        })
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Scan a body for local attachment references.
    pub fn scan(&self, body: &str) -> Vec<AttachmentReference> {
        let markdown = markdown_image_pattern()
            .captures_iter(body)
            .filter_map(|caps| caps.get(1));
        let html = html_image_pattern()
            .captures_iter(body)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)));

        markdown
            .chain(html)
            .filter_map(|m| self.classify(m.as_str()))
            .collect()
    }

    /// Classify a single URL, returning a reference when it is local.
    pub fn classify(&self, url: &str) -> Option<AttachmentReference> {
        let trimmed = url.trim();
        if trimmed.is_empty() || is_external(trimmed) {
            return None;
        }
        let path = strip_query_and_fragment(trimmed);
        if path.is_empty() {
            return None;
        }
        Some(AttachmentReference {
            original_url: url.to_string(),
            storage_path: self.storage_path(path),
        })
    }

    fn storage_path(&self, path: &str) -> PathBuf {
        let folder_prefix = format!("{}/", self.folder);
        let under_folder = |p: &str| p.strip_prefix(folder_prefix.as_str()).map(str::to_string);

        let relative = path
            .strip_prefix(self.public_prefix.as_str())
            .map(str::to_string)
            .or_else(|| under_folder(path))
            .or_else(|| path.strip_prefix("./").and_then(under_folder))
            .or_else(|| {
                let rest = path.trim_start_matches("../");
                (rest.len() < path.len()).then(|| under_folder(rest)).flatten()
            })
            // Anything else stays as written, anchored under the root.
            .unwrap_or_else(|| path.trim_start_matches('/').to_string());

        self.storage_root.join(relative)
    }

    /// Rewrite `../<folder>/` style links to the public asset prefix.
    pub fn rewrite_asset_links(&self, body: &str) -> String {
        self.relative_link
            .replace_all(body, regex::NoExpand(&self.public_prefix))
            .into_owned()
    }
}

fn is_external(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
}

fn strip_query_and_fragment(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> ReferenceScanner {
        ReferenceScanner::new(&AssetsConfig {
            storage_root: PathBuf::from("/srv/memo/assets"),
            public_prefix: "/assets/".to_string(),
            folder: "assets".to_string(),
        })
        .unwrap()
    }

    fn paths(refs: &[AttachmentReference]) -> Vec<PathBuf> {
        refs.iter().map(|r| r.storage_path.clone()).collect()
    }

    #[test]
    fn test_markdown_then_html() {
        let s = scanner();
        let refs = s.scan(r#"![x](../../assets/pic.png) and <img src="assets/two.png">"#);
        assert_eq!(
            paths(&refs),
            vec![
                PathBuf::from("/srv/memo/assets/pic.png"),
                PathBuf::from("/srv/memo/assets/two.png"),
            ]
        );
        assert_eq!(refs[0].original_url, "../../assets/pic.png");
    }

    #[test]
    fn test_markdown_group_precedes_html_group() {
        let s = scanner();
        let body = r#"<img src="/assets/first.png"> then ![later](assets/second.png)"#;
        assert_eq!(
            paths(&s.scan(body)),
            vec![
                PathBuf::from("/srv/memo/assets/second.png"),
                PathBuf::from("/srv/memo/assets/first.png"),
            ]
        );
    }

    #[test]
    fn test_external_and_data_dropped() {
        let s = scanner();
        assert!(s.scan("![x](https://ext.com/a.png)").is_empty());
        assert!(s.scan("![x](HTTP://ext.com/a.png)").is_empty());
        assert!(s.scan("<img src='//cdn.example/a.png'>").is_empty());
        assert!(s.scan(r#"<img src="data:image/png;base64,AAAA">"#).is_empty());
        assert!(s.scan("").is_empty());
    }

    #[test]
    fn test_query_and_fragment_stripped() {
        let s = scanner();
        let refs = s.scan("![a](/assets/a.png?v=2#top)");
        assert_eq!(paths(&refs), vec![PathBuf::from("/srv/memo/assets/a.png")]);
        assert_eq!(refs[0].original_url, "/assets/a.png?v=2#top");
    }

    #[test]
    fn test_path_forms() {
        let s = scanner();
        let cases = [
            ("/assets/2024/a.png", "/srv/memo/assets/2024/a.png"),
            ("assets/b.png", "/srv/memo/assets/b.png"),
            ("./assets/c.png", "/srv/memo/assets/c.png"),
            ("../assets/d.png", "/srv/memo/assets/d.png"),
            ("../../../assets/e.png", "/srv/memo/assets/e.png"),
            ("img/f.png", "/srv/memo/assets/img/f.png"),
        ];
        for (url, expected) in cases {
            let r = s.classify(url).unwrap();
            assert_eq!(r.storage_path, PathBuf::from(expected), "url: {}", url);
        }
    }

    #[test]
    fn test_markdown_with_title_and_html_attrs() {
        let s = scanner();
        let body = "![a](assets/a.png \"A title\")\n<IMG alt=\"b\" SRC='assets/b.png' />";
        assert_eq!(
            paths(&s.scan(body)),
            vec![
                PathBuf::from("/srv/memo/assets/a.png"),
                PathBuf::from("/srv/memo/assets/b.png"),
            ]
        );
    }

    #[test]
    fn test_img_ignores_data_src() {
        let s = scanner();
        let body = r#"<img data-src="assets/lazy.png" src="https://cdn.example/x.png">"#;
        assert!(s.scan(body).is_empty());

        let body = r#"<img data-src="https://cdn.example/x.png" src="assets/real.png">"#;
        assert_eq!(
            paths(&s.scan(body)),
            vec![PathBuf::from("/srv/memo/assets/real.png")]
        );
    }

    #[test]
    fn test_markdown_url_with_parentheses() {
        let s = scanner();
        let refs = s.scan("![p](assets/a(1).png) and ![q](assets/b.png \"t\")");
        assert_eq!(
            paths(&refs),
            vec![
                PathBuf::from("/srv/memo/assets/a(1).png"),
                PathBuf::from("/srv/memo/assets/b.png"),
            ]
        );
        assert_eq!(refs[0].original_url, "assets/a(1).png");
    }

    #[test]
    fn test_rewrite_asset_links() {
        let s = scanner();
        let body = "![a](../../assets/a.png) ![b](../assets/b.png) ![c](assets/c.png)";
        assert_eq!(
            s.rewrite_asset_links(body),
            "![a](/assets/a.png) ![b](/assets/b.png) ![c](assets/c.png)"
        );
    }
}
