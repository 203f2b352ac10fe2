//! Header splitting and metadata normalization.
//!
//! A document may start with a front matter block, either YAML between `---`
//! fences or TOML between `+++` fences. Header values are converted to
//! [`MetaValue`] at this boundary and normalized into fixed-shape fields
//! straight away, so nothing downstream sees the dynamic shapes.
//!
//! Malformed headers and malformed values never produce errors; they are
//! treated as absent and the next fallback source is consulted.

use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::dates::{self, DateInputs, DateSource};
use crate::error::{MemoError, Result};
use crate::models::TagSet;

/// A single header value, reduced to the shapes the normalizer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// A string value.
    Text(String),
    /// A number, boolean or other non-string scalar, rendered as text.
    Scalar(String),
    /// A sequence, each element rendered as text.
    List(Vec<String>),
    /// Anything else (nested tables, maps).
    Other,
}

impl MetaValue {
    /// Textual form of a scalar value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) | MetaValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// Parsed front matter. Unknown keys are kept but ignored by normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataBlock {
    fields: BTreeMap<String, MetaValue>,
}

impl MetadataBlock {
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, MetaValue)> for MetadataBlock {
    fn from_iter<I: IntoIterator<Item = (String, MetaValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderSyntax {
    Yaml,
    Toml,
}

impl HeaderSyntax {
    fn fence(self) -> char {
        match self {
            HeaderSyntax::Yaml => '-',
            HeaderSyntax::Toml => '+',
        }
    }
}

/// A fence line is three or more fence characters followed only by whitespace.
fn is_fence(line: &str, fence: char) -> bool {
    let trimmed = line.trim_end();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == fence)
}

/// Decode raw bytes and split them into an optional header and the body.
pub fn extract(raw_bytes: &[u8], path: &Path) -> Result<(Option<MetadataBlock>, String)> {
    let text = std::str::from_utf8(raw_bytes).map_err(|_| MemoError::Decode {
        path: path.to_path_buf(),
    })?;
    Ok(split_header(text))
}

/// Split document text into an optional metadata block and the body.
///
/// The body is trimmed. A header whose closing fence is missing is not a
/// header; one that fails to parse yields `None` but is still removed from
/// the body.
pub fn split_header(text: &str) -> (Option<MetadataBlock>, String) {
    let text = text.trim_start_matches('\u{feff}').trim();

    let mut lines = text.split_inclusive('\n');
    let Some(first_line) = lines.next() else {
        return (None, String::new());
    };
    let opening = first_line.trim_end_matches(['\r', '\n']);
    let syntax = if is_fence(opening, '-') {
        HeaderSyntax::Yaml
    } else if is_fence(opening, '+') {
        HeaderSyntax::Toml
    } else {
        return (None, text.to_string());
    };

    let header_start = first_line.len();
    let mut offset = header_start;
    let mut header_end = None;
    for line in lines {
        if is_fence(line.trim_end_matches(['\r', '\n']), syntax.fence()) {
            header_end = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }

    let Some((header_end, body_start)) = header_end else {
        return (None, text.to_string());
    };

    let header = &text[header_start..header_end];
    let body = text[body_start..].trim().to_string();
    let block = match syntax {
        HeaderSyntax::Yaml => parse_yaml_header(header),
        HeaderSyntax::Toml => parse_toml_header(header),
    };
    (block, body)
}

fn parse_yaml_header(header: &str) -> Option<MetadataBlock> {
    let value: serde_yaml::Value = match serde_yaml::from_str(header) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparsable YAML header");
            return None;
        }
    };
    match value {
        serde_yaml::Value::Mapping(map) => Some(
            map.into_iter()
                .filter_map(|(k, v)| {
                    let key = yaml_scalar_text(&k)?;
                    yaml_meta_value(v).map(|v| (key, v))
                })
                .collect(),
        ),
        serde_yaml::Value::Null => Some(MetadataBlock::default()),
        _ => {
            tracing::debug!("ignoring YAML header that is not a mapping");
            None
        }
    }
}

/// Null values are dropped so they behave like missing keys.
fn yaml_meta_value(value: serde_yaml::Value) -> Option<MetaValue> {
    use serde_yaml::Value;
    match value {
        Value::Null => None,
        Value::String(s) => Some(MetaValue::Text(s)),
        Value::Bool(_) | Value::Number(_) => yaml_scalar_text(&value).map(MetaValue::Scalar),
        Value::Sequence(items) => Some(MetaValue::List(
            items.iter().filter_map(yaml_element_text).collect(),
        )),
        Value::Tagged(tagged) => yaml_meta_value(tagged.value),
        Value::Mapping(_) => Some(MetaValue::Other),
    }
}

fn yaml_scalar_text(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn yaml_element_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Tagged(tagged) => yaml_element_text(&tagged.value),
        other => yaml_scalar_text(other).or_else(|| serde_json::to_string(other).ok()),
    }
}

fn parse_toml_header(header: &str) -> Option<MetadataBlock> {
    let table: toml::Table = match toml::from_str(header) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparsable TOML header");
            return None;
        }
    };
    Some(
        table
            .into_iter()
            .map(|(k, v)| (k, toml_meta_value(v)))
            .collect(),
    )
}

fn toml_meta_value(value: toml::Value) -> MetaValue {
    use toml::Value;
    match value {
        Value::String(s) => MetaValue::Text(s),
        // Datetimes render in the same shapes the date resolver accepts.
        Value::Datetime(dt) => MetaValue::Text(dt.to_string()),
        Value::Integer(i) => MetaValue::Scalar(i.to_string()),
        Value::Float(f) => MetaValue::Scalar(f.to_string()),
        Value::Boolean(b) => MetaValue::Scalar(b.to_string()),
        Value::Array(items) => MetaValue::List(items.iter().map(toml_element_text).collect()),
        Value::Table(_) => MetaValue::Other,
    }
}

fn toml_element_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ───────────────────────────── normalization ─────────────────────────────

/// The `tags` header value as written, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTags<'a> {
    /// Comma-separated string.
    Delimited(&'a str),
    /// Sequence of already-stringified elements.
    List(&'a [String]),
    /// Absent or an unsupported shape.
    Missing,
}

impl<'a> RawTags<'a> {
    pub fn from_metadata(meta: Option<&'a MetadataBlock>) -> Self {
        match meta.and_then(|m| m.get("tags")) {
            Some(MetaValue::Text(s)) => RawTags::Delimited(s),
            Some(MetaValue::List(items)) => RawTags::List(items),
            _ => RawTags::Missing,
        }
    }
}

/// Normalized fields derived from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFields {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub tags: TagSet,
    pub date: NaiveDateTime,
    pub has_checklist: bool,
    pub cover_image_url: Option<String>,
}

struct TitleInputs<'a> {
    meta: Option<&'a MetadataBlock>,
    filename: &'a str,
    date_source: DateSource,
}

type TitleStrategy = fn(&TitleInputs<'_>) -> Option<String>;

const TITLE_STRATEGIES: &[TitleStrategy] = &[title_from_metadata, title_from_filename_hint];

fn title_from_metadata(inputs: &TitleInputs<'_>) -> Option<String> {
    let title = inputs.meta?.text("title")?.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// The dated file name only names the memo when it also dated it.
fn title_from_filename_hint(inputs: &TitleInputs<'_>) -> Option<String> {
    if inputs.date_source != DateSource::Filename {
        return None;
    }
    dates::parse_filename(inputs.filename).map(|hint| hint.title)
}

/// Strip the final extension from a file name.
pub fn strip_extension(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(filename)
}

/// Resolve a title: header, then dated file name, then the bare file stem.
///
/// The file name's title part is used only when `date_source` is
/// [`DateSource::Filename`]; a header-dated memo without a title keeps its
/// full stem, date prefix included.
pub fn resolve_title(
    meta: Option<&MetadataBlock>,
    filename: &str,
    date_source: DateSource,
) -> String {
    let inputs = TitleInputs {
        meta,
        filename,
        date_source,
    };
    TITLE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(&inputs))
        .unwrap_or_else(|| strip_extension(filename).to_string())
}

/// Normalize the `tags` value, falling back to inline `#tags` in the body.
pub fn normalize_tags(raw: RawTags<'_>, body: &str) -> TagSet {
    match raw {
        RawTags::Delimited(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect(),
        RawTags::List(items) => items
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect(),
        RawTags::Missing => extract_inline_tags(body),
    }
}

fn inline_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#([^\s#]+)").expect("valid tag regex"))
}

fn checklist_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[[ xX]\]").expect("valid checklist regex"))
}

/// Collect `#tag` tokens from body text.
pub fn extract_inline_tags(body: &str) -> TagSet {
    inline_tag_pattern()
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// True when the body contains a `[ ]`, `[x]` or `[X]` token.
pub fn has_checklist(body: &str) -> bool {
    checklist_pattern().is_match(body)
}

/// Produce the normalized fields of one document.
pub fn normalize(
    meta: Option<&MetadataBlock>,
    body: &str,
    filename: &str,
    modified: NaiveDateTime,
) -> NormalizedFields {
    let text_field = |key: &str| meta.and_then(|m| m.text(key));

    let (date, source) = dates::resolve_with_source(&DateInputs {
        datetime_field: text_field("datetime"),
        date_field: text_field("date"),
        filename,
        modified,
    });
    tracing::trace!(filename, ?source, "resolved date");

    NormalizedFields {
        title: resolve_title(meta, filename, source),
        slug: text_field("slug").unwrap_or_default().to_string(),
        summary: text_field("summary").unwrap_or_default().to_string(),
        tags: normalize_tags(RawTags::from_metadata(meta), body),
        date,
        has_checklist: has_checklist(body),
        cover_image_url: text_field("cover_image_url")
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
    }
}
