//! Export a resolution pass as JSON.
//!
//! Produces a single document containing every memo, newest first, for
//! consumers that cannot call into the library (static site builds, other
//! tooling). Timestamps are serialized as `YYYY-MM-DDTHH:MM:SS`.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::collection::MemoCollection;
use crate::models::NormalizedRecord;

#[derive(Serialize)]
struct ExportData<'a> {
    total: usize,
    memos: &'a [NormalizedRecord],
}

/// Render the collection as pretty-printed JSON.
pub fn to_json(collection: &MemoCollection) -> Result<String> {
    let data = ExportData {
        total: collection.len(),
        memos: collection.records(),
    };
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Export memos as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub fn run_export(collection: &MemoCollection, output: Option<&Path>) -> Result<()> {
    let json = to_json(collection)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!("Exported {} memos to {}", collection.len(), path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagSet;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    #[test]
    fn test_json_shape() {
        let record = NormalizedRecord {
            id: 1,
            title: "hello".to_string(),
            slug: String::new(),
            summary: String::new(),
            body: "hello #world".to_string(),
            tags: ["world"].into_iter().collect::<TagSet>(),
            date: NaiveDate::from_ymd_opt(2023, 5, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            has_checklist: false,
            cover_image_url: None,
            source_year: "2023".to_string(),
            source_filename: "2023-05-01-hello.md".to_string(),
            source_path: PathBuf::from("content/2023/2023-05-01-hello.md"),
        };
        let json = to_json(&MemoCollection::new(vec![record])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["memos"][0]["date"], "2023-05-01T00:00:00");
        assert_eq!(value["memos"][0]["tags"], serde_json::json!(["world"]));
        assert_eq!(value["memos"][0]["has_checklist"], false);
    }
}
