//! Resolution passes over real directory trees.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use memo_harness::cleanup;
use memo_harness::config::{AssetsConfig, ContentConfig};
use memo_harness::references::ReferenceScanner;
use memo_harness::resolver::{self, DocumentResolver};
use memo_harness::{MemoCollection, TagSet};

fn write_doc(root: &Path, year: &str, name: &str, text: &str) -> PathBuf {
    let dir = root.join(year);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn set_mtime(path: &Path, secs: u64) -> NaiveDateTime {
    let when = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(when).unwrap();
    DateTime::<Local>::from(when).naive_local()
}

fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn resolve(root: &Path) -> MemoCollection {
    resolver::resolve_all(root).unwrap()
}

#[test]
fn test_dated_filename_without_header() {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("content");
    write_doc(&content, "2023", "2023-05-01-hello.md", "hello #world");

    let memos = resolve(&content);
    assert_eq!(memos.len(), 1);
    let memo = &memos.records()[0];
    assert_eq!(memo.id, 1);
    assert_eq!(memo.title, "hello");
    assert_eq!(memo.tags, ["world"].into_iter().collect::<TagSet>());
    assert_eq!(memo.date, ymd_hm(2023, 5, 1, 0, 0));
    assert!(!memo.has_checklist);
    assert_eq!(memo.source_year, "2023");
    assert_eq!(memo.source_filename, "2023-05-01-hello.md");
    assert_eq!(memo.slug, "");
    assert_eq!(memo.summary, "");
}

#[test]
fn test_header_fields_win() {
    let tmp = TempDir::new().unwrap();
    write_doc(
        tmp.path(),
        "2024",
        "2021-01-01-from-name.md",
        "---\ntitle: Header Title\nslug: header-title\nsummary: A summary\ndatetime: 2024-02-03 04:05\ntags: [one, two]\n---\n\n- [ ] todo #ignored\n",
    );

    let memos = resolve(tmp.path());
    let memo = &memos.records()[0];
    assert_eq!(memo.title, "Header Title");
    assert_eq!(memo.slug, "header-title");
    assert_eq!(memo.summary, "A summary");
    assert_eq!(memo.date, ymd_hm(2024, 2, 3, 4, 5));
    assert_eq!(memo.tags, ["one", "two"].into_iter().collect::<TagSet>());
    assert!(memo.has_checklist);
    assert_eq!(memo.body, "- [ ] todo #ignored");
}

#[test]
fn test_mtime_fallback_is_exact() {
    let tmp = TempDir::new().unwrap();
    let path = write_doc(tmp.path(), "2022", "loose note.md", "no dates here");
    let expected = set_mtime(&path, 1_650_000_000);

    let memos = resolve(tmp.path());
    let memo = &memos.records()[0];
    assert_eq!(memo.date, expected);
    assert_eq!(memo.title, "loose note");
}

#[test]
fn test_layout_filters() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_doc(root, "2023", "2023-01-01-kept.md", "kept");
    write_doc(root, "2023", "2023-01-02-done.processed.md", "excluded");
    write_doc(root, "2023", "2023-01-03-old.md.processed", "excluded");
    write_doc(root, "2023", "notes.txt", "wrong extension");
    write_doc(root, "drafts", "2023-01-04-draft.md", "not a year directory");
    fs::write(root.join("2023-01-05-top.md"), "not in a year directory").unwrap();

    let memos = resolve(root);
    let titles: Vec<&str> = memos.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["kept"]);
}

#[test]
fn test_ids_follow_discovery_and_sort_is_stable() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let same = "---\ndatetime: 2024-01-01 10:00\n---\nbody";
    write_doc(root, "2023", "a.md", same);
    write_doc(root, "2021", "b.md", same);
    write_doc(root, "2022", "2022-06-01-older.md", "older");
    write_doc(root, "2024", "2024-03-01-newest.md", "newest");

    let memos = resolve(root);
    let order: Vec<(u64, &str)> = memos.iter().map(|m| (m.id, m.title.as_str())).collect();
    // Discovery: 2021/b (1), 2022/older (2), 2023/a (3), 2024/newest (4).
    assert_eq!(
        order,
        vec![(4, "newest"), (1, "b"), (3, "a"), (2, "older")]
    );
}

#[test]
fn test_undecodable_document_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_doc(root, "2020", "2020-01-01-good.md", "fine");
    let dir = root.join("2021");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("2021-01-01-bad.md"), [0xff, 0xfe, 0xfd]).unwrap();
    write_doc(root, "2022", "2022-01-01-also-good.md", "fine too");

    let memos = resolve(root);
    let order: Vec<(u64, &str)> = memos.iter().map(|m| (m.id, m.title.as_str())).collect();
    assert_eq!(order, vec![(2, "also-good"), (1, "good")]);
}

#[test]
fn test_malformed_metadata_degrades() {
    let tmp = TempDir::new().unwrap();
    write_doc(
        tmp.path(),
        "2023",
        "2023-07-04-fallback.md",
        "---\ndatetime: yesterday\ndate: 2023/07/04\ntags: {nested: map}\n---\ntext #inline",
    );

    let memos = resolve(tmp.path());
    let memo = &memos.records()[0];
    assert_eq!(memo.date, ymd_hm(2023, 7, 4, 0, 0));
    assert_eq!(memo.title, "fallback");
    assert_eq!(memo.tags, ["inline"].into_iter().collect::<TagSet>());
}

#[test]
fn test_resolution_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    write_doc(tmp.path(), "2023", "2023-05-01-a.md", "a #x");
    write_doc(tmp.path(), "2024", "b.md", "---\ntitle: B\n---\nb");

    assert_eq!(resolve(tmp.path()), resolve(tmp.path()));
}

#[test]
fn test_missing_root_and_empty_lookup() {
    let tmp = TempDir::new().unwrap();
    let memos = resolve(&tmp.path().join("nope"));
    assert!(memos.is_empty());
    assert!(memos.find_by_id(1).is_none());
}

#[test]
fn test_custom_globs() {
    let tmp = TempDir::new().unwrap();
    write_doc(tmp.path(), "2023", "2023-05-01-a.markdown", "a");
    write_doc(tmp.path(), "2023", "2023-05-02-b.md", "b");

    let resolver = DocumentResolver::new(&ContentConfig {
        root: tmp.path().to_path_buf(),
        include_globs: vec!["*.markdown".to_string()],
        exclude_globs: vec![],
        follow_symlinks: false,
    })
    .unwrap();
    let memos = resolver.resolve_all();
    assert_eq!(memos.len(), 1);
    assert_eq!(memos.records()[0].title, "a");
}

#[test]
fn test_delete_removes_owned_attachments_only() {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("content");
    let assets = tmp.path().join("assets");
    fs::create_dir_all(&assets).unwrap();
    fs::write(assets.join("own.png"), b"png").unwrap();
    fs::write(assets.join("shared.png"), b"png").unwrap();
    fs::write(assets.join("cover.png"), b"png").unwrap();

    let doomed = write_doc(
        &content,
        "2024",
        "2024-01-01-doomed.md",
        "---\ncover_image_url: /assets/cover.png\n---\n![a](../../assets/own.png)\n<img src=\"assets/shared.png\">\n![gone](assets/missing.png)\n![x](https://example.com/x.png)\n![esc](../secret.txt)",
    );
    write_doc(
        &content,
        "2024",
        "2024-01-02-keeper.md",
        "![s](/assets/shared.png)",
    );

    let scanner = ReferenceScanner::new(&AssetsConfig {
        storage_root: assets.clone(),
        ..AssetsConfig::default()
    })
    .unwrap();
    let memos = resolve(&content);
    let record = memos.iter().find(|m| m.title == "doomed").unwrap();

    let plan = cleanup::plan_removal(record, &memos, &scanner).unwrap();
    let owned: Vec<PathBuf> = plan.attachments.iter().map(|r| r.storage_path.clone()).collect();
    assert_eq!(
        owned,
        vec![
            assets.join("own.png"),
            assets.join("missing.png"),
            assets.join("cover.png"),
        ]
    );
    assert_eq!(plan.shared.len(), 1);
    assert_eq!(plan.refused.len(), 1);

    let report = cleanup::execute(&plan).unwrap();
    assert_eq!(report.missing, vec![assets.join("missing.png")]);
    assert!(!doomed.exists());
    assert!(!assets.join("own.png").exists());
    assert!(!assets.join("cover.png").exists());
    assert!(assets.join("shared.png").exists());

    let remaining = resolve(&content);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining.records()[0].title, "keeper");
}
