use std::collections::HashSet;
use std::fs;

use vnpdf_to_txt::{emit_files, sha256_hex, slugify, unique_slug, verify_output, EmitError};

fn read_meta(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn emit_files_writes_text_and_meta() {
    let td = tempfile::tempdir().unwrap();
    let outdir = td.path().join("out");
    let text = "ĐỒNG BẰNG SÔNG CỬU LONG\nChương 1 giới thiệu.";
    let meta = serde_json::json!({ "doc_id": "dong-bang", "engine": "json" });

    let paths = emit_files(text, &meta, &outdir, "dong-bang").expect("emit ok");
    assert!(paths.txt_path.ends_with("dong-bang.txt"));
    assert!(paths.meta_path.ends_with("dong-bang.meta.json"));
    assert_eq!(paths.text_sha256, sha256_hex(text.as_bytes()));
    assert_eq!(fs::read_to_string(&paths.txt_path).unwrap(), text);

    let written = read_meta(&paths.meta_path);
    assert_eq!(written["doc_id"], "dong-bang");
    assert_eq!(written["text_sha256"], paths.text_sha256.as_str());
    assert!(written["meta_fingerprint"].is_string());

    let leftovers: Vec<_> = fs::read_dir(&outdir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
        .collect();
    assert!(leftovers.is_empty());

    let report = verify_output(&paths.txt_path, &paths.meta_path).unwrap();
    assert!(report.ok);
    assert_eq!(report.expected, report.actual);
}

#[test]
fn fingerprint_ignores_timestamps() {
    let td = tempfile::tempdir().unwrap();
    let first = serde_json::json!({ "doc_id": "mv", "timestamps": { "started_ms": 1, "finished_ms": 2 } });
    let second = serde_json::json!({ "doc_id": "mv", "timestamps": { "started_ms": 7, "finished_ms": 9 } });

    let a = emit_files("Miet vuon.", &first, &td.path().join("a"), "mv").unwrap();
    let b = emit_files("Miet vuon.", &second, &td.path().join("b"), "mv").unwrap();
    assert_eq!(read_meta(&a.meta_path)["meta_fingerprint"], read_meta(&b.meta_path)["meta_fingerprint"]);

    let c = emit_files("Miet vuon xua.", &first, &td.path().join("c"), "mv").unwrap();
    assert_ne!(read_meta(&a.meta_path)["meta_fingerprint"], read_meta(&c.meta_path)["meta_fingerprint"]);
}

#[test]
fn meta_must_be_an_object() {
    let td = tempfile::tempdir().unwrap();
    let err = emit_files("x", &serde_json::json!([1, 2]), td.path(), "x").unwrap_err();
    assert!(matches!(err, EmitError::Meta(_)));
    assert!(!td.path().join("x.txt").exists());
}

#[test]
fn verify_detects_edited_text() {
    let td = tempfile::tempdir().unwrap();
    let paths = emit_files("Miet vuon.", &serde_json::json!({}), td.path(), "mv").unwrap();

    fs::write(&paths.txt_path, "Miet vuon xua.").unwrap();
    let report = verify_output(&paths.txt_path, &paths.meta_path).unwrap();
    assert!(!report.ok);
    assert_eq!(report.expected, sha256_hex(b"Miet vuon."));
    assert_eq!(report.actual, sha256_hex(b"Miet vuon xua."));
}

#[test]
fn verify_needs_a_recorded_digest() {
    let td = tempfile::tempdir().unwrap();
    let txt = td.path().join("x.txt");
    let meta = td.path().join("x.meta.json");
    fs::write(&txt, "x").unwrap();
    fs::write(&meta, "{}").unwrap();
    assert!(matches!(verify_output(&txt, &meta), Err(EmitError::Meta(_))));
    assert!(matches!(verify_output(&td.path().join("none.txt"), &meta), Err(EmitError::ReadFailed(_))));
}

#[test]
fn sha256_of_empty_input() {
    assert_eq!(sha256_hex(b""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
}

#[test]
fn slugs_fold_vietnamese_diacritics() {
    assert_eq!(slugify("Đồng Bằng sông Cửu Long"), "dong-bang-song-cuu-long");
    assert_eq!(slugify("  Miệt vườn (1990) "), "miet-vuon-1990");
    assert_eq!(slugify("???"), "doc");
}

#[test]
fn duplicate_slugs_get_a_suffix() {
    let mut used = HashSet::new();
    assert_eq!(unique_slug("sach".into(), &mut used), "sach");
    assert_eq!(unique_slug("sach".into(), &mut used), "sach-1");
    assert_eq!(unique_slug("sach".into(), &mut used), "sach-2");
    assert_eq!(unique_slug("khac".into(), &mut used), "khac");
}
