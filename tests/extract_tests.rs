use std::fs;
use std::path::Path;

use vnpdf_to_txt::{parse_bbox_html, source_for, ExtractError, JsonWords, PopplerWords, WordSource};

const BBOX: &str = r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>sach</title></head>
<body>
<doc>
  <page width="595.000000" height="842.000000">
    <word xMin="56.800000" yMin="70.000000" xMax="90.200000" yMax="86.000000">ĐỒNG</word>
    <word xMin="94.000000" yMin="70.000000" xMax="120.000000" yMax="86.000000">&quot;Tom&quot;&amp;Jerry</word>
    <word xMin="bad" yMin="70.000000" xMax="130.000000" yMax="86.000000">lỗi</word>
  </page>
  <page width="595.000000" height="842.000000">
  </page>
</doc>
</body>
</html>"#;

#[test]
fn bbox_output_becomes_pages_of_words() {
    let pages = parse_bbox_html(BBOX);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].len(), 2);
    assert!(pages[1].is_empty());

    let first = &pages[0][0];
    assert_eq!(first.text, "ĐỒNG");
    assert_eq!(first.x0, 56.8);
    assert_eq!(first.top, 70.0);
    assert_eq!(first.size, 16.0);
    assert_eq!(pages[0][1].text, "\"Tom\"&Jerry");
}

#[test]
fn source_is_chosen_by_extension() {
    assert_eq!(source_for(Path::new("sach.json")).engine(), "json");
    assert_eq!(source_for(Path::new("SACH.JSON")).engine(), "json");
    assert_eq!(source_for(Path::new("sach.pdf")).engine(), "poppler-bbox");
    assert_eq!(source_for(Path::new("sach")).engine(), "poppler-bbox");
}

#[test]
fn both_dump_layouts_are_accepted() {
    let word = r#"{"text": "Cần", "x0": 1.0, "x1": 20.0, "top": 50.0, "size": 12.0}"#;
    let bare = JsonWords::parse(&format!("[[{}], []]", word)).unwrap();
    let wrapped = JsonWords::parse(&format!(r#"{{"pages": [[{}], []]}}"#, word)).unwrap();
    assert_eq!(bare, wrapped);
    assert_eq!(bare.len(), 2);
    assert_eq!(bare[0][0].text, "Cần");
}

#[test]
fn malformed_dump_is_reported() {
    assert!(matches!(JsonWords::parse("{\"pages\": 3}"), Err(ExtractError::Malformed(_))));
    assert!(matches!(JsonWords::parse("[[{\"text\": \"x\"}]]"), Err(ExtractError::Malformed(_))));
}

#[test]
fn missing_input_is_file_not_found() {
    let td = tempfile::tempdir().unwrap();
    let missing = td.path().join("khong-co.pdf");
    assert!(matches!(PopplerWords.extract_pages(&missing), Err(ExtractError::FileNotFound(_))));
    assert!(matches!(JsonWords.extract_pages(&missing), Err(ExtractError::FileNotFound(_))));

    let broken = td.path().join("hong.json");
    fs::write(&broken, "not json").unwrap();
    assert!(matches!(JsonWords.extract_pages(&broken), Err(ExtractError::Malformed(_))));
}
