use std::fs;

use vnpdf_to_txt::{load_config, parse_config, AppConfig, ConfigError, PipelineConfig, RepairRule, UnicodeForm};

#[test]
fn empty_document_gives_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg, AppConfig::default());
    assert_eq!(cfg.input_glob, "./input/**/*.pdf");
    assert_eq!(cfg.pipeline.line_tolerance, 6.0);
    assert_eq!(cfg.pipeline.unicode_form, UnicodeForm::Nfkc);
}

#[test]
fn partial_yaml_overrides_only_named_fields() {
    let raw = r#"
output_dir: ./txt
pipeline:
  unicode_form: nfc
  body_size_override: 11.5
  repair_rules:
    - left: "Cửu"
      right: "Long"
"#;
    let cfg = parse_config(raw).unwrap();
    assert_eq!(cfg.output_dir, "./txt");
    assert_eq!(cfg.input_glob, "./input/**/*.pdf");
    assert_eq!(cfg.pipeline.unicode_form, UnicodeForm::Nfc);
    assert_eq!(cfg.pipeline.body_size_override, Some(11.5));
    assert_eq!(cfg.pipeline.repair_rules, vec![RepairRule::new("Cửu", "Long")]);
    assert_eq!(cfg.pipeline.meta_keywords, PipelineConfig::default().meta_keywords);
}

#[test]
fn out_of_range_values_are_rejected() {
    for raw in [
        "pipeline:\n  line_tolerance: 0",
        "pipeline:\n  footnote_max_digits: 0",
        "pipeline:\n  header_size_delta: -1",
        "pipeline:\n  body_size_override: -12",
        "pipeline:\n  meta_keywords: [\"NXB\", \"\"]",
        "output_dir: \"  \"",
    ] {
        assert!(matches!(parse_config(raw), Err(ConfigError::Invalid(_))), "accepted {:?}", raw);
    }
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    assert!(matches!(parse_config("pipeline: [1, 2"), Err(ConfigError::Parse(_))));
    assert!(matches!(parse_config("pipeline:\n  line_tolerance: wide"), Err(ConfigError::Parse(_))));
}

#[test]
fn missing_file_only_fails_when_requested() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("vnpdf.yaml");

    assert_eq!(load_config(&path, false).unwrap(), AppConfig::default());
    assert!(matches!(load_config(&path, true), Err(ConfigError::Read(_))));

    fs::write(&path, "input_glob: ./sach/*.json\n").unwrap();
    let cfg = load_config(&path, true).unwrap();
    assert_eq!(cfg.input_glob, "./sach/*.json");
}
