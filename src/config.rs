use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unicode normalization form applied before any other cleanup step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnicodeForm {
    Nfc,
    #[default]
    Nfkc,
}

/// One cross-line repair: `left`, a line break, then `right` collapse into
/// `left right`. Both halves are regular expressions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepairRule {
    pub left: String,
    pub right: String,
}

impl RepairRule {
    pub fn new(left: &str, right: &str) -> Self {
        Self { left: left.to_string(), right: right.to_string() }
    }
}

/// Tunables of the reconstruction pipeline. Every field has a default, so a
/// partial YAML document only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max distance between a word's top and the running average top of its line.
    pub line_tolerance: f64,
    pub footnote_size_ratio: f64,
    /// How far above the line's average top a token must sit to count as raised.
    pub footnote_raise: f64,
    /// Digit strings of this length or longer (years) are never footnotes.
    pub footnote_max_digits: usize,
    pub footnote_gap: f64,
    /// Size thresholds below are absolute, in the units of `WordToken::size`.
    /// Defaults are tuned for font sizes in points. Poppler word boxes are
    /// roughly 1.1-1.2 times the font size, so on PDF input a delta of 1.5 box
    /// units means about 1.3 points of font size and the 0.5 merge tolerance
    /// about 0.45 points. Scale these when the word source changes.
    pub header_size_delta: f64,
    pub header_max_words: usize,
    pub header_merge_tolerance: f64,
    pub default_body_size: f64,
    /// Fixed body size; skips estimation for the document and for every page.
    pub body_size_override: Option<f64>,
    pub unicode_form: UnicodeForm,
    /// Letters allowed after the capital in a protected abbreviation ("H.", "Th.", "Tp.").
    pub abbreviation_tail: usize,
    pub meta_keywords: Vec<String>,
    pub garbage_phrases: Vec<String>,
    pub meta_connectors: Vec<String>,
    pub address_abbreviations: Vec<String>,
    pub repair_rules: Vec<RepairRule>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            line_tolerance: 6.0,
            footnote_size_ratio: 0.98,
            footnote_raise: 1.0,
            footnote_max_digits: 4,
            footnote_gap: 6.0,
            header_size_delta: 1.5,
            header_max_words: 20,
            header_merge_tolerance: 0.5,
            default_body_size: 12.0,
            body_size_override: None,
            unicode_form: UnicodeForm::Nfkc,
            abbreviation_tail: 2,
            meta_keywords: strings(&[
                "Copyright",
                "Cataloging",
                "biên khảo",
                "NXB",
                "NHÀ XUẤT BẢN",
                "Publishing House",
                "BIỂU GHI",
                "THƯ VIỆN",
                "All rights reserved",
            ]),
            garbage_phrases: strings(&[
                "Tủ sách",
                "Ebook miễn phí",
                "hoccachlamgiau",
                "Created by",
                "Watermark",
                "sacngoc",
                "Ồ Ằ",
                "Ổ Ầ",
                "Ồ Ầ",
                "Ể ",
            ]),
            meta_connectors: strings(&["-", "--", "–", "và", ":", ","]),
            address_abbreviations: strings(&["p.", "q.", "tp.", "tx.", "k.", "v.", "đ."]),
            repair_rules: vec![
                RepairRule::new(r"T\.P\.", "Hồ"),
                RepairRule::new(r"Hồ\s+Chí", "Minh"),
                RepairRule::new("Hồ", r"Chí\s+Minh"),
            ],
        }
    }
}

/// Top-level configuration file: where to look for inputs, where to write,
/// and the pipeline tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub input_glob: String,
    pub output_dir: String,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_glob: "./input/**/*.pdf".to_string(),
            output_dir: "./output".to_string(),
            pipeline: PipelineConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Invalid pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
}

pub const DEFAULT_CONFIG_PATH: &str = "vnpdf.yaml";

/// Read and validate a YAML config. When `explicit` is false a missing file
/// falls back to defaults; an explicitly requested file must exist.
pub fn load_config(path: &Path, explicit: bool) -> Result<AppConfig, ConfigError> {
    if !explicit && !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<AppConfig, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let cfg: AppConfig = serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    cfg.pipeline.validate()?;
    if cfg.input_glob.trim().is_empty() || cfg.output_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("input_glob and output_dir must not be empty".into()));
    }
    Ok(cfg)
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("line_tolerance", self.line_tolerance),
            ("footnote_size_ratio", self.footnote_size_ratio),
            ("footnote_gap", self.footnote_gap),
            ("header_merge_tolerance", self.header_merge_tolerance),
            ("default_body_size", self.default_body_size),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{} must be a positive number", name)));
            }
        }
        for (name, value) in [("footnote_raise", self.footnote_raise), ("header_size_delta", self.header_size_delta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{} must be a non-negative number", name)));
            }
        }
        if let Some(body) = self.body_size_override {
            if !body.is_finite() || body <= 0.0 {
                return Err(ConfigError::Invalid("body_size_override must be a positive number".into()));
            }
        }
        if self.footnote_max_digits == 0 {
            return Err(ConfigError::Invalid("footnote_max_digits must be at least 1".into()));
        }
        let lists = [
            ("meta_keywords", &self.meta_keywords),
            ("garbage_phrases", &self.garbage_phrases),
            ("meta_connectors", &self.meta_connectors),
            ("address_abbreviations", &self.address_abbreviations),
        ];
        for (name, list) in lists {
            if list.iter().any(|s| s.is_empty()) {
                return Err(ConfigError::Invalid(format!("{} contains an empty entry", name)));
            }
        }
        Ok(())
    }
}
