use std::path::{Path, PathBuf};
use std::process::Command;

use globwalk::GlobWalkerBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WordToken;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepsResult {
    pub ok: bool,
    pub missing: Vec<String>,
}

/// Check external tools. `pdftotext` (Poppler) is required for PDF inputs;
/// JSON word dumps need nothing.
pub fn check_deps() -> DepsResult {
    let mut missing = Vec::new();
    if which::which("pdftotext").is_err() {
        missing.push("pdftotext".to_string());
    }
    DepsResult { ok: missing.is_empty(), missing }
}

/// Installation hint for missing tools, empty when nothing is missing.
pub fn install_help_for(missing: &[String]) -> String {
    let mut pkgs: Vec<&str> = Vec::new();
    if missing.iter().any(|m| m == "pdftotext") {
        pkgs.push("poppler-utils");
    }
    if pkgs.is_empty() {
        return String::new();
    }
    format!("Dependency missing. Install with:\n  sudo apt install {}", pkgs.join(" "))
}

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("NoFilesFound")]
    NoFilesFound { guidance: String },
}

/// Files matching `glob_pattern` (e.g. "./input/**/*.pdf"), sorted by path.
/// Relative patterns are walked from the working directory.
pub fn enumerate_inputs(glob_pattern: &str) -> Result<Vec<PathBuf>, EnumerateError> {
    let not_found = || EnumerateError::NoFilesFound { guidance: folder_guidance(glob_pattern) };
    let (base, pattern) = if Path::new(glob_pattern).is_absolute() {
        ("/", glob_pattern)
    } else {
        (".", glob_pattern.trim_start_matches("./"))
    };
    let walker = GlobWalkerBuilder::from_patterns(base, &[pattern])
        .follow_links(false)
        .build()
        .map_err(|_| not_found())?;

    let mut files: Vec<PathBuf> =
        walker.filter_map(Result::ok).map(|entry| entry.into_path()).filter(|path| path.is_file()).collect();
    files.sort();
    if files.is_empty() {
        Err(not_found())
    } else {
        Ok(files)
    }
}

fn folder_guidance(glob_pattern: &str) -> String {
    format!(
        "No input files match {}\nPlace PDFs (or JSON word dumps) under ./input/, e.g. ./input/sach/ten-sach.pdf,\nor pass the files to convert directly.",
        glob_pattern
    )
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("EncryptedPDF: {0}")]
    EncryptedPdf(String),
    #[error("Malformed word dump: {0}")]
    Malformed(String),
    #[error("ExtractError: {0}")]
    Other(String),
}

/// Source of positioned words, one inner vector per page in document order.
pub trait WordSource {
    fn engine(&self) -> &'static str;
    fn extract_pages(&self, path: &Path) -> Result<Vec<Vec<WordToken>>, ExtractError>;
}

/// Pick a source by file extension: `.json` dumps are read directly, anything
/// else goes through Poppler.
pub fn source_for(path: &Path) -> Box<dyn WordSource> {
    let is_json = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Box::new(JsonWords)
    } else {
        Box::new(PopplerWords)
    }
}

/// Words from `pdftotext -bbox`. Poppler reports no font size, so the height
/// of each word box stands in for it. Ratios (footnote size, body mode) are
/// unaffected; the absolute header thresholds in
/// [`PipelineConfig`](crate::PipelineConfig) amount to about 15% less font
/// size on this source.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopplerWords;

impl WordSource for PopplerWords {
    fn engine(&self) -> &'static str {
        "poppler-bbox"
    }

    fn extract_pages(&self, path: &Path) -> Result<Vec<Vec<WordToken>>, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }
        let out = Command::new("pdftotext")
            .arg("-bbox")
            .arg("-q")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| ExtractError::Other(e.to_string()))?;
        if !out.status.success() {
            let err = String::from_utf8_lossy(&out.stderr).to_lowercase();
            if err.contains("encrypt") || err.contains("password") {
                return Err(ExtractError::EncryptedPdf(path.display().to_string()));
            }
            return Err(ExtractError::Other(format!("pdftotext failed: {}", err.trim())));
        }
        Ok(parse_bbox_html(&String::from_utf8_lossy(&out.stdout)))
    }
}

static PAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<page\b[^>]*>(.*?)</page>").expect("static regex"));
static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<word\s+xMin="([^"]*)"\s+yMin="([^"]*)"\s+xMax="([^"]*)"\s+yMax="([^"]*)"\s*>(.*?)</word>"#)
        .expect("static regex")
});

/// Parse the XHTML written by `pdftotext -bbox`. Words with unreadable
/// coordinates are skipped.
pub fn parse_bbox_html(html: &str) -> Vec<Vec<WordToken>> {
    let mut pages = Vec::new();
    for page in PAGE_RE.captures_iter(html) {
        let body = page.get(1).map_or("", |m| m.as_str());
        let mut words = Vec::new();
        for w in WORD_RE.captures_iter(body) {
            let coord = |i: usize| w.get(i).and_then(|m| m.as_str().trim().parse::<f64>().ok());
            let (Some(x_min), Some(y_min), Some(x_max), Some(y_max)) = (coord(1), coord(2), coord(3), coord(4)) else {
                continue;
            };
            let text = decode_entities(w.get(5).map_or("", |m| m.as_str()));
            if text.trim().is_empty() {
                continue;
            }
            words.push(WordToken { text, x0: x_min, x1: x_max, top: y_min, size: (y_max - y_min).abs() });
        }
        pages.push(words);
    }
    pages
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WordDump {
    Pages(Vec<Vec<WordToken>>),
    Document { pages: Vec<Vec<WordToken>> },
}

/// Words from a JSON dump: `[[word, ...], ...]` or `{"pages": [[word, ...], ...]}`,
/// each word carrying at least `text`, `x0`, `x1`, `top` and `size`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWords;

impl JsonWords {
    pub fn parse(raw: &str) -> Result<Vec<Vec<WordToken>>, ExtractError> {
        let dump: WordDump = serde_json::from_str(raw).map_err(|e| ExtractError::Malformed(e.to_string()))?;
        Ok(match dump {
            WordDump::Pages(pages) => pages,
            WordDump::Document { pages } => pages,
        })
    }
}

impl WordSource for JsonWords {
    fn engine(&self) -> &'static str {
        "json"
    }

    fn extract_pages(&self, path: &Path) -> Result<Vec<Vec<WordToken>>, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ExtractError::Other(e.to_string()))?;
        Self::parse(&raw)
    }
}
