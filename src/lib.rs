//! Rebuilds readable, structured plain text from positioned PDF word tokens:
//! physical lines, footnote markers, headings, bibliographic lines and
//! sentence-split paragraphs.

use serde::{Deserialize, Serialize};

pub mod config;
pub mod emit;
pub mod extract;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod repair;
pub mod sentences;
pub mod structure;

pub use config::{load_config, parse_config, AppConfig, ConfigError, PipelineConfig, RepairRule, UnicodeForm};
pub use emit::{emit_files, sha256_hex, slugify, unique_slug, verify_output, EmitError, EmitPaths, VerifyReport};
pub use extract::{
    check_deps, enumerate_inputs, install_help_for, parse_bbox_html, source_for, DepsResult, EnumerateError,
    ExtractError, JsonWords, PopplerWords, WordSource,
};
pub use layout::{cluster_lines, font_size_mode, reconcile_footnotes};
pub use normalize::Normalizer;
pub use pipeline::{Document, PageLines, Pipeline, PipelineError};
pub use repair::RepairPass;
pub use sentences::split_sentences;
pub use structure::{strip_decorations, LineClassifier, StructureBuilder, StructureError, StructureStats};

/// A positioned word as delivered by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub size: f64,
}

impl WordToken {
    pub fn new(text: &str, x0: f64, x1: f64, top: f64, size: f64) -> Self {
        Self { text: text.to_string(), x0, x1, top, size }
    }
}

/// Tokens judged to share one text row, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalLine {
    pub tokens: Vec<WordToken>,
}

impl PhysicalLine {
    pub fn text(&self) -> String {
        join_tokens(&self.tokens)
    }

    /// Largest font size on the line.
    pub fn size(&self) -> f64 {
        self.tokens.iter().map(|t| t.size).fold(0.0, f64::max)
    }

    pub fn average_top(&self) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        self.tokens.iter().map(|t| t.top).sum::<f64>() / self.tokens.len() as f64
    }
}

pub(crate) fn join_tokens(tokens: &[WordToken]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ")
}

/// A cleaned line and its representative font size, rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLine {
    pub text: String,
    pub size: f64,
}

impl NormalizedLine {
    pub fn new(text: &str, size: f64) -> Self {
        Self { text: text.to_string(), size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Text,
    Header,
    Meta,
    Separator,
}

impl std::fmt::Display for LineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LineType::Text => "TEXT",
            LineType::Header => "HEADER",
            LineType::Meta => "META",
            LineType::Separator => "SEPARATOR",
        };
        f.write_str(name)
    }
}
