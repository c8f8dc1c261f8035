use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sentences::split_sentences;
use crate::{ConfigError, LineType, NormalizedLine, PipelineConfig};

static STARS_SPACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\*\s+\*\s+\*\s*").expect("static regex"));
static STARS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{3,}").expect("static regex"));
static STARS_ANY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\s*\*\s*){3,}").expect("static regex"));

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[-+]|\d+\.)\s+").expect("static regex"));
static LIBRARY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}\.\d+|dc\s*22").expect("static regex"));
static PHYSICAL_DESC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+\s*(?:tr\.|tr;|trang|p\.|cm)").expect("static regex"));

/// Collapse `* * *` style decorations. `None` means the line was nothing but
/// decoration (a separator).
pub fn strip_decorations(text: &str) -> Option<String> {
    let text = STARS_SPACED.replace_all(text, " ");
    let text = STARS_RUN.replace_all(&text, " ");
    let text = STARS_ANY.replace_all(&text, " ");
    let text = text.trim();
    if text.chars().all(|c| c == '*' || c == ' ') {
        None
    } else {
        Some(text.to_string())
    }
}

/// Python-style `isupper`: at least one cased letter and no lower-case ones.
fn is_upper_case(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

fn starts_lowercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_lowercase)
}

/// Assigns a [`LineType`] to decoration-free lines.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    meta_keywords: Vec<String>,
    meta_connectors: Vec<String>,
    header_size_delta: f64,
    header_max_words: usize,
    abbreviation_end: Regex,
    address_end: Option<Regex>,
}

impl LineClassifier {
    pub fn new(cfg: &PipelineConfig) -> Result<Self, ConfigError> {
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|e| ConfigError::Pattern { pattern: pattern.clone(), message: e.to_string() })
        };
        let abbreviation_end = compile(format!(r"(?:^|[\s.])[A-Z][a-zA-Z]{{0,{}}}\.$", cfg.abbreviation_tail))?;
        let address_end = if cfg.address_abbreviations.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = cfg.address_abbreviations.iter().map(|a| regex::escape(a)).collect();
            Some(compile(format!(r"(?i)(?:^|\s)(?:{})$", alternatives.join("|")))?)
        };
        Ok(Self {
            meta_keywords: cfg.meta_keywords.clone(),
            meta_connectors: cfg.meta_connectors.clone(),
            header_size_delta: cfg.header_size_delta,
            header_max_words: cfg.header_max_words,
            abbreviation_end,
            address_end,
        })
    }

    pub fn is_metadata(&self, text: &str) -> bool {
        BULLET.is_match(text)
            || self.meta_keywords.iter().any(|k| text.contains(k.as_str()))
            || LIBRARY_CODE.is_match(text)
            || PHYSICAL_DESC.is_match(text)
    }

    pub fn is_header(&self, text: &str, size: f64, body_size: f64) -> bool {
        if !is_upper_case(text) {
            return false;
        }
        let big = size >= body_size + self.header_size_delta;
        let sub = size >= body_size && text.split_whitespace().count() < self.header_max_words;
        big || sub
    }

    /// META, HEADER or TEXT for a line that [`strip_decorations`] kept.
    pub fn classify(&self, text: &str, size: f64, body_size: f64) -> LineType {
        if self.is_metadata(text) {
            LineType::Meta
        } else if self.is_header(text, size, body_size) {
            LineType::Header
        } else {
            LineType::Text
        }
    }

    fn ends_with_connector(&self, text: &str) -> bool {
        self.meta_connectors.iter().any(|c| text.ends_with(c.as_str()))
    }

    /// True when a paragraph line ends in an initial or short abbreviation,
    /// so the following line continues the same sentence.
    pub fn ends_with_abbreviation(&self, text: &str) -> bool {
        self.abbreviation_end.is_match(text) || self.address_end.as_ref().is_some_and(|re| re.is_match(text))
    }
}

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("continuation of a {prev} unit with no unit to extend")]
    DetachedContinuation { prev: LineType },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureStats {
    pub headers: usize,
    pub metadata: usize,
    pub paragraphs: usize,
    pub sentences: usize,
    pub separators: usize,
    pub continuations: usize,
    pub merged_lines: usize,
    pub footnotes: usize,
}

/// Line-by-line merge state machine.
///
/// Finished units only ever grow: a new unit is appended, or the last unit is
/// extended when a HEADER or META line continues it. Paragraph lines collect in
/// an open buffer that is sentence-split whenever it is flushed.
#[derive(Debug)]
pub struct StructureBuilder<'a> {
    classifier: &'a LineClassifier,
    body_size: f64,
    header_merge_tolerance: f64,
    abbreviation_tail: usize,
    prev_type: Option<LineType>,
    last_header_size: f64,
    text_buffer: Vec<String>,
    output: Vec<String>,
    stats: StructureStats,
}

impl<'a> StructureBuilder<'a> {
    pub fn new(classifier: &'a LineClassifier, body_size: f64, cfg: &PipelineConfig) -> Self {
        Self {
            classifier,
            body_size,
            header_merge_tolerance: cfg.header_merge_tolerance,
            abbreviation_tail: cfg.abbreviation_tail,
            prev_type: None,
            last_header_size: 0.0,
            text_buffer: Vec::new(),
            output: Vec::new(),
            stats: StructureStats::default(),
        }
    }

    pub fn prev_type(&self) -> Option<LineType> {
        self.prev_type
    }

    /// Units finished so far; the open paragraph is not included.
    pub fn units(&self) -> &[String] {
        &self.output
    }

    pub fn push(&mut self, line: &NormalizedLine) -> Result<(), StructureError> {
        let size = line.size;
        let (line_type, text) = match strip_decorations(&line.text) {
            Some(text) => (self.classifier.classify(&text, size, self.body_size), text),
            None => (LineType::Separator, String::new()),
        };
        trace!("{} size={} {:?}", line_type, size, line.text);

        if line_type != LineType::Separator && self.prev_type == Some(LineType::Meta) {
            let last = self.output.last().ok_or(StructureError::DetachedContinuation { prev: LineType::Meta })?;
            if self.classifier.ends_with_connector(last) || starts_lowercase(&text) {
                self.extend_last(&text, LineType::Meta)?;
                return Ok(());
            }
        }

        match line_type {
            LineType::Separator => {
                self.flush();
                self.stats.separators += 1;
            }
            LineType::Meta => {
                self.flush();
                self.output.push(text);
                self.stats.metadata += 1;
            }
            LineType::Header => {
                let continues = self.prev_type == Some(LineType::Header)
                    && (size - self.last_header_size).abs() < self.header_merge_tolerance;
                if continues {
                    self.extend_last(&text, LineType::Header)?;
                } else {
                    self.flush();
                    self.output.push(text);
                    self.stats.headers += 1;
                }
                self.last_header_size = size;
            }
            LineType::Text => self.push_text(text),
        }
        self.prev_type = Some(line_type);
        Ok(())
    }

    fn push_text(&mut self, text: String) {
        let Some(prev_line) = self.text_buffer.last_mut() else {
            self.text_buffer.push(text);
            return;
        };
        let prev_trimmed = prev_line.trim();
        let continues = starts_lowercase(&text)
            || text.chars().next().is_some_and(|c| c.is_ascii_digit())
            || text.starts_with('[')
            || self.classifier.ends_with_abbreviation(prev_trimmed)
            || prev_trimmed.ends_with(',')
            || prev_trimmed.ends_with('-')
            || prev_trimmed.ends_with('–');
        if !continues {
            self.text_buffer.push(text);
            return;
        }

        self.stats.merged_lines += 1;
        if prev_line.ends_with('-') {
            // hyphenated word split over two lines
            prev_line.pop();
        } else {
            prev_line.push(' ');
        }
        prev_line.push_str(&text);
    }

    /// Append `text` to the last finished unit with a single joining space.
    fn extend_last(&mut self, text: &str, prev: LineType) -> Result<(), StructureError> {
        let idx = self.output.len().checked_sub(1).ok_or(StructureError::DetachedContinuation { prev })?;
        let unit = &mut self.output[idx];
        unit.push(' ');
        unit.push_str(text);
        self.stats.continuations += 1;
        Ok(())
    }

    fn flush(&mut self) {
        if self.text_buffer.is_empty() {
            return;
        }
        let paragraph = self.text_buffer.join(" ");
        self.text_buffer.clear();
        let sentences = split_sentences(&paragraph, self.abbreviation_tail);
        if sentences.is_empty() {
            return;
        }
        self.stats.paragraphs += 1;
        self.stats.sentences += sentences.len();
        self.output.extend(sentences);
    }

    /// Flush the open paragraph and hand back the finished units.
    pub fn finish(mut self) -> (Vec<String>, StructureStats) {
        self.flush();
        (self.output, self.stats)
    }
}
