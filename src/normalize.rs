use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::{PipelineConfig, UnicodeForm};

static LEADING_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s•●_]+").expect("static regex"));
static DETACHED_FOOTNOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(\[\d+\])").expect("static regex"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([,.:;!?])").expect("static regex"));
static LEADING_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(([^)]+)\)\s*").expect("static regex"));

const MAX_PASSES: usize = 4;

/// Per-line string cleanup.
#[derive(Debug, Clone)]
pub struct Normalizer {
    form: UnicodeForm,
    garbage: Vec<String>,
}

impl Normalizer {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            form: cfg.unicode_form,
            garbage: cfg.garbage_phrases.iter().filter(|p| !p.is_empty()).cloned().collect(),
        }
    }

    /// Clean one assembled line. An empty result means the line should be dropped.
    ///
    /// The ordered pass runs until its output stops changing, so cleaning an
    /// already clean string returns it untouched.
    pub fn clean_string(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let mut current = self.clean_pass(text);
        for _ in 1..MAX_PASSES {
            let next = self.clean_pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn clean_pass(&self, text: &str) -> String {
        let text: String = match self.form {
            UnicodeForm::Nfc => text.nfc().collect(),
            UnicodeForm::Nfkc => text.nfkc().collect(),
        };
        let mut text = LEADING_NOISE.replace(&text, "").into_owned();
        self.remove_garbage(&mut text);
        let text = DETACHED_FOOTNOTE.replace_all(&text, "$1");
        let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
        let text = fix_quote_spacing(&text);
        let text = LEADING_TITLE.replace(&text, "(${1})\n");
        text.trim().to_string()
    }

    fn remove_garbage(&self, text: &mut String) {
        // removing one phrase can splice together another
        while let Some(phrase) = self.garbage.iter().find(|p| text.contains(p.as_str())) {
            *text = text.replace(phrase.as_str(), "");
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Quote spacing: no whitespace just inside a quote, one space just outside it
/// when a word would otherwise touch it. No space is added before an opening
/// quote that follows whitespace, `(` or the start of the line. Straight quotes
/// alternate between opening and closing.
pub fn fix_quote_spacing(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut straight_open = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let opening = match c {
            '“' => Some(true),
            '”' => Some(false),
            '"' => {
                straight_open = !straight_open;
                Some(straight_open)
            }
            _ => None,
        };
        match opening {
            Some(true) => {
                if out.chars().last().is_some_and(|p| !p.is_whitespace() && p != '(') {
                    out.push(' ');
                }
                out.push(c);
                while i + 1 < chars.len() && chars[i + 1].is_whitespace() {
                    i += 1;
                }
            }
            Some(false) => {
                let kept = out.trim_end().len();
                out.truncate(kept);
                out.push(c);
                if chars.get(i + 1).is_some_and(|&n| is_word_char(n)) {
                    out.push(' ');
                }
            }
            None => out.push(c),
        }
        i += 1;
    }
    out
}
