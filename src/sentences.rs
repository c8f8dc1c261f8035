use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder a caller can embed in paragraph text to force a line break
/// that survives whitespace collapsing.
pub const NEWLINE_MARK: &str = "|||NEWLINE|||";

const PROTECTED_DOT: char = '\u{E000}';

const VIET_UPPER: &str = "ÁÀẢÃẠÂẤẦẨẪẬĂẮẰẲẴẶÉÈẺẼẸÊẾỀỂỄỆÍÌỈĨỊÓÒỎÕỌÔỐỒỔỖỘƠỚỜỞỠỢÚÙỦŨỤƯỨỪỬỮỰÝỲỶỸỴĐ";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

// sentence mark, the gap to split on, then the opener of the next sentence
static BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r#"[.?!](\s+)[A-Z{}"'«(“‘]"#, VIET_UPPER);
    Regex::new(&pattern).expect("static regex")
});

/// Split a paragraph into sentences.
///
/// Periods closing a short capitalised abbreviation (`H.`, `Th.`, `Tp.`; up to
/// `abbreviation_tail` letters after the capital) never end a sentence. Empty
/// input gives an empty list.
pub fn split_sentences(text: &str, abbreviation_tail: usize) -> Vec<String> {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let collapsed = collapsed.trim().replace(NEWLINE_MARK, "\n");
    if collapsed.is_empty() {
        return Vec::new();
    }
    let protected = protect_abbreviations(&collapsed, abbreviation_tail);

    let mut pieces: Vec<&str> = Vec::new();
    let mut start = 0;
    for caps in BOUNDARY.captures_iter(&protected) {
        if let Some(gap) = caps.get(1) {
            pieces.push(&protected[start..gap.start()]);
            start = gap.end();
        }
    }
    pieces.push(&protected[start..]);

    pieces
        .into_iter()
        .map(|p| p.replace(PROTECTED_DOT, ".").trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Swap the period of every `<A-Z><0..=tail ASCII letters>.` that starts a word
/// and is followed by whitespace for a placeholder.
fn protect_abbreviations(text: &str, tail: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out: Vec<char> = chars.clone();
    for i in 0..chars.len() {
        if !chars[i].is_ascii_uppercase() || (i > 0 && is_word_char(chars[i - 1])) {
            continue;
        }
        let letters = chars[i + 1..].iter().take(tail + 1).take_while(|c| c.is_ascii_alphabetic()).count();
        if letters > tail {
            continue;
        }
        let dot = i + 1 + letters;
        if chars.get(dot) == Some(&'.') && chars.get(dot + 1).is_some_and(|c| c.is_whitespace()) {
            out[dot] = PROTECTED_DOT;
        }
    }
    out.into_iter().collect()
}
