use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::{join_tokens, PhysicalLine, PipelineConfig, WordToken};

/// Group one page's tokens into physical lines, top to bottom.
///
/// Tokens are visited by ascending `top`; a token joins the open line while its
/// `top` is within `tolerance` of the line's running average top, otherwise it
/// starts a new line. Each finished line is ordered by `x0`, which puts raised
/// footnote digits back after the word they annotate.
pub fn cluster_lines(tokens: &[WordToken], tolerance: f64) -> Vec<PhysicalLine> {
    let mut sorted: Vec<WordToken> = tokens.to_vec();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top));

    let mut lines = Vec::new();
    let mut current: Vec<WordToken> = Vec::new();
    let mut top_sum = 0.0;
    for token in sorted {
        if !current.is_empty() {
            let avg_top = top_sum / current.len() as f64;
            if (token.top - avg_top).abs() >= tolerance {
                lines.push(close_line(std::mem::take(&mut current)));
                top_sum = 0.0;
            }
        }
        top_sum += token.top;
        current.push(token);
    }
    if !current.is_empty() {
        lines.push(close_line(current));
    }
    lines
}

fn close_line(mut tokens: Vec<WordToken>) -> PhysicalLine {
    tokens.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    PhysicalLine { tokens }
}

/// Most frequent font size, ties going to the size seen first. Sizes are
/// compared at 0.01 precision.
pub fn font_size_mode<I: IntoIterator<Item = f64>>(sizes: I) -> Option<f64> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    let mut first_seen: Vec<(i64, f64)> = Vec::new();
    for size in sizes {
        if !size.is_finite() {
            continue;
        }
        let key = (size * 100.0).round() as i64;
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            first_seen.push((key, size));
        }
        *count += 1;
    }

    let mut best: Option<(f64, usize)> = None;
    for (key, size) in first_seen {
        let count = counts.get(&key).copied().unwrap_or(0);
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((size, count));
        }
    }
    best.map(|(size, _)| size)
}

/// Digits of a footnote-shaped token: `12`, `[12]` or superscript `¹²`,
/// folded to ASCII.
fn footnote_digits(text: &str) -> Option<String> {
    let folded: String = text.trim().nfkc().collect();
    let inner = match folded.strip_prefix('[') {
        Some(rest) => rest.strip_suffix(']')?,
        None => folded.as_str(),
    };
    if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
        Some(inner.to_string())
    } else {
        None
    }
}

/// Turn small or raised numeric tokens into `[n]` markers glued onto the word
/// before them. Returns the reconciled tokens and the number of markers found.
///
/// Lines carrying a metadata keyword are left alone, and digit strings as long
/// as `footnote_max_digits` (years) never qualify.
pub fn reconcile_footnotes(line: &PhysicalLine, body_size: f64, cfg: &PipelineConfig) -> (Vec<WordToken>, usize) {
    let raw_text = join_tokens(&line.tokens);
    if cfg.meta_keywords.iter().any(|k| raw_text.contains(k.as_str())) {
        return (line.tokens.clone(), 0);
    }

    let avg_top = line.average_top();
    let mut out: Vec<WordToken> = Vec::with_capacity(line.tokens.len());
    let mut markers = 0usize;
    for token in &line.tokens {
        let digits = footnote_digits(&token.text).filter(|d| d.len() < cfg.footnote_max_digits);
        let is_small = token.size < body_size * cfg.footnote_size_ratio;
        let is_raised = avg_top - token.top > cfg.footnote_raise;
        let Some(digits) = digits.filter(|_| is_small || is_raised) else {
            out.push(token.clone());
            continue;
        };

        markers += 1;
        let marker = format!("[{}]", digits);
        match out.last_mut() {
            Some(prev) if token.x0 - prev.x1 < cfg.footnote_gap => {
                prev.text.push_str(&marker);
                prev.x1 = token.x1;
            }
            _ => out.push(WordToken { text: marker, ..token.clone() }),
        }
    }
    (out, markers)
}
