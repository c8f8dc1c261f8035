use regex::Regex;

use crate::{ConfigError, PipelineConfig};

/// Whole-document fix-ups for names broken across unit boundaries.
///
/// Each rule becomes `left\s*[\n\r]+\s*right` and the line break between
/// the two halves is replaced by one space. Configured address abbreviations
/// (`p.`, `q.`, `tp.` ...) form one more rule whose right half is any
/// capitalised word.
#[derive(Debug, Clone)]
pub struct RepairPass {
    rules: Vec<Regex>,
}

impl RepairPass {
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, ConfigError> {
        let mut patterns: Vec<String> = cfg
            .repair_rules
            .iter()
            .map(|r| format!(r"(?P<left>{})\s*[\n\r]+\s*(?P<right>{})", r.left, r.right))
            .collect();
        if !cfg.address_abbreviations.is_empty() {
            let alternatives: Vec<String> = cfg.address_abbreviations.iter().map(|a| regex::escape(a)).collect();
            patterns.push(format!(r"(?P<left>(?:^|\s)(?i:{}))\s*[\n\r]+\s*(?P<right>\p{{Lu}})", alternatives.join("|")));
        }

        let mut rules = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let re = Regex::new(&pattern).map_err(|e| ConfigError::Pattern { pattern: pattern.clone(), message: e.to_string() })?;
            rules.push(re);
        }
        Ok(Self { rules })
    }

    /// Join the units with newlines, apply every rule in order, and split the
    /// result back into lines.
    pub fn apply(&self, units: &[String]) -> Vec<String> {
        let mut full = units.join("\n");
        if full.is_empty() {
            return Vec::new();
        }
        for rule in &self.rules {
            full = rule.replace_all(&full, "${left} ${right}").into_owned();
        }
        full.split('\n').map(|s| s.to_string()).collect()
    }
}
