use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::{ExtractError, WordSource};
use crate::layout::{cluster_lines, font_size_mode, reconcile_footnotes};
use crate::structure::{LineClassifier, StructureBuilder, StructureError, StructureStats};
use crate::{join_tokens, ConfigError, NormalizedLine, Normalizer, PipelineConfig, RepairPass, WordToken};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Normalized lines of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLines {
    pub lines: Vec<NormalizedLine>,
    pub footnotes: usize,
}

/// A restructured document: one heading, metadata entry or sentence per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub lines: Vec<String>,
    pub body_size: f64,
    pub page_count: usize,
    pub stats: StructureStats,
}

impl Document {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Compiled, reusable pipeline. Holds no per-document state, so one instance
/// can process any number of documents.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: Normalizer,
    classifier: LineClassifier,
    repair: RepairPass,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let normalizer = Normalizer::new(&config);
        let classifier = LineClassifier::new(&config)?;
        let repair = RepairPass::from_config(&config)?;
        Ok(Self { config, normalizer, classifier, repair })
    }

    /// Cluster, reconcile footnotes and clean one page. Page-local: the result
    /// does not depend on any other page.
    pub fn normalize_page(&self, tokens: &[WordToken]) -> PageLines {
        let cfg = &self.config;
        let page_body = match cfg.body_size_override {
            Some(body) => body,
            None => match font_size_mode(tokens.iter().map(|t| t.size)) {
                Some(body) => body,
                None => return PageLines::default(),
            },
        };

        let mut page = PageLines::default();
        for line in cluster_lines(tokens, cfg.line_tolerance) {
            let (reconciled, markers) = reconcile_footnotes(&line, page_body, cfg);
            page.footnotes += markers;
            let text = self.normalizer.clean_string(&join_tokens(&reconciled));
            if text.is_empty() {
                continue;
            }
            let size = (line.size() * 10.0).round() / 10.0;
            page.lines.push(NormalizedLine { text, size });
        }
        page
    }

    /// Document body size: the override when configured, else the mode of the
    /// line sizes, else `default_body_size`.
    pub fn estimate_body_size(&self, lines: &[NormalizedLine]) -> f64 {
        self.config
            .body_size_override
            .or_else(|| font_size_mode(lines.iter().map(|l| l.size)))
            .unwrap_or(self.config.default_body_size)
    }

    /// Classify and merge lines, sentence-split paragraphs, and run the
    /// cross-line repair pass.
    pub fn structure_lines(&self, lines: &[NormalizedLine], body_size: f64) -> Result<Document, StructureError> {
        let mut builder = StructureBuilder::new(&self.classifier, body_size, &self.config);
        for line in lines {
            builder.push(line)?;
        }
        let (units, stats) = builder.finish();
        let lines = self.repair.apply(&units);
        Ok(Document { lines, body_size, page_count: 0, stats })
    }

    /// Run the whole pipeline over pages given in document order.
    pub fn process_pages(&self, pages: &[Vec<WordToken>]) -> Result<Document, StructureError> {
        let mut all_lines = Vec::new();
        let mut footnotes = 0;
        for tokens in pages {
            let page = self.normalize_page(tokens);
            footnotes += page.footnotes;
            all_lines.extend(page.lines);
        }
        let body_size = self.estimate_body_size(&all_lines);
        debug!("{} pages, {} lines, body size {}", pages.len(), all_lines.len(), body_size);

        let mut doc = self.structure_lines(&all_lines, body_size)?;
        doc.page_count = pages.len();
        doc.stats.footnotes = footnotes;
        debug!("{} units written, {:?}", doc.lines.len(), doc.stats);
        Ok(doc)
    }

    pub fn process_file(&self, source: &dyn WordSource, path: &Path) -> Result<Document, PipelineError> {
        let pages = source.extract_pages(path)?;
        Ok(self.process_pages(&pages)?)
    }
}
