//! Text block model and rule-based block classification.
//!
//! [`TextBlockClassifier`] labels a block of page text with a
//! [`BlockKind`] using a fixed priority order of heuristic rules: font
//! size for titles, casing patterns for headings, marker patterns for
//! abstracts, references and captions, and a pluggable [`MathPredicate`]
//! for mathematical content. Classification is pure and total; anything
//! that matches no rule is body text.

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use crate::geometry::BoundingBox;

/// Classification of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Document or section title (short, large font)
    Title,
    /// Section heading (all-caps or title-case short line)
    Heading,
    /// Abstract paragraph
    Abstract,
    /// Reference list marker or entry
    Reference,
    /// Figure caption
    FigureCaption,
    /// Table caption
    TableCaption,
    /// Mathematical content
    Math,
    /// Regular body text
    Body,
}

impl BlockKind {
    /// Check whether this kind is a caption of either flavor.
    pub fn is_caption(&self) -> bool {
        matches!(self, BlockKind::FigureCaption | BlockKind::TableCaption)
    }
}

/// A classified text block from one page.
///
/// Immutable once built; the extractors read blocks but never mutate
/// them. Callers persist the derived entities (tables, figures,
/// citations), not the raw blocks.
#[derive(Debug, Clone, Serialize)]
pub struct TextBlock {
    /// Block text content
    pub text: String,
    /// Font names used in the block
    pub fonts: BTreeSet<String>,
    /// Font sizes used in the block
    pub sizes: Vec<f64>,
    /// Bounding box in page-layout coordinates
    pub bbox: BoundingBox,
    /// Zero-based page index
    pub page: usize,
    /// Classification result
    pub kind: BlockKind,
}

impl TextBlock {
    /// Largest font size in the block, or 0.0 for an empty size set.
    pub fn max_font_size(&self) -> f64 {
        self.sizes.iter().copied().fold(0.0, f64::max)
    }
}

/// Predicate deciding whether a text run is mathematical content.
///
/// The math-detection collaborator is external to this crate; the
/// classifier only needs a yes/no answer. [`DefaultMathDetector`]
/// provides a workable heuristic implementation.
pub trait MathPredicate {
    /// Return true if `text` is predominantly mathematical.
    fn is_mathematical(&self, text: &str) -> bool;
}

/// Heuristic math detector: LaTeX-like operators, equations, and
/// Greek-letter runs.
#[derive(Debug, Clone, Default)]
pub struct DefaultMathDetector;

impl MathPredicate for DefaultMathDetector {
    fn is_mathematical(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }

        // LaTeX command or explicit operators
        if trimmed.contains('\\')
            && (trimmed.contains("\\frac") || trimmed.contains("\\sum") || trimmed.contains("\\int"))
        {
            return true;
        }

        let math_symbols = trimmed
            .chars()
            .filter(|c| {
                matches!(c, '=' | '+' | '±' | '×' | '÷' | '∑' | '∫' | '√' | '≤' | '≥' | '≈' | '∞')
                    || ('\u{0391}'..='\u{03c9}').contains(c)
            })
            .count();

        // An equation-like block has a '=' or a visible symbol density
        if trimmed.contains('=') && trimmed.split_whitespace().count() <= 12 {
            return true;
        }
        math_symbols >= 3 || (math_symbols * 10 >= trimmed.chars().count() && math_symbols > 0)
    }
}

/// Compiled patterns backing the classification rules.
///
/// Built once per classifier and shared by reference; keeps the
/// process-wide constant pattern set without global mutable state.
#[derive(Debug)]
struct ClassifierPatterns {
    heading_caps: Regex,
    heading_title_case: Regex,
    reference_marker: Regex,
    figure_caption: Regex,
    table_caption: Regex,
}

impl ClassifierPatterns {
    fn compile() -> Self {
        Self {
            // Short all-caps line, optionally numbered ("3. RESULTS")
            heading_caps: Regex::new(r"^\d*\.?\s*[A-Z][A-Z\s\d.:\-]{2,60}$")
                .expect("valid heading pattern"),
            // Short title-case line of two or more words ("Experimental
            // Setup"); single capitalized words are too ambiguous
            heading_title_case: Regex::new(r"^(?:\d+\.?\d*\s+)?(?:[A-Z][a-z]+\s+){1,7}[A-Z][a-z]+$")
                .expect("valid heading pattern"),
            reference_marker: Regex::new(
                r"(?i)^\s*(?:\[\d+\]|references?|bibliography|cited references)\b",
            )
            .expect("valid reference pattern"),
            figure_caption: Regex::new(r"(?i)^\s*(?:fig\.|figure)\s*\d*\s*[:.]?")
                .expect("valid figure caption pattern"),
            table_caption: Regex::new(r"(?i)^\s*(?:table\s+\d+|tab\.\s+\d+)\s*[:.]?")
                .expect("valid table caption pattern"),
        }
    }
}

/// Rule-based text block classifier.
pub struct TextBlockClassifier<M: MathPredicate = DefaultMathDetector> {
    patterns: ClassifierPatterns,
    title_font_size: f64,
    title_max_len: usize,
    math: M,
}

impl Default for TextBlockClassifier<DefaultMathDetector> {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBlockClassifier<DefaultMathDetector> {
    /// Create a classifier with the default thresholds and math detector.
    pub fn new() -> Self {
        Self::with_math_predicate(DefaultMathDetector)
    }

    /// Create a classifier taking its title thresholds from a config.
    pub fn from_config(config: &crate::config::ExtractorConfig) -> Self {
        let mut classifier = Self::new();
        classifier.title_font_size = config.title_font_size;
        classifier.title_max_len = config.title_max_len;
        classifier
    }
}

impl<M: MathPredicate> TextBlockClassifier<M> {
    /// Create a classifier with a custom math-detection collaborator.
    pub fn with_math_predicate(math: M) -> Self {
        Self {
            patterns: ClassifierPatterns::compile(),
            title_font_size: 14.0,
            title_max_len: 100,
            math,
        }
    }

    /// Classify a text block.
    ///
    /// Rules are evaluated in fixed priority order; the first match wins
    /// and unmatched text defaults to [`BlockKind::Body`]. Pure function
    /// of its inputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use docstruct::block::{BlockKind, TextBlockClassifier};
    ///
    /// let classifier = TextBlockClassifier::new();
    /// let kind = classifier.classify("A Study of Things", &BTreeSet::new(), &[18.0]);
    /// assert_eq!(kind, BlockKind::Title);
    /// ```
    pub fn classify(&self, text: &str, _fonts: &BTreeSet<String>, sizes: &[f64]) -> BlockKind {
        let trimmed = text.trim();
        let max_size = sizes.iter().copied().fold(0.0, f64::max);

        if trimmed.len() < self.title_max_len && max_size > self.title_font_size {
            return BlockKind::Title;
        }
        if self.patterns.heading_caps.is_match(trimmed)
            || self.patterns.heading_title_case.is_match(trimmed)
        {
            return BlockKind::Heading;
        }
        if trimmed.len() >= 8 && trimmed.is_char_boundary(8) && trimmed[..8].eq_ignore_ascii_case("abstract")
        {
            return BlockKind::Abstract;
        }
        if self.patterns.reference_marker.is_match(trimmed) {
            return BlockKind::Reference;
        }
        if self.patterns.figure_caption.is_match(trimmed) {
            return BlockKind::FigureCaption;
        }
        if self.patterns.table_caption.is_match(trimmed) {
            return BlockKind::TableCaption;
        }
        if self.math.is_mathematical(trimmed) {
            return BlockKind::Math;
        }
        BlockKind::Body
    }

    /// Build a classified [`TextBlock`] from raw block data.
    pub fn classify_block(
        &self,
        text: String,
        fonts: BTreeSet<String>,
        sizes: Vec<f64>,
        bbox: BoundingBox,
        page: usize,
    ) -> TextBlock {
        let kind = self.classify(&text, &fonts, &sizes);
        TextBlock {
            text,
            fonts,
            sizes,
            bbox,
            page,
            kind,
        }
    }
}
