//! Citation extraction and bibliographic metadata recovery.
//!
//! Three independent pattern families scan page text: in-text
//! author-year forms, numbered/lettered footnotes, and bibliography
//! entries. A page whose text mentions a references-section keyword
//! contributes its entry-like blocks as bibliography citations.
//! Each citation then goes through independent metadata passes (authors,
//! year, DOI, URL, title, journal), is confidence-scored, and the whole
//! set is deduplicated on normalized text, first occurrence winning.

use std::collections::HashSet;

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::config::ExtractorConfig;
use crate::document::Document;
use crate::error::Result;
use crate::stats::{mean, CitationStatistics, ConfidenceDistribution};

/// Keywords marking a references section.
const SECTION_KEYWORDS: [&str; 7] = [
    "references",
    "bibliography",
    "works cited",
    "literature cited",
    "sources",
    "citations",
    "further reading",
];

/// Leading words that disqualify an italic span from being a journal.
const ARTICLE_WORDS: [&str; 7] = ["the", "a", "an", "in", "on", "of", "and"];

/// Where a citation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationType {
    /// Parenthetical or bracketed reference in running text
    InText,
    /// Numbered or lettered footnote
    Footnote,
    /// Entry in the references section
    Bibliography,
}

impl CitationType {
    /// Stable name for histograms and serialization.
    pub fn name(&self) -> &'static str {
        match self {
            CitationType::InText => "in_text",
            CitationType::Footnote => "footnote",
            CitationType::Bibliography => "bibliography",
        }
    }
}

/// A citation with extracted bibliographic metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    /// Raw citation text
    pub text: String,
    /// Where the citation was found
    pub citation_type: CitationType,
    /// Author names in order of appearance
    pub authors: Vec<String>,
    /// Work title, when quoted or emphasized
    pub title: Option<String>,
    /// Publication year
    pub year: Option<String>,
    /// Journal name from an emphasis span
    pub journal: Option<String>,
    /// DOI
    pub doi: Option<String>,
    /// URL
    pub url: Option<String>,
    /// Zero-based page index, when known
    pub page: Option<usize>,
    /// Heuristic confidence in [0, 1]
    pub confidence: f64,
    /// Truncated snippet of surrounding text
    pub context: Option<String>,
}

/// Ordered collection of citations plus references-section metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Bibliography {
    /// Deduplicated citations in order of first appearance
    pub citations: Vec<Citation>,
    /// Heading text of the detected references section
    pub section_title: Option<String>,
    /// Page of the detected references section
    pub section_page: Option<usize>,
    /// Confidence that a references section was found
    pub confidence: f64,
}

impl Bibliography {
    /// Number of citations.
    pub fn len(&self) -> usize {
        self.citations.len()
    }

    /// True when no citations were found.
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }
}

/// Output format for [`format_citations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationFormat {
    /// Numbered markdown reference list
    Markdown,
    /// BibTeX entries keyed by `{LastName}{Year}`
    Bibtex,
}

struct CitationPatterns {
    // Detection families
    in_text_paren: Regex,
    in_text_bracket: Regex,
    in_text_narrative: Regex,
    footnote: Regex,
    bib_entry_leads: Vec<Regex>,
    // Bibliography-block qualification
    author_like: Regex,
    // Metadata passes
    emphasis_span: Regex,
    author_first_last: Regex,
    author_last_initial: Regex,
    year: Regex,
    doi: Regex,
    url: Regex,
    titles: Vec<Regex>,
    journals: Vec<Regex>,
}

impl CitationPatterns {
    fn compile() -> Self {
        Self {
            in_text_paren: Regex::new(
                r"\(([A-Z][A-Za-z]+(?:\s+(?:et\s+al\.?|and\s+[A-Z][A-Za-z]+))?,?\s*(?:19|20)\d{2}[a-z]?)\)",
            )
            .expect("valid in-text pattern"),
            in_text_bracket: Regex::new(r"\[(\d+(?:\s*[,-]\s*\d+)*)\]").expect("valid in-text pattern"),
            in_text_narrative: Regex::new(
                r"[A-Z][a-z]+\s+(?:et\s+al\.|and\s+[A-Z][a-z]+),?\s*\(?(?:19|20)\d{2}\)?",
            )
            .expect("valid in-text pattern"),
            footnote: Regex::new(r"(?m)^\s*(?:\d{1,3}|[a-z])[.)]\s+\S.*$").expect("valid footnote pattern"),
            bib_entry_leads: vec![
                Regex::new(r"(?m)^\s*\[\d+\]\s+.+$").expect("valid bibliography pattern"),
                Regex::new(r"(?m)^\s*[A-Z][a-z]+,\s+[A-Z]\..*$").expect("valid bibliography pattern"),
            ],
            author_like: Regex::new(r"[A-Z][a-z]+,?\s+(?:[A-Z]\.|[A-Z][a-z]+)")
                .expect("valid author pattern"),
            emphasis_span: Regex::new(r#""[^"]*"|\*[^*]*\*|_[^_]*_"#).expect("valid span pattern"),
            author_first_last: Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b")
                .expect("valid author pattern"),
            author_last_initial: Regex::new(r"\b[A-Z][a-z]+,\s*[A-Z]\.").expect("valid author pattern"),
            year: Regex::new(r"\b((?:19|20)\d{2})\b").expect("valid year pattern"),
            doi: Regex::new(r"10\.\d{4,}/[-._;()/:\w]+").expect("valid doi pattern"),
            url: Regex::new(r"https?://\S+").expect("valid url pattern"),
            titles: vec![
                Regex::new(r#""([^"]{4,})""#).expect("valid title pattern"),
                Regex::new(r"'([^']{4,})'").expect("valid title pattern"),
                Regex::new(r"\*\*([^*]{4,})\*\*").expect("valid title pattern"),
                Regex::new(r"\*([^*]{4,})\*").expect("valid title pattern"),
            ],
            journals: vec![
                Regex::new(r"\*([^*]{4,})\*").expect("valid journal pattern"),
                Regex::new(r"_([^_]{4,})_").expect("valid journal pattern"),
            ],
        }
    }
}

/// Extracts citations and recovers bibliographic metadata.
pub struct CitationExtractor {
    config: ExtractorConfig,
    patterns: CitationPatterns,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::new())
    }
}

impl CitationExtractor {
    /// Create an extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            patterns: CitationPatterns::compile(),
        }
    }

    /// Extract a deduplicated [`Bibliography`] from a document.
    pub fn extract_citations(&self, doc: &Document) -> Result<Bibliography> {
        let mut citations = Vec::new();
        let mut bibliography = Bibliography::default();

        for (page_idx, page) in doc.pages.iter().enumerate() {
            let text = page.page_text();
            citations.extend(self.extract_from_text(&text, page_idx));

            if bibliography.section_page.is_none() {
                if let Some(title) = self.detect_section(&text) {
                    bibliography.section_title = Some(title);
                    bibliography.section_page = Some(page_idx);
                    bibliography.confidence = 0.8;
                    citations.extend(self.extract_section_entries(page, page_idx));
                }
            }
        }

        bibliography.citations = self.deduplicate(citations);
        debug!(
            "Extracted {} citations (section: {:?})",
            bibliography.citations.len(),
            bibliography.section_title
        );
        Ok(bibliography)
    }

    /// Run the three detection families over one page's text.
    pub fn extract_from_text(&self, text: &str, page: usize) -> Vec<Citation> {
        let mut citations = Vec::new();

        for m in self.patterns.in_text_paren.find_iter(text) {
            citations.push(self.build_citation(m.as_str(), CitationType::InText, page, text, m.start()));
        }
        for m in self.patterns.in_text_bracket.find_iter(text) {
            citations.push(self.build_citation(m.as_str(), CitationType::InText, page, text, m.start()));
        }
        for m in self.patterns.in_text_narrative.find_iter(text) {
            citations.push(self.build_citation(m.as_str(), CitationType::InText, page, text, m.start()));
        }
        for m in self.patterns.footnote.find_iter(text) {
            citations.push(self.build_citation(m.as_str(), CitationType::Footnote, page, text, m.start()));
        }
        for pattern in &self.patterns.bib_entry_leads {
            for m in pattern.find_iter(text) {
                citations.push(self.build_citation(
                    m.as_str(),
                    CitationType::Bibliography,
                    page,
                    text,
                    m.start(),
                ));
            }
        }

        citations
    }

    /// Detect a references-section heading in page text.
    fn detect_section(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        SECTION_KEYWORDS
            .iter()
            .find(|kw| lower.contains(*kw))
            .map(|kw| {
                // Prefer the actual heading line over the bare keyword
                text.lines()
                    .find(|line| line.to_lowercase().contains(*kw))
                    .map(|line| line.trim().to_string())
                    .unwrap_or_else(|| (*kw).to_string())
            })
    }

    /// Pull entry-like blocks off the detected references page.
    fn extract_section_entries(
        &self,
        page: &crate::document::PageContent,
        page_idx: usize,
    ) -> Vec<Citation> {
        page.blocks
            .iter()
            .filter(|b| {
                let text = b.text.trim();
                text.len() >= self.config.min_bibliography_entry_len
                    && self.looks_like_entry(text)
            })
            .map(|b| {
                let text = b.text.trim();
                self.build_citation(text, CitationType::Bibliography, page_idx, text, 0)
            })
            .collect()
    }

    /// Entry qualification: an author pattern plus a year or an
    /// emphasis/quote marker.
    fn looks_like_entry(&self, text: &str) -> bool {
        if !self.patterns.author_like.is_match(text) {
            return false;
        }
        self.patterns.year.is_match(text)
            || text.contains('"')
            || text.contains('*')
            || text.contains('_')
    }

    /// Build a citation stub and run the metadata passes.
    fn build_citation(
        &self,
        text: &str,
        citation_type: CitationType,
        page: usize,
        source: &str,
        offset: usize,
    ) -> Citation {
        let mut citation = Citation {
            text: text.to_string(),
            citation_type,
            authors: Vec::new(),
            title: None,
            year: None,
            journal: None,
            doi: None,
            url: None,
            page: Some(page),
            confidence: 0.0,
            context: Some(snippet(source, offset, self.config.citation_context_len)),
        };

        self.enrich(&mut citation);
        citation.confidence = self.score(&citation);
        citation
    }

    /// Independent metadata passes; within each field the first matching
    /// pattern wins.
    fn enrich(&self, citation: &mut Citation) {
        let text = citation.text.clone();

        // Quoted titles and emphasized journal names would pass for
        // "First Last" author names; match authors on the remainder
        let stripped = self.patterns.emphasis_span.replace_all(&text, " ");
        let first_last: Vec<String> = self
            .patterns
            .author_first_last
            .find_iter(&stripped)
            .map(|m| m.as_str().to_string())
            .collect();
        if !first_last.is_empty() {
            citation.authors = first_last;
        } else {
            citation.authors = self
                .patterns
                .author_last_initial
                .find_iter(&stripped)
                .map(|m| m.as_str().to_string())
                .collect();
        }

        citation.year = self
            .patterns
            .year
            .captures(&text)
            .map(|c| c[1].to_string());
        citation.doi = self.patterns.doi.find(&text).map(|m| m.as_str().to_string());
        citation.url = self.patterns.url.find(&text).map(|m| m.as_str().to_string());

        citation.title = self
            .patterns
            .titles
            .iter()
            .find_map(|p| p.captures(&text))
            .map(|c| c[1].trim().to_string());

        citation.journal = self
            .patterns
            .journals
            .iter()
            .find_map(|p| p.captures(&text))
            .map(|c| c[1].trim().to_string())
            .filter(|j| {
                let first_word = j.split_whitespace().next().unwrap_or("").to_lowercase();
                j.len() >= 4 && !ARTICLE_WORDS.contains(&first_word.as_str())
            });
    }

    /// Weighted additive confidence, capped at 1.0.
    fn score(&self, citation: &Citation) -> f64 {
        let mut confidence: f64 = 0.3;
        if !citation.authors.is_empty() {
            confidence += 0.2;
        }
        if citation.year.is_some() {
            confidence += 0.2;
        }
        if citation.title.is_some() {
            confidence += 0.15;
        }
        if citation.journal.is_some() {
            confidence += 0.1;
        }
        if citation.doi.is_some() {
            confidence += 0.1;
        }
        confidence += match citation.citation_type {
            CitationType::Bibliography => 0.1,
            CitationType::InText => 0.05,
            CitationType::Footnote => 0.0,
        };
        confidence.min(1.0)
    }

    /// Drop citations whose normalized text was already seen.
    fn deduplicate(&self, citations: Vec<Citation>) -> Vec<Citation> {
        let mut seen = HashSet::new();
        citations
            .into_iter()
            .filter(|c| {
                let normalized = c.text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
                seen.insert(normalized)
            })
            .collect()
    }

    /// Aggregate statistics over a bibliography.
    pub fn statistics(&self, bibliography: &Bibliography) -> CitationStatistics {
        let citations = &bibliography.citations;
        let confidences: Vec<f64> = citations.iter().map(|c| c.confidence).collect();
        let mut by_type = std::collections::HashMap::new();
        for citation in citations {
            *by_type
                .entry(citation.citation_type.name().to_string())
                .or_insert(0) += 1;
        }

        CitationStatistics {
            total: citations.len(),
            by_type,
            with_year: citations.iter().filter(|c| c.year.is_some()).count(),
            with_doi: citations.iter().filter(|c| c.doi.is_some()).count(),
            average_confidence: mean(&confidences),
            confidence: ConfidenceDistribution::from_scores(confidences),
        }
    }
}

/// Serialize a bibliography to markdown or BibTeX.
pub fn format_citations(bibliography: &Bibliography, format: CitationFormat) -> String {
    match format {
        CitationFormat::Markdown => {
            let mut out = String::from("## References\n\n");
            for (i, citation) in bibliography.citations.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, citation.text));
            }
            out
        }
        CitationFormat::Bibtex => {
            let mut out = String::new();
            for citation in &bibliography.citations {
                out.push_str(&bibtex_entry(citation));
                out.push('\n');
            }
            out
        }
    }
}

/// Render one citation as a BibTeX `@article` entry.
fn bibtex_entry(citation: &Citation) -> String {
    let key = match (citation.authors.first(), citation.year.as_deref()) {
        (Some(author), Some(year)) => format!("{}{}", last_name(author), year),
        _ => "UnknownAuthorUnknown".to_string(),
    };

    let mut fields = Vec::new();
    if !citation.authors.is_empty() {
        fields.push(format!("  author = {{{}}}", citation.authors.join(" and ")));
    }
    if let Some(title) = &citation.title {
        fields.push(format!("  title = {{{}}}", title));
    }
    if let Some(year) = &citation.year {
        fields.push(format!("  year = {{{}}}", year));
    }
    if let Some(journal) = &citation.journal {
        fields.push(format!("  journal = {{{}}}", journal));
    }
    if let Some(doi) = &citation.doi {
        fields.push(format!("  doi = {{{}}}", doi));
    }
    if let Some(url) = &citation.url {
        fields.push(format!("  url = {{{}}}", url));
    }

    format!("@article{{{},\n{}\n}}\n", key, fields.join(",\n"))
}

/// Last name of an author in either "First Last" or "Last, F." form.
fn last_name(author: &str) -> String {
    if let Some((last, _)) = author.split_once(',') {
        last.trim().to_string()
    } else {
        author
            .split_whitespace()
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}

/// Char-boundary-safe snippet of `limit` chars centered on `offset`.
fn snippet(source: &str, offset: usize, limit: usize) -> String {
    let half = limit / 2;
    let start_target = offset.saturating_sub(half);
    let mut start = start_target.min(source.len());
    while start > 0 && !source.is_char_boundary(start) {
        start -= 1;
    }

    source[start..]
        .chars()
        .take(limit)
        .collect::<String>()
        .trim()
        .to_string()
}
