//! Table region detection and structure recovery.
//!
//! Detection is purely heuristic: page blocks are grouped into candidate
//! regions by vertical proximity, regions are accepted when their text
//! looks tabular (separator characters, digits, multiple tokens, at least
//! two distinct column positions), and each accepted block becomes one
//! row split into columns by its strongest separator. Header rows,
//! merged-cell structure, and a confidence score are derived afterwards,
//! and nearby caption blocks are linked spatially.

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::block::TextBlock;
use crate::config::ExtractorConfig;
use crate::document::Document;
use crate::error::Result;
use crate::geometry::BoundingBox;
use crate::spatial::SpatialMatcher;
use crate::stats::{mean, ConfidenceDistribution, TableStatistics};

/// Structural classification of a detected table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStructureType {
    /// Consistent rows, at most 5 columns
    Simple,
    /// Consistent rows, more than 5 columns
    Complex,
    /// Inconsistent column counts across rows
    MergedCells,
}

impl TableStructureType {
    /// Stable name for histograms and serialization.
    pub fn name(&self) -> &'static str {
        match self {
            TableStructureType::Simple => "simple",
            TableStructureType::Complex => "complex",
            TableStructureType::MergedCells => "merged_cells",
        }
    }
}

/// A recovered table with rows, optional headers, and caption metadata.
#[derive(Debug, Clone, Serialize)]
pub struct TableStructure {
    /// Zero-based page index
    pub page: usize,
    /// Bounding box of the region
    pub bbox: BoundingBox,
    /// Data rows (header row removed when promoted)
    pub rows: Vec<Vec<String>>,
    /// Promoted header row, if detected
    pub headers: Option<Vec<String>>,
    /// Table number from a linked caption ("2" in "Table 2: ...")
    pub table_number: Option<String>,
    /// Linked caption text
    pub caption: Option<String>,
    /// Heuristic confidence in [0, 1]
    pub confidence: f64,
    /// Structural classification
    pub structure_type: TableStructureType,
    /// Number of data rows; equals `rows.len()`
    pub row_count: usize,
    /// Maximum row width in cells
    pub column_count: usize,
    /// Whether a header row was promoted
    pub has_headers: bool,
}

/// Compiled patterns for table caption linking and header detection.
#[derive(Debug)]
struct TablePatterns {
    /// Caption forms, tried in priority order; group 1 is the table
    /// number, group 2 the caption text
    captions: Vec<Regex>,
    header_title_case: Regex,
    header_all_caps: Regex,
    header_all_lower: Regex,
    multi_space: Regex,
}

/// Common header-cell keywords.
const HEADER_KEYWORDS: [&str; 8] = [
    "name", "type", "value", "date", "time", "id", "code", "description",
];

impl TablePatterns {
    fn compile() -> Self {
        Self {
            captions: vec![
                Regex::new(r"(?i)^Table\s+(\d+)\s*[:.]?\s*(.*)$").expect("valid caption pattern"),
                Regex::new(r"(?i)^Tab\.\s+(\d+)\s*[:.]?\s*(.*)$").expect("valid caption pattern"),
                Regex::new(r"^(\d+)\.\s*(.+)$").expect("valid caption pattern"),
            ],
            header_title_case: Regex::new(r"^[A-Z][a-z]*(?:\s+[A-Z][a-z]*)*$")
                .expect("valid header pattern"),
            header_all_caps: Regex::new(r"^[A-Z][A-Z\s\d]*$").expect("valid header pattern"),
            header_all_lower: Regex::new(r"^[a-z][a-z\s]*$").expect("valid header pattern"),
            multi_space: Regex::new(r"\s{3,}").expect("valid separator pattern"),
        }
    }
}

/// Detects table regions in classified page blocks.
pub struct TableRegionDetector {
    config: ExtractorConfig,
    matcher: SpatialMatcher,
    patterns: TablePatterns,
}

impl Default for TableRegionDetector {
    fn default() -> Self {
        Self::new(ExtractorConfig::new())
    }
}

impl TableRegionDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        let matcher = SpatialMatcher::new(config.caption_max_distance);
        Self {
            config,
            matcher,
            patterns: TablePatterns::compile(),
        }
    }

    /// Extract tables from every page of a document.
    ///
    /// Pages are processed independently; a page with no table-like
    /// regions contributes nothing and no page can abort the document.
    pub fn extract_tables(&self, doc: &Document) -> Result<Vec<TableStructure>> {
        let classifier = crate::block::TextBlockClassifier::from_config(&self.config);
        let mut tables = Vec::new();

        for (page_idx, page) in doc.pages.iter().enumerate() {
            let blocks: Vec<TextBlock> = page
                .blocks
                .iter()
                .map(|raw| {
                    classifier.classify_block(
                        raw.text.clone(),
                        std::iter::once(raw.font.clone()).collect(),
                        vec![raw.size],
                        raw.bbox,
                        page_idx,
                    )
                })
                .collect();

            tables.extend(self.detect_on_page(&blocks, page_idx));
        }

        debug!("Detected {} tables across {} pages", tables.len(), doc.page_count());
        Ok(tables)
    }

    /// Detect tables among the classified blocks of one page.
    ///
    /// Deterministic: re-running on the same block list yields identical
    /// rows. Zero accepted regions yields an empty vector, not an error.
    pub fn detect_on_page(&self, blocks: &[TextBlock], page: usize) -> Vec<TableStructure> {
        let mut sorted: Vec<&TextBlock> = blocks.iter().collect();
        sorted.sort_by(|a, b| a.bbox.y0.partial_cmp(&b.bbox.y0).unwrap_or(std::cmp::Ordering::Equal));

        let mut tables = Vec::new();
        for region in self.group_regions(&sorted) {
            if region.len() < self.config.min_table_size || region.len() > self.config.max_table_size
            {
                continue;
            }
            if !self.looks_like_table(&region) {
                continue;
            }
            tables.push(self.build_table(&region, page));
        }

        self.link_captions(&mut tables, blocks);
        tables
    }

    /// Greedily group y-sorted blocks into vertically contiguous regions.
    fn group_regions<'a>(&self, sorted: &[&'a TextBlock]) -> Vec<Vec<&'a TextBlock>> {
        let mut regions = Vec::new();
        let mut current: Vec<&TextBlock> = Vec::new();

        for &block in sorted {
            match current.last() {
                Some(prev) if (block.bbox.y0 - prev.bbox.y0).abs() < self.config.table_row_gap => {
                    current.push(block);
                }
                Some(_) => {
                    regions.push(std::mem::take(&mut current));
                    current.push(block);
                }
                None => current.push(block),
            }
        }
        if !current.is_empty() {
            regions.push(current);
        }
        regions
    }

    /// Region acceptance: at least two distinct column positions and a
    /// tabular-looking majority of blocks.
    fn looks_like_table(&self, region: &[&TextBlock]) -> bool {
        let mut column_positions: Vec<i64> =
            region.iter().map(|b| b.bbox.x0.round() as i64).collect();
        column_positions.sort_unstable();
        column_positions.dedup();
        if column_positions.len() < 2 {
            return false;
        }

        let tabular_score = region
            .iter()
            .filter(|b| {
                let text = b.text.as_str();
                text.contains('\t')
                    || text.contains('|')
                    || text.contains(';')
                    || text.contains(',')
                    || text.chars().any(|c| c.is_ascii_digit())
                    || text.split_whitespace().count() >= 2
            })
            .count();

        // At least half the blocks must look tabular
        tabular_score * 2 >= region.len()
    }

    fn build_table(&self, region: &[&TextBlock], page: usize) -> TableStructure {
        let mut rows: Vec<Vec<String>> =
            region.iter().map(|b| self.split_columns(&b.text)).collect();

        let headers = if self.first_row_is_header(&rows) {
            Some(rows.remove(0))
        } else {
            None
        };

        let row_count = rows.len();
        let column_count = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let uniform = rows.iter().all(|r| r.len() == column_count);

        let structure_type = if !uniform {
            TableStructureType::MergedCells
        } else if column_count > 5 {
            TableStructureType::Complex
        } else {
            TableStructureType::Simple
        };

        let mut confidence: f64 = 0.5;
        if row_count >= 3 && column_count >= 2 {
            confidence += 0.2;
        }
        if headers.is_some() {
            confidence += 0.1;
        }
        confidence += match structure_type {
            TableStructureType::Simple => 0.1,
            TableStructureType::Complex => 0.05,
            TableStructureType::MergedCells => 0.0,
        };
        if uniform {
            confidence += 0.1;
        }
        confidence = confidence.min(1.0);

        let bbox = region
            .iter()
            .skip(1)
            .fold(region[0].bbox, |acc, b| acc.union(&b.bbox));

        TableStructure {
            page,
            bbox,
            has_headers: headers.is_some(),
            headers,
            table_number: None,
            caption: None,
            confidence,
            structure_type,
            row_count,
            column_count,
            rows,
        }
    }

    /// Split one row of text into cells.
    ///
    /// Separators are tried in priority order: tab, pipe, runs of three
    /// or more spaces, comma (when at least two are present), then single
    /// spaces.
    fn split_columns(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.contains('\t') {
            return trimmed.split('\t').map(|c| c.trim().to_string()).collect();
        }
        if trimmed.contains('|') {
            return trimmed
                .split('|')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if self.patterns.multi_space.is_match(trimmed) {
            return self
                .patterns
                .multi_space
                .split(trimmed)
                .map(|c| c.trim().to_string())
                .collect();
        }
        if trimmed.matches(',').count() >= 2 {
            return trimmed.split(',').map(|c| c.trim().to_string()).collect();
        }
        trimmed.split_whitespace().map(|c| c.to_string()).collect()
    }

    /// First-row header promotion: at least half the cells must match a
    /// header casing pattern or contain a common header keyword.
    fn first_row_is_header(&self, rows: &[Vec<String>]) -> bool {
        let Some(first) = rows.first() else {
            return false;
        };
        if first.is_empty() {
            return false;
        }

        let header_like = first
            .iter()
            .filter(|cell| {
                let cell = cell.trim();
                let lower = cell.to_lowercase();
                self.patterns.header_title_case.is_match(cell)
                    || self.patterns.header_all_caps.is_match(cell)
                    || self.patterns.header_all_lower.is_match(cell)
                    || HEADER_KEYWORDS.iter().any(|kw| lower.contains(kw))
            })
            .count();

        header_like * 2 >= first.len()
    }

    /// Attach the nearest same-page table caption to each table.
    fn link_captions(&self, tables: &mut [TableStructure], blocks: &[TextBlock]) {
        if tables.is_empty() {
            return;
        }

        let candidates: Vec<(&TextBlock, &str, String, String)> = blocks
            .iter()
            .filter_map(|b| {
                let trimmed = b.text.trim();
                for pattern in &self.patterns.captions {
                    if let Some(caps) = pattern.captures(trimmed) {
                        let number = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
                        let text = caps
                            .get(2)
                            .map(|m| m.as_str().trim().to_string())
                            .unwrap_or_default();
                        return Some((b, trimmed, number, text));
                    }
                }
                None
            })
            .collect();

        if candidates.is_empty() {
            return;
        }

        let candidate_boxes: Vec<BoundingBox> = candidates.iter().map(|(b, ..)| b.bbox).collect();
        for table in tables.iter_mut() {
            if let Some(idx) = self.matcher.match_nearest(&table.bbox, &candidate_boxes) {
                let (_, full, number, text) = &candidates[idx];
                table.table_number = Some(number.clone());
                table.caption = Some(if text.is_empty() {
                    (*full).to_string()
                } else {
                    text.clone()
                });
                table.confidence = (table.confidence + 0.2).min(1.0);
            }
        }
    }

    /// Aggregate statistics over a set of extracted tables.
    pub fn statistics(&self, tables: &[TableStructure]) -> TableStatistics {
        let confidences: Vec<f64> = tables.iter().map(|t| t.confidence).collect();
        let mut by_structure = std::collections::HashMap::new();
        for table in tables {
            *by_structure
                .entry(table.structure_type.name().to_string())
                .or_insert(0) += 1;
        }

        TableStatistics {
            total: tables.len(),
            with_headers: tables.iter().filter(|t| t.has_headers).count(),
            by_structure,
            average_rows: mean(&tables.iter().map(|t| t.row_count as f64).collect::<Vec<_>>()),
            average_columns: mean(&tables.iter().map(|t| t.column_count as f64).collect::<Vec<_>>()),
            average_confidence: mean(&confidences),
            confidence: ConfidenceDistribution::from_scores(confidences),
        }
    }
}
