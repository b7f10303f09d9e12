//! Configuration for structure extraction.
//!
//! All heuristic thresholds live here so that the extractors themselves
//! stay free of magic numbers. The defaults reproduce the empirically
//! tuned values of the extraction heuristics; construct once and share by
//! reference across extractors.

/// Thresholds governing the extraction heuristics.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Font size above which a short block is considered a title (points).
    pub title_font_size: f64,

    /// Maximum text length for a block to qualify as a title.
    pub title_max_len: usize,

    /// Maximum vertical gap between consecutive blocks in one table region
    /// (layout units).
    pub table_row_gap: f64,

    /// Minimum number of blocks for a candidate table region.
    pub min_table_size: usize,

    /// Maximum number of blocks for a candidate table region.
    pub max_table_size: usize,

    /// Maximum center-to-center distance for caption linking (layout units).
    pub caption_max_distance: f64,

    /// Minimum rendered width/height for an embedded image to be kept
    /// (layout units).
    pub min_image_size: f64,

    /// Size bound above which an image is flagged as a likely full-page
    /// scan; such images are still extracted (layout units).
    pub max_image_size: f64,

    /// Maximum length of the context snippet stored on a citation.
    pub citation_context_len: usize,

    /// Minimum text length for a block to count as a bibliography entry.
    pub min_bibliography_entry_len: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorConfig {
    /// Create a configuration with the default thresholds.
    pub fn new() -> Self {
        Self {
            title_font_size: 14.0,
            title_max_len: 100,
            table_row_gap: 50.0,
            min_table_size: 3,
            max_table_size: 100,
            caption_max_distance: 200.0,
            min_image_size: 100.0,
            max_image_size: 5000.0,
            citation_context_len: 100,
            min_bibliography_entry_len: 20,
        }
    }

    /// Set the caption-linking distance cap.
    pub fn with_caption_max_distance(mut self, distance: f64) -> Self {
        self.caption_max_distance = distance;
        self
    }

    /// Set the minimum embedded-image dimension.
    pub fn with_min_image_size(mut self, size: f64) -> Self {
        self.min_image_size = size;
        self
    }

    /// Set the table region size bounds.
    pub fn with_table_size_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_table_size = min;
        self.max_table_size = max;
        self
    }
}
