//! Figure extraction: embedded images paired with nearby captions.
//!
//! Embedded images are filtered by rendered size, persisted under a
//! deterministic filename, scored for quality from their decoded
//! dimensions and file size, and linked to the nearest qualifying
//! caption block on the same page. A failure on one image is logged and
//! skipped; it never aborts the page.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;

use crate::config::ExtractorConfig;
use crate::document::{Document, EmbeddedImage, PageContent};
use crate::error::{Error, Result};
use crate::geometry::BoundingBox;
use crate::spatial::SpatialMatcher;
use crate::stats::{mean, ConfidenceDistribution, FigureStatistics};

/// Image extensions persisted as-is; anything else is re-encoded to PNG.
const SUPPORTED_FORMATS: [&str; 7] = ["png", "jpg", "jpeg", "tiff", "tif", "bmp", "gif"];

/// An extracted figure with optional caption metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    /// Zero-based page index
    pub page: usize,
    /// Rendered bounding box on the page
    pub bbox: BoundingBox,
    /// Path the image was written to; set once, never reassigned
    pub image_path: Option<PathBuf>,
    /// Linked caption text
    pub caption: Option<String>,
    /// Figure number from the caption, or sequentially assigned
    pub figure_number: Option<String>,
    /// Heuristic quality confidence in [0, 1]
    pub confidence: f64,
    /// Decoded pixel width, when readable
    pub width: Option<u32>,
    /// Decoded pixel height, when readable
    pub height: Option<u32>,
    /// Size of the written file in bytes
    pub file_size: Option<u64>,
    /// Normalized image format ("png", "jpeg", ...)
    pub format: Option<String>,
}

/// A caption candidate found in page text.
#[derive(Debug, Clone, Serialize)]
pub struct CaptionCandidate {
    /// Caption body text
    pub text: String,
    /// Figure number captured from the pattern, if any
    pub number: Option<String>,
    /// Bounding box of the source block
    pub bbox: BoundingBox,
    /// Pattern confidence (0.8 numbered forms, 0.4 generic sentence)
    pub confidence: f64,
}

struct FigurePatterns {
    /// Numbered caption forms, tried in priority order; group 1 is the
    /// figure number, group 2 the caption text
    numbered: Vec<Regex>,
    /// Generic capitalized sentence fallback
    sentence: Regex,
}

impl FigurePatterns {
    fn compile() -> Self {
        Self {
            numbered: vec![
                Regex::new(r"(?i)^Figure\s+(\d+)\s*[:.]\s*(.+)$").expect("valid caption pattern"),
                Regex::new(r"(?i)^Fig\.\s+(\d+)\s*[:.]\s*(.+)$").expect("valid caption pattern"),
                Regex::new(r"^(\d+)\.\s*(.+)$").expect("valid caption pattern"),
            ],
            sentence: Regex::new(r"^[A-Z].{9,199}$").expect("valid sentence pattern"),
        }
    }
}

/// Extracts embedded images and pairs them with captions.
pub struct FigureExtractor {
    config: ExtractorConfig,
    matcher: SpatialMatcher,
    patterns: FigurePatterns,
}

impl Default for FigureExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::new())
    }
}

impl FigureExtractor {
    /// Create an extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        let matcher = SpatialMatcher::new(config.caption_max_distance);
        Self {
            config,
            matcher,
            patterns: FigurePatterns::compile(),
        }
    }

    /// Extract all figures from a document, writing image files to
    /// `output_dir` as `{stem}_page{N}_img{K}.{ext}`.
    ///
    /// Per-image failures are logged and skipped. After all pages are
    /// processed, figures are sorted by `(page, y0, x0)` and any figure
    /// without a caption-derived number receives a sequential one.
    pub fn extract_figures(&self, doc: &Document, output_dir: &Path) -> Result<Vec<Figure>> {
        fs::create_dir_all(output_dir)?;

        let mut figures = Vec::new();
        for (page_idx, page) in doc.pages.iter().enumerate() {
            figures.extend(self.extract_page_figures(doc, page, page_idx, output_dir));
        }

        Self::renumber(&mut figures);
        debug!("Extracted {} figures from {}", figures.len(), doc.stem);
        Ok(figures)
    }

    /// Extract the figures of one page and link captions.
    fn extract_page_figures(
        &self,
        doc: &Document,
        page: &PageContent,
        page_idx: usize,
        output_dir: &Path,
    ) -> Vec<Figure> {
        let mut figures = Vec::new();

        for (img_idx, image) in page.images.iter().enumerate() {
            let (w, h) = (image.bbox.width(), image.bbox.height());
            if w < self.config.min_image_size || h < self.config.min_image_size {
                debug!("Skipping small image {} on page {} ({}x{})", img_idx, page_idx, w, h);
                continue;
            }
            // Oversized images are still extracted, just flagged; they are
            // usually full-page scans rather than figures
            if w > self.config.max_image_size || h > self.config.max_image_size {
                debug!(
                    "Image {} on page {} exceeds the size bound ({}x{})",
                    img_idx, page_idx, w, h
                );
            }

            match self.persist_image(doc, image, page_idx, img_idx, output_dir) {
                Ok(figure) => figures.push(figure),
                Err(err) => {
                    warn!(
                        "Failed to extract image {} on page {}: {}",
                        img_idx, page_idx, err
                    );
                }
            }
        }

        let captions = self.find_caption_candidates(page);
        self.link_captions(&mut figures, &captions);
        figures
    }

    /// Write one embedded image and build its scored [`Figure`].
    fn persist_image(
        &self,
        doc: &Document,
        image: &EmbeddedImage,
        page_idx: usize,
        img_idx: usize,
        output_dir: &Path,
    ) -> Result<Figure> {
        let ext = normalize_format(&image.ext);
        let filename = format!("{}_page{}_img{}.{}", doc.stem, page_idx + 1, img_idx + 1, ext);
        let path = output_dir.join(filename);

        let source = image.ext.trim_start_matches('.').to_lowercase();
        if SUPPORTED_FORMATS.contains(&source.as_str()) {
            fs::write(&path, &image.data)?;
        } else {
            // Unsupported container format: re-encode to PNG
            let decoded = image::load_from_memory(&image.data)
                .map_err(|e| Error::Image(format!("decode failed: {e}")))?;
            decoded
                .save(&path)
                .map_err(|e| Error::Image(format!("re-encode failed: {e}")))?;
        }

        // Read-back failures are tolerated; a partially written file still
        // yields a figure, just without dimensions
        let dimensions = image::image_dimensions(&path).ok();
        let file_size = fs::metadata(&path).map(|m| m.len()).ok();
        let confidence = quality_confidence(dimensions, file_size, &ext);

        Ok(Figure {
            page: page_idx,
            bbox: image.bbox,
            image_path: Some(path),
            caption: None,
            figure_number: None,
            confidence,
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            file_size,
            format: Some(ext),
        })
    }

    /// Scan page blocks for caption candidates, in pattern priority order.
    pub fn find_caption_candidates(&self, page: &PageContent) -> Vec<CaptionCandidate> {
        let mut candidates = Vec::new();

        for block in &page.blocks {
            let trimmed = block.text.trim();
            let numbered = self.patterns.numbered.iter().find_map(|p| p.captures(trimmed));

            if let Some(caps) = numbered {
                candidates.push(CaptionCandidate {
                    text: caps
                        .get(2)
                        .map(|m| m.as_str().trim().to_string())
                        .unwrap_or_default(),
                    number: caps.get(1).map(|m| m.as_str().to_string()),
                    bbox: block.bbox,
                    confidence: 0.8,
                });
            } else if self.patterns.sentence.is_match(trimmed) {
                candidates.push(CaptionCandidate {
                    text: trimmed.to_string(),
                    number: None,
                    bbox: block.bbox,
                    confidence: 0.4,
                });
            }
        }

        candidates
    }

    /// Link each figure to the nearest same-page caption within range.
    fn link_captions(&self, figures: &mut [Figure], captions: &[CaptionCandidate]) {
        if captions.is_empty() {
            return;
        }

        let caption_boxes: Vec<BoundingBox> = captions.iter().map(|c| c.bbox).collect();
        for figure in figures.iter_mut() {
            if let Some(idx) = self.matcher.match_nearest(&figure.bbox, &caption_boxes) {
                let caption = &captions[idx];
                figure.caption = Some(caption.text.clone());
                figure.figure_number = caption.number.clone();
                figure.confidence = (figure.confidence + 0.2).min(1.0);
            }
        }
    }

    /// Sort by reading position and fill in missing figure numbers.
    fn renumber(figures: &mut [Figure]) {
        figures.sort_by(|a, b| {
            a.page
                .cmp(&b.page)
                .then(a.bbox.y0.partial_cmp(&b.bbox.y0).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(std::cmp::Ordering::Equal))
        });

        for (i, figure) in figures.iter_mut().enumerate() {
            if figure.figure_number.is_none() {
                figure.figure_number = Some((i + 1).to_string());
            }
        }
    }

    /// Aggregate statistics over a set of extracted figures.
    pub fn statistics(&self, figures: &[Figure]) -> FigureStatistics {
        let confidences: Vec<f64> = figures.iter().map(|f| f.confidence).collect();
        let mut by_format = std::collections::HashMap::new();
        for figure in figures {
            if let Some(format) = &figure.format {
                *by_format.entry(format.clone()).or_insert(0) += 1;
            }
        }

        FigureStatistics {
            total: figures.len(),
            with_captions: figures.iter().filter(|f| f.caption.is_some()).count(),
            by_format,
            average_confidence: mean(&confidences),
            confidence: ConfidenceDistribution::from_scores(confidences),
        }
    }
}

/// Normalize an extension hint to a canonical lowercase format.
fn normalize_format(ext: &str) -> String {
    let lower = ext.trim_start_matches('.').to_lowercase();
    if lower == "tif" {
        return "tiff".to_string();
    }
    if SUPPORTED_FORMATS.contains(&lower.as_str()) {
        lower
    } else {
        "png".to_string()
    }
}

/// Quality confidence from decoded dimensions, file size, and format.
fn quality_confidence(dimensions: Option<(u32, u32)>, file_size: Option<u64>, format: &str) -> f64 {
    let mut confidence: f64 = 0.5;

    if let Some((w, h)) = dimensions {
        if w >= 300 && h >= 300 {
            confidence += 0.2;
        } else if w >= 100 && h >= 100 {
            confidence += 0.1;
        }
    }

    match format {
        "png" | "tiff" => confidence += 0.1,
        "jpg" | "jpeg" => confidence += 0.05,
        _ => {}
    }

    if let Some(size) = file_size {
        if (1024..=10 * 1024 * 1024).contains(&size) {
            confidence += 0.1;
        } else if size < 1024 {
            confidence -= 0.1;
        }
    }

    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawBlock;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        // Gradient content keeps the encoded file above the 1KB floor that
        // the size bonus requires
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 251) as u8, (y % 241) as u8, ((x * y) % 239) as u8, 255])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .expect("png encoding");
        bytes
    }

    fn doc_with_figure() -> Document {
        let page = PageContent::new()
            .with_block(RawBlock::new(
                "Fig. 1: Sample figure",
                BoundingBox::new(0.0, 310.0, 300.0, 322.0),
                "Times",
                9.0,
            ))
            .with_image(EmbeddedImage::new(
                png_bytes(400, 400),
                "png",
                BoundingBox::new(0.0, 0.0, 300.0, 300.0),
            ));
        Document::new("sample").with_page(page)
    }

    #[test]
    fn test_end_to_end_figure_with_caption() {
        let dir = tempfile::tempdir().expect("tempdir");
        let extractor = FigureExtractor::default();
        let figures = extractor
            .extract_figures(&doc_with_figure(), dir.path())
            .expect("extraction");

        assert_eq!(figures.len(), 1);
        let figure = &figures[0];
        assert_eq!(figure.caption.as_deref(), Some("Sample figure"));
        assert_eq!(figure.figure_number.as_deref(), Some("1"));
        assert_eq!(figure.width, Some(400));
        assert_eq!(figure.height, Some(400));
        assert_eq!(figure.format.as_deref(), Some("png"));
        // base 0.5 + 0.2 size + 0.1 png + 0.1 file size + 0.2 caption, capped
        assert!((figure.confidence - 1.0).abs() < 1e-9);

        let path = figure.image_path.as_ref().expect("path");
        assert!(path.ends_with("sample_page1_img1.png"));
        assert!(path.exists());
    }

    #[test]
    fn test_small_images_are_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let page = PageContent::new().with_image(EmbeddedImage::new(
            png_bytes(50, 50),
            "png",
            BoundingBox::new(0.0, 0.0, 50.0, 50.0),
        ));
        let doc = Document::new("tiny").with_page(page);

        let extractor = FigureExtractor::default();
        let figures = extractor.extract_figures(&doc, dir.path()).expect("extraction");
        assert!(figures.is_empty());
    }

    #[test]
    fn test_oversized_image_is_still_extracted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let page = PageContent::new().with_image(EmbeddedImage::new(
            png_bytes(200, 200),
            "png",
            // Rendered far beyond any sensible page size
            BoundingBox::new(0.0, 0.0, 6000.0, 6000.0),
        ));
        let doc = Document::new("scan").with_page(page);

        let extractor = FigureExtractor::default();
        let figures = extractor.extract_figures(&doc, dir.path()).expect("extraction");
        assert_eq!(figures.len(), 1);
    }

    #[test]
    fn test_corrupt_image_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let page = PageContent::new()
            .with_image(EmbeddedImage::new(
                // Unsupported ext forces a decode, which fails on garbage
                b"not an image at all".to_vec(),
                "webp",
                BoundingBox::new(0.0, 0.0, 200.0, 200.0),
            ))
            .with_image(EmbeddedImage::new(
                png_bytes(320, 320),
                "png",
                BoundingBox::new(0.0, 220.0, 200.0, 420.0),
            ));
        let doc = Document::new("mixed").with_page(page);

        let extractor = FigureExtractor::default();
        let figures = extractor.extract_figures(&doc, dir.path()).expect("extraction");
        // The bad image is skipped, the good one survives
        assert_eq!(figures.len(), 1);
        assert_eq!(figures[0].format.as_deref(), Some("png"));
    }

    #[test]
    fn test_sequential_numbering_without_captions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let page = PageContent::new()
            .with_image(EmbeddedImage::new(
                png_bytes(150, 150),
                "png",
                BoundingBox::new(0.0, 400.0, 200.0, 600.0),
            ))
            .with_image(EmbeddedImage::new(
                png_bytes(150, 150),
                "png",
                BoundingBox::new(0.0, 0.0, 200.0, 200.0),
            ));
        let doc = Document::new("pair").with_page(page);

        let extractor = FigureExtractor::default();
        let figures = extractor.extract_figures(&doc, dir.path()).expect("extraction");
        assert_eq!(figures.len(), 2);
        // Sorted by y0, then numbered sequentially
        assert!(figures[0].bbox.y0 < figures[1].bbox.y0);
        assert_eq!(figures[0].figure_number.as_deref(), Some("1"));
        assert_eq!(figures[1].figure_number.as_deref(), Some("2"));
    }

    #[test]
    fn test_caption_candidates_priority_and_confidence() {
        let extractor = FigureExtractor::default();
        let page = PageContent::new()
            .with_block(RawBlock::new(
                "Figure 7: Throughput under load",
                BoundingBox::new(0.0, 0.0, 200.0, 12.0),
                "Times",
                9.0,
            ))
            .with_block(RawBlock::new(
                "An overview of the proposed system",
                BoundingBox::new(0.0, 20.0, 200.0, 32.0),
                "Times",
                9.0,
            ))
            .with_block(RawBlock::new(
                "short",
                BoundingBox::new(0.0, 40.0, 200.0, 52.0),
                "Times",
                9.0,
            ));

        let candidates = extractor.find_caption_candidates(&page);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].number.as_deref(), Some("7"));
        assert_eq!(candidates[0].confidence, 0.8);
        assert_eq!(candidates[1].number, None);
        assert_eq!(candidates[1].confidence, 0.4);
    }

    #[test]
    fn test_normalize_format() {
        assert_eq!(normalize_format("PNG"), "png");
        assert_eq!(normalize_format(".jpeg"), "jpeg");
        assert_eq!(normalize_format("tif"), "tiff");
        assert_eq!(normalize_format(".TIF"), "tiff");
        assert_eq!(normalize_format("webp"), "png");
        assert_eq!(normalize_format(""), "png");
    }

    #[test]
    fn test_quality_confidence_bounds() {
        // Tiny file of unknown format loses the size bonus
        let low = quality_confidence(None, Some(10), "png");
        assert!(low >= 0.0 && low <= 1.0);

        let high = quality_confidence(Some((500, 500)), Some(50_000), "png");
        assert!((high - 0.9).abs() < 1e-9);

        let jpg = quality_confidence(Some((200, 200)), Some(50_000), "jpeg");
        assert!((jpg - 0.75).abs() < 1e-9);

        // Only the canonical "tiff" earns the lossless-format bonus
        let tiff = quality_confidence(Some((500, 500)), Some(50_000), "tiff");
        assert!((tiff - 0.9).abs() < 1e-9);
        let tif = quality_confidence(Some((500, 500)), Some(50_000), "tif");
        assert!((tif - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_statistics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let extractor = FigureExtractor::default();
        let figures = extractor
            .extract_figures(&doc_with_figure(), dir.path())
            .expect("extraction");
        let stats = extractor.statistics(&figures);

        assert_eq!(stats.total, 1);
        assert_eq!(stats.with_captions, 1);
        assert_eq!(stats.by_format.get("png"), Some(&1));
        assert_eq!(stats.confidence.excellent, 1);
    }
}
