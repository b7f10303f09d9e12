//! End-to-end extraction over an in-memory document.
//!
//! Builds a small two-page "paper" with a captioned table, an embedded
//! figure with a caption, and a references section, then runs every
//! extractor over it and checks the structured output.

use std::io::Cursor;

use docstruct::citations::CitationExtractor;
use docstruct::figures::FigureExtractor;
use docstruct::geometry::BoundingBox;
use docstruct::tables::TableRegionDetector;
use docstruct::{
    BlockKind, CitationType, Document, EmbeddedImage, ExtractorConfig, PageContent, RawBlock,
    TextBlockClassifier,
};

// ============================================================================
// Fixtures
// ============================================================================

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn block(text: &str, x: f64, y: f64, font: &str, size: f64) -> RawBlock {
    RawBlock::new(text, BoundingBox::new(x, y, x + 300.0, y + size + 4.0), font, size)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageOutputFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

/// Page 1: title, abstract, a three-row table with a caption below it.
fn first_page() -> PageContent {
    PageContent::new()
        .with_block(block("A Study of Layout Heuristics", 100.0, 50.0, "Times-Bold", 18.0))
        .with_block(block(
            "Abstract. We evaluate heuristic structure extraction on a corpus of scanned reports.",
            72.0,
            90.0,
            "Times-Roman",
            10.0,
        ))
        .with_block(block("Name | Value | Type", 72.0, 200.0, "Helvetica-Bold", 9.0))
        .with_block(block("alpha | 1 | int", 80.0, 215.0, "Helvetica", 9.0))
        .with_block(block("beta | 2 | int", 80.0, 230.0, "Helvetica", 9.0))
        .with_block(block("gamma | 3 | float", 80.0, 245.0, "Helvetica", 9.0))
        .with_block(block(
            "Table 1: Benchmark parameters.",
            72.0,
            320.0,
            "Times-Italic",
            9.0,
        ))
}

/// Page 2: a figure with a caption, then a references section.
fn second_page() -> PageContent {
    PageContent::new()
        .with_image(EmbeddedImage::new(
            png_bytes(400, 300),
            "png",
            BoundingBox::new(100.0, 80.0, 500.0, 380.0),
        ))
        .with_block(block(
            "Figure 1: Extraction accuracy by page density.",
            100.0,
            400.0,
            "Times-Italic",
            9.0,
        ))
        .with_block(block("References", 72.0, 500.0, "Times-Bold", 12.0))
        .with_block(block(
            "Smith, J. (2020). \"A Study of Extraction\". *Nature Methods*. 10.1000/xyz123",
            72.0,
            520.0,
            "Times-Roman",
            9.0,
        ))
        .with_block(block(
            "Jones, A. (2021). \"Layout Analysis Revisited\". *Pattern Recognition*.",
            72.0,
            540.0,
            "Times-Roman",
            9.0,
        ))
}

fn sample_document() -> Document {
    Document::new("sample_paper")
        .with_page(first_page())
        .with_page(second_page())
}

// ============================================================================
// Block classification
// ============================================================================

#[test]
fn test_classifier_labels_the_front_matter() {
    let classifier = TextBlockClassifier::new();
    let fonts: std::collections::BTreeSet<String> =
        ["Times-Roman".to_string()].into_iter().collect();

    let title = classifier.classify("A Study of Layout Heuristics", &fonts, &[18.0]);
    assert_eq!(title, BlockKind::Title);

    let abstract_kind = classifier.classify(
        "Abstract. We evaluate heuristic structure extraction.",
        &fonts,
        &[10.0],
    );
    assert_eq!(abstract_kind, BlockKind::Abstract);

    let caption = classifier.classify("Table 1: Benchmark parameters.", &fonts, &[9.0]);
    assert_eq!(caption, BlockKind::TableCaption);
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_table_extraction_with_caption_link() {
    init_logging();
    let detector = TableRegionDetector::new(ExtractorConfig::default());
    let tables = detector.extract_tables(&sample_document()).expect("tables");

    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(table.page, 0);
    assert!(table.has_headers);
    assert_eq!(table.row_count, 3);
    assert_eq!(table.column_count, 3);
    assert_eq!(table.table_number.as_deref(), Some("1"));
    assert_eq!(table.caption.as_deref(), Some("Benchmark parameters."));
    // Caption link pushes an already-strong table to the cap
    assert!((table.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn test_table_statistics_over_document() {
    let detector = TableRegionDetector::new(ExtractorConfig::default());
    let tables = detector.extract_tables(&sample_document()).expect("tables");
    let stats = detector.statistics(&tables);

    assert_eq!(stats.total, 1);
    assert_eq!(stats.with_headers, 1);
    assert_eq!(stats.average_rows, 3.0);
}

// ============================================================================
// Figures
// ============================================================================

#[test]
fn test_figure_extraction_persists_and_links_caption() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let extractor = FigureExtractor::new(ExtractorConfig::default());
    let figures = extractor
        .extract_figures(&sample_document(), dir.path())
        .expect("figures");

    assert_eq!(figures.len(), 1);
    let figure = &figures[0];
    assert_eq!(figure.page, 1);
    assert_eq!(figure.figure_number, Some("1".to_string()));
    assert!(figure
        .caption
        .as_deref()
        .unwrap_or_default()
        .contains("Extraction accuracy"));
    assert_eq!(figure.format.as_deref(), Some("png"));
    assert_eq!(figure.width, Some(400));
    assert_eq!(figure.height, Some(300));

    let path = figure.image_path.as_ref().expect("path");
    assert!(path.exists());
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("sample_paper_page2_img1.png")
    );
}

#[test]
fn test_undersized_images_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let page = PageContent::new().with_image(EmbeddedImage::new(
        png_bytes(16, 16),
        "png",
        BoundingBox::new(0.0, 0.0, 16.0, 16.0),
    ));
    let doc = Document::new("tiny").with_page(page);

    let extractor = FigureExtractor::new(ExtractorConfig::default());
    let figures = extractor.extract_figures(&doc, dir.path()).expect("figures");
    assert!(figures.is_empty());
}

// ============================================================================
// Citations
// ============================================================================

#[test]
fn test_citation_extraction_finds_the_bibliography() {
    init_logging();
    let extractor = CitationExtractor::new(ExtractorConfig::default());
    let bibliography = extractor
        .extract_citations(&sample_document())
        .expect("citations");

    assert_eq!(bibliography.section_title.as_deref(), Some("References"));
    assert_eq!(bibliography.section_page, Some(1));
    assert!((bibliography.confidence - 0.8).abs() < 1e-9);

    let entries: Vec<_> = bibliography
        .citations
        .iter()
        .filter(|c| c.citation_type == CitationType::Bibliography)
        .collect();
    assert_eq!(entries.len(), 2);

    let smith = entries
        .iter()
        .find(|c| c.text.contains("Smith"))
        .expect("smith entry");
    assert_eq!(smith.year.as_deref(), Some("2020"));
    assert_eq!(smith.doi.as_deref(), Some("10.1000/xyz123"));
    assert_eq!(smith.title.as_deref(), Some("A Study of Extraction"));
    assert!((smith.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn test_in_text_citations_coexist_with_bibliography() {
    let page = PageContent::new()
        .with_block(block(
            "Earlier work reported similar gains (Smith et al., 2023).",
            72.0,
            100.0,
            "Times-Roman",
            10.0,
        ))
        .with_block(block(
            "Follow-ups confirmed the effect [2].",
            72.0,
            120.0,
            "Times-Roman",
            10.0,
        ));
    let doc = Document::new("intext").with_page(page);

    let extractor = CitationExtractor::new(ExtractorConfig::default());
    let bibliography = extractor.extract_citations(&doc).expect("citations");

    assert!(bibliography.section_page.is_none());
    assert!(bibliography.len() >= 2);
    assert!(bibliography
        .citations
        .iter()
        .all(|c| c.citation_type == CitationType::InText));
    assert!(bibliography
        .citations
        .iter()
        .all(|c| c.confidence > 0.0 && c.confidence <= 1.0));
}

// ============================================================================
// Cross-extractor sanity
// ============================================================================

#[test]
fn test_extractors_do_not_interfere() {
    init_logging();
    let doc = sample_document();
    let dir = tempfile::tempdir().expect("tempdir");

    let tables = TableRegionDetector::new(ExtractorConfig::default())
        .extract_tables(&doc)
        .expect("tables");
    let figures = FigureExtractor::new(ExtractorConfig::default())
        .extract_figures(&doc, dir.path())
        .expect("figures");
    let bibliography = CitationExtractor::new(ExtractorConfig::default())
        .extract_citations(&doc)
        .expect("citations");

    // The table caption must not be claimed as a figure caption
    assert!(figures.iter().all(|f| {
        f.caption
            .as_deref()
            .map_or(true, |c| !c.contains("Benchmark parameters"))
    }));
    // The bibliography entries must not be mistaken for table rows
    assert_eq!(tables.len(), 1);
    assert!(bibliography.len() >= 2);
}
