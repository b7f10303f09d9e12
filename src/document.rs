//! In-memory document model at the collaborator boundary.
//!
//! Low-level decoding (rasterization, glyph extraction) is someone else's
//! job; this crate consumes its output. A [`Document`] is a stem plus an
//! ordered list of [`PageContent`], each carrying raw text blocks with
//! position/font metadata and embedded raster images. The builders here
//! make the crate usable and testable without any particular decoder.

use serde::Serialize;

use crate::geometry::BoundingBox;

/// A raw text block as produced by the document-model collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct RawBlock {
    /// Text content
    pub text: String,
    /// Bounding box in page-layout coordinates
    pub bbox: BoundingBox,
    /// Font name
    pub font: String,
    /// Font size in points
    pub size: f64,
}

impl RawBlock {
    /// Create a raw block.
    pub fn new(text: impl Into<String>, bbox: BoundingBox, font: impl Into<String>, size: f64) -> Self {
        Self {
            text: text.into(),
            bbox,
            font: font.into(),
            size,
        }
    }
}

/// An embedded raster image on a page.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Raw encoded image bytes
    pub data: Vec<u8>,
    /// Extension hint from the container ("png", "jpg", ...)
    pub ext: String,
    /// Rendered bounding box on the page
    pub bbox: BoundingBox,
}

impl EmbeddedImage {
    /// Create an embedded image record.
    pub fn new(data: Vec<u8>, ext: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            data,
            ext: ext.into(),
            bbox,
        }
    }
}

/// Content of one page: text blocks plus embedded images.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Raw text blocks in reading order
    pub blocks: Vec<RawBlock>,
    /// Embedded raster images
    pub images: Vec<EmbeddedImage>,
}

impl PageContent {
    /// Create an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text block.
    pub fn with_block(mut self, block: RawBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Add an embedded image.
    pub fn with_image(mut self, image: EmbeddedImage) -> Self {
        self.images.push(image);
        self
    }

    /// Full-page concatenated text, used for bibliography-page detection.
    pub fn page_text(&self) -> String {
        let mut text = String::new();
        for block in &self.blocks {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&block.text);
        }
        text
    }
}

/// A page-oriented document handed over by the decoding collaborator.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// File stem used in extracted-image filenames
    pub stem: String,
    /// Pages in order
    pub pages: Vec<PageContent>,
}

impl Document {
    /// Create an empty document with the given file stem.
    pub fn new(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            pages: Vec::new(),
        }
    }

    /// Append a page.
    pub fn with_page(mut self, page: PageContent) -> Self {
        self.pages.push(page);
        self
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
