//! docstruct: document structure extraction with heuristic annotation.
//!
//! Turns page-oriented documents into structured, confidence-scored
//! content: classified text blocks, tables with linked captions, figures
//! persisted to disk, and enriched citations. An error-recovery layer
//! wraps any extraction step with retries, fallbacks, and partial
//! results.
//!
//! # Quick start
//!
//! ```
//! use docstruct::{Document, ExtractorConfig, PageContent, RawBlock, TableRegionDetector};
//! use docstruct::geometry::BoundingBox;
//!
//! # fn main() -> docstruct::Result<()> {
//! let page = PageContent::new()
//!     .with_block(RawBlock::new(
//!         "Name\tValue",
//!         BoundingBox::new(50.0, 100.0, 400.0, 115.0),
//!         "Helvetica-Bold",
//!         10.0,
//!     ))
//!     .with_block(RawBlock::new(
//!         "alpha\t1",
//!         BoundingBox::new(56.0, 120.0, 400.0, 135.0),
//!         "Helvetica",
//!         10.0,
//!     ))
//!     .with_block(RawBlock::new(
//!         "beta\t2",
//!         BoundingBox::new(56.0, 140.0, 400.0, 155.0),
//!         "Helvetica",
//!         10.0,
//!     ));
//! let doc = Document::new("report").with_page(page);
//!
//! let detector = TableRegionDetector::new(ExtractorConfig::default());
//! let tables = detector.extract_tables(&doc)?;
//! assert_eq!(tables.len(), 1);
//! assert!(tables[0].confidence > 0.5);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod block;
pub mod citations;
pub mod config;
pub mod document;
pub mod error;
pub mod figures;
pub mod geometry;
pub mod recovery;
pub mod spatial;
pub mod stats;
pub mod tables;

pub use block::{BlockKind, DefaultMathDetector, MathPredicate, TextBlock, TextBlockClassifier};
pub use citations::{
    format_citations, Bibliography, Citation, CitationExtractor, CitationFormat, CitationType,
};
pub use config::ExtractorConfig;
pub use document::{Document, EmbeddedImage, PageContent, RawBlock};
pub use error::{Error, Result};
pub use figures::{Figure, FigureExtractor};
pub use geometry::{BoundingBox, Point};
pub use recovery::{
    ErrorRecoveryManager, PartialResult, RecoveryContext, RecoveryOutcome, RecoveryStrategy,
};
pub use spatial::SpatialMatcher;
pub use stats::{ConfidenceBucket, ConfidenceDistribution};
pub use tables::{TableRegionDetector, TableStructure, TableStructureType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "docstruct");
    }
}
