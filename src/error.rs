//! Error types for the extraction pipeline.
//!
//! Every fallible operation in the crate returns [`Result`]. The recovery
//! layer inspects errors by kind name ([`Error::kind_name`]) to decide
//! whether a failed operation is worth retrying.

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Network failure kinds recognized by the `"network"` recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// Connection refused or reset
    Connection,
    /// Operation timed out
    Timeout,
    /// Name resolution failure
    Dns,
}

impl NetworkErrorKind {
    /// Stable kind name used by retryability allow-lists.
    pub fn name(&self) -> &'static str {
        match self {
            NetworkErrorKind::Connection => "connection",
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Dns => "dns",
        }
    }
}

/// Filesystem failure kinds recognized by the `"file"` recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorKind {
    /// File or directory not found
    NotFound,
    /// Permission denied
    Permission,
    /// Other I/O failure
    Io,
}

impl FileErrorKind {
    /// Stable kind name used by retryability allow-lists.
    pub fn name(&self) -> &'static str {
        match self {
            FileErrorKind::NotFound => "not_found",
            FileErrorKind::Permission => "permission",
            FileErrorKind::Io => "io",
        }
    }
}

/// Errors that can occur during structure extraction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Text block extraction failed for a page
    #[error("Text extraction failed: {0}")]
    TextExtraction(String),

    /// Table detection failed for a page
    #[error("Table extraction failed: {0}")]
    TableExtraction(String),

    /// Figure/image extraction failed
    #[error("Figure extraction failed: {0}")]
    FigureExtraction(String),

    /// Citation extraction failed
    #[error("Citation extraction failed: {0}")]
    CitationExtraction(String),

    /// Document-level extraction failed after recovery was exhausted
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Network failure (retryable under the "network" strategy)
    #[error("Network error ({}): {message}", kind.name())]
    Network {
        /// Failure kind
        kind: NetworkErrorKind,
        /// Failure detail
        message: String,
    },

    /// Filesystem failure (retryable under the "file" strategy)
    #[error("File error ({}): {message}", kind.name())]
    File {
        /// Failure kind
        kind: FileErrorKind,
        /// Failure detail
        message: String,
    },

    /// Embedded image could not be decoded or written
    #[error("Image error: {0}")]
    Image(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable kind name for this error, matched against the retryable
    /// allow-list of a recovery strategy.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::TextExtraction(_) => "text_extraction",
            Error::TableExtraction(_) => "table_extraction",
            Error::FigureExtraction(_) => "figure_extraction",
            Error::CitationExtraction(_) => "citation_extraction",
            Error::ExtractionFailed(_) => "extraction_failed",
            Error::Network { kind, .. } => kind.name(),
            Error::File { kind, .. } => kind.name(),
            Error::Image(_) => "image",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_display() {
        let err = Error::TableExtraction("no regions".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Table extraction failed"));
        assert!(msg.contains("no regions"));
    }

    #[test]
    fn test_network_error_display_and_kind() {
        let err = Error::Network {
            kind: NetworkErrorKind::Timeout,
            message: "fetch timed out".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("timeout"));
        assert!(msg.contains("fetch timed out"));
        assert_eq!(err.kind_name(), "timeout");
    }

    #[test]
    fn test_file_error_kind() {
        let err = Error::File {
            kind: FileErrorKind::NotFound,
            message: "missing.pdf".to_string(),
        };
        assert_eq!(err.kind_name(), "not_found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: Error = io.into();
        assert_eq!(err.kind_name(), "io");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
