//! Error types for the extraction pipeline.
//!
//! Host failures surface as page- or document-level errors; per-glyph and
//! per-edge failures never do (the offending item is skipped, per the
//! failure model in the extractor).

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while driving the host engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A page-level host failure (page could not be loaded, text layer
    /// unavailable, character count query failed).
    #[error("failed to extract page {number}: {reason}")]
    Page {
        /// One-based page number
        number: usize,
        /// Reason reported by the host engine
        reason: String,
    },

    /// A document-level host failure (page count unavailable, document
    /// handle invalid).
    #[error("host engine error: {0}")]
    Source(String),

    /// Invalid page range passed to a range conversion.
    #[error("invalid page range: start {start} must be <= end {end}")]
    InvalidPageRange {
        /// Zero-based first page requested
        start: usize,
        /// Zero-based last page requested
        end: usize,
    },
}

impl Error {
    /// Wrap a host error string as a page-level error with context.
    pub fn page(number: usize, reason: impl Into<String>) -> Self {
        Error::Page {
            number,
            reason: reason.into(),
        }
    }
}
