// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::manual_find)]

//! # pdf_markdown
//!
//! Structured Markdown extraction from PDF text layers.
//!
//! A PDF's text layer is a flat, order-agnostic stream of positioned
//! glyphs: boxes, font metadata, fill colours, rotation angles, and
//! nothing else. This crate reconstructs the logical document from that
//! stream - words, lines, paragraphs, columns, headings, lists, code
//! blocks, and tables - and renders it as Markdown that preserves
//! reading order across multi-column and rotated layouts.
//!
//! The PDF engine itself stays out: the crate consumes per-character
//! metadata through the [`source::PageSource`] trait and acquires pages
//! through [`source::DocumentSource`]. Any engine binding (pdfium or
//! otherwise) that can answer those queries plugs in.
//!
//! ## Pipeline
//!
//! - character ingest with coordinate normalisation ([`extract`])
//! - word assembly, ligature expansion, CJK artefact removal
//!   ([`layout::word_builder`])
//! - rotation partition, line and paragraph grouping, column detection,
//!   reading order ([`layout`])
//! - heading/list/code annotation with document-wide heading
//!   normalisation ([`layout::annotate`])
//! - table recognition, both segment-based (PDF-TREX) and ruling-line
//!   based ([`tables`])
//! - Markdown serialisation ([`converters::markdown`])
//!
//! ## Quick start
//!
//! ```ignore
//! use pdf_markdown::{Config, Converter};
//!
//! # fn run(source: impl pdf_markdown::source::DocumentSource) -> pdf_markdown::Result<()> {
//! let mut converter = Converter::with_config(source, Config::default());
//! let markdown = converter.convert()?;
//! println!("{}", markdown);
//! # Ok(())
//! # }
//! ```
//!
//! Processing is synchronous and single-threaded within a page; callers
//! wanting page-level parallelism open one [`source::DocumentSource`]
//! per worker (host engines are not guaranteed re-entrant on a single
//! handle). For a fixed input the output is deterministic across runs.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometric and statistical primitives
pub mod geometry;

// Host engine boundary
pub mod source;

// Layout analysis
pub mod layout;

// Table detection
pub mod tables;

// Page extraction pipeline
pub mod extract;

// Document tree
pub mod document;

// Document-level conversion driver
pub mod converter;

// Output serialisers
pub mod converters;

// Re-exports
pub use config::{Config, EdgeStrategy, TableSettings};
pub use converter::Converter;
pub use document::{Document, DocumentStatistics, Page};
pub use error::{Error, Result};
pub use extract::extract_page;
pub use geometry::{Rect, ReadingDirection, Rgba};
pub use layout::{Alignment, EnrichedChar, EnrichedWord, Line, Paragraph};
pub use tables::{Edge, Orientation, Table, TableCell, TableRow};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions.

    use std::cmp::Ordering;

    /// Compare two floats for sorting, never panicking on NaN.
    ///
    /// NaN values compare equal to each other and greater than every
    /// number, so sorts are total; combined with stable sorts this
    /// keeps ties in input order.
    #[inline]
    pub fn safe_float_cmp(a: &f64, b: &f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(b).expect("both finite or infinite"),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_safe_float_cmp_normal() {
            assert_eq!(safe_float_cmp(&1.0, &2.0), Ordering::Less);
            assert_eq!(safe_float_cmp(&2.0, &1.0), Ordering::Greater);
            assert_eq!(safe_float_cmp(&1.5, &1.5), Ordering::Equal);
        }

        #[test]
        fn test_safe_float_cmp_nan() {
            assert_eq!(safe_float_cmp(&f64::NAN, &f64::NAN), Ordering::Equal);
            assert_eq!(safe_float_cmp(&f64::NAN, &0.0), Ordering::Greater);
            assert_eq!(safe_float_cmp(&0.0, &f64::NAN), Ordering::Less);
        }

        #[test]
        fn test_safe_float_cmp_infinity() {
            assert_eq!(safe_float_cmp(&f64::INFINITY, &f64::INFINITY), Ordering::Equal);
            assert_eq!(safe_float_cmp(&f64::INFINITY, &1.0), Ordering::Greater);
            assert_eq!(
                safe_float_cmp(&f64::NEG_INFINITY, &f64::INFINITY),
                Ordering::Less
            );
        }
    }
}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdf_markdown");
    }
}
