//! Document-level conversion driver.
//!
//! Walks a [`DocumentSource`] page by page, runs the extraction
//! pipeline on each, applies the document-wide heading normalisation,
//! and hands the finished tree to the Markdown serialiser. Page handles
//! are scoped: each page is opened, used, and closed (via drop) before
//! the next one is touched.

use crate::config::Config;
use crate::converters::markdown::document_to_markdown;
use crate::document::{Document, DocumentStatistics};
use crate::error::{Error, Result};
use crate::extract::extract_page;
use crate::layout::normalize_document_headings;
use crate::source::DocumentSource;

/// Converts PDF documents to Markdown through a host engine.
///
/// # Examples
///
/// ```ignore
/// use pdf_markdown::{Config, Converter};
///
/// # fn run(source: impl pdf_markdown::source::DocumentSource) -> pdf_markdown::Result<()> {
/// let mut converter = Converter::with_config(source, Config::default());
/// let markdown = converter.convert()?;
/// println!("{}", markdown);
/// # Ok(())
/// # }
/// ```
pub struct Converter<S: DocumentSource> {
    source: S,
    config: Config,
}

impl<S: DocumentSource> Converter<S> {
    /// Create a converter with the default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, Config::default())
    }

    /// Create a converter with a custom configuration.
    pub fn with_config(source: S, config: Config) -> Self {
        Self { source, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert the whole document to Markdown.
    pub fn convert(&mut self) -> Result<String> {
        let document = self.extract_document()?;
        Ok(document_to_markdown(&document, &self.config))
    }

    /// Convert a zero-based page range (inclusive) to Markdown.
    ///
    /// `end` past the last page is clamped; `start > end` is a
    /// configuration error.
    pub fn convert_page_range(&mut self, start: usize, end: usize) -> Result<String> {
        let document = self.extract_page_range(start, end)?;
        Ok(document_to_markdown(&document, &self.config))
    }

    /// Extract the whole document tree without serialising it.
    pub fn extract_document(&mut self) -> Result<Document> {
        let page_count = self.page_count()?;
        if page_count == 0 {
            return Ok(Document::default());
        }
        self.extract_range(0, page_count - 1)
    }

    /// Extract a zero-based page range (inclusive) as a document tree.
    pub fn extract_page_range(&mut self, start: usize, end: usize) -> Result<Document> {
        let page_count = self.page_count()?;
        if page_count == 0 {
            return Ok(Document::default());
        }

        let end = end.min(page_count - 1);
        if start > end {
            return Err(Error::InvalidPageRange { start, end });
        }

        self.extract_range(start, end)
    }

    fn page_count(&mut self) -> Result<usize> {
        self.source
            .page_count()
            .map_err(|e| Error::Source(format!("failed to get page count: {}", e)))
    }

    fn extract_range(&mut self, start: usize, end: usize) -> Result<Document> {
        let mut document = Document {
            pages: Vec::with_capacity(end - start + 1),
        };

        for index in start..=end {
            let page = {
                let handle = self.source.open_page(index).map_err(|e| {
                    Error::page(index + 1, format!("failed to load page: {}", e))
                })?;
                extract_page(handle.as_ref(), index + 1, &self.config)?
                // handle drops here, closing the host page before the
                // next one is opened
            };
            document.pages.push(page);
        }

        normalize_document_headings(&mut document);

        let stats = DocumentStatistics::for_document(&document);
        log::debug!(
            "extracted {} pages: {} paragraphs, {} headings, {} tables, {} words",
            stats.pages,
            stats.paragraphs,
            stats.headings,
            stats.tables,
            stats.words
        );

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CharBox, PageObjectKind, PageSource};

    /// A document whose pages each hold a fixed glyph list.
    struct StubDocument {
        pages: usize,
    }

    struct StubPage;

    impl PageSource for StubPage {
        fn page_width(&self) -> Result<f64> {
            Ok(612.0)
        }
        fn page_height(&self) -> Result<f64> {
            Ok(792.0)
        }
        fn char_count(&self) -> Result<usize> {
            Ok(0)
        }
        fn char_unicode(&self, _: usize) -> Result<u32> {
            Ok(0)
        }
        fn char_box(&self, _: usize) -> Result<CharBox> {
            Err(Error::Source("no chars".into()))
        }
        fn char_font_size(&self, _: usize) -> Result<f64> {
            Ok(12.0)
        }
        fn char_font_weight(&self, _: usize) -> Result<i32> {
            Ok(400)
        }
        fn char_font_info(&self, _: usize) -> Result<(String, u32)> {
            Ok((String::new(), 0))
        }
        fn char_fill_color(&self, _: usize) -> Result<crate::geometry::Rgba> {
            Ok(crate::geometry::Rgba::black())
        }
        fn char_angle(&self, _: usize) -> Result<f64> {
            Ok(0.0)
        }
        fn char_is_hyphen(&self, _: usize) -> Result<bool> {
            Ok(false)
        }
        fn object_count(&self) -> Result<usize> {
            Ok(0)
        }
        fn object_kind(&self, _: usize) -> Result<PageObjectKind> {
            Ok(PageObjectKind::Other)
        }
        fn object_bounds(&self, _: usize) -> Result<CharBox> {
            Err(Error::Source("no objects".into()))
        }
        fn path_segment_count(&self, _: usize) -> Result<usize> {
            Ok(0)
        }
    }

    impl DocumentSource for StubDocument {
        fn page_count(&mut self) -> Result<usize> {
            Ok(self.pages)
        }
        fn open_page(&mut self, index: usize) -> Result<Box<dyn PageSource + '_>> {
            if index >= self.pages {
                return Err(Error::Source(format!("page {} out of range", index)));
            }
            Ok(Box::new(StubPage))
        }
    }

    #[test]
    fn test_empty_pages_produce_empty_document() {
        let mut converter = Converter::new(StubDocument { pages: 2 });
        let doc = converter.extract_document().unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert!(doc.pages[0].paragraphs.is_empty());
        assert_eq!(doc.pages[0].number, 1);
        assert_eq!(doc.pages[1].number, 2);
    }

    #[test]
    fn test_invalid_page_range() {
        let mut converter = Converter::new(StubDocument { pages: 5 });
        let err = converter.extract_page_range(4, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidPageRange { start: 4, end: 1 }));
    }

    #[test]
    fn test_page_range_end_clamped() {
        let mut converter = Converter::new(StubDocument { pages: 3 });
        let doc = converter.extract_page_range(1, 99).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].number, 2);
    }

    #[test]
    fn test_zero_page_document() {
        let mut converter = Converter::new(StubDocument { pages: 0 });
        let doc = converter.extract_document().unwrap();
        assert!(doc.pages.is_empty());
        assert_eq!(converter.convert().unwrap(), "");
    }
}
