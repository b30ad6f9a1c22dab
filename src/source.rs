//! Host-engine boundary.
//!
//! The crate never talks to a PDF engine directly: it consumes the
//! per-page text layer through [`PageSource`] and acquires pages through
//! [`DocumentSource`]. A binding (pdfium or otherwise) implements both;
//! tests implement them over synthetic glyph lists.
//!
//! Every per-glyph query returns a `Result`. The extractor treats a
//! failed query as "this glyph is absent" and moves on; only page-level
//! queries (dimensions, character count) abort a page.

use crate::error::Result;
use crate::geometry::Rgba;

/// Kind of a page object, as far as edge extraction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageObjectKind {
    /// A vector path (candidate ruling line)
    Path,
    /// Anything else (text, image, shading, form)
    Other,
}

/// Character bounding box in PDF coordinates (bottom-left origin):
/// `(left, top, right, bottom)` with `top > bottom`.
pub type CharBox = (f64, f64, f64, f64);

/// One page of an open document, as exposed by the host engine.
///
/// Coordinates are PDF points with the PDF's native bottom-left origin;
/// the extractor performs the top-left conversion and MediaBox
/// normalisation itself.
pub trait PageSource {
    /// Page width in points.
    fn page_width(&self) -> Result<f64>;

    /// Page height in points.
    fn page_height(&self) -> Result<f64>;

    /// MediaBox origin offsets `(x, y)`; `(0, 0)` for well-behaved pages.
    fn media_box_origin(&self) -> Result<(f64, f64)> {
        Ok((0.0, 0.0))
    }

    /// Number of characters in the page's text layer.
    fn char_count(&self) -> Result<usize>;

    /// Unicode scalar of character `i`; 0 means "no character".
    fn char_unicode(&self, i: usize) -> Result<u32>;

    /// Bounding box of character `i` in PDF coordinates.
    fn char_box(&self, i: usize) -> Result<CharBox>;

    /// Font size of character `i` in points.
    fn char_font_size(&self, i: usize) -> Result<f64>;

    /// Font weight of character `i` (400 = normal, 700 = bold).
    fn char_font_weight(&self, i: usize) -> Result<i32>;

    /// Font name and FontDescriptor flags of character `i`.
    fn char_font_info(&self, i: usize) -> Result<(String, u32)>;

    /// Fill colour of character `i`.
    fn char_fill_color(&self, i: usize) -> Result<Rgba>;

    /// Local rotation angle of character `i` in radians.
    fn char_angle(&self, i: usize) -> Result<f64>;

    /// Whether character `i` is a soft hyphen.
    fn char_is_hyphen(&self, i: usize) -> Result<bool>;

    /// Number of page objects (for ruling-line extraction).
    fn object_count(&self) -> Result<usize>;

    /// Kind of page object `i`.
    fn object_kind(&self, i: usize) -> Result<PageObjectKind>;

    /// Bounding box of page object `i` in PDF coordinates.
    fn object_bounds(&self, i: usize) -> Result<CharBox>;

    /// Number of path segments in page object `i`.
    fn path_segment_count(&self, i: usize) -> Result<usize>;
}

/// An open document from which pages can be acquired one at a time.
///
/// The returned page handle owns the host page; dropping it must close
/// the page on the host side (the engine is not guaranteed re-entrant on
/// a single handle, so callers wanting page-level parallelism open one
/// handle per worker).
pub trait DocumentSource {
    /// Number of pages in the document.
    fn page_count(&mut self) -> Result<usize>;

    /// Open page `index` (zero-based). The page stays loaded until the
    /// returned handle is dropped.
    fn open_page(&mut self, index: usize) -> Result<Box<dyn PageSource + '_>>;
}
