//! Page extraction: drive the host engine and run the layout pipeline.
//!
//! This is the only module that talks to [`PageSource`]. Per-glyph and
//! per-object host errors are swallowed (the item is skipped); only
//! page-level queries can fail a page. Coordinates arrive in the PDF's
//! bottom-left system and leave here normalised to top-left with the
//! MediaBox origin removed, so every later stage works in
//! `[0, width] x [0, height]`.

use crate::config::Config;
use crate::document::Page;
use crate::error::{Error, Result};
use crate::geometry::Rgba;
use crate::layout::text_block::{EnrichedChar, EnrichedWord, Paragraph};
use crate::layout::{
    deduplicate_cjk, detect_code_blocks, detect_columns, detect_headings, detect_lists,
    detect_text_rotation, determine_reading_order, expand_ligatures, group_block_lines,
    group_chars_into_words, group_lines_into_paragraphs,
};
use crate::source::{PageObjectKind, PageSource};
use crate::tables::{self, Edge};

/// Distance from a page edge within which a ruling line is treated as a
/// page border, in points.
const BORDER_TOLERANCE: f64 = 20.0;

/// A ruling line spanning at least this fraction of a page dimension is
/// a border or content frame, not a table line.
const FULL_SPAN_THRESHOLD: f64 = 0.9;

/// Extract one page: characters, words, structure, tables.
///
/// `page_number` is one-based. An empty text layer is not an error; it
/// produces a page with no paragraphs.
pub fn extract_page(source: &dyn PageSource, page_number: usize, config: &Config) -> Result<Page> {
    let page_width = source
        .page_width()
        .map_err(|e| Error::page(page_number, format!("failed to get page width: {}", e)))?;
    let page_height = source
        .page_height()
        .map_err(|e| Error::page(page_number, format!("failed to get page height: {}", e)))?;

    let char_count = source
        .char_count()
        .map_err(|e| Error::page(page_number, format!("failed to count characters: {}", e)))?;

    if char_count == 0 {
        return Ok(Page::new(page_number, page_width, page_height, Vec::new()));
    }

    let mut chars = extract_enriched_chars(source, char_count, page_height);

    // Shift by the MediaBox origin so the page starts at (0, 0).
    let (origin_x, origin_y) = source.media_box_origin().unwrap_or((0.0, 0.0));
    if origin_x != 0.0 || origin_y != 0.0 {
        for c in &mut chars {
            c.bbox.x0 -= origin_x;
            c.bbox.x1 -= origin_x;
            c.bbox.y0 -= origin_y;
            c.bbox.y1 -= origin_y;
        }
    }

    let mut words = group_chars_into_words(&chars);
    expand_ligatures(&mut words);
    deduplicate_cjk(&mut words);

    log::debug!(
        "page {}: {} chars -> {} words",
        page_number,
        chars.len(),
        words.len()
    );

    let paragraphs = build_paragraphs(&words, page_width, config);

    let edges = match extract_edges(source, page_width, page_height) {
        Ok(edges) => edges,
        Err(e) => {
            log::warn!("page {}: path extraction failed ({}), continuing without edges", page_number, e);
            Vec::new()
        }
    };

    let columns = detect_columns(&words, page_width);

    let mut page = Page::new(page_number, page_width, page_height, paragraphs);
    page.edges = edges;
    page.columns = columns;

    if config.detect_tables {
        // The detectors run over the post-merge words carried by the
        // paragraphs, not the raw segmentation.
        let table_words: Vec<EnrichedWord> = page
            .paragraphs
            .iter()
            .flat_map(|p| p.lines.iter())
            .flat_map(|l| l.words.iter())
            .cloned()
            .collect();
        page.tables = tables::detect_tables(&table_words, &page.edges, page_width, config);
        log::debug!("page {}: {} tables", page_number, page.tables.len());
    }

    Ok(page)
}

/// Pull every readable glyph off the page, flipping to top-left
/// coordinates. Glyphs the host cannot describe are skipped.
fn extract_enriched_chars(
    source: &dyn PageSource,
    count: usize,
    page_height: f64,
) -> Vec<EnrichedChar> {
    let mut chars = Vec::with_capacity(count);

    for i in 0..count {
        let unicode = match source.char_unicode(i) {
            Ok(u) if u != 0 => u,
            _ => continue,
        };
        let Some(text) = char::from_u32(unicode) else {
            continue;
        };

        let Ok((left, top, right, bottom)) = source.char_box(i) else {
            continue;
        };

        let bbox = crate::geometry::Rect::new(left, page_height - top, right, page_height - bottom);

        let font_size = source.char_font_size(i).unwrap_or(12.0);
        let font_weight = source.char_font_weight(i).unwrap_or(400);
        let (font_name, font_flags) = source
            .char_font_info(i)
            .unwrap_or_else(|_| (String::new(), 0));
        let fill_color = source.char_fill_color(i).unwrap_or_else(|_| Rgba::black());
        let angle = source.char_angle(i).unwrap_or(0.0);
        let is_hyphen = source.char_is_hyphen(i).unwrap_or(false);

        chars.push(EnrichedChar {
            text,
            bbox,
            font_size,
            font_weight,
            font_name,
            font_flags,
            fill_color,
            angle,
            is_hyphen,
        });
    }

    chars
}

/// Run the layout pipeline: rotation partition, line grouping, paragraph
/// grouping, reading order, annotation.
fn build_paragraphs(words: &[EnrichedWord], page_width: f64, config: &Config) -> Vec<Paragraph> {
    if words.is_empty() {
        return Vec::new();
    }

    let blocks = detect_text_rotation(words);

    let mut all_lines = Vec::new();
    for block in &blocks {
        all_lines.extend(group_block_lines(block));
    }

    let paragraphs = group_lines_into_paragraphs(all_lines, page_width);

    let columns = detect_columns(words, page_width);
    let mut paragraphs = determine_reading_order(paragraphs, &columns);

    detect_headings(&mut paragraphs, config.min_heading_font_size);
    detect_lists(&mut paragraphs);
    detect_code_blocks(&mut paragraphs);

    paragraphs
}

/// Collect ruling-line edges from the page's path objects.
///
/// Two-segment paths that are thin in one dimension become single
/// edges; larger paths contribute their bounding-box edges (tables are
/// often drawn as nested rectangles). Page borders are discarded.
fn extract_edges(source: &dyn PageSource, page_width: f64, page_height: f64) -> Result<Vec<Edge>> {
    let count = source
        .object_count()
        .map_err(|e| Error::Source(format!("failed to count page objects: {}", e)))?;

    let mut edges = Vec::new();

    for i in 0..count {
        let Ok(PageObjectKind::Path) = source.object_kind(i) else {
            continue;
        };
        let Ok((left, top, right, bottom)) = source.object_bounds(i) else {
            continue;
        };
        let Ok(segments) = source.path_segment_count(i) else {
            continue;
        };
        if segments < 2 {
            continue;
        }

        let x0 = left;
        let y0 = page_height - top;
        let x1 = right;
        let y1 = page_height - bottom;

        if segments == 2 {
            if let Some(edge) = path_to_edge(x0, y0, x1, y1) {
                if !is_page_border(&edge, page_width, page_height) {
                    edges.push(edge);
                }
            }
        } else if segments >= 4 {
            for edge in bounds_to_edges(x0, y0, x1, y1) {
                if !is_page_border(&edge, page_width, page_height) {
                    edges.push(edge);
                }
            }
        }
    }

    Ok(edges)
}

/// Interpret a two-segment path as a single straight edge, if it is
/// thin enough in one dimension.
fn path_to_edge(x0: f64, y0: f64, x1: f64, y1: f64) -> Option<Edge> {
    let width = x1 - x0;
    let height = y1 - y0;

    if height < 2.0 && width > 1.0 {
        return Some(Edge {
            x0,
            x1,
            top: y0,
            bottom: y1,
            orientation: crate::tables::Orientation::Horizontal,
        });
    }
    if width < 2.0 && height > 1.0 {
        return Some(Edge {
            x0,
            x1,
            top: y0,
            bottom: y1,
            orientation: crate::tables::Orientation::Vertical,
        });
    }

    None
}

/// The four edges of a rectangle's bounding box.
fn bounds_to_edges(x0: f64, y0: f64, x1: f64, y1: f64) -> [Edge; 4] {
    [
        Edge::horizontal(x0, x1, y0),
        Edge::horizontal(x0, x1, y1),
        Edge::vertical(x0, y0, y1),
        Edge::vertical(x1, y0, y1),
    ]
}

/// Whether an edge hugs the page boundary or spans nearly a full page
/// dimension.
fn is_page_border(edge: &Edge, page_width: f64, page_height: f64) -> bool {
    match edge.orientation {
        crate::tables::Orientation::Horizontal => {
            edge.top < BORDER_TOLERANCE
                || edge.top > page_height - BORDER_TOLERANCE
                || edge.width() > page_width * FULL_SPAN_THRESHOLD
        }
        crate::tables::Orientation::Vertical => {
            edge.x0 < BORDER_TOLERANCE
                || edge.x0 > page_width - BORDER_TOLERANCE
                || edge.height() > page_height * FULL_SPAN_THRESHOLD
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Orientation;

    #[test]
    fn test_path_to_edge_horizontal() {
        let edge = path_to_edge(10.0, 100.0, 210.0, 100.5).unwrap();
        assert_eq!(edge.orientation, Orientation::Horizontal);
        assert_eq!(edge.x0, 10.0);
        assert_eq!(edge.x1, 210.0);
    }

    #[test]
    fn test_path_to_edge_vertical() {
        let edge = path_to_edge(50.0, 100.0, 50.5, 300.0).unwrap();
        assert_eq!(edge.orientation, Orientation::Vertical);
        assert_eq!(edge.height(), 200.0);
    }

    #[test]
    fn test_path_to_edge_rejects_blobs() {
        assert!(path_to_edge(0.0, 0.0, 50.0, 50.0).is_none());
    }

    #[test]
    fn test_bounds_to_edges() {
        let edges = bounds_to_edges(10.0, 20.0, 110.0, 80.0);
        assert_eq!(edges.len(), 4);
        let horizontal = edges
            .iter()
            .filter(|e| e.orientation == Orientation::Horizontal)
            .count();
        assert_eq!(horizontal, 2);
    }

    #[test]
    fn test_page_border_detection() {
        let page_w = 612.0;
        let page_h = 792.0;

        // Near the top edge.
        assert!(is_page_border(&Edge::horizontal(100.0, 300.0, 10.0), page_w, page_h));
        // Spans nearly the full width.
        assert!(is_page_border(&Edge::horizontal(20.0, 600.0, 400.0), page_w, page_h));
        // An interior table line.
        assert!(!is_page_border(&Edge::horizontal(100.0, 300.0, 400.0), page_w, page_h));

        // Near the left edge.
        assert!(is_page_border(&Edge::vertical(5.0, 100.0, 300.0), page_w, page_h));
        // Spans nearly the full height.
        assert!(is_page_border(&Edge::vertical(300.0, 20.0, 780.0), page_w, page_h));
        assert!(!is_page_border(&Edge::vertical(300.0, 100.0, 300.0), page_w, page_h));
    }
}
