//! Table detection.
//!
//! Two independent detectors run over the same page data:
//!
//! - the segment-based detector (`segments`), a bottom-up PDF-TREX
//!   clustering for tables *without* ruling lines, and
//! - the line-based detector (`lattice`), which reconstructs the cell
//!   lattice from ruling-line edges (real ones from path objects, or
//!   pseudo-edges inferred from word alignment, `text_edges`).
//!
//! Their results are reconciled by overlap deduplication: when both
//! find the same region, the segment-based result wins by coming first.

pub mod lattice;
pub mod segments;
pub mod text_edges;

use serde::Serialize;

use crate::config::Config;
use crate::geometry::Rect;
use crate::layout::text_block::EnrichedWord;

/// Orientation of a ruling-line edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    /// Horizontal edge
    Horizontal,
    /// Vertical edge
    Vertical,
}

/// A horizontal or vertical line segment used for table detection.
///
/// Horizontal edges run from `x0` to `x1` at `top == bottom`; vertical
/// edges run from `top` to `bottom` at `x0 == x1` (after snapping).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Edge {
    /// Left x coordinate
    pub x0: f64,
    /// Right x coordinate
    pub x1: f64,
    /// Top y coordinate
    pub top: f64,
    /// Bottom y coordinate
    pub bottom: f64,
    /// Orientation
    pub orientation: Orientation,
}

impl Edge {
    /// Create a horizontal edge.
    pub fn horizontal(x0: f64, x1: f64, y: f64) -> Self {
        Self {
            x0,
            x1,
            top: y,
            bottom: y,
            orientation: Orientation::Horizontal,
        }
    }

    /// Create a vertical edge.
    pub fn vertical(x: f64, top: f64, bottom: f64) -> Self {
        Self {
            x0: x,
            x1: x,
            top,
            bottom,
            orientation: Orientation::Vertical,
        }
    }

    /// Width of the edge (meaningful for horizontal edges).
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the edge (meaningful for vertical edges).
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Length along the edge's own axis.
    pub fn length(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.width(),
            Orientation::Vertical => self.height(),
        }
    }
}

/// Classification of a visual line during segment-based detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Single segment spanning more than half the page width
    Text,
    /// Two or more segments
    Table,
    /// Single segment narrower than half the page width
    Unknown,
}

/// A detected table cell.
#[derive(Debug, Clone, Serialize)]
pub struct TableCell {
    /// Cell bounding box
    pub bbox: Rect,
    /// Textual content: space-joined within a visual line, newline
    /// between lines
    pub content: String,
    /// Words contributing to the cell
    pub words: Vec<EnrichedWord>,
}

/// A row of cells.
#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    /// Cells in left-to-right order
    pub cells: Vec<TableCell>,
    /// Row bounding box
    pub bbox: Rect,
}

/// A detected table.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    /// Table bounding box
    pub bbox: Rect,
    /// Rows in top-to-bottom order
    pub rows: Vec<TableRow>,
    /// Raw cell bounding boxes, before row assembly
    pub cells: Vec<Rect>,
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
}

/// Detect tables on a page.
///
/// Runs the detectors the configuration enables and reconciles their
/// output. Call only when `config.detect_tables` is set; with it off the
/// page must carry no tables at all.
pub fn detect_tables(
    words: &[EnrichedWord],
    edges: &[Edge],
    page_width: f64,
    config: &Config,
) -> Vec<Table> {
    let mut tables = Vec::new();

    if config.use_segment_based_tables {
        let thresholds = if config.use_adaptive_thresholds {
            segments::AdaptiveThresholds::from_words(words)
        } else {
            segments::AdaptiveThresholds::default()
        };
        tables.extend(segments::detect_tables_segment_based(
            words, page_width, &thresholds,
        ));
    }

    tables.extend(lattice::detect_tables_line_based(
        words,
        edges,
        &config.table_settings,
    ));

    deduplicate_tables(tables)
}

/// Drop tables that substantially overlap an earlier one.
///
/// Overlap is intersection area over the smaller table's area; above
/// 0.7 the later table is considered a duplicate detection of the same
/// region.
pub fn deduplicate_tables(tables: Vec<Table>) -> Vec<Table> {
    let mut kept: Vec<Table> = Vec::with_capacity(tables.len());

    for table in tables {
        let duplicate = kept.iter().any(|existing| {
            let intersection = existing.bbox.intersection_area(&table.bbox);
            let min_area = existing.bbox.area().min(table.bbox.area());
            min_area > 0.0 && intersection / min_area > 0.7
        });
        if !duplicate {
            kept.push(table);
        }
    }

    kept
}
