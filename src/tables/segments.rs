//! Segment-based table detection (PDF-TREX style).
//!
//! Bottom-up recognition for tables *without* ruling lines:
//!
//! 1. derive page-adaptive clustering thresholds from the spacing
//!    distribution,
//! 2. cluster each visual line's words into horizontally contiguous
//!    segments,
//! 3. tag lines by segment structure (text / table / unknown),
//! 4. group runs of table-ish lines into candidate table areas,
//! 5. cluster segments vertically into blocks (multi-line header
//!    recovery), build rows and columns, and intersect them into cells,
//! 6. validate, discarding areas that do not look like tables after
//!    all.

use crate::geometry::{
    clamp, horizontal_distance, median, overlap_ratio_h, overlap_ratio_v, stdev,
    vertical_distance, Rect, ReadingDirection,
};
use crate::layout::line_grouper::group_block_lines;
use crate::layout::text_block::{EnrichedWord, Line, TextBlock};
use crate::tables::{LineType, Table, TableCell, TableRow};
use crate::utils::safe_float_cmp;

/// Gaps at or above this value are layout artefacts, not word spacing.
const GAP_OUTLIER: f64 = 200.0;

/// Same-line / same-column overlap requirement used throughout.
const OVERLAP_THRESHOLD: f64 = 0.3;

/// Clustering thresholds derived from one page's spacing distribution.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveThresholds {
    /// hT: maximum intra-segment horizontal gap
    pub horizontal: f64,
    /// vT: maximum intra-block vertical gap
    pub vertical: f64,
}

impl Default for AdaptiveThresholds {
    fn default() -> Self {
        Self {
            horizontal: 20.0,
            vertical: 5.0,
        }
    }
}

impl AdaptiveThresholds {
    /// Derive thresholds from the page's own word spacing.
    ///
    /// Horizontal gaps are measured between consecutive words that share
    /// a visual line; vertical gaps between consecutive lines. Each
    /// threshold is `median + 1.5 * stdev`, clamped to `[5, 100]`; pages
    /// with too little data keep the defaults.
    pub fn from_words(words: &[EnrichedWord]) -> Self {
        if words.len() < 2 {
            return Self::default();
        }

        let mut sorted = words.to_vec();
        sorted.sort_by(|a, b| {
            if (a.bbox.y0 - b.bbox.y0).abs() < 5.0 {
                safe_float_cmp(&a.bbox.x0, &b.bbox.x0)
            } else {
                safe_float_cmp(&a.bbox.y0, &b.bbox.y0)
            }
        });

        let mut horizontal_gaps = Vec::new();
        for pair in sorted.windows(2) {
            if overlap_ratio_h(&pair[0].bbox, &pair[1].bbox) > OVERLAP_THRESHOLD {
                let gap = pair[1].bbox.x0 - pair[0].bbox.x1;
                if gap > 0.0 && gap < GAP_OUTLIER {
                    horizontal_gaps.push(gap);
                }
            }
        }

        let mut vertical_gaps = Vec::new();
        let mut line_y = sorted[0].bbox.y0;
        let mut line_bottom = sorted[0].bbox.y1;
        for word in &sorted[1..] {
            if (word.bbox.y0 - line_y).abs() > 5.0 {
                let gap = word.bbox.y0 - line_bottom;
                if gap > 0.0 && gap < GAP_OUTLIER {
                    vertical_gaps.push(gap);
                }
                line_y = word.bbox.y0;
                line_bottom = word.bbox.y1;
            } else {
                line_bottom = line_bottom.max(word.bbox.y1);
            }
        }

        let defaults = Self::default();
        Self {
            horizontal: threshold_from_gaps(&horizontal_gaps, defaults.horizontal),
            vertical: threshold_from_gaps(&vertical_gaps, defaults.vertical),
        }
    }
}

fn threshold_from_gaps(gaps: &[f64], default: f64) -> f64 {
    if gaps.len() < 3 {
        return default;
    }
    clamp(median(gaps) + 1.5 * stdev(gaps), 5.0, 100.0)
}

/// A horizontally contiguous cluster of words within one line.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Member words
    pub words: Vec<EnrichedWord>,
    /// Union bounding box
    pub bbox: Rect,
}

/// A line together with its segments and classification.
#[derive(Debug, Clone)]
pub struct TaggedLine {
    /// The underlying visual line
    pub line: Line,
    /// Its segments
    pub segments: Vec<Segment>,
    /// Classification
    pub line_type: LineType,
}

/// Cluster a line's words into segments by agglomerative single-linkage.
///
/// Starts one cluster per word and repeatedly merges the closest pair
/// (by horizontal gap) until the minimum gap exceeds `h_threshold`.
pub fn build_segments_from_line(line: &Line, h_threshold: f64) -> Vec<Segment> {
    let mut clusters: Vec<Segment> = line
        .words
        .iter()
        .map(|w| Segment {
            words: vec![w.clone()],
            bbox: w.bbox,
        })
        .collect();

    while clusters.len() > 1 {
        let mut min_dist = f64::INFINITY;
        let mut best = None;

        for i in 0..clusters.len() - 1 {
            for j in i + 1..clusters.len() {
                let dist = horizontal_distance(&clusters[i].bbox, &clusters[j].bbox);
                if dist < min_dist {
                    min_dist = dist;
                    best = Some((i, j));
                }
            }
        }

        let Some((i, j)) = best else { break };
        if min_dist > h_threshold {
            break;
        }

        let removed = clusters.remove(j);
        clusters[i].words.extend(removed.words);
        clusters[i].bbox = clusters[i].bbox.union(&removed.bbox);
    }

    for cluster in &mut clusters {
        cluster
            .words
            .sort_by(|a, b| safe_float_cmp(&a.bbox.x0, &b.bbox.x0));
    }
    clusters.sort_by(|a, b| safe_float_cmp(&a.bbox.x0, &b.bbox.x0));
    clusters
}

/// Classify a line from its segments.
pub fn tag_line(segments: &[Segment], page_width: f64) -> LineType {
    match segments.len() {
        0 => LineType::Unknown,
        1 => {
            if segments[0].bbox.width() > page_width * 0.5 {
                LineType::Text
            } else {
                LineType::Unknown
            }
        }
        _ => LineType::Table,
    }
}

/// Segment and tag every line.
pub fn build_tagged_lines(lines: &[Line], h_threshold: f64, page_width: f64) -> Vec<TaggedLine> {
    lines
        .iter()
        .map(|line| {
            let segments = build_segments_from_line(line, h_threshold);
            let line_type = tag_line(&segments, page_width);
            TaggedLine {
                line: line.clone(),
                segments,
                line_type,
            }
        })
        .collect()
}

/// A maximal run of table/unknown lines: a candidate table region.
#[derive(Debug, Clone)]
pub struct TableArea {
    /// Member lines in page order
    pub lines: Vec<TaggedLine>,
    /// Union of the line boxes
    pub bbox: Rect,
}

/// Group maximal runs of non-text lines into table areas.
pub fn build_table_areas(tagged: Vec<TaggedLine>) -> Vec<TableArea> {
    let mut areas = Vec::new();
    let mut current: Vec<TaggedLine> = Vec::new();

    for tl in tagged {
        match tl.line_type {
            LineType::Table | LineType::Unknown => current.push(tl),
            LineType::Text => {
                if !current.is_empty() {
                    areas.push(make_area(std::mem::take(&mut current)));
                }
            }
        }
    }
    if !current.is_empty() {
        areas.push(make_area(current));
    }

    areas
}

fn make_area(lines: Vec<TaggedLine>) -> TableArea {
    let bbox = lines
        .iter()
        .map(|tl| tl.line.bbox)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();
    TableArea { lines, bbox }
}

/// A vertically contiguous cluster of segments across adjacent lines.
#[derive(Debug, Clone)]
struct Block {
    segments: Vec<Segment>,
    bbox: Rect,
    line_indices: Vec<usize>,
}

/// Cluster an area's segments vertically into blocks.
///
/// Single-linkage over vertical distance; only segment pairs whose
/// horizontal projections overlap are merge candidates. Blocks spanning
/// several lines recover multi-line headers.
fn build_blocks(area: &TableArea, v_threshold: f64) -> Vec<Block> {
    let mut clusters: Vec<Block> = Vec::new();
    for (line_idx, tl) in area.lines.iter().enumerate() {
        for seg in &tl.segments {
            clusters.push(Block {
                segments: vec![seg.clone()],
                bbox: seg.bbox,
                line_indices: vec![line_idx],
            });
        }
    }

    loop {
        let mut min_dist = f64::INFINITY;
        let mut best = None;

        for i in 0..clusters.len().saturating_sub(1) {
            for j in i + 1..clusters.len() {
                if overlap_ratio_v(&clusters[i].bbox, &clusters[j].bbox) > OVERLAP_THRESHOLD {
                    let dist = vertical_distance(&clusters[i].bbox, &clusters[j].bbox);
                    if dist < min_dist {
                        min_dist = dist;
                        best = Some((i, j));
                    }
                }
            }
        }

        let Some((i, j)) = best else { break };
        if min_dist > v_threshold {
            break;
        }

        let removed = clusters.remove(j);
        clusters[i].segments.extend(removed.segments);
        clusters[i].bbox = clusters[i].bbox.union(&removed.bbox);
        clusters[i].line_indices.extend(removed.line_indices);
        clusters[i].line_indices.sort_unstable();
        clusters[i].line_indices.dedup();
    }

    clusters
}

/// A logical table row; may merge several visual lines.
#[derive(Debug, Clone)]
struct SegmentRow {
    segments: Vec<Segment>,
    bbox: Rect,
}

/// Build rows from blocks.
///
/// A block spanning multiple lines of which exactly one is a table line
/// becomes a single merged row (multi-line header); every other line
/// stays a row of its own. Rows come out in ascending y order.
fn build_rows(area: &TableArea, blocks: &[Block]) -> Vec<SegmentRow> {
    let mut assigned = vec![false; area.lines.len()];
    let mut rows = Vec::new();

    for block in blocks {
        if block.line_indices.len() > 1 {
            let table_lines = block
                .line_indices
                .iter()
                .filter(|&&idx| area.lines[idx].line_type == LineType::Table)
                .count();

            if table_lines == 1 {
                let fresh: Vec<usize> = block
                    .line_indices
                    .iter()
                    .copied()
                    .filter(|&idx| !assigned[idx])
                    .collect();
                if !fresh.is_empty() {
                    for &idx in &fresh {
                        assigned[idx] = true;
                    }
                    rows.push(SegmentRow {
                        segments: block.segments.clone(),
                        bbox: block.bbox,
                    });
                }
                continue;
            }
        }

        for &idx in &block.line_indices {
            if !assigned[idx] {
                assigned[idx] = true;
                rows.push(SegmentRow {
                    segments: area.lines[idx].segments.clone(),
                    bbox: area.lines[idx].line.bbox,
                });
            }
        }
    }

    for (idx, tl) in area.lines.iter().enumerate() {
        if !assigned[idx] {
            rows.push(SegmentRow {
                segments: tl.segments.clone(),
                bbox: tl.line.bbox,
            });
        }
    }

    rows.sort_by(|a, b| safe_float_cmp(&a.bbox.y0, &b.bbox.y0));
    rows
}

/// A logical table column.
#[derive(Debug, Clone)]
struct ColumnSpan {
    segments: Vec<Segment>,
    bbox: Rect,
}

/// Build columns from the rows' segments.
///
/// Segments grow column buckets by horizontal-projection overlap. A
/// segment overlapping several existing columns is duplicated into each
/// (spanning headers); single-segment columns close to a multi-segment
/// neighbour are folded into it; boundaries are made contiguous at the
/// midpoints.
fn build_columns(rows: &[SegmentRow], h_threshold: f64) -> Vec<ColumnSpan> {
    let mut columns: Vec<ColumnSpan> = Vec::new();

    for row in rows {
        for seg in &row.segments {
            let overlapping: Vec<usize> = columns
                .iter()
                .enumerate()
                .filter(|(_, col)| overlap_ratio_v(&seg.bbox, &col.bbox) > OVERLAP_THRESHOLD)
                .map(|(i, _)| i)
                .collect();

            match overlapping.len() {
                0 => columns.push(ColumnSpan {
                    segments: vec![seg.clone()],
                    bbox: seg.bbox,
                }),
                _ => {
                    for &i in &overlapping {
                        columns[i].segments.push(seg.clone());
                        columns[i].bbox = columns[i].bbox.union(&seg.bbox);
                    }
                }
            }
        }
    }

    let mut columns = merge_single_segment_columns(columns, h_threshold);
    columns.sort_by(|a, b| safe_float_cmp(&a.bbox.x0, &b.bbox.x0));
    make_columns_contiguous(&mut columns);
    columns
}

fn merge_single_segment_columns(columns: Vec<ColumnSpan>, h_threshold: f64) -> Vec<ColumnSpan> {
    if columns.len() <= 1 {
        return columns;
    }

    let multi: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.segments.len() > 1)
        .map(|(i, _)| i)
        .collect();

    // single column index -> multi column index absorbing it
    let mut merges: Vec<(usize, usize)> = Vec::new();
    for (i, col) in columns.iter().enumerate() {
        if col.segments.len() != 1 {
            continue;
        }
        for &m in &multi {
            if (col.bbox.center_x() - columns[m].bbox.center_x()).abs() < h_threshold {
                merges.push((i, m));
                break;
            }
        }
    }

    let mut absorbed = vec![false; columns.len()];
    let mut columns = columns;
    for &(single, target) in &merges {
        let segs = std::mem::take(&mut columns[single].segments);
        let bbox = columns[single].bbox;
        columns[target].segments.extend(segs);
        columns[target].bbox = columns[target].bbox.union(&bbox);
        absorbed[single] = true;
    }

    columns
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !absorbed[*i])
        .map(|(_, c)| c)
        .collect()
}

fn make_columns_contiguous(columns: &mut [ColumnSpan]) {
    for i in 0..columns.len().saturating_sub(1) {
        let midpoint = (columns[i].bbox.x1 + columns[i + 1].bbox.x0) / 2.0;
        columns[i].bbox.x1 = midpoint;
        columns[i + 1].bbox.x0 = midpoint;
    }
}

/// Intersect rows and columns into the final cell grid.
fn build_cells(rows: &[SegmentRow], columns: &[ColumnSpan]) -> Vec<Vec<TableCell>> {
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let mut cells = Vec::with_capacity(columns.len());
        for col in columns {
            let bbox = Rect::new(col.bbox.x0, row.bbox.y0, col.bbox.x1, row.bbox.y1);

            let mut words: Vec<EnrichedWord> = row
                .segments
                .iter()
                .flat_map(|seg| seg.words.iter())
                .filter(|w| {
                    let cx = w.bbox.center_x();
                    let cy = w.bbox.center_y();
                    cx >= bbox.x0 && cx <= bbox.x1 && cy >= bbox.y0 && cy <= bbox.y1
                })
                .cloned()
                .collect();

            words.sort_by(|a, b| {
                if (a.bbox.y0 - b.bbox.y0).abs() < 3.0 {
                    safe_float_cmp(&a.bbox.x0, &b.bbox.x0)
                } else {
                    safe_float_cmp(&a.bbox.y0, &b.bbox.y0)
                }
            });

            let mut content = String::new();
            for (i, word) in words.iter().enumerate() {
                if i > 0 {
                    if (words[i - 1].bbox.y0 - word.bbox.y0).abs() < 3.0 {
                        content.push(' ');
                    } else {
                        content.push('\n');
                    }
                }
                content.push_str(&word.text);
            }

            cells.push(TableCell {
                bbox,
                content,
                words,
            });
        }
        grid.push(cells);
    }

    grid
}

/// Structural validation of a candidate table area.
///
/// Suppresses the classic false positives: short runs of ragged lines,
/// centred pull quotes, and sparse forms.
fn validate_area(area: &TableArea) -> bool {
    if area.lines.len() < 3 {
        return false;
    }

    let table_lines: Vec<&TaggedLine> = area
        .lines
        .iter()
        .filter(|tl| tl.line_type == LineType::Table)
        .collect();
    if table_lines.len() < 3 {
        return false;
    }

    // Most table lines should agree on a segment count (within one of
    // the modal count).
    let modal_count = modal_segment_count(&table_lines);
    let similar = table_lines
        .iter()
        .filter(|tl| tl.segments.len().abs_diff(modal_count) <= 1)
        .count();
    if (similar as f64) < 0.6 * table_lines.len() as f64 {
        return false;
    }

    let total_segments: usize = area.lines.iter().map(|tl| tl.segments.len()).sum();
    if (total_segments as f64) < 2.0 * area.lines.len() as f64 {
        return false;
    }

    // Segments should sit on their lines: large vertical scatter around
    // the line centres means ragged text, not rows.
    let deviations: Vec<f64> = area
        .lines
        .iter()
        .flat_map(|tl| {
            let line_center = tl.line.bbox.center_y();
            tl.segments
                .iter()
                .map(move |s| s.bbox.center_y() - line_center)
        })
        .collect();
    let height = area.bbox.height();
    if height > 0.0 && stdev(&deviations) >= 0.2 * height {
        return false;
    }

    true
}

fn modal_segment_count(table_lines: &[&TaggedLine]) -> usize {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for tl in table_lines {
        let n = tl.segments.len();
        match counts.iter_mut().find(|(count, _)| *count == n) {
            Some((_, freq)) => *freq += 1,
            None => counts.push((n, 1)),
        }
    }
    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i].1 > counts[best].1 {
            best = i;
        }
    }
    counts.get(best).map(|(n, _)| *n).unwrap_or(0)
}

/// Final validation of a completed table.
fn validate_table(table: &Table) -> bool {
    if table.num_rows < 4 || table.num_cols < 2 {
        return false;
    }

    if table
        .rows
        .iter()
        .any(|row| row.cells.len() != table.num_cols)
    {
        return false;
    }

    let total: usize = table.rows.iter().map(|r| r.cells.len()).sum();
    if total == 0 {
        return false;
    }
    let non_empty = table
        .rows
        .iter()
        .flat_map(|r| r.cells.iter())
        .filter(|c| !c.content.is_empty())
        .count();
    non_empty as f64 / total as f64 >= 0.4
}

/// Detect tables in a page's words using the segment-based approach.
pub fn detect_tables_segment_based(
    words: &[EnrichedWord],
    page_width: f64,
    thresholds: &AdaptiveThresholds,
) -> Vec<Table> {
    if words.is_empty() {
        return Vec::new();
    }

    let block = TextBlock {
        words: words.to_vec(),
        lines: Vec::new(),
        rotation: 0.0,
        direction: ReadingDirection::Ltr,
    };
    let lines = group_block_lines(&block);

    let tagged = build_tagged_lines(&lines, thresholds.horizontal, page_width);
    let areas = build_table_areas(tagged);

    log::trace!(
        "segment detector: {} lines, {} candidate areas (hT {:.1}, vT {:.1})",
        lines.len(),
        areas.len(),
        thresholds.horizontal,
        thresholds.vertical
    );

    let mut tables = Vec::new();
    for area in areas {
        if !validate_area(&area) {
            continue;
        }

        let blocks = build_blocks(&area, thresholds.vertical);
        let rows = build_rows(&area, &blocks);
        let columns = build_columns(&rows, thresholds.horizontal);
        if rows.is_empty() || columns.is_empty() {
            continue;
        }

        let grid = build_cells(&rows, &columns);
        let table = grid_to_table(grid, &area);
        if validate_table(&table) {
            tables.push(table);
        }
    }

    tables
}

fn grid_to_table(grid: Vec<Vec<TableCell>>, area: &TableArea) -> Table {
    let num_rows = grid.len();
    let num_cols = grid.first().map(|r| r.len()).unwrap_or(0);

    let cells: Vec<Rect> = grid.iter().flatten().map(|c| c.bbox).collect();
    let rows: Vec<TableRow> = grid
        .into_iter()
        .map(|cells| {
            let bbox = cells
                .iter()
                .map(|c| c.bbox)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_default();
            TableRow { cells, bbox }
        })
        .collect();

    Table {
        bbox: area.bbox,
        rows,
        cells,
        num_rows,
        num_cols,
    }
}
