//! Line-based table detection.
//!
//! Reconstructs the cell lattice of ruled tables: snap nearly-collinear
//! edges onto shared positions, join touching collinear pieces, find
//! the intersection points of the vertical and horizontal edge sets,
//! derive minimal rectangular cells from edge-connected intersections,
//! and group corner-sharing cells into tables. Cell text is filled from
//! the words whose centres land inside each cell.
//!
//! Edges come from the page's path objects; pages without ruling lines
//! fall back to pseudo-edges inferred from word alignment, depending on
//! the configured strategy.

use crate::config::{EdgeStrategy, TableSettings};
use crate::geometry::Rect;
use crate::layout::text_block::EnrichedWord;
use crate::tables::text_edges::{words_to_edges_horizontal, words_to_edges_vertical};
use crate::tables::{Edge, Orientation, Table, TableCell, TableRow};
use crate::utils::safe_float_cmp;

/// Same-row tolerance when assembling cells into rows, in points.
const ROW_TOLERANCE: f64 = 1.0;

/// Word-membership tolerance around a cell boundary, in points.
const CELL_WORD_TOLERANCE: f64 = 1.0;

/// Same-visual-line tolerance when joining a cell's words, in points.
const CELL_LINE_TOLERANCE: f64 = 2.0;

/// Detect ruled tables from edges and words.
pub fn detect_tables_line_based(
    words: &[EnrichedWord],
    ruling_edges: &[Edge],
    settings: &TableSettings,
) -> Vec<Table> {
    let edges = gather_edges(words, ruling_edges, settings);
    if edges.is_empty() || words.is_empty() {
        return Vec::new();
    }

    let edges = merge_edges(edges, settings);
    let edges = filter_edges_by_length(edges, settings.edge_min_length);

    let intersections = find_intersections(&edges, settings);
    let cells = intersections_to_cells(&intersections);
    let groups = cells_to_tables(cells);

    log::trace!(
        "lattice detector: {} edges, {} intersections, {} table groups",
        edges.len(),
        intersections.len(),
        groups.len()
    );

    groups
        .into_iter()
        .map(|cells| build_table(cells, words))
        .collect()
}

/// Collect the edge set according to the per-axis strategies.
///
/// The `Lines` strategy prefers real ruling edges but falls back to
/// text-derived pseudo-edges when the page draws none.
fn gather_edges(
    words: &[EnrichedWord],
    ruling_edges: &[Edge],
    settings: &TableSettings,
) -> Vec<Edge> {
    let mut edges = Vec::new();

    let mut ruling_vertical = 0usize;
    if matches!(
        settings.vertical_strategy,
        EdgeStrategy::Lines | EdgeStrategy::LinesText
    ) {
        for edge in ruling_edges {
            if edge.orientation == Orientation::Vertical {
                edges.push(*edge);
                ruling_vertical += 1;
            }
        }
    }
    let vertical_fallback =
        ruling_vertical == 0 && settings.vertical_strategy == EdgeStrategy::Lines;
    if vertical_fallback
        || matches!(
            settings.vertical_strategy,
            EdgeStrategy::Text | EdgeStrategy::LinesText
        )
    {
        edges.extend(words_to_edges_vertical(words, settings.min_words_vertical));
    }

    let mut ruling_horizontal = 0usize;
    if matches!(
        settings.horizontal_strategy,
        EdgeStrategy::Lines | EdgeStrategy::LinesText
    ) {
        for edge in ruling_edges {
            if edge.orientation == Orientation::Horizontal {
                edges.push(*edge);
                ruling_horizontal += 1;
            }
        }
    }
    let horizontal_fallback =
        ruling_horizontal == 0 && settings.horizontal_strategy == EdgeStrategy::Lines;
    if horizontal_fallback
        || matches!(
            settings.horizontal_strategy,
            EdgeStrategy::Text | EdgeStrategy::LinesText
        )
    {
        edges.extend(words_to_edges_horizontal(
            words,
            settings.min_words_horizontal,
        ));
    }

    edges
}

/// Snap nearby parallel edges onto shared positions, then join touching
/// collinear edges.
fn merge_edges(edges: Vec<Edge>, settings: &TableSettings) -> Vec<Edge> {
    let edges = if settings.snap_tolerance > 0.0 {
        snap_edges(edges, settings.snap_tolerance)
    } else {
        edges
    };

    // Group by orientation and snapped position; join within groups.
    let mut groups: Vec<(Orientation, f64, Vec<Edge>)> = Vec::new();
    for edge in edges {
        let position = match edge.orientation {
            Orientation::Horizontal => edge.top,
            Orientation::Vertical => edge.x0,
        };
        match groups
            .iter_mut()
            .find(|(o, p, _)| *o == edge.orientation && *p == position)
        {
            Some((_, _, members)) => members.push(edge),
            None => groups.push((edge.orientation, position, vec![edge])),
        }
    }

    let mut result = Vec::new();
    for (orientation, _, members) in groups {
        result.extend(join_edge_group(members, orientation, settings.join_tolerance));
    }
    result
}

/// Snap edges within tolerance of each other to their cluster's running
/// mean position (x for vertical edges, y for horizontal ones).
fn snap_edges(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let mut result = edges;

    for orientation in [Orientation::Vertical, Orientation::Horizontal] {
        // position clusters: (running mean, member indices)
        let mut clusters: Vec<(f64, Vec<usize>)> = Vec::new();
        for (i, edge) in result.iter().enumerate() {
            if edge.orientation != orientation {
                continue;
            }
            let value = match orientation {
                Orientation::Vertical => edge.x0,
                Orientation::Horizontal => edge.top,
            };
            match clusters
                .iter_mut()
                .find(|(pos, _)| (*pos - value).abs() <= tolerance)
            {
                Some((pos, members)) => {
                    members.push(i);
                    *pos = (*pos * (members.len() - 1) as f64 + value) / members.len() as f64;
                }
                None => clusters.push((value, vec![i])),
            }
        }

        for (position, members) in clusters {
            for idx in members {
                let edge = &mut result[idx];
                match orientation {
                    Orientation::Vertical => {
                        let diff = position - edge.x0;
                        edge.x0 = position;
                        edge.x1 += diff;
                    }
                    Orientation::Horizontal => {
                        let diff = position - edge.top;
                        edge.top = position;
                        edge.bottom += diff;
                    }
                }
            }
        }
    }

    result
}

/// Join collinear edges whose spans touch or nearly touch.
fn join_edge_group(mut edges: Vec<Edge>, orientation: Orientation, tolerance: f64) -> Vec<Edge> {
    if edges.is_empty() {
        return edges;
    }

    let start = |e: &Edge| match orientation {
        Orientation::Horizontal => e.x0,
        Orientation::Vertical => e.top,
    };
    let end = |e: &Edge| match orientation {
        Orientation::Horizontal => e.x1,
        Orientation::Vertical => e.bottom,
    };

    edges.sort_by(|a, b| safe_float_cmp(&start(a), &start(b)));

    let mut joined = vec![edges[0]];
    for edge in edges.into_iter().skip(1) {
        let last = joined.last_mut().expect("seeded with first edge");
        if start(&edge) <= end(last) + tolerance {
            if end(&edge) > end(last) {
                match orientation {
                    Orientation::Horizontal => last.x1 = edge.x1,
                    Orientation::Vertical => last.bottom = edge.bottom,
                }
            }
        } else {
            joined.push(edge);
        }
    }

    joined
}

fn filter_edges_by_length(edges: Vec<Edge>, min_length: f64) -> Vec<Edge> {
    if min_length <= 0.0 {
        return edges;
    }
    edges
        .into_iter()
        .filter(|e| e.length() >= min_length)
        .collect()
}

/// An intersection point with the edges meeting there (indices into the
/// merged edge list).
#[derive(Debug)]
struct IntersectionPoint {
    x: f64,
    y: f64,
    vertical: Vec<usize>,
    horizontal: Vec<usize>,
}

/// Find every (vertical, horizontal) edge crossing within tolerance.
fn find_intersections(edges: &[Edge], settings: &TableSettings) -> Vec<IntersectionPoint> {
    let tolerance = settings.intersection_tolerance;
    let mut points: Vec<IntersectionPoint> = Vec::new();

    for (vi, v) in edges.iter().enumerate() {
        if v.orientation != Orientation::Vertical {
            continue;
        }
        for (hi, h) in edges.iter().enumerate() {
            if h.orientation != Orientation::Horizontal {
                continue;
            }

            let crosses = v.top <= h.top + tolerance
                && v.bottom >= h.top - tolerance
                && v.x0 >= h.x0 - tolerance
                && v.x0 <= h.x1 + tolerance;
            if !crosses {
                continue;
            }

            match points
                .iter_mut()
                .find(|p| p.x == v.x0 && p.y == h.top)
            {
                Some(point) => {
                    if !point.vertical.contains(&vi) {
                        point.vertical.push(vi);
                    }
                    if !point.horizontal.contains(&hi) {
                        point.horizontal.push(hi);
                    }
                }
                None => points.push(IntersectionPoint {
                    x: v.x0,
                    y: h.top,
                    vertical: vec![vi],
                    horizontal: vec![hi],
                }),
            }
        }
    }

    points.sort_by(|a, b| safe_float_cmp(&a.y, &b.y).then(safe_float_cmp(&a.x, &b.x)));
    points
}

/// Whether two intersection points are joined by a shared edge.
fn edge_connects(points: &[IntersectionPoint], a: usize, b: usize) -> bool {
    let (pa, pb) = (&points[a], &points[b]);
    if pa.x == pb.x && pa.vertical.iter().any(|e| pb.vertical.contains(e)) {
        return true;
    }
    if pa.y == pb.y && pa.horizontal.iter().any(|e| pb.horizontal.contains(e)) {
        return true;
    }
    false
}

/// Derive minimal cells: for each intersection, take its nearest
/// rightward and downward neighbours; if all four corners exist and are
/// edge-connected, the quad is a cell.
fn intersections_to_cells(points: &[IntersectionPoint]) -> Vec<Rect> {
    let mut cells = Vec::new();

    for (i, pt) in points.iter().enumerate() {
        let mut nearest_right: Option<usize> = None;
        let mut nearest_below: Option<usize> = None;

        for (j, other) in points.iter().enumerate() {
            if j == i {
                continue;
            }
            if other.x == pt.x && other.y > pt.y {
                if nearest_below.is_none_or(|k| other.y < points[k].y) {
                    nearest_below = Some(j);
                }
            }
            if other.y == pt.y && other.x > pt.x {
                if nearest_right.is_none_or(|k| other.x < points[k].x) {
                    nearest_right = Some(j);
                }
            }
        }

        let (Some(right), Some(below)) = (nearest_right, nearest_below) else {
            continue;
        };
        if !edge_connects(points, i, right) || !edge_connects(points, i, below) {
            continue;
        }

        let corner = points
            .iter()
            .position(|p| p.x == points[right].x && p.y == points[below].y);
        let Some(corner) = corner else { continue };

        if edge_connects(points, corner, right) && edge_connects(points, corner, below) {
            cells.push(Rect::new(pt.x, pt.y, points[right].x, points[below].y));
        }
    }

    cells
}

/// Group cells into tables by corner sharing.
fn cells_to_tables(cells: Vec<Rect>) -> Vec<Vec<Rect>> {
    let corners_of = |cell: &Rect| {
        [
            (cell.x0, cell.y0),
            (cell.x0, cell.y1),
            (cell.x1, cell.y0),
            (cell.x1, cell.y1),
        ]
    };

    let mut remaining = cells;
    let mut tables: Vec<Vec<Rect>> = Vec::new();

    while !remaining.is_empty() {
        let mut current = vec![remaining.remove(0)];
        let mut corners: Vec<(f64, f64)> = corners_of(&current[0]).to_vec();

        loop {
            let before = current.len();
            let mut i = 0;
            while i < remaining.len() {
                let shares = corners_of(&remaining[i])
                    .iter()
                    .any(|c| corners.contains(c));
                if shares {
                    let cell = remaining.remove(i);
                    corners.extend(corners_of(&cell));
                    current.push(cell);
                } else {
                    i += 1;
                }
            }
            if current.len() == before {
                break;
            }
        }

        if current.len() > 1 {
            tables.push(current);
        }
    }

    tables
}

/// Assemble one table: organise cells into rows, pull in cell text from
/// word positions, and prune rows with no content at all.
fn build_table(cells: Vec<Rect>, words: &[EnrichedWord]) -> Table {
    let bbox = cells
        .iter()
        .copied()
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();

    // Rows by shared top coordinate.
    let mut row_groups: Vec<(f64, Vec<Rect>)> = Vec::new();
    for cell in &cells {
        match row_groups
            .iter_mut()
            .find(|(top, _)| (*top - cell.y0).abs() < ROW_TOLERANCE)
        {
            Some((_, members)) => members.push(*cell),
            None => row_groups.push((cell.y0, vec![*cell])),
        }
    }
    row_groups.sort_by(|a, b| safe_float_cmp(&a.0, &b.0));

    let mut rows = Vec::with_capacity(row_groups.len());
    let mut num_cols = 0usize;

    for (_, mut members) in row_groups {
        members.sort_by(|a, b| safe_float_cmp(&a.x0, &b.x0));

        let row_cells: Vec<TableCell> = members
            .iter()
            .map(|&cell_bbox| fill_cell(cell_bbox, words))
            .collect();

        num_cols = num_cols.max(row_cells.len());

        let row_bbox = members
            .iter()
            .copied()
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        rows.push(TableRow {
            cells: row_cells,
            bbox: row_bbox,
        });
    }

    // Prune rows whose cells are all empty.
    let rows: Vec<TableRow> = rows
        .into_iter()
        .filter(|row| row.cells.iter().any(|c| !c.content.is_empty()))
        .collect();

    Table {
        bbox,
        num_rows: rows.len(),
        num_cols,
        rows,
        cells,
    }
}

/// Collect and lay out the text of one cell.
fn fill_cell(bbox: Rect, words: &[EnrichedWord]) -> TableCell {
    let mut members: Vec<EnrichedWord> = words
        .iter()
        .filter(|w| {
            let cx = w.bbox.center_x();
            let cy = w.bbox.center_y();
            cx >= bbox.x0 - CELL_WORD_TOLERANCE
                && cx <= bbox.x1 + CELL_WORD_TOLERANCE
                && cy >= bbox.y0 - CELL_WORD_TOLERANCE
                && cy <= bbox.y1 + CELL_WORD_TOLERANCE
        })
        .cloned()
        .collect();

    members.sort_by(|a, b| {
        if (a.bbox.y0 - b.bbox.y0).abs() < CELL_LINE_TOLERANCE {
            safe_float_cmp(&a.bbox.x0, &b.bbox.x0)
        } else {
            safe_float_cmp(&a.bbox.y0, &b.bbox.y0)
        }
    });

    let mut content = String::new();
    for (i, word) in members.iter().enumerate() {
        if i > 0 {
            if word.bbox.y0 - members[i - 1].bbox.y1 > CELL_LINE_TOLERANCE {
                content.push('\n');
            } else {
                content.push(' ');
            }
        }
        content.push_str(&word.text);
    }

    TableCell {
        bbox,
        content,
        words: members,
    }
}
