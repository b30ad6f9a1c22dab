//! Column detection via a vertical projection profile.
//!
//! A 1 pt resolution histogram of word coverage across the page width
//! exposes the inter-column gutters as valleys: runs of bins far below
//! the average density. Valleys wide enough (and far enough from the
//! page edges to not be margins) split the page into columns; reading
//! order is then column-major.

use crate::geometry::Rect;
use crate::layout::text_block::{Column, EnrichedWord, Paragraph};
use crate::utils::safe_float_cmp;

/// Minimum gutter width, in points.
const MIN_VALLEY_WIDTH: f64 = 20.0;

/// A valley bin must stay at or below this fraction of the average
/// non-zero bin density.
const VALLEY_DENSITY: f64 = 0.2;

/// Valleys this close to a page edge are margins, not gutters.
const EDGE_MARGIN: f64 = 50.0;

/// Detect the column layout of a page from its words.
///
/// Returns one column per gutter-separated region; a page without
/// qualifying valleys yields a single full-width column.
pub fn detect_columns(words: &[EnrichedWord], page_width: f64) -> Vec<Column> {
    if words.is_empty() {
        return Vec::new();
    }

    let bins = build_projection_profile(words, page_width);
    let valleys = find_significant_valleys(&bins, page_width);

    log::debug!(
        "column detection: {} words, {} valleys -> {} columns",
        words.len(),
        valleys.len(),
        valleys.len() + 1
    );

    if valleys.is_empty() {
        return vec![Column {
            bbox: Rect::new(0.0, 0.0, page_width, max_y(words)),
            words: words.to_vec(),
            index: 0,
        }];
    }

    let mut columns = Vec::with_capacity(valleys.len() + 1);
    let mut start = 0.0;

    for &valley in valleys.iter().chain(std::iter::once(&page_width)) {
        let members: Vec<EnrichedWord> = words
            .iter()
            .filter(|w| {
                let center = w.bbox.center_x();
                center >= start && center < valley
            })
            .cloned()
            .collect();

        if !members.is_empty() {
            let index = columns.len();
            columns.push(Column {
                bbox: Rect::new(start, 0.0, valley, max_y(&members)),
                words: members,
                index,
            });
        }
        start = valley;
    }

    columns
}

/// Word-coverage histogram at 1 pt resolution across the page width.
fn build_projection_profile(words: &[EnrichedWord], page_width: f64) -> Vec<u32> {
    let num_bins = page_width.ceil().max(1.0) as usize;
    let mut bins = vec![0u32; num_bins];

    for word in words {
        let start = (word.bbox.x0.max(0.0)) as usize;
        let end = (word.bbox.x1.ceil() as usize).min(num_bins);
        for bin in bins.iter_mut().take(end).skip(start.min(num_bins)) {
            *bin += 1;
        }
    }

    bins
}

/// Locate gutters: maximal low-density runs wide enough to matter,
/// away from the page edges. Returns valley centre positions.
fn find_significant_valleys(bins: &[u32], page_width: f64) -> Vec<f64> {
    let non_zero: Vec<u32> = bins.iter().copied().filter(|&c| c > 0).collect();
    if non_zero.is_empty() {
        return Vec::new();
    }

    let avg_density =
        non_zero.iter().map(|&c| c as f64).sum::<f64>() / non_zero.len() as f64;
    let threshold = (avg_density * VALLEY_DENSITY) as u32;

    let mut valleys = Vec::new();
    let mut valley_start: Option<usize> = None;

    for (i, &count) in bins.iter().enumerate() {
        if count <= threshold {
            valley_start.get_or_insert(i);
        } else if let Some(start) = valley_start.take() {
            let width = (i - start) as f64;
            if width >= MIN_VALLEY_WIDTH {
                valleys.push((start + i) as f64 / 2.0);
            }
        }
    }
    // A trailing low-density run is page margin, not a gutter; the edge
    // filter below would reject it anyway.
    if let Some(start) = valley_start {
        let width = (bins.len() - start) as f64;
        if width >= MIN_VALLEY_WIDTH {
            valleys.push((start + bins.len()) as f64 / 2.0);
        }
    }

    valleys
        .into_iter()
        .filter(|&v| v > EDGE_MARGIN && v < page_width - EDGE_MARGIN)
        .collect()
}

fn max_y(words: &[EnrichedWord]) -> f64 {
    words.iter().map(|w| w.bbox.y1).fold(0.0, f64::max)
}

/// Order paragraphs for reading.
///
/// Single column: top to bottom. Multiple columns: columns left to
/// right, paragraphs top to bottom within each; a paragraph belongs to
/// the column holding its horizontal centre.
pub fn determine_reading_order(paragraphs: Vec<Paragraph>, columns: &[Column]) -> Vec<Paragraph> {
    if paragraphs.is_empty() {
        return paragraphs;
    }

    if columns.len() <= 1 {
        let mut sorted = paragraphs;
        sorted.sort_by(|a, b| safe_float_cmp(&a.bbox.y0, &b.bbox.y0));
        return sorted;
    }

    let mut sorted_columns: Vec<&Column> = columns.iter().collect();
    sorted_columns.sort_by(|a, b| safe_float_cmp(&a.bbox.x0, &b.bbox.x0));

    let mut remaining: Vec<Option<Paragraph>> = paragraphs.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    for column in &sorted_columns {
        let mut in_column: Vec<Paragraph> = Vec::new();
        for slot in remaining.iter_mut() {
            let belongs = slot
                .as_ref()
                .is_some_and(|p| {
                    let center = p.bbox.center_x();
                    center >= column.bbox.x0 && center < column.bbox.x1
                });
            if belongs {
                in_column.push(slot.take().expect("checked above"));
            }
        }
        in_column.sort_by(|a, b| safe_float_cmp(&a.bbox.y0, &b.bbox.y0));
        ordered.extend(in_column);
    }

    // Paragraphs outside every column (centre on a gutter boundary) keep
    // their original relative order at the end.
    ordered.extend(remaining.into_iter().flatten());

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rgba;
    use crate::layout::text_block::{Alignment, Line};

    fn mock_word(x0: f64, y0: f64, x1: f64, y1: f64) -> EnrichedWord {
        EnrichedWord {
            text: "w".to_string(),
            bbox: Rect::new(x0, y0, x1, y1),
            font_size: 12.0,
            font_weight: 400,
            font_name: "Helvetica".to_string(),
            font_flags: 0,
            fill_color: Rgba::black(),
            is_bold: false,
            is_italic: false,
            is_monospace: false,
            baseline: y1 - 1.8,
            x_height: (y1 - y0) * 0.7,
            rotation: 0.0,
        }
    }

    fn mock_paragraph(x0: f64, y0: f64, x1: f64, y1: f64) -> Paragraph {
        let line = Line {
            words: vec![mock_word(x0, y0, x1, y1)],
            bbox: Rect::new(x0, y0, x1, y1),
            baseline: y1 - 1.8,
        };
        Paragraph::from_lines(vec![line], Alignment::Left)
    }

    /// Twenty words per side with centres around 50-150 and 350-450 on a
    /// 500 pt page: one wide central gutter.
    fn two_column_words() -> Vec<EnrichedWord> {
        let mut words = Vec::new();
        for row in 0..10 {
            let y = row as f64 * 15.0;
            words.push(mock_word(50.0, y, 100.0, y + 12.0));
            words.push(mock_word(105.0, y, 150.0, y + 12.0));
            words.push(mock_word(350.0, y, 400.0, y + 12.0));
            words.push(mock_word(405.0, y, 450.0, y + 12.0));
        }
        words
    }

    #[test]
    fn test_empty_words_no_columns() {
        assert!(detect_columns(&[], 612.0).is_empty());
    }

    #[test]
    fn test_single_column() {
        let words: Vec<_> = (0..10)
            .map(|i| mock_word(50.0, i as f64 * 15.0, 550.0, i as f64 * 15.0 + 12.0))
            .collect();
        let columns = detect_columns(&words, 612.0);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].index, 0);
        assert_eq!(columns[0].words.len(), 10);
    }

    #[test]
    fn test_two_columns_detected() {
        let words = two_column_words();
        let columns = detect_columns(&words, 500.0);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].index, 0);
        assert_eq!(columns[1].index, 1);
        assert_eq!(columns[0].words.len(), 20);
        assert_eq!(columns[1].words.len(), 20);
        // The gutter midpoint lies between the two text bands.
        assert!(columns[0].bbox.x1 > 150.0 && columns[0].bbox.x1 < 350.0);
    }

    #[test]
    fn test_edge_margins_are_not_gutters() {
        // A single narrow text band in the page centre: the empty flanks
        // are margins and must not create extra columns.
        let words: Vec<_> = (0..10)
            .map(|i| mock_word(280.0, i as f64 * 15.0, 330.0, i as f64 * 15.0 + 12.0))
            .collect();
        let columns = detect_columns(&words, 612.0);
        assert_eq!(columns.len(), 1);
    }

    #[test]
    fn test_reading_order_single_column() {
        let paragraphs = vec![
            mock_paragraph(0.0, 100.0, 200.0, 120.0),
            mock_paragraph(0.0, 0.0, 200.0, 20.0),
            mock_paragraph(0.0, 50.0, 200.0, 70.0),
        ];
        let ordered = determine_reading_order(paragraphs, &[]);
        assert_eq!(ordered[0].bbox.y0, 0.0);
        assert_eq!(ordered[1].bbox.y0, 50.0);
        assert_eq!(ordered[2].bbox.y0, 100.0);
    }

    #[test]
    fn test_reading_order_two_columns() {
        let words = two_column_words();
        let columns = detect_columns(&words, 500.0);
        assert_eq!(columns.len(), 2);

        // Interleave paragraphs across the two columns.
        let paragraphs = vec![
            mock_paragraph(350.0, 0.0, 450.0, 20.0),  // right top
            mock_paragraph(50.0, 50.0, 150.0, 70.0),  // left bottom
            mock_paragraph(50.0, 0.0, 150.0, 20.0),   // left top
            mock_paragraph(350.0, 50.0, 450.0, 70.0), // right bottom
        ];
        let ordered = determine_reading_order(paragraphs, &columns);

        // All left-column paragraphs precede all right-column ones.
        assert_eq!(ordered[0].bbox.x0, 50.0);
        assert_eq!(ordered[0].bbox.y0, 0.0);
        assert_eq!(ordered[1].bbox.x0, 50.0);
        assert_eq!(ordered[1].bbox.y0, 50.0);
        assert_eq!(ordered[2].bbox.x0, 350.0);
        assert_eq!(ordered[3].bbox.x0, 350.0);
    }

    #[test]
    fn test_paragraph_ordering_property_within_column() {
        let words = two_column_words();
        let columns = detect_columns(&words, 500.0);
        let paragraphs: Vec<Paragraph> = (0..5)
            .rev()
            .map(|i| mock_paragraph(50.0, i as f64 * 30.0, 150.0, i as f64 * 30.0 + 12.0))
            .collect();
        let ordered = determine_reading_order(paragraphs, &columns);
        for pair in ordered.windows(2) {
            assert!(pair[0].bbox.y0 < pair[1].bbox.y0);
        }
    }
}
