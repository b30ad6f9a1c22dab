//! Paragraph grouping: lines → paragraphs.
//!
//! The break threshold adapts to the page: the distribution of
//! inter-line gaps gives `(median + 1.5 * stdev) / median_font_size`,
//! clamped to `[0.6, 1.5]` line heights. A significant font-size change
//! (ratio outside 0.8..1.2) breaks a paragraph even without a gap,
//! which separates titles from the metadata line below them.

use crate::geometry::{clamp, mean, median, stdev};
use crate::layout::text_block::{Alignment, Line, Paragraph};

/// Break threshold when the page has too few lines to measure.
const DEFAULT_BREAK_THRESHOLD: f64 = 0.9;

/// Compute the adaptive paragraph-break threshold for a line sequence,
/// expressed as a multiple of the median font size.
pub fn dynamic_break_threshold(lines: &[Line]) -> f64 {
    if lines.len() < 3 {
        return DEFAULT_BREAK_THRESHOLD;
    }

    let mut gaps = Vec::with_capacity(lines.len() - 1);
    let mut font_sizes = Vec::with_capacity(lines.len() - 1);
    for pair in lines.windows(2) {
        gaps.push(pair[1].bbox.y0 - pair[0].bbox.y1);
        font_sizes.push(pair[0].avg_font_size());
    }

    if gaps.is_empty() {
        return DEFAULT_BREAK_THRESHOLD;
    }

    let median_gap = median(&gaps);
    let gap_stdev = stdev(&gaps);
    let mut median_font_size = median(&font_sizes);
    if median_font_size == 0.0 {
        median_font_size = 12.0;
    }

    clamp((median_gap + 1.5 * gap_stdev) / median_font_size, 0.6, 1.5)
}

/// Group lines into paragraphs using the adaptive threshold.
///
/// Lines must already be in reading order (top to bottom for horizontal
/// text).
pub fn group_lines_into_paragraphs(lines: Vec<Line>, page_width: f64) -> Vec<Paragraph> {
    if lines.is_empty() {
        return Vec::new();
    }

    let threshold = dynamic_break_threshold(&lines);
    log::debug!(
        "paragraph grouping: {} lines, break threshold {:.2} em",
        lines.len(),
        threshold
    );

    let mut paragraphs = Vec::new();
    let mut lines = lines.into_iter();
    let first = lines.next().expect("non-empty checked above");
    let mut prev_line_bottom = first.bbox.y1;
    let mut current: Vec<Line> = vec![first];

    for line in lines {
        let gap = line.bbox.y0 - prev_line_bottom;
        let avg_font_size = average_font_size(&current);
        let line_font_size = line.avg_font_size();

        let ratio = line_font_size / avg_font_size;
        let significant_font_change = !(0.8..=1.2).contains(&ratio);

        let normalized_gap = gap / avg_font_size;

        if normalized_gap > threshold || significant_font_change {
            paragraphs.push(finish_paragraph(std::mem::take(&mut current), page_width));
        }

        prev_line_bottom = line.bbox.y1;
        current.push(line);
    }

    if !current.is_empty() {
        paragraphs.push(finish_paragraph(current, page_width));
    }

    paragraphs
}

fn finish_paragraph(lines: Vec<Line>, page_width: f64) -> Paragraph {
    let alignment = detect_alignment(&lines, page_width);
    Paragraph::from_lines(lines, alignment)
}

fn average_font_size(lines: &[Line]) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for line in lines {
        for word in &line.words {
            total += word.font_size;
            count += 1;
        }
    }
    if count == 0 {
        return 12.0;
    }
    total / count as f64
}

/// Derive a paragraph's alignment from its line-start and line-end
/// positions.
///
/// Centred text keeps its line centres near the page centre; right
/// alignment shows up as tightly clustered line ends with scattered
/// starts. `Justified` is reserved for a future extension and never
/// emitted.
pub fn detect_alignment(lines: &[Line], page_width: f64) -> Alignment {
    if lines.is_empty() {
        return Alignment::Left;
    }

    let page_center = page_width / 2.0;
    let center_offsets: Vec<f64> = lines
        .iter()
        .map(|l| (l.bbox.center_x() - page_center).abs())
        .collect();
    if mean(&center_offsets) < 20.0 {
        return Alignment::Center;
    }

    let starts: Vec<f64> = lines.iter().map(|l| l.bbox.x0).collect();
    let ends: Vec<f64> = lines.iter().map(|l| l.bbox.x1).collect();

    let end_stdev = stdev(&ends);
    if end_stdev < 5.0 && end_stdev < stdev(&starts) {
        return Alignment::Right;
    }

    Alignment::Left
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Rgba};
    use crate::layout::text_block::EnrichedWord;

    fn mock_word(text: &str, x0: f64, y0: f64, x1: f64, y1: f64, size: f64) -> EnrichedWord {
        EnrichedWord {
            text: text.to_string(),
            bbox: Rect::new(x0, y0, x1, y1),
            font_size: size,
            font_weight: 400,
            font_name: "Helvetica".to_string(),
            font_flags: 0,
            fill_color: Rgba::black(),
            is_bold: false,
            is_italic: false,
            is_monospace: false,
            baseline: y1 - size * 0.15,
            x_height: (y1 - y0) * 0.7,
            rotation: 0.0,
        }
    }

    fn mock_line(x0: f64, y0: f64, x1: f64, size: f64) -> Line {
        let y1 = y0 + size;
        Line {
            words: vec![mock_word("text", x0, y0, x1, y1, size)],
            bbox: Rect::new(x0, y0, x1, y1),
            baseline: y1 - size * 0.15,
        }
    }

    #[test]
    fn test_threshold_defaults_for_short_sequences() {
        assert_eq!(dynamic_break_threshold(&[]), 0.9);
        let lines = vec![mock_line(0.0, 0.0, 100.0, 12.0), mock_line(0.0, 15.0, 100.0, 12.0)];
        assert_eq!(dynamic_break_threshold(&lines), 0.9);
    }

    #[test]
    fn test_threshold_clamped() {
        // Uniform tight spacing: (median + 0) / 12 would be tiny, clamps
        // up to 0.6.
        let lines: Vec<Line> = (0..6).map(|i| mock_line(0.0, i as f64 * 14.0, 100.0, 12.0)).collect();
        let t = dynamic_break_threshold(&lines);
        assert!((0.6..=1.5).contains(&t));
        assert_eq!(t, 0.6);
    }

    #[test]
    fn test_gap_splits_paragraphs() {
        // Three tightly spaced lines, a large gap, three more.
        let mut lines = Vec::new();
        for i in 0..3 {
            lines.push(mock_line(0.0, i as f64 * 14.0, 200.0, 12.0));
        }
        for i in 0..3 {
            lines.push(mock_line(0.0, 80.0 + i as f64 * 14.0, 200.0, 12.0));
        }

        let paragraphs = group_lines_into_paragraphs(lines, 612.0);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].lines.len(), 3);
        assert_eq!(paragraphs[1].lines.len(), 3);
    }

    #[test]
    fn test_font_change_splits_paragraphs() {
        // A 24 pt title directly above 12 pt body with no extra gap.
        let lines = vec![
            mock_line(0.0, 0.0, 200.0, 24.0),
            mock_line(0.0, 26.0, 200.0, 12.0),
            mock_line(0.0, 40.0, 200.0, 12.0),
        ];
        let paragraphs = group_lines_into_paragraphs(lines, 612.0);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].lines.len(), 1);
        assert_eq!(paragraphs[1].lines.len(), 2);
    }

    #[test]
    fn test_single_paragraph_bbox_and_indent() {
        let lines = vec![
            mock_line(50.0, 0.0, 200.0, 12.0),
            mock_line(40.0, 14.0, 210.0, 12.0),
        ];
        let paragraphs = group_lines_into_paragraphs(lines, 612.0);
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].bbox, Rect::new(40.0, 0.0, 210.0, 26.0));
        assert_eq!(paragraphs[0].indent, 50.0);
    }

    #[test]
    fn test_alignment_centered() {
        // Page width 600, lines centred on 300.
        let lines = vec![
            mock_line(250.0, 0.0, 350.0, 12.0),
            mock_line(230.0, 14.0, 370.0, 12.0),
        ];
        assert_eq!(detect_alignment(&lines, 600.0), Alignment::Center);
    }

    #[test]
    fn test_alignment_right() {
        // Clustered ends at 500, scattered starts.
        let lines = vec![
            mock_line(100.0, 0.0, 500.0, 12.0),
            mock_line(200.0, 14.0, 500.5, 12.0),
            mock_line(150.0, 28.0, 499.5, 12.0),
        ];
        assert_eq!(detect_alignment(&lines, 600.0), Alignment::Right);
    }

    #[test]
    fn test_alignment_left_default() {
        let lines = vec![
            mock_line(50.0, 0.0, 300.0, 12.0),
            mock_line(50.0, 14.0, 420.0, 12.0),
        ];
        assert_eq!(detect_alignment(&lines, 600.0), Alignment::Left);
    }
}
