//! Paragraph annotation: headings, lists, code blocks.
//!
//! All annotation is advisory. Heading detection is statistical: the
//! body-text size is the median word size on the page, candidate
//! heading sizes are the distinct sizes meaningfully above it, and the
//! size ranking maps onto levels H1..H6. A document-wide normalisation
//! pass then re-ranks levels across pages so the largest size anywhere
//! becomes H1.
//!
//! When one paragraph carries several flags, the serialiser applies the
//! precedence heading > code > list > plain.

use crate::document::Document;
use crate::layout::text_block::Paragraph;
use crate::utils::safe_float_cmp;

/// Multi-line paragraphs promote their first line to a heading only
/// when it is at least this much larger than the remaining lines.
const FIRST_LINE_RATIO: f64 = 1.15;

/// Bold fallback headings must still be slightly larger than body text.
const BOLD_FALLBACK_RATIO: f64 = 1.05;

/// Fraction of monospace words above which a paragraph is code.
const CODE_MONOSPACE_FRACTION: f64 = 0.8;

/// Median word font size across the given paragraphs: the body-text
/// size. The median is robust against a handful of oversized title
/// words in a page of body text.
pub fn body_font_size(paragraphs: &[Paragraph]) -> f64 {
    let mut sizes = Vec::new();
    for para in paragraphs {
        for line in &para.lines {
            for word in &line.words {
                sizes.push(word.font_size);
            }
        }
    }
    crate::geometry::median(&sizes)
}

/// Detect headings and assign levels within one page's paragraphs.
///
/// `min_heading_font_size` is the body-relative threshold; 0 disables
/// size-based detection entirely (and with it the bold fallback).
pub fn detect_headings(paragraphs: &mut [Paragraph], min_heading_font_size: f64) {
    if paragraphs.is_empty() || min_heading_font_size == 0.0 {
        return;
    }

    let body = body_font_size(paragraphs);
    if body == 0.0 {
        return;
    }

    // Candidate sizes: single-line paragraphs above the threshold, and
    // first lines of multi-line paragraphs that tower over their own
    // remainder.
    let mut candidate_sizes: Vec<f64> = Vec::new();
    for para in paragraphs.iter() {
        if let Some(size) = heading_candidate_size(para, body, min_heading_font_size) {
            if !candidate_sizes.contains(&size) {
                candidate_sizes.push(size);
            }
        }
    }

    if candidate_sizes.is_empty() {
        return;
    }

    candidate_sizes.sort_by(safe_float_cmp);
    candidate_sizes.reverse();

    for para in paragraphs.iter_mut() {
        annotate_heading(para, body, min_heading_font_size, &candidate_sizes);
    }
}

/// The size a paragraph would contribute as a heading candidate, if any.
fn heading_candidate_size(para: &Paragraph, body: f64, threshold: f64) -> Option<f64> {
    let first_line = para.lines.first()?;
    if first_line.words.is_empty() {
        return None;
    }

    let max_size = first_line.max_font_size();

    if para.lines.len() > 1 {
        let rest_avg = remainder_avg_font_size(para)?;
        if max_size >= rest_avg * FIRST_LINE_RATIO && max_size >= body * threshold {
            return Some(max_size);
        }
        None
    } else if max_size >= body * threshold {
        Some(max_size)
    } else {
        None
    }
}

/// Average font size over every line after the first.
fn remainder_avg_font_size(para: &Paragraph) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for line in para.lines.iter().skip(1) {
        for word in &line.words {
            total += word.font_size;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some(total / count as f64)
}

fn annotate_heading(para: &mut Paragraph, body: f64, threshold: f64, sizes: &[f64]) {
    let Some(first_line) = para.lines.first() else {
        return;
    };
    if first_line.words.is_empty() {
        return;
    }

    let max_size = first_line.max_font_size();

    if para.lines.len() > 1 {
        let Some(rest_avg) = remainder_avg_font_size(para) else {
            return;
        };
        if max_size >= rest_avg * FIRST_LINE_RATIO && max_size >= body * threshold {
            if let Some(level) = ranked_level(sizes, max_size) {
                para.is_heading = true;
                para.heading_level = level;
            }
        }
        return;
    }

    if let Some(level) = ranked_level(sizes, max_size) {
        para.is_heading = true;
        para.heading_level = level;
        return;
    }

    // Bold fallback: a bold single-liner slightly above body size reads
    // as a minor heading even when its size ranks below the six mapped
    // ones.
    let has_bold = first_line.words.iter().any(|w| w.is_bold);
    if has_bold && max_size >= body * BOLD_FALLBACK_RATIO && max_size >= body * threshold {
        para.is_heading = true;
        para.heading_level = 6;
    }
}

/// Level for a size within the descending candidate ranking. Only the
/// six largest sizes map to levels; smaller candidates get none (the
/// bold fallback may still catch them).
fn ranked_level(sizes_desc: &[f64], size: f64) -> Option<u8> {
    match sizes_desc.iter().position(|&s| s == size) {
        Some(i) if i < 6 => Some((i + 1) as u8),
        _ => None,
    }
}

/// Level for a size in the document-wide ranking; ranks past the sixth
/// clamp to 6 so every heading keeps a valid level.
fn clamped_level(sizes_desc: &[f64], size: f64) -> Option<u8> {
    sizes_desc
        .iter()
        .position(|&s| s == size)
        .map(|i| (i + 1).min(6) as u8)
}

/// Mark list paragraphs: first word is a bullet glyph or a numbered
/// marker.
pub fn detect_lists(paragraphs: &mut [Paragraph]) {
    for para in paragraphs.iter_mut() {
        let is_list = para
            .lines
            .first()
            .and_then(|l| l.words.first())
            .is_some_and(|w| w.is_bullet_or_number());
        if is_list {
            para.is_list = true;
        }
    }
}

/// Mark code paragraphs: the overwhelming majority of words use a
/// fixed-pitch font.
pub fn detect_code_blocks(paragraphs: &mut [Paragraph]) {
    for para in paragraphs.iter_mut() {
        let mut mono = 0usize;
        let mut total = 0usize;
        for line in &para.lines {
            for word in &line.words {
                total += 1;
                if word.is_monospace {
                    mono += 1;
                }
            }
        }
        if total > 0 && mono as f64 / total as f64 > CODE_MONOSPACE_FRACTION {
            para.is_code = true;
        }
    }
}

/// Re-rank heading levels across the whole document.
///
/// Per-page detection can only see one page's sizes; a chapter title on
/// page 7 must not outrank the document title on page 1. Collect every
/// heading's first-line maximum size, rank the distinct sizes
/// descending, and rewrite all levels from that ranking (clamping past
/// H6).
pub fn normalize_document_headings(doc: &mut Document) {
    let mut sizes: Vec<f64> = Vec::new();
    for page in &doc.pages {
        for para in &page.paragraphs {
            if !para.is_heading {
                continue;
            }
            if let Some(line) = para.lines.first() {
                if !line.words.is_empty() {
                    let size = line.max_font_size();
                    if !sizes.contains(&size) {
                        sizes.push(size);
                    }
                }
            }
        }
    }

    if sizes.is_empty() {
        return;
    }

    sizes.sort_by(safe_float_cmp);
    sizes.reverse();

    for page in &mut doc.pages {
        for para in &mut page.paragraphs {
            if !para.is_heading {
                continue;
            }
            let Some(line) = para.lines.first() else {
                continue;
            };
            if line.words.is_empty() {
                continue;
            }
            if let Some(level) = clamped_level(&sizes, line.max_font_size()) {
                para.heading_level = level;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Page;
    use crate::geometry::{Rect, Rgba};
    use crate::layout::text_block::{Alignment, EnrichedWord, Line};

    fn mock_word(text: &str, size: f64, bold: bool, mono: bool) -> EnrichedWord {
        EnrichedWord {
            text: text.to_string(),
            bbox: Rect::new(0.0, 0.0, 30.0, size),
            font_size: size,
            font_weight: if bold { 700 } else { 400 },
            font_name: "Helvetica".to_string(),
            font_flags: if mono { 1 } else { 0 },
            fill_color: Rgba::black(),
            is_bold: bold,
            is_italic: false,
            is_monospace: mono,
            baseline: size * 0.85,
            x_height: size * 0.7,
            rotation: 0.0,
        }
    }

    fn mock_paragraph(texts: &[&str], size: f64, bold: bool) -> Paragraph {
        let lines: Vec<Line> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let words: Vec<EnrichedWord> =
                    t.split(' ').map(|w| mock_word(w, size, bold, false)).collect();
                Line {
                    words,
                    bbox: Rect::new(0.0, i as f64 * size * 1.2, 200.0, i as f64 * size * 1.2 + size),
                    baseline: i as f64 * size * 1.2 + size * 0.85,
                }
            })
            .collect();
        Paragraph::from_lines(lines, Alignment::Left)
    }

    #[test]
    fn test_single_line_heading_by_size() {
        let mut paragraphs = vec![
            mock_paragraph(&["Big Title"], 24.0, true),
            mock_paragraph(&["Body text runs along here quite a lot longer"], 12.0, false),
            mock_paragraph(&["More body text with plenty of ordinary words"], 12.0, false),
        ];
        detect_headings(&mut paragraphs, 1.15);
        assert!(paragraphs[0].is_heading);
        assert_eq!(paragraphs[0].heading_level, 1);
        assert!(!paragraphs[1].is_heading);
    }

    #[test]
    fn test_two_heading_levels() {
        let mut paragraphs = vec![
            mock_paragraph(&["Title"], 24.0, true),
            mock_paragraph(&["Section"], 18.0, true),
            mock_paragraph(&["Body body body body body body body body"], 12.0, false),
            mock_paragraph(&["Body body body body body body body body"], 12.0, false),
        ];
        detect_headings(&mut paragraphs, 1.15);
        assert_eq!(paragraphs[0].heading_level, 1);
        assert_eq!(paragraphs[1].heading_level, 2);
    }

    #[test]
    fn test_disabled_when_threshold_zero() {
        let mut paragraphs = vec![
            mock_paragraph(&["Big Title"], 24.0, true),
            mock_paragraph(&["Body text"], 12.0, false),
        ];
        detect_headings(&mut paragraphs, 0.0);
        assert!(!paragraphs[0].is_heading);
    }

    #[test]
    fn test_bold_fallback_level_six() {
        // Bold single-liner 1.1x body size: no distinct candidate size
        // (below 1.15x would exclude it)... use threshold 1.05 so the
        // fallback path triggers while the ranked sizes do not match.
        let mut heading = mock_paragraph(&["Bold lead-in"], 13.2, true);
        heading.lines[0].words[0].font_size = 13.2;
        let mut paragraphs = vec![
            mock_paragraph(&["Body body body body body body body"], 12.0, false),
            heading,
            mock_paragraph(&["Body body body body body body body"], 12.0, false),
        ];
        // With the default 1.15 threshold, 13.2 < 13.8 so it is not a
        // size candidate; the fallback also fails its >= body*threshold
        // test, so nothing is marked.
        detect_headings(&mut paragraphs, 1.15);
        assert!(!paragraphs[1].is_heading);

        // With a 1.05 threshold the size qualifies as a candidate of its
        // own and gets a ranked level.
        detect_headings(&mut paragraphs, 1.05);
        assert!(paragraphs[1].is_heading);
    }

    #[test]
    fn test_multiline_first_line_heading() {
        // First line 18 pt over a 12 pt remainder inside one paragraph.
        let mut para = mock_paragraph(&["Subsection here", "body line one", "body line two"], 12.0, false);
        for word in &mut para.lines[0].words {
            word.font_size = 18.0;
        }
        let mut paragraphs = vec![
            para,
            mock_paragraph(&["other body text keeps the median at twelve"], 12.0, false),
        ];
        detect_headings(&mut paragraphs, 1.15);
        assert!(paragraphs[0].is_heading);
        assert_eq!(paragraphs[0].heading_level, 1);
    }

    #[test]
    fn test_multiline_similar_sizes_not_heading() {
        let mut paragraphs = vec![mock_paragraph(&["line one", "line two"], 12.0, false)];
        detect_headings(&mut paragraphs, 1.15);
        assert!(!paragraphs[0].is_heading);
    }

    #[test]
    fn test_detect_lists() {
        let mut paragraphs = vec![
            mock_paragraph(&["\u{2022} item one"], 12.0, false),
            mock_paragraph(&["1. numbered item"], 12.0, false),
            mock_paragraph(&["plain paragraph"], 12.0, false),
        ];
        detect_lists(&mut paragraphs);
        assert!(paragraphs[0].is_list);
        assert!(paragraphs[1].is_list);
        assert!(!paragraphs[2].is_list);
    }

    #[test]
    fn test_detect_code_blocks() {
        let mono_line = Line {
            words: vec![
                mock_word("fn", 10.0, false, true),
                mock_word("main()", 10.0, false, true),
            ],
            bbox: Rect::new(0.0, 0.0, 60.0, 10.0),
            baseline: 8.5,
        };
        let mut paragraphs = vec![
            Paragraph::from_lines(vec![mono_line], Alignment::Left),
            mock_paragraph(&["prose text"], 12.0, false),
        ];
        detect_code_blocks(&mut paragraphs);
        assert!(paragraphs[0].is_code);
        assert!(!paragraphs[1].is_code);
    }

    #[test]
    fn test_mixed_paragraph_not_code() {
        // Exactly half monospace stays prose (needs > 0.8).
        let line = Line {
            words: vec![
                mock_word("let", 10.0, false, true),
                mock_word("prose", 10.0, false, false),
            ],
            bbox: Rect::new(0.0, 0.0, 60.0, 10.0),
            baseline: 8.5,
        };
        let mut paragraphs = vec![Paragraph::from_lines(vec![line], Alignment::Left)];
        detect_code_blocks(&mut paragraphs);
        assert!(!paragraphs[0].is_code);
    }

    #[test]
    fn test_document_normalisation_reranks_levels() {
        // Page 1's only heading is 18 pt (level 1 locally); page 2 has a
        // 24 pt heading. After normalisation the 24 pt heading is H1 and
        // the 18 pt one becomes H2.
        let mut small = mock_paragraph(&["Chapter"], 18.0, true);
        small.is_heading = true;
        small.heading_level = 1;
        let mut big = mock_paragraph(&["Book Title"], 24.0, true);
        big.is_heading = true;
        big.heading_level = 1;

        let mut doc = Document {
            pages: vec![
                Page::new(1, 612.0, 792.0, vec![small]),
                Page::new(2, 612.0, 792.0, vec![big]),
            ],
        };
        normalize_document_headings(&mut doc);
        assert_eq!(doc.pages[0].paragraphs[0].heading_level, 2);
        assert_eq!(doc.pages[1].paragraphs[0].heading_level, 1);
    }

    #[test]
    fn test_heading_level_monotonic_in_size() {
        let mut sizes = vec![30.0, 24.0, 20.0, 18.0, 16.0, 14.0, 13.0];
        sizes.sort_by(crate::utils::safe_float_cmp);
        sizes.reverse();
        let mut last_level = 0u8;
        for &s in &sizes {
            let level = clamped_level(&sizes, s).unwrap();
            assert!(level >= last_level);
            last_level = level;
        }
        // Seventh size clamps to 6 in the document ranking but gets no
        // per-page rank at all.
        assert_eq!(clamped_level(&sizes, 13.0), Some(6));
        assert_eq!(ranked_level(&sizes, 13.0), None);
    }

    #[test]
    fn test_bold_fallback_when_size_ranks_past_six() {
        // Seven distinct heading sizes: the seventh gets no ranked
        // level, so its bold single-liner falls back to H6.
        let sizes = [40.0, 36.0, 32.0, 28.0, 24.0, 20.0, 16.0];
        let mut paragraphs: Vec<Paragraph> = sizes
            .iter()
            .map(|&s| mock_paragraph(&["Heading words"], s, true))
            .collect();
        for _ in 0..6 {
            paragraphs.push(mock_paragraph(
                &["body body body body body body body body body body"],
                12.0,
                false,
            ));
        }
        detect_headings(&mut paragraphs, 1.15);
        assert_eq!(paragraphs[5].heading_level, 6);
        assert!(paragraphs[6].is_heading);
        assert_eq!(paragraphs[6].heading_level, 6);
    }
}
