//! Line grouping: words → visual lines.
//!
//! Words are first ordered with a visual-centre comparator (two words
//! sharing more than 30% of their vertical span compare by x, everything
//! else by y), then swept into lines. A word extends the current line
//! when either predicate holds:
//!
//! - visual: its vertical centre lies within one average line height of
//!   the line's centre, or
//! - baseline: its baseline sits within 0.6 x-heights of the line's
//!   running-mean baseline (5 pt floor when the x-height is unknown).
//!
//! Vertical reading directions swap the axes: a "line" is a glyph
//! column and the baseline becomes the column's x centre.

use crate::geometry::{overlap_ratio_h, overlap_ratio_v, ReadingDirection};
use crate::layout::text_block::{EnrichedWord, Line, TextBlock};
use crate::utils::safe_float_cmp;

/// Gap below which adjacent words in a line are fused into one.
const MERGE_GAP: f64 = 2.0;

/// Punctuation that stays a separate word so the serialiser can attach
/// it to its predecessor without a space.
const SEPARATE_PUNCT: [char; 13] =
    ['.', ',', ';', ':', '!', '?', '-', '(', ')', '[', ']', '{', '}'];

/// Group a rotation block's words into lines, in reading order.
pub fn group_block_lines(block: &TextBlock) -> Vec<Line> {
    let mut words = block.words.clone();
    if words.is_empty() {
        return Vec::new();
    }

    sort_words_for_reading(&mut words, block.direction);

    let lines = if block.direction.is_vertical() {
        group_vertical(&words)
    } else {
        group_horizontal(&words)
    };

    lines
        .into_iter()
        .map(|mut line| {
            line.words = merge_close_words(line.words);
            line
        })
        .collect()
}

/// Sort words along the reading axis using the visual-centre comparator.
///
/// Words on the same visual line (overlap of the perpendicular spans
/// above 30% of the smaller span) order by their position along the
/// line; others order by their position across lines. The sort is
/// stable, so equal keys keep input order.
pub fn sort_words_for_reading(words: &mut [EnrichedWord], direction: ReadingDirection) {
    if direction.is_vertical() {
        words.sort_by(|a, b| {
            if overlap_ratio_v(&a.bbox, &b.bbox) > 0.3 {
                safe_float_cmp(&a.bbox.y0, &b.bbox.y0)
            } else {
                safe_float_cmp(&a.bbox.x0, &b.bbox.x0)
            }
        });
    } else {
        words.sort_by(|a, b| {
            if overlap_ratio_h(&a.bbox, &b.bbox) > 0.3 {
                safe_float_cmp(&a.bbox.x0, &b.bbox.x0)
            } else {
                safe_float_cmp(&a.bbox.y0, &b.bbox.y0)
            }
        });
    }
}

fn group_horizontal(words: &[EnrichedWord]) -> Vec<Line> {
    let mut lines = Vec::new();

    let first = &words[0];
    let mut members: Vec<EnrichedWord> = vec![first.clone()];
    let mut bbox = first.bbox;
    let mut baseline = first.baseline;
    let mut x_height = first.x_height;
    let mut height_sum = first.bbox.height();

    for word in &words[1..] {
        let avg_line_height = height_sum / members.len() as f64;
        let visual = (word.bbox.center_y() - bbox.center_y()).abs() < avg_line_height;

        let threshold = if x_height > 0.0 { 0.6 * x_height } else { 5.0 };
        let by_baseline = (word.baseline - baseline).abs() < threshold;

        if visual || by_baseline {
            bbox = bbox.union(&word.bbox);
            height_sum += word.bbox.height();
            members.push(word.clone());
            // Running mean keeps the baseline honest across slightly
            // staggered superscripts.
            baseline =
                (baseline * (members.len() - 1) as f64 + word.baseline) / members.len() as f64;
        } else {
            lines.push(Line {
                words: std::mem::take(&mut members),
                bbox,
                baseline,
            });
            bbox = word.bbox;
            baseline = word.baseline;
            x_height = word.x_height;
            height_sum = word.bbox.height();
            members.push(word.clone());
        }
    }

    if !members.is_empty() {
        lines.push(Line {
            words: members,
            bbox,
            baseline,
        });
    }

    lines
}

/// Group words of a vertical block into glyph columns.
///
/// The "baseline" of a vertical line is its x centre; a word joins the
/// current column while its centre stays within 0.8 em of it.
fn group_vertical(words: &[EnrichedWord]) -> Vec<Line> {
    let mut lines = Vec::new();

    let first = &words[0];
    let mut members: Vec<EnrichedWord> = vec![first.clone()];
    let mut bbox = first.bbox;
    let mut center_x = first.bbox.center_x();

    for word in &words[1..] {
        if (word.bbox.center_x() - center_x).abs() < word.font_size * 0.8 {
            bbox = bbox.union(&word.bbox);
            members.push(word.clone());
        } else {
            lines.push(Line {
                words: std::mem::take(&mut members),
                bbox,
                baseline: center_x,
            });
            bbox = word.bbox;
            center_x = word.bbox.center_x();
            members.push(word.clone());
        }
    }

    if !members.is_empty() {
        lines.push(Line {
            words: members,
            bbox,
            baseline: center_x,
        });
    }

    lines
}

/// Fuse words separated by less than [`MERGE_GAP`] points.
///
/// PDFs with erratic kerning split words into fragments; fusing tiny
/// gaps repairs them. Single-character punctuation is exempt so the
/// serialiser can decide its spacing.
pub fn merge_close_words(words: Vec<EnrichedWord>) -> Vec<EnrichedWord> {
    if words.len() <= 1 {
        return words;
    }

    let mut merged: Vec<EnrichedWord> = Vec::with_capacity(words.len());
    let mut iter = words.into_iter();
    let mut current = iter.next().expect("non-empty checked above");

    for word in iter {
        let gap = word.bbox.x0 - current.bbox.x1;

        let keeps_separate = word.text.chars().count() == 1
            && word
                .text
                .chars()
                .next()
                .is_some_and(|c| SEPARATE_PUNCT.contains(&c));

        if gap < MERGE_GAP && !keeps_separate {
            current.bbox = current.bbox.union(&word.bbox);
            current.text.push_str(&word.text);
        } else {
            merged.push(current);
            current = word;
        }
    }
    merged.push(current);

    merged
}
