//! Rotation partition: split a page's words into orientation-homogeneous
//! blocks.
//!
//! Words are bucketed by rotation quantised to 15 degrees. Buckets with
//! enough words become [`TextBlock`]s with a reading direction inferred
//! from the angle; stray glyphs at odd angles (usually artefacts of
//! slightly skewed scans) are ignored rather than forced into lines they
//! do not belong to.

use crate::geometry::{infer_reading_direction, normalize_angle, quantize_angle, ReadingDirection};
use crate::layout::text_block::{EnrichedWord, TextBlock};

const ANGLE_BUCKET: f64 = 15.0;

/// Partition words by dominant rotation.
///
/// A bucket is dominant when it holds at least `max(5, 5%)` of the
/// page's words. When no bucket qualifies (short pages, mixed noise)
/// every word lands in a single horizontal block so nothing is lost.
pub fn detect_text_rotation(words: &[EnrichedWord]) -> Vec<TextBlock> {
    if words.is_empty() {
        return Vec::new();
    }

    // Histogram over quantised angles, first-seen order.
    let mut buckets: Vec<(f64, Vec<EnrichedWord>)> = Vec::new();
    for word in words {
        let quantized = normalize_angle(quantize_angle(normalize_angle(word.rotation), ANGLE_BUCKET));
        match buckets.iter_mut().find(|(angle, _)| *angle == quantized) {
            Some((_, members)) => members.push(word.clone()),
            None => buckets.push((quantized, vec![word.clone()])),
        }
    }

    // Largest buckets first; ties keep first-seen order (stable sort).
    buckets.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let threshold = (words.len() as f64 * 0.05).max(5.0) as usize;

    let mut blocks: Vec<TextBlock> = buckets
        .into_iter()
        .filter(|(_, members)| members.len() >= threshold)
        .map(|(angle, members)| TextBlock {
            words: members,
            lines: Vec::new(),
            rotation: angle,
            direction: infer_reading_direction(angle),
        })
        .collect();

    if blocks.is_empty() {
        blocks.push(TextBlock {
            words: words.to_vec(),
            lines: Vec::new(),
            rotation: 0.0,
            direction: ReadingDirection::Ltr,
        });
    }

    blocks
}
