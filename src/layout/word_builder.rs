//! Word assembly: glyph stream → [`EnrichedWord`]s.
//!
//! The host's text layer has no notion of a word, only positioned
//! glyphs. Segmentation is whitespace-driven where the PDF emits
//! whitespace, with conservative fallbacks for streams that do not:
//! boundaries before currency and sentence punctuation, and for rotated
//! streams a gap/case-transition heuristic. Aggregation then derives
//! the word-level style data every later stage relies on.

use crate::geometry::{normalize_angle, quantize_angle};
use crate::layout::text_block::{
    EnrichedChar, EnrichedWord, FONT_FLAG_FIXED_PITCH, FONT_FLAG_ITALIC,
};

/// Ligature scalars and their expansions.
static LIGATURES: phf::Map<char, &'static str> = phf::phf_map! {
    '\u{FB00}' => "ff",
    '\u{FB01}' => "fi",
    '\u{FB02}' => "fl",
    '\u{FB03}' => "ffi",
    '\u{FB04}' => "ffl",
    '\u{FB05}' => "ft",
    '\u{FB06}' => "st",
};

const CURRENCY: [char; 5] = ['$', '\u{20AC}', '\u{A3}', '\u{A5}', '\u{A2}'];
const SENTENCE_PUNCT: [char; 6] = ['.', ',', ';', ':', '!', '?'];

/// Group a page's glyphs into words.
///
/// The stream is first split into runs of common quantised rotation so
/// that a page mixing horizontal body text with a rotated margin note
/// segments each run with the rules appropriate to it.
pub fn group_chars_into_words(chars: &[EnrichedChar]) -> Vec<EnrichedWord> {
    if chars.is_empty() {
        return Vec::new();
    }

    // Whitespace-free PDFs get punctuation-based boundaries; detect once
    // over the whole stream.
    let has_whitespace = chars.iter().any(|c| is_whitespace(c.text));

    let mut words = Vec::new();
    let mut run_start = 0usize;
    let mut run_angle = quantized_rotation(&chars[0]);

    for i in 1..=chars.len() {
        let boundary = i == chars.len() || quantized_rotation(&chars[i]) != run_angle;
        if boundary {
            group_run(&chars[run_start..i], run_angle, has_whitespace, &mut words);
            if i < chars.len() {
                run_start = i;
                run_angle = quantized_rotation(&chars[i]);
            }
        }
    }

    words
}

/// Quantised rotation of a glyph in degrees, in `[0, 360)`.
fn quantized_rotation(c: &EnrichedChar) -> f64 {
    normalize_angle(quantize_angle(normalize_angle(c.angle.to_degrees()), 15.0))
}

fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n'
}

/// Whether a quantised rotation counts as horizontal (within 10 degrees
/// of 0 or 180).
fn is_horizontal_rotation(degrees: f64) -> bool {
    let d = normalize_angle(degrees);
    d <= 10.0 || d >= 350.0 || (170.0..=190.0).contains(&d)
}

/// Segment one rotation-homogeneous run and append its words.
fn group_run(run: &[EnrichedChar], rotation: f64, has_whitespace: bool, out: &mut Vec<EnrichedWord>) {
    if run.is_empty() {
        return;
    }

    // PDFs that store bottom-to-top glyphs in storage order read
    // backwards; reverse before boundary detection so the gap and case
    // heuristics see the glyphs in visual order.
    let reversed;
    let glyphs: &[EnrichedChar] = if rotation == 270.0 {
        reversed = run.iter().rev().cloned().collect::<Vec<_>>();
        &reversed
    } else {
        run
    };

    let rotated = !is_horizontal_rotation(rotation);
    let avg_extent = average_flow_extent(glyphs, rotated);

    let mut current: Vec<EnrichedChar> = Vec::new();
    for glyph in glyphs.iter() {
        if is_whitespace(glyph.text) {
            flush_word(&mut current, out);
            continue;
        }

        if !current.is_empty()
            && starts_new_word(
                &current[current.len() - 1],
                glyph,
                rotated,
                has_whitespace,
                avg_extent,
            )
        {
            flush_word(&mut current, out);
        }

        current.push(glyph.clone());
    }
    flush_word(&mut current, out);
}

/// Average glyph extent along the run's flow axis (width for horizontal
/// text, height for vertical).
fn average_flow_extent(glyphs: &[EnrichedChar], vertical: bool) -> f64 {
    if glyphs.is_empty() {
        return 0.0;
    }
    let total: f64 = glyphs
        .iter()
        .map(|g| if vertical { g.bbox.height() } else { g.bbox.width() })
        .sum();
    total / glyphs.len() as f64
}

/// Word-boundary test between two consecutive non-whitespace glyphs.
fn starts_new_word(
    prev: &EnrichedChar,
    curr: &EnrichedChar,
    rotated: bool,
    has_whitespace: bool,
    avg_extent: f64,
) -> bool {
    // Conservative boundaries for streams with no whitespace at all:
    // currency glyphs and sentence punctuation start a fresh word. The
    // punctuation is re-attached without a space at serialisation time.
    if !has_whitespace && (CURRENCY.contains(&curr.text) || SENTENCE_PUNCT.contains(&curr.text)) {
        return true;
    }

    if !rotated {
        return false;
    }

    // Rotated streams carry no reliable spacing, so split on layout gaps
    // along the flow axis (the y axis for every non-horizontal run).
    let gap = flow_gap(prev, curr, true);
    if avg_extent > 0.0 && gap > 0.3 * avg_extent {
        return true;
    }

    // Case transitions only apply to rotated glyphs. Horizontal text
    // must never split on them (it would cut words like "STATEMENT").
    let p = prev.text;
    let c = curr.text;
    if p.is_lowercase() && c.is_uppercase() {
        return true;
    }
    if p.is_ascii_digit() && c.is_alphabetic() {
        return true;
    }
    if p.is_alphabetic() && c.is_ascii_digit() {
        return true;
    }

    false
}

/// Positive gap between two glyph boxes along the flow axis.
fn flow_gap(prev: &EnrichedChar, curr: &EnrichedChar, vertical: bool) -> f64 {
    let (a, b) = if vertical {
        ((prev.bbox.y0, prev.bbox.y1), (curr.bbox.y0, curr.bbox.y1))
    } else {
        ((prev.bbox.x0, prev.bbox.x1), (curr.bbox.x0, curr.bbox.x1))
    };
    (b.0 - a.1).max(a.0 - b.1).max(0.0)
}

fn flush_word(current: &mut Vec<EnrichedChar>, out: &mut Vec<EnrichedWord>) {
    if current.is_empty() {
        return;
    }
    out.push(aggregate_word(current));
    current.clear();
}

/// Build an [`EnrichedWord`] from its glyphs.
///
/// Box is the union of glyph boxes, size the mean, weight and font name
/// the mode (first-seen wins ties so the result is deterministic), and
/// flags and colour come from the first glyph.
fn aggregate_word(chars: &[EnrichedChar]) -> EnrichedWord {
    let text: String = chars.iter().map(|c| c.text).collect();

    let bbox = chars
        .iter()
        .map(|c| c.bbox)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();

    let font_size = chars.iter().map(|c| c.font_size).sum::<f64>() / chars.len() as f64;
    let font_weight = mode_by(chars, |c| c.font_weight);
    let font_name = mode_by(chars, |c| c.font_name.clone());
    let font_flags = chars[0].font_flags;
    let fill_color = chars[0].fill_color;

    let is_bold = font_weight >= 700;
    let is_italic = font_flags & FONT_FLAG_ITALIC != 0;
    let is_monospace = font_flags & FONT_FLAG_FIXED_PITCH != 0;

    let avg_angle = chars.iter().map(|c| c.angle).sum::<f64>() / chars.len() as f64;
    let rotation = normalize_angle(avg_angle.to_degrees());

    let mut word = EnrichedWord {
        text,
        bbox,
        font_size,
        font_weight,
        font_name,
        font_flags,
        fill_color,
        is_bold,
        is_italic,
        is_monospace,
        baseline: 0.0,
        x_height: 0.0,
        rotation,
    };
    word.baseline = calculate_baseline(&word);
    word.x_height = calculate_x_height(&word);
    word
}

/// Most frequent value under `key`, first-seen on ties.
fn mode_by<T: PartialEq, F: Fn(&EnrichedChar) -> T>(chars: &[EnrichedChar], key: F) -> T {
    let mut values: Vec<(T, usize)> = Vec::new();
    for c in chars {
        let v = key(c);
        match values.iter_mut().find(|(existing, _)| *existing == v) {
            Some((_, count)) => *count += 1,
            None => values.push((v, 1)),
        }
    }

    let mut best = 0;
    for i in 1..values.len() {
        if values[i].1 > values[best].1 {
            best = i;
        }
    }
    values.swap_remove(best).0
}

/// Estimate the baseline: the bottom of the box minus a descender
/// allowance.
fn calculate_baseline(word: &EnrichedWord) -> f64 {
    word.bbox.y1 - word.font_size * 0.15
}

/// Estimate the x-height. Words containing lowercase letters get it from
/// the measured box; all-caps and digit words fall back to a font-size
/// fraction.
fn calculate_x_height(word: &EnrichedWord) -> f64 {
    if word.text.chars().any(|c| c.is_ascii_lowercase()) {
        word.bbox.height() * 0.7
    } else {
        word.font_size * 0.5
    }
}

/// Expand ligature scalars into their component letters.
///
/// Only the text changes; the bounding box keeps covering the original
/// glyph.
pub fn expand_ligatures(words: &mut [EnrichedWord]) {
    for word in words.iter_mut() {
        if !word.text.chars().any(|c| LIGATURES.contains_key(&c)) {
            continue;
        }
        let mut expanded = String::with_capacity(word.text.len() + 4);
        for c in word.text.chars() {
            match LIGATURES.get(&c) {
                Some(replacement) => expanded.push_str(replacement),
                None => expanded.push(c),
            }
        }
        word.text = expanded;
    }
}

/// Whether a scalar falls in a CJK ideograph block.
fn is_cjk(c: char) -> bool {
    matches!(u32::from(c),
        0x4E00..=0x9FFF        // CJK Unified Ideographs
        | 0x3400..=0x4DBF      // Extension A
        | 0x20000..=0x2A6DF    // Extension B
        | 0x2A700..=0x2B73F    // Extension C
        | 0x2B740..=0x2B81F    // Extension D
        | 0x2B820..=0x2CEAF    // Extension E
        | 0xF900..=0xFAFF      // Compatibility Ideographs
        | 0x2F800..=0x2FA1F    // Compatibility Supplement
    )
}

/// Strip the doubled-glyph rendering artefact some PDFs produce for CJK
/// text.
///
/// An adjacent identical CJK pair is collapsed when the word's average
/// glyph width is implausibly narrow (each ideograph would have less
/// than 0.7 em), which indicates the glyphs were painted twice at nearly
/// the same position rather than written twice.
pub fn deduplicate_cjk(words: &mut [EnrichedWord]) {
    for word in words.iter_mut() {
        let runes: Vec<char> = word.text.chars().collect();
        if runes.len() <= 1 || !runes.iter().any(|&c| is_cjk(c)) {
            continue;
        }

        let avg_char_width = word.bbox.width() / runes.len() as f64;
        let overlapping = avg_char_width < word.font_size * 0.7;

        let mut deduplicated = String::new();
        deduplicated.push(runes[0]);
        for j in 1..runes.len() {
            if overlapping && runes[j] == runes[j - 1] && is_cjk(runes[j]) {
                continue;
            }
            deduplicated.push(runes[j]);
        }
        word.text = deduplicated;
    }
}
