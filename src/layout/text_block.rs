//! Data model for layout analysis.
//!
//! The pipeline refines a flat glyph stream through progressively richer
//! structures: [`EnrichedChar`] → [`EnrichedWord`] → [`Line`] →
//! [`Paragraph`], with [`TextBlock`] and [`Column`] as transient analyses
//! used for rotation handling and reading order. Characters live only
//! within one page extraction; words are owned by their lines, lines by
//! their paragraphs, paragraphs by the page.

use serde::Serialize;

use crate::geometry::{Rect, Rgba};

/// FontDescriptor flag bit for fixed-pitch (monospace) fonts.
pub const FONT_FLAG_FIXED_PITCH: u32 = 1;

/// FontDescriptor flag bit for italic fonts.
pub const FONT_FLAG_ITALIC: u32 = 1 << 6;

/// A single glyph with the metadata the host engine reports for it.
#[derive(Debug, Clone)]
pub struct EnrichedChar {
    /// Unicode scalar value
    pub text: char,
    /// Bounding box in top-left page coordinates
    pub bbox: Rect,
    /// Font size in points
    pub font_size: f64,
    /// Font weight (400 = normal, 700+ = bold)
    pub font_weight: i32,
    /// Font name as reported by the host
    pub font_name: String,
    /// FontDescriptor flags bitfield
    pub font_flags: u32,
    /// Fill colour
    pub fill_color: Rgba,
    /// Local rotation angle in radians
    pub angle: f64,
    /// Whether the host flagged this glyph as a soft hyphen
    pub is_hyphen: bool,
}

/// A word with aggregated style information.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedWord {
    /// Word text
    pub text: String,
    /// Bounding box (union of the glyph boxes)
    pub bbox: Rect,
    /// Average glyph font size
    pub font_size: f64,
    /// Dominant (modal) font weight
    pub font_weight: i32,
    /// Dominant (modal) font name
    pub font_name: String,
    /// Font flags of the first glyph
    pub font_flags: u32,
    /// Fill colour of the first glyph
    pub fill_color: Rgba,
    /// Weight >= 700
    pub is_bold: bool,
    /// Italic flag set
    pub is_italic: bool,
    /// Fixed-pitch flag set
    pub is_monospace: bool,
    /// Y coordinate of the nominal text baseline
    pub baseline: f64,
    /// Nominal lowercase height, the tolerance unit for line grouping
    pub x_height: f64,
    /// Rotation in degrees
    pub rotation: f64,
}

impl EnrichedWord {
    /// Whether the word looks like a list marker: a bullet glyph, or a
    /// digit run terminated by `.` or `)`.
    pub fn is_bullet_or_number(&self) -> bool {
        let mut chars = self.text.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return false,
        };

        const BULLETS: [char; 8] = ['\u{2022}', '\u{25E6}', '\u{25AA}', '\u{25AB}', '\u{2013}', '-', '*', '\u{2192}'];
        if BULLETS.contains(&first) {
            return true;
        }

        if first.is_ascii_digit() {
            if let Some(last) = self.text.chars().last() {
                if (last == '.' || last == ')') && self.text.chars().count() >= 2 {
                    return self.text[..self.text.len() - 1]
                        .chars()
                        .all(|c| c.is_ascii_digit());
                }
            }
        }

        false
    }
}

/// A visual line of words.
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    /// Member words, sorted along the reading axis
    pub words: Vec<EnrichedWord>,
    /// Bounding box
    pub bbox: Rect,
    /// Baseline y coordinate (x centre for vertical reading directions)
    pub baseline: f64,
}

impl Line {
    /// Average font size across the line's words; 12 pt for an empty line.
    pub fn avg_font_size(&self) -> f64 {
        if self.words.is_empty() {
            return 12.0;
        }
        self.words.iter().map(|w| w.font_size).sum::<f64>() / self.words.len() as f64
    }

    /// Largest word font size in the line.
    pub fn max_font_size(&self) -> f64 {
        self.words.iter().map(|w| w.font_size).fold(0.0, f64::max)
    }
}

/// Horizontal alignment of a paragraph.
///
/// `Justified` is reserved; the alignment detector currently emits only
/// the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Alignment {
    /// Flush left
    #[default]
    Left,
    /// Centred on the page
    Center,
    /// Flush right
    Right,
    /// Both margins flush
    Justified,
}

/// A block of lines forming one logical paragraph.
#[derive(Debug, Clone, Serialize)]
pub struct Paragraph {
    /// Member lines in reading order
    pub lines: Vec<Line>,
    /// Bounding box
    pub bbox: Rect,
    /// Detected alignment
    pub alignment: Alignment,
    /// Whether the paragraph is a heading
    pub is_heading: bool,
    /// Heading level 1-6, meaningful only when `is_heading`
    pub heading_level: u8,
    /// Whether the paragraph is a list item
    pub is_list: bool,
    /// Whether the paragraph is a code block
    pub is_code: bool,
    /// Left indentation (first line's x0)
    pub indent: f64,
}

impl Paragraph {
    /// Create a plain paragraph from lines, computing the bounding box.
    pub fn from_lines(lines: Vec<Line>, alignment: Alignment) -> Self {
        let bbox = lines
            .iter()
            .map(|l| l.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        let indent = lines.first().map(|l| l.bbox.x0).unwrap_or(0.0);
        Self {
            lines,
            bbox,
            alignment,
            is_heading: false,
            heading_level: 0,
            is_list: false,
            is_code: false,
            indent,
        }
    }

    /// Full text: words joined by spaces, lines joined by newlines.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for (j, word) in line.words.iter().enumerate() {
                if j > 0 {
                    out.push(' ');
                }
                out.push_str(&word.text);
            }
        }
        out
    }

    /// Average word font size across the paragraph; 12 pt when empty.
    pub fn avg_font_size(&self) -> f64 {
        let mut total = 0.0;
        let mut count = 0usize;
        for line in &self.lines {
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
}

/// A vertical column of text in a multi-column layout.
///
/// Transient: columns exist only to determine reading order and are
/// recorded on the page for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    /// Bounding box of the column
    pub bbox: Rect,
    /// Words whose horizontal centre falls in the column
    pub words: Vec<EnrichedWord>,
    /// Zero-based index, left to right
    pub index: usize,
}

/// A rotation-homogeneous grouping of words.
///
/// Transient: blocks are produced by the rotation partition, carry their
/// grouped lines through line grouping, and are discarded once lines are
/// merged into the page-wide sequence.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// Member words
    pub words: Vec<EnrichedWord>,
    /// Lines grouped within the block
    pub lines: Vec<Line>,
    /// Quantised rotation in degrees
    pub rotation: f64,
    /// Reading direction derived from the rotation
    pub direction: crate::geometry::ReadingDirection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ReadingDirection;

    fn mock_word(text: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> EnrichedWord {
        let bbox = Rect::new(x0, y0, x1, y1);
        EnrichedWord {
            text: text.to_string(),
            bbox,
            font_size: 12.0,
            font_weight: 400,
            font_name: "Helvetica".to_string(),
            font_flags: 0,
            fill_color: Rgba::black(),
            is_bold: false,
            is_italic: false,
            is_monospace: false,
            baseline: y1 - 12.0 * 0.15,
            x_height: (y1 - y0) * 0.7,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_is_bullet_or_number() {
        let cases = [
            ("\u{2022}", true),
            ("-", true),
            ("*", true),
            ("\u{2192}", true),
            ("1.", true),
            ("12)", true),
            ("137.", true),
            ("5", false),
            ("Hello", false),
            ("", false),
            ("1a.", false),
        ];
        for (text, expected) in cases {
            let word = mock_word(text, 0.0, 0.0, 10.0, 12.0);
            assert_eq!(word.is_bullet_or_number(), expected, "text {:?}", text);
        }
    }

    #[test]
    fn test_paragraph_text() {
        let line1 = Line {
            words: vec![
                mock_word("Hello", 0.0, 0.0, 30.0, 12.0),
                mock_word("world", 35.0, 0.0, 65.0, 12.0),
            ],
            bbox: Rect::new(0.0, 0.0, 65.0, 12.0),
            baseline: 10.0,
        };
        let line2 = Line {
            words: vec![mock_word("again", 0.0, 14.0, 30.0, 26.0)],
            bbox: Rect::new(0.0, 14.0, 30.0, 26.0),
            baseline: 24.0,
        };

        let para = Paragraph::from_lines(vec![line1, line2], Alignment::Left);
        assert_eq!(para.text(), "Hello world\nagain");
        assert_eq!(para.bbox, Rect::new(0.0, 0.0, 65.0, 26.0));
        assert_eq!(para.indent, 0.0);
    }

    #[test]
    fn test_line_font_sizes() {
        let mut w1 = mock_word("a", 0.0, 0.0, 6.0, 12.0);
        w1.font_size = 10.0;
        let mut w2 = mock_word("b", 8.0, 0.0, 14.0, 12.0);
        w2.font_size = 14.0;

        let line = Line {
            words: vec![w1, w2],
            bbox: Rect::new(0.0, 0.0, 14.0, 12.0),
            baseline: 10.0,
        };
        assert_eq!(line.avg_font_size(), 12.0);
        assert_eq!(line.max_font_size(), 14.0);
    }

    #[test]
    fn test_text_block_direction() {
        let block = TextBlock {
            words: vec![],
            lines: vec![],
            rotation: 90.0,
            direction: ReadingDirection::Ttb,
        };
        assert!(block.direction.is_vertical());
    }
}
