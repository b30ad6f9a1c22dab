//! Extracted document structure.
//!
//! [`Page`] and [`Document`] are the only structures that outlive the
//! per-page pipeline. Everything they own is exclusive: no sharing, no
//! back references.

use serde::Serialize;

use crate::layout::text_block::{Column, Paragraph};
use crate::tables::{Edge, Table};

/// All extracted content of one PDF page.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// One-based page number
    pub number: usize,
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
    /// Paragraphs in reading order
    pub paragraphs: Vec<Paragraph>,
    /// Detected tables
    pub tables: Vec<Table>,
    /// Ruling-line edges extracted from the page's path objects
    pub edges: Vec<Edge>,
    /// Detected column layout
    pub columns: Vec<Column>,
}

impl Page {
    /// Create a page with paragraphs and no tables, edges, or columns.
    pub fn new(number: usize, width: f64, height: f64, paragraphs: Vec<Paragraph>) -> Self {
        Self {
            number,
            width,
            height,
            paragraphs,
            tables: Vec::new(),
            edges: Vec::new(),
            columns: Vec::new(),
        }
    }
}

/// The complete extracted document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    /// Pages in document order
    pub pages: Vec<Page>,
}

/// Aggregate counts over a finished document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStatistics {
    /// Total pages
    pub pages: usize,
    /// Total paragraphs
    pub paragraphs: usize,
    /// Total tables
    pub tables: usize,
    /// Paragraphs flagged as headings
    pub headings: usize,
    /// Total words
    pub words: usize,
    /// Total characters across all word texts
    pub characters: usize,
}

impl DocumentStatistics {
    /// Count up a document's content.
    pub fn for_document(doc: &Document) -> Self {
        let mut stats = DocumentStatistics {
            pages: doc.pages.len(),
            ..Default::default()
        };

        for page in &doc.pages {
            stats.paragraphs += page.paragraphs.len();
            stats.tables += page.tables.len();
            for para in &page.paragraphs {
                if para.is_heading {
                    stats.headings += 1;
                }
                for line in &para.lines {
                    stats.words += line.words.len();
                    for word in &line.words {
                        stats.characters += word.text.chars().count();
                    }
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Rgba};
    use crate::layout::text_block::{Alignment, EnrichedWord, Line};

    fn mock_paragraph(words: &[&str], heading: bool) -> Paragraph {
        let words: Vec<EnrichedWord> = words
            .iter()
            .enumerate()
            .map(|(i, w)| EnrichedWord {
                text: w.to_string(),
                bbox: Rect::new(i as f64 * 40.0, 0.0, i as f64 * 40.0 + 30.0, 12.0),
                font_size: 12.0,
                font_weight: 400,
                font_name: "Helvetica".to_string(),
                font_flags: 0,
                fill_color: Rgba::black(),
                is_bold: false,
                is_italic: false,
                is_monospace: false,
                baseline: 10.2,
                x_height: 8.4,
                rotation: 0.0,
            })
            .collect();
        let bbox = words
            .iter()
            .map(|w| w.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        let mut para = Paragraph::from_lines(
            vec![Line {
                words,
                bbox,
                baseline: 10.2,
            }],
            Alignment::Left,
        );
        para.is_heading = heading;
        if heading {
            para.heading_level = 1;
        }
        para
    }

    #[test]
    fn test_statistics() {
        let doc = Document {
            pages: vec![
                Page::new(1, 612.0, 792.0, vec![
                    mock_paragraph(&["Title"], true),
                    mock_paragraph(&["two", "words"], false),
                ]),
                Page::new(2, 612.0, 792.0, vec![mock_paragraph(&["more"], false)]),
            ],
        };

        let stats = DocumentStatistics::for_document(&doc);
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.paragraphs, 3);
        assert_eq!(stats.headings, 1);
        assert_eq!(stats.words, 4);
        assert_eq!(stats.characters, 5 + 3 + 5 + 4);
        assert_eq!(stats.tables, 0);
    }

    #[test]
    fn test_document_serializes() {
        let doc = Document {
            pages: vec![Page::new(1, 612.0, 792.0, vec![])],
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"number\":1"));
    }
}
