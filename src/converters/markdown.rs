//! Markdown serialisation of the extracted document tree.
//!
//! Renders the annotated structure the pipeline produced: ATX headings,
//! fenced code blocks, list items, GFM tables, and inline emphasis from
//! per-word style flags. Flag precedence on a paragraph is
//! heading > code > list > plain.

use crate::config::Config;
use crate::document::{Document, Page};
use crate::layout::text_block::{EnrichedWord, Line, Paragraph};
use crate::tables::Table;

/// Single-character words that attach to the preceding word without a
/// space.
const ATTACH_LEFT: [char; 9] = ['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// Single-character words after which the next word attaches without a
/// space.
const ATTACH_RIGHT: [char; 3] = ['(', '[', '{'];

/// Render a whole document as Markdown.
pub fn document_to_markdown(doc: &Document, config: &Config) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for (i, page) in doc.pages.iter().enumerate() {
        if i > 0 && config.include_page_breaks {
            blocks.push("---".to_string());
        }
        render_page(&mut blocks, page, config);
    }

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Render a single page as Markdown.
pub fn page_to_markdown(page: &Page, config: &Config) -> String {
    let mut blocks = Vec::new();
    render_page(&mut blocks, page, config);

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_page(blocks: &mut Vec<String>, page: &Page, config: &Config) {
    // Consecutive code paragraphs share one fence: a code listing often
    // arrives as several single-line paragraphs.
    let mut i = 0;
    while i < page.paragraphs.len() {
        let para = &page.paragraphs[i];

        if para.is_code && !para.is_heading {
            let run_end = page.paragraphs[i..]
                .iter()
                .position(|p| !(p.is_code && !p.is_heading))
                .map(|offset| i + offset)
                .unwrap_or(page.paragraphs.len());
            blocks.push(render_code_run(&page.paragraphs[i..run_end]));
            i = run_end;
            continue;
        }

        render_paragraph(blocks, para);
        i += 1;
    }

    if config.detect_tables {
        for table in &page.tables {
            if let Some(rendered) = render_table(table) {
                blocks.push(rendered);
            }
        }
    }
}

/// One fenced block covering a run of consecutive code paragraphs.
fn render_code_run(paragraphs: &[Paragraph]) -> String {
    let mut out = String::from("```\n");
    for para in paragraphs {
        for line in &para.lines {
            out.push_str(plain_line_text(line).trim_end());
            out.push('\n');
        }
    }
    out.push_str("```");
    out
}

fn render_paragraph(blocks: &mut Vec<String>, para: &Paragraph) {
    if para.lines.is_empty() {
        return;
    }

    if para.is_heading {
        render_heading(blocks, para);
        return;
    }

    if para.is_code {
        blocks.push(render_code(para));
        return;
    }

    if para.is_list {
        if let Some(item) = render_list_item(para) {
            blocks.push(item);
            return;
        }
    }

    let text = render_plain(para);
    if !text.is_empty() {
        blocks.push(text);
    }
}

fn render_heading(blocks: &mut Vec<String>, para: &Paragraph) {
    let level = para.heading_level.clamp(1, 6) as usize;
    let marker = "#".repeat(level);

    // Only the first line is the heading; any remaining lines render as
    // an ordinary paragraph below it.
    let heading_text = plain_line_text(&para.lines[0]);
    blocks.push(format!("{} {}", marker, heading_text.trim_end()));

    if para.lines.len() > 1 {
        let rest = Paragraph::from_lines(para.lines[1..].to_vec(), para.alignment);
        let text = render_plain(&rest);
        if !text.is_empty() {
            blocks.push(text);
        }
    }
}

fn render_code(para: &Paragraph) -> String {
    let mut out = String::from("```\n");
    for line in &para.lines {
        out.push_str(plain_line_text(line).trim_end());
        out.push('\n');
    }
    out.push_str("```");
    out
}

/// Render a list paragraph as a `- item` or `N. item` line.
fn render_list_item(para: &Paragraph) -> Option<String> {
    let first_line = para.lines.first()?;
    let marker = first_line.words.first()?;
    let marker_text = marker.text.as_str();

    let mut rest_words: Vec<&EnrichedWord> = first_line.words.iter().skip(1).collect();
    for line in para.lines.iter().skip(1) {
        rest_words.extend(line.words.iter());
    }
    let rest = join_words(rest_words.into_iter());

    let first_char = marker_text.chars().next()?;
    if first_char.is_ascii_digit() {
        // "3." or "3)" markers keep their number.
        let number: String = marker_text
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        Some(format!("{}. {}", number, rest).trim_end().to_string())
    } else {
        // A fused marker like "-item" carries its own text.
        let fused: String = marker_text.chars().skip(1).collect();
        let item = if fused.is_empty() {
            rest
        } else if rest.is_empty() {
            fused
        } else {
            format!("{} {}", fused, rest)
        };
        Some(format!("- {}", item).trim_end().to_string())
    }
}

/// Render a plain paragraph: styled words, hard line breaks between the
/// paragraph's visual lines.
fn render_plain(para: &Paragraph) -> String {
    let lines: Vec<String> = para
        .lines
        .iter()
        .map(|line| styled_line_text(line).trim_end().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    lines.join("  \n")
}

/// A line's text without inline styling (headings, code).
fn plain_line_text(line: &Line) -> String {
    join_words_with(line.words.iter(), |w| w.text.clone())
}

/// A line's text with per-word emphasis applied.
fn styled_line_text(line: &Line) -> String {
    join_words_with(line.words.iter(), style_word)
}

fn join_words<'a, I: Iterator<Item = &'a EnrichedWord>>(words: I) -> String {
    join_words_with(words, |w| w.text.clone())
}

/// Join words with spaces, attaching punctuation to its neighbours.
fn join_words_with<'a, I, F>(words: I, render: F) -> String
where
    I: Iterator<Item = &'a EnrichedWord>,
    F: Fn(&EnrichedWord) -> String,
{
    let mut out = String::new();
    let mut suppress_space = true;

    for word in words {
        let attaches_left = single_char_in(&word.text, &ATTACH_LEFT);
        if !out.is_empty() && !suppress_space && !attaches_left {
            out.push(' ');
        }
        out.push_str(&render(word));
        suppress_space = single_char_in(&word.text, &ATTACH_RIGHT);
    }

    out
}

fn single_char_in(text: &str, set: &[char]) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => set.contains(&c),
        _ => false,
    }
}

/// Apply inline Markdown emphasis from a word's style flags.
fn style_word(word: &EnrichedWord) -> String {
    let text = word.text.as_str();
    if text.is_empty() {
        return String::new();
    }

    if word.is_bold && word.is_italic {
        format!("***{}***", text)
    } else if word.is_bold {
        format!("**{}**", text)
    } else if word.is_italic {
        format!("*{}*", text)
    } else if word.is_monospace {
        format!("`{}`", text)
    } else {
        text.to_string()
    }
}

/// Render a table in GFM pipe syntax. The first row serves as header.
fn render_table(table: &Table) -> Option<String> {
    if table.rows.is_empty() || table.num_cols == 0 {
        return None;
    }

    let cell_text = |row: &crate::tables::TableRow, col: usize| -> String {
        row.cells
            .get(col)
            .map(|c| c.content.replace('\n', " "))
            .unwrap_or_default()
    };

    let mut out = String::new();

    let header: Vec<String> = (0..table.num_cols)
        .map(|c| cell_text(&table.rows[0], c))
        .collect();
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!(
        "|{}\n",
        " --- |".repeat(table.num_cols)
    ));

    if table.rows.len() == 1 {
        // A header-only table still needs one body row to be valid.
        out.push_str(&format!("|{}\n", "  |".repeat(table.num_cols)));
    } else {
        for row in &table.rows[1..] {
            let cells: Vec<String> = (0..table.num_cols).map(|c| cell_text(row, c)).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
    }

    Some(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Rgba};
    use crate::layout::text_block::Alignment;
    use crate::tables::{TableCell, TableRow};

    fn mock_word(text: &str, bold: bool, italic: bool, mono: bool) -> EnrichedWord {
        EnrichedWord {
            text: text.to_string(),
            bbox: Rect::new(0.0, 0.0, 30.0, 12.0),
            font_size: 12.0,
            font_weight: if bold { 700 } else { 400 },
            font_name: "Helvetica".to_string(),
            font_flags: 0,
            fill_color: Rgba::black(),
            is_bold: bold,
            is_italic: italic,
            is_monospace: mono,
            baseline: 10.2,
            x_height: 8.4,
            rotation: 0.0,
        }
    }

    fn para_of(words: Vec<EnrichedWord>) -> Paragraph {
        let bbox = words
            .iter()
            .map(|w| w.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        Paragraph::from_lines(
            vec![Line {
                words,
                bbox,
                baseline: 10.2,
            }],
            Alignment::Left,
        )
    }

    #[test]
    fn test_plain_paragraph() {
        let para = para_of(vec![
            mock_word("Hello", false, false, false),
            mock_word("world", false, false, false),
        ]);
        let mut blocks = Vec::new();
        render_paragraph(&mut blocks, &para);
        assert_eq!(blocks, vec!["Hello world"]);
    }

    #[test]
    fn test_inline_styles() {
        let para = para_of(vec![
            mock_word("bold", true, false, false),
            mock_word("italic", false, true, false),
            mock_word("both", true, true, false),
            mock_word("mono", false, false, true),
        ]);
        let mut blocks = Vec::new();
        render_paragraph(&mut blocks, &para);
        assert_eq!(blocks, vec!["**bold** *italic* ***both*** `mono`"]);
    }

    #[test]
    fn test_punctuation_attaches_without_space() {
        let para = para_of(vec![
            mock_word("end", false, false, false),
            mock_word(".", false, false, false),
            mock_word("(", false, false, false),
            mock_word("note", false, false, false),
            mock_word(")", false, false, false),
        ]);
        let mut blocks = Vec::new();
        render_paragraph(&mut blocks, &para);
        assert_eq!(blocks, vec!["end. (note)"]);
    }

    #[test]
    fn test_heading_levels() {
        for level in 1..=6u8 {
            let mut para = para_of(vec![mock_word("Title", true, false, false)]);
            para.is_heading = true;
            para.heading_level = level;
            let mut blocks = Vec::new();
            render_paragraph(&mut blocks, &para);
            assert_eq!(blocks[0], format!("{} Title", "#".repeat(level as usize)));
        }
    }

    #[test]
    fn test_multiline_heading_splits_body() {
        let mut para = Paragraph::from_lines(
            vec![
                Line {
                    words: vec![mock_word("Title", true, false, false)],
                    bbox: Rect::new(0.0, 0.0, 30.0, 12.0),
                    baseline: 10.2,
                },
                Line {
                    words: vec![mock_word("body", false, false, false)],
                    bbox: Rect::new(0.0, 14.0, 30.0, 26.0),
                    baseline: 24.2,
                },
            ],
            Alignment::Left,
        );
        para.is_heading = true;
        para.heading_level = 2;

        let mut blocks = Vec::new();
        render_paragraph(&mut blocks, &para);
        assert_eq!(blocks, vec!["## Title", "body"]);
    }

    #[test]
    fn test_heading_precedence_over_code_and_list() {
        let mut para = para_of(vec![mock_word("Title", true, false, true)]);
        para.is_heading = true;
        para.heading_level = 1;
        para.is_code = true;
        para.is_list = true;

        let mut blocks = Vec::new();
        render_paragraph(&mut blocks, &para);
        assert_eq!(blocks, vec!["# Title"]);
    }

    #[test]
    fn test_code_block_fenced() {
        let mut para = para_of(vec![
            mock_word("fn", false, false, true),
            mock_word("main()", false, false, true),
        ]);
        para.is_code = true;

        let mut blocks = Vec::new();
        render_paragraph(&mut blocks, &para);
        assert_eq!(blocks, vec!["```\nfn main()\n```"]);
    }

    #[test]
    fn test_bullet_list_item() {
        let mut para = para_of(vec![
            mock_word("\u{2022}", false, false, false),
            mock_word("first", false, false, false),
            mock_word("item", false, false, false),
        ]);
        para.is_list = true;

        let mut blocks = Vec::new();
        render_paragraph(&mut blocks, &para);
        assert_eq!(blocks, vec!["- first item"]);
    }

    #[test]
    fn test_numbered_list_item_keeps_number() {
        let mut para = para_of(vec![
            mock_word("3.", false, false, false),
            mock_word("third", false, false, false),
        ]);
        para.is_list = true;

        let mut blocks = Vec::new();
        render_paragraph(&mut blocks, &para);
        assert_eq!(blocks, vec!["3. third"]);
    }

    #[test]
    fn test_table_rendering() {
        let cell = |text: &str| TableCell {
            bbox: Rect::default(),
            content: text.to_string(),
            words: Vec::new(),
        };
        let table = Table {
            bbox: Rect::new(0.0, 0.0, 100.0, 40.0),
            rows: vec![
                TableRow {
                    cells: vec![cell("Name"), cell("Value")],
                    bbox: Rect::default(),
                },
                TableRow {
                    cells: vec![cell("a"), cell("1")],
                    bbox: Rect::default(),
                },
            ],
            cells: Vec::new(),
            num_rows: 2,
            num_cols: 2,
        };

        let rendered = render_table(&table).unwrap();
        assert_eq!(rendered, "| Name | Value |\n| --- | --- |\n| a | 1 |");
    }

    #[test]
    fn test_page_break_between_pages() {
        let para = para_of(vec![mock_word("one", false, false, false)]);
        let para2 = para_of(vec![mock_word("two", false, false, false)]);
        let doc = Document {
            pages: vec![
                Page::new(1, 612.0, 792.0, vec![para]),
                Page::new(2, 612.0, 792.0, vec![para2]),
            ],
        };

        let config = Config::default();
        let md = document_to_markdown(&doc, &config);
        assert_eq!(md, "one\n\n---\n\ntwo\n");

        let no_breaks = Config::default().with_page_breaks(false);
        let md = document_to_markdown(&doc, &no_breaks);
        assert_eq!(md, "one\n\ntwo\n");
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::default();
        assert_eq!(document_to_markdown(&doc, &Config::default()), "");
    }

    #[test]
    fn test_tables_omitted_when_detection_disabled() {
        let cell = TableCell {
            bbox: Rect::default(),
            content: "x".to_string(),
            words: Vec::new(),
        };
        let table = Table {
            bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
            rows: vec![TableRow {
                cells: vec![cell],
                bbox: Rect::default(),
            }],
            cells: Vec::new(),
            num_rows: 1,
            num_cols: 1,
        };
        let mut page = Page::new(1, 612.0, 792.0, vec![]);
        page.tables = vec![table];
        let doc = Document { pages: vec![page] };

        let config = Config::default().with_tables(false);
        assert_eq!(document_to_markdown(&doc, &config), "");
    }
}
