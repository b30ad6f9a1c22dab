//! Layout analysis: recovering words, lines, paragraphs, columns, and
//! annotations from a flat glyph stream.
//!
//! Stages in dependency order:
//! - word assembly (`word_builder`)
//! - rotation partition (`rotation`)
//! - line grouping (`line_grouper`)
//! - paragraph grouping (`paragraph`)
//! - column detection and reading order (`column_detector`)
//! - heading/list/code annotation (`annotate`)

pub mod annotate;
pub mod column_detector;
pub mod line_grouper;
pub mod paragraph;
pub mod rotation;
pub mod text_block;
pub mod word_builder;

pub use annotate::{detect_code_blocks, detect_headings, detect_lists, normalize_document_headings};
pub use column_detector::{detect_columns, determine_reading_order};
pub use line_grouper::{group_block_lines, merge_close_words};
pub use paragraph::group_lines_into_paragraphs;
pub use rotation::detect_text_rotation;
pub use text_block::{
    Alignment, Column, EnrichedChar, EnrichedWord, Line, Paragraph, TextBlock,
};
pub use word_builder::{deduplicate_cjk, expand_ligatures, group_chars_into_words};
