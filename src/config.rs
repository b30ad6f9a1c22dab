//! Conversion configuration.

use serde::Serialize;

/// Strategy for deriving table edges along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EdgeStrategy {
    /// Use explicit ruling-line objects from the PDF, falling back to
    /// text-derived edges when the page has none.
    #[default]
    Lines,
    /// Derive edges from word alignment only.
    Text,
    /// Use ruling lines and text-derived edges together.
    LinesText,
}

/// Settings for the line-based table detector.
#[derive(Debug, Clone, Serialize)]
pub struct TableSettings {
    /// Edge strategy for vertical edges.
    pub vertical_strategy: EdgeStrategy,
    /// Edge strategy for horizontal edges.
    pub horizontal_strategy: EdgeStrategy,
    /// Tolerance for snapping nearby parallel edges onto one position.
    pub snap_tolerance: f64,
    /// Tolerance for joining collinear edges into one.
    pub join_tolerance: f64,
    /// Minimum edge length to keep after snapping and joining.
    pub edge_min_length: f64,
    /// Minimum words in an alignment cluster to infer a vertical edge.
    pub min_words_vertical: usize,
    /// Minimum words in an alignment cluster to infer a horizontal edge.
    pub min_words_horizontal: usize,
    /// Tolerance when testing whether two edges intersect.
    pub intersection_tolerance: f64,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            vertical_strategy: EdgeStrategy::Lines,
            horizontal_strategy: EdgeStrategy::Lines,
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length: 3.0,
            min_words_vertical: 3,
            min_words_horizontal: 1,
            intersection_tolerance: 3.0,
        }
    }
}

/// Markdown conversion configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Emit a horizontal-rule separator between pages.
    pub include_page_breaks: bool,

    /// Minimum heading font size as a multiple of the body-text median.
    /// 0 disables size-based heading detection.
    pub min_heading_font_size: f64,

    /// Enable table detection.
    pub detect_tables: bool,

    /// Enable the segment-based (PDF-TREX) table detector in addition to
    /// the line-based one. Opt-in: useful for tables without ruling
    /// lines, at the cost of occasional false positives on dense forms.
    pub use_segment_based_tables: bool,

    /// Derive segment-clustering thresholds from the page's own spacing
    /// distribution instead of fixed values.
    pub use_adaptive_thresholds: bool,

    /// Line-based table detector settings.
    pub table_settings: TableSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_page_breaks: true,
            min_heading_font_size: 1.15,
            detect_tables: true,
            use_segment_based_tables: false,
            use_adaptive_thresholds: true,
            table_settings: TableSettings::default(),
        }
    }
}

impl Config {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle page-break separators.
    pub fn with_page_breaks(mut self, enable: bool) -> Self {
        self.include_page_breaks = enable;
        self
    }

    /// Set the heading size threshold (0 disables size-based detection).
    pub fn with_min_heading_font_size(mut self, ratio: f64) -> Self {
        self.min_heading_font_size = ratio;
        self
    }

    /// Toggle table detection.
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.detect_tables = enable;
        self
    }

    /// Toggle the segment-based table detector.
    pub fn with_segment_based_tables(mut self, enable: bool) -> Self {
        self.use_segment_based_tables = enable;
        self
    }

    /// Toggle adaptive threshold derivation.
    pub fn with_adaptive_thresholds(mut self, enable: bool) -> Self {
        self.use_adaptive_thresholds = enable;
        self
    }

    /// Replace the table detector settings.
    pub fn with_table_settings(mut self, settings: TableSettings) -> Self {
        self.table_settings = settings;
        self
    }
}
