//! Style names the normalizer emits

use serde::{Deserialize, Serialize};

/// Named styles used by the canonical form
///
/// Missing keys in a configuration file fall back to the Word built-in
/// names below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Character style replacing bold
    pub strong_style: String,
    /// Character style replacing italic
    pub emphasis_style: String,
    /// Character style of footnote reference marks
    pub footnote_reference_style: String,
    /// The one table style every table ends up with
    pub table_style: String,
    /// Paragraph style of level-1 headings
    pub heading_style: String,
    /// Underlined paragraph right after a table
    pub table_note_style: String,
    /// Underlined paragraph right after a figure
    pub figure_note_style: String,
    /// Underlined paragraph following another note
    pub source_note_style: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            strong_style: "Strong".to_string(),
            emphasis_style: "Emphasis".to_string(),
            footnote_reference_style: "FootnoteReference".to_string(),
            table_style: "TableGrid".to_string(),
            heading_style: "Heading1".to_string(),
            table_note_style: "TableNote".to_string(),
            figure_note_style: "FigureNote".to_string(),
            source_note_style: "SourceNote".to_string(),
        }
    }
}

impl NormalizeOptions {
    /// Whether a paragraph style is one of the note styles
    pub fn is_note_style(&self, style: &str) -> bool {
        style == self.table_note_style
            || style == self.figure_note_style
            || style == self.source_note_style
    }
}
