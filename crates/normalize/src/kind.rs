//! Element kinds the merge pipeline understands

use store::XmlElement;

/// Closed set of body element kinds
///
/// Everything the format allows that is not listed here is carried through
/// untouched as [`ElementKind::Passthrough`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Paragraph,
    Run,
    Table,
    TableRow,
    TableCell,
    /// `w:drawing`, or the legacy `w:pict`/`w:object` containers
    Drawing,
    /// `c:chart` reference nested inside a drawing
    Chart,
    Text,
    Passthrough,
}

impl ElementKind {
    pub fn of(element: &XmlElement) -> Self {
        match element.name.as_str() {
            "w:p" => ElementKind::Paragraph,
            "w:r" => ElementKind::Run,
            "w:tbl" => ElementKind::Table,
            "w:tr" => ElementKind::TableRow,
            "w:tc" => ElementKind::TableCell,
            "w:drawing" | "w:pict" | "w:object" => ElementKind::Drawing,
            "c:chart" => ElementKind::Chart,
            "w:t" => ElementKind::Text,
            _ => ElementKind::Passthrough,
        }
    }
}

/// Whether an element (or a descendant) is a drawing of any kind
pub fn holds_drawing(element: &XmlElement) -> bool {
    match ElementKind::of(element) {
        ElementKind::Drawing | ElementKind::Chart => true,
        ElementKind::Paragraph
        | ElementKind::Run
        | ElementKind::Table
        | ElementKind::TableRow
        | ElementKind::TableCell
        | ElementKind::Passthrough => element.elements().any(holds_drawing),
        ElementKind::Text => false,
    }
}
