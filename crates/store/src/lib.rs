//! Store - Part store for word-processing packages
//!
//! This crate opens packages (zip containers of XML parts), reads and writes
//! individual parts as XML trees or raw bytes, and commits a package to disk
//! atomically.
//!
//! ## Structure
//!
//! A package is a ZIP archive containing:
//! - `[Content_Types].xml` - Content type definitions
//! - `_rels/.rels` - Root relationships
//! - `word/document.xml` - Main document content
//! - `word/_rels/document.xml.rels` - Document relationships
//! - `word/footnotes.xml` - Footnotes content
//! - `word/charts/chartN.xml` - Chart parts, with their own `_rels`
//! - `word/embeddings/` - Spreadsheets and OLE objects backing charts
//! - `word/media/` - Embedded images

mod error;
mod reader;
mod writer;
mod content_types;
mod relationships;
mod package;
pub mod xml;

pub use error::{DocxError, DocxResult};
pub use content_types::ContentTypes;
pub use relationships::{parse_rid, rels_path_for, Relationship, Relationships, TargetMode};
pub use package::{
    relative_target, resolve_target, Package, Part, PartData, CONTENT_TYPES_PART, DOCUMENT_PART,
};
pub use xml::{XmlDocument, XmlElement, XmlNode};

/// XML namespaces used in packages
pub mod namespaces {
    /// Main WordprocessingML namespace
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Relationships namespace
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    /// Package relationships namespace
    pub const PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    /// Content types namespace
    pub const CT: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
    /// DrawingML namespace
    pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    /// DrawingML chart namespace
    pub const C: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
}

/// Relationship types used in packages
pub mod relationship_types {
    pub const DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const FOOTNOTES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
    pub const CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    /// Embedded spreadsheet behind a chart
    pub const PACKAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";
    /// Embedded OLE object behind a chart
    pub const OLE_OBJECT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/oleObject";
    pub const CHART_STYLE: &str = "http://schemas.microsoft.com/office/2011/relationships/chartStyle";
    pub const CHART_COLOR_STYLE: &str = "http://schemas.microsoft.com/office/2011/relationships/chartColorStyle";
    pub const THEME_OVERRIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/themeOverride";
}

/// Content types for package parts
pub mod content_type_values {
    pub const DOCUMENT: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const FOOTNOTES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
    pub const CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
    pub const WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    pub const OLE_OBJECT: &str = "application/vnd.openxmlformats-officedocument.oleObject";
}
