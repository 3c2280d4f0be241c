//! Error types for package operations

use thiserror::Error;

/// Errors that can occur while reading, editing or committing a package
#[derive(Debug, Error)]
pub enum DocxError {
    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// The input is not a zip archive, or lacks the parts every
    /// word-processing package must have
    #[error("Not a word-processing package: {0}")]
    NotAPackage(String),

    /// A required part is absent
    #[error("Missing required part: {0}")]
    PartMissing(String),

    /// Invalid package structure
    #[error("Invalid package structure: {0}")]
    InvalidStructure(String),

    /// Relationship error
    #[error("Relationship error: {0}")]
    RelationshipError(String),

    /// The package could not be written to its destination
    #[error("Could not write package to {path}: {reason}")]
    PackageWrite { path: String, reason: String },

    /// UTF-8 encoding error
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<quick_xml::Error> for DocxError {
    fn from(err: quick_xml::Error) -> Self {
        DocxError::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DocxError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DocxError::XmlParse(format!("Attribute error: {}", err))
    }
}

impl From<std::str::Utf8Error> for DocxError {
    fn from(err: std::str::Utf8Error) -> Self {
        DocxError::XmlParse(format!("Invalid UTF-8: {}", err))
    }
}

/// Result type for package operations
pub type DocxResult<T> = std::result::Result<T, DocxError>;
