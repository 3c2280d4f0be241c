//! Error types for normalization

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Document has no w:body element")]
    MissingBody,

    #[error("Footnotes part has no w:footnotes root (found {0})")]
    UnexpectedFootnotesRoot(String),
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
