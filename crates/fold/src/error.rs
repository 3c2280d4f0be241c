//! Error types for folding packages

use std::fmt;

use normalize::NormalizeError;
use store::DocxError;
use thiserror::Error;

use crate::ids::FootnoteId;

/// Step of the per-source fold in which an error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldStage {
    Read,
    Normalize,
    Shift,
    Transfer,
    Append,
}

impl fmt::Display for FoldStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FoldStage::Read => "read",
            FoldStage::Normalize => "normalize",
            FoldStage::Shift => "shift",
            FoldStage::Transfer => "transfer",
            FoldStage::Append => "append",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum FoldError {
    #[error(transparent)]
    Package(#[from] DocxError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// The template could not be opened
    #[error("Could not open template: {0}")]
    Template(#[source] DocxError),

    #[error("Footnote {id} is referenced but not defined")]
    DanglingFootnoteReference { id: FootnoteId },

    #[error("Relationship {id} is referenced from {part} but not defined")]
    DanglingRelationship { id: String, part: String },

    #[error("Unsupported chart {chart}: {reason}")]
    UnsupportedChartShape { chart: String, reason: String },

    #[error("Unsupported relationship {id} of type {rel_type}")]
    UnsupportedRelationship { id: String, rel_type: String },

    /// A reference into a part the fold does not carry across (comments,
    /// endnotes)
    #[error("Unsupported reference {element} {id}: its part is not carried across")]
    UnsupportedReference { element: String, id: String },

    /// A shifted id is already taken in the target. Offsets are computed
    /// above every id in the target, so this is a defect in the remapper.
    #[error("{space} id {id} already exists in the target")]
    IdCollision { space: &'static str, id: String },

    /// First fatal error of a fold, with the source and step it came from
    #[error("{source_label}: {stage} failed: {error}")]
    Source {
        source_label: String,
        stage: FoldStage,
        #[source]
        error: Box<FoldError>,
    },

    #[error("Could not commit merged package: {0}")]
    Commit(#[source] DocxError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Prefetch worker failed: {0}")]
    Prefetch(String),
}

impl FoldError {
    /// Attach the failing source and stage
    pub fn in_source(self, source_label: &str, stage: FoldStage) -> Self {
        match self {
            already @ FoldError::Source { .. } => already,
            error => FoldError::Source {
                source_label: source_label.to_string(),
                stage,
                error: Box::new(error),
            },
        }
    }

    /// The error underneath any source/stage wrapping
    pub fn root(&self) -> &FoldError {
        match self {
            FoldError::Source { error, .. } => error.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, FoldError>;
