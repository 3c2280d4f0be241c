//! Fold - merging word-processing packages
//!
//! Sources are folded, in the order given, into a copy of a template:
//!
//! 1. read the source and normalize its body and footnotes
//! 2. move its footnote, revision and relationship ids above the target's
//!    high-water marks
//! 3. copy the footnotes, charts (with their embeddings), images and
//!    hyperlinks it references into the target
//! 4. append its body ahead of the target's section properties
//!
//! The merged package is committed atomically once every source is in; a
//! failure anywhere leaves the destination untouched.

mod charts;
mod engine;
mod error;
mod footnotes;
mod ids;
mod media;
mod options;
mod prefetch;
mod remap;
mod source;
mod state;

pub use charts::ChartTransfer;
pub use engine::{merge_documents, FoldEngine, FoldReport, SourceReport};
pub use error::{FoldError, FoldStage, Result};
pub use footnotes::referenced_footnotes;
pub use ids::{
    ChartSeq, EmbeddingKind, EmbeddingSeq, FootnoteId, IdSpace, Offset, RelationshipId,
    RevisionId,
};
pub use options::FoldOptions;
pub use prefetch::{merge_documents_async, prefetch_sources};
pub use remap::{
    collect_ids, ensure_disjoint, high_water_mark, relationship_ids, relationships_high_water,
    shift, shift_relationships,
};
pub use source::PreparedSource;
pub use state::{HighWater, MergeState};
