//! Sources read and normalized, ready to be folded

use std::path::Path;

use normalize::{normalize_document, normalize_footnotes, NormalizeOptions};
use store::{
    relationship_types, resolve_target, ContentTypes, Package, Relationships, XmlDocument,
    DOCUMENT_PART,
};

use crate::error::{FoldError, FoldStage, Result};

/// One source package after reading and normalization
///
/// Nothing here depends on the target, so sources can be prepared ahead of
/// the fold and in parallel.
#[derive(Debug, Clone)]
pub struct PreparedSource {
    pub label: String,
    pub package: Package,
    pub content_types: ContentTypes,
    /// Normalized main document
    pub document: XmlDocument,
    pub relationships: Relationships,
    /// Normalized footnotes; `None` when the source has none
    pub footnotes: Option<XmlDocument>,
    pub footnote_relationships: Relationships,
}

impl PreparedSource {
    /// Read and normalize a source from disk
    pub fn load(path: &Path, options: &NormalizeOptions) -> Result<Self> {
        let label = path.display().to_string();
        let package = Package::open(path).map_err(|e| {
            FoldError::from(e).in_source(&label, FoldStage::Read)
        })?;
        Self::from_package(label, package, options)
    }

    /// Read the parts of an opened package and normalize them
    pub fn from_package(label: String, package: Package, options: &NormalizeOptions) -> Result<Self> {
        let read = |package: &Package| -> Result<_> {
            let content_types = package.content_types()?;
            let document = package.read_xml(DOCUMENT_PART)?;
            let relationships = package.relationships(DOCUMENT_PART)?;
            let footnotes_path = relationships
                .get_by_type(relationship_types::FOOTNOTES)
                .map(|r| resolve_target(DOCUMENT_PART, &r.target));
            let (footnotes, footnote_relationships) = match footnotes_path {
                Some(path) => (
                    package.read_optional_xml(&path)?,
                    package.relationships(&path)?,
                ),
                None => (None, Relationships::new()),
            };
            Ok((content_types, document, relationships, footnotes, footnote_relationships))
        };
        let (content_types, document, relationships, footnotes, footnote_relationships) =
            read(&package).map_err(|e| e.in_source(&label, FoldStage::Read))?;

        let normalized = normalize_document(&document, options)
            .and_then(|document| {
                let footnotes = footnotes
                    .as_ref()
                    .map(|f| normalize_footnotes(f, options))
                    .transpose()?;
                Ok((document, footnotes))
            })
            .map_err(|e| FoldError::from(e).in_source(&label, FoldStage::Normalize))?;
        let (document, footnotes) = normalized;

        tracing::debug!(
            "Prepared {} ({} relationships, footnotes: {})",
            label,
            relationships.len(),
            footnotes.is_some()
        );
        Ok(Self {
            label,
            package,
            content_types,
            document,
            relationships,
            footnotes,
            footnote_relationships,
        })
    }
}
