//! Target package under construction

use std::collections::BTreeSet;

use store::{
    content_type_values, relationship_types, resolve_target, ContentTypes, DocxError, Package,
    Relationships, XmlDocument, XmlElement, DOCUMENT_PART,
};

use crate::error::Result;
use crate::ids::{FootnoteId, IdSpace, RelationshipId, RevisionId};
use crate::remap::{collect_ids, high_water_mark, relationship_ids, relationships_high_water};

pub(crate) const DEFAULT_FOOTNOTES_PART: &str = "word/footnotes.xml";
const DEFAULT_STYLES_PART: &str = "word/styles.xml";

/// Largest id used so far in each tree-borne space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighWater {
    pub relationship: RelationshipId,
    pub footnote: FootnoteId,
    pub revision: RevisionId,
}

impl HighWater {
    /// Component-wise maximum
    pub fn max(self, other: HighWater) -> HighWater {
        HighWater {
            relationship: self.relationship.max(other.relationship),
            footnote: self.footnote.max(other.footnote),
            revision: self.revision.max(other.revision),
        }
    }
}

/// The target package plus the running high-water marks of a fold
///
/// The main document, its relationships, the content types and the
/// footnotes are held parsed while sources are folded in, and written back
/// into the package once at the end. A state no source was folded into
/// hands back the template package untouched.
#[derive(Debug, Clone)]
pub struct MergeState {
    pub(crate) target: Package,
    pub(crate) document: XmlDocument,
    pub(crate) document_rels: Relationships,
    pub(crate) content_types: ContentTypes,
    pub(crate) footnotes_path: String,
    pub(crate) footnotes: Option<XmlDocument>,
    /// Relationships owned by the footnotes part
    pub(crate) footnote_rels: Relationships,
    high_water: HighWater,
    defined_styles: Option<BTreeSet<String>>,
    touched: bool,
}

impl MergeState {
    /// Seed a fold from a template package
    pub fn seed(target: Package) -> Result<Self> {
        let document = target.read_xml(DOCUMENT_PART)?;
        if !document.root.has_child("w:body") {
            return Err(DocxError::InvalidStructure(format!("{} has no w:body", DOCUMENT_PART)).into());
        }
        let document_rels = target.relationships(DOCUMENT_PART)?;
        let content_types = target.content_types()?;

        let footnotes_path = part_path(&document_rels, relationship_types::FOOTNOTES)
            .unwrap_or_else(|| DEFAULT_FOOTNOTES_PART.to_string());
        let footnotes = target.read_optional_xml(&footnotes_path)?;
        let footnote_rels = target.relationships(&footnotes_path)?;

        let styles_path = part_path(&document_rels, relationship_types::STYLES)
            .unwrap_or_else(|| DEFAULT_STYLES_PART.to_string());
        let defined_styles = target
            .read_optional_xml(&styles_path)?
            .map(|styles| style_ids(&styles.root));

        let mut revision = high_water_mark::<RevisionId>(&document.root);
        let mut footnote = FootnoteId::floor();
        if let Some(footnotes) = &footnotes {
            footnote = high_water_mark::<FootnoteId>(&footnotes.root);
            revision = revision.max(high_water_mark::<RevisionId>(&footnotes.root));
        }
        let high_water = HighWater {
            relationship: relationships_high_water(&document_rels),
            footnote,
            revision,
        };
        tracing::debug!(
            "Seeded target: relationships {}, footnotes {}, revisions {}",
            high_water.relationship,
            high_water.footnote,
            high_water.revision
        );

        Ok(Self {
            target,
            document,
            document_rels,
            content_types,
            footnotes_path,
            footnotes,
            footnote_rels,
            high_water,
            defined_styles,
            touched: false,
        })
    }

    pub fn high_water(&self) -> HighWater {
        self.high_water
    }

    /// Raise the high-water marks past everything one source copied in
    pub(crate) fn advance(&mut self, copied: HighWater) {
        let relationships = HighWater {
            relationship: relationships_high_water(&self.document_rels),
            ..self.high_water
        };
        self.high_water = self.high_water.max(copied).max(relationships);
        self.touched = true;
    }

    /// Footnote ids defined in the target
    pub(crate) fn footnote_ids(&self) -> BTreeSet<FootnoteId> {
        self.footnotes
            .as_ref()
            .map(|f| collect_ids::<FootnoteId>(&f.root))
            .unwrap_or_default()
    }

    /// Revision ids used anywhere in the target
    pub(crate) fn revision_ids(&self) -> BTreeSet<RevisionId> {
        let mut ids = collect_ids::<RevisionId>(&self.document.root);
        if let Some(footnotes) = &self.footnotes {
            ids.extend(collect_ids::<RevisionId>(&footnotes.root));
        }
        ids
    }

    pub(crate) fn relationship_ids(&self) -> BTreeSet<RelationshipId> {
        relationship_ids(&self.document_rels)
    }

    /// The target footnotes part, created with its separators, relationship
    /// and content type the first time it is needed
    pub(crate) fn footnotes_mut(&mut self) -> &mut XmlDocument {
        if self.footnotes.is_none() {
            let target = store::relative_target(DOCUMENT_PART, &self.footnotes_path);
            let id = self.document_rels.add(
                relationship_types::FOOTNOTES,
                &target,
                store::TargetMode::Internal,
            );
            self.content_types
                .add_override(&self.footnotes_path, content_type_values::FOOTNOTES);
            tracing::debug!("Created {} under {}", self.footnotes_path, id);
        }
        self.footnotes.get_or_insert_with(empty_footnotes)
    }

    /// The target's `w:body`
    pub(crate) fn body_mut(&mut self) -> Result<&mut XmlElement> {
        self.document
            .root
            .child_mut("w:body")
            .ok_or_else(|| DocxError::InvalidStructure(format!("{} has no w:body", DOCUMENT_PART)).into())
    }

    /// Style ids the target's styles part defines, if it has one
    pub(crate) fn defined_styles(&self) -> Option<&BTreeSet<String>> {
        self.defined_styles.as_ref()
    }

    /// Hand back the package, with every edited part written into it
    pub fn into_package(self) -> Package {
        let mut package = self.target;
        if !self.touched {
            return package;
        }
        package.write_xml(DOCUMENT_PART, self.document);
        package.set_relationships(DOCUMENT_PART, &self.document_rels);
        package.set_content_types(&self.content_types);
        if let Some(footnotes) = self.footnotes {
            package.write_xml(&self.footnotes_path, footnotes);
        }
        if !self.footnote_rels.is_empty() {
            package.set_relationships(&self.footnotes_path, &self.footnote_rels);
        }
        package
    }
}

/// Archive path of the first document relationship of `rel_type`
fn part_path(relationships: &Relationships, rel_type: &str) -> Option<String> {
    relationships
        .get_by_type(rel_type)
        .map(|r| resolve_target(DOCUMENT_PART, &r.target))
}

fn style_ids(styles: &XmlElement) -> BTreeSet<String> {
    styles
        .elements()
        .filter(|e| e.is("w:style"))
        .filter_map(|e| e.attr("w:styleId"))
        .map(str::to_string)
        .collect()
}

/// A footnotes part holding only the separator and continuation footnotes
pub(crate) fn empty_footnotes() -> XmlDocument {
    let separator = |kind: &str, id: &str, mark: &str| {
        XmlElement::new("w:footnote")
            .with_attr("w:type", kind)
            .with_attr("w:id", id)
            .with_child(
                XmlElement::new("w:p").with_child(
                    XmlElement::new("w:pPr").with_child(
                        XmlElement::new("w:spacing")
                            .with_attr("w:after", "0")
                            .with_attr("w:line", "240")
                            .with_attr("w:lineRule", "auto"),
                    ),
                )
                .with_child(XmlElement::new("w:r").with_child(XmlElement::new(mark))),
            )
    };
    XmlDocument::new(
        XmlElement::new("w:footnotes")
            .with_attr("xmlns:w", store::namespaces::W)
            .with_attr("xmlns:r", store::namespaces::R)
            .with_child(separator("separator", "-1", "w:separator"))
            .with_child(separator("continuationSeparator", "0", "w:continuationSeparator")),
    )
}

/// Copy namespace declarations the target root lacks from a source root,
/// along with the source's ignorable prefixes
pub(crate) fn adopt_namespaces(target: &mut XmlElement, source: &XmlElement) {
    for (key, value) in &source.attributes {
        if key.starts_with("xmlns:") && target.attr(key).is_none() {
            target.set_attr(key.clone(), value.clone());
        }
    }

    let Some(source_ignorable) = source.attr("mc:Ignorable") else {
        return;
    };
    let mut prefixes: Vec<String> = target
        .attr("mc:Ignorable")
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let before = prefixes.len();
    for prefix in source_ignorable.split_whitespace() {
        if !prefixes.iter().any(|p| p == prefix) {
            prefixes.push(prefix.to_string());
        }
    }
    if prefixes.len() != before {
        target.set_attr("mc:Ignorable", prefixes.join(" "));
    }
}
