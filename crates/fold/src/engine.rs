//! The fold: sources folded one at a time into a target package

use std::collections::BTreeSet;
use std::path::Path;

use normalize::NormalizeOptions;
use serde::Serialize;
use store::{
    relationship_types, Package, Relationships, XmlDocument, XmlElement, XmlNode, DOCUMENT_PART,
};

use crate::charts::transfer_chart;
use crate::error::{FoldError, FoldStage, Result};
use crate::footnotes::{transfer_footnotes, FootnoteTransfer};
use crate::ids::{FootnoteId, IdSpace, Offset, RelationshipId, RevisionId};
use crate::media::{transfer_hyperlink, transfer_image};
use crate::options::FoldOptions;
use crate::remap::{
    collect_ids, ensure_disjoint, high_water_mark, relationships_high_water, shift,
    shift_relationships,
};
use crate::source::PreparedSource;
use crate::state::{adopt_namespaces, HighWater, MergeState};

/// What one source contributed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub footnotes: usize,
    pub charts: usize,
    pub media: usize,
    pub hyperlinks: usize,
}

/// Per-source counts of a finished fold, in fold order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FoldReport {
    pub sources: Vec<SourceReport>,
}

/// A source with every id moved above the target's high-water marks
struct ShiftedSource {
    /// Body content to append, the source's own section properties left out
    content: XmlElement,
    footnotes: Option<XmlDocument>,
    /// Relationships of the footnotes part, shifted above the target's
    footnote_relationships: Relationships,
    relationships: Relationships,
    high_water: HighWater,
}

/// Elements pointing into parts a fold does not carry across
const UNCARRIED_REFERENCES: &[&str] = &[
    "w:commentReference",
    "w:commentRangeStart",
    "w:commentRangeEnd",
    "w:endnoteReference",
];

/// Fail on the first comment or endnote reference in a tree
pub(crate) fn reject_uncarried_references(tree: &XmlElement) -> Result<()> {
    let mut found: Option<(String, String)> = None;
    tree.walk(&mut |e| {
        if found.is_none() && UNCARRIED_REFERENCES.contains(&e.name.as_str()) {
            found = Some((e.name.clone(), e.attr("w:id").unwrap_or_default().to_string()));
        }
    });
    match found {
        Some((element, id)) => Err(FoldError::UnsupportedReference { element, id }),
        None => Ok(()),
    }
}

/// Folds prepared sources into a target, strictly in the order given
///
/// ```no_run
/// # use fold::{FoldEngine, FoldOptions, PreparedSource};
/// # use std::path::Path;
/// # fn main() -> fold::Result<()> {
/// let options = FoldOptions::default();
/// let template = store::Package::open("template.docx")?;
/// let mut engine = FoldEngine::new(template, &options)?;
/// let source = PreparedSource::load(Path::new("chapter1.docx"), &options.normalize)?;
/// engine.fold(&source)?;
/// let (package, _report) = engine.finish();
/// package.commit("book.docx")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FoldEngine {
    state: MergeState,
    options: NormalizeOptions,
    report: FoldReport,
    warned_styles: BTreeSet<String>,
}

impl FoldEngine {
    /// Seed a fold from a template package
    pub fn new(template: Package, options: &FoldOptions) -> Result<Self> {
        let state = MergeState::seed(template).map_err(|e| match e {
            FoldError::Package(error) => FoldError::Template(error),
            other => other,
        })?;
        Ok(Self {
            state,
            options: options.normalize.clone(),
            report: FoldReport::default(),
            warned_styles: BTreeSet::new(),
        })
    }

    pub fn high_water(&self) -> HighWater {
        self.state.high_water()
    }

    /// Fold one source into the target
    ///
    /// On error the target is left as it was before the call, so the
    /// engine may go on with other sources.
    pub fn fold(&mut self, source: &PreparedSource) -> Result<&SourceReport> {
        let label = source.label.as_str();
        tracing::info!("Folding {}", label);

        let snapshot = self.state.clone();
        let report = match self.fold_stages(source) {
            Ok(report) => report,
            Err(error) => {
                self.state = snapshot;
                tracing::debug!("Rolled back {}", label);
                return Err(error);
            }
        };

        tracing::info!(
            "Folded {}: {} footnotes, {} charts, {} media, {} hyperlinks",
            label,
            report.footnotes,
            report.charts,
            report.media,
            report.hyperlinks
        );
        self.report.sources.push(report);
        Ok(&self.report.sources[self.report.sources.len() - 1])
    }

    fn fold_stages(&mut self, source: &PreparedSource) -> Result<SourceReport> {
        let label = source.label.as_str();
        let shifted = self
            .shift(source)
            .map_err(|e| e.in_source(label, FoldStage::Shift))?;
        let report = self
            .transfer(source, &shifted)
            .map_err(|e| e.in_source(label, FoldStage::Transfer))?;
        let high_water = shifted.high_water;
        self.append(source, shifted.content)
            .map_err(|e| e.in_source(label, FoldStage::Append))?;
        self.state.advance(high_water);
        Ok(report)
    }

    /// Hand back the target package and the report
    pub fn finish(self) -> (Package, FoldReport) {
        (self.state.into_package(), self.report)
    }

    fn shift(&self, source: &PreparedSource) -> Result<ShiftedSource> {
        let target = self.state.high_water();
        let footnote_offset = Offset::above(target.footnote);
        let revision_offset = Offset::above(target.revision);
        let relationship_offset = Offset::above(target.relationship);
        let footnote_relationship_offset =
            Offset::above(relationships_high_water(&self.state.footnote_rels));
        tracing::debug!(
            "Offsets for {}: footnotes {:+}, revisions {:+}, relationships {:+}, footnote relationships {:+}",
            source.label,
            footnote_offset.delta(),
            revision_offset.delta(),
            relationship_offset.delta(),
            footnote_relationship_offset.delta()
        );

        let body = source
            .document
            .root
            .child("w:body")
            .ok_or(normalize::NormalizeError::MissingBody)?;
        reject_uncarried_references(body)?;
        let body = shift(body, relationship_offset);
        let body = shift(&body, footnote_offset);
        let body = shift(&body, revision_offset);

        let mut content = XmlElement::new("w:body");
        content.children = body
            .children
            .into_iter()
            .filter(|node| !matches!(node, XmlNode::Element(e) if e.is("w:sectPr")))
            .collect();

        // Footnote relationships live in their own part and are numbered
        // against the target footnotes part.
        let footnotes = source.footnotes.as_ref().map(|f| {
            let root = shift(&f.root, footnote_offset);
            let root = shift(&root, revision_offset);
            XmlDocument::new(shift(&root, footnote_relationship_offset))
        });
        let footnote_relationships =
            shift_relationships(&source.footnote_relationships, footnote_relationship_offset);
        let relationships = shift_relationships(&source.relationships, relationship_offset);

        let mut revisions = collect_ids::<RevisionId>(&content);
        if let Some(footnotes) = &footnotes {
            revisions.extend(collect_ids::<RevisionId>(&footnotes.root));
        }
        let footnote_ids = collect_ids::<FootnoteId>(&content);
        ensure_disjoint(&footnote_ids, &self.state.footnote_ids())?;
        ensure_disjoint(&revisions, &self.state.revision_ids())?;
        let referenced = referenced_relationships(&content);
        let numeric: BTreeSet<RelationshipId> = referenced
            .iter()
            .filter_map(|id| RelationshipId::parse(id))
            .collect();
        ensure_disjoint(&numeric, &self.state.relationship_ids())?;
        if let Some(id) = referenced
            .iter()
            .find(|id| RelationshipId::parse(id).is_none() && self.state.document_rels.contains(id))
        {
            return Err(FoldError::IdCollision {
                space: RelationshipId::NAME,
                id: id.clone(),
            });
        }

        let high_water = HighWater {
            relationship: target.relationship,
            footnote: high_water_mark::<FootnoteId>(&content),
            revision: revisions.iter().next_back().copied().unwrap_or(target.revision),
        };
        Ok(ShiftedSource {
            content,
            footnotes,
            footnote_relationships,
            relationships,
            high_water,
        })
    }

    fn transfer(&mut self, source: &PreparedSource, shifted: &ShiftedSource) -> Result<SourceReport> {
        let mut report = SourceReport {
            source: source.label.clone(),
            ..SourceReport::default()
        };

        // Relationships first: creating the footnotes part allocates a new
        // id above everything in the document relationships.
        for id in referenced_relationships(&shifted.content) {
            let relationship = shifted.relationships.get(&id).ok_or_else(|| {
                FoldError::DanglingRelationship {
                    id: id.clone(),
                    part: DOCUMENT_PART.to_string(),
                }
            })?;
            match relationship.rel_type.as_str() {
                relationship_types::CHART => {
                    transfer_chart(&mut self.state, source, relationship)?;
                    report.charts += 1;
                }
                relationship_types::IMAGE => {
                    transfer_image(&mut self.state, source, relationship)?;
                    report.media += 1;
                }
                relationship_types::HYPERLINK => {
                    transfer_hyperlink(&mut self.state, relationship)?;
                    report.hyperlinks += 1;
                }
                other => {
                    return Err(FoldError::UnsupportedRelationship {
                        id,
                        rel_type: other.to_string(),
                    })
                }
            }
        }

        let FootnoteTransfer {
            footnotes,
            hyperlinks,
        } = transfer_footnotes(
            &mut self.state,
            &shifted.content,
            shifted.footnotes.as_ref(),
            &shifted.footnote_relationships,
            &self.options,
        )?;
        report.footnotes = footnotes;
        report.hyperlinks += hyperlinks;
        Ok(report)
    }

    fn append(&mut self, source: &PreparedSource, content: XmlElement) -> Result<()> {
        self.warn_missing_styles(&source.label, &content);

        adopt_namespaces(&mut self.state.document.root, &source.document.root);
        let body = self.state.body_mut()?;
        // Content goes ahead of the target's closing section properties
        let at = match body.children.last() {
            Some(XmlNode::Element(e)) if e.is("w:sectPr") => body.children.len() - 1,
            _ => body.children.len(),
        };
        let count = content.children.len();
        let tail = body.children.split_off(at);
        body.children.extend(content.children);
        body.children.extend(tail);
        tracing::debug!("Appended {} body nodes from {}", count, source.label);
        Ok(())
    }

    fn warn_missing_styles(&mut self, label: &str, content: &XmlElement) {
        let Some(defined) = self.state.defined_styles() else {
            return;
        };
        let mut missing = BTreeSet::new();
        content.walk(&mut |e| {
            if e.is("w:pStyle") || e.is("w:rStyle") || e.is("w:tblStyle") {
                if let Some(style) = e.attr("w:val") {
                    if !defined.contains(style) {
                        missing.insert(style.to_string());
                    }
                }
            }
        });
        for style in missing {
            if self.warned_styles.insert(style.clone()) {
                tracing::warn!("Style {} used by {} is not defined in the template", style, label);
            }
        }
    }
}

/// Relationship ids referenced from content, in document order without
/// repeats
fn referenced_relationships(content: &XmlElement) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    content.walk(&mut |e| {
        for (key, value) in &e.attributes {
            if RelationshipId::holds_id(e, key) && !ids.iter().any(|id| id == value) {
                ids.push(value.clone());
            }
        }
    });
    ids
}

/// Merge `sources`, in order, into a copy of `template` and commit it to
/// `output`
///
/// Any failure leaves `output` as it was.
pub fn merge_documents<P: AsRef<Path>>(
    template: impl AsRef<Path>,
    sources: &[P],
    output: impl AsRef<Path>,
    options: &FoldOptions,
) -> Result<FoldReport> {
    let template = template.as_ref();
    let output = output.as_ref();
    tracing::info!(
        "Merging {} sources into {} (template {})",
        sources.len(),
        output.display(),
        template.display()
    );

    let package = Package::open(template).map_err(FoldError::Template)?;
    let mut engine = FoldEngine::new(package, options)?;
    for path in sources {
        let source = PreparedSource::load(path.as_ref(), &options.normalize)?;
        engine.fold(&source)?;
    }
    commit(engine, output)
}

pub(crate) fn commit(engine: FoldEngine, output: &Path) -> Result<FoldReport> {
    let (package, report) = engine.finish();
    package.commit(output).map_err(FoldError::Commit)?;
    tracing::info!("Wrote {} ({} sources)", output.display(), report.sources.len());
    Ok(report)
}
