//! Footnote transfer

use normalize::{strip_editing_metadata, NormalizeOptions};
use store::{relationship_types, Relationship, Relationships, XmlDocument, XmlElement, XmlNode};

use crate::engine::reject_uncarried_references;
use crate::error::{FoldError, Result};
use crate::ids::{FootnoteId, IdSpace, RelationshipId};
use crate::state::{adopt_namespaces, MergeState};

/// Footnote ids referenced from a body, in document order without repeats
pub fn referenced_footnotes(body: &XmlElement) -> Vec<FootnoteId> {
    let mut ids = Vec::new();
    body.walk(&mut |e| {
        if e.is("w:footnoteReference") {
            if let Some(id) = e.attr("w:id").and_then(FootnoteId::parse) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    });
    ids
}

/// What one source's footnotes brought along
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FootnoteTransfer {
    pub footnotes: usize,
    pub hyperlinks: usize,
}

/// Copy every footnote a shifted body references into the target
///
/// `footnotes` and `footnote_relationships` must already carry the same
/// shifts as `body`. Hyperlinks inside copied footnotes move into the
/// target footnotes part's relationships; any other relationship is
/// rejected. Nothing is written unless every footnote can be copied.
pub(crate) fn transfer_footnotes(
    state: &mut MergeState,
    body: &XmlElement,
    footnotes: Option<&XmlDocument>,
    footnote_relationships: &Relationships,
    options: &NormalizeOptions,
) -> Result<FootnoteTransfer> {
    let referenced = referenced_footnotes(body);
    if referenced.is_empty() {
        return Ok(FootnoteTransfer::default());
    }

    let mut copied = Vec::with_capacity(referenced.len());
    let mut hyperlinks: Vec<Relationship> = Vec::new();
    for id in referenced {
        let definition = footnotes
            .and_then(|f| find_footnote(&f.root, id))
            .ok_or_else(|| FoldError::DanglingFootnoteReference { id })?;
        reject_uncarried_references(definition)?;
        let found = footnote_hyperlinks(definition, footnote_relationships, &state.footnotes_path)?;
        for relationship in found {
            if !hyperlinks.iter().any(|r| r.id == relationship.id) {
                hyperlinks.push(relationship.clone());
            }
        }
        copied.push(strip_editing_metadata(definition, options));
    }

    let transfer = FootnoteTransfer {
        footnotes: copied.len(),
        hyperlinks: hyperlinks.len(),
    };
    let target = state.footnotes_mut();
    if let Some(source) = footnotes {
        adopt_namespaces(&mut target.root, &source.root);
    }
    target
        .root
        .children
        .extend(copied.into_iter().map(XmlNode::Element));
    for relationship in hyperlinks {
        state.footnote_rels.insert(relationship)?;
    }
    tracing::debug!(
        "Transferred {} footnotes with {} hyperlinks",
        transfer.footnotes,
        transfer.hyperlinks
    );
    Ok(transfer)
}

fn find_footnote(footnotes: &XmlElement, id: FootnoteId) -> Option<&XmlElement> {
    footnotes.elements().find(|e| {
        e.is("w:footnote") && e.attr("w:id").and_then(FootnoteId::parse) == Some(id)
    })
}

/// Relationships a footnote refers to; only hyperlinks are carried across
fn footnote_hyperlinks<'a>(
    footnote: &XmlElement,
    relationships: &'a Relationships,
    footnotes_part: &str,
) -> Result<Vec<&'a Relationship>> {
    let mut ids: Vec<String> = Vec::new();
    footnote.walk(&mut |e| {
        for (key, value) in &e.attributes {
            if RelationshipId::holds_id(e, key) && !ids.contains(value) {
                ids.push(value.clone());
            }
        }
    });

    ids.into_iter()
        .map(|id| {
            let relationship = relationships.get(&id).ok_or_else(|| {
                FoldError::DanglingRelationship {
                    id: id.clone(),
                    part: footnotes_part.to_string(),
                }
            })?;
            if relationship.rel_type != relationship_types::HYPERLINK {
                return Err(FoldError::UnsupportedRelationship {
                    id,
                    rel_type: relationship.rel_type.clone(),
                });
            }
            Ok(relationship)
        })
        .collect()
}
