//! Normalize - canonical markup for merging
//!
//! A source body is rewritten by a fixed pipeline of pure stages before it
//! can be folded into another document:
//!
//! 1. editing metadata removal
//! 2. run style promotion
//! 3. bold/italic to named styles
//! 4. underline to note paragraphs
//! 5. run merging
//! 6. table styling
//! 7. empty container removal
//! 8. heading break marking
//!
//! Every stage takes a tree and returns a new one. Running the pipeline on
//! its own output changes nothing.

mod cleanup;
mod error;
mod headings;
mod kind;
mod metadata;
mod options;
mod props;
mod runs;
mod styles;
mod tables;

pub use cleanup::strip_empty_containers;
pub use error::{NormalizeError, Result};
pub use headings::mark_heading_breaks;
pub use kind::{holds_drawing, ElementKind};
pub use metadata::strip_editing_metadata;
pub use options::NormalizeOptions;
pub use props::{paragraph_style, run_style};
pub use runs::merge_runs;
pub use styles::{collapse_emphasis, collapse_underline, promote_run_styles};
pub use tables::normalize_tables;

use store::{XmlDocument, XmlElement, XmlNode};

/// One rewrite stage
pub type Stage = fn(&XmlElement, &NormalizeOptions) -> XmlElement;

/// The stages in the order they run
pub const PIPELINE: [(&str, Stage); 8] = [
    ("strip_editing_metadata", strip_editing_metadata),
    ("promote_run_styles", promote_run_styles),
    ("collapse_emphasis", collapse_emphasis),
    ("collapse_underline", collapse_underline),
    ("merge_runs", merge_runs),
    ("normalize_tables", normalize_tables),
    ("strip_empty_containers", strip_empty_containers),
    ("mark_heading_breaks", mark_heading_breaks),
];

/// Run the whole pipeline over one subtree
pub fn normalize_tree(tree: &XmlElement, options: &NormalizeOptions) -> XmlElement {
    PIPELINE
        .iter()
        .fold(tree.clone(), |current, (name, stage)| {
            tracing::trace!(stage = *name, "normalize stage");
            stage(&current, options)
        })
}

/// Normalize the body of a main document part
pub fn normalize_document(document: &XmlDocument, options: &NormalizeOptions) -> Result<XmlDocument> {
    let mut out = document.clone();
    let body = out
        .root
        .child_mut("w:body")
        .ok_or(NormalizeError::MissingBody)?;
    *body = normalize_tree(body, options);
    tracing::debug!("normalized document body");
    Ok(out)
}

/// Normalize every user footnote, leaving the separator footnotes alone
pub fn normalize_footnotes(footnotes: &XmlDocument, options: &NormalizeOptions) -> Result<XmlDocument> {
    if !footnotes.root.is("w:footnotes") {
        return Err(NormalizeError::UnexpectedFootnotesRoot(
            footnotes.root.name.clone(),
        ));
    }

    let mut out = footnotes.clone();
    let mut count = 0usize;
    for node in out.root.children.iter_mut() {
        let XmlNode::Element(footnote) = node else {
            continue;
        };
        if footnote.is("w:footnote") && is_user_footnote(footnote) {
            *footnote = normalize_tree(footnote, options);
            count += 1;
        }
    }
    tracing::debug!(count, "normalized footnotes");
    Ok(out)
}

/// Ids at or below zero mark separator and continuation footnotes
fn is_user_footnote(footnote: &XmlElement) -> bool {
    footnote
        .attr("w:id")
        .and_then(|id| id.parse::<i64>().ok())
        .map(|id| id > 0)
        .unwrap_or(false)
}
