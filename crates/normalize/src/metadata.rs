//! Removal of editing-session metadata

use std::collections::HashSet;

use store::{xml::local_name, XmlElement, XmlNode};

use crate::NormalizeOptions;

/// Elements that only record editor state
const EDITOR_MARKERS: &[&str] = &["w:proofErr", "w:lastRenderedPageBreak"];

/// Bookmark Word keeps for "return to last edit"
const GO_BACK: &str = "_GoBack";

/// Drop revision-session ids, paragraph ids, proofing marks and the
/// last-edit bookmark
pub fn strip_editing_metadata(tree: &XmlElement, _options: &NormalizeOptions) -> XmlElement {
    let mut out = tree.clone();

    let mut go_back_ids = HashSet::new();
    out.walk(&mut |e| {
        if e.is("w:bookmarkStart") && e.attr("w:name") == Some(GO_BACK) {
            if let Some(id) = e.attr("w:id") {
                go_back_ids.insert(id.to_string());
            }
        }
    });

    out.walk_mut(&mut |e| {
        e.attributes.retain(|(key, _)| !is_session_attribute(key));
        e.children.retain(|node| match node {
            XmlNode::Element(child) => !is_metadata_element(child, &go_back_ids),
            _ => true,
        });
    });
    out
}

fn is_session_attribute(key: &str) -> bool {
    local_name(key).starts_with("rsid") || key == "w14:paraId" || key == "w14:textId"
}

fn is_metadata_element(element: &XmlElement, go_back_ids: &HashSet<String>) -> bool {
    if EDITOR_MARKERS.contains(&element.name.as_str()) {
        return true;
    }
    match element.name.as_str() {
        "w:bookmarkStart" => element.attr("w:name") == Some(GO_BACK),
        "w:bookmarkEnd" => element
            .attr("w:id")
            .map(|id| go_back_ids.contains(id))
            .unwrap_or(false),
        _ => false,
    }
}
