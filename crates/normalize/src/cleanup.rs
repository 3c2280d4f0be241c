//! Removal of property containers left empty by earlier stages

use store::{XmlElement, XmlNode};

use crate::NormalizeOptions;

const PROPERTY_CONTAINERS: &[&str] = &["w:rPr", "w:pPr", "w:tcPr", "w:trPr"];

/// Drop property containers with no attributes and no children
pub fn strip_empty_containers(tree: &XmlElement, _options: &NormalizeOptions) -> XmlElement {
    let mut out = tree.clone();
    strip_in(&mut out);
    out
}

fn strip_in(element: &mut XmlElement) {
    // Children first, so a w:pPr holding only an empty w:rPr goes too
    for child in element.elements_mut() {
        strip_in(child);
    }
    element.children.retain(|node| match node {
        XmlNode::Element(e) => !(PROPERTY_CONTAINERS.contains(&e.name.as_str()) && e.is_empty()),
        _ => true,
    });
}
