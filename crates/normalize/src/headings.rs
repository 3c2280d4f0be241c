//! Line break marking for level-1 headings

use store::{XmlElement, XmlNode};

use crate::props::paragraph_style;
use crate::NormalizeOptions;

/// Insert `<w:r><w:br/></w:r>` ahead of the first run of each level-1
/// heading, unless the paragraph already opens with one
pub fn mark_heading_breaks(tree: &XmlElement, options: &NormalizeOptions) -> XmlElement {
    let mut out = tree.clone();
    out.walk_mut(&mut |e| {
        if e.is("w:p") && paragraph_style(e) == Some(options.heading_style.as_str()) {
            insert_break(e);
        }
    });
    out
}

fn insert_break(paragraph: &mut XmlElement) {
    let first_run = paragraph
        .children
        .iter()
        .position(|n| matches!(n, XmlNode::Element(e) if e.is("w:r")));
    let Some(index) = first_run else {
        return;
    };
    if let XmlNode::Element(run) = &paragraph.children[index] {
        if is_break_run(run) {
            return;
        }
    }
    let marker = XmlElement::new("w:r").with_child(XmlElement::new("w:br"));
    paragraph.children.insert(index, XmlNode::Element(marker));
}

fn is_break_run(run: &XmlElement) -> bool {
    let mut elements = run.elements();
    matches!(
        (elements.next(), elements.next()),
        (Some(br), None) if br.is("w:br") && br.attributes.is_empty()
    )
}
