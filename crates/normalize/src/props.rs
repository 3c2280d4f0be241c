//! Paragraph and run property helpers shared by the rewrite stages

use store::{XmlElement, XmlNode};

/// Style id of a paragraph (`w:pPr/w:pStyle/@w:val`)
pub fn paragraph_style(paragraph: &XmlElement) -> Option<&str> {
    paragraph.child("w:pPr")?.child("w:pStyle")?.attr("w:val")
}

/// Style id of a run (`w:rPr/w:rStyle/@w:val`)
pub fn run_style(run: &XmlElement) -> Option<&str> {
    run.child("w:rPr")?.child("w:rStyle")?.attr("w:val")
}

/// Set the paragraph style, creating `w:pPr` as first child when missing
pub fn set_paragraph_style(paragraph: &mut XmlElement, style: &str) {
    let properties = first_child_or_insert(paragraph, "w:pPr");
    set_style_marker(properties, "w:pStyle", style);
}

/// Set the run style, creating `w:rPr` as first child when missing
pub fn set_run_style(run: &mut XmlElement, style: &str) {
    let properties = first_child_or_insert(run, "w:rPr");
    set_style_marker(properties, "w:rStyle", style);
}

/// The style marker is always the first child of its property container
fn set_style_marker(properties: &mut XmlElement, marker: &str, style: &str) {
    properties.remove_children(marker);
    properties.children.insert(
        0,
        XmlNode::Element(XmlElement::new(marker).with_attr("w:val", style)),
    );
}

/// Get `name` if it is present, otherwise insert an empty one at index 0
pub fn first_child_or_insert<'a>(parent: &'a mut XmlElement, name: &str) -> &'a mut XmlElement {
    let index = match parent
        .children
        .iter()
        .position(|n| matches!(n, XmlNode::Element(e) if e.is(name)))
    {
        Some(index) => index,
        None => {
            parent.children.insert(0, XmlNode::Element(XmlElement::new(name)));
            0
        }
    };
    match &mut parent.children[index] {
        XmlNode::Element(e) => e,
        _ => unreachable!("index points at an element"),
    }
}

/// Whether a toggle property (`w:b`, `w:i`) is switched on
pub fn toggle_on(properties: &XmlElement, name: &str) -> bool {
    properties
        .child(name)
        .map(|e| !matches!(e.attr("w:val"), Some("0" | "false" | "off")))
        .unwrap_or(false)
}

/// Whether a run carries an underline other than `none`
pub fn underlined(run: &XmlElement) -> bool {
    run.child("w:rPr")
        .and_then(|p| p.child("w:u"))
        .map(|u| u.attr("w:val") != Some("none"))
        .unwrap_or(false)
}

/// Runs that carry text
pub fn text_runs(paragraph: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    paragraph
        .elements()
        .filter(|e| e.is("w:r") && e.has_child("w:t"))
}

/// Whether a run holds a footnote reference or the footnote's own mark
pub fn is_footnote_mark(run: &XmlElement) -> bool {
    run.has_child("w:footnoteReference") || run.has_child("w:footnoteRef")
}
