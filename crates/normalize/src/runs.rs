//! Run merging

use store::{XmlElement, XmlNode};

use crate::NormalizeOptions;

/// Merge adjacent text runs that share their formatting
///
/// Only runs made of `w:rPr` and `w:t` take part; anything holding tabs,
/// breaks, drawings, field characters or note references splits a chain.
/// An empty `w:rPr` counts as no formatting at all.
pub fn merge_runs(tree: &XmlElement, _options: &NormalizeOptions) -> XmlElement {
    let mut out = tree.clone();
    out.walk_mut(&mut merge_children);
    out
}

fn merge_children(parent: &mut XmlElement) {
    if !parent.children.iter().any(is_text_run_node) {
        return;
    }

    let mut merged: Vec<XmlNode> = Vec::with_capacity(parent.children.len());
    let mut chain: Vec<XmlElement> = Vec::new();
    for node in std::mem::take(&mut parent.children) {
        match node {
            XmlNode::Element(run) if is_text_run(&run) => {
                if chain.last().map(|last| same_format(last, &run)).unwrap_or(true) {
                    chain.push(run);
                } else {
                    flush(&mut chain, &mut merged);
                    chain.push(run);
                }
            }
            other => {
                flush(&mut chain, &mut merged);
                merged.push(other);
            }
        }
    }
    flush(&mut chain, &mut merged);
    parent.children = merged;
}

fn is_text_run_node(node: &XmlNode) -> bool {
    node.as_element().map(is_text_run).unwrap_or(false)
}

fn is_text_run(run: &XmlElement) -> bool {
    run.is("w:r")
        && run.has_child("w:t")
        && run.children.iter().all(|node| match node {
            XmlNode::Element(e) => e.is("w:rPr") || e.is("w:t"),
            XmlNode::Text(_) | XmlNode::CData(_) | XmlNode::Comment(_) => false,
        })
}

fn formatting(run: &XmlElement) -> Option<&XmlElement> {
    run.child("w:rPr").filter(|p| !p.is_empty())
}

fn same_format(a: &XmlElement, b: &XmlElement) -> bool {
    a.attributes == b.attributes && formatting(a) == formatting(b)
}

fn flush(chain: &mut Vec<XmlElement>, out: &mut Vec<XmlNode>) {
    match chain.len() {
        0 => {}
        1 => out.extend(chain.drain(..).map(XmlNode::Element)),
        _ => {
            let text: String = chain.iter().map(XmlElement::text).collect();
            let mut first = chain.remove(0);
            chain.clear();
            first.remove_children("w:t");

            let mut t = XmlElement::new("w:t");
            if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
                t.set_attr("xml:space", "preserve");
            }
            if !text.is_empty() {
                t.children.push(XmlNode::Text(text));
            }
            first.children.push(XmlNode::Element(t));
            out.push(XmlNode::Element(first));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::XmlDocument;

    fn parse(xml: &str) -> XmlElement {
        XmlDocument::parse(xml).unwrap().root
    }

    fn runs(tree: &XmlElement) -> Vec<String> {
        tree.child("w:p")
            .unwrap()
            .elements()
            .filter(|e| e.is("w:r"))
            .map(XmlElement::text)
            .collect()
    }

    #[test]
    fn test_chain_collapses_to_one_run() {
        let tree = parse(
            r#"<w:p><w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:t>a</w:t></w:r><w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:t xml:space="preserve">b </w:t></w:r><w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:t>c</w:t></w:r></w:p>"#,
        );
        let wrapped = XmlElement::new("w:body").with_child(tree);
        let out = merge_runs(&wrapped, &NormalizeOptions::default());
        assert_eq!(runs(&out), ["ab c"]);
        let run = out.child("w:p").unwrap().child("w:r").unwrap();
        assert!(run.has_child("w:rPr"));
    }

    #[test]
    fn test_different_formatting_splits_chain() {
        let body = parse(
            r#"<w:body><w:p><w:r><w:t>a</w:t></w:r><w:r><w:rPr><w:rStyle w:val="Strong"/></w:rPr><w:t>b</w:t></w:r><w:r><w:t>c</w:t></w:r><w:r><w:rPr/><w:t>d</w:t></w:r></w:p></w:body>"#,
        );
        let out = merge_runs(&body, &NormalizeOptions::default());
        assert_eq!(runs(&out), ["a", "b", "cd"]);
    }

    #[test]
    fn test_non_text_runs_are_barriers() {
        let body = parse(
            r#"<w:body><w:p><w:r><w:t>a</w:t></w:r><w:r><w:tab/><w:t>b</w:t></w:r><w:r><w:t>c</w:t></w:r></w:p></w:body>"#,
        );
        let out = merge_runs(&body, &NormalizeOptions::default());
        assert_eq!(runs(&out), ["a", "b", "c"]);
    }

    #[test]
    fn test_leading_space_is_preserved() {
        let body = parse(
            r#"<w:body><w:p><w:r><w:t xml:space="preserve"> a</w:t></w:r><w:r><w:t>b</w:t></w:r></w:p></w:body>"#,
        );
        let out = merge_runs(&body, &NormalizeOptions::default());
        let t = out.child("w:p").unwrap().child("w:r").unwrap().child("w:t").unwrap();
        assert_eq!(t.attr("xml:space"), Some("preserve"));
        assert_eq!(t.text(), " ab");
    }
}
