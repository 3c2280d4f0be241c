//! Table style normalization

use store::{XmlElement, XmlNode};

use crate::props::first_child_or_insert;
use crate::NormalizeOptions;

/// Give every table the one configured table style
pub fn normalize_tables(tree: &XmlElement, options: &NormalizeOptions) -> XmlElement {
    let mut out = tree.clone();
    out.walk_mut(&mut |e| {
        if e.is("w:tbl") {
            restyle_table(e, &options.table_style);
        }
    });
    out
}

fn restyle_table(table: &mut XmlElement, style: &str) {
    // w:tblPr leads the table
    if let Some(index) = table
        .children
        .iter()
        .position(|n| matches!(n, XmlNode::Element(e) if e.is("w:tblPr")))
    {
        if index != 0 {
            let properties = table.children.remove(index);
            table.children.insert(0, properties);
        }
    }

    let properties = first_child_or_insert(table, "w:tblPr");
    properties.remove_children("w:tblStyle");
    properties.remove_children("w:tblLook");
    properties.children.insert(
        0,
        XmlNode::Element(XmlElement::new("w:tblStyle").with_attr("w:val", style)),
    );
}
