//! Style simplification stages
//!
//! Direct formatting is replaced by named styles:
//! - linked character styles (`HeadingChar`) shared by a whole paragraph
//!   move up to the paragraph (`Heading`)
//! - bold and italic become the `Strong` and `Emphasis` character styles
//! - fully underlined paragraphs become note paragraphs, picked by what
//!   precedes them
//!
//! A run can qualify for more than one character style. The resolution is:
//! footnote marks always take the footnote reference style, replacing any
//! existing run style; otherwise an existing run style is kept; otherwise
//! `Strong` wins over `Emphasis`. Only the winner's direct formatting is
//! removed.

use store::{XmlElement, XmlNode};

use crate::kind::{holds_drawing, ElementKind};
use crate::props::{
    is_footnote_mark, paragraph_style, run_style, set_paragraph_style, set_run_style, text_runs,
    toggle_on, underlined,
};
use crate::NormalizeOptions;

/// Suffix Word gives the character half of a linked style
const LINKED_SUFFIX: &str = "Char";

/// Move a linked character style shared by every text run to the paragraph
pub fn promote_run_styles(tree: &XmlElement, options: &NormalizeOptions) -> XmlElement {
    let mut out = tree.clone();
    out.walk_mut(&mut |e| {
        if e.is("w:p") {
            if let Some(style) = promotable_style(e, options) {
                for run in e.elements_mut().filter(|r| r.is("w:r") && r.has_child("w:t")) {
                    run.remove_children("w:rPr");
                }
                set_paragraph_style(e, &style);
            }
        }
    });
    out
}

fn promotable_style(paragraph: &XmlElement, options: &NormalizeOptions) -> Option<String> {
    if paragraph_style(paragraph).is_some() {
        return None;
    }
    if paragraph
        .elements()
        .any(|e| e.is("w:r") && is_footnote_mark(e))
    {
        return None;
    }

    let mut shared: Option<&str> = None;
    for run in text_runs(paragraph) {
        let properties = run.child("w:rPr")?;
        if !properties.attributes.is_empty() || properties.elements().count() != 1 {
            return None;
        }
        let style = run_style(run)?;
        match shared {
            None => shared = Some(style),
            Some(seen) if seen == style => {}
            Some(_) => return None,
        }
    }

    let style = shared?;
    if style == options.strong_style
        || style == options.emphasis_style
        || style == options.footnote_reference_style
    {
        return None;
    }
    style
        .strip_suffix(LINKED_SUFFIX)
        .filter(|base| !base.is_empty())
        .map(str::to_string)
}

/// Replace bold and italic with the named character styles
pub fn collapse_emphasis(tree: &XmlElement, options: &NormalizeOptions) -> XmlElement {
    let mut out = tree.clone();
    out.walk_mut(&mut |e| {
        if !e.is("w:r") {
            return;
        }
        if is_footnote_mark(e) {
            if run_style(e) != Some(options.footnote_reference_style.as_str()) {
                set_run_style(e, &options.footnote_reference_style);
            }
            return;
        }
        if run_style(e).is_some() {
            return;
        }
        let Some(properties) = e.child_mut("w:rPr") else {
            return;
        };
        let style = if toggle_on(properties, "w:b") || toggle_on(properties, "w:bCs") {
            properties.remove_children("w:b");
            properties.remove_children("w:bCs");
            &options.strong_style
        } else if toggle_on(properties, "w:i") || toggle_on(properties, "w:iCs") {
            properties.remove_children("w:i");
            properties.remove_children("w:iCs");
            &options.emphasis_style
        } else {
            return;
        };
        set_run_style(e, style);
    });
    out
}

/// Turn fully underlined paragraphs into note paragraphs
pub fn collapse_underline(tree: &XmlElement, options: &NormalizeOptions) -> XmlElement {
    let mut out = tree.clone();
    collapse_underline_in(&mut out, options);
    out
}

fn collapse_underline_in(parent: &mut XmlElement, options: &NormalizeOptions) {
    // Siblings are decided in order so a chain of notes sees the note style
    // its predecessor was just given.
    for index in 0..parent.children.len() {
        let (before, rest) = parent.children.split_at_mut(index);
        let previous = before.iter().rev().find_map(XmlNode::as_element);
        let Some(current) = rest.first_mut().and_then(XmlNode::as_element_mut) else {
            continue;
        };
        if !qualifies_for_note(current) {
            continue;
        }
        if let Some(style) = previous.and_then(|p| note_style_after(p, options)) {
            for run in current.elements_mut().filter(|r| r.is("w:r") && r.has_child("w:t")) {
                if let Some(properties) = run.child_mut("w:rPr") {
                    properties.remove_children("w:u");
                }
            }
            set_paragraph_style(current, style);
        }
    }

    for child in parent.elements_mut() {
        collapse_underline_in(child, options);
    }
}

fn qualifies_for_note(paragraph: &XmlElement) -> bool {
    if !paragraph.is("w:p") || paragraph_style(paragraph).is_some() {
        return false;
    }
    let mut runs = text_runs(paragraph).peekable();
    runs.peek().is_some() && runs.all(underlined)
}

/// Note style for an underlined paragraph following `previous`
///
/// Tables win over drawings, drawings over note chains.
fn note_style_after<'a>(previous: &XmlElement, options: &'a NormalizeOptions) -> Option<&'a str> {
    match ElementKind::of(previous) {
        ElementKind::Table => Some(options.table_note_style.as_str()),
        ElementKind::Paragraph if holds_drawing(previous) => Some(options.figure_note_style.as_str()),
        ElementKind::Paragraph => paragraph_style(previous)
            .filter(|style| options.is_note_style(style))
            .map(|_| options.source_note_style.as_str()),
        ElementKind::Run
        | ElementKind::TableRow
        | ElementKind::TableCell
        | ElementKind::Drawing
        | ElementKind::Chart
        | ElementKind::Text
        | ElementKind::Passthrough => None,
    }
}
