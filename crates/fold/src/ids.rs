//! Identifier spaces
//!
//! Every kind of id that must be renumbered during a fold has its own type,
//! so a footnote id can never be handed to code expecting a revision id.
//! Ids carried by XML attributes implement [`IdSpace`]; the chart and
//! embedding sequence numbers live in part names instead.

use std::fmt;
use std::marker::PhantomData;

use store::{content_type_values, parse_rid, relationship_types, Package, XmlElement};

/// An identifier space whose ids are stored in XML attributes
pub trait IdSpace: Copy + Ord + fmt::Debug + fmt::Display {
    /// Name used in logs and errors
    const NAME: &'static str;

    /// Lowest id naming real content
    const FIRST: i64;

    /// Whether `attribute` of `element` holds an id of this space
    fn holds_id(element: &XmlElement, attribute: &str) -> bool;

    /// Parse an attribute value; `None` for values outside the space
    fn parse(value: &str) -> Option<Self>;

    fn format(self) -> String;

    fn value(self) -> i64;

    fn from_value(value: i64) -> Self;

    /// High-water mark of a space holding no ids
    fn floor() -> Self {
        Self::from_value(0)
    }
}

/// `rId<N>` relationship ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipId(pub u32);

/// Footnote ids; `-1` and `0` are separator sentinels and not part of the
/// space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FootnoteId(pub i64);

/// Tracked-change ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevisionId(pub i64);

/// `N` of `word/charts/chartN.xml`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChartSeq(pub u32);

/// `N` of an embedding part name, numbered per [`EmbeddingKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmbeddingSeq(pub u32);

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rId{}", self.0)
    }
}

impl fmt::Display for FootnoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChartSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EmbeddingSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IdSpace for RelationshipId {
    const NAME: &'static str = "relationship";
    const FIRST: i64 = 1;

    fn holds_id(element: &XmlElement, attribute: &str) -> bool {
        attribute.starts_with("r:") || (element.is("Relationship") && attribute == "Id")
    }

    fn parse(value: &str) -> Option<Self> {
        parse_rid(value).map(RelationshipId)
    }

    fn format(self) -> String {
        self.to_string()
    }

    fn value(self) -> i64 {
        i64::from(self.0)
    }

    fn from_value(value: i64) -> Self {
        RelationshipId(u32::try_from(value).unwrap_or(u32::MAX))
    }
}

impl IdSpace for FootnoteId {
    const NAME: &'static str = "footnote";
    const FIRST: i64 = 1;

    fn holds_id(element: &XmlElement, attribute: &str) -> bool {
        attribute == "w:id" && (element.is("w:footnoteReference") || element.is("w:footnote"))
    }

    fn parse(value: &str) -> Option<Self> {
        value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id >= Self::FIRST)
            .map(FootnoteId)
    }

    fn format(self) -> String {
        self.0.to_string()
    }

    fn value(self) -> i64 {
        self.0
    }

    fn from_value(value: i64) -> Self {
        FootnoteId(value)
    }
}

/// Elements whose `w:id` is a tracked-change id
const REVISION_ELEMENTS: &[&str] = &[
    "w:ins",
    "w:del",
    "w:moveFrom",
    "w:moveTo",
    "w:moveFromRangeStart",
    "w:moveFromRangeEnd",
    "w:moveToRangeStart",
    "w:moveToRangeEnd",
    "w:rPrChange",
    "w:pPrChange",
    "w:sectPrChange",
    "w:tblPrChange",
    "w:tblPrExChange",
    "w:tblGridChange",
    "w:trPrChange",
    "w:tcPrChange",
    "w:numberingChange",
    "w:cellIns",
    "w:cellDel",
    "w:cellMerge",
];

impl IdSpace for RevisionId {
    const NAME: &'static str = "revision";
    const FIRST: i64 = 0;

    fn holds_id(element: &XmlElement, attribute: &str) -> bool {
        attribute == "w:id" && REVISION_ELEMENTS.contains(&element.name.as_str())
    }

    fn parse(value: &str) -> Option<Self> {
        value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id >= Self::FIRST)
            .map(RevisionId)
    }

    fn format(self) -> String {
        self.0.to_string()
    }

    fn value(self) -> i64 {
        self.0
    }

    fn from_value(value: i64) -> Self {
        RevisionId(value)
    }
}

/// Amount by which one source's ids move to land above a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset<S> {
    delta: i64,
    _space: PhantomData<S>,
}

impl<S: IdSpace> Offset<S> {
    /// Offset placing the lowest possible id of a source at
    /// `high_water + 1`
    pub fn above(high_water: S) -> Self {
        Self {
            delta: high_water.value() + 1 - S::FIRST,
            _space: PhantomData,
        }
    }

    /// No renumbering
    pub fn zero() -> Self {
        Self {
            delta: 0,
            _space: PhantomData,
        }
    }

    pub fn delta(&self) -> i64 {
        self.delta
    }

    pub fn apply(&self, id: S) -> S {
        S::from_value(id.value() + self.delta)
    }
}

impl ChartSeq {
    pub const DIR: &'static str = "word/charts";

    /// Next unused chart number in a package
    pub fn next_in(package: &Package) -> Self {
        ChartSeq(package.next_sequence(Self::DIR, "chart", "xml"))
    }

    pub fn part_name(self) -> String {
        format!("{}/chart{}.xml", Self::DIR, self.0)
    }
}

/// What backs a chart's data, chosen by the embedding's relationship type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
    /// `Microsoft_Excel_WorksheetN.xlsx`
    Workbook,
    /// `oleObjectN.bin`
    OleObject,
}

impl EmbeddingKind {
    pub const DIR: &'static str = "word/embeddings";

    pub fn from_relationship_type(rel_type: &str) -> Option<Self> {
        match rel_type {
            relationship_types::PACKAGE => Some(EmbeddingKind::Workbook),
            relationship_types::OLE_OBJECT => Some(EmbeddingKind::OleObject),
            _ => None,
        }
    }

    pub fn stem(self) -> &'static str {
        match self {
            EmbeddingKind::Workbook => "Microsoft_Excel_Worksheet",
            EmbeddingKind::OleObject => "oleObject",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            EmbeddingKind::Workbook => "xlsx",
            EmbeddingKind::OleObject => "bin",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            EmbeddingKind::Workbook => content_type_values::WORKBOOK,
            EmbeddingKind::OleObject => content_type_values::OLE_OBJECT,
        }
    }
}

impl EmbeddingSeq {
    /// Next unused number for embeddings of `kind`
    pub fn next_in(package: &Package, kind: EmbeddingKind) -> Self {
        EmbeddingSeq(package.next_sequence(EmbeddingKind::DIR, kind.stem(), kind.extension()))
    }

    pub fn part_name(self, kind: EmbeddingKind) -> String {
        format!(
            "{}/{}{}.{}",
            EmbeddingKind::DIR,
            kind.stem(),
            self.0,
            kind.extension()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footnote_sentinels_are_outside_the_space() {
        assert_eq!(FootnoteId::parse("-1"), None);
        assert_eq!(FootnoteId::parse("0"), None);
        assert_eq!(FootnoteId::parse("3"), Some(FootnoteId(3)));
        assert_eq!(RevisionId::parse("0"), Some(RevisionId(0)));
    }

    #[test]
    fn test_relationship_ids() {
        assert_eq!(RelationshipId::parse("rId12"), Some(RelationshipId(12)));
        assert_eq!(RelationshipId::parse("R8f2a"), None);
        assert_eq!(RelationshipId(4).format(), "rId4");
    }

    #[test]
    fn test_offset_lands_above_high_water() {
        let footnotes = Offset::above(FootnoteId(5));
        assert_eq!(footnotes.apply(FootnoteId(1)), FootnoteId(6));

        let revisions = Offset::above(RevisionId(9));
        assert_eq!(revisions.apply(RevisionId(0)), RevisionId(10));

        let empty = Offset::above(RevisionId::floor());
        assert_eq!(empty.apply(RevisionId(0)), RevisionId(1));

        let relationships = Offset::above(RelationshipId(7));
        assert_eq!(relationships.apply(RelationshipId(1)), RelationshipId(8));
    }

    #[test]
    fn test_attribute_ownership() {
        let reference = XmlElement::new("w:footnoteReference");
        let insertion = XmlElement::new("w:ins");
        let bookmark = XmlElement::new("w:bookmarkStart");
        assert!(FootnoteId::holds_id(&reference, "w:id"));
        assert!(!RevisionId::holds_id(&reference, "w:id"));
        assert!(RevisionId::holds_id(&insertion, "w:id"));
        assert!(!RevisionId::holds_id(&bookmark, "w:id"));
        assert!(RelationshipId::holds_id(&XmlElement::new("a:blip"), "r:embed"));
    }

    #[test]
    fn test_sequence_part_names() {
        assert_eq!(ChartSeq(3).part_name(), "word/charts/chart3.xml");
        assert_eq!(
            EmbeddingSeq(2).part_name(EmbeddingKind::Workbook),
            "word/embeddings/Microsoft_Excel_Worksheet2.xlsx"
        );
        assert_eq!(
            EmbeddingSeq(4).part_name(EmbeddingKind::OleObject),
            "word/embeddings/oleObject4.bin"
        );
    }
}
