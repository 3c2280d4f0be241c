//! End-to-end folds over packages assembled in memory and committed to a
//! temporary directory

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use fold::{
    merge_documents, merge_documents_async, FoldEngine, FoldError, FoldOptions, FoldStage,
    FootnoteId, PreparedSource,
};
use store::{
    content_type_values, namespaces, relationship_types, resolve_target, ContentTypes, Package,
    Relationship, Relationships, TargetMode, XmlElement, DOCUMENT_PART,
};
use tempfile::TempDir;

const FOOTNOTES_PART: &str = "word/footnotes.xml";
const STYLES_PART: &str = "word/styles.xml";

struct Fixture {
    package: Package,
    content_types: ContentTypes,
    rels: Relationships,
}

impl Fixture {
    fn new(body: &str) -> Self {
        let mut package = Package::new();
        package.write_bytes(
            DOCUMENT_PART,
            format!(
                r#"<w:document xmlns:w="{}" xmlns:r="{}" xmlns:a="{}" xmlns:c="{}"><w:body>{}</w:body></w:document>"#,
                namespaces::W,
                namespaces::R,
                namespaces::A,
                namespaces::C,
                body
            )
            .into_bytes(),
        );
        let mut content_types = ContentTypes::new();
        content_types.add_override(DOCUMENT_PART, content_type_values::DOCUMENT);
        Self {
            package,
            content_types,
            rels: Relationships::new(),
        }
    }

    fn rel(mut self, id: &str, rel_type: &str, target: &str, mode: TargetMode) -> Self {
        self.rels
            .insert(Relationship::new(id, rel_type, target, mode))
            .unwrap();
        self
    }

    fn part(mut self, path: &str, bytes: &[u8]) -> Self {
        self.package.write_bytes(path, bytes.to_vec());
        self
    }

    fn part_rels(mut self, part: &str, rels: &[(&str, &str, &str)]) -> Self {
        let mut relationships = Relationships::new();
        for (id, rel_type, target) in rels {
            relationships
                .insert(Relationship::new(*id, rel_type, target, TargetMode::Internal))
                .unwrap();
        }
        self.package.set_relationships(part, &relationships);
        self
    }

    /// Footnotes part holding the separators plus `notes`
    fn footnotes(mut self, rel_id: &str, notes: &[(i64, &str)]) -> Self {
        let mut xml = format!(
            r#"<w:footnotes xmlns:w="{}"><w:footnote w:type="separator" w:id="-1"><w:p><w:r><w:separator/></w:r></w:p></w:footnote><w:footnote w:type="continuationSeparator" w:id="0"><w:p><w:r><w:continuationSeparator/></w:r></w:p></w:footnote>"#,
            namespaces::W
        );
        for (id, text) in notes {
            xml.push_str(&format!(
                r#"<w:footnote w:id="{}"><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:footnote>"#,
                id, text
            ));
        }
        xml.push_str("</w:footnotes>");
        self.content_types
            .add_override(FOOTNOTES_PART, content_type_values::FOOTNOTES);
        self.part(FOOTNOTES_PART, xml.as_bytes()).rel(
            rel_id,
            relationship_types::FOOTNOTES,
            "footnotes.xml",
            TargetMode::Internal,
        )
    }

    fn styles(mut self, rel_id: &str, style_ids: &[&str]) -> Self {
        let styles: String = style_ids
            .iter()
            .map(|id| format!(r#"<w:style w:type="paragraph" w:styleId="{}"/>"#, id))
            .collect();
        let xml = format!(r#"<w:styles xmlns:w="{}">{}</w:styles>"#, namespaces::W, styles);
        self.content_types
            .add_override(STYLES_PART, content_type_values::STYLES);
        self.part(STYLES_PART, xml.as_bytes()).rel(
            rel_id,
            relationship_types::STYLES,
            "styles.xml",
            TargetMode::Internal,
        )
    }

    fn content_default(mut self, extension: &str, content_type: &str) -> Self {
        self.content_types.add_default(extension, content_type);
        self
    }

    fn save(mut self, dir: &Path, name: &str) -> PathBuf {
        self.package.set_content_types(&self.content_types);
        self.package.set_relationships(DOCUMENT_PART, &self.rels);
        let path = dir.join(name);
        self.package.commit(&path).unwrap();
        path
    }
}

fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}

fn with_footnote(text: &str, id: i64) -> String {
    format!(
        r#"<w:p><w:r><w:t>{}</w:t></w:r><w:r><w:rPr><w:vertAlign w:val="superscript"/></w:rPr><w:footnoteReference w:id="{}"/></w:r></w:p>"#,
        text, id
    )
}

const SECT_PR: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>"#;

/// Template with one footnote, numbered 5
fn template(dir: &Path) -> PathBuf {
    Fixture::new(&format!("{}{}", with_footnote("Template", 5), SECT_PR))
        .styles("rId1", &["Normal"])
        .footnotes("rId2", &[(5, "Template note")])
        .save(dir, "template.docx")
}

fn source_with_note(dir: &Path, name: &str, text: &str) -> PathBuf {
    let note = format!("{} note", text);
    Fixture::new(&format!("{}<w:sectPr/>", with_footnote(text, 1)))
        .footnotes("rId1", &[(1, note.as_str())])
        .save(dir, name)
}

fn body(package: &Package) -> XmlElement {
    package
        .read_xml(DOCUMENT_PART)
        .unwrap()
        .root
        .child("w:body")
        .unwrap()
        .clone()
}

fn paragraph_texts(package: &Package) -> Vec<String> {
    body(package)
        .elements()
        .filter(|e| e.is("w:p"))
        .map(|p| p.text())
        .collect()
}

fn attribute_values(tree: &XmlElement, element: &str, attribute: &str) -> Vec<String> {
    let mut values = Vec::new();
    tree.walk(&mut |e| {
        if e.is(element) {
            if let Some(value) = e.attr(attribute) {
                values.push(value.to_string());
            }
        }
    });
    values
}

fn footnote_text(package: &Package, id: &str) -> Option<String> {
    package
        .read_xml(FOOTNOTES_PART)
        .unwrap()
        .root
        .elements()
        .find(|e| e.is("w:footnote") && e.attr("w:id") == Some(id))
        .map(|e| e.text())
}

/// Every reference resolves and no id is used twice
fn assert_referentially_sound(package: &Package) {
    let document = package.read_xml(DOCUMENT_PART).unwrap();
    let rels = package.relationships(DOCUMENT_PART).unwrap();

    let rel_ids: Vec<&str> = rels.all().map(|r| r.id.as_str()).collect();
    let unique: BTreeSet<&str> = rel_ids.iter().copied().collect();
    assert_eq!(rel_ids.len(), unique.len(), "duplicate relationship ids {rel_ids:?}");

    document.root.walk(&mut |e| {
        for (key, value) in &e.attributes {
            if key.starts_with("r:") {
                assert!(rels.contains(value), "{} -> {} is dangling", e.name, value);
            }
        }
    });
    for rel in rels.all().filter(|r| r.target_mode == TargetMode::Internal) {
        let part = resolve_target(DOCUMENT_PART, &rel.target);
        assert!(package.contains(&part), "{} -> missing part {}", rel.id, part);
    }

    let footnotes = package.read_xml(FOOTNOTES_PART).unwrap();
    let defined = attribute_values(&footnotes.root, "w:footnote", "w:id");
    let unique: BTreeSet<&String> = defined.iter().collect();
    assert_eq!(defined.len(), unique.len(), "duplicate footnote ids {defined:?}");
    for id in attribute_values(&document.root, "w:footnoteReference", "w:id") {
        assert!(defined.contains(&id), "footnote {} is dangling", id);
    }

    let mut revisions = attribute_values(&document.root, "w:ins", "w:id");
    revisions.extend(attribute_values(&document.root, "w:del", "w:id"));
    let unique: BTreeSet<&String> = revisions.iter().collect();
    assert_eq!(revisions.len(), unique.len(), "duplicate revision ids {revisions:?}");
}

#[test]
fn test_footnote_lands_above_template_high_water() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = source_with_note(dir.path(), "a.docx", "Alpha");
    let output = dir.path().join("out.docx");

    let report = merge_documents(&template, &[source], &output, &FoldOptions::default()).unwrap();
    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].footnotes, 1);

    let merged = Package::open(&output).unwrap();
    assert_eq!(
        attribute_values(&body(&merged), "w:footnoteReference", "w:id"),
        ["5", "6"]
    );
    assert_eq!(footnote_text(&merged, "6").as_deref(), Some("Alpha note"));
    assert_eq!(footnote_text(&merged, "5").as_deref(), Some("Template note"));
    assert_referentially_sound(&merged);
}

#[test]
fn test_content_goes_before_the_template_section_properties() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = source_with_note(dir.path(), "a.docx", "Alpha");
    let output = dir.path().join("out.docx");

    merge_documents(&template, &[source], &output, &FoldOptions::default()).unwrap();

    let merged = body(&Package::open(&output).unwrap());
    let names: Vec<&str> = merged.elements().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["w:p", "w:p", "w:sectPr"]);
    // The template's section properties survive, the source's do not
    assert!(merged.child("w:sectPr").unwrap().has_child("w:pgSz"));
}

#[test]
fn test_empty_merge_reproduces_the_template() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let output = dir.path().join("out.docx");

    let report =
        merge_documents(&template, &[] as &[PathBuf], &output, &FoldOptions::default()).unwrap();
    assert!(report.sources.is_empty());

    let original = Package::open(&template).unwrap();
    let merged = Package::open(&output).unwrap();
    assert_eq!(
        merged.part_names().collect::<Vec<_>>(),
        original.part_names().collect::<Vec<_>>()
    );
    for name in original.part_names() {
        assert_eq!(merged.read_bytes(name).unwrap(), original.read_bytes(name).unwrap());
    }
}

#[test]
fn test_sources_are_folded_in_caller_order() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let a = source_with_note(dir.path(), "a.docx", "Alpha");
    let b = source_with_note(dir.path(), "b.docx", "Beta");

    let forward = dir.path().join("forward.docx");
    merge_documents(&template, &[&a, &b], &forward, &FoldOptions::default()).unwrap();
    let forward = Package::open(&forward).unwrap();
    assert_eq!(paragraph_texts(&forward), ["Template", "Alpha", "Beta"]);
    assert_eq!(footnote_text(&forward, "6").as_deref(), Some("Alpha note"));
    assert_eq!(footnote_text(&forward, "7").as_deref(), Some("Beta note"));

    let backward = dir.path().join("backward.docx");
    merge_documents(&template, &[&b, &a], &backward, &FoldOptions::default()).unwrap();
    let backward = Package::open(&backward).unwrap();
    assert_eq!(paragraph_texts(&backward), ["Template", "Beta", "Alpha"]);
    assert_eq!(footnote_text(&backward, "6").as_deref(), Some("Beta note"));
    assert_eq!(footnote_text(&backward, "7").as_deref(), Some("Alpha note"));
}

#[test]
fn test_template_without_footnotes_gets_a_footnotes_part() {
    let dir = TempDir::new().unwrap();
    let template = Fixture::new(&format!("{}{}", paragraph("Template"), SECT_PR))
        .styles("rId1", &["Normal"])
        .save(dir.path(), "template.docx");
    let source = source_with_note(dir.path(), "a.docx", "Alpha");
    let output = dir.path().join("out.docx");

    merge_documents(&template, &[source], &output, &FoldOptions::default()).unwrap();

    let merged = Package::open(&output).unwrap();
    let rels = merged.relationships(DOCUMENT_PART).unwrap();
    let footnotes_rel = rels.get_by_type(relationship_types::FOOTNOTES).unwrap();
    assert_eq!(footnotes_rel.id, "rId2");
    assert_eq!(
        merged.content_types().unwrap().get_content_type(FOOTNOTES_PART),
        Some(content_type_values::FOOTNOTES)
    );
    assert_eq!(
        attribute_values(&merged.read_xml(FOOTNOTES_PART).unwrap().root, "w:footnote", "w:id"),
        ["-1", "0", "1"]
    );
    assert_referentially_sound(&merged);
}

#[test]
fn test_chart_and_embedding_are_renumbered() {
    let dir = TempDir::new().unwrap();
    let template = Fixture::new(&format!(
        r#"{}<w:p><w:r><w:drawing><c:chart r:id="rId3"/></w:drawing></w:r></w:p>{}"#,
        paragraph("Template"),
        SECT_PR
    ))
    .styles("rId1", &["Normal"])
    .footnotes("rId2", &[])
    .rel("rId3", relationship_types::CHART, "charts/chart1.xml", TargetMode::Internal)
    .part("word/charts/chart1.xml", b"<c:chartSpace/>")
    .part_rels(
        "word/charts/chart1.xml",
        &[("rId1", relationship_types::OLE_OBJECT, "../embeddings/oleObject1.bin")],
    )
    .part("word/embeddings/oleObject1.bin", &[0, 0])
    .save(dir.path(), "template.docx");

    let chart_xml: &[u8] = br#"<c:chartSpace><c:externalData r:id="rId1"/></c:chartSpace>"#;
    let source = Fixture::new(
        r#"<w:p><w:r><w:drawing><c:chart r:id="rId3"/></w:drawing></w:r></w:p><w:sectPr/>"#,
    )
    .rel("rId3", relationship_types::CHART, "charts/chart1.xml", TargetMode::Internal)
    .part("word/charts/chart1.xml", chart_xml)
    .part_rels(
        "word/charts/chart1.xml",
        &[
            ("rId1", relationship_types::OLE_OBJECT, "../embeddings/oleObject3.bin"),
            ("rId2", relationship_types::CHART_STYLE, "style1.xml"),
        ],
    )
    .part("word/embeddings/oleObject3.bin", &[1, 2, 3, 4])
    .part("word/charts/style1.xml", b"<cs:chartStyle/>")
    .save(dir.path(), "a.docx");
    let output = dir.path().join("out.docx");

    let report = merge_documents(&template, &[source], &output, &FoldOptions::default()).unwrap();
    assert_eq!(report.sources[0].charts, 1);

    let merged = Package::open(&output).unwrap();
    // rId3 moved above the template's rId3
    assert_eq!(
        attribute_values(&body(&merged), "c:chart", "r:id"),
        ["rId3", "rId6"]
    );
    let rels = merged.relationships(DOCUMENT_PART).unwrap();
    assert_eq!(rels.get("rId6").unwrap().target, "charts/chart2.xml");

    assert_eq!(merged.read_bytes("word/charts/chart2.xml").unwrap(), chart_xml);
    assert_eq!(merged.read_bytes("word/embeddings/oleObject2.bin").unwrap(), [1, 2, 3, 4]);
    assert_eq!(merged.read_bytes("word/embeddings/oleObject1.bin").unwrap(), [0, 0]);
    assert!(!merged.contains("word/embeddings/oleObject3.bin"));

    let chart_rels = merged.relationships("word/charts/chart2.xml").unwrap();
    assert_eq!(chart_rels.get("rId1").unwrap().target, "../embeddings/oleObject2.bin");
    assert_eq!(chart_rels.get("rId2").unwrap().target, "style1.xml");
    assert!(merged.contains("word/charts/style1.xml"));

    let content_types = merged.content_types().unwrap();
    assert_eq!(
        content_types.get_content_type("word/charts/chart2.xml"),
        Some(content_type_values::CHART)
    );
    assert_eq!(
        content_types.get_content_type("word/embeddings/oleObject2.bin"),
        Some(content_type_values::OLE_OBJECT)
    );
    assert_referentially_sound(&merged);
}

#[test]
fn test_chart_without_embedding_is_rejected() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = Fixture::new(
        r#"<w:p><w:r><w:drawing><c:chart r:id="rId1"/></w:drawing></w:r></w:p>"#,
    )
    .rel("rId1", relationship_types::CHART, "charts/chart1.xml", TargetMode::Internal)
    .part("word/charts/chart1.xml", b"<c:chartSpace/>")
    .save(dir.path(), "a.docx");

    let error = merge_documents(
        &template,
        &[source],
        dir.path().join("out.docx"),
        &FoldOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, FoldError::Source { stage: FoldStage::Transfer, .. }));
    assert!(matches!(error.root(), FoldError::UnsupportedChartShape { .. }));
}

#[test]
fn test_two_sources_stay_referentially_sound() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = |name: &str, text: &str| {
        let note = format!("{} note", text);
        Fixture::new(&format!(
            r#"{}<w:p><w:ins w:id="0" w:author="a"><w:r><w:t>{} edit</w:t></w:r></w:ins></w:p><w:p><w:hyperlink r:id="rId2"><w:r><w:t>{} link</w:t></w:r></w:hyperlink></w:p><w:p><w:r><w:drawing><a:blip r:embed="rId4"/></w:drawing></w:r></w:p><w:sectPr/>"#,
            with_footnote(text, 1),
            text,
            text
        ))
        .footnotes("rId1", &[(1, note.as_str())])
        .rel("rId2", relationship_types::HYPERLINK, "https://example.com", TargetMode::External)
        .rel("rId4", relationship_types::IMAGE, "media/image1.png", TargetMode::Internal)
        .part("word/media/image1.png", text.as_bytes())
        .content_default("png", "image/png")
        .save(dir.path(), name)
    };
    let a = source("a.docx", "Alpha");
    let b = source("b.docx", "Beta");
    let output = dir.path().join("out.docx");

    let report = merge_documents(&template, &[a, b], &output, &FoldOptions::default()).unwrap();
    for source in &report.sources {
        assert_eq!((source.footnotes, source.media, source.hyperlinks), (1, 1, 1));
    }

    let merged = Package::open(&output).unwrap();
    assert_referentially_sound(&merged);
    assert_eq!(merged.read_bytes("word/media/image1.png").unwrap(), b"Alpha");
    assert_eq!(merged.read_bytes("word/media/image2.png").unwrap(), b"Beta");
    assert_eq!(
        merged.content_types().unwrap().default_for("png"),
        Some("image/png")
    );
    assert_eq!(attribute_values(&body(&merged), "w:ins", "w:id"), ["1", "2"]);
}

#[test]
fn test_dangling_footnote_fails_in_transfer() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = Fixture::new(&with_footnote("Alpha", 2))
        .footnotes("rId1", &[(1, "Other note")])
        .save(dir.path(), "a.docx");

    let error = merge_documents(
        &template,
        &[&source],
        dir.path().join("out.docx"),
        &FoldOptions::default(),
    )
    .unwrap_err();
    match &error {
        FoldError::Source { source_label, stage, .. } => {
            assert_eq!(source_label, &source.display().to_string());
            assert_eq!(*stage, FoldStage::Transfer);
        }
        other => panic!("unexpected {other:?}"),
    }
    // Footnote 2 moved above the template's footnote 5
    assert!(matches!(
        error.root(),
        FoldError::DanglingFootnoteReference { id: FootnoteId(7) }
    ));
}

#[test]
fn test_unsupported_relationship_fails_in_transfer() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = Fixture::new(r#"<w:p><w:r><w:object><o:OLEObject r:id="rId1"/></w:object></w:r></w:p>"#)
        .rel("rId1", relationship_types::OLE_OBJECT, "embeddings/oleObject1.bin", TargetMode::Internal)
        .part("word/embeddings/oleObject1.bin", &[1])
        .save(dir.path(), "a.docx");

    let error = merge_documents(
        &template,
        &[source],
        dir.path().join("out.docx"),
        &FoldOptions::default(),
    )
    .unwrap_err();
    match error.root() {
        FoldError::UnsupportedRelationship { rel_type, .. } => {
            assert_eq!(rel_type, relationship_types::OLE_OBJECT);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_failed_merge_leaves_output_untouched() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let good = source_with_note(dir.path(), "a.docx", "Alpha");
    let bad = Fixture::new(&with_footnote("Broken", 3)).save(dir.path(), "b.docx");
    let output = dir.path().join("out.docx");
    std::fs::write(&output, b"previous").unwrap();

    let result = merge_documents(&template, &[good, bad], &output, &FoldOptions::default());
    assert!(result.is_err());
    assert_eq!(std::fs::read(&output).unwrap(), b"previous");
}

#[test]
fn test_unreadable_source_fails_in_read() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let missing = dir.path().join("missing.docx");

    let error = merge_documents(
        &template,
        &[missing],
        dir.path().join("out.docx"),
        &FoldOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, FoldError::Source { stage: FoldStage::Read, .. }));
}

#[test]
fn test_missing_template() {
    let dir = TempDir::new().unwrap();
    let error = merge_documents(
        dir.path().join("nope.docx"),
        &[] as &[PathBuf],
        dir.path().join("out.docx"),
        &FoldOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, FoldError::Template(_)));
}

fn chart_source(dir: &Path, name: &str, embeddings: &[(&str, &str, &str)]) -> PathBuf {
    let mut fixture = Fixture::new(
        r#"<w:p><w:r><w:drawing><c:chart r:id="rId1"/></w:drawing></w:r></w:p><w:sectPr/>"#,
    )
    .rel("rId1", relationship_types::CHART, "charts/chart1.xml", TargetMode::Internal)
    .part("word/charts/chart1.xml", b"<c:chartSpace/>")
    .part_rels("word/charts/chart1.xml", embeddings);
    for (_, _, target) in embeddings {
        let part = resolve_target("word/charts/chart1.xml", target);
        fixture = fixture.part(&part, b"data");
    }
    fixture.save(dir, name)
}

#[test]
fn test_workbook_embedding_is_named_by_relationship_type() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = chart_source(
        dir.path(),
        "a.docx",
        &[("rId1", relationship_types::PACKAGE, "../embeddings/chartdata.bin")],
    );
    let output = dir.path().join("out.docx");

    merge_documents(&template, &[source], &output, &FoldOptions::default()).unwrap();

    let merged = Package::open(&output).unwrap();
    let workbook = "word/embeddings/Microsoft_Excel_Worksheet1.xlsx";
    assert_eq!(merged.read_bytes(workbook).unwrap(), b"data");
    assert!(!merged.contains("word/embeddings/chartdata.bin"));
    assert_eq!(
        merged
            .relationships("word/charts/chart1.xml")
            .unwrap()
            .get("rId1")
            .unwrap()
            .target,
        "../embeddings/Microsoft_Excel_Worksheet1.xlsx"
    );
    assert_eq!(
        merged.content_types().unwrap().get_content_type(workbook),
        Some(content_type_values::WORKBOOK)
    );
    assert_referentially_sound(&merged);
}

#[test]
fn test_chart_with_two_embeddings_is_rejected() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = chart_source(
        dir.path(),
        "a.docx",
        &[
            ("rId1", relationship_types::PACKAGE, "../embeddings/Microsoft_Excel_Worksheet1.xlsx"),
            ("rId2", relationship_types::OLE_OBJECT, "../embeddings/oleObject1.bin"),
        ],
    );

    let error = merge_documents(
        &template,
        &[source],
        dir.path().join("out.docx"),
        &FoldOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, FoldError::Source { stage: FoldStage::Transfer, .. }));
    match error.root() {
        FoldError::UnsupportedChartShape { chart, .. } => {
            assert_eq!(chart, "word/charts/chart1.xml");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_comment_and_endnote_references_fail_in_shift() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = Fixture::new(
        r#"<w:p><w:r><w:t>Alpha</w:t></w:r><w:r><w:commentReference w:id="0"/></w:r><w:r><w:endnoteReference w:id="1"/></w:r></w:p>"#,
    )
    .part("word/comments.xml", b"<w:comments/>")
    .part("word/endnotes.xml", b"<w:endnotes/>")
    .save(dir.path(), "a.docx");
    let output = dir.path().join("out.docx");

    let error =
        merge_documents(&template, &[&source], &output, &FoldOptions::default()).unwrap_err();
    match &error {
        FoldError::Source { source_label, stage, .. } => {
            assert_eq!(source_label, &source.display().to_string());
            assert_eq!(*stage, FoldStage::Shift);
        }
        other => panic!("unexpected {other:?}"),
    }
    match error.root() {
        FoldError::UnsupportedReference { element, id } => {
            assert_eq!(element, "w:commentReference");
            assert_eq!(id, "0");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_failed_fold_leaves_the_target_as_it_was() {
    let dir = TempDir::new().unwrap();
    let options = FoldOptions::default();
    let template = Package::open(template(dir.path())).unwrap();
    // The image is copied before the dangling footnote is found
    let broken = Fixture::new(&format!(
        r#"<w:p><w:r><w:drawing><a:blip r:embed="rId4"/></w:drawing></w:r></w:p>{}"#,
        with_footnote("Broken", 3)
    ))
    .footnotes("rId1", &[(1, "Other note")])
    .rel("rId4", relationship_types::IMAGE, "media/image1.png", TargetMode::Internal)
    .part("word/media/image1.png", b"png")
    .content_default("png", "image/png")
    .save(dir.path(), "broken.docx");
    let good = source_with_note(dir.path(), "a.docx", "Alpha");

    let mut engine = FoldEngine::new(template, &options).unwrap();
    let before = engine.high_water();
    let broken = PreparedSource::load(&broken, &options.normalize).unwrap();
    let error = engine.fold(&broken).unwrap_err();
    assert!(matches!(
        error.root(),
        FoldError::DanglingFootnoteReference { id: FootnoteId(8) }
    ));
    assert_eq!(engine.high_water(), before);

    let good = PreparedSource::load(&good, &options.normalize).unwrap();
    engine.fold(&good).unwrap();
    let (package, report) = engine.finish();

    assert_eq!(report.sources.len(), 1);
    assert!(!package.contains("word/media/image1.png"));
    assert!(package
        .relationships(DOCUMENT_PART)
        .unwrap()
        .get_by_type(relationship_types::IMAGE)
        .is_none());
    assert_eq!(paragraph_texts(&package), ["Template", "Alpha"]);
    assert_eq!(footnote_text(&package, "6").as_deref(), Some("Alpha note"));
    assert_referentially_sound(&package);
}

#[test]
fn test_hyperlinks_in_footnotes_are_carried() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let source = |name: &str, text: &str, url: &str| {
        let footnotes = format!(
            r#"<w:footnotes xmlns:w="{}" xmlns:r="{}"><w:footnote w:type="separator" w:id="-1"/><w:footnote w:type="continuationSeparator" w:id="0"/><w:footnote w:id="1"><w:p><w:hyperlink r:id="rId1"><w:r><w:t>{} link</w:t></w:r></w:hyperlink></w:p></w:footnote></w:footnotes>"#,
            namespaces::W,
            namespaces::R,
            text
        );
        let mut fixture = Fixture::new(&with_footnote(text, 1))
            .footnotes("rId1", &[])
            .part(FOOTNOTES_PART, footnotes.as_bytes());
        let mut rels = Relationships::new();
        rels.insert(Relationship::new(
            "rId1",
            relationship_types::HYPERLINK,
            url,
            TargetMode::External,
        ))
        .unwrap();
        fixture.package.set_relationships(FOOTNOTES_PART, &rels);
        fixture.save(dir.path(), name)
    };
    let a = source("a.docx", "Alpha", "https://alpha.example");
    let b = source("b.docx", "Beta", "https://beta.example");
    let output = dir.path().join("out.docx");

    let report = merge_documents(&template, &[a, b], &output, &FoldOptions::default()).unwrap();
    assert!(report.sources.iter().all(|s| s.hyperlinks == 1));

    let merged = Package::open(&output).unwrap();
    let footnotes = merged.read_xml(FOOTNOTES_PART).unwrap();
    let link_of = |id: &str| {
        let footnote = footnotes
            .root
            .elements()
            .find(|e| e.attr("w:id") == Some(id))
            .unwrap();
        attribute_values(footnote, "w:hyperlink", "r:id")
    };
    assert_eq!(link_of("6"), ["rId1"]);
    assert_eq!(link_of("7"), ["rId2"]);

    let rels = merged.relationships(FOOTNOTES_PART).unwrap();
    assert_eq!(rels.get("rId1").unwrap().target, "https://alpha.example");
    assert_eq!(rels.get("rId2").unwrap().target, "https://beta.example");
    assert_eq!(rels.get("rId2").unwrap().target_mode, TargetMode::External);
    assert_referentially_sound(&merged);
}

#[tokio::test]
async fn test_async_merge_matches_sync_merge() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let sources = vec![
        source_with_note(dir.path(), "a.docx", "Alpha"),
        source_with_note(dir.path(), "b.docx", "Beta"),
        source_with_note(dir.path(), "c.docx", "Gamma"),
    ];

    let sync_output = dir.path().join("sync.docx");
    merge_documents(&template, &sources, &sync_output, &FoldOptions::default()).unwrap();
    let expected = Package::open(&sync_output).unwrap();

    for prefetch in [true, false] {
        let output = dir.path().join(format!("async-{prefetch}.docx"));
        let options = FoldOptions {
            prefetch,
            ..FoldOptions::default()
        };
        let report =
            merge_documents_async(template.clone(), sources.clone(), output.clone(), options)
                .await
                .unwrap();
        assert_eq!(report.sources.len(), 3);

        let merged = Package::open(&output).unwrap();
        assert_eq!(paragraph_texts(&merged), paragraph_texts(&expected));
        assert_eq!(
            merged.read_bytes(FOOTNOTES_PART).unwrap(),
            expected.read_bytes(FOOTNOTES_PART).unwrap()
        );
    }
}

#[tokio::test]
async fn test_async_merge_reports_first_failing_source() {
    let dir = TempDir::new().unwrap();
    let template = template(dir.path());
    let good = source_with_note(dir.path(), "a.docx", "Alpha");
    let bad = Fixture::new(&with_footnote("Broken", 3)).save(dir.path(), "b.docx");
    let output = dir.path().join("out.docx");

    let error = merge_documents_async(
        template,
        vec![good, bad.clone(), dir.path().join("missing.docx")],
        output.clone(),
        FoldOptions::default(),
    )
    .await
    .unwrap_err();
    match error {
        FoldError::Source { source_label, stage, .. } => {
            assert_eq!(source_label, bad.display().to_string());
            assert_eq!(stage, FoldStage::Transfer);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!output.exists());
}
