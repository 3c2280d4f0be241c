//! [Content_Types].xml parsing and generation
//!
//! This part declares the content types for every part in the package, by
//! extension (`Default`) or by part name (`Override`).

use crate::error::{DocxError, DocxResult};
use crate::reader::XmlParser;
use quick_xml::escape::escape;
use quick_xml::events::Event;

/// Represents the content types in a package, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// Default content types by extension (e.g., "xml" -> "application/xml")
    pub defaults: Vec<(String, String)>,
    /// Override content types by part name (e.g., "/word/document.xml" -> "...")
    pub overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Create a new ContentTypes with the defaults every package needs
    pub fn new() -> Self {
        let mut ct = Self::default();
        ct.add_default("rels", crate::content_type_values::RELATIONSHIPS);
        ct.add_default("xml", "application/xml");
        ct
    }

    /// Parse [Content_Types].xml from its content
    pub fn parse(content: &str) -> DocxResult<Self> {
        let mut result = Self::default();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    if XmlParser::matches_element(name.as_ref(), "Default") {
                        if let (Some(ext), Some(ct)) = (
                            XmlParser::get_attribute(e, b"Extension"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.defaults.push((ext.to_ascii_lowercase(), ct));
                        }
                    } else if XmlParser::matches_element(name.as_ref(), "Override") {
                        if let (Some(part), Some(ct)) = (
                            XmlParser::get_attribute(e, b"PartName"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.overrides.push((part, ct));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocxError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Get the content type for a given path
    pub fn get_content_type(&self, path: &str) -> Option<&str> {
        // First check overrides
        let normalized_path = normalize_part_name(path);
        if let Some((_, ct)) = self.overrides.iter().find(|(p, _)| *p == normalized_path) {
            return Some(ct);
        }

        // Then check defaults by extension
        let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
        self.default_for(&ext)
    }

    /// Content type declared for an extension
    pub fn default_for(&self, extension: &str) -> Option<&str> {
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(extension))
            .map(|(_, ct)| ct.as_str())
    }

    /// Whether a part has its own `Override` entry
    pub fn has_override(&self, part_name: &str) -> bool {
        let normalized = normalize_part_name(part_name);
        self.overrides.iter().any(|(p, _)| *p == normalized)
    }

    /// Add an override for a specific part, replacing an existing one
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        let normalized = normalize_part_name(part_name);
        match self.overrides.iter_mut().find(|(p, _)| *p == normalized) {
            Some(slot) => slot.1 = content_type.to_string(),
            None => self.overrides.push((normalized, content_type.to_string())),
        }
    }

    /// Add an extension default unless the extension is already declared
    pub fn add_default(&mut self, extension: &str, content_type: &str) -> bool {
        if self.default_for(extension).is_some() {
            return false;
        }
        self.defaults
            .push((extension.to_ascii_lowercase(), content_type.to_string()));
        true
    }

    /// Generate XML content for [Content_Types].xml
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);

        // Write defaults
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext.as_str()),
                escape(ct.as_str())
            ));
        }

        // Write overrides
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part.as_str()),
                escape(ct.as_str())
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

/// Part names in `[Content_Types].xml` are absolute
fn normalize_part_name(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
