//! ZIP archive reading and XML attribute utilities

use crate::error::{DocxError, DocxResult};
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Parts every word-processing package must carry
pub const REQUIRED_PARTS: &[&str] = &["[Content_Types].xml", "word/document.xml"];

/// A wrapper around a ZIP archive for reading package entries
pub struct DocxReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> DocxReader<R> {
    /// Open an archive; anything that is not a zip is reported as `NotAPackage`
    pub fn new(reader: R, label: &str) -> DocxResult<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| DocxError::NotAPackage(format!("{}: {}", label, e)))?;
        Ok(Self { archive })
    }

    /// Read a file from the archive as bytes
    pub fn read_file_as_bytes(&mut self, path: &str) -> DocxResult<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| {
            if matches!(e, zip::result::ZipError::FileNotFound) {
                DocxError::PartMissing(path.to_string())
            } else {
                DocxError::from(e)
            }
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Check if a file exists in the archive
    pub fn file_exists(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }

    /// Names of all file entries in archive order, directories excluded
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<(usize, String)> = self
            .archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .filter_map(|name| {
                self.archive
                    .index_for_name(name)
                    .map(|index| (index, name.to_string()))
            })
            .collect();
        names.sort_by_key(|(index, _)| *index);
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// Check if this is a valid word-processing package
    pub fn is_valid_docx(&self) -> bool {
        REQUIRED_PARTS.iter().all(|part| self.file_exists(part))
    }

    /// Read every entry, in archive order
    pub fn read_all(&mut self) -> DocxResult<Vec<(String, Vec<u8>)>> {
        let names = self.file_names();
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let data = self.read_file_as_bytes(&name)?;
            entries.push((name, data));
        }
        Ok(entries)
    }
}

/// XML reader utilities for the streaming parsers of `.rels` and content types
pub struct XmlParser;

impl XmlParser {
    /// Create a new XML reader from a string
    pub fn from_string(content: &str) -> Reader<&[u8]> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        reader
    }

    /// Get an attribute value from an event
    pub fn get_attribute(event: &quick_xml::events::BytesStart, name: &[u8]) -> Option<String> {
        event
            .attributes()
            .filter_map(|a| a.ok())
            .find(|a| a.key.as_ref() == name)
            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
    }

    /// Check if an element name matches with optional namespace prefix
    pub fn matches_element(name: &[u8], expected: &str) -> bool {
        let name_str = std::str::from_utf8(name).unwrap_or("");
        name_str == expected
            || name_str
                .split_once(':')
                .is_some_and(|(_, local)| local == expected)
    }
}
