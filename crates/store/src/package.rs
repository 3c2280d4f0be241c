//! In-memory packages
//!
//! A [`Package`] owns every part of one zip container. Parts keep their
//! original bytes until they are rewritten, so committing a package that was
//! never edited reproduces each part exactly.

use crate::content_types::ContentTypes;
use crate::error::{DocxError, DocxResult};
use crate::reader::DocxReader;
use crate::relationships::{rels_path_for, Relationships};
use crate::writer::{is_xml_path, DocxWriter};
use crate::xml::XmlDocument;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Contents of a part
#[derive(Debug, Clone, PartialEq)]
pub enum PartData {
    /// Bytes as read from the archive or written by a caller
    Raw(Vec<u8>),
    /// A parsed tree, serialized again on commit
    Xml(XmlDocument),
}

/// One named entry of a package
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    path: String,
    data: PartData,
}

impl Part {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data(&self) -> &PartData {
        &self.data
    }

    /// Serialized bytes of the part
    pub fn to_bytes(&self) -> DocxResult<Vec<u8>> {
        match &self.data {
            PartData::Raw(bytes) => Ok(bytes.clone()),
            PartData::Xml(doc) => Ok(doc.to_xml()?.into_bytes()),
        }
    }

    /// Parse the part as XML
    pub fn to_xml(&self) -> DocxResult<XmlDocument> {
        match &self.data {
            PartData::Raw(bytes) => XmlDocument::from_bytes(bytes)
                .map_err(|e| DocxError::XmlParse(format!("{}: {}", self.path, e))),
            PartData::Xml(doc) => Ok(doc.clone()),
        }
    }
}

/// A word-processing package: an ordered set of parts keyed by path
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
    index: HashMap<String, usize>,
}

impl Package {
    /// Create an empty package (used to assemble packages in memory)
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a package from disk
    pub fn open(path: impl AsRef<Path>) -> DocxResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocxError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                ))
            } else {
                DocxError::Io(e)
            }
        })?;
        Self::from_reader(BufReader::new(file), &path.display().to_string())
    }

    /// Open a package from an in-memory archive
    pub fn from_bytes(bytes: &[u8]) -> DocxResult<Self> {
        Self::from_reader(Cursor::new(bytes), "<memory>")
    }

    /// Open a package from any seekable reader
    pub fn from_reader<R: Read + Seek>(reader: R, label: &str) -> DocxResult<Self> {
        let mut docx = DocxReader::new(reader, label)?;

        if !docx.is_valid_docx() {
            return Err(DocxError::NotAPackage(format!(
                "{}: missing {} or {}",
                label, CONTENT_TYPES_PART, DOCUMENT_PART
            )));
        }

        let mut package = Self::new();
        for (name, data) in docx.read_all()? {
            package.write_bytes(&name, data);
        }

        tracing::debug!("Opened package {} with {} parts", label, package.parts.len());
        Ok(package)
    }

    /// Check whether a part exists
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Part names in package order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.path.as_str())
    }

    /// Get a part by path
    pub fn part(&self, path: &str) -> Option<&Part> {
        self.index.get(path).map(|&i| &self.parts[i])
    }

    /// Read a required XML part
    pub fn read_xml(&self, path: &str) -> DocxResult<XmlDocument> {
        self.part(path)
            .ok_or_else(|| DocxError::PartMissing(path.to_string()))?
            .to_xml()
    }

    /// Read an XML part whose absence is a legal state (e.g. footnotes)
    pub fn read_optional_xml(&self, path: &str) -> DocxResult<Option<XmlDocument>> {
        self.part(path).map(Part::to_xml).transpose()
    }

    /// Read a required part as bytes
    pub fn read_bytes(&self, path: &str) -> DocxResult<Vec<u8>> {
        self.part(path)
            .ok_or_else(|| DocxError::PartMissing(path.to_string()))?
            .to_bytes()
    }

    /// Read a part as bytes, `None` when absent
    pub fn read_optional_bytes(&self, path: &str) -> DocxResult<Option<Vec<u8>>> {
        self.part(path).map(Part::to_bytes).transpose()
    }

    /// Store a parsed tree under a path, replacing any existing part
    pub fn write_xml(&mut self, path: &str, doc: XmlDocument) {
        self.put(path, PartData::Xml(doc));
    }

    /// Store raw bytes under a path, replacing any existing part
    pub fn write_bytes(&mut self, path: &str, data: Vec<u8>) {
        self.put(path, PartData::Raw(data));
    }

    fn put(&mut self, path: &str, data: PartData) {
        match self.index.get(path) {
            Some(&i) => self.parts[i].data = data,
            None => {
                self.index.insert(path.to_string(), self.parts.len());
                self.parts.push(Part {
                    path: path.to_string(),
                    data,
                });
            }
        }
    }

    /// Parsed `[Content_Types].xml`
    pub fn content_types(&self) -> DocxResult<ContentTypes> {
        let bytes = self.read_bytes(CONTENT_TYPES_PART)?;
        ContentTypes::parse(std::str::from_utf8(&bytes)?)
    }

    pub fn set_content_types(&mut self, content_types: &ContentTypes) {
        self.write_bytes(CONTENT_TYPES_PART, content_types.to_xml().into_bytes());
    }

    /// Relationships owned by a part; a part without a `.rels` part has none
    pub fn relationships(&self, part: &str) -> DocxResult<Relationships> {
        match self.read_optional_bytes(&rels_path_for(part))? {
            Some(bytes) => Relationships::parse(std::str::from_utf8(&bytes)?),
            None => Ok(Relationships::new()),
        }
    }

    pub fn set_relationships(&mut self, part: &str, relationships: &Relationships) {
        self.write_bytes(&rels_path_for(part), relationships.to_xml().into_bytes());
    }

    /// Next free `N` for entries named `<dir>/<stem>N.<ext>`
    pub fn next_sequence(&self, dir: &str, stem: &str, ext: &str) -> u32 {
        let prefix = format!("{}/{}", dir, stem);
        let suffix = format!(".{}", ext);
        self.part_names()
            .filter_map(|name| name.strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.strip_suffix(suffix.as_str()))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Serialize the package into a zip archive
    ///
    /// `[Content_Types].xml` is written first, the other parts follow in
    /// package order.
    pub fn to_bytes(&self) -> DocxResult<Vec<u8>> {
        let mut writer = DocxWriter::new(Cursor::new(Vec::new()));

        let ordered = self
            .part(CONTENT_TYPES_PART)
            .into_iter()
            .chain(self.parts.iter().filter(|p| p.path != CONTENT_TYPES_PART));

        for part in ordered {
            let bytes = part.to_bytes()?;
            if is_xml_path(&part.path) {
                writer.write_file(&part.path, &bytes)?;
            } else {
                writer.write_binary(&part.path, &bytes)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Atomically write the package to `destination`
    ///
    /// The archive is written to a temporary file next to the destination and
    /// renamed over it only once complete. On failure an existing destination
    /// is left untouched.
    pub fn commit(&self, destination: impl AsRef<Path>) -> DocxResult<()> {
        let destination = destination.as_ref();
        let write_error = |reason: String| DocxError::PackageWrite {
            path: destination.display().to_string(),
            reason,
        };

        let bytes = self.to_bytes().map_err(|e| write_error(e.to_string()))?;

        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| write_error(e.to_string()))?;
        }

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
        temp.write_all(&bytes).map_err(|e| write_error(e.to_string()))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| write_error(e.to_string()))?;
        temp.persist(destination)
            .map_err(|e| write_error(e.error.to_string()))?;

        tracing::debug!(
            "Committed {} parts ({} bytes) to {}",
            self.parts.len(),
            bytes.len(),
            destination.display()
        );
        Ok(())
    }
}

/// Resolve a relationship target against the part that owns the relationship
///
/// Absolute targets (`/word/media/image1.png`) are taken from the package
/// root; relative ones are resolved against the source part's directory,
/// honoring `.` and `..` segments.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Express an archive path relative to the directory of `source_part`
pub fn relative_target(source_part: &str, path: &str) -> String {
    let base: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = path.split('/').collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = std::iter::repeat("..").take(base.len() - common).collect();
    parts.extend(&target[common..]);
    parts.join("/")
}
