//! Package writer infrastructure
//!
//! Creates ZIP archives with the entry layout Word expects.

use crate::error::DocxResult;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Writes package entries into a ZIP archive
pub struct DocxWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> DocxWriter<W> {
    /// Create a new package writer
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// Write an XML or other text part
    pub fn write_file(&mut self, path: &str, content: &[u8]) -> DocxResult<()> {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        self.zip.start_file(path, options)?;
        self.zip.write_all(content)?;

        Ok(())
    }

    /// Write binary data to the ZIP archive
    pub fn write_binary(&mut self, path: &str, data: &[u8]) -> DocxResult<()> {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored); // Don't compress binary

        self.zip.start_file(path, options)?;
        self.zip.write_all(data)?;

        Ok(())
    }

    /// Finish the archive and hand back the underlying writer
    pub fn finish(self) -> DocxResult<W> {
        Ok(self.zip.finish()?)
    }
}

/// Whether a part path holds XML (deflated) rather than a binary blob (stored)
pub fn is_xml_path(path: &str) -> bool {
    path.ends_with(".xml") || path.ends_with(".rels")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_write_and_read_back() {
        let mut writer = DocxWriter::new(Cursor::new(Vec::new()));
        writer.write_file("word/document.xml", b"<w:document/>").unwrap();
        writer.write_binary("word/embeddings/oleObject1.bin", &[0, 1, 2]).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut ole = Vec::new();
        archive
            .by_name("word/embeddings/oleObject1.bin")
            .unwrap()
            .read_to_end(&mut ole)
            .unwrap();
        assert_eq!(ole, vec![0, 1, 2]);
        assert_eq!(
            archive.by_name("word/embeddings/oleObject1.bin").unwrap().compression(),
            zip::CompressionMethod::Stored
        );
    }

    #[test]
    fn test_is_xml_path() {
        assert!(is_xml_path("word/document.xml"));
        assert!(is_xml_path("word/_rels/document.xml.rels"));
        assert!(!is_xml_path("word/embeddings/Microsoft_Excel_Worksheet1.xlsx"));
    }
}
