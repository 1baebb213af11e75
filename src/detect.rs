//! Package kind detection.

use std::io::{Cursor, Read};

use crate::container::decode_xml_bytes;
use crate::error::{Error, Result};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const DOCUMENT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

const TEMPLATE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";

const MACRO_CONTENT_TYPE: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";

/// Kind of WordprocessingML package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Word document (.docx)
    Document,
    /// Word template (.dotx)
    Template,
    /// Macro-enabled document (.docm)
    MacroEnabled,
}

impl PackageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            PackageKind::Document => "docx",
            PackageKind::Template => "dotx",
            PackageKind::MacroEnabled => "docm",
        }
    }
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PackageKind::Document => "Word Document",
            PackageKind::Template => "Word Template",
            PackageKind::MacroEnabled => "Macro-Enabled Word Document",
        };
        f.write_str(name)
    }
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

/// Classify package bytes, failing with [`Error::MalformedPackage`] when
/// they are not a WordprocessingML package.
pub fn detect_package(data: &[u8]) -> Result<PackageKind> {
    if !is_zip_file(data) {
        return Err(Error::malformed("[package]", "not a ZIP archive"));
    }

    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).map_err(|e| Error::malformed("[package]", e))?;

    let content_types = match archive.by_name(CONTENT_TYPES_PART) {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            Some(decode_xml_bytes(&bytes)?)
        }
        Err(_) => None,
    };

    if let Some(types) = content_types {
        if types.contains(DOCUMENT_CONTENT_TYPE) {
            return Ok(PackageKind::Document);
        }
        if types.contains(TEMPLATE_CONTENT_TYPE) {
            return Ok(PackageKind::Template);
        }
        if types.contains(MACRO_CONTENT_TYPE) {
            return Ok(PackageKind::MacroEnabled);
        }
    }

    // Fall back to the folder layout for packages with sloppy content types
    if archive.file_names().any(|n| n.starts_with("word/")) {
        Ok(PackageKind::Document)
    } else {
        Err(Error::malformed(
            CONTENT_TYPES_PART,
            "not a WordprocessingML package",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file(&[0x50, 0x4B, 0x03, 0x04, 0x00]));
        assert!(!is_zip_file(&[0x00, 0x00, 0x00, 0x00]));
        assert!(!is_zip_file(&[0x50, 0x4B]));
    }

    #[test]
    fn test_detect_document() {
        let data = zip_with(&[(
            "[Content_Types].xml",
            r#"<Types><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
        )]);
        assert_eq!(detect_package(&data).unwrap(), PackageKind::Document);
    }

    #[test]
    fn test_detect_by_folder() {
        let data = zip_with(&[("word/document.xml", "<w:document/>")]);
        assert_eq!(detect_package(&data).unwrap(), PackageKind::Document);
    }

    #[test]
    fn test_reject_spreadsheet() {
        let data = zip_with(&[("xl/workbook.xml", "<workbook/>")]);
        assert!(matches!(
            detect_package(&data),
            Err(Error::MalformedPackage { .. })
        ));
        assert!(matches!(
            detect_package(b"hello"),
            Err(Error::MalformedPackage { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(PackageKind::Document.to_string(), "Word Document");
        assert_eq!(PackageKind::Template.extension(), "dotx");
    }
}
