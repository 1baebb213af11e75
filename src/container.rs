//! ZIP container access for WordprocessingML packages.

use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

/// Relationship type of the main document part.
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationship type of the styles part.
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Relationship type of the numbering part.
pub const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";

/// Relationship type of the comments part.
pub const REL_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";

/// Conventional location of the main document part.
pub const DEFAULT_DOCUMENT_PATH: &str = "word/document.xml";

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path, relative to the source part's directory
    pub target: String,
    pub external: bool,
}

/// Relationships of one source part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    /// Entries in file order
    pub entries: Vec<Relationship>,
    by_id: HashMap<String, usize>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rel: Relationship) {
        self.by_id.insert(rel.id.clone(), self.entries.len());
        self.entries.push(rel);
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// First relationship of the given type.
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.rel_type == rel_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the XML of a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut rels = Relationships::new();
        if xml.trim().is_empty() {
            return Ok(rels);
        }

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut rel = Relationship {
                        id: String::new(),
                        rel_type: String::new(),
                        target: String::new(),
                        external: false,
                    };
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            b"TargetMode" => rel.external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }
                    if !rel.id.is_empty() {
                        rels.add(rel);
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }
}

/// Path of the `.rels` part that belongs to a source part.
pub fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part_path.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// Resolve a relationship target against its source part.
pub fn resolve_path(base: &str, relative: &str) -> String {
    if let Some(stripped) = relative.strip_prefix('/') {
        return stripped.to_string();
    }

    let mut segments: Vec<&str> = match base.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in relative.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Decode XML bytes handling a UTF-8 BOM and UTF-16 LE/BE.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    let invalid = |e: &dyn std::fmt::Display| {
        Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    };

    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec()).map_err(|e| invalid(&e));
    }

    let utf16 = if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        Some((rest, true))
    } else {
        bytes.strip_prefix(&[0xFE, 0xFF]).map(|rest| (rest, false))
    };

    match utf16 {
        Some((rest, little_endian)) => {
            let units = rest.chunks_exact(2).map(|pair| {
                if little_endian {
                    u16::from_le_bytes([pair[0], pair[1]])
                } else {
                    u16::from_be_bytes([pair[0], pair[1]])
                }
            });
            let content = char::decode_utf16(units)
                .collect::<std::result::Result<String, _>>()
                .map_err(|e| invalid(&e))?;
            // The declaration still names UTF-16 although the text is now UTF-8
            Ok(content
                .replacen("encoding=\"UTF-16\"", "encoding=\"UTF-8\"", 1)
                .replacen("encoding=\"utf-16\"", "encoding=\"UTF-8\"", 1))
        }
        None => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// A WordprocessingML package opened for reading.
pub struct Container {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl Container {
    /// Open a package from bytes.
    ///
    /// Anything that is not a readable ZIP archive is a malformed package.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::malformed("[package]", e))?;
        debug!("opened package with {} entries", archive.len());
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Open a package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path.as_ref())?)
    }

    /// Read a mandatory XML part.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        self.read_optional_xml(path)?
            .ok_or_else(|| Error::malformed(path, "part not found"))
    }

    /// Read an XML part that may be absent.
    pub fn read_optional_xml(&self, path: &str) -> Result<Option<String>> {
        match self.read_optional_binary(path)? {
            Some(bytes) => decode_xml_bytes(&bytes)
                .map(Some)
                .map_err(|e| Error::malformed(path, e)),
            None => Ok(None),
        }
    }

    /// Read the raw bytes of a part that may be absent.
    pub fn read_optional_binary(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = match archive.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(Error::malformed(path, e)),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| Error::malformed(path, e))?;
        Ok(Some(data))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.archive.borrow().file_names().any(|n| n == path)
    }

    pub fn list_files(&self) -> Vec<String> {
        self.archive.borrow().file_names().map(String::from).collect()
    }

    /// Relationships of a part (`""` for the package itself).
    ///
    /// A missing `.rels` part yields an empty collection.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(part_path);
        match self.read_optional_xml(&rels_path)? {
            Some(xml) => Relationships::parse(&xml).map_err(|e| e.in_part(&rels_path)),
            None => Ok(Relationships::new()),
        }
    }

    /// Locate the main document part through the package relationships,
    /// falling back to `word/document.xml`.
    pub fn main_document_path(&self) -> Result<String> {
        let rels = self.read_relationships("")?;
        if let Some(rel) = rels.first_of_type(REL_OFFICE_DOCUMENT) {
            let path = resolve_path("", &rel.target);
            if self.exists(&path) {
                return Ok(path);
            }
            debug!("officeDocument target {} missing, using default", path);
        }
        if self.exists(DEFAULT_DOCUMENT_PATH) {
            Ok(DEFAULT_DOCUMENT_PATH.to_string())
        } else {
            Err(Error::malformed(DEFAULT_DOCUMENT_PATH, "main document part not found"))
        }
    }

    /// Path of the part a document relationship of `rel_type` points at.
    pub fn related_part(&self, source: &str, rel_type: &str) -> Result<Option<String>> {
        let rels = self.read_relationships(source)?;
        Ok(rels
            .first_of_type(rel_type)
            .filter(|r| !r.external)
            .map(|r| resolve_path(source, &r.target)))
    }

    /// Borrow the underlying archive, for raw entry copies.
    pub(crate) fn archive(&self) -> RefMut<'_, zip::ZipArchive<Cursor<Vec<u8>>>> {
        self.archive.borrow_mut()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("files", &self.archive.borrow().len())
            .finish()
    }
}
