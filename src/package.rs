//! Output package assembly and part reconciliation.
//!
//! Fresh packages are zipped from a part map. In-place writes copy every
//! untouched entry of the original archive raw, so compressed bytes of
//! styles, themes, media and unknown parts are carried over unchanged.
//!
//! The `ensure_*` helpers patch `[Content_Types].xml` and `.rels` parts
//! idempotently: applying one twice yields the same XML as applying it once.

use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};

use log::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::options::Compression;
use crate::xml::{escape, XmlDocument, XmlElement};

pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PATH: &str = "_rels/.rels";
pub const DOCUMENT_RELS_PATH: &str = "word/_rels/document.xml.rels";

pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const CT_XML: &str = "application/xml";
pub const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub const CT_NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
pub const CT_COMMENTS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

fn zip_error(e: impl std::fmt::Display) -> Error {
    Error::serialization("[package]", e)
}

/// Zip a set of parts into a new package.
///
/// `[Content_Types].xml` is written first, the remaining parts in path order.
pub fn build_package(parts: &BTreeMap<String, Vec<u8>>, compression: Compression) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(compression.method());

    let ordered = parts
        .get_key_value(CONTENT_TYPES_PATH)
        .into_iter()
        .chain(parts.iter().filter(|(name, _)| *name != CONTENT_TYPES_PATH));
    for (name, data) in ordered {
        writer.start_file(name.as_str(), options).map_err(zip_error)?;
        writer.write_all(data).map_err(zip_error)?;
    }

    let cursor = writer.finish().map_err(zip_error)?;
    debug!("built package with {} parts", parts.len());
    Ok(cursor.into_inner())
}

/// Rebuild an original package with some parts replaced or removed.
///
/// Entries not named in `replaced` or `removed` are copied raw in their
/// original order; replaced parts keep their position. Parts in `replaced`
/// that the original lacks are appended.
pub fn patch_package(
    original: &Container,
    replaced: &BTreeMap<String, Vec<u8>>,
    removed: &HashSet<String>,
    compression: Compression,
) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(compression.method());
    let mut written: HashSet<String> = HashSet::new();
    let mut copied = 0usize;

    {
        let mut archive = original.archive();
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index).map_err(zip_error)?;
            let name = entry.name().to_string();
            if removed.contains(&name) || written.contains(&name) {
                continue;
            }
            match replaced.get(&name) {
                Some(data) => {
                    drop(entry);
                    writer.start_file(name.as_str(), options).map_err(zip_error)?;
                    writer.write_all(data).map_err(zip_error)?;
                }
                None => {
                    writer.raw_copy_file(entry).map_err(zip_error)?;
                    copied += 1;
                }
            }
            written.insert(name);
        }
    }

    for (name, data) in replaced {
        if written.contains(name) || removed.contains(name) {
            continue;
        }
        writer.start_file(name.as_str(), options).map_err(zip_error)?;
        writer.write_all(data).map_err(zip_error)?;
    }

    let cursor = writer.finish().map_err(zip_error)?;
    debug!(
        "patched package: {} raw copies, {} rewritten, {} removed",
        copied,
        replaced.len(),
        removed.len()
    );
    Ok(cursor.into_inner())
}

/// `[Content_Types].xml` for a fresh package.
pub fn content_types_xml(overrides: &[(&str, &str)]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<Types xmlns="{}">"#, NS_CONTENT_TYPES));
    xml.push_str(&format!(
        r#"<Default Extension="rels" ContentType="{}"/>"#,
        CT_RELATIONSHIPS
    ));
    xml.push_str(&format!(r#"<Default Extension="xml" ContentType="{}"/>"#, CT_XML));
    for (part, content_type) in overrides {
        xml.push_str(&format!(
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            escape(&part_name(part)),
            escape(content_type)
        ));
    }
    xml.push_str("</Types>");
    xml
}

/// A `.rels` part from `(id, type, target)` triples.
pub fn relationships_xml(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, NS_RELATIONSHIPS));
    for (id, rel_type, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            escape(id),
            escape(rel_type),
            escape(target)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Content-type part name for a package path (`/word/document.xml`).
fn part_name(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn parse_part(xml: &str, part: &str) -> Result<XmlDocument> {
    XmlDocument::parse(xml).map_err(|e| e.in_part(part))
}

/// Make sure `[Content_Types].xml` declares `content_type` for a part.
///
/// An existing override for the part is updated if its type differs; the
/// input is returned unchanged when nothing needs to change.
pub fn ensure_content_type_override(xml: &str, part: &str, content_type: &str) -> Result<String> {
    let mut doc = parse_part(xml, CONTENT_TYPES_PATH)?;
    let name = part_name(part);

    let existing = doc
        .root
        .elements_mut()
        .find(|e| e.local_name() == "Override" && e.attr("PartName") == Some(name.as_str()));
    match existing {
        Some(entry) if entry.attr("ContentType") == Some(content_type) => {
            return Ok(xml.to_string());
        }
        Some(entry) => entry.set_attr("ContentType", content_type),
        None => doc.root.push(
            XmlElement::new("Override")
                .with_attr("PartName", name)
                .with_attr("ContentType", content_type),
        ),
    }
    doc.to_xml()
}

/// Drop the override for a part, if present.
pub fn remove_content_type_override(xml: &str, part: &str) -> Result<String> {
    let mut doc = parse_part(xml, CONTENT_TYPES_PATH)?;
    let name = part_name(part);
    let before = doc.root.children.len();
    doc.root.children.retain(|c| {
        !matches!(c, crate::xml::XmlNode::Element(e)
            if e.local_name() == "Override" && e.attr("PartName") == Some(name.as_str()))
    });
    if doc.root.children.len() == before {
        return Ok(xml.to_string());
    }
    doc.to_xml()
}

/// Next free relationship id: `rId` plus one more than the largest numeric
/// suffix in use.
pub fn next_relationship_id(doc: &XmlDocument) -> String {
    let max = doc
        .root
        .elements()
        .filter_map(|e| e.attr("Id"))
        .filter_map(|id| {
            let digits: String = id
                .chars()
                .rev()
                .take_while(|c| c.is_ascii_digit())
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            digits.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

/// Make sure a `.rels` part has a relationship of `rel_type` to `target`.
///
/// Returns the (possibly unchanged) XML and the relationship id.
pub fn ensure_relationship(xml: &str, rel_type: &str, target: &str) -> Result<(String, String)> {
    let mut doc = parse_part(xml, DOCUMENT_RELS_PATH)?;

    let existing = doc.root.elements().find(|e| {
        e.attr("Type") == Some(rel_type)
            && e.attr("Target").map(normalize_target) == Some(normalize_target(target))
    });
    if let Some(rel) = existing {
        let id = rel.attr("Id").unwrap_or_default().to_string();
        return Ok((xml.to_string(), id));
    }

    let id = next_relationship_id(&doc);
    doc.root.push(
        XmlElement::new("Relationship")
            .with_attr("Id", id.clone())
            .with_attr("Type", rel_type)
            .with_attr("Target", target),
    );
    Ok((doc.to_xml()?, id))
}

/// Drop every relationship whose type is in `rel_types`.
pub fn remove_relationships(xml: &str, rel_types: &[&str]) -> Result<String> {
    let mut doc = parse_part(xml, DOCUMENT_RELS_PATH)?;
    let before = doc.root.children.len();
    doc.root.children.retain(|c| {
        !matches!(c, crate::xml::XmlNode::Element(e)
            if e.attr("Type").is_some_and(|t| rel_types.contains(&t)))
    });
    if doc.root.children.len() == before {
        return Ok(xml.to_string());
    }
    doc.to_xml()
}

fn normalize_target(target: &str) -> &str {
    target.strip_prefix("./").unwrap_or(target)
}
