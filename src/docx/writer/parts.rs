//! Package parts other than the body: document root, section properties,
//! styles, numbering and comments.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use log::warn;

use super::session::{CommentEntry, NumberingAllocator};
use crate::error::{Error, Result};
use crate::model::{DocumentAttrs, Orientation, SectionProperties};
use crate::xml::{escape, XmlDocument, XmlElement, XmlNode};

pub(crate) const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Assemble `word/document.xml`.
///
/// With an original root element, its attributes (namespace declarations,
/// `mc:Ignorable`) and its children other than `w:body` are kept.
pub(crate) fn document_xml(original: Option<&XmlElement>, body: &str, section: &str) -> Result<String> {
    let mut xml = String::with_capacity(body.len() + section.len() + 512);
    xml.push_str(XML_DECL);
    xml.push('\n');

    match original {
        Some(root) => {
            write!(xml, "<{}", root.name)?;
            for (key, value) in &root.attributes {
                write!(xml, r#" {}="{}""#, key, escape(value))?;
            }
            xml.push('>');
            for child in root.elements().filter(|e| !e.is("w:body")) {
                xml.push_str(&child.to_xml()?);
            }
        }
        None => write!(xml, r#"<w:document xmlns:w="{}" xmlns:r="{}">"#, NS_W, NS_R)?,
    }

    xml.push_str("<w:body>");
    xml.push_str(body);
    xml.push_str(section);
    xml.push_str("</w:body></w:document>");
    Ok(xml)
}

/// Resolve the final `w:sectPr`.
///
/// Precedence: the original package's body section, the captured raw
/// section, the structured fields, then A4 defaults.
pub(crate) fn section_xml(attrs: &DocumentAttrs, original: Option<&XmlElement>) -> Result<String> {
    if let Some(section) = original {
        return section.to_xml();
    }

    if let Some(raw) = &attrs.raw_section {
        match XmlElement::parse(raw) {
            Ok(mut section) if section.is("w:sectPr") => {
                // Header/footer references point at relationships a fresh
                // package does not have
                section.children.retain(|c| {
                    !matches!(c, XmlNode::Element(e)
                        if e.is("w:headerReference") || e.is("w:footerReference"))
                });
                return section.to_xml();
            }
            Ok(other) => warn!("ignoring captured section with root <{}>", other.name),
            Err(e) => warn!("ignoring unparsable captured section: {}", e),
        }
    }

    let section = match &attrs.section {
        Some(section) if !section.is_empty() => section.clone(),
        _ => {
            warn!("document has no section properties, using A4 defaults");
            SectionProperties::a4()
        }
    };
    structured_section_xml(&section)
}

fn structured_section_xml(section: &SectionProperties) -> Result<String> {
    let defaults = SectionProperties::a4();
    let mut xml = String::from("<w:sectPr>");

    let size = section.page_size.clone().or(defaults.page_size).unwrap_or_default();
    xml.push_str("<w:pgSz");
    if let Some(width) = size.width {
        write!(xml, r#" w:w="{}""#, width)?;
    }
    if let Some(height) = size.height {
        write!(xml, r#" w:h="{}""#, height)?;
    }
    if size.orientation == Some(Orientation::Landscape) {
        xml.push_str(r#" w:orient="landscape""#);
    }
    xml.push_str("/>");

    let margins = section.margins.clone().or(defaults.margins).unwrap_or_default();
    xml.push_str("<w:pgMar");
    let fields: [(&str, Option<i64>); 7] = [
        ("w:top", margins.top.map(i64::from)),
        ("w:right", margins.right.map(i64::from)),
        ("w:bottom", margins.bottom.map(i64::from)),
        ("w:left", margins.left.map(i64::from)),
        ("w:header", margins.header.map(i64::from)),
        ("w:footer", margins.footer.map(i64::from)),
        ("w:gutter", margins.gutter.map(i64::from)),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            write!(xml, r#" {}="{}""#, name, value)?;
        }
    }
    xml.push_str("/>");

    if let Some(columns) = section.columns.as_ref().or(defaults.columns.as_ref()) {
        xml.push_str("<w:cols");
        if let Some(count) = columns.count {
            write!(xml, r#" w:num="{}""#, count)?;
        }
        if let Some(space) = columns.space {
            write!(xml, r#" w:space="{}""#, space)?;
        }
        xml.push_str("/>");
    }

    if let Some(grid) = section.doc_grid.as_ref().or(defaults.doc_grid.as_ref()) {
        xml.push_str("<w:docGrid");
        if let Some(grid_type) = &grid.grid_type {
            write!(xml, r#" w:type="{}""#, escape(grid_type))?;
        }
        if let Some(pitch) = grid.line_pitch {
            write!(xml, r#" w:linePitch="{}""#, pitch)?;
        }
        if let Some(space) = grid.char_space {
            write!(xml, r#" w:charSpace="{}""#, space)?;
        }
        xml.push_str("/>");
    }

    xml.push_str("</w:sectPr>");
    Ok(xml)
}

// --- styles ---

/// Styles every fresh package defines.
const BUILTIN_STYLES: &[&str] = &[
    "Normal",
    "Heading1",
    "Heading2",
    "Heading3",
    "Heading4",
    "Heading5",
    "Heading6",
    "ListParagraph",
    "TableGrid",
];

/// Half-point sizes of Heading1..Heading6.
const HEADING_SIZES: [u32; 6] = [32, 26, 24, 22, 22, 22];

/// `word/styles.xml` for a fresh package.
///
/// Referenced ids without a built-in definition get a stub paragraph style
/// based on Normal, so the package never points at a missing style.
pub(crate) fn styles_xml(used: &BTreeSet<String>) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    xml.push('\n');
    write!(xml, r#"<w:styles xmlns:w="{}">"#, NS_W)?;
    xml.push_str(
        r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri" w:eastAsia="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>"#,
    );

    xml.push_str(
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    );
    for (i, size) in HEADING_SIZES.iter().enumerate() {
        let level = i + 1;
        write!(
            xml,
            concat!(
                r#"<w:style w:type="paragraph" w:styleId="Heading{0}"><w:name w:val="heading {0}"/>"#,
                r#"<w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:uiPriority w:val="9"/><w:qFormat/>"#,
                r#"<w:pPr><w:keepNext/><w:keepLines/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="{1}"/></w:pPr>"#,
                r#"<w:rPr><w:b/><w:sz w:val="{2}"/><w:szCs w:val="{2}"/></w:rPr></w:style>"#
            ),
            level, i, size
        )?;
    }
    xml.push_str(
        r#"<w:style w:type="paragraph" w:styleId="ListParagraph"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:uiPriority w:val="34"/><w:qFormat/><w:pPr><w:ind w:left="720"/><w:contextualSpacing/></w:pPr></w:style>"#,
    );
    xml.push_str(
        r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:uiPriority w:val="39"/><w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style>"#,
    );

    for id in used.iter().filter(|id| !BUILTIN_STYLES.contains(&id.as_str())) {
        write!(
            xml,
            r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="{0}"><w:name w:val="{0}"/><w:basedOn w:val="Normal"/></w:style>"#,
            escape(id)
        )?;
    }

    xml.push_str("</w:styles>");
    Ok(xml)
}

// --- numbering ---

/// `word/numbering.xml` holding only the definitions of this export.
pub(crate) fn numbering_xml(numbering: &NumberingAllocator) -> Result<String> {
    let mut root = XmlElement::new("w:numbering").with_attr("xmlns:w", NS_W);
    for element in numbering.abstract_elements() {
        root.push(element);
    }
    for element in numbering.num_elements() {
        root.push(element);
    }
    XmlDocument { root }
        .to_xml()
        .map_err(|e| Error::serialization("word/numbering.xml", e))
}

/// Merge the definitions of this export into an existing numbering part.
///
/// New abstract definitions go after the last `w:abstractNum` (or after
/// the picture bullets when there is none), new instances before
/// `w:numIdMacAtCleanup` or at the end, keeping the schema order.
pub(crate) fn merge_numbering(original: &str, numbering: &NumberingAllocator) -> Result<String> {
    let mut doc = XmlDocument::parse(original).map_err(|e| e.in_part("word/numbering.xml"))?;
    let root = &mut doc.root;

    let mut abstract_at = last_position(root, "w:abstractNum")
        .or_else(|| last_position(root, "w:numPicBullet"))
        .map(|i| i + 1)
        .unwrap_or(0);
    for element in numbering.abstract_elements() {
        root.children.insert(abstract_at, XmlNode::Element(element));
        abstract_at += 1;
    }

    let mut num_at = root
        .children
        .iter()
        .position(|c| matches!(c, XmlNode::Element(e) if e.is("w:numIdMacAtCleanup")))
        .unwrap_or(root.children.len());
    for element in numbering.num_elements() {
        root.children.insert(num_at, XmlNode::Element(element));
        num_at += 1;
    }

    doc.to_xml()
        .map_err(|e| Error::serialization("word/numbering.xml", e))
}

fn last_position(root: &XmlElement, name: &str) -> Option<usize> {
    root.children
        .iter()
        .rposition(|c| matches!(c, XmlNode::Element(e) if e.is(name)))
}

// --- comments ---

/// `word/comments.xml`, one paragraph per line of each comment body.
pub(crate) fn comments_xml(entries: &[CommentEntry]) -> Result<String> {
    let mut xml = String::with_capacity(entries.len() * 256 + 256);
    xml.push_str(XML_DECL);
    xml.push('\n');
    write!(xml, r#"<w:comments xmlns:w="{}">"#, NS_W)?;

    for entry in entries {
        write!(
            xml,
            r#"<w:comment w:id="{}" w:author="{}" w:date="{}" w:initials="{}">"#,
            entry.id,
            escape(&entry.author),
            escape(&entry.date),
            escape(&initials(&entry.author))
        )?;
        for (i, line) in entry.content.split('\n').enumerate() {
            xml.push_str("<w:p>");
            if i == 0 {
                xml.push_str("<w:r><w:annotationRef/></w:r>");
            }
            if !line.is_empty() {
                write!(xml, r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(line))?;
            }
            xml.push_str("</w:p>");
        }
        xml.push_str("</w:comment>");
    }

    xml.push_str("</w:comments>");
    Ok(xml)
}

/// Initials from an author name ("Ana Lima" -> "AL").
fn initials(author: &str) -> String {
    author
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
