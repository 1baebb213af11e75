//! Attributed XML element tree.
//!
//! Package parts are parsed into [`XmlElement`] trees so that both the reader
//! and the in-place writer can inspect and patch them structurally. Whitespace
//! text is kept, so a parse/serialize cycle preserves the original layout.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// A parsed XML document part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Parse a standalone element fragment (no declaration required).
    pub fn parse(xml: &str) -> Result<Self> {
        Ok(XmlDocument::parse(xml)?.root)
    }

    /// Local part of the name (`p` for `w:p`).
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Parse an attribute as a number.
    pub fn attr_parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.attr(key).and_then(|v| v.trim().parse().ok())
    }

    /// `w:val` of the named child, the common OOXML property shape.
    pub fn child_val(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.attr("w:val"))
    }

    /// Boolean toggle property: present without `w:val`, or with a truthy one.
    pub fn child_flag(&self, name: &str) -> Option<bool> {
        let child = self.child(name)?;
        Some(!matches!(
            child.attr("w:val"),
            Some("false") | Some("0") | Some("off") | Some("none")
        ))
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Append a child element.
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert a child element after the last element named `after`, or at
    /// the front when there is none.
    pub fn insert_after_last(&mut self, after: &str, child: XmlElement) {
        let position = self
            .children
            .iter()
            .rposition(|c| matches!(c, XmlNode::Element(e) if e.name == after))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.children.insert(position, XmlNode::Element(child));
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
                XmlNode::Comment(_) => {}
            }
        }
    }

    /// Depth-first search for the first descendant with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Serialize this element (without an XML declaration).
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_to(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(|e| Error::XmlParse(e.to_string()))
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_to(writer)?,
                XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
                XmlNode::CData(t) => writer.write_event(Event::CData(BytesCData::new(t.as_str())))?,
                XmlNode::Comment(c) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

impl XmlDocument {
    /// Parse XML text into a document tree.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => stack.push(element_from_start(&e)?),
                Ok(Event::Empty(e)) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape()?.into_owned();
                        if !text.is_empty() {
                            parent.children.push(XmlNode::Text(text));
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e).into_owned();
                        parent.children.push(XmlNode::CData(text));
                    }
                }
                Ok(Event::Comment(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e).into_owned();
                        parent.children.push(XmlNode::Comment(text));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::XmlParse(format!(
                "unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }

        root.map(|root| XmlDocument { root })
            .ok_or_else(|| Error::XmlParse("document has no root element".to_string()))
    }

    /// Serialize with a standalone UTF-8 declaration.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        self.root.write_to(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(|e| Error::XmlParse(e.to_string()))
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Escape text for inclusion in element content or attribute values.
pub fn escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
</w:numbering>"#;

    #[test]
    fn test_parse_structure() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.root.name, "w:numbering");
        assert_eq!(doc.root.local_name(), "numbering");
        assert_eq!(doc.root.elements().count(), 2);

        let num = doc.root.child("w:num").unwrap();
        assert_eq!(num.attr("w:numId"), Some("1"));
        assert_eq!(num.child_val("w:abstractNumId"), Some("0"));
        assert_eq!(doc.root.find("w:numFmt").unwrap().attr("w:val"), Some("decimal"));
    }

    #[test]
    fn test_roundtrip_preserves_content() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let xml = doc.to_xml().unwrap();
        let again = XmlDocument::parse(&xml).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn test_escaping() {
        let el = XmlElement::parse(r#"<w:t a="x &amp; &quot;y&quot;">a &lt; b</w:t>"#).unwrap();
        assert_eq!(el.attr("a"), Some(r#"x & "y""#));
        assert_eq!(el.text(), "a < b");
        let xml = el.to_xml().unwrap();
        assert!(xml.contains("a &lt; b"));
        assert_eq!(XmlElement::parse(&xml).unwrap(), el);
    }

    #[test]
    fn test_insert_after_last() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        let fresh = XmlElement::new("w:abstractNum").with_attr("w:abstractNumId", "7");
        doc.root.insert_after_last("w:abstractNum", fresh);
        let names: Vec<_> = doc
            .root
            .elements()
            .map(|e| (e.name.as_str(), e.attr("w:abstractNumId")))
            .collect();
        assert_eq!(names[1], ("w:abstractNum", Some("7")));
        assert_eq!(names[2].0, "w:num");
    }

    #[test]
    fn test_child_flag() {
        let el = XmlElement::parse(r#"<w:rPr><w:b/><w:i w:val="0"/></w:rPr>"#).unwrap();
        assert_eq!(el.child_flag("w:b"), Some(true));
        assert_eq!(el.child_flag("w:i"), Some(false));
        assert_eq!(el.child_flag("w:u"), None);
    }

    #[test]
    fn test_malformed() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("").is_err());
    }
}
