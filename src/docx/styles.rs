//! styles.xml parsing: heading detection and inherited run properties.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

/// Style type (paragraph, character, table, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

/// A parsed style definition.
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Style ID (e.g., "Heading1")
    pub id: String,
    /// Display name (e.g., "heading 1")
    pub name: String,
    pub style_type: Option<StyleType>,
    pub based_on: Option<String>,
    pub run_props: RunProps,
    /// Outline level, 0-based (`w:outlineLvl`)
    pub outline_level: Option<u8>,
}

/// Run-level (character) properties from a style or the document defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    pub font_name: Option<String>,
    /// Size in half-points
    pub font_size: Option<u32>,
    /// Hex color without `#`
    pub color: Option<String>,
    /// Named highlight color
    pub highlight: Option<String>,
}

impl RunProps {
    /// Merge with another RunProps (other takes precedence).
    pub fn merge(&mut self, other: &RunProps) {
        if other.bold.is_some() {
            self.bold = other.bold;
        }
        if other.italic.is_some() {
            self.italic = other.italic;
        }
        if other.underline.is_some() {
            self.underline = other.underline;
        }
        if other.strike.is_some() {
            self.strike = other.strike;
        }
        if other.font_name.is_some() {
            self.font_name = other.font_name.clone();
        }
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
        if other.color.is_some() {
            self.color = other.color.clone();
        }
        if other.highlight.is_some() {
            self.highlight = other.highlight.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Collection of styles from styles.xml.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    /// Styles by ID
    pub styles: HashMap<String, Style>,
    /// Default paragraph style
    pub default_paragraph: Option<String>,
    /// Run properties from `w:docDefaults`
    pub doc_defaults: RunProps,
}

/// Maximum `basedOn` chain length followed before giving up.
const MAX_INHERITANCE_DEPTH: usize = 10;

impl StyleMap {
    /// Parse styles from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut map = StyleMap::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current_style: Option<Style> = None;
        let mut in_doc_defaults = false;
        let mut in_ppr = false;
        let mut in_rpr = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"w:style" => {
                        let (style, is_default) = start_style(&e);
                        if is_default && style.style_type == Some(StyleType::Paragraph) {
                            map.default_paragraph = Some(style.id.clone());
                        }
                        current_style = Some(style);
                    }
                    b"w:docDefaults" => in_doc_defaults = true,
                    b"w:pPr" => in_ppr = true,
                    b"w:rPr" => in_rpr = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => {
                    let name = e.name();
                    let name = name.as_ref();
                    if let Some(ref mut style) = current_style {
                        match name {
                            b"w:name" => {
                                if let Some(val) = get_val(&e) {
                                    style.name = val;
                                }
                            }
                            b"w:basedOn" => style.based_on = get_val(&e),
                            b"w:outlineLvl" if in_ppr => {
                                style.outline_level = get_val(&e).and_then(|v| v.parse().ok());
                            }
                            _ if in_rpr => apply_run_prop(&mut style.run_props, name, &e),
                            _ => {}
                        }
                    } else if in_doc_defaults && in_rpr {
                        apply_run_prop(&mut map.doc_defaults, name, &e);
                    } else if name == b"w:style" {
                        let (style, _) = start_style(&e);
                        map.styles.insert(style.id.clone(), style);
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"w:style" => {
                        if let Some(style) = current_style.take() {
                            map.styles.insert(style.id.clone(), style);
                        }
                        in_ppr = false;
                        in_rpr = false;
                    }
                    b"w:docDefaults" => in_doc_defaults = false,
                    b"w:pPr" => in_ppr = false,
                    b"w:rPr" => in_rpr = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(map)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    /// Get a style by ID, resolving the `basedOn` chain.
    pub fn get_resolved(&self, id: &str) -> Option<Style> {
        let mut style = self.styles.get(id)?.clone();

        let mut current_based_on = style.based_on.clone();
        let mut depth = 0;
        while let Some(ref base_id) = current_based_on {
            if depth >= MAX_INHERITANCE_DEPTH {
                break;
            }
            let Some(base) = self.styles.get(base_id) else {
                break;
            };
            let mut merged_run = base.run_props.clone();
            merged_run.merge(&style.run_props);
            style.run_props = merged_run;

            if style.outline_level.is_none() {
                style.outline_level = base.outline_level;
            }

            current_based_on = base.based_on.clone();
            depth += 1;
        }

        Some(style)
    }

    /// Heading level (1-6) of a paragraph style, if it is a heading.
    ///
    /// Uses the inherited outline level first, then well-known names.
    pub fn heading_level(&self, style_id: &str) -> Option<u8> {
        let style = self.get_resolved(style_id)?;
        if let Some(level) = style.outline_level {
            // outlineLvl 9 is "body text"
            return (level < 6).then_some(level + 1);
        }
        heading_level_from_name(&style.name).or_else(|| heading_level_from_name(&style.id))
    }

    /// Run properties a style contributes, including inherited ones.
    pub fn run_props(&self, style_id: &str) -> RunProps {
        self.get_resolved(style_id)
            .map(|s| s.run_props)
            .unwrap_or_default()
    }
}

/// Heading level implied by a style name such as "heading 2" or "Title".
pub fn heading_level_from_name(name: &str) -> Option<u8> {
    let lower = name.to_lowercase().replace(' ', "");
    match lower.as_str() {
        "title" => return Some(1),
        "subtitle" => return Some(2),
        _ => {}
    }
    lower
        .strip_prefix("heading")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
}

fn start_style(e: &BytesStart<'_>) -> (Style, bool) {
    let mut style = Style::default();
    let mut is_default = false;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"w:styleId" => style.id = value.to_string(),
            b"w:type" => {
                style.style_type = match value.as_ref() {
                    "paragraph" => Some(StyleType::Paragraph),
                    "character" => Some(StyleType::Character),
                    "table" => Some(StyleType::Table),
                    "numbering" => Some(StyleType::Numbering),
                    _ => None,
                };
            }
            b"w:default" => is_default = value == "1" || value == "true",
            _ => {}
        }
    }
    (style, is_default)
}

fn apply_run_prop(props: &mut RunProps, name: &[u8], e: &BytesStart<'_>) {
    match name {
        b"w:b" => props.bold = Some(get_bool_attr(e, b"w:val").unwrap_or(true)),
        b"w:i" => props.italic = Some(get_bool_attr(e, b"w:val").unwrap_or(true)),
        b"w:strike" => props.strike = Some(get_bool_attr(e, b"w:val").unwrap_or(true)),
        b"w:u" => props.underline = Some(get_val(e).is_none_or(|v| v != "none")),
        b"w:sz" => props.font_size = get_val(e).and_then(|v| v.parse().ok()),
        b"w:color" => props.color = get_val(e).filter(|v| v != "auto"),
        b"w:highlight" => props.highlight = get_val(e).filter(|v| v != "none"),
        b"w:rFonts" => {
            for attr in e.attributes().flatten() {
                if attr.key.as_ref() == b"w:ascii" || attr.key.as_ref() == b"w:hAnsi" {
                    props.font_name = Some(String::from_utf8_lossy(&attr.value).to_string());
                    break;
                }
            }
        }
        _ => {}
    }
}

/// `w:val` of an element.
pub(crate) fn get_val(e: &BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"w:val" {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

/// Helper to get a boolean attribute value.
pub(crate) fn get_bool_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<bool> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let val = String::from_utf8_lossy(&attr.value);
            return Some(val != "0" && val != "false" && val != "off");
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:docDefaults>
        <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
    </w:docDefaults>
    <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
        <w:name w:val="Normal"/>
    </w:style>
    <w:style w:type="paragraph" w:styleId="Heading1">
        <w:name w:val="heading 1"/>
        <w:basedOn w:val="Normal"/>
        <w:pPr><w:outlineLvl w:val="0"/></w:pPr>
        <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
    </w:style>
    <w:style w:type="paragraph" w:styleId="MyHeading">
        <w:name w:val="My Heading"/>
        <w:basedOn w:val="Heading1"/>
        <w:rPr><w:color w:val="2F5496"/></w:rPr>
    </w:style>
    <w:style w:type="paragraph" w:styleId="Berschrift3">
        <w:name w:val="heading 3"/>
    </w:style>
    <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>
    <w:style w:type="character" w:styleId="Strong">
        <w:name w:val="Strong"/>
        <w:rPr><w:b/></w:rPr>
    </w:style>
</w:styles>"#;

    #[test]
    fn test_parse_styles() {
        let map = StyleMap::parse(STYLES).unwrap();
        assert_eq!(map.default_paragraph.as_deref(), Some("Normal"));
        assert_eq!(map.doc_defaults.font_name.as_deref(), Some("Calibri"));
        assert_eq!(map.doc_defaults.font_size, Some(22));

        let style = map.styles.get("Heading1").unwrap();
        assert_eq!(style.outline_level, Some(0));
        assert_eq!(style.run_props.bold, Some(true));
        assert_eq!(style.run_props.font_size, Some(32));
    }

    #[test]
    fn test_heading_level() {
        let map = StyleMap::parse(STYLES).unwrap();
        assert_eq!(map.heading_level("Heading1"), Some(1));
        // Inherited outline level
        assert_eq!(map.heading_level("MyHeading"), Some(1));
        // Localized id, English name
        assert_eq!(map.heading_level("Berschrift3"), Some(3));
        assert_eq!(map.heading_level("Title"), Some(1));
        assert_eq!(map.heading_level("Normal"), None);
        assert_eq!(map.heading_level("Unknown"), None);
    }

    #[test]
    fn test_inherited_run_props() {
        let map = StyleMap::parse(STYLES).unwrap();
        let props = map.run_props("MyHeading");
        assert_eq!(props.bold, Some(true));
        assert_eq!(props.color.as_deref(), Some("2F5496"));
        assert_eq!(map.run_props("Strong").bold, Some(true));
        assert!(map.run_props("Missing").is_empty());
    }

    #[test]
    fn test_heading_level_from_name() {
        assert_eq!(heading_level_from_name("Heading 4"), Some(4));
        assert_eq!(heading_level_from_name("heading7"), None);
        assert_eq!(heading_level_from_name("Body"), None);
    }
}
