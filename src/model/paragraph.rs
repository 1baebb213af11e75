//! Paragraph, heading and list attributes.

use serde::{Deserialize, Serialize};

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Map a `w:jc` value to an alignment.
    pub fn from_ooxml(val: &str) -> Option<Self> {
        match val {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" | "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// The `w:jc` value for this alignment.
    pub fn as_ooxml(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// How `line_height` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineRule {
    /// `line_height` is in 240ths of a line (240 = single spacing).
    Auto,
    /// `line_height` is an exact height in twips.
    Exact,
    /// `line_height` is a minimum height in twips.
    AtLeast,
}

impl LineRule {
    pub fn from_ooxml(val: &str) -> Option<Self> {
        match val {
            "auto" => Some(LineRule::Auto),
            "exact" => Some(LineRule::Exact),
            "atLeast" => Some(LineRule::AtLeast),
            _ => None,
        }
    }

    pub fn as_ooxml(&self) -> &'static str {
        match self {
            LineRule::Auto => "auto",
            LineRule::Exact => "exact",
            LineRule::AtLeast => "atLeast",
        }
    }
}

/// Left indentation with an explicit unit.
///
/// Editors commonly store an indent as a nesting level while Word stores a
/// length; the tag keeps the two from being confused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Indent {
    /// A length in twips (may be negative for outdents).
    Twips(i32),
    /// An indentation level, one level per half inch.
    Level(u8),
}

impl Indent {
    /// Twips per indentation level (half an inch).
    pub const TWIPS_PER_LEVEL: i32 = 720;

    /// Resolve to a length in twips.
    pub fn to_twips(&self) -> i32 {
        match *self {
            Indent::Twips(t) => t,
            Indent::Level(level) => i32::from(level) * Self::TWIPS_PER_LEVEL,
        }
    }
}

/// Formatting attributes shared by paragraphs and headings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphAttrs {
    /// Paragraph style ID (`w:pStyle`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,

    /// Left indentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent: Option<Indent>,

    /// Right indentation in twips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_indent: Option<i32>,

    /// Hanging indentation in twips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hanging: Option<u32>,

    /// First-line indentation in twips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line_indent: Option<u32>,

    /// Space before the paragraph, in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_before: Option<f64>,

    /// Space after the paragraph, in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing_after: Option<f64>,

    /// Raw `w:spacing/@w:line` value, interpreted through `line_rule`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_rule: Option<LineRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<Alignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_next: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_lines: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_to_grid: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_spacing: Option<bool>,

    /// Default run font family for the paragraph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    /// Default run font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl ParagraphAttrs {
    /// Check whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check whether any run-level default (font family/size) is set.
    pub fn has_run_defaults(&self) -> bool {
        self.font_family.is_some() || self.font_size.is_some()
    }
}

/// Heading attributes: a level plus ordinary paragraph formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    /// Heading level (1-6)
    pub level: u8,

    #[serde(flatten)]
    pub paragraph: ParagraphAttrs,
}

impl Default for HeadingAttrs {
    fn default() -> Self {
        Self {
            level: 1,
            paragraph: ParagraphAttrs::default(),
        }
    }
}

impl HeadingAttrs {
    /// Create heading attributes for the given level.
    pub fn new(level: u8) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }
}

/// Attributes of a `bulletList` or `orderedList`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAttrs {
    /// Nesting level (0 = top level)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    /// Numbering ID from the source package, kept for round-trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_id: Option<u32>,

    /// Explicit start value for the first item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
}

impl ListAttrs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The start value when it forces a restart (greater than 1).
    pub fn restart(&self) -> Option<u32> {
        self.start.filter(|s| *s > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_mapping() {
        assert_eq!(Alignment::from_ooxml("both"), Some(Alignment::Justify));
        assert_eq!(Alignment::from_ooxml("end"), Some(Alignment::Right));
        assert_eq!(Alignment::from_ooxml("bogus"), None);
        assert_eq!(Alignment::Justify.as_ooxml(), "both");
    }

    #[test]
    fn test_indent_units() {
        assert_eq!(Indent::Twips(360).to_twips(), 360);
        assert_eq!(Indent::Level(2).to_twips(), 1440);
        assert_eq!(Indent::Twips(-120).to_twips(), -120);
    }

    #[test]
    fn test_indent_serialization_is_tagged() {
        let json = serde_json::to_string(&Indent::Level(3)).unwrap();
        assert_eq!(json, r#"{"level":3}"#);
        let back: Indent = serde_json::from_str(r#"{"twips":720}"#).unwrap();
        assert_eq!(back, Indent::Twips(720));
    }

    #[test]
    fn test_paragraph_attrs_skip_unset() {
        let attrs = ParagraphAttrs {
            spacing_after: Some(0.0),
            ..Default::default()
        };
        let json = serde_json::to_string(&attrs).unwrap();
        // Explicit zero survives, unset fields are absent
        assert_eq!(json, r#"{"spacingAfter":0.0}"#);
        assert!(!attrs.is_empty());
        assert!(ParagraphAttrs::default().is_empty());
    }

    #[test]
    fn test_heading_attrs_flatten() {
        let mut attrs = HeadingAttrs::new(2);
        attrs.paragraph.style_id = Some("Heading2".to_string());
        let json = serde_json::to_string(&attrs).unwrap();
        assert!(json.contains(r#""level":2"#));
        assert!(json.contains(r#""styleId":"Heading2""#));
    }

    #[test]
    fn test_list_restart() {
        let attrs = ListAttrs {
            start: Some(1),
            ..Default::default()
        };
        assert_eq!(attrs.restart(), None);
        let attrs = ListAttrs {
            start: Some(4),
            ..Default::default()
        };
        assert_eq!(attrs.restart(), Some(4));
    }
}
