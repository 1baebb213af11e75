//! Document-level attributes: page geometry and section properties.

use serde::{Deserialize, Serialize};

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page size in twips (`w:pgSz`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

/// Page margins in twips (`w:pgMar`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMargins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gutter: Option<u32>,
}

/// Column settings (`w:cols`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Columns {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Space between columns in twips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<u32>,
}

/// Document grid settings (`w:docGrid`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocGrid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_pitch: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_space: Option<i32>,
}

/// Structured view of a section's properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<PageMargins>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Columns>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_grid: Option<DocGrid>,
}

impl SectionProperties {
    /// A4 portrait with one-inch margins, used when nothing else is known.
    pub fn a4() -> Self {
        Self {
            page_size: Some(PageSize {
                width: Some(11906),
                height: Some(16838),
                orientation: None,
            }),
            margins: Some(PageMargins {
                top: Some(1440),
                right: Some(1440),
                bottom: Some(1440),
                left: Some(1440),
                header: Some(708),
                footer: Some(708),
                gutter: Some(0),
            }),
            columns: Some(Columns {
                count: None,
                space: Some(708),
            }),
            doc_grid: Some(DocGrid {
                grid_type: None,
                line_pitch: Some(360),
                char_space: None,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Attributes of the root `document` node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAttrs {
    /// Structured section properties of the final section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionProperties>,

    /// Verbatim `w:sectPr` XML captured on read, for passthrough
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_section: Option<String>,
}

impl DocumentAttrs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
