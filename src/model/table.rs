//! Table attributes.

use serde::{Deserialize, Serialize};

use crate::units::BorderStyle;

/// Most grid columns a Word table can have; wider spans are clamped to it.
pub const MAX_GRID_COLUMNS: u32 = 63;

/// Vertical alignment for table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

impl VerticalAlignment {
    pub fn from_ooxml(val: &str) -> Option<Self> {
        match val {
            "top" => Some(VerticalAlignment::Top),
            "center" => Some(VerticalAlignment::Center),
            "bottom" => Some(VerticalAlignment::Bottom),
            _ => None,
        }
    }

    pub fn as_ooxml(&self) -> &'static str {
        match self {
            VerticalAlignment::Top => "top",
            VerticalAlignment::Center => "center",
            VerticalAlignment::Bottom => "bottom",
        }
    }
}

/// Uniform border applied to every edge of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBorders {
    pub style: BorderStyle,

    /// Width in eighths of a point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,

    /// Hex color without the leading `#`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Attributes of a `table` node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableAttrs {
    /// Table style ID (`w:tblStyle`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,

    /// Grid column widths in twips (`w:tblGrid`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Vec<u32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borders: Option<TableBorders>,
}

impl TableAttrs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Attributes of a `tableRow` node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowAttrs {
    /// Row height in twips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Whether the row repeats as a header row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<bool>,
}

impl RowAttrs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Attributes of a `tableCell` node.
///
/// Absent `colspan`/`rowspan` mean 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,

    /// Column widths in pixels, one entry per spanned column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colwidth: Option<Vec<u32>>,

    /// Background fill as `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlignment>,
}

impl CellAttrs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn colspan(&self) -> u32 {
        self.colspan.unwrap_or(1).clamp(1, MAX_GRID_COLUMNS)
    }

    pub fn rowspan(&self) -> u32 {
        self.rowspan.unwrap_or(1).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_span_defaults() {
        let attrs = CellAttrs::default();
        assert_eq!(attrs.colspan(), 1);
        assert_eq!(attrs.rowspan(), 1);

        let attrs = CellAttrs {
            colspan: Some(0),
            rowspan: Some(3),
            ..Default::default()
        };
        assert_eq!(attrs.colspan(), 1);
        assert_eq!(attrs.rowspan(), 3);

        let attrs = CellAttrs {
            colspan: Some(u32::MAX),
            ..Default::default()
        };
        assert_eq!(attrs.colspan(), MAX_GRID_COLUMNS);
    }

    #[test]
    fn test_cell_serialization() {
        let attrs = CellAttrs {
            colspan: Some(2),
            colwidth: Some(vec![100, 50]),
            vertical_align: Some(VerticalAlignment::Center),
            ..Default::default()
        };
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(
            json,
            r#"{"colspan":2,"colwidth":[100,50],"verticalAlign":"center"}"#
        );
    }
}
