//! Unit conversions and format enumeration tables.
//!
//! WordprocessingML measures lengths in twips (1/20 pt) and font sizes in
//! half-points; the editor uses points and CSS pixels. Colors are `#RRGGBB`
//! in the tree and bare hex in the package.

use serde::{Deserialize, Serialize};

/// Twips per point.
pub const TWIPS_PER_POINT: f64 = 20.0;

/// Twips per inch.
pub const TWIPS_PER_INCH: f64 = 1440.0;

/// CSS pixels per inch.
pub const PIXELS_PER_INCH: f64 = 96.0;

pub fn twips_to_points(twips: i64) -> f64 {
    twips as f64 / TWIPS_PER_POINT
}

pub fn points_to_twips(points: f64) -> i64 {
    (points * TWIPS_PER_POINT).round() as i64
}

pub fn half_points_to_points(half_points: u32) -> f64 {
    f64::from(half_points) / 2.0
}

pub fn points_to_half_points(points: f64) -> u32 {
    (points * 2.0).round().max(0.0) as u32
}

pub fn twips_to_pixels(twips: u32) -> u32 {
    (f64::from(twips) * PIXELS_PER_INCH / TWIPS_PER_INCH).round() as u32
}

pub fn pixels_to_twips(pixels: u32) -> u32 {
    (f64::from(pixels) * TWIPS_PER_INCH / PIXELS_PER_INCH).round() as u32
}

pub fn points_to_pixels(points: f64) -> f64 {
    points * 4.0 / 3.0
}

pub fn pixels_to_points(pixels: f64) -> f64 {
    pixels * 3.0 / 4.0
}

/// Format a point value without a trailing `.0` (`12.0` -> `"12pt"`).
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{}pt", points as i64)
    } else {
        format!("{}pt", points)
    }
}

/// Parse a CSS-ish font size into half-points.
///
/// Accepts `"12pt"`, `"16px"` and a bare number (points).
pub fn parse_font_size(value: &str) -> Option<u32> {
    let value = value.trim();
    let points = if let Some(px) = value.strip_suffix("px") {
        pixels_to_points(px.trim().parse::<f64>().ok()?)
    } else if let Some(pt) = value.strip_suffix("pt") {
        pt.trim().parse::<f64>().ok()?
    } else {
        value.parse::<f64>().ok()?
    };
    if points <= 0.0 || !points.is_finite() {
        return None;
    }
    Some(points_to_half_points(points))
}

/// Normalize a color to `#RRGGBB`.
///
/// Accepts `RRGGBB`, `#RRGGBB` and `#RGB`. Returns `None` for `auto` and
/// anything unparsable.
pub fn normalize_color(value: &str) -> Option<String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.eq_ignore_ascii_case("auto") {
        return None;
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(format!("#{}", hex.to_ascii_uppercase())),
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            Some(format!("#{}", expanded.to_ascii_uppercase()))
        }
        _ => None,
    }
}

/// Strip the `#` from a color for use as an OOXML attribute value.
pub fn color_to_ooxml(value: &str) -> Option<String> {
    normalize_color(value).map(|c| c[1..].to_string())
}

/// Named highlight colors (`w:highlight/@w:val`) and their hex values.
const HIGHLIGHT_COLORS: &[(&str, &str)] = &[
    ("yellow", "#FFFF00"),
    ("green", "#00FF00"),
    ("cyan", "#00FFFF"),
    ("magenta", "#FF00FF"),
    ("blue", "#0000FF"),
    ("red", "#FF0000"),
    ("darkBlue", "#000080"),
    ("darkCyan", "#008080"),
    ("darkGreen", "#008000"),
    ("darkMagenta", "#800080"),
    ("darkRed", "#800000"),
    ("darkYellow", "#808000"),
    ("darkGray", "#808080"),
    ("lightGray", "#C0C0C0"),
    ("black", "#000000"),
    ("white", "#FFFFFF"),
];

/// Map a named highlight color to `#RRGGBB`.
pub fn highlight_to_hex(name: &str) -> Option<&'static str> {
    HIGHLIGHT_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, hex)| *hex)
}

/// Map a hex color back to a named highlight color, if it is one.
pub fn hex_to_highlight(hex: &str) -> Option<&'static str> {
    let normalized = normalize_color(hex)?;
    HIGHLIGHT_COLORS
        .iter()
        .find(|(_, h)| *h == normalized)
        .map(|(n, _)| *n)
}

/// Border line style (`w:val` of border elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    None,
    Single,
    Thick,
    Double,
    Dotted,
    Dashed,
    DotDash,
    DotDotDash,
    Triple,
    Wave,
    Inset,
    Outset,
}

const BORDER_STYLES: &[(BorderStyle, &str)] = &[
    (BorderStyle::None, "none"),
    (BorderStyle::Single, "single"),
    (BorderStyle::Thick, "thick"),
    (BorderStyle::Double, "double"),
    (BorderStyle::Dotted, "dotted"),
    (BorderStyle::Dashed, "dashed"),
    (BorderStyle::DotDash, "dotDash"),
    (BorderStyle::DotDotDash, "dotDotDash"),
    (BorderStyle::Triple, "triple"),
    (BorderStyle::Wave, "wave"),
    (BorderStyle::Inset, "inset"),
    (BorderStyle::Outset, "outset"),
];

impl BorderStyle {
    /// Map a `w:val` border value. `nil` is treated as `none`; unknown art
    /// borders fall back to `single`.
    pub fn from_ooxml(val: &str) -> Self {
        if val == "nil" {
            return BorderStyle::None;
        }
        BORDER_STYLES
            .iter()
            .find(|(_, name)| *name == val)
            .map(|(style, _)| *style)
            .unwrap_or(BorderStyle::Single)
    }

    pub fn as_ooxml(&self) -> &'static str {
        BORDER_STYLES
            .iter()
            .find(|(style, _)| style == self)
            .map(|(_, name)| *name)
            .unwrap_or("single")
    }
}
