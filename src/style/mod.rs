//! # Style System
//!
//! Attribute bundles attached to document nodes: fonts, colors, borders,
//! shading, spacing, alignment and row-height rules.
//!
//! Styles arrive mostly resolved. The only inheritance the engine performs
//! is the per-edge border/shading override chain (see [`resolve`]) and the
//! font override chain (document font, then block override, then run
//! override). Both are plain merge functions over these records.

pub mod resolve;

use crate::model::Length;
use serde::{Deserialize, Serialize};

// ── Color ──────────────────────────────────────────────────────

/// An RGBA color.
///
/// Deserializes from `{ "r": .., "g": .., "b": .., "a": .. }` (components
/// 0.0 - 1.0), a hex string (`"#add8e6"`) or a color name (`"LightBlue"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    /// Parse `#rgb` or `#rrggbb`. Returns `None` for anything else.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let (r, g, b) = match hex.len() {
            3 => (
                u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?,
                u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?,
                u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?,
            ),
            6 => (
                u8::from_str_radix(&hex[0..2], 16).ok()?,
                u8::from_str_radix(&hex[2..4], 16).ok()?,
                u8::from_str_radix(&hex[4..6], 16).ok()?,
            ),
            _ => return None,
        };
        Some(Self::rgb8(r, g, b))
    }

    /// Look up a named color (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        let c = match name.to_ascii_lowercase().as_str() {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "transparent" => Self::TRANSPARENT,
            "red" => Self::rgb8(255, 0, 0),
            "darkred" => Self::rgb8(139, 0, 0),
            "green" => Self::rgb8(0, 128, 0),
            "lightgreen" => Self::rgb8(144, 238, 144),
            "blue" => Self::rgb8(0, 0, 255),
            "darkblue" => Self::rgb8(0, 0, 139),
            "lightblue" => Self::rgb8(173, 216, 230),
            "navy" => Self::rgb8(0, 0, 128),
            "yellow" => Self::rgb8(255, 255, 0),
            "lightyellow" => Self::rgb8(255, 255, 224),
            "orange" => Self::rgb8(255, 165, 0),
            "gray" | "grey" => Self::rgb8(128, 128, 128),
            "darkgray" | "darkgrey" => Self::rgb8(169, 169, 169),
            "lightgray" | "lightgrey" => Self::rgb8(211, 211, 211),
            "silver" => Self::rgb8(192, 192, 192),
            _ => return None,
        };
        Some(c)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

fn default_alpha() -> f64 {
    1.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Components {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "default_alpha")]
        a: f64,
    },
    Text(String),
}

impl TryFrom<ColorRepr> for Color {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Components { r, g, b, a } => Ok(Color { r, g, b, a }),
            ColorRepr::Text(s) => Color::parse_hex(&s)
                .filter(|_| s.starts_with('#'))
                .or_else(|| Color::named(&s))
                .ok_or_else(|| format!("unknown color `{s}`")),
        }
    }
}

// ── Fonts ──────────────────────────────────────────────────────

/// A fully resolved font descriptor, as handed to the metrics provider and
/// the renderer adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub family: String,
    /// Font size in points.
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_string(),
            size: 10.0,
            bold: false,
            italic: false,
            color: Color::BLACK,
        }
    }
}

/// Partial font declaration. Each field overrides independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontOverride {
    pub family: Option<String>,
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Color>,
}

impl FontOverride {
    /// Apply this override on top of `base`.
    pub fn apply(&self, base: &FontSpec) -> FontSpec {
        FontSpec {
            family: self.family.clone().unwrap_or_else(|| base.family.clone()),
            size: self.size.unwrap_or(base.size),
            bold: self.bold.unwrap_or(base.bold),
            italic: self.italic.unwrap_or(base.italic),
            color: self.color.unwrap_or(base.color),
        }
    }
}

// ── Alignment & Spacing ────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

/// How a table row's height is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowHeightRule {
    /// Tallest cell's natural content height, no floor.
    #[default]
    Auto,
    /// At least the row height; grows with content.
    AtLeast,
    /// Exactly the row height; content is clipped.
    Exactly,
}

/// Line spacing of a paragraph, applied to each wrapped line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum LineSpacing {
    /// The font's natural line height.
    #[default]
    Single,
    OnePtFive,
    Double,
    /// Natural line height times the factor.
    Multiple(f64),
    /// Natural line height with a floor.
    AtLeast(Length),
    /// Fixed line height regardless of font.
    Exactly(Length),
}

impl LineSpacing {
    /// Apply the rule to a natural line height.
    pub fn apply(&self, natural: f64) -> f64 {
        match *self {
            LineSpacing::Single => natural,
            LineSpacing::OnePtFive => natural * 1.5,
            LineSpacing::Double => natural * 2.0,
            LineSpacing::Multiple(f) => natural * f.max(0.0),
            LineSpacing::AtLeast(min) => natural.max(min.points()),
            LineSpacing::Exactly(h) => h.points(),
        }
    }
}

// ── Borders & Shading ──────────────────────────────────────────

/// One side of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

/// Declaration for a single border edge. `None` fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderEdge {
    pub width: Option<Length>,
    pub visible: Option<bool>,
    pub color: Option<Color>,
}

impl BorderEdge {
    pub fn is_declared(&self) -> bool {
        self.width.is_some() || self.visible.is_some() || self.color.is_some()
    }
}

/// Border declarations for all four edges, plus shorthands that apply to
/// every edge without its own value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borders {
    pub visible: Option<bool>,
    pub width: Option<Length>,
    pub color: Option<Color>,
    #[serde(default)]
    pub top: BorderEdge,
    #[serde(default)]
    pub right: BorderEdge,
    #[serde(default)]
    pub bottom: BorderEdge,
    #[serde(default)]
    pub left: BorderEdge,
}

impl Borders {
    /// Shorthand for `Borders { visible: Some(true), .. }`.
    pub fn visible() -> Self {
        Self {
            visible: Some(true),
            ..Default::default()
        }
    }

    pub fn edge(&self, edge: Edge) -> &BorderEdge {
        match edge {
            Edge::Top => &self.top,
            Edge::Right => &self.right,
            Edge::Bottom => &self.bottom,
            Edge::Left => &self.left,
        }
    }

    pub fn edge_mut(&mut self, edge: Edge) -> &mut BorderEdge {
        match edge {
            Edge::Top => &mut self.top,
            Edge::Right => &mut self.right,
            Edge::Bottom => &mut self.bottom,
            Edge::Left => &mut self.left,
        }
    }

    /// Whether anything at all is declared.
    pub fn is_declared(&self) -> bool {
        self.visible.is_some()
            || self.width.is_some()
            || self.color.is_some()
            || Edge::ALL.iter().any(|e| self.edge(*e).is_declared())
    }
}

/// Background fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shading {
    pub color: Option<Color>,
    pub visible: Option<bool>,
}

impl Shading {
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            visible: None,
        }
    }

    pub fn is_declared(&self) -> bool {
        self.color.is_some() || self.visible.is_some()
    }
}

// ── Formats ────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

/// Paragraph-level formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParagraphFormat {
    pub space_before: Length,
    pub space_after: Length,
    pub left_indent: Length,
    pub right_indent: Length,
    /// Extra indent of the first line (may be negative for hanging indents).
    pub first_line_indent: Length,
    pub alignment: Alignment,
    pub line_spacing: LineSpacing,
    pub font: FontOverride,
    pub borders: Borders,
    pub shading: Shading,
    /// Keep all lines on one page when they fit on a page.
    pub keep_together: bool,
    /// Keep this paragraph on the same page as the start of the next block.
    pub keep_with_next: bool,
    pub page_break_before: bool,
    /// Avoid single lines at the bottom or top of a page.
    #[serde(default = "default_true")]
    pub widow_control: bool,
}

impl Default for ParagraphFormat {
    fn default() -> Self {
        Self {
            space_before: Length::ZERO,
            space_after: Length::ZERO,
            left_indent: Length::ZERO,
            right_indent: Length::ZERO,
            first_line_indent: Length::ZERO,
            alignment: Alignment::default(),
            line_spacing: LineSpacing::default(),
            font: FontOverride::default(),
            borders: Borders::default(),
            shading: Shading::default(),
            keep_together: false,
            keep_with_next: false,
            page_break_before: false,
            widow_control: true,
        }
    }
}

fn default_cell_padding() -> Length {
    Length::mm(1.2)
}

/// Table-level formatting and row defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableFormat {
    pub borders: Borders,
    pub shading: Shading,
    /// Default height rule for rows that do not declare one.
    pub height_rule: RowHeightRule,
    /// Default row height used by `AtLeast` / `Exactly`.
    pub height: Length,
    pub vertical_alignment: VerticalAlignment,
    #[serde(default = "default_cell_padding")]
    pub left_padding: Length,
    #[serde(default = "default_cell_padding")]
    pub right_padding: Length,
    pub top_padding: Length,
    pub bottom_padding: Length,
    /// Offset of the table from the left content edge.
    pub left_indent: Length,
    /// Font override for text inside cells.
    pub font: FontOverride,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            borders: Borders::default(),
            shading: Shading::default(),
            height_rule: RowHeightRule::Auto,
            height: Length::ZERO,
            vertical_alignment: VerticalAlignment::Top,
            left_padding: default_cell_padding(),
            right_padding: default_cell_padding(),
            top_padding: Length::ZERO,
            bottom_padding: Length::ZERO,
            left_indent: Length::ZERO,
            font: FontOverride::default(),
        }
    }
}

/// Row formatting. `None` fields fall back to the table defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RowFormat {
    pub height_rule: Option<RowHeightRule>,
    pub height: Option<Length>,
    pub vertical_alignment: Option<VerticalAlignment>,
    pub borders: Borders,
    pub shading: Shading,
    /// Heading rows repeat at the top of every page the table continues on.
    pub heading: bool,
}

/// Cell formatting. Unset values fall back to the row, then the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellFormat {
    pub borders: Borders,
    pub shading: Shading,
    pub vertical_alignment: Option<VerticalAlignment>,
}

impl CellFormat {
    pub fn is_declared(&self) -> bool {
        self.borders.is_declared()
            || self.shading.is_declared()
            || self.vertical_alignment.is_some()
    }
}
