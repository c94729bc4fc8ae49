//! # Font Management
//!
//! The metrics provider the flow engine measures text with, and the bundled
//! implementation backed by the standard PDF fonts and registered
//! TrueType/OpenType fonts.
//!
//! Lookups never guess: an unknown family or a character the font has no
//! glyph for is a [`MeasurementError`], and layout stops there.

pub mod metrics;

pub use metrics::{winansi_code, StandardFontMetrics};

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{MeasurementError, QuireError};
use crate::model::Document;
use crate::style::FontSpec;

/// Vertical metrics of a resolved font at a given size, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    pub line_height: f64,
    /// Top of the line to the baseline.
    pub ascent: f64,
    /// Baseline to the bottom of the glyphs (positive).
    pub descent: f64,
}

/// One wrapped line of a [`Measurement`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasuredLine {
    pub text: String,
    pub width: f64,
}

/// Result of measuring a string against a maximum width.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub lines: Vec<MeasuredLine>,
    pub line_height: f64,
    pub ascent: f64,
}

impl Measurement {
    pub fn height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height
    }
}

/// The "measure text" capability the flow engine depends on.
///
/// Implementations must be deterministic and immutable once built, so one
/// provider can serve layouts running on several threads.
pub trait MetricsProvider: Send + Sync {
    /// Line height, ascent and descent of `font`.
    fn font_metrics(&self, font: &FontSpec) -> Result<FontMetrics, MeasurementError>;

    /// Advance width of one character in points.
    fn char_width(&self, font: &FontSpec, ch: char) -> Result<f64, MeasurementError>;

    /// Width of a single unwrapped string.
    fn text_width(&self, font: &FontSpec, text: &str) -> Result<f64, MeasurementError> {
        text.chars()
            .try_fold(0.0, |acc, ch| Ok(acc + self.char_width(font, ch)?))
    }

    /// Wrap `text` to `max_width` and report the lines.
    fn measure(
        &self,
        font: &FontSpec,
        text: &str,
        max_width: f64,
    ) -> Result<Measurement, MeasurementError> {
        crate::text::measure_plain(self, font, text, max_width)
    }
}

/// Registry key. Family names are matched case-insensitively.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.trim().to_lowercase(),
            bold,
            italic,
        }
    }

    fn regular(&self) -> Self {
        Self {
            family: self.family.clone(),
            bold: false,
            italic: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType/OpenType font registered by the caller. The PDF writer
    /// embeds `data` as is.
    Custom {
        metrics: CustomFontMetrics,
        data: Vec<u8>,
    },
}

impl FontData {
    fn char_width(&self, ch: char, size: f64) -> Option<f64> {
        match self {
            FontData::Standard(font) => font.metrics().char_width(ch, size),
            FontData::Custom { metrics, .. } => metrics.char_width(ch, size),
        }
    }

    fn font_metrics(&self, size: f64) -> FontMetrics {
        match self {
            FontData::Standard(font) => {
                let m = font.metrics();
                FontMetrics {
                    line_height: m.line_height(size),
                    ascent: m.ascent(size),
                    descent: m.descent(size),
                }
            }
            FontData::Custom { metrics, .. } => metrics.font_metrics(size),
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
}

impl CustomFontMetrics {
    /// Advance width in points, or `None` when the font lacks the glyph.
    pub fn char_width(&self, ch: char, font_size: f64) -> Option<f64> {
        let ch = if ch == '\t' { ' ' } else { ch };
        self.advance_widths
            .get(&ch)
            .map(|&w| w as f64 / self.units_per_em as f64 * font_size)
    }

    fn font_metrics(&self, size: f64) -> FontMetrics {
        let scale = size / self.units_per_em as f64;
        let ascent = self.ascender as f64 * scale;
        let descent = -(self.descender as f64) * scale;
        FontMetrics {
            line_height: ascent + descent + self.line_gap as f64 * scale,
            ascent,
            descent,
        }
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return None;
        }

        let mut advance_widths = HashMap::new();
        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                }
            }
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
        })
    }
}

/// The standard PDF text fonts with built-in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The standard font a family name maps to, following the usual
    /// aliases (Arial is Helvetica, Times New Roman is Times, ...).
    pub fn for_family(family: &str, bold: bool, italic: bool) -> Option<Self> {
        let base = match family.trim().to_lowercase().as_str() {
            "helvetica" | "arial" | "sans-serif" => 0,
            "times" | "times-roman" | "times new roman" | "serif" => 1,
            "courier" | "courier new" | "monospace" => 2,
            _ => return None,
        };
        let font = match (base, bold, italic) {
            (0, false, false) => Self::Helvetica,
            (0, true, false) => Self::HelveticaBold,
            (0, false, true) => Self::HelveticaOblique,
            (0, true, true) => Self::HelveticaBoldOblique,
            (1, false, false) => Self::TimesRoman,
            (1, true, false) => Self::TimesBold,
            (1, false, true) => Self::TimesItalic,
            (1, true, true) => Self::TimesBoldItalic,
            (_, false, false) => Self::Courier,
            (_, true, false) => Self::CourierBold,
            (_, false, true) => Self::CourierOblique,
            (_, true, true) => Self::CourierBoldOblique,
        };
        Some(font)
    }

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &metrics::HELVETICA_BOLD,
            Self::TimesRoman => &metrics::TIMES_ROMAN,
            Self::TimesBold => &metrics::TIMES_BOLD,
            Self::TimesItalic => &metrics::TIMES_ITALIC,
            Self::TimesBoldItalic => &metrics::TIMES_BOLD_ITALIC,
            Self::Courier
            | Self::CourierBold
            | Self::CourierOblique
            | Self::CourierBoldOblique => &metrics::COURIER,
        }
    }
}

/// Maps family + bold + italic to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();

        let families = [
            "Helvetica",
            "Arial",
            "Times",
            "Times-Roman",
            "Times New Roman",
            "Courier",
            "Courier New",
            "sans-serif",
            "serif",
            "monospace",
        ];
        for family in families {
            for (bold, italic) in [(false, false), (true, false), (false, true), (true, true)] {
                if let Some(font) = StandardFont::for_family(family, bold, italic) {
                    fonts.insert(FontKey::new(family, bold, italic), FontData::Standard(font));
                }
            }
        }

        Self { fonts }
    }

    /// Look up a face. A custom family registered without the requested
    /// bold/italic face falls back to its regular face; unknown families
    /// resolve to nothing.
    pub fn resolve(&self, family: &str, bold: bool, italic: bool) -> Option<&FontData> {
        let key = FontKey::new(family, bold, italic);
        self.fonts
            .get(&key)
            .or_else(|| self.fonts.get(&key.regular()))
    }

    /// Register a custom font from raw TrueType/OpenType bytes.
    pub fn register(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        data: &[u8],
    ) -> Result<(), QuireError> {
        let metrics = CustomFontMetrics::from_font_data(data).ok_or_else(|| {
            QuireError::FontError(format!("could not parse font data for `{}`", family))
        })?;
        log::debug!(
            "registered font `{}` (bold: {}, italic: {}, {} glyphs)",
            family,
            bold,
            italic,
            metrics.advance_widths.len()
        );
        self.fonts.insert(
            FontKey::new(family, bold, italic),
            FontData::Custom {
                metrics,
                data: data.to_vec(),
            },
        );
        Ok(())
    }
}

/// Font context shared by layout and rendering. Immutable once built, so it
/// can be shared across threads by reference.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Build a context holding the standard fonts plus every font the
    /// document declares.
    pub fn from_document(document: &Document) -> Result<Self, QuireError> {
        let mut ctx = Self::new();
        for entry in &document.fonts {
            let bytes = decode_font_source(&entry.src).map_err(|e| {
                QuireError::FontError(format!("font `{}`: {}", entry.family, e))
            })?;
            ctx.registry
                .register(&entry.family, entry.bold, entry.italic, &bytes)?;
        }
        Ok(ctx)
    }

    /// Resolve a font descriptor to its data.
    pub fn resolve(&self, font: &FontSpec) -> Result<&FontData, MeasurementError> {
        if !(font.size.is_finite() && font.size > 0.0) {
            return Err(MeasurementError::InvalidFontSize(font.size));
        }
        self.registry
            .resolve(&font.family, font.bold, font.italic)
            .ok_or_else(|| MeasurementError::UnknownFont {
                family: font.family.clone(),
                bold: font.bold,
                italic: font.italic,
            })
    }

    /// Access the underlying font registry mutably.
    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}

impl MetricsProvider for FontContext {
    fn font_metrics(&self, font: &FontSpec) -> Result<FontMetrics, MeasurementError> {
        Ok(self.resolve(font)?.font_metrics(font.size))
    }

    fn char_width(&self, font: &FontSpec, ch: char) -> Result<f64, MeasurementError> {
        self.resolve(font)?
            .char_width(ch, font.size)
            .ok_or_else(|| MeasurementError::MissingGlyph {
                family: font.family.clone(),
                ch,
            })
    }

    fn text_width(&self, font: &FontSpec, text: &str) -> Result<f64, MeasurementError> {
        let data = self.resolve(font)?;
        text.chars().try_fold(0.0, |acc, ch| {
            data.char_width(ch, font.size)
                .map(|w| acc + w)
                .ok_or_else(|| MeasurementError::MissingGlyph {
                    family: font.family.clone(),
                    ch,
                })
        })
    }
}

/// Accepts raw base64 or a `data:...;base64,` URI.
fn decode_font_source(src: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    let payload = match src.strip_prefix("data:") {
        Some(rest) => {
            let comma = rest
                .find(',')
                .ok_or_else(|| "invalid data URI: missing comma".to_string())?;
            &rest[comma + 1..]
        }
        None => src,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("base64 decode error: {}", e))
}
