//! # PDF Writer
//!
//! A renderer adapter that writes a PDF 1.7 file. Page content is collected
//! as operator streams while the plan is replayed, then every object is
//! serialized in one pass when the adapter finishes.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, pages, content streams
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- points to the catalog and the info dictionary
//! %%EOF
//! ```
//!
//! Plan coordinates have their origin at the top-left corner; PDF user space
//! starts at the bottom-left, so every y is flipped against the page height.
//!
//! Standard fonts are written as Type1 with WinAnsiEncoding. Custom
//! TrueType fonts are embedded whole as CIDFontType2 with Identity-H
//! encoding: FontFile2, FontDescriptor, CIDFont, ToUnicode CMap and the
//! root Type0 dictionary.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::QuireError;
use crate::font::{winansi_code, FontContext, FontData, StandardFont};
use crate::layout::{LayoutPlan, PageFrame, Rect, TextDraw};
use crate::model::Metadata;
use crate::render::{replay, RendererAdapter};
use crate::style::{Color, Edge, FontSpec};

/// Content stream and drawing state of the page being written.
struct PageStream {
    width: f64,
    height: f64,
    ops: String,
    fill: Option<Color>,
    stroke: Option<(Color, f64)>,
}

impl PageStream {
    fn new(frame: &PageFrame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            ops: String::new(),
            fill: None,
            stroke: None,
        }
    }

    fn flip(&self, y: f64) -> f64 {
        self.height - y
    }

    fn set_fill(&mut self, color: Color) {
        if self.fill != Some(color) {
            let _ = writeln!(self.ops, "{:.3} {:.3} {:.3} rg", color.r, color.g, color.b);
            self.fill = Some(color);
        }
    }

    fn set_stroke(&mut self, color: Color, width: f64) {
        if self.stroke != Some((color, width)) {
            let _ = writeln!(
                self.ops,
                "{:.3} {:.3} {:.3} RG\n{:.2} w",
                color.r, color.g, color.b, width
            );
            self.stroke = Some((color, width));
        }
    }
}

/// A font resource of the file being written.
enum PdfFont<'f> {
    Standard(StandardFont),
    Custom(EmbeddedFont<'f>),
}

/// A custom font and the glyphs drawn with it so far.
struct EmbeddedFont<'f> {
    /// Registry entry the font came from.
    source: &'f FontData,
    name: String,
    data: &'f [u8],
    face: ttf_parser::Face<'f>,
    bold: bool,
    italic: bool,
    /// Glyph id to the character it was drawn for.
    used: BTreeMap<u16, char>,
}

impl EmbeddedFont<'_> {
    /// The `TJ` operation showing `text`, recording every glyph it uses.
    fn show(&mut self, text: &str, word_spacing: f64, size: f64) -> String {
        let face = &self.face;
        let used = &mut self.used;
        show_glyphs(text, word_spacing, size, |ch| {
            let gid = face.glyph_index(ch).map_or(0, |g| g.0);
            used.entry(gid).or_insert(ch);
            gid
        })
    }
}

/// Hex glyph strings for a two-byte encoded font. `Tw` only applies to
/// the single-byte code 32, so word spacing becomes a `TJ` adjustment
/// after every space.
fn show_glyphs(
    text: &str,
    word_spacing: f64,
    size: f64,
    mut glyph: impl FnMut(char) -> u16,
) -> String {
    let adjust = if word_spacing != 0.0 && size > 0.0 {
        Some(-word_spacing * 1000.0 / size)
    } else {
        None
    };
    let mut out = String::from("[<");
    for ch in text.chars() {
        let ch = if ch == '\t' { ' ' } else { ch };
        if (ch as u32) < 0x20 {
            continue;
        }
        let _ = write!(out, "{:04X}", glyph(ch));
        if let (' ', Some(adjust)) = (ch, adjust) {
            let _ = write!(out, "> {:.3} <", adjust);
        }
    }
    out.push_str(">] TJ");
    out
}

pub struct PdfWriter<'f> {
    metadata: Metadata,
    font_context: &'f FontContext,
    pages: Vec<PageStream>,
    /// Font resources in `/F{index}` order.
    fonts: Vec<PdfFont<'f>>,
    output: Vec<u8>,
}

/// Tracks allocated PDF objects during serialization.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    fn add(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }

    /// Add a FlateDecode stream object. `extra` lands in the stream
    /// dictionary.
    fn add_stream(&mut self, content: &[u8], extra: &str) -> usize {
        let compressed = compress_to_vec_zlib(content, 6);
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Length {}{} /Filter /FlateDecode >>\nstream\n",
            compressed.len(),
            extra
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream");
        self.add(data)
    }
}

impl<'f> PdfWriter<'f> {
    /// A writer that resolves text fonts against `font_context`, normally
    /// the context the plan was laid out with.
    pub fn new(metadata: Metadata, font_context: &'f FontContext) -> Self {
        Self {
            metadata,
            font_context,
            pages: Vec::new(),
            fonts: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Replay a plan into a fresh writer and return the PDF bytes.
    pub fn write(
        plan: &LayoutPlan,
        metadata: &Metadata,
        font_context: &'f FontContext,
    ) -> Result<Vec<u8>, QuireError> {
        let mut writer = Self::new(metadata.clone(), font_context);
        replay(plan, &mut writer)?;
        Ok(writer.into_bytes())
    }

    /// The serialized file. Empty until [`RendererAdapter::finish`] ran.
    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    fn current_page(&mut self) -> Result<&mut PageStream, QuireError> {
        self.pages
            .last_mut()
            .ok_or_else(|| QuireError::RenderError("drawing before the first page".to_string()))
    }

    fn font_index(&mut self, font: &FontSpec) -> Result<usize, QuireError> {
        let context: &'f FontContext = self.font_context;
        let data = context
            .resolve(font)
            .map_err(|e| QuireError::RenderError(e.to_string()))?;

        let existing = self.fonts.iter().position(|f| match (f, data) {
            (PdfFont::Standard(a), FontData::Standard(b)) => a == b,
            // same registry entry
            (PdfFont::Custom(e), _) => std::ptr::eq(e.source, data),
            _ => false,
        });
        if let Some(i) = existing {
            return Ok(i);
        }

        let resource = match data {
            FontData::Standard(standard) => PdfFont::Standard(*standard),
            FontData::Custom { data: bytes, .. } => {
                let face = ttf_parser::Face::parse(bytes, 0).map_err(|e| {
                    QuireError::FontError(format!("font `{}`: {}", font.family, e))
                })?;
                log::debug!("embedding font `{}` ({} bytes)", font.family, bytes.len());
                PdfFont::Custom(EmbeddedFont {
                    source: data,
                    name: Self::sanitize_font_name(&font.family, font.bold, font.italic),
                    data: bytes,
                    face,
                    bold: font.bold,
                    italic: font.italic,
                    used: BTreeMap::new(),
                })
            }
        };
        self.fonts.push(resource);
        Ok(self.fonts.len() - 1)
    }

    /// Encode a string as a WinAnsi literal. Bytes above 0x7F are written
    /// as octal escapes; characters WinAnsi cannot encode become `?`.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '(' => out.push_str("\\("),
                ')' => out.push_str("\\)"),
                '\t' => out.push(' '),
                c if (c as u32) < 0x20 => {}
                c => match winansi_code(c) {
                    Some(code) if code < 0x80 => out.push(code as char),
                    Some(code) => {
                        let _ = write!(out, "\\{:03o}", code);
                    }
                    None => out.push('?'),
                },
            }
        }
        out
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// A text string for the info dictionary. ASCII stays a literal;
    /// anything else is UTF-16BE hex with a byte order mark.
    fn info_string(s: &str) -> String {
        if s.is_ascii() {
            return format!("({})", Self::escape_pdf_string(s));
        }
        let mut out = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(out, "{:04X}", unit);
        }
        out.push('>');
        out
    }

    /// A PDF name for a custom font: the family without spaces or
    /// punctuation, plus style suffixes.
    fn sanitize_font_name(family: &str, bold: bool, italic: bool) -> String {
        let mut name: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if name.is_empty() {
            name.push_str("CustomFont");
        }
        if bold {
            name.push_str("-Bold");
        }
        if italic {
            name.push_str("-Italic");
        }
        name
    }

    fn build_font_resource_dict(&self, font_ids: &[usize]) -> String {
        font_ids
            .iter()
            .enumerate()
            .map(|(i, obj_id)| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_info(&self) -> Option<Vec<u8>> {
        let m = &self.metadata;
        let fields = [
            ("Title", &m.title),
            ("Author", &m.author),
            ("Subject", &m.subject),
            ("Creator", &m.creator),
        ];
        if fields.iter().all(|(_, v)| v.is_none()) {
            return None;
        }
        let mut info = String::from("<< ");
        for (key, value) in fields {
            if let Some(v) = value {
                let _ = write!(info, "/{} {} ", key, Self::info_string(v));
            }
        }
        info.push_str("/Producer (Quire) >>");
        Some(info.into_bytes())
    }

    /// Write the objects of an embedded font. Returns the id of the Type0
    /// dictionary the page resources point at.
    fn write_embedded_font(builder: &mut PdfBuilder, font: &EmbeddedFont) -> usize {
        let face = &font.face;
        let scale = 1000.0 / face.units_per_em() as f64;

        let fontfile_id =
            builder.add_stream(font.data, &format!(" /Length1 {}", font.data.len()));

        let bbox = face.global_bounding_box();
        let ascender = face.ascender();
        let cap_height = face.capital_height().unwrap_or(ascender);
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            font.name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            if font.italic { -12 } else { 0 },
            (ascender as f64 * scale) as i32,
            (face.descender() as f64 * scale) as i32,
            (cap_height as f64 * scale) as i32,
            if font.bold { 120 } else { 80 },
            fontfile_id,
        );
        let descriptor_id = builder.add(descriptor.into_bytes());

        let mut widths = String::from("[");
        for &gid in font.used.keys() {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(0);
            let _ = write!(widths, " {} [{}]", gid, (advance as f64 * scale) as u32);
        }
        widths.push_str(" ]");
        let default_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map_or(1000, |adv| (adv as f64 * scale) as u32);
        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
            font.name, descriptor_id, default_width, widths,
        );
        let cidfont_id = builder.add(cidfont.into_bytes());

        let cmap = Self::build_tounicode_cmap(&font.used, &font.name);
        let tounicode_id = builder.add_stream(cmap.as_bytes(), "");

        builder.add(
            format!(
                "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
                 /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
                font.name, cidfont_id, tounicode_id,
            )
            .into_bytes(),
        )
    }

    /// ToUnicode CMap so text copied out of the file maps back to the
    /// characters it was drawn from.
    fn build_tounicode_cmap(used: &BTreeMap<u16, char>, font_name: &str) -> String {
        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        let entries: Vec<(&u16, &char)> = used.iter().collect();
        // at most 100 entries per bfchar block
        for chunk in entries.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for (gid, ch) in chunk {
                let _ = write!(cmap, "<{:04X}> <", gid);
                for unit in ch.encode_utf16(&mut [0; 2]) {
                    let _ = write!(cmap, "{:04X}", unit);
                }
                cmap.push_str(">\n");
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }

    fn build(&self) -> Vec<u8> {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        let mut builder = PdfBuilder {
            objects: vec![Vec::new(), Vec::new(), Vec::new()],
        };

        let font_ids: Vec<usize> = self
            .fonts
            .iter()
            .map(|font| match font {
                PdfFont::Standard(standard) => builder.add(
                    format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        standard.pdf_name()
                    )
                    .into_bytes(),
                ),
                PdfFont::Custom(embedded) => Self::write_embedded_font(&mut builder, embedded),
            })
            .collect();
        let font_resources = self.build_font_resource_dict(&font_ids);

        let mut page_ids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let content_id = builder.add_stream(page.ops.as_bytes(), "");
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                page.width, page.height, content_id, font_resources
            );
            page_ids.push(builder.add(page_dict.into_bytes()));
        }

        builder.objects[1] = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_ids.len()
        )
        .into_bytes();

        let info_id = self.build_info().map(|info| builder.add(info));
        Self::serialize(&builder, info_id)
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, data) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R",
            builder.objects.len()
        );
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

impl RendererAdapter for PdfWriter<'_> {
    fn new_page(&mut self, frame: &PageFrame) -> Result<(), QuireError> {
        self.pages.push(PageStream::new(frame));
        Ok(())
    }

    fn fill_rect(&mut self, rect: &Rect, color: Color) -> Result<(), QuireError> {
        let page = self.current_page()?;
        page.set_fill(color);
        let y = page.flip(rect.bottom());
        let _ = writeln!(
            page.ops,
            "{:.2} {:.2} {:.2} {:.2} re\nf",
            rect.x, y, rect.width, rect.height
        );
        Ok(())
    }

    fn stroke_edge(
        &mut self,
        rect: &Rect,
        edge: Edge,
        width: f64,
        color: Color,
    ) -> Result<(), QuireError> {
        let page = self.current_page()?;
        page.set_stroke(color, width);
        let (x0, y0, x1, y1) = match edge {
            Edge::Top => (rect.x, rect.y, rect.right(), rect.y),
            Edge::Bottom => (rect.x, rect.bottom(), rect.right(), rect.bottom()),
            Edge::Left => (rect.x, rect.y, rect.x, rect.bottom()),
            Edge::Right => (rect.right(), rect.y, rect.right(), rect.bottom()),
        };
        let (y0, y1) = (page.flip(y0), page.flip(y1));
        let _ = writeln!(page.ops, "{:.2} {:.2} m\n{:.2} {:.2} l\nS", x0, y0, x1, y1);
        Ok(())
    }

    fn draw_text(&mut self, rect: &Rect, text: &TextDraw) -> Result<(), QuireError> {
        self.current_page()?;
        let index = self.font_index(&text.font)?;
        let show = match &mut self.fonts[index] {
            PdfFont::Standard(_) => {
                let literal = format!("({}) Tj", Self::encode_text(&text.text));
                if text.word_spacing != 0.0 {
                    format!("{:.3} Tw\n{}\n0 Tw", text.word_spacing, literal)
                } else {
                    literal
                }
            }
            PdfFont::Custom(font) => font.show(&text.text, text.word_spacing, text.font.size),
        };
        let page = self.current_page()?;
        page.set_fill(text.color);
        let baseline = page.flip(text.baseline);
        let _ = write!(
            page.ops,
            "BT\n/F{} {:.2} Tf\n{:.2} {:.2} Td\n{}\nET\n",
            index, text.font.size, rect.x, baseline, show
        );
        Ok(())
    }

    fn finish(&mut self) -> Result<(), QuireError> {
        self.output = self.build();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ContentRef;
    use crate::layout::Drawable;
    use crate::model::Orientation;

    fn plan_with_text(font: FontSpec, text: &str) -> LayoutPlan {
        let mut plan = LayoutPlan {
            pages: vec![PageFrame {
                index: 0,
                width: 595.28,
                height: 841.89,
                orientation: Orientation::Portrait,
                content: Rect::new(72.0, 72.0, 451.28, 697.89),
                section: 0,
            }],
            ..Default::default()
        };
        plan.push(
            0,
            Rect::new(72.0, 72.0, 100.0, 12.0),
            Drawable::Text(TextDraw {
                text: text.to_string(),
                color: font.color,
                font,
                baseline: 82.0,
                word_spacing: 0.0,
            }),
            ContentRef::Paragraph {
                section: 0,
                block: 0,
            },
        );
        plan
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(
            PdfWriter::escape_pdf_string("Hello (World)"),
            "Hello \\(World\\)"
        );
        assert_eq!(PdfWriter::escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_encode_text_latin1_and_fallback() {
        assert_eq!(PdfWriter::encode_text("caf\u{e9}"), "caf\\351");
        assert_eq!(PdfWriter::encode_text("\u{20ac}5 \u{2014}"), "\\2005 \\227");
        assert_eq!(PdfWriter::encode_text("\u{4e2d} (x)"), "? \\(x\\)");
    }

    #[test]
    fn test_empty_plan_produces_valid_pdf() {
        let fonts = FontContext::new();
        let bytes = PdfWriter::write(&LayoutPlan::default(), &Metadata::default(), &fonts).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        assert!(bytes.windows(7).any(|w| w == b"trailer"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let metadata = Metadata {
            title: Some("Test Document".to_string()),
            author: Some("Quire".to_string()),
            subject: None,
            creator: None,
        };
        let fonts = FontContext::new();
        let bytes = PdfWriter::write(&LayoutPlan::default(), &metadata, &fonts).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (Test Document)"));
        assert!(text.contains("/Author (Quire)"));
        assert!(!text.contains("/Subject"));
    }

    #[test]
    fn test_non_ascii_metadata_is_utf16() {
        let metadata = Metadata {
            title: Some("Caf\u{e9} \u{4e2d}".to_string()),
            author: Some("A (B)".to_string()),
            ..Default::default()
        };
        let fonts = FontContext::new();
        let bytes = PdfWriter::write(&LayoutPlan::default(), &metadata, &fonts).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title <FEFF00430061006600E900204E2D>"));
        assert!(text.contains("/Author (A \\(B\\))"));
    }

    #[test]
    fn test_bold_font_registered() {
        let font = FontSpec {
            bold: true,
            ..Default::default()
        };
        let fonts = FontContext::new();
        let bytes =
            PdfWriter::write(&plan_with_text(font, "A"), &Metadata::default(), &fonts).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(text.contains("/Type /Page "));
    }

    #[test]
    fn test_times_alias_maps_to_standard_font() {
        let font = FontSpec {
            family: "Times New Roman".to_string(),
            italic: true,
            ..Default::default()
        };
        let fonts = FontContext::new();
        let bytes =
            PdfWriter::write(&plan_with_text(font, "A"), &Metadata::default(), &fonts).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Times-Italic"));
    }

    #[test]
    fn test_drawing_without_page_is_an_error() {
        let fonts = FontContext::new();
        let mut writer = PdfWriter::new(Metadata::default(), &fonts);
        let err = writer
            .fill_rect(&Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK)
            .unwrap_err();
        assert!(matches!(err, QuireError::RenderError(_)));
    }

    #[test]
    fn test_unknown_family_is_a_render_error() {
        let font = FontSpec {
            family: "Nope Sans".to_string(),
            ..Default::default()
        };
        let fonts = FontContext::new();
        let err = PdfWriter::write(&plan_with_text(font, "A"), &Metadata::default(), &fonts)
            .unwrap_err();
        assert!(matches!(err, QuireError::RenderError(ref m) if m.contains("Nope Sans")));
    }

    #[test]
    fn test_glyph_strings_with_word_spacing() {
        let ids = |ch: char| ch as u16;
        assert_eq!(show_glyphs("ab", 0.0, 10.0, ids), "[<00610062>] TJ");
        assert_eq!(
            show_glyphs("a b\t", 2.0, 10.0, ids),
            "[<00610020> -200.000 <00620020> -200.000 <>] TJ"
        );
        assert_eq!(show_glyphs("a\nb", 0.0, 10.0, ids), "[<00610062>] TJ");
    }

    #[test]
    fn test_sanitize_font_name() {
        assert_eq!(PdfWriter::sanitize_font_name("Open Sans", false, false), "OpenSans");
        assert_eq!(
            PdfWriter::sanitize_font_name("Noto (Serif)", true, true),
            "NotoSerif-Bold-Italic"
        );
        assert_eq!(PdfWriter::sanitize_font_name("\u{5b8b}", false, false), "CustomFont");
    }

    #[test]
    fn test_tounicode_cmap_maps_glyphs_back() {
        let mut used = BTreeMap::new();
        used.insert(3u16, 'A');
        used.insert(7u16, '\u{1d11e}');
        let cmap = PdfWriter::build_tounicode_cmap(&used, "Tiny");
        assert!(cmap.contains("/CMapName /Tiny-UTF16 def"));
        assert!(cmap.contains("2 beginbfchar\n<0003> <0041>\n<0007> <D834DD1E>\n"));
        assert!(cmap.trim_end().ends_with("end"));
    }
}
