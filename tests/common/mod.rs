//! Shared helpers for the integration tests.

#![allow(dead_code)]

use quire::error::MeasurementError;
use quire::font::{FontMetrics, MetricsProvider};
use quire::layout::{ContentRef, Drawable, LayoutEngine, LayoutPlan, PlanEntry};
use quire::model::{Document, FontEntry, Length, PageSetup, PageSize, Section};
use quire::style::FontSpec;

/// Every glyph 5pt wide, every line 10pt high with an 8pt ascent.
pub struct Fixed;

impl MetricsProvider for Fixed {
    fn font_metrics(&self, _font: &FontSpec) -> Result<FontMetrics, MeasurementError> {
        Ok(FontMetrics {
            line_height: 10.0,
            ascent: 8.0,
            descent: 2.0,
        })
    }

    fn char_width(&self, _font: &FontSpec, _ch: char) -> Result<f64, MeasurementError> {
        Ok(5.0)
    }
}

/// A page of the given size with zero margins.
pub fn bare_page(width: f64, height: f64) -> PageSetup {
    PageSetup {
        page_size: PageSize::Custom {
            width: Length(width),
            height: Length(height),
        },
        top_margin: Length::ZERO,
        bottom_margin: Length::ZERO,
        left_margin: Length::ZERO,
        right_margin: Length::ZERO,
        ..Default::default()
    }
}

/// One section on `width` x `height` pages with zero margins.
pub fn doc_with(width: f64, height: f64, build: impl FnOnce(&mut Section)) -> Document {
    let mut doc = Document::new();
    doc.default_page = bare_page(width, height);
    build(doc.add_section());
    doc
}

pub fn layout_fixed(doc: &Document) -> LayoutPlan {
    LayoutEngine::new()
        .layout(doc, &Fixed)
        .expect("layout should succeed")
}

/// (page, y, text) of every text entry, in plan order.
pub fn texts(plan: &LayoutPlan) -> Vec<(usize, f64, String)> {
    plan.entries
        .iter()
        .filter_map(|e| match &e.content {
            Drawable::Text(t) => Some((e.page_index, e.rect.y, t.text.clone())),
            _ => None,
        })
        .collect()
}

pub fn cell(block: usize, row: usize, column: usize) -> ContentRef {
    ContentRef::Cell {
        section: 0,
        block,
        row,
        column,
    }
}

/// Cell regions of one row.
pub fn row_regions(plan: &LayoutPlan, row: usize) -> Vec<&PlanEntry> {
    plan.regions()
        .filter(|e| matches!(e.source, ContentRef::Cell { row: r, .. } if r == row))
        .collect()
}

pub fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

/// A minimal TrueType font: `.notdef` (500), space (250) and `A`..=`C`
/// (600 each) on a 1000 unit em, ascender 800, descender -200.
pub fn tiny_font() -> Vec<u8> {
    fn be16(out: &mut Vec<u8>, v: u16) {
        out.extend_from_slice(&v.to_be_bytes());
    }
    fn be32(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    let mut cmap = Vec::new();
    be16(&mut cmap, 0); // version
    be16(&mut cmap, 1); // one encoding record
    be16(&mut cmap, 3); // Windows
    be16(&mut cmap, 10); // full Unicode
    be32(&mut cmap, 12);
    be16(&mut cmap, 12); // format 12
    be16(&mut cmap, 0);
    be32(&mut cmap, 16 + 2 * 12);
    be32(&mut cmap, 0); // language
    be32(&mut cmap, 2); // groups
    for (start, end, glyph) in [(0x20u32, 0x20u32, 1u32), (0x41, 0x43, 2)] {
        be32(&mut cmap, start);
        be32(&mut cmap, end);
        be32(&mut cmap, glyph);
    }

    let mut head = Vec::new();
    be32(&mut head, 0x0001_0000); // version
    be32(&mut head, 0x0001_0000); // font revision
    be32(&mut head, 0); // checksum adjustment
    be32(&mut head, 0x5F0F_3CF5); // magic
    be16(&mut head, 0); // flags
    be16(&mut head, 1000); // units per em
    head.extend_from_slice(&[0; 16]); // created, modified
    for v in [0i16, -200, 600, 800] {
        be16(&mut head, v as u16); // bbox
    }
    be16(&mut head, 0); // mac style
    be16(&mut head, 8); // lowest ppem
    be16(&mut head, 2); // direction hint
    be16(&mut head, 0); // short loca offsets
    be16(&mut head, 0); // glyph data format

    let mut hhea = Vec::new();
    be32(&mut hhea, 0x0001_0000);
    for v in [800i16, -200, 0] {
        be16(&mut hhea, v as u16); // ascender, descender, line gap
    }
    be16(&mut hhea, 600); // advance width max
    for v in [0i16, 0, 600, 1, 0, 0, 0, 0, 0, 0, 0] {
        be16(&mut hhea, v as u16);
    }
    be16(&mut hhea, 5); // horizontal metrics

    let mut hmtx = Vec::new();
    for advance in [500u16, 250, 600, 600, 600] {
        be16(&mut hmtx, advance);
        be16(&mut hmtx, 0); // left side bearing
    }

    let mut maxp = Vec::new();
    be32(&mut maxp, 0x0000_5000);
    be16(&mut maxp, 5); // glyphs

    // tags must be sorted
    let tables: [(&[u8; 4], Vec<u8>); 5] = [
        (b"cmap", cmap),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"maxp", maxp),
    ];

    let mut font = Vec::new();
    be32(&mut font, 0x0001_0000);
    be16(&mut font, tables.len() as u16);
    be16(&mut font, 64); // search range
    be16(&mut font, 2); // entry selector
    be16(&mut font, 16); // range shift

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend_from_slice(&tag[..]);
        be32(&mut font, 0); // checksum
        be32(&mut font, offset as u32);
        be32(&mut font, data.len() as u32);
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    font.extend_from_slice(&body);
    font
}

/// A document font entry carrying [`tiny_font`] as a data URI.
pub fn tiny_font_entry(family: &str) -> FontEntry {
    use base64::Engine;
    FontEntry {
        family: family.to_string(),
        src: format!(
            "data:font/ttf;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(tiny_font())
        ),
        bold: false,
        italic: false,
    }
}
