//! # Document Model
//!
//! The input representation for the composition engine. A document is an
//! ordered list of sections; each section carries its page setup and a
//! sequence of blocks (paragraphs, tables, explicit page breaks). Tables own
//! their columns and rows, and every row owns one cell per column.
//!
//! The model can be built in code through the `add_*` builders or
//! deserialized from JSON. Layout only ever reads it.

pub mod units;
pub mod validate;

pub use units::Length;

use std::ops::{Index, IndexMut};

use crate::style::{CellFormat, FontOverride, FontSpec, ParagraphFormat, RowFormat, TableFormat};
use serde::{Deserialize, Serialize};

/// A complete document ready for layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Sections in reading order. Every section starts on a new page.
    #[serde(default)]
    pub sections: Vec<Section>,

    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,

    /// Page setup for sections that don't declare their own.
    #[serde(default)]
    pub default_page: PageSetup,

    /// Document-wide defaults (base font, border width).
    #[serde(default)]
    pub defaults: DocumentDefaults,

    /// Custom fonts to register before layout.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new section and return it.
    pub fn add_section(&mut self) -> &mut Section {
        self.sections.push(Section::default());
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    /// The page setup in effect for a section.
    pub fn page_setup_for(&self, section: &Section) -> PageSetup {
        section.page_setup.clone().unwrap_or_else(|| self.default_page.clone())
    }
}

/// Document metadata embedded in the output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

fn default_border_width() -> Length {
    Length(0.5)
}

/// Values every style chain falls back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDefaults {
    /// Base font for all text.
    #[serde(default)]
    pub font: FontSpec,
    /// Border width used when a border is visible but declares no width.
    #[serde(default = "default_border_width")]
    pub border_width: Length,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            border_width: default_border_width(),
        }
    }
}

/// A custom font to register with the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontEntry {
    /// Font family name (e.g. "Inter", "Roboto").
    pub family: String,
    /// Base64-encoded font data, or a data URI (e.g. "data:font/ttf;base64,...").
    pub src: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

// ── Page setup ─────────────────────────────────────────────────

/// Page size, margins and orientation of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSetup {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub top_margin: Length,
    pub bottom_margin: Length,
    pub left_margin: Length,
    pub right_margin: Length,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            top_margin: Length::cm(2.5),
            bottom_margin: Length::cm(2.5),
            left_margin: Length::cm(2.5),
            right_margin: Length::cm(2.5),
        }
    }
}

impl PageSetup {
    /// Page (width, height) in points after applying the orientation.
    pub fn dimensions(&self) -> (f64, f64) {
        let (w, h) = self.page_size.dimensions();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    pub fn content_width(&self) -> f64 {
        let (w, _) = self.dimensions();
        w - self.left_margin.points() - self.right_margin.points()
    }

    pub fn content_height(&self) -> f64 {
        let (_, h) = self.dimensions();
        h - self.top_margin.points() - self.bottom_margin.points()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Standard page sizes in points (portrait).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    B5,
    Letter,
    Legal,
    Ledger,
    Tabloid,
    Custom {
        width: Length,
        height: Length,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (419.53, 595.28),
            PageSize::B5 => (498.9, 708.66),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Ledger => (1224.0, 792.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (width.points(), height.points()),
        }
    }
}

// ── Sections & blocks ──────────────────────────────────────────

/// A run of content sharing one page setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Falls back to the document's default page when absent.
    #[serde(default)]
    pub page_setup: Option<PageSetup>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Section {
    /// Page setup, creating an explicit one from the defaults on first use.
    pub fn page_setup_mut(&mut self) -> &mut PageSetup {
        self.page_setup.get_or_insert_with(PageSetup::default)
    }

    /// Append an empty paragraph.
    pub fn add_paragraph(&mut self) -> &mut Paragraph {
        self.blocks.push(Block::Paragraph(Paragraph::default()));
        match self.blocks.last_mut() {
            Some(Block::Paragraph(p)) => p,
            _ => unreachable!("just pushed a paragraph"),
        }
    }

    /// Append a paragraph holding a single text run.
    pub fn add_paragraph_text(&mut self, text: &str) -> &mut Paragraph {
        let p = self.add_paragraph();
        p.add_text(text);
        p
    }

    /// Append an empty table.
    pub fn add_table(&mut self) -> &mut Table {
        self.blocks.push(Block::Table(Table::default()));
        match self.blocks.last_mut() {
            Some(Block::Table(t)) => t,
            _ => unreachable!("just pushed a table"),
        }
    }

    pub fn add_page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }
}

/// Block-level content of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Forces the following content onto a new page.
    PageBreak,
}

/// A paragraph: inline runs plus paragraph formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub format: ParagraphFormat,
}

impl Paragraph {
    pub fn new(text: &str) -> Self {
        let mut p = Self::default();
        p.add_text(text);
        p
    }

    /// Append a run in the paragraph's font.
    pub fn add_text(&mut self, text: &str) -> &mut Self {
        self.runs.push(TextRun {
            text: text.to_string(),
            font: FontOverride::default(),
        });
        self
    }

    /// Append a run with its own font override.
    pub fn add_formatted_text(&mut self, text: &str, font: FontOverride) -> &mut Self {
        self.runs.push(TextRun {
            text: text.to_string(),
            font,
        });
        self
    }
}

/// An inline styled run within a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub font: FontOverride,
}

// ── Tables ─────────────────────────────────────────────────────

/// A table: columns are defined before rows; rows are dense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub format: TableFormat,
}

impl Table {
    /// Append a column. `None` shares the remaining width with other
    /// unsized columns.
    pub fn add_column(&mut self, width: Option<Length>) -> &mut Column {
        self.columns.push(Column { width });
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Append a row with one empty cell per column.
    pub fn add_row(&mut self) -> &mut Row {
        self.rows.push(Row {
            cells: vec![Cell::default(); self.columns.len()],
            format: RowFormat::default(),
        });
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }
}

/// Column definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub width: Option<Length>,
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub format: RowFormat,
}

impl Index<usize> for Row {
    type Output = Cell;

    fn index(&self, column: usize) -> &Cell {
        &self.cells[column]
    }
}

impl IndexMut<usize> for Row {
    fn index_mut(&mut self, column: usize) -> &mut Cell {
        &mut self.cells[column]
    }
}

/// A table cell anchored at one (row, column) position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub format: CellFormat,
    /// Number of cells to the right this cell absorbs.
    #[serde(default)]
    pub merge_right: usize,
    /// Number of rows below this cell absorbs.
    #[serde(default)]
    pub merge_down: usize,
}

impl Cell {
    pub fn add_paragraph(&mut self, text: &str) -> &mut Paragraph {
        self.paragraphs.push(Paragraph::new(text));
        let last = self.paragraphs.len() - 1;
        &mut self.paragraphs[last]
    }

    /// Whether the cell declares anything of its own.
    pub fn is_declared(&self) -> bool {
        !self.paragraphs.is_empty()
            || self.format.is_declared()
            || self.merge_right > 0
            || self.merge_down > 0
    }
}
