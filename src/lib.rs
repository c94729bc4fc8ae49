//! # Quire
//!
//! A document composition engine: it flows sections of paragraphs and
//! tables onto fixed-size pages.
//!
//! The page is the unit of layout. Every decision (where a line breaks,
//! whether a paragraph moves to the next page, which rows of a table stay
//! together) is made against the remaining space of a real page, so nothing
//! has to be sliced after the fact.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON or builders)
//!       ↓
//!   [model]    Document tree: sections, paragraphs, tables, formats
//!       ↓
//!   [style]    Resolve format inheritance (document → table → row → cell)
//!       ↓
//!   [layout]   Page-aware flow engine → LayoutPlan
//!       ↓
//!   [render]   Replay the plan through a RendererAdapter
//!       ↓
//!   [pdf]      One adapter: serialize to PDF bytes
//! ```
//!
//! Text measurement goes through the [`font::MetricsProvider`] trait, so the
//! layout engine can run against the built-in font metrics or any other
//! source of glyph widths.

pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod style;
pub mod text;

pub use error::{MeasurementError, QuireError, StructuralError};
pub use layout::{LayoutEngine, LayoutPlan};
pub use model::Document;
pub use render::{replay, RendererAdapter};

use font::FontContext;
use pdf::PdfWriter;

/// Lay out a document with the built-in font metrics plus any fonts the
/// document embeds.
pub fn layout(document: &Document) -> Result<LayoutPlan, QuireError> {
    let fonts = FontContext::from_document(document)?;
    LayoutEngine::new().layout(document, &fonts)
}

/// Render a document to PDF bytes.
///
/// This is the primary entry point. Takes a document tree and returns
/// the raw bytes of a valid PDF file.
pub fn render(document: &Document) -> Result<Vec<u8>, QuireError> {
    let fonts = FontContext::from_document(document)?;
    let plan = LayoutEngine::new().layout(document, &fonts)?;
    if !plan.overflows.is_empty() {
        log::warn!(
            "{} block(s) overflow their page; see the layout plan for details",
            plan.overflows.len()
        );
    }
    PdfWriter::write(&plan, &document.metadata, &fonts)
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>, QuireError> {
    let document: Document = serde_json::from_str(json)?;
    render(&document)
}

/// Lay out a JSON document and return the plan as pretty-printed JSON.
pub fn layout_json(json: &str) -> Result<String, QuireError> {
    let document: Document = serde_json::from_str(json)?;
    let plan = layout(&document)?;
    Ok(serde_json::to_string_pretty(&plan)?)
}
