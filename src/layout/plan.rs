//! The Layout Plan: page frames plus page-tagged, positioned drawables.
//!
//! Entries are appended in flow order. [`LayoutPlan::finish`] puts them in
//! painter's order: by page, then regions, fills, strokes and text, keeping
//! flow order within each layer.

use serde::Serialize;

use crate::model::Orientation;
use crate::style::{Color, Edge, FontSpec};

/// An axis-aligned box in page space (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// One page of output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFrame {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub orientation: Orientation,
    /// The area inside the margins.
    pub content: Rect,
    /// Section the page belongs to.
    pub section: usize,
}

/// A line of text to draw. The entry's rect is the line box; `baseline` is
/// the absolute y of the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDraw {
    pub text: String,
    pub font: FontSpec,
    pub color: Color,
    pub baseline: f64,
    /// Extra width added to every space (justified lines).
    pub word_spacing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Drawable {
    /// The box of a table cell. Draws nothing by itself.
    Region,
    Fill {
        color: Color,
    },
    Stroke {
        edge: Edge,
        width: f64,
        color: Color,
    },
    Text(TextDraw),
}

impl Drawable {
    /// Painting layer: shading under borders under text.
    pub fn layer(&self) -> u8 {
        match self {
            Drawable::Region => 0,
            Drawable::Fill { .. } => 1,
            Drawable::Stroke { .. } => 2,
            Drawable::Text(_) => 3,
        }
    }
}

/// The document node an entry was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentRef {
    Paragraph {
        section: usize,
        block: usize,
    },
    Cell {
        section: usize,
        block: usize,
        row: usize,
        column: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub page_index: usize,
    pub rect: Rect,
    pub content: Drawable,
    pub source: ContentRef,
}

/// Content that did not fit a page even on its own. It is placed anyway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overflow {
    pub page_index: usize,
    pub source: ContentRef,
    /// How far the content reaches past the bottom margin, in points.
    pub excess: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPlan {
    pub pages: Vec<PageFrame>,
    pub entries: Vec<PlanEntry>,
    pub overflows: Vec<Overflow>,
}

impl LayoutPlan {
    pub fn push(&mut self, page_index: usize, rect: Rect, content: Drawable, source: ContentRef) {
        self.entries.push(PlanEntry {
            page_index,
            rect,
            content,
            source,
        });
    }

    /// Sort entries into painter's order.
    pub fn finish(&mut self) {
        self.entries
            .sort_by_key(|e| (e.page_index, e.content.layer()));
    }

    /// Entries of one page.
    pub fn page_entries(&self, page_index: usize) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(move |e| e.page_index == page_index)
    }

    /// Cell regions of a table, in plan order.
    pub fn regions(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.content, Drawable::Region))
    }

    /// Text entries produced for one source node.
    pub fn texts_of(&self, source: ContentRef) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(move |e| e.source == source && matches!(e.content, Drawable::Text(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: ContentRef = ContentRef::Paragraph {
        section: 0,
        block: 0,
    };

    fn text(s: &str) -> Drawable {
        Drawable::Text(TextDraw {
            text: s.to_string(),
            font: FontSpec::default(),
            color: Color::BLACK,
            baseline: 0.0,
            word_spacing: 0.0,
        })
    }

    #[test]
    fn finish_orders_by_page_then_layer() {
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        let mut plan = LayoutPlan::default();
        plan.push(1, r, text("b"), SRC);
        plan.push(0, r, text("a"), SRC);
        plan.push(
            0,
            r,
            Drawable::Stroke {
                edge: Edge::Top,
                width: 1.0,
                color: Color::BLACK,
            },
            SRC,
        );
        plan.push(0, r, Drawable::Fill { color: Color::BLACK }, SRC);
        plan.push(0, r, text("c"), SRC);
        plan.finish();

        let layers: Vec<_> = plan
            .entries
            .iter()
            .map(|e| (e.page_index, e.content.layer()))
            .collect();
        assert_eq!(layers, vec![(0, 1), (0, 2), (0, 3), (0, 3), (1, 3)]);
        // flow order survives within a layer
        assert_eq!(plan.entries[2].content, text("a"));
        assert_eq!(plan.entries[3].content, text("c"));
    }

    #[test]
    fn plan_serializes_to_json() {
        let mut plan = LayoutPlan::default();
        plan.push(0, Rect::new(1.0, 2.0, 3.0, 4.0), Drawable::Region, SRC);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["entries"][0]["content"]["kind"], "region");
        assert_eq!(json["entries"][0]["pageIndex"], 0);
    }
}
