//! # Page-Aware Layout Engine
//!
//! The flow engine never lays content out on an infinitely tall canvas and
//! slices it afterwards. It opens a page with a known content box and, for
//! every block, asks the allocator whether it fits before placing it:
//!
//! 1. Paragraphs are composed into lines first, then placed in page-sized
//!    segments. The lines that have to stay together (the first line, the
//!    orphan lines, the whole paragraph for keep-together / keep-with-next)
//!    are reserved together with the space before, so a paragraph moves to
//!    the next page *with* its space before and never leaves it behind.
//! 2. Tables are measured once (column widths, row heights, merged boxes),
//!    then placed one row group at a time. Groups are never split; heading
//!    rows are repeated on every page the table continues onto.
//! 3. A block that cannot fit even on an empty page is placed anyway and
//!    recorded as an overflow. The allocator never opens a page while the
//!    current one is empty, so layout always terminates.
//!
//! The result is a [`LayoutPlan`]: page frames plus positioned drawables in
//! painter's order.

pub mod allocator;
pub mod page_break;
pub mod plan;
mod table;

pub use allocator::{PageAllocator, Placement};
pub use plan::{ContentRef, Drawable, LayoutPlan, Overflow, PageFrame, PlanEntry, Rect, TextDraw};

use crate::error::{MeasurementError, QuireError, TableLocation};
use crate::font::MetricsProvider;
use crate::model::validate::validate_document;
use crate::model::{Block, Document, Paragraph};
use crate::style::resolve::{resolve_borders, resolve_shading};
use crate::style::{Alignment, Edge, FontSpec, ParagraphFormat};
use crate::text::{compose_lines, Line, LineWidths, StyledRun};

use page_break::{decide_break, BreakDecision, BreakPolicy};

/// Tolerance for comparing accumulated heights against page bounds.
pub(crate) const EPSILON: f64 = 1e-6;

/// The main layout engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// Lay out a document. Tables are validated before any page is opened.
    pub fn layout(
        &self,
        document: &Document,
        metrics: &dyn MetricsProvider,
    ) -> Result<LayoutPlan, QuireError> {
        validate_document(document)?;
        let mut flow = Flow::new(document, metrics);
        flow.run()?;
        Ok(flow.finish())
    }
}

/// A paragraph broken into lines for a given width.
pub(crate) struct ComposedParagraph<'p> {
    format: &'p ParagraphFormat,
    /// Effective font of every run.
    fonts: Vec<FontSpec>,
    lines: Vec<Line>,
    /// Width between the left and right indents.
    width: f64,
}

impl ComposedParagraph<'_> {
    fn lines_height(&self) -> f64 {
        self.lines.iter().map(|l| l.height).sum()
    }

    /// Space before, lines and space after.
    fn height(&self) -> f64 {
        self.format.space_before.points() + self.lines_height() + self.format.space_after.points()
    }

    fn policy(&self) -> BreakPolicy {
        BreakPolicy::for_paragraph(self.format.widow_control, self.format.keep_together)
    }

    /// Space before plus the lines that must start on the same page: the
    /// orphan lines, or every line when the paragraph may not split.
    fn leading_height(&self) -> f64 {
        let format = self.format;
        let policy = self.policy();
        let n = self.lines.len();
        let head = if format.keep_together
            || format.keep_with_next
            || n < policy.orphans + policy.widows
        {
            n
        } else {
            policy.orphans
        };
        format.space_before.points() + self.lines[..head].iter().map(|l| l.height).sum::<f64>()
    }
}

/// State of one layout run.
struct Flow<'a> {
    document: &'a Document,
    metrics: &'a dyn MetricsProvider,
    alloc: PageAllocator,
    plan: LayoutPlan,
    default_border: f64,
}

impl<'a> Flow<'a> {
    fn new(document: &'a Document, metrics: &'a dyn MetricsProvider) -> Self {
        Self {
            document,
            metrics,
            alloc: PageAllocator::new(),
            plan: LayoutPlan::default(),
            default_border: document.defaults.border_width.points(),
        }
    }

    fn run(&mut self) -> Result<(), QuireError> {
        let document = self.document;
        for (si, section) in document.sections.iter().enumerate() {
            self.alloc.begin_section(si, document.page_setup_for(section));

            for (bi, block) in section.blocks.iter().enumerate() {
                match block {
                    Block::Paragraph(paragraph) => {
                        let next = if paragraph.format.keep_with_next {
                            self.block_leading_height(section.blocks.get(bi + 1))?
                        } else {
                            0.0
                        };
                        self.layout_paragraph(paragraph, si, bi, next)?;
                    }
                    Block::Table(table) => {
                        self.layout_table(
                            table,
                            TableLocation {
                                section: si,
                                block: bi,
                            },
                        )?;
                    }
                    Block::PageBreak => {
                        self.alloc.create_page();
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> LayoutPlan {
        let mut plan = self.plan;
        plan.pages = self.alloc.into_pages();
        plan.finish();
        plan
    }

    /// Height the next block needs at the bottom of the page for a
    /// keep-with-next paragraph to stay in front of it.
    fn block_leading_height(&self, block: Option<&Block>) -> Result<f64, QuireError> {
        match block {
            Some(Block::Paragraph(p)) if !p.format.page_break_before => {
                let comp = self.compose(p, &self.document.defaults.font, self.alloc.content_width())?;
                Ok(comp.leading_height())
            }
            Some(Block::Table(t)) => self.table_leading_height(t),
            _ => Ok(0.0),
        }
    }

    // ── Paragraphs ──────────────────────────────────────────────

    fn compose<'p>(
        &self,
        paragraph: &'p Paragraph,
        base: &FontSpec,
        width: f64,
    ) -> Result<ComposedParagraph<'p>, MeasurementError> {
        let format = &paragraph.format;
        let font = format.font.apply(base);
        let fonts: Vec<FontSpec> = paragraph.runs.iter().map(|r| r.font.apply(&font)).collect();

        let area = (width - format.left_indent.points() - format.right_indent.points()).max(0.0);
        let lines = {
            let runs: Vec<StyledRun> = paragraph
                .runs
                .iter()
                .zip(&fonts)
                .map(|(run, font)| StyledRun {
                    text: &run.text,
                    font,
                })
                .collect();
            compose_lines(
                self.metrics,
                &runs,
                &font,
                LineWidths {
                    first: area - format.first_line_indent.points(),
                    rest: area,
                },
                format.line_spacing,
            )?
        };

        Ok(ComposedParagraph {
            format,
            fonts,
            lines,
            width: area,
        })
    }

    fn layout_paragraph(
        &mut self,
        paragraph: &Paragraph,
        section: usize,
        block: usize,
        next_leading: f64,
    ) -> Result<(), QuireError> {
        let source = ContentRef::Paragraph { section, block };
        let format = &paragraph.format;
        let comp = self.compose(
            paragraph,
            &self.document.defaults.font,
            self.alloc.content_width(),
        )?;

        if format.page_break_before && !self.alloc.is_fresh() {
            self.alloc.create_page();
        }

        let heights: Vec<f64> = comp.lines.iter().map(|l| l.height).collect();
        let n = heights.len();
        let policy = comp.policy();

        let mut required = comp.leading_height();
        if format.keep_with_next {
            required += next_leading;
        }
        self.alloc.reserve(format.space_before.points(), required);

        let x = self.alloc.left();
        let mut idx = 0;
        let mut first_segment = true;
        while idx < n {
            let count = match decide_break(self.alloc.remaining(), &heights[idx..], policy) {
                BreakDecision::Place => n - idx,
                BreakDecision::Split {
                    lines_on_current_page,
                } => lines_on_current_page,
                BreakDecision::MoveToNextPage if self.alloc.is_fresh() => {
                    lines_that_fit(self.alloc.remaining(), &heights[idx..]).max(1)
                }
                BreakDecision::MoveToNextPage => 0,
            };
            if count == 0 {
                self.alloc.create_page();
                continue;
            }

            let page = self.alloc.page_index();
            let top = self.alloc.cursor();
            for i in idx..idx + count {
                let y = self.alloc.cursor();
                self.emit_line(page, x, &comp, i, y, source);
                self.alloc.advance(heights[i]);
            }
            let bottom = self.alloc.cursor();
            idx += count;

            self.emit_decoration(
                page,
                Rect::new(x + format.left_indent.points(), top, comp.width, bottom - top),
                format,
                first_segment,
                idx == n,
                source,
            );
            if bottom > self.alloc.bottom() + EPSILON {
                self.record_overflow(page, source, bottom - self.alloc.bottom());
            }

            first_segment = false;
            if idx < n {
                self.alloc.create_page();
            }
        }

        self.alloc.advance_clamped(format.space_after.points());
        Ok(())
    }

    /// Emit the text entries of one line whose box starts at `top`.
    fn emit_line(
        &mut self,
        page: usize,
        x: f64,
        comp: &ComposedParagraph,
        index: usize,
        top: f64,
        source: ContentRef,
    ) {
        let format = comp.format;
        let line = &comp.lines[index];
        let indent = if index == 0 {
            format.first_line_indent.points()
        } else {
            0.0
        };
        let slack = (comp.width - indent - line.width).max(0.0);
        let is_last = index + 1 == comp.lines.len();

        let (offset, word_spacing) = match format.alignment {
            Alignment::Left => (0.0, 0.0),
            Alignment::Center => (slack / 2.0, 0.0),
            Alignment::Right => (slack, 0.0),
            Alignment::Justify if !is_last && !line.hard_break && line.space_count > 0 => {
                (0.0, slack / line.space_count as f64)
            }
            Alignment::Justify => (0.0, 0.0),
        };

        let start = x + format.left_indent.points() + indent + offset;
        for frag in &line.fragments {
            let font = &comp.fonts[frag.run];
            let spaces = frag.text.matches(' ').count();
            let rect = Rect::new(
                start + frag.x + word_spacing * frag.spaces_before as f64,
                top,
                frag.width + word_spacing * spaces as f64,
                line.height,
            );
            self.plan.push(
                page,
                rect,
                Drawable::Text(TextDraw {
                    text: frag.text.clone(),
                    font: font.clone(),
                    color: font.color,
                    baseline: top + line.ascent,
                    word_spacing,
                }),
                source,
            );
        }
    }

    /// Paragraph shading and borders for one page segment.
    fn emit_decoration(
        &mut self,
        page: usize,
        rect: Rect,
        format: &ParagraphFormat,
        first_segment: bool,
        last_segment: bool,
        source: ContentRef,
    ) {
        if let Some(color) = resolve_shading(&[&format.shading]) {
            self.plan.push(page, rect, Drawable::Fill { color }, source);
        }
        let borders = resolve_borders(&[&format.borders], self.default_border);
        for (edge, resolved) in borders.drawn_edges() {
            let skip = match edge {
                Edge::Top => !first_segment,
                Edge::Bottom => !last_segment,
                Edge::Left | Edge::Right => false,
            };
            if skip {
                continue;
            }
            self.plan.push(
                page,
                rect,
                Drawable::Stroke {
                    edge,
                    width: resolved.width,
                    color: resolved.color,
                },
                source,
            );
        }
    }

    fn record_overflow(&mut self, page_index: usize, source: ContentRef, excess: f64) {
        log::warn!(
            "{:?} overflows page {} by {:.2}pt",
            source,
            page_index,
            excess
        );
        self.plan.overflows.push(Overflow {
            page_index,
            source,
            excess,
        });
    }
}

/// How many leading lines fit into `remaining`, ignoring split rules.
fn lines_that_fit(remaining: f64, heights: &[f64]) -> usize {
    let mut used = 0.0;
    heights
        .iter()
        .take_while(|&&h| {
            used += h;
            used <= remaining + EPSILON
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontMetrics;
    use crate::model::{Length, PageSetup, PageSize, Section};

    /// Every glyph 5pt wide, every line 10pt high with an 8pt ascent.
    struct Fixed;

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

    fn page(height: f64) -> PageSetup {
        PageSetup {
            page_size: PageSize::Custom {
                width: Length(100.0),
                height: Length(height),
            },
            top_margin: Length::ZERO,
            bottom_margin: Length::ZERO,
            left_margin: Length::ZERO,
            right_margin: Length::ZERO,
            ..Default::default()
        }
    }

    fn doc_with(height: f64, build: impl FnOnce(&mut Section)) -> Document {
        let mut doc = Document::new();
        doc.default_page = page(height);
        build(doc.add_section());
        doc
    }

    fn texts(plan: &LayoutPlan) -> Vec<(usize, f64, String)> {
        plan.entries
            .iter()
            .filter_map(|e| match &e.content {
                Drawable::Text(t) => Some((e.page_index, e.rect.y, t.text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_document_has_no_pages() {
        let plan = LayoutEngine::new().layout(&Document::new(), &Fixed).unwrap();
        assert!(plan.pages.is_empty());
        assert!(plan.entries.is_empty());
    }

    #[test]
    fn lines_wrap_and_stack() {
        // 20 chars per line
        let doc = doc_with(100.0, |s| {
            s.add_paragraph_text("aaaa bbbb cccc dddd eeee");
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        assert_eq!(
            texts(&plan),
            vec![
                (0, 0.0, "aaaa bbbb cccc dddd".to_string()),
                (0, 10.0, "eeee".to_string()),
            ]
        );
    }

    #[test]
    fn center_and_right_alignment() {
        let doc = doc_with(100.0, |s| {
            s.add_paragraph_text("ab").format.alignment = Alignment::Center;
            s.add_paragraph_text("ab").format.alignment = Alignment::Right;
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        let xs: Vec<f64> = plan.entries.iter().map(|e| e.rect.x).collect();
        assert_eq!(xs, vec![45.0, 90.0]);
    }

    #[test]
    fn justify_stretches_all_but_last_line() {
        let doc = doc_with(100.0, |s| {
            s.add_paragraph_text("aa bb cc dd ee ff ggg").format.alignment = Alignment::Justify;
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        let spacing: Vec<f64> = plan
            .entries
            .iter()
            .filter_map(|e| match &e.content {
                Drawable::Text(t) => Some(t.word_spacing),
                _ => None,
            })
            .collect();
        // "aa bb cc dd ee ff" is 85pt wide with 5 spaces
        assert_eq!(spacing.len(), 2);
        assert!((spacing[0] - 3.0).abs() < 1e-9);
        assert_eq!(spacing[1], 0.0);
    }

    #[test]
    fn widow_control_moves_two_lines() {
        // 9 lines fill the page, then a 3-line paragraph must not split 1/2
        let doc = doc_with(100.0, |s| {
            for _ in 0..9 {
                s.add_paragraph_text("x");
            }
            s.add_paragraph_text("a\nb\nc");
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        let t = texts(&plan);
        assert_eq!(t[9], (1, 0.0, "a".to_string()));
        assert_eq!(plan.pages.len(), 2);
    }

    #[test]
    fn without_widow_control_lines_split() {
        let doc = doc_with(100.0, |s| {
            for _ in 0..9 {
                s.add_paragraph_text("x");
            }
            s.add_paragraph_text("a\nb\nc").format.widow_control = false;
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        let t = texts(&plan);
        assert_eq!(t[9], (0, 90.0, "a".to_string()));
        assert_eq!(t[10], (1, 0.0, "b".to_string()));
    }

    #[test]
    fn keep_with_next_moves_both() {
        let doc = doc_with(100.0, |s| {
            for _ in 0..9 {
                s.add_paragraph_text("x");
            }
            s.add_paragraph_text("heading").format.keep_with_next = true;
            s.add_paragraph_text("body");
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        let t = texts(&plan);
        assert_eq!(t[9], (1, 0.0, "heading".to_string()));
        assert_eq!(t[10], (1, 10.0, "body".to_string()));
    }

    #[test]
    fn keep_with_next_reserves_the_orphan_lines_of_the_next_paragraph() {
        // heading plus one body line would fit, but the body keeps two lines together
        let doc = doc_with(100.0, |s| {
            for _ in 0..8 {
                s.add_paragraph_text("x");
            }
            s.add_paragraph_text("heading").format.keep_with_next = true;
            s.add_paragraph_text("a\nb\nc\nd");
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        let t = texts(&plan);
        assert_eq!(t[8], (1, 0.0, "heading".to_string()));
        assert_eq!(t[9], (1, 10.0, "a".to_string()));
    }

    #[test]
    fn page_break_before_and_page_break_blocks() {
        let doc = doc_with(100.0, |s| {
            s.add_paragraph_text("one");
            s.add_paragraph_text("two").format.page_break_before = true;
            s.add_page_break();
            s.add_paragraph_text("three");
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        let pages: Vec<usize> = texts(&plan).iter().map(|t| t.0).collect();
        assert_eq!(pages, vec![0, 1, 2]);
    }

    #[test]
    fn page_break_before_on_fresh_page_is_ignored() {
        let doc = doc_with(100.0, |s| {
            s.add_paragraph_text("first").format.page_break_before = true;
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        assert_eq!(plan.pages.len(), 1);
    }

    #[test]
    fn space_after_does_not_carry_over() {
        let doc = doc_with(100.0, |s| {
            s.add_paragraph_text("x").format.space_after = Length(500.0);
            s.add_paragraph_text("y");
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        assert_eq!(texts(&plan)[1], (1, 0.0, "y".to_string()));
    }

    #[test]
    fn paragraph_borders_per_segment() {
        let doc = doc_with(30.0, |s| {
            let p = s.add_paragraph_text("a\nb\nc\nd");
            p.format.borders = crate::style::Borders::visible();
            p.format.widow_control = false;
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        let strokes: Vec<(usize, Edge)> = plan
            .entries
            .iter()
            .filter_map(|e| match e.content {
                Drawable::Stroke { edge, .. } => Some((e.page_index, edge)),
                _ => None,
            })
            .collect();
        assert!(strokes.contains(&(0, Edge::Top)));
        assert!(!strokes.contains(&(0, Edge::Bottom)));
        assert!(!strokes.contains(&(1, Edge::Top)));
        assert!(strokes.contains(&(1, Edge::Bottom)));
        assert!(strokes.contains(&(1, Edge::Left)));
    }

    #[test]
    fn overflowing_line_is_recorded() {
        let doc = doc_with(5.0, |s| {
            s.add_paragraph_text("tall");
        });
        let plan = LayoutEngine::new().layout(&doc, &Fixed).unwrap();
        assert_eq!(plan.pages.len(), 1);
        assert_eq!(plan.overflows.len(), 1);
        assert!((plan.overflows[0].excess - 5.0).abs() < 1e-9);
    }

    #[test]
    fn lines_that_fit_counts_prefix() {
        assert_eq!(lines_that_fit(25.0, &[10.0, 10.0, 10.0]), 2);
        assert_eq!(lines_that_fit(0.0, &[10.0]), 0);
    }
}
