//! # Renderer Adapters
//!
//! A renderer adapter turns a [`LayoutPlan`] into drawing calls. The flow
//! engine never talks to an adapter; [`replay`] walks a finished plan page
//! by page in painter's order and forwards each entry.
//!
//! Drawing state (current font, colors) belongs to the adapter and starts
//! over on every page.

use crate::error::QuireError;
use crate::layout::{Drawable, LayoutPlan, PageFrame, Rect, TextDraw};
use crate::style::{Color, Edge};

pub trait RendererAdapter {
    /// Start a page. Everything drawn until the next call lands on it.
    fn new_page(&mut self, frame: &PageFrame) -> Result<(), QuireError>;

    fn fill_rect(&mut self, rect: &Rect, color: Color) -> Result<(), QuireError>;

    /// Stroke one side of `rect`.
    fn stroke_edge(
        &mut self,
        rect: &Rect,
        edge: Edge,
        width: f64,
        color: Color,
    ) -> Result<(), QuireError>;

    fn draw_text(&mut self, rect: &Rect, text: &TextDraw) -> Result<(), QuireError>;

    /// Called once after the last page.
    fn finish(&mut self) -> Result<(), QuireError> {
        Ok(())
    }
}

/// Drive `adapter` through every page of `plan`.
pub fn replay<A: RendererAdapter + ?Sized>(
    plan: &LayoutPlan,
    adapter: &mut A,
) -> Result<(), QuireError> {
    let mut entries = plan.entries.iter().peekable();
    for frame in &plan.pages {
        adapter.new_page(frame)?;
        while let Some(entry) = entries.next_if(|e| e.page_index == frame.index) {
            match &entry.content {
                Drawable::Region => {}
                Drawable::Fill { color } => adapter.fill_rect(&entry.rect, *color)?,
                Drawable::Stroke { edge, width, color } => {
                    adapter.stroke_edge(&entry.rect, *edge, *width, *color)?
                }
                Drawable::Text(text) => adapter.draw_text(&entry.rect, text)?,
            }
        }
    }
    adapter.finish()
}

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NewPage(usize),
    Fill(Rect, Color),
    Stroke(Rect, Edge, f64),
    Text(Rect, String),
    Finish,
}

/// Adapter that records every call, for inspecting what a plan draws.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    pub commands: Vec<Command>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RendererAdapter for CommandRecorder {
    fn new_page(&mut self, frame: &PageFrame) -> Result<(), QuireError> {
        self.commands.push(Command::NewPage(frame.index));
        Ok(())
    }

    fn fill_rect(&mut self, rect: &Rect, color: Color) -> Result<(), QuireError> {
        self.commands.push(Command::Fill(*rect, color));
        Ok(())
    }

    fn stroke_edge(
        &mut self,
        rect: &Rect,
        edge: Edge,
        width: f64,
        _color: Color,
    ) -> Result<(), QuireError> {
        self.commands.push(Command::Stroke(*rect, edge, width));
        Ok(())
    }

    fn draw_text(&mut self, rect: &Rect, text: &TextDraw) -> Result<(), QuireError> {
        self.commands.push(Command::Text(*rect, text.text.clone()));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), QuireError> {
        self.commands.push(Command::Finish);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ContentRef;
    use crate::model::Orientation;
    use crate::style::FontSpec;

    const SRC: ContentRef = ContentRef::Paragraph {
        section: 0,
        block: 0,
    };

    fn frame(index: usize) -> PageFrame {
        PageFrame {
            index,
            width: 100.0,
            height: 100.0,
            orientation: Orientation::Portrait,
            content: Rect::new(0.0, 0.0, 100.0, 100.0),
            section: 0,
        }
    }

    #[test]
    fn replay_walks_pages_and_skips_regions() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        let mut plan = LayoutPlan {
            pages: vec![frame(0), frame(1), frame(2)],
            ..Default::default()
        };
        plan.push(
            1,
            r,
            Drawable::Text(TextDraw {
                text: "hi".to_string(),
                font: FontSpec::default(),
                color: Color::BLACK,
                baseline: 5.0,
                word_spacing: 0.0,
            }),
            SRC,
        );
        plan.push(1, r, Drawable::Region, SRC);
        plan.push(0, r, Drawable::Fill { color: Color::WHITE }, SRC);
        plan.finish();

        let mut rec = CommandRecorder::new();
        replay(&plan, &mut rec).unwrap();
        assert_eq!(
            rec.commands,
            vec![
                Command::NewPage(0),
                Command::Fill(r, Color::WHITE),
                Command::NewPage(1),
                Command::Text(r, "hi".to_string()),
                Command::NewPage(2),
                Command::Finish,
            ]
        );
    }
}
