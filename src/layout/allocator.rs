//! The page allocator: the vertical cursor of the current page and the
//! decision of when a new page is needed.

use crate::model::PageSetup;

use super::plan::{PageFrame, Rect};
use super::EPSILON;

/// Where a reservation landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_index: usize,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct PageAllocator {
    pages: Vec<PageFrame>,
    setup: PageSetup,
    section: usize,
    cursor: f64,
    occupied: bool,
}

impl Default for PageAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAllocator {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            setup: PageSetup::default(),
            section: 0,
            cursor: 0.0,
            occupied: false,
        }
    }

    /// Switch to a section's page setup and open its first page.
    pub fn begin_section(&mut self, section: usize, setup: PageSetup) -> usize {
        self.section = section;
        self.setup = setup;
        self.create_page()
    }

    /// Open a new page and move the cursor to its top margin.
    pub fn create_page(&mut self) -> usize {
        let (width, height) = self.setup.dimensions();
        let index = self.pages.len();
        self.pages.push(PageFrame {
            index,
            width,
            height,
            orientation: self.setup.orientation,
            content: Rect::new(
                self.setup.left_margin.points(),
                self.setup.top_margin.points(),
                self.setup.content_width(),
                self.setup.content_height(),
            ),
            section: self.section,
        });
        self.cursor = self.top();
        self.occupied = false;
        log::debug!("opened page {} (section {})", index, self.section);
        index
    }

    /// Index of the page the cursor is on.
    pub fn page_index(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn top(&self) -> f64 {
        self.setup.top_margin.points()
    }

    pub fn bottom(&self) -> f64 {
        self.top() + self.setup.content_height()
    }

    pub fn left(&self) -> f64 {
        self.setup.left_margin.points()
    }

    pub fn content_width(&self) -> f64 {
        self.setup.content_width()
    }

    pub fn content_height(&self) -> f64 {
        self.setup.content_height()
    }

    /// Space between the cursor and the bottom margin.
    pub fn remaining(&self) -> f64 {
        self.bottom() - self.cursor
    }

    /// Whether the current page holds no content yet.
    pub fn is_fresh(&self) -> bool {
        !self.occupied
    }

    /// Whether `height` fits below the cursor.
    pub fn fits(&self, height: f64) -> bool {
        self.cursor + height <= self.bottom() + EPSILON
    }

    /// Reserve `requested` points, making sure `required` points (the
    /// requested space plus whatever must follow it on the same page) fit.
    /// Opens a new page when they don't, unless the current page is still
    /// empty: then the content is placed and overflows.
    pub fn reserve(&mut self, requested: f64, required: f64) -> Placement {
        if !self.fits(required) && self.occupied {
            log::trace!(
                "reserve {:.2}/{:.2} does not fit ({:.2} left), new page",
                requested,
                required,
                self.remaining()
            );
            self.create_page();
        }
        let placement = Placement {
            page_index: self.page_index(),
            y: self.cursor,
        };
        self.cursor += requested;
        placement
    }

    /// Move past placed content.
    pub fn advance(&mut self, height: f64) {
        self.cursor += height;
        self.occupied = true;
    }

    /// Move past trailing space; never past the bottom margin.
    pub fn advance_clamped(&mut self, height: f64) {
        self.cursor = (self.cursor + height).min(self.bottom().max(self.cursor));
    }

    pub fn into_pages(self) -> Vec<PageFrame> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Length, PageSize};

    fn setup(height: f64) -> PageSetup {
        PageSetup {
            page_size: PageSize::Custom {
                width: Length(200.0),
                height: Length(height),
            },
            top_margin: Length(10.0),
            bottom_margin: Length(10.0),
            left_margin: Length(5.0),
            right_margin: Length(5.0),
            ..Default::default()
        }
    }

    fn allocator(height: f64) -> PageAllocator {
        let mut a = PageAllocator::new();
        a.begin_section(0, setup(height));
        a
    }

    #[test]
    fn first_page_starts_at_top_margin() {
        let a = allocator(120.0);
        assert_eq!(a.page_index(), 0);
        assert_eq!(a.cursor(), 10.0);
        assert_eq!(a.remaining(), 100.0);
        assert!(a.is_fresh());
    }

    #[test]
    fn reserve_fits_on_current_page() {
        let mut a = allocator(120.0);
        a.advance(50.0);
        let p = a.reserve(10.0, 50.0);
        assert_eq!(
            p,
            Placement {
                page_index: 0,
                y: 60.0
            }
        );
        assert_eq!(a.cursor(), 70.0);
    }

    #[test]
    fn reserve_opens_new_page_when_required_does_not_fit() {
        let mut a = allocator(120.0);
        a.advance(60.0);
        let p = a.reserve(10.0, 41.0);
        assert_eq!(
            p,
            Placement {
                page_index: 1,
                y: 10.0
            }
        );
        assert_eq!(a.cursor(), 20.0);
    }

    #[test]
    fn fresh_page_never_breaks() {
        let mut a = allocator(120.0);
        let p = a.reserve(0.0, 500.0);
        assert_eq!(p.page_index, 0);
        let p = a.reserve(0.0, 500.0);
        assert_eq!(p.page_index, 0);
    }

    #[test]
    fn space_after_is_clamped() {
        let mut a = allocator(120.0);
        a.advance(95.0);
        a.advance_clamped(20.0);
        assert_eq!(a.cursor(), 110.0);
        assert_eq!(a.remaining(), 0.0);
        assert_eq!(a.page_index(), 0);
    }

    #[test]
    fn section_pages_carry_their_setup() {
        let mut a = allocator(120.0);
        a.advance(10.0);
        a.begin_section(1, setup(300.0));
        let pages = a.into_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].section, 1);
        assert_eq!(pages[1].height, 300.0);
        assert_eq!(pages[1].content, Rect::new(5.0, 10.0, 190.0, 280.0));
    }
}
