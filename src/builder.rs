//! Document construction helpers: page geometry, margins, and the page-start hook.

use std::cell::Cell;
use std::rc::Rc;

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style;
use genpdf::{self, Margins, PageDecorator, Size};
use log::trace;

use crate::elements::{mm_from_f64, mm_to_f64};
use crate::settings::PageSetup;

/// Geometry of the page currently being filled, recorded by the page decorator.
///
/// Blocks use it to turn their block-local coordinates into absolute page coordinates for the
/// form widgets that are injected after rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageFrame {
    /// One-based number of the current page; zero before the first page starts.
    pub page: usize,
    /// Height of the content area below the top margin, in millimetres.
    pub content_height_mm: f64,
    /// Left margin in millimetres.
    pub left_mm: f64,
    /// Top margin in millimetres.
    pub top_mm: f64,
    /// Paper height in millimetres.
    pub paper_height_mm: f64,
}

/// Page frame shared between the decorator and the elements of one document.
pub type SharedFrame = Rc<Cell<PageFrame>>;

/// Builder for `genpdf::Document` instances laid out for quiz forms.
pub struct DocumentBuilder {
    page: PageSetup,
    font_size: u8,
    title: Option<String>,
}

impl DocumentBuilder {
    /// Creates a builder for pages of the given size and margins.
    pub fn new(page: PageSetup) -> Self {
        Self {
            page,
            font_size: crate::settings::DEFAULT_FONT_SIZE,
            title: None,
        }
    }

    /// Sets the font size documents start with.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    /// Sets the document metadata title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builds a configured `genpdf::Document` and the frame its decorator keeps up to date.
    pub fn build(self, font_family: FontFamily<FontData>) -> (genpdf::Document, SharedFrame) {
        let mut document = genpdf::Document::new(font_family);
        document.set_paper_size(Size::new(
            mm_from_f64(self.page.width_mm),
            mm_from_f64(self.page.height_mm),
        ));
        document.set_font_size(self.font_size);
        if let Some(title) = self.title {
            document.set_title(title);
        }

        let frame = SharedFrame::default();
        document.set_page_decorator(FramePageDecorator::new(self.page, frame.clone()));

        (document, frame)
    }
}

/// Applies the margins at the start of every page and records the resulting content frame.
struct FramePageDecorator {
    page: usize,
    setup: PageSetup,
    frame: SharedFrame,
}

impl FramePageDecorator {
    fn new(setup: PageSetup, frame: SharedFrame) -> Self {
        Self {
            page: 0,
            setup,
            frame,
        }
    }
}

impl PageDecorator for FramePageDecorator {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        _style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        area.add_margins(Margins::all(mm_from_f64(self.setup.margin_mm)));

        self.frame.set(PageFrame {
            page: self.page,
            content_height_mm: mm_to_f64(area.size().height),
            left_mm: self.setup.margin_mm,
            top_mm: self.setup.margin_mm,
            paper_height_mm: self.setup.height_mm,
        });
        trace!("Started page {}", self.page);

        Ok(area)
    }
}
