//! `genpdf` elements that place measured blocks on a page.
//!
//! This module converts between the point-based block geometry and `genpdf`'s millimetre units,
//! decodes header icons through the [`image`] crate, and implements [`genpdf::Element`] for any
//! [`Flowable`] so blocks can be handed to the `genpdf` paginator.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use image::GenericImageView;
use log::warn;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error, ErrorKind};
use genpdf::style::Style;
use genpdf::{render, Element, Mm, Position, RenderResult, Scale, Size};

use crate::blocks::{DrawCommand, Flowable, Icon, Rect};
use crate::builder::{PageFrame, SharedFrame};
use crate::forms::{FieldPlacement, PdfRect};
use crate::model::ImageSource;

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const PT_PER_INCH: f64 = 72.0;

// Rounding slack when comparing block heights against the remaining page height.
const FIT_TOLERANCE_MM: f64 = 1e-6;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts points to millimetres.
pub fn pt_to_mm(points: f64) -> f64 {
    points * MM_PER_INCH / PT_PER_INCH
}

/// Converts a `genpdf` length to points.
pub fn mm_to_pt(value: Mm) -> f64 {
    mm_to_f64(value) * PT_PER_INCH / MM_PER_INCH
}

fn mm_from_pt(points: f64) -> Mm {
    mm_from_f64(pt_to_mm(points))
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> (f64, f64) {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    (width_mm, height_mm)
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<image::DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode image from provided bytes")
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// Decodes a header icon, logging and skipping it when it cannot be read.
///
/// The alpha channel is dropped because `genpdf` only embeds opaque images.
pub fn load_icon(source: &ImageSource) -> Option<Icon> {
    let decoded = match source {
        ImageSource::Bytes(bytes) => decode_image_from_bytes(bytes),
        ImageSource::Path(path) => decode_image_from_path(path),
    };
    match decoded {
        Ok(image) => Some(Icon::new(image::DynamicImage::ImageRgb8(image.to_rgb8()))),
        Err(err) => {
            warn!("Rendering the title without an icon: {}", err);
            None
        }
    }
}

/// Form widgets collected while drawing one document.
#[derive(Clone, Debug, Default)]
pub struct FieldSink(Rc<RefCell<Vec<FieldPlacement>>>);

impl FieldSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, placement: FieldPlacement) {
        self.0.borrow_mut().push(placement);
    }

    /// Removes and returns all collected placements.
    pub fn take(&self) -> Vec<FieldPlacement> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// Places a [`Flowable`] as a single unbreakable unit.
///
/// If the block does not fit into what is left of the page, nothing is drawn and the element asks
/// for a new page.  A block taller than an empty page is an error.
pub struct FlowableElement<F> {
    flowable: F,
    frame: SharedFrame,
    fields: FieldSink,
}

impl<F: Flowable> FlowableElement<F> {
    /// Wraps `flowable` for a document whose decorator updates `frame`.
    pub fn new(flowable: F, frame: SharedFrame, fields: FieldSink) -> Self {
        Self {
            flowable,
            frame,
            fields,
        }
    }

    fn place_field(&self, frame: &PageFrame, consumed_mm: f64, rect: Rect) -> PdfRect {
        let left = (frame.left_mm * PT_PER_INCH / MM_PER_INCH) + rect.x;
        let top = (frame.paper_height_mm - frame.top_mm - consumed_mm) * PT_PER_INCH / MM_PER_INCH
            - rect.y;
        PdfRect {
            left,
            bottom: top - rect.height,
            right: left + rect.width,
            top,
        }
    }
}

impl<F: Flowable> Element for FlowableElement<F> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let frame = self.frame.get();
        let height_mm = pt_to_mm(self.flowable.height());
        let available_mm = mm_to_f64(area.size().height);

        if height_mm > available_mm + FIT_TOLERANCE_MM {
            if available_mm + FIT_TOLERANCE_MM >= frame.content_height_mm {
                return Err(Error::new(
                    format!(
                        "Block of {:.1} mm does not fit on an empty page of {:.1} mm",
                        height_mm, frame.content_height_mm
                    ),
                    ErrorKind::PageSizeExceeded,
                ));
            }
            let mut result = RenderResult::default();
            result.has_more = true;
            return Ok(result);
        }

        let consumed_mm = frame.content_height_mm - available_mm;
        for command in self.flowable.draw() {
            match command {
                DrawCommand::Text {
                    x,
                    y,
                    font_size,
                    text,
                } => {
                    let printed = area.print_str(
                        &context.font_cache,
                        Position::new(mm_from_pt(x), mm_from_pt(y)),
                        style.with_font_size(font_size),
                        &text,
                    )?;
                    if !printed {
                        warn!(
                            "Text line at {:.1}pt does not fit its block and was dropped: {:?}",
                            y, text
                        );
                    }
                }
                DrawCommand::Line { from, to } => {
                    area.draw_line(
                        vec![
                            Position::new(mm_from_pt(from.0), mm_from_pt(from.1)),
                            Position::new(mm_from_pt(to.0), mm_from_pt(to.1)),
                        ],
                        Style::new(),
                    );
                }
                DrawCommand::Image { rect, icon } => {
                    let (natural_width, natural_height) =
                        estimated_image_size(icon.image(), DEFAULT_IMAGE_DPI);
                    let mut image = Image::from_dynamic_image(icon.image().clone())?;
                    image.set_scale(Scale::new(
                        pt_to_mm(rect.width) / natural_width,
                        pt_to_mm(rect.height) / natural_height,
                    ));
                    let mut image_area = area.clone();
                    image_area.add_offset(Position::new(mm_from_pt(rect.x), mm_from_pt(rect.y)));
                    image.render(context, image_area, style)?;
                }
                DrawCommand::Field { rect, widget } => {
                    self.fields.push(FieldPlacement {
                        page: frame.page,
                        rect: self.place_field(&frame, consumed_mm, rect),
                        widget,
                    });
                }
            }
        }

        let mut result = RenderResult::default();
        result.size = Size::new(area.size().width, mm_from_f64(height_mm));
        Ok(result)
    }
}

/// Fixed vertical space between blocks; truncated at the bottom of a page.
pub struct VerticalSpace {
    height_mm: f64,
}

impl VerticalSpace {
    /// Creates a space of `points` height.
    pub fn from_points(points: f64) -> Self {
        Self {
            height_mm: pt_to_mm(points),
        }
    }
}

impl Element for VerticalSpace {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let height = self.height_mm.min(mm_to_f64(area.size().height)).max(0.0);
        let mut result = RenderResult::default();
        result.size = Size::new(0, mm_from_f64(height));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions_round_trip() {
        assert!((pt_to_mm(72.0) - 25.4).abs() < 1e-9);
        assert!((mm_to_pt(mm_from_f64(25.4)) - 72.0).abs() < 1e-9);
    }

    #[test]
    fn undecodable_icon_is_skipped() {
        assert!(load_icon(&ImageSource::from_bytes(vec![0u8, 1, 2, 3])).is_none());
        assert!(load_icon(&ImageSource::from_path("/__quiz_forms_missing_icon__.png")).is_none());
    }

    #[test]
    fn field_rectangles_use_pdf_coordinates() {
        let frame = PageFrame {
            page: 2,
            content_height_mm: 257.0,
            left_mm: 20.0,
            top_mm: 20.0,
            paper_height_mm: 297.0,
        };
        let element = FlowableElement::new(
            crate::blocks::TitleBlock::build(
                "t",
                None,
                crate::model::RenderMode::Blank,
                "",
                2,
                400.0,
                &crate::metrics::FixedWidthMeasure::default(),
            )
            .expect("title builds"),
            SharedFrame::default(),
            FieldSink::new(),
        );

        // A field 10pt below the top of a block that starts 25.4 mm into the content area.
        let rect = element.place_field(&frame, 25.4, Rect::new(5.0, 10.0, 30.0, 14.0));
        let expected_top = (297.0 - 20.0 - 25.4) * 72.0 / 25.4 - 10.0;
        assert!((rect.top - expected_top).abs() < 1e-9);
        assert!((rect.bottom - (expected_top - 14.0)).abs() < 1e-9);
        assert!((rect.left - (20.0 * 72.0 / 25.4 + 5.0)).abs() < 1e-9);
        assert!((rect.right - rect.left - 30.0).abs() < 1e-9);
    }
}
