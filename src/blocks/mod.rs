//! Self-measuring layout blocks and the drawing commands they emit.
//!
//! A block is measured once, up front, and afterwards only describes what to draw as a list of
//! [`DrawCommand`]s relative to its own top-left corner.  Placing the commands on a page is the job
//! of [`crate::elements::FlowableElement`].

pub mod question;
pub mod title;

pub use question::{AnswerArea, BlockStyle, ChoiceRow, PointsLabel, RenderedBlock};
pub use title::{NameEntry, TitleBlock};

use std::fmt;

use image::GenericImageView;

/// Axis-aligned rectangle in points, top-down from the block's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Distance from the block's left edge.
    pub x: f64,
    /// Distance from the block's top edge.
    pub y: f64,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A decoded header image.
#[derive(Clone)]
pub struct Icon {
    image: image::DynamicImage,
}

impl Icon {
    /// Wraps decoded image data.
    pub fn new(image: image::DynamicImage) -> Self {
        Self { image }
    }

    /// Pixel dimensions of the image.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Width divided by height; `1.0` for degenerate images.
    pub fn aspect_ratio(&self) -> f64 {
        match self.dimensions() {
            (width, height) if width > 0 && height > 0 => f64::from(width) / f64::from(height),
            _ => 1.0,
        }
    }

    /// Returns the decoded image.
    pub fn image(&self) -> &image::DynamicImage {
        &self.image
    }
}

impl fmt::Debug for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("Icon")
            .field("width", &width)
            .field("height", &height)
            .finish()
    }
}

impl PartialEq for Icon {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions() && self.image.to_bytes() == other.image.to_bytes()
    }
}

/// An interactive form widget.
#[derive(Clone, Debug, PartialEq)]
pub enum FormWidget {
    /// A text entry field.
    Text {
        /// Fully qualified field name.
        name: String,
        /// Initial value.
        value: String,
        /// Whether the field accepts several lines.
        multiline: bool,
        /// Whether the field must be filled in.
        required: bool,
        /// Maximum number of characters, if limited.
        max_len: Option<u32>,
        /// Font size used for entered text.
        font_size: u8,
    },
    /// One button of a radio group.
    Radio {
        /// Name shared by all buttons of the group.
        group: String,
        /// Value the group takes when this button is selected.
        export: String,
    },
}

impl FormWidget {
    /// Name of the field this widget belongs to.
    pub fn field_name(&self) -> &str {
        match self {
            Self::Text { name, .. } => name,
            Self::Radio { group, .. } => group,
        }
    }
}

/// A single drawing operation in block-local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// One line of text whose line box starts at `(x, y)`.
    Text {
        /// Distance from the block's left edge.
        x: f64,
        /// Distance from the block's top edge to the top of the line.
        y: f64,
        /// Font size of the text.
        font_size: u8,
        /// The text itself.
        text: String,
    },
    /// A straight stroke between two points.
    Line {
        /// Start point `(x, y)`.
        from: (f64, f64),
        /// End point `(x, y)`.
        to: (f64, f64),
    },
    /// An image scaled into `rect`.
    Image {
        /// Target rectangle.
        rect: Rect,
        /// Decoded image data.
        icon: Icon,
    },
    /// An interactive form widget occupying `rect`.
    Field {
        /// Widget rectangle.
        rect: Rect,
        /// Widget definition.
        widget: FormWidget,
    },
}

/// A block with a committed size that can describe its own drawing.
pub trait Flowable {
    /// Height of the block in points; fixed once the block has been measured.
    fn height(&self) -> f64;

    /// Drawing commands relative to the block's top-left corner.
    fn draw(&self) -> Vec<DrawCommand>;
}

/// Draws a cross inside `rect`, inset by a fifth of its size.
pub(crate) fn cross_mark(rect: Rect) -> [DrawCommand; 2] {
    let inset_x = rect.width / 5.0;
    let inset_y = rect.height / 5.0;
    let (left, right) = (rect.x + inset_x, rect.x + rect.width - inset_x);
    let (top, bottom) = (rect.y + inset_y, rect.y + rect.height - inset_y);
    [
        DrawCommand::Line {
            from: (left, top),
            to: (right, bottom),
        },
        DrawCommand::Line {
            from: (left, bottom),
            to: (right, top),
        },
    ]
}
