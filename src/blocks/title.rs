//! The fixed-layout header shown at the top of both documents.

use super::{DrawCommand, Flowable, FormWidget, Icon, Rect};
use crate::blocks::question::PointsLabel;
use crate::error::LayoutError;
use crate::layout::{
    BASE_ICON_SIZE, LINE_SPACING, NAME_FONT_SIZE, POINTS_MARGIN, TITLE_FONT_SIZE, TITLE_HEIGHT,
};
use crate::metrics::{wrap, TextMeasure, WrappedText};
use crate::model::RenderMode;

const TITLE_LINE_SPACING: f64 = 1.2 * TITLE_FONT_SIZE as f64;
const TITLE_BASELINE: f64 = 60.0;
const ICON_BASELINE: f64 = 30.0;
const NAME_ROW_BASELINE: f64 = 20.0;
const NAME_LABEL: &str = "Name:";

/// What goes into the name row.
#[derive(Clone, Debug, PartialEq)]
pub enum NameEntry {
    /// An empty field for the candidate to fill in.
    Field,
    /// Pre-filled text, used on the answer key.
    Filled(String),
}

/// The measured header block.
#[derive(Clone, Debug, PartialEq)]
pub struct TitleBlock {
    width: f64,
    mode: RenderMode,
    title: WrappedText,
    icon: Option<Icon>,
    name: NameEntry,
    total: PointsLabel,
}

impl TitleBlock {
    /// Measures the header for a document of `width` points.
    ///
    /// The blank copy gets an empty name field, the answer key shows `solution_name` instead.
    pub fn build(
        title: &str,
        icon: Option<Icon>,
        mode: RenderMode,
        solution_name: &str,
        total_points: u32,
        width: f64,
        measure: &dyn TextMeasure,
    ) -> Result<Self, LayoutError> {
        let title = wrap(measure, title, TITLE_FONT_SIZE, 2.0 / 3.0 * width)?;
        let name = match mode {
            RenderMode::Blank => NameEntry::Field,
            RenderMode::Solution => NameEntry::Filled(solution_name.to_owned()),
        };
        Ok(Self {
            width,
            mode,
            title,
            icon,
            name,
            total: PointsLabel::measure(measure, total_points, NAME_FONT_SIZE),
        })
    }

    /// Wrapped title lines.
    pub fn title(&self) -> &WrappedText {
        &self.title
    }

    /// Contents of the name row.
    pub fn name(&self) -> &NameEntry {
        &self.name
    }

    /// Point total shown next to the name row.
    pub fn total_points(&self) -> u32 {
        self.total.max_points
    }

    /// Whether an icon will be drawn.
    pub fn has_icon(&self) -> bool {
        self.icon.is_some()
    }

    /// Icon rectangle: scaled to fit the base size while keeping its aspect ratio.
    fn icon_rect(&self, icon: &Icon) -> Rect {
        let ratio = icon.aspect_ratio();
        let (width, height) = if ratio >= 1.0 {
            (BASE_ICON_SIZE, BASE_ICON_SIZE / ratio)
        } else {
            (BASE_ICON_SIZE * ratio, BASE_ICON_SIZE)
        };
        Rect::new(0.0, TITLE_HEIGHT - ICON_BASELINE - height, width, height)
    }
}

impl Flowable for TitleBlock {
    fn height(&self) -> f64 {
        TITLE_HEIGHT
    }

    fn draw(&self) -> Vec<DrawCommand> {
        let mut commands = Vec::new();

        if let Some(icon) = &self.icon {
            commands.push(DrawCommand::Image {
                rect: self.icon_rect(icon),
                icon: icon.clone(),
            });
        }

        let column_left = self.width / 6.0;
        let column_width = 2.0 / 3.0 * self.width;
        let title_top = (TITLE_HEIGHT
            - TITLE_BASELINE
            - self.title.line_count() as f64 * TITLE_LINE_SPACING)
            .max(0.0);
        for (index, line) in self.title.lines().iter().enumerate() {
            commands.push(DrawCommand::Text {
                x: column_left + (column_width - line.width).max(0.0) / 2.0,
                y: title_top + index as f64 * TITLE_LINE_SPACING,
                font_size: TITLE_FONT_SIZE,
                text: line.text.clone(),
            });
        }

        let row_top = TITLE_HEIGHT - NAME_ROW_BASELINE - LINE_SPACING;
        commands.push(DrawCommand::Text {
            x: 0.4 * self.width - 10.0,
            y: row_top,
            font_size: NAME_FONT_SIZE,
            text: NAME_LABEL.to_owned(),
        });

        let name_left = 0.4 * self.width + 30.0;
        let total_field = self.total.field_rect(self.width, row_top);
        match &self.name {
            NameEntry::Filled(name) => commands.push(DrawCommand::Text {
                x: name_left,
                y: row_top,
                font_size: NAME_FONT_SIZE,
                text: name.clone(),
            }),
            NameEntry::Field => {
                let name_width = (total_field.x - POINTS_MARGIN - name_left).max(LINE_SPACING);
                commands.push(DrawCommand::Field {
                    rect: Rect::new(name_left, row_top, name_width, LINE_SPACING),
                    widget: FormWidget::Text {
                        name: "name".to_owned(),
                        value: String::new(),
                        multiline: false,
                        required: true,
                        max_len: None,
                        font_size: NAME_FONT_SIZE,
                    },
                });
                let underline = row_top + LINE_SPACING - 1.0;
                commands.push(DrawCommand::Line {
                    from: (name_left + 1.0, underline),
                    to: (name_left + name_width - 1.0, underline),
                });
            }
        }

        if self.mode == RenderMode::Blank {
            commands.push(DrawCommand::Field {
                rect: total_field,
                widget: FormWidget::Text {
                    name: "total_points".to_owned(),
                    value: String::new(),
                    multiline: false,
                    required: false,
                    max_len: Some(crate::layout::digit_count(self.total.max_points) as u32),
                    font_size: NAME_FONT_SIZE,
                },
            });
        }
        commands.push(DrawCommand::Text {
            x: self.total.label_x(self.width),
            y: row_top,
            font_size: NAME_FONT_SIZE,
            text: self.total.text.clone(),
        });

        commands
    }
}
