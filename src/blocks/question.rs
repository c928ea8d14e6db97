//! Question blocks: measurement and drawing of a single numbered question.

use log::debug;

use super::{cross_mark, DrawCommand, Flowable, FormWidget, Rect};
use crate::error::LayoutError;
use crate::layout::{
    self, CHOICE_TEXT_OFFSET, FIELD_INSET, LINE_SPACING, POINTS_MARGIN, RADIO_SIZE, SPACE_BETWEEN,
};
use crate::metrics::{wrap, TextMeasure, WrappedText};
use crate::model::{AnswerOption, ItemKind, QuizItem, RenderMode};
use crate::shuffle::{answer_label, canonical_order, ensure_labelable, AnswerShuffler};

/// Measurement inputs shared by every question block of a document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockStyle {
    /// Font size of all block text.
    pub font_size: u8,
    /// Width of the block in points.
    pub width: f64,
    /// Points awarded for a fully correct answer.
    pub max_points: u32,
}

/// One labeled option row of a multiple-choice block.
#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceRow {
    /// Label shown in front of the option, e.g. `b`.
    pub label: char,
    /// The option as stored, renumbered to its display position.
    pub option: AnswerOption,
    /// Wrapped `"b) text"` lines.
    pub lines: WrappedText,
    /// Height of the row.
    pub height: f64,
}

impl ChoiceRow {
    /// The labeled text of the row.
    pub fn labeled_text(&self) -> String {
        format!("{}) {}", self.label, self.option.text())
    }
}

/// Layout of the answer part of a question block.
#[derive(Clone, Debug, PartialEq)]
pub enum AnswerArea {
    /// A free-text area sized for the model answer.
    FreeText {
        /// Wrapped model answer.
        model_answer: WrappedText,
        /// Height of the area.
        height: f64,
    },
    /// Option rows in display order.
    Choice {
        /// Rows from top to bottom.
        rows: Vec<ChoiceRow>,
        /// Display position of the correct row, if the question has a known correct option.
        correct_position: Option<usize>,
    },
}

impl AnswerArea {
    /// Heights of the answer sections from top to bottom.
    pub fn heights(&self) -> Vec<f64> {
        match self {
            Self::FreeText { height, .. } => vec![*height],
            Self::Choice { rows, .. } => rows.iter().map(|row| row.height).collect(),
        }
    }

    /// Total height of the answer area.
    pub fn total_height(&self) -> f64 {
        self.heights().iter().sum()
    }
}

/// The `/max` label and point field pinned to the top-right corner of a graded block.
#[derive(Clone, Debug, PartialEq)]
pub struct PointsLabel {
    /// Maximum number of points.
    pub max_points: u32,
    /// Label text, e.g. `/2`.
    pub text: String,
    /// Measured width of the label.
    pub text_width: f64,
    /// Width of the point-entry field.
    pub field_width: f64,
}

impl PointsLabel {
    pub(crate) fn measure(
        measure: &dyn TextMeasure,
        max_points: u32,
        font_size: u8,
    ) -> PointsLabel {
        let text = format!("/{max_points}");
        PointsLabel {
            max_points,
            text_width: measure.text_width(&text, font_size),
            text,
            field_width: layout::points_field_width(max_points),
        }
    }

    /// Left edge of the label in a block of `width`.
    pub fn label_x(&self, width: f64) -> f64 {
        width - self.text_width
    }

    /// Rectangle of the point field in a block of `width`, on the row starting at `y`.
    pub fn field_rect(&self, width: f64, y: f64) -> Rect {
        let x = self.label_x(width) - POINTS_MARGIN - self.field_width;
        Rect::new(x, y, self.field_width, LINE_SPACING)
    }
}

/// A measured question block, ready to be placed.
///
/// All geometry is computed in [`RenderedBlock::build`]; drawing only reads it, so a block can be
/// drawn any number of times with identical results.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedBlock {
    number: usize,
    signature: String,
    mode: RenderMode,
    font_size: u8,
    width: f64,
    height: f64,
    stem: WrappedText,
    answer: AnswerArea,
    points: Option<PointsLabel>,
}

impl RenderedBlock {
    /// Measures `item` as question number `number`.
    ///
    /// When a shuffler is passed and the item has a known correct option, the options are
    /// shuffled with it; otherwise they keep their canonical order and the generator is untouched.
    pub fn build(
        item: &QuizItem,
        number: usize,
        mode: RenderMode,
        style: &BlockStyle,
        measure: &dyn TextMeasure,
        shuffler: Option<&mut AnswerShuffler>,
    ) -> Result<Self, LayoutError> {
        let question = item.question();
        let text_width = layout::answer_width(style.width);
        let stem = wrap(
            measure,
            &format!("{number}. {}", question.stem()),
            style.font_size,
            text_width,
        )?;

        let answer = match item.kind() {
            ItemKind::FreeText => {
                let model_answer =
                    wrap(measure, question.answer_text(), style.font_size, text_width)?;
                let height = layout::free_text_height(model_answer.line_count());
                AnswerArea::FreeText {
                    model_answer,
                    height,
                }
            }
            ItemKind::MultipleChoice => {
                ensure_labelable(question.signature(), item.options().len())?;
                let (options, correct_position) = match (item.correct_index(), shuffler) {
                    (Some(correct), Some(shuffler)) => {
                        match shuffler.shuffle(item.options(), correct) {
                            Some(shuffled) => {
                                (shuffled.options, Some(shuffled.correct_position))
                            }
                            None => (canonical_order(item.options()), None),
                        }
                    }
                    (correct, _) => {
                        let position = correct.and_then(|correct| {
                            item.options()
                                .iter()
                                .position(|option| option.index() == correct)
                        });
                        (canonical_order(item.options()), position)
                    }
                };

                let mut rows = Vec::with_capacity(options.len());
                for (position, option) in options.into_iter().enumerate() {
                    let label = answer_label(position).ok_or_else(|| {
                        LayoutError::TooManyOptions {
                            signature: question.signature().to_owned(),
                            count: item.options().len(),
                        }
                    })?;
                    let lines = wrap(
                        measure,
                        &format!("{label}) {}", option.text()),
                        style.font_size,
                        text_width,
                    )?;
                    let height = layout::choice_row_height(lines.line_count());
                    rows.push(ChoiceRow {
                        label,
                        option,
                        lines,
                        height,
                    });
                }

                AnswerArea::Choice {
                    rows,
                    correct_position,
                }
            }
        };

        let points = item
            .is_graded()
            .then(|| PointsLabel::measure(measure, style.max_points, style.font_size));
        let height = layout::block_height(stem.line_count(), &answer.heights());

        debug!(
            "Measured question {} ({}) for {:?}: {} stem lines, height {:.1}pt",
            number,
            question.signature(),
            mode,
            stem.line_count(),
            height
        );

        Ok(Self {
            number,
            signature: question.signature().to_owned(),
            mode,
            font_size: style.font_size,
            width: style.width,
            height,
            stem,
            answer,
            points,
        })
    }

    /// Question number shown in front of the stem.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Signature of the underlying question.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Document the block was measured for.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Width of the block.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Wrapped stem lines, including the number prefix.
    pub fn stem(&self) -> &WrappedText {
        &self.stem
    }

    /// Layout of the answer part.
    pub fn answer(&self) -> &AnswerArea {
        &self.answer
    }

    /// Point label of a graded block.
    pub fn points(&self) -> Option<&PointsLabel> {
        self.points.as_ref()
    }

    /// Labeled option texts in display order; empty for free-text blocks.
    pub fn option_texts(&self) -> Vec<String> {
        match &self.answer {
            AnswerArea::FreeText { .. } => Vec::new(),
            AnswerArea::Choice { rows, .. } => rows.iter().map(ChoiceRow::labeled_text).collect(),
        }
    }

    /// The revealed answer: the model answer, or the labeled correct option.
    pub fn solution_text(&self) -> Option<String> {
        match &self.answer {
            AnswerArea::FreeText { model_answer, .. } => {
                Some(model_answer.texts().collect::<Vec<_>>().join(" "))
            }
            AnswerArea::Choice {
                rows,
                correct_position,
            } => correct_position
                .and_then(|position| rows.get(position))
                .map(ChoiceRow::labeled_text),
        }
    }

    fn answer_top(&self) -> f64 {
        layout::stem_height(self.stem.line_count()) + SPACE_BETWEEN
    }

    fn text_lines(&self, lines: &WrappedText, x: f64, top: f64) -> Vec<DrawCommand> {
        lines
            .texts()
            .enumerate()
            .map(|(index, text)| DrawCommand::Text {
                x,
                y: top + index as f64 * LINE_SPACING,
                font_size: self.font_size,
                text: text.to_owned(),
            })
            .collect()
    }

    fn draw_free_text(&self, model_answer: &WrappedText, height: f64) -> Vec<DrawCommand> {
        let top = self.answer_top();
        match self.mode {
            RenderMode::Blank => vec![DrawCommand::Field {
                rect: Rect::new(FIELD_INSET, top, layout::answer_width(self.width), height),
                widget: FormWidget::Text {
                    name: format!("question_{}_answer", self.number),
                    value: String::new(),
                    multiline: true,
                    required: true,
                    max_len: None,
                    font_size: self.font_size,
                },
            }],
            RenderMode::Solution => self.text_lines(model_answer, FIELD_INSET, top),
        }
    }

    fn draw_choices(&self, rows: &[ChoiceRow], correct: Option<usize>) -> Vec<DrawCommand> {
        let mut commands = Vec::new();
        let mut row_top = self.answer_top();
        for (position, row) in rows.iter().enumerate() {
            let text_height = row.lines.line_count() as f64 * LINE_SPACING;
            let text_top = row_top + (row.height - text_height) / 2.0;
            commands.extend(self.text_lines(&row.lines, CHOICE_TEXT_OFFSET, text_top));

            let control = Rect::new(
                0.0,
                row_top + (row.height - RADIO_SIZE) / 2.0,
                RADIO_SIZE,
                RADIO_SIZE,
            );
            match self.mode {
                RenderMode::Blank => commands.push(DrawCommand::Field {
                    rect: control,
                    widget: FormWidget::Radio {
                        group: format!("question_{}", self.number),
                        export: row.label.to_string(),
                    },
                }),
                RenderMode::Solution if correct == Some(position) => {
                    commands.extend(cross_mark(control));
                }
                RenderMode::Solution => {}
            }
            row_top += row.height;
        }
        commands
    }

    fn draw_points(&self, points: &PointsLabel) -> Vec<DrawCommand> {
        let mut commands = vec![DrawCommand::Text {
            x: points.label_x(self.width),
            y: 0.0,
            font_size: self.font_size,
            text: points.text.clone(),
        }];
        if self.mode == RenderMode::Blank {
            commands.push(DrawCommand::Field {
                rect: points.field_rect(self.width, 0.0),
                widget: FormWidget::Text {
                    name: format!("question_{}_points", self.number),
                    value: String::new(),
                    multiline: false,
                    required: false,
                    max_len: Some(layout::digit_count(points.max_points) as u32),
                    font_size: self.font_size,
                },
            });
        }
        commands
    }
}

impl Flowable for RenderedBlock {
    fn height(&self) -> f64 {
        self.height
    }

    fn draw(&self) -> Vec<DrawCommand> {
        let mut commands = self.text_lines(&self.stem, 0.0, 0.0);
        commands.extend(match &self.answer {
            AnswerArea::FreeText {
                model_answer,
                height,
            } => self.draw_free_text(model_answer, *height),
            AnswerArea::Choice {
                rows,
                correct_position,
            } => self.draw_choices(rows, *correct_position),
        });
        if let Some(points) = &self.points {
            commands.extend(self.draw_points(points));
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{free_text_height, MIN_LINES, SPACE_BOTTOM};
    use crate::metrics::FixedWidthMeasure;
    use crate::model::Question;

    fn style() -> BlockStyle {
        BlockStyle {
            font_size: 9,
            width: 400.0,
            max_points: 2,
        }
    }

    fn choice_item(answer_index: Option<u32>) -> QuizItem {
        let question = Question::new("mc", 1, "Which restart follows?")
            .with_answer_text("Indirect free kick")
            .with_answer_index(answer_index);
        QuizItem::multiple_choice(
            question,
            vec![
                AnswerOption::new("mc", 0, "Penalty kick"),
                AnswerOption::new("mc", 1, "Indirect free kick"),
                AnswerOption::new("mc", 2, "Dropped ball"),
            ],
        )
    }

    fn fields(commands: &[DrawCommand]) -> Vec<&FormWidget> {
        commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Field { widget, .. } => Some(widget),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn short_free_text_answer_gets_the_minimum_area() {
        let item = QuizItem::free_text(
            Question::new("ft", 1, "What is the offside rule?").with_answer_text("Short."),
        );
        let block = RenderedBlock::build(
            &item,
            1,
            RenderMode::Blank,
            &style(),
            &FixedWidthMeasure::default(),
            None,
        )
        .expect("block builds");

        assert!(block.answer().total_height() >= MIN_LINES as f64 * LINE_SPACING);
        assert_eq!(
            block.height(),
            LINE_SPACING + SPACE_BETWEEN + free_text_height(1) + SPACE_BOTTOM
        );
    }

    #[test]
    fn blank_free_text_has_answer_and_point_fields() {
        let item = QuizItem::free_text(Question::new("ft", 1, "Explain").with_answer_text("x"));
        let block = RenderedBlock::build(
            &item,
            4,
            RenderMode::Blank,
            &style(),
            &FixedWidthMeasure::default(),
            None,
        )
        .expect("block builds");

        let commands = block.draw();
        let names: Vec<_> = fields(&commands)
            .into_iter()
            .map(FormWidget::field_name)
            .collect();
        assert_eq!(names, vec!["question_4_answer", "question_4_points"]);
    }

    #[test]
    fn solution_free_text_reveals_the_model_answer() {
        let item = QuizItem::free_text(
            Question::new("ft", 1, "Explain").with_answer_text("A player is offside if..."),
        );
        let block = RenderedBlock::build(
            &item,
            1,
            RenderMode::Solution,
            &style(),
            &FixedWidthMeasure::default(),
            None,
        )
        .expect("block builds");

        let commands = block.draw();
        assert!(fields(&commands).is_empty());
        assert!(commands.iter().any(|command| matches!(
            command,
            DrawCommand::Text { text, x, .. } if text == "A player is offside if..." && *x == FIELD_INSET
        )));
    }

    #[test]
    fn solution_letter_matches_the_shuffled_position() {
        let item = choice_item(Some(1));
        let mut shuffler = AnswerShuffler::from_seed(11);
        let block = RenderedBlock::build(
            &item,
            2,
            RenderMode::Solution,
            &style(),
            &FixedWidthMeasure::default(),
            Some(&mut shuffler),
        )
        .expect("block builds");

        let AnswerArea::Choice {
            rows,
            correct_position: Some(position),
        } = block.answer()
        else {
            panic!("expected a graded choice block");
        };
        assert_eq!(rows[*position].option.text(), "Indirect free kick");
        let label = answer_label(*position).expect("label exists");
        assert_eq!(
            block.solution_text(),
            Some(format!("{label}) Indirect free kick"))
        );
    }

    #[test]
    fn blank_choice_block_has_one_radio_per_option() {
        let item = choice_item(Some(0));
        let block = RenderedBlock::build(
            &item,
            3,
            RenderMode::Blank,
            &style(),
            &FixedWidthMeasure::default(),
            Some(&mut AnswerShuffler::from_seed(5)),
        )
        .expect("block builds");

        let commands = block.draw();
        let radios = fields(&commands)
            .into_iter()
            .filter(|widget| matches!(widget, FormWidget::Radio { group, .. } if group == "question_3"))
            .count();
        assert_eq!(radios, 3);
    }

    #[test]
    fn ungraded_choice_is_not_shuffled_or_scored() {
        let item = choice_item(None);
        let mut shuffler = AnswerShuffler::from_seed(5);
        let untouched = shuffler.clone();
        let block = RenderedBlock::build(
            &item,
            1,
            RenderMode::Solution,
            &style(),
            &FixedWidthMeasure::default(),
            Some(&mut shuffler),
        )
        .expect("block builds");

        assert_eq!(
            block.option_texts(),
            vec!["a) Penalty kick", "b) Indirect free kick", "c) Dropped ball"]
        );
        assert!(block.points().is_none());
        assert!(block.solution_text().is_none());
        assert!(!block
            .draw()
            .iter()
            .any(|command| matches!(command, DrawCommand::Line { .. })));
        assert_eq!(
            shuffler.shuffle(item.options(), 0),
            untouched.clone().shuffle(item.options(), 0)
        );
    }

    #[test]
    fn choice_rows_are_tall_enough_for_the_radio() {
        let item = choice_item(Some(2));
        let block = RenderedBlock::build(
            &item,
            1,
            RenderMode::Blank,
            &style(),
            &FixedWidthMeasure::default(),
            None,
        )
        .expect("block builds");

        for height in block.answer().heights() {
            assert!(height >= 1.1 * RADIO_SIZE);
        }
    }

    #[test]
    fn too_many_options_are_rejected() {
        let options: Vec<_> = (0..27)
            .map(|index| AnswerOption::new("big", index, "option"))
            .collect();
        let item = QuizItem::multiple_choice(
            Question::new("big", 1, "Many").with_answer_index(0),
            options,
        );
        let err = RenderedBlock::build(
            &item,
            1,
            RenderMode::Blank,
            &style(),
            &FixedWidthMeasure::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::TooManyOptions { count: 27, .. }));
    }
}
