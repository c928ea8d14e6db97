//! Fixed layout constants and the block height formulas.
//!
//! All lengths are PDF points (1/72 inch), measured top-down from the top edge of a block.

/// Vertical advance of one text line.
pub const LINE_SPACING: f64 = 14.0;

/// Free-text answer areas are never shorter than this many lines.
pub const MIN_LINES: usize = 3;

/// Edge length of a radio control.
pub const RADIO_SIZE: f64 = 20.0;

/// Gap between the stem and the answer area.
pub const SPACE_BETWEEN: f64 = 0.2 * LINE_SPACING;

/// Gap below the answer area.
pub const SPACE_BOTTOM: f64 = 0.4 * LINE_SPACING;

/// Share of the block width available to stem and answer text.
pub const ANSWER_WIDTH_RATIO: f64 = 0.9;

/// Horizontal inset of the free-text answer field (4 mm).
pub const FIELD_INSET: f64 = 4.0 * 72.0 / 25.4;

/// Offset of option text to the right of its radio control.
pub const CHOICE_TEXT_OFFSET: f64 = 1.25 * RADIO_SIZE;

/// Gap between a point field and its `/max` label.
pub const POINTS_MARGIN: f64 = 4.0;

/// Width reserved per digit in a point field.
pub const POINTS_DIGIT_WIDTH: f64 = LINE_SPACING / 1.5;

/// Height of the title block.
pub const TITLE_HEIGHT: f64 = 100.0;

/// Icons are scaled to fit a square of this edge length.
pub const BASE_ICON_SIZE: f64 = 70.0;

/// Font size of the document title.
pub const TITLE_FONT_SIZE: u8 = 14;

/// Font size of the name row in the title block.
pub const NAME_FONT_SIZE: u8 = 10;

/// Width available to stem and answer text in a block of `block_width`.
pub fn answer_width(block_width: f64) -> f64 {
    ANSWER_WIDTH_RATIO * block_width
}

/// Height of a question stem with `line_count` wrapped lines.
pub fn stem_height(line_count: usize) -> f64 {
    line_count as f64 * LINE_SPACING
}

/// Height of a free-text answer area: enough for the model answer, but never below the floor.
pub fn free_text_height(line_count: usize) -> f64 {
    line_count.max(MIN_LINES) as f64 * LINE_SPACING
}

/// Height of one multiple-choice row: its wrapped text or its radio control, whichever is taller.
pub fn choice_row_height(line_count: usize) -> f64 {
    (line_count as f64 * LINE_SPACING).max(1.1 * RADIO_SIZE)
}

/// Total height of a question block.
pub fn block_height(stem_lines: usize, answer_heights: &[f64]) -> f64 {
    stem_height(stem_lines) + SPACE_BETWEEN + answer_heights.iter().sum::<f64>() + SPACE_BOTTOM
}

/// Number of decimal digits in `value`.
pub fn digit_count(value: u32) -> usize {
    value.to_string().len()
}

/// Width of a point-entry field sized for `max_points`.
pub fn points_field_width(max_points: u32) -> f64 {
    POINTS_DIGIT_WIDTH * digit_count(max_points) as f64
}
