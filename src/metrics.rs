//! Wrapped-text measurement.
//!
//! Block heights are derived from line *counts*, so the measurer used while sizing blocks has to
//! agree with the renderer about where lines break.  [`FontCacheMeasure`] reads the widths from
//! the same `genpdf` font cache the documents are rendered with; [`FixedWidthMeasure`] is a
//! monospaced approximation that needs no font files.

use genpdf::fonts::FontCache;
use genpdf::style::Style;

use crate::elements::mm_to_pt;
use crate::error::LayoutError;

/// Measures the advance width of a single line of text.
pub trait TextMeasure {
    /// Width of `text` in points when set at `font_size`.
    fn text_width(&self, text: &str, font_size: u8) -> f64;
}

/// Text measurement backed by a `genpdf` font cache.
pub struct FontCacheMeasure<'a> {
    font_cache: &'a FontCache,
}

impl<'a> FontCacheMeasure<'a> {
    /// Measures with the default font family of `font_cache`.
    pub fn new(font_cache: &'a FontCache) -> Self {
        Self { font_cache }
    }
}

impl TextMeasure for FontCacheMeasure<'_> {
    fn text_width(&self, text: &str, font_size: u8) -> f64 {
        let style = Style::new().with_font_size(font_size);
        mm_to_pt(style.str_width(self.font_cache, text))
    }
}

/// Every character takes `advance` ems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedWidthMeasure {
    advance: f64,
}

impl FixedWidthMeasure {
    /// Creates a measurer where each character is `advance` ems wide.
    pub fn new(advance: f64) -> Self {
        Self { advance }
    }
}

impl Default for FixedWidthMeasure {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl TextMeasure for FixedWidthMeasure {
    fn text_width(&self, text: &str, font_size: u8) -> f64 {
        text.chars().count() as f64 * self.advance * f64::from(font_size)
    }
}

/// One wrapped output line together with its measured width in points.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedLine {
    /// The text of the line.
    pub text: String,
    /// Measured width of the line in points.
    pub width: f64,
}

/// The ordered lines produced by [`wrap`].
///
/// Never empty: wrapping an empty string yields a single empty line.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedText {
    lines: Vec<WrappedLine>,
}

impl WrappedText {
    /// Returns the wrapped lines in order.
    pub fn lines(&self) -> &[WrappedLine] {
        &self.lines
    }

    /// Number of wrapped lines, at least one.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Width of the widest line.
    pub fn max_width(&self) -> f64 {
        self.lines.iter().map(|line| line.width).fold(0.0, f64::max)
    }

    /// Iterates over the line strings.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }
}

/// Greedily wraps `text` into lines no wider than `max_width` points.
///
/// Explicit newlines always break.  Runs of whitespace collapse to a single space, and a word that
/// is wider than `max_width` on its own is kept whole on a line of its own.
pub fn wrap(
    measure: &dyn TextMeasure,
    text: &str,
    font_size: u8,
    max_width: f64,
) -> Result<WrappedText, LayoutError> {
    if !max_width.is_finite() || max_width <= 0.0 {
        return Err(LayoutError::InvalidWidth(max_width));
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }

            let candidate = format!("{current} {word}");
            if measure.text_width(&candidate, font_size) <= max_width {
                current = candidate;
            } else {
                let width = measure.text_width(&current, font_size);
                lines.push(WrappedLine {
                    text: std::mem::replace(&mut current, word.to_owned()),
                    width,
                });
            }
        }

        let width = measure.text_width(&current, font_size);
        lines.push(WrappedLine {
            text: current,
            width,
        });
    }

    // A trailing newline should not add a blank line, but an empty input keeps its single line.
    while lines.len() > 1 && lines.last().map_or(false, |line| line.text.is_empty()) {
        lines.pop();
    }

    Ok(WrappedText { lines })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure() -> FixedWidthMeasure {
        // 5pt per character at size 10.
        FixedWidthMeasure::new(0.5)
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        let wrapped = wrap(&measure(), "", 10, 100.0).expect("wrap succeeds");
        assert_eq!(wrapped.line_count(), 1);
        assert_eq!(wrapped.lines()[0].text, "");
        assert_eq!(wrapped.lines()[0].width, 0.0);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        // "alpha beta" is 10 chars = 50pt and fits; adding " gamma" would not.
        let wrapped = wrap(&measure(), "alpha beta gamma delta", 10, 50.0).expect("wrap succeeds");
        let lines: Vec<_> = wrapped.texts().collect();
        assert_eq!(lines, vec!["alpha beta", "gamma", "delta"]);
        assert_eq!(wrapped.max_width(), 50.0);
    }

    #[test]
    fn overlong_words_stay_whole() {
        let wrapped = wrap(&measure(), "a supercalifragilistic b", 10, 30.0).expect("wrap succeeds");
        let lines: Vec<_> = wrapped.texts().collect();
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn explicit_newlines_break() {
        let wrapped = wrap(&measure(), "one\n\ntwo\n", 10, 500.0).expect("wrap succeeds");
        let lines: Vec<_> = wrapped.texts().collect();
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn rejects_non_finite_width() {
        let err = wrap(&measure(), "text", 10, f64::NAN).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidWidth(width) if width.is_nan()));

        let err = wrap(&measure(), "text", 10, f64::INFINITY).unwrap_err();
        assert_eq!(err, LayoutError::InvalidWidth(f64::INFINITY));

        assert!(wrap(&measure(), "text", 10, 0.0).is_err());
    }
}
