//! Generation settings with their defaults.

use crate::shuffle::AnswerShuffler;

/// Font family used when none is configured.
pub const DEFAULT_FONT_FAMILY: &str = "LiberationSans";

/// Font size used when none is configured.
pub const DEFAULT_FONT_SIZE: u8 = 9;

/// Inserted between the file stem and extension of the answer key.
pub const DEFAULT_SOLUTION_SUFFIX: &str = "_SOLUTION";

/// Shown in the name row of the answer key.
pub const DEFAULT_SOLUTION_NAME: &str = "Model answer";

/// Points per graded question.
pub const DEFAULT_MAX_POINTS: u32 = 2;

const MM_PER_INCH: f64 = 25.4;
const PT_PER_INCH: f64 = 72.0;

/// Paper size and margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSetup {
    /// Paper width.
    pub width_mm: f64,
    /// Paper height.
    pub height_mm: f64,
    /// Margin applied on all four sides.
    pub margin_mm: f64,
}

impl PageSetup {
    /// A4 paper with 20 mm margins.
    pub const A4: PageSetup = PageSetup {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 20.0,
    };

    /// Width available to blocks, in points.
    pub fn content_width_pt(&self) -> f64 {
        (self.width_mm - 2.0 * self.margin_mm) * PT_PER_INCH / MM_PER_INCH
    }

    /// Height available to blocks on one page, in points.
    pub fn content_height_pt(&self) -> f64 {
        (self.height_mm - 2.0 * self.margin_mm) * PT_PER_INCH / MM_PER_INCH
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::A4
    }
}

/// Everything that configures a generation pass besides the questions themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct FormSettings {
    font_family: String,
    font_size: u8,
    shuffle: bool,
    seed: Option<u64>,
    solution_suffix: String,
    solution_name: String,
    max_points: u32,
    page: PageSetup,
    question_spacing_mm: f64,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            shuffle: true,
            seed: None,
            solution_suffix: DEFAULT_SOLUTION_SUFFIX.to_owned(),
            solution_name: DEFAULT_SOLUTION_NAME.to_owned(),
            max_points: DEFAULT_MAX_POINTS,
            page: PageSetup::A4,
            question_spacing_mm: 0.1 * MM_PER_INCH,
        }
    }
}

impl FormSettings {
    /// Creates settings with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Font family name, resolved against the font directories.
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Font size of question text.
    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    /// Whether multiple-choice options are shuffled.
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Fixed shuffle seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Suffix appended to the answer key's file stem.
    pub fn solution_suffix(&self) -> &str {
        &self.solution_suffix
    }

    /// Text shown in the answer key's name row.
    pub fn solution_name(&self) -> &str {
        &self.solution_name
    }

    /// Points per graded question.
    pub fn max_points(&self) -> u32 {
        self.max_points
    }

    /// Paper size and margins.
    pub fn page(&self) -> PageSetup {
        self.page
    }

    /// Vertical space inserted after every question block, in millimetres.
    pub fn question_spacing_mm(&self) -> f64 {
        self.question_spacing_mm
    }

    /// Sets the font family and returns the updated settings.
    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }

    /// Sets the font size and returns the updated settings.
    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = font_size;
        self
    }

    /// Enables or disables option shuffling and returns the updated settings.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Fixes the shuffle seed and returns the updated settings.
    pub fn with_seed(mut self, seed: impl Into<Option<u64>>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Sets the answer key suffix and returns the updated settings.
    pub fn with_solution_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.solution_suffix = suffix.into();
        self
    }

    /// Sets the answer key's name text and returns the updated settings.
    pub fn with_solution_name(mut self, name: impl Into<String>) -> Self {
        self.solution_name = name.into();
        self
    }

    /// Sets the points per question and returns the updated settings.
    pub fn with_max_points(mut self, max_points: u32) -> Self {
        self.max_points = max_points;
        self
    }

    /// Sets the page geometry and returns the updated settings.
    pub fn with_page(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
    }

    /// Sets the spacing between questions and returns the updated settings.
    pub fn with_question_spacing_mm(mut self, spacing: f64) -> Self {
        self.question_spacing_mm = spacing;
        self
    }

    /// Creates the shuffler for one generation pass.
    pub fn shuffler(&self) -> AnswerShuffler {
        match self.seed {
            Some(seed) => AnswerShuffler::from_seed(seed),
            None => AnswerShuffler::from_entropy(),
        }
    }

    /// Inter-question spacing in points.
    pub fn question_spacing_pt(&self) -> f64 {
        self.question_spacing_mm * PT_PER_INCH / MM_PER_INCH
    }

    /// Block measurement inputs derived from these settings.
    pub fn block_style(&self) -> crate::blocks::BlockStyle {
        crate::blocks::BlockStyle {
            font_size: self.font_size,
            width: self.page.content_width_pt(),
            max_points: self.max_points,
        }
    }
}
