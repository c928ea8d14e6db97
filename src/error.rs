//! Error types shared by the layout and generation stages.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::forms::FormError;

/// Failures raised while measuring text and sizing blocks.
///
/// Every variant is fatal for the generation pass: the committed block heights drive pagination,
/// so a block that cannot be measured cannot be placed in either document.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The requested font family could not be resolved for measurement.
    UnknownFont(String),
    /// A wrap width was NaN, infinite, or not positive.
    InvalidWidth(f64),
    /// A multiple-choice question has more options than there are option labels.
    TooManyOptions {
        /// Signature of the offending question.
        signature: String,
        /// Number of options attached to the question.
        count: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFont(name) => write!(f, "Unknown font family '{name}'"),
            Self::InvalidWidth(width) => write!(f, "Cannot wrap text into a width of {width}"),
            Self::TooManyOptions { signature, count } => write!(
                f,
                "Question {signature} has {count} options, at most {} can be labeled",
                crate::shuffle::MAX_OPTIONS
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Errors surfaced by a document generation call.
#[derive(Debug)]
pub enum GenerateError {
    /// The font family could not be loaded from disk.
    FontLoad(genpdf::error::Error),
    /// Measuring or sizing a block failed.
    Layout(LayoutError),
    /// genpdf failed to paginate or render a document.
    Render(genpdf::error::Error),
    /// Injecting the interactive form fields failed.
    Forms(FormError),
    /// Writing an output artifact failed.
    Io {
        /// The artifact that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl From<LayoutError> for GenerateError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

impl From<FormError> for GenerateError {
    fn from(err: FormError) -> Self {
        Self::Forms(err)
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad(err) => write!(f, "Failed to load fonts: {err}"),
            Self::Layout(err) => write!(f, "Failed to lay out question blocks: {err}"),
            Self::Render(err) => write!(f, "Failed to render document: {err}"),
            Self::Forms(err) => write!(f, "Failed to add form fields: {err}"),
            Self::Io { path, source } => {
                write!(f, "Failed to write {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Render(err) => Some(err),
            Self::Layout(err) => Some(err),
            Self::Forms(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}
