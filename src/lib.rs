//! Twin quiz documents: a fillable test form and its answer key.
//!
//! Both documents are measured up front, question by question, so they share the same block
//! heights, page breaks and multiple-choice option order.  The blank form carries AcroForm fields;
//! the answer key shows the model answers in their place.

pub mod assembler;
pub mod blocks;
pub mod builder;
pub mod demo;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod forms;
pub mod layout;
pub mod metrics;
pub mod model;
pub mod settings;
pub mod shuffle;
pub mod store;

pub use assembler::{generate_documents, plan_documents, render_documents, solution_path};
pub use error::{GenerateError, LayoutError};
pub use model::{AnswerOption, ImageSource, Question, QuizDocument, QuizItem, RenderMode};
pub use settings::FormSettings;
pub use shuffle::{entropy_seed, AnswerShuffler, ShuffleState};
pub use store::{MemoryStore, QuestionFilter, QuestionStore};
