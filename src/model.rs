//! Data structures describing the questions that make up a quiz.
//!
//! The record types mirror what the question store hands out and are serialization friendly, so a
//! question set can be kept as JSON next to the generated documents.  They intentionally avoid
//! referencing the rendering crate so they can be built by any frontend.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A stored quiz question.
///
/// The `answer_index` doubles as the multiple-choice marker: a question with a correct option
/// index can be asked as multiple choice, one without can only be asked as free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    signature: String,
    group_id: u32,
    stem: String,
    #[serde(default)]
    answer_text: String,
    #[serde(default)]
    answer_index: Option<u32>,
}

impl Question {
    /// Creates a free-text question without a model answer.
    pub fn new(signature: impl Into<String>, group_id: u32, stem: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            group_id,
            stem: stem.into(),
            answer_text: String::new(),
            answer_index: None,
        }
    }

    /// Returns the unique signature of the question.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns the group the question belongs to.
    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    /// Returns the question text.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Returns the model answer.
    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    /// Returns the canonical index of the correct option, if any.
    pub fn answer_index(&self) -> Option<u32> {
        self.answer_index
    }

    /// Sets the model answer and returns the updated question.
    pub fn with_answer_text(mut self, answer_text: impl Into<String>) -> Self {
        self.answer_text = answer_text.into();
        self
    }

    /// Sets the canonical index of the correct option and returns the updated question.
    pub fn with_answer_index(mut self, answer_index: impl Into<Option<u32>>) -> Self {
        self.answer_index = answer_index.into();
        self
    }
}

/// One selectable answer of a multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    question_signature: String,
    index: u32,
    text: String,
}

impl AnswerOption {
    /// Creates an option at canonical position `index` for the given question.
    pub fn new(question_signature: impl Into<String>, index: u32, text: impl Into<String>) -> Self {
        Self {
            question_signature: question_signature.into(),
            index,
            text: text.into(),
        }
    }

    /// Signature of the question this option belongs to.
    pub fn question_signature(&self) -> &str {
        &self.question_signature
    }

    /// Display index of the option.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Text of the option.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns a copy of this option moved to display position `index`.
    pub fn at_index(&self, index: u32) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }
}

/// How a question is asked on a particular quiz.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Answered in a free-text field.
    #[default]
    FreeText,
    /// Answered by picking one of the options.
    MultipleChoice,
}

/// A question selected for a quiz together with its options.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizItem {
    question: Question,
    options: Vec<AnswerOption>,
    kind: ItemKind,
}

impl QuizItem {
    /// Asks `question` as a free-text question.
    pub fn free_text(question: Question) -> Self {
        Self {
            question,
            options: Vec::new(),
            kind: ItemKind::FreeText,
        }
    }

    /// Asks `question` as a multiple-choice question with the given options.
    ///
    /// The options are kept in canonical order regardless of the order they are passed in.
    pub fn multiple_choice(question: Question, options: impl Into<Vec<AnswerOption>>) -> Self {
        let mut options = options.into();
        options.sort_by_key(AnswerOption::index);
        Self {
            question,
            options,
            kind: ItemKind::MultipleChoice,
        }
    }

    /// Returns the underlying question.
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Returns the options in canonical order.
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    /// Returns how the question is asked.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Canonical index of the correct option, provided it refers to one of the options.
    pub fn correct_index(&self) -> Option<u32> {
        let index = self.question.answer_index()?;
        self.options
            .iter()
            .any(|option| option.index() == index)
            .then_some(index)
    }

    /// Whether the item earns points: free-text items always do, multiple-choice items only when
    /// their correct option is known.
    pub fn is_graded(&self) -> bool {
        match self.kind {
            ItemKind::FreeText => true,
            ItemKind::MultipleChoice => self.correct_index().is_some(),
        }
    }
}

/// Sum of the points available across `items`.
pub fn total_points(items: &[QuizItem], max_points: u32) -> u32 {
    items.iter().filter(|item| item.is_graded()).count() as u32 * max_points
}

/// Human-readable summary of a selection, e.g. `3 questions selected (6 points)`.
pub fn selection_summary(items: &[QuizItem], max_points: u32) -> String {
    let noun = if items.len() == 1 {
        "question"
    } else {
        "questions"
    };
    format!(
        "{} {} selected ({} points)",
        items.len(),
        noun,
        total_points(items, max_points)
    )
}

/// Which of the twin documents a block is rendered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// The test form with interactive fields and no answers.
    Blank,
    /// The answer key with revealed answers and no fields.
    Solution,
}

/// Representation of image sources supported by the content model.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Image loaded from raw bytes.
    Bytes(Vec<u8>),
    /// Image referenced by a file path.
    Path(PathBuf),
}

impl ImageSource {
    /// Creates a new in-memory image from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Creates an image sourced from a file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }
}

/// Everything needed to produce one pair of twin documents.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizDocument {
    title: String,
    icon: Option<ImageSource>,
    items: Vec<QuizItem>,
    output: PathBuf,
}

impl QuizDocument {
    /// Creates a document with the given title that will be written to `output`.
    pub fn new(title: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            icon: None,
            items: Vec::new(),
            output: output.into(),
        }
    }

    /// Returns the title shown in the header.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the header icon, if any.
    pub fn icon(&self) -> Option<&ImageSource> {
        self.icon.as_ref()
    }

    /// Returns the items in display order.
    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    /// Returns the path of the blank test form.
    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    /// Sets the header icon and returns the updated document.
    pub fn with_icon(mut self, icon: impl Into<Option<ImageSource>>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Appends an item and returns the updated document.
    pub fn with_item(mut self, item: QuizItem) -> Self {
        self.items.push(item);
        self
    }

    /// Extends the document with multiple items and returns the updated instance.
    pub fn with_items<I>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = QuizItem>,
    {
        self.items.extend(items);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_question(answer_index: Option<u32>) -> QuizItem {
        let question = Question::new("q1", 1, "Pick one").with_answer_index(answer_index);
        QuizItem::multiple_choice(
            question,
            vec![
                AnswerOption::new("q1", 2, "third"),
                AnswerOption::new("q1", 0, "first"),
                AnswerOption::new("q1", 1, "second"),
            ],
        )
    }

    #[test]
    fn options_are_kept_in_canonical_order() {
        let item = choice_question(Some(1));
        let texts: Vec<_> = item.options().iter().map(AnswerOption::text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn correct_index_must_refer_to_an_option() {
        assert_eq!(choice_question(Some(1)).correct_index(), Some(1));
        assert_eq!(choice_question(Some(7)).correct_index(), None);
        assert!(!choice_question(None).is_graded());
    }

    #[test]
    fn ungraded_items_do_not_count_towards_the_total() {
        let items = vec![
            QuizItem::free_text(Question::new("f", 1, "Explain")),
            choice_question(Some(0)),
            choice_question(None),
        ];
        assert_eq!(total_points(&items, 2), 4);
        assert_eq!(selection_summary(&items, 2), "3 questions selected (4 points)");
    }
}
