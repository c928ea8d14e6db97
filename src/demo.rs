//! A small sample quiz used by the `sample` command and the rendering tests.

use std::path::{Path, PathBuf};

use crate::assembler::generate_documents;
use crate::error::GenerateError;
use crate::model::{AnswerOption, Question, QuizDocument, QuizItem};
use crate::settings::FormSettings;
use crate::store::{MemoryStore, QuestionFilter};

/// Title of the sample quiz.
pub const SAMPLE_TITLE: &str = "Laws of the Game";

/// A store with one free-text and one multiple-choice question about offside.
pub fn sample_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.upsert_group(11, "Offside");
    store.insert(
        Question::new("11-1", 11, "What is the offside rule?")
            .with_answer_text("A player is offside if..."),
        Vec::new(),
    );
    store.insert(
        Question::new(
            "11-2",
            11,
            "A player receives the ball directly from a throw-in while in an offside position. \
             What is the decision?",
        )
        .with_answer_index(1),
        vec![
            AnswerOption::new("11-2", 0, "Indirect free kick to the defending team"),
            AnswerOption::new("11-2", 1, "Play on, there is no offside offence from a throw-in"),
            AnswerOption::new("11-2", 2, "Retake the throw-in"),
        ],
    );
    store
}

/// The sample quiz, written to `output`.
pub fn sample_document(output: impl Into<PathBuf>) -> QuizDocument {
    let items = QuizItem::collect(&sample_store(), &QuestionFilter::new().in_group(11), true);
    QuizDocument::new(SAMPLE_TITLE, output).with_items(items)
}

/// Generates the sample quiz and its answer key.
pub fn run(output: &Path, settings: &FormSettings) -> Result<(PathBuf, PathBuf), GenerateError> {
    generate_documents(&sample_document(output), settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKind;

    #[test]
    fn sample_has_a_free_text_and_a_choice_question() {
        let document = sample_document("sample.pdf");
        let kinds: Vec<_> = document.items().iter().map(QuizItem::kind).collect();
        assert_eq!(kinds, vec![ItemKind::FreeText, ItemKind::MultipleChoice]);
        assert_eq!(document.items()[1].options().len(), 3);
        assert_eq!(document.items()[1].correct_index(), Some(1));
    }
}
