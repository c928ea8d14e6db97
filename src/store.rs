//! Question storage consumed by document generation.
//!
//! Generation only needs two queries, captured by [`QuestionStore`].  [`MemoryStore`] is the
//! in-process implementation used by the command-line front end; it is filled from a JSON
//! [`QuestionSet`] and can write one back.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::model::{AnswerOption, Question, QuizItem};

/// Selects and orders questions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// Only questions of this group.
    pub group: Option<u32>,
    /// `Some(true)` keeps questions with a correct option index, `Some(false)` those without.
    pub multiple_choice: Option<bool>,
    /// Shuffles the result with this seed instead of keeping store order.
    pub randomize: Option<u64>,
}

impl QuestionFilter {
    /// A filter that matches every question in store order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to one group.
    pub fn in_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }

    /// Restricts the filter to questions with or without a correct option index.
    pub fn multiple_choice(mut self, multiple_choice: bool) -> Self {
        self.multiple_choice = Some(multiple_choice);
        self
    }

    /// Orders the result randomly using `seed`.
    pub fn randomized(mut self, seed: u64) -> Self {
        self.randomize = Some(seed);
        self
    }

    fn matches(&self, question: &Question) -> bool {
        if let Some(group) = self.group {
            if question.group_id() != group {
                return false;
            }
        }
        match self.multiple_choice {
            Some(wanted) => question.answer_index().is_some() == wanted,
            None => true,
        }
    }
}

/// Read access to stored questions.
pub trait QuestionStore {
    /// Questions matching `filter`, in store order unless the filter randomizes.
    fn list_questions(&self, filter: &QuestionFilter) -> Vec<Question>;

    /// Options of the question with `signature`, in canonical order.
    fn get_options(&self, signature: &str) -> Vec<AnswerOption>;
}

/// A named group of questions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionGroup {
    pub id: u32,
    pub name: String,
}

/// Serialized form of a store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(default)]
    pub groups: Vec<QuestionGroup>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

/// Errors raised while loading or saving a question set.
#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the file failed.
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The file is not a valid question set.
    Json(serde_json::Error),
    /// Two questions share a signature.
    DuplicateSignature(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Failed to access question set {}: {source}", path.display())
            }
            Self::Json(err) => write!(f, "Invalid question set: {err}"),
            Self::DuplicateSignature(signature) => {
                write!(f, "Question signature '{signature}' is used more than once")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::DuplicateSignature(_) => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Questions and options held in memory, keyed by signature and by group.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    groups: Vec<QuestionGroup>,
    questions: Vec<Question>,
    options: Vec<AnswerOption>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a question set, rejecting duplicate signatures.
    pub fn from_set(set: QuestionSet) -> Result<Self, StoreError> {
        let mut store = Self {
            groups: set.groups,
            ..Self::default()
        };
        for question in set.questions {
            if store.question(question.signature()).is_some() {
                return Err(StoreError::DuplicateSignature(question.signature().to_owned()));
            }
            store.questions.push(question);
        }
        store.options = set.options;
        Ok(store)
    }

    /// Parses a JSON question set.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Self::from_set(serde_json::from_str(json)?)
    }

    /// Loads a JSON question set from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json(&json)?;
        debug!(
            "Loaded {} questions from {}",
            store.questions.len(),
            path.display()
        );
        Ok(store)
    }

    /// Snapshot of the store contents.
    pub fn to_set(&self) -> QuestionSet {
        QuestionSet {
            groups: self.groups.clone(),
            questions: self.questions.clone(),
            options: self.options.clone(),
        }
    }

    /// Writes the store as pretty-printed JSON to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_set())?;
        fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Adds or renames a group.
    pub fn upsert_group(&mut self, id: u32, name: impl Into<String>) {
        let name = name.into();
        match self.groups.iter_mut().find(|group| group.id == id) {
            Some(group) => group.name = name,
            None => self.groups.push(QuestionGroup { id, name }),
        }
    }

    /// All groups in insertion order.
    pub fn groups(&self) -> &[QuestionGroup] {
        &self.groups
    }

    /// Stores `question` together with its options, replacing any question with the same signature.
    pub fn insert(&mut self, question: Question, options: Vec<AnswerOption>) {
        let signature = question.signature().to_owned();
        self.options
            .retain(|option| option.question_signature() != signature);
        self.options.extend(
            options
                .into_iter()
                .filter(|option| option.question_signature() == signature),
        );
        match self
            .questions
            .iter_mut()
            .find(|existing| existing.signature() == signature)
        {
            Some(existing) => *existing = question,
            None => self.questions.push(question),
        }
    }

    /// The question with `signature`.
    pub fn question(&self, signature: &str) -> Option<&Question> {
        self.questions
            .iter()
            .find(|question| question.signature() == signature)
    }

    /// Number of stored questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Removes the question with `signature` and its options.
    pub fn delete(&mut self, signature: &str) -> Option<Question> {
        let position = self
            .questions
            .iter()
            .position(|question| question.signature() == signature)?;
        self.options
            .retain(|option| option.question_signature() != signature);
        Some(self.questions.remove(position))
    }

    /// Removes a group with all of its questions and returns how many questions were removed.
    pub fn delete_group(&mut self, group: u32) -> usize {
        let signatures: Vec<String> = self
            .questions
            .iter()
            .filter(|question| question.group_id() == group)
            .map(|question| question.signature().to_owned())
            .collect();
        for signature in &signatures {
            self.delete(signature);
        }
        self.groups.retain(|existing| existing.id != group);
        signatures.len()
    }
}

impl QuestionStore for MemoryStore {
    fn list_questions(&self, filter: &QuestionFilter) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .questions
            .iter()
            .filter(|question| filter.matches(question))
            .cloned()
            .collect();
        if let Some(seed) = filter.randomize {
            questions.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        }
        questions
    }

    fn get_options(&self, signature: &str) -> Vec<AnswerOption> {
        let mut options: Vec<AnswerOption> = self
            .options
            .iter()
            .filter(|option| option.question_signature() == signature)
            .cloned()
            .collect();
        options.sort_by_key(AnswerOption::index);
        options
    }
}

impl QuizItem {
    /// Collects the questions matching `filter` into quiz items.
    ///
    /// With `multiple_choice` set, a question is asked as multiple choice when it has options;
    /// otherwise every question is asked as free text.
    pub fn collect(
        store: &dyn QuestionStore,
        filter: &QuestionFilter,
        multiple_choice: bool,
    ) -> Vec<QuizItem> {
        store
            .list_questions(filter)
            .into_iter()
            .map(|question| {
                if !multiple_choice {
                    return QuizItem::free_text(question);
                }
                let options = store.get_options(question.signature());
                if options.is_empty() {
                    QuizItem::free_text(question)
                } else {
                    QuizItem::multiple_choice(question, options)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKind;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.upsert_group(1, "Field of play");
        store.upsert_group(2, "Offside");
        store.insert(
            Question::new("1-1", 1, "How long is the pitch?").with_answer_text("90 to 120 m"),
            Vec::new(),
        );
        store.insert(
            Question::new("2-1", 2, "Is a player offside in their own half?").with_answer_index(1),
            vec![
                AnswerOption::new("2-1", 1, "No"),
                AnswerOption::new("2-1", 0, "Yes"),
            ],
        );
        store.insert(
            Question::new("2-2", 2, "What is the offside rule?")
                .with_answer_text("A player is offside if..."),
            Vec::new(),
        );
        store
    }

    fn signatures(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(Question::signature).collect()
    }

    #[test]
    fn filters_by_group_and_mode() {
        let store = store();
        let group = store.list_questions(&QuestionFilter::new().in_group(2));
        assert_eq!(signatures(&group), vec!["2-1", "2-2"]);

        let choice = store.list_questions(&QuestionFilter::new().multiple_choice(true));
        assert_eq!(signatures(&choice), vec!["2-1"]);

        let free = store.list_questions(&QuestionFilter::new().multiple_choice(false));
        assert_eq!(signatures(&free), vec!["1-1", "2-2"]);
    }

    #[test]
    fn randomized_order_depends_only_on_the_seed() {
        let store = store();
        let first = store.list_questions(&QuestionFilter::new().randomized(9));
        let second = store.list_questions(&QuestionFilter::new().randomized(9));
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn options_come_back_in_canonical_order() {
        let options = store().get_options("2-1");
        let texts: Vec<_> = options.iter().map(AnswerOption::text).collect();
        assert_eq!(texts, vec!["Yes", "No"]);
    }

    #[test]
    fn deleting_a_group_removes_its_questions_and_options() {
        let mut store = store();
        assert_eq!(store.delete_group(2), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get_options("2-1").is_empty());
        assert_eq!(store.groups().len(), 1);
    }

    #[test]
    fn insert_replaces_by_signature() {
        let mut store = store();
        store.insert(Question::new("1-1", 1, "Updated"), Vec::new());
        assert_eq!(store.len(), 3);
        assert_eq!(store.question("1-1").map(Question::stem), Some("Updated"));
    }

    #[test]
    fn collect_picks_the_item_kind() {
        let store = store();
        let items = QuizItem::collect(&store, &QuestionFilter::new(), true);
        let kinds: Vec<_> = items.iter().map(QuizItem::kind).collect();
        assert_eq!(
            kinds,
            vec![ItemKind::FreeText, ItemKind::MultipleChoice, ItemKind::FreeText]
        );

        let free = QuizItem::collect(&store, &QuestionFilter::new(), false);
        assert!(free.iter().all(|item| item.kind() == ItemKind::FreeText));
    }

    #[test]
    fn json_round_trip_preserves_the_set() {
        let store = store();
        let json = serde_json::to_string(&store.to_set()).expect("serialize");
        let reloaded = MemoryStore::from_json(&json).expect("parse");
        assert_eq!(reloaded.to_set(), store.to_set());
    }

    #[test]
    fn saved_file_loads_back_unchanged() {
        let directory =
            std::env::temp_dir().join(format!("quiz_forms_store_{}", std::process::id()));
        fs::create_dir_all(&directory).expect("create store directory");
        let path = directory.join("questions.json");

        let store = store();
        store.save(&path).expect("save store");
        let reloaded = MemoryStore::load(&path).expect("load store");
        assert_eq!(reloaded.to_set(), store.to_set());
        assert_eq!(reloaded.len(), store.len());

        fs::remove_dir_all(&directory).expect("clean up store directory");
    }

    #[test]
    fn loading_a_missing_file_names_the_path() {
        let path = std::env::temp_dir().join("quiz_forms_no_such_store.json");
        assert!(matches!(
            MemoryStore::load(&path),
            Err(StoreError::Io { path: reported, .. }) if reported == path
        ));
    }

    #[test]
    fn duplicate_signatures_are_rejected() {
        let set = QuestionSet {
            questions: vec![Question::new("a", 1, "x"), Question::new("a", 1, "y")],
            ..QuestionSet::default()
        };
        assert!(matches!(
            MemoryStore::from_set(set),
            Err(StoreError::DuplicateSignature(signature)) if signature == "a"
        ));
    }
}
