//! Replayable shuffling of multiple-choice options.
//!
//! The blank form and the answer key are laid out independently but must agree on the option
//! order of every question.  The assembler captures the generator state before shuffling a
//! question for the blank form and restores it before shuffling the same question for the answer
//! key, so both draws produce the same permutation.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::model::AnswerOption;

/// Number of distinct option labels (`a` through `z`).
pub const MAX_OPTIONS: usize = 26;

/// Draws a fresh seed from the thread-local generator.
///
/// Used wherever no explicit seed is configured, so an unseeded run can still log or reuse it.
pub fn entropy_seed() -> u64 {
    rand::random()
}

/// Snapshot of the shuffle generator, restorable with [`AnswerShuffler::restore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShuffleState(ChaCha8Rng);

/// Options in display order after shuffling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShuffledOptions {
    /// Options sorted by display position; each option's index is its position.
    pub options: Vec<AnswerOption>,
    /// Display position of the correct option.
    pub correct_position: usize,
}

/// Explicitly seeded pseudo-random generator used for option shuffling.
#[derive(Clone, Debug)]
pub struct AnswerShuffler {
    rng: ChaCha8Rng,
}

impl AnswerShuffler {
    /// Creates a shuffler whose permutations are fully determined by `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a shuffler seeded from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self::from_seed(entropy_seed())
    }

    /// Captures the current generator state.
    pub fn capture(&self) -> ShuffleState {
        ShuffleState(self.rng.clone())
    }

    /// Rewinds the generator to a previously captured state.
    pub fn restore(&mut self, state: &ShuffleState) {
        self.rng = state.0.clone();
    }

    /// Shuffles `options` and tracks where the option with canonical index `correct_index` lands.
    ///
    /// The correct option is located by its position in `options`, not by its stored index.
    /// Returns `None` without drawing from the generator when no option carries `correct_index`.
    pub fn shuffle(
        &mut self,
        options: &[AnswerOption],
        correct_index: u32,
    ) -> Option<ShuffledOptions> {
        let old_position = options
            .iter()
            .position(|option| option.index() == correct_index)?;

        let mut new_positions: Vec<usize> = (0..options.len()).collect();
        new_positions.shuffle(&mut self.rng);

        let mut shuffled: Vec<AnswerOption> = options
            .iter()
            .zip(&new_positions)
            .map(|(option, &position)| option.at_index(position as u32))
            .collect();
        shuffled.sort_by_key(AnswerOption::index);

        Some(ShuffledOptions {
            options: shuffled,
            correct_position: new_positions[old_position],
        })
    }
}

/// Puts `options` in canonical order and renumbers them by position.
pub fn canonical_order(options: &[AnswerOption]) -> Vec<AnswerOption> {
    let mut ordered = options.to_vec();
    ordered.sort_by_key(AnswerOption::index);
    ordered
        .iter()
        .enumerate()
        .map(|(position, option)| option.at_index(position as u32))
        .collect()
}

/// Label of the option shown at `position`: `a`, `b`, `c`, ...
pub fn answer_label(position: usize) -> Option<char> {
    (position < MAX_OPTIONS).then(|| char::from(b'a' + position as u8))
}

/// Checks that every option of a question can be labeled.
pub fn ensure_labelable(signature: &str, count: usize) -> Result<(), LayoutError> {
    if count > MAX_OPTIONS {
        Err(LayoutError::TooManyOptions {
            signature: signature.to_owned(),
            count,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(count: u32) -> Vec<AnswerOption> {
        (0..count)
            .map(|index| AnswerOption::new("q", index * 10, format!("option {index}")))
            .collect()
    }

    #[test]
    fn restored_state_replays_the_same_permutation() {
        let mut shuffler = AnswerShuffler::from_seed(7);
        let input = options(5);

        let state = shuffler.capture();
        let first = shuffler.shuffle(&input, 20).expect("correct option exists");

        // Unrelated draws in between must not matter once the state is restored.
        for _ in 0..3 {
            shuffler.shuffle(&options(4), 0);
        }

        shuffler.restore(&state);
        let second = shuffler.shuffle(&input, 20).expect("correct option exists");
        assert_eq!(first, second);
    }

    #[test]
    fn output_is_contiguous_and_tracks_the_correct_option() {
        let mut shuffler = AnswerShuffler::from_seed(99);
        let input = options(4);
        let shuffled = shuffler.shuffle(&input, 30).expect("correct option exists");

        let positions: Vec<u32> = shuffled.options.iter().map(AnswerOption::index).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert_eq!(
            shuffled.options[shuffled.correct_position].text(),
            "option 3"
        );

        let mut texts: Vec<_> = shuffled.options.iter().map(|o| o.text().to_owned()).collect();
        texts.sort();
        let mut expected: Vec<_> = input.iter().map(|o| o.text().to_owned()).collect();
        expected.sort();
        assert_eq!(texts, expected);
    }

    #[test]
    fn missing_correct_option_skips_shuffling() {
        let mut shuffler = AnswerShuffler::from_seed(1);
        let before = shuffler.capture();
        assert!(shuffler.shuffle(&options(3), 5).is_none());

        // Nothing was drawn, so a fresh shuffle matches one from the untouched state.
        let mut replay = AnswerShuffler::from_seed(1);
        replay.restore(&before);
        assert_eq!(
            shuffler.shuffle(&options(3), 0),
            replay.shuffle(&options(3), 0)
        );
    }

    #[test]
    fn state_survives_serialization() {
        let mut shuffler = AnswerShuffler::from_seed(3);
        shuffler.shuffle(&options(6), 0);
        let json = serde_json::to_string(&shuffler.capture()).expect("serialize state");

        let expected = shuffler.shuffle(&options(6), 10);
        let state: ShuffleState = serde_json::from_str(&json).expect("deserialize state");
        shuffler.restore(&state);
        assert_eq!(shuffler.shuffle(&options(6), 10), expected);
    }

    #[test]
    fn entropy_seeds_vary() {
        let seeds: std::collections::HashSet<u64> = (0..8).map(|_| entropy_seed()).collect();
        assert!(seeds.len() > 1);
    }

    #[test]
    fn labels_follow_the_alphabet() {
        assert_eq!(answer_label(0), Some('a'));
        assert_eq!(answer_label(2), Some('c'));
        assert_eq!(answer_label(25), Some('z'));
        assert_eq!(answer_label(26), None);
        assert!(ensure_labelable("q", 26).is_ok());
        assert!(ensure_labelable("q", 27).is_err());
    }

    #[test]
    fn canonical_order_renumbers_by_position() {
        let ordered = canonical_order(&[
            AnswerOption::new("q", 5, "late"),
            AnswerOption::new("q", 1, "early"),
        ]);
        assert_eq!(ordered[0].text(), "early");
        assert_eq!(ordered[0].index(), 0);
        assert_eq!(ordered[1].index(), 1);
    }
}
