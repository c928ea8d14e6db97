use quiz_forms::assembler::{plan_documents, TwinPlan};
use quiz_forms::blocks::{AnswerArea, DrawCommand, Flowable, FormWidget, RenderedBlock};
use quiz_forms::layout::{LINE_SPACING, MIN_LINES};
use quiz_forms::metrics::FixedWidthMeasure;
use quiz_forms::model::total_points;
use quiz_forms::{
    demo, AnswerOption, AnswerShuffler, FormSettings, LayoutError, Question, QuizDocument,
    QuizItem, RenderMode,
};

fn choice(signature: &str, answer_index: Option<u32>, texts: &[&str]) -> QuizItem {
    let options = texts
        .iter()
        .enumerate()
        .map(|(index, text)| AnswerOption::new(signature, index as u32, *text))
        .collect::<Vec<_>>();
    QuizItem::multiple_choice(
        Question::new(signature, 1, format!("Question {signature}")).with_answer_index(answer_index),
        options,
    )
}

fn plan(document: &QuizDocument, settings: &FormSettings) -> TwinPlan {
    plan_documents(
        document,
        settings,
        &FixedWidthMeasure::default(),
        &mut settings.shuffler(),
        None,
    )
    .expect("plan documents")
}

fn mixed_document(count: usize) -> QuizDocument {
    let items = (0..count).map(|index| {
        let signature = format!("q{index}");
        if index % 3 == 0 {
            QuizItem::free_text(
                Question::new(signature, 1, "Describe the restart").with_answer_text("Drop ball"),
            )
        } else {
            choice(
                &signature,
                Some((index % 4) as u32),
                &["alpha", "bravo", "charlie", "delta", "echo"],
            )
        }
    });
    QuizDocument::new("Mixed", "mixed.pdf").with_items(items)
}

fn radio_count(block: &RenderedBlock) -> usize {
    block
        .draw()
        .iter()
        .filter(|command| {
            matches!(
                command,
                DrawCommand::Field {
                    widget: FormWidget::Radio { .. },
                    ..
                }
            )
        })
        .count()
}

#[test]
fn both_documents_hold_the_same_questions_in_the_same_order() {
    let document = mixed_document(12);
    let plan = plan(&document, &FormSettings::new().with_seed(21));

    assert_eq!(plan.blank.questions.len(), 12);
    assert_eq!(plan.solution.questions.len(), 12);
    for (index, (blank, solution)) in plan
        .blank
        .questions
        .iter()
        .zip(&plan.solution.questions)
        .enumerate()
    {
        assert_eq!(blank.number(), index + 1);
        assert_eq!(blank.signature(), solution.signature());
        assert_eq!(blank.option_texts(), solution.option_texts());
        assert_eq!(blank.height(), solution.height());
        assert_eq!(blank.mode(), RenderMode::Blank);
        assert_eq!(solution.mode(), RenderMode::Solution);
    }
}

#[test]
fn shuffle_is_reproducible_from_a_captured_state() {
    let options: Vec<_> = ["w", "x", "y", "z"]
        .iter()
        .enumerate()
        .map(|(index, text)| AnswerOption::new("q", index as u32, *text))
        .collect();

    let mut shuffler = AnswerShuffler::from_seed(5);
    for correct in 0..4 {
        let state = shuffler.capture();
        let first = shuffler.shuffle(&options, correct).expect("correct option exists");

        // Unrelated draws in between must not matter once the state is restored.
        for _ in 0..3 {
            shuffler.shuffle(&options, 0);
        }
        shuffler.restore(&state);
        let second = shuffler.shuffle(&options, correct).expect("correct option exists");

        assert_eq!(first, second);
        assert_eq!(first.options[first.correct_position].text(), options[correct as usize].text());
    }
}

#[test]
fn solution_label_matches_the_shuffled_position() {
    let document = mixed_document(9);
    let plan = plan(&document, &FormSettings::new().with_seed(8));

    for block in &plan.solution.questions {
        let AnswerArea::Choice {
            rows,
            correct_position: Some(position),
        } = block.answer()
        else {
            continue;
        };
        let expected_label = char::from(b'a' + *position as u8);
        assert_eq!(rows[*position].label, expected_label);
        let solution = block.solution_text().expect("graded question has a solution");
        assert!(solution.starts_with(&format!("{expected_label}) ")));
    }
}

#[test]
fn seeded_plans_are_identical() {
    let document = mixed_document(6);
    let settings = FormSettings::new().with_seed(99);
    assert_eq!(plan(&document, &settings), plan(&document, &settings));
}

#[test]
fn height_grows_with_the_stem() {
    let settings = FormSettings::new();
    let mut previous = 0.0;
    for words in 1..40 {
        let stem = vec!["offside"; words].join(" ");
        let document = QuizDocument::new("Heights", "h.pdf").with_item(QuizItem::free_text(
            Question::new("h", 1, stem).with_answer_text("short"),
        ));
        let height = plan(&document, &settings).blank.questions[0].height();
        assert!(height >= previous, "height shrank at {words} words");
        previous = height;
    }
}

#[test]
fn free_text_answers_keep_a_writing_floor() {
    let document = QuizDocument::new("Floor", "f.pdf").with_item(QuizItem::free_text(
        Question::new("f", 1, "Why?").with_answer_text("Because."),
    ));
    let plan = plan(&document, &FormSettings::new());
    let area = plan.blank.questions[0].answer().total_height();
    assert!(area >= MIN_LINES as f64 * LINE_SPACING);
}

#[test]
fn sample_scenario_pairs_up() {
    let plan = plan(&demo::sample_document("sample.pdf"), &FormSettings::new().with_seed(4));

    let blank_mc = &plan.blank.questions[1];
    let solution_mc = &plan.solution.questions[1];
    assert_eq!(radio_count(blank_mc), 3);
    assert_eq!(radio_count(solution_mc), 0);
    assert_eq!(blank_mc.option_texts(), solution_mc.option_texts());

    let answer = solution_mc.solution_text().expect("correct option is known");
    assert!(answer.ends_with("Play on, there is no offside offence from a throw-in"));

    let free_text = plan.solution.questions[0].draw();
    assert!(free_text.iter().any(|command| matches!(
        command,
        DrawCommand::Text { text, .. } if text == "A player is offside if..."
    )));
}

#[test]
fn empty_question_list_still_plans_both_headers() {
    let document = QuizDocument::new("Nothing yet", "empty.pdf");
    let plan = plan(&document, &FormSettings::new());
    assert!(plan.blank.questions.is_empty());
    assert!(plan.solution.questions.is_empty());
    assert_eq!(plan.blank.title.total_points(), 0);
    assert_eq!(plan.solution.title.total_points(), 0);
}

#[test]
fn ungraded_choice_question_is_not_shuffled_or_scored() {
    let item = choice("u", None, &["one", "two", "three"]);
    let document = QuizDocument::new("Ungraded", "u.pdf").with_item(item.clone());
    let settings = FormSettings::new().with_seed(2);

    let plan = plan(&document, &settings);
    let blank = &plan.blank.questions[0];
    assert_eq!(blank.option_texts(), vec!["a) one", "b) two", "c) three"]);
    assert!(blank.points().is_none());
    assert_eq!(radio_count(blank), 3);
    assert!(plan.solution.questions[0].solution_text().is_none());
    assert_eq!(total_points(&[item], settings.max_points()), 0);
    assert_eq!(plan.blank.title.total_points(), 0);
}

#[test]
fn too_many_options_is_a_layout_error() {
    let texts: Vec<String> = (0..27).map(|index| format!("option {index}")).collect();
    let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
    let document =
        QuizDocument::new("Crowded", "c.pdf").with_item(choice("big", Some(0), &texts));

    let err = plan_documents(
        &document,
        &FormSettings::new(),
        &FixedWidthMeasure::default(),
        &mut AnswerShuffler::from_seed(1),
        None,
    )
    .expect_err("27 options cannot be labeled");
    assert!(matches!(
        err,
        LayoutError::TooManyOptions { count: 27, ref signature } if signature == "big"
    ));
}
