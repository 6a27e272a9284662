use std::collections::HashSet;

use quiz_core::model::QuestionId;
use services::normalize::normalize;
use services::source::parse_response;
use services::{IdentityShuffler, SeededShuffler};

const BATCH: &str = include_str!("fixtures/opentdb_batch.json");

#[test]
fn fixture_decodes_into_questions() {
    let raw = parse_response(BATCH).unwrap();
    let questions = normalize(&raw, &IdentityShuffler, 1_700_000_000_000).unwrap();

    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].text(), "Which company developed \"Portal\"?");
    assert_eq!(questions[0].category(), "Entertainment: Video Games");
    assert_eq!(questions[1].category(), "Science & Nature");
    assert_eq!(questions[2].text(), "Which city is known as \"La Ville Lumière\"?");
    assert_eq!(questions[2].difficulty(), "hard");
    assert_eq!(questions[2].id(), QuestionId::new(2, 1_700_000_000_000));
}

#[test]
fn shuffled_fixture_keeps_every_answer_once() {
    let raw = parse_response(BATCH).unwrap();
    let questions = normalize(&raw, &SeededShuffler::new(2024), 1).unwrap();

    for (question, source) in questions.iter().zip(&raw) {
        let options: HashSet<&str> = question.options().iter().map(String::as_str).collect();
        assert_eq!(options.len(), source.incorrect_answers.len() + 1);
        assert!(options.contains(question.correct_answer()));
        assert_eq!(
            question
                .options()
                .iter()
                .filter(|o| question.is_correct(o))
                .count(),
            1
        );
    }
}
