use std::collections::BTreeMap;

use super::super::domain::{AnswerKey, CategorizeKey, ClozeKey, ComprehensionKey, QuestionKind};
use super::normalizer::NormalizedAnswer;
use super::ScoringError;

/// Correctness ratio in `[0, 1]` for one question before weighting.
pub(crate) fn fraction(key: &AnswerKey, answer: &NormalizedAnswer) -> Result<f64, ScoringError> {
    match (key, answer) {
        (_, NormalizedAnswer::NotAnswered) => Ok(0.0),
        (AnswerKey::Malformed { kind, reason, .. }, _) => Err(ScoringError::MalformedAnswerKey {
            kind: *kind,
            reason: reason.clone(),
        }),
        (AnswerKey::Categorize(key), NormalizedAnswer::Categorize(placements)) => {
            Ok(categorize_fraction(key, placements))
        }
        (AnswerKey::Cloze(key), NormalizedAnswer::Cloze(blanks)) => Ok(cloze_fraction(key, blanks)),
        (AnswerKey::Comprehension(key), NormalizedAnswer::Comprehension(choices)) => {
            Ok(comprehension_fraction(key, choices))
        }
        (key, answer) => Err(ScoringError::ShapeMismatch {
            expected: key.kind(),
            found: answer_kind(answer),
        }),
    }
}

fn answer_kind(answer: &NormalizedAnswer) -> Option<QuestionKind> {
    match answer {
        NormalizedAnswer::NotAnswered => None,
        NormalizedAnswer::Categorize(_) => Some(QuestionKind::Categorize),
        NormalizedAnswer::Cloze(_) => Some(QuestionKind::Cloze),
        NormalizedAnswer::Comprehension(_) => Some(QuestionKind::Comprehension),
    }
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64
}

/// Case-sensitive exact match per item. Placements for unknown items are ignored.
pub(crate) fn categorize_fraction(
    key: &CategorizeKey,
    placements: &BTreeMap<String, String>,
) -> f64 {
    let correct = key
        .correct_map
        .iter()
        .filter(|(item, category)| placements.get(*item) == Some(*category))
        .count();
    ratio(correct, key.correct_map.len())
}

pub(crate) fn cloze_fraction(key: &ClozeKey, blanks: &[Option<String>]) -> f64 {
    let correct = key
        .answers
        .iter()
        .enumerate()
        .filter(|(index, expected)| {
            blanks
                .get(*index)
                .and_then(Option::as_deref)
                .is_some_and(|given| cloze_matches(given, expected))
        })
        .count();
    ratio(correct, key.answers.len())
}

/// Trimmed, case-insensitive equality. Empty input never matches.
pub(crate) fn cloze_matches(given: &str, expected: &str) -> bool {
    !given.is_empty() && given.trim().to_lowercase() == expected.trim().to_lowercase()
}

pub(crate) fn comprehension_fraction(key: &ComprehensionKey, choices: &[Option<f64>]) -> f64 {
    let correct = key
        .sub_questions
        .iter()
        .enumerate()
        .filter(|(index, sub_question)| {
            choice_matches(
                choices.get(*index).copied().flatten(),
                sub_question.correct_choice_index,
            )
        })
        .count();
    ratio(correct, key.sub_questions.len())
}

/// Exact numeric equality, so a chosen index of `0` counts like any other.
pub(crate) fn choice_matches(chosen: Option<f64>, correct: Option<f64>) -> bool {
    match (chosen, correct) {
        (Some(chosen), Some(correct)) => chosen == correct,
        _ => false,
    }
}
