use std::collections::BTreeMap;

use serde_json::Value;

use super::super::domain::{
    AnswerKey, CategorizeKey, ClozeKey, ComprehensionKey, FormResponse, Question,
};
use super::super::scoring::{choice_matches, cloze_matches, normalize, NormalizedAnswer};
use super::accuracy;
use super::views::{
    BlankAccuracy, ItemAccuracy, QuestionAnalytics, QuestionBreakdown, QuestionTiming,
    SubQuestionAccuracy,
};
use crate::forms::scoring::policy::round_half_up;

/// Per-question accuracy and timing over a set of stored responses.
pub(crate) fn question_analytics(question: &Question, responses: &[FormResponse]) -> QuestionAnalytics {
    let answers: Vec<&Value> = responses
        .iter()
        .filter_map(|response| response.answer(&question.id))
        .collect();

    let breakdown = match &question.answer_key {
        AnswerKey::Categorize(key) => QuestionBreakdown::Categorize {
            items: categorize_items(key, &question.answer_key, &answers),
        },
        AnswerKey::Cloze(key) => QuestionBreakdown::Cloze {
            blanks: cloze_blanks(key, &question.answer_key, &answers),
        },
        AnswerKey::Comprehension(key) => QuestionBreakdown::Comprehension {
            sub_questions: comprehension_choices(key, &question.answer_key, &answers),
        },
        AnswerKey::Malformed { reason, .. } => QuestionBreakdown::Unavailable {
            reason: reason.clone(),
        },
    };

    QuestionAnalytics {
        question_id: question.id.clone(),
        title: question.title.clone(),
        kind: question.kind(),
        points: question.points(),
        answered: answers.len(),
        average_accuracy: breakdown.average_accuracy(),
        breakdown,
        timing: question_timing(&question.id.0, responses),
    }
}

fn categorize_items(
    key: &CategorizeKey,
    answer_key: &AnswerKey,
    answers: &[&Value],
) -> Vec<ItemAccuracy> {
    let placements: Vec<BTreeMap<String, String>> = answers
        .iter()
        .filter_map(|raw| match normalize(answer_key, Some(raw)) {
            NormalizedAnswer::Categorize(placements) => Some(placements),
            _ => None,
        })
        .collect();

    key.correct_map
        .iter()
        .map(|(item, correct_category)| {
            let mut category_distribution = BTreeMap::new();
            let mut correct_placements = 0;
            for placed in placements.iter().filter_map(|placement| placement.get(item)) {
                if placed.is_empty() {
                    continue;
                }
                *category_distribution.entry(placed.clone()).or_insert(0) += 1;
                if placed == correct_category {
                    correct_placements += 1;
                }
            }

            ItemAccuracy {
                item: item.clone(),
                correct_category: correct_category.clone(),
                correct_placements,
                accuracy: accuracy(correct_placements, answers.len()),
                category_distribution,
            }
        })
        .collect()
}

fn cloze_blanks(key: &ClozeKey, answer_key: &AnswerKey, answers: &[&Value]) -> Vec<BlankAccuracy> {
    let filled: Vec<Vec<Option<String>>> = answers
        .iter()
        .filter_map(|raw| match normalize(answer_key, Some(raw)) {
            NormalizedAnswer::Cloze(blanks) => Some(blanks),
            _ => None,
        })
        .collect();

    key.answers
        .iter()
        .enumerate()
        .map(|(position, correct_answer)| {
            let mut answer_distribution = BTreeMap::new();
            let mut correct_count = 0;
            for given in filled
                .iter()
                .filter_map(|blanks| blanks.get(position).and_then(Option::as_deref))
            {
                if given.is_empty() {
                    continue;
                }
                *answer_distribution.entry(given.to_string()).or_insert(0) += 1;
                if cloze_matches(given, correct_answer) {
                    correct_count += 1;
                }
            }

            BlankAccuracy {
                position,
                correct_answer: correct_answer.clone(),
                correct_count,
                accuracy: accuracy(correct_count, answers.len()),
                answer_distribution,
            }
        })
        .collect()
}

fn comprehension_choices(
    key: &ComprehensionKey,
    answer_key: &AnswerKey,
    answers: &[&Value],
) -> Vec<SubQuestionAccuracy> {
    let chosen: Vec<Vec<Option<f64>>> = answers
        .iter()
        .filter_map(|raw| match normalize(answer_key, Some(raw)) {
            NormalizedAnswer::Comprehension(choices) => Some(choices),
            _ => None,
        })
        .collect();

    key.sub_questions
        .iter()
        .enumerate()
        .map(|(index, sub_question)| {
            let mut choice_distribution = BTreeMap::new();
            let mut correct_count = 0;
            for choice in chosen
                .iter()
                .filter_map(|choices| choices.get(index).copied().flatten())
            {
                *choice_distribution.entry(choice_label(choice)).or_insert(0) += 1;
                if choice_matches(Some(choice), sub_question.correct_choice_index) {
                    correct_count += 1;
                }
            }

            SubQuestionAccuracy {
                question: sub_question.question.clone(),
                correct_choice: sub_question.correct_choice_index,
                correct_count,
                accuracy: accuracy(correct_count, answers.len()),
                choice_distribution,
            }
        })
        .collect()
}

fn choice_label(choice: f64) -> String {
    if choice.fract() == 0.0 && choice.abs() < i64::MAX as f64 {
        format!("{}", choice as i64)
    } else {
        choice.to_string()
    }
}

fn question_timing(question_id: &str, responses: &[FormResponse]) -> QuestionTiming {
    let timings: Vec<u64> = responses
        .iter()
        .filter_map(|response| response.question_times.get(question_id).copied())
        .filter(|seconds| *seconds > 0)
        .collect();

    if timings.is_empty() {
        return QuestionTiming::default();
    }

    let total: u64 = timings.iter().sum();
    QuestionTiming {
        avg_time: round_half_up(total as f64 / timings.len() as f64) as u64,
        min_time: timings.iter().copied().min().unwrap_or(0),
        max_time: timings.iter().copied().max().unwrap_or(0),
        response_count: timings.len(),
    }
}
