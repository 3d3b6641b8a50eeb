use std::collections::BTreeMap;

use serde_json::Value;

use super::super::domain::{AnswerKey, QuestionKind};

/// Canonical per-kind answer shape consumed by the scoring rules.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedAnswer {
    NotAnswered,
    /// Item label to chosen category. Non-string placements are dropped.
    Categorize(BTreeMap<String, String>),
    /// One entry per blank position; `None` marks a blank that was not filled.
    Cloze(Vec<Option<String>>),
    /// One entry per sub-question; `None` marks a missing or non-numeric choice.
    Comprehension(Vec<Option<f64>>),
}

/// Convert a loosely shaped wire answer into the canonical shape for the question's kind.
///
/// Never fails: unexpected shapes fall back to "not answered" at the smallest
/// granularity available (whole answer, blank, or sub-question).
pub fn normalize(key: &AnswerKey, raw: Option<&Value>) -> NormalizedAnswer {
    let raw = match raw {
        None | Some(Value::Null) => return NormalizedAnswer::NotAnswered,
        Some(value) => value,
    };

    match key.kind() {
        QuestionKind::Categorize => NormalizedAnswer::Categorize(categorize_placements(raw)),
        QuestionKind::Cloze => NormalizedAnswer::Cloze(cloze_blanks(raw)),
        QuestionKind::Comprehension => {
            let expected = match key {
                AnswerKey::Comprehension(key) => key.sub_questions.len(),
                _ => 0,
            };
            NormalizedAnswer::Comprehension(comprehension_choices(raw, expected))
        }
    }
}

fn categorize_placements(raw: &Value) -> BTreeMap<String, String> {
    match raw {
        Value::Object(map) => map
            .iter()
            .filter_map(|(item, category)| {
                category
                    .as_str()
                    .map(|category| (item.clone(), category.to_string()))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn cloze_blanks(raw: &Value) -> Vec<Option<String>> {
    match raw {
        Value::Array(values) => values
            .iter()
            .map(|value| value.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Accepts the ordered array shape and the legacy `{"0": 1, "1": 2}` mapping shape.
fn comprehension_choices(raw: &Value, expected: usize) -> Vec<Option<f64>> {
    match raw {
        Value::Array(values) => values.iter().map(numeric_choice).collect(),
        Value::Object(map) => (0..expected)
            .map(|index| map.get(&index.to_string()).and_then(numeric_choice))
            .collect(),
        _ => Vec::new(),
    }
}

fn numeric_choice(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}
