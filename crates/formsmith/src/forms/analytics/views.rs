use std::collections::BTreeMap;

use serde::Serialize;

use super::super::domain::{FormId, QuestionId, QuestionKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTiming {
    pub avg_time: u64,
    pub min_time: u64,
    pub max_time: u64,
    pub response_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAccuracy {
    pub item: String,
    pub correct_category: String,
    pub correct_placements: usize,
    pub accuracy: u32,
    pub category_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankAccuracy {
    pub position: usize,
    pub correct_answer: String,
    pub correct_count: usize,
    pub accuracy: u32,
    pub answer_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuestionAccuracy {
    pub question: String,
    #[serde(
        serialize_with = "crate::forms::domain::serialize_choice",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_choice: Option<f64>,
    pub correct_count: usize,
    pub accuracy: u32,
    pub choice_distribution: BTreeMap<String, usize>,
}

/// Kind-specific accuracy detail for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionBreakdown {
    Categorize { items: Vec<ItemAccuracy> },
    Cloze { blanks: Vec<BlankAccuracy> },
    Comprehension { sub_questions: Vec<SubQuestionAccuracy> },
    Unavailable { reason: String },
}

impl QuestionBreakdown {
    /// Mean of the per-part accuracies, 0 when the question has no parts.
    pub fn average_accuracy(&self) -> u32 {
        let accuracies: Vec<u32> = match self {
            QuestionBreakdown::Categorize { items } => {
                items.iter().map(|item| item.accuracy).collect()
            }
            QuestionBreakdown::Cloze { blanks } => {
                blanks.iter().map(|blank| blank.accuracy).collect()
            }
            QuestionBreakdown::Comprehension { sub_questions } => sub_questions
                .iter()
                .map(|sub_question| sub_question.accuracy)
                .collect(),
            QuestionBreakdown::Unavailable { .. } => Vec::new(),
        };

        if accuracies.is_empty() {
            return 0;
        }
        let total: u32 = accuracies.iter().sum();
        crate::forms::scoring::policy::round_half_up(total as f64 / accuracies.len() as f64) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalytics {
    pub question_id: QuestionId,
    pub title: String,
    pub kind: QuestionKind,
    pub points: f64,
    pub answered: usize,
    pub average_accuracy: u32,
    pub breakdown: QuestionBreakdown,
    pub timing: QuestionTiming,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnalytics {
    pub form_id: FormId,
    pub title: String,
    pub total_responses: usize,
    pub avg_score: f64,
    pub max_score: f64,
    pub avg_time: u64,
    pub pass_rate: u32,
    pub score_distribution: ScoreDistribution,
    pub questions: Vec<QuestionAnalytics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormActivity {
    pub form_id: FormId,
    pub title: String,
    pub question_count: usize,
    pub response_count: usize,
    pub avg_score: f64,
    pub max_score: f64,
    pub success_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAnalytics {
    pub total_responses: usize,
    pub total_forms: usize,
    pub avg_score: f64,
    pub max_possible_score: f64,
    pub avg_time: u64,
    pub forms_with_responses: usize,
    pub recent_responses: usize,
    pub forms: Vec<FormActivity>,
}
