//! Authoritative scoring of a form snapshot against a raw answer payload.
//!
//! Pipeline: raw answer -> [`normalize`] -> per-kind fraction -> weighted sum -> rounding.
//! The engine is a pure function of its inputs and is shared by submission and preview.

mod normalizer;
mod observer;
pub mod policy;
mod rules;

pub use normalizer::{normalize, NormalizedAnswer};
pub use observer::{ScoringObserver, TracingObserver};
pub use policy::PerformanceBand;

pub(crate) use rules::{choice_matches, cloze_matches};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::{Form, Question, QuestionId, QuestionKind};

/// Failure scoring a single question. Isolated by the engine, never surfaced to respondents.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("{kind} answer key could not be decoded: {reason}")]
    MalformedAnswerKey { kind: QuestionKind, reason: String },
    #[error("answer shape {found:?} does not match {expected} question")]
    ShapeMismatch {
        expected: QuestionKind,
        found: Option<QuestionKind>,
    },
}

/// Outcome of one question inside a score card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Answered,
    Unanswered,
    Failed,
}

/// Discrete contribution of a question, kept for transparent reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScore {
    pub question_id: QuestionId,
    pub kind: QuestionKind,
    pub points: f64,
    pub fraction: f64,
    pub earned: f64,
    pub status: QuestionStatus,
}

/// Result of scoring a whole form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    /// Rounded to two decimals.
    pub score: f64,
    pub max_score: f64,
    pub percentage: u32,
    pub questions: Vec<QuestionScore>,
}

/// Stateless scorer carrying only its observer.
#[derive(Clone)]
pub struct ScoringEngine {
    observer: Arc<dyn ScoringObserver>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(Arc::new(TracingObserver))
    }
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine").finish_non_exhaustive()
    }
}

impl ScoringEngine {
    pub fn new(observer: Arc<dyn ScoringObserver>) -> Self {
        Self { observer }
    }

    /// Fraction in `[0, 1]` for one question, after normalizing its raw answer.
    pub fn score_question(
        &self,
        question: &Question,
        raw_answer: Option<&Value>,
    ) -> Result<f64, ScoringError> {
        let answer = normalize(&question.answer_key, raw_answer);
        rules::fraction(&question.answer_key, &answer)
    }

    /// Score every question of `form` against `answers`, keyed by question id.
    ///
    /// A question that fails to score contributes 0 and is reported to the observer;
    /// the remaining questions are still scored.
    pub fn score_form(&self, form: &Form, answers: &Map<String, Value>) -> ScoreCard {
        let mut score = 0.0;
        let mut max_score = 0.0;
        let mut questions = Vec::with_capacity(form.questions.len());

        for question in &form.questions {
            let points = question.points();
            max_score += points;

            let raw_answer = answers.get(&question.id.0).filter(|value| !value.is_null());
            let (fraction, status) = match raw_answer {
                None => {
                    self.observer.unanswered(question);
                    (0.0, QuestionStatus::Unanswered)
                }
                Some(raw) => match self.score_question(question, Some(raw)) {
                    Ok(fraction) => (fraction.clamp(0.0, 1.0), QuestionStatus::Answered),
                    Err(error) => {
                        self.observer.question_failed(question, &error);
                        (0.0, QuestionStatus::Failed)
                    }
                },
            };

            let earned = fraction * points;
            score += earned;
            questions.push(QuestionScore {
                question_id: question.id.clone(),
                kind: question.kind(),
                points,
                fraction,
                earned,
                status,
            });
        }

        // Rounding must not lift the score above the weights that bound it.
        ScoreCard {
            score: policy::round_score(score).min(max_score),
            max_score,
            percentage: policy::percentage(score, max_score),
            questions,
        }
    }
}
