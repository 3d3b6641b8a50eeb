//! Aggregate views over stored responses: per-form, global, and per-question accuracy.

mod global;
mod questions;
mod summary;
pub mod views;

pub use global::global_analytics;
pub use summary::{form_analytics, ScoreBand};
pub use views::{
    BlankAccuracy, FormActivity, FormAnalytics, GlobalAnalytics, ItemAccuracy, QuestionAnalytics,
    QuestionBreakdown, QuestionTiming, ScoreDistribution, SubQuestionAccuracy,
};

use super::domain::FormResponse;
use super::scoring::policy::{round_half_up, round_to};

/// Whole-number percentage of `correct` over `answered`, 0 when nothing was answered.
pub(crate) fn accuracy(correct: usize, answered: usize) -> u32 {
    if answered == 0 {
        return 0;
    }
    round_half_up(correct as f64 / answered as f64 * 100.0) as u32
}

/// Mean score rounded to one decimal, 0 for an empty set.
pub(crate) fn average_score(responses: &[&FormResponse]) -> f64 {
    mean(responses.iter().map(|response| response.score), responses.len())
        .map(|avg| round_to(avg, 1))
        .unwrap_or(0.0)
}

/// Mean time spent rounded to whole seconds, 0 for an empty set.
pub(crate) fn average_time(responses: &[&FormResponse]) -> u64 {
    mean(
        responses.iter().map(|response| response.time_spent as f64),
        responses.len(),
    )
    .map(|avg| round_half_up(avg) as u64)
    .unwrap_or(0)
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(values.sum::<f64>() / count as f64)
    }
}
