use tracing::{debug, warn};

use super::super::domain::Question;
use super::ScoringError;

/// Collaborator notified about per-question events while a form is scored.
pub trait ScoringObserver: Send + Sync {
    fn unanswered(&self, question: &Question);
    fn question_failed(&self, question: &Question, error: &ScoringError);
}

/// Default observer forwarding events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScoringObserver for TracingObserver {
    fn unanswered(&self, question: &Question) {
        debug!(question_id = %question.id, kind = %question.kind(), "no answer supplied");
    }

    fn question_failed(&self, question: &Question, error: &ScoringError) {
        warn!(
            question_id = %question.id,
            kind = %question.kind(),
            error = %error,
            "question skipped during scoring"
        );
    }
}
