//! Form authoring, submission scoring, and response reporting.
//!
//! The scoring engine is the single authority on scores: the service uses it for stored
//! submissions, live previews and per-question reviews alike.

pub mod analytics;
pub mod distractors;
pub mod domain;
pub mod export;
pub(crate) mod intake;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use analytics::{FormAnalytics, GlobalAnalytics, QuestionAnalytics, ScoreDistribution};
pub use distractors::{DistractorGenerator, FallbackDistractors};
pub use domain::{
    AnswerKey, CategorizeKey, ClozeKey, ComprehensionKey, Form, FormDraft, FormId, FormResponse,
    FormSettings, Question, QuestionId, QuestionKind, ResponseId, SubQuestion, Submission,
    SubmissionReceipt,
};
pub use export::{responses_to_csv, responses_to_csv_string, ExportError};
pub use intake::{IntakeError, SubmissionGuard};
pub use repository::{
    FormRepository, NotifyError, RepositoryError, ResultsNotice, ResultsNotifier,
};
pub use router::form_router;
pub use scoring::{
    PerformanceBand, QuestionScore, QuestionStatus, ScoreCard, ScoringEngine, ScoringError,
    ScoringObserver, TracingObserver,
};
pub use service::{FormService, FormServiceError, ResponseListing, ResponseReview};
