use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::analytics::{self, FormAnalytics, GlobalAnalytics};
use super::distractors::{DistractorGenerator, FallbackDistractors};
use super::domain::{
    Form, FormDraft, FormId, FormResponse, ResponseId, Submission, SubmissionReceipt,
};
use super::export::{self, ExportError};
use super::intake::{IntakeError, SubmissionGuard};
use super::repository::{
    FormRepository, RepositoryError, ResultsNotice, ResultsNotifier,
};
use super::scoring::{PerformanceBand, QuestionScore, ScoreCard, ScoringEngine};

/// Service composing intake validation, the scoring engine, storage and result delivery.
pub struct FormService<R, N> {
    guard: Arc<SubmissionGuard>,
    engine: Arc<ScoringEngine>,
    repository: Arc<R>,
    notifier: Arc<N>,
    distractors: Arc<dyn DistractorGenerator>,
}

static FORM_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RESPONSE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_form_id() -> FormId {
    let id = FORM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    FormId(format!("form-{id:06}"))
}

fn next_response_id() -> ResponseId {
    let id = RESPONSE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ResponseId(format!("resp-{id:06}"))
}

/// Stored response paired with the title of the form it answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseListing {
    #[serde(flatten)]
    pub response: FormResponse,
    pub form_title: Option<String>,
}

/// Stored response with a per-question breakdown against the current form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReview {
    pub response: FormResponse,
    pub form_title: String,
    pub percentage: u32,
    pub performance: PerformanceBand,
    pub performance_label: &'static str,
    pub show_correct_answers: bool,
    pub questions: Vec<QuestionScore>,
}

impl<R, N> FormService<R, N>
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self::with_engine(repository, notifier, ScoringEngine::default())
    }

    pub fn with_engine(repository: Arc<R>, notifier: Arc<N>, engine: ScoringEngine) -> Self {
        Self {
            guard: Arc::new(SubmissionGuard::new()),
            engine: Arc::new(engine),
            repository,
            notifier,
            distractors: Arc::new(FallbackDistractors),
        }
    }

    /// Swap the source of cloze distractor suggestions.
    pub fn with_distractors(mut self, distractors: Arc<dyn DistractorGenerator>) -> Self {
        self.distractors = distractors;
        self
    }

    /// Validate and store a new form.
    pub fn create_form(&self, draft: FormDraft) -> Result<Form, FormServiceError> {
        let draft = self.guard.accept_draft(draft)?;
        let form = Form::from_draft(next_form_id(), draft, Utc::now());
        let stored = self.repository.insert_form(form)?;
        info!(form_id = %stored.id, questions = stored.questions.len(), "form created");
        Ok(stored)
    }

    /// All forms, newest first.
    pub fn list_forms(&self) -> Result<Vec<Form>, FormServiceError> {
        let mut forms = self.repository.list_forms()?;
        forms.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(forms)
    }

    pub fn get_form(&self, form_id: &FormId) -> Result<Form, FormServiceError> {
        self.repository
            .fetch_form(form_id)?
            .ok_or_else(|| FormServiceError::FormNotFound(form_id.clone()))
    }

    /// Replace the editable fields of a form. Identity and creation time are preserved.
    pub fn update_form(
        &self,
        form_id: &FormId,
        draft: FormDraft,
    ) -> Result<Form, FormServiceError> {
        let existing = self.get_form(form_id)?;
        let has_responses = !self.repository.responses_for(form_id)?.is_empty();
        let draft = self.guard.accept_update(&existing, has_responses, draft)?;

        let mut updated = Form::from_draft(existing.id.clone(), draft, Utc::now());
        updated.created_at = existing.created_at;
        self.repository.replace_form(updated.clone())?;
        info!(form_id = %updated.id, "form updated");
        Ok(updated)
    }

    /// Delete a form together with its responses.
    pub fn delete_form(&self, form_id: &FormId) -> Result<(), FormServiceError> {
        if self.repository.delete_form(form_id)? {
            info!(form_id = %form_id, "form deleted");
            Ok(())
        } else {
            Err(FormServiceError::FormNotFound(form_id.clone()))
        }
    }

    /// Score a submission authoritatively and persist it.
    pub fn submit(
        &self,
        form_id: &FormId,
        submission: Submission,
    ) -> Result<SubmissionReceipt, FormServiceError> {
        let form = self.get_form(form_id)?;
        let prior = self.repository.responses_for(form_id)?;
        let accepted = self.guard.accept_submission(&form, submission, &prior)?;

        let card = self.engine.score_form(&form, &accepted.answers);
        let response = FormResponse {
            id: next_response_id(),
            form_id: form.id.clone(),
            answers: accepted.answers,
            score: card.score,
            max_score: card.max_score,
            submitted_at: Utc::now(),
            submitter_email: accepted.submitter_email,
            submitter_name: accepted.submitter_name,
            time_spent: accepted.time_spent,
            question_times: accepted.question_times,
        };

        let stored = if form.settings.allow_multiple_submissions {
            self.repository.insert_response(response)?
        } else {
            self.repository
                .insert_first_response(response)
                .map_err(|error| match error {
                    RepositoryError::DuplicateSubmitter(email) => {
                        FormServiceError::Intake(IntakeError::DuplicateSubmission(email))
                    }
                    other => other.into(),
                })?
        };
        info!(
            form_id = %form.id,
            response_id = %stored.id,
            score = stored.score,
            max_score = stored.max_score,
            "response recorded"
        );

        self.dispatch_notice(&form, &stored, card.percentage);

        Ok(SubmissionReceipt {
            id: stored.id,
            score: stored.score,
            max_score: stored.max_score,
            percentage: card.percentage,
            submitted_at: stored.submitted_at,
        })
    }

    fn dispatch_notice(&self, form: &Form, response: &FormResponse, percentage: u32) {
        if !self.notifier.enabled() {
            info!(response_id = %response.id, "results delivery not configured; skipping");
            return;
        }

        let notice = ResultsNotice {
            recipient: response.submitter_email.clone(),
            submitter_name: response.submitter_name.clone(),
            form_id: form.id.clone(),
            form_title: form.title.clone(),
            response_id: response.id.clone(),
            score: response.score,
            max_score: response.max_score,
            percentage,
            submitted_at: response.submitted_at,
        };

        if let Err(error) = self.notifier.notify(notice) {
            warn!(response_id = %response.id, error = %error, "results delivery failed");
        }
    }

    /// Live, non-authoritative score of in-progress answers. Nothing is stored.
    pub fn preview(
        &self,
        form_id: &FormId,
        answers: &Map<String, Value>,
    ) -> Result<ScoreCard, FormServiceError> {
        let form = self.get_form(form_id)?;
        Ok(self.engine.score_form(&form, answers))
    }

    /// Responses recorded against one form, newest first.
    pub fn responses_for_form(
        &self,
        form_id: &FormId,
    ) -> Result<Vec<FormResponse>, FormServiceError> {
        self.get_form(form_id)?;
        let mut responses = self.repository.responses_for(form_id)?;
        newest_first(&mut responses);
        Ok(responses)
    }

    /// Every stored response, newest first, with the title of its form when it still exists.
    pub fn all_responses(&self) -> Result<Vec<ResponseListing>, FormServiceError> {
        let forms = self.repository.list_forms()?;
        let mut responses = self.repository.all_responses()?;
        newest_first(&mut responses);

        Ok(responses
            .into_iter()
            .map(|response| {
                let form_title = forms
                    .iter()
                    .find(|form| form.id == response.form_id)
                    .map(|form| form.title.clone());
                ResponseListing {
                    response,
                    form_title,
                }
            })
            .collect())
    }

    /// Break a stored response down per question. The stored score is left untouched.
    pub fn review(
        &self,
        form_id: &FormId,
        response_id: &ResponseId,
    ) -> Result<ResponseReview, FormServiceError> {
        let form = self.get_form(form_id)?;
        let response = self
            .repository
            .fetch_response(response_id)?
            .filter(|response| response.form_id == form.id)
            .ok_or_else(|| FormServiceError::ResponseNotFound(response_id.clone()))?;

        let card = self.engine.score_form(&form, &response.answers);
        let percentage =
            super::scoring::policy::percentage(response.score, response.max_score);
        let performance = PerformanceBand::for_percentage(percentage);

        Ok(ResponseReview {
            form_title: form.title,
            percentage,
            performance,
            performance_label: performance.label(),
            show_correct_answers: form.settings.show_correct_answers,
            questions: card.questions,
            response,
        })
    }

    pub fn form_analytics(&self, form_id: &FormId) -> Result<FormAnalytics, FormServiceError> {
        let form = self.get_form(form_id)?;
        let responses = self.repository.responses_for(form_id)?;
        Ok(analytics::form_analytics(&form, &responses))
    }

    pub fn global_analytics(
        &self,
        now: DateTime<Utc>,
    ) -> Result<GlobalAnalytics, FormServiceError> {
        let mut forms = self.repository.list_forms()?;
        forms.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        let responses = self.repository.all_responses()?;
        Ok(analytics::global_analytics(&forms, &responses, now))
    }

    /// CSV export of a form's responses, newest first.
    pub fn export_csv(&self, form_id: &FormId) -> Result<String, FormServiceError> {
        let responses = self.responses_for_form(form_id)?;
        Ok(export::responses_to_csv_string(&responses)?)
    }
}

impl<R, N> FormService<R, N> {
    /// Wrong-answer suggestions for each correct cloze answer.
    pub fn suggest_distractors(&self, text: &str, correct_answers: &[String]) -> Vec<Vec<String>> {
        self.distractors.suggest(text, correct_answers)
    }
}

fn newest_first(responses: &mut [FormResponse]) {
    responses.sort_by(|left, right| right.submitted_at.cmp(&left.submitted_at));
}

/// Error raised by the form service.
#[derive(Debug, thiserror::Error)]
pub enum FormServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("form '{0}' not found")]
    FormNotFound(FormId),
    #[error("response '{0}' not found")]
    ResponseNotFound(ResponseId),
    #[error(transparent)]
    Export(#[from] ExportError),
}
