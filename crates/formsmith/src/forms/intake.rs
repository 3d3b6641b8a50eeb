use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use super::domain::{
    AcceptedSubmission, AnswerKey, Form, FormDraft, FormResponse, QuestionId, Submission,
};

/// Validation errors raised before a form is stored or a submission is scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeError {
    #[error("form title is required")]
    MissingTitle,
    #[error("question id '{0}' is used more than once")]
    DuplicateQuestionId(String),
    #[error("question '{id}' has invalid points {points}; points must be a positive number")]
    InvalidPoints { id: String, points: f64 },
    #[error("question '{id}' has unreadable answer key data: {reason}")]
    MalformedAnswerKey { id: String, reason: String },
    #[error("questions of a published form with responses cannot be changed")]
    QuestionsLocked,
    #[error("submitter name and email are required")]
    MissingSubmitter,
    #[error("submitter email '{0}' is not a valid address")]
    InvalidEmail(String),
    #[error("answers are required")]
    MissingAnswers,
    #[error("{0} has already submitted this form")]
    DuplicateSubmission(String),
}

/// Guard responsible for producing stored drafts and accepted submissions.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard;

impl SubmissionGuard {
    pub fn new() -> Self {
        Self
    }

    /// Validate an authored draft, assigning ids to questions that lack one.
    pub fn accept_draft(&self, mut draft: FormDraft) -> Result<FormDraft, IntakeError> {
        if draft.title.trim().is_empty() {
            return Err(IntakeError::MissingTitle);
        }

        let mut seen = HashSet::new();
        for (position, question) in draft.questions.iter_mut().enumerate() {
            if question.id.0.trim().is_empty() {
                question.id = QuestionId(format!("q-{}", position + 1));
            }

            if !seen.insert(question.id.0.clone()) {
                return Err(IntakeError::DuplicateQuestionId(question.id.0.clone()));
            }

            if let Some(points) = question.points {
                if !points.is_finite() || points <= 0.0 {
                    return Err(IntakeError::InvalidPoints {
                        id: question.id.0.clone(),
                        points,
                    });
                }
            }

            if let AnswerKey::Malformed { reason, .. } = &question.answer_key {
                return Err(IntakeError::MalformedAnswerKey {
                    id: question.id.0.clone(),
                    reason: reason.clone(),
                });
            }
        }

        Ok(draft)
    }

    /// Validate an update against the stored form it replaces.
    pub fn accept_update(
        &self,
        existing: &Form,
        has_responses: bool,
        draft: FormDraft,
    ) -> Result<FormDraft, IntakeError> {
        let draft = self.accept_draft(draft)?;
        if existing.is_published && has_responses && draft.questions != existing.questions {
            return Err(IntakeError::QuestionsLocked);
        }
        Ok(draft)
    }

    /// Validate respondent identity and payload shape ahead of scoring.
    pub fn accept_submission(
        &self,
        form: &Form,
        submission: Submission,
        prior: &[FormResponse],
    ) -> Result<AcceptedSubmission, IntakeError> {
        let submitter_name = non_blank(submission.submitter_name);
        let submitter_email = non_blank(submission.submitter_email);
        let (submitter_name, submitter_email) = match (submitter_name, submitter_email) {
            (Some(name), Some(email)) => (name, email),
            _ => return Err(IntakeError::MissingSubmitter),
        };

        if !submitter_email.contains('@') {
            return Err(IntakeError::InvalidEmail(submitter_email));
        }

        let answers = match submission.answers {
            Some(Value::Object(answers)) => answers,
            _ => return Err(IntakeError::MissingAnswers),
        };

        if !form.settings.allow_multiple_submissions
            && prior
                .iter()
                .any(|response| response.submitter_email.eq_ignore_ascii_case(&submitter_email))
        {
            return Err(IntakeError::DuplicateSubmission(submitter_email));
        }

        let question_times = submission
            .question_times
            .unwrap_or_default()
            .into_iter()
            .map(|(question_id, seconds)| (question_id, clamp_seconds(seconds)))
            .collect::<BTreeMap<_, _>>();

        Ok(AcceptedSubmission {
            answers,
            submitter_name,
            submitter_email,
            time_spent: clamp_seconds(submission.time_spent.unwrap_or(0)),
            question_times,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn clamp_seconds(seconds: i64) -> u64 {
    seconds.max(0) as u64
}
