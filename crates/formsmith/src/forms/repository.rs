use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Form, FormId, FormResponse, ResponseId};

/// Document store abstraction so the service can be exercised in isolation.
pub trait FormRepository: Send + Sync {
    fn insert_form(&self, form: Form) -> Result<Form, RepositoryError>;
    fn replace_form(&self, form: Form) -> Result<(), RepositoryError>;
    fn fetch_form(&self, id: &FormId) -> Result<Option<Form>, RepositoryError>;
    fn list_forms(&self) -> Result<Vec<Form>, RepositoryError>;
    /// Remove the form and every response recorded against it.
    fn delete_form(&self, id: &FormId) -> Result<bool, RepositoryError>;

    fn insert_response(&self, response: FormResponse) -> Result<FormResponse, RepositoryError>;
    /// Insert unless the form already holds a response from the same submitter email
    /// (case-insensitive). The check and the insert must be one atomic step.
    fn insert_first_response(
        &self,
        response: FormResponse,
    ) -> Result<FormResponse, RepositoryError>;
    fn fetch_response(&self, id: &ResponseId) -> Result<Option<FormResponse>, RepositoryError>;
    fn responses_for(&self, form_id: &FormId) -> Result<Vec<FormResponse>, RepositoryError>;
    fn all_responses(&self) -> Result<Vec<FormResponse>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("{0} already has a response for this form")]
    DuplicateSubmitter(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for delivering results to respondents (e.g. an e-mail adapter).
pub trait ResultsNotifier: Send + Sync {
    /// Whether delivery is configured. Disabled notifiers are skipped without error.
    fn enabled(&self) -> bool {
        true
    }

    fn notify(&self, notice: ResultsNotice) -> Result<(), NotifyError>;
}

/// Results payload handed to the notifier after a submission is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsNotice {
    pub recipient: String,
    pub submitter_name: String,
    pub form_id: FormId,
    pub form_title: String,
    pub response_id: ResponseId,
    pub score: f64,
    pub max_score: f64,
    pub percentage: u32,
    pub submitted_at: DateTime<Utc>,
}

impl ResultsNotice {
    pub fn subject(&self) -> String {
        format!(
            "Your Results for \"{}\" - {}% Score",
            self.form_title, self.percentage
        )
    }

    pub fn summary(&self) -> String {
        format!(
            "Your results for \"{}\": {}/{} points ({}%)",
            self.form_title, self.score, self.max_score, self.percentage
        )
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("results transport unavailable: {0}")]
    Transport(String),
}
