use formsmith::error::AppError;
use formsmith::forms::{
    Form, FormId, FormRepository, FormResponse, NotifyError, RepositoryError, ResponseId,
    ResultsNotice, ResultsNotifier,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local document store. Forms keep insertion order; deletes cascade to responses.
#[derive(Default, Clone)]
pub(crate) struct InMemoryFormRepository {
    forms: Arc<Mutex<Vec<Form>>>,
    responses: Arc<Mutex<Vec<FormResponse>>>,
}

impl FormRepository for InMemoryFormRepository {
    fn insert_form(&self, form: Form) -> Result<Form, RepositoryError> {
        let mut guard = self.forms.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == form.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(form.clone());
        Ok(form)
    }

    fn replace_form(&self, form: Form) -> Result<(), RepositoryError> {
        let mut guard = self.forms.lock().expect("repository mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == form.id) {
            Some(slot) => {
                *slot = form;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_form(&self, id: &FormId) -> Result<Option<Form>, RepositoryError> {
        let guard = self.forms.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|form| &form.id == id).cloned())
    }

    fn list_forms(&self) -> Result<Vec<Form>, RepositoryError> {
        let guard = self.forms.lock().expect("repository mutex poisoned");
        Ok(guard.clone())
    }

    fn delete_form(&self, id: &FormId) -> Result<bool, RepositoryError> {
        let mut forms = self.forms.lock().expect("repository mutex poisoned");
        let before = forms.len();
        forms.retain(|form| &form.id != id);
        if forms.len() == before {
            return Ok(false);
        }

        let mut responses = self.responses.lock().expect("repository mutex poisoned");
        responses.retain(|response| &response.form_id != id);
        Ok(true)
    }

    fn insert_response(&self, response: FormResponse) -> Result<FormResponse, RepositoryError> {
        let mut guard = self.responses.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == response.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(response.clone());
        Ok(response)
    }

    fn insert_first_response(
        &self,
        response: FormResponse,
    ) -> Result<FormResponse, RepositoryError> {
        let mut guard = self.responses.lock().expect("repository mutex poisoned");
        let taken = guard.iter().any(|existing| {
            existing.form_id == response.form_id
                && existing
                    .submitter_email
                    .eq_ignore_ascii_case(&response.submitter_email)
        });
        if taken {
            return Err(RepositoryError::DuplicateSubmitter(response.submitter_email));
        }
        guard.push(response.clone());
        Ok(response)
    }

    fn fetch_response(&self, id: &ResponseId) -> Result<Option<FormResponse>, RepositoryError> {
        let guard = self.responses.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|response| &response.id == id).cloned())
    }

    fn responses_for(&self, form_id: &FormId) -> Result<Vec<FormResponse>, RepositoryError> {
        let guard = self.responses.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|response| &response.form_id == form_id)
            .cloned()
            .collect())
    }

    fn all_responses(&self) -> Result<Vec<FormResponse>, RepositoryError> {
        let guard = self.responses.lock().expect("repository mutex poisoned");
        Ok(guard.clone())
    }
}

/// Results "delivery" that records notices and logs them. Disabled without a sender address.
#[derive(Default, Clone)]
pub(crate) struct LoggingResultsNotifier {
    sender: Option<String>,
    outbox: Arc<Mutex<Vec<ResultsNotice>>>,
}

impl LoggingResultsNotifier {
    pub(crate) fn new(sender: Option<String>) -> Self {
        Self {
            sender,
            outbox: Arc::default(),
        }
    }

    pub(crate) fn sent(&self) -> Vec<ResultsNotice> {
        self.outbox.lock().expect("outbox mutex poisoned").clone()
    }
}

impl ResultsNotifier for LoggingResultsNotifier {
    fn enabled(&self) -> bool {
        self.sender.is_some()
    }

    fn notify(&self, notice: ResultsNotice) -> Result<(), NotifyError> {
        let sender = self
            .sender
            .as_deref()
            .ok_or_else(|| NotifyError::Transport("no sender configured".to_string()))?;
        info!(
            from = sender,
            to = %notice.recipient,
            subject = %notice.subject(),
            body = %notice.summary(),
            "results notice queued"
        );
        self.outbox
            .lock()
            .expect("outbox mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Read and decode a JSON document from disk.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
