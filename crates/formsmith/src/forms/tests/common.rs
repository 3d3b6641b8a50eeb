use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Map, Value};

use crate::forms::domain::{Form, FormDraft, FormId, FormResponse, ResponseId, Submission};
use crate::forms::repository::{
    FormRepository, NotifyError, RepositoryError, ResultsNotice, ResultsNotifier,
};
use crate::forms::{form_router, FormService};

/// Three-archetype quiz worth 6 points: categorize (2), cloze (3), comprehension (1).
pub(super) fn quiz_draft() -> FormDraft {
    serde_json::from_value(json!({
        "title": "Mixed archetypes",
        "description": "One of each question type",
        "isPublished": true,
        "questions": [
            {
                "id": "q-sort",
                "type": "categorize",
                "title": "Sort the produce",
                "points": 2,
                "data": {
                    "categories": ["Fruit", "Vegetable"],
                    "items": ["Apple", "Carrot"],
                    "correctMap": { "Apple": "Fruit", "Carrot": "Vegetable" }
                }
            },
            {
                "id": "q-blank",
                "type": "cloze",
                "title": "Fill the blanks",
                "points": 3,
                "data": {
                    "text": "The ___ sat on the ___",
                    "options": ["cat", "mat", "dog"],
                    "answers": ["cat", "mat"]
                }
            },
            {
                "id": "q-read",
                "type": "comprehension",
                "title": "Read and answer",
                "data": {
                    "passage": "Ana walked her dog before sunrise.",
                    "questions": [
                        { "question": "Who walked?", "choices": ["Ben", "Ana", "Cy"], "correct": 1 },
                        { "question": "When?", "choices": ["Dawn", "Noon"], "correct": 0 }
                    ]
                }
            }
        ]
    }))
    .expect("quiz draft decodes")
}

pub(super) fn perfect_answers() -> Map<String, Value> {
    answer_map(json!({
        "q-sort": { "Apple": "Fruit", "Carrot": "Vegetable" },
        "q-blank": ["Cat", " mat "],
        "q-read": [1, 0]
    }))
}

/// Scores 3 of 6: one item, one blank, one sub-question right.
pub(super) fn half_answers() -> Map<String, Value> {
    answer_map(json!({
        "q-sort": { "Apple": "Fruit", "Carrot": "Fruit" },
        "q-blank": ["cat"],
        "q-read": { "0": 1 }
    }))
}

pub(super) fn answer_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("answers must be an object, got {other}"),
    }
}

pub(super) fn submission(name: &str, answers: Map<String, Value>) -> Submission {
    Submission {
        answers: Some(Value::Object(answers)),
        submitter_name: Some(name.to_string()),
        submitter_email: Some(format!("{}@example.com", name.to_ascii_lowercase())),
        time_spent: Some(90),
        question_times: Some(
            [("q-sort".to_string(), 30), ("q-blank".to_string(), 60)]
                .into_iter()
                .collect(),
        ),
    }
}

pub(super) fn build_service() -> (
    FormService<MemoryRepository, RecordingNotifier>,
    Arc<MemoryRepository>,
    Arc<RecordingNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = FormService::new(repository.clone(), notifier.clone());
    (service, repository, notifier)
}

pub(super) fn form_router_with_service(
    service: FormService<MemoryRepository, RecordingNotifier>,
) -> axum::Router {
    form_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    forms: Arc<Mutex<Vec<Form>>>,
    responses: Arc<Mutex<Vec<FormResponse>>>,
}

impl FormRepository for MemoryRepository {
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
        Ok(self.forms.lock().expect("repository mutex poisoned").clone())
    }

    fn delete_form(&self, id: &FormId) -> Result<bool, RepositoryError> {
        let mut forms = self.forms.lock().expect("repository mutex poisoned");
        let before = forms.len();
        forms.retain(|form| &form.id != id);
        let removed = forms.len() != before;
        if removed {
            self.responses
                .lock()
                .expect("repository mutex poisoned")
                .retain(|response| &response.form_id != id);
        }
        Ok(removed)
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
        if guard.iter().any(|existing| {
            existing.form_id == response.form_id
                && existing
                    .submitter_email
                    .eq_ignore_ascii_case(&response.submitter_email)
        }) {
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
        Ok(self
            .responses
            .lock()
            .expect("repository mutex poisoned")
            .clone())
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    notices: Mutex<Vec<ResultsNotice>>,
    failing: bool,
    disabled: bool,
}

impl RecordingNotifier {
    pub(super) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(super) fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    pub(super) fn notices(&self) -> Vec<ResultsNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl ResultsNotifier for RecordingNotifier {
    fn enabled(&self) -> bool {
        !self.disabled
    }

    fn notify(&self, notice: ResultsNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        if self.failing {
            return Err(NotifyError::Transport("smtp offline".to_string()));
        }
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl FormRepository for UnavailableRepository {
    fn insert_form(&self, _form: Form) -> Result<Form, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace_form(&self, _form: Form) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_form(&self, _id: &FormId) -> Result<Option<Form>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_forms(&self) -> Result<Vec<Form>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_form(&self, _id: &FormId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_response(&self, _response: FormResponse) -> Result<FormResponse, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_first_response(
        &self,
        _response: FormResponse,
    ) -> Result<FormResponse, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_response(&self, _id: &ResponseId) -> Result<Option<FormResponse>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn responses_for(&self, _form_id: &FormId) -> Result<Vec<FormResponse>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all_responses(&self) -> Result<Vec<FormResponse>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
