use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

use super::distractors::{DistractorRequest, DistractorSuggestions};
use super::domain::{FormDraft, FormId, ResponseId, Submission};
use super::repository::{FormRepository, ResultsNotifier};
use super::service::{FormService, FormServiceError};
use crate::error::AppError;

/// Router builder exposing the form authoring, submission and reporting endpoints.
pub fn form_router<R, N>(service: Arc<FormService<R, N>>) -> Router
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    Router::new()
        .route(
            "/api/forms",
            post(create_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route(
            "/api/forms/responses/all",
            get(all_responses_handler::<R, N>),
        )
        .route(
            "/api/forms/analytics/global",
            get(global_analytics_handler::<R, N>),
        )
        .route("/api/forms/generate-distractors", post(distractors_handler::<R, N>))
        .route(
            "/api/forms/:form_id",
            get(get_handler::<R, N>)
                .put(update_handler::<R, N>)
                .delete(delete_handler::<R, N>),
        )
        .route(
            "/api/forms/:form_id/responses",
            post(submit_handler::<R, N>).get(responses_handler::<R, N>),
        )
        .route(
            "/api/forms/:form_id/responses/:response_id",
            get(review_handler::<R, N>),
        )
        .route("/api/forms/:form_id/preview", post(preview_handler::<R, N>))
        .route(
            "/api/forms/:form_id/analytics",
            get(analytics_handler::<R, N>),
        )
        .route(
            "/api/forms/:form_id/export.csv",
            get(export_handler::<R, N>),
        )
        .with_state(service)
}

type SharedService<R, N> = State<Arc<FormService<R, N>>>;

pub(crate) async fn create_handler<R, N>(
    State(service): SharedService<R, N>,
    draft: Result<Json<FormDraft>, JsonRejection>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    let Json(draft) = match draft {
        Ok(body) => body,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    match service.create_form(draft) {
        Ok(form) => (StatusCode::CREATED, Json(form)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, N>(State(service): SharedService<R, N>) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    match service.list_forms() {
        Ok(forms) => (StatusCode::OK, Json(forms)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(form_id): Path<String>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    match service.get_form(&FormId(form_id)) {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(form_id): Path<String>,
    draft: Result<Json<FormDraft>, JsonRejection>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    let Json(draft) = match draft {
        Ok(body) => body,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    match service.update_form(&FormId(form_id), draft) {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(form_id): Path<String>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    match service.delete_form(&FormId(form_id)) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Form deleted successfully" })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(form_id): Path<String>,
    submission: Result<Json<Submission>, JsonRejection>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    let Json(submission) = match submission {
        Ok(body) => body,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    match service.submit(&FormId(form_id), submission) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn responses_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(form_id): Path<String>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    match service.responses_for_form(&FormId(form_id)) {
        Ok(responses) => (StatusCode::OK, Json(responses)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn all_responses_handler<R, N>(State(service): SharedService<R, N>) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    match service.all_responses() {
        Ok(responses) => (StatusCode::OK, Json(responses)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<R, N>(
    State(service): SharedService<R, N>,
    Path((form_id, response_id)): Path<(String, String)>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    match service.review(&FormId(form_id), &ResponseId(response_id)) {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn preview_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(form_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    let Json(payload) = match payload {
        Ok(body) => body,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    // Accept either `{ "answers": {...} }` or the bare answer map.
    let answers = match payload {
        Value::Object(mut body) => match body.remove("answers") {
            Some(Value::Object(answers)) => answers,
            Some(_) => Map::new(),
            None => body,
        },
        _ => Map::new(),
    };

    match service.preview(&FormId(form_id), &answers) {
        Ok(card) => (StatusCode::OK, Json(card)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn analytics_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(form_id): Path<String>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    match service.form_analytics(&FormId(form_id)) {
        Ok(analytics) => (StatusCode::OK, Json(analytics)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn global_analytics_handler<R, N>(
    State(service): SharedService<R, N>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    match service.global_analytics(Utc::now()) {
        Ok(analytics) => (StatusCode::OK, Json(analytics)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(form_id): Path<String>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    let form_id = FormId(form_id);
    match service.export_csv(&form_id) {
        Ok(csv) => {
            let disposition = format!("attachment; filename=\"{form_id}-responses.csv\"");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                csv,
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn distractors_handler<R, N>(
    State(service): SharedService<R, N>,
    request: Result<Json<DistractorRequest>, JsonRejection>,
) -> Response
where
    R: FormRepository + 'static,
    N: ResultsNotifier + 'static,
{
    let Json(request) = match request {
        Ok(body) => body,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    let distractors = service.suggest_distractors(&request.text, &request.correct_answers);
    (StatusCode::OK, Json(DistractorSuggestions { distractors })).into_response()
}

fn error_response(error: FormServiceError) -> Response {
    AppError::from(error).into_response()
}
