use crate::config::ConfigError;
use crate::forms::{FormServiceError, IntakeError, RepositoryError};
use crate::telemetry::TelemetryError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Json(serde_json::Error),
    Payload(JsonRejection),
    Forms(FormServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Json(err) => write!(f, "invalid json: {}", err),
            AppError::Payload(err) => write!(f, "invalid request body: {}", err.body_text()),
            AppError::Forms(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Payload(err) => Some(err),
            AppError::Forms(err) => Some(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Json(_) | AppError::Payload(_) => StatusCode::BAD_REQUEST,
            AppError::Forms(err) => match err {
                FormServiceError::FormNotFound(_)
                | FormServiceError::ResponseNotFound(_)
                | FormServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                FormServiceError::Intake(IntakeError::DuplicateSubmission(_))
                | FormServiceError::Intake(IntakeError::QuestionsLocked)
                | FormServiceError::Repository(RepositoryError::Conflict)
                | FormServiceError::Repository(RepositoryError::DuplicateSubmitter(_)) => {
                    StatusCode::CONFLICT
                }
                FormServiceError::Intake(_) => StatusCode::BAD_REQUEST,
                FormServiceError::Repository(RepositoryError::Unavailable(_))
                | FormServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::Payload(value)
    }
}

impl From<FormServiceError> for AppError {
    fn from(value: FormServiceError) -> Self {
        Self::Forms(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormId;

    #[test]
    fn form_errors_map_to_caller_facing_statuses() {
        let missing = AppError::from(FormServiceError::FormNotFound(FormId("form-x".into())));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let duplicate = AppError::from(FormServiceError::Intake(
            IntakeError::DuplicateSubmission("ana@example.com".into()),
        ));
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let invalid = AppError::from(FormServiceError::Intake(IntakeError::MissingAnswers));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
