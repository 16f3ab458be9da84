use crate::config::ConfigError;
use crate::content::TreeError;
use crate::polls::editing::ValidationErrors;
use crate::polls::vote::VoteError;
use crate::telemetry::TelemetryError;
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
    Tree(TreeError),
    Vote(VoteError),
    Validation(ValidationErrors),
    NotFound(String),
    MethodNotAllowed,
    Unauthorized,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Tree(err) => write!(f, "content error: {}", err),
            AppError::Vote(err) => write!(f, "vote rejected: {}", err),
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::NotFound(what) => write!(f, "not found: {}", what),
            AppError::MethodNotAllowed => write!(f, "method not allowed"),
            AppError::Unauthorized => write!(f, "editor credentials required"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Tree(err) => Some(err),
            AppError::Vote(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::NotFound(_) | AppError::MethodNotAllowed | AppError::Unauthorized => None,
        }
    }
}

fn tree_status(err: &TreeError) -> StatusCode {
    match err {
        TreeError::NotFound => StatusCode::NOT_FOUND,
        TreeError::Conflict => StatusCode::CONFLICT,
        TreeError::InvalidPlacement(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TreeError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Tree(err) => tree_status(err),
            AppError::Vote(VoteError::Tree(err)) => tree_status(err),
            AppError::Vote(VoteError::ChoiceNotFound(_) | VoteError::NotAPoll(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            AppError::Validation(errors) => Json(json!({
                "error": self.to_string(),
                "fields": errors.fields,
            })),
            _ => Json(json!({ "error": self.to_string() })),
        };
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

impl From<TreeError> for AppError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<VoteError> for AppError {
    fn from(value: VoteError) -> Self {
        Self::Vote(value)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}
