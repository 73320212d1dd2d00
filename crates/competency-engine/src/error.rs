use crate::competency::{
    EvaluationError, GradeImportError, StorageError, TemplateRejected, ValidationReport,
};
use crate::config::ConfigError;
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
    Json(serde_json::Error),
    Storage(StorageError),
    Import(GradeImportError),
    Evaluation(EvaluationError),
    Rejected(TemplateRejected),
    EntryLimit { limit: usize, found: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Json(err) => write!(f, "invalid JSON payload: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Import(err) => write!(f, "grade import error: {}", err),
            AppError::Evaluation(err) => write!(f, "evaluation error: {}", err),
            AppError::Rejected(err) => write!(f, "template rejected: {}", err),
            AppError::EntryLimit { limit, found } => {
                write!(f, "received {} entries, limit is {}", found, limit)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Evaluation(err) => Some(err),
            AppError::Rejected(err) => Some(err),
            AppError::EntryLimit { .. } => None,
        }
    }
}

impl AppError {
    /// Validation findings carried by a rejected template, if any.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            AppError::Rejected(rejection) => Some(rejection.report()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Json(_)
            | AppError::Storage(_)
            | AppError::Import(_)
            | AppError::Evaluation(_)
            | AppError::EntryLimit { .. } => StatusCode::BAD_REQUEST,
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match self.report() {
            Some(report) => json!({ "error": self.to_string(), "report": report }),
            None => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
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

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<GradeImportError> for AppError {
    fn from(value: GradeImportError) -> Self {
        Self::Import(value)
    }
}

impl From<EvaluationError> for AppError {
    fn from(value: EvaluationError) -> Self {
        Self::Evaluation(value)
    }
}

impl From<TemplateRejected> for AppError {
    fn from(value: TemplateRejected) -> Self {
        Self::Rejected(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_problems_map_to_bad_request() {
        let response = AppError::EntryLimit {
            limit: 2,
            found: 5,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejected_templates_map_to_unprocessable_entity() {
        let err = AppError::from(TemplateRejected::Invalid(ValidationReport::default()));
        assert!(err.report().is_some());
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn io_failures_map_to_internal_error() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(err.report().is_none());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
