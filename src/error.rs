use std::error::Error as StdError;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::IntoResponse,
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::player::PlayerInputError};

/// Message returned in place of internal error details in production.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
/// Message returned to rate-limited clients.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The storage backend failed.
    #[error("storage failure")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err)
    }
}

impl From<PlayerInputError> for ServiceError {
    fn from(err: PlayerInputError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// The client exhausted its request budget.
    #[error("Too many requests from this IP, please try again later.")]
    TooManyRequests { retry_after_secs: u64 },
    /// Internal server error; the detail only reaches clients outside production.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            storage @ ServiceError::Storage(_) => AppError::Internal(error_chain(&storage)),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by(|(left, _), (right, _)| left.cmp(right));

        let message = fields
            .into_iter()
            .flat_map(|(_, errors)| errors.iter())
            .map(|error| {
                error
                    .message
                    .as_deref()
                    .map(str::to_owned)
                    .unwrap_or_else(|| error.code.to_string())
            })
            .collect::<Vec<_>>()
            .join("; ");

        AppError::BadRequest(message)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Full error detail attached to 500 responses as a response extension.
///
/// The error-detail middleware renders it into the body in development and
/// drops it in production.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    success: bool,
    error: String,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl ErrorBody {
    /// Failure body carrying `error`.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            retry_after: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
            }
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorBody::new(message))).into_response()
            }
            AppError::TooManyRequests { retry_after_secs } => {
                let body = ErrorBody {
                    retry_after: Some(retry_after_secs),
                    ..ErrorBody::new(RATE_LIMIT_MESSAGE)
                };
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            AppError::Internal(detail) => {
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new(INTERNAL_ERROR_MESSAGE)),
                )
                    .into_response();
                response.extensions_mut().insert(ErrorDetail(detail));
                response
            }
        }
    }
}

/// Render an error and its sources as `outer: inner: root`.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use std::io;

    use validator::ValidationError;

    use super::*;

    #[test]
    fn storage_errors_carry_the_whole_chain() {
        let storage = StorageError::backend("postgres", io::Error::other("connection refused"));
        let app: AppError = ServiceError::from(storage).into();

        match app {
            AppError::Internal(detail) => {
                assert_eq!(
                    detail,
                    "storage failure: postgres backend failure: connection refused"
                );
            }
            other => panic!("expected internal error, got {other:?}"),
        }
    }

    #[test]
    fn input_errors_become_bad_requests() {
        let app: AppError = ServiceError::from(PlayerInputError::NegativeScore).into();
        assert!(matches!(app, AppError::BadRequest(message) if message == "Score must be non-negative"));
    }

    #[test]
    fn validation_messages_are_joined_by_field_name() {
        let required = |message: &'static str| {
            let mut error = ValidationError::new("required");
            error.message = Some(message.into());
            error
        };
        let mut errors = ValidationErrors::new();
        errors.add("username", required("Username is required"));
        errors.add("score", required("Score is required"));

        let app = AppError::from(errors);
        assert!(matches!(
            app,
            AppError::BadRequest(message) if message == "Score is required; Username is required"
        ));
    }

    #[test]
    fn internal_responses_hide_detail_in_the_body() {
        let response = AppError::Internal("db exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert_eq!(detail.0, "db exploded");
    }

    #[test]
    fn rate_limited_responses_carry_retry_after() {
        let response = AppError::TooManyRequests {
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }
}
