//!
//! # Custom Error Handling
//!
//! This module defines the error type `AppError` used throughout the service.
//! Every handler and store operation returns `Result<_, AppError>`, so failures from the
//! database, validation and authentication all funnel through one place.
//!
//! `AppError` implements `actix_web::error::ResponseError`, which renders each variant as
//! an HTTP status with a `{"error": "<message>"}` JSON body.
//! The `json_error_handler`, `query_error_handler` and `path_error_handler` functions plug
//! into actix's extractor configs so that malformed requests use the same body shape.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};
use log::error;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Postgres SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for `foreign_key_violation`.
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

pub(crate) const DUPLICATE_MESSAGE: &str = "A record with the same unique value already exists";
pub(crate) const REFERENCE_MESSAGE: &str = "Record violates a reference constraint";
pub(crate) const ASSIGNEE_DELETE_MESSAGE: &str = "User is assigned to tasks and cannot be deleted";

/// Represents all possible errors that can occur within the application.
///
/// Each variant carries a message that is sent back to the client as-is, so
/// messages must not leak internals (SQL, hashes, secrets).
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed or is required but missing (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The caller is authenticated but may not perform the action (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Malformed or semantically invalid request (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// The request collides with existing state, e.g. a duplicate unique field
    /// or a delete of a still-referenced row (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Unexpected server-side error (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// Error originating from database operations (HTTP 500).
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// Input validation failed (HTTP 422 Unprocessable Entity).
    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl AppError {
    /// Shorthand for the common "<what> with id <id> not found" message.
    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::NotFound(format!("{} with id {} not found", entity, id))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let msg = match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => msg.as_str(),
            // Database details stay in the server log.
            AppError::DatabaseError(_) => "Database error",
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": msg }))
    }
}

/// Maps `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes a 404, unique and foreign-key violations become 409 and
/// everything else is logged and reported as a database error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => AppError::Conflict(DUPLICATE_MESSAGE.into()),
                Some(PG_FOREIGN_KEY_VIOLATION) => AppError::Conflict(REFERENCE_MESSAGE.into()),
                _ => {
                    error!("database error: {}", error);
                    AppError::DatabaseError(error.to_string())
                }
            },
            _ => {
                error!("database error: {}", error);
                AppError::DatabaseError(error.to_string())
            }
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`,
/// preserving the per-field messages.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let cases = [
            (AppError::Unauthorized("Invalid token".into()), 401),
            (AppError::Forbidden("Not yours".into()), 403),
            (AppError::BadRequest("Invalid input".into()), 400),
            (AppError::NotFound("Resource not found".into()), 404),
            (AppError::Conflict("Duplicate".into()), 409),
            (AppError::ValidationError("Too short".into()), 422),
            (AppError::InternalServerError("Server error".into()), 500),
            (AppError::DatabaseError("connection reset".into()), 500),
        ];

        for (error, expected) in cases {
            assert_eq!(error.error_response().status(), expected, "{:?}", error);
        }
    }

    #[actix_web::test]
    async fn test_database_error_body_is_generic() {
        let response = AppError::DatabaseError("relation \"users\" does not exist".into())
            .error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Database error");
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[test]
    fn test_not_found_message() {
        let error = AppError::not_found("Task", 7);
        assert_eq!(error.to_string(), "Not Found: Task with id 7 not found");
    }
}
