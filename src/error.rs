//!
//! # Error Normalization
//!
//! This module defines `AppError`, the single failure type returned by every handler,
//! extractor, middleware and store in the application.
//!
//! `AppError` implements `actix_web::error::ResponseError`, which is the one place where a
//! failure kind is translated into a status code and the uniform JSON envelope
//! `{ "error": string, "details"?: [string] }`. Internal detail (database messages, hashing
//! failures) is written to the log and never copied into the response body.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error` and `bcrypt::BcryptError` let callers use `?` freely.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::validation::collect_messages;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Wire shape of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorBody {
    /// Short, client-safe description of the failure.
    pub error: String,
    /// Per-field messages, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Represents all possible failures that can occur while serving a request.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request body or query failed its declared schema (HTTP 400).
    /// Carries one message per violated field.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    /// A unique field (e.g. `email`) already holds the submitted value (HTTP 409).
    #[error("{field} already exists")]
    Conflict { field: String },
    /// A path identifier could not be parsed (HTTP 400).
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),
    /// Credentials or the `Authorization` header are missing or wrong (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The bearer token is malformed, unsigned or signed with another key (HTTP 401).
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// The bearer token verified but is past its expiry (HTTP 401).
    #[error("token expired")]
    ExpiredToken,
    /// The resource does not exist or is not visible to the caller (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),
    /// Anything else (HTTP 500). The message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn conflict(field: impl Into<String>) -> Self {
        AppError::Conflict {
            field: field.into(),
        }
    }

    /// Builds the client-facing body for this error.
    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            AppError::Validation(details) => ("Validation error".to_string(), Some(details.clone())),
            AppError::Conflict { field } => (format!("{} already exists", field), None),
            AppError::MalformedIdentifier(_) => ("Invalid ID format".to_string(), None),
            AppError::Unauthorized(msg) => (msg.clone(), None),
            AppError::InvalidToken(_) => ("Invalid token".to_string(), None),
            AppError::ExpiredToken => ("Token expired".to_string(), None),
            AppError::NotFound(msg) => (msg.clone(), None),
            AppError::Internal(_) => ("Something went wrong".to_string(), None),
        };
        ErrorBody { error, details }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized(_) | AppError::InvalidToken(_) | AppError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{} {}", status.as_u16(), self);
        }
        HttpResponse::build(status).json(self.body())
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`, a unique violation becomes `Conflict` naming the column
/// behind the violated constraint, everything else is an internal failure.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AppError::conflict(unique_field(db.constraint()))
            }
            _ => AppError::Internal(format!("database error: {}", error)),
        }
    }
}

/// Recovers the column name from a `<table>_<column>_key` constraint name.
fn unique_field(constraint: Option<&str>) -> String {
    constraint
        .and_then(|name| name.strip_suffix("_key"))
        .and_then(|name| name.split_once('_'))
        .map(|(_, column)| column.to_string())
        .unwrap_or_else(|| "value".to_string())
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::Validation(collect_messages(&errors))
    }
}

/// Converts `jsonwebtoken::errors::Error` into `ExpiredToken` or `InvalidToken`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        match error.kind() {
            JwtErrorKind::ExpiredSignature => AppError::ExpiredToken,
            _ => AppError::InvalidToken(error.to_string()),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(format!("password hashing failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use pretty_assertions::assert_eq;

    async fn body_of(error: AppError) -> (StatusCode, ErrorBody) {
        let response = error.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (AppError::Validation(vec!["title: required".into()]), 400),
            (AppError::conflict("email"), 409),
            (AppError::MalformedIdentifier("abc".into()), 400),
            (AppError::Unauthorized("Missing token".into()), 401),
            (AppError::InvalidToken("InvalidSignature".into()), 401),
            (AppError::ExpiredToken, 401),
            (AppError::not_found("Task"), 404),
            (AppError::Internal("boom".into()), 500),
        ];
        for (error, expected) in cases {
            assert_eq!(error.error_response().status().as_u16(), expected, "{:?}", error);
        }
    }

    #[actix_rt::test]
    async fn test_validation_body_lists_details() {
        let (status, body) = body_of(AppError::Validation(vec![
            "priority: must be one of low, medium, high".into(),
            "title: Title is required".into(),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Validation error");
        assert_eq!(body.details.map(|d| d.len()), Some(2));
    }

    #[actix_rt::test]
    async fn test_conflict_names_field() {
        let (_, body) = body_of(AppError::conflict("email")).await;
        assert_eq!(
            body,
            ErrorBody {
                error: "email already exists".into(),
                details: None
            }
        );
    }

    #[actix_rt::test]
    async fn test_internal_detail_is_withheld() {
        let (status, body) =
            body_of(AppError::Internal("connection refused at 10.0.0.3:5432".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Something went wrong");
        assert!(body.details.is_none());
    }

    #[actix_rt::test]
    async fn test_token_errors_do_not_leak_reason() {
        let (_, body) = body_of(AppError::InvalidToken("InvalidSignature".into())).await;
        assert_eq!(body.error, "Invalid token");
        let (_, body) = body_of(AppError::ExpiredToken).await;
        assert_eq!(body.error, "Token expired");
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, AppError::NotFound(_)));

        let error: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(error, AppError::Internal(_)));
    }

    #[test]
    fn test_unique_field_from_constraint_name() {
        assert_eq!(unique_field(Some("users_email_key")), "email");
        assert_eq!(unique_field(Some("tasks_pkey")), "value");
        assert_eq!(unique_field(None), "value");
    }

    #[test]
    fn test_jwt_error_kinds() {
        let expired: AppError = jsonwebtoken::errors::Error::from(JwtErrorKind::ExpiredSignature).into();
        assert!(matches!(expired, AppError::ExpiredToken));

        let tampered: AppError =
            jsonwebtoken::errors::Error::from(JwtErrorKind::InvalidSignature).into();
        assert!(matches!(tampered, AppError::InvalidToken(_)));
    }
}
