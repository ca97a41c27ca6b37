//! Request-body validation.
//!
//! Schemas are plain structs deriving `validator::Validate`. The [`ValidatedJson`] extractor
//! deserializes and validates a body before the handler runs, so a handler never sees input
//! that violates its schema. Failures are reported as one message per violated field.

use std::borrow::Cow;

use actix_web::{dev::Payload, web, Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;
use crate::models::{TaskPriority, TaskStatus};

/// A JSON body that has already passed its `Validate` rules.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
{
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let json = web::Json::<T>::from_request(req, payload);
        Box::pin(async move {
            let value = json.await?.into_inner();
            value.validate().map_err(AppError::from)?;
            Ok(ValidatedJson(value))
        })
    }
}

/// Flattens `ValidationErrors` into `"field: message"` lines, sorted by field name.
///
/// Every violation of every field is kept, not just the first one.
pub fn collect_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| Cow::Owned(format!("failed `{}` check", error.code)));
                format!("{}: {}", field, message)
            })
        })
        .collect()
}

fn enum_violation(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

pub fn validate_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<TaskStatus>()
        .map(|_| ())
        .map_err(|message| enum_violation("status", message))
}

pub fn validate_priority(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<TaskPriority>()
        .map(|_| ())
        .map_err(|message| enum_violation("priority", message))
}

/// Display names are stored trimmed, so the length bounds apply to the trimmed value.
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if (1..=100).contains(&len) {
        Ok(())
    } else {
        Err(enum_violation(
            "length",
            "Name must be between 1 and 100 characters".to_string(),
        ))
    }
}

/// Parses a path identifier, rejecting anything that is not a UUID.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::MalformedIdentifier(raw.to_string()))
}

/// JSON extractor config routing payload errors through the error normalizer.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::Validation(vec![err.to_string()]).into())
}

/// Query extractor config routing malformed filters through the error normalizer.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::Validation(vec![err.to_string()]).into())
}
