use std::{collections::BTreeMap, fmt};

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const TOO_LONG: &str = "Ensure this field has no more than 255 characters.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const DUPLICATE_EMAIL: &str = "user with this email already exists.";
pub const NON_FIELD: &str = "non_field_errors";

/// Field name -> messages, serialized as a flat JSON object.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Not found.")]
    NotFound,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                warn!(?errors, "validation failed");
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::Store(StoreError::DuplicateEmail) => {
                warn!("duplicate email");
                (
                    StatusCode::BAD_REQUEST,
                    Json(FieldErrors::single("email", DUPLICATE_EMAIL)),
                )
                    .into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": msg }))).into_response()
            }
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(json!({ "detail": msg })),
            )
                .into_response(),
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": msg }))).into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            ApiError::Store(e) => {
                error!(error = %e, "store failure");
                internal_response()
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal failure");
                internal_response()
            }
        }
    }
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error" })),
    )
        .into_response()
}

/// JSON body extractor whose rejections render as `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// Trims a required string field, recording a message when it is missing,
/// blank or longer than `max` characters.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max: usize,
) -> Option<String> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(v) => non_blank_text(errors, field, v, max),
    }
}

pub fn non_blank_text(
    errors: &mut FieldErrors,
    field: &str,
    value: String,
    max: usize,
) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if v.chars().count() > max {
        errors.add(field, TOO_LONG);
        return None;
    }
    Some(v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_serialize_as_flat_object() {
        let mut errors = FieldErrors::default();
        errors.add("title", REQUIRED);
        errors.add("cost", "bad");
        errors.add("cost", "worse");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"][0], REQUIRED);
        assert_eq!(json["cost"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn validation_error_displays_each_message() {
        let mut errors = FieldErrors::default();
        errors.add("password", "too short");
        errors.add("email", INVALID_EMAIL);
        assert_eq!(
            ApiError::Validation(errors).to_string(),
            "invalid input: email: Enter a valid email address.; password: too short"
        );
    }

    #[test]
    fn required_text_trims_and_checks_length() {
        let mut errors = FieldErrors::default();
        assert_eq!(
            required_text(&mut errors, "name", Some("  Tester ".into()), 255),
            Some("Tester".into())
        );
        assert!(required_text(&mut errors, "a", None, 255).is_none());
        assert!(required_text(&mut errors, "b", Some("   ".into()), 255).is_none());
        assert!(required_text(&mut errors, "c", Some("x".repeat(256)), 255).is_none());
        assert_eq!(errors.get("a"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("b"), Some(&[BLANK.to_string()][..]));
        assert_eq!(errors.get("c"), Some(&[TOO_LONG.to_string()][..]));
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        let res = ApiError::Unauthorized("nope".into()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(
            ApiError::Store(StoreError::DuplicateEmail)
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
