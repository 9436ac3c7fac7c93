//! API error type and [`axum::response::IntoResponse`] implementation.

use std::collections::BTreeMap;

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use ligtas_core::{
  store::{Failure, StoreError},
  workflow::Rejection,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("one or more fields are invalid")]
  Validation(#[from] ValidationErrors),

  #[error("this request must carry an If-Match header")]
  PreconditionRequired,

  #[error("the case has changed since it was read")]
  PreconditionFailed,

  #[error("conflict: {0}")]
  Conflict(String),

  #[error(transparent)]
  Rejected(Rejection),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Map a backend error onto the HTTP taxonomy by its [`Failure`] class.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.failure() {
      Failure::NotFound => Self::NotFound(e.to_string()),
      Failure::Conflict | Failure::Duplicate => Self::Conflict(e.to_string()),
      Failure::Rejected => match e.rejection() {
        Some(r) => Self::Rejected(r.clone()),
        None => Self::Store(Box::new(e)),
      },
      Failure::Internal => Self::Store(Box::new(e)),
    }
  }
}

/// Collect messages from nested validation errors, keyed by dotted path.
fn field_messages(
  errors: &ValidationErrors,
  prefix: &str,
  out: &mut BTreeMap<String, Vec<String>>,
) {
  for (field, kind) in errors.errors() {
    let path = if prefix.is_empty() {
      field.to_string()
    } else {
      format!("{prefix}.{field}")
    };
    match kind {
      ValidationErrorsKind::Field(list) => {
        let messages = list
          .iter()
          .map(|e| match &e.message {
            Some(m) => m.to_string(),
            None => e.code.to_string(),
          })
          .collect();
        out.insert(path, messages);
      }
      ValidationErrorsKind::Struct(inner) => field_messages(inner, &path, out),
      ValidationErrorsKind::List(items) => {
        for (i, inner) in items {
          field_messages(inner, &format!("{path}[{i}]"), out);
        }
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized(m) => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": m }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"ligtas\""),
        );
        return res;
      }
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Validation(errors) => {
        let mut details = BTreeMap::new();
        field_messages(errors, "", &mut details);
        let body = Json(json!({
          "error": self.to_string(),
          "details": details,
        }));
        return (StatusCode::BAD_REQUEST, body).into_response();
      }
      ApiError::PreconditionRequired => {
        (StatusCode::PRECONDITION_REQUIRED, self.to_string())
      }
      ApiError::PreconditionFailed => (StatusCode::PRECONDITION_FAILED, self.to_string()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Rejected(r) => {
        let mut body = serde_json::to_value(r).unwrap_or_else(|_| json!({}));
        body["error"] = json!(r.to_string());
        body["reason"] = json!(r.reason());
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
