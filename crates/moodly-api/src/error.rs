//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use moodly_core::{store::StoreError, validate::ValidationErrors};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("{0}")]
  Validation(#[from] ValidationErrors),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error: missing rows become 404, uniqueness
  /// violations 409, refused changes 403, everything else 500.
  pub fn store<E: StoreError>(e: E) -> Self {
    if e.is_not_found() {
      ApiError::NotFound(e.to_string())
    } else if e.is_forbidden() {
      ApiError::Forbidden(e.to_string())
    } else if e.is_conflict() {
      ApiError::Conflict(e.to_string())
    } else {
      ApiError::Store(Box::new(e))
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match &self {
      ApiError::Validation(errors) => json!({
        "error":  "validation failed",
        "fields": errors,
      }),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        json!({ "error": e.to_string() })
      }
      ApiError::BadRequest(m)
      | ApiError::Unauthorized(m)
      | ApiError::Forbidden(m)
      | ApiError::NotFound(m)
      | ApiError::Conflict(m) => json!({ "error": m }),
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("row missing")]
  struct Missing;

  impl StoreError for Missing {
    fn is_not_found(&self) -> bool { true }
  }

  #[derive(Debug, Error)]
  #[error("disk on fire")]
  struct Broken;

  impl StoreError for Broken {}

  #[derive(Debug, Error)]
  #[error("not yours")]
  struct Refused;

  impl StoreError for Refused {
    fn is_forbidden(&self) -> bool { true }
  }

  #[test]
  fn store_errors_are_classified() {
    assert_eq!(ApiError::store(Missing).status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::store(Refused).status(), StatusCode::FORBIDDEN);
    assert_eq!(ApiError::store(Broken).status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[tokio::test]
  async fn validation_errors_list_fields() {
    let mut errors = ValidationErrors::default();
    errors.push("moodValue", "is required");
    let resp = ApiError::from(errors).into_response();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "validation failed");
    assert_eq!(json["fields"][0]["field"], "moodValue");
  }
}
