//! Extractors whose rejections render as [`ApiError`] JSON bodies.
//!
//! Handlers use these in place of the plain axum extractors so that a
//! malformed body, path or query string is reported in the same
//! `{"error": ..}` shape as every other failure.

use axum::{
  extract::{
    FromRequest, FromRequestParts,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  response::{IntoResponse, Response},
};
use moodly_core::validate::ValidationErrors;
use serde::Serialize;

use crate::error::ApiError;

/// JSON request body and response payload.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
  fn into_response(self) -> Response { axum::Json(self.0).into_response() }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    match rejection {
      // Well-formed JSON of the wrong shape is a field problem.
      JsonRejection::JsonDataError(e) => {
        let mut errors = ValidationErrors::default();
        errors.push("body", e.body_text());
        ApiError::Validation(errors)
      }
      other => ApiError::BadRequest(other.body_text()),
    }
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}
