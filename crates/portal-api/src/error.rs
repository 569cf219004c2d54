//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Responses carry a short generic message; internal detail is logged, never
//! returned to the caller.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use portal_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("email already registered")]
  EmailTaken,

  #[error("token error: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!(%rejection, "rejected request body");
    ApiError::BadRequest("invalid request body".into())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    tracing::debug!(%rejection, "rejected path parameter");
    ApiError::BadRequest("invalid path parameter".into())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    tracing::debug!(%rejection, "rejected query string");
    ApiError::BadRequest("invalid query parameters".into())
  }
}

impl ApiError {
  fn status_and_message(&self) -> (StatusCode, String) {
    match self {
      ApiError::Core(e) => match e {
        CoreError::InvalidInput(m) => (StatusCode::BAD_REQUEST, m.clone()),
        CoreError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthorized".into()),
        CoreError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden".into()),
        CoreError::NotFound(_) => (StatusCode::NOT_FOUND, "request not found".into()),
        CoreError::Overlap(_) => (
          StatusCode::CONFLICT,
          "resource already booked for that interval".into(),
        ),
        CoreError::AlreadyDecided { status, .. } => {
          (StatusCode::CONFLICT, format!("request already {status}"))
        }
        CoreError::Storage(_) => internal(),
      },
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::InvalidCredentials => {
        (StatusCode::UNAUTHORIZED, "invalid credentials".into())
      }
      ApiError::EmailTaken => (StatusCode::CONFLICT, "email already exists".into()),
      ApiError::Token(_) | ApiError::PasswordHash(_) => internal(),
    }
  }
}

fn internal() -> (StatusCode, String) {
  (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into())
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = self.status_and_message();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": message }))).into_response()
  }
}
