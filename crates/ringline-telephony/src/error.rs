//! Error types and axum `IntoResponse` implementation for the webhook layer.
//!
//! Only the status and whisper webhooks surface errors as HTTP statuses; the
//! voice webhook answers every rejection with a hangup document instead (see
//! `handlers::voice`).

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("internal error: {0}")]
  Internal(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
      Error::Internal(msg) => {
        (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
      }
    }
  }
}

impl From<ringline_core::Error> for Error {
  fn from(e: ringline_core::Error) -> Self {
    use ringline_core::Error as E;
    match e {
      E::Validation(msg) => Error::BadRequest(msg),
      E::CallNotFound(id) => Error::NotFound(format!("call {id} not found")),
      other => Error::Internal(other.to_string()),
    }
  }
}
