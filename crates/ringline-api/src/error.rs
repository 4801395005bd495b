//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Every response body carries a
/// machine-readable `code` alongside the human-readable `error` message.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("invalid session token")]
  InvalidToken,

  /// Business-rule rejection; no resource was consumed.
  #[error("{message}")]
  Conflict { code: &'static str, message: String },

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  fn code(&self) -> &'static str {
    match self {
      ApiError::NotFound(_) => "not_found",
      ApiError::BadRequest(_) => "bad_request",
      ApiError::InvalidToken => "invalid_token",
      ApiError::Conflict { code, .. } => code,
      ApiError::Internal(_) => "internal",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::InvalidToken => StatusCode::FORBIDDEN,
      ApiError::Conflict { .. } => StatusCode::CONFLICT,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = json!({ "error": self.to_string(), "code": self.code() });
    (status, Json(body)).into_response()
  }
}

impl From<ringline_core::Error> for ApiError {
  fn from(e: ringline_core::Error) -> Self {
    use ringline_core::Error as E;
    match e {
      E::Validation(msg) => ApiError::BadRequest(msg),
      E::InvalidToken => ApiError::InvalidToken,
      E::SessionNotFound(id) => {
        ApiError::NotFound(format!("session {id} not found"))
      }
      E::CampaignNotFound(id) => {
        ApiError::NotFound(format!("campaign {id} not found"))
      }
      E::NumberNotFound(digits) => {
        ApiError::NotFound(format!("number {digits} not found"))
      }
      E::CallNotFound(id) => ApiError::NotFound(format!("call {id} not found")),
      E::CampaignInactive(id) => ApiError::Conflict {
        code:    "campaign_inactive",
        message: format!("campaign {id} is not active"),
      },
      E::NoNumberAvailable => ApiError::Conflict {
        code:    "no_number_available",
        message: "no number available for assignment".to_string(),
      },
      // BotRejected is handled at the session handler; anything that falls
      // through here is a server-side problem.
      other => ApiError::Internal(other.to_string()),
    }
  }
}
