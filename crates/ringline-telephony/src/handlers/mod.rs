//! Webhook handlers for the call-control transport.

pub mod status;
pub mod voice;
pub mod whisper;

use axum::{
  http::{header, StatusCode},
  response::{IntoResponse, Response},
};

/// Wrap a rendered markup document as an HTTP response.
pub(crate) fn xml_response(status: StatusCode, body: Vec<u8>) -> Response {
  (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
}
