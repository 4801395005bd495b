//! Whisper-content webhook — fetched by the transport at bridge time to
//! render the short spoken message played to the call recipient.

use axum::{extract::Query, http::StatusCode, response::Response};
use ringline_core::{
  flow::Directive,
  number::{WhisperLanguage, WhisperVoice},
};
use serde::Deserialize;

use crate::{error::Error, handlers::xml_response, xml};

#[derive(Debug, Deserialize)]
pub struct WhisperParams {
  #[serde(default)]
  pub message:  String,
  #[serde(default)]
  pub language: String,
  #[serde(default)]
  pub voice:    String,
}

/// `GET /telephony/whisper` — language and voice are validated against the
/// closed enumerations; anything else is a bad request.
pub async fn handler(
  Query(params): Query<WhisperParams>,
) -> Result<Response, Error> {
  let message = params.message.trim();
  if message.is_empty() {
    return Err(Error::BadRequest("message is required".to_string()));
  }
  let language = WhisperLanguage::from_tag(&params.language).ok_or_else(|| {
    Error::BadRequest(format!("unknown language {:?}", params.language))
  })?;
  let voice = WhisperVoice::from_tag(&params.voice).ok_or_else(|| {
    Error::BadRequest(format!("unknown voice {:?}", params.voice))
  })?;

  Ok(xml_response(
    StatusCode::OK,
    xml::render(&[Directive::Say {
      message: message.to_string(),
      language,
      voice,
    }]),
  ))
}
