//! Inbound-call webhook — builds and returns the call-control directive
//! sequence for a call that just reached one of our tracking numbers.
//!
//! Every rejection path answers with a hangup document rather than an error
//! status: a misconfigured or unknown number must fail safe on the telephone
//! side, and retrying would not change the configuration.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response, Form};
use ringline_core::{flow::InboundCall, store::EngineStore, Engine, Error};
use serde::Deserialize;

use crate::{handlers::xml_response, xml};

/// Form fields posted by the call-control transport. Missing fields arrive
/// as empty strings and are rejected by the engine's validation, which keeps
/// the response a well-formed hangup document instead of a 422.
#[derive(Debug, Deserialize)]
pub struct VoiceWebhook {
  #[serde(default)]
  pub call_id: String,
  #[serde(default)]
  pub to:      String,
  #[serde(default)]
  pub from:    String,
  #[serde(default)]
  pub status:  String,
}

/// `POST /telephony/voice`
pub async fn handler<S>(
  State(engine): State<Arc<Engine<S>>>,
  Form(body): Form<VoiceWebhook>,
) -> Response
where
  S: EngineStore,
{
  let inbound = InboundCall {
    provider_call_id: body.call_id,
    dialed:           body.to,
    caller:           body.from,
    status:           body.status,
  };

  match engine.handle_inbound_call(inbound).await {
    Ok(flow) => {
      tracing::debug!(call = %flow.call.call_id, "dispatching call flow");
      xml_response(StatusCode::OK, xml::render(&flow.directives))
    }
    Err(Error::Store(e)) => {
      tracing::error!(error = %e, "store failure handling inbound call");
      xml_response(StatusCode::INTERNAL_SERVER_ERROR, xml::hangup())
    }
    Err(e) => {
      tracing::warn!(error = %e, "rejecting inbound call");
      xml_response(StatusCode::OK, xml::hangup())
    }
  }
}
