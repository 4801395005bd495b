//! Status-changed webhook — idempotent completion write for an existing
//! call. Transports may retry or reorder deliveries; the engine tolerates
//! both, so a bare acknowledgment is all this handler returns.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Form};
use ringline_core::{flow::CallStatusUpdate, store::EngineStore, Engine};
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Deserialize)]
pub struct StatusWebhook {
  #[serde(default)]
  pub call_id:       String,
  #[serde(default)]
  pub status:        String,
  pub duration_secs: Option<u32>,
}

/// `POST /telephony/status`
pub async fn handler<S>(
  State(engine): State<Arc<Engine<S>>>,
  Form(body): Form<StatusWebhook>,
) -> Result<StatusCode, Error>
where
  S: EngineStore,
{
  engine
    .record_call_status(CallStatusUpdate {
      provider_call_id: body.call_id,
      status:           body.status,
      duration_secs:    body.duration_secs,
    })
    .await?;
  Ok(StatusCode::OK)
}
