//! Handlers for `/sessions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sessions` | Start a session; bots get `204 No Content` |
//! | `POST` | `/sessions/:id/end` | Body: `{"token":"…"}`; idempotent |

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use ringline_core::{
  correlate::NewSessionRequest,
  number::{ForwardingTarget, TrackingNumber},
  session::DeviceInfo,
  store::EngineStore,
  Engine, Error,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Start ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartBody {
  pub visitor_id: Option<Uuid>,
  pub company_id: Uuid,
  pub entry_url:  Option<String>,
  pub device:     DeviceBody,
}

#[derive(Debug, Deserialize)]
pub struct DeviceBody {
  pub width:      u32,
  pub height:     u32,
  pub user_agent: Option<String>,
}

/// The assigned number as shown to the tracking script.
#[derive(Debug, Serialize)]
pub struct NumberView {
  pub number_id:    Uuid,
  pub country_code: String,
  pub digits:       String,
  pub e164:         String,
}

impl From<TrackingNumber> for NumberView {
  fn from(n: TrackingNumber) -> Self {
    let e164 = n.e164();
    Self {
      number_id: n.number_id,
      country_code: n.country_code,
      digits: n.digits,
      e164,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
  pub session_id:         Uuid,
  pub visitor_id:         Uuid,
  pub token:              Uuid,
  pub number:             Option<NumberView>,
  pub forwarding_targets: Vec<ForwardingTarget>,
}

/// `POST /sessions`
pub async fn start<S>(
  State(engine): State<Arc<Engine<S>>>,
  headers: HeaderMap,
  Json(body): Json<StartBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngineStore,
{
  let remote_ip = headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .map(|v| v.trim().to_string());

  let request = NewSessionRequest {
    visitor_id: body.visitor_id,
    company_id: body.company_id,
    entry_url:  body.entry_url,
    device:     DeviceInfo {
      width:      body.device.width,
      height:     body.device.height,
      user_agent: body.device.user_agent,
      remote_ip,
    },
  };

  match engine.start_session(request).await {
    Ok(started) => {
      let response = StartResponse {
        session_id:         started.session.session_id,
        visitor_id:         started.session.visitor_id,
        token:              started.session.token,
        number:             started.number.map(NumberView::from),
        forwarding_targets: started.forwarding_targets,
      };
      Ok((StatusCode::CREATED, Json(response)).into_response())
    }
    // Bots are expected traffic, not client errors: no session, no body.
    Err(Error::BotRejected) => Ok(StatusCode::NO_CONTENT.into_response()),
    Err(e) => Err(e.into()),
  }
}

// ─── End ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EndBody {
  pub token: Uuid,
}

/// `POST /sessions/:id/end` — idempotent for a matching token.
pub async fn end<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<EndBody>,
) -> Result<StatusCode, ApiError>
where
  S: EngineStore,
{
  engine.end_session(id, body.token).await?;
  Ok(StatusCode::NO_CONTENT)
}
