//! Handler for `/campaigns/:id/assign`.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  response::IntoResponse,
  Json,
};
use ringline_core::{store::EngineStore, Engine};
use uuid::Uuid;

use crate::{error::ApiError, sessions::NumberView};

/// `POST /campaigns/:id/assign`
///
/// Allocates the least-recently-assigned number reachable from the
/// campaign, or a structured error (`campaign_inactive`,
/// `no_number_available`) with no resource consumed.
pub async fn assign<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngineStore,
{
  let number = engine.assign_for_campaign(id).await?;
  Ok(Json(NumberView::from(number)))
}
