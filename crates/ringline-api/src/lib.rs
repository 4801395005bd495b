//! JSON REST API for Ringline.
//!
//! Exposes an axum [`Router`] backed by any engine store. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ringline_api::api_router(engine.clone()))
//! ```

pub mod campaigns;
pub mod error;
pub mod sessions;

use std::sync::Arc;

use axum::{routing::post, Router};
use ringline_core::{store::EngineStore, Engine};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: EngineStore + 'static,
{
  Router::new()
    // Sessions
    .route("/sessions", post(sessions::start::<S>))
    .route("/sessions/{id}/end", post(sessions::end::<S>))
    // Campaigns
    .route("/campaigns/{id}/assign", post(campaigns::assign::<S>))
    .with_state(engine)
}
