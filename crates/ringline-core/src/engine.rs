//! The engine — construction, shared state, and the event channel.
//!
//! One `Engine` serves all concurrent webhook/API requests; it holds no
//! per-request state. The only shared mutable resource it touches is each
//! number's `last_assigned_at`, serialized through the store's
//! compare-and-swap claim.

use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  clients::{AudioClipResolver, BotDetector},
  error::Error,
  event::CallEvent,
  store::EngineStore,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Engine-level settings supplied by the host process.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Externally reachable base URL, used to build whisper callback URLs.
  pub public_base_url: String,
  /// Budget for optional audio-clip lookups; expiry skips the greeting.
  pub audio_timeout:   Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      public_base_url: "http://localhost:8080".to_string(),
      audio_timeout:   Duration::from_millis(800),
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The dynamic number assignment and call routing engine.
///
/// Generic over the storage backend; bot detection and audio-clip resolution
/// are injected trait objects whose lifecycle the host owns.
pub struct Engine<S> {
  pub(crate) store:  Arc<S>,
  pub(crate) bots:   Arc<dyn BotDetector>,
  pub(crate) audio:  Arc<dyn AudioClipResolver>,
  pub(crate) config: EngineConfig,
  events: broadcast::Sender<CallEvent>,
}

impl<S: EngineStore> Engine<S> {
  pub fn new(
    store: Arc<S>,
    bots: Arc<dyn BotDetector>,
    audio: Arc<dyn AudioClipResolver>,
    config: EngineConfig,
  ) -> Self {
    let (events, _) = broadcast::channel(256);
    Self { store, bots, audio, config, events }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Subscribe to call-lifecycle events. Receivers that lag are dropped by
  /// the channel; publication never blocks call handling.
  pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
    self.events.subscribe()
  }

  pub(crate) fn publish(&self, event: CallEvent) {
    // No subscribers is fine; the send result is irrelevant.
    let _ = self.events.send(event);
  }

  pub(crate) fn store_err(e: S::Error) -> Error { Error::Store(Box::new(e)) }

  /// Look up a greeting clip with the configured budget. Fails open: a
  /// miss or an expired lookup both mean "no greeting".
  pub(crate) async fn resolve_clip(&self, clip_id: Uuid) -> Option<String> {
    match tokio::time::timeout(
      self.config.audio_timeout,
      self.audio.resolve(clip_id),
    )
    .await
    {
      Ok(url) => url,
      Err(_elapsed) => {
        tracing::debug!(%clip_id, "audio clip lookup timed out, skipping greeting");
        None
      }
    }
  }
}
