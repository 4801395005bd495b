//! Collaborator traits consumed by the engine.
//!
//! Bot classification and audio-clip storage live outside this system; the
//! engine takes them as injected trait objects with lifecycle owned by the
//! host process.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::session::DeviceInfo;

// ─── Bot detection ───────────────────────────────────────────────────────────

/// Classifies a page view as automated traffic. Consulted before any number
/// assignment; bots must never occupy a pool slot.
pub trait BotDetector: Send + Sync {
  fn is_bot(&self, device: &DeviceInfo) -> bool;
}

/// Token-list classifier over the reported user agent.
pub struct UserAgentBotDetector {
  tokens: Vec<String>,
}

impl UserAgentBotDetector {
  pub fn with_tokens(tokens: Vec<String>) -> Self { Self { tokens } }
}

impl Default for UserAgentBotDetector {
  fn default() -> Self {
    Self {
      tokens: ["bot", "crawler", "spider", "slurp", "headless", "wget", "curl"]
        .map(str::to_string)
        .to_vec(),
    }
  }
}

impl BotDetector for UserAgentBotDetector {
  fn is_bot(&self, device: &DeviceInfo) -> bool {
    let Some(ua) = device.user_agent.as_deref() else {
      return false;
    };
    let ua = ua.to_ascii_lowercase();
    self.tokens.iter().any(|t| ua.contains(t))
  }
}

/// Accepts everything — for tests and hosts that filter upstream.
pub struct AllowAll;

impl BotDetector for AllowAll {
  fn is_bot(&self, _device: &DeviceInfo) -> bool { false }
}

// ─── Audio clips ─────────────────────────────────────────────────────────────

/// Resolves a configured greeting clip to a playable URL.
///
/// The engine wraps every lookup in a timeout and fails open: a miss, an
/// error, or a slow backend all mean "skip the greeting", never a blocked
/// call setup.
#[async_trait]
pub trait AudioClipResolver: Send + Sync {
  async fn resolve(&self, clip_id: Uuid) -> Option<String>;
}

/// Resolver with no clips; every lookup misses.
pub struct NoAudioClips;

#[async_trait]
impl AudioClipResolver for NoAudioClips {
  async fn resolve(&self, _clip_id: Uuid) -> Option<String> { None }
}

/// Fixed in-memory clip set, for hosts with static greeting audio and for
/// tests.
#[derive(Default)]
pub struct StaticAudioClips {
  clips: HashMap<Uuid, String>,
}

impl StaticAudioClips {
  pub fn with_clip(mut self, clip_id: Uuid, url: impl Into<String>) -> Self {
    self.clips.insert(clip_id, url.into());
    self
  }
}

#[async_trait]
impl AudioClipResolver for StaticAudioClips {
  async fn resolve(&self, clip_id: Uuid) -> Option<String> {
    self.clips.get(&clip_id).cloned()
  }
}
