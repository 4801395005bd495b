//! Tracking numbers, number pools, and the shared call-flow owner surface.
//!
//! A pool exposes the same configuration contract as a single number, so the
//! call-flow builder treats both uniformly through [`FlowOwner`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::swap::SwapRule;

// ─── Category ────────────────────────────────────────────────────────────────

/// Broad attribution category for a number or pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberCategory {
  /// Website visitor tracking; numbers are tied to live sessions.
  Online,
  /// Print, radio, and other offline campaign sources.
  Offline,
}

// ─── Whisper ─────────────────────────────────────────────────────────────────

/// Spoken language for whisper messages. Closed set; the whisper webhook
/// rejects anything outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperLanguage {
  En,
  Es,
  Fr,
  De,
}

impl WhisperLanguage {
  pub fn as_tag(self) -> &'static str {
    match self {
      Self::En => "en",
      Self::Es => "es",
      Self::Fr => "fr",
      Self::De => "de",
    }
  }

  pub fn from_tag(s: &str) -> Option<Self> {
    match s {
      "en" => Some(Self::En),
      "es" => Some(Self::Es),
      "fr" => Some(Self::Fr),
      "de" => Some(Self::De),
      _ => None,
    }
  }
}

/// Synthesised voice for whisper messages. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperVoice {
  Man,
  Woman,
  Neutral,
}

impl WhisperVoice {
  pub fn as_tag(self) -> &'static str {
    match self {
      Self::Man => "man",
      Self::Woman => "woman",
      Self::Neutral => "neutral",
    }
  }

  pub fn from_tag(s: &str) -> Option<Self> {
    match s {
      "man" => Some(Self::Man),
      "woman" => Some(Self::Woman),
      "neutral" => Some(Self::Neutral),
      _ => None,
    }
  }
}

/// A short spoken message played to the call recipient before bridging.
/// Rendered at bridge time via the whisper callback, never inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhisperConfig {
  pub message:  String,
  pub language: WhisperLanguage,
  pub voice:    WhisperVoice,
}

// ─── Forwarding ──────────────────────────────────────────────────────────────

/// A destination shown to the visitor alongside the assigned number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingTarget {
  /// Human-readable label, e.g. "Sales" or "Downtown office".
  pub label:  String,
  pub digits: String,
}

// ─── TrackingNumber ──────────────────────────────────────────────────────────

/// One provisioned phone number owned by a company.
///
/// `digits` is the national-significant number; the full E.164 digit string
/// is `country_code` followed by `digits` (see [`TrackingNumber::e164`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingNumber {
  pub number_id:          Uuid,
  pub company_id:         Uuid,
  pub digits:             String,
  pub country_code:       String,
  pub category:           NumberCategory,
  pub sub_category:       Option<String>,
  /// Pool membership. A pooled number takes its call-flow configuration
  /// from the pool, not from its own fields.
  pub pool_id:            Option<Uuid>,
  pub recording_enabled:  bool,
  pub audio_clip_id:      Option<Uuid>,
  pub whisper:            Option<WhisperConfig>,
  pub forward_to:         Option<String>,
  pub forwarding_targets: Vec<ForwardingTarget>,
  pub swap_rules:         Vec<SwapRule>,
  /// Stamped on every assignment; monotonic per number. The serialization
  /// point for concurrent assignment (see the store's claim operation).
  pub last_assigned_at:   Option<DateTime<Utc>>,
  /// Soft removal. Removed numbers stay resolvable for historical calls but
  /// are never assigned and never route new calls.
  pub removed_at:         Option<DateTime<Utc>>,
}

impl TrackingNumber {
  /// Full E.164 digit string, without the leading `+`.
  pub fn e164(&self) -> String {
    format!("{}{}", self.country_code, self.digits)
  }

  pub fn is_removed(&self) -> bool { self.removed_at.is_some() }
}

// ─── TrackingNumberPool ──────────────────────────────────────────────────────

/// A named group of interchangeable tracking numbers sharing category and
/// call-flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingNumberPool {
  pub pool_id:            Uuid,
  pub company_id:         Uuid,
  pub name:               String,
  pub category:           NumberCategory,
  pub sub_category:       Option<String>,
  pub active:             bool,
  pub recording_enabled:  bool,
  pub audio_clip_id:      Option<Uuid>,
  pub whisper:            Option<WhisperConfig>,
  pub forward_to:         Option<String>,
  pub forwarding_targets: Vec<ForwardingTarget>,
  pub swap_rules:         Vec<SwapRule>,
}

// ─── FlowOwner ───────────────────────────────────────────────────────────────

/// The entity whose configuration drives an inbound call: the dialed number
/// itself, or — when the number is pooled — its pool.
#[derive(Debug, Clone)]
pub enum FlowOwner {
  Number(TrackingNumber),
  Pool(TrackingNumberPool),
}

impl FlowOwner {
  pub fn recording_enabled(&self) -> bool {
    match self {
      Self::Number(n) => n.recording_enabled,
      Self::Pool(p) => p.recording_enabled,
    }
  }

  pub fn audio_clip_id(&self) -> Option<Uuid> {
    match self {
      Self::Number(n) => n.audio_clip_id,
      Self::Pool(p) => p.audio_clip_id,
    }
  }

  pub fn forward_to(&self) -> Option<&str> {
    match self {
      Self::Number(n) => n.forward_to.as_deref(),
      Self::Pool(p) => p.forward_to.as_deref(),
    }
  }

  pub fn whisper(&self) -> Option<&WhisperConfig> {
    match self {
      Self::Number(n) => n.whisper.as_ref(),
      Self::Pool(p) => p.whisper.as_ref(),
    }
  }
}
