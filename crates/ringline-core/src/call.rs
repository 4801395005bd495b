//! Inbound calls and their lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Call status as reported by the call-control transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
  Queued,
  Ringing,
  InProgress,
  Completed,
  Busy,
  NoAnswer,
  Failed,
  Canceled,
}

impl CallStatus {
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "queued" => Some(Self::Queued),
      "ringing" => Some(Self::Ringing),
      "in-progress" => Some(Self::InProgress),
      "completed" => Some(Self::Completed),
      "busy" => Some(Self::Busy),
      "no-answer" => Some(Self::NoAnswer),
      "failed" => Some(Self::Failed),
      "canceled" => Some(Self::Canceled),
      _ => None,
    }
  }

  pub fn as_tag(self) -> &'static str {
    match self {
      Self::Queued => "queued",
      Self::Ringing => "ringing",
      Self::InProgress => "in-progress",
      Self::Completed => "completed",
      Self::Busy => "busy",
      Self::NoAnswer => "no-answer",
      Self::Failed => "failed",
      Self::Canceled => "canceled",
    }
  }

  /// Terminal statuses close out a call record; anything else is an interim
  /// notification.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      Self::Completed | Self::Busy | Self::NoAnswer | Self::Failed | Self::Canceled
    )
  }
}

// ─── Call ────────────────────────────────────────────────────────────────────

/// One inbound telephone call. Created when the call-control webhook fires;
/// completion fields are written once by the status callback; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
  pub call_id:          Uuid,
  /// The transport's identifier for this call; unique across deliveries.
  pub provider_call_id: String,
  pub caller_digits:    String,
  pub dialed_digits:    String,
  pub number_id:        Uuid,
  pub pool_id:          Option<Uuid>,
  /// Linked only when the dialed number tracks visitor sessions.
  pub session_id:       Option<Uuid>,
  /// Recording mode actually applied to the call.
  pub recorded:         bool,
  pub started_at:       DateTime<Utc>,
  pub duration_secs:    Option<u32>,
  pub final_status:     Option<CallStatus>,
}

// ─── NewCall ─────────────────────────────────────────────────────────────────

/// Input to the store's call creation. `call_id` and `started_at` are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCall {
  pub provider_call_id: String,
  pub caller_digits:    String,
  pub dialed_digits:    String,
  pub number_id:        Uuid,
  pub pool_id:          Option<Uuid>,
  pub session_id:       Option<Uuid>,
  pub recorded:         bool,
}
