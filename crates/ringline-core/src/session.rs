//! Visitor sessions and their append-only event log.
//!
//! A session's assigned number is fixed at creation and never reassigned;
//! "ended" is a terminal, one-way transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Device fingerprint ──────────────────────────────────────────────────────

/// Device and network fields reported by the tracking script on page load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
  pub width:      u32,
  pub height:     u32,
  pub user_agent: Option<String>,
  pub remote_ip:  Option<String>,
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// One browsing session for a persisted visitor identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorSession {
  pub session_id: Uuid,
  /// Stable across repeat visits from the same browser.
  pub visitor_id: Uuid,
  pub company_id: Uuid,
  /// Assigned tracking number; fixed at creation, never reassigned.
  pub number_id:  Option<Uuid>,
  pub device:     DeviceInfo,
  pub entry_url:  Option<String>,
  /// Opaque credential required to end the session.
  pub token:      Uuid,
  pub started_at: DateTime<Utc>,
  pub ended_at:   Option<DateTime<Utc>>,
}

impl VisitorSession {
  pub fn is_open(&self) -> bool { self.ended_at.is_none() }
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEventKind {
  Started,
  Ended,
}

/// Append-only log entry tied to a session. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
  pub event_id:    Uuid,
  pub session_id:  Uuid,
  pub kind:        SessionEventKind,
  pub recorded_at: DateTime<Utc>,
}

// ─── NewSession ──────────────────────────────────────────────────────────────

/// Input to the store's session creation. The store assigns `session_id` and
/// `started_at`, and commits the row together with its `Started` event in
/// one transaction.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub visitor_id: Uuid,
  pub company_id: Uuid,
  pub number_id:  Option<Uuid>,
  pub device:     DeviceInfo,
  pub entry_url:  Option<String>,
  pub token:      Uuid,
}
