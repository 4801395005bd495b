//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with microsecond precision —
//! assignment ordering depends on it. Structured fields (swap rules,
//! forwarding targets, whisper config, device info) are stored as compact
//! JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use ringline_core::{
  call::{Call, CallStatus},
  campaign::Campaign,
  number::{
    ForwardingTarget, NumberCategory, TrackingNumber, TrackingNumberPool,
    WhisperConfig,
  },
  session::{DeviceInfo, SessionEvent, SessionEventKind, VisitorSession},
  swap::SwapRule,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_uuid_opt(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_dt_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── NumberCategory ──────────────────────────────────────────────────────────

pub fn encode_category(c: NumberCategory) -> &'static str {
  match c {
    NumberCategory::Online => "online",
    NumberCategory::Offline => "offline",
  }
}

pub fn decode_category(s: &str) -> Result<NumberCategory> {
  match s {
    "online" => Ok(NumberCategory::Online),
    "offline" => Ok(NumberCategory::Offline),
    other => Err(Error::UnknownTag { field: "category", value: other.to_string() }),
  }
}

// ─── SessionEventKind ────────────────────────────────────────────────────────

pub fn encode_event_kind(k: SessionEventKind) -> &'static str {
  match k {
    SessionEventKind::Started => "started",
    SessionEventKind::Ended => "ended",
  }
}

pub fn decode_event_kind(s: &str) -> Result<SessionEventKind> {
  match s {
    "started" => Ok(SessionEventKind::Started),
    "ended" => Ok(SessionEventKind::Ended),
    other => Err(Error::UnknownTag { field: "event kind", value: other.to_string() }),
  }
}

// ─── CallStatus ──────────────────────────────────────────────────────────────

pub fn encode_call_status(s: CallStatus) -> &'static str { s.as_tag() }

pub fn decode_call_status(s: &str) -> Result<CallStatus> {
  CallStatus::parse(s).ok_or_else(|| Error::UnknownTag {
    field: "call status",
    value: s.to_string(),
  })
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_swap_rules(rules: &[SwapRule]) -> Result<String> {
  Ok(serde_json::to_string(rules)?)
}

pub fn decode_swap_rules(s: &str) -> Result<Vec<SwapRule>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_targets(targets: &[ForwardingTarget]) -> Result<String> {
  Ok(serde_json::to_string(targets)?)
}

pub fn decode_targets(s: &str) -> Result<Vec<ForwardingTarget>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_whisper(w: Option<&WhisperConfig>) -> Result<Option<String>> {
  w.map(|w| serde_json::to_string(w).map_err(Error::from)).transpose()
}

pub fn decode_whisper(s: Option<&str>) -> Result<Option<WhisperConfig>> {
  s.map(|s| serde_json::from_str(s).map_err(Error::from)).transpose()
}

pub fn encode_device(d: &DeviceInfo) -> Result<String> {
  Ok(serde_json::to_string(d)?)
}

pub fn decode_device(s: &str) -> Result<DeviceInfo> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `numbers` row.
pub struct RawNumber {
  pub number_id:          String,
  pub company_id:         String,
  pub digits:             String,
  pub country_code:       String,
  pub category:           String,
  pub sub_category:       Option<String>,
  pub pool_id:            Option<String>,
  pub recording_enabled:  bool,
  pub audio_clip_id:      Option<String>,
  pub whisper:            Option<String>,
  pub forward_to:         Option<String>,
  pub forwarding_targets: String,
  pub swap_rules:         String,
  pub last_assigned_at:   Option<String>,
  pub removed_at:         Option<String>,
}

impl RawNumber {
  pub fn into_number(self) -> Result<TrackingNumber> {
    Ok(TrackingNumber {
      number_id:          decode_uuid(&self.number_id)?,
      company_id:         decode_uuid(&self.company_id)?,
      digits:             self.digits,
      country_code:       self.country_code,
      category:           decode_category(&self.category)?,
      sub_category:       self.sub_category,
      pool_id:            decode_uuid_opt(self.pool_id.as_deref())?,
      recording_enabled:  self.recording_enabled,
      audio_clip_id:      decode_uuid_opt(self.audio_clip_id.as_deref())?,
      whisper:            decode_whisper(self.whisper.as_deref())?,
      forward_to:         self.forward_to,
      forwarding_targets: decode_targets(&self.forwarding_targets)?,
      swap_rules:         decode_swap_rules(&self.swap_rules)?,
      last_assigned_at:   decode_dt_opt(self.last_assigned_at.as_deref())?,
      removed_at:         decode_dt_opt(self.removed_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from a `pools` row.
pub struct RawPool {
  pub pool_id:            String,
  pub company_id:         String,
  pub name:               String,
  pub category:           String,
  pub sub_category:       Option<String>,
  pub active:             bool,
  pub recording_enabled:  bool,
  pub audio_clip_id:      Option<String>,
  pub whisper:            Option<String>,
  pub forward_to:         Option<String>,
  pub forwarding_targets: String,
  pub swap_rules:         String,
}

impl RawPool {
  pub fn into_pool(self) -> Result<TrackingNumberPool> {
    Ok(TrackingNumberPool {
      pool_id:            decode_uuid(&self.pool_id)?,
      company_id:         decode_uuid(&self.company_id)?,
      name:               self.name,
      category:           decode_category(&self.category)?,
      sub_category:       self.sub_category,
      active:             self.active,
      recording_enabled:  self.recording_enabled,
      audio_clip_id:      decode_uuid_opt(self.audio_clip_id.as_deref())?,
      whisper:            decode_whisper(self.whisper.as_deref())?,
      forward_to:         self.forward_to,
      forwarding_targets: decode_targets(&self.forwarding_targets)?,
      swap_rules:         decode_swap_rules(&self.swap_rules)?,
    })
  }
}

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub session_id: String,
  pub visitor_id: String,
  pub company_id: String,
  pub number_id:  Option<String>,
  pub device:     String,
  pub entry_url:  Option<String>,
  pub token:      String,
  pub started_at: String,
  pub ended_at:   Option<String>,
}

impl RawSession {
  pub fn into_session(self) -> Result<VisitorSession> {
    Ok(VisitorSession {
      session_id: decode_uuid(&self.session_id)?,
      visitor_id: decode_uuid(&self.visitor_id)?,
      company_id: decode_uuid(&self.company_id)?,
      number_id:  decode_uuid_opt(self.number_id.as_deref())?,
      device:     decode_device(&self.device)?,
      entry_url:  self.entry_url,
      token:      decode_uuid(&self.token)?,
      started_at: decode_dt(&self.started_at)?,
      ended_at:   decode_dt_opt(self.ended_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from a `session_events` row.
pub struct RawEvent {
  pub event_id:    String,
  pub session_id:  String,
  pub kind:        String,
  pub recorded_at: String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<SessionEvent> {
    Ok(SessionEvent {
      event_id:    decode_uuid(&self.event_id)?,
      session_id:  decode_uuid(&self.session_id)?,
      kind:        decode_event_kind(&self.kind)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `calls` row.
pub struct RawCall {
  pub call_id:          String,
  pub provider_call_id: String,
  pub caller_digits:    String,
  pub dialed_digits:    String,
  pub number_id:        String,
  pub pool_id:          Option<String>,
  pub session_id:       Option<String>,
  pub recorded:         bool,
  pub started_at:       String,
  pub duration_secs:    Option<u32>,
  pub final_status:     Option<String>,
}

impl RawCall {
  pub fn into_call(self) -> Result<Call> {
    Ok(Call {
      call_id:          decode_uuid(&self.call_id)?,
      provider_call_id: self.provider_call_id,
      caller_digits:    self.caller_digits,
      dialed_digits:    self.dialed_digits,
      number_id:        decode_uuid(&self.number_id)?,
      pool_id:          decode_uuid_opt(self.pool_id.as_deref())?,
      session_id:       decode_uuid_opt(self.session_id.as_deref())?,
      recorded:         self.recorded,
      started_at:       decode_dt(&self.started_at)?,
      duration_secs:    self.duration_secs,
      final_status:     self
        .final_status
        .as_deref()
        .map(decode_call_status)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from a `campaigns` row.
pub struct RawCampaign {
  pub campaign_id:  String,
  pub company_id:   String,
  pub name:         String,
  pub activated_at: Option<String>,
  pub suspended:    bool,
  pub ends_at:      Option<String>,
}

impl RawCampaign {
  pub fn into_campaign(self) -> Result<Campaign> {
    Ok(Campaign {
      campaign_id:  decode_uuid(&self.campaign_id)?,
      company_id:   decode_uuid(&self.company_id)?,
      name:         self.name,
      activated_at: decode_dt_opt(self.activated_at.as_deref())?,
      suspended:    self.suspended,
      ends_at:      decode_dt_opt(self.ends_at.as_deref())?,
    })
  }
}
