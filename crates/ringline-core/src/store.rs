//! The `EngineStore` trait and supporting input types.
//!
//! The trait is implemented by storage backends (e.g.
//! `ringline-store-sqlite`). The engine and the HTTP layers depend on this
//! abstraction, not on any concrete backend.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  call::{Call, CallStatus, NewCall},
  campaign::{Campaign, NewCampaign},
  number::{
    ForwardingTarget, NumberCategory, TrackingNumber, TrackingNumberPool,
    WhisperConfig,
  },
  session::{NewSession, SessionEvent, VisitorSession},
  swap::SwapRule,
};

// ─── Input types ─────────────────────────────────────────────────────────────

/// Input to [`EngineStore::add_number`]. `number_id` is store-assigned;
/// `last_assigned_at` starts unset.
#[derive(Debug, Clone)]
pub struct NewNumber {
  pub company_id:         Uuid,
  pub digits:             String,
  pub country_code:       String,
  pub category:           NumberCategory,
  pub sub_category:       Option<String>,
  pub pool_id:            Option<Uuid>,
  pub recording_enabled:  bool,
  pub audio_clip_id:      Option<Uuid>,
  pub whisper:            Option<WhisperConfig>,
  pub forward_to:         Option<String>,
  pub forwarding_targets: Vec<ForwardingTarget>,
  pub swap_rules:         Vec<SwapRule>,
}

impl NewNumber {
  /// Convenience constructor with all optional configuration unset.
  pub fn new(
    company_id: Uuid,
    country_code: impl Into<String>,
    digits: impl Into<String>,
    category: NumberCategory,
  ) -> Self {
    Self {
      company_id,
      digits: digits.into(),
      country_code: country_code.into(),
      category,
      sub_category: None,
      pool_id: None,
      recording_enabled: false,
      audio_clip_id: None,
      whisper: None,
      forward_to: None,
      forwarding_targets: Vec::new(),
      swap_rules: Vec::new(),
    }
  }
}

/// Input to [`EngineStore::add_pool`]. `pool_id` is store-assigned.
#[derive(Debug, Clone)]
pub struct NewPool {
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

impl NewPool {
  pub fn new(
    company_id: Uuid,
    name: impl Into<String>,
    category: NumberCategory,
  ) -> Self {
    Self {
      company_id,
      name: name.into(),
      category,
      sub_category: None,
      active: true,
      recording_enabled: false,
      audio_clip_id: None,
      whisper: None,
      forward_to: None,
      forwarding_targets: Vec::new(),
      swap_rules: Vec::new(),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Ringline storage backend.
///
/// Ordering contracts matter here: the engine's fairness and allocation
/// logic relies on the member/candidate orderings documented per method, and
/// on [`claim_number`](EngineStore::claim_number) being the only write path
/// for `last_assigned_at`.
pub trait EngineStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Numbers ───────────────────────────────────────────────────────────

  fn add_number(
    &self,
    input: NewNumber,
  ) -> impl Future<Output = Result<TrackingNumber, Self::Error>> + Send + '_;

  fn get_number(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TrackingNumber>, Self::Error>> + Send + '_;

  /// Exact lookup by full E.164 digit string (country code + national
  /// digits, no `+`). Returns soft-removed numbers too; callers decide
  /// whether removal matters.
  fn find_number_by_digits<'a>(
    &'a self,
    digits: &'a str,
  ) -> impl Future<Output = Result<Option<TrackingNumber>, Self::Error>> + Send + 'a;

  /// Soft-remove a number. Returns `false` if it was already removed.
  fn remove_number(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Atomically stamp `last_assigned_at = now` if and only if the current
  /// value still equals `expected`. Returns whether the claim won.
  ///
  /// This compare-and-swap is the serialization point for all assignment
  /// decisions; a `false` return means a concurrent claim got there first.
  /// Removed numbers never claim.
  fn claim_number(
    &self,
    id: Uuid,
    expected: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Unremoved members of a pool in claim order: oldest `last_assigned_at`
  /// first (never-assigned before everything), ties by lowest `number_id`.
  fn pool_members(
    &self,
    pool_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TrackingNumber>, Self::Error>> + Send + '_;

  /// Unremoved, unpooled numbers of a company and category, most recently
  /// assigned first (never-assigned last).
  fn standalone_numbers(
    &self,
    company_id: Uuid,
    category: NumberCategory,
  ) -> impl Future<Output = Result<Vec<TrackingNumber>, Self::Error>> + Send + '_;

  // ── Pools ─────────────────────────────────────────────────────────────

  fn add_pool(
    &self,
    input: NewPool,
  ) -> impl Future<Output = Result<TrackingNumberPool, Self::Error>> + Send + '_;

  fn get_pool(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TrackingNumberPool>, Self::Error>> + Send + '_;

  /// The company's active pool for a category, if any. At most one pool per
  /// company and category is active at a time.
  fn active_pool(
    &self,
    company_id: Uuid,
    category: NumberCategory,
  ) -> impl Future<Output = Result<Option<TrackingNumberPool>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Create the session row and its `Started` event in one transaction.
  /// A reader must never observe the session without the event.
  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<(VisitorSession, SessionEvent), Self::Error>> + Send + '_;

  fn get_session(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<VisitorSession>, Self::Error>> + Send + '_;

  /// The most recently started session for a persisted visitor identity.
  fn latest_session_for_visitor(
    &self,
    visitor_id: Uuid,
  ) -> impl Future<Output = Result<Option<VisitorSession>, Self::Error>> + Send + '_;

  /// The open session currently holding a number, if any.
  fn open_session_for_number(
    &self,
    number_id: Uuid,
  ) -> impl Future<Output = Result<Option<VisitorSession>, Self::Error>> + Send + '_;

  /// One-way end transition: set `ended_at` and append the `Ended` event,
  /// atomically, only if the session is still open. Returns whether this
  /// call performed the transition — a concurrent or repeated end is
  /// `false`, and appends no duplicate event.
  fn end_session(
    &self,
    session_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All events for a session in recording order.
  fn session_events(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SessionEvent>, Self::Error>> + Send + '_;

  // ── Calls ─────────────────────────────────────────────────────────────

  fn create_call(
    &self,
    input: NewCall,
  ) -> impl Future<Output = Result<Call, Self::Error>> + Send + '_;

  fn find_call_by_provider_id<'a>(
    &'a self,
    provider_call_id: &'a str,
  ) -> impl Future<Output = Result<Option<Call>, Self::Error>> + Send + 'a;

  /// Idempotent completion: write duration and final status only if the
  /// call has no final status yet. Returns whether this call performed the
  /// write — duplicate or out-of-order deliveries are `false`.
  fn complete_call<'a>(
    &'a self,
    provider_call_id: &'a str,
    duration_secs: u32,
    status: CallStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Campaigns ─────────────────────────────────────────────────────────

  fn add_campaign(
    &self,
    input: NewCampaign,
  ) -> impl Future<Output = Result<Campaign, Self::Error>> + Send + '_;

  fn get_campaign(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Campaign>, Self::Error>> + Send + '_;

  fn attach_campaign_number(
    &self,
    campaign_id: Uuid,
    number_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn attach_campaign_pool(
    &self,
    campaign_id: Uuid,
    pool_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Unremoved numbers directly associated with a campaign, in claim order
  /// (see [`pool_members`](EngineStore::pool_members)).
  fn campaign_numbers(
    &self,
    campaign_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TrackingNumber>, Self::Error>> + Send + '_;

  /// Unremoved numbers reachable through a campaign's associated pools, in
  /// claim order.
  fn campaign_pool_numbers(
    &self,
    campaign_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TrackingNumber>, Self::Error>> + Send + '_;
}
