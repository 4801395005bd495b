//! Offline campaigns — print, radio, and other non-session sources that
//! borrow tracking numbers through the campaign allocator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
  pub campaign_id:  Uuid,
  pub company_id:   Uuid,
  pub name:         String,
  /// Campaigns allocate nothing until activated.
  pub activated_at: Option<DateTime<Utc>>,
  pub suspended:    bool,
  pub ends_at:      Option<DateTime<Utc>>,
}

impl Campaign {
  /// Activated, not suspended, and not past its end date.
  pub fn is_active(&self, now: DateTime<Utc>) -> bool {
    self.activated_at.is_some()
      && !self.suspended
      && self.ends_at.is_none_or(|ends| ends > now)
  }
}

/// Input to the store's campaign creation; `campaign_id` is store-assigned.
#[derive(Debug, Clone)]
pub struct NewCampaign {
  pub company_id:   Uuid,
  pub name:         String,
  pub activated_at: Option<DateTime<Utc>>,
  pub suspended:    bool,
  pub ends_at:      Option<DateTime<Utc>>,
}

impl NewCampaign {
  /// Convenience constructor for an active campaign with no end date.
  pub fn active(company_id: Uuid, name: impl Into<String>) -> Self {
    Self {
      company_id,
      name: name.into(),
      activated_at: Some(Utc::now()),
      suspended: false,
      ends_at: None,
    }
  }
}
