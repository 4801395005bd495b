//! Campaign number allocation — the least-recently-assigned allocator for
//! offline (print, radio) campaigns sharing tracking numbers.

use chrono::Utc;
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  number::TrackingNumber,
  store::EngineStore,
  Engine,
};

impl<S: EngineStore> Engine<S> {
  /// Allocate a number for a campaign.
  ///
  /// Inactive campaigns are rejected before any timestamp is touched.
  /// Directly-associated numbers are tried first, oldest assignment first;
  /// a campaign with no direct numbers falls back to numbers reachable
  /// through its associated pools. Claims use the same per-number
  /// compare-and-swap as session assignment, so `last_assigned_at` stays
  /// monotonic under concurrent call volume.
  pub async fn assign_for_campaign(
    &self,
    campaign_id: Uuid,
  ) -> Result<TrackingNumber> {
    let campaign = self
      .store
      .get_campaign(campaign_id)
      .await
      .map_err(Self::store_err)?
      .ok_or(Error::CampaignNotFound(campaign_id))?;

    if !campaign.is_active(Utc::now()) {
      return Err(Error::CampaignInactive(campaign_id));
    }

    for _pass in 0..2 {
      let direct = self
        .store
        .campaign_numbers(campaign_id)
        .await
        .map_err(Self::store_err)?;

      let candidates = if direct.is_empty() {
        self
          .store
          .campaign_pool_numbers(campaign_id)
          .await
          .map_err(Self::store_err)?
      } else {
        direct
      };

      for n in &candidates {
        if let Some(claimed) = self.claim(n).await? {
          tracing::debug!(number = %claimed.number_id, campaign = %campaign_id,
            "campaign claim");
          return Ok(claimed);
        }
      }
      // Every claim lost this pass; re-read and try once more.
    }

    Err(Error::NoNumberAvailable)
  }
}
