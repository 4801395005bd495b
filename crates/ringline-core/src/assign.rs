//! Pool assignment — least-recently-assigned selection with per-number
//! compare-and-swap claims.
//!
//! No pool-wide lock exists. Each candidate is claimed individually; a lost
//! race falls through to the next member, and one re-read pass retries the
//! pool before giving up.

use chrono::Utc;
use uuid::Uuid;

use crate::{
  error::Result,
  number::{TrackingNumber, TrackingNumberPool},
  store::EngineStore,
  Engine,
};

impl<S: EngineStore> Engine<S> {
  /// Assign a number from `pool` for a new session.
  ///
  /// If `prior` names a number that is still a member, it is claimed and
  /// returned regardless of its `last_assigned_at` — session continuity
  /// across repeat visits beats rotation fairness. Otherwise the member
  /// with the oldest `last_assigned_at` wins (ties by lowest id).
  ///
  /// Returns `None` when the pool has no claimable members.
  pub async fn assign_from_pool(
    &self,
    pool: &TrackingNumberPool,
    prior: Option<Uuid>,
  ) -> Result<Option<TrackingNumber>> {
    for _pass in 0..2 {
      let members = self
        .store
        .pool_members(pool.pool_id)
        .await
        .map_err(Self::store_err)?;

      if members.is_empty() {
        return Ok(None);
      }

      if let Some(prior_id) = prior
        && let Some(n) = members.iter().find(|m| m.number_id == prior_id)
      {
        if let Some(claimed) = self.claim(n).await? {
          tracing::debug!(number = %claimed.number_id, pool = %pool.pool_id,
            "continuity claim");
          return Ok(Some(claimed));
        }
        // Lost the race on the continuity number; fall through to fairness.
      }

      for n in &members {
        if let Some(claimed) = self.claim(n).await? {
          tracing::debug!(number = %claimed.number_id, pool = %pool.pool_id,
            "fairness claim");
          return Ok(Some(claimed));
        }
      }
      // Every claim lost this pass; re-read the pool and try once more.
    }

    Ok(None)
  }

  /// Try to claim `number` through the store's compare-and-swap. `Some`
  /// carries the number with its freshly stamped `last_assigned_at`.
  pub(crate) async fn claim(
    &self,
    number: &TrackingNumber,
  ) -> Result<Option<TrackingNumber>> {
    let now = Utc::now();
    let won = self
      .store
      .claim_number(number.number_id, number.last_assigned_at, now)
      .await
      .map_err(Self::store_err)?;

    Ok(won.then(|| TrackingNumber {
      last_assigned_at: Some(now),
      ..number.clone()
    }))
  }
}
