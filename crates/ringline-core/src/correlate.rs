//! Session correlation — ties a persisted visitor identity to session
//! lifecycle and to the number assignment made for that visitor.

use chrono::Utc;
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  number::{ForwardingTarget, NumberCategory, TrackingNumber},
  session::{DeviceInfo, NewSession, VisitorSession},
  store::EngineStore,
  swap::should_swap,
  Engine,
};

// ─── Request / response ──────────────────────────────────────────────────────

/// Input to [`Engine::start_session`].
#[derive(Debug, Clone)]
pub struct NewSessionRequest {
  /// Persisted visitor identity; absent on a first visit.
  pub visitor_id: Option<Uuid>,
  pub company_id: Uuid,
  pub entry_url:  Option<String>,
  pub device:     DeviceInfo,
}

/// Result of a successful session start.
#[derive(Debug, Clone)]
pub struct SessionStarted {
  pub session:            VisitorSession,
  /// The swapped-in tracking number, if any rule and pool produced one.
  pub number:             Option<TrackingNumber>,
  /// Configured forwarding targets of the owning entity, for client display.
  pub forwarding_targets: Vec<ForwardingTarget>,
}

// ─── Correlator ──────────────────────────────────────────────────────────────

impl<S: EngineStore> Engine<S> {
  /// Start a visitor session, assigning a tracking number when the
  /// company's swap rules call for one.
  ///
  /// Validation and bot rejection happen before any assignment side
  /// effect. A persisted identity has at most one open session: a still
  /// open prior session is force-closed first, and its assigned number
  /// becomes the continuity hint for pool assignment.
  pub async fn start_session(
    &self,
    req: NewSessionRequest,
  ) -> Result<SessionStarted> {
    if req.company_id.is_nil() {
      return Err(Error::Validation("company_id is required".to_string()));
    }
    if req.device.width == 0 || req.device.height == 0 {
      return Err(Error::Validation(
        "viewport width and height must be nonzero".to_string(),
      ));
    }
    if self.bots.is_bot(&req.device) {
      tracing::debug!(company = %req.company_id, "bot visit, no assignment");
      return Err(Error::BotRejected);
    }

    let mut continuity: Option<Uuid> = None;
    let visitor_id = match req.visitor_id {
      Some(id) => {
        if let Some(prior) = self
          .store
          .latest_session_for_visitor(id)
          .await
          .map_err(Self::store_err)?
        {
          if prior.is_open() {
            // One open session per persisted identity.
            self
              .store
              .end_session(prior.session_id, Utc::now())
              .await
              .map_err(Self::store_err)?;
          }
          continuity = prior.number_id;
        }
        id
      }
      None => Uuid::new_v4(),
    };

    let entry_url = req.entry_url.as_deref();
    let mut assigned: Option<TrackingNumber> = None;
    let mut targets: Vec<ForwardingTarget> = Vec::new();

    if let Some(pool) = self
      .store
      .active_pool(req.company_id, NumberCategory::Online)
      .await
      .map_err(Self::store_err)?
    {
      // A pool with rules is gated by them; a pool without always swaps.
      let swap =
        pool.swap_rules.is_empty() || should_swap(&pool.swap_rules, entry_url);
      if swap {
        assigned = self.assign_from_pool(&pool, continuity).await?;
        if assigned.is_some() {
          targets = pool.forwarding_targets.clone();
        }
      }
    } else {
      // No pool: standalone numbers in descending assignment recency, each
      // gated by its own rules. First match wins.
      let numbers = self
        .store
        .standalone_numbers(req.company_id, NumberCategory::Online)
        .await
        .map_err(Self::store_err)?;

      for n in numbers {
        if !should_swap(&n.swap_rules, entry_url) {
          continue;
        }
        if let Some(claimed) = self.claim(&n).await? {
          targets = claimed.forwarding_targets.clone();
          assigned = Some(claimed);
          break;
        }
      }
    }

    let (session, _started) = self
      .store
      .create_session(NewSession {
        visitor_id,
        company_id: req.company_id,
        number_id: assigned.as_ref().map(|n| n.number_id),
        device: req.device,
        entry_url: req.entry_url,
        token: Uuid::new_v4(),
      })
      .await
      .map_err(Self::store_err)?;

    Ok(SessionStarted { session, number: assigned, forwarding_targets: targets })
  }

  /// End a session. The token must match the session's stored token.
  ///
  /// Ending an already-ended session is accepted as a no-op; the store's
  /// guarded transition guarantees no duplicate end event either way.
  pub async fn end_session(&self, session_id: Uuid, token: Uuid) -> Result<()> {
    let session = self
      .store
      .get_session(session_id)
      .await
      .map_err(Self::store_err)?
      .ok_or(Error::SessionNotFound(session_id))?;

    if session.token != token {
      return Err(Error::InvalidToken);
    }
    if session.ended_at.is_some() {
      return Ok(());
    }

    self
      .store
      .end_session(session_id, Utc::now())
      .await
      .map_err(Self::store_err)?;
    Ok(())
  }
}
