//! [`SqliteStore`] — the SQLite implementation of [`EngineStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use ringline_core::{
  call::{Call, CallStatus, NewCall},
  campaign::{Campaign, NewCampaign},
  number::{NumberCategory, TrackingNumber, TrackingNumberPool},
  session::{NewSession, SessionEvent, SessionEventKind, VisitorSession},
  store::{EngineStore, NewNumber, NewPool},
};

use crate::{
  encode::{
    encode_call_status, encode_category, encode_device, encode_dt,
    encode_event_kind, encode_swap_rules, encode_targets, encode_uuid,
    encode_whisper, RawCall, RawCampaign, RawEvent, RawNumber, RawPool,
    RawSession,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Column lists & row readers ──────────────────────────────────────────────

const NUMBER_COLUMNS: &str = "number_id, company_id, digits, country_code, \
  category, sub_category, pool_id, recording_enabled, audio_clip_id, \
  whisper, forward_to, forwarding_targets, swap_rules, last_assigned_at, \
  removed_at";

/// Claim order: never-assigned first, then oldest stamp, ties by lowest id.
const CLAIM_ORDER: &str =
  "ORDER BY last_assigned_at IS NOT NULL, last_assigned_at ASC, number_id ASC";

const POOL_COLUMNS: &str = "pool_id, company_id, name, category, \
  sub_category, active, recording_enabled, audio_clip_id, whisper, \
  forward_to, forwarding_targets, swap_rules";

const SESSION_COLUMNS: &str = "session_id, visitor_id, company_id, \
  number_id, device, entry_url, token, started_at, ended_at";

const CALL_COLUMNS: &str = "call_id, provider_call_id, caller_digits, \
  dialed_digits, number_id, pool_id, session_id, recorded, started_at, \
  duration_secs, final_status";

fn number_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawNumber> {
  Ok(RawNumber {
    number_id:          row.get(0)?,
    company_id:         row.get(1)?,
    digits:             row.get(2)?,
    country_code:       row.get(3)?,
    category:           row.get(4)?,
    sub_category:       row.get(5)?,
    pool_id:            row.get(6)?,
    recording_enabled:  row.get(7)?,
    audio_clip_id:      row.get(8)?,
    whisper:            row.get(9)?,
    forward_to:         row.get(10)?,
    forwarding_targets: row.get(11)?,
    swap_rules:         row.get(12)?,
    last_assigned_at:   row.get(13)?,
    removed_at:         row.get(14)?,
  })
}

fn pool_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPool> {
  Ok(RawPool {
    pool_id:            row.get(0)?,
    company_id:         row.get(1)?,
    name:               row.get(2)?,
    category:           row.get(3)?,
    sub_category:       row.get(4)?,
    active:             row.get(5)?,
    recording_enabled:  row.get(6)?,
    audio_clip_id:      row.get(7)?,
    whisper:            row.get(8)?,
    forward_to:         row.get(9)?,
    forwarding_targets: row.get(10)?,
    swap_rules:         row.get(11)?,
  })
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSession> {
  Ok(RawSession {
    session_id: row.get(0)?,
    visitor_id: row.get(1)?,
    company_id: row.get(2)?,
    number_id:  row.get(3)?,
    device:     row.get(4)?,
    entry_url:  row.get(5)?,
    token:      row.get(6)?,
    started_at: row.get(7)?,
    ended_at:   row.get(8)?,
  })
}

fn call_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCall> {
  Ok(RawCall {
    call_id:          row.get(0)?,
    provider_call_id: row.get(1)?,
    caller_digits:    row.get(2)?,
    dialed_digits:    row.get(3)?,
    number_id:        row.get(4)?,
    pool_id:          row.get(5)?,
    session_id:       row.get(6)?,
    recorded:         row.get(7)?,
    started_at:       row.get(8)?,
    duration_secs:    row.get(9)?,
    final_status:     row.get(10)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ringline store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a SELECT over `numbers` rows, decoding outside the closure.
  async fn query_numbers(
    &self,
    sql: String,
    param: String,
  ) -> Result<Vec<TrackingNumber>> {
    let raws: Vec<RawNumber> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![param], number_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNumber::into_number).collect()
  }
}

// ─── EngineStore impl ────────────────────────────────────────────────────────

impl EngineStore for SqliteStore {
  type Error = Error;

  // ── Numbers ───────────────────────────────────────────────────────────────

  async fn add_number(&self, input: NewNumber) -> Result<TrackingNumber> {
    let number = TrackingNumber {
      number_id:          Uuid::new_v4(),
      company_id:         input.company_id,
      digits:             input.digits,
      country_code:       input.country_code,
      category:           input.category,
      sub_category:       input.sub_category,
      pool_id:            input.pool_id,
      recording_enabled:  input.recording_enabled,
      audio_clip_id:      input.audio_clip_id,
      whisper:            input.whisper,
      forward_to:         input.forward_to,
      forwarding_targets: input.forwarding_targets,
      swap_rules:         input.swap_rules,
      last_assigned_at:   None,
      removed_at:         None,
    };

    let id_str       = encode_uuid(number.number_id);
    let company_str  = encode_uuid(number.company_id);
    let digits       = number.digits.clone();
    let country      = number.country_code.clone();
    let category_str = encode_category(number.category).to_owned();
    let sub_category = number.sub_category.clone();
    let pool_str     = number.pool_id.map(encode_uuid);
    let recording    = number.recording_enabled;
    let clip_str     = number.audio_clip_id.map(encode_uuid);
    let whisper_str  = encode_whisper(number.whisper.as_ref())?;
    let forward_to   = number.forward_to.clone();
    let targets_str  = encode_targets(&number.forwarding_targets)?;
    let rules_str    = encode_swap_rules(&number.swap_rules)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO numbers (
             number_id, company_id, digits, country_code, category,
             sub_category, pool_id, recording_enabled, audio_clip_id,
             whisper, forward_to, forwarding_targets, swap_rules
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            id_str,
            company_str,
            digits,
            country,
            category_str,
            sub_category,
            pool_str,
            recording,
            clip_str,
            whisper_str,
            forward_to,
            targets_str,
            rules_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(number)
  }

  async fn get_number(&self, id: Uuid) -> Result<Option<TrackingNumber>> {
    let id_str = encode_uuid(id);
    let sql = format!("SELECT {NUMBER_COLUMNS} FROM numbers WHERE number_id = ?1");

    let raw: Option<RawNumber> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], number_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNumber::into_number).transpose()
  }

  async fn find_number_by_digits(
    &self,
    digits: &str,
  ) -> Result<Option<TrackingNumber>> {
    let digits = digits.to_owned();
    let sql = format!(
      "SELECT {NUMBER_COLUMNS} FROM numbers WHERE country_code || digits = ?1"
    );

    let raw: Option<RawNumber> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![digits], number_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNumber::into_number).transpose()
  }

  async fn remove_number(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE numbers SET removed_at = ?2
           WHERE number_id = ?1 AND removed_at IS NULL",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn claim_number(
    &self,
    id: Uuid,
    expected: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    let id_str       = encode_uuid(id);
    let now_str      = encode_dt(now);
    let expected_str = expected.map(encode_dt);

    // The single-statement guard is the compare-and-swap: the row updates
    // only if last_assigned_at still holds the value the caller read.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE numbers SET last_assigned_at = ?2
           WHERE number_id = ?1
             AND last_assigned_at IS ?3
             AND removed_at IS NULL",
          rusqlite::params![id_str, now_str, expected_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn pool_members(&self, pool_id: Uuid) -> Result<Vec<TrackingNumber>> {
    let sql = format!(
      "SELECT {NUMBER_COLUMNS} FROM numbers
       WHERE pool_id = ?1 AND removed_at IS NULL
       {CLAIM_ORDER}"
    );
    self.query_numbers(sql, encode_uuid(pool_id)).await
  }

  async fn standalone_numbers(
    &self,
    company_id: Uuid,
    category: NumberCategory,
  ) -> Result<Vec<TrackingNumber>> {
    let company_str  = encode_uuid(company_id);
    let category_str = encode_category(category).to_owned();
    let sql = format!(
      "SELECT {NUMBER_COLUMNS} FROM numbers
       WHERE company_id = ?1 AND category = ?2
         AND pool_id IS NULL AND removed_at IS NULL
       ORDER BY last_assigned_at DESC, number_id ASC"
    );

    let raws: Vec<RawNumber> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![company_str, category_str],
            number_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNumber::into_number).collect()
  }

  // ── Pools ─────────────────────────────────────────────────────────────────

  async fn add_pool(&self, input: NewPool) -> Result<TrackingNumberPool> {
    let pool = TrackingNumberPool {
      pool_id:            Uuid::new_v4(),
      company_id:         input.company_id,
      name:               input.name,
      category:           input.category,
      sub_category:       input.sub_category,
      active:             input.active,
      recording_enabled:  input.recording_enabled,
      audio_clip_id:      input.audio_clip_id,
      whisper:            input.whisper,
      forward_to:         input.forward_to,
      forwarding_targets: input.forwarding_targets,
      swap_rules:         input.swap_rules,
    };

    let id_str       = encode_uuid(pool.pool_id);
    let company_str  = encode_uuid(pool.company_id);
    let name         = pool.name.clone();
    let category_str = encode_category(pool.category).to_owned();
    let sub_category = pool.sub_category.clone();
    let active       = pool.active;
    let recording    = pool.recording_enabled;
    let clip_str     = pool.audio_clip_id.map(encode_uuid);
    let whisper_str  = encode_whisper(pool.whisper.as_ref())?;
    let forward_to   = pool.forward_to.clone();
    let targets_str  = encode_targets(&pool.forwarding_targets)?;
    let rules_str    = encode_swap_rules(&pool.swap_rules)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pools (
             pool_id, company_id, name, category, sub_category, active,
             recording_enabled, audio_clip_id, whisper, forward_to,
             forwarding_targets, swap_rules
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            company_str,
            name,
            category_str,
            sub_category,
            active,
            recording,
            clip_str,
            whisper_str,
            forward_to,
            targets_str,
            rules_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(pool)
  }

  async fn get_pool(&self, id: Uuid) -> Result<Option<TrackingNumberPool>> {
    let id_str = encode_uuid(id);
    let sql = format!("SELECT {POOL_COLUMNS} FROM pools WHERE pool_id = ?1");

    let raw: Option<RawPool> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], pool_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPool::into_pool).transpose()
  }

  async fn active_pool(
    &self,
    company_id: Uuid,
    category: NumberCategory,
  ) -> Result<Option<TrackingNumberPool>> {
    let company_str  = encode_uuid(company_id);
    let category_str = encode_category(category).to_owned();
    let sql = format!(
      "SELECT {POOL_COLUMNS} FROM pools
       WHERE company_id = ?1 AND category = ?2 AND active = 1
       ORDER BY name ASC LIMIT 1"
    );

    let raw: Option<RawPool> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![company_str, category_str],
              pool_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPool::into_pool).transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(
    &self,
    input: NewSession,
  ) -> Result<(VisitorSession, SessionEvent)> {
    let session = VisitorSession {
      session_id: Uuid::new_v4(),
      visitor_id: input.visitor_id,
      company_id: input.company_id,
      number_id:  input.number_id,
      device:     input.device,
      entry_url:  input.entry_url,
      token:      input.token,
      started_at: Utc::now(),
      ended_at:   None,
    };
    let event = SessionEvent {
      event_id:    Uuid::new_v4(),
      session_id:  session.session_id,
      kind:        SessionEventKind::Started,
      recorded_at: session.started_at,
    };

    let session_str = encode_uuid(session.session_id);
    let visitor_str = encode_uuid(session.visitor_id);
    let company_str = encode_uuid(session.company_id);
    let number_str  = session.number_id.map(encode_uuid);
    let device_str  = encode_device(&session.device)?;
    let entry_url   = session.entry_url.clone();
    let token_str   = encode_uuid(session.token);
    let started_str = encode_dt(session.started_at);
    let event_str   = encode_uuid(event.event_id);
    let kind_str    = encode_event_kind(event.kind).to_owned();

    // One transaction: a reader never sees the session without its event.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO sessions (
             session_id, visitor_id, company_id, number_id, device,
             entry_url, token, started_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            session_str,
            visitor_str,
            company_str,
            number_str,
            device_str,
            entry_url,
            token_str,
            started_str,
          ],
        )?;
        tx.execute(
          "INSERT INTO session_events (event_id, session_id, kind, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![event_str, session_str, kind_str, started_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok((session, event))
  }

  async fn get_session(&self, id: Uuid) -> Result<Option<VisitorSession>> {
    let id_str = encode_uuid(id);
    let sql =
      format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1");

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], session_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn latest_session_for_visitor(
    &self,
    visitor_id: Uuid,
  ) -> Result<Option<VisitorSession>> {
    let visitor_str = encode_uuid(visitor_id);
    let sql = format!(
      "SELECT {SESSION_COLUMNS} FROM sessions
       WHERE visitor_id = ?1
       ORDER BY started_at DESC LIMIT 1"
    );

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![visitor_str], session_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn open_session_for_number(
    &self,
    number_id: Uuid,
  ) -> Result<Option<VisitorSession>> {
    let number_str = encode_uuid(number_id);
    let sql = format!(
      "SELECT {SESSION_COLUMNS} FROM sessions
       WHERE number_id = ?1 AND ended_at IS NULL
       ORDER BY started_at DESC LIMIT 1"
    );

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![number_str], session_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn end_session(
    &self,
    session_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<bool> {
    let session_str = encode_uuid(session_id);
    let at_str      = encode_dt(at);
    let event_str   = encode_uuid(Uuid::new_v4());
    let kind_str    = encode_event_kind(SessionEventKind::Ended).to_owned();

    // Guarded one-way transition; the Ended event is appended only when
    // this call actually flips the row, so a repeat end never duplicates.
    let flipped = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE sessions SET ended_at = ?2
           WHERE session_id = ?1 AND ended_at IS NULL",
          rusqlite::params![session_str, at_str],
        )?;
        if changed == 1 {
          tx.execute(
            "INSERT INTO session_events (event_id, session_id, kind, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![event_str, session_str, kind_str, at_str],
          )?;
        }
        tx.commit()?;
        Ok(changed == 1)
      })
      .await?;

    Ok(flipped)
  }

  async fn session_events(
    &self,
    session_id: Uuid,
  ) -> Result<Vec<SessionEvent>> {
    let session_str = encode_uuid(session_id);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, session_id, kind, recorded_at
           FROM session_events
           WHERE session_id = ?1
           ORDER BY recorded_at ASC, event_id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![session_str], |row| {
            Ok(RawEvent {
              event_id:    row.get(0)?,
              session_id:  row.get(1)?,
              kind:        row.get(2)?,
              recorded_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  // ── Calls ─────────────────────────────────────────────────────────────────

  async fn create_call(&self, input: NewCall) -> Result<Call> {
    let call = Call {
      call_id:          Uuid::new_v4(),
      provider_call_id: input.provider_call_id,
      caller_digits:    input.caller_digits,
      dialed_digits:    input.dialed_digits,
      number_id:        input.number_id,
      pool_id:          input.pool_id,
      session_id:       input.session_id,
      recorded:         input.recorded,
      started_at:       Utc::now(),
      duration_secs:    None,
      final_status:     None,
    };

    let id_str       = encode_uuid(call.call_id);
    let provider_id  = call.provider_call_id.clone();
    let caller       = call.caller_digits.clone();
    let dialed       = call.dialed_digits.clone();
    let number_str   = encode_uuid(call.number_id);
    let pool_str     = call.pool_id.map(encode_uuid);
    let session_str  = call.session_id.map(encode_uuid);
    let recorded     = call.recorded;
    let started_str  = encode_dt(call.started_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO calls (
             call_id, provider_call_id, caller_digits, dialed_digits,
             number_id, pool_id, session_id, recorded, started_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            provider_id,
            caller,
            dialed,
            number_str,
            pool_str,
            session_str,
            recorded,
            started_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(call)
  }

  async fn find_call_by_provider_id(
    &self,
    provider_call_id: &str,
  ) -> Result<Option<Call>> {
    let provider_id = provider_call_id.to_owned();
    let sql =
      format!("SELECT {CALL_COLUMNS} FROM calls WHERE provider_call_id = ?1");

    let raw: Option<RawCall> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![provider_id], call_from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCall::into_call).transpose()
  }

  async fn complete_call(
    &self,
    provider_call_id: &str,
    duration_secs: u32,
    status: CallStatus,
  ) -> Result<bool> {
    let provider_id = provider_call_id.to_owned();
    let status_str  = encode_call_status(status).to_owned();

    // Completion fields are written at most once; redelivered callbacks
    // leave the row untouched.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE calls SET duration_secs = ?2, final_status = ?3
           WHERE provider_call_id = ?1 AND final_status IS NULL",
          rusqlite::params![provider_id, duration_secs, status_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  // ── Campaigns ─────────────────────────────────────────────────────────────

  async fn add_campaign(&self, input: NewCampaign) -> Result<Campaign> {
    let campaign = Campaign {
      campaign_id:  Uuid::new_v4(),
      company_id:   input.company_id,
      name:         input.name,
      activated_at: input.activated_at,
      suspended:    input.suspended,
      ends_at:      input.ends_at,
    };

    let id_str        = encode_uuid(campaign.campaign_id);
    let company_str   = encode_uuid(campaign.company_id);
    let name          = campaign.name.clone();
    let activated_str = campaign.activated_at.map(encode_dt);
    let suspended     = campaign.suspended;
    let ends_str      = campaign.ends_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO campaigns (
             campaign_id, company_id, name, activated_at, suspended, ends_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            company_str,
            name,
            activated_str,
            suspended,
            ends_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(campaign)
  }

  async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCampaign> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT campaign_id, company_id, name, activated_at, suspended,
                      ends_at
               FROM campaigns WHERE campaign_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawCampaign {
                  campaign_id:  row.get(0)?,
                  company_id:   row.get(1)?,
                  name:         row.get(2)?,
                  activated_at: row.get(3)?,
                  suspended:    row.get(4)?,
                  ends_at:      row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCampaign::into_campaign).transpose()
  }

  async fn attach_campaign_number(
    &self,
    campaign_id: Uuid,
    number_id: Uuid,
  ) -> Result<()> {
    let campaign_str = encode_uuid(campaign_id);
    let number_str   = encode_uuid(number_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO campaign_numbers (campaign_id, number_id)
           VALUES (?1, ?2)",
          rusqlite::params![campaign_str, number_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn attach_campaign_pool(
    &self,
    campaign_id: Uuid,
    pool_id: Uuid,
  ) -> Result<()> {
    let campaign_str = encode_uuid(campaign_id);
    let pool_str     = encode_uuid(pool_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO campaign_pools (campaign_id, pool_id)
           VALUES (?1, ?2)",
          rusqlite::params![campaign_str, pool_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn campaign_numbers(
    &self,
    campaign_id: Uuid,
  ) -> Result<Vec<TrackingNumber>> {
    let sql = format!(
      "SELECT {NUMBER_COLUMNS} FROM numbers
       WHERE number_id IN
         (SELECT number_id FROM campaign_numbers WHERE campaign_id = ?1)
         AND removed_at IS NULL
       {CLAIM_ORDER}"
    );
    self.query_numbers(sql, encode_uuid(campaign_id)).await
  }

  async fn campaign_pool_numbers(
    &self,
    campaign_id: Uuid,
  ) -> Result<Vec<TrackingNumber>> {
    let sql = format!(
      "SELECT {NUMBER_COLUMNS} FROM numbers
       WHERE pool_id IN
         (SELECT pool_id FROM campaign_pools WHERE campaign_id = ?1)
         AND removed_at IS NULL
       {CLAIM_ORDER}"
    );
    self.query_numbers(sql, encode_uuid(campaign_id)).await
  }
}
