//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use ringline_core::{
  call::{CallStatus, NewCall},
  number::NumberCategory,
  session::{DeviceInfo, NewSession, SessionEventKind},
  store::{EngineStore, NewNumber, NewPool},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ts(offset_secs: i64) -> chrono::DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    + Duration::seconds(offset_secs)
}

fn device() -> DeviceInfo {
  DeviceInfo { width: 1280, height: 720, user_agent: None, remote_ip: None }
}

fn new_session(visitor_id: Uuid, company_id: Uuid) -> NewSession {
  NewSession {
    visitor_id,
    company_id,
    number_id: None,
    device: device(),
    entry_url: Some("https://example.com/".to_string()),
    token: Uuid::new_v4(),
  }
}

// ─── Numbers ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_find_number_by_full_digits() {
  let s = store().await;
  let company = Uuid::new_v4();

  let number = s
    .add_number(NewNumber::new(company, "1", "5550100", NumberCategory::Online))
    .await
    .unwrap();

  let found = s.find_number_by_digits("15550100").await.unwrap();
  assert_eq!(found.unwrap().number_id, number.number_id);

  assert!(s.find_number_by_digits("15559999").await.unwrap().is_none());
}

#[tokio::test]
async fn remove_number_is_soft_and_once() {
  let s = store().await;
  let n = s
    .add_number(NewNumber::new(
      Uuid::new_v4(),
      "1",
      "5550100",
      NumberCategory::Online,
    ))
    .await
    .unwrap();

  assert!(s.remove_number(n.number_id, ts(0)).await.unwrap());
  assert!(!s.remove_number(n.number_id, ts(1)).await.unwrap());

  // Still resolvable for history.
  let found = s.find_number_by_digits("15550100").await.unwrap().unwrap();
  assert!(found.is_removed());
}

// ─── Claims ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn claim_succeeds_only_with_current_expectation() {
  let s = store().await;
  let n = s
    .add_number(NewNumber::new(
      Uuid::new_v4(),
      "1",
      "5550100",
      NumberCategory::Online,
    ))
    .await
    .unwrap();

  // Fresh number: expectation is None.
  assert!(s.claim_number(n.number_id, None, ts(0)).await.unwrap());

  // A stale expectation (still None) loses.
  assert!(!s.claim_number(n.number_id, None, ts(1)).await.unwrap());

  // The current value wins again.
  assert!(s.claim_number(n.number_id, Some(ts(0)), ts(2)).await.unwrap());

  let reread = s.get_number(n.number_id).await.unwrap().unwrap();
  assert_eq!(reread.last_assigned_at, Some(ts(2)));
}

#[tokio::test]
async fn claim_refuses_removed_number() {
  let s = store().await;
  let n = s
    .add_number(NewNumber::new(
      Uuid::new_v4(),
      "1",
      "5550100",
      NumberCategory::Online,
    ))
    .await
    .unwrap();

  s.remove_number(n.number_id, ts(0)).await.unwrap();
  assert!(!s.claim_number(n.number_id, None, ts(1)).await.unwrap());
}

#[tokio::test]
async fn claim_preserves_microsecond_precision() {
  let s = store().await;
  let n = s
    .add_number(NewNumber::new(
      Uuid::new_v4(),
      "1",
      "5550100",
      NumberCategory::Online,
    ))
    .await
    .unwrap();

  let precise = ts(0) + Duration::microseconds(123_456);
  assert!(s.claim_number(n.number_id, None, precise).await.unwrap());

  let reread = s.get_number(n.number_id).await.unwrap().unwrap();
  assert_eq!(reread.last_assigned_at, Some(precise));
}

// ─── Orderings ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn pool_members_order_never_assigned_then_oldest() {
  let s = store().await;
  let company = Uuid::new_v4();
  let pool = s
    .add_pool(NewPool::new(company, "web", NumberCategory::Online))
    .await
    .unwrap();

  let mut input_a = NewNumber::new(company, "1", "5550101", NumberCategory::Online);
  input_a.pool_id = Some(pool.pool_id);
  let mut input_b = NewNumber::new(company, "1", "5550102", NumberCategory::Online);
  input_b.pool_id = Some(pool.pool_id);
  let mut input_c = NewNumber::new(company, "1", "5550103", NumberCategory::Online);
  input_c.pool_id = Some(pool.pool_id);

  let a = s.add_number(input_a).await.unwrap();
  let b = s.add_number(input_b).await.unwrap();
  let c = s.add_number(input_c).await.unwrap();

  // b assigned earliest, a most recently, c never.
  s.claim_number(b.number_id, None, ts(0)).await.unwrap();
  s.claim_number(a.number_id, None, ts(60)).await.unwrap();

  let members = s.pool_members(pool.pool_id).await.unwrap();
  let ids: Vec<_> = members.iter().map(|n| n.number_id).collect();
  assert_eq!(ids, vec![c.number_id, b.number_id, a.number_id]);
}

#[tokio::test]
async fn standalone_numbers_most_recent_first() {
  let s = store().await;
  let company = Uuid::new_v4();

  let a = s
    .add_number(NewNumber::new(company, "1", "5550101", NumberCategory::Online))
    .await
    .unwrap();
  let b = s
    .add_number(NewNumber::new(company, "1", "5550102", NumberCategory::Online))
    .await
    .unwrap();
  let c = s
    .add_number(NewNumber::new(company, "1", "5550103", NumberCategory::Online))
    .await
    .unwrap();

  s.claim_number(a.number_id, None, ts(0)).await.unwrap();
  s.claim_number(b.number_id, None, ts(60)).await.unwrap();

  let numbers = s
    .standalone_numbers(company, NumberCategory::Online)
    .await
    .unwrap();
  let ids: Vec<_> = numbers.iter().map(|n| n.number_id).collect();
  // Most recently assigned first; never-assigned last.
  assert_eq!(ids, vec![b.number_id, a.number_id, c.number_id]);
}

#[tokio::test]
async fn standalone_numbers_exclude_pooled_and_offline() {
  let s = store().await;
  let company = Uuid::new_v4();
  let pool = s
    .add_pool(NewPool::new(company, "web", NumberCategory::Online))
    .await
    .unwrap();

  let mut pooled = NewNumber::new(company, "1", "5550101", NumberCategory::Online);
  pooled.pool_id = Some(pool.pool_id);
  s.add_number(pooled).await.unwrap();
  s.add_number(NewNumber::new(company, "1", "5550102", NumberCategory::Offline))
    .await
    .unwrap();
  let standalone = s
    .add_number(NewNumber::new(company, "1", "5550103", NumberCategory::Online))
    .await
    .unwrap();

  let numbers = s
    .standalone_numbers(company, NumberCategory::Online)
    .await
    .unwrap();
  let ids: Vec<_> = numbers.iter().map(|n| n.number_id).collect();
  assert_eq!(ids, vec![standalone.number_id]);
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_session_writes_start_event_atomically() {
  let s = store().await;
  let (session, event) = s
    .create_session(new_session(Uuid::new_v4(), Uuid::new_v4()))
    .await
    .unwrap();

  assert_eq!(event.session_id, session.session_id);
  assert_eq!(event.kind, SessionEventKind::Started);

  let events = s.session_events(session.session_id).await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, SessionEventKind::Started);
}

#[tokio::test]
async fn end_session_flips_once_and_appends_one_event() {
  let s = store().await;
  let (session, _) = s
    .create_session(new_session(Uuid::new_v4(), Uuid::new_v4()))
    .await
    .unwrap();

  assert!(s.end_session(session.session_id, ts(10)).await.unwrap());
  assert!(!s.end_session(session.session_id, ts(20)).await.unwrap());

  let reread = s.get_session(session.session_id).await.unwrap().unwrap();
  assert_eq!(reread.ended_at, Some(ts(10)));

  let events = s.session_events(session.session_id).await.unwrap();
  let ended: Vec<_> = events
    .iter()
    .filter(|e| e.kind == SessionEventKind::Ended)
    .collect();
  assert_eq!(ended.len(), 1);
}

#[tokio::test]
async fn latest_session_for_visitor_prefers_newest() {
  let s = store().await;
  let visitor = Uuid::new_v4();
  let company = Uuid::new_v4();

  let (first, _) = s.create_session(new_session(visitor, company)).await.unwrap();
  let (second, _) = s.create_session(new_session(visitor, company)).await.unwrap();
  assert_ne!(first.session_id, second.session_id);

  let latest = s.latest_session_for_visitor(visitor).await.unwrap().unwrap();
  assert_eq!(latest.session_id, second.session_id);
}

#[tokio::test]
async fn open_session_for_number_skips_ended() {
  let s = store().await;
  let company = Uuid::new_v4();
  let n = s
    .add_number(NewNumber::new(company, "1", "5550100", NumberCategory::Online))
    .await
    .unwrap();

  let mut input = new_session(Uuid::new_v4(), company);
  input.number_id = Some(n.number_id);
  let (session, _) = s.create_session(input).await.unwrap();

  let open = s.open_session_for_number(n.number_id).await.unwrap();
  assert_eq!(open.unwrap().session_id, session.session_id);

  s.end_session(session.session_id, ts(10)).await.unwrap();
  assert!(s.open_session_for_number(n.number_id).await.unwrap().is_none());
}

// ─── Calls ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn complete_call_writes_once() {
  let s = store().await;
  let company = Uuid::new_v4();
  let n = s
    .add_number(NewNumber::new(company, "1", "5550100", NumberCategory::Online))
    .await
    .unwrap();

  let call = s
    .create_call(NewCall {
      provider_call_id: "CA-100".to_string(),
      caller_digits:    "15550001111".to_string(),
      dialed_digits:    "15550100".to_string(),
      number_id:        n.number_id,
      pool_id:          None,
      session_id:       None,
      recorded:         true,
    })
    .await
    .unwrap();
  assert!(call.final_status.is_none());

  assert!(
    s.complete_call("CA-100", 42, CallStatus::Completed).await.unwrap()
  );
  // Redelivery leaves the record untouched.
  assert!(!s.complete_call("CA-100", 99, CallStatus::Failed).await.unwrap());

  let reread = s.find_call_by_provider_id("CA-100").await.unwrap().unwrap();
  assert_eq!(reread.duration_secs, Some(42));
  assert_eq!(reread.final_status, Some(CallStatus::Completed));
}

// ─── Campaign associations ───────────────────────────────────────────────────

#[tokio::test]
async fn campaign_numbers_in_claim_order() {
  let s = store().await;
  let company = Uuid::new_v4();
  let campaign = s
    .add_campaign(ringline_core::campaign::NewCampaign::active(
      company, "mailer",
    ))
    .await
    .unwrap();

  let a = s
    .add_number(NewNumber::new(company, "1", "5550101", NumberCategory::Offline))
    .await
    .unwrap();
  let b = s
    .add_number(NewNumber::new(company, "1", "5550102", NumberCategory::Offline))
    .await
    .unwrap();

  s.attach_campaign_number(campaign.campaign_id, a.number_id).await.unwrap();
  s.attach_campaign_number(campaign.campaign_id, b.number_id).await.unwrap();

  s.claim_number(a.number_id, None, ts(0)).await.unwrap();

  let numbers = s.campaign_numbers(campaign.campaign_id).await.unwrap();
  let ids: Vec<_> = numbers.iter().map(|n| n.number_id).collect();
  // b never assigned, so it leads.
  assert_eq!(ids, vec![b.number_id, a.number_id]);
}

#[tokio::test]
async fn campaign_pool_numbers_reachable_through_pools() {
  let s = store().await;
  let company = Uuid::new_v4();
  let campaign = s
    .add_campaign(ringline_core::campaign::NewCampaign::active(
      company, "radio",
    ))
    .await
    .unwrap();
  let pool = s
    .add_pool(NewPool::new(company, "offline", NumberCategory::Offline))
    .await
    .unwrap();

  let mut input = NewNumber::new(company, "1", "5550101", NumberCategory::Offline);
  input.pool_id = Some(pool.pool_id);
  let pooled = s.add_number(input).await.unwrap();

  assert!(s.campaign_numbers(campaign.campaign_id).await.unwrap().is_empty());

  s.attach_campaign_pool(campaign.campaign_id, pool.pool_id).await.unwrap();
  let numbers = s.campaign_pool_numbers(campaign.campaign_id).await.unwrap();
  assert_eq!(numbers.len(), 1);
  assert_eq!(numbers[0].number_id, pooled.number_id);
}
