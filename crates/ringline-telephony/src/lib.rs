//! Call-control webhook layer for Ringline.
//!
//! Exposes an axum [`Router`] implementing the telephony webhooks (inbound
//! call, status change, whisper content) backed by any engine store, plus
//! the combined application router with the JSON API nested under `/api`.

pub mod error;
pub mod handlers;
pub mod xml;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  routing::{get, post},
  Router,
};
use ringline_core::{store::EngineStore, Engine};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  /// Externally reachable base URL, used for whisper callback URLs.
  pub public_base_url:  String,
  pub store_path:       PathBuf,
  #[serde(default = "default_audio_timeout_ms")]
  pub audio_timeout_ms: u64,
}

fn default_audio_timeout_ms() -> u64 { 800 }

// ─── Routers ─────────────────────────────────────────────────────────────────

/// Build the telephony webhook router for `engine`.
pub fn telephony_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: EngineStore + 'static,
{
  Router::new()
    .route("/telephony/voice", post(handlers::voice::handler::<S>))
    .route("/telephony/status", post(handlers::status::handler::<S>))
    .route("/telephony/whisper", get(handlers::whisper::handler))
    .with_state(engine)
}

/// The full application: telephony webhooks plus the JSON API under `/api`.
pub fn app<S>(engine: Arc<Engine<S>>) -> Router
where
  S: EngineStore + 'static,
{
  telephony_router(engine.clone())
    .nest("/api", ringline_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{header, Request, StatusCode},
  };
  use ringline_core::{
    clients::{NoAudioClips, UserAgentBotDetector},
    number::NumberCategory,
    store::{EngineStore as _, NewNumber, NewPool},
    Engine, EngineConfig,
  };
  use ringline_store_sqlite::SqliteStore;
  use serde_json::{json, Value};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::app;

  async fn make_engine() -> Arc<Engine<SqliteStore>> {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    Arc::new(Engine::new(
      store,
      Arc::new(UserAgentBotDetector::default()),
      Arc::new(NoAudioClips),
      EngineConfig::default(),
    ))
  }

  async fn post_form(
    engine: Arc<Engine<SqliteStore>>,
    uri: &str,
    body: &str,
  ) -> axum::response::Response {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
      .body(Body::from(body.to_string()))
      .unwrap();
    app(engine).oneshot(req).await.unwrap()
  }

  async fn post_json(
    engine: Arc<Engine<SqliteStore>>,
    uri: &str,
    body: &Value,
  ) -> axum::response::Response {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    app(engine).oneshot(req).await.unwrap()
  }

  async fn get(
    engine: Arc<Engine<SqliteStore>>,
    uri: &str,
  ) -> axum::response::Response {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app(engine).oneshot(req).await.unwrap()
  }

  async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  async fn seed_number(engine: &Engine<SqliteStore>) {
    let mut input =
      NewNumber::new(Uuid::new_v4(), "1", "5550100", NumberCategory::Online);
    input.forward_to = Some("15558675309".to_string());
    engine.store().add_number(input).await.unwrap();
  }

  // ── Voice webhook ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn voice_webhook_returns_dial_document() {
    let engine = make_engine().await;
    seed_number(&engine).await;

    let resp = post_form(
      engine,
      "/telephony/voice",
      "call_id=CA-1&to=%2B15550100&from=%2B15550001111&status=ringing",
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp
      .headers()
      .get(header::CONTENT_TYPE)
      .unwrap()
      .to_str()
      .unwrap()
      .to_string();
    assert!(ct.contains("xml"), "Content-Type: {ct}");

    let xml = body_string(resp).await;
    assert!(xml.contains(">15558675309</Dial>"), "xml: {xml}");
    assert!(!xml.contains("<Hangup/>"), "xml: {xml}");
  }

  #[tokio::test]
  async fn voice_webhook_unknown_number_hangs_up() {
    let engine = make_engine().await;

    let resp = post_form(
      engine,
      "/telephony/voice",
      "call_id=CA-1&to=%2B15559999&from=%2B15550001111&status=ringing",
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let xml = body_string(resp).await;
    assert!(xml.contains("<Hangup/>"), "xml: {xml}");
  }

  #[tokio::test]
  async fn voice_webhook_missing_fields_hang_up() {
    let engine = make_engine().await;
    seed_number(&engine).await;

    // No caller number.
    let resp = post_form(
      engine,
      "/telephony/voice",
      "call_id=CA-1&to=%2B15550100&status=ringing",
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let xml = body_string(resp).await;
    assert!(xml.contains("<Hangup/>"), "xml: {xml}");
  }

  #[tokio::test]
  async fn voice_webhook_without_forward_target_hangs_up() {
    let engine = make_engine().await;
    // Number exists but has no forward target configured.
    engine
      .store()
      .add_number(NewNumber::new(
        Uuid::new_v4(),
        "1",
        "5550100",
        NumberCategory::Online,
      ))
      .await
      .unwrap();

    let resp = post_form(
      engine,
      "/telephony/voice",
      "call_id=CA-1&to=%2B15550100&from=%2B15550001111&status=ringing",
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let xml = body_string(resp).await;
    assert!(xml.contains("<Hangup/>"), "xml: {xml}");
  }

  // ── Status webhook ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn status_webhook_is_idempotent() {
    let engine = make_engine().await;
    seed_number(&engine).await;

    post_form(
      engine.clone(),
      "/telephony/voice",
      "call_id=CA-1&to=%2B15550100&from=%2B15550001111&status=ringing",
    )
    .await;

    let first = post_form(
      engine.clone(),
      "/telephony/status",
      "call_id=CA-1&status=completed&duration_secs=42",
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    // Retried delivery with a different duration: acknowledged, ignored.
    let second = post_form(
      engine.clone(),
      "/telephony/status",
      "call_id=CA-1&status=completed&duration_secs=99",
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);

    let call = engine
      .store()
      .find_call_by_provider_id("CA-1")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(call.duration_secs, Some(42));
  }

  #[tokio::test]
  async fn status_webhook_unknown_call_is_404() {
    let engine = make_engine().await;
    let resp = post_form(
      engine,
      "/telephony/status",
      "call_id=CA-404&status=completed&duration_secs=5",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Whisper webhook ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn whisper_webhook_renders_say() {
    let engine = make_engine().await;
    let resp = get(
      engine,
      "/telephony/whisper?message=Call%20from%20web&language=en&voice=woman",
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let xml = body_string(resp).await;
    assert!(
      xml.contains("<Say language=\"en\" voice=\"woman\">Call from web</Say>"),
      "xml: {xml}"
    );
  }

  #[tokio::test]
  async fn whisper_webhook_rejects_unknown_voice() {
    let engine = make_engine().await;
    let resp = get(
      engine,
      "/telephony/whisper?message=hi&language=en&voice=robot",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Session API ─────────────────────────────────────────────────────────

  fn start_body(company: Uuid) -> Value {
    json!({
      "company_id": company,
      "entry_url": "https://example.com/landing",
      "device": { "width": 1280, "height": 720, "user_agent": "Mozilla/5.0" },
    })
  }

  #[tokio::test]
  async fn session_start_end_roundtrip() {
    let engine = make_engine().await;
    let company = Uuid::new_v4();
    let mut pool_input = NewPool::new(company, "web", NumberCategory::Online);
    pool_input.forward_to = Some("15558675309".to_string());
    let pool = engine.store().add_pool(pool_input).await.unwrap();
    let mut number =
      NewNumber::new(company, "1", "5550101", NumberCategory::Online);
    number.pool_id = Some(pool.pool_id);
    engine.store().add_number(number).await.unwrap();

    let resp =
      post_json(engine.clone(), "/api/sessions", &start_body(company)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value =
      serde_json::from_str(&body_string(resp).await).unwrap();

    let session_id = body["session_id"].as_str().unwrap().to_string();
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["number"]["e164"], "15550101");

    // Wrong token is forbidden.
    let resp = post_json(
      engine.clone(),
      &format!("/api/sessions/{session_id}/end"),
      &json!({ "token": Uuid::new_v4() }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Correct token ends the session; a repeat end is still 204.
    for _ in 0..2 {
      let resp = post_json(
        engine.clone(),
        &format!("/api/sessions/{session_id}/end"),
        &json!({ "token": token }),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
  }

  #[tokio::test]
  async fn session_start_for_bot_is_no_content() {
    let engine = make_engine().await;
    let company = Uuid::new_v4();
    let mut body = start_body(company);
    body["device"]["user_agent"] = json!("Googlebot/2.1");

    let resp = post_json(engine, "/api/sessions", &body).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  }

  #[tokio::test]
  async fn session_end_unknown_is_404() {
    let engine = make_engine().await;
    let resp = post_json(
      engine,
      &format!("/api/sessions/{}/end", Uuid::new_v4()),
      &json!({ "token": Uuid::new_v4() }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Campaign API ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn campaign_assign_returns_number_or_structured_error() {
    let engine = make_engine().await;
    let company = Uuid::new_v4();
    let campaign = engine
      .store()
      .add_campaign(ringline_core::campaign::NewCampaign::active(
        company, "mailer",
      ))
      .await
      .unwrap();
    let number = engine
      .store()
      .add_number(NewNumber::new(
        company,
        "1",
        "5550102",
        NumberCategory::Offline,
      ))
      .await
      .unwrap();
    engine
      .store()
      .attach_campaign_number(campaign.campaign_id, number.number_id)
      .await
      .unwrap();

    let resp = post_json(
      engine.clone(),
      &format!("/api/campaigns/{}/assign", campaign.campaign_id),
      &json!({}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["e164"], "15550102");
  }

  #[tokio::test]
  async fn inactive_campaign_is_a_conflict() {
    let engine = make_engine().await;
    let mut input = ringline_core::campaign::NewCampaign::active(
      Uuid::new_v4(),
      "pending",
    );
    input.activated_at = None;
    let campaign = engine.store().add_campaign(input).await.unwrap();

    let resp = post_json(
      engine,
      &format!("/api/campaigns/{}/assign", campaign.campaign_id),
      &json!({}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["code"], "campaign_inactive");
  }

  #[tokio::test]
  async fn exhausted_campaign_is_a_conflict() {
    let engine = make_engine().await;
    let campaign = engine
      .store()
      .add_campaign(ringline_core::campaign::NewCampaign::active(
        Uuid::new_v4(),
        "empty",
      ))
      .await
      .unwrap();

    let resp = post_json(
      engine,
      &format!("/api/campaigns/{}/assign", campaign.campaign_id),
      &json!({}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["code"], "no_number_available");
  }
}
