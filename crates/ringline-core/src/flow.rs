//! Call flow building — from a raw inbound-call webhook to the ordered
//! call-control directive sequence.
//!
//! The pipeline is `InboundCall` → [`ReceivedCall`] → [`ResolvedCall`] →
//! [`BuiltFlow`] → [`CallFlow`]; rejection at any step is the `Err` path,
//! which the webhook layer answers with a hangup document.

use crate::{
  call::{Call, CallStatus, NewCall},
  error::{Error, Result},
  event::CallEvent,
  number::{
    FlowOwner, NumberCategory, TrackingNumber, WhisperConfig, WhisperLanguage,
    WhisperVoice,
  },
  store::EngineStore,
  Engine,
};

// ─── Directives ──────────────────────────────────────────────────────────────

/// One call-control instruction, in the order the transport executes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
  Hangup,
  /// Play a greeting clip to the caller.
  Play { url: String },
  /// Speak a rendered whisper message (whisper webhook only).
  Say {
    message:  String,
    language: WhisperLanguage,
    voice:    WhisperVoice,
  },
  /// Bridge the caller to the forward target.
  Dial {
    number:      String,
    record:      bool,
    /// Fetched by the transport at bridge time to render the whisper.
    whisper_url: Option<String>,
  },
}

/// The dispatched result: the recorded call and its directive sequence,
/// returned synchronously as the webhook response body.
#[derive(Debug, Clone)]
pub struct CallFlow {
  pub call:       Call,
  pub directives: Vec<Directive>,
}

// ─── Pipeline states ─────────────────────────────────────────────────────────

/// Raw inbound-call webhook fields, exactly as delivered.
#[derive(Debug, Clone, Default)]
pub struct InboundCall {
  pub provider_call_id: String,
  pub dialed:           String,
  pub caller:           String,
  pub status:           String,
}

/// Validated webhook input with normalized digit strings.
#[derive(Debug, Clone)]
pub struct ReceivedCall {
  provider_call_id: String,
  dialed_digits:    String,
  caller_digits:    String,
}

/// The call tied to its owning entity.
#[derive(Debug)]
struct ResolvedCall {
  received: ReceivedCall,
  number:   TrackingNumber,
  owner:    FlowOwner,
}

/// Fully assembled configuration, ready to record and dispatch.
#[derive(Debug)]
struct BuiltFlow {
  resolved:   ResolvedCall,
  record:     bool,
  directives: Vec<Directive>,
}

impl InboundCall {
  /// `Received` transition: every call-control field must be present.
  pub fn into_received(self) -> Result<ReceivedCall> {
    let provider_call_id = required("call_id", &self.provider_call_id)?;
    required("from", &self.caller)?;
    required("status", &self.status)?;

    let dialed_digits = normalize_digits(&required("to", &self.dialed)?);
    if dialed_digits.is_empty() {
      return Err(Error::Validation("dialed number has no digits".to_string()));
    }

    Ok(ReceivedCall {
      provider_call_id,
      dialed_digits,
      caller_digits: normalize_digits(&self.caller),
    })
  }
}

fn required(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(trimmed.to_string())
}

/// Strip formatting down to the bare digit string: one leading `+` (or the
/// `00` international prefix) and all punctuation removed.
pub fn normalize_digits(raw: &str) -> String {
  let trimmed = raw.trim();
  let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
  let digits: String =
    trimmed.chars().filter(char::is_ascii_digit).collect();
  match digits.strip_prefix("00") {
    Some(rest) if !rest.is_empty() => rest.to_string(),
    _ => digits,
  }
}

// ─── Flow builder ────────────────────────────────────────────────────────────

impl<S: EngineStore> Engine<S> {
  /// Handle an inbound call end to end: validate, resolve the owner, build
  /// the directive sequence, record the call, and publish the start event.
  ///
  /// The returned [`CallFlow`] is the webhook response; any `Err` must be
  /// answered with a hangup directive rather than connecting the call.
  pub async fn handle_inbound_call(
    &self,
    inbound: InboundCall,
  ) -> Result<CallFlow> {
    let received = inbound.into_received()?;
    let resolved = self.resolve_call(received).await?;
    let built = self.build_flow(resolved).await?;
    self.dispatch(built).await
  }

  /// `Resolved` transition: exact lookup of the dialed number, promoting a
  /// pooled number's pool to configuration owner.
  async fn resolve_call(&self, received: ReceivedCall) -> Result<ResolvedCall> {
    let number = self
      .store
      .find_number_by_digits(&received.dialed_digits)
      .await
      .map_err(Self::store_err)?
      .ok_or_else(|| Error::NumberNotFound(received.dialed_digits.clone()))?;

    if number.is_removed() {
      return Err(Error::NumberNotFound(received.dialed_digits));
    }

    let owner = match number.pool_id {
      Some(pool_id) => {
        let pool = self
          .store
          .get_pool(pool_id)
          .await
          .map_err(Self::store_err)?
          .ok_or_else(|| {
            Error::Configuration(format!(
              "number {} references missing pool {pool_id}",
              number.number_id
            ))
          })?;
        FlowOwner::Pool(pool)
      }
      None => FlowOwner::Number(number.clone()),
    };

    Ok(ResolvedCall { received, number, owner })
  }

  /// `ConfigBuilt` transition: recording mode, optional greeting, optional
  /// whisper callback, mandatory forward target.
  async fn build_flow(&self, resolved: ResolvedCall) -> Result<BuiltFlow> {
    let owner = &resolved.owner;

    let forward = owner
      .forward_to()
      .ok_or_else(|| {
        Error::Configuration(format!(
          "no forward target configured for dialed number {}",
          resolved.received.dialed_digits
        ))
      })?
      .to_string();

    let record = owner.recording_enabled();
    let mut directives = Vec::new();

    if let Some(clip_id) = owner.audio_clip_id() {
      match self.resolve_clip(clip_id).await {
        Some(url) => directives.push(Directive::Play { url }),
        None => {
          tracing::debug!(%clip_id, "greeting clip unavailable, skipping");
        }
      }
    }

    let whisper_url = owner.whisper().map(|w| self.whisper_callback_url(w));
    directives.push(Directive::Dial { number: forward, record, whisper_url });

    Ok(BuiltFlow { resolved, record, directives })
  }

  /// `Dispatched` transition: record the call (linking the open session for
  /// online owners), publish `CallEvent::Started`, and hand back the
  /// directive sequence. A redelivered webhook reuses the existing call
  /// record and publishes nothing.
  async fn dispatch(&self, built: BuiltFlow) -> Result<CallFlow> {
    let number = &built.resolved.number;
    let received = &built.resolved.received;

    if let Some(existing) = self
      .store
      .find_call_by_provider_id(&received.provider_call_id)
      .await
      .map_err(Self::store_err)?
    {
      return Ok(CallFlow { call: existing, directives: built.directives });
    }

    let session_id = if number.category == NumberCategory::Online {
      self
        .store
        .open_session_for_number(number.number_id)
        .await
        .map_err(Self::store_err)?
        .map(|s| s.session_id)
    } else {
      None
    };

    let call = self
      .store
      .create_call(NewCall {
        provider_call_id: received.provider_call_id.clone(),
        caller_digits: received.caller_digits.clone(),
        dialed_digits: received.dialed_digits.clone(),
        number_id: number.number_id,
        pool_id: number.pool_id,
        session_id,
        recorded: built.record,
      })
      .await
      .map_err(Self::store_err)?;

    self.publish(CallEvent::Started { call: call.clone() });
    Ok(CallFlow { call, directives: built.directives })
  }

  /// Record a status callback against an existing call. Idempotent:
  /// interim statuses are acknowledged and ignored, and only the first
  /// terminal delivery writes the completion fields and publishes
  /// `CallEvent::Completed`.
  pub async fn record_call_status(
    &self,
    update: CallStatusUpdate,
  ) -> Result<()> {
    let status = CallStatus::parse(&update.status).ok_or_else(|| {
      Error::Validation(format!("unknown call status {:?}", update.status))
    })?;
    if !status.is_terminal() {
      return Ok(());
    }

    let call = self
      .store
      .find_call_by_provider_id(&update.provider_call_id)
      .await
      .map_err(Self::store_err)?
      .ok_or_else(|| Error::CallNotFound(update.provider_call_id.clone()))?;

    let duration = update.duration_secs.unwrap_or(0);
    let completed = self
      .store
      .complete_call(&update.provider_call_id, duration, status)
      .await
      .map_err(Self::store_err)?;

    if completed {
      self.publish(CallEvent::Completed {
        call: Call {
          duration_secs: Some(duration),
          final_status: Some(status),
          ..call
        },
      });
    }
    Ok(())
  }

  fn whisper_callback_url(&self, whisper: &WhisperConfig) -> String {
    format!(
      "{}/telephony/whisper?message={}&language={}&voice={}",
      self.config.public_base_url.trim_end_matches('/'),
      percent_encode(&whisper.message),
      whisper.language.as_tag(),
      whisper.voice.as_tag(),
    )
  }
}

/// Status-changed webhook fields.
#[derive(Debug, Clone)]
pub struct CallStatusUpdate {
  pub provider_call_id: String,
  pub status:           String,
  pub duration_secs:    Option<u32>,
}

// ─── URL escaping ────────────────────────────────────────────────────────────

/// Percent-encode a query-string component (RFC 3986 unreserved set).
fn percent_encode(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for b in raw.bytes() {
    match b {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
        out.push(b as char)
      }
      _ => out.push_str(&format!("%{b:02X}")),
    }
  }
  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
