//! Error types for `ringline-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed input, rejected before any assignment side effect.
  #[error("validation failed: {0}")]
  Validation(String),

  /// Automated traffic; the visit never consumes a number.
  #[error("automated traffic rejected")]
  BotRejected,

  #[error("no tracking number matches dialed digits {0:?}")]
  NumberNotFound(String),

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("call not found: {0:?}")]
  CallNotFound(String),

  #[error("campaign not found: {0}")]
  CampaignNotFound(Uuid),

  /// The supplied end-session token does not match the session's.
  #[error("invalid session token")]
  InvalidToken,

  #[error("campaign {0} is not active")]
  CampaignInactive(Uuid),

  #[error("no number available for assignment")]
  NoNumberAvailable,

  /// The owner entity resolved but its configuration cannot route a call.
  /// Always answered with a hangup, never a partial dial.
  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
