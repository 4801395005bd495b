//! Call-lifecycle notifications.
//!
//! Published on a broadcast channel so subscribers (webhook dispatchers,
//! analytics) consume asynchronously without ever blocking call handling.

use serde::{Deserialize, Serialize};

use crate::call::Call;

/// A typed call-lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CallEvent {
  /// The inbound webhook accepted the call and dispatched its flow.
  Started { call: Call },
  /// The status callback recorded the call's terminal status. Published at
  /// most once per call.
  Completed { call: Call },
}
