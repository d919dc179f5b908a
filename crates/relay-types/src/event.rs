use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client_id::ClientId;

/// A registered event kind's name. Indexes the schema and materializer
/// tables of a replica; immutable for the replica's lifetime once declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventName(String);

impl EventName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EventName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// An event submitted to either replica.
///
/// `client_id` is absent when the application first submits on either
/// replica; on the client path it is populated by `ClientReplica` itself
/// before `onCommit` fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEvent {
    pub name: EventName,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
}

impl CommitEvent {
    pub fn new(name: impl Into<EventName>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            client_id: None,
        }
    }

    /// Returns a copy of this event carrying the given client id, as
    /// `ClientReplica`'s actor loop does before invoking `apply`.
    #[must_use]
    pub fn with_client_id(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }
}

/// An event acknowledged by the server.
///
/// On success, `sequence` is the monotonically assigned slot and `error`
/// is `false`. On failure, `sequence` is `-1` and `error` is `true`; the
/// original `name`, `payload` and `client_id` are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedEvent {
    pub name: EventName,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    pub sequence: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

/// Sentinel sequence value a failed `CommittedEvent` carries, by convention.
pub const FAILED_SEQUENCE: i64 = -1;

impl CommittedEvent {
    /// Builds the acknowledgement for a successfully materialized event.
    pub fn success(event: CommitEvent, sequence: i64) -> Self {
        Self {
            name: event.name,
            payload: event.payload,
            client_id: event.client_id,
            sequence,
            error: false,
        }
    }

    /// Builds the acknowledgement for an event whose materializer failed.
    pub fn failure(event: CommitEvent) -> Self {
        Self {
            name: event.name,
            payload: event.payload,
            client_id: event.client_id,
            sequence: FAILED_SEQUENCE,
            error: true,
        }
    }
}

/// The fields an `apply` materializer needs, regardless of whether the
/// event arrived as a freshly-minted [`CommitEvent`] (the client's own
/// optimistic commit) or as a [`CommittedEvent`] (a foreign or broadcast
/// acknowledgement being blind-applied). `apply` never needs `sequence` or
/// `error` — those only matter for reconciliation bookkeeping, which
/// `ClientReplica` does itself before deciding to call `apply` at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub name: EventName,
    pub payload: Value,
    pub client_id: Option<ClientId>,
}

impl From<&CommitEvent> for EventPayload {
    fn from(event: &CommitEvent) -> Self {
        Self {
            name: event.name.clone(),
            payload: event.payload.clone(),
            client_id: event.client_id.clone(),
        }
    }
}

impl From<&CommittedEvent> for EventPayload {
    fn from(event: &CommittedEvent) -> Self {
        Self {
            name: event.name.clone(),
            payload: event.payload.clone(),
            client_id: event.client_id.clone(),
        }
    }
}
