use thiserror::Error;

use crate::event::EventName;

/// Raised synchronously by `commit` on either replica when the submitted
/// event fails validation. The event never enters any queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `name` does not match any key in the declared `events` map.
    #[error("unknown event kind {name:?}")]
    UnknownEventKind { name: EventName },

    /// `payload` does not conform to `schema[name]`.
    #[error("payload for event {name:?} does not conform to its schema: {reason}")]
    SchemaMismatch { name: EventName, reason: String },
}

/// Raised by a replica's constructor when its declared event kinds and its
/// materializer table disagree. Detected once, at construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An event kind is declared in `events` but has no materializer.
    ///
    /// On the client, a single registered materializer always carries both
    /// `apply` and `rollback` together (`relay_replica::ClientMaterializer`
    /// is constructed from both at once), so a kind with only one of the
    /// two registered can never arise — that half of the pairing check is
    /// unreachable by construction rather than a separate runtime check.
    #[error("event kind {name:?} has no registered materializer")]
    MissingMaterializer { name: EventName },

    /// An event kind appears in the materializer table but was never declared.
    #[error("materializer registered for undeclared event kind {name:?}")]
    UndeclaredMaterializer { name: EventName },

    /// `events` contained an empty-string name; names must be non-empty
    /// identifiers.
    #[error("event names must be non-empty")]
    EmptyEventName,
}
