//! # relay: optimistic event replication
//!
//! `relay` gives an application two replicas of the same deterministic
//! state machine — a [`ClientReplica`] that applies events the moment
//! they're submitted, and a [`ServerReplica`] that is authoritative — and
//! the callback contracts that let an application keep them converged:
//! optimistic local apply, server-side sequencing, and confirm/rollback
//! reconciliation when the two disagree.
//!
//! This crate re-exports the pieces most applications need:
//! [`relay_types`] for the event and schema model, [`relay_replica`] for
//! the replicas themselves. See `examples/counter.rs` for a minimal,
//! runnable pair, and `relay-test-support` for wiring one up without a
//! real transport.

pub use relay_replica::{
    on_commit, on_committed, server_materializer, CallbackError, CallbackResult, ClientConfig,
    ClientMaterializer, ClientReplica, ClientReplicaBuilder, CommitError, ConfigError,
    MaterializerError, MaterializerResult, OnCommit, OnCommitted, ServerConfig, ServerMaterializer,
    ServerReplica, ServerReplicaBuilder, ValidationError,
};
pub use relay_types::{
    ClientId, CommitEvent, CommittedEvent, EventName, EventPayload, EventSchemas,
    EventSchemasBuilder, JsonSchema, JsonType, PayloadSchema,
};
