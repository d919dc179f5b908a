//! # relay-types: shared event model for optimistic replication
//!
//! This crate contains the types [`ServerReplica`](../relay_replica) and
//! [`ClientReplica`](../relay_replica) agree on wire-for-wire:
//!
//! - Event naming and payload validation ([`EventName`], [`PayloadSchema`], [`EventSchemas`])
//! - The two event envelopes exchanged between replicas ([`CommitEvent`], [`CommittedEvent`])
//! - The opaque client-minted correlation id ([`ClientId`])
//! - Error types surfaced by validation and construction ([`ValidationError`], [`ConfigError`])
//!
//! Nothing in this crate is async and nothing here owns a queue, a pending
//! table, or a sequence counter — that orchestration lives in
//! `relay-replica`. This crate is the "what an event looks like" layer.

mod client_id;
mod error;
mod event;
mod schema;

pub use client_id::ClientId;
pub use error::{ConfigError, ValidationError};
pub use event::{CommitEvent, CommittedEvent, EventName, EventPayload};
pub use schema::{EventSchemas, EventSchemasBuilder, JsonSchema, JsonType, PayloadSchema};
