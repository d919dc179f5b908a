//! # relay-replica: optimistic event replication
//!
//! This crate is the core of the `relay` workspace: the pair of per-replica
//! state machines, [`ServerReplica`] and [`ClientReplica`], that implement
//! optimistic event replication between a client and an authoritative
//! server.
//!
//! Application code:
//!
//! 1. Declares a fixed set of event kinds and their payload schemas
//!    (see `relay-types`'s [`relay_types::EventSchemas`]).
//! 2. Supplies one materializer per kind to the server, and an
//!    `apply`/`rollback` pair per kind to the client.
//! 3. Wires `ServerReplica::commit`, `ServerReplica`'s `onCommitted`
//!    callback, `ClientReplica::commit`, `ClientReplica`'s `onCommit`
//!    callback, and `ClientReplica::receive` together over whatever
//!    transport it likes — that wiring is explicitly out of scope for this
//!    crate, which only fixes the callback contracts that such glue must
//!    satisfy.
//!
//! See `relay-test-support` for an in-process transport suitable for tests
//! and local development, and the `relay` crate for a runnable demo.

mod callback;
mod client;
mod error;
mod server;

pub use callback::{
    on_commit, on_committed, server_materializer, CallbackResult, ClientMaterializer,
    MaterializerResult, OnCommit, OnCommitted, ServerMaterializer,
};
pub use client::{ClientConfig, ClientReplica, ClientReplicaBuilder};
pub use error::{CallbackError, CommitError, ConfigError, MaterializerError, ValidationError};
pub use server::{ServerConfig, ServerReplica, ServerReplicaBuilder};

#[cfg(test)]
mod proptests;
