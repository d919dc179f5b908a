//! `ServerReplica`: the authoritative, serial executor of committed events.
//!
//! A single-writer-per-shard design with exactly one shard: there is one
//! authoritative replica, so there is one drain task, spawned once at
//! construction and never torn down.

use std::collections::HashMap;
use std::sync::Arc;

use relay_types::{CommitEvent, CommittedEvent, ConfigError, EventName, EventSchemas, EventSchemasBuilder};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::callback::{CallbackResult, MaterializerResult, OnCommitted, ServerMaterializer};
use crate::error::CommitError;

/// Construction-time options for [`ServerReplica`].
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// The first sequence number assigned to a successful commit.
    pub initial_sequence: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { initial_sequence: 0 }
    }
}

/// Incrementally assembles a [`ServerReplica`]: declare event kinds and
/// their schemas, register a materializer per kind, optionally register
/// `onCommitted`, then `build()`.
#[derive(Default)]
pub struct ServerReplicaBuilder {
    config: ServerConfig,
    schemas: EventSchemasBuilder,
    materializers: HashMap<EventName, ServerMaterializer>,
    on_committed: Option<OnCommitted>,
}

impl ServerReplicaBuilder {
    #[must_use]
    pub fn sequence(mut self, initial_sequence: i64) -> Self {
        self.config.initial_sequence = initial_sequence;
        self
    }

    /// Declares an event kind, its schema, and its authoritative
    /// materializer in one step.
    #[must_use]
    pub fn event(
        mut self,
        name: impl Into<EventName>,
        schema: impl relay_types::PayloadSchema + 'static,
        materializer: ServerMaterializer,
    ) -> Self {
        let name = name.into();
        self.schemas = self.schemas.event(name.clone(), schema);
        self.materializers.insert(name, materializer);
        self
    }

    #[must_use]
    pub fn on_committed(mut self, callback: OnCommitted) -> Self {
        self.on_committed = Some(callback);
        self
    }

    /// Validates that every declared event kind has a materializer and
    /// vice versa, then spawns the drain task and returns the handle.
    pub fn build(self) -> Result<ServerReplica, ConfigError> {
        let schemas = self.schemas.build()?;
        for name in schemas.names() {
            if !self.materializers.contains_key(name) {
                return Err(ConfigError::MissingMaterializer { name: name.clone() });
            }
        }
        for name in self.materializers.keys() {
            if !schemas.contains(name) {
                return Err(ConfigError::UndeclaredMaterializer { name: name.clone() });
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let schemas = Arc::new(schemas);
        let materializers = Arc::new(self.materializers);
        let drain = tokio::spawn(drain_loop(
            rx,
            materializers,
            self.on_committed,
            self.config.initial_sequence,
        ));

        Ok(ServerReplica {
            schemas,
            commit_tx: tx,
            drain,
        })
    }
}

/// The authoritative replica: validates, queues, and serially materializes
/// committed events, assigning dense sequence numbers to the successful
/// ones.
pub struct ServerReplica {
    schemas: Arc<EventSchemas>,
    commit_tx: mpsc::UnboundedSender<CommitEvent>,
    drain: JoinHandle<()>,
}

impl ServerReplica {
    pub fn builder() -> ServerReplicaBuilder {
        ServerReplicaBuilder::default()
    }

    /// Validates `event` and enqueues it for authoritative materialization.
    ///
    /// Resolves as soon as the event is enqueued; it does not wait for the
    /// materializer to run or for `onCommitted` to fire.
    pub async fn commit(&self, event: CommitEvent) -> Result<(), CommitError> {
        self.schemas.validate(&event)?;
        self.commit_tx
            .send(event)
            .expect("drain task outlives every ServerReplica handle that can still send");
        Ok(())
    }

    /// Aborts the drain task. Replica shutdown isn't part of the core
    /// commit/acknowledge contract — provided so embedding applications
    /// and tests can tear a replica down deterministically instead of
    /// relying on process exit.
    pub fn shutdown(self) {
        self.drain.abort();
    }
}

async fn drain_loop(
    mut rx: mpsc::UnboundedReceiver<CommitEvent>,
    materializers: Arc<HashMap<EventName, ServerMaterializer>>,
    on_committed: Option<OnCommitted>,
    mut sequence: i64,
) {
    while let Some(event) = rx.recv().await {
        let materializer = materializers
            .get(&event.name)
            .expect("materializer/schema parity is enforced at construction");

        let outcome: MaterializerResult = materializer(event.clone()).await;

        let committed = match outcome {
            Ok(()) => {
                let s = sequence;
                let committed = CommittedEvent::success(event, s);
                tracing::debug!(
                    name = %committed.name,
                    sequence = s,
                    client_id = committed.client_id.as_ref().map(ToString::to_string),
                    "server materialized event"
                );
                sequence += 1;
                committed
            }
            Err(err) => {
                tracing::warn!(
                    name = %event.name,
                    client_id = event.client_id.as_ref().map(ToString::to_string),
                    error = %err,
                    "server materializer failed; sequence not advanced"
                );
                CommittedEvent::failure(event)
            }
        };

        if let Some(callback) = &on_committed {
            let result: CallbackResult = callback(committed).await;
            if let Err(err) = result {
                tracing::warn!(error = %err, "onCommitted callback failed; commit remains durable");
            }
        }
    }
}
