//! `ClientReplica`: optimistic local apply, pending-table bookkeeping, and
//! reconciliation against server acknowledgements.
//!
//! A single actor task serializes *two* kinds of work against the same
//! application state: draining freshly-submitted commits (optimistic
//! apply) and reconciling incoming acknowledgements (`receive`). No two
//! materializer invocations may run concurrently, and that has to hold
//! across both entry points, not just within one of them — so both funnel
//! through one channel into one task: a single writer with one inbox.

use std::collections::HashMap;
use std::sync::Arc;

use relay_types::{ClientId, CommitEvent, CommittedEvent, ConfigError, EventName, EventPayload, EventSchemas, EventSchemasBuilder};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::callback::{CallbackResult, ClientMaterializer, MaterializerResult, OnCommit};
use crate::error::CommitError;

/// Construction-time options for [`ClientReplica`].
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    /// Held but unused for correctness; reserved for future gap detection.
    pub initial_sequence: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { initial_sequence: 0 }
    }
}

/// Incrementally assembles a [`ClientReplica`]: declare event kinds and
/// their schemas, register an `apply`+`rollback` pair per kind, optionally
/// register `onCommit`, then `build()`.
#[derive(Default)]
pub struct ClientReplicaBuilder {
    config: ClientConfig,
    schemas: EventSchemasBuilder,
    materializers: HashMap<EventName, ClientMaterializer>,
    on_commit: Option<OnCommit>,
}

impl ClientReplicaBuilder {
    #[must_use]
    pub fn sequence(mut self, initial_sequence: i64) -> Self {
        self.config.initial_sequence = initial_sequence;
        self
    }

    /// Declares an event kind, its schema, and its `apply`/`rollback` pair
    /// in one step. Both materializers are mandatory: a kind with only
    /// `apply` or only `rollback` registered can never arise, because
    /// supplying both together here makes that pairing impossible to get
    /// wrong at the call site.
    #[must_use]
    pub fn event(
        mut self,
        name: impl Into<EventName>,
        schema: impl relay_types::PayloadSchema + 'static,
        materializer: ClientMaterializer,
    ) -> Self {
        let name = name.into();
        self.schemas = self.schemas.event(name.clone(), schema);
        self.materializers.insert(name, materializer);
        self
    }

    #[must_use]
    pub fn on_commit(mut self, callback: OnCommit) -> Self {
        self.on_commit = Some(callback);
        self
    }

    pub fn build(self) -> Result<ClientReplica, ConfigError> {
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
        let drain = tokio::spawn(actor_loop(rx, materializers, self.on_commit));

        Ok(ClientReplica {
            schemas,
            work_tx: tx,
            drain,
            _sequence: self.config.initial_sequence,
        })
    }
}

enum ClientWork {
    Commit(CommitEvent),
    Receive(CommittedEvent, oneshot::Sender<()>),
    #[cfg(test)]
    PendingLen(oneshot::Sender<usize>),
}

/// The local replica: applies events optimistically on submission, tracks
/// them in `pending` by clientId, and reconciles server acknowledgements
/// against that table.
pub struct ClientReplica {
    schemas: Arc<EventSchemas>,
    work_tx: mpsc::UnboundedSender<ClientWork>,
    drain: JoinHandle<()>,
    /// Reserved for future gap detection; not read anywhere today.
    _sequence: i64,
}

impl ClientReplica {
    pub fn builder() -> ClientReplicaBuilder {
        ClientReplicaBuilder::default()
    }

    /// Validates `event` and enqueues it for optimistic application.
    ///
    /// Resolves as soon as the event is enqueued. The clientId is minted
    /// later, inside the drain loop, immediately before `apply` runs.
    pub async fn commit(&self, event: CommitEvent) -> Result<(), CommitError> {
        self.schemas.validate(&event)?;
        self.work_tx
            .send(ClientWork::Commit(event))
            .expect("drain task outlives every ClientReplica handle that can still send");
        Ok(())
    }

    /// Reconciles an acknowledgement from the server against `pending`.
    /// Resolves once reconciliation — including any rollback — has been
    /// applied.
    pub async fn receive(&self, committed: CommittedEvent) -> Result<(), CommitError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.work_tx
            .send(ClientWork::Receive(committed, ack_tx))
            .expect("drain task outlives every ClientReplica handle that can still send");
        let _ = ack_rx.await;
        Ok(())
    }

    /// See [`crate::ServerReplica::shutdown`].
    pub fn shutdown(self) {
        self.drain.abort();
    }
}

#[cfg(test)]
impl ClientReplica {
    /// Reads the current size of the pending table through the actor, for
    /// property tests asserting it drains to empty once every outstanding
    /// commit has a matching ack. Not part of the public contract.
    pub(crate) async fn pending_len(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        self.work_tx
            .send(ClientWork::PendingLen(tx))
            .expect("drain task outlives every ClientReplica handle that can still send");
        rx.await.expect("actor loop always answers PendingLen")
    }
}

async fn actor_loop(
    mut rx: mpsc::UnboundedReceiver<ClientWork>,
    materializers: Arc<HashMap<EventName, ClientMaterializer>>,
    on_commit: Option<OnCommit>,
) {
    let mut pending: HashMap<ClientId, CommitEvent> = HashMap::new();

    while let Some(work) = rx.recv().await {
        match work {
            ClientWork::Commit(event) => {
                handle_commit(event, &materializers, &mut pending, &on_commit).await;
            }
            ClientWork::Receive(committed, ack) => {
                reconcile(&committed, &materializers, &mut pending).await;
                let _ = ack.send(());
            }
            #[cfg(test)]
            ClientWork::PendingLen(tx) => {
                let _ = tx.send(pending.len());
            }
        }
    }
}

async fn handle_commit(
    event: CommitEvent,
    materializers: &HashMap<EventName, ClientMaterializer>,
    pending: &mut HashMap<ClientId, CommitEvent>,
    on_commit: &Option<OnCommit>,
) {
    let client_id = ClientId::mint(&mut rand::thread_rng());
    let stamped = event.with_client_id(client_id.clone());

    let materializer = materializers
        .get(&stamped.name)
        .expect("materializer/schema parity is enforced at construction");

    let outcome: MaterializerResult = (materializer.apply)(EventPayload::from(&stamped)).await;

    match outcome {
        Ok(()) => {
            tracing::debug!(
                name = %stamped.name,
                client_id = %client_id,
                "optimistically applied event"
            );
            pending.insert(client_id, stamped.clone());
            if let Some(callback) = on_commit {
                let result: CallbackResult = callback(stamped).await;
                if let Err(err) = result {
                    tracing::warn!(error = %err, "onCommit callback failed");
                }
            }
        }
        Err(err) => {
            // Spec §4.3: if apply throws, the event is NOT recorded in
            // pending and onCommit is NOT invoked — the server will never
            // hear about it.
            tracing::warn!(
                name = %stamped.name,
                client_id = %client_id,
                error = %err,
                "optimistic apply failed; event dropped locally"
            );
        }
    }
}

/// Reconciles one acknowledgement from the server against `pending`.
async fn reconcile(
    committed: &CommittedEvent,
    materializers: &HashMap<EventName, ClientMaterializer>,
    pending: &mut HashMap<ClientId, CommitEvent>,
) {
    let Some(materializer) = materializers.get(&committed.name) else {
        // A receive() for an event kind this client never registered —
        // nothing we can apply or roll back. A foreign client running a
        // superset of event kinds this one doesn't know about isn't
        // something this library can reconcile.
        tracing::warn!(name = %committed.name, "receive for unregistered event kind; ignored");
        return;
    };

    let own = committed
        .client_id
        .as_ref()
        .and_then(|client_id| pending.remove(client_id).map(|_| ()));

    match (own, committed.error) {
        // Matching pending entry, server rejected: undo the optimistic apply.
        (Some(()), true) => {
            if let Err(err) = (materializer.rollback)(committed.clone()).await {
                tracing::warn!(
                    name = %committed.name,
                    client_id = committed.client_id.as_ref().map(ToString::to_string),
                    error = %err,
                    "rollback failed; pending entry removed regardless"
                );
            }
        }
        // Matching pending entry, server confirmed: state already reflects
        // it, just retire the entry (already removed above).
        (Some(()), false) => {}
        // No matching pending entry, error ack: not ours to undo, ignore.
        (None, true) => {}
        // No matching pending entry, success: a foreign or broadcast
        // event — apply it blindly to stay convergent.
        (None, false) => {
            if let Err(err) = (materializer.apply)(EventPayload::from(committed)).await {
                tracing::warn!(
                    name = %committed.name,
                    error = %err,
                    "blind apply of foreign event failed"
                );
            }
        }
    }
}
