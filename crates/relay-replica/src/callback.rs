use std::sync::Arc;

use futures::future::BoxFuture;
use relay_types::{CommitEvent, CommittedEvent, EventPayload};

use crate::error::{CallbackError, MaterializerError};

/// Result type every materializer and callback resolves to. A synchronous
/// panic-free failure and an asynchronous rejection both collapse to `Err`
/// here; the drain loop logs it and moves on regardless — no error ever
/// escapes the drain loop to a caller.
pub type MaterializerResult = Result<(), MaterializerError>;
pub type CallbackResult = Result<(), CallbackError>;

/// The server's authoritative materializer for one event kind: mutates
/// application state, given a validated [`CommitEvent`].
pub type ServerMaterializer =
    Arc<dyn Fn(CommitEvent) -> BoxFuture<'static, MaterializerResult> + Send + Sync>;

/// The client's forward and inverse materializers for one event kind.
///
/// `apply` runs both at optimistic-commit time (given the freshly
/// clientId-stamped event) and at `receive` time for foreign/broadcast
/// successes (given the acknowledgement) — [`EventPayload`] is the
/// common shape both call sites can produce. `rollback` only ever runs
/// from `receive`, undoing `apply` for the same payload.
#[derive(Clone)]
pub struct ClientMaterializer {
    pub apply: Arc<dyn Fn(EventPayload) -> BoxFuture<'static, MaterializerResult> + Send + Sync>,
    pub rollback: Arc<dyn Fn(CommittedEvent) -> BoxFuture<'static, MaterializerResult> + Send + Sync>,
}

impl ClientMaterializer {
    pub fn new<A, AFut, R, RFut>(apply: A, rollback: R) -> Self
    where
        A: Fn(EventPayload) -> AFut + Send + Sync + 'static,
        AFut: std::future::Future<Output = MaterializerResult> + Send + 'static,
        R: Fn(CommittedEvent) -> RFut + Send + Sync + 'static,
        RFut: std::future::Future<Output = MaterializerResult> + Send + 'static,
    {
        Self {
            apply: Arc::new(move |payload| Box::pin(apply(payload))),
            rollback: Arc::new(move |committed| Box::pin(rollback(committed))),
        }
    }
}

/// Wraps a plain closure into a [`ServerMaterializer`]`.
pub fn server_materializer<F, Fut>(materializer: F) -> ServerMaterializer
where
    F: Fn(CommitEvent) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = MaterializerResult> + Send + 'static,
{
    Arc::new(move |event| Box::pin(materializer(event)))
}

/// `onCommitted(event) -> void | Future<void>`, applied only on the server,
/// once per dequeued event, after its materializer has run.
pub type OnCommitted =
    Arc<dyn Fn(CommittedEvent) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

/// `onCommit(event) -> void | Future<void>`, applied only on the client,
/// after the optimistic apply and the `pending` insert.
pub type OnCommit = Arc<dyn Fn(CommitEvent) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

pub fn on_committed<F, Fut>(callback: F) -> OnCommitted
where
    F: Fn(CommittedEvent) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = CallbackResult> + Send + 'static,
{
    Arc::new(move |event| Box::pin(callback(event)))
}

pub fn on_commit<F, Fut>(callback: F) -> OnCommit
where
    F: Fn(CommitEvent) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = CallbackResult> + Send + 'static,
{
    Arc::new(move |event| Box::pin(callback(event)))
}
