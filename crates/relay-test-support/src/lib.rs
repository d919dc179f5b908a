//! # relay-test-support: an in-process loopback for replica pairs
//!
//! `relay-replica` deliberately stops at the callback contracts
//! (`onCommit`, `onCommitted`) and leaves the transport between a client
//! and its server out of scope. This crate is the transport tests and
//! local demos reach for: [`Network::wire`] takes a
//! [`ClientReplicaBuilder`] and a [`ServerReplicaBuilder`], installs
//! callbacks that forward directly between the two in the same process,
//! and hands back both built replicas: real replica instances, a real
//! (if trivial) transport, no mocks.

use std::sync::Arc;

use relay_replica::{
    on_commit, on_committed, CallbackError, ClientReplica, ClientReplicaBuilder, ServerReplica,
    ServerReplicaBuilder,
};
use relay_types::{CommitEvent, CommittedEvent};
use tokio::sync::OnceCell;

/// A wired-together client/server pair: the client's `onCommit` forwards
/// straight into `server.commit`, and the server's `onCommitted` forwards
/// straight into `client.receive`.
pub struct Network {
    client_cell: Arc<OnceCell<ClientReplica>>,
    server_cell: Arc<OnceCell<ServerReplica>>,
}

impl Network {
    /// Builds both replicas and wires their callbacks to each other.
    ///
    /// Neither builder should already carry an `onCommit`/`onCommitted` —
    /// `wire` installs its own, and a caller-supplied one would simply be
    /// replaced.
    #[must_use]
    pub fn wire(client_builder: ClientReplicaBuilder, server_builder: ServerReplicaBuilder) -> Self {
        let client_cell: Arc<OnceCell<ClientReplica>> = Arc::new(OnceCell::new());
        let server_cell: Arc<OnceCell<ServerReplica>> = Arc::new(OnceCell::new());

        let server_cell_for_commit = server_cell.clone();
        let client = client_builder
            .on_commit(on_commit(move |event: CommitEvent| {
                let server_cell = server_cell_for_commit.clone();
                async move {
                    let server = server_cell
                        .get()
                        .expect("server cell is filled before wire() hands the network back");
                    server
                        .commit(event)
                        .await
                        .map_err(|err| CallbackError::new(err.to_string()))
                }
            }))
            .build()
            .expect("relay-test-support callers supply a valid client configuration");

        let client_cell_for_committed = client_cell.clone();
        let server = server_builder
            .on_committed(on_committed(move |event: CommittedEvent| {
                let client_cell = client_cell_for_committed.clone();
                async move {
                    let client = client_cell
                        .get()
                        .expect("client cell is filled before wire() hands the network back");
                    client
                        .receive(event)
                        .await
                        .map_err(|err| CallbackError::new(err.to_string()))
                }
            }))
            .build()
            .expect("relay-test-support callers supply a valid server configuration");

        client_cell
            .set(client)
            .unwrap_or_else(|_| unreachable!("set exactly once, immediately after construction"));
        server_cell
            .set(server)
            .unwrap_or_else(|_| unreachable!("set exactly once, immediately after construction"));

        tracing::debug!("wired client and server replicas over an in-process loopback");

        Self {
            client_cell,
            server_cell,
        }
    }

    pub fn client(&self) -> &ClientReplica {
        self.client_cell
            .get()
            .expect("wire() always fills both cells before returning")
    }

    pub fn server(&self) -> &ServerReplica {
        self.server_cell
            .get()
            .expect("wire() always fills both cells before returning")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use relay_types::{CommitEvent, JsonSchema, JsonType};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn wired_commit_reaches_the_server_materializer() {
        let applied = Arc::new(AtomicI64::new(0));
        let applied_cb = applied.clone();

        let server_builder = ServerReplica::builder().sequence(0).event(
            "increment",
            JsonSchema::Type(JsonType::Number),
            relay_replica::server_materializer(move |_event| {
                let applied = applied_cb.clone();
                async move {
                    applied.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        let client_builder = ClientReplica::builder().sequence(0).event(
            "increment",
            JsonSchema::Type(JsonType::Number),
            relay_replica::ClientMaterializer::new(
                |_payload| async { Ok(()) },
                |_committed| async { Ok(()) },
            ),
        );

        let network = Network::wire(client_builder, server_builder);
        network
            .client()
            .commit(CommitEvent::new("increment", json!(1)))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(applied.load(Ordering::SeqCst), 1);
    }
}
