//! A counter kept in sync between a client replica and a server replica.
//!
//! Both replicas start at 10. The client applies `increment`/`decrement`
//! the moment they're submitted; the server is authoritative and rejects
//! any `decrement` that would take the counter negative, forcing the
//! client to roll its optimistic apply back. Run with:
//!
//! ```bash
//! cargo run -p relay --example counter
//! ```

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use relay::{
    ClientMaterializer, ClientReplica, CommitEvent, JsonSchema, JsonType, MaterializerError,
    ServerReplica,
};
use relay_test_support::Network;
use serde_json::json;

const STARTING_VALUE: i64 = 10;

#[derive(Clone)]
struct Counter(Arc<AtomicI64>);

impl Counter {
    fn new(initial: i64) -> Self {
        Self(Arc::new(AtomicI64::new(initial)))
    }

    fn get(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn server_delta_materializer(counter: Counter, sign: i64) -> relay::ServerMaterializer {
    relay::server_materializer(move |event: CommitEvent| {
        let counter = counter.clone();
        async move {
            let amount = event.payload.as_i64().unwrap_or(0);
            if sign < 0 && counter.get() - amount < 0 {
                return Err(MaterializerError::new("counter cannot go negative"));
            }
            counter.0.fetch_add(sign * amount, Ordering::SeqCst);
            Ok(())
        }
    })
}

fn client_delta_materializer(counter: Counter, sign: i64) -> ClientMaterializer {
    let apply_counter = counter.clone();
    let rollback_counter = counter;
    ClientMaterializer::new(
        move |payload| {
            let counter = apply_counter.clone();
            async move {
                counter.0.fetch_add(sign * payload.payload.as_i64().unwrap_or(0), Ordering::SeqCst);
                Ok(())
            }
        },
        move |committed| {
            let counter = rollback_counter.clone();
            async move {
                counter.0.fetch_sub(sign * committed.payload.as_i64().unwrap_or(0), Ordering::SeqCst);
                Ok(())
            }
        },
    )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let server_counter = Counter::new(STARTING_VALUE);
    let client_counter = Counter::new(STARTING_VALUE);

    let server_builder = ServerReplica::builder()
        .sequence(0)
        .event(
            "increment",
            JsonSchema::Type(JsonType::Number),
            server_delta_materializer(server_counter.clone(), 1),
        )
        .event(
            "decrement",
            JsonSchema::Type(JsonType::Number),
            server_delta_materializer(server_counter.clone(), -1),
        );

    let client_builder = ClientReplica::builder()
        .sequence(0)
        .event(
            "increment",
            JsonSchema::Type(JsonType::Number),
            client_delta_materializer(client_counter.clone(), 1),
        )
        .event(
            "decrement",
            JsonSchema::Type(JsonType::Number),
            client_delta_materializer(client_counter.clone(), -1),
        );

    let network = Network::wire(client_builder, server_builder);

    network
        .client()
        .commit(CommitEvent::new("decrement", json!(3)))
        .await
        .expect("decrement payload conforms to its schema");
    println!("after optimistic decrement(3): client counter = {}", client_counter.get());

    network
        .client()
        .commit(CommitEvent::new("decrement", json!(20)))
        .await
        .expect("decrement payload conforms to its schema");
    println!("after optimistic decrement(20): client counter = {}", client_counter.get());

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    println!("server counter settled at {}", server_counter.get());
    println!(
        "client counter settled at {} (rolled back the decrement the server rejected)",
        client_counter.get()
    );
}
