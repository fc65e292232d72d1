//! Concurrent request deduplication.
//!
//! At most one fetch-or-generate operation runs per fingerprint at any
//! time. The first caller for a key becomes the leader: its operation is
//! spawned as an independent task so it runs to completion — and populates
//! the caches — even if every caller's deadline elapses. Everyone else
//! subscribes to the leader's broadcast and receives the same outcome,
//! success or error.
//!
//! The service holds two independent coordinators: one keyed by plan
//! fingerprints, one by dish query fingerprints.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use platter_core::Fingerprint;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

const OP_TAKEN: &str = "leader op consumed twice within one flight";

/// Outcome shared between all callers of one flight.
///
/// Errors are wrapped in [`Arc`] so a single failure can be delivered to
/// every waiter.
pub type Shared<T, E> = Result<T, Arc<E>>;

/// Errors raised by the coordinator itself, as opposed to the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlightError {
    /// The caller's deadline elapsed while waiting for the in-flight
    /// operation. The leader keeps running.
    #[error("deadline elapsed while waiting for the in-flight operation")]
    Timeout,
}

/// Collapses concurrent identical operations into one execution per key.
///
/// Cloning is cheap; clones share the in-flight registry.
pub struct SingleFlight<T, E> {
    inflight: Arc<DashMap<Fingerprint, broadcast::Sender<Shared<T, E>>>>,
    name: &'static str,
}

impl<T, E> Clone for SingleFlight<T, E> {
    fn clone(&self) -> Self {
        SingleFlight {
            inflight: Arc::clone(&self.inflight),
            name: self.name,
        }
    }
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone + Send + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a coordinator. `name` shows up in logs.
    pub fn new(name: &'static str) -> Self {
        SingleFlight {
            inflight: Arc::new(DashMap::new()),
            name,
        }
    }

    /// Number of operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Runs `op` for `key`, or joins the run already in flight.
    ///
    /// `wait` bounds only this caller's waiting time; on elapse the caller
    /// detaches with [`FlightError::Timeout`] while the leader task keeps
    /// running for the benefit of the cache and later callers.
    pub async fn execute<F, Fut>(
        &self,
        key: Fingerprint,
        wait: Duration,
        op: F,
    ) -> Result<Shared<T, E>, FlightError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mut op = Some(op);
        loop {
            let mut rx = match self.inflight.entry(key) {
                Entry::Occupied(entry) => {
                    debug!(flight = self.name, key = %key, "joining in-flight operation");
                    entry.get().subscribe()
                }
                Entry::Vacant(entry) => {
                    let (tx, rx) = broadcast::channel(1);
                    entry.insert(tx.clone());
                    let registry = Arc::clone(&self.inflight);
                    let fut = (op.take().expect(OP_TAKEN))();
                    debug!(flight = self.name, key = %key, "leading new operation");
                    tokio::spawn(async move {
                        let result = fut.await.map_err(Arc::new);
                        // Send before removing: subscribers that joined this
                        // flight get the value; callers arriving after the
                        // removal find the slot vacant and lead a fresh run.
                        let _ = tx.send(result);
                        registry.remove(&key);
                    });
                    rx
                }
            };

            match tokio::time::timeout(wait, rx.recv()).await {
                Ok(Ok(result)) => return Ok(result),
                // The flight completed between our subscribe and the
                // broadcast, or the channel overflowed. Re-enter: the slot
                // is (or is about to be) vacant again.
                Ok(Err(broadcast::error::RecvError::Closed))
                | Ok(Err(broadcast::error::RecvError::Lagged(_))) => {
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(_) => {
                    debug!(flight = self.name, key = %key, "caller detached on deadline");
                    return Err(FlightError::Timeout);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn key(id: u32) -> Fingerprint {
        Fingerprint::of("flight-test", 1, &id)
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_execution() {
        let flight: SingleFlight<u32, std::io::Error> = SingleFlight::new("test");
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let flight = flight.clone();
            let executions = Arc::clone(&executions);
            handles.push(tokio::spawn(async move {
                flight
                    .execute(key(1), Duration::from_secs(5), move || async move {
                        executions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(7)
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result.unwrap(), 7);
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_shared_with_all_waiters() {
        let flight: SingleFlight<u32, std::io::Error> = SingleFlight::new("test");

        let slow_failure = |_: ()| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(std::io::Error::other("boom"))
        };

        let a = {
            let flight = flight.clone();
            tokio::spawn(
                async move { flight.execute(key(2), Duration::from_secs(5), || slow_failure(())).await },
            )
        };
        let b = {
            let flight = flight.clone();
            tokio::spawn(
                async move { flight.execute(key(2), Duration::from_secs(5), || slow_failure(())).await },
            )
        };

        let ra = a.await.unwrap().unwrap();
        let rb = b.await.unwrap().unwrap();
        assert_eq!(ra.unwrap_err().to_string(), "boom");
        assert_eq!(rb.unwrap_err().to_string(), "boom");
    }

    #[tokio::test]
    async fn follower_timeout_does_not_cancel_leader() {
        let flight: SingleFlight<u32, std::io::Error> = SingleFlight::new("test");
        let completed = Arc::new(AtomicUsize::new(0));

        let leader_completed = Arc::clone(&completed);
        let result = flight
            .execute(key(3), Duration::from_millis(10), move || async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                leader_completed.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await;
        assert_eq!(result.unwrap_err(), FlightError::Timeout);

        // The leader task keeps running after the caller detached.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn sequential_calls_run_independently() {
        let flight: SingleFlight<u32, std::io::Error> = SingleFlight::new("test");
        let executions = Arc::new(AtomicUsize::new(0));

        for expected in 1..=3 {
            let executions = Arc::clone(&executions);
            let result = flight
                .execute(key(4), Duration::from_secs(5), move || async move {
                    Ok(executions.fetch_add(1, Ordering::SeqCst) as u32 + 1)
                })
                .await
                .unwrap();
            assert_eq!(result.unwrap(), expected);
        }
    }
}
