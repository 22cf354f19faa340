//! Fan-out executor
//!
//! Runs one task per worker call, concurrently, each under its own deadline.
//! A failing call never affects its siblings and nothing is retried. Calls
//! are reported as they settle, so progress can be emitted in completion
//! order, while [`RoundOutcome`] restores registration order for everything
//! that depends on a stable ordering (labels, results).

use crate::ports::worker_gateway::GatewayError;
use council_domain::{WorkerDescriptor, WorkerFailure};
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::warn;

/// A settled call
#[derive(Debug)]
pub struct Settled<R> {
    /// Position of the call in spawn order
    pub index: usize,
    pub worker: WorkerDescriptor,
    pub result: Result<R, GatewayError>,
}

/// Calls of one round, in flight.
pub struct FanOut<R> {
    join_set: JoinSet<(usize, Result<R, GatewayError>)>,
    workers: Vec<WorkerDescriptor>,
    pending: BTreeSet<usize>,
    timeout: Duration,
}

impl<R: Send + 'static> FanOut<R> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            join_set: JoinSet::new(),
            workers: Vec::new(),
            pending: BTreeSet::new(),
            timeout,
        }
    }

    /// Start `call` against `worker` under the per-call timeout.
    pub fn spawn<F>(&mut self, worker: WorkerDescriptor, call: F)
    where
        F: Future<Output = Result<R, GatewayError>> + Send + 'static,
    {
        let index = self.workers.len();
        let timeout = self.timeout;
        self.workers.push(worker);
        self.pending.insert(index);

        self.join_set.spawn(async move {
            let result = match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(timeout)),
            };
            (index, result)
        });
    }

    /// Number of calls spawned
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for the next call to settle. `None` once all have settled.
    ///
    /// A task that panicked is reported as a failed call once every other
    /// task has finished.
    pub async fn next_settled(&mut self) -> Option<Settled<R>> {
        while let Some(joined) = self.join_set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    self.pending.remove(&index);
                    return Some(Settled {
                        index,
                        worker: self.workers[index].clone(),
                        result,
                    });
                }
                Err(e) => {
                    warn!("Worker call task failed to join: {}", e);
                }
            }
        }

        let index = self.pending.pop_first()?;
        Some(Settled {
            index,
            worker: self.workers[index].clone(),
            result: Err(GatewayError::Other("worker call task aborted".to_string())),
        })
    }
}

/// Successes and failures of one round, in spawn order.
#[derive(Debug)]
pub struct RoundOutcome<T> {
    successes: Vec<(usize, T)>,
    failures: Vec<(usize, WorkerFailure)>,
}

impl<T> Default for RoundOutcome<T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> RoundOutcome<T> {
    pub fn succeed(&mut self, index: usize, value: T) {
        self.successes.push((index, value));
    }

    pub fn fail(&mut self, index: usize, failure: WorkerFailure) {
        self.failures.push((index, failure));
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Sort back into spawn order and split.
    pub fn finish(mut self) -> (Vec<T>, Vec<WorkerFailure>) {
        self.successes.sort_by_key(|(i, _)| *i);
        self.failures.sort_by_key(|(i, _)| *i);
        (
            self.successes.into_iter().map(|(_, v)| v).collect(),
            self.failures.into_iter().map(|(_, f)| f).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(name: &str) -> WorkerDescriptor {
        WorkerDescriptor::reviewer(name, format!("http://{}:8002", name))
    }

    #[tokio::test]
    async fn test_settles_in_completion_order_and_finishes_in_spawn_order() {
        let mut fan_out = FanOut::new(Duration::from_secs(5));
        fan_out.spawn(worker("slow"), async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            Ok("slow")
        });
        fan_out.spawn(worker("fast"), async { Ok("fast") });

        let mut order = Vec::new();
        let mut outcome = RoundOutcome::default();
        while let Some(settled) = fan_out.next_settled().await {
            order.push(settled.worker.name.clone());
            outcome.succeed(settled.index, settled.result.unwrap());
        }

        assert_eq!(order, vec!["fast", "slow"]);
        let (successes, failures) = outcome.finish();
        assert_eq!(successes, vec!["slow", "fast"]);
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_isolated() {
        let mut fan_out = FanOut::new(Duration::from_millis(30));
        fan_out.spawn(worker("hung"), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(1)
        });
        fan_out.spawn(worker("ok"), async { Ok(2) });
        fan_out.spawn(worker("broken"), async {
            Err(GatewayError::ConnectionError("refused".to_string()))
        });

        let mut results = Vec::new();
        while let Some(settled) = fan_out.next_settled().await {
            results.push((settled.worker.name.clone(), settled.result));
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0].1, Err(GatewayError::ConnectionError(_))));
        assert!(matches!(results[1].1, Err(GatewayError::Timeout(_))));
        assert_eq!(results[2].1, Ok(2));
    }

    #[tokio::test]
    async fn test_panicking_call_is_reported_as_failure() {
        let mut fan_out: FanOut<u32> = FanOut::new(Duration::from_secs(1));
        fan_out.spawn(worker("boom"), async {
            let missing: Option<u32> = None;
            Ok(missing.expect("worker call panicked"))
        });
        fan_out.spawn(worker("ok"), async { Ok(7) });

        let mut settled = Vec::new();
        while let Some(s) = fan_out.next_settled().await {
            settled.push(s);
        }
        assert_eq!(settled.len(), 2);
        let boom = settled.iter().find(|s| s.worker.name == "boom").unwrap();
        assert_eq!(boom.index, 0);
        assert!(boom.result.is_err());
    }

    #[tokio::test]
    async fn test_empty_fan_out() {
        let mut fan_out: FanOut<()> = FanOut::new(Duration::from_secs(1));
        assert!(fan_out.is_empty());
        assert!(fan_out.next_settled().await.is_none());
    }
}
