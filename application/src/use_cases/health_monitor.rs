//! Health Monitor
//!
//! Polls every registered worker on its own timer, independent of request
//! traffic, and is the only writer of the [`HealthStore`]. Council rounds
//! never consult health state.

use crate::config::BehaviorConfig;
use crate::health_store::HealthStore;
use crate::ports::worker_gateway::{GatewayError, WorkerGateway};
use chrono::Utc;
use council_domain::{ProbeOutcome, Topology, WorkerDescriptor};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct HealthMonitor<G: WorkerGateway + 'static> {
    gateway: Arc<G>,
    topology: Arc<Topology>,
    store: HealthStore,
    interval: Duration,
    probe_timeout: Duration,
}

impl<G: WorkerGateway + 'static> HealthMonitor<G> {
    pub fn new(
        gateway: Arc<G>,
        topology: Arc<Topology>,
        store: HealthStore,
        config: &BehaviorConfig,
    ) -> Self {
        Self {
            gateway,
            topology,
            store,
            interval: config.health_poll_interval,
            probe_timeout: config.health_probe_timeout,
        }
    }

    /// Probe every worker once, concurrently, and record the outcomes.
    pub async fn poll_once(&self) {
        let probes = self
            .topology
            .workers()
            .iter()
            .map(|worker| self.probe(worker));
        let outcomes = join_all(probes).await;

        let now = Utc::now();
        for (worker, outcome) in self.topology.workers().iter().zip(outcomes) {
            let before = self.store.get(&worker.name).map(|r| r.status);
            self.store.record(&worker.name, outcome, now);
            let after = self.store.get(&worker.name).map(|r| r.status);

            if before != after
                && let Some(status) = after
            {
                info!("Worker {} is now {}", worker.name, status);
            }
        }
    }

    async fn probe(&self, worker: &WorkerDescriptor) -> ProbeOutcome {
        let call = self.gateway.health(worker, self.probe_timeout);
        let result = match tokio::time::timeout(self.probe_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.probe_timeout)),
        };
        match result {
            Ok(backend) => {
                debug!(
                    "Health probe {}: reachable, backend_ok={}",
                    worker.name, backend.backend_ok
                );
                ProbeOutcome::Reachable(backend)
            }
            Err(e) => {
                debug!("Health probe {}: {}", worker.name, e);
                ProbeOutcome::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Poll on every tick until `cancel` fires.
    ///
    /// The first poll runs one interval after start; callers that want a
    /// snapshot right away call [`Self::poll_once`] first.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "Health monitor started: {} workers every {}s",
            self.topology.workers().len(),
            self.interval.as_secs_f64()
        );
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.poll_once().await,
            }
        }
        info!("Health monitor stopped");
    }

    /// Run the monitor on its own task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        if self.interval.is_zero() {
            warn!("Health poll interval is zero; health monitor not started");
            return tokio::spawn(async {});
        }
        tokio::spawn(async move { self.run(cancel).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{ScriptedGateway, council_topology};
    use council_domain::{BackendStatus, WorkerStatus};

    fn backend(ok: bool) -> BackendStatus {
        BackendStatus {
            backend_ok: ok,
            model: Some("llama3".to_string()),
            busy: Some(false),
            active_requests: Some(0),
        }
    }

    fn monitor(gateway: ScriptedGateway, store: HealthStore) -> HealthMonitor<ScriptedGateway> {
        let config = BehaviorConfig::default()
            .with_health_poll_interval(Duration::from_millis(20))
            .with_health_probe_timeout(Duration::from_millis(50));
        HealthMonitor::new(
            Arc::new(gateway),
            Arc::new(council_topology(&["alpha", "beta"])),
            store,
            &config,
        )
    }

    #[tokio::test]
    async fn test_poll_once_records_every_worker() {
        let gateway = ScriptedGateway::new()
            .health("alpha", Ok(backend(true)))
            .health("beta", Ok(backend(false)));
        // chair has no script: connection refused
        let store = HealthStore::new();
        monitor(gateway, store.clone()).poll_once().await;

        assert_eq!(store.get("alpha").unwrap().status, WorkerStatus::BackendOk);
        assert_eq!(store.get("beta").unwrap().status, WorkerStatus::BackendDown);
        let chair = store.get("chair").unwrap();
        assert_eq!(chair.status, WorkerStatus::Unreachable);
        assert_eq!(chair.consecutive_reachability_failures, 1);
        assert!(chair.last_seen.is_none());
    }

    #[tokio::test]
    async fn test_counters_follow_consecutive_polls() {
        let gateway = ScriptedGateway::new()
            .health("alpha", Ok(backend(true)))
            .health("alpha", Err(GatewayError::ConnectionError("refused".to_string())))
            .health("alpha", Ok(backend(true)));
        let store = HealthStore::new();
        let monitor = monitor(gateway, store.clone());

        monitor.poll_once().await;
        let first_seen = store.get("alpha").unwrap().last_seen;
        monitor.poll_once().await;
        let record = store.get("alpha").unwrap();
        assert_eq!(record.status, WorkerStatus::Unreachable);
        assert_eq!(record.last_seen, first_seen);
        assert_eq!(record.consecutive_reachability_failures, 1);

        monitor.poll_once().await;
        let record = store.get("alpha").unwrap();
        assert_eq!(record.status, WorkerStatus::BackendOk);
        assert_eq!(record.consecutive_reachability_failures, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let gateway = ScriptedGateway::new().health("alpha", Ok(backend(true)));
        let store = HealthStore::new();
        let cancel = CancellationToken::new();
        let handle = monitor(gateway, store.clone()).spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(70)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(store.get("alpha").unwrap().last_probe.is_some());
    }

    #[tokio::test]
    async fn test_spawned_monitor_waits_one_interval_before_polling() {
        let config = BehaviorConfig::default()
            .with_health_poll_interval(Duration::from_millis(300))
            .with_health_probe_timeout(Duration::from_millis(50));
        let store = HealthStore::new();
        let monitor = HealthMonitor::new(
            Arc::new(ScriptedGateway::new()),
            Arc::new(council_topology(&["alpha"])),
            store.clone(),
            &config,
        );

        monitor.poll_once().await;
        let cancel = CancellationToken::new();
        let handle = monitor.spawn(cancel.clone());
        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
        handle.await.unwrap();

        let chair = store.get("chair").unwrap();
        assert_eq!(chair.status, WorkerStatus::Unreachable);
        assert_eq!(chair.consecutive_reachability_failures, 1);
    }
}
