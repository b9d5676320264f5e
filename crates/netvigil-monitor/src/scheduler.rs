//! Scan scheduling engine.
//!
//! Each tick fans out one tokio task per configured network, waits for every
//! task to finish, then sleeps the configured interval. Shutdown cancels the
//! loop promptly from either phase; tasks still in flight are abandoned and
//! any append they already started completes under the store's lock.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::monitor::NetworkMonitor;

pub struct ScanScheduler {
    monitor: Arc<NetworkMonitor>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ScanScheduler {
    pub fn new(
        monitor: Arc<NetworkMonitor>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            monitor,
            interval,
            shutdown,
        }
    }

    /// Run scan cycles until cancelled.
    pub async fn run(&self) {
        tracing::info!(
            network_count = self.monitor.networks().len(),
            interval_secs = self.interval.as_secs(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, abandoning in-flight scans");
                    break;
                }
                _ = self.run_tick() => {}
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Network monitoring stopped");
    }

    /// One tick: every network scanned concurrently, then a barrier on all
    /// of them before the caller moves on.
    pub async fn run_tick(&self) {
        let mut handles = Vec::new();

        for network in self.monitor.networks() {
            let monitor = Arc::clone(&self.monitor);
            let network = network.clone();

            handles.push(tokio::spawn(async move {
                match monitor.scan_network(&network).await {
                    Ok(summary) => tracing::info!(
                        scan_id = %summary.scan_id,
                        network = %network.name,
                        hosts_seen = summary.hosts_seen,
                        new_hosts = summary.new_hosts,
                        duration_ms = summary.duration.as_millis() as u64,
                        "Scan complete"
                    ),
                    Err(err) => tracing::error!(
                        network = %network.name,
                        cidr = %network.cidr,
                        error = %err,
                        "Scan failed"
                    ),
                }
            }));
        }

        for handle in handles {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Scan task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use netvigil_core::{DiscoveryProbe, HostAddr, Network, Notifier, NotifyError, ProbeError};

    use crate::store::FileHostStore;

    struct CountingProbe {
        scans: AtomicUsize,
    }

    #[async_trait]
    impl DiscoveryProbe for CountingProbe {
        async fn scan(
            &self,
            _network: &Network,
            _timeout: Duration,
        ) -> Result<HashSet<HostAddr>, ProbeError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            Ok(HashSet::new())
        }
    }

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn notify(&self, _host: &HostAddr, _network: &Network) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    fn scheduler_with_networks(
        dir: &tempfile::TempDir,
        count: usize,
    ) -> (ScanScheduler, Arc<CountingProbe>, CancellationToken) {
        let networks = (0..count)
            .map(|i| Network::new(format!("10.{i}.0.0/24").parse().unwrap(), format!("net-{i}")))
            .collect();
        let probe = Arc::new(CountingProbe {
            scans: AtomicUsize::new(0),
        });
        let store = Arc::new(FileHostStore::open(dir.path().join("hosts.txt")).unwrap());
        let monitor = Arc::new(NetworkMonitor::new(
            networks,
            Arc::clone(&probe) as Arc<dyn DiscoveryProbe>,
            Arc::new(NullNotifier),
            store,
            Duration::from_secs(2),
        ));
        let shutdown = CancellationToken::new();
        let scheduler = ScanScheduler::new(monitor, Duration::from_secs(60), shutdown.clone());
        (scheduler, probe, shutdown)
    }

    #[tokio::test]
    async fn tick_scans_every_network_once() {
        let dir = tempfile::tempdir().unwrap();
        let (scheduler, probe, _shutdown) = scheduler_with_networks(&dir, 3);

        scheduler.run_tick().await;
        assert_eq!(probe.scans.load(Ordering::SeqCst), 3);

        scheduler.run_tick().await;
        assert_eq!(probe.scans.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn run_stops_immediately_when_already_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let (scheduler, probe, shutdown) = scheduler_with_networks(&dir, 2);

        shutdown.cancel();
        scheduler.run().await;
        assert_eq!(probe.scans.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_promptly_from_the_waiting_phase() {
        let dir = tempfile::tempdir().unwrap();
        let (scheduler, probe, shutdown) = scheduler_with_networks(&dir, 2);

        let handle = tokio::spawn(async move { scheduler.run().await });

        // Let the first tick complete and the loop reach its sleep.
        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(probe.scans.load(Ordering::SeqCst), 2);
    }
}
