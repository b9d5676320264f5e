//! The per-network scan cycle: probe, diff against the known set, record
//! and notify each previously unseen host.

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use netvigil_core::{DiscoveryProbe, Network, Notifier};

use crate::error::Result;
use crate::store::FileHostStore;

/// Counters for one completed scan of one network.
#[derive(Debug)]
pub struct ScanSummary {
    /// Unique ID for this scan run, carried through its log lines.
    pub scan_id: Uuid,
    /// Distinct hosts that answered the probe.
    pub hosts_seen: usize,
    /// Hosts recorded and reported for the first time.
    pub new_hosts: usize,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
}

/// Drives scans across the configured networks against one shared
/// known-host store.
pub struct NetworkMonitor {
    networks: Vec<Network>,
    probe: Arc<dyn DiscoveryProbe>,
    notifier: Arc<dyn Notifier>,
    store: Arc<FileHostStore>,
    scan_timeout: Duration,
}

impl NetworkMonitor {
    pub fn new(
        networks: Vec<Network>,
        probe: Arc<dyn DiscoveryProbe>,
        notifier: Arc<dyn Notifier>,
        store: Arc<FileHostStore>,
        scan_timeout: Duration,
    ) -> Self {
        Self {
            networks,
            probe,
            notifier,
            store,
            scan_timeout,
        }
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// One scan cycle for one network: probe → diff → record → notify.
    ///
    /// A probe failure propagates to the caller, which reports it tagged
    /// with the network; failures past that point are per-host. A host whose
    /// append fails is not notified and will be re-reported by a later scan;
    /// a host whose notification fails stays recorded regardless.
    pub async fn scan_network(&self, network: &Network) -> Result<ScanSummary> {
        let scan_id = Uuid::new_v4();
        let start = Instant::now();

        tracing::info!(
            scan_id = %scan_id,
            network = %network.name,
            cidr = %network.cidr,
            "Probing for live hosts"
        );

        let observed = self.probe.scan(network, self.scan_timeout).await?;
        let fresh = self.store.diff(&observed);

        let mut new_hosts = 0;
        for host in fresh {
            match self.store.record(&host) {
                Ok(true) => {
                    new_hosts += 1;
                    tracing::info!(
                        scan_id = %scan_id,
                        network = %network.name,
                        host = %host,
                        "New host discovered"
                    );
                    if let Err(err) = self.notifier.notify(&host, network).await {
                        tracing::warn!(
                            network = %network.name,
                            host = %host,
                            error = %err,
                            "Notification failed"
                        );
                    }
                }
                // A concurrent scan of another network recorded it first.
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(
                        network = %network.name,
                        host = %host,
                        error = %err,
                        "Failed to record host, notification skipped"
                    );
                }
            }
        }

        Ok(ScanSummary {
            scan_id,
            hosts_seen: observed.len(),
            new_hosts,
            duration: start.elapsed(),
        })
    }
}
