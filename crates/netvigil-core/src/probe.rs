//! The discovery probe contract.
//!
//! The monitor loop never touches raw sockets itself; it drives whatever
//! implements [`DiscoveryProbe`]. Production wires in the ARP prober from
//! `netvigil-monitor`, tests wire in fakes with canned responses.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{HostAddr, Network};

/// Errors raised while probing a network segment.
///
/// These are per-scan failures: the scheduler reports them tagged with the
/// network that failed and carries on with the other networks.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Interface not found: {name}")]
    InterfaceNotFound { name: String },

    #[error("Interface {name} has no usable {what}")]
    InterfaceUnusable { name: String, what: &'static str },

    #[error("Permission denied opening raw socket (scanning requires elevated privileges): {0}")]
    PermissionDenied(String),

    #[error("Unsupported datalink channel type on this interface")]
    UnsupportedChannel,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A capability that enumerates live hosts on a network segment.
///
/// `scan` broadcasts a discovery request across `network` and collects the
/// distinct responding addresses until `timeout` elapses. An empty set is a
/// normal outcome (nobody answered), not an error.
#[async_trait]
pub trait DiscoveryProbe: Send + Sync {
    async fn scan(
        &self,
        network: &Network,
        timeout: Duration,
    ) -> Result<HashSet<HostAddr>, ProbeError>;
}
