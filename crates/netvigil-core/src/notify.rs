//! The alert delivery contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{HostAddr, Network};

/// Delivery failure from a [`Notifier`].
///
/// Callers treat this as best-effort: the failure is logged and the scan
/// cycle continues. The transport's own error type stays behind an opaque
/// source so transport crates don't leak into this crate's API.
#[derive(Error, Debug)]
#[error("Notification delivery failed: {source}")]
pub struct NotifyError {
    #[from]
    source: anyhow::Error,
}

/// A capability that delivers a human-readable alert for a newly seen host.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, host: &HostAddr, network: &Network) -> Result<(), NotifyError>;
}
