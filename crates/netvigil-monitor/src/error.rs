//! Error types for the netvigil-monitor crate.

use thiserror::Error;

use netvigil_core::{NotifyError, ProbeError};

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
