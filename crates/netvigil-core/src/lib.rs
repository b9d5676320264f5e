//! netvigil-core: Shared types and collaborator contracts for netvigil.
//!
//! This crate provides the pieces the monitoring loop is built against:
//! - Domain types (`HostAddr`, `Network`)
//! - The `DiscoveryProbe` contract for enumerating live hosts on a segment
//! - The `Notifier` contract for delivering new-host alerts
//!
//! Concrete adapters (the ARP prober, the SMTP notifier) live in
//! `netvigil-monitor`; keeping the contracts here lets the core loop be
//! exercised with deterministic fakes and no raw-socket privileges.

pub mod notify;
pub mod probe;
pub mod types;

pub use notify::{Notifier, NotifyError};
pub use probe::{DiscoveryProbe, ProbeError};
pub use types::{HostAddr, Network};
