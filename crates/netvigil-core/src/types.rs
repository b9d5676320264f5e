//! Core domain types for the netvigil monitor.

use std::fmt;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

// ── Host addresses ────────────────────────────────────────────────

/// The identity of a device on a segment, as reported by a discovery probe.
///
/// Treated as an opaque string: the monitor only ever compares addresses for
/// equality, so anything a probe hands back (IPv4 literals in practice) is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostAddr(String);

impl HostAddr {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Ipv4Addr> for HostAddr {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip.to_string())
    }
}

impl From<&str> for HostAddr {
    fn from(addr: &str) -> Self {
        Self(addr.to_string())
    }
}

// ── Networks ──────────────────────────────────────────────────────

/// A monitored network segment: the CIDR range to probe plus the
/// human-readable name used in alerts and logs.
///
/// Networks are loaded from configuration at startup and never change for
/// the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Address range to probe (e.g. `192.168.0.0/24`).
    pub cidr: Ipv4Net,
    /// Display name (e.g. `Home Wi-Fi`).
    pub name: String,
}

impl Network {
    pub fn new(cidr: Ipv4Net, name: impl Into<String>) -> Self {
        Self {
            cidr,
            name: name.into(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.cidr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn host_addr_equality_is_textual() {
        let from_ip = HostAddr::from(Ipv4Addr::new(192, 168, 0, 5));
        let from_str = HostAddr::from("192.168.0.5");
        assert_eq!(from_ip, from_str);

        let mut set = HashSet::new();
        set.insert(from_ip);
        assert!(set.contains(&from_str));
    }

    #[test]
    fn network_deserializes_from_config_shape() {
        let network: Network =
            serde_json::from_str(r#"{"cidr": "192.168.0.0/24", "name": "Home Wi-Fi"}"#).unwrap();
        assert_eq!(network.name, "Home Wi-Fi");
        assert_eq!(network.cidr.to_string(), "192.168.0.0/24");
        assert!(network.cidr.contains(&Ipv4Addr::new(192, 168, 0, 5)));
    }

    #[test]
    fn network_display_includes_name_and_range() {
        let network = Network::new("10.0.0.0/24".parse().unwrap(), "Test Lab");
        assert_eq!(network.to_string(), "Test Lab (10.0.0.0/24)");
    }
}
