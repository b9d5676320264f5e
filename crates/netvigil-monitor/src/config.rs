//! Configuration for the netvigil monitor daemon.

use std::time::Duration;

use serde::Deserialize;

use netvigil_core::Network;

use crate::error::{MonitorError, Result};

/// Top-level monitor configuration.
///
/// Loaded from `netvigil.toml` (optional) layered under `NETVIGIL_*`
/// environment variables, `__`-separated for nesting — SMTP credentials
/// arrive as `NETVIGIL_SMTP__USERNAME` and `NETVIGIL_SMTP__PASSWORD`.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Networks to watch, each a `[[networks]]` table with `cidr` and `name`.
    #[serde(default)]
    pub networks: Vec<Network>,

    /// How long one probe collects replies before its scan window closes.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,

    /// Pause between scan cycles, measured from the end of one cycle to the
    /// start of the next.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Alert delivery settings.
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// SMTP endpoint and message addressing for alert delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default = "default_to_email")]
    pub to_email: String,

    /// Required at startup; normally injected via `NETVIGIL_SMTP__USERNAME`.
    #[serde(default)]
    pub username: String,

    /// Required at startup; normally injected via `NETVIGIL_SMTP__PASSWORD`.
    #[serde(default)]
    pub password: String,
}

impl MonitorConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    /// Startup validation, run before any scanning begins.
    pub fn validate(&self) -> Result<()> {
        if self.networks.is_empty() {
            return Err(MonitorError::Config(
                "no networks configured; add [[networks]] entries (cidr, name) to netvigil.toml"
                    .into(),
            ));
        }
        if self.smtp.username.is_empty() || self.smtp.password.is_empty() {
            return Err(MonitorError::Config(
                "SMTP credentials missing; set NETVIGIL_SMTP__USERNAME and NETVIGIL_SMTP__PASSWORD"
                    .into(),
            ));
        }
        Ok(())
    }
}

fn default_scan_timeout() -> u64 {
    2
}

fn default_scan_interval() -> u64 {
    60
}

fn default_smtp_server() -> String {
    "sandbox.smtp.mailtrap.io".to_string()
}

fn default_smtp_port() -> u16 {
    2525
}

fn default_from_email() -> String {
    "netvigil@example.com".to_string()
}

fn default_to_email() -> String {
    "netops@example.com".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            networks: Vec::new(),
            scan_timeout_secs: default_scan_timeout(),
            scan_interval_secs: default_scan_interval(),
            smtp: SmtpConfig::default(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            from_email: default_from_email(),
            to_email: default_to_email(),
            username: String::new(),
            password: String::new(),
        }
    }
}
