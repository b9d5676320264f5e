//! SMTP alert delivery.

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use netvigil_core::{HostAddr, Network, Notifier, NotifyError};

use crate::config::SmtpConfig;

/// Delivers new-host alerts as plain-text email over authenticated SMTP.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Builds the transport and validates the configured addresses.
    ///
    /// The relay is addressed without implicit TLS: the default sandbox
    /// relay authenticates over cleartext SMTP on a non-TLS port.
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config
                .from_email
                .parse()
                .with_context(|| format!("invalid from_email: {}", config.from_email))?,
            to: config
                .to_email
                .parse()
                .with_context(|| format!("invalid to_email: {}", config.to_email))?,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, host: &HostAddr, network: &Network) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject(network))
            .body(body(host, network))
            .map_err(|err| NotifyError::from(anyhow::Error::new(err)))?;

        self.transport
            .send(message)
            .await
            .map_err(|err| NotifyError::from(anyhow::Error::new(err)))?;

        tracing::info!(host = %host, network = %network.name, "Notification sent");
        Ok(())
    }
}

fn subject(network: &Network) -> String {
    format!("New Host Detected on {}", network.name)
}

fn body(host: &HostAddr, network: &Network) -> String {
    format!(
        "A new host was found on {}:\n\nHost IP: {}",
        network.name, host
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home_network() -> Network {
        Network::new("192.168.0.0/24".parse().unwrap(), "Home Wi-Fi")
    }

    #[test]
    fn message_names_the_network_and_host() {
        let network = home_network();
        let host = HostAddr::from("192.168.0.5");

        assert_eq!(subject(&network), "New Host Detected on Home Wi-Fi");
        let body = body(&host, &network);
        assert!(body.contains("Home Wi-Fi"));
        assert!(body.contains("Host IP: 192.168.0.5"));
    }

    #[test]
    fn invalid_addresses_are_rejected() {
        let config = SmtpConfig {
            from_email: "not an address".into(),
            ..SmtpConfig::default()
        };
        assert!(SmtpNotifier::new(&config).is_err());
    }
}
