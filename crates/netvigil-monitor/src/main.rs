//! CLI entry point for the netvigil monitor daemon.

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use netvigil_monitor::config::MonitorConfig;
use netvigil_monitor::monitor::NetworkMonitor;
use netvigil_monitor::notify::SmtpNotifier;
use netvigil_monitor::probe::ArpProbe;
use netvigil_monitor::scheduler::ScanScheduler;
use netvigil_monitor::store::FileHostStore;

#[derive(Parser)]
#[command(name = "netvigil-monitor")]
#[command(about = "Watches local networks and emails an alert for every previously unseen host")]
struct Cli {
    /// Network interface to scan on.
    #[arg(short, long)]
    iface: String,

    /// File recording every host ever seen.
    #[arg(long, default_value = "hosts.txt")]
    known_hosts: String,

    /// Config file prefix (default: netvigil).
    #[arg(short, long, default_value = "netvigil")]
    config: String,

    /// Run a single scan cycle and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_monitor_config(&cli.config)?;

    // Credentials and the network list are checked before anything scans.
    config.validate()?;

    let store = Arc::new(FileHostStore::open(&cli.known_hosts)?);
    tracing::info!(
        path = %cli.known_hosts,
        known_hosts = store.len(),
        "Known-host store loaded"
    );

    let probe = Arc::new(ArpProbe::new(&cli.iface)?);
    let notifier = Arc::new(SmtpNotifier::new(&config.smtp)?);

    let monitor = Arc::new(NetworkMonitor::new(
        config.networks.clone(),
        probe,
        notifier,
        store,
        config.scan_timeout(),
    ));

    let shutdown = CancellationToken::new();
    let scheduler = ScanScheduler::new(monitor, config.scan_interval(), shutdown.clone());

    if cli.once {
        scheduler.run_tick().await;
        return Ok(());
    }

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, shutting down");
                shutdown.cancel();
            }
        }
    });

    scheduler.run().await;
    Ok(())
}

fn load_monitor_config(file_prefix: &str) -> anyhow::Result<MonitorConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("NETVIGIL")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(cfg.try_deserialize()?)
}
