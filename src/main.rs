// ABOUTME: Entry point for the timespotter daemon.
// ABOUTME: Parses CLI arguments, initializes tracing, restores the snapshot, and runs the HTTP and DNS listeners.

use std::future::IntoFuture;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use timespotter_core::OccurrenceStore;
use timespotter_server::{AppState, ServerConfig, create_router};
use timespotter_store::{SnapshotError, check_writable, load_snapshot, save_snapshot};
use tracing_subscriber::EnvFilter;

/// Track first-seen, last-seen and count for SHA-256 fingerprints.
#[derive(Debug, Parser)]
#[command(name = "timespotter", version, about)]
struct Cli {
    /// Snapshot file to load at startup and save on demand or on exit
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Listen address for both the HTTP and DNS listeners
    #[arg(long, value_name = "IP")]
    address: Option<IpAddr>,

    /// HTTP command API port
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// DNS port
    #[arg(long = "dnsport", value_name = "PORT")]
    dns_port: Option<u16>,
}

impl Cli {
    /// Command-line flags take precedence over the environment.
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(state) = self.state {
            config.state_path = state;
        }
        if let Some(address) = self.address {
            config.listen_address = address;
        }
        if let Some(port) = self.port {
            config.http_port = port;
        }
        if let Some(port) = self.dns_port {
            config.dns_port = port;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("timespotter=info,tower_http=info")),
        )
        .init();

    let config = Cli::parse().apply(ServerConfig::from_env()?);
    tracing::info!(?config, "timespotter starting up");

    run(config).await
}

async fn run(config: ServerConfig) -> Result<()> {
    check_writable(&config.state_path)
        .with_context(|| format!("unable to write to {}", config.state_path.display()))?;

    let store = Arc::new(OccurrenceStore::new());
    match load_snapshot(&store, &config.state_path) {
        Ok(keys) => tracing::info!(keys, "loaded items from state"),
        Err(SnapshotError::Missing(path)) => {
            tracing::warn!(path = %path.display(), "no snapshot found, starting empty");
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("failed to load snapshot {}", config.state_path.display())
            });
        }
    }

    spawn_save_on_signal(Arc::clone(&store), config.state_path.clone());

    let dns_socket = timespotter_dns::bind(config.dns_addr())
        .await
        .with_context(|| format!("failed to bind DNS listener on {}", config.dns_addr()))?;

    let listener = tokio::net::TcpListener::bind(config.http_addr())
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.http_addr()))?;
    tracing::info!(addr = %config.http_addr(), "HTTP command API listening");

    let app = create_router(Arc::new(AppState::new(
        Arc::clone(&store),
        config.state_path.clone(),
    )));

    tokio::select! {
        res = axum::serve(listener, app).into_future() => res.context("HTTP server failed")?,
        res = timespotter_dns::serve(dns_socket, store) => res.context("DNS listener failed")?,
    }

    Ok(())
}

/// On SIGINT or SIGTERM, save the store once and exit. In-flight requests
/// are not drained; the save competes for the store lock like any caller.
fn spawn_save_on_signal(store: Arc<OccurrenceStore>, path: PathBuf) {
    tokio::spawn(async move {
        let signal = match wait_for_signal().await {
            Ok(signal) => signal,
            Err(e) => {
                tracing::error!("signal handler unavailable, state will not be saved on exit: {}", e);
                return;
            }
        };

        tracing::info!(signal, path = %path.display(), "signal caught, saving state");
        match tokio::task::spawn_blocking(move || save_snapshot(&store, &path)).await {
            Ok(Ok(keys)) => tracing::info!(keys, "saved items to state"),
            Ok(Err(e)) => tracing::error!("failed to save state: {}", e),
            Err(e) => tracing::error!("save task failed: {}", e),
        }
        std::process::exit(1);
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).context("failed to set up SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to set up SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for CTRL-C")?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "timespotter",
            "--state",
            "/tmp/spot.state",
            "--port",
            "8080",
            "--dnsport",
            "5353",
        ])
        .unwrap();

        let config = cli.apply(ServerConfig::default());

        assert_eq!(config.state_path, PathBuf::from("/tmp/spot.state"));
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.dns_port, 5353);
        assert_eq!(config.listen_address, ServerConfig::default().listen_address);
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["timespotter"]).unwrap();
        assert_eq!(cli.apply(ServerConfig::default()), ServerConfig::default());
    }

    #[test]
    fn bad_address_is_rejected() {
        assert!(Cli::try_parse_from(["timespotter", "--address", "nowhere"]).is_err());
    }
}
