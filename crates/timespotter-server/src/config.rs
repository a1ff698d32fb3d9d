// ABOUTME: Configuration loading for the timespotter daemon.
// ABOUTME: Reads listen address, ports and snapshot path from environment variables with defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TIMESPOTTER_ADDRESS is not a valid IP address: {0}")]
    InvalidAddress(String),

    #[error("{var} is not a valid port: {value}")]
    InvalidPort { var: &'static str, value: String },
}

pub const DEFAULT_STATE_PATH: &str = "timespotter.state";
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 5000;
pub const DEFAULT_DNS_PORT: u16 = 5300;

/// Daemon configuration: where to listen and where the snapshot lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub state_path: PathBuf,
    pub listen_address: IpAddr,
    pub http_port: u16,
    pub dns_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            listen_address: IpAddr::from([127, 0, 0, 1]),
            http_port: DEFAULT_HTTP_PORT,
            dns_port: DEFAULT_DNS_PORT,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Environment variables:
    /// - TIMESPOTTER_STATE: snapshot file (default: timespotter.state)
    /// - TIMESPOTTER_ADDRESS: listen IP for both surfaces (default: 127.0.0.1)
    /// - TIMESPOTTER_PORT: HTTP command API port (default: 5000)
    /// - TIMESPOTTER_DNS_PORT: DNS port (default: 5300)
    pub fn from_env() -> Result<Self, ConfigError> {
        let state_path = std::env::var("TIMESPOTTER_STATE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));

        let address = std::env::var("TIMESPOTTER_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());
        let listen_address: IpAddr = address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(address))?;

        let http_port = port_from_env("TIMESPOTTER_PORT", DEFAULT_HTTP_PORT)?;
        let dns_port = port_from_env("TIMESPOTTER_DNS_PORT", DEFAULT_DNS_PORT)?;

        Ok(Self {
            state_path,
            listen_address,
            http_port,
            dns_port,
        })
    }

    /// Socket address of the HTTP command API.
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.http_port)
    }

    /// Socket address of the DNS listener.
    pub fn dns_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.dns_port)
    }
}

fn port_from_env(var: &'static str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidPort { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serialize all tests that read/write env vars to prevent race conditions.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        "TIMESPOTTER_STATE",
        "TIMESPOTTER_ADDRESS",
        "TIMESPOTTER_PORT",
        "TIMESPOTTER_DNS_PORT",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            // SAFETY: test-only code, serialized by ENV_MUTEX
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn config_loads_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.http_addr(), "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.dns_addr(), "127.0.0.1:5300".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn config_reads_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_MUTEX
        unsafe {
            std::env::set_var("TIMESPOTTER_STATE", "/var/lib/ts/state.bin");
            std::env::set_var("TIMESPOTTER_ADDRESS", "0.0.0.0");
            std::env::set_var("TIMESPOTTER_PORT", "8080");
            std::env::set_var("TIMESPOTTER_DNS_PORT", "53");
        }

        let config = ServerConfig::from_env();
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.state_path, PathBuf::from("/var/lib/ts/state.bin"));
        assert_eq!(config.http_addr(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.dns_port, 53);
    }

    #[test]
    fn config_rejects_bad_port() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_MUTEX
        unsafe { std::env::set_var("TIMESPOTTER_DNS_PORT", "99999") };

        let result = ServerConfig::from_env();
        clear_env();

        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("TIMESPOTTER_DNS_PORT"),
            "error should name the variable: {}",
            err
        );
    }

    #[test]
    fn config_rejects_bad_address() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_MUTEX
        unsafe { std::env::set_var("TIMESPOTTER_ADDRESS", "localhost:5000") };

        let result = ServerConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidAddress(_))));
    }
}
