//! Configuration (§6), parsed from CLI args with environment-variable
//! fallback, matching the teacher's `main.rs::Cli` pattern.

use clap::Parser;

use crate::error::ConfigError;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "stellar-invocation-stream",
    about = "Streaming extraction service for Soroban contract-invocation events",
    version
)]
pub struct Config {
    /// Network passphrase; startup fails if empty.
    #[arg(long, env = "NETWORK_PASSPHRASE")]
    pub network_passphrase: String,

    /// host:port of the upstream ledger-metadata source.
    #[arg(long, env = "UPSTREAM_ADDRESS")]
    pub upstream_address: String,

    /// Port the downstream streaming RPC listens on.
    #[arg(long, default_value = "8080", env = "LISTEN_PORT")]
    pub listen_port: u16,

    /// Port serving `/health` and `/metrics`.
    #[arg(long, default_value = "8081", env = "HEALTH_PORT")]
    pub health_port: u16,

    /// Ledger protocol version at which Protocol-23 metadata fields activate.
    #[arg(long, default_value = "23", env = "PROTOCOL_23_ACTIVATION_LEDGER")]
    pub protocol_23_activation_ledger: u32,

    /// Enable the control-plane heartbeat sink.
    #[arg(long, default_value = "false", env = "CONTROL_PLANE_ENABLED")]
    pub control_plane_enabled: bool,

    /// Endpoint the control-plane heartbeat POSTs to.
    #[arg(long, env = "CONTROL_PLANE_ENDPOINT")]
    pub control_plane_endpoint: Option<String>,

    /// Heartbeat interval, in seconds.
    #[arg(long, default_value = "30", env = "CONTROL_PLANE_HEARTBEAT_SECONDS")]
    pub control_plane_heartbeat_seconds: u64,
}

impl Config {
    /// Startup validation (§6 exit-code table: exit 1 on config error).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network_passphrase.trim().is_empty() {
            return Err(ConfigError::MissingPassphrase);
        }
        if self.listen_port == 0 || self.health_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.listen_port == self.health_port {
            return Err(ConfigError::InvalidPort);
        }
        if self.control_plane_enabled && self.control_plane_endpoint.is_none() {
            return Err(ConfigError::MissingControlPlaneEndpoint);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            upstream_address: "127.0.0.1:9000".to_string(),
            listen_port: 8080,
            health_port: 8081,
            protocol_23_activation_ledger: 23,
            control_plane_enabled: false,
            control_plane_endpoint: None,
            control_plane_heartbeat_seconds: 30,
        }
    }

    #[test]
    fn rejects_empty_passphrase() {
        let mut cfg = base_config();
        cfg.network_passphrase = "  ".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingPassphrase)));
    }

    #[test]
    fn rejects_colliding_ports() {
        let mut cfg = base_config();
        cfg.health_port = cfg.listen_port;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPort)));
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }
}
