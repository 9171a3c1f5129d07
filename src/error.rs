//! Top-level process error taxonomy (§7), split per the taxonomy's
//! propagation-scope distinctions rather than the teacher's single flat
//! `Error` enum in `lib.rs`. `CodecError` (decode failures) and
//! `SessionError` (per-subscriber failures) stay local to the components
//! that raise them; only config-fatal and startup-upstream errors ever
//! reach `main` and set the process exit code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("network_passphrase must not be empty")]
    MissingPassphrase,
    #[error("listen_port and health_port must be non-zero and distinct")]
    InvalidPort,
    #[error("control_plane_endpoint is required when control_plane_enabled is set")]
    MissingControlPlaneEndpoint,
}

/// Top-level error surfaced to `main`; maps to the §6 exit-code table.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("unrecoverable upstream connection failure at startup: {0}")]
    UpstreamStartup(String),
}

impl ServiceError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::Config(_) => 1,
            ServiceError::UpstreamStartup(_) => 2,
        }
    }
}
