//! Gateway configuration loaded via OrthoConfig.
//!
//! Values layer from CLI flags, `GATEWAY_*` environment variables and an
//! optional configuration file; every field has a default so the gateway
//! starts with no configuration at all (in-memory ledger, simulator on
//! provider `100001`, audit records on the tracing subscriber).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 5000);

/// Runtime settings for the gateway process.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GATEWAY")]
pub struct GatewaySettings {
    /// Listen address for the HTTP server.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL; the in-memory ledger is used when unset.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Deadline for a single provider call, in milliseconds.
    #[ortho_config(default = 30_000)]
    pub provider_timeout_ms: u64,
    /// Provider id the simulator is registered under.
    #[ortho_config(default = 100_001)]
    pub simulator_provider_id: u64,
    /// Artificial delay added to every simulator answer, in milliseconds.
    #[ortho_config(default = 0)]
    pub simulator_latency_ms: u64,
    /// Directory for daily audit files; audit goes to tracing when unset.
    pub audit_log_dir: Option<PathBuf>,
}

impl GatewaySettings {
    /// Listen address, falling back to `0.0.0.0:5000`.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Pool configuration when a database URL is set.
    #[must_use]
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url.as_ref().map(|url| {
            PoolConfig::new(url.as_str())
                .with_max_size(self.db_max_connections.unwrap_or(PoolConfig::DEFAULT_MAX_SIZE))
        })
    }

    /// Provider call deadline.
    #[must_use]
    pub fn provider_deadline(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Simulator provider id in its protocol form.
    #[must_use]
    pub fn simulator_provider_id(&self) -> String {
        self.simulator_provider_id.to_string()
    }

    /// Simulator latency, zero unless configured.
    #[must_use]
    pub fn simulator_latency(&self) -> Duration {
        Duration::from_millis(self.simulator_latency_ms)
    }
}
