//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::DEFAULT_PROVIDER_DEADLINE;
use crate::outbound::persistence::DbPool;
use crate::outbound::providers::simulator::SIMULATOR_PROVIDER_ID;
use crate::settings::GatewaySettings;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) provider_deadline: Duration,
    pub(crate) simulator_provider_id: String,
    pub(crate) simulator_latency: Duration,
    pub(crate) audit_log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Configuration with an in-memory ledger, the default provider deadline
    /// and the simulator on its default id.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            provider_deadline: DEFAULT_PROVIDER_DEADLINE,
            simulator_provider_id: SIMULATOR_PROVIDER_ID.to_owned(),
            simulator_latency: Duration::ZERO,
            audit_log_dir: None,
        }
    }

    /// Carry every setting except the database, which needs an async
    /// connect; attach it with [`ServerConfig::with_db_pool`].
    #[must_use]
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        let config = Self::new(settings.bind_addr())
            .with_provider_deadline(settings.provider_deadline())
            .with_simulator(settings.simulator_provider_id(), settings.simulator_latency());
        match &settings.audit_log_dir {
            Some(dir) => config.with_audit_log_dir(dir.clone()),
            None => config,
        }
    }

    /// Record payments in PostgreSQL instead of memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Bound every provider call by `deadline`.
    #[must_use]
    pub fn with_provider_deadline(mut self, deadline: Duration) -> Self {
        self.provider_deadline = deadline;
        self
    }

    /// Register the simulator under `provider_id`, answering after `latency`.
    #[must_use]
    pub fn with_simulator(mut self, provider_id: impl Into<String>, latency: Duration) -> Self {
        self.simulator_provider_id = provider_id.into();
        self.simulator_latency = latency;
        self
    }

    /// Write daily audit files under `dir` instead of tracing events.
    #[must_use]
    pub fn with_audit_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit_log_dir = Some(dir.into());
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
