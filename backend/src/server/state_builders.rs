//! Builders wiring adapters into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use crate::domain::ports::{AuditLog, TransactionStore, UuidIdGenerator};
use crate::domain::{CodeMapper, ProviderRegistry, TransactionReconciler};
use crate::inbound::http::state::HttpState;
use crate::outbound::audit::{FileAuditLog, TracingAuditLog};
use crate::outbound::memory::InMemoryTransactionStore;
use crate::outbound::persistence::DieselTransactionStore;
use crate::outbound::providers::SimulatedProvider;

use super::ServerConfig;

/// Provider table: the simulator under its configured id.
pub(super) fn build_registry(config: &ServerConfig) -> Arc<ProviderRegistry> {
    let simulator = SimulatedProvider::new().with_latency(config.simulator_latency);
    Arc::new(
        ProviderRegistry::builder()
            .register(
                &config.simulator_provider_id,
                Arc::new(simulator),
                CodeMapper::simulator(),
            )
            .build(),
    )
}

/// Daily files when a directory is configured, tracing events otherwise.
///
/// # Errors
/// Returns [`std::io::Error`] when the audit directory cannot be created.
pub(super) fn build_audit_log(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> std::io::Result<Arc<dyn AuditLog>> {
    match &config.audit_log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            info!(dir = %dir.display(), "writing audit records to daily files");
            Ok(Arc::new(FileAuditLog::new(dir.clone(), clock)))
        }
        None => Ok(Arc::new(TracingAuditLog)),
    }
}

fn wire<S>(
    config: &ServerConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLog>,
) -> HttpState
where
    S: TransactionStore + 'static,
{
    let reconciler = TransactionReconciler::new(
        build_registry(config),
        Arc::clone(&store),
        Arc::new(UuidIdGenerator),
        clock,
    )
    .with_provider_deadline(config.provider_deadline);
    HttpState::new(Arc::new(reconciler), store).with_audit(audit)
}

/// Build the shared HTTP state, choosing the ledger by whether a pool is set.
///
/// # Errors
/// Returns [`std::io::Error`] when the audit sink cannot be prepared.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let audit = build_audit_log(config, Arc::clone(&clock))?;
    let state = match &config.db_pool {
        Some(pool) => wire(
            config,
            Arc::new(DieselTransactionStore::new(pool.clone())),
            clock,
            audit,
        ),
        None => {
            info!("no database configured; payments are recorded in memory only");
            wire(config, Arc::new(InMemoryTransactionStore::new()), clock, audit)
        }
    };
    Ok(web::Data::new(state))
}
