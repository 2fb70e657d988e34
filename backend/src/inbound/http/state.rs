//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle via `actix_web::web::Data` and only depend on
//! domain ports, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AuditLog, NoOpAuditLog, PaymentGateway, TransactionStore};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Driving port for CHECK/PAY requests.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Ledger used by the transaction lookup endpoint.
    pub transactions: Arc<dyn TransactionStore>,
    /// Sink for the protocol audit trail.
    pub audit: Arc<dyn AuditLog>,
}

impl HttpState {
    /// Bundle the ports, discarding audit records.
    pub fn new(gateway: Arc<dyn PaymentGateway>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            gateway,
            transactions,
            audit: Arc::new(NoOpAuditLog),
        }
    }

    /// Send audit records to `audit`.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }
}
