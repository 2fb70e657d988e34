//! Audit sink backed by the process-wide `tracing` subscriber.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{AuditEvent, AuditLog, AuditLogError};

/// Emits audit records as structured events with target `audit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditLogError> {
        match event {
            AuditEvent::RawQuery { remote_addr, query } => {
                info!(target: "audit", kind = event.kind(), %remote_addr, %query, "raw query");
            }
            AuditEvent::Request {
                remote_addr,
                command,
                fields,
            } => {
                info!(
                    target: "audit",
                    kind = event.kind(),
                    %remote_addr,
                    %command,
                    fields = ?fields,
                    "request"
                );
            }
            AuditEvent::Response {
                remote_addr,
                txn_id,
                result,
                comment,
            } => {
                info!(
                    target: "audit",
                    kind = event.kind(),
                    %remote_addr,
                    %txn_id,
                    result = result.value(),
                    %comment,
                    "response"
                );
            }
        }
        Ok(())
    }
}
