//! Append-only audit trail of protocol exchanges.
//!
//! Audit writes are fire-and-forget: callers log failures and carry on, so an
//! adapter error never changes the response sent to the aggregator.

use async_trait::async_trait;

use crate::domain::ResultCode;

use super::define_port_error;

define_port_error! {
    /// Errors raised by audit log adapters.
    pub enum AuditLogError {
        /// The record could not be written.
        Write { message: String } => "audit record could not be written: {message}",
    }
}

/// One audited step of a protocol exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// Query string exactly as received.
    RawQuery {
        remote_addr: String,
        query: String,
    },
    /// Parsed request fields, in a stable order.
    Request {
        remote_addr: String,
        command: String,
        fields: Vec<(String, String)>,
    },
    /// Final answer returned to the aggregator.
    Response {
        remote_addr: String,
        txn_id: String,
        result: ResultCode,
        comment: String,
    },
}

impl AuditEvent {
    /// Short tag naming the step.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RawQuery { .. } => "RAW_QUERY",
            Self::Request { .. } => "REQUEST",
            Self::Response { .. } => "RESPONSE",
        }
    }
}

/// Port for audit record sinks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append a record.
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditLogError>;
}

/// Audit sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditLog;

#[async_trait]
impl AuditLog for NoOpAuditLog {
    async fn record(&self, _event: &AuditEvent) -> Result<(), AuditLogError> {
        Ok(())
    }
}
