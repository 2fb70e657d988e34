//! Audit log adapters.
//!
//! [`TracingAuditLog`] emits each record as a `tracing` event on the `audit`
//! target; [`FileAuditLog`] appends plain-text lines to a daily file.

mod file_log;
mod tracing_log;

pub use file_log::FileAuditLog;
pub use tracing_log::TracingAuditLog;
