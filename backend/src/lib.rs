//! Payment gateway adapter for the OSMP (QIWI) CHECK/PAY protocol.
//!
//! Aggregator requests arrive on the HTTP webhook, are validated, dispatched
//! to the bound provider and reconciled against an idempotency ledger before
//! an XML reply goes back.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;

pub use middleware::Trace;
