//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-process ledger used when no database is configured
//! - **persistence**: PostgreSQL ledger using Diesel ORM
//! - **providers**: downstream payment providers
//! - **audit**: audit record sinks
//!
//! Adapters translate between domain types and infrastructure
//! representations and contain no business logic.

pub mod audit;
pub mod memory;
pub mod persistence;
pub mod providers;
