//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod audit_log;
mod id_generator;
mod payment_gateway;
mod provider_protocol;
mod transaction_store;

#[cfg(test)]
pub use audit_log::MockAuditLog;
pub use audit_log::{AuditEvent, AuditLog, AuditLogError, NoOpAuditLog};
#[cfg(test)]
pub use id_generator::MockInternalIdGenerator;
pub use id_generator::{InternalIdGenerator, UuidIdGenerator};
pub use payment_gateway::{Disposition, GatewayQuery, GatewayReply, PaymentGateway};
#[cfg(test)]
pub use provider_protocol::MockProviderProtocol;
pub use provider_protocol::{ProviderError, ProviderProtocol};
#[cfg(test)]
pub use transaction_store::MockTransactionStore;
pub use transaction_store::{TransactionStore, TransactionStoreError};
