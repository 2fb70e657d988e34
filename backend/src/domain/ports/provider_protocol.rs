//! Driven port for downstream payment providers.
//!
//! A provider answers with a raw, provider-native code. Mapping into gateway
//! result codes happens in the reconciler through the
//! [`CodeMapper`](crate::domain::CodeMapper) bound next to the provider in
//! the registry, so raw codes never reach callers.

use async_trait::async_trait;

use crate::domain::{PaymentRequest, ProviderResponse};

use super::define_port_error;

define_port_error! {
    /// Faults raised by provider adapters.
    ///
    /// The reconciler treats every variant as raw code 13.
    pub enum ProviderError {
        /// The provider could not be reached.
        Unavailable { message: String } => "provider unavailable: {message}",
        /// The provider answered with something that is not a protocol reply.
        Malformed { message: String } => "provider reply malformed: {message}",
    }
}

/// Capability implemented by every downstream provider.
///
/// Implementations must be stateless with respect to individual requests:
/// anything that depends on earlier attempts for the same payment is carried
/// in [`PaymentRequest::attempt`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderProtocol: Send + Sync {
    /// Execute a CHECK, PAY, or any other command against the provider.
    async fn process(&self, request: &PaymentRequest) -> Result<ProviderResponse, ProviderError>;
}
