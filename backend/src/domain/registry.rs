//! Static lookup from provider id to the protocol and code table serving it.
//!
//! The registry is assembled once at startup through [`ProviderRegistryBuilder`]
//! and is read-only afterwards; requests never register providers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::code_mapper::CodeMapper;
use super::payment::ProviderId;
use super::ports::ProviderProtocol;

/// Protocol implementation and its raw-code table.
#[derive(Clone)]
pub struct ProviderBinding {
    protocol: Arc<dyn ProviderProtocol>,
    mapper: CodeMapper,
}

impl ProviderBinding {
    /// Pair a protocol with the mapper translating its raw codes.
    pub fn new(protocol: Arc<dyn ProviderProtocol>, mapper: CodeMapper) -> Self {
        Self { protocol, mapper }
    }

    /// Protocol to dispatch requests to.
    #[must_use]
    pub fn protocol(&self) -> &Arc<dyn ProviderProtocol> {
        &self.protocol
    }

    /// Table translating the protocol's raw codes.
    #[must_use]
    pub fn mapper(&self) -> &CodeMapper {
        &self.mapper
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("mapper", &self.mapper)
            .finish_non_exhaustive()
    }
}

/// Closed map of provider bindings.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    bindings: HashMap<ProviderId, ProviderBinding>,
}

impl ProviderRegistry {
    /// Start assembling a registry.
    #[must_use]
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Look up the binding for `provider_id`.
    ///
    /// The id is trimmed before lookup; an unknown id yields `None`.
    #[must_use]
    pub fn resolve(&self, provider_id: &str) -> Option<&ProviderBinding> {
        self.bindings.get(&ProviderId::new(provider_id))
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Startup-time builder for [`ProviderRegistry`].
#[derive(Debug, Default)]
pub struct ProviderRegistryBuilder {
    bindings: HashMap<ProviderId, ProviderBinding>,
}

impl ProviderRegistryBuilder {
    /// Bind `provider_id` to a protocol and mapper, replacing any earlier
    /// binding for the same id.
    #[must_use]
    pub fn register(
        mut self,
        provider_id: impl AsRef<str>,
        protocol: Arc<dyn ProviderProtocol>,
        mapper: CodeMapper,
    ) -> Self {
        self.bindings.insert(
            ProviderId::new(provider_id),
            ProviderBinding::new(protocol, mapper),
        );
        self
    }

    /// Freeze the table.
    #[must_use]
    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            bindings: self.bindings,
        }
    }
}
