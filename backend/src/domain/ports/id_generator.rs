//! Generation of gateway-side transaction identifiers.

use uuid::Uuid;

use crate::domain::InternalTxnId;

/// Source of globally unique internal transaction ids.
#[cfg_attr(test, mockall::automock)]
pub trait InternalIdGenerator: Send + Sync {
    /// Produce a fresh identifier. Identifiers are never reused.
    fn next_id(&self) -> InternalTxnId;
}

/// Generator backed by random (v4) UUIDs in their 32-character hex form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl InternalIdGenerator for UuidIdGenerator {
    fn next_id(&self) -> InternalTxnId {
        InternalTxnId::new(Uuid::new_v4().simple().to_string())
    }
}
