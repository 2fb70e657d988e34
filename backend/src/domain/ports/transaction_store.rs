//! Port abstraction for the payment ledger.
//!
//! The [`TransactionStore`] is the only shared mutable resource of the
//! gateway. Adapters must enforce uniqueness of
//! [`TransactionKey`](crate::domain::TransactionKey) at the storage boundary
//! and report a lost insert race as [`TransactionStoreError::DuplicateKey`],
//! so the reconciler can fall back to reading the winning row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AttemptOutcome, InternalTxnId, Transaction, TransactionKey, TransactionStatus,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger adapters.
    pub enum TransactionStoreError {
        /// Storage could not be reached.
        Connection { message: String } => "transaction store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "transaction store query failed: {message}",
        /// Stored data could not be converted to or from domain types.
        Serialization { message: String } => "transaction store serialization failed: {message}",
        /// A row with this key already exists (concurrent insert race).
        DuplicateKey { message: String } => "transaction already recorded: {message}",
    }
}

/// Port for ledger reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Find the entry recorded for a provider and caller transaction id.
    async fn find_by_key(
        &self,
        key: &TransactionKey,
    ) -> Result<Option<Transaction>, TransactionStoreError>;

    /// Find an entry by its gateway-generated identifier.
    async fn find_by_internal_id(
        &self,
        internal_id: &InternalTxnId,
    ) -> Result<Option<Transaction>, TransactionStoreError>;

    /// Insert a new entry.
    ///
    /// Fails with [`TransactionStoreError::DuplicateKey`] when an entry with
    /// the same key or internal id already exists.
    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionStoreError>;

    /// Overwrite the outcome of an entry in place, but only while its status
    /// still equals `expected`.
    ///
    /// Returns `false` when no row matched, either because the id is unknown
    /// or because another request changed the status first.
    async fn update_outcome(
        &self,
        internal_id: &InternalTxnId,
        expected: TransactionStatus,
        outcome: &AttemptOutcome,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, TransactionStoreError>;
}
