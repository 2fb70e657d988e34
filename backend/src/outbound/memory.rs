//! In-process ledger used when no database is configured.
//!
//! Rows and the key index live behind one `tokio` lock, so the uniqueness of
//! `(provider_id, external_txn_id)` holds exactly as it would under the
//! PostgreSQL unique index. Contents are lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{TransactionStore, TransactionStoreError};
use crate::domain::{
    AttemptOutcome, InternalTxnId, Transaction, TransactionKey, TransactionStatus,
};

#[derive(Debug, Default)]
struct Ledger {
    rows: HashMap<InternalTxnId, Transaction>,
    by_key: HashMap<TransactionKey, InternalTxnId>,
}

/// Thread-safe in-memory implementation of the `TransactionStore` port.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTransactionStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryTransactionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded transactions.
    pub async fn len(&self) -> usize {
        self.ledger.read().await.rows.len()
    }

    /// Whether nothing has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.ledger.read().await.rows.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn find_by_key(
        &self,
        key: &TransactionKey,
    ) -> Result<Option<Transaction>, TransactionStoreError> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .by_key
            .get(key)
            .and_then(|id| ledger.rows.get(id))
            .cloned())
    }

    async fn find_by_internal_id(
        &self,
        internal_id: &InternalTxnId,
    ) -> Result<Option<Transaction>, TransactionStoreError> {
        Ok(self.ledger.read().await.rows.get(internal_id).cloned())
    }

    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionStoreError> {
        let mut ledger = self.ledger.write().await;
        let key = transaction.key();
        if ledger.by_key.contains_key(&key) {
            return Err(TransactionStoreError::duplicate_key(format!(
                "prv_id={} txn_id={}",
                key.provider_id, key.external_txn_id
            )));
        }
        if ledger.rows.contains_key(&transaction.internal_id) {
            return Err(TransactionStoreError::duplicate_key(format!(
                "internal id {}",
                transaction.internal_id
            )));
        }
        ledger
            .by_key
            .insert(key, transaction.internal_id.clone());
        ledger
            .rows
            .insert(transaction.internal_id.clone(), transaction.clone());
        Ok(())
    }

    async fn update_outcome(
        &self,
        internal_id: &InternalTxnId,
        expected: TransactionStatus,
        outcome: &AttemptOutcome,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, TransactionStoreError> {
        let mut ledger = self.ledger.write().await;
        match ledger.rows.get_mut(internal_id) {
            Some(row) if row.status == expected => {
                row.last_result_code = outcome.result.to_string();
                row.status = outcome.status;
                row.last_updated_at = updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
