//! PostgreSQL-backed `TransactionStore` implementation using Diesel ORM.
//!
//! The unique index on `(provider_id, external_txn_id)` is what makes the
//! ledger idempotent: a lost insert race surfaces as
//! [`TransactionStoreError::DuplicateKey`]. Retry updates are conditional on
//! the stored status, so two concurrent retries cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{TransactionStore, TransactionStoreError};
use crate::domain::{
    AttemptOutcome, ExtraData, InternalTxnId, ProviderId, Transaction, TransactionKey,
    TransactionStatus,
};

use super::models::{NewTransactionRow, TransactionOutcomeUpdate, TransactionRow};
use super::pool::{DbPool, PoolError};
use super::schema::payment_transactions;

/// Diesel-backed implementation of the `TransactionStore` port.
#[derive(Clone)]
pub struct DieselTransactionStore {
    pool: DbPool,
}

impl DieselTransactionStore {
    /// Create a store over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TransactionStoreError {
    TransactionStoreError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> TransactionStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => TransactionStoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => TransactionStoreError::query("database query error"),
        DieselError::DeserializationError(err) => {
            TransactionStoreError::serialization(err.to_string())
        }
        DieselError::DatabaseError(kind, _) => match kind {
            DatabaseErrorKind::UniqueViolation => {
                TransactionStoreError::duplicate_key("concurrent insert detected")
            }
            DatabaseErrorKind::ClosedConnection => {
                TransactionStoreError::connection("database connection error")
            }
            _ => TransactionStoreError::query("database error"),
        },
        _ => TransactionStoreError::query("database error"),
    }
}

fn extra_data_to_json(
    extra_data: &ExtraData,
) -> Result<Option<serde_json::Value>, TransactionStoreError> {
    if extra_data.is_empty() {
        return Ok(None);
    }
    serde_json::to_value(extra_data)
        .map(Some)
        .map_err(|err| TransactionStoreError::serialization(err.to_string()))
}

fn row_to_transaction(row: TransactionRow) -> Result<Transaction, TransactionStoreError> {
    let status = row.status.parse::<TransactionStatus>().map_err(|err| {
        TransactionStoreError::serialization(format!(
            "transaction {}: {err}",
            row.internal_id
        ))
    })?;
    let extra_data = match row.extra_data {
        None | Some(serde_json::Value::Null) => ExtraData::new(),
        Some(value) => serde_json::from_value(value).map_err(|err| {
            TransactionStoreError::serialization(format!(
                "transaction {} has unreadable extra data: {err}",
                row.internal_id
            ))
        })?,
    };

    Ok(Transaction {
        internal_id: InternalTxnId::new(row.internal_id),
        provider_id: ProviderId::new(row.provider_id),
        external_txn_id: row.external_txn_id,
        account_number: row.account_number,
        amount: row.amount,
        pay_type: row.pay_type,
        extra_data,
        last_result_code: row.last_result_code,
        status,
        created_at: row.created_at,
        last_updated_at: row.last_updated_at,
    })
}

#[async_trait]
impl TransactionStore for DieselTransactionStore {
    async fn find_by_key(
        &self,
        key: &TransactionKey,
    ) -> Result<Option<Transaction>, TransactionStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TransactionRow> = payment_transactions::table
            .filter(
                payment_transactions::provider_id
                    .eq(key.provider_id.as_str())
                    .and(payment_transactions::external_txn_id.eq(key.external_txn_id.as_str())),
            )
            .select(TransactionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_transaction).transpose()
    }

    async fn find_by_internal_id(
        &self,
        internal_id: &InternalTxnId,
    ) -> Result<Option<Transaction>, TransactionStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TransactionRow> = payment_transactions::table
            .find(internal_id.as_str())
            .select(TransactionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_transaction).transpose()
    }

    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionStoreError> {
        let new_row = NewTransactionRow {
            internal_id: transaction.internal_id.as_str(),
            provider_id: transaction.provider_id.as_str(),
            external_txn_id: &transaction.external_txn_id,
            account_number: &transaction.account_number,
            amount: transaction.amount,
            pay_type: transaction.pay_type.as_deref(),
            extra_data: extra_data_to_json(&transaction.extra_data)?,
            last_result_code: transaction.last_result_code.clone(),
            status: transaction.status.as_str(),
            created_at: transaction.created_at,
            last_updated_at: transaction.last_updated_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(payment_transactions::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_outcome(
        &self,
        internal_id: &InternalTxnId,
        expected: TransactionStatus,
        outcome: &AttemptOutcome,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, TransactionStoreError> {
        let changes = TransactionOutcomeUpdate {
            last_result_code: outcome.result.to_string(),
            status: outcome.status.as_str(),
            last_updated_at: updated_at,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            payment_transactions::table.filter(
                payment_transactions::internal_id
                    .eq(internal_id.as_str())
                    .and(payment_transactions::status.eq(expected.as_str())),
            ),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        debug!(%internal_id, updated, "conditional outcome update");
        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    #[fixture]
    fn row() -> TransactionRow {
        let now = Utc::now();
        TransactionRow {
            internal_id: "0f3c".into(),
            provider_id: "100001".into(),
            external_txn_id: "T1".into(),
            account_number: "123456".into(),
            amount: dec!(10.50),
            pay_type: Some("cash".into()),
            extra_data: Some(serde_json::json!({ "terminal": "77" })),
            last_result_code: "0".into(),
            status: "success".into(),
            created_at: now,
            last_updated_at: now,
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(err, TransactionStoreError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_key() {
        let err = map_diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_string()),
        ));

        assert!(
            matches!(err, TransactionStoreError::DuplicateKey { .. }),
            "expected DuplicateKey error, got {err:?}"
        );
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        let err = map_diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_string()),
        ));

        assert!(matches!(err, TransactionStoreError::Connection { .. }));
    }

    #[rstest]
    fn other_errors_map_to_query_error() {
        let err = map_diesel_error(DieselError::NotFound);

        assert!(matches!(err, TransactionStoreError::Query { .. }));
    }

    #[rstest]
    fn row_converts_to_transaction(row: TransactionRow) {
        let transaction = row_to_transaction(row).expect("valid row");

        assert_eq!(transaction.internal_id.as_str(), "0f3c");
        assert_eq!(transaction.status, TransactionStatus::Success);
        assert_eq!(transaction.amount, dec!(10.50));
        assert_eq!(
            transaction.extra_data.get("terminal").map(String::as_str),
            Some("77")
        );
    }

    #[rstest]
    fn null_extra_data_reads_as_empty(mut row: TransactionRow) {
        row.extra_data = None;
        let transaction = row_to_transaction(row).expect("valid row");
        assert!(transaction.extra_data.is_empty());
    }

    #[rstest]
    fn legacy_pending_rows_are_readable(mut row: TransactionRow) {
        row.status = "pending".into();
        let transaction = row_to_transaction(row).expect("valid row");
        assert_eq!(transaction.status, TransactionStatus::Pending);
        assert!(!transaction.is_retry_eligible());
    }

    #[rstest]
    fn unknown_status_is_a_serialization_error(mut row: TransactionRow) {
        row.status = "settled".into();
        let err = row_to_transaction(row).expect_err("bad status");
        assert!(matches!(err, TransactionStoreError::Serialization { .. }));
    }

    #[rstest]
    fn empty_extra_data_is_stored_as_null() {
        assert_eq!(extra_data_to_json(&ExtraData::new()).expect("json"), None);
    }
}
