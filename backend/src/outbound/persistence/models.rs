//! Internal Diesel row structs for the ledger table.
//!
//! These types never leave the persistence layer.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::schema::payment_transactions;

/// Row struct for reading from the payment_transactions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payment_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub internal_id: String,
    pub provider_id: String,
    pub external_txn_id: String,
    pub account_number: String,
    pub amount: Decimal,
    pub pay_type: Option<String>,
    pub extra_data: Option<serde_json::Value>,
    pub last_result_code: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Insertable struct for recording a first attempt.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_transactions)]
pub(crate) struct NewTransactionRow<'a> {
    pub internal_id: &'a str,
    pub provider_id: &'a str,
    pub external_txn_id: &'a str,
    pub account_number: &'a str,
    pub amount: Decimal,
    pub pay_type: Option<&'a str>,
    pub extra_data: Option<serde_json::Value>,
    pub last_result_code: String,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Changeset applied when a timed-out attempt is retried.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = payment_transactions)]
pub(crate) struct TransactionOutcomeUpdate<'a> {
    pub last_result_code: String,
    pub status: &'a str,
    pub last_updated_at: DateTime<Utc>,
}
