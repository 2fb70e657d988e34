//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Ledger of PAY attempts.
    ///
    /// `(provider_id, external_txn_id)` carries a unique index; a violation
    /// signals a concurrent insert for the same payment.
    payment_transactions (internal_id) {
        /// Gateway-generated identifier (32 hex characters).
        internal_id -> Varchar,
        /// Provider the payment was routed to (`prv_id`).
        provider_id -> Varchar,
        /// Caller transaction id (`txn_id`).
        external_txn_id -> Varchar,
        /// Trimmed account identifier.
        account_number -> Varchar,
        /// Payment amount.
        amount -> Numeric,
        /// Optional `pay_type`.
        pay_type -> Nullable<Varchar>,
        /// Extra request parameters as a JSON object; null when none.
        extra_data -> Nullable<Jsonb>,
        /// Decimal string of the last mapped result code.
        last_result_code -> Varchar,
        /// One of `pending`, `success`, `timeout`, `failed`.
        status -> Varchar,
        /// Insertion timestamp.
        created_at -> Timestamptz,
        /// Timestamp of the last outcome written.
        last_updated_at -> Timestamptz,
    }
}
