//! Ledger entries recording payment attempts.
//!
//! ## Invariants
//! - At most one [`Transaction`] exists per [`TransactionKey`]; storage
//!   adapters enforce this with a uniqueness constraint.
//! - `internal_id` and `created_at` never change after insertion.
//! - Only rows whose status is [`TransactionStatus::Timeout`] are rewritten.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payment::{ExtraData, ProviderId};
use super::result_code::{ResultCode, ResultCodeParseError};

/// Gateway-generated identifier, distinct from the caller's transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalTxnId(String);

impl InternalTxnId {
    /// Wrap an identifier produced by a generator or read from storage.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for InternalTxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Idempotency key of the ledger: provider plus caller transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionKey {
    /// Provider the payment was routed to.
    pub provider_id: ProviderId,
    /// Caller-supplied transaction id.
    pub external_txn_id: String,
}

impl TransactionKey {
    /// Build a key.
    pub fn new(provider_id: ProviderId, external_txn_id: impl Into<String>) -> Self {
        Self {
            provider_id,
            external_txn_id: external_txn_id.into(),
        }
    }
}

/// Recorded state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Legacy initial state; never written by the reconciler.
    Pending,
    /// Provider accepted the payment.
    Success,
    /// Provider timed out; the key may be retried.
    Timeout,
    /// Provider rejected the payment.
    Failed,
}

impl TransactionStatus {
    /// Classify a mapped result code.
    #[must_use]
    pub fn classify(code: ResultCode) -> Self {
        if code == ResultCode::SUCCESS {
            Self::Success
        } else if code.is_timeout() {
            Self::Timeout
        } else {
            Self::Failed
        }
    }

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored status string is not one of the known states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction status `{0}`")]
pub struct TransactionStatusParseError(String);

impl FromStr for TransactionStatus {
    type Err = TransactionStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "timeout" => Ok(Self::Timeout),
            "failed" => Ok(Self::Failed),
            other => Err(TransactionStatusParseError(other.to_owned())),
        }
    }
}

/// Mapped result of one provider attempt together with its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptOutcome {
    /// Mapped gateway code.
    pub result: ResultCode,
    /// Status the ledger records for this code.
    pub status: TransactionStatus,
}

impl AttemptOutcome {
    /// Classify a mapped code.
    #[must_use]
    pub fn from_result(result: ResultCode) -> Self {
        Self {
            result,
            status: TransactionStatus::classify(result),
        }
    }
}

/// Persisted payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub internal_id: InternalTxnId,
    pub provider_id: ProviderId,
    pub external_txn_id: String,
    pub account_number: String,
    pub amount: Decimal,
    pub pay_type: Option<String>,
    pub extra_data: ExtraData,
    /// Decimal string form of the last mapped result code.
    pub last_result_code: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Ledger key of this entry.
    #[must_use]
    pub fn key(&self) -> TransactionKey {
        TransactionKey::new(self.provider_id.clone(), self.external_txn_id.clone())
    }

    /// Last recorded result code.
    ///
    /// # Errors
    /// Returns [`ResultCodeParseError`] when the stored code is not numeric.
    pub fn result_code(&self) -> Result<ResultCode, ResultCodeParseError> {
        self.last_result_code.parse()
    }

    /// Whether a repeated PAY for this key should reach the provider again.
    #[must_use]
    pub fn is_retry_eligible(&self) -> bool {
        self.status == TransactionStatus::Timeout
    }
}
