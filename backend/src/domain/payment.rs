//! Transient request and response types exchanged with providers.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-supplied fields outside the standard parameter set.
///
/// Ordered so persisted and logged renderings are deterministic.
pub type ExtraData = BTreeMap<String, String>;

/// Protocol command carried in the `command` parameter.
///
/// Matching is case-insensitive after trimming; anything unrecognised is kept
/// verbatim so providers can report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Account validation, never recorded in the ledger.
    Check,
    /// Payment submission, reconciled against the ledger.
    Pay,
    /// Any other value, including an empty one.
    Other(String),
}

impl Command {
    /// Parse the raw `command` parameter.
    ///
    /// # Examples
    /// ```
    /// use payment_gateway::domain::Command;
    ///
    /// assert_eq!(Command::parse(" PAY "), Command::Pay);
    /// assert_eq!(Command::parse("refund"), Command::Other("refund".into()));
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("check") {
            Self::Check
        } else if trimmed.eq_ignore_ascii_case("pay") {
            Self::Pay
        } else {
            Self::Other(trimmed.to_owned())
        }
    }

    /// Whether this is the CHECK command.
    #[must_use]
    pub fn is_check(&self) -> bool {
        matches!(self, Self::Check)
    }

    /// Canonical lowercase name, or the raw value for unknown commands.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Check => "check",
            Self::Pay => "pay",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a downstream provider (`prv_id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Build an identifier, trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_owned())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-native outcome code, before translation into a [`ResultCode`].
///
/// [`ResultCode`]: crate::domain::ResultCode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawCode(i32);

impl RawCode {
    /// Raw code substituted when a provider call faults.
    pub const FORMAT_ERROR: Self = Self(13);

    /// Wrap a provider-native code.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Integer value as reported by the provider.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for RawCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an invocation in the attempt history of its ledger key.
///
/// Derived from the ledger by the reconciler, so providers never need to keep
/// their own per-key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attempt {
    /// No ledger entry exists for the key (or the command is not tracked).
    #[default]
    First,
    /// The key is recorded with a timeout and this is a new attempt.
    Retry,
}

/// Validated request forwarded to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Trimmed account identifier.
    pub account: String,
    /// Caller-supplied transaction id (may be empty for CHECK).
    pub external_txn_id: String,
    /// Requested amount; zero when absent or unparsable.
    pub amount: Decimal,
    /// Provider the request is routed to.
    pub provider_id: ProviderId,
    /// Protocol command.
    pub command: Command,
    /// Opaque pass-through fields.
    pub extra_data: ExtraData,
    /// Reserved for aggregator-style providers; currently always empty.
    pub service_code: String,
    /// First attempt or timeout retry for the ledger key.
    pub attempt: Attempt,
}

/// Provider answer before mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    /// Provider-native code.
    pub raw_code: RawCode,
    /// Free-form provider comment.
    pub comment: String,
}

impl ProviderResponse {
    /// Build a response from a raw code and comment.
    pub fn new(raw_code: RawCode, comment: impl Into<String>) -> Self {
        Self {
            raw_code,
            comment: comment.into(),
        }
    }
}
