//! Gateway result codes carried in the `result` element of every response.
//!
//! The result code is the only error channel of the protocol: transport-level
//! status is always success. Codes are stored in the ledger in their decimal
//! string form, so the type accepts any integer rather than only the
//! catalogued values below.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Gateway-standard result code, after raw provider codes have been mapped.
///
/// # Examples
/// ```
/// use payment_gateway::domain::ResultCode;
///
/// let code: ResultCode = "79".parse().expect("numeric code");
/// assert_eq!(code, ResultCode::ACCOUNT_NOT_FOUND);
/// assert_eq!(code.to_string(), "79");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(i32);

impl ResultCode {
    /// Operation accepted.
    pub const SUCCESS: Self = Self(0);
    /// Temporary provider failure; the same request may be retried.
    pub const PROVIDER_TIMEOUT: Self = Self(1);
    /// `prv_id` does not name a registered provider.
    pub const UNKNOWN_PROVIDER: Self = Self(5);
    /// Unknown command or malformed provider exchange.
    pub const FORMAT_ERROR: Self = Self(13);
    /// The provider does not know the account.
    pub const ACCOUNT_NOT_FOUND: Self = Self(79);
    /// `txn_id` missing on a command that requires it.
    pub const MISSING_TXN_ID: Self = Self(300);
    /// `sum` missing, unparsable, or not positive.
    pub const INVALID_SUM: Self = Self(301);
    /// `account` missing or blank.
    pub const MISSING_ACCOUNT: Self = Self(302);

    /// Wrap a raw integer code.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Integer value written to the `result` element.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Whether this code classifies an attempt as retry-eligible.
    #[must_use]
    pub const fn is_timeout(self) -> bool {
        self.0 == Self::PROVIDER_TIMEOUT.0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored result code could not be read back as an integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("result code `{raw}` is not an integer")]
pub struct ResultCodeParseError {
    raw: String,
}

impl FromStr for ResultCode {
    type Err = ResultCodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| ResultCodeParseError { raw: s.to_owned() })
    }
}
