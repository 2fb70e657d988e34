//! Ordered validation of raw protocol fields.
//!
//! Rules run in a fixed order and the first failing rule decides the reply:
//!
//! 1. `prv_id` must resolve in the [`ProviderRegistry`] (code 5).
//! 2. `account` must not be blank (code 302).
//! 3. Outside CHECK, `txn_id` must not be blank (code 300).
//! 4. Outside CHECK, `sum` must be positive (code 301).
//!
//! An unparsable `sum` is read as zero, so it only fails through rule 4.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::payment::{Attempt, Command, PaymentRequest, ProviderId};
use super::ports::GatewayQuery;
use super::registry::{ProviderBinding, ProviderRegistry};
use super::result_code::ResultCode;

/// Short-circuit reply produced by a failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: ResultCode,
    pub comment: String,
}

impl Rejection {
    fn new(code: ResultCode, comment: impl Into<String>) -> Self {
        Self {
            code,
            comment: comment.into(),
        }
    }
}

/// Request that passed every rule, with the binding that will serve it.
#[derive(Debug, Clone)]
pub struct ValidatedPayment<'r> {
    pub request: PaymentRequest,
    pub binding: &'r ProviderBinding,
    /// `pay_type`, recorded on the ledger entry but not sent to providers.
    pub pay_type: Option<String>,
}

/// Apply the validation rules to `query`.
///
/// # Errors
/// Returns the [`Rejection`] of the first failing rule.
///
/// # Examples
/// ```
/// use payment_gateway::domain::{GatewayQuery, ProviderRegistry, ResultCode, validate};
///
/// let registry = ProviderRegistry::default();
/// let query = GatewayQuery {
///     command: "check".into(),
///     provider_id: "42".into(),
///     ..GatewayQuery::default()
/// };
/// let rejection = validate(&query, &registry).unwrap_err();
/// assert_eq!(rejection.code, ResultCode::UNKNOWN_PROVIDER);
/// assert_eq!(rejection.comment, "Provider with prv_id=42 not found");
/// ```
pub fn validate<'r>(
    query: &GatewayQuery,
    registry: &'r ProviderRegistry,
) -> Result<ValidatedPayment<'r>, Rejection> {
    let Some(binding) = registry.resolve(&query.provider_id) else {
        return Err(Rejection::new(
            ResultCode::UNKNOWN_PROVIDER,
            format!("Provider with prv_id={} not found", query.provider_id),
        ));
    };

    let account = query.account.trim();
    if account.is_empty() {
        return Err(Rejection::new(ResultCode::MISSING_ACCOUNT, "Missing account"));
    }

    let command = Command::parse(&query.command);
    let external_txn_id = query.txn_id.trim();
    let amount = parse_amount(&query.sum);

    if !command.is_check() {
        if external_txn_id.is_empty() {
            return Err(Rejection::new(ResultCode::MISSING_TXN_ID, "Missing txn_id"));
        }
        if amount <= Decimal::ZERO {
            return Err(Rejection::new(ResultCode::INVALID_SUM, "Invalid sum"));
        }
    }

    let request = PaymentRequest {
        account: account.to_owned(),
        external_txn_id: external_txn_id.to_owned(),
        amount,
        provider_id: ProviderId::new(&query.provider_id),
        command,
        extra_data: query.extra_data.clone(),
        service_code: String::new(),
        attempt: Attempt::First,
    };

    Ok(ValidatedPayment {
        request,
        binding,
        pay_type: query
            .pay_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned),
    })
}

/// Parse `sum`, treating anything unparsable as zero.
///
/// Both `.` and `,` are accepted as the decimal separator.
#[must_use]
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_str(&trimmed.replace(',', ".")))
        .unwrap_or(Decimal::ZERO)
}
