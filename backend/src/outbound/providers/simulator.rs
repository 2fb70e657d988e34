//! Deterministic provider used for integration and acceptance testing.
//!
//! Raw codes: `2` accepted, `3` timed out, `1` invalid amount, `99` unknown
//! account, `13` unknown command. Pair it with
//! [`CodeMapper::simulator`](crate::domain::CodeMapper::simulator).

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::ports::{ProviderError, ProviderProtocol};
use crate::domain::{Attempt, Command, PaymentRequest, ProviderResponse, RawCode};

/// Provider id the simulator is registered under by default.
pub const SIMULATOR_PROVIDER_ID: &str = "100001";
/// The only account the simulator knows.
pub const VALID_ACCOUNT: &str = "123456";
/// Account whose first PAY times out and whose retry succeeds.
pub const TIMEOUT_ACCOUNT: &str = "TIMEOUT";

const ACCEPTED: RawCode = RawCode::new(2);
const TIMED_OUT: RawCode = RawCode::new(3);
const INVALID_AMOUNT: RawCode = RawCode::new(1);
const UNKNOWN_ACCOUNT: RawCode = RawCode::new(99);

/// Stateless simulated provider.
///
/// Whether a PAY is a retry comes from [`PaymentRequest::attempt`], so the
/// simulator answers the same way for the same request and attempt.
#[derive(Debug, Clone, Default)]
pub struct SimulatedProvider {
    latency: Duration,
}

impl SimulatedProvider {
    /// Simulator answering immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn check(account: &str) -> RawCode {
        if account == VALID_ACCOUNT {
            ACCEPTED
        } else {
            UNKNOWN_ACCOUNT
        }
    }

    fn pay(request: &PaymentRequest) -> RawCode {
        let account = request.account.trim();
        if account == TIMEOUT_ACCOUNT {
            return match request.attempt {
                Attempt::First => TIMED_OUT,
                Attempt::Retry => ACCEPTED,
            };
        }
        if account != VALID_ACCOUNT {
            UNKNOWN_ACCOUNT
        } else if request.amount <= Decimal::ZERO {
            INVALID_AMOUNT
        } else {
            ACCEPTED
        }
    }

    fn answer(request: &PaymentRequest) -> ProviderResponse {
        match &request.command {
            Command::Check => ProviderResponse::new(
                Self::check(request.account.trim()),
                format!("Simulator: check for account {}", request.account),
            ),
            Command::Pay => ProviderResponse::new(
                Self::pay(request),
                format!(
                    "Simulator: pay for account {}, amount {}",
                    request.account, request.amount
                ),
            ),
            Command::Other(command) => ProviderResponse::new(
                RawCode::FORMAT_ERROR,
                format!("Simulator: unknown command {command}"),
            ),
        }
    }
}

#[async_trait]
impl ProviderProtocol for SimulatedProvider {
    async fn process(&self, request: &PaymentRequest) -> Result<ProviderResponse, ProviderError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let response = Self::answer(request);
        info!(
            target: "audit",
            provider_id = %request.provider_id,
            command = %request.command,
            account = %request.account,
            txn_id = %request.external_txn_id,
            raw_code = %response.raw_code,
            comment = %response.comment,
            "simulator response"
        );
        Ok(response)
    }
}
