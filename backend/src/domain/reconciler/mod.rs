//! Reconciliation of protocol requests against the payment ledger.
//!
//! [`TransactionReconciler`] implements the [`PaymentGateway`] driving port:
//! it validates the request, dispatches it to the bound provider and, for PAY,
//! decides between a first attempt, a timeout retry and a duplicate replay
//! based on what the [`TransactionStore`] already holds for the key.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use mockable::Clock;
use tracing::{debug, error, info, warn};

use super::ports::{
    Disposition, GatewayQuery, GatewayReply, InternalIdGenerator, PaymentGateway,
    TransactionStore, TransactionStoreError,
};
use super::registry::{ProviderBinding, ProviderRegistry};
use super::validation::{ValidatedPayment, validate};
use super::{
    Attempt, AttemptOutcome, Command, Error, PaymentRequest, ProviderResponse, RawCode,
    ResultCode, Transaction, TransactionKey, TransactionStatus,
};

/// Deadline applied to provider calls unless configured otherwise.
pub const DEFAULT_PROVIDER_DEADLINE: Duration = Duration::from_secs(30);

/// Mapped provider answer for one attempt.
#[derive(Debug, Clone)]
struct Invocation {
    outcome: AttemptOutcome,
    comment: String,
}

/// Ledger-backed implementation of [`PaymentGateway`].
pub struct TransactionReconciler<S> {
    registry: Arc<ProviderRegistry>,
    store: Arc<S>,
    ids: Arc<dyn InternalIdGenerator>,
    clock: Arc<dyn Clock>,
    provider_deadline: Duration,
}

impl<S> TransactionReconciler<S>
where
    S: TransactionStore,
{
    /// Create a reconciler using [`DEFAULT_PROVIDER_DEADLINE`].
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<S>,
        ids: Arc<dyn InternalIdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            store,
            ids,
            clock,
            provider_deadline: DEFAULT_PROVIDER_DEADLINE,
        }
    }

    /// Bound every provider call by `deadline`.
    #[must_use]
    pub fn with_provider_deadline(mut self, deadline: Duration) -> Self {
        self.provider_deadline = deadline;
        self
    }

    /// Call the provider and map its answer.
    ///
    /// Errors and panics raised by the provider become raw code 13 before
    /// mapping; an elapsed deadline becomes result 1 directly.
    async fn invoke(&self, binding: &ProviderBinding, request: &PaymentRequest) -> Invocation {
        let protocol = binding.protocol();
        let call = AssertUnwindSafe(async move { protocol.process(request).await }).catch_unwind();
        let response = match tokio::time::timeout(self.provider_deadline, call).await {
            Ok(Ok(Ok(response))) => response,
            Ok(Ok(Err(err))) => {
                warn!(
                    provider_id = %request.provider_id,
                    error = %err,
                    "provider call failed"
                );
                ProviderResponse::new(RawCode::FORMAT_ERROR, "Provider error")
            }
            Ok(Err(_panic)) => {
                error!(provider_id = %request.provider_id, "provider call panicked");
                ProviderResponse::new(RawCode::FORMAT_ERROR, "Provider error")
            }
            Err(_elapsed) => {
                warn!(
                    provider_id = %request.provider_id,
                    deadline_ms = self.provider_deadline.as_millis(),
                    "provider call timed out"
                );
                return Invocation {
                    outcome: AttemptOutcome::from_result(ResultCode::PROVIDER_TIMEOUT),
                    comment: "Provider did not respond in time".to_owned(),
                };
            }
        };

        let result = binding.mapper().map(response.raw_code);
        debug!(
            provider_id = %request.provider_id,
            raw_code = %response.raw_code,
            result = %result,
            "provider answered"
        );
        Invocation {
            outcome: AttemptOutcome::from_result(result),
            comment: response.comment,
        }
    }

    /// CHECK and unknown commands: forward and answer, never touching the
    /// ledger.
    async fn live_query(&self, payment: ValidatedPayment<'_>) -> GatewayReply {
        let invocation = self.invoke(payment.binding, &payment.request).await;
        GatewayReply::new(
            invocation.outcome.result,
            invocation.comment,
            Disposition::LiveQuery,
        )
    }

    async fn reconcile_payment(&self, payment: ValidatedPayment<'_>) -> Result<GatewayReply, Error> {
        let key = TransactionKey::new(
            payment.request.provider_id.clone(),
            payment.request.external_txn_id.clone(),
        );
        let existing = self
            .store
            .find_by_key(&key)
            .await
            .map_err(map_store_error)?;

        match existing {
            None => self.process_new(payment, &key).await,
            Some(existing) if existing.is_retry_eligible() => {
                self.retry(payment.binding, payment.request, existing).await
            }
            Some(existing) => duplicate_reply(&existing),
        }
    }

    /// First attempt for a key: call the provider, then record the outcome.
    async fn process_new(
        &self,
        payment: ValidatedPayment<'_>,
        key: &TransactionKey,
    ) -> Result<GatewayReply, Error> {
        let invocation = self.invoke(payment.binding, &payment.request).await;
        let now = self.clock.utc();
        let request = payment.request;
        let transaction = Transaction {
            internal_id: self.ids.next_id(),
            provider_id: request.provider_id,
            external_txn_id: request.external_txn_id,
            account_number: request.account,
            amount: request.amount,
            pay_type: payment.pay_type,
            extra_data: request.extra_data,
            last_result_code: invocation.outcome.result.to_string(),
            status: invocation.outcome.status,
            created_at: now,
            last_updated_at: now,
        };

        match self.store.insert(&transaction).await {
            Ok(()) => {
                info!(
                    internal_id = %transaction.internal_id,
                    provider_id = %transaction.provider_id,
                    txn_id = %transaction.external_txn_id,
                    status = %transaction.status,
                    "payment recorded"
                );
                Ok(GatewayReply::new(
                    invocation.outcome.result,
                    format!(
                        "Payment processed. GatewayTxnId={}. {}",
                        transaction.internal_id, invocation.comment
                    ),
                    Disposition::Processed,
                ))
            }
            Err(TransactionStoreError::DuplicateKey { .. }) => {
                self.resolve_insert_race(key, invocation).await
            }
            Err(err) => Err(map_store_error(err)),
        }
    }

    /// Another request inserted the key between our lookup and insert.
    ///
    /// A terminal winner is replayed as a duplicate. A winner that recorded a
    /// timeout is overwritten when our own attempt was terminal.
    async fn resolve_insert_race(
        &self,
        key: &TransactionKey,
        invocation: Invocation,
    ) -> Result<GatewayReply, Error> {
        let winner = self
            .store
            .find_by_key(key)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                Error::internal(format!(
                    "transaction for prv_id={} txn_id={} missing after duplicate insert",
                    key.provider_id, key.external_txn_id
                ))
            })?;

        debug!(internal_id = %winner.internal_id, "lost insert race");
        if winner.is_retry_eligible() && invocation.outcome.status != TransactionStatus::Timeout {
            self.record_retry(winner, invocation).await
        } else {
            duplicate_reply(&winner)
        }
    }

    async fn retry(
        &self,
        binding: &ProviderBinding,
        mut request: PaymentRequest,
        existing: Transaction,
    ) -> Result<GatewayReply, Error> {
        request.attempt = Attempt::Retry;
        let invocation = self.invoke(binding, &request).await;
        self.record_retry(existing, invocation).await
    }

    /// Overwrite a timed-out entry with a new outcome.
    ///
    /// When the entry stopped being a timeout in the meantime the current row
    /// is replayed as a duplicate instead.
    async fn record_retry(
        &self,
        existing: Transaction,
        invocation: Invocation,
    ) -> Result<GatewayReply, Error> {
        let updated = self
            .store
            .update_outcome(
                &existing.internal_id,
                TransactionStatus::Timeout,
                &invocation.outcome,
                self.clock.utc(),
            )
            .await
            .map_err(map_store_error)?;

        if updated {
            info!(
                internal_id = %existing.internal_id,
                status = %invocation.outcome.status,
                "timed-out payment retried"
            );
            return Ok(GatewayReply::new(
                invocation.outcome.result,
                format!(
                    "Timeout retry. GatewayTxnId={}. {}",
                    existing.internal_id, invocation.comment
                ),
                Disposition::Retried,
            ));
        }

        let current = self
            .store
            .find_by_internal_id(&existing.internal_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                Error::internal(format!(
                    "transaction {} missing after a conflicting update",
                    existing.internal_id
                ))
            })?;
        duplicate_reply(&current)
    }
}

/// Replay the stored outcome without contacting the provider.
fn duplicate_reply(existing: &Transaction) -> Result<GatewayReply, Error> {
    let result = existing.result_code().map_err(|err| {
        Error::internal(format!(
            "transaction {} has a corrupt result code: {err}",
            existing.internal_id
        ))
    })?;
    debug!(internal_id = %existing.internal_id, "duplicate payment");
    Ok(GatewayReply::new(
        result,
        format!(
            "Duplicate txn_id={}. Previous result={}. GatewayTxnId={}",
            existing.external_txn_id, result, existing.internal_id
        ),
        Disposition::Duplicate,
    ))
}

fn map_store_error(error: TransactionStoreError) -> Error {
    match error {
        TransactionStoreError::Connection { message } => {
            Error::unavailable(format!("transaction store unavailable: {message}"))
        }
        TransactionStoreError::Query { message } => {
            Error::internal(format!("transaction store error: {message}"))
        }
        TransactionStoreError::Serialization { message } => {
            Error::internal(format!("stored transaction unreadable: {message}"))
        }
        TransactionStoreError::DuplicateKey { message } => {
            Error::internal(format!("unexpected duplicate key: {message}"))
        }
    }
}

#[async_trait]
impl<S> PaymentGateway for TransactionReconciler<S>
where
    S: TransactionStore,
{
    async fn handle(&self, query: GatewayQuery) -> Result<GatewayReply, Error> {
        let payment = match validate(&query, &self.registry) {
            Ok(payment) => payment,
            Err(rejection) => {
                debug!(
                    result = %rejection.code,
                    comment = %rejection.comment,
                    "request rejected"
                );
                return Ok(GatewayReply::new(
                    rejection.code,
                    rejection.comment,
                    Disposition::Rejected,
                ));
            }
        };

        if payment.request.command == Command::Pay {
            self.reconcile_payment(payment).await
        } else {
            Ok(self.live_query(payment).await)
        }
    }
}

#[cfg(test)]
mod tests;
