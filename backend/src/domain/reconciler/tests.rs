//! Unit tests for the transaction reconciler.
//!
//! Tests cover validation short-circuits, live queries, first attempts,
//! timeout retries, duplicate replays, provider faults, and insert races.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mockable::DefaultClock;
use mockall::Sequence;
use mockall::predicate::*;
use rstest::rstest;
use rust_decimal_macros::dec;

use super::TransactionReconciler;
use crate::domain::ports::{
    Disposition, GatewayQuery, MockProviderProtocol, MockTransactionStore, PaymentGateway,
    ProviderError, ProviderProtocol, TransactionStore, TransactionStoreError, UuidIdGenerator,
};
use crate::domain::{
    Attempt, CodeMapper, Command, Error, ExtraData, InternalTxnId, PaymentRequest, ProviderId,
    ProviderRegistry, ProviderResponse, RawCode, ResultCode, Transaction, TransactionKey,
    TransactionStatus,
};
use crate::outbound::memory::InMemoryTransactionStore;
use crate::outbound::providers::SimulatedProvider;
use tokio::sync::Barrier;

const PRV: &str = "100001";

fn registry_with(protocol: MockProviderProtocol) -> Arc<ProviderRegistry> {
    Arc::new(
        ProviderRegistry::builder()
            .register(PRV, Arc::new(protocol), CodeMapper::simulator())
            .build(),
    )
}

fn reconciler<S: TransactionStore>(
    protocol: MockProviderProtocol,
    store: Arc<S>,
) -> TransactionReconciler<S> {
    TransactionReconciler::new(
        registry_with(protocol),
        store,
        Arc::new(UuidIdGenerator),
        Arc::new(DefaultClock),
    )
}

fn pay(txn_id: &str, account: &str, sum: &str) -> GatewayQuery {
    GatewayQuery {
        command: "pay".into(),
        txn_id: txn_id.into(),
        account: account.into(),
        sum: sum.into(),
        provider_id: PRV.into(),
        ..GatewayQuery::default()
    }
}

fn check(account: &str) -> GatewayQuery {
    GatewayQuery {
        command: "check".into(),
        account: account.into(),
        provider_id: PRV.into(),
        ..GatewayQuery::default()
    }
}

fn answer(raw: i32, comment: &str) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse::new(RawCode::new(raw), comment))
}

fn stored(status: TransactionStatus, code: &str) -> Transaction {
    let now = Utc::now();
    Transaction {
        internal_id: InternalTxnId::new("abc123"),
        provider_id: ProviderId::new(PRV),
        external_txn_id: "T1".into(),
        account_number: "123456".into(),
        amount: dec!(10),
        pay_type: None,
        extra_data: ExtraData::new(),
        last_result_code: code.into(),
        status,
        created_at: now,
        last_updated_at: now,
    }
}

fn key() -> TransactionKey {
    TransactionKey::new(ProviderId::new(PRV), "T1")
}

#[rstest]
#[case(GatewayQuery { provider_id: "999".into(), ..pay("T1", "123456", "10") }, ResultCode::UNKNOWN_PROVIDER)]
#[case(pay("T1", "  ", "10"), ResultCode::MISSING_ACCOUNT)]
#[case(pay("", "123456", "10"), ResultCode::MISSING_TXN_ID)]
#[case(pay("T1", "123456", "0"), ResultCode::INVALID_SUM)]
#[tokio::test]
async fn rejected_requests_touch_nothing(#[case] query: GatewayQuery, #[case] code: ResultCode) {
    let mut protocol = MockProviderProtocol::new();
    protocol.expect_process().never();
    let mut store = MockTransactionStore::new();
    store.expect_find_by_key().never();
    store.expect_insert().never();

    let reply = reconciler(protocol, Arc::new(store))
        .handle(query)
        .await
        .expect("rejections are replies");

    assert_eq!(reply.result, code);
    assert_eq!(reply.disposition, Disposition::Rejected);
}

#[rstest]
#[case("123456", 2, ResultCode::SUCCESS)]
#[case("000000", 99, ResultCode::ACCOUNT_NOT_FOUND)]
#[tokio::test]
async fn check_is_a_live_query(
    #[case] account: &str,
    #[case] raw: i32,
    #[case] expected: ResultCode,
) {
    let mut protocol = MockProviderProtocol::new();
    protocol
        .expect_process()
        .withf(|request: &PaymentRequest| request.command == Command::Check)
        .times(1)
        .returning(move |_| answer(raw, "checked"));
    let mut store = MockTransactionStore::new();
    store.expect_find_by_key().never();
    store.expect_insert().never();
    store.expect_update_outcome().never();

    let reply = reconciler(protocol, Arc::new(store))
        .handle(check(account))
        .await
        .expect("check reply");

    assert_eq!(reply.result, expected);
    assert_eq!(reply.comment, "checked");
    assert_eq!(reply.disposition, Disposition::LiveQuery);
}

#[tokio::test]
async fn unknown_command_is_forwarded_without_ledger() {
    let mut protocol = MockProviderProtocol::new();
    protocol
        .expect_process()
        .withf(|request: &PaymentRequest| request.command == Command::Other("refund".into()))
        .times(1)
        .returning(|_| answer(13, "unknown command refund"));
    let store = Arc::new(InMemoryTransactionStore::default());

    let query = GatewayQuery {
        command: "refund".into(),
        ..pay("T1", "123456", "10")
    };
    let reply = reconciler(protocol, Arc::clone(&store))
        .handle(query)
        .await
        .expect("reply");

    assert_eq!(reply.result, ResultCode::FORMAT_ERROR);
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn first_pay_records_transaction() {
    let mut protocol = MockProviderProtocol::new();
    protocol
        .expect_process()
        .withf(|request: &PaymentRequest| {
            request.attempt == Attempt::First && request.amount == dec!(10.5)
        })
        .times(1)
        .returning(|_| answer(2, "paid"));
    let store = Arc::new(InMemoryTransactionStore::default());

    let mut query = pay("T1", "123456", "10.5");
    query.pay_type = Some("cash".into());
    let reply = reconciler(protocol, Arc::clone(&store))
        .handle(query)
        .await
        .expect("reply");

    assert_eq!(reply.result, ResultCode::SUCCESS);
    assert_eq!(reply.disposition, Disposition::Processed);
    let recorded = store
        .find_by_key(&key())
        .await
        .expect("lookup")
        .expect("row recorded");
    assert_eq!(recorded.status, TransactionStatus::Success);
    assert_eq!(recorded.last_result_code, "0");
    assert_eq!(recorded.pay_type.as_deref(), Some("cash"));
    assert_eq!(
        reply.comment,
        format!("Payment processed. GatewayTxnId={}. paid", recorded.internal_id)
    );
}

#[tokio::test]
async fn repeated_pay_replays_without_provider_call() {
    let mut protocol = MockProviderProtocol::new();
    protocol
        .expect_process()
        .times(1)
        .returning(|_| answer(99, "no such account"));
    let store = Arc::new(InMemoryTransactionStore::default());
    let service = reconciler(protocol, Arc::clone(&store));

    let first = service.handle(pay("T1", "000", "10")).await.expect("first");
    let second = service.handle(pay("T1", "000", "10")).await.expect("second");

    assert_eq!(first.result, ResultCode::ACCOUNT_NOT_FOUND);
    assert_eq!(second.result, ResultCode::ACCOUNT_NOT_FOUND);
    assert_eq!(second.disposition, Disposition::Duplicate);
    let recorded = store.find_by_key(&key()).await.expect("lookup").expect("row");
    assert_eq!(
        second.comment,
        format!(
            "Duplicate txn_id=T1. Previous result=79. GatewayTxnId={}",
            recorded.internal_id
        )
    );
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn timeout_then_retry_updates_in_place() {
    let mut protocol = MockProviderProtocol::new();
    let mut seq = Sequence::new();
    protocol
        .expect_process()
        .withf(|request: &PaymentRequest| request.attempt == Attempt::First)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| answer(3, "try later"));
    protocol
        .expect_process()
        .withf(|request: &PaymentRequest| request.attempt == Attempt::Retry)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| answer(2, "paid"));
    let store = Arc::new(InMemoryTransactionStore::default());
    let service = reconciler(protocol, Arc::clone(&store));

    let first = service.handle(pay("T1", "TIMEOUT", "10")).await.expect("first");
    let after_timeout = store.find_by_key(&key()).await.expect("lookup").expect("row");
    let second = service.handle(pay("T1", "TIMEOUT", "10")).await.expect("second");
    let after_retry = store.find_by_key(&key()).await.expect("lookup").expect("row");

    assert_eq!(first.result, ResultCode::PROVIDER_TIMEOUT);
    assert_eq!(after_timeout.status, TransactionStatus::Timeout);
    assert_eq!(second.result, ResultCode::SUCCESS);
    assert_eq!(second.disposition, Disposition::Retried);
    assert_eq!(
        second.comment,
        format!("Timeout retry. GatewayTxnId={}. paid", after_timeout.internal_id)
    );
    assert_eq!(after_retry.internal_id, after_timeout.internal_id);
    assert_eq!(after_retry.created_at, after_timeout.created_at);
    assert_eq!(after_retry.status, TransactionStatus::Success);
    assert_eq!(after_retry.last_result_code, "0");
    assert_eq!(store.len().await, 1);
}

#[rstest]
#[case(TransactionStatus::Success, "0")]
#[case(TransactionStatus::Failed, "79")]
#[case(TransactionStatus::Pending, "13")]
#[tokio::test]
async fn non_timeout_rows_are_never_retried(
    #[case] status: TransactionStatus,
    #[case] code: &'static str,
) {
    let mut protocol = MockProviderProtocol::new();
    protocol.expect_process().never();
    let mut store = MockTransactionStore::new();
    store
        .expect_find_by_key()
        .with(eq(key()))
        .times(1)
        .return_once(move |_| Ok(Some(stored(status, code))));
    store.expect_update_outcome().never();

    let reply = reconciler(protocol, Arc::new(store))
        .handle(pay("T1", "123456", "10"))
        .await
        .expect("reply");

    assert_eq!(reply.disposition, Disposition::Duplicate);
    assert_eq!(reply.result.to_string(), code);
}

#[tokio::test]
async fn provider_error_maps_to_format_error() {
    let mut protocol = MockProviderProtocol::new();
    protocol
        .expect_process()
        .times(1)
        .returning(|_| Err(ProviderError::unavailable("connection refused")));
    let store = Arc::new(InMemoryTransactionStore::default());

    let reply = reconciler(protocol, Arc::clone(&store))
        .handle(pay("T1", "123456", "10"))
        .await
        .expect("reply");

    assert_eq!(reply.result, ResultCode::FORMAT_ERROR);
    let recorded = store.find_by_key(&key()).await.expect("lookup").expect("row");
    assert_eq!(recorded.status, TransactionStatus::Failed);
}

/// Provider whose every call panics.
struct PanickingProvider;

#[async_trait]
impl ProviderProtocol for PanickingProvider {
    async fn process(&self, _request: &PaymentRequest) -> Result<ProviderResponse, ProviderError> {
        panic!("provider blew up")
    }
}

#[tokio::test]
async fn provider_panic_maps_to_format_error() {
    let registry = ProviderRegistry::builder()
        .register(PRV, Arc::new(PanickingProvider), CodeMapper::simulator())
        .build();
    let store = Arc::new(InMemoryTransactionStore::default());
    let service = TransactionReconciler::new(
        Arc::new(registry),
        Arc::clone(&store),
        Arc::new(UuidIdGenerator),
        Arc::new(DefaultClock),
    );

    let live = service.handle(check("123456")).await.expect("check reply");
    let paid = service
        .handle(pay("T1", "123456", "10"))
        .await
        .expect("pay reply");

    assert_eq!(live.result, ResultCode::FORMAT_ERROR);
    assert_eq!(live.disposition, Disposition::LiveQuery);
    assert_eq!(paid.result, ResultCode::FORMAT_ERROR);
    let recorded = store.find_by_key(&key()).await.expect("lookup").expect("row");
    assert_eq!(recorded.status, TransactionStatus::Failed);
}

/// Provider that answers success after a fixed delay.
struct SlowProvider(Duration);

#[async_trait]
impl ProviderProtocol for SlowProvider {
    async fn process(&self, _request: &PaymentRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.0).await;
        answer(2, "late")
    }
}

#[tokio::test]
async fn elapsed_deadline_records_timeout() {
    let registry = ProviderRegistry::builder()
        .register(
            PRV,
            Arc::new(SlowProvider(Duration::from_secs(5))),
            CodeMapper::simulator(),
        )
        .build();
    let store = Arc::new(InMemoryTransactionStore::default());
    let service = TransactionReconciler::new(
        Arc::new(registry),
        Arc::clone(&store),
        Arc::new(UuidIdGenerator),
        Arc::new(DefaultClock),
    )
    .with_provider_deadline(Duration::from_millis(20));

    let reply = service
        .handle(pay("T1", "123456", "10"))
        .await
        .expect("reply");

    assert_eq!(reply.result, ResultCode::PROVIDER_TIMEOUT);
    assert_eq!(reply.disposition, Disposition::Processed);
    let recorded = store.find_by_key(&key()).await.expect("lookup").expect("row");
    assert_eq!(recorded.status, TransactionStatus::Timeout);
}

#[tokio::test]
async fn lost_insert_race_replays_terminal_winner() {
    let mut protocol = MockProviderProtocol::new();
    protocol.expect_process().times(1).returning(|_| answer(2, "paid"));
    let mut store = MockTransactionStore::new();
    let mut seq = Sequence::new();
    store
        .expect_find_by_key()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(None));
    store
        .expect_insert()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Err(TransactionStoreError::duplicate_key("concurrent insert")));
    store
        .expect_find_by_key()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(Some(stored(TransactionStatus::Failed, "79"))));
    store.expect_update_outcome().never();

    let reply = reconciler(protocol, Arc::new(store))
        .handle(pay("T1", "123456", "10"))
        .await
        .expect("reply");

    assert_eq!(reply.result, ResultCode::ACCOUNT_NOT_FOUND);
    assert_eq!(reply.disposition, Disposition::Duplicate);
    assert_eq!(
        reply.comment,
        "Duplicate txn_id=T1. Previous result=79. GatewayTxnId=abc123"
    );
}

#[tokio::test]
async fn lost_insert_race_overwrites_timed_out_winner() {
    let mut protocol = MockProviderProtocol::new();
    protocol.expect_process().times(1).returning(|_| answer(2, "paid"));
    let mut store = MockTransactionStore::new();
    let mut seq = Sequence::new();
    store
        .expect_find_by_key()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(None));
    store
        .expect_insert()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Err(TransactionStoreError::duplicate_key("concurrent insert")));
    store
        .expect_find_by_key()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(Some(stored(TransactionStatus::Timeout, "1"))));
    store
        .expect_update_outcome()
        .withf(|id, expected, outcome, _| {
            id.as_str() == "abc123"
                && *expected == TransactionStatus::Timeout
                && outcome.status == TransactionStatus::Success
        })
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_, _, _, _| Ok(true));

    let reply = reconciler(protocol, Arc::new(store))
        .handle(pay("T1", "123456", "10"))
        .await
        .expect("reply");

    assert_eq!(reply.result, ResultCode::SUCCESS);
    assert_eq!(reply.disposition, Disposition::Retried);
    assert_eq!(reply.comment, "Timeout retry. GatewayTxnId=abc123. paid");
}

#[tokio::test]
async fn missing_row_after_race_is_internal_error() {
    let mut protocol = MockProviderProtocol::new();
    protocol.expect_process().times(1).returning(|_| answer(2, "paid"));
    let mut store = MockTransactionStore::new();
    let mut seq = Sequence::new();
    store
        .expect_find_by_key()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(None));
    store
        .expect_insert()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Err(TransactionStoreError::duplicate_key("concurrent insert")));
    store
        .expect_find_by_key()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(|_| Ok(None));

    let err = reconciler(protocol, Arc::new(store))
        .handle(pay("T1", "123456", "10"))
        .await
        .expect_err("internal error");

    assert!(matches!(err, Error::Internal { .. }));
}

#[tokio::test]
async fn conflicting_retry_update_replays_current_row() {
    let mut protocol = MockProviderProtocol::new();
    protocol
        .expect_process()
        .withf(|request: &PaymentRequest| request.attempt == Attempt::Retry)
        .times(1)
        .returning(|_| answer(2, "paid"));
    let mut store = MockTransactionStore::new();
    store
        .expect_find_by_key()
        .times(1)
        .return_once(|_| Ok(Some(stored(TransactionStatus::Timeout, "1"))));
    store
        .expect_update_outcome()
        .times(1)
        .return_once(|_, _, _, _| Ok(false));
    store
        .expect_find_by_internal_id()
        .with(eq(InternalTxnId::new("abc123")))
        .times(1)
        .return_once(|_| Ok(Some(stored(TransactionStatus::Success, "0"))));

    let reply = reconciler(protocol, Arc::new(store))
        .handle(pay("T1", "TIMEOUT", "10"))
        .await
        .expect("reply");

    assert_eq!(reply.result, ResultCode::SUCCESS);
    assert_eq!(reply.disposition, Disposition::Duplicate);
}

#[rstest]
#[case(TransactionStoreError::connection("refused"), true)]
#[case(TransactionStoreError::query("syntax"), false)]
#[tokio::test]
async fn store_failures_surface_as_errors(
    #[case] failure: TransactionStoreError,
    #[case] unavailable: bool,
) {
    let mut protocol = MockProviderProtocol::new();
    protocol.expect_process().never();
    let mut store = MockTransactionStore::new();
    store
        .expect_find_by_key()
        .times(1)
        .return_once(move |_| Err(failure));

    let err = reconciler(protocol, Arc::new(store))
        .handle(pay("T1", "123456", "10"))
        .await
        .expect_err("store failure");

    assert_eq!(matches!(err, Error::Unavailable { .. }), unavailable);
}

#[tokio::test]
async fn corrupt_stored_code_is_internal_error() {
    let mut protocol = MockProviderProtocol::new();
    protocol.expect_process().never();
    let mut store = MockTransactionStore::new();
    store
        .expect_find_by_key()
        .times(1)
        .return_once(|_| Ok(Some(stored(TransactionStatus::Success, "ok"))));

    let err = reconciler(protocol, Arc::new(store))
        .handle(pay("T1", "123456", "10"))
        .await
        .expect_err("corrupt row");

    assert!(matches!(err, Error::Internal { .. }));
}

fn simulator_reconciler(
    provider_ids: &[&str],
    store: Arc<InMemoryTransactionStore>,
) -> Arc<TransactionReconciler<InMemoryTransactionStore>> {
    let simulator: Arc<dyn ProviderProtocol> =
        Arc::new(SimulatedProvider::new().with_latency(Duration::from_millis(20)));
    let registry = provider_ids
        .iter()
        .fold(ProviderRegistry::builder(), |builder, id| {
            builder.register(id, Arc::clone(&simulator), CodeMapper::simulator())
        })
        .build();
    Arc::new(TransactionReconciler::new(
        Arc::new(registry),
        store,
        Arc::new(UuidIdGenerator),
        Arc::new(DefaultClock),
    ))
}

#[rstest]
#[case("123456", ResultCode::SUCCESS)]
#[case("TIMEOUT", ResultCode::PROVIDER_TIMEOUT)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_pays_record_one_row(
    #[case] account: &'static str,
    #[case] first_result: ResultCode,
) {
    const REQUESTS: usize = 8;
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = simulator_reconciler(&[PRV], Arc::clone(&store));
    let barrier = Arc::new(Barrier::new(REQUESTS));

    let handles: Vec<_> = (0..REQUESTS)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                service.handle(pay("T1", account, "10")).await
            })
        })
        .collect();
    let mut replies = Vec::with_capacity(REQUESTS);
    for handle in handles {
        replies.push(handle.await.expect("task").expect("reply"));
    }

    assert_eq!(store.len().await, 1);
    let processed: Vec<_> = replies
        .iter()
        .filter(|reply| reply.disposition == Disposition::Processed)
        .collect();
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].result, first_result);
    // A late request may find the timed-out row and retry it instead.
    assert!(replies.iter().all(|reply| matches!(
        reply.disposition,
        Disposition::Processed | Disposition::Duplicate | Disposition::Retried
    )));
    if first_result == ResultCode::SUCCESS {
        assert!(replies
            .iter()
            .filter(|reply| reply.disposition != Disposition::Processed)
            .all(|reply| reply.comment.starts_with("Duplicate txn_id=T1. Previous result=0.")));
    }
}

#[tokio::test]
async fn same_txn_id_under_two_providers_records_two_rows() {
    let store = Arc::new(InMemoryTransactionStore::new());
    let service = simulator_reconciler(&[PRV, "200002"], Arc::clone(&store));

    let first = service.handle(pay("T1", "123456", "10")).await.expect("first");
    let second = service
        .handle(GatewayQuery {
            provider_id: "200002".into(),
            ..pay("T1", "123456", "10")
        })
        .await
        .expect("second");

    assert_eq!(first.disposition, Disposition::Processed);
    assert_eq!(second.disposition, Disposition::Processed);
    assert_ne!(first.comment, second.comment);
    assert_eq!(store.len().await, 2);
    let other_key = TransactionKey::new(ProviderId::new("200002"), "T1");
    let left = store.find_by_key(&key()).await.expect("lookup").expect("row");
    let right = store.find_by_key(&other_key).await.expect("lookup").expect("row");
    assert_ne!(left.internal_id, right.internal_id);
}
