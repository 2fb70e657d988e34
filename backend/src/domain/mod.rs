//! Domain primitives, ports and services of the payment gateway.
//!
//! Purpose: model the CHECK/PAY protocol independently of HTTP and storage.
//! Requests flow through [`validate`], are routed by the [`ProviderRegistry`]
//! and reconciled against the ledger by [`TransactionReconciler`].
//!
//! Public surface:
//! - `ResultCode`, `RawCode`, `CodeMapper`: protocol outcome codes.
//! - `PaymentRequest`, `ProviderResponse`, `Command`: provider exchange.
//! - `Transaction`, `TransactionKey`, `TransactionStatus`: ledger entries.
//! - `TransactionReconciler`: implementation of the `PaymentGateway` port.

pub mod code_mapper;
pub mod error;
pub mod payment;
pub mod ports;
pub mod reconciler;
pub mod registry;
pub mod result_code;
pub mod transaction;
pub mod validation;

pub use self::code_mapper::CodeMapper;
pub use self::error::Error;
pub use self::payment::{
    Attempt, Command, ExtraData, PaymentRequest, ProviderId, ProviderResponse, RawCode,
};
pub use self::ports::{Disposition, GatewayQuery, GatewayReply, PaymentGateway};
pub use self::reconciler::{DEFAULT_PROVIDER_DEADLINE, TransactionReconciler};
pub use self::registry::{ProviderBinding, ProviderRegistry, ProviderRegistryBuilder};
pub use self::result_code::{ResultCode, ResultCodeParseError};
pub use self::transaction::{
    AttemptOutcome, InternalTxnId, Transaction, TransactionKey, TransactionStatus,
    TransactionStatusParseError,
};
pub use self::validation::{Rejection, ValidatedPayment, parse_amount, validate};
