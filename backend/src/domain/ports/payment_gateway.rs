//! Driving port for the CHECK/PAY webhook.
//!
//! Inbound adapters hand the raw protocol fields to [`PaymentGateway::handle`]
//! and encode the returned [`GatewayReply`]; validation, provider dispatch and
//! ledger reconciliation all sit behind this port.

use async_trait::async_trait;

use crate::domain::{Error, ExtraData, ResultCode};

/// Raw protocol fields as received, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayQuery {
    /// `command`.
    pub command: String,
    /// `txn_id`.
    pub txn_id: String,
    /// `account`.
    pub account: String,
    /// `sum`, unparsed.
    pub sum: String,
    /// `prv_id`.
    pub provider_id: String,
    /// `txn_date`, when supplied.
    pub txn_date: Option<String>,
    /// `pay_type`, when supplied.
    pub pay_type: Option<String>,
    /// Every parameter outside the standard set.
    pub extra_data: ExtraData,
}

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Validation or resolution short-circuited the request.
    Rejected,
    /// Untracked live query (CHECK or an unknown command).
    LiveQuery,
    /// First PAY attempt for the key; a ledger entry was created.
    Processed,
    /// PAY retried after a recorded timeout; the entry was updated.
    Retried,
    /// PAY already recorded with a final outcome; the provider was not called.
    Duplicate,
    /// Infrastructure failure; answered as a temporary error by the adapter.
    Failed,
}

/// Result code and comment for the protocol response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    pub result: ResultCode,
    pub comment: String,
    pub disposition: Disposition,
}

impl GatewayReply {
    /// Build a reply.
    pub fn new(result: ResultCode, comment: impl Into<String>, disposition: Disposition) -> Self {
        Self {
            result,
            comment: comment.into(),
            disposition,
        }
    }
}

/// Use-case entry point for protocol requests.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Validate, dispatch and reconcile one protocol request.
    ///
    /// Validation and provider outcomes are always `Ok`; only infrastructure
    /// failures (for example an unreachable ledger) surface as [`Error`].
    async fn handle(&self, query: GatewayQuery) -> Result<GatewayReply, Error>;
}
