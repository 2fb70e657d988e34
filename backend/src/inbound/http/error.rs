//! HTTP mapping of failures.
//!
//! Protocol requests never fail at the HTTP level: a domain [`Error`] becomes
//! result 1 (temporary error) so the aggregator retries later. JSON endpoints
//! map store failures onto status codes. In both cases internal details are
//! logged and redacted from the body.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::domain::ports::TransactionStoreError;
use crate::domain::{Disposition, Error, GatewayReply, ResultCode};

/// Reply sent when the gateway could not reconcile a request.
#[must_use]
pub fn internal_error_reply(err: &Error) -> GatewayReply {
    error!(error = %err, "request could not be reconciled");
    let comment = match err {
        Error::Unavailable { .. } => "Internal error: service temporarily unavailable, retry later",
        Error::Internal { .. } => "Internal error: request could not be completed, retry later",
    };
    GatewayReply::new(ResultCode::PROVIDER_TIMEOUT, comment, Disposition::Failed)
}

/// JSON error body for non-protocol endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Human-readable summary.
    pub message: String,
}

fn status_for(err: &TransactionStoreError) -> StatusCode {
    match err {
        TransactionStoreError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Response for a failed ledger read.
#[must_use]
pub fn store_error_response(err: &TransactionStoreError) -> HttpResponse {
    error!(error = %err, "transaction lookup failed");
    let status = status_for(err);
    let message = if status == StatusCode::SERVICE_UNAVAILABLE {
        "Service unavailable"
    } else {
        "Internal server error"
    };
    HttpResponse::build(status).json(ErrorBody {
        message: message.to_owned(),
    })
}

/// Response for an unknown resource.
#[must_use]
pub fn not_found_response(message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody {
        message: message.into(),
    })
}
