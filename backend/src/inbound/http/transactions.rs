//! Read-only ledger lookup.
//!
//! ```text
//! GET /transactions/{internal_id}
//! ```
//!
//! Operators use this to confirm what the gateway recorded for a payment.

use actix_web::{HttpResponse, get, web};

use crate::domain::InternalTxnId;
use crate::inbound::http::error::{not_found_response, store_error_response};
use crate::inbound::http::state::HttpState;

/// Return the ledger entry with the given gateway-generated id as JSON.
#[get("/transactions/{internal_id}")]
pub async fn get_transaction(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> HttpResponse {
    let internal_id = InternalTxnId::new(path.into_inner());
    match state.transactions.find_by_internal_id(&internal_id).await {
        Ok(Some(transaction)) => HttpResponse::Ok().json(transaction),
        Ok(None) => not_found_response(format!("transaction {internal_id} not found")),
        Err(err) => store_error_response(&err),
    }
}
