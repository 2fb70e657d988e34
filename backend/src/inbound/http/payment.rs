//! Protocol webhook handler.
//!
//! ```text
//! GET  /payment_app.cgi?command=check&account=123456&prv_id=100001
//! POST /payment_app.cgi  (application/x-www-form-urlencoded)
//! ```
//!
//! The answer is always HTTP 200 with an XML document; the `result` element
//! carries success or failure.

use std::sync::Arc;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, route, web};
use tracing::{debug, error, warn};

use crate::domain::ports::{AuditEvent, AuditLog};
use crate::domain::{Error, GatewayQuery, GatewayReply};
use crate::inbound::http::error::internal_error_reply;
use crate::inbound::http::params::{audit_fields, collect_pairs, gateway_query};
use crate::inbound::http::response::OsmpResponse;
use crate::inbound::http::state::HttpState;
use crate::middleware::trace::TraceId;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

fn is_form(req: &HttpRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn remote_addr(req: &HttpRequest) -> String {
    req.peer_addr()
        .map_or_else(|| "unknown".to_owned(), |addr| addr.ip().to_string())
}

/// Record audit events in order on a detached task; failures are only logged.
fn spawn_audit(audit: Arc<dyn AuditLog>, events: Vec<AuditEvent>) {
    tokio::spawn(async move {
        for event in events {
            if let Err(err) = audit.record(&event).await {
                warn!(error = %err, kind = event.kind(), "audit record dropped");
            }
        }
    });
}

/// Run the gateway on a detached task so a dropped connection cannot cancel
/// a provider call or ledger write half-way.
async fn reconcile(state: &HttpState, query: GatewayQuery) -> Result<GatewayReply, Error> {
    let gateway = Arc::clone(&state.gateway);
    let task = async move { gateway.handle(query).await };
    let handle = match TraceId::current() {
        Some(trace_id) => tokio::spawn(TraceId::scope(trace_id, task)),
        None => tokio::spawn(task),
    };
    handle.await.unwrap_or_else(|err| {
        error!(error = %err, "reconciliation task failed");
        Err(Error::internal(format!("reconciliation task failed: {err}")))
    })
}

/// Handle a CHECK, PAY or other protocol command.
#[route("/payment_app.cgi", method = "GET", method = "POST")]
pub async fn payment_app(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<HttpState>,
) -> HttpResponse {
    let remote_addr = remote_addr(&req);
    let form_body = is_form(&req).then_some(body.as_ref());
    let query = gateway_query(collect_pairs(req.query_string(), form_body));
    let txn_id = query.txn_id.clone();

    spawn_audit(
        Arc::clone(&state.audit),
        vec![
            AuditEvent::RawQuery {
                remote_addr: remote_addr.clone(),
                query: req.query_string().to_owned(),
            },
            AuditEvent::Request {
                remote_addr: remote_addr.clone(),
                command: query.command.clone(),
                fields: audit_fields(&query),
            },
        ],
    );

    let reply = reconcile(&state, query)
        .await
        .unwrap_or_else(|err| internal_error_reply(&err));
    debug!(
        result = %reply.result,
        disposition = ?reply.disposition,
        "protocol request answered"
    );

    spawn_audit(
        Arc::clone(&state.audit),
        vec![AuditEvent::Response {
            remote_addr,
            txn_id: txn_id.clone(),
            result: reply.result,
            comment: reply.comment.clone(),
        }],
    );

    OsmpResponse::from_reply(txn_id, &reply).into_http()
}
