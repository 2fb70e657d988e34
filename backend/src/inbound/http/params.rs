//! Extraction of protocol parameters from query strings and form bodies.
//!
//! Standard parameter names match case-insensitively and the first
//! occurrence of a name wins. Query-string pairs come before form-body pairs,
//! so the query string wins when both carry the same key. Every other
//! parameter lands in the extra data map.

use url::form_urlencoded;

use crate::domain::{ExtraData, GatewayQuery};

/// Decode `query` and an optional form body into ordered key/value pairs.
#[must_use]
pub fn collect_pairs(query: &str, form_body: Option<&[u8]>) -> Vec<(String, String)> {
    let from_query = form_urlencoded::parse(query.as_bytes());
    let from_body = form_body.into_iter().flat_map(form_urlencoded::parse);
    from_query
        .chain(from_body)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Values of the parameters with a dedicated meaning in the protocol.
#[derive(Default)]
struct Standard {
    command: Option<String>,
    txn_id: Option<String>,
    account: Option<String>,
    sum: Option<String>,
    provider_id: Option<String>,
    txn_date: Option<String>,
    pay_type: Option<String>,
}

impl Standard {
    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        let lowered = key.to_ascii_lowercase();
        match lowered.as_str() {
            "command" => Some(&mut self.command),
            "txn_id" => Some(&mut self.txn_id),
            "account" => Some(&mut self.account),
            "sum" => Some(&mut self.sum),
            "prv_id" => Some(&mut self.provider_id),
            "txn_date" => Some(&mut self.txn_date),
            "pay_type" => Some(&mut self.pay_type),
            _ => None,
        }
    }
}

/// Split decoded pairs into standard fields and extra data.
///
/// # Examples
/// ```
/// use payment_gateway::inbound::http::params::{collect_pairs, gateway_query};
///
/// let query = gateway_query(collect_pairs("COMMAND=pay&txn_id=7&terminal=12", None));
/// assert_eq!(query.command, "pay");
/// assert_eq!(query.txn_id, "7");
/// assert_eq!(query.extra_data.get("terminal").map(String::as_str), Some("12"));
/// ```
pub fn gateway_query(pairs: impl IntoIterator<Item = (String, String)>) -> GatewayQuery {
    let mut standard = Standard::default();
    let mut extra_data = ExtraData::new();

    for (key, value) in pairs {
        match standard.slot(&key) {
            Some(slot) => {
                slot.get_or_insert(value);
            }
            None => {
                extra_data.entry(key).or_insert(value);
            }
        }
    }

    GatewayQuery {
        command: standard.command.unwrap_or_default(),
        txn_id: standard.txn_id.unwrap_or_default(),
        account: standard.account.unwrap_or_default(),
        sum: standard.sum.unwrap_or_default(),
        provider_id: standard.provider_id.unwrap_or_default(),
        txn_date: standard.txn_date,
        pay_type: standard.pay_type,
        extra_data,
    }
}

/// Fields recorded in the REQUEST audit record, in a fixed order.
#[must_use]
pub fn audit_fields(query: &GatewayQuery) -> Vec<(String, String)> {
    let data = if query.extra_data.is_empty() {
        "none".to_owned()
    } else {
        query
            .extra_data
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    [
        ("txn_id", query.txn_id.clone()),
        ("account", query.account.clone()),
        ("sum", query.sum.clone()),
        ("prv_id", query.provider_id.clone()),
        ("pay_type", query.pay_type.clone().unwrap_or_default()),
        ("txn_date", query.txn_date.clone().unwrap_or_default()),
        ("data", data),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value))
    .collect()
}
