//! XML encoding of protocol replies.
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <response><osmp_txn_id>T1</osmp_txn_id><result>0</result><comment>...</comment></response>
//! ```
//!
//! No namespace is emitted; `comment` is omitted when absent and
//! `osmp_txn_id` is empty when the caller did not send one.

use actix_web::HttpResponse;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use quick_xml::se::Serializer;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::{GatewayReply, ResultCode};

/// Content type of every protocol reply.
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Body sent when encoding itself fails: a temporary error without comment.
const FALLBACK_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<response><osmp_txn_id></osmp_txn_id><result>1</result></response>"#;

/// Serialisation failure while encoding a reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to encode protocol response: {message}")]
pub struct ResponseEncodingError {
    message: String,
}

/// Protocol reply document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "response")]
pub struct OsmpResponse {
    /// Caller transaction id echoed back, empty when not supplied.
    #[serde(default)]
    pub osmp_txn_id: String,
    /// Numeric result code.
    pub result: i32,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl OsmpResponse {
    /// Build a reply document.
    pub fn new(txn_id: impl Into<String>, result: ResultCode, comment: Option<String>) -> Self {
        Self {
            osmp_txn_id: txn_id.into(),
            result: result.value(),
            comment,
        }
    }

    /// Reply document for a gateway reply; an empty comment is omitted.
    pub fn from_reply(txn_id: impl Into<String>, reply: &GatewayReply) -> Self {
        let comment = (!reply.comment.is_empty()).then(|| reply.comment.clone());
        Self::new(txn_id, reply.result, comment)
    }

    /// Encode as a UTF-8 XML document with declaration.
    ///
    /// # Errors
    /// Returns [`ResponseEncodingError`] when serialisation fails.
    ///
    /// # Examples
    /// ```
    /// use payment_gateway::domain::ResultCode;
    /// use payment_gateway::inbound::http::response::OsmpResponse;
    ///
    /// let xml = OsmpResponse::new("T1", ResultCode::SUCCESS, None)
    ///     .to_xml()
    ///     .expect("encodes");
    /// assert!(xml.ends_with("<response><osmp_txn_id>T1</osmp_txn_id><result>0</result></response>"));
    /// ```
    pub fn to_xml(&self) -> Result<String, ResponseEncodingError> {
        let mut body = String::from(XML_DECLARATION);
        body.push('\n');
        let mut serializer = Serializer::with_root(&mut body, Some("response")).map_err(|err| {
            ResponseEncodingError {
                message: err.to_string(),
            }
        })?;
        serializer.expand_empty_elements(true);
        self.serialize(serializer)
            .map_err(|err| ResponseEncodingError {
                message: err.to_string(),
            })?;
        Ok(body)
    }

    /// HTTP 200 response carrying the encoded document.
    #[must_use]
    pub fn into_http(self) -> HttpResponse {
        let body = self.to_xml().unwrap_or_else(|err| {
            error!(error = %err, "falling back to static protocol response");
            FALLBACK_BODY.to_owned()
        });
        HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, XML_CONTENT_TYPE))
            .insert_header((CACHE_CONTROL, "no-store"))
            .body(body)
    }
}
