//! Domain-level failures.
//!
//! Validation and provider outcomes are protocol replies, not errors. This
//! type only covers infrastructure failures that leave the gateway unable to
//! give a trustworthy answer; inbound adapters turn it into a temporary-error
//! reply.

/// Failure that prevented a request from being reconciled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A dependency (usually the ledger) could not be reached.
    #[error("service unavailable: {message}")]
    Unavailable { message: String },
    /// An unexpected condition inside the gateway.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Convenience constructor for [`Error::Unavailable`].
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
