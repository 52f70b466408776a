//! Error taxonomy for remote API operations.
//!
//! Every failure a client can produce falls into one of four kinds, and the
//! kind decides how the coordinator surfaces it:
//!
//! - `Configuration`: a credential is missing. Fatal to that feature for the
//!   session; the view shows a blocking message instead of its normal content.
//! - `Validation`: empty user input. Never sent over the wire.
//! - `Auth`: the remote service rejected the credential. Shown to the user;
//!   the feature stays usable for a retry.
//! - `Remote`: any other remote failure (network, rate limit, malformed
//!   response). Shown inline next to the triggering action.
//!
//! Nothing here is retried automatically; the user re-triggers by
//! resubmitting.

use thiserror::Error;

/// Unified error type for the Gemini chat and DeepAI image clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// A required credential is not configured.
    #[error("{0}")]
    Configuration(String),

    /// User input was rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The remote service rejected the configured credential.
    #[error("{0}")]
    Auth(String),

    /// The remote call failed for any other reason.
    #[error("{0}")]
    Remote(String),
}

impl ApiError {
    /// Whether this error permanently disables the feature for the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Configuration(_))
    }
}
