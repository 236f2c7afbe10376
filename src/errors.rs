//! Tierlock error types.
//!
//! These are boundary errors raised by the store, the remote authority and
//! configuration. The manager maps them onto [`crate::policy::Reason`]
//! before anything reaches the access-decision API.

use thiserror::Error;

/// Errors raised at the edges of the license lifecycle.
#[derive(Debug, Error)]
pub enum TierlockError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP transport error talking to the license authority
    /// (connect failure, timeout, non-2xx status).
    #[error("License authority transport error: {0}")]
    Transport(String),

    /// The license authority answered with a body we cannot use.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Response signature header is missing while a public key is configured.
    #[error("Response signature missing")]
    SignatureMissing,

    /// Response signature verification failed.
    #[error("Response signature verification failed")]
    SignatureInvalid,

    /// Store I/O error.
    #[error("License store I/O error: {0}")]
    StoreIO(String),

    /// Stored record could not be decrypted or parsed.
    #[error("License store is corrupt: {0}")]
    StoreCorrupt(String),

    /// Encryption failure while sealing a record.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// No license token provided.
    #[error("No license token provided")]
    MissingToken,

    /// A demo license cannot be started while another license is loaded.
    #[error("Demo mode unavailable: a license is already present")]
    DemoUnavailable,
}

impl TierlockError {
    /// Whether this error came from talking to the remote authority.
    ///
    /// Such failures degrade to cached trust instead of blocking.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            TierlockError::Transport(_)
                | TierlockError::ProtocolError(_)
                | TierlockError::SignatureMissing
                | TierlockError::SignatureInvalid
        )
    }
}
