//! Error types and handling for pustaka-core operations.
//!
//! Absence of content is never an error: lookups that miss return `None` or an
//! empty collection. The variants here cover transport failures, remote API
//! rejections, malformed wire payloads, and invalid engine configuration.

use thiserror::Error;

/// The main error type for pustaka-core operations.
///
/// All fallible public functions return `Result<T, Error>`. Not-found outcomes
/// are expressed in the success type (`Option`/empty `Vec`), so hitting an
/// `Error` always means something actually went wrong, not that content was
/// merely absent.
#[derive(Error, Debug)]
pub enum Error {
    /// Network operation failed.
    ///
    /// Covers connection failures, timeouts, and TLS problems while talking to
    /// the remote block store. The underlying `reqwest::Error` is preserved.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote store answered with a non-success status.
    ///
    /// The status code and the store's own message (when one could be read
    /// from the body) are kept so callers can log something actionable.
    #[error("Remote API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the store.
        status: u16,
        /// Error message from the response body, or the raw body if it was
        /// not in the expected shape.
        message: String,
    },

    /// A wire payload could not be deserialized.
    ///
    /// Malformed *property* shapes inside an otherwise well-formed page never
    /// produce this error; the property projector degrades those to defaults.
    /// This variant means the response envelope itself was not understood.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Engine configuration is invalid (e.g. empty collection id, malformed
    /// base URL).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A `Result` alias using the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if the error might succeed on retry (transient network
    /// conditions, 5xx or 429 from the store). No retries happen inside this
    /// crate; the hint is for callers.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::Serialization(_) | Self::Config(_) => false,
        }
    }

    /// Stable category label for logging and metrics.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Api { .. } => "api",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
        }
    }
}
