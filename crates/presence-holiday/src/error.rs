//! Holiday lookup errors.
//!
//! None of these reach the compliance engine: the integration boundary
//! logs them and continues with an empty exclusion set.

use presence_core::PresenceError;

/// Errors from a holiday provider.
#[derive(Debug, thiserror::Error)]
pub enum HolidayError {
    /// Transport-level failure talking to a holiday API.
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        /// The URL that was requested.
        endpoint: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// The URL that was requested.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        body: String,
    },

    /// The response body did not match the expected schema.
    #[error("could not decode holiday response from {endpoint}: {reason}")]
    Decode {
        /// The URL that was requested.
        endpoint: String,
        /// Decoder diagnostic.
        reason: String,
    },

    /// No holiday table exists for this country.
    #[error("no holiday calendar for country code {0:?}")]
    UnknownCountry(String),

    /// A holiday date could not be normalized.
    #[error("invalid holiday date: {0}")]
    InvalidDate(#[from] PresenceError),

    /// Provider misconfiguration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
