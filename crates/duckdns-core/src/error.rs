//! Error types for the DuckDNS updater
//!
//! Resolution and publish failures have their own taxonomies so the
//! orchestrator can tell configuration mistakes (fail fast) from transient
//! faults (retry).

use thiserror::Error;

use crate::config::ResolutionMode;

/// Result type alias for DuckDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to determine the current IPv4 address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Every IP-check endpoint was unreachable or returned garbage
    #[error("Failed to retrieve public IP from all {attempted} available services")]
    AllResolutionServicesFailed {
        /// Number of endpoints that were tried
        attempted: usize,
    },

    /// No non-loopback, non-link-local IPv4 interface address
    #[error("No suitable local IPv4 address found")]
    NoSuitableLocalAddress,

    /// Fixed mode value is not a dotted-quad IPv4 address
    #[error("Invalid IPv4 address: {0}")]
    InvalidFixedAddress(String),

    /// Hostname resolved, but without any IPv4 record
    #[error("No IPv4 address found for hostname: {0}")]
    NoAddressForHostname(String),

    /// Fixed or Host mode was selected without a value
    #[error("{0} resolution requires a value, but none was given")]
    EmptyValue(ResolutionMode),

    /// Mode name is unknown or no strategy is registered for it
    #[error("Unsupported resolution mode: {0}")]
    UnsupportedResolutionMode(String),

    /// DNS lookup or interface enumeration failed
    #[error("Lookup of {target} failed: {reason}")]
    LookupFailed {
        /// What was being looked up
        target: String,
        /// Underlying failure
        reason: String,
    },
}

impl ResolutionError {
    /// Whether another attempt could succeed without a configuration change
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidFixedAddress(_) | Self::EmptyValue(_) | Self::UnsupportedResolutionMode(_)
        )
    }
}

/// Known failure bodies returned by the DuckDNS update endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// `KO`: the provider did not accept the domain/token pair
    Ko,
    /// `BAD`: the request itself was malformed
    Bad,
    /// Anything else
    Unexpected,
}

impl RejectReason {
    /// Classify a trimmed response body (case-insensitive)
    pub fn classify(body: &str) -> Self {
        let body = body.trim();
        if body.eq_ignore_ascii_case("ko") {
            Self::Ko
        } else if body.eq_ignore_ascii_case("bad") {
            Self::Bad
        } else {
            Self::Unexpected
        }
    }

    /// Human-readable hint for the log feed
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Ko => "Invalid domain or token",
            Self::Bad => "Bad request format",
            Self::Unexpected => "Unexpected response",
        }
    }
}

/// Failure to publish a new IP to the DNS provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Connection, TLS, timeout or body read failure
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-2xx status
    #[error("HTTP error {status}: {reason}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase
        reason: String,
    },

    /// Provider answered 2xx, but the body was not `OK`
    #[error("Provider rejected update with '{body}' ({})", .reason.hint())]
    Rejected {
        /// Classified failure code
        reason: RejectReason,
        /// Trimmed response body, verbatim
        body: String,
    },

    /// Request could not be built (blank subdomain/token, bad base URL)
    #[error("Invalid update request: {0}")]
    InvalidRequest(String),
}

impl PublishError {
    /// Whether another attempt could succeed without a configuration change
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }
}

/// Core error type for the DuckDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// IP resolution errors
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// DNS provider errors
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// File system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Whether the orchestrator may retry after this error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Resolution(e) => e.is_retryable(),
            Self::Publish(e) => e.is_retryable(),
            Self::Config(_) => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_not_retryable() {
        assert!(!ResolutionError::InvalidFixedAddress("x".into()).is_retryable());
        assert!(!ResolutionError::EmptyValue(ResolutionMode::Host).is_retryable());
        assert!(!ResolutionError::UnsupportedResolutionMode("carrier-pigeon".into()).is_retryable());
        assert!(!PublishError::InvalidRequest("blank token".into()).is_retryable());
        assert!(!Error::config("bad").is_retryable());
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(ResolutionError::AllResolutionServicesFailed { attempted: 4 }.is_retryable());
        assert!(ResolutionError::NoSuitableLocalAddress.is_retryable());
        assert!(ResolutionError::NoAddressForHostname("home.example".into()).is_retryable());
        assert!(PublishError::Network("timed out".into()).is_retryable());
        assert!(Error::from(PublishError::Rejected {
            reason: RejectReason::Ko,
            body: "KO".into(),
        })
        .is_retryable());
    }

    #[test]
    fn test_reject_reason_classification() {
        assert_eq!(RejectReason::classify("KO"), RejectReason::Ko);
        assert_eq!(RejectReason::classify(" ko\n"), RejectReason::Ko);
        assert_eq!(RejectReason::classify("Bad"), RejectReason::Bad);
        assert_eq!(RejectReason::classify("nope"), RejectReason::Unexpected);
        assert_eq!(RejectReason::Ko.hint(), "Invalid domain or token");
    }

    #[test]
    fn test_rejected_message_carries_body_and_hint() {
        let err = PublishError::Rejected {
            reason: RejectReason::Bad,
            body: "BAD".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'BAD'"));
        assert!(msg.contains("Bad request format"));
    }
}
