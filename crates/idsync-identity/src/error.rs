//! Error types for identity provider API calls.

use thiserror::Error;

/// Result type alias for identity provider operations.
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Error types for management API calls to the identity provider.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// Network-level connectivity failure.
    #[error("network connection failed: {message}")]
    Network {
        /// Error message describing the network failure
        message: String,
    },

    /// HTTP request timeout exceeded.
    #[error("request timeout after {timeout_seconds}s")]
    Timeout {
        /// Number of seconds before the request timed out
        timeout_seconds: u64,
    },

    /// The management API returned a non-success status.
    #[error("identity provider returned HTTP {status_code}")]
    Api {
        /// HTTP status code returned by the provider
        status_code: u16,
    },

    /// Invalid client configuration.
    #[error("invalid identity client configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl IdentityError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates a configuration error from a message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_reports_status() {
        let err = IdentityError::Api { status_code: 422 };
        assert!(err.to_string().contains("422"));
    }

    #[test]
    fn constructor_helpers_build_expected_variants() {
        assert!(matches!(IdentityError::network("refused"), IdentityError::Network { .. }));
        assert!(matches!(IdentityError::timeout(30), IdentityError::Timeout { timeout_seconds: 30 }));
        assert!(matches!(
            IdentityError::configuration("bad url"),
            IdentityError::Configuration { .. }
        ));
    }
}
