//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for O8
///
/// Every provider-scoped variant carries the provider label so callers can
/// tell which backend failed inside a federated operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic provider failure (wire or parse)
    #[error("provider '{provider}' error: {message}")]
    Provider {
        /// Label of the failing provider
        provider: String,
        /// Description of the failure
        message: String,
        /// HTTP status code when the failure came off the wire
        status: Option<u16>,
    },

    /// Provider deadline exceeded
    #[error("provider '{provider}' timed out: {message}")]
    Timeout {
        /// Label of the failing provider
        provider: String,
        /// Description of the timed-out operation
        message: String,
    },

    /// Provider failed to initialize or exhausted its retries
    #[error("provider '{provider}' unavailable: {message}")]
    Unavailable {
        /// Label of the failing provider
        provider: String,
        /// Description of the failure
        message: String,
    },

    /// Resource absent at the provider
    #[error("not found in '{provider}': {resource}")]
    NotFound {
        /// Label of the provider that was queried
        provider: String,
        /// The resource that was not found
        resource: String,
    },

    /// Authentication rejected (401/403)
    #[error("provider '{provider}' authentication failed: {message}")]
    AuthFailed {
        /// Label of the failing provider
        provider: String,
        /// Description of the failure
        message: String,
    },

    /// Rate limit hit, either a 429 or an empty local bucket
    #[error("provider '{provider}' rate limited, retry after {retry_after_ms}ms")]
    RateLimit {
        /// Label of the rate-limited provider
        provider: String,
        /// Milliseconds until a request can be admitted again
        retry_after_ms: u64,
    },

    /// Malformed resource URI
    #[error("invalid URI: {message}")]
    InvalidUri {
        /// Description of the grammar violation
        message: String,
    },

    /// Registry dispatch to a label that was never registered
    #[error("unknown provider: {label}")]
    UnknownProvider {
        /// The unrecognized provider label
        label: String,
    },

    /// Registration under a label that is already taken
    #[error("provider already registered: {label}")]
    AlreadyRegistered {
        /// The duplicate provider label
        label: String,
    },

    /// Configuration-related error
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },
}

// Provider-scoped error creation methods
impl Error {
    /// Create a generic provider error
    pub fn provider<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a provider error carrying an HTTP status
    pub fn provider_status<P: Into<String>, S: Into<String>>(
        provider: P,
        message: S,
        status: u16,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a timeout error
    pub fn timeout<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::Timeout {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<P: Into<String>, S: Into<String>>(provider: P, resource: S) -> Self {
        Self::NotFound {
            provider: provider.into(),
            resource: resource.into(),
        }
    }

    /// Create an authentication error
    pub fn auth_failed<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::AuthFailed {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit<P: Into<String>>(provider: P, retry_after_ms: u64) -> Self {
        Self::RateLimit {
            provider: provider.into(),
            retry_after_ms,
        }
    }
}

// Input- and registry-level error creation methods
impl Error {
    /// Create an invalid URI error
    pub fn invalid_uri<S: Into<String>>(message: S) -> Self {
        Self::InvalidUri {
            message: message.into(),
        }
    }

    /// Create an unknown provider error
    pub fn unknown_provider<S: Into<String>>(label: S) -> Self {
        Self::UnknownProvider {
            label: label.into(),
        }
    }

    /// Create an already registered error
    pub fn already_registered<S: Into<String>>(label: S) -> Self {
        Self::AlreadyRegistered {
            label: label.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl Error {
    /// Wire discriminator for the caller-facing error surface
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Provider { .. } => "provider-error",
            Self::Timeout { .. } => "timeout",
            Self::Unavailable { .. } => "unavailable",
            Self::NotFound { .. } => "not-found",
            Self::AuthFailed { .. } => "auth-failed",
            Self::RateLimit { .. } => "rate-limit",
            Self::InvalidUri { .. } => "invalid-uri",
            Self::UnknownProvider { .. } => "unknown-provider",
            Self::AlreadyRegistered { .. } => "already-registered",
            Self::Config { .. } => "config-error",
            Self::Io { .. } => "io-error",
            Self::Json { .. } => "provider-error",
        }
    }

    /// Provider label attached to this error, when there is one
    pub fn provider_label(&self) -> Option<&str> {
        match self {
            Self::Provider { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Unavailable { provider, .. }
            | Self::NotFound { provider, .. }
            | Self::AuthFailed { provider, .. }
            | Self::RateLimit { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Milliseconds to wait before retrying, for rate-limit errors
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after_ms, .. } => Some(*retry_after_ms),
            _ => None,
        }
    }

    /// HTTP status attached to this error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            _ => None,
        }
    }

    /// True for failures worth retrying inside a provider
    ///
    /// NotFound and RateLimit never retry; auth and input errors are
    /// deterministic and retrying cannot help.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Unavailable { .. } => true,
            Self::Provider { status, .. } => matches!(status, None | Some(500..=599)),
            _ => false,
        }
    }
}
