//! Token Exchange Error Types
//!
//! Error hierarchy for RFC 8693 token exchange operations.

use std::time::Duration;
use thiserror::Error;

/// Root error type for token exchange.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The subject token supplier failed; its error is carried unchanged.
    #[error("Subject token unavailable")]
    SubjectTokenUnavailable(#[source] Box<ExchangeError>),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to read response body: {message}")]
    ResponseRead { message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] ProtocolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl ExchangeError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "TOKEN_EXCHANGE_CONFIG",
            Self::SubjectTokenUnavailable(_) => "TOKEN_EXCHANGE_SUBJECT_TOKEN",
            Self::Transport(_) => "TOKEN_EXCHANGE_TRANSPORT",
            Self::ResponseRead { .. } => "TOKEN_EXCHANGE_RESPONSE_READ",
            Self::MalformedResponse(_) => "TOKEN_EXCHANGE_MALFORMED_RESPONSE",
            Self::Provider(_) => "TOKEN_EXCHANGE_PROVIDER",
        }
    }

    /// Check if a caller-side retry could plausibly succeed.
    ///
    /// Nothing in this crate retries on its own; this is a hint for callers
    /// that implement their own policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::ResponseRead { .. } => true,
            Self::SubjectTokenUnavailable(inner) => inner.is_retryable(),
            Self::Provider(ProviderError::ServerError { .. }) => true,
            Self::Provider(ProviderError::TemporarilyUnavailable { .. }) => true,
            _ => false,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to create HTTP client: {message}")]
    HttpClient { message: String },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("Request cancelled")]
    Cancelled,
}

impl TransportError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },
}

/// Error reported by the security token service.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid client credentials (HTTP {status})")]
    InvalidClient {
        status: u16,
        error_description: Option<String>,
    },

    #[error("Invalid grant: {message}")]
    InvalidGrant { status: u16, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("Invalid scope: {scope}")]
    InvalidScope { status: u16, scope: String },

    /// RFC 8693 Section 2.2.2: the requested audience or resource is unacceptable.
    #[error("Invalid target: {message}")]
    InvalidTarget { status: u16, message: String },

    #[error("Unauthorized client for this grant type (HTTP {status})")]
    UnauthorizedClient {
        status: u16,
        error_description: Option<String>,
    },

    #[error("Unsupported grant type (HTTP {status})")]
    UnsupportedGrantType { status: u16 },

    #[error("Server error: {message}")]
    ServerError { status: u16, message: String },

    #[error("Server temporarily unavailable (HTTP {status})")]
    TemporarilyUnavailable { status: u16 },
}

impl ProviderError {
    /// HTTP status the error response arrived with.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidClient { status, .. }
            | Self::InvalidGrant { status, .. }
            | Self::InvalidRequest { status, .. }
            | Self::InvalidScope { status, .. }
            | Self::InvalidTarget { status, .. }
            | Self::UnauthorizedClient { status, .. }
            | Self::UnsupportedGrantType { status }
            | Self::ServerError { status, .. }
            | Self::TemporarilyUnavailable { status } => *status,
        }
    }
}

/// Result type for token exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// OAuth2 error response body (RFC 6749 Section 5.2).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Parse an OAuth2 error response from an HTTP body.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Map an OAuth2 error response to a provider error.
pub fn map_token_error(status: u16, response: &OAuth2ErrorResponse) -> ProviderError {
    let message = || {
        response
            .error_description
            .clone()
            .unwrap_or_else(|| response.error.clone())
    };

    match response.error.as_str() {
        "invalid_client" => ProviderError::InvalidClient {
            status,
            error_description: response.error_description.clone(),
        },
        "invalid_grant" => ProviderError::InvalidGrant {
            status,
            message: message(),
        },
        "invalid_scope" => ProviderError::InvalidScope {
            status,
            scope: response.error_description.clone().unwrap_or_default(),
        },
        "invalid_target" => ProviderError::InvalidTarget {
            status,
            message: message(),
        },
        "unauthorized_client" => ProviderError::UnauthorizedClient {
            status,
            error_description: response.error_description.clone(),
        },
        "unsupported_grant_type" => ProviderError::UnsupportedGrantType { status },
        "server_error" => ProviderError::ServerError {
            status,
            message: message(),
        },
        "temporarily_unavailable" => ProviderError::TemporarilyUnavailable { status },
        _ => ProviderError::InvalidRequest {
            status,
            message: message(),
        },
    }
}
