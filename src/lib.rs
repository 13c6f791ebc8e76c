//! Token Exchange Integration Module
//!
//! OAuth 2.0 Token Exchange (RFC 8693) client: trades a subject token from
//! one security domain for an access token issued by a security token
//! service (STS) for another.
//!
//! # Features
//!
//! - Form-encoded token exchange requests (RFC 8693 Section 2.1)
//! - Client authentication via HTTP Basic or request body (RFC 6749 Section 2.3.1)
//! - Token exchange response decoding with local expiry computation
//! - OAuth error responses surfaced with the STS reason (RFC 6749 Section 5.2)
//! - Expiry-aware credential caching with single in-flight exchange
//! - Chaining: every token source is itself a subject token supplier
//! - Cancellation and deadlines through an explicit execution context
//!
//! # Example
//!
//! ```rust,ignore
//! use token_exchange_integration::{
//!     exchange_config, token_types, StaticTokenProvider, TokenExchangeClient, TokenProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = exchange_config()
//!         .token_url("https://sts.example.com/token")
//!         .subject_token_type(token_types::JWT)
//!         .client_id("my-client-id")
//!         .client_secret("my-client-secret")
//!         .audience("payments-api")
//!         .build()?;
//!
//!     let client = TokenExchangeClient::new(config)?;
//!     let source = client.token_source(StaticTokenProvider::new("eyJhbGciOi..."));
//!
//!     // Exchanges once, then reuses the credential until it expires.
//!     let credential = source.token().await?;
//!     println!("Authorization: {}", credential.authorization_header());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, wire response and credential types
//! - `error`: error hierarchy and OAuth error mapping
//! - `core`: HTTP transport and execution context
//! - `flows`: the token exchange request builder, executor and decoder
//! - `token`: the token provider capability and the caching wrapper
//! - `builders`: fluent configuration builder and environment loader
//! - `client`: high-level client combining all of the above

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod token;
pub mod types;

// Re-export main client
pub use client::TokenExchangeClient;

// Re-export builders
pub use builders::{exchange_config, ExchangeConfigBuilder};

// Re-export errors
pub use error::{
    map_token_error, parse_error_response, ConfigurationError, ExchangeError, ExchangeResult,
    OAuth2ErrorResponse, ProtocolError, ProviderError, TransportError,
};

// Re-export types
pub use types::{
    token_types, AccessCredential, ClientAuthMethod, ExchangeConfig, ExchangeResponse,
    GRANT_TYPE_TOKEN_EXCHANGE,
};

// Re-export core components
pub use crate::core::{
    ExchangeContext, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
};

// Re-export flows
pub use flows::{build_exchange_request, decode_exchange_response, ExchangeTokenSource};

// Re-export token providers
pub use token::{CachingTokenProvider, MockTokenProvider, StaticTokenProvider, TokenProvider};

// Cancellation tokens accepted by `ExchangeContext`
pub use tokio_util::sync::CancellationToken;
