//! Token Exchange Client
//!
//! High-level client combining configuration, execution context and the
//! caching token source.

use std::sync::Arc;

use crate::builders::ExchangeConfigBuilder;
use crate::core::{ExchangeContext, HttpTransport};
use crate::error::ExchangeError;
use crate::flows::ExchangeTokenSource;
use crate::token::{CachingTokenProvider, StaticTokenProvider, TokenProvider};
use crate::types::{AccessCredential, ExchangeConfig};

/// Token exchange client.
///
/// The transport is resolved from the context once, at construction, and
/// shared by every token source the client creates.
pub struct TokenExchangeClient {
    config: ExchangeConfig,
    context: ExchangeContext,
    transport: Arc<dyn HttpTransport>,
}

impl TokenExchangeClient {
    /// Create a client with the default transport.
    pub fn new(config: ExchangeConfig) -> Result<Self, ExchangeError> {
        Self::with_context(config, ExchangeContext::new())
    }

    /// Create a client whose collaborators come from `context`.
    pub fn with_context(
        config: ExchangeConfig,
        context: ExchangeContext,
    ) -> Result<Self, ExchangeError> {
        let transport = context.resolve_transport()?;
        Ok(Self {
            config,
            context,
            transport,
        })
    }

    /// Create a client from `TOKEN_EXCHANGE_*` environment variables.
    pub fn from_env() -> Result<Self, ExchangeError> {
        Self::new(ExchangeConfigBuilder::new().from_env().build()?)
    }

    /// Get the exchange configuration.
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Build an uncached token source over `subject`.
    pub fn exchange_source<P: TokenProvider>(&self, subject: P) -> ExchangeTokenSource<P> {
        ExchangeTokenSource::with_transport(
            self.config.clone(),
            subject,
            self.transport.clone(),
            self.context.clone(),
        )
    }

    /// Build a token source that exchanges `subject`'s tokens and reuses the
    /// result until it expires.
    pub fn token_source<P: TokenProvider>(
        &self,
        subject: P,
    ) -> CachingTokenProvider<ExchangeTokenSource<P>> {
        CachingTokenProvider::new(self.exchange_source(subject))
    }

    /// Exchange a single subject token, without caching.
    pub async fn exchange(&self, subject_token: &str) -> Result<AccessCredential, ExchangeError> {
        self.exchange_source(StaticTokenProvider::new(subject_token))
            .token()
            .await
    }
}

impl std::fmt::Debug for TokenExchangeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchangeClient")
            .field("config", &self.config)
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::exchange_config;
    use crate::core::MockHttpTransport;
    use crate::token::MockTokenProvider;
    use crate::types::token_types;

    fn client(transport: Arc<MockHttpTransport>) -> TokenExchangeClient {
        let config = exchange_config()
            .token_url("https://sts.example.com/token")
            .subject_token_type(token_types::JWT)
            .build()
            .unwrap();
        TokenExchangeClient::with_context(config, ExchangeContext::new().with_transport(transport))
            .unwrap()
    }

    fn token_body(token: &str, expires_in: i64) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "issued_token_type": token_types::ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": expires_in
        })
    }

    #[tokio::test]
    async fn test_one_shot_exchange() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &token_body("T", 3600));

        let credential = client(transport.clone()).exchange("abc").await.unwrap();
        assert_eq!(credential.secret(), "T");
        assert_eq!(
            credential.issued_token_type.as_deref(),
            Some(token_types::ACCESS_TOKEN)
        );
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_token_source_caches_within_window() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &token_body("T", 3600));

        let source = client(transport.clone()).token_source(MockTokenProvider::with_token("abc"));
        assert_eq!(source.token().await.unwrap().secret(), "T");
        assert_eq!(source.token().await.unwrap().secret(), "T");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_token_source_zero_lifetime_is_not_reused() {
        let transport = Arc::new(MockHttpTransport::new());
        transport
            .queue_json_response(200, &token_body("first", 0))
            .queue_json_response(200, &token_body("second", 3600));

        let source = client(transport.clone()).token_source(MockTokenProvider::with_token("abc"));
        assert_eq!(source.token().await.unwrap().secret(), "first");
        assert_eq!(source.token().await.unwrap().secret(), "second");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_response_does_not_touch_cache() {
        let transport = Arc::new(MockHttpTransport::new());
        transport
            .queue_json_response(200, &token_body("expired", 0))
            .queue_raw_response(200, "not-json");

        let source = client(transport.clone()).token_source(MockTokenProvider::with_token("abc"));
        source.token().await.unwrap();

        let result = source.token().await;
        assert!(matches!(result, Err(ExchangeError::MalformedResponse(_))));
        assert_eq!(source.cached().await.unwrap().secret(), "expired");
    }

    #[tokio::test]
    async fn test_chained_exchange() {
        let transport = Arc::new(MockHttpTransport::new());
        transport
            .queue_json_response(200, &token_body("domain-b", 3600))
            .queue_json_response(200, &token_body("domain-c", 3600));

        let client = client(transport.clone());
        let first_hop = client.token_source(StaticTokenProvider::new("domain-a"));
        let second_hop = client.token_source(first_hop);

        assert_eq!(second_hop.token().await.unwrap().secret(), "domain-c");

        let requests = transport.get_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0]
            .body
            .as_deref()
            .unwrap()
            .contains("subject_token=domain-a"));
        assert!(requests[1]
            .body
            .as_deref()
            .unwrap()
            .contains("subject_token=domain-b"));
    }
}
