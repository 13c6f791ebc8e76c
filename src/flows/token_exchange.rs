//! Token Exchange Flow
//!
//! RFC 8693 Section 2 - Token Exchange Request and Response.

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::core::{ExchangeContext, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::{map_token_error, parse_error_response, ExchangeError, ProtocolError};
use crate::token::TokenProvider;
use crate::types::{
    AccessCredential, ClientAuthMethod, ExchangeConfig, ExchangeResponse,
    GRANT_TYPE_TOKEN_EXCHANGE,
};

/// Build the form-encoded token exchange request for `subject_token`.
pub fn build_exchange_request(config: &ExchangeConfig, subject_token: &str) -> HttpRequest {
    HttpRequest {
        method: HttpMethod::Post,
        url: config.token_url.clone(),
        headers: build_request_headers(config),
        body: Some(build_request_body(config, subject_token)),
        timeout: Some(config.timeout),
    }
}

fn build_request_body(config: &ExchangeConfig, subject_token: &str) -> String {
    let mut params = vec![
        ("grant_type", GRANT_TYPE_TOKEN_EXCHANGE.to_string()),
        ("subject_token", subject_token.to_string()),
        ("subject_token_type", config.subject_token_type.clone()),
    ];

    if let Some(resource) = &config.resource {
        params.push(("resource", resource.clone()));
    }
    if let Some(audience) = &config.audience {
        params.push(("audience", audience.clone()));
    }
    if !config.scopes.is_empty() {
        params.push(("scope", config.scopes.join(" ")));
    }
    if let Some(requested) = &config.requested_token_type {
        params.push(("requested_token_type", requested.clone()));
    }

    // Client credentials in body if using post method
    if config.auth_method == ClientAuthMethod::ClientSecretPost {
        if let Some(client_id) = &config.client_id {
            params.push(("client_id", client_id.clone()));
            if let Some(secret) = &config.client_secret {
                params.push(("client_secret", secret.expose_secret().to_string()));
            }
        }
    }

    params
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(&v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn build_request_headers(config: &ExchangeConfig) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert(
        "content-type".to_string(),
        "application/x-www-form-urlencoded".to_string(),
    );
    headers.insert("accept".to_string(), "application/json".to_string());

    if config.auth_method == ClientAuthMethod::ClientSecretBasic {
        if let Some(client_id) = &config.client_id {
            // RFC 6749 Section 2.3.1: both parts are form-encoded before base64.
            let secret = config
                .client_secret
                .as_ref()
                .map(|s| s.expose_secret().as_str())
                .unwrap_or("");
            let credentials = format!(
                "{}:{}",
                urlencoding::encode(client_id),
                urlencoding::encode(secret)
            );
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            headers.insert("authorization".to_string(), format!("Basic {}", encoded));
        }
    }

    headers
}

/// Decode a token exchange response into a credential.
///
/// A non-2xx response carrying a standard OAuth error object becomes a
/// provider error. Any other body is decoded as a token response
/// regardless of status.
pub fn decode_exchange_response(response: HttpResponse) -> Result<AccessCredential, ExchangeError> {
    if !response.is_success() {
        if let Some(error) = parse_error_response(&response.body) {
            return Err(map_token_error(response.status, &error).into());
        }
    }

    let decoded: ExchangeResponse =
        serde_json::from_str(&response.body).map_err(|e| ProtocolError::InvalidJson {
            message: e.to_string(),
        })?;

    Ok(AccessCredential::from_response(decoded, Utc::now()))
}

/// Token source that exchanges the subject provider's token at the STS on every call.
///
/// Wrap it in a [`crate::token::CachingTokenProvider`] to reuse credentials
/// until they expire.
pub struct ExchangeTokenSource<P: TokenProvider> {
    config: ExchangeConfig,
    subject: P,
    transport: Arc<dyn HttpTransport>,
    context: ExchangeContext,
}

impl<P: TokenProvider> ExchangeTokenSource<P> {
    /// Create a token source, resolving the transport from `context`.
    pub fn new(
        config: ExchangeConfig,
        subject: P,
        context: ExchangeContext,
    ) -> Result<Self, ExchangeError> {
        let transport = context.resolve_transport()?;
        Ok(Self::with_transport(config, subject, transport, context))
    }

    /// Create a token source with an already resolved transport.
    pub fn with_transport(
        config: ExchangeConfig,
        subject: P,
        transport: Arc<dyn HttpTransport>,
        context: ExchangeContext,
    ) -> Self {
        Self {
            config,
            subject,
            transport,
            context,
        }
    }

    /// Get the exchange configuration.
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    #[instrument(
        name = "token_exchange",
        skip(self),
        fields(token_url = %self.config.token_url, subject_token_type = %self.config.subject_token_type)
    )]
    async fn exchange(&self) -> Result<AccessCredential, ExchangeError> {
        let subject = self
            .subject
            .token()
            .await
            .map_err(|e| ExchangeError::SubjectTokenUnavailable(Box::new(e)))?;

        let request = build_exchange_request(&self.config, subject.secret());
        let response = self.context.run(self.transport.send(request)).await?;
        debug!(status = response.status, "Received token exchange response");

        let credential = decode_exchange_response(response)?;
        debug!(
            expires_at = ?credential.expires_at,
            issued_token_type = ?credential.issued_token_type,
            "Token exchange succeeded"
        );
        Ok(credential)
    }
}

#[async_trait]
impl<P: TokenProvider> TokenProvider for ExchangeTokenSource<P> {
    async fn token(&self) -> Result<AccessCredential, ExchangeError> {
        self.exchange().await.map_err(|e| {
            warn!(error_code = e.error_code(), error = %e, "Token exchange failed");
            e
        })
    }
}
