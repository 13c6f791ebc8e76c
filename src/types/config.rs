//! Configuration Types
//!
//! Token exchange client configuration types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// RFC 8693 grant type identifying the token exchange flow.
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// Token type identifiers from RFC 8693 Section 3.
pub mod token_types {
    /// OAuth 2.0 access token.
    pub const ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";
    /// OAuth 2.0 refresh token.
    pub const REFRESH_TOKEN: &str = "urn:ietf:params:oauth:token-type:refresh_token";
    /// OpenID Connect ID token.
    pub const ID_TOKEN: &str = "urn:ietf:params:oauth:token-type:id_token";
    /// SAML 1.1 assertion.
    pub const SAML1: &str = "urn:ietf:params:oauth:token-type:saml1";
    /// SAML 2.0 assertion.
    pub const SAML2: &str = "urn:ietf:params:oauth:token-type:saml2";
    /// JSON Web Token.
    pub const JWT: &str = "urn:ietf:params:oauth:token-type:jwt";
}

/// Token exchange configuration.
///
/// Immutable once built; see [`crate::builders::ExchangeConfigBuilder`].
#[derive(Clone)]
pub struct ExchangeConfig {
    /// Client identifier. Optional.
    pub client_id: Option<String>,
    /// Client secret, paired with `client_id`. Optional.
    pub client_secret: Option<SecretString>,
    /// How client credentials are attached to the request.
    pub auth_method: ClientAuthMethod,
    /// URI identifying the format of the subject token.
    pub subject_token_type: String,
    /// Security token service token endpoint.
    pub token_url: String,
    /// Logical name of the target service.
    pub audience: Option<String>,
    /// URI of the target resource.
    pub resource: Option<String>,
    /// Scopes requested for the issued token.
    pub scopes: Vec<String>,
    /// Token type the client wants issued.
    pub requested_token_type: Option<String>,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl ExchangeConfig {
    /// Whether any client authentication will be attached.
    pub fn has_client_auth(&self) -> bool {
        self.client_id.is_some() && self.auth_method != ClientAuthMethod::None
    }
}

impl std::fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_method", &self.auth_method)
            .field("subject_token_type", &self.subject_token_type)
            .field("token_url", &self.token_url)
            .field("audience", &self.audience)
            .field("resource", &self.resource)
            .field("scopes", &self.scopes)
            .field("requested_token_type", &self.requested_token_type)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Client authentication method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// client_id and client_secret in request body.
    ClientSecretPost,
    /// HTTP Basic Authentication header.
    #[default]
    ClientSecretBasic,
    /// No client authentication.
    None,
}
