//! Configuration Builder
//!
//! Fluent builder for token exchange configuration.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{ConfigurationError, ExchangeError};
use crate::types::{ClientAuthMethod, ExchangeConfig};

/// Environment variable holding the STS token endpoint.
pub const ENV_TOKEN_URL: &str = "TOKEN_EXCHANGE_TOKEN_URL";
/// Environment variable holding the subject token type URI.
pub const ENV_SUBJECT_TOKEN_TYPE: &str = "TOKEN_EXCHANGE_SUBJECT_TOKEN_TYPE";
/// Environment variable holding the client ID.
pub const ENV_CLIENT_ID: &str = "TOKEN_EXCHANGE_CLIENT_ID";
/// Environment variable holding the client secret.
pub const ENV_CLIENT_SECRET: &str = "TOKEN_EXCHANGE_CLIENT_SECRET";
/// Environment variable holding the audience.
pub const ENV_AUDIENCE: &str = "TOKEN_EXCHANGE_AUDIENCE";
/// Environment variable holding space-separated scopes.
pub const ENV_SCOPE: &str = "TOKEN_EXCHANGE_SCOPE";

/// Token exchange configuration builder.
#[derive(Default)]
pub struct ExchangeConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    auth_method: Option<ClientAuthMethod>,
    subject_token_type: Option<String>,
    token_url: Option<String>,
    audience: Option<String>,
    resource: Option<String>,
    scopes: Vec<String>,
    requested_token_type: Option<String>,
    timeout: Duration,
}

impl ExchangeConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            ..Default::default()
        }
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set client authentication method.
    pub fn auth_method(mut self, method: ClientAuthMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    /// Set subject token type URI.
    pub fn subject_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.subject_token_type = Some(token_type.into());
        self
    }

    /// Set STS token endpoint.
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Set audience.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set resource.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Add a requested scope.
    pub fn add_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Set requested scopes.
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set requested token type.
    pub fn requested_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.requested_token_type = Some(token_type.into());
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fill unset fields from `TOKEN_EXCHANGE_*` environment variables.
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.token_url.is_none() {
            self.token_url = lookup(ENV_TOKEN_URL);
        }
        if self.subject_token_type.is_none() {
            self.subject_token_type = lookup(ENV_SUBJECT_TOKEN_TYPE);
        }
        if self.client_id.is_none() {
            self.client_id = lookup(ENV_CLIENT_ID);
        }
        if self.client_secret.is_none() {
            self.client_secret = lookup(ENV_CLIENT_SECRET).map(SecretString::new);
        }
        if self.audience.is_none() {
            self.audience = lookup(ENV_AUDIENCE);
        }
        if self.scopes.is_empty() {
            if let Some(scope) = lookup(ENV_SCOPE) {
                self.scopes = scope.split_whitespace().map(String::from).collect();
            }
        }
        self
    }

    /// Build the token exchange configuration.
    pub fn build(self) -> Result<ExchangeConfig, ExchangeError> {
        let token_url = self.token_url.ok_or_else(|| ConfigurationError::MissingField {
            field: "token_url".to_string(),
        })?;

        let parsed = Url::parse(&token_url).map_err(|_| ConfigurationError::InvalidEndpoint {
            url: token_url.clone(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidEndpoint { url: token_url }.into());
        }

        let subject_token_type = self
            .subject_token_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ConfigurationError::MissingField {
                field: "subject_token_type".to_string(),
            })?;

        if self.client_secret.is_some() && self.client_id.is_none() {
            return Err(ConfigurationError::InvalidConfig {
                message: "client_secret requires client_id".to_string(),
            }
            .into());
        }

        if self.timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(ExchangeConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            auth_method: self.auth_method.unwrap_or_default(),
            subject_token_type,
            token_url,
            audience: self.audience,
            resource: self.resource,
            scopes: self.scopes,
            requested_token_type: self.requested_token_type,
            timeout: self.timeout,
        })
    }
}

/// Create a new configuration builder.
pub fn exchange_config() -> ExchangeConfigBuilder {
    ExchangeConfigBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::token_types;
    use std::collections::HashMap;

    #[test]
    fn test_build_minimal_config() {
        let config = exchange_config()
            .token_url("https://sts.example.com/token")
            .subject_token_type(token_types::JWT)
            .build()
            .unwrap();

        assert_eq!(config.token_url, "https://sts.example.com/token");
        assert_eq!(config.subject_token_type, token_types::JWT);
        assert!(config.client_id.is_none());
        assert_eq!(config.auth_method, ClientAuthMethod::ClientSecretBasic);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.has_client_auth());
    }

    #[test]
    fn test_missing_token_url() {
        let result = exchange_config().subject_token_type(token_types::JWT).build();
        assert!(matches!(
            result,
            Err(ExchangeError::Configuration(ConfigurationError::MissingField { ref field }))
                if field == "token_url"
        ));
    }

    #[test]
    fn test_missing_subject_token_type() {
        let result = exchange_config()
            .token_url("https://sts.example.com/token")
            .build();
        assert!(matches!(
            result,
            Err(ExchangeError::Configuration(ConfigurationError::MissingField { ref field }))
                if field == "subject_token_type"
        ));
    }

    #[test]
    fn test_rejects_relative_and_non_http_urls() {
        for url in ["/token", "ftp://sts.example.com/token"] {
            let result = exchange_config()
                .token_url(url)
                .subject_token_type(token_types::JWT)
                .build();
            assert!(matches!(
                result,
                Err(ExchangeError::Configuration(ConfigurationError::InvalidEndpoint { .. }))
            ));
        }
    }

    #[test]
    fn test_secret_without_client_id() {
        let result = exchange_config()
            .token_url("https://sts.example.com/token")
            .subject_token_type(token_types::JWT)
            .client_secret("secret")
            .build();
        assert!(matches!(
            result,
            Err(ExchangeError::Configuration(ConfigurationError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn test_from_lookup_fills_unset_fields() {
        let env: HashMap<&str, &str> = [
            (ENV_TOKEN_URL, "https://env.example.com/token"),
            (ENV_SUBJECT_TOKEN_TYPE, token_types::ID_TOKEN),
            (ENV_CLIENT_ID, "env-client"),
            (ENV_SCOPE, "read  write"),
            (ENV_AUDIENCE, ""),
        ]
        .into_iter()
        .collect();

        let config = exchange_config()
            .client_id("explicit-client")
            .from_lookup(|key| env.get(key).map(|v| v.to_string()))
            .build()
            .unwrap();

        assert_eq!(config.token_url, "https://env.example.com/token");
        assert_eq!(config.subject_token_type, token_types::ID_TOKEN);
        assert_eq!(config.client_id.as_deref(), Some("explicit-client"));
        assert_eq!(config.scopes, vec!["read", "write"]);
        assert!(config.audience.is_none());
    }
}
