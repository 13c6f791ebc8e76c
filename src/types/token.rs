//! Token Types
//!
//! Token exchange wire response and the access credential it produces.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Token exchange response from the security token service (RFC 8693 Section 2.2.1).
#[derive(Clone, Debug, Deserialize)]
pub struct ExchangeResponse {
    /// Issued token.
    pub access_token: String,
    /// Type of the issued token.
    #[serde(default)]
    pub issued_token_type: Option<String>,
    /// Token type (usually "Bearer" or "N_A").
    pub token_type: String,
    /// Lifetime in seconds, relative to the response.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Access credential, either produced by an exchange or supplied as a subject token.
#[derive(Clone)]
pub struct AccessCredential {
    value: SecretString,
    /// Token type.
    pub token_type: String,
    /// Expiration time. `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Type of the issued token, if the server reported one.
    pub issued_token_type: Option<String>,
    /// Granted scopes.
    pub scopes: Vec<String>,
}

impl AccessCredential {
    /// Create new access credential.
    pub fn new(
        value: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            value: SecretString::new(value.into()),
            token_type: token_type.into(),
            expires_at,
            issued_token_type: None,
            scopes: Vec::new(),
        }
    }

    /// Materialize a credential from an exchange response received at `received_at`.
    ///
    /// A missing `expires_in` counts as zero. Zero or negative lifetimes
    /// produce a credential that is already expired.
    pub fn from_response(response: ExchangeResponse, received_at: DateTime<Utc>) -> Self {
        let expires_in = response.expires_in.unwrap_or(0);
        // Saturate instead of panicking on lifetimes chrono cannot represent.
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| received_at.checked_add_signed(lifetime))
            .unwrap_or(if expires_in >= 0 {
                DateTime::<Utc>::MAX_UTC
            } else {
                DateTime::<Utc>::MIN_UTC
            });
        let scopes = response
            .scope
            .as_deref()
            .map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Self {
            value: SecretString::new(response.access_token),
            token_type: response.token_type,
            expires_at: Some(expires_at),
            issued_token_type: response.issued_token_type,
            scopes,
        }
    }

    /// Get token value (for Authorization header or as a subject token).
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Check if credential is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check if credential is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Check if credential is still usable at `now`, treating it as expired `delta` early.
    pub fn is_valid_at(&self, now: DateTime<Utc>, delta: Duration) -> bool {
        self.expires_at
            .map(|exp| match now.checked_add_signed(delta) {
                Some(deadline) => deadline < exp,
                // Out of range: only a negative delta keeps the credential usable.
                None => delta < Duration::zero(),
            })
            .unwrap_or(true)
    }

    /// Get time until expiration.
    pub fn expires_in(&self) -> Option<std::time::Duration> {
        self.expires_at.and_then(|exp| {
            let now = Utc::now();
            if exp > now {
                (exp - now).to_std().ok()
            } else {
                None
            }
        })
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.value.expose_secret())
    }
}

impl std::fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredential")
            .field("value", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("issued_token_type", &self.issued_token_type)
            .field("scopes", &self.scopes)
            .finish()
    }
}
