//! Token Provider
//!
//! The single capability shared by subject token suppliers, exchange
//! sources and caching wrappers. Anything implementing it can feed a further
//! exchange, which is how security domains are chained.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{ExchangeError, TransportError};
use crate::types::AccessCredential;

/// Token provider interface.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a credential.
    async fn token(&self) -> Result<AccessCredential, ExchangeError>;
}

#[async_trait]
impl<P: TokenProvider + ?Sized> TokenProvider for Arc<P> {
    async fn token(&self) -> Result<AccessCredential, ExchangeError> {
        (**self).token().await
    }
}

#[async_trait]
impl<P: TokenProvider + ?Sized> TokenProvider for Box<P> {
    async fn token(&self) -> Result<AccessCredential, ExchangeError> {
        (**self).token().await
    }
}

/// Provider that always returns the same credential.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    credential: AccessCredential,
}

impl StaticTokenProvider {
    /// Create a provider for a non-expiring bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            credential: AccessCredential::new(token, "Bearer", None),
        }
    }

    /// Create a provider for an existing credential.
    pub fn from_credential(credential: AccessCredential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<AccessCredential, ExchangeError> {
        Ok(self.credential.clone())
    }
}

/// Mock token provider for testing.
///
/// Queued outcomes are returned in order; afterwards the default token, if
/// any, is returned.
#[derive(Default)]
pub struct MockTokenProvider {
    outcomes: Mutex<VecDeque<Result<AccessCredential, ExchangeError>>>,
    default_token: Mutex<Option<String>>,
    call_count: Mutex<usize>,
}

impl MockTokenProvider {
    /// Create new mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider that always returns `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.set_default_token(token);
        provider
    }

    /// Set the token returned when the queue is empty.
    pub fn set_default_token(&self, token: impl Into<String>) -> &Self {
        *self.default_token.lock().unwrap() = Some(token.into());
        self
    }

    /// Queue a credential.
    pub fn queue_credential(&self, credential: AccessCredential) -> &Self {
        self.outcomes.lock().unwrap().push_back(Ok(credential));
        self
    }

    /// Queue an error.
    pub fn queue_error(&self, error: ExchangeError) -> &Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// Number of times `token` was called.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn token(&self) -> Result<AccessCredential, ExchangeError> {
        *self.call_count.lock().unwrap() += 1;

        let outcome = self.outcomes.lock().unwrap().pop_front();
        if let Some(outcome) = outcome {
            return outcome;
        }

        self.default_token
            .lock()
            .unwrap()
            .clone()
            .map(|token| AccessCredential::new(token, "Bearer", None))
            .ok_or_else(|| {
                TransportError::ConnectionFailed {
                    message: "No mock token available".to_string(),
                }
                .into()
            })
    }
}
