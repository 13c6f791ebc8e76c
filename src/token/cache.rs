//! Caching Token Provider
//!
//! Reuses a credential until it expires, then asks the inner provider for a
//! new one.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ExchangeError;
use crate::token::TokenProvider;
use crate::types::AccessCredential;

/// A token provider that caches credentials from an underlying provider.
///
/// Expiry is checked lazily on each call; there are no background timers.
/// The cache lock is held while the inner provider runs, so concurrent
/// callers that miss the cache wait for a single in-flight exchange and
/// then share its result. A failed exchange leaves the cache untouched.
///
/// # Example
///
/// ```no_run
/// use token_exchange_integration::{CachingTokenProvider, StaticTokenProvider, TokenProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cached = CachingTokenProvider::new(StaticTokenProvider::new("token"));
///
/// // First call asks the inner provider, later calls reuse the result.
/// let credential = cached.token().await?;
/// let credential = cached.token().await?;
/// # Ok(())
/// # }
/// ```
pub struct CachingTokenProvider<P: TokenProvider> {
    inner: P,
    cache: Mutex<Option<AccessCredential>>,
    expiry_delta: ChronoDuration,
}

impl<P: TokenProvider> CachingTokenProvider<P> {
    /// Create a new caching provider with an empty cache.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(None),
            expiry_delta: ChronoDuration::zero(),
        }
    }

    /// Create a caching provider seeded with a credential.
    pub fn with_credential(inner: P, credential: AccessCredential) -> Self {
        Self {
            inner,
            cache: Mutex::new(Some(credential)),
            expiry_delta: ChronoDuration::zero(),
        }
    }

    /// Treat cached credentials as expired `delta` before their expiry.
    pub fn with_expiry_delta(mut self, delta: ChronoDuration) -> Self {
        self.expiry_delta = delta;
        self
    }

    /// Currently cached credential, valid or not, without triggering an exchange.
    pub async fn cached(&self) -> Option<AccessCredential> {
        self.cache.lock().await.clone()
    }

    /// Get the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: TokenProvider> TokenProvider for CachingTokenProvider<P> {
    async fn token(&self) -> Result<AccessCredential, ExchangeError> {
        let mut cache = self.cache.lock().await;

        if let Some(credential) = cache.as_ref() {
            if credential.is_valid_at(Utc::now(), self.expiry_delta) {
                debug!("Using cached credential");
                return Ok(credential.clone());
            }
            debug!(expires_at = ?credential.expires_at, "Cached credential expired");
        }

        let fresh = self.inner.token().await?;
        *cache = Some(fresh.clone());
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::token::MockTokenProvider;
    use std::sync::Arc;

    fn credential(token: &str, lifetime_secs: i64) -> AccessCredential {
        AccessCredential::new(
            token,
            "Bearer",
            Some(Utc::now() + ChronoDuration::seconds(lifetime_secs)),
        )
    }

    #[tokio::test]
    async fn test_valid_credential_is_reused() {
        let inner = MockTokenProvider::new();
        inner.queue_credential(credential("first", 3600));
        let cached = CachingTokenProvider::new(inner);

        assert_eq!(cached.token().await.unwrap().secret(), "first");
        assert_eq!(cached.token().await.unwrap().secret(), "first");
        assert_eq!(cached.inner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_credential_is_replaced() {
        let inner = MockTokenProvider::new();
        inner
            .queue_credential(credential("stale", 0))
            .queue_credential(credential("fresh", 3600));
        let cached = CachingTokenProvider::new(inner);

        assert_eq!(cached.token().await.unwrap().secret(), "stale");
        assert_eq!(cached.token().await.unwrap().secret(), "fresh");
        assert_eq!(cached.token().await.unwrap().secret(), "fresh");
        assert_eq!(cached.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let inner = MockTokenProvider::new();
        inner.queue_error(
            TransportError::ConnectionFailed {
                message: "refused".to_string(),
            }
            .into(),
        );
        inner.queue_credential(credential("recovered", 3600));
        let cached = CachingTokenProvider::new(inner);

        let result = cached.token().await;
        assert!(matches!(result, Err(ExchangeError::Transport(_))));
        assert!(cached.cached().await.is_none());

        assert_eq!(cached.token().await.unwrap().secret(), "recovered");
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_expired_entry() {
        let inner = MockTokenProvider::new();
        inner.queue_error(TransportError::Cancelled.into());
        let cached = CachingTokenProvider::with_credential(inner, credential("old", -10));

        assert!(cached.token().await.is_err());
        assert_eq!(cached.cached().await.unwrap().secret(), "old");
    }

    #[tokio::test]
    async fn test_expiry_delta_refreshes_early() {
        let inner = MockTokenProvider::with_token("fresh");
        let cached = CachingTokenProvider::with_credential(inner, credential("soon", 5))
            .with_expiry_delta(ChronoDuration::seconds(10));

        assert_eq!(cached.token().await.unwrap().secret(), "fresh");
    }

    #[tokio::test]
    async fn test_huge_expiry_delta_always_refreshes() {
        let inner = MockTokenProvider::new();
        inner
            .queue_credential(credential("first", 3600))
            .queue_credential(credential("second", 3600));
        let cached = CachingTokenProvider::with_credential(inner, credential("cached", 3600))
            .with_expiry_delta(ChronoDuration::MAX);

        assert_eq!(cached.token().await.unwrap().secret(), "first");
        assert_eq!(cached.token().await.unwrap().secret(), "second");
        assert_eq!(cached.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_exchange() {
        let inner = MockTokenProvider::new();
        inner.queue_credential(credential("shared", 3600));
        let cached = Arc::new(CachingTokenProvider::new(inner));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cached = cached.clone();
                tokio::spawn(async move { cached.token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().secret(), "shared");
        }
        assert_eq!(cached.inner().call_count(), 1);
    }
}
