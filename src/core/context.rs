//! Execution Context
//!
//! Per-source collaborators resolved at call time: the HTTP transport,
//! cancellation and an overall deadline for the exchange request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::{ExchangeError, TransportError};

/// Execution context for token exchange requests.
///
/// When no transport is supplied a [`ReqwestHttpTransport`] is created on
/// resolution.
#[derive(Clone, Default)]
pub struct ExchangeContext {
    transport: Option<Arc<dyn HttpTransport>>,
    cancellation: Option<CancellationToken>,
    deadline: Option<Duration>,
}

impl ExchangeContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this transport instead of the default client.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Abort in-flight requests when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Abort in-flight requests that take longer than `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The configured cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// The configured deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Resolve the transport, falling back to a default reqwest client.
    pub fn resolve_transport(&self) -> Result<Arc<dyn HttpTransport>, ExchangeError> {
        match &self.transport {
            Some(transport) => Ok(transport.clone()),
            None => Ok(Arc::new(ReqwestHttpTransport::new()?)),
        }
    }

    /// Drive `future` under this context's cancellation token and deadline.
    ///
    /// The future is dropped when either fires.
    pub async fn run<F, T>(&self, future: F) -> Result<T, ExchangeError>
    where
        F: Future<Output = Result<T, ExchangeError>>,
    {
        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout(deadline, future).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout { timeout: deadline }.into()),
                },
                None => future.await,
            }
        };

        match &self.cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(TransportError::Cancelled.into()),
                result = bounded => result,
            },
            None => bounded.await,
        }
    }
}

impl std::fmt::Debug for ExchangeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeContext")
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("cancellation", &self.cancellation)
            .field("deadline", &self.deadline)
            .finish()
    }
}
