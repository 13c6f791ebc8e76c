//! Token Management
//!
//! The token provider capability and the expiry-aware cache around it.

pub mod cache;
pub mod provider;

pub use cache::CachingTokenProvider;
pub use provider::{MockTokenProvider, StaticTokenProvider, TokenProvider};
