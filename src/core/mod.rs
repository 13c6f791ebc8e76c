//! Token Exchange Core Components
//!
//! Core infrastructure: HTTP transport and execution context.

pub mod context;
pub mod transport;

pub use context::*;
pub use transport::*;
