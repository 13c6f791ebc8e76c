//! Token Exchange Flows
//!
//! RFC 8693 token exchange: request shaping, execution and response decoding.

pub mod token_exchange;

pub use token_exchange::{build_exchange_request, decode_exchange_response, ExchangeTokenSource};
