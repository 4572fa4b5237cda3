//! CCXT Playground: interactive explorer for unified exchange endpoints
//!
//! 통합 거래소 클라이언트(`exchanges`)와 그 위에서 동작하는 대화형 탐색기(`playground`)

pub mod client;
pub mod errors;
pub mod exchanges;
pub mod playground;
pub mod types;
pub mod utils;

// Re-exports
pub use client::{ExchangeConfig, HttpClient, RateLimiter};
pub use errors::{CcxtError, CcxtResult};
pub use types::{Exchange, ExchangeId};
