//! Unified data types

mod balance;
mod exchange;
mod market;
mod ohlcv;
mod order;
mod orderbook;
mod ticker;
mod trade;
mod transaction;

pub use balance::{Balance, Balances};
pub use exchange::{
    Capability, Exchange, ExchangeFeatures, ExchangeId, ExchangeStatus, ExchangeUrls, Timeframe,
};
pub use market::{Market, MarketLimits, MarketPrecision, MarketType, MinMax};
pub use ohlcv::OHLCV;
pub use order::{Order, OrderSide, OrderStatus, OrderType};
pub use orderbook::{OrderBook, OrderBookEntry};
pub use ticker::Ticker;
pub use trade::{Fee, TakerOrMaker, Trade};
pub use transaction::{DepositAddress, Transaction, TransactionStatus, TransactionType};
