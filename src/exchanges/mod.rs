//! Exchange Implementations
//!
//! 거래소별 구현체

mod market_cache;

pub mod binance;
pub mod indodax;
pub mod kraken;

pub use binance::Binance;
pub use indodax::Indodax;
pub use kraken::Kraken;

use crate::client::ExchangeConfig;
use crate::errors::CcxtResult;
use crate::types::{Exchange, ExchangeId};

/// 구현된 거래소 ID 목록 (정렬됨)
pub fn available_exchanges() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = ExchangeId::ALL.iter().map(|id| id.as_str()).collect();
    ids.sort_unstable();
    ids
}

/// 거래소 ID로 클라이언트 생성
pub fn create_exchange(id: ExchangeId, config: ExchangeConfig) -> CcxtResult<Box<dyn Exchange>> {
    Ok(match id {
        ExchangeId::Binance => Box::new(Binance::new(config)?),
        ExchangeId::Indodax => Box::new(Indodax::new(config)?),
        ExchangeId::Kraken => Box::new(Kraken::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_exchanges_sorted() {
        assert_eq!(available_exchanges(), vec!["binance", "indodax", "kraken"]);
    }

    #[test]
    fn test_create_every_exchange() {
        for id in ExchangeId::ALL {
            let exchange = create_exchange(id, ExchangeConfig::new()).unwrap();
            assert_eq!(exchange.id(), id);
            assert!(!exchange.has().is_empty());
        }
    }
}
