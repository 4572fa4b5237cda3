//! OHLCV type - 캔들 데이터

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV 캔들 데이터
///
/// CCXT와 동일하게 `[timestamp, open, high, low, close, volume]` 배열로 직렬화된다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OHLCV(pub i64, pub Decimal, pub Decimal, pub Decimal, pub Decimal, pub Decimal);

impl OHLCV {
    /// 새 OHLCV 생성
    pub fn new(
        timestamp: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self(timestamp, open, high, low, close, volume)
    }

    pub fn timestamp(&self) -> i64 {
        self.0
    }

    pub fn close(&self) -> Decimal {
        self.4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_array() {
        let candle = OHLCV::new(
            1_700_000_000_000,
            Decimal::new(1, 0),
            Decimal::new(3, 0),
            Decimal::new(1, 0),
            Decimal::new(2, 0),
            Decimal::new(10, 0),
        );
        let value = serde_json::to_value(&candle).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 6);
        assert_eq!(candle.close(), Decimal::new(2, 0));
    }
}
