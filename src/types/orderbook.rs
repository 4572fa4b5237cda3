//! OrderBook type - 호가창

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 호가창
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    /// 심볼
    #[serde(default)]
    pub symbol: String,
    /// 타임스탬프 (밀리초)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timestamp: Option<i64>,
    /// ISO 8601 datetime
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub datetime: Option<String>,
    /// 매수호가 (가격순 내림차순)
    #[serde(default)]
    pub bids: Vec<OrderBookEntry>,
    /// 매도호가 (가격순 오름차순)
    #[serde(default)]
    pub asks: Vec<OrderBookEntry>,
    /// 호가 시퀀스 번호
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nonce: Option<i64>,
}

/// 호가 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    /// 가격
    pub price: Decimal,
    /// 수량
    pub amount: Decimal,
}

impl OrderBookEntry {
    /// `[price, amount, ...]` 배열에서 생성
    pub fn from_pair(raw: &[Decimal]) -> Option<Self> {
        match raw {
            [price, amount, ..] => Some(Self {
                price: *price,
                amount: *amount,
            }),
            _ => None,
        }
    }
}

impl OrderBook {
    /// 원시 호가 배열에서 생성. `limit`이 있으면 각 측면을 잘라낸다
    pub fn from_levels(
        symbol: impl Into<String>,
        bids: &[Vec<Decimal>],
        asks: &[Vec<Decimal>],
        limit: Option<u32>,
    ) -> Self {
        let take = limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let side = |levels: &[Vec<Decimal>]| -> Vec<OrderBookEntry> {
            levels
                .iter()
                .filter_map(|l| OrderBookEntry::from_pair(l))
                .take(take)
                .collect()
        };
        Self {
            symbol: symbol.into(),
            bids: side(bids),
            asks: side(asks),
            ..Default::default()
        }
    }

    /// 최고 매수호가
    pub fn best_bid(&self) -> Option<&OrderBookEntry> {
        self.bids.first()
    }

    /// 최저 매도호가
    pub fn best_ask(&self) -> Option<&OrderBookEntry> {
        self.asks.first()
    }
}
