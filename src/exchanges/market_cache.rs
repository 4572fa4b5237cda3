//! Shared market cache for REST backends

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::Market;

/// 심볼/마켓 ID 양방향 캐시
#[derive(Debug, Default)]
pub(crate) struct MarketCache {
    by_symbol: RwLock<HashMap<String, Market>>,
    by_id: RwLock<HashMap<String, String>>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// 캐시 전체 교체
    pub fn replace(&self, markets: Vec<Market>) {
        let mut by_symbol = self.by_symbol.write().unwrap_or_else(|e| e.into_inner());
        let mut by_id = self.by_id.write().unwrap_or_else(|e| e.into_inner());
        by_symbol.clear();
        by_id.clear();
        for market in markets {
            by_id.insert(market.id.clone(), market.symbol.clone());
            by_symbol.insert(market.symbol.clone(), market);
        }
    }

    pub fn snapshot(&self) -> HashMap<String, Market> {
        self.by_symbol
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn get(&self, symbol: &str) -> Option<Market> {
        self.by_symbol
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(symbol)
            .cloned()
    }

    /// 거래소 마켓 ID로 통합 심볼 조회
    pub fn symbol_for_id(&self, market_id: &str) -> Option<String> {
        self.by_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(market_id)
            .cloned()
    }

    /// 정렬된 심볼 목록
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .by_symbol
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        symbols.sort();
        symbols
    }
}
