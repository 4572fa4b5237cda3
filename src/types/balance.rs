//! Balance type - 잔고 정보

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::time::{ms_to_iso8601, now_ms};

/// 단일 화폐 잔고
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// 사용 가능 잔고
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free: Option<Decimal>,
    /// 사용 중 잔고 (주문 등)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<Decimal>,
    /// 총 잔고
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
}

impl Balance {
    /// free/used로 생성. total은 합계
    pub fn new(free: Decimal, used: Decimal) -> Self {
        Self {
            free: Some(free),
            used: Some(used),
            total: Some(free + used),
        }
    }
}

/// 계정 잔고 (화폐별)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    /// 화폐별 잔고
    #[serde(flatten)]
    pub currencies: BTreeMap<String, Balance>,
    /// 원본 응답
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub info: serde_json::Value,
}

impl Balances {
    /// 현재 시각 기준 빈 잔고
    pub fn new() -> Self {
        let ts = now_ms();
        Self {
            timestamp: Some(ts),
            datetime: Some(ms_to_iso8601(ts)),
            ..Default::default()
        }
    }

    /// 잔고 추가
    pub fn add(&mut self, currency: impl Into<String>, balance: Balance) {
        self.currencies.insert(currency.into(), balance);
    }

    pub fn get(&self, currency: &str) -> Option<&Balance> {
        self.currencies.get(currency)
    }

    /// 잔고가 0보다 큰 화폐 목록
    pub fn non_zero_currencies(&self) -> Vec<&str> {
        self.currencies
            .iter()
            .filter(|(_, b)| b.total.is_some_and(|t| t > Decimal::ZERO))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balances_flatten_currencies() {
        let mut balances = Balances::new();
        balances.add("BTC", Balance::new(Decimal::new(1, 0), Decimal::new(2, 0)));
        balances.add("IDR", Balance::new(Decimal::ZERO, Decimal::ZERO));

        assert_eq!(balances.get("BTC").unwrap().total, Some(Decimal::new(3, 0)));
        assert_eq!(balances.non_zero_currencies(), vec!["BTC"]);

        let value = serde_json::to_value(&balances).unwrap();
        assert!(value.get("BTC").is_some());
        assert!(value.get("info").is_none());
    }
}
