//! Market type - 거래소 마켓 정보

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 마켓 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    #[default]
    Spot,
    Margin,
    Swap,
    Future,
}

/// 마켓 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    /// 거래소 내부 ID (예: 'btcidr')
    pub id: String,
    /// 통합 심볼 (예: 'BTC/IDR')
    pub symbol: String,
    /// 기준 화폐 (예: 'BTC')
    pub base: String,
    /// 견적 화폐 (예: 'IDR')
    pub quote: String,
    /// 거래소 기준 화폐 ID
    pub base_id: String,
    /// 거래소 견적 화폐 ID
    pub quote_id: String,
    /// 마켓 타입
    #[serde(rename = "type")]
    pub market_type: MarketType,
    /// 활성 상태
    pub active: bool,
    /// 테이커 수수료
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker: Option<Decimal>,
    /// 메이커 수수료
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maker: Option<Decimal>,
    /// 정밀도
    pub precision: MarketPrecision,
    /// 거래 제한
    pub limits: MarketLimits,
    /// 원본 응답
    #[serde(default)]
    pub info: serde_json::Value,
}

impl Market {
    /// 현물 마켓 생성
    pub fn spot(id: impl Into<String>, base_id: &str, quote_id: &str) -> Self {
        let base = base_id.to_uppercase();
        let quote = quote_id.to_uppercase();
        Self {
            id: id.into(),
            symbol: format!("{base}/{quote}"),
            base,
            quote,
            base_id: base_id.to_string(),
            quote_id: quote_id.to_string(),
            market_type: MarketType::Spot,
            active: true,
            taker: None,
            maker: None,
            precision: MarketPrecision::default(),
            limits: MarketLimits::default(),
            info: serde_json::Value::Null,
        }
    }
}

/// 마켓 정밀도
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketPrecision {
    /// 수량 정밀도
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i32>,
    /// 가격 정밀도
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i32>,
}

/// 거래 제한
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketLimits {
    #[serde(default)]
    pub amount: MinMax,
    #[serde(default)]
    pub price: MinMax,
    #[serde(default)]
    pub cost: MinMax,
}

/// 최소/최대 값
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinMax {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_market_symbol() {
        let market = Market::spot("btcidr", "btc", "idr");
        assert_eq!(market.symbol, "BTC/IDR");
        assert_eq!(market.base_id, "btc");
        assert_eq!(market.market_type, MarketType::Spot);
    }
}
