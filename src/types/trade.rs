//! Trade type - 체결 내역

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderSide;
use crate::utils::time::ms_to_iso8601;

/// 수수료
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    /// 수수료 금액
    pub cost: Decimal,
    /// 수수료 화폐
    pub currency: String,
    /// 수수료율
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
}

impl Fee {
    pub fn new(cost: Decimal, currency: impl Into<String>) -> Self {
        Self {
            cost,
            currency: currency.into(),
            rate: None,
        }
    }
}

/// 테이커/메이커 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakerOrMaker {
    Taker,
    Maker,
}

/// 체결 내역
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// 체결 ID
    pub id: String,
    /// 주문 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    /// 타임스탬프 (밀리초)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    pub symbol: String,
    /// 매수/매도
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<OrderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker_or_maker: Option<TakerOrMaker>,
    /// 체결 가격
    pub price: Decimal,
    /// 체결 수량
    pub amount: Decimal,
    /// 체결 금액 (price * amount)
    pub cost: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<Fee>,
    /// 원본 응답
    #[serde(default)]
    pub info: serde_json::Value,
}

impl Trade {
    /// 새 체결 생성. 금액은 `price * amount`로 계산
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        price: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            order: None,
            timestamp: None,
            datetime: None,
            symbol: symbol.into(),
            side: None,
            taker_or_maker: None,
            price,
            amount,
            cost: price * amount,
            fee: None,
            info: serde_json::Value::Null,
        }
    }

    pub fn with_timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self.datetime = Some(ms_to_iso8601(ts));
        self
    }

    pub fn with_side(mut self, side: OrderSide) -> Self {
        self.side = Some(side);
        self
    }
}
