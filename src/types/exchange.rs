//! Exchange trait and related types

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::{
    Balances, DepositAddress, Market, OHLCV, Order, OrderBook, OrderSide, OrderType, Ticker,
    Trade, Transaction,
};
use crate::errors::{CcxtError, CcxtResult};

/// 지원 거래소 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Binance,
    Indodax,
    Kraken,
}

impl ExchangeId {
    /// 모든 거래소 (알파벳 순)
    pub const ALL: [ExchangeId; 3] = [ExchangeId::Binance, ExchangeId::Indodax, ExchangeId::Kraken];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Binance => "binance",
            ExchangeId::Indodax => "indodax",
            ExchangeId::Kraken => "kraken",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = CcxtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ExchangeId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| CcxtError::BadRequest {
                message: format!("Unknown exchange: {}", s.trim()),
            })
    }
}

/// 캔들 타임프레임
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 8] = [
        Timeframe::Minute1,
        Timeframe::Minute5,
        Timeframe::Minute15,
        Timeframe::Minute30,
        Timeframe::Hour1,
        Timeframe::Hour4,
        Timeframe::Day1,
        Timeframe::Week1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1w",
        }
    }

    /// 밀리초 단위 길이
    pub fn to_millis(&self) -> i64 {
        self.to_minutes() * 60 * 1000
    }

    /// 분 단위 길이
    pub fn to_minutes(&self) -> i64 {
        match self {
            Timeframe::Minute1 => 1,
            Timeframe::Minute5 => 5,
            Timeframe::Minute15 => 15,
            Timeframe::Minute30 => 30,
            Timeframe::Hour1 => 60,
            Timeframe::Hour4 => 240,
            Timeframe::Day1 => 1440,
            Timeframe::Week1 => 10080,
        }
    }
}

impl FromStr for Timeframe {
    type Err = CcxtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == s.trim())
            .ok_or_else(|| CcxtError::BadRequest {
                message: format!("Unsupported timeframe: {s}"),
            })
    }
}

/// 기능 지원 상태
///
/// CCXT `has` 테이블과 같이 `true` / `false` / `"emulated"`로 직렬화된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    Supported,
    Emulated,
    #[default]
    NotSupported,
}

impl Capability {
    /// 호출 가능 여부 (네이티브 또는 에뮬레이션)
    pub fn is_available(&self) -> bool {
        !matches!(self, Capability::NotSupported)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Capability::Supported => "Supported",
            Capability::Emulated => "Emulated",
            Capability::NotSupported => "Not Supported",
        }
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Capability::Supported => serializer.serialize_bool(true),
            Capability::Emulated => serializer.serialize_str("emulated"),
            Capability::NotSupported => serializer.serialize_bool(false),
        }
    }
}

/// 거래소 지원 기능 테이블 (camelCase 메서드명 -> 지원 상태)
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ExchangeFeatures {
    entries: BTreeMap<String, Capability>,
}

impl ExchangeFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// 네이티브 지원 기능 등록
    pub fn supported(mut self, names: &[&str]) -> Self {
        for name in names {
            self.entries.insert(name.to_string(), Capability::Supported);
        }
        self
    }

    /// 에뮬레이션 기능 등록
    pub fn emulated(mut self, names: &[&str]) -> Self {
        for name in names {
            self.entries.insert(name.to_string(), Capability::Emulated);
        }
        self
    }

    /// 기능 지원 상태. 미등록 기능은 NotSupported
    pub fn get(&self, name: &str) -> Capability {
        self.entries.get(name).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Capability)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 거래소 URL 정보
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeUrls {
    pub api: String,
    pub www: String,
    pub doc: String,
}

/// 거래소 상태
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeStatus {
    /// "ok" 또는 "maintenance"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<i64>,
    #[serde(default)]
    pub info: serde_json::Value,
}

fn not_supported<T>(feature: &str) -> CcxtResult<T> {
    Err(CcxtError::NotSupported {
        feature: feature.into(),
    })
}

/// 거래소 통합 인터페이스
///
/// 구현체는 메타데이터와 `has()` 테이블, 마켓 로딩만 필수로 제공하고
/// 나머지 메서드는 지원하는 것만 재정의한다.
#[async_trait]
pub trait Exchange: Send + Sync {
    // === 메타데이터 ===

    /// 거래소 ID
    fn id(&self) -> ExchangeId;

    /// 거래소 이름
    fn name(&self) -> &str;

    /// API 버전
    fn version(&self) -> &str {
        "v1"
    }

    /// 레이트 리밋 (밀리초)
    fn rate_limit(&self) -> u64 {
        1000
    }

    /// 샌드박스 모드 여부
    fn is_sandbox(&self) -> bool {
        false
    }

    /// 지원 기능
    fn has(&self) -> &ExchangeFeatures;

    /// URL 정보
    fn urls(&self) -> &ExchangeUrls;

    /// 로드된 마켓 심볼 (정렬됨). 마켓 로드 전에는 빈 목록
    fn symbols(&self) -> Vec<String>;

    // === Public API ===

    /// 마켓 로드 (캐싱)
    async fn load_markets(&self, reload: bool) -> CcxtResult<HashMap<String, Market>>;

    /// 마켓 목록 조회
    async fn fetch_markets(&self) -> CcxtResult<Vec<Market>>;

    /// 서버 시간
    async fn fetch_time(&self) -> CcxtResult<i64> {
        not_supported("fetchTime")
    }

    /// 거래소 상태
    async fn fetch_status(&self) -> CcxtResult<ExchangeStatus> {
        not_supported("fetchStatus")
    }

    /// 시세 조회
    async fn fetch_ticker(&self, symbol: &str) -> CcxtResult<Ticker> {
        let _ = symbol;
        not_supported("fetchTicker")
    }

    /// 전체 시세 조회
    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> CcxtResult<HashMap<String, Ticker>> {
        let _ = symbols;
        not_supported("fetchTickers")
    }

    /// 호가창 조회
    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> CcxtResult<OrderBook> {
        let _ = (symbol, limit);
        not_supported("fetchOrderBook")
    }

    /// 최근 체결 조회
    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Trade>> {
        let _ = (symbol, since, limit);
        not_supported("fetchTrades")
    }

    /// 캔들 조회
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<OHLCV>> {
        let _ = (symbol, timeframe, since, limit);
        not_supported("fetchOHLCV")
    }

    // === Private API ===

    /// 잔고 조회
    async fn fetch_balance(&self) -> CcxtResult<Balances> {
        not_supported("fetchBalance")
    }

    /// 주문 생성
    async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
    ) -> CcxtResult<Order> {
        let _ = (symbol, order_type, side, amount, price);
        not_supported("createOrder")
    }

    /// 주문 취소
    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> CcxtResult<Order> {
        let _ = (id, symbol);
        not_supported("cancelOrder")
    }

    /// 주문 조회
    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> CcxtResult<Order> {
        let _ = (id, symbol);
        not_supported("fetchOrder")
    }

    /// 미체결 주문 조회
    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Order>> {
        let _ = (symbol, since, limit);
        not_supported("fetchOpenOrders")
    }

    /// 완료 주문 조회
    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Order>> {
        let _ = (symbol, since, limit);
        not_supported("fetchClosedOrders")
    }

    /// 내 체결 내역 조회
    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Trade>> {
        let _ = (symbol, since, limit);
        not_supported("fetchMyTrades")
    }

    /// 입금 내역 조회
    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        let _ = (code, since, limit);
        not_supported("fetchDeposits")
    }

    /// 출금 내역 조회
    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        let _ = (code, since, limit);
        not_supported("fetchWithdrawals")
    }

    /// 입금 주소 조회
    async fn fetch_deposit_address(&self, code: &str) -> CcxtResult<DepositAddress> {
        let _ = code;
        not_supported("fetchDepositAddress")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe() {
        assert_eq!(Timeframe::Minute1.as_str(), "1m");
        assert_eq!(Timeframe::Hour1.to_millis(), 3_600_000);
        assert_eq!("1d".parse::<Timeframe>().unwrap(), Timeframe::Day1);
        assert!("7m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_exchange_id() {
        assert_eq!(ExchangeId::Indodax.as_str(), "indodax");
        assert_eq!(format!("{}", ExchangeId::Kraken), "kraken");
        assert_eq!(" Binance ".parse::<ExchangeId>().unwrap(), ExchangeId::Binance);
        assert!("mtgox".parse::<ExchangeId>().is_err());
    }

    #[test]
    fn test_features_serialize_like_has_table() {
        let has = ExchangeFeatures::new()
            .supported(&["fetchTicker"])
            .emulated(&["fetchStatus"]);

        assert_eq!(has.get("fetchTicker"), Capability::Supported);
        assert_eq!(has.get("watchTicker"), Capability::NotSupported);
        assert!(has.get("fetchStatus").is_available());

        let value = serde_json::to_value(&has).unwrap();
        assert_eq!(value["fetchTicker"], true);
        assert_eq!(value["fetchStatus"], "emulated");
    }
}
