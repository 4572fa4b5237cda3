//! Unified endpoint table
//!
//! 호출 가능한 통합 메서드와 각 메서드가 받는 인자 목록.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// 인자 종류 (해석 및 강제 변환 규칙 결정)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// 마켓 심볼 (예: BTC/IDR)
    Symbol,
    /// 쉼표로 구분된 심볼 목록
    Symbols,
    /// 개수 제한
    Limit,
    /// 밀리초 타임스탬프 또는 "now"
    Since,
    Timeframe,
    /// 불리언 플래그
    Flag,
    /// 주문 ID, 통화 코드 등 원문 그대로 전달되는 문자열
    Text,
    Side,
    OrderType,
    /// 수량, 가격
    Number,
}

/// 엔드포인트 인자 정의
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
    }
}

const NO_PARAMS: &[ParamSpec] = &[];
const RELOAD: &[ParamSpec] = &[optional("reload", ParamKind::Flag)];
const SYMBOL: &[ParamSpec] = &[required("symbol", ParamKind::Symbol)];
const SYMBOLS: &[ParamSpec] = &[optional("symbols", ParamKind::Symbols)];
const SYMBOL_LIMIT: &[ParamSpec] = &[
    required("symbol", ParamKind::Symbol),
    optional("limit", ParamKind::Limit),
];
const SYMBOL_SINCE_LIMIT: &[ParamSpec] = &[
    required("symbol", ParamKind::Symbol),
    optional("since", ParamKind::Since),
    optional("limit", ParamKind::Limit),
];
const OHLCV: &[ParamSpec] = &[
    required("symbol", ParamKind::Symbol),
    optional("timeframe", ParamKind::Timeframe),
    optional("since", ParamKind::Since),
    optional("limit", ParamKind::Limit),
];
const ORDER_ID: &[ParamSpec] = &[
    required("id", ParamKind::Text),
    optional("symbol", ParamKind::Symbol),
];
const ORDER_HISTORY: &[ParamSpec] = &[
    optional("symbol", ParamKind::Symbol),
    optional("since", ParamKind::Since),
    optional("limit", ParamKind::Limit),
];
const CREATE_ORDER: &[ParamSpec] = &[
    required("symbol", ParamKind::Symbol),
    required("type", ParamKind::OrderType),
    required("side", ParamKind::Side),
    required("amount", ParamKind::Number),
    optional("price", ParamKind::Number),
];
const TRANSFERS: &[ParamSpec] = &[
    optional("code", ParamKind::Text),
    optional("since", ParamKind::Since),
    optional("limit", ParamKind::Limit),
];
const CURRENCY: &[ParamSpec] = &[required("code", ParamKind::Text)];

/// 통합 엔드포인트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    LoadMarkets,
    FetchMarkets,
    FetchTime,
    FetchStatus,
    FetchTicker,
    FetchTickers,
    FetchOrderBook,
    FetchTrades,
    FetchOhlcv,
    FetchBalance,
    FetchOrder,
    FetchOpenOrders,
    FetchClosedOrders,
    FetchMyTrades,
    CreateOrder,
    CancelOrder,
    FetchDeposits,
    FetchWithdrawals,
    FetchDepositAddress,
}

impl Endpoint {
    pub const ALL: [Endpoint; 19] = [
        Endpoint::LoadMarkets,
        Endpoint::FetchMarkets,
        Endpoint::FetchTime,
        Endpoint::FetchStatus,
        Endpoint::FetchTicker,
        Endpoint::FetchTickers,
        Endpoint::FetchOrderBook,
        Endpoint::FetchTrades,
        Endpoint::FetchOhlcv,
        Endpoint::FetchBalance,
        Endpoint::FetchOrder,
        Endpoint::FetchOpenOrders,
        Endpoint::FetchClosedOrders,
        Endpoint::FetchMyTrades,
        Endpoint::CreateOrder,
        Endpoint::CancelOrder,
        Endpoint::FetchDeposits,
        Endpoint::FetchWithdrawals,
        Endpoint::FetchDepositAddress,
    ];

    /// snake_case 메서드명
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::LoadMarkets => "load_markets",
            Endpoint::FetchMarkets => "fetch_markets",
            Endpoint::FetchTime => "fetch_time",
            Endpoint::FetchStatus => "fetch_status",
            Endpoint::FetchTicker => "fetch_ticker",
            Endpoint::FetchTickers => "fetch_tickers",
            Endpoint::FetchOrderBook => "fetch_order_book",
            Endpoint::FetchTrades => "fetch_trades",
            Endpoint::FetchOhlcv => "fetch_ohlcv",
            Endpoint::FetchBalance => "fetch_balance",
            Endpoint::FetchOrder => "fetch_order",
            Endpoint::FetchOpenOrders => "fetch_open_orders",
            Endpoint::FetchClosedOrders => "fetch_closed_orders",
            Endpoint::FetchMyTrades => "fetch_my_trades",
            Endpoint::CreateOrder => "create_order",
            Endpoint::CancelOrder => "cancel_order",
            Endpoint::FetchDeposits => "fetch_deposits",
            Endpoint::FetchWithdrawals => "fetch_withdrawals",
            Endpoint::FetchDepositAddress => "fetch_deposit_address",
        }
    }

    /// `has()` 테이블 키 (camelCase). 마켓 로딩은 fetchMarkets로 판단
    pub fn capability_key(&self) -> &'static str {
        match self {
            Endpoint::LoadMarkets | Endpoint::FetchMarkets => "fetchMarkets",
            Endpoint::FetchTime => "fetchTime",
            Endpoint::FetchStatus => "fetchStatus",
            Endpoint::FetchTicker => "fetchTicker",
            Endpoint::FetchTickers => "fetchTickers",
            Endpoint::FetchOrderBook => "fetchOrderBook",
            Endpoint::FetchTrades => "fetchTrades",
            Endpoint::FetchOhlcv => "fetchOHLCV",
            Endpoint::FetchBalance => "fetchBalance",
            Endpoint::FetchOrder => "fetchOrder",
            Endpoint::FetchOpenOrders => "fetchOpenOrders",
            Endpoint::FetchClosedOrders => "fetchClosedOrders",
            Endpoint::FetchMyTrades => "fetchMyTrades",
            Endpoint::CreateOrder => "createOrder",
            Endpoint::CancelOrder => "cancelOrder",
            Endpoint::FetchDeposits => "fetchDeposits",
            Endpoint::FetchWithdrawals => "fetchWithdrawals",
            Endpoint::FetchDepositAddress => "fetchDepositAddress",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Endpoint::LoadMarkets => "Load and cache all markets",
            Endpoint::FetchMarkets => "Fetch all markets traded on the exchange",
            Endpoint::FetchTime => "Fetch the exchange server time in milliseconds",
            Endpoint::FetchStatus => "Fetch exchange operational status",
            Endpoint::FetchTicker => "Fetch 24h price statistics for one symbol",
            Endpoint::FetchTickers => "Fetch price statistics for many symbols",
            Endpoint::FetchOrderBook => "Fetch bids and asks for a symbol",
            Endpoint::FetchTrades => "Fetch recent public trades for a symbol",
            Endpoint::FetchOhlcv => "Fetch candlesticks for a symbol",
            Endpoint::FetchBalance => "Fetch account balances (requires API key)",
            Endpoint::FetchOrder => "Fetch a single order by id (requires API key)",
            Endpoint::FetchOpenOrders => "Fetch open orders (requires API key)",
            Endpoint::FetchClosedOrders => "Fetch closed orders (requires API key)",
            Endpoint::FetchMyTrades => "Fetch your trade history (requires API key)",
            Endpoint::CreateOrder => "Place a new order (requires API key)",
            Endpoint::CancelOrder => "Cancel an open order (requires API key)",
            Endpoint::FetchDeposits => "Fetch deposit history (requires API key)",
            Endpoint::FetchWithdrawals => "Fetch withdrawal history (requires API key)",
            Endpoint::FetchDepositAddress => "Fetch a deposit address (requires API key)",
        }
    }

    /// 인자 목록 (호출 순서)
    pub fn params(&self) -> &'static [ParamSpec] {
        match self {
            Endpoint::LoadMarkets => RELOAD,
            Endpoint::FetchMarkets
            | Endpoint::FetchTime
            | Endpoint::FetchStatus
            | Endpoint::FetchBalance => NO_PARAMS,
            Endpoint::FetchTicker => SYMBOL,
            Endpoint::FetchTickers => SYMBOLS,
            Endpoint::FetchOrderBook => SYMBOL_LIMIT,
            Endpoint::FetchTrades => SYMBOL_SINCE_LIMIT,
            Endpoint::FetchOhlcv => OHLCV,
            Endpoint::FetchOrder | Endpoint::CancelOrder => ORDER_ID,
            Endpoint::FetchOpenOrders | Endpoint::FetchClosedOrders | Endpoint::FetchMyTrades => {
                ORDER_HISTORY
            }
            Endpoint::CreateOrder => CREATE_ORDER,
            Endpoint::FetchDeposits | Endpoint::FetchWithdrawals => TRANSFERS,
            Endpoint::FetchDepositAddress => CURRENCY,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 알 수 없는 엔드포인트 이름
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEndpoint(pub String);

impl fmt::Display for UnknownEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown endpoint: {}", self.0)
    }
}

impl std::error::Error for UnknownEndpoint {}

impl FromStr for Endpoint {
    type Err = UnknownEndpoint;

    /// snake_case(`fetch_ticker`)와 camelCase(`fetchTicker`) 모두 허용
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Endpoint::ALL
            .into_iter()
            .find(|e| {
                e.name().eq_ignore_ascii_case(wanted)
                    || e.name().replace('_', "").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownEndpoint(wanted.to_string()))
    }
}
