//! Binance Spot Exchange Implementation
//!
//! Binance REST API v3 (spot) + SAPI wallet endpoints

use async_trait::async_trait;
use chrono::NaiveDateTime;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::collections::HashMap;
use tracing::debug;

use super::market_cache::MarketCache;
use crate::client::{build_query, ExchangeConfig, HttpClient, RateLimiter};
use crate::errors::{CcxtError, CcxtResult};
use crate::types::{
    Balance, Balances, DepositAddress, Exchange, ExchangeFeatures, ExchangeId, ExchangeStatus,
    ExchangeUrls, Fee, Market, Order, OrderBook, OrderSide, OrderStatus, OrderType,
    TakerOrMaker, Ticker, Timeframe, Trade, Transaction, TransactionStatus, TransactionType,
    OHLCV,
};
use crate::utils::{ms_to_iso8601, now_ms, value_to_decimal};

type HmacSha256 = Hmac<Sha256>;

/// Binance 거래소
pub struct Binance {
    config: ExchangeConfig,
    client: HttpClient,
    rate_limiter: RateLimiter,
    markets: MarketCache,
    features: ExchangeFeatures,
    urls: ExchangeUrls,
}

impl Binance {
    const BASE_URL: &'static str = "https://api.binance.com";
    const TESTNET_URL: &'static str = "https://testnet.binance.vision";
    const RATE_LIMIT_MS: u64 = 50; // 1200 requests per minute
    const RECV_WINDOW: &'static str = "5000";

    /// 새 Binance 인스턴스 생성
    pub fn new(config: ExchangeConfig) -> CcxtResult<Self> {
        let base_url = if config.is_sandbox() {
            Self::TESTNET_URL
        } else {
            Self::BASE_URL
        };
        let client = HttpClient::new(base_url, &config)?;
        let rate_limiter =
            RateLimiter::new(config.rate_limit_ms().unwrap_or(Self::RATE_LIMIT_MS));

        let features = ExchangeFeatures::new().supported(&[
            "spot",
            "fetchMarkets",
            "fetchTime",
            "fetchStatus",
            "fetchTicker",
            "fetchTickers",
            "fetchOrderBook",
            "fetchTrades",
            "fetchOHLCV",
            "fetchBalance",
            "createOrder",
            "cancelOrder",
            "fetchOrder",
            "fetchOpenOrders",
            "fetchClosedOrders",
            "fetchMyTrades",
            "fetchDeposits",
            "fetchWithdrawals",
            "fetchDepositAddress",
        ]);

        let urls = ExchangeUrls {
            api: base_url.into(),
            www: "https://www.binance.com".into(),
            doc: "https://developers.binance.com/docs/binance-spot-api-docs".into(),
        };

        Ok(Self {
            config,
            client,
            rate_limiter,
            markets: MarketCache::new(),
            features,
            urls,
        })
    }

    /// 공개 API 호출
    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<HashMap<String, String>>,
    ) -> CcxtResult<T> {
        self.rate_limiter.throttle(1.0).await;
        self.client
            .get(path, params, None)
            .await
            .map_err(Self::refine_error)
    }

    /// 비공개 API 호출 (timestamp + HMAC-SHA256 서명)
    async fn private_request<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        mut params: HashMap<String, String>,
    ) -> CcxtResult<T> {
        let api_key = self.config.api_key().ok_or_else(|| CcxtError::AuthenticationError {
            message: format!("{path} requires apiKey credential"),
        })?;
        let secret = self.config.secret().ok_or_else(|| CcxtError::AuthenticationError {
            message: format!("{path} requires secret credential"),
        })?;

        self.rate_limiter.throttle(1.0).await;

        params.insert("timestamp".into(), now_ms().to_string());
        params.insert("recvWindow".into(), Self::RECV_WINDOW.into());
        let query = build_query(&params);
        let signed = format!("{query}&signature={}", Self::sign(secret, &query)?);

        let mut headers = HashMap::new();
        headers.insert("X-MBX-APIKEY".into(), api_key.to_string());

        debug!(method, path, "binance private request");
        let result = match method {
            "GET" => {
                self.client
                    .get(&format!("{path}?{signed}"), None, Some(headers))
                    .await
            }
            "POST" => {
                headers.insert(
                    "Content-Type".into(),
                    "application/x-www-form-urlencoded".into(),
                );
                self.client.post_body(path, signed, Some(headers)).await
            }
            "DELETE" => {
                self.client
                    .delete(&format!("{path}?{signed}"), Some(headers))
                    .await
            }
            _ => Err(CcxtError::NotSupported {
                feature: format!("HTTP method: {method}"),
            }),
        };
        result.map_err(Self::refine_error)
    }

    fn sign(secret: &str, query: &str) -> CcxtResult<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
            CcxtError::AuthenticationError {
                message: "Invalid secret key".into(),
            }
        })?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Binance 오류 코드(`{"code":-1121,"msg":"..."}`)를 세부 오류로 변환
    fn refine_error(err: CcxtError) -> CcxtError {
        let CcxtError::ExchangeError { message } = &err else {
            return err;
        };
        let Some(body) = message.split_once(": ").map(|(_, body)| body) else {
            return err;
        };
        let Ok(payload) = serde_json::from_str::<Value>(body) else {
            return err;
        };
        let code = payload.get("code").and_then(Value::as_i64).unwrap_or(0);
        let msg = payload
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match code {
            -1003 => CcxtError::RateLimitExceeded {
                message: msg,
                retry_after_ms: None,
            },
            -1021 => CcxtError::InvalidNonce { message: msg },
            -1100 | -1102 | -1104 | -1106 => CcxtError::BadRequest { message: msg },
            -1121 => CcxtError::BadSymbol { symbol: msg },
            -2010 if msg.to_lowercase().contains("insufficient") => {
                CcxtError::InsufficientFunds { message: msg }
            }
            -2010 => CcxtError::InvalidOrder { message: msg },
            -2011 | -2013 => CcxtError::OrderNotFound { order_id: msg },
            -2014 | -2015 => CcxtError::AuthenticationError { message: msg },
            _ => err,
        }
    }

    async fn market(&self, symbol: &str) -> CcxtResult<Market> {
        self.load_markets(false).await?;
        self.markets.get(symbol).ok_or_else(|| CcxtError::BadSymbol {
            symbol: symbol.to_string(),
        })
    }

    fn symbol_for(&self, market_id: &str) -> String {
        self.markets
            .symbol_for_id(market_id)
            .unwrap_or_else(|| market_id.to_string())
    }

    fn interval(timeframe: Timeframe) -> &'static str {
        // Binance uses the unified notation as-is
        timeframe.as_str()
    }

    fn parse_ticker(data: &BinanceTicker, symbol: &str) -> Ticker {
        let mut ticker = Ticker::new(symbol).with_timestamp(data.close_time.unwrap_or_else(now_ms));
        ticker.high = data.high_price;
        ticker.low = data.low_price;
        ticker.bid = data.bid_price;
        ticker.bid_volume = data.bid_qty;
        ticker.ask = data.ask_price;
        ticker.ask_volume = data.ask_qty;
        ticker.vwap = data.weighted_avg_price;
        ticker.open = data.open_price;
        ticker.close = data.last_price;
        ticker.last = data.last_price;
        ticker.change = data.price_change;
        ticker.percentage = data.price_change_percent;
        ticker.base_volume = data.volume;
        ticker.quote_volume = data.quote_volume;
        ticker.info = serde_json::to_value(data).unwrap_or_default();
        ticker
    }

    fn parse_order(data: &BinanceOrder, symbol: &str) -> Order {
        let status = match data.status.as_str() {
            "FILLED" => OrderStatus::Closed,
            "CANCELED" | "PENDING_CANCEL" => OrderStatus::Canceled,
            "REJECTED" => OrderStatus::Rejected,
            "EXPIRED" | "EXPIRED_IN_MATCH" => OrderStatus::Expired,
            _ => OrderStatus::Open,
        };
        let order_type = data.order_type.parse().unwrap_or(OrderType::Limit);
        let side = data.side.parse().unwrap_or(OrderSide::Buy);
        let price = data.price.filter(|p| !p.is_zero());

        let mut order = Order::new(data.order_id.to_string(), symbol, order_type, side, data.orig_qty)
            .with_price(price)
            .with_status(status)
            .with_filled(data.executed_qty);
        if let Some(ts) = data.time.or(data.transact_time) {
            order = order.with_timestamp(ts);
        }
        order.client_order_id = data.client_order_id.clone();
        order.cost = data.cummulative_quote_qty;
        if !data.executed_qty.is_zero() {
            order.average = data
                .cummulative_quote_qty
                .and_then(|c| c.checked_div(data.executed_qty));
        }
        order.info = serde_json::to_value(data).unwrap_or_default();
        order
    }

    fn parse_my_trade(data: &BinanceMyTrade, symbol: &str) -> Trade {
        let side = if data.is_buyer {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        let mut trade = Trade::new(data.id.to_string(), symbol, data.price, data.qty)
            .with_timestamp(data.time)
            .with_side(side);
        trade.order = Some(data.order_id.to_string());
        trade.taker_or_maker = Some(if data.is_maker {
            TakerOrMaker::Maker
        } else {
            TakerOrMaker::Taker
        });
        trade.fee = Some(Fee::new(data.commission, data.commission_asset.clone()));
        trade.info = serde_json::to_value(data).unwrap_or_default();
        trade
    }

    fn parse_deposit(data: &BinanceDeposit) -> Transaction {
        let status = match data.status {
            0 | 8 => TransactionStatus::Pending,
            1 | 6 => TransactionStatus::Ok,
            _ => TransactionStatus::Failed,
        };
        Transaction {
            id: data.id.clone().unwrap_or_default(),
            txid: data.tx_id.clone(),
            timestamp: Some(data.insert_time),
            datetime: Some(ms_to_iso8601(data.insert_time)),
            network: data.network.clone(),
            address: data.address.clone(),
            tag: data.address_tag.clone().filter(|t| !t.is_empty()),
            tx_type: TransactionType::Deposit,
            amount: data.amount,
            currency: data.coin.clone(),
            status,
            fee: None,
            info: serde_json::to_value(data).unwrap_or_default(),
        }
    }

    fn parse_withdrawal(data: &BinanceWithdrawal) -> Transaction {
        let status = match data.status {
            6 => TransactionStatus::Ok,
            1 => TransactionStatus::Canceled,
            3 | 5 => TransactionStatus::Failed,
            _ => TransactionStatus::Pending,
        };
        // applyTime is reported in UTC as "YYYY-MM-DD HH:MM:SS"
        let timestamp = data.apply_time.as_deref().and_then(|t| {
            NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc().timestamp_millis())
        });
        Transaction {
            id: data.id.clone(),
            txid: data.tx_id.clone(),
            timestamp,
            datetime: timestamp.map(ms_to_iso8601),
            network: data.network.clone(),
            address: data.address.clone(),
            tag: None,
            tx_type: TransactionType::Withdrawal,
            amount: data.amount,
            fee: data
                .transaction_fee
                .map(|cost| Fee::new(cost, data.coin.clone())),
            currency: data.coin.clone(),
            status,
            info: serde_json::to_value(data).unwrap_or_default(),
        }
    }

    fn history_params(
        symbol: Option<&Market>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(market) = symbol {
            params.insert("symbol".into(), market.id.clone());
        }
        if let Some(since) = since {
            params.insert("startTime".into(), since.to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.min(1000).to_string());
        }
        params
    }

    fn wallet_params(code: Option<&str>, since: Option<i64>, limit: Option<u32>) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(code) = code {
            params.insert("coin".into(), code.to_uppercase());
        }
        if let Some(since) = since {
            params.insert("startTime".into(), since.to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit".into(), limit.to_string());
        }
        params
    }
}

#[async_trait]
impl Exchange for Binance {
    fn id(&self) -> ExchangeId {
        ExchangeId::Binance
    }

    fn name(&self) -> &str {
        "Binance"
    }

    fn version(&self) -> &str {
        "v3"
    }

    fn rate_limit(&self) -> u64 {
        self.rate_limiter.rate_limit_ms()
    }

    fn is_sandbox(&self) -> bool {
        self.config.is_sandbox()
    }

    fn has(&self) -> &ExchangeFeatures {
        &self.features
    }

    fn urls(&self) -> &ExchangeUrls {
        &self.urls
    }

    fn symbols(&self) -> Vec<String> {
        self.markets.symbols()
    }

    async fn load_markets(&self, reload: bool) -> CcxtResult<HashMap<String, Market>> {
        if !reload && !self.markets.is_empty() {
            return Ok(self.markets.snapshot());
        }
        let markets = self.fetch_markets().await?;
        debug!(count = markets.len(), "binance markets loaded");
        self.markets.replace(markets);
        Ok(self.markets.snapshot())
    }

    async fn fetch_markets(&self) -> CcxtResult<Vec<Market>> {
        let response: BinanceExchangeInfo = self.public_get("/api/v3/exchangeInfo", None).await?;

        Ok(response
            .symbols
            .into_iter()
            .map(|info| {
                let mut market = Market::spot(&info.symbol, &info.base_asset, &info.quote_asset);
                market.active = info.status == "TRADING";
                market.taker = Some(Decimal::new(1, 3)); // 0.1%
                market.maker = Some(Decimal::new(1, 3));
                market.precision.amount = Some(info.base_asset_precision);
                market.precision.price = Some(info.quote_precision);
                for filter in &info.filters {
                    match filter.get("filterType").and_then(Value::as_str) {
                        Some("LOT_SIZE") => {
                            market.limits.amount.min =
                                filter.get("minQty").and_then(value_to_decimal);
                            market.limits.amount.max =
                                filter.get("maxQty").and_then(value_to_decimal);
                        }
                        Some("PRICE_FILTER") => {
                            market.limits.price.min =
                                filter.get("minPrice").and_then(value_to_decimal);
                            market.limits.price.max =
                                filter.get("maxPrice").and_then(value_to_decimal);
                        }
                        Some("NOTIONAL") | Some("MIN_NOTIONAL") => {
                            market.limits.cost.min =
                                filter.get("minNotional").and_then(value_to_decimal);
                        }
                        _ => {}
                    }
                }
                market.info = serde_json::to_value(&info).unwrap_or_default();
                market
            })
            .collect())
    }

    async fn fetch_time(&self) -> CcxtResult<i64> {
        let response: BinanceServerTime = self.public_get("/api/v3/time", None).await?;
        Ok(response.server_time)
    }

    async fn fetch_status(&self) -> CcxtResult<ExchangeStatus> {
        let response: Value = self.public_get("/sapi/v1/system/status", None).await?;
        let status = match response.get("status").and_then(Value::as_i64) {
            Some(0) => "ok",
            _ => "maintenance",
        };
        Ok(ExchangeStatus {
            status: status.into(),
            updated: Some(now_ms()),
            eta: None,
            info: response,
        })
    }

    async fn fetch_ticker(&self, symbol: &str) -> CcxtResult<Ticker> {
        let market = self.market(symbol).await?;
        let mut params = HashMap::new();
        params.insert("symbol".into(), market.id);

        let response: BinanceTicker = self.public_get("/api/v3/ticker/24hr", Some(params)).await?;
        Ok(Self::parse_ticker(&response, symbol))
    }

    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> CcxtResult<HashMap<String, Ticker>> {
        self.load_markets(false).await?;
        let response: Vec<BinanceTicker> = self.public_get("/api/v3/ticker/24hr", None).await?;

        let mut tickers = HashMap::new();
        for data in &response {
            let Some(symbol) = self.markets.symbol_for_id(&data.symbol) else {
                continue;
            };
            if symbols.is_some_and(|s| !s.contains(&symbol)) {
                continue;
            }
            tickers.insert(symbol.clone(), Self::parse_ticker(data, &symbol));
        }
        Ok(tickers)
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> CcxtResult<OrderBook> {
        let market = self.market(symbol).await?;
        let mut params = HashMap::new();
        params.insert("symbol".into(), market.id);
        if let Some(l) = limit {
            params.insert("limit".into(), l.min(5000).to_string());
        }

        let response: BinanceOrderBook = self.public_get("/api/v3/depth", Some(params)).await?;
        let mut book = OrderBook::from_levels(symbol, &response.bids, &response.asks, limit);
        book.nonce = Some(response.last_update_id);
        Ok(book)
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Trade>> {
        let market = self.market(symbol).await?;
        let mut params = HashMap::new();
        params.insert("symbol".into(), market.id);
        if let Some(l) = limit {
            params.insert("limit".into(), l.min(1000).to_string());
        }

        let response: Vec<BinanceTrade> = self.public_get("/api/v3/trades", Some(params)).await?;
        Ok(response
            .iter()
            .filter(|t| since.map_or(true, |s| t.time >= s))
            .map(|t| {
                // the buyer being the maker means the aggressor sold
                let side = if t.is_buyer_maker {
                    OrderSide::Sell
                } else {
                    OrderSide::Buy
                };
                let mut trade = Trade::new(t.id.to_string(), symbol, t.price, t.qty)
                    .with_timestamp(t.time)
                    .with_side(side);
                trade.taker_or_maker = Some(TakerOrMaker::Taker);
                trade.info = serde_json::to_value(t).unwrap_or_default();
                trade
            })
            .collect())
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<OHLCV>> {
        let market = self.market(symbol).await?;
        let mut params = HashMap::new();
        params.insert("symbol".into(), market.id);
        params.insert("interval".into(), Self::interval(timeframe).to_string());
        if let Some(s) = since {
            params.insert("startTime".into(), s.to_string());
        }
        if let Some(l) = limit {
            params.insert("limit".into(), l.min(1000).to_string());
        }

        let response: Vec<Vec<Value>> = self.public_get("/api/v3/klines", Some(params)).await?;
        Ok(response
            .iter()
            .filter_map(|c| match c.as_slice() {
                [ts, open, high, low, close, volume, ..] => Some(OHLCV::new(
                    ts.as_i64()?,
                    value_to_decimal(open)?,
                    value_to_decimal(high)?,
                    value_to_decimal(low)?,
                    value_to_decimal(close)?,
                    value_to_decimal(volume)?,
                )),
                _ => None,
            })
            .collect())
    }

    async fn fetch_balance(&self) -> CcxtResult<Balances> {
        let response: BinanceAccount = self
            .private_request("GET", "/api/v3/account", HashMap::new())
            .await?;

        let mut balances = Balances::new();
        if let Some(ts) = response.update_time {
            balances.timestamp = Some(ts);
            balances.datetime = Some(ms_to_iso8601(ts));
        }
        for b in &response.balances {
            balances.add(b.asset.clone(), Balance::new(b.free, b.locked));
        }
        Ok(balances)
    }

    async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
    ) -> CcxtResult<Order> {
        let market = self.market(symbol).await?;

        let mut params = HashMap::new();
        params.insert("symbol".into(), market.id);
        params.insert("side".into(), side.as_str().to_uppercase());
        params.insert("type".into(), order_type.as_str().to_uppercase());
        params.insert("quantity".into(), amount.normalize().to_string());
        params.insert("newOrderRespType".into(), "RESULT".into());

        if order_type == OrderType::Limit {
            let price = price.ok_or_else(|| CcxtError::ArgumentsRequired {
                message: "Price is required for limit orders".into(),
            })?;
            params.insert("price".into(), price.normalize().to_string());
            params.insert("timeInForce".into(), "GTC".into());
        }

        let response: BinanceOrder = self.private_request("POST", "/api/v3/order", params).await?;
        Ok(Self::parse_order(&response, symbol))
    }

    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> CcxtResult<Order> {
        let symbol = symbol.ok_or_else(|| CcxtError::ArgumentsRequired {
            message: "cancelOrder requires a symbol argument".into(),
        })?;
        let market = self.market(symbol).await?;

        let mut params = HashMap::new();
        params.insert("symbol".into(), market.id);
        params.insert("orderId".into(), id.to_string());

        let response: BinanceOrder = self.private_request("DELETE", "/api/v3/order", params).await?;
        Ok(Self::parse_order(&response, symbol))
    }

    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> CcxtResult<Order> {
        let symbol = symbol.ok_or_else(|| CcxtError::ArgumentsRequired {
            message: "fetchOrder requires a symbol argument".into(),
        })?;
        let market = self.market(symbol).await?;

        let mut params = HashMap::new();
        params.insert("symbol".into(), market.id);
        params.insert("orderId".into(), id.to_string());

        let response: BinanceOrder = self.private_request("GET", "/api/v3/order", params).await?;
        Ok(Self::parse_order(&response, symbol))
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        _since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Order>> {
        let mut params = HashMap::new();
        if let Some(symbol) = symbol {
            params.insert("symbol".into(), self.market(symbol).await?.id);
        } else {
            self.load_markets(false).await?;
        }

        let response: Vec<BinanceOrder> = self
            .private_request("GET", "/api/v3/openOrders", params)
            .await?;
        let mut orders: Vec<Order> = response
            .iter()
            .map(|o| Self::parse_order(o, &self.symbol_for(&o.symbol)))
            .collect();
        if let Some(limit) = limit {
            orders.truncate(limit as usize);
        }
        Ok(orders)
    }

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Order>> {
        let symbol = symbol.ok_or_else(|| CcxtError::ArgumentsRequired {
            message: "fetchClosedOrders requires a symbol argument".into(),
        })?;
        let market = self.market(symbol).await?;

        let response: Vec<BinanceOrder> = self
            .private_request(
                "GET",
                "/api/v3/allOrders",
                Self::history_params(Some(&market), since, limit),
            )
            .await?;
        Ok(response
            .iter()
            .map(|o| Self::parse_order(o, symbol))
            .filter(|o| !o.is_open())
            .collect())
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Trade>> {
        let symbol = symbol.ok_or_else(|| CcxtError::ArgumentsRequired {
            message: "fetchMyTrades requires a symbol argument".into(),
        })?;
        let market = self.market(symbol).await?;

        let response: Vec<BinanceMyTrade> = self
            .private_request(
                "GET",
                "/api/v3/myTrades",
                Self::history_params(Some(&market), since, limit),
            )
            .await?;
        Ok(response
            .iter()
            .map(|t| Self::parse_my_trade(t, symbol))
            .collect())
    }

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        let response: Vec<BinanceDeposit> = self
            .private_request(
                "GET",
                "/sapi/v1/capital/deposit/hisrec",
                Self::wallet_params(code, since, limit),
            )
            .await?;
        Ok(response.iter().map(Self::parse_deposit).collect())
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        let response: Vec<BinanceWithdrawal> = self
            .private_request(
                "GET",
                "/sapi/v1/capital/withdraw/history",
                Self::wallet_params(code, since, limit),
            )
            .await?;
        Ok(response.iter().map(Self::parse_withdrawal).collect())
    }

    async fn fetch_deposit_address(&self, code: &str) -> CcxtResult<DepositAddress> {
        let mut params = HashMap::new();
        params.insert("coin".into(), code.to_uppercase());

        let response: BinanceDepositAddress = self
            .private_request("GET", "/sapi/v1/capital/deposit/address", params)
            .await?;
        Ok(DepositAddress {
            currency: response.coin.clone(),
            address: response.address.clone(),
            tag: response.tag.clone().filter(|t| !t.is_empty()),
            network: None,
            info: serde_json::to_value(&response).unwrap_or_default(),
        })
    }
}

// === Response Types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceServerTime {
    server_time: i64,
}

#[derive(Debug, Deserialize)]
struct BinanceExchangeInfo {
    symbols: Vec<BinanceSymbol>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BinanceSymbol {
    symbol: String,
    status: String,
    base_asset: String,
    quote_asset: String,
    #[serde(default)]
    base_asset_precision: i32,
    #[serde(default)]
    quote_precision: i32,
    #[serde(default)]
    filters: Vec<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker {
    symbol: String,
    #[serde(default)]
    price_change: Option<Decimal>,
    #[serde(default)]
    price_change_percent: Option<Decimal>,
    #[serde(default)]
    weighted_avg_price: Option<Decimal>,
    #[serde(default)]
    last_price: Option<Decimal>,
    #[serde(default)]
    bid_price: Option<Decimal>,
    #[serde(default)]
    bid_qty: Option<Decimal>,
    #[serde(default)]
    ask_price: Option<Decimal>,
    #[serde(default)]
    ask_qty: Option<Decimal>,
    #[serde(default)]
    open_price: Option<Decimal>,
    #[serde(default)]
    high_price: Option<Decimal>,
    #[serde(default)]
    low_price: Option<Decimal>,
    #[serde(default)]
    volume: Option<Decimal>,
    #[serde(default)]
    quote_volume: Option<Decimal>,
    #[serde(default)]
    close_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceOrderBook {
    last_update_id: i64,
    #[serde(default)]
    bids: Vec<Vec<Decimal>>,
    #[serde(default)]
    asks: Vec<Vec<Decimal>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTrade {
    id: i64,
    price: Decimal,
    qty: Decimal,
    time: i64,
    is_buyer_maker: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceAccount {
    #[serde(default)]
    update_time: Option<i64>,
    #[serde(default)]
    balances: Vec<BinanceBalance>,
}

#[derive(Debug, Deserialize)]
struct BinanceBalance {
    asset: String,
    free: Decimal,
    locked: Decimal,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BinanceOrder {
    symbol: String,
    order_id: i64,
    #[serde(default)]
    client_order_id: Option<String>,
    #[serde(default)]
    price: Option<Decimal>,
    orig_qty: Decimal,
    executed_qty: Decimal,
    #[serde(default)]
    cummulative_quote_qty: Option<Decimal>,
    status: String,
    #[serde(rename = "type")]
    order_type: String,
    side: String,
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    transact_time: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BinanceMyTrade {
    id: i64,
    order_id: i64,
    price: Decimal,
    qty: Decimal,
    commission: Decimal,
    commission_asset: String,
    time: i64,
    is_buyer: bool,
    is_maker: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BinanceDeposit {
    #[serde(default)]
    id: Option<String>,
    amount: Decimal,
    coin: String,
    #[serde(default)]
    network: Option<String>,
    status: i32,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    address_tag: Option<String>,
    #[serde(default)]
    tx_id: Option<String>,
    insert_time: i64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct BinanceWithdrawal {
    id: String,
    amount: Decimal,
    #[serde(default)]
    transaction_fee: Option<Decimal>,
    coin: String,
    status: i32,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    tx_id: Option<String>,
    #[serde(default)]
    apply_time: Option<String>,
    #[serde(default)]
    network: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct BinanceDepositAddress {
    address: String,
    coin: String,
    #[serde(default)]
    tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exchange_info() {
        let exchange = Binance::new(ExchangeConfig::new()).unwrap();
        assert_eq!(exchange.id(), ExchangeId::Binance);
        assert_eq!(exchange.name(), "Binance");
        assert_eq!(exchange.rate_limit(), 50);
        assert!(exchange.has().get("fetchMyTrades").is_available());
        assert_eq!(exchange.urls().api, "https://api.binance.com");
    }

    #[test]
    fn test_sandbox_uses_testnet() {
        let exchange = Binance::new(ExchangeConfig::new().with_sandbox(true)).unwrap();
        assert!(exchange.is_sandbox());
        assert_eq!(exchange.urls().api, "https://testnet.binance.vision");
    }

    #[test]
    fn test_parse_order() {
        let raw: BinanceOrder = serde_json::from_value(json!({
            "symbol": "BTCUSDT",
            "orderId": 28,
            "clientOrderId": "abc",
            "price": "30000.00",
            "origQty": "2.0",
            "executedQty": "0.5",
            "cummulativeQuoteQty": "15000.00",
            "status": "PARTIALLY_FILLED",
            "type": "LIMIT",
            "side": "SELL",
            "time": 1700000000000i64
        }))
        .unwrap();

        let order = Binance::parse_order(&raw, "BTC/USDT");
        assert_eq!(order.id, "28");
        assert_eq!(order.side, OrderSide::Sell);
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.remaining, Some(Decimal::new(15, 1)));
        assert_eq!(order.average, Some(Decimal::new(30000, 0)));
    }

    #[test]
    fn test_refine_error_codes() {
        let err = CcxtError::from_http_status(
            400,
            "https://api.binance.com/api/v3/ticker/24hr",
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        );
        assert!(matches!(Binance::refine_error(err), CcxtError::BadSymbol { .. }));

        let err = CcxtError::from_http_status(400, "https://x", r#"{"code":-2015,"msg":"Invalid API-key"}"#);
        assert!(Binance::refine_error(err).is_auth_error());

        let err = CcxtError::from_http_status(400, "https://x", "not json");
        assert_eq!(Binance::refine_error(err).code(), "EXCHANGE_ERROR");
    }

    #[test]
    fn test_withdrawal_apply_time() {
        let raw: BinanceWithdrawal = serde_json::from_value(json!({
            "id": "w1",
            "amount": "0.1",
            "transactionFee": "0.0005",
            "coin": "BTC",
            "status": 6,
            "applyTime": "2023-11-14 22:13:20"
        }))
        .unwrap();
        let tx = Binance::parse_withdrawal(&raw);
        assert_eq!(tx.timestamp, Some(1_700_000_000_000));
        assert_eq!(tx.status, TransactionStatus::Ok);
        assert_eq!(tx.fee.unwrap().currency, "BTC");
    }

    #[tokio::test]
    async fn test_private_call_without_credentials() {
        let exchange = Binance::new(ExchangeConfig::new()).unwrap();
        let err = exchange.fetch_balance().await.unwrap_err();
        assert!(matches!(err, CcxtError::AuthenticationError { .. }));
    }
}
