//! Kraken Exchange Implementation
//!
//! Kraken 현물 REST API 구현

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;
use tracing::debug;

use super::market_cache::MarketCache;
use crate::client::{build_query, ExchangeConfig, HttpClient, RateLimiter};
use crate::errors::{CcxtError, CcxtResult};
use crate::types::{
    Balance, Balances, DepositAddress, Exchange, ExchangeFeatures, ExchangeId, ExchangeStatus,
    ExchangeUrls, Fee, Market, Order, OrderBook, OrderSide, OrderStatus, OrderType, TakerOrMaker,
    Ticker, Timeframe, Trade, Transaction, TransactionStatus, TransactionType, OHLCV,
};
use crate::utils::{ms_to_iso8601, now_ms, safe_decimal, safe_string, safe_timestamp, value_to_decimal};

const BASE_URL: &str = "https://api.kraken.com";
const RATE_LIMIT_MS: u64 = 1000;

/// Kraken 거래소 구조체
pub struct Kraken {
    config: ExchangeConfig,
    client: HttpClient,
    rate_limiter: RateLimiter,
    markets: MarketCache,
    features: ExchangeFeatures,
    urls: ExchangeUrls,
}

impl Kraken {
    /// 새 Kraken 인스턴스 생성
    pub fn new(config: ExchangeConfig) -> CcxtResult<Self> {
        let client = HttpClient::new(BASE_URL, &config)?;
        let rate_limiter = RateLimiter::new(config.rate_limit_ms().unwrap_or(RATE_LIMIT_MS));

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
            api: BASE_URL.into(),
            www: "https://www.kraken.com".into(),
            doc: "https://docs.kraken.com/rest/".into(),
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
        method: &str,
        params: Option<HashMap<String, String>>,
    ) -> CcxtResult<T> {
        self.rate_limiter.throttle(1.0).await;
        let response: KrakenResponse<T> = self
            .client
            .get(&format!("/0/public/{method}"), params, None)
            .await?;
        response.into_result()
    }

    /// Private API 요청
    async fn private_request<T: DeserializeOwned>(
        &self,
        method: &str,
        mut params: HashMap<String, String>,
    ) -> CcxtResult<T> {
        let api_key = self.config.api_key().ok_or_else(|| CcxtError::AuthenticationError {
            message: format!("{method} requires apiKey credential"),
        })?;
        let secret = self.config.secret().ok_or_else(|| CcxtError::AuthenticationError {
            message: format!("{method} requires secret credential"),
        })?;

        self.rate_limiter.throttle(1.0).await;

        let nonce = (now_ms() * 1000).to_string();
        params.insert("nonce".to_string(), nonce.clone());
        let body = build_query(&params);
        let path = format!("/0/private/{method}");
        let signature = Self::sign(secret, &path, &nonce, &body)?;

        let mut headers = HashMap::new();
        headers.insert("API-Key".to_string(), api_key.to_string());
        headers.insert("API-Sign".to_string(), signature);
        headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );

        debug!(method, "kraken private request");
        let response: KrakenResponse<T> = self.client.post_body(&path, body, Some(headers)).await?;
        response.into_result()
    }

    /// API-Sign = base64(HMAC-SHA512(path + SHA256(nonce + body), base64decode(secret)))
    fn sign(secret: &str, path: &str, nonce: &str, body: &str) -> CcxtResult<String> {
        let decoded = BASE64
            .decode(secret)
            .map_err(|e| CcxtError::AuthenticationError {
                message: format!("Failed to decode secret: {e}"),
            })?;

        let mut sha256 = Sha256::new();
        sha256.update(nonce.as_bytes());
        sha256.update(body.as_bytes());
        let digest = sha256.finalize();

        let mut mac = Hmac::<Sha512>::new_from_slice(&decoded).map_err(|e| {
            CcxtError::AuthenticationError {
                message: format!("HMAC error: {e}"),
            }
        })?;
        mac.update(path.as_bytes());
        mac.update(&digest);
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Kraken 자산 코드를 통합 코드로 변환 (XXBT -> BTC, ZUSD -> USD)
    fn common_currency(code: &str) -> String {
        let trimmed = if code.len() == 4 && (code.starts_with('X') || code.starts_with('Z')) {
            &code[1..]
        } else {
            code
        };
        match trimmed {
            "XBT" => "BTC".to_string(),
            "XDG" => "DOGE".to_string(),
            other => other.to_string(),
        }
    }

    /// 통합 코드를 Kraken 자산 코드로 변환 (BTC -> XBT)
    fn currency_id(code: &str) -> String {
        match code.to_uppercase().as_str() {
            "BTC" => "XBT".to_string(),
            "DOGE" => "XDG".to_string(),
            other => other.to_string(),
        }
    }

    fn parse_market(key: &str, pair: &Value) -> Option<Market> {
        let altname = safe_string(pair, "altname")?;
        let base_id = safe_string(pair, "base")?;
        let quote_id = safe_string(pair, "quote")?;

        let mut market = Market::spot(altname, &base_id, &quote_id);
        market.base = Self::common_currency(&base_id);
        market.quote = Self::common_currency(&quote_id);
        market.symbol = format!("{}/{}", market.base, market.quote);
        market.active = safe_string(pair, "status").map_or(true, |s| s == "online");
        market.precision.amount = pair.get("lot_decimals").and_then(Value::as_i64).map(|v| v as i32);
        market.precision.price = pair.get("pair_decimals").and_then(Value::as_i64).map(|v| v as i32);
        market.limits.amount.min = safe_decimal(pair, "ordermin");
        market.limits.cost.min = safe_decimal(pair, "costmin");

        // fee tiers are [volume, percent]
        let first_tier = |name: &str| -> Option<Decimal> {
            let tier = pair.get(name)?.as_array()?.first()?.as_array()?;
            value_to_decimal(tier.get(1)?).map(|pct| pct / Decimal::ONE_HUNDRED)
        };
        market.taker = first_tier("fees");
        market.maker = first_tier("fees_maker");

        let mut info = pair.clone();
        if let Some(obj) = info.as_object_mut() {
            obj.insert("key".into(), Value::String(key.to_string()));
        }
        market.info = info;
        Some(market)
    }

    async fn market(&self, symbol: &str) -> CcxtResult<Market> {
        self.load_markets(false).await?;
        self.markets.get(symbol).ok_or_else(|| CcxtError::BadSymbol {
            symbol: symbol.to_string(),
        })
    }

    /// 응답 키(XXBTZUSD) 또는 altname(XBTUSD)으로 심볼 조회
    fn symbol_for_key(&self, key: &str) -> Option<String> {
        self.markets.symbol_for_id(key).or_else(|| {
            self.markets
                .snapshot()
                .into_values()
                .find(|m| m.info.get("key").and_then(Value::as_str) == Some(key))
                .map(|m| m.symbol)
        })
    }

    fn interval(timeframe: Timeframe) -> i64 {
        timeframe.to_minutes()
    }

    /// Kraken 응답은 `{pair_key: payload}` 형태이므로 첫 번째 값을 꺼낸다
    fn first_value(result: &Value) -> Option<&Value> {
        result
            .as_object()?
            .iter()
            .find(|(k, _)| k.as_str() != "last")
            .map(|(_, v)| v)
    }

    /// `[today, last24h]` 배열에서 인덱스 값 추출
    fn nth_decimal(data: &Value, key: &str, index: usize) -> Option<Decimal> {
        value_to_decimal(data.get(key)?.get(index)?)
    }

    fn parse_ticker(data: &Value, symbol: &str) -> Ticker {
        let mut ticker = Ticker::new(symbol).with_timestamp(now_ms());
        let last = Self::nth_decimal(data, "c", 0);
        ticker.high = Self::nth_decimal(data, "h", 1);
        ticker.low = Self::nth_decimal(data, "l", 1);
        ticker.bid = Self::nth_decimal(data, "b", 0);
        ticker.bid_volume = Self::nth_decimal(data, "b", 2);
        ticker.ask = Self::nth_decimal(data, "a", 0);
        ticker.ask_volume = Self::nth_decimal(data, "a", 2);
        ticker.vwap = Self::nth_decimal(data, "p", 1);
        ticker.open = data.get("o").and_then(value_to_decimal);
        ticker.last = last;
        ticker.close = last;
        ticker.base_volume = Self::nth_decimal(data, "v", 1);
        if let (Some(open), Some(last)) = (ticker.open, last) {
            ticker.change = Some(last - open);
            if !open.is_zero() {
                ticker.percentage = Some((last - open) / open * Decimal::ONE_HUNDRED);
            }
        }
        if let (Some(vwap), Some(volume)) = (ticker.vwap, ticker.base_volume) {
            ticker.quote_volume = Some(vwap * volume);
        }
        ticker.info = data.clone();
        ticker
    }

    fn parse_order(&self, id: &str, data: &Value) -> Order {
        let empty = Value::Null;
        let descr = data.get("descr").unwrap_or(&empty);
        let pair = safe_string(descr, "pair").unwrap_or_default();
        let symbol = self.symbol_for_key(&pair).unwrap_or(pair);

        let side = safe_string(descr, "type")
            .and_then(|s| s.parse().ok())
            .unwrap_or(OrderSide::Buy);
        let order_type = safe_string(descr, "ordertype")
            .and_then(|s| s.parse().ok())
            .unwrap_or(OrderType::Limit);
        let status = match safe_string(data, "status").as_deref() {
            Some("closed") => OrderStatus::Closed,
            Some("canceled") => OrderStatus::Canceled,
            Some("expired") => OrderStatus::Expired,
            _ => OrderStatus::Open,
        };
        let amount = safe_decimal(data, "vol").unwrap_or_default();

        let mut order = Order::new(id, symbol.clone(), order_type, side, amount)
            .with_price(safe_decimal(descr, "price").filter(|p| !p.is_zero()))
            .with_status(status)
            .with_filled(safe_decimal(data, "vol_exec").unwrap_or_default());
        if let Some(ts) = safe_timestamp(data, "opentm") {
            order = order.with_timestamp(ts);
        }
        order.client_order_id = safe_string(data, "userref").filter(|r| r != "0");
        order.cost = safe_decimal(data, "cost");
        order.average = safe_decimal(data, "price").filter(|p| !p.is_zero());
        let quote = symbol.split('/').nth(1).unwrap_or_default().to_string();
        order.fee = safe_decimal(data, "fee").map(|cost| Fee::new(cost, quote));
        order.info = data.clone();
        order
    }

    fn parse_orders(&self, orders: Option<&Value>, symbol: Option<&str>) -> Vec<Order> {
        let mut parsed: Vec<Order> = orders
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .map(|(id, data)| self.parse_order(id, data))
            .filter(|o| symbol.map_or(true, |s| o.symbol == s))
            .collect();
        parsed.sort_by_key(|o| o.timestamp);
        parsed
    }

    fn parse_transaction(data: &Value, tx_type: TransactionType) -> Transaction {
        let status = match safe_string(data, "status").as_deref() {
            Some("Success") => TransactionStatus::Ok,
            Some("Failure") => TransactionStatus::Failed,
            Some("Canceled") => TransactionStatus::Canceled,
            _ => TransactionStatus::Pending,
        };
        let currency = safe_string(data, "asset")
            .map(|a| Self::common_currency(&a))
            .unwrap_or_default();
        let timestamp = safe_timestamp(data, "time");

        Transaction {
            id: safe_string(data, "refid").unwrap_or_default(),
            txid: safe_string(data, "txid"),
            timestamp,
            datetime: timestamp.map(ms_to_iso8601),
            network: safe_string(data, "method"),
            address: safe_string(data, "info"),
            tag: None,
            tx_type,
            amount: safe_decimal(data, "amount").unwrap_or_default(),
            fee: safe_decimal(data, "fee").map(|cost| Fee::new(cost, currency.clone())),
            currency,
            status,
            info: data.clone(),
        }
    }

    async fn fetch_transactions(
        &self,
        method: &str,
        tx_type: TransactionType,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        let mut params = HashMap::new();
        if let Some(code) = code {
            params.insert("asset".to_string(), Self::currency_id(code));
        }
        if let Some(since) = since {
            params.insert("start".to_string(), (since / 1000).to_string());
        }

        let response: Vec<Value> = self.private_request(method, params).await?;
        let mut transactions: Vec<Transaction> = response
            .iter()
            .map(|t| Self::parse_transaction(t, tx_type))
            .collect();
        if let Some(limit) = limit {
            transactions.truncate(limit as usize);
        }
        Ok(transactions)
    }
}

#[async_trait]
impl Exchange for Kraken {
    fn id(&self) -> ExchangeId {
        ExchangeId::Kraken
    }

    fn name(&self) -> &str {
        "Kraken"
    }

    fn version(&self) -> &str {
        "0"
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
        debug!(count = markets.len(), "kraken markets loaded");
        self.markets.replace(markets);
        Ok(self.markets.snapshot())
    }

    async fn fetch_markets(&self) -> CcxtResult<Vec<Market>> {
        let response: HashMap<String, Value> = self.public_get("AssetPairs", None).await?;
        Ok(response
            .iter()
            // dark pool pairs (".d") are not tradable on the order book
            .filter(|(key, _)| !key.ends_with(".d"))
            .filter_map(|(key, pair)| Self::parse_market(key, pair))
            .collect())
    }

    async fn fetch_time(&self) -> CcxtResult<i64> {
        let response: Value = self.public_get("Time", None).await?;
        safe_timestamp(&response, "unixtime").ok_or_else(|| CcxtError::BadResponse {
            message: "unixtime missing".into(),
        })
    }

    async fn fetch_status(&self) -> CcxtResult<ExchangeStatus> {
        let response: Value = self.public_get("SystemStatus", None).await?;
        let status = match safe_string(&response, "status").as_deref() {
            Some("online") => "ok",
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
        params.insert("pair".to_string(), market.id);

        let response: Value = self.public_get("Ticker", Some(params)).await?;
        let data = Self::first_value(&response).ok_or_else(|| CcxtError::BadResponse {
            message: format!("ticker missing for {symbol}"),
        })?;
        Ok(Self::parse_ticker(data, symbol))
    }

    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> CcxtResult<HashMap<String, Ticker>> {
        self.load_markets(false).await?;
        let mut params = HashMap::new();
        if let Some(symbols) = symbols {
            let mut ids = Vec::with_capacity(symbols.len());
            for symbol in symbols {
                ids.push(self.market(symbol).await?.id);
            }
            params.insert("pair".to_string(), ids.join(","));
        }

        let response: HashMap<String, Value> = self.public_get("Ticker", Some(params)).await?;
        Ok(response
            .iter()
            .filter_map(|(key, data)| {
                let symbol = self.symbol_for_key(key)?;
                Some((symbol.clone(), Self::parse_ticker(data, &symbol)))
            })
            .collect())
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> CcxtResult<OrderBook> {
        let market = self.market(symbol).await?;
        let mut params = HashMap::new();
        params.insert("pair".to_string(), market.id);
        if let Some(limit) = limit {
            params.insert("count".to_string(), limit.to_string());
        }

        let response: HashMap<String, KrakenDepth> = self.public_get("Depth", Some(params)).await?;
        let depth = response
            .into_values()
            .next()
            .ok_or_else(|| CcxtError::BadResponse {
                message: format!("order book missing for {symbol}"),
            })?;

        let mut book = OrderBook::from_levels(symbol, &depth.bids, &depth.asks, limit);
        book.timestamp = Some(now_ms());
        book.datetime = book.timestamp.map(ms_to_iso8601);
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
        params.insert("pair".to_string(), market.id);
        if let Some(since) = since {
            // nanosecond cursor
            params.insert("since".to_string(), (since * 1_000_000).to_string());
        }
        if let Some(limit) = limit {
            params.insert("count".to_string(), limit.to_string());
        }

        let response: Value = self.public_get("Trades", Some(params)).await?;
        let rows = Self::first_value(&response)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        // [price, volume, time, side, type, misc, trade_id]
        Ok(rows
            .iter()
            .filter_map(|row| {
                let price = value_to_decimal(row.get(0)?)?;
                let amount = value_to_decimal(row.get(1)?)?;
                let time = row.get(2)?.as_f64()?;
                let id = row
                    .get(6)
                    .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                    .unwrap_or_else(|| format!("{time}"));
                let side = match row.get(3)?.as_str()? {
                    "s" => OrderSide::Sell,
                    _ => OrderSide::Buy,
                };
                let mut trade = Trade::new(id, symbol, price, amount)
                    .with_timestamp((time * 1000.0) as i64)
                    .with_side(side);
                trade.taker_or_maker = Some(TakerOrMaker::Taker);
                trade.info = row.clone();
                Some(trade)
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
        params.insert("pair".to_string(), market.id);
        params.insert("interval".to_string(), Self::interval(timeframe).to_string());
        if let Some(since) = since {
            params.insert("since".to_string(), (since / 1000).to_string());
        }

        let response: Value = self.public_get("OHLC", Some(params)).await?;
        let rows = Self::first_value(&response)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        // [time, open, high, low, close, vwap, volume, count]
        let mut candles: Vec<OHLCV> = rows
            .iter()
            .filter_map(|row| {
                Some(OHLCV::new(
                    row.get(0)?.as_i64()? * 1000,
                    value_to_decimal(row.get(1)?)?,
                    value_to_decimal(row.get(2)?)?,
                    value_to_decimal(row.get(3)?)?,
                    value_to_decimal(row.get(4)?)?,
                    value_to_decimal(row.get(6)?)?,
                ))
            })
            .collect();
        if let Some(limit) = limit {
            let skip = candles.len().saturating_sub(limit as usize);
            candles.drain(..skip);
        }
        Ok(candles)
    }

    async fn fetch_balance(&self) -> CcxtResult<Balances> {
        let response: HashMap<String, Value> = self.private_request("Balance", HashMap::new()).await?;

        let mut balances = Balances::new();
        for (asset, amount) in &response {
            let total = value_to_decimal(amount);
            balances.add(
                Self::common_currency(asset),
                Balance {
                    free: None,
                    used: None,
                    total,
                },
            );
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
        params.insert("pair".to_string(), market.id);
        params.insert("type".to_string(), side.as_str().to_string());
        params.insert("ordertype".to_string(), order_type.as_str().to_string());
        params.insert("volume".to_string(), amount.normalize().to_string());
        if order_type == OrderType::Limit {
            let price = price.ok_or_else(|| CcxtError::ArgumentsRequired {
                message: "Price is required for limit orders".into(),
            })?;
            params.insert("price".to_string(), price.normalize().to_string());
        }

        let response: Value = self.private_request("AddOrder", params).await?;
        let id = response
            .get("txid")
            .and_then(|t| t.get(0))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut order = Order::new(id, symbol, order_type, side, amount)
            .with_price(price)
            .with_timestamp(now_ms());
        order.info = response;
        Ok(order)
    }

    async fn cancel_order(&self, id: &str, _symbol: Option<&str>) -> CcxtResult<Order> {
        let mut params = HashMap::new();
        params.insert("txid".to_string(), id.to_string());
        let response: Value = self.private_request("CancelOrder", params).await?;

        let mut order = self.fetch_order(id, None).await?;
        order.status = OrderStatus::Canceled;
        if let Some(obj) = order.info.as_object_mut() {
            obj.insert("cancel".into(), response);
        }
        Ok(order)
    }

    async fn fetch_order(&self, id: &str, _symbol: Option<&str>) -> CcxtResult<Order> {
        self.load_markets(false).await?;
        let mut params = HashMap::new();
        params.insert("txid".to_string(), id.to_string());
        params.insert("trades".to_string(), "true".to_string());

        let response: Value = self.private_request("QueryOrders", params).await?;
        let data = response.get(id).ok_or_else(|| CcxtError::OrderNotFound {
            order_id: id.to_string(),
        })?;
        Ok(self.parse_order(id, data))
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        _since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Order>> {
        self.load_markets(false).await?;
        let response: Value = self.private_request("OpenOrders", HashMap::new()).await?;
        let mut orders = self.parse_orders(response.get("open"), symbol);
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
        self.load_markets(false).await?;
        let mut params = HashMap::new();
        if let Some(since) = since {
            params.insert("start".to_string(), (since / 1000).to_string());
        }

        let response: Value = self.private_request("ClosedOrders", params).await?;
        let mut orders = self.parse_orders(response.get("closed"), symbol);
        if let Some(limit) = limit {
            let skip = orders.len().saturating_sub(limit as usize);
            orders.drain(..skip);
        }
        Ok(orders)
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Trade>> {
        self.load_markets(false).await?;
        let mut params = HashMap::new();
        if let Some(since) = since {
            params.insert("start".to_string(), (since / 1000).to_string());
        }

        let response: Value = self.private_request("TradesHistory", params).await?;
        let mut trades: Vec<Trade> = response
            .get("trades")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .filter_map(|(id, data)| {
                let pair = safe_string(data, "pair")?;
                let trade_symbol = self.symbol_for_key(&pair).unwrap_or(pair);
                let mut trade = Trade::new(
                    id.clone(),
                    trade_symbol.clone(),
                    safe_decimal(data, "price")?,
                    safe_decimal(data, "vol")?,
                );
                if let Some(ts) = safe_timestamp(data, "time") {
                    trade = trade.with_timestamp(ts);
                }
                if let Some(side) = safe_string(data, "type").and_then(|s| s.parse().ok()) {
                    trade = trade.with_side(side);
                }
                trade.order = safe_string(data, "ordertxid");
                trade.cost = safe_decimal(data, "cost").unwrap_or(trade.cost);
                let quote = trade_symbol.split('/').nth(1).unwrap_or_default().to_string();
                trade.fee = safe_decimal(data, "fee").map(|cost| Fee::new(cost, quote));
                trade.info = data.clone();
                Some(trade)
            })
            .filter(|t| symbol.map_or(true, |s| t.symbol == s))
            .collect();

        trades.sort_by_key(|t| t.timestamp);
        if let Some(limit) = limit {
            let skip = trades.len().saturating_sub(limit as usize);
            trades.drain(..skip);
        }
        Ok(trades)
    }

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        self.fetch_transactions("DepositStatus", TransactionType::Deposit, code, since, limit)
            .await
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        self.fetch_transactions("WithdrawStatus", TransactionType::Withdrawal, code, since, limit)
            .await
    }

    async fn fetch_deposit_address(&self, code: &str) -> CcxtResult<DepositAddress> {
        let asset = Self::currency_id(code);

        let mut params = HashMap::new();
        params.insert("asset".to_string(), asset.clone());
        let methods: Vec<Value> = self.private_request("DepositMethods", params).await?;
        let method = methods
            .first()
            .and_then(|m| safe_string(m, "method"))
            .ok_or_else(|| CcxtError::BadRequest {
                message: format!("No deposit method for {code}"),
            })?;

        let mut params = HashMap::new();
        params.insert("asset".to_string(), asset);
        params.insert("method".to_string(), method.clone());
        let addresses: Vec<Value> = self.private_request("DepositAddresses", params).await?;
        let entry = addresses.first().ok_or_else(|| CcxtError::BadRequest {
            message: format!("No deposit address for {code}"),
        })?;

        Ok(DepositAddress {
            currency: code.to_uppercase(),
            address: safe_string(entry, "address").unwrap_or_default(),
            tag: safe_string(entry, "tag").or_else(|| safe_string(entry, "memo")),
            network: Some(method),
            info: entry.clone(),
        })
    }
}

// === Response Types ===

#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

impl<T> KrakenResponse<T> {
    fn into_result(self) -> CcxtResult<T> {
        if let Some(first) = self.error.first() {
            let message = self.error.join(", ");
            return Err(match first.split(':').next().unwrap_or_default() {
                _ if first.contains("Invalid key") || first.contains("Permission denied") => {
                    CcxtError::AuthenticationError { message }
                }
                _ if first.contains("Unknown asset pair") => CcxtError::BadSymbol { symbol: message },
                _ if first.contains("Invalid nonce") => CcxtError::InvalidNonce { message },
                _ if first.contains("Insufficient funds") => CcxtError::InsufficientFunds { message },
                _ if first.contains("Unknown order") => CcxtError::OrderNotFound { order_id: message },
                _ if first.contains("Rate limit") => CcxtError::RateLimitExceeded {
                    message,
                    retry_after_ms: None,
                },
                "EService" => CcxtError::ExchangeNotAvailable { message },
                "EGeneral" => CcxtError::BadRequest { message },
                "EOrder" => CcxtError::InvalidOrder { message },
                _ => CcxtError::ExchangeError { message },
            });
        }
        self.result.ok_or_else(|| CcxtError::BadResponse {
            message: "No result in response".into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct KrakenDepth {
    #[serde(default)]
    bids: Vec<Vec<Decimal>>,
    #[serde(default)]
    asks: Vec<Vec<Decimal>>,
}
