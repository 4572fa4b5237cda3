//! Indodax Exchange Implementation
//!
//! Indonesian cryptocurrency exchange (formerly Bitcoin Indonesia)

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha512;
use std::collections::HashMap;
use tracing::debug;

use super::market_cache::MarketCache;
use crate::client::{build_query, ExchangeConfig, HttpClient, RateLimiter};
use crate::errors::{CcxtError, CcxtResult};
use crate::types::{
    Balance, Balances, DepositAddress, Exchange, ExchangeFeatures, ExchangeId, ExchangeStatus,
    ExchangeUrls, Fee, Market, Order, OrderBook, OrderSide, OrderStatus, OrderType, Ticker,
    Timeframe, Trade, Transaction, TransactionStatus, TransactionType, OHLCV,
};
use crate::utils::{
    now_ms, now_secs, safe_decimal, safe_integer, safe_string, safe_timestamp, value_to_decimal,
};

type HmacSha512 = Hmac<Sha512>;

/// Indodax exchange
pub struct Indodax {
    config: ExchangeConfig,
    public: HttpClient,
    private: HttpClient,
    rate_limiter: RateLimiter,
    markets: MarketCache,
    features: ExchangeFeatures,
    urls: ExchangeUrls,
}

impl Indodax {
    const BASE_URL: &'static str = "https://indodax.com";
    const PRIVATE_URL: &'static str = "https://indodax.com/tapi";
    const RATE_LIMIT_MS: u64 = 100; // 10 requests per second

    /// Create new Indodax instance
    pub fn new(config: ExchangeConfig) -> CcxtResult<Self> {
        let public = HttpClient::new(Self::BASE_URL, &config)?;
        let private = HttpClient::new(Self::PRIVATE_URL, &config)?;
        let rate_limiter =
            RateLimiter::new(config.rate_limit_ms().unwrap_or(Self::RATE_LIMIT_MS));

        let features = ExchangeFeatures::new()
            .supported(&[
                "spot",
                "fetchMarkets",
                "fetchTime",
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
                "fetchDeposits",
                "fetchWithdrawals",
                "fetchDepositAddress",
            ])
            .emulated(&["fetchStatus"]);

        let urls = ExchangeUrls {
            api: Self::BASE_URL.into(),
            www: "https://www.indodax.com".into(),
            doc: "https://github.com/btcid/indodax-official-api-docs".into(),
        };

        Ok(Self {
            config,
            public,
            private,
            rate_limiter,
            markets: MarketCache::new(),
            features,
            urls,
        })
    }

    /// Public API request
    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<HashMap<String, String>>,
    ) -> CcxtResult<T> {
        self.rate_limiter.throttle(1.0).await;
        self.public.get(path, params, None).await
    }

    /// Private API request (`/tapi`, form body signed with HMAC-SHA512)
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

        params.insert("method".into(), method.to_string());
        params.insert("nonce".into(), now_ms().to_string());
        let body = build_query(&params);
        let signature = Self::sign_body(secret, &body)?;

        let mut headers = HashMap::new();
        headers.insert("Key".into(), api_key.to_string());
        headers.insert("Sign".into(), signature);
        headers.insert(
            "Content-Type".into(),
            "application/x-www-form-urlencoded".into(),
        );

        debug!(method, "indodax private request");
        let response: IndodaxResponse<T> = self.private.post_body("", body, Some(headers)).await?;
        response.into_result()
    }

    /// 요청 본문 서명 (hex 인코딩된 HMAC-SHA512)
    fn sign_body(secret: &str, body: &str) -> CcxtResult<String> {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).map_err(|_| {
            CcxtError::AuthenticationError {
                message: "Invalid secret key".into(),
            }
        })?;
        mac.update(body.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// 심볼로 마켓 조회 (필요 시 마켓 로드)
    async fn market(&self, symbol: &str) -> CcxtResult<Market> {
        self.load_markets(false).await?;
        self.markets.get(symbol).ok_or_else(|| CcxtError::BadSymbol {
            symbol: symbol.to_string(),
        })
    }

    /// 거래 API용 페어 ID (BTC/IDR -> btc_idr)
    fn pair_id(market: &Market) -> String {
        format!("{}_{}", market.base_id, market.quote_id)
    }

    fn market_by_pair(&self, pair: &str) -> Option<Market> {
        self.markets
            .snapshot()
            .into_values()
            .find(|m| Self::pair_id(m) == pair)
    }

    fn timeframe_id(timeframe: Timeframe) -> &'static str {
        match timeframe {
            Timeframe::Minute1 => "1",
            Timeframe::Minute5 => "5",
            Timeframe::Minute15 => "15",
            Timeframe::Minute30 => "30",
            Timeframe::Hour1 => "60",
            Timeframe::Hour4 => "240",
            Timeframe::Day1 => "1D",
            Timeframe::Week1 => "1W",
        }
    }

    fn require_symbol<'a>(symbol: Option<&'a str>, method: &str) -> CcxtResult<&'a str> {
        symbol.ok_or_else(|| CcxtError::ArgumentsRequired {
            message: format!("{method} requires a symbol argument"),
        })
    }

    fn parse_market(pair: &Value) -> Option<Market> {
        let id = safe_string(pair, "id")?;
        let base_id = safe_string(pair, "traded_currency")?;
        let quote_id = safe_string(pair, "base_currency")?;

        let mut market = Market::spot(id, &base_id, &quote_id);
        market.active = safe_integer(pair, "is_maintenance").unwrap_or(0) == 0;
        market.taker = Some(Decimal::new(3, 3)); // 0.3%
        market.maker = Some(Decimal::ZERO);
        market.precision.amount = Some(8);
        market.precision.price = safe_integer(pair, "price_round").map(|p| p as i32);
        market.limits.amount.min = safe_decimal(pair, "trade_min_traded_currency");
        market.limits.cost.min = safe_decimal(pair, "trade_min_base_currency");
        market.info = pair.clone();
        Some(market)
    }

    fn parse_ticker(data: &Value, market: &Market) -> Ticker {
        let mut ticker = Ticker::new(&market.symbol);
        if let Some(ts) = safe_timestamp(data, "server_time") {
            ticker = ticker.with_timestamp(ts);
        }
        let last = safe_decimal(data, "last");
        ticker.high = safe_decimal(data, "high");
        ticker.low = safe_decimal(data, "low");
        ticker.bid = safe_decimal(data, "buy");
        ticker.ask = safe_decimal(data, "sell");
        ticker.last = last;
        ticker.close = last;
        // volume keys carry the currency id, e.g. vol_btc / vol_idr
        ticker.base_volume = safe_decimal(data, &format!("vol_{}", market.base_id));
        ticker.quote_volume = safe_decimal(data, &format!("vol_{}", market.quote_id));
        ticker.info = data.clone();
        ticker
    }

    fn parse_trade(data: &Value, symbol: &str) -> Option<Trade> {
        let id = safe_string(data, "tid")?;
        let price = safe_decimal(data, "price")?;
        let amount = safe_decimal(data, "amount")?;
        let mut trade = Trade::new(id, symbol, price, amount);
        if let Some(ts) = safe_timestamp(data, "date") {
            trade = trade.with_timestamp(ts);
        }
        if let Some(side) = safe_string(data, "type").and_then(|s| s.parse().ok()) {
            trade = trade.with_side(side);
        }
        trade.info = data.clone();
        Some(trade)
    }

    fn parse_order(data: &Value, market: &Market) -> Order {
        let id = safe_string(data, "order_id").unwrap_or_default();
        let side = safe_string(data, "type")
            .and_then(|s| s.parse().ok())
            .unwrap_or(OrderSide::Buy);
        let price = safe_decimal(data, "price");

        // buy orders are denominated in the quote currency
        let in_base = |prefix: &str| -> Option<Decimal> {
            safe_decimal(data, &format!("{prefix}_{}", market.base_id)).or_else(|| {
                let quote = safe_decimal(data, &format!("{prefix}_{}", market.quote_id))?;
                quote.checked_div(price.filter(|p| !p.is_zero())?)
            })
        };
        let amount = in_base("order").unwrap_or_default();
        let remaining = in_base("remain");

        let status = match safe_string(data, "status").as_deref() {
            Some("filled") => OrderStatus::Closed,
            Some("cancelled") | Some("canceled") => OrderStatus::Canceled,
            _ => OrderStatus::Open,
        };

        let mut order = Order::new(id, &market.symbol, OrderType::Limit, side, amount)
            .with_price(price)
            .with_status(status);
        if let Some(ts) = safe_timestamp(data, "submit_time") {
            order = order.with_timestamp(ts);
        }
        if let Some(remaining) = remaining {
            order = order.with_filled((amount - remaining).max(Decimal::ZERO));
        }
        order.info = data.clone();
        order
    }

    fn parse_transaction(data: &Value, code: &str, tx_type: TransactionType) -> Transaction {
        let id_key = match tx_type {
            TransactionType::Deposit => "deposit_id",
            TransactionType::Withdrawal => "withdraw_id",
        };
        let amount = safe_decimal(data, "amount")
            .or_else(|| safe_decimal(data, code))
            .or_else(|| safe_decimal(data, "rp"))
            .unwrap_or_default();
        let status = match safe_string(data, "status").as_deref() {
            Some("success") => TransactionStatus::Ok,
            Some("failed") => TransactionStatus::Failed,
            Some("cancelled") | Some("canceled") => TransactionStatus::Canceled,
            _ => TransactionStatus::Pending,
        };
        let timestamp = safe_timestamp(data, "submit_time");
        let currency = code.to_uppercase();

        Transaction {
            id: safe_string(data, id_key).unwrap_or_default(),
            txid: safe_string(data, "tx"),
            timestamp,
            datetime: timestamp.map(crate::utils::ms_to_iso8601),
            network: None,
            address: safe_string(data, "withdraw_address"),
            tag: safe_string(data, "withdraw_memo"),
            tx_type,
            amount,
            fee: safe_decimal(data, "fee").map(|cost| Fee::new(cost, currency.clone())),
            currency,
            status,
            info: data.clone(),
        }
    }

    async fn fetch_transactions(
        &self,
        tx_type: TransactionType,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        let response: Value = self.private_request("transHistory", HashMap::new()).await?;
        let key = match tx_type {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdraw",
        };
        let wanted = code.map(|c| c.to_lowercase());

        let mut transactions = Vec::new();
        if let Some(groups) = response.get(key).and_then(Value::as_object) {
            for (currency, entries) in groups {
                if wanted.as_ref().is_some_and(|w| w != currency) {
                    continue;
                }
                for entry in entries.as_array().into_iter().flatten() {
                    transactions.push(Self::parse_transaction(entry, currency, tx_type));
                }
            }
        }

        transactions.retain(|t| match (since, t.timestamp) {
            (Some(since), Some(ts)) => ts >= since,
            _ => true,
        });
        transactions.sort_by_key(|t| t.timestamp);
        if let Some(limit) = limit {
            let skip = transactions.len().saturating_sub(limit as usize);
            transactions.drain(..skip);
        }
        Ok(transactions)
    }
}

#[async_trait]
impl Exchange for Indodax {
    fn id(&self) -> ExchangeId {
        ExchangeId::Indodax
    }

    fn name(&self) -> &str {
        "Indodax"
    }

    fn version(&self) -> &str {
        "2.0"
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
        debug!(count = markets.len(), "indodax markets loaded");
        self.markets.replace(markets);
        Ok(self.markets.snapshot())
    }

    async fn fetch_markets(&self) -> CcxtResult<Vec<Market>> {
        let pairs: Vec<Value> = self.public_get("/api/pairs", None).await?;
        Ok(pairs.iter().filter_map(Self::parse_market).collect())
    }

    async fn fetch_time(&self) -> CcxtResult<i64> {
        let response: Value = self.public_get("/api/server_time", None).await?;
        safe_integer(&response, "server_time").ok_or_else(|| CcxtError::BadResponse {
            message: "server_time missing".into(),
        })
    }

    async fn fetch_status(&self) -> CcxtResult<ExchangeStatus> {
        let server_time = self.fetch_time().await?;
        Ok(ExchangeStatus {
            status: "ok".into(),
            updated: Some(server_time),
            eta: None,
            info: Value::Null,
        })
    }

    async fn fetch_ticker(&self, symbol: &str) -> CcxtResult<Ticker> {
        let market = self.market(symbol).await?;
        let response: Value = self
            .public_get(&format!("/api/ticker/{}", market.id), None)
            .await?;
        let data = response.get("ticker").ok_or_else(|| CcxtError::BadResponse {
            message: format!("ticker missing for {symbol}"),
        })?;
        Ok(Self::parse_ticker(data, &market))
    }

    async fn fetch_tickers(&self, symbols: Option<&[String]>) -> CcxtResult<HashMap<String, Ticker>> {
        self.load_markets(false).await?;
        let response: Value = self.public_get("/api/ticker_all", None).await?;

        let mut tickers = HashMap::new();
        if let Some(all) = response.get("tickers").and_then(Value::as_object) {
            for (pair, data) in all {
                let Some(market) = self.market_by_pair(pair) else {
                    continue;
                };
                if symbols.is_some_and(|s| !s.contains(&market.symbol)) {
                    continue;
                }
                tickers.insert(market.symbol.clone(), Self::parse_ticker(data, &market));
            }
        }
        Ok(tickers)
    }

    async fn fetch_order_book(&self, symbol: &str, limit: Option<u32>) -> CcxtResult<OrderBook> {
        let market = self.market(symbol).await?;
        let response: IndodaxDepth = self
            .public_get(&format!("/api/depth/{}", market.id), None)
            .await?;

        let mut book = OrderBook::from_levels(symbol, &response.buy, &response.sell, limit);
        let timestamp = now_ms();
        book.timestamp = Some(timestamp);
        book.datetime = Some(crate::utils::ms_to_iso8601(timestamp));
        Ok(book)
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Trade>> {
        let market = self.market(symbol).await?;
        let response: Vec<Value> = self
            .public_get(&format!("/api/trades/{}", market.id), None)
            .await?;

        Ok(response
            .iter()
            .filter_map(|t| Self::parse_trade(t, symbol))
            .filter(|t| since.map_or(true, |s| t.timestamp.unwrap_or(0) >= s))
            .take(limit.unwrap_or(100) as usize)
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
        let limit = limit.unwrap_or(100) as i64;
        let span_secs = timeframe.to_millis() / 1000 * limit;
        let (from, to) = match since {
            Some(since) => (since / 1000, since / 1000 + span_secs),
            None => (now_secs() - span_secs, now_secs()),
        };

        let mut params = HashMap::new();
        params.insert(
            "symbol".to_string(),
            format!("{}{}", market.base, market.quote),
        );
        params.insert("tf".to_string(), Self::timeframe_id(timeframe).to_string());
        params.insert("from".to_string(), from.to_string());
        params.insert("to".to_string(), to.to_string());

        let response: Vec<Value> = self
            .public_get("/tradingview/history_v2", Some(params))
            .await?;

        Ok(response
            .iter()
            .filter_map(|c| {
                Some(OHLCV::new(
                    safe_timestamp(c, "Time")?,
                    safe_decimal(c, "Open")?,
                    safe_decimal(c, "High")?,
                    safe_decimal(c, "Low")?,
                    safe_decimal(c, "Close")?,
                    safe_decimal(c, "Volume").unwrap_or_default(),
                ))
            })
            .collect())
    }

    async fn fetch_balance(&self) -> CcxtResult<Balances> {
        let response: Value = self.private_request("getInfo", HashMap::new()).await?;

        let mut balances = Balances::new();
        let empty = serde_json::Map::new();
        let free = response
            .get("balance")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let hold = response
            .get("balance_hold")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        for (currency, amount) in free {
            let free = value_to_decimal(amount).unwrap_or_default();
            let used = hold
                .get(currency)
                .and_then(value_to_decimal)
                .unwrap_or_default();
            balances.add(currency.to_uppercase(), Balance::new(free, used));
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
        if order_type == OrderType::Market {
            return Err(CcxtError::NotSupported {
                feature: "createOrder (market)".into(),
            });
        }
        let price = price.ok_or_else(|| CcxtError::ArgumentsRequired {
            message: "Price is required for limit orders".into(),
        })?;
        let market = self.market(symbol).await?;

        let mut params = HashMap::new();
        params.insert("pair".into(), Self::pair_id(&market));
        params.insert("type".into(), side.as_str().to_string());
        params.insert("price".into(), price.to_string());
        match side {
            OrderSide::Buy => params.insert(market.quote_id.clone(), (amount * price).to_string()),
            OrderSide::Sell => params.insert(market.base_id.clone(), amount.to_string()),
        };

        let response: Value = self.private_request("trade", params).await?;
        let mut order = Order::new(
            safe_string(&response, "order_id").unwrap_or_default(),
            symbol,
            order_type,
            side,
            amount,
        )
        .with_price(Some(price))
        .with_timestamp(now_ms());
        order.info = response;
        Ok(order)
    }

    async fn cancel_order(&self, id: &str, symbol: Option<&str>) -> CcxtResult<Order> {
        let symbol = Self::require_symbol(symbol, "cancelOrder")?;
        // cancelOrder needs the order side, which only getOrder reports
        let existing = self.fetch_order(id, Some(symbol)).await?;
        let market = self.market(symbol).await?;

        let mut params = HashMap::new();
        params.insert("pair".into(), Self::pair_id(&market));
        params.insert("order_id".into(), id.to_string());
        params.insert("type".into(), existing.side.as_str().to_string());

        let response: Value = self.private_request("cancelOrder", params).await?;
        let mut order = existing.with_status(OrderStatus::Canceled);
        order.info = response;
        Ok(order)
    }

    async fn fetch_order(&self, id: &str, symbol: Option<&str>) -> CcxtResult<Order> {
        let symbol = Self::require_symbol(symbol, "fetchOrder")?;
        let market = self.market(symbol).await?;

        let mut params = HashMap::new();
        params.insert("pair".into(), Self::pair_id(&market));
        params.insert("order_id".into(), id.to_string());

        let response: Value = self.private_request("getOrder", params).await?;
        let data = response.get("order").ok_or_else(|| CcxtError::OrderNotFound {
            order_id: id.to_string(),
        })?;
        Ok(Self::parse_order(data, &market))
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        _since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Order>> {
        let mut params = HashMap::new();
        let market = match symbol {
            Some(symbol) => {
                let market = self.market(symbol).await?;
                params.insert("pair".to_string(), Self::pair_id(&market));
                Some(market)
            }
            None => {
                self.load_markets(false).await?;
                None
            }
        };

        let response: Value = self.private_request("openOrders", params).await?;
        let mut orders = Vec::new();
        match (response.get("orders"), market) {
            (Some(Value::Array(list)), Some(market)) => {
                orders.extend(list.iter().map(|o| Self::parse_order(o, &market)));
            }
            // without a pair the orders are grouped by pair id
            (Some(Value::Object(groups)), _) => {
                for (pair, list) in groups {
                    let Some(market) = self.market_by_pair(pair) else {
                        continue;
                    };
                    for o in list.as_array().into_iter().flatten() {
                        orders.push(Self::parse_order(o, &market));
                    }
                }
            }
            _ => {}
        }

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
        let symbol = Self::require_symbol(symbol, "fetchClosedOrders")?;
        let market = self.market(symbol).await?;

        let mut params = HashMap::new();
        params.insert("pair".into(), Self::pair_id(&market));
        if let Some(limit) = limit {
            params.insert("count".into(), limit.to_string());
        }
        if let Some(since) = since {
            params.insert("from".into(), (since / 1000).to_string());
        }

        let response: Value = self.private_request("orderHistory", params).await?;
        Ok(response
            .get("orders")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|o| Self::parse_order(o, &market))
            .filter(|o| !o.is_open())
            .collect())
    }

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        self.fetch_transactions(TransactionType::Deposit, code, since, limit)
            .await
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> CcxtResult<Vec<Transaction>> {
        self.fetch_transactions(TransactionType::Withdrawal, code, since, limit)
            .await
    }

    async fn fetch_deposit_address(&self, code: &str) -> CcxtResult<DepositAddress> {
        let response: Value = self.private_request("getInfo", HashMap::new()).await?;
        let key = code.to_lowercase();
        let address = response
            .get("address")
            .and_then(|a| safe_string(a, &key))
            .ok_or_else(|| CcxtError::BadRequest {
                message: format!("No deposit address for {code}"),
            })?;

        Ok(DepositAddress {
            currency: code.to_uppercase(),
            address,
            tag: None,
            network: None,
            info: Value::Null,
        })
    }
}

// === Response Types ===

#[derive(Debug, Deserialize)]
struct IndodaxResponse<T> {
    success: i32,
    #[serde(rename = "return")]
    data: Option<T>,
    error: Option<String>,
    error_code: Option<String>,
}

impl<T> IndodaxResponse<T> {
    fn into_result(self) -> CcxtResult<T> {
        if self.success == 1 {
            return self.data.ok_or_else(|| CcxtError::BadResponse {
                message: "No data in response".into(),
            });
        }
        let message = self.error.unwrap_or_else(|| "Unknown error".into());
        let code = self.error_code.unwrap_or_default();
        let lowered = message.to_lowercase();
        Err(if code == "invalid_credentials" || lowered.contains("invalid credentials") {
            CcxtError::AuthenticationError { message }
        } else if lowered.contains("insufficient") {
            CcxtError::InsufficientFunds { message }
        } else if lowered.contains("nonce") {
            CcxtError::InvalidNonce { message }
        } else if lowered.contains("order not found") {
            CcxtError::OrderNotFound { order_id: message }
        } else {
            CcxtError::ExchangeError { message }
        })
    }
}

#[derive(Debug, Deserialize)]
struct IndodaxDepth {
    #[serde(default)]
    buy: Vec<Vec<Decimal>>,
    #[serde(default)]
    sell: Vec<Vec<Decimal>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn btc_idr() -> Market {
        Market::spot("btcidr", "btc", "idr")
    }

    #[test]
    fn test_exchange_info() {
        let exchange = Indodax::new(ExchangeConfig::new()).unwrap();
        assert_eq!(exchange.id(), ExchangeId::Indodax);
        assert_eq!(exchange.name(), "Indodax");
        assert!(exchange.has().get("fetchTicker").is_available());
        assert_eq!(
            exchange.has().get("fetchStatus"),
            crate::types::Capability::Emulated
        );
        assert!(exchange.symbols().is_empty());
    }

    #[test]
    fn test_parse_market() {
        let pair = json!({
            "id": "btcidr",
            "traded_currency": "btc",
            "base_currency": "idr",
            "trade_min_traded_currency": "0.00007",
            "is_maintenance": 0
        });
        let market = Indodax::parse_market(&pair).unwrap();
        assert_eq!(market.symbol, "BTC/IDR");
        assert_eq!(Indodax::pair_id(&market), "btc_idr");
        assert!(market.active);
    }

    #[test]
    fn test_parse_ticker_reads_currency_volumes() {
        let data = json!({
            "high": "1100000000",
            "low": "1000000000",
            "vol_btc": "12.5",
            "vol_idr": "13000000000",
            "last": "1050000000",
            "buy": "1049000000",
            "sell": "1051000000",
            "server_time": 1700000000
        });
        let ticker = Indodax::parse_ticker(&data, &btc_idr());
        assert_eq!(ticker.symbol, "BTC/IDR");
        assert_eq!(ticker.last, Some(Decimal::new(1_050_000_000, 0)));
        assert_eq!(ticker.base_volume, Some(Decimal::new(125, 1)));
        assert_eq!(ticker.timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn test_parse_buy_order_in_quote_currency() {
        let data = json!({
            "order_id": "42",
            "type": "buy",
            "price": "1000",
            "order_idr": "5000",
            "remain_idr": "2000",
            "status": "open",
            "submit_time": "1700000000"
        });
        let order = Indodax::parse_order(&data, &btc_idr());
        assert_eq!(order.id, "42");
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.amount, Decimal::new(5, 0));
        assert_eq!(order.filled, Some(Decimal::new(3, 0)));
        assert!(order.is_open());
    }

    #[test]
    fn test_signature_is_hex_sha512() {
        let sig = Indodax::sign_body("secret", "method=getInfo&nonce=1").unwrap();
        assert_eq!(sig.len(), 128);
        assert_eq!(sig, Indodax::sign_body("secret", "method=getInfo&nonce=1").unwrap());
    }

    #[test]
    fn test_error_mapping() {
        let response: IndodaxResponse<Value> = serde_json::from_value(json!({
            "success": 0,
            "error": "Invalid credentials. API not found or session has expired.",
            "error_code": "invalid_credentials"
        }))
        .unwrap();
        assert!(response.into_result().unwrap_err().is_auth_error());
    }

    #[tokio::test]
    async fn test_private_call_without_credentials() {
        let exchange = Indodax::new(ExchangeConfig::new()).unwrap();
        let err = exchange.fetch_balance().await.unwrap_err();
        assert!(matches!(err, CcxtError::AuthenticationError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_order_requires_symbol() {
        let exchange = Indodax::new(ExchangeConfig::new()).unwrap();
        let err = exchange.fetch_order("1", None).await.unwrap_err();
        assert!(matches!(err, CcxtError::ArgumentsRequired { .. }));
    }
}
