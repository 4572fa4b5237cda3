//! Shared test fixtures: an offline exchange behind the `Exchange` trait

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ccxt_playground::client::ExchangeConfig;
use ccxt_playground::errors::{CcxtError, CcxtResult};
use ccxt_playground::playground::{
    Capture, Console, Driver, DriverOptions, ExchangeFactory, Prompter, ScriptedPrompter,
};
use ccxt_playground::types::{
    Balance, Balances, Exchange, ExchangeFeatures, ExchangeId, ExchangeUrls, Market, Ticker,
};

pub const MOCK_KEY: &str = "mock-api-key-123";
pub const MOCK_SECRET: &str = "mock-secret-456";

/// 네트워크 없이 고정 응답을 돌려주는 거래소
pub struct MockExchange {
    id: ExchangeId,
    authenticated: bool,
    features: ExchangeFeatures,
    urls: ExchangeUrls,
}

impl MockExchange {
    pub fn new(id: ExchangeId, authenticated: bool) -> Self {
        Self {
            id,
            authenticated,
            features: ExchangeFeatures::new()
                .supported(&["fetchMarkets", "fetchTicker", "fetchBalance"])
                .emulated(&["fetchOHLCV"]),
            urls: ExchangeUrls {
                api: "https://mock.invalid".into(),
                www: String::new(),
                doc: String::new(),
            },
        }
    }

    fn markets() -> Vec<Market> {
        vec![
            Market::spot("btc_idr", "btc", "idr"),
            Market::spot("eth_idr", "eth", "idr"),
        ]
    }
}

/// `ExchangeFactory::with_builder`용
pub fn mock_builder(id: ExchangeId, config: ExchangeConfig) -> CcxtResult<Box<dyn Exchange>> {
    Ok(Box::new(MockExchange::new(id, config.has_credentials())))
}

#[async_trait]
impl Exchange for MockExchange {
    fn id(&self) -> ExchangeId {
        self.id
    }

    fn name(&self) -> &str {
        "Mock"
    }

    fn has(&self) -> &ExchangeFeatures {
        &self.features
    }

    fn urls(&self) -> &ExchangeUrls {
        &self.urls
    }

    fn symbols(&self) -> Vec<String> {
        Self::markets().into_iter().map(|m| m.symbol).collect()
    }

    async fn load_markets(&self, _reload: bool) -> CcxtResult<HashMap<String, Market>> {
        Ok(Self::markets()
            .into_iter()
            .map(|m| (m.symbol.clone(), m))
            .collect())
    }

    async fn fetch_markets(&self) -> CcxtResult<Vec<Market>> {
        Ok(Self::markets())
    }

    async fn fetch_ticker(&self, symbol: &str) -> CcxtResult<Ticker> {
        if !self.symbols().iter().any(|s| s == symbol) {
            return Err(CcxtError::BadSymbol {
                symbol: symbol.into(),
            });
        }
        let mut ticker = Ticker::new(symbol);
        ticker.last = Some(Decimal::new(1_000_000_000, 0));
        ticker.base_volume = Some(Decimal::new(125, 1));
        Ok(ticker)
    }

    /// 응답이 오지 않는 호출 (취소 경로용)
    async fn fetch_time(&self) -> CcxtResult<i64> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(0)
    }

    async fn fetch_balance(&self) -> CcxtResult<Balances> {
        if !self.authenticated {
            return Err(CcxtError::AuthenticationError {
                message: "fetchBalance requires apiKey and secret credentials".into(),
            });
        }
        let mut balances = Balances::new();
        balances.add("IDR", Balance::new(Decimal::new(50_000, 0), Decimal::ZERO));
        Ok(balances)
    }
}

/// 목 거래소와 캡처 콘솔로 드라이버 구성
pub fn driver(
    answers: &[&str],
    options: DriverOptions,
) -> (Driver<ScriptedPrompter>, Capture) {
    driver_with(ScriptedPrompter::new(answers.iter().copied()), options)
}

pub fn driver_with<P: Prompter>(prompter: P, options: DriverOptions) -> (Driver<P>, Capture) {
    let (console, capture) = Console::captured();
    let driver = Driver::new(console, prompter, options)
        .with_factory(ExchangeFactory::with_builder(mock_builder));
    (driver, capture)
}

/// TRACE까지 모든 로그를 모으는 버퍼. 가드가 살아 있는 동안만 현재 스레드에 설치된다
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let sink = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
