//! Live API Integration Tests
//!
//! These tests make actual public API calls to the bundled exchanges.
//! They are ignored by default to avoid rate limiting and network issues in CI.
//!
//! Run these tests manually with:
//! ```bash
//! cargo test --features live --test live_api_tests -- --ignored --test-threads=1
//! ```

#![cfg(feature = "live")]

use ccxt_playground::exchanges::{Binance, Indodax, Kraken};
use ccxt_playground::playground::{Console, Driver, DriverOptions, RunStatus, ScriptedPrompter};
use ccxt_playground::types::{Exchange, Timeframe};
use ccxt_playground::ExchangeConfig;
use std::time::Duration;
use tokio::time::sleep;

/// Helper to add delay between API calls to avoid rate limiting
async fn rate_limit_delay() {
    sleep(Duration::from_millis(500)).await;
}

// =============================================================================
// Indodax
// =============================================================================

#[tokio::test]
#[ignore]
async fn test_indodax_markets_and_ticker() {
    let exchange = Indodax::new(ExchangeConfig::new()).unwrap();

    let markets = exchange.load_markets(false).await.unwrap();
    assert!(markets.contains_key("BTC/IDR"), "BTC/IDR market not found");
    rate_limit_delay().await;

    let ticker = exchange.fetch_ticker("BTC/IDR").await.unwrap();
    assert_eq!(ticker.symbol, "BTC/IDR");
    assert!(ticker.last.is_some(), "Ticker missing last price");
}

#[tokio::test]
#[ignore]
async fn test_indodax_order_book() {
    let exchange = Indodax::new(ExchangeConfig::new()).unwrap();
    let book = exchange.fetch_order_book("BTC/IDR", Some(10)).await.unwrap();
    assert!(!book.bids.is_empty());
    assert!(!book.asks.is_empty());
}

// =============================================================================
// Kraken / Binance
// =============================================================================

#[tokio::test]
#[ignore]
async fn test_kraken_time_and_ohlcv() {
    let exchange = Kraken::new(ExchangeConfig::new()).unwrap();

    let time = exchange.fetch_time().await.unwrap();
    assert!(time > 1_600_000_000_000);
    rate_limit_delay().await;

    let candles = exchange
        .fetch_ohlcv("BTC/USD", Timeframe::Hour1, None, Some(5))
        .await
        .unwrap();
    assert!(!candles.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_binance_ticker() {
    let exchange = Binance::new(ExchangeConfig::new()).unwrap();
    let ticker = exchange.fetch_ticker("BTC/USDT").await.unwrap();
    assert_eq!(ticker.symbol, "BTC/USDT");
}

// =============================================================================
// Driver end to end
// =============================================================================

#[tokio::test]
#[ignore]
async fn test_single_shot_against_indodax() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = DriverOptions::new();
    options.exchange = Some("indodax".into());
    options.endpoint = Some("fetch_ticker".into());
    options.output_dir = dir.path().to_path_buf();
    options.export = true;

    let (console, capture) = Console::captured();
    let prompter = ScriptedPrompter::new(Vec::<String>::new()).non_interactive();
    let mut driver = Driver::new(console, prompter, options);

    assert_eq!(driver.run().await.unwrap(), RunStatus::Completed);
    assert!(capture.contents().contains("Response saved to"));
}
