//! Tests for the Exchange trait and the bundled backends (offline)

use ccxt_playground::client::ExchangeConfig;
use ccxt_playground::exchanges::{self, Binance, Indodax, Kraken};
use ccxt_playground::types::{Capability, Exchange, ExchangeId};
use ccxt_playground::RateLimiter;

/// Exchange trait이 객체로 쓰일 수 있는지 확인
#[test]
fn test_exchange_trait_is_object_safe() {
    fn assert_exchange<T: Exchange + 'static>(exchange: T) -> Box<dyn Exchange> {
        Box::new(exchange)
    }
    let boxed = assert_exchange(Indodax::new(ExchangeConfig::new()).unwrap());
    assert_eq!(boxed.id(), ExchangeId::Indodax);
}

/// ExchangeConfig 구조체 테스트
#[test]
fn test_exchange_config() {
    let config = ExchangeConfig::new()
        .with_api_key("test_key")
        .with_api_secret("test_secret");

    assert_eq!(config.api_key(), Some("test_key"));
    assert_eq!(config.secret(), Some("test_secret"));
    assert!(config.has_credentials());

    // Debug 출력에는 키가 보이지 않아야 함
    let shown = format!("{config:?}");
    assert!(!shown.contains("test_key"));
    assert!(!shown.contains("test_secret"));
}

#[test]
fn test_blank_credentials_are_ignored() {
    let config = ExchangeConfig::new().with_credentials("", "");
    assert!(!config.has_credentials());
    assert_eq!(config.api_key(), None);
}

/// Rate limiter 테스트
#[tokio::test]
async fn test_rate_limiter() {
    let limiter = RateLimiter::new(100);
    assert!(limiter.try_acquire(1.0));
    assert_eq!(limiter.rate_limit_ms(), 100);
}

/// Indodax 거래소 테스트
#[test]
fn test_indodax_creation() {
    let indodax = Indodax::new(ExchangeConfig::new()).unwrap();

    assert_eq!(indodax.id(), ExchangeId::Indodax);
    assert_eq!(indodax.name(), "Indodax");
    assert_eq!(indodax.has().get("spot"), Capability::Supported);
    assert_eq!(indodax.has().get("fetchTicker"), Capability::Supported);
    assert_eq!(indodax.has().get("fetchPositions"), Capability::NotSupported);
    assert!(indodax.symbols().is_empty());
}

/// Binance 거래소 테스트
#[test]
fn test_binance_creation() {
    let binance = Binance::new(ExchangeConfig::new()).unwrap();

    assert_eq!(binance.id(), ExchangeId::Binance);
    assert_eq!(binance.name(), "Binance");
    assert_eq!(binance.version(), "v3");
    assert!(binance.has().get("fetchOHLCV").is_available());
}

/// Kraken 거래소 테스트
#[test]
fn test_kraken_creation() {
    let kraken = Kraken::new(ExchangeConfig::new()).unwrap();

    assert_eq!(kraken.id(), ExchangeId::Kraken);
    assert_eq!(kraken.name(), "Kraken");
    assert!(kraken.has().get("fetchStatus").is_available());
    assert!(!kraken.is_sandbox());
}

#[test]
fn test_factory_builds_every_known_id() {
    for name in exchanges::available_exchanges() {
        let id: ExchangeId = name.parse().unwrap();
        let exchange = exchanges::create_exchange(id, ExchangeConfig::new()).unwrap();
        assert_eq!(exchange.id().as_str(), name);
    }
    assert!("mtgox".parse::<ExchangeId>().is_err());
}

/// 인증 정보 없이 private 메서드를 부르면 네트워크 전에 실패
#[tokio::test]
async fn test_private_methods_need_credentials() {
    for id in ExchangeId::ALL {
        let exchange = exchanges::create_exchange(id, ExchangeConfig::new()).unwrap();
        let err = exchange.fetch_balance().await.unwrap_err();
        assert!(err.is_auth_error(), "{id}: unexpected {err:?}");
    }
}
