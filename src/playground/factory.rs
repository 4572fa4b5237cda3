//! Exchange client factory

use tracing::{debug, info};

use super::error::{PlaygroundError, PlaygroundResult};
use super::session::{Credentials, Session};
use crate::client::ExchangeConfig;
use crate::errors::CcxtResult;
use crate::exchanges;
use crate::types::{Exchange, ExchangeId};

/// 선택 화면에서 먼저 보여줄 거래소
pub const POPULAR_EXCHANGES: [&str; 8] = [
    "indodax", "coinbase", "kraken", "kucoin", "okx", "bybit", "gate", "mexc",
];

pub const DEFAULT_EXCHANGE: &str = "indodax";

type Builder = fn(ExchangeId, ExchangeConfig) -> CcxtResult<Box<dyn Exchange>>;

/// 거래소 ID와 인증 정보로 세션을 만든다
#[derive(Clone, Copy)]
pub struct ExchangeFactory {
    builder: Builder,
}

impl Default for ExchangeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeFactory {
    pub fn new() -> Self {
        Self {
            builder: exchanges::create_exchange,
        }
    }

    /// 클라이언트 생성 함수를 교체 (테스트용 목 거래소 등)
    pub fn with_builder(builder: Builder) -> Self {
        Self { builder }
    }

    /// 알려진 거래소 ID (정렬됨)
    pub fn known(&self) -> Vec<&'static str> {
        exchanges::available_exchanges()
    }

    /// (인기 거래소, 나머지) 분할
    pub fn grouped(&self) -> (Vec<&'static str>, Vec<&'static str>) {
        let known = self.known();
        let popular = POPULAR_EXCHANGES
            .iter()
            .copied()
            .filter(|id| known.contains(id))
            .collect();
        let others = known
            .into_iter()
            .filter(|id| !POPULAR_EXCHANGES.contains(id))
            .collect();
        (popular, others)
    }

    pub fn resolve(&self, id: &str) -> PlaygroundResult<ExchangeId> {
        id.parse().map_err(|_| PlaygroundError::UnknownExchange {
            id: id.trim().to_string(),
        })
    }

    /// 세션 생성. 알 수 없는 ID는 클라이언트를 만들기 전에 실패한다
    pub fn open(&self, id: &str, credentials: Option<Credentials>) -> PlaygroundResult<Session> {
        let exchange = self.resolve(id)?;

        let mut config = ExchangeConfig::new();
        if let Some(credentials) = &credentials {
            config = config.with_credentials(credentials.api_key(), credentials.secret());
        }
        debug!(%exchange, ?config, "building exchange client");

        let client = (self.builder)(exchange, config)
            .map_err(|e| PlaygroundError::invocation("create_exchange", &e))?;
        info!(%exchange, authenticated = credentials.is_some(), "session opened");

        Ok(Session::new(exchange, credentials, client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_known_exchanges() {
        let factory = ExchangeFactory::new();
        for id in factory.known() {
            let session = factory.open(id, None).unwrap();
            assert_eq!(session.exchange().as_str(), id);
            assert!(!session.is_authenticated());
        }
    }

    #[test]
    fn test_open_is_case_insensitive() {
        let session = ExchangeFactory::new().open(" Indodax ", None).unwrap();
        assert_eq!(session.exchange(), ExchangeId::Indodax);
    }

    #[test]
    fn test_unknown_exchange() {
        let err = ExchangeFactory::new().open("mtgox", None).unwrap_err();
        assert!(matches!(err, PlaygroundError::UnknownExchange { ref id } if id == "mtgox"));
    }

    #[test]
    fn test_credentials_attach_to_session() {
        let credentials = Credentials::new("key", "secret");
        let session = ExchangeFactory::new().open("kraken", credentials).unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_grouped_keeps_popular_first() {
        let (popular, others) = ExchangeFactory::new().grouped();
        assert_eq!(popular, vec!["indodax", "kraken"]);
        assert_eq!(others, vec!["binance"]);
    }
}
