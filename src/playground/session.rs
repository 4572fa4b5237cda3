//! Active exchange session and in-memory credentials

use std::fmt;

use crate::types::{Exchange, ExchangeId};

pub const API_KEY_ENV: &str = "CCXT_API_KEY";
pub const SECRET_ENV: &str = "CCXT_SECRET";

/// API 인증 정보 (프로세스 메모리에만 존재)
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    secret: String,
}

impl Credentials {
    /// 키와 시크릿이 모두 비어 있으면 None
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Option<Self> {
        let credentials = Self {
            api_key: api_key.into().trim().to_string(),
            secret: secret.into().trim().to_string(),
        };
        (!credentials.is_empty()).then_some(credentials)
    }

    /// `CCXT_API_KEY` / `CCXT_SECRET` 환경 변수에서 읽기
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let secret = std::env::var(SECRET_ENV).unwrap_or_default();
        Self::new(api_key, secret)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_empty() && self.secret.is_empty()
    }

    /// 메모리 내용을 덮어쓴 뒤 비운다
    pub fn clear(&mut self) {
        for value in [&mut self.api_key, &mut self.secret] {
            let len = value.len();
            value.replace_range(.., &"0".repeat(len));
            value.clear();
        }
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &str| if v.is_empty() { "<empty>" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("api_key", &redact(&self.api_key))
            .field("secret", &redact(&self.secret))
            .finish()
    }
}

/// 현재 선택된 거래소 세션
///
/// 한 번에 하나만 존재하며 거래소 변경 또는 종료 시 `close`로 정리한다.
pub struct Session {
    exchange: ExchangeId,
    credentials: Option<Credentials>,
    client: Box<dyn Exchange>,
}

impl Session {
    pub fn new(
        exchange: ExchangeId,
        credentials: Option<Credentials>,
        client: Box<dyn Exchange>,
    ) -> Self {
        Self {
            exchange,
            credentials,
            client,
        }
    }

    pub fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    pub fn client(&self) -> &dyn Exchange {
        self.client.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// 인증 정보를 지우고 클라이언트를 해제한다
    pub fn close(mut self) {
        if let Some(credentials) = self.credentials.as_mut() {
            credentials.clear();
        }
        self.credentials = None;
        tracing::debug!(exchange = %self.exchange, "session closed");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("exchange", &self.exchange)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credentials_are_none() {
        assert!(Credentials::new("", "  ").is_none());
        assert!(Credentials::new("key", "").is_some());
    }

    #[test]
    fn test_debug_redacts() {
        let credentials = Credentials::new("visible-key", "visible-secret").unwrap();
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("visible-key"));
        assert!(!debug.contains("visible-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_clear() {
        let mut credentials = Credentials::new("k", "s").unwrap();
        credentials.clear();
        assert!(credentials.is_empty());
        assert_eq!(credentials.api_key(), "");
    }
}
