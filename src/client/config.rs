//! Exchange configuration

use std::fmt;

/// 거래소 설정
#[derive(Clone)]
pub struct ExchangeConfig {
    api_key: Option<String>,
    api_secret: Option<String>,
    sandbox: bool,
    timeout_ms: u64,
    rate_limit_ms: Option<u64>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeConfig {
    /// 새로운 빈 설정 생성
    pub fn new() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            sandbox: false,
            timeout_ms: 30000,
            rate_limit_ms: None,
        }
    }

    /// API 키 설정
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// API 시크릿 설정
    pub fn with_api_secret(mut self, secret: impl Into<String>) -> Self {
        self.api_secret = Some(secret.into());
        self
    }

    /// 샌드박스 모드 설정
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// 타임아웃 설정 (밀리초)
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// 레이트 리밋 설정 (밀리초). 미설정 시 거래소 기본값 사용
    pub fn with_rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.rate_limit_ms = Some(rate_limit_ms);
        self
    }

    /// 인증 정보로 설정. 빈 문자열은 미설정으로 취급
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        let api_key = api_key.into();
        let api_secret = api_secret.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self.api_secret = (!api_secret.is_empty()).then_some(api_secret);
        self
    }

    /// 인증 정보 제거
    pub fn clear_credentials(&mut self) {
        if let Some(key) = self.api_key.as_mut() {
            key.clear();
        }
        if let Some(secret) = self.api_secret.as_mut() {
            secret.clear();
        }
        self.api_key = None;
        self.api_secret = None;
    }

    // === Getters ===

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// secret 별칭 (CCXT 호환)
    pub fn secret(&self) -> Option<&str> {
        self.api_secret.as_deref()
    }

    pub fn is_sandbox(&self) -> bool {
        self.sandbox
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn rate_limit_ms(&self) -> Option<u64> {
        self.rate_limit_ms
    }

    /// 인증 정보 유효성 확인
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some()
    }
}

// Secrets never reach log output through `{:?}`.
impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ExchangeConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("sandbox", &self.sandbox)
            .field("timeout_ms", &self.timeout_ms)
            .field("rate_limit_ms", &self.rate_limit_ms)
            .finish()
    }
}
