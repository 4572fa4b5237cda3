//! HTTP client for API requests

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::ExchangeConfig;
use crate::errors::{CcxtError, CcxtResult};

/// HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// 새로운 HTTP 클라이언트 생성
    pub fn new(base_url: impl Into<String>, config: &ExchangeConfig) -> CcxtResult<Self> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms()))
            .user_agent(concat!("ccxt-playground/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CcxtError::NetworkError {
                url: base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET 요청
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<HashMap<String, String>>,
        headers: Option<HashMap<String, String>>,
    ) -> CcxtResult<T> {
        let mut request = self.request(Method::GET, path, headers);
        if let Some(params) = params {
            request = request.query(&params);
        }
        self.send(request).await
    }

    /// POST 요청 (원시 본문). 서명 대상 문자열을 그대로 전송할 때 사용
    pub async fn post_body<T: DeserializeOwned>(
        &self,
        path: &str,
        body: String,
        headers: Option<HashMap<String, String>>,
    ) -> CcxtResult<T> {
        let request = self.request(Method::POST, path, headers).body(body);
        self.send(request).await
    }

    /// DELETE 요청
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: Option<HashMap<String, String>>,
    ) -> CcxtResult<T> {
        let request = self.request(Method::DELETE, path, headers);
        self.send(request).await
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        headers: Option<HashMap<String, String>>,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);
        for (key, value) in headers.unwrap_or_default() {
            request = request.header(key, value);
        }
        request
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> CcxtResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let url = redact_url(response.url());
        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "http response");

        if !status.is_success() {
            return Err(CcxtError::from_http_status(status.as_u16(), &url, body.trim()));
        }
        if body.trim().is_empty() {
            return Err(CcxtError::NullResponse { url });
        }

        serde_json::from_str(&body).map_err(|e| CcxtError::ParseError {
            data_type: std::any::type_name::<T>().to_string(),
            message: e.to_string(),
        })
    }
}

/// 로그와 에러 메시지용 URL. 서명이 실리는 쿼리 문자열은 뺀다
pub fn redact_url(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.set_fragment(None);
    shown.to_string()
}

/// 쿼리 문자열 생성 (키 정렬, URL 인코딩)
pub fn build_query(params: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = params.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
