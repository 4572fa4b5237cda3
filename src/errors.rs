//! CCXT Error Hierarchy
//!
//! Unified error type returned by every exchange backend.

use thiserror::Error;

use crate::client::redact_url;

/// CCXT error hierarchy
///
/// Variants follow the CCXT class tree, flattened:
/// - ExchangeError
///   - AuthenticationError
///     - PermissionDenied
///   - ArgumentsRequired
///   - BadRequest
///     - BadSymbol
///   - InsufficientFunds
///   - InvalidOrder
///     - OrderNotFound
///   - NotSupported
/// - OperationFailed
///   - NetworkError
///     - RateLimitExceeded
///     - ExchangeNotAvailable
///       - OnMaintenance
///     - InvalidNonce
///     - RequestTimeout
///   - BadResponse
///     - NullResponse
#[derive(Error, Debug)]
pub enum CcxtError {
    // === ExchangeError family ===
    /// Generic exchange error
    #[error("Exchange error: {message}")]
    ExchangeError { message: String },

    /// Authentication failed (missing or invalid API key, signature, etc.)
    #[error("Authentication error: {message}")]
    AuthenticationError { message: String },

    /// API key lacks permission for the operation
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Required arguments missing
    #[error("Arguments required: {message}")]
    ArgumentsRequired { message: String },

    /// Invalid request parameters
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Invalid trading symbol
    #[error("Bad symbol: {symbol}")]
    BadSymbol { symbol: String },

    /// Not enough balance
    #[error("Insufficient funds: {message}")]
    InsufficientFunds { message: String },

    /// Generic invalid order error
    #[error("Invalid order: {message}")]
    InvalidOrder { message: String },

    /// Order not found on exchange
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Feature not supported by this exchange
    #[error("Not supported: {feature}")]
    NotSupported { feature: String },

    // === OperationFailed / NetworkError family ===
    /// Generic network error
    #[error("Network error: {url} - {message}")]
    NetworkError { url: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        message: String,
        /// Suggested retry after in milliseconds (if provided by exchange)
        retry_after_ms: Option<u64>,
    },

    /// Exchange is temporarily unavailable
    #[error("Exchange not available: {message}")]
    ExchangeNotAvailable { message: String },

    /// Exchange is under maintenance
    #[error("On maintenance: {message}")]
    OnMaintenance { message: String },

    /// Invalid nonce (request timestamp/counter issue)
    #[error("Invalid nonce: {message}")]
    InvalidNonce { message: String },

    /// Request timed out
    #[error("Request timeout: {url}")]
    RequestTimeout { url: String },

    /// Invalid response from exchange
    #[error("Bad response: {message}")]
    BadResponse { message: String },

    /// Empty/null response from exchange
    #[error("Null response from: {url}")]
    NullResponse { url: String },

    // === Parsing errors ===
    /// Failed to parse response data
    #[error("Parse error: {data_type} - {message}")]
    ParseError { data_type: String, message: String },

    /// JSON parsing error
    #[error("JSON error: {message}")]
    JsonError { message: String },
}

impl CcxtError {
    /// Returns the error code as a string constant
    pub fn code(&self) -> &'static str {
        match self {
            CcxtError::ExchangeError { .. } => "EXCHANGE_ERROR",
            CcxtError::AuthenticationError { .. } => "AUTHENTICATION_ERROR",
            CcxtError::PermissionDenied { .. } => "PERMISSION_DENIED",
            CcxtError::ArgumentsRequired { .. } => "ARGUMENTS_REQUIRED",
            CcxtError::BadRequest { .. } => "BAD_REQUEST",
            CcxtError::BadSymbol { .. } => "BAD_SYMBOL",
            CcxtError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            CcxtError::InvalidOrder { .. } => "INVALID_ORDER",
            CcxtError::OrderNotFound { .. } => "ORDER_NOT_FOUND",
            CcxtError::NotSupported { .. } => "NOT_SUPPORTED",
            CcxtError::NetworkError { .. } => "NETWORK_ERROR",
            CcxtError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            CcxtError::ExchangeNotAvailable { .. } => "EXCHANGE_NOT_AVAILABLE",
            CcxtError::OnMaintenance { .. } => "ON_MAINTENANCE",
            CcxtError::InvalidNonce { .. } => "INVALID_NONCE",
            CcxtError::RequestTimeout { .. } => "REQUEST_TIMEOUT",
            CcxtError::BadResponse { .. } => "BAD_RESPONSE",
            CcxtError::NullResponse { .. } => "NULL_RESPONSE",
            CcxtError::ParseError { .. } => "PARSE_ERROR",
            CcxtError::JsonError { .. } => "JSON_ERROR",
        }
    }

    /// CCXT class name of the error (e.g. `AuthenticationError`)
    pub fn kind(&self) -> &'static str {
        match self {
            CcxtError::ExchangeError { .. } => "ExchangeError",
            CcxtError::AuthenticationError { .. } => "AuthenticationError",
            CcxtError::PermissionDenied { .. } => "PermissionDenied",
            CcxtError::ArgumentsRequired { .. } => "ArgumentsRequired",
            CcxtError::BadRequest { .. } => "BadRequest",
            CcxtError::BadSymbol { .. } => "BadSymbol",
            CcxtError::InsufficientFunds { .. } => "InsufficientFunds",
            CcxtError::InvalidOrder { .. } => "InvalidOrder",
            CcxtError::OrderNotFound { .. } => "OrderNotFound",
            CcxtError::NotSupported { .. } => "NotSupported",
            CcxtError::NetworkError { .. } => "NetworkError",
            CcxtError::RateLimitExceeded { .. } => "RateLimitExceeded",
            CcxtError::ExchangeNotAvailable { .. } => "ExchangeNotAvailable",
            CcxtError::OnMaintenance { .. } => "OnMaintenance",
            CcxtError::InvalidNonce { .. } => "InvalidNonce",
            CcxtError::RequestTimeout { .. } => "RequestTimeout",
            CcxtError::BadResponse { .. } => "BadResponse",
            CcxtError::NullResponse { .. } => "NullResponse",
            CcxtError::ParseError { .. } => "ParseError",
            CcxtError::JsonError { .. } => "JsonError",
        }
    }

    /// Returns true if this error is temporary and the operation can be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CcxtError::NetworkError { .. }
                | CcxtError::RequestTimeout { .. }
                | CcxtError::RateLimitExceeded { .. }
                | CcxtError::ExchangeNotAvailable { .. }
                | CcxtError::OnMaintenance { .. }
                | CcxtError::InvalidNonce { .. }
        )
    }

    /// Returns true if this is an authentication-related error
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            CcxtError::AuthenticationError { .. } | CcxtError::PermissionDenied { .. }
        )
    }

    /// Maps a non-success HTTP status to the closest error class
    pub fn from_http_status(status: u16, url: &str, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("HTTP {status}: {url}")
        } else {
            format!("HTTP {status}: {body}")
        };
        match status {
            401 | 403 => CcxtError::AuthenticationError { message },
            429 => CcxtError::RateLimitExceeded {
                message,
                retry_after_ms: None,
            },
            500..=599 => CcxtError::ExchangeNotAvailable { message },
            _ => CcxtError::ExchangeError { message },
        }
    }
}

impl From<serde_json::Error> for CcxtError {
    fn from(err: serde_json::Error) -> Self {
        CcxtError::JsonError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CcxtError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(redact_url).unwrap_or_default();
        // reqwest의 Display는 쿼리까지 포함한 URL을 붙인다
        let err = err.without_url();
        if err.is_timeout() {
            CcxtError::RequestTimeout { url }
        } else if err.is_connect() {
            CcxtError::NetworkError {
                url,
                message: "Connection failed".into(),
            }
        } else {
            CcxtError::NetworkError {
                url,
                message: err.to_string(),
            }
        }
    }
}

impl From<std::io::Error> for CcxtError {
    fn from(err: std::io::Error) -> Self {
        CcxtError::NetworkError {
            url: String::new(),
            message: err.to_string(),
        }
    }
}

/// Result 타입 alias
pub type CcxtResult<T> = Result<T, CcxtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CcxtError::AuthenticationError {
            message: "Invalid API key".into(),
        };
        assert_eq!(err.code(), "AUTHENTICATION_ERROR");
        assert_eq!(err.kind(), "AuthenticationError");

        let err = CcxtError::InvalidNonce {
            message: "Nonce too small".into(),
        };
        assert_eq!(err.code(), "INVALID_NONCE");
    }

    #[test]
    fn test_retryable_errors() {
        let timeout_err = CcxtError::RequestTimeout {
            url: "https://api.example.com".into(),
        };
        assert!(timeout_err.is_retryable());

        let auth_err = CcxtError::AuthenticationError {
            message: "Invalid key".into(),
        };
        assert!(!auth_err.is_retryable());
        assert!(auth_err.is_auth_error());
    }

    #[test]
    fn test_http_status_mapping() {
        let err = CcxtError::from_http_status(401, "https://x", "");
        assert_eq!(err.code(), "AUTHENTICATION_ERROR");

        let err = CcxtError::from_http_status(429, "https://x", "slow down");
        assert_eq!(err.code(), "RATE_LIMIT_EXCEEDED");
        assert!(err.to_string().contains("slow down"));

        let err = CcxtError::from_http_status(503, "https://x", "");
        assert_eq!(err.code(), "EXCHANGE_NOT_AVAILABLE");

        let err = CcxtError::from_http_status(400, "https://x", "{\"code\":-1121}");
        assert_eq!(err.code(), "EXCHANGE_ERROR");

        // 나머지 상태 코드는 모두 거래소 에러
        for status in [404, 418, 409] {
            let err = CcxtError::from_http_status(status, "https://x", "nope");
            assert_eq!(err.code(), "EXCHANGE_ERROR", "status {status}");
            assert!(err.to_string().contains("nope"));
        }
    }
}
