//! Integration tests for error handling
//!
//! Library error classes, their codes, and how the playground wraps them.

use ccxt_playground::playground::PlaygroundError;
use ccxt_playground::{CcxtError, CcxtResult};

// === Error Type Tests ===

#[test]
fn test_error_hierarchy_exchange_errors() {
    let errors = vec![
        CcxtError::ExchangeError {
            message: "Generic error".into(),
        },
        CcxtError::AuthenticationError {
            message: "Invalid API key".into(),
        },
        CcxtError::PermissionDenied {
            message: "No permission".into(),
        },
        CcxtError::ArgumentsRequired {
            message: "Symbol required".into(),
        },
        CcxtError::BadRequest {
            message: "Invalid parameter".into(),
        },
        CcxtError::BadSymbol {
            symbol: "INVALID/PAIR".into(),
        },
        CcxtError::InsufficientFunds {
            message: "Not enough IDR".into(),
        },
        CcxtError::InvalidOrder {
            message: "Invalid amount".into(),
        },
        CcxtError::OrderNotFound {
            order_id: "12345".into(),
        },
        CcxtError::NotSupported {
            feature: "fetchDeposits".into(),
        },
    ];

    for err in errors {
        assert!(!err.code().is_empty());
        assert!(!err.is_retryable(), "Exchange errors are permanent: {err:?}");
    }
}

#[test]
fn test_error_hierarchy_network_errors() {
    let retryable = vec![
        CcxtError::NetworkError {
            url: "https://indodax.com/api".into(),
            message: "Connection failed".into(),
        },
        CcxtError::RateLimitExceeded {
            message: "Too many requests".into(),
            retry_after_ms: Some(1000),
        },
        CcxtError::ExchangeNotAvailable {
            message: "Service down".into(),
        },
        CcxtError::RequestTimeout {
            url: "https://indodax.com/api".into(),
        },
        CcxtError::OnMaintenance {
            message: "Scheduled maintenance".into(),
        },
        CcxtError::InvalidNonce {
            message: "Nonce expired".into(),
        },
    ];

    for err in retryable {
        assert!(err.is_retryable(), "Network errors should be retryable: {err:?}");
        assert!(!err.is_auth_error());
    }
}

// === Error Code Tests ===

#[test]
fn test_error_codes_and_kinds() {
    let cases: Vec<(CcxtError, &str, &str)> = vec![
        (
            CcxtError::AuthenticationError { message: "".into() },
            "AUTHENTICATION_ERROR",
            "AuthenticationError",
        ),
        (
            CcxtError::BadSymbol { symbol: "X".into() },
            "BAD_SYMBOL",
            "BadSymbol",
        ),
        (
            CcxtError::NullResponse { url: "".into() },
            "NULL_RESPONSE",
            "NullResponse",
        ),
        (
            CcxtError::ParseError {
                data_type: "Ticker".into(),
                message: "".into(),
            },
            "PARSE_ERROR",
            "ParseError",
        ),
    ];

    for (err, code, kind) in cases {
        assert_eq!(err.code(), code);
        assert_eq!(err.kind(), kind);
    }
}

#[test]
fn test_http_status_mapping() {
    assert!(CcxtError::from_http_status(403, "https://x", "").is_auth_error());
    assert!(CcxtError::from_http_status(429, "https://x", "").is_retryable());
    assert_eq!(
        CcxtError::from_http_status(404, "https://x", "").code(),
        "BAD_REQUEST"
    );
}

// === Propagation ===

fn parse_price(raw: &str) -> CcxtResult<f64> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    value["last"].as_f64().ok_or_else(|| CcxtError::ParseError {
        data_type: "Ticker".into(),
        message: "missing last".into(),
    })
}

#[test]
fn test_json_error_propagates_with_question_mark() {
    let err = parse_price("{not json").unwrap_err();
    assert_eq!(err.code(), "JSON_ERROR");

    let err = parse_price("{}").unwrap_err();
    assert_eq!(err.code(), "PARSE_ERROR");

    assert_eq!(parse_price("{\"last\": 1.5}").unwrap(), 1.5);
}

// === Playground wrapping ===

#[test]
fn test_invocation_error_keeps_library_classification() {
    let err = CcxtError::RateLimitExceeded {
        message: "slow down".into(),
        retry_after_ms: None,
    };
    let wrapped = PlaygroundError::invocation("fetch_trades", &err);

    assert_eq!(wrapped.kind(), "RateLimitExceeded");
    let text = wrapped.to_string();
    assert!(text.starts_with("fetch_trades failed with RateLimitExceeded (RATE_LIMIT_EXCEEDED)"));
    assert!(text.contains("slow down"));
}

#[test]
fn test_export_error_names_path() {
    let err = PlaygroundError::ExportError {
        path: "responses/out.json".into(),
        message: "permission denied".into(),
    };
    assert_eq!(
        err.to_string(),
        "Could not write responses/out.json: permission denied"
    );
    assert_eq!(err.kind(), "ExportError");
}
