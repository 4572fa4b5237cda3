//! Lenient accessors for exchange JSON payloads
//!
//! 거래소 응답은 숫자를 문자열 또는 숫자로 섞어 보내므로 양쪽을 모두 허용한다.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// 문자열 값 조회 (숫자는 문자열로 변환)
pub fn safe_string(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decimal 값 조회
pub fn safe_decimal(obj: &Value, key: &str) -> Option<Decimal> {
    value_to_decimal(obj.get(key)?)
}

/// 정수 값 조회
pub fn safe_integer(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

/// 초 단위 타임스탬프를 밀리초로 조회
pub fn safe_timestamp(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64().map(|f| (f * 1000.0) as i64),
        Value::String(s) => s.parse::<f64>().ok().map(|f| (f * 1000.0) as i64),
        _ => None,
    }
}

/// JSON 값을 Decimal로 변환
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    }
}
