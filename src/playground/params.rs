//! Parameter resolution and coercion
//!
//! 각 인자는 (1) 명령줄 플래그 (2) 대화형 프롬프트 (3) 고정 기본값 순서로 정해진다.

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, warn};

use super::endpoint::{Endpoint, ParamKind, ParamSpec};
use super::error::{PlaygroundError, PlaygroundResult};
use super::prompt::Prompter;
use crate::types::{OrderSide, OrderType, Timeframe};
use crate::utils::{now_ms, value_to_decimal};

pub const DEFAULT_SYMBOL: &str = "BTC/IDR";
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_TIMEFRAME: &str = "1h";
/// 심볼 프롬프트에 보여줄 마켓 수
pub const SYMBOL_HINTS: usize = 10;

/// 원문 입력을 JSON 값으로 변환
///
/// - `now` → 현재 밀리초 타임스탬프
/// - `true`/`false` (대소문자 무시) → 불리언
/// - 숫자 문자열 → 정수 또는 실수
/// - `none`, 빈 문자열 → null
/// - 그 외 → 문자열
pub fn coerce(raw: &str) -> Value {
    let text = raw.trim();
    match text.to_ascii_lowercase().as_str() {
        "" | "none" => return Value::Null,
        "now" => return Value::from(now_ms()),
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    if let Some(number) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(text.to_string())
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

/// 종류별 변환 및 검증
fn coerce_kind(spec: &ParamSpec, raw: &str) -> PlaygroundResult<Value> {
    let text = raw.trim();
    let value = coerce(text);
    if value.is_null() {
        if spec.required {
            return Err(PlaygroundError::invalid(spec.name, "a value is required"));
        }
        return Ok(Value::Null);
    }

    match spec.kind {
        ParamKind::Symbol | ParamKind::Text => Ok(Value::String(text.to_string())),
        ParamKind::Symbols => Ok(Value::Array(
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
        ParamKind::Limit => match value.as_u64().filter(|n| *n <= u64::from(u32::MAX)) {
            Some(n) => Ok(Value::from(n)),
            None => Err(PlaygroundError::invalid(
                spec.name,
                format!("expected a whole number, got {}", describe(&value)),
            )),
        },
        ParamKind::Since => match value.as_i64().filter(|n| *n >= 0) {
            Some(n) => Ok(Value::from(n)),
            None => Err(PlaygroundError::invalid(
                spec.name,
                format!("expected a millisecond timestamp or 'now', got {}", describe(&value)),
            )),
        },
        ParamKind::Flag => match value {
            Value::Bool(_) => Ok(value),
            other => Err(PlaygroundError::invalid(
                spec.name,
                format!("expected true or false, got {}", describe(&other)),
            )),
        },
        ParamKind::Number => match value_to_decimal(&value) {
            Some(d) if d > Decimal::ZERO => Ok(value),
            _ => Err(PlaygroundError::invalid(
                spec.name,
                format!("expected a positive number, got {}", describe(&value)),
            )),
        },
        ParamKind::Timeframe => text
            .parse::<Timeframe>()
            .map(|tf| Value::String(tf.as_str().to_string()))
            .map_err(|_| {
                let known: Vec<_> = Timeframe::ALL.iter().map(|t| t.as_str()).collect();
                PlaygroundError::invalid(
                    spec.name,
                    format!("unknown timeframe '{text}', use one of {}", known.join(", ")),
                )
            }),
        ParamKind::Side => text
            .parse::<OrderSide>()
            .map(|side| Value::String(side.as_str().to_string()))
            .map_err(|_| PlaygroundError::invalid(spec.name, "expected buy or sell")),
        ParamKind::OrderType => text
            .parse::<OrderType>()
            .map(|t| Value::String(t.as_str().to_string()))
            .map_err(|_| PlaygroundError::invalid(spec.name, "expected market or limit")),
    }
}

/// 고정 기본값 (플래그도 프롬프트도 없을 때)
fn hardcoded_default(spec: &ParamSpec) -> Option<String> {
    let value = match spec.kind {
        ParamKind::Symbol if spec.required => DEFAULT_SYMBOL.to_string(),
        ParamKind::Limit => DEFAULT_LIMIT.to_string(),
        ParamKind::Timeframe => DEFAULT_TIMEFRAME.to_string(),
        ParamKind::Flag => "false".to_string(),
        _ => return None,
    };
    Some(value)
}

/// 해석이 끝난 인자 (정의 순서 유지)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedArgs {
    values: Vec<(&'static str, Value)>,
}

impl ResolvedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str, value: Value) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn with(mut self, name: &'static str, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .filter(|v| !v.is_null())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 호출 표기 (예: `fetch_ticker("BTC/IDR")`)
    pub fn call_signature(&self, endpoint: Endpoint) -> String {
        let args: Vec<String> = self.values.iter().map(|(_, v)| v.to_string()).collect();
        format!("{}({})", endpoint.name(), args.join(", "))
    }

    // === typed accessors ===

    pub fn text(&self, name: &str) -> PlaygroundResult<String> {
        self.opt_text(name)
            .ok_or_else(|| PlaygroundError::invalid(name, "a value is required"))
    }

    pub fn opt_text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn opt_list(&self, name: &str) -> Option<Vec<String>> {
        let items = self.get(name)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
        )
    }

    pub fn opt_u32(&self, name: &str) -> PlaygroundResult<Option<u32>> {
        self.get(name)
            .map(|v| {
                v.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| PlaygroundError::invalid(name, "expected a whole number"))
            })
            .transpose()
    }

    pub fn opt_i64(&self, name: &str) -> PlaygroundResult<Option<i64>> {
        self.get(name)
            .map(|v| {
                v.as_i64()
                    .ok_or_else(|| PlaygroundError::invalid(name, "expected an integer"))
            })
            .transpose()
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn decimal(&self, name: &str) -> PlaygroundResult<Decimal> {
        self.opt_decimal(name)?
            .ok_or_else(|| PlaygroundError::invalid(name, "a value is required"))
    }

    pub fn opt_decimal(&self, name: &str) -> PlaygroundResult<Option<Decimal>> {
        self.get(name)
            .map(|v| {
                value_to_decimal(v).ok_or_else(|| PlaygroundError::invalid(name, "expected a number"))
            })
            .transpose()
    }

    pub fn parsed<T: FromStr>(&self, name: &str) -> PlaygroundResult<T> {
        let text = self.text(name)?;
        text.parse()
            .map_err(|_| PlaygroundError::invalid(name, format!("cannot parse '{text}'")))
    }
}

impl Serialize for ResolvedArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// 엔드포인트 인자 해석기
#[derive(Debug, Clone, Default)]
pub struct ParamResolver {
    flags: HashMap<String, String>,
    interactive: bool,
    known_symbols: Vec<String>,
}

impl ParamResolver {
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            ..Self::default()
        }
    }

    /// 명령줄에서 받은 `name=value` 값
    pub fn with_flags(mut self, flags: HashMap<String, String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.flags.insert(name.into(), value.into());
        self
    }

    /// 프롬프트 힌트용 마켓 심볼
    pub fn with_symbols(mut self, symbols: Vec<String>) -> Self {
        self.known_symbols = symbols;
        self
    }

    /// 프롬프트 제안값
    fn suggestion(&self, spec: &ParamSpec) -> String {
        match spec.kind {
            ParamKind::Symbol if spec.required => self
                .known_symbols
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            ParamKind::Since => "none".to_string(),
            _ => hardcoded_default(spec).unwrap_or_else(|| "none".to_string()),
        }
    }

    fn label(spec: &ParamSpec) -> String {
        let hint = match spec.kind {
            ParamKind::Since => " (timestamp, 'now' or 'none')",
            ParamKind::Symbols => " (comma separated, 'none' for all)",
            ParamKind::Side => " (buy/sell)",
            ParamKind::OrderType => " (market/limit)",
            ParamKind::Flag => " (true/false)",
            _ if !spec.required => " ('none' to skip)",
            _ => "",
        };
        format!("Enter {}{hint}", spec.name)
    }

    /// 엔드포인트의 모든 인자 해석
    pub async fn resolve(
        &self,
        endpoint: Endpoint,
        prompter: &mut dyn Prompter,
    ) -> PlaygroundResult<ResolvedArgs> {
        for name in self.flags.keys() {
            if !endpoint.params().iter().any(|p| p.name == name.as_str()) {
                debug!(%endpoint, param = %name, "flag not used by endpoint");
            }
        }

        let mut args = ResolvedArgs::new();
        for spec in endpoint.params() {
            let value = self.resolve_one(spec, &mut *prompter).await?;
            args.set(spec.name, value);
        }
        Ok(args)
    }

    async fn resolve_one(
        &self,
        spec: &ParamSpec,
        prompter: &mut dyn Prompter,
    ) -> PlaygroundResult<Value> {
        if let Some(raw) = self.flags.get(spec.name) {
            return coerce_kind(spec, raw);
        }

        if self.interactive {
            if spec.kind == ParamKind::Symbol && !self.known_symbols.is_empty() {
                let hints: Vec<&str> = self
                    .known_symbols
                    .iter()
                    .take(SYMBOL_HINTS)
                    .map(String::as_str)
                    .collect();
                // shown as part of the label so scripted input sees it too
                let label = format!(
                    "Available symbols: {}\n{}",
                    hints.join(", "),
                    Self::label(spec)
                );
                let raw = prompter.ask(&label, Some(&self.suggestion(spec))).await?;
                return coerce_kind(spec, &raw);
            }
            let raw = prompter
                .ask(&Self::label(spec), Some(&self.suggestion(spec)))
                .await?;
            return coerce_kind(spec, &raw);
        }

        match hardcoded_default(spec) {
            Some(raw) => coerce_kind(spec, &raw),
            None if spec.required => {
                warn!(param = spec.name, "required parameter missing in non-interactive mode");
                Err(PlaygroundError::invalid(
                    spec.name,
                    format!("required; pass --param {}=<value>", spec.name),
                ))
            }
            None => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground::prompt::ScriptedPrompter;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_coerce_now_is_current_time() {
        let before = now_ms();
        let value = coerce("now").as_i64().unwrap();
        let after = now_ms();
        assert!(value >= before && value <= after);
        assert!(coerce("NOW").is_i64());
    }

    #[test]
    fn test_coerce_scalars() {
        assert_eq!(coerce("true"), json!(true));
        assert_eq!(coerce("FALSE"), json!(false));
        assert_eq!(coerce("42"), json!(42));
        assert_eq!(coerce("0.5"), json!(0.5));
        assert_eq!(coerce("none"), Value::Null);
        assert_eq!(coerce(""), Value::Null);
        assert_eq!(coerce("BTC/IDR"), json!("BTC/IDR"));
    }

    #[tokio::test]
    async fn test_non_numeric_limit_is_invalid() {
        let resolver = ParamResolver::new(false).with_flag("limit", "ten");
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = resolver
            .resolve(Endpoint::FetchOrderBook, &mut prompter)
            .await
            .unwrap_err();
        assert!(matches!(err, PlaygroundError::InvalidParameter { ref name, .. } if name == "limit"));
    }

    #[tokio::test]
    async fn test_flags_win_over_prompts() {
        let resolver = ParamResolver::new(true)
            .with_flag("symbol", "ETH/IDR")
            .with_flag("limit", "5");
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let args = resolver.resolve(Endpoint::FetchOrderBook, &mut prompter).await.unwrap();

        assert_eq!(args.text("symbol").unwrap(), "ETH/IDR");
        assert_eq!(args.opt_u32("limit").unwrap(), Some(5));
        assert!(prompter.asked().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_defaults() {
        let resolver = ParamResolver::new(true);
        // symbol, since, limit all accept the suggestion
        let mut prompter = ScriptedPrompter::new(["", "", ""]);
        let args = resolver.resolve(Endpoint::FetchTrades, &mut prompter).await.unwrap();

        assert_eq!(args.text("symbol").unwrap(), DEFAULT_SYMBOL);
        assert_eq!(args.opt_i64("since").unwrap(), None);
        assert_eq!(args.opt_u32("limit").unwrap(), Some(DEFAULT_LIMIT));
    }

    #[tokio::test]
    async fn test_symbol_suggestion_uses_loaded_markets() {
        let resolver = ParamResolver::new(true).with_symbols(vec!["ADA/IDR".into(), "BTC/IDR".into()]);
        let mut prompter = ScriptedPrompter::new([""]);
        let args = resolver.resolve(Endpoint::FetchTicker, &mut prompter).await.unwrap();

        assert_eq!(args.text("symbol").unwrap(), "ADA/IDR");
        assert!(prompter.asked()[0].contains("ADA/IDR, BTC/IDR"));
    }

    #[tokio::test]
    async fn test_non_interactive_falls_back_to_defaults() {
        let resolver = ParamResolver::new(false);
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let args = resolver.resolve(Endpoint::FetchOhlcv, &mut prompter).await.unwrap();

        assert_eq!(args.text("symbol").unwrap(), "BTC/IDR");
        assert_eq!(args.text("timeframe").unwrap(), "1h");
        assert_eq!(args.opt_u32("limit").unwrap(), Some(10));
        assert_eq!(args.get("since"), None);
    }

    #[tokio::test]
    async fn test_non_interactive_required_without_default() {
        let resolver = ParamResolver::new(false);
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let err = resolver
            .resolve(Endpoint::FetchDepositAddress, &mut prompter)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--param code=<value>"));
    }

    #[tokio::test]
    async fn test_since_now_and_order_fields() {
        let resolver = ParamResolver::new(true);
        let mut prompter = ScriptedPrompter::new(["BTC/IDR", "limit", "BUY", "0.01", "650000000"]);
        let args = resolver.resolve(Endpoint::CreateOrder, &mut prompter).await.unwrap();

        assert_eq!(args.parsed::<OrderSide>("side").unwrap(), OrderSide::Buy);
        assert_eq!(args.parsed::<OrderType>("type").unwrap(), OrderType::Limit);
        assert_eq!(args.decimal("amount").unwrap(), Decimal::new(1, 2));
        assert_eq!(args.opt_decimal("price").unwrap(), Some(Decimal::new(650_000_000, 0)));

        let mut prompter = ScriptedPrompter::new(["BTC/IDR", "now", "none"]);
        let args = resolver.resolve(Endpoint::FetchTrades, &mut prompter).await.unwrap();
        assert!(args.opt_i64("since").unwrap().unwrap() > 0);
        assert_eq!(args.opt_u32("limit").unwrap(), None);
    }

    #[tokio::test]
    async fn test_amount_accepts_scientific_notation() {
        let resolver = ParamResolver::new(false)
            .with_flag("symbol", "BTC/IDR")
            .with_flag("type", "limit")
            .with_flag("side", "buy")
            .with_flag("amount", "1e-3")
            .with_flag("price", "6.5E8");
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let args = resolver.resolve(Endpoint::CreateOrder, &mut prompter).await.unwrap();
        assert_eq!(args.decimal("amount").unwrap(), Decimal::new(1, 3));
        assert_eq!(args.opt_decimal("price").unwrap(), Some(Decimal::new(650_000_000, 0)));

        let resolver = ParamResolver::new(false)
            .with_flag("symbol", "BTC/IDR")
            .with_flag("type", "limit")
            .with_flag("side", "buy")
            .with_flag("amount", "-1e-3");
        let err = resolver
            .resolve(Endpoint::CreateOrder, &mut prompter)
            .await
            .unwrap_err();
        assert!(matches!(err, PlaygroundError::InvalidParameter { ref name, .. } if name == "amount"));
    }

    #[tokio::test]
    async fn test_text_ids_stay_strings() {
        let resolver = ParamResolver::new(false).with_flag("id", "000123");
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        let args = resolver.resolve(Endpoint::FetchOrder, &mut prompter).await.unwrap();
        assert_eq!(args.text("id").unwrap(), "000123");
        assert_eq!(args.call_signature(Endpoint::FetchOrder), "fetch_order(\"000123\", null)");
    }

    #[test]
    fn test_serializes_in_declaration_order() {
        let args = ResolvedArgs::new()
            .with("symbol", json!("BTC/IDR"))
            .with("limit", json!(10));
        assert_eq!(
            serde_json::to_string(&args).unwrap(),
            r#"{"symbol":"BTC/IDR","limit":10}"#
        );
    }
}
