//! Invocation rendering
//!
//! 요청 파라미터 표, 응답 구조 요약, 하이라이트된 JSON 순서로 출력한다.

use crossterm::style::{Color, Stylize};
use serde_json::Value;

use super::console::{Console, Table};
use super::invoker::InvocationRecord;

/// 객체 요약에서 나열할 최대 키 수
pub const SUMMARY_KEYS: usize = 10;
/// 배열 요약에서 보여줄 샘플 키 수
pub const SAMPLE_KEYS: usize = 5;

/// 요청 정보 표 (인증 정보는 포함하지 않음)
pub fn request_table(record: &InvocationRecord) -> Table {
    let mut table = Table::new("Request Details").headers(["Field", "Value"]);
    table.row(["Exchange".to_string(), record.exchange.to_string()]);
    table.row(["Endpoint".to_string(), record.endpoint.to_string()]);
    for (name, value) in record.args.iter() {
        let shown = match value {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        };
        table.row([format!("  {name}"), shown]);
    }
    table.row(["Method".to_string(), record.args.call_signature(record.endpoint)]);
    table.row([
        "Elapsed".to_string(),
        format!("{} ms", record.elapsed.as_millis()),
    ]);
    table
}

/// 응답 구조 요약
pub fn summarize(value: &Value) -> Vec<String> {
    match value {
        Value::Null => vec!["No response data".to_string()],
        Value::Object(map) => {
            let mut lines = vec![format!("Response is an object with {} keys", map.len())];
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            if keys.len() <= SUMMARY_KEYS {
                lines.extend(keys.iter().map(|k| format!("  - {k}")));
            } else {
                lines.push(format!("  - {}...", keys[..SUMMARY_KEYS].join(", ")));
            }
            lines
        }
        Value::Array(items) => {
            let mut lines = vec![format!("Response is a list with {} items", items.len())];
            if let Some(Value::Object(first)) = items.first() {
                let sample: Vec<&str> = first.keys().take(SAMPLE_KEYS).map(String::as_str).collect();
                lines.push(format!("  - Sample keys: {}", sample.join(", ")));
            }
            lines
        }
        Value::String(s) => vec![format!("Response is a string ({} chars)", s.chars().count())],
        Value::Number(n) => vec![format!("Response is a number: {n}")],
        Value::Bool(b) => vec![format!("Response is a boolean: {b}")],
    }
}

/// 응답 원소 수 (객체는 키 수, 배열은 길이)
pub fn element_count(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Object(map) => map.len(),
        Value::Array(items) => items.len(),
        _ => 1,
    }
}

/// pretty JSON 문자열에 색을 입힌다
pub fn highlight_json(pretty: &str, color: bool) -> String {
    if !color {
        return pretty.to_string();
    }

    let chars: Vec<char> = pretty.chars().collect();
    let mut out = String::with_capacity(pretty.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                let end = (i + 1).min(chars.len());
                let token: String = chars[start..end].iter().collect();
                let is_key = chars[end..]
                    .iter()
                    .find(|c| !c.is_whitespace())
                    .is_some_and(|c| *c == ':');
                let paint = if is_key { Color::Cyan } else { Color::Green };
                out.push_str(&token.with(paint).to_string());
                i = end;
            }
            '-' | '0'..='9' => {
                let start = i;
                while i < chars.len() && matches!(chars[i], '-' | '+' | '.' | 'e' | 'E' | '0'..='9') {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                out.push_str(&token.magenta().to_string());
            }
            't' | 'f' | 'n' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                out.push_str(&token.yellow().to_string());
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// 호출 결과 전체 출력
pub fn present(console: &mut Console, record: &InvocationRecord) {
    console.blank();
    console.table(&request_table(record));

    match &record.outcome {
        Ok(payload) => {
            console.blank();
            let header = if console.color() {
                "Response:".bold().green().to_string()
            } else {
                "Response:".to_string()
            };
            console.println(header);

            for line in summarize(payload) {
                console.info(&line);
            }
            if payload.is_null() {
                return;
            }
            console.blank();
            match serde_json::to_string_pretty(payload) {
                Ok(pretty) => {
                    let highlighted = highlight_json(&pretty, console.color());
                    console.println(highlighted);
                }
                Err(_) => console.println(payload.to_string()),
            }
        }
        Err(err) => {
            console.blank();
            console.error(&format!("Error executing {}:", record.endpoint));
            console.error(&format!("  {} : {err}", err.kind()));
            if let Some(trace) = &record.trace {
                console.dim("Trace:");
                console.dim(trace);
            }
        }
    }
}
