//! Time utilities

use chrono::{DateTime, Local, TimeZone, Utc};

/// 현재 시간 (밀리초)
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// 현재 시간 (초)
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// 밀리초 타임스탬프를 DateTime으로 변환
pub fn ms_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// 밀리초 타임스탬프를 ISO 8601 문자열로 변환 (예: 2023-11-14T22:13:20.000Z)
pub fn ms_to_iso8601(ms: i64) -> String {
    ms_to_datetime(ms)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        .unwrap_or_default()
}

/// 파일명용 로컬 시간 문자열 (YYYYMMDD_HHMMSS)
pub fn file_stamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}
