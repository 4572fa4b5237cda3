//! JSON export of invocations, catalogs and capability reports

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::capabilities::CapabilityReport;
use super::catalog::Catalog;
use super::error::{PlaygroundError, PlaygroundResult};
use super::invoker::InvocationRecord;
use super::presenter::element_count;
use crate::types::ExchangeId;
use crate::utils::file_stamp;

pub const DEFAULT_OUTPUT_DIR: &str = "responses";
/// 이 크기를 넘으면 경고
pub const SIZE_WARNING_BYTES: u64 = 1024 * 1024;

/// 파일명에 안전한 문자열로 변환 (영숫자, `-`, `_` 외에는 `_`)
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// 저장 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub bytes: u64,
}

impl ExportReport {
    pub fn is_oversized(&self) -> bool {
        self.bytes > SIZE_WARNING_BYTES
    }

    /// 사람이 읽는 크기 (KB 또는 MB)
    pub fn size_label(&self) -> String {
        if self.is_oversized() {
            format!("{:.1} MB", self.bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.1} KB", self.bytes as f64 / 1024.0)
        }
    }
}

/// 응답 파일 저장기
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write<T: Serialize>(&self, filename: &str, data: &T) -> PlaygroundResult<ExportReport> {
        let path = self.dir.join(filename);
        let export_error = |message: String| PlaygroundError::ExportError {
            path: path.clone(),
            message,
        };

        let body = serde_json::to_vec_pretty(data).map_err(|e| export_error(e.to_string()))?;
        fs::create_dir_all(&self.dir).map_err(|e| export_error(e.to_string()))?;
        fs::write(&path, &body).map_err(|e| export_error(e.to_string()))?;

        let report = ExportReport {
            path: path.clone(),
            bytes: body.len() as u64,
        };
        if report.is_oversized() {
            warn!(path = %path.display(), bytes = report.bytes, "large export file");
        }
        debug!(path = %path.display(), bytes = report.bytes, "exported");
        Ok(report)
    }

    /// `ccxt_response_<exchange>_<endpoint>_<YYYYMMDD_HHMMSS>.json`
    pub fn invocation_filename(record: &InvocationRecord) -> String {
        format!(
            "ccxt_response_{}_{}_{}.json",
            sanitize(record.exchange.as_str()),
            sanitize(record.endpoint.name()),
            file_stamp(record.started_at)
        )
    }

    /// 성공한 호출의 요청 정보와 응답 저장
    pub fn export_invocation(&self, record: &InvocationRecord) -> PlaygroundResult<ExportReport> {
        let payload = record.payload().ok_or_else(|| PlaygroundError::ExportError {
            path: self.dir.clone(),
            message: "only successful responses can be exported".into(),
        })?;

        let data = json!({
            "metadata": {
                "timestamp": record.started_at.to_rfc3339(),
                "exchange": record.exchange,
                "endpoint": record.endpoint,
                "parameters": &record.args,
                "method": record.args.call_signature(record.endpoint),
                "elapsed_ms": record.elapsed.as_millis() as u64,
                "element_count": element_count(payload),
            },
            "response": payload,
        });
        self.write(&Self::invocation_filename(record), &data)
    }

    /// `ccxt_endpoints_<exchange>_<timestamp>.json`
    pub fn export_catalog(
        &self,
        exchange: ExchangeId,
        catalog: &Catalog,
        now: DateTime<Local>,
    ) -> PlaygroundResult<ExportReport> {
        let data = json!({
            "metadata": {
                "timestamp": now.to_rfc3339(),
                "exchange": exchange,
                "description": "Available endpoints information",
                "total_endpoints": catalog.total(),
            },
            "categories": catalog,
        });
        let filename = format!(
            "ccxt_endpoints_{}_{}.json",
            sanitize(exchange.as_str()),
            file_stamp(now)
        );
        self.write(&filename, &data)
    }

    /// `ccxt_capabilities_<exchange>_<timestamp>.json`
    pub fn export_capabilities(
        &self,
        exchange: ExchangeId,
        report: &CapabilityReport,
        now: DateTime<Local>,
    ) -> PlaygroundResult<ExportReport> {
        let summary = &report.summary;
        let data = json!({
            "metadata": {
                "timestamp": now.to_rfc3339(),
                "exchange": exchange,
                "description": "Endpoint capability and support information",
                "api_version": &report.info.api_version,
                "rate_limit": report.info.rate_limit_ms,
                "sandbox": report.info.sandbox,
                "summary": {
                    "total_checked": summary.total_checked,
                    "supported": summary.supported,
                    "emulated": summary.emulated,
                    "not_supported": summary.not_supported,
                    "support_percentage": summary.support_percentage(),
                    "emulated_percentage": summary.emulated_percentage(),
                },
            },
            "raw_has_dictionary": &report.raw,
            "categorized_endpoints": report.categorized(),
        });
        let filename = format!(
            "ccxt_capabilities_{}_{}.json",
            sanitize(exchange.as_str()),
            file_stamp(now)
        );
        self.write(&filename, &data)
    }
}
