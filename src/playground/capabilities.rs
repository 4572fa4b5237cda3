//! Capability check over the exchange `has()` table

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Capability, Exchange};

/// 점검 대상 통합 메서드 그룹
pub const CAPABILITY_GROUPS: [(&str, &[&str]); 5] = [
    (
        "Market Data",
        &[
            "fetchMarkets",
            "fetchCurrencies",
            "fetchTicker",
            "fetchTickers",
            "fetchOrderBook",
            "fetchOHLCV",
            "fetchTrades",
            "fetchStatus",
        ],
    ),
    (
        "Trading",
        &[
            "createOrder",
            "cancelOrder",
            "cancelAllOrders",
            "editOrder",
            "fetchOrder",
            "fetchOrders",
            "fetchOpenOrders",
            "fetchClosedOrders",
        ],
    ),
    (
        "Account",
        &[
            "fetchBalance",
            "fetchMyTrades",
            "fetchLedger",
            "fetchTransactions",
            "fetchDeposits",
            "fetchWithdrawals",
            "fetchDepositAddress",
        ],
    ),
    (
        "Advanced",
        &[
            "fetchPositions",
            "fetchFundingRate",
            "fetchFundingHistory",
            "fetchBorrowRate",
            "fetchTradingFee",
            "fetchTradingFees",
        ],
    ),
    (
        "WebSocket",
        &[
            "ws",
            "watchTicker",
            "watchTickers",
            "watchOrderBook",
            "watchTrades",
            "watchOHLCV",
            "watchBalance",
            "watchOrders",
        ],
    ),
];

#[derive(Debug, Clone, Serialize)]
pub struct CapabilityGroup {
    pub name: &'static str,
    pub entries: Vec<(&'static str, Capability)>,
}

impl CapabilityGroup {
    pub fn with_status(&self, status: Capability) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .filter(move |(_, c)| *c == status)
            .map(|(name, _)| *name)
    }
}

/// 지원/에뮬레이션/미지원 집계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySummary {
    pub total_checked: usize,
    pub supported: usize,
    pub emulated: usize,
    pub not_supported: usize,
}

impl CapabilitySummary {
    fn percent(part: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (part as f64 / total as f64 * 1000.0).round() / 10.0
    }

    pub fn support_percentage(&self) -> f64 {
        Self::percent(self.supported, self.total_checked)
    }

    pub fn emulated_percentage(&self) -> f64 {
        Self::percent(self.emulated, self.total_checked)
    }

    pub fn not_supported_percentage(&self) -> f64 {
        Self::percent(self.not_supported, self.total_checked)
    }
}

/// 거래소 기본 정보
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeInfo {
    pub id: String,
    pub name: String,
    pub api_version: String,
    pub rate_limit_ms: u64,
    pub sandbox: bool,
}

/// 기능 지원 현황 보고서
#[derive(Debug, Clone)]
pub struct CapabilityReport {
    pub info: ExchangeInfo,
    pub groups: Vec<CapabilityGroup>,
    pub summary: CapabilitySummary,
    /// 원본 `has()` 테이블
    pub raw: serde_json::Value,
}

impl CapabilityReport {
    pub fn build(client: &dyn Exchange) -> Self {
        let has = client.has();
        let mut summary = CapabilitySummary::default();

        let groups = CAPABILITY_GROUPS
            .iter()
            .map(|&(name, keys)| {
                let entries: Vec<_> = keys.iter().map(|k| (*k, has.get(k))).collect();
                for (_, capability) in &entries {
                    summary.total_checked += 1;
                    match capability {
                        Capability::Supported => summary.supported += 1,
                        Capability::Emulated => summary.emulated += 1,
                        Capability::NotSupported => summary.not_supported += 1,
                    }
                }
                CapabilityGroup { name, entries }
            })
            .collect();

        Self {
            info: ExchangeInfo {
                id: client.id().to_string(),
                name: client.name().to_string(),
                api_version: client.version().to_string(),
                rate_limit_ms: client.rate_limit(),
                sandbox: client.is_sandbox(),
            },
            groups,
            summary,
            raw: serde_json::to_value(has).unwrap_or_default(),
        }
    }

    /// `{status: {group: [method, ..]}}` 형태
    pub fn categorized(&self) -> BTreeMap<&'static str, BTreeMap<&'static str, Vec<&'static str>>> {
        let statuses = [
            ("supported", Capability::Supported),
            ("emulated", Capability::Emulated),
            ("not_supported", Capability::NotSupported),
        ];
        statuses
            .into_iter()
            .map(|(label, status)| {
                let by_group = self
                    .groups
                    .iter()
                    .map(|g| (g.name, g.with_status(status).collect()))
                    .collect();
                (label, by_group)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExchangeConfig;
    use crate::exchanges::Indodax;

    #[test]
    fn test_report_counts_every_checked_method() {
        let client = Indodax::new(ExchangeConfig::new()).unwrap();
        let report = CapabilityReport::build(&client);

        let expected: usize = CAPABILITY_GROUPS.iter().map(|(_, k)| k.len()).sum();
        let s = report.summary;
        assert_eq!(s.total_checked, expected);
        assert_eq!(s.supported + s.emulated + s.not_supported, expected);
        assert!(s.supported > 0);
        assert_eq!(report.info.id, "indodax");
    }

    #[test]
    fn test_emulated_is_reported_separately() {
        let client = Indodax::new(ExchangeConfig::new()).unwrap();
        let report = CapabilityReport::build(&client);
        let market = &report.groups[0];
        assert_eq!(market.with_status(Capability::Emulated).collect::<Vec<_>>(), vec!["fetchStatus"]);

        let categorized = report.categorized();
        assert!(categorized["emulated"]["Market Data"].contains(&"fetchStatus"));
        assert!(categorized["not_supported"]["WebSocket"].contains(&"ws"));
    }

    #[test]
    fn test_percentages() {
        let summary = CapabilitySummary {
            total_checked: 3,
            supported: 1,
            emulated: 0,
            not_supported: 2,
        };
        assert_eq!(summary.support_percentage(), 33.3);
        assert_eq!(summary.not_supported_percentage(), 66.7);
        assert_eq!(CapabilitySummary::default().support_percentage(), 0.0);
    }
}
