//! Endpoint catalog
//!
//! 클라이언트의 통합 메서드를 카테고리별로 분류한다. 이름 기반 휴리스틱이므로
//! 분류 결과는 참고용이다.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use super::endpoint::Endpoint;
use crate::types::{Capability, Exchange};

/// 엔드포인트 카테고리 (출력 순서)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Public,
    MarketData,
    Trading,
    Account,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Public,
        Category::MarketData,
        Category::Trading,
        Category::Account,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Public => "Public",
            Category::MarketData => "Market Data",
            Category::Trading => "Trading",
            Category::Account => "Account",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

const TRADING_KEYWORDS: [&str; 2] = ["order", "trade"];
const ACCOUNT_KEYWORDS: [&str; 3] = ["balance", "deposit", "withdraw"];
const MARKET_DATA_METHODS: [&str; 4] = [
    "fetch_ticker",
    "fetch_tickers",
    "fetch_order_book",
    "fetch_ohlcv",
];

/// 메서드명을 카테고리로 분류
///
/// 우선순위: Trading > Account > Market Data > Public > Other.
pub fn classify(method: &str) -> Category {
    let name = method.to_ascii_lowercase();
    if TRADING_KEYWORDS.iter().any(|k| name.contains(k)) {
        Category::Trading
    } else if ACCOUNT_KEYWORDS.iter().any(|k| name.contains(k)) {
        Category::Account
    } else if MARKET_DATA_METHODS.contains(&name.as_str()) {
        Category::MarketData
    } else if name.starts_with("fetch_") || name.starts_with("load_") {
        Category::Public
    } else {
        Category::Other
    }
}

/// 엔드포인트 설명자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    #[serde(rename = "method")]
    pub endpoint: Endpoint,
    pub category: Category,
    pub description: &'static str,
    pub capability: Capability,
}

/// 클라이언트의 엔드포인트를 순회. 호출할 때마다 처음부터 다시 계산된다
pub fn descriptors(
    client: &dyn Exchange,
) -> impl Iterator<Item = EndpointDescriptor> + Clone + '_ {
    Endpoint::ALL.into_iter().map(move |endpoint| EndpointDescriptor {
        endpoint,
        category: classify(endpoint.name()),
        description: endpoint.description(),
        capability: client.has().get(endpoint.capability_key()),
    })
}

/// 카테고리별 엔드포인트 묶음
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    groups: Vec<(Category, Vec<EndpointDescriptor>)>,
}

impl Catalog {
    pub fn build(client: &dyn Exchange) -> Self {
        Self::from_descriptors(descriptors(client))
    }

    pub fn from_descriptors(items: impl IntoIterator<Item = EndpointDescriptor>) -> Self {
        let mut groups: Vec<(Category, Vec<EndpointDescriptor>)> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
        for item in items {
            if let Some((_, group)) = groups.iter_mut().find(|(c, _)| *c == item.category) {
                group.push(item);
            }
        }
        for (_, group) in &mut groups {
            group.sort_by_key(|d| d.endpoint.name());
        }
        Self { groups }
    }

    /// 비어 있지 않은 카테고리만 순서대로
    pub fn groups(&self) -> impl Iterator<Item = (Category, &[EndpointDescriptor])> {
        self.groups
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(c, items)| (*c, items.as_slice()))
    }

    pub fn get(&self, category: Category) -> &[EndpointDescriptor] {
        self.groups
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, items)| items.as_slice())
            .unwrap_or_default()
    }

    /// 선택 화면용 전체 목록 (이름순)
    pub fn sorted(&self) -> Vec<EndpointDescriptor> {
        let mut all: Vec<EndpointDescriptor> = self
            .groups
            .iter()
            .flat_map(|(_, items)| items.iter().copied())
            .collect();
        all.sort_by_key(|d| d.endpoint.name());
        all
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (category, items) in self.groups() {
            map.serialize_entry(category.label(), items)?;
        }
        map.end()
    }
}
