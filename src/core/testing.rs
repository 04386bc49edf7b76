//! In-memory providers for unit tests

use crate::core::fund::{
    AssetHolding, CategoryFilter, FundCategory, FundSummary, IndexPricePoint, IndexSeries,
    IndustryHolding, NavPoint, NavSeries, SecurityHolding,
};
use crate::core::provider::{FundDataProvider, IndexDataProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn fund(code: &str, name: &str) -> FundSummary {
    FundSummary {
        code: code.to_string(),
        name: name.to_string(),
        category: FundCategory::Equity,
        manager: Some("Test Asset Management".to_string()),
        management_fee: Some(1.5),
        nav: Some(25_000.0),
        growth: BTreeMap::new(),
        nav_updated_at: None,
    }
}

/// Serves canned data and counts provider calls. A code or symbol marked
/// failing (or `*` for everything) makes the call error.
#[derive(Default)]
pub struct MockProvider {
    pub funds: Vec<FundSummary>,
    pub navs: HashMap<String, Vec<(NaiveDate, f64)>>,
    pub indices: HashMap<String, Vec<(NaiveDate, f64)>>,
    pub top: HashMap<String, Vec<SecurityHolding>>,
    pub failing: HashSet<String>,
    pub calls: AtomicUsize,
}

impl MockProvider {
    pub fn with_nav(mut self, code: &str, points: &[(&str, f64)]) -> Self {
        self.navs.insert(
            code.to_string(),
            points.iter().map(|(d, v)| (date(d), *v)).collect(),
        );
        self
    }

    pub fn with_index(mut self, symbol: &str, points: &[(&str, f64)]) -> Self {
        self.indices.insert(
            symbol.to_string(),
            points.iter().map(|(d, v)| (date(d), *v)).collect(),
        );
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    fn call(&self, id: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(id) || self.failing.contains("*") {
            return Err(anyhow!("mock provider failure for {id}"));
        }
        Ok(())
    }
}

#[async_trait]
impl FundDataProvider for MockProvider {
    async fn list_funds(&self, filter: CategoryFilter) -> Result<Vec<FundSummary>> {
        self.call("listing")?;
        Ok(self
            .funds
            .iter()
            .filter(|f| filter.category().is_none_or(|c| c == f.category))
            .cloned()
            .collect())
    }

    async fn nav_history(&self, fund_code: &str) -> Result<NavSeries> {
        self.call(fund_code)?;
        let points = self
            .navs
            .get(fund_code)
            .map(|points| {
                points
                    .iter()
                    .map(|(date, nav)| NavPoint {
                        date: *date,
                        nav_per_unit: *nav,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(NavSeries::new(fund_code, points))
    }

    async fn top_holdings(&self, fund_code: &str) -> Result<Vec<SecurityHolding>> {
        self.call(fund_code)?;
        Ok(self.top.get(fund_code).cloned().unwrap_or_default())
    }

    async fn industry_holdings(&self, fund_code: &str) -> Result<Vec<IndustryHolding>> {
        self.call(fund_code)?;
        Ok(Vec::new())
    }

    async fn asset_holdings(&self, fund_code: &str) -> Result<Vec<AssetHolding>> {
        self.call(fund_code)?;
        Ok(Vec::new())
    }
}

#[async_trait]
impl IndexDataProvider for MockProvider {
    async fn index_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IndexSeries> {
        self.call(symbol)?;
        let points = self
            .indices
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|(date, _)| start <= *date && *date <= end)
                    .map(|(date, close)| IndexPricePoint {
                        date: *date,
                        close: *close,
                        symbol: symbol.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(IndexSeries::new(symbol, points))
    }
}
