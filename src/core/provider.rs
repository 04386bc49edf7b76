//! Data provider abstractions

use crate::core::fund::{
    AssetHolding, CategoryFilter, FundSummary, IndexSeries, IndustryHolding, NavSeries,
    SecurityHolding,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of fund listings, NAV history and holdings.
#[async_trait]
pub trait FundDataProvider: Send + Sync {
    async fn list_funds(&self, filter: CategoryFilter) -> Result<Vec<FundSummary>>;
    async fn nav_history(&self, fund_code: &str) -> Result<NavSeries>;
    async fn top_holdings(&self, fund_code: &str) -> Result<Vec<SecurityHolding>>;
    async fn industry_holdings(&self, fund_code: &str) -> Result<Vec<IndustryHolding>>;
    async fn asset_holdings(&self, fund_code: &str) -> Result<Vec<AssetHolding>>;
}

/// Source of daily market index closes.
#[async_trait]
pub trait IndexDataProvider: Send + Sync {
    /// Closes for `symbol` between `start` and `end`, both inclusive.
    async fn index_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IndexSeries>;
}
