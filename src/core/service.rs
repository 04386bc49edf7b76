//! Cached access to fund and index data

use crate::core::cache::{CacheKey, CacheStore, Operation, get_or_fetch};
use crate::core::config::CacheConfig;
use crate::core::fund::{
    AssetHolding, CategoryFilter, FundSummary, IndexSeries, IndustryHolding, NavSeries,
    SecurityHolding,
};
use crate::core::metrics::DateRange;
use crate::core::outcome::FetchOutcome;
use crate::core::provider::{FundDataProvider, IndexDataProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Fund short codes are matched case-insensitively.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The data access surface the dashboard talks to.
///
/// Every call goes through the cache with the TTL of its data kind and comes
/// back as a [`FetchOutcome`], so provider failures never escape as errors.
pub struct FundDataService {
    funds: Arc<dyn FundDataProvider>,
    indices: Arc<dyn IndexDataProvider>,
    store: Arc<dyn CacheStore>,
    ttls: CacheConfig,
}

impl FundDataService {
    pub fn new(
        funds: Arc<dyn FundDataProvider>,
        indices: Arc<dyn IndexDataProvider>,
        store: Arc<dyn CacheStore>,
        ttls: CacheConfig,
    ) -> Self {
        Self {
            funds,
            indices,
            store,
            ttls,
        }
    }

    pub async fn list_funds(&self, filter: CategoryFilter) -> FetchOutcome<Vec<FundSummary>> {
        let op = Operation::ListFunds;
        get_or_fetch(
            self.store.as_ref(),
            CacheKey::new(op, [filter.to_string()]),
            self.ttls.ttl(op),
            || self.funds.list_funds(filter),
        )
        .await
    }

    pub async fn nav_history(&self, fund_code: &str) -> FetchOutcome<NavSeries> {
        let op = Operation::NavHistory;
        let code = normalize_code(fund_code);
        get_or_fetch(
            self.store.as_ref(),
            CacheKey::new(op, [code.as_str()]),
            self.ttls.ttl(op),
            || self.funds.nav_history(&code),
        )
        .await
    }

    pub async fn top_holdings(&self, fund_code: &str) -> FetchOutcome<Vec<SecurityHolding>> {
        let op = Operation::TopHoldings;
        let code = normalize_code(fund_code);
        get_or_fetch(
            self.store.as_ref(),
            CacheKey::new(op, [code.as_str()]),
            self.ttls.ttl(op),
            || self.funds.top_holdings(&code),
        )
        .await
    }

    pub async fn industry_holdings(&self, fund_code: &str) -> FetchOutcome<Vec<IndustryHolding>> {
        let op = Operation::IndustryHoldings;
        let code = normalize_code(fund_code);
        get_or_fetch(
            self.store.as_ref(),
            CacheKey::new(op, [code.as_str()]),
            self.ttls.ttl(op),
            || self.funds.industry_holdings(&code),
        )
        .await
    }

    pub async fn asset_holdings(&self, fund_code: &str) -> FetchOutcome<Vec<AssetHolding>> {
        let op = Operation::AssetHoldings;
        let code = normalize_code(fund_code);
        get_or_fetch(
            self.store.as_ref(),
            CacheKey::new(op, [code.as_str()]),
            self.ttls.ttl(op),
            || self.funds.asset_holdings(&code),
        )
        .await
    }

    pub async fn index_history(&self, symbol: &str, range: &DateRange) -> FetchOutcome<IndexSeries> {
        let op = Operation::IndexHistory;
        let symbol = normalize_code(symbol);
        let key = CacheKey::new(
            op,
            [
                symbol.clone(),
                range.start.format("%Y-%m-%d").to_string(),
                range.end.format("%Y-%m-%d").to_string(),
            ],
        );
        get_or_fetch(self.store.as_ref(), key, self.ttls.ttl(op), || {
            self.indices.index_history(&symbol, range.start, range.end)
        })
        .await
    }

    /// Drops cached fund listings so the next listing call hits the provider.
    pub async fn refresh_listing(&self) -> usize {
        let removed = self.store.invalidate(Operation::ListFunds.as_str()).await;
        info!("Invalidated {} cached fund listing(s)", removed);
        removed
    }

    /// Empties the whole cache, returning how many entries were dropped.
    pub async fn clear_cache(&self) -> usize {
        let removed = self.store.len().await;
        self.store.clear().await;
        info!("Cleared {} cached response(s)", removed);
        removed
    }

    /// Short code to "CODE - Name" for every listed fund; empty when the listing is unavailable.
    pub async fn fund_labels(&self) -> HashMap<String, String> {
        match self.list_funds(CategoryFilter::All).await {
            FetchOutcome::Data(funds) => funds
                .into_iter()
                .map(|fund| (normalize_code(&fund.code), fund.label()))
                .collect(),
            other => {
                debug!("Fund labels unavailable: {:?}", other.map(|f| f.len()));
                HashMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{MockProvider, date, fund};
    use crate::store::memory::MemoryStore;
    use std::sync::atomic::Ordering;

    fn service_with(provider: MockProvider) -> (FundDataService, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        let service = FundDataService::new(
            provider.clone(),
            provider.clone(),
            Arc::new(MemoryStore::new()),
            CacheConfig::default(),
        );
        (service, provider)
    }

    #[tokio::test]
    async fn test_nav_history_is_cached_per_code() {
        let (service, provider) = service_with(
            MockProvider::default()
                .with_nav("VESAF", &[("2024-01-01", 10.0), ("2024-01-02", 11.0)]),
        );

        let first = service.nav_history("vesaf").await;
        let second = service.nav_history("VESAF").await;

        assert_eq!(first.data().map(|s| s.len()), Some(2));
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_fund_is_empty_not_failed() {
        let (service, _) = service_with(MockProvider::default());
        assert_eq!(service.nav_history("NOPE").await, FetchOutcome::Empty);
        assert_eq!(service.top_holdings("NOPE").await, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_failures_are_reported_and_retried() {
        let (service, provider) = service_with(MockProvider::default().failing("DCDS"));

        assert!(service.nav_history("DCDS").await.is_failed());
        assert!(service.nav_history("DCDS").await.is_failed());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_invalidates_listing_only() {
        let mut mock = MockProvider::default()
            .with_nav("VESAF", &[("2024-01-01", 10.0), ("2024-01-02", 11.0)]);
        mock.funds = vec![fund("VESAF", "VinaCapital Equity Special Access Fund")];
        let (service, provider) = service_with(mock);

        service.list_funds(CategoryFilter::All).await;
        service.list_funds(CategoryFilter::Equity).await;
        service.nav_history("VESAF").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

        assert_eq!(service.refresh_listing().await, 2);

        service.list_funds(CategoryFilter::All).await;
        service.nav_history("VESAF").await;
        // Listing refetched, NAV still served from cache
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_index_history_keyed_by_range() {
        let (service, provider) = service_with(
            MockProvider::default().with_index("VNINDEX", &[("2024-01-02", 1100.0), ("2024-01-03", 1110.0)]),
        );
        let range_a = DateRange::new(date("2024-01-01"), date("2024-01-31")).unwrap();
        let range_b = DateRange::new(date("2024-01-01"), date("2024-02-29")).unwrap();

        service.index_history("VNINDEX", &range_a).await;
        service.index_history("VNINDEX", &range_a).await;
        service.index_history("VNINDEX", &range_b).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fund_labels() {
        let mut mock = MockProvider::default();
        mock.funds = vec![fund("DCDS", "DC Dynamic Securities Fund")];
        let (service, _) = service_with(mock);

        let labels = service.fund_labels().await;
        assert_eq!(
            labels.get("DCDS").map(String::as_str),
            Some("DCDS - DC Dynamic Securities Fund")
        );

        let (failing, _) = service_with(MockProvider::default().failing("*"));
        assert!(failing.fund_labels().await.is_empty());
    }
}
