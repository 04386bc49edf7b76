use super::{get_json, http_client, post_json};
use crate::core::fund::{
    AssetHolding, CategoryFilter, FundCategory, FundSummary, GrowthWindow, IndustryHolding,
    NavPoint, NavSeries, SecurityHolding, finite,
};
use crate::core::provider::FundDataProvider;
use crate::core::service::normalize_code;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

const LISTING_PAGE_SIZE: u32 = 100;

/// Fund data from the Fmarket product API.
///
/// Fmarket addresses products by numeric id; short codes are resolved through
/// the listing endpoint once and remembered for the life of the provider.
pub struct FmarketProvider {
    base_url: String,
    client: reqwest::Client,
    product_ids: Mutex<HashMap<String, i64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListingFilter<'a> {
    types: [&'a str; 2],
    issuer_ids: [i64; 0],
    sort_order: &'a str,
    sort_field: &'a str,
    page: u32,
    page_size: u32,
    is_ipo: bool,
    fund_asset_types: Vec<&'a str>,
    bond_remain_periods: [i64; 0],
    search_field: &'a str,
    is_buy_by_reward: bool,
    third_app_ids: [i64; 0],
}

impl<'a> ListingFilter<'a> {
    fn new(filter: CategoryFilter, search: &'a str) -> Self {
        let asset_type = match filter {
            CategoryFilter::All => None,
            CategoryFilter::Equity => Some("STOCK"),
            CategoryFilter::Bond => Some("BOND"),
            CategoryFilter::Balanced => Some("BALANCED"),
        };
        Self {
            types: ["NEW_FUND", "TRADING_FUND"],
            issuer_ids: [],
            sort_order: "DESC",
            sort_field: "navTo6Months",
            page: 1,
            page_size: LISTING_PAGE_SIZE,
            is_ipo: false,
            fund_asset_types: asset_type.into_iter().collect(),
            bond_remain_periods: [],
            search_field: search,
            is_buy_by_reward: false,
            third_app_ids: [],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NavHistoryRequest {
    is_all_data: u8,
    product_id: i64,
    from_date: Option<String>,
    to_date: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    rows: Vec<ProductRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRow {
    id: i64,
    short_name: String,
    name: String,
    data_fund_asset_type: Option<AssetTypeRef>,
    owner: Option<Owner>,
    management_fee: Option<f64>,
    nav: Option<f64>,
    product_nav_change: Option<NavChange>,
}

#[derive(Debug, Deserialize)]
struct AssetTypeRef {
    code: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavChange {
    nav_to_previous: Option<f64>,
    nav_to1_months: Option<f64>,
    nav_to3_months: Option<f64>,
    nav_to6_months: Option<f64>,
    nav_to_beginning: Option<f64>,
    nav_to12_months: Option<f64>,
    nav_to24_months: Option<f64>,
    nav_to36_months: Option<f64>,
    nav_to_establish: Option<f64>,
    update_at: Option<i64>,
}

impl NavChange {
    fn growth(&self) -> BTreeMap<GrowthWindow, f64> {
        [
            (GrowthWindow::OneDay, self.nav_to_previous),
            (GrowthWindow::OneMonth, self.nav_to1_months),
            (GrowthWindow::ThreeMonths, self.nav_to3_months),
            (GrowthWindow::SixMonths, self.nav_to6_months),
            (GrowthWindow::YearToDate, self.nav_to_beginning),
            (GrowthWindow::OneYear, self.nav_to12_months),
            (GrowthWindow::TwoYears, self.nav_to24_months),
            (GrowthWindow::ThreeYears, self.nav_to36_months),
            (GrowthWindow::SinceInception, self.nav_to_establish),
        ]
        .into_iter()
        .filter_map(|(window, value)| finite(value).map(|v| (window, v)))
        .collect()
    }
}

impl From<ProductRow> for FundSummary {
    fn from(row: ProductRow) -> Self {
        let change = row.product_nav_change.unwrap_or_default();
        FundSummary {
            code: normalize_code(&row.short_name),
            name: row.name,
            category: row
                .data_fund_asset_type
                .and_then(|t| t.code.or(t.name))
                .map_or(FundCategory::Other("UNKNOWN".to_string()), |code| {
                    FundCategory::from_provider_code(&code)
                }),
            manager: row.owner.and_then(|o| o.name),
            management_fee: finite(row.management_fee),
            nav: finite(row.nav),
            growth: change.growth(),
            nav_updated_at: change.update_at.and_then(DateTime::<Utc>::from_timestamp_millis),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavRecord {
    nav_date: String,
    nav: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDetail {
    #[serde(default)]
    product_top_holding_list: Vec<TopHoldingRecord>,
    #[serde(default)]
    product_industries_holding_list: Vec<IndustryRecord>,
    #[serde(default)]
    product_asset_holding_list: Vec<AssetRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopHoldingRecord {
    stock_code: String,
    industry: Option<String>,
    net_asset_percent: Option<f64>,
    update_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndustryRecord {
    industry: String,
    asset_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetRecord {
    asset_type: AssetTypeRef,
    asset_percent: Option<f64>,
}

fn parse_nav_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse NAV date: {date_str}"))
}

impl FmarketProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client()?,
            product_ids: Mutex::new(HashMap::new()),
        })
    }

    async fn fetch_listing(&self, filter: CategoryFilter, search: &str) -> Result<Vec<ProductRow>> {
        let url = format!("{}/res/products/filter", self.base_url);
        let envelope: Envelope<ListingPage> = post_json(
            &self.client,
            &url,
            &ListingFilter::new(filter, search),
            "fund listing",
        )
        .await?;
        let rows = envelope.data.map(|page| page.rows).unwrap_or_default();

        let mut ids = self.product_ids.lock().await;
        for row in &rows {
            ids.entry(normalize_code(&row.short_name)).or_insert(row.id);
        }
        Ok(rows)
    }

    /// Product id for a short code, or `None` when the provider does not list it.
    async fn resolve_id(&self, fund_code: &str) -> Result<Option<i64>> {
        let code = normalize_code(fund_code);
        if let Some(id) = self.product_ids.lock().await.get(&code) {
            return Ok(Some(*id));
        }
        debug!("Resolving product id for {}", code);
        let rows = self
            .fetch_listing(CategoryFilter::All, &code)
            .await
            .with_context(|| format!("Failed to resolve fund code: {code}"))?;
        Ok(rows
            .iter()
            .find(|row| normalize_code(&row.short_name) == code)
            .map(|row| row.id))
    }

    async fn fetch_detail(&self, fund_code: &str) -> Result<ProductDetail> {
        let Some(id) = self.resolve_id(fund_code).await? else {
            debug!("Unknown fund code {}, no holdings", fund_code);
            return Ok(ProductDetail::default());
        };
        let url = format!("{}/res/products/{}", self.base_url, id);
        let envelope: Envelope<ProductDetail> =
            get_json(&self.client, &url, &format!("fund detail {fund_code}")).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl FundDataProvider for FmarketProvider {
    #[instrument(name = "FmarketListing", skip(self), fields(filter = %filter))]
    async fn list_funds(&self, filter: CategoryFilter) -> Result<Vec<FundSummary>> {
        let rows = self.fetch_listing(filter, "").await?;
        let mut seen = HashSet::new();
        let funds: Vec<FundSummary> = rows
            .into_iter()
            .map(FundSummary::from)
            .filter(|fund| seen.insert(fund.code.clone()))
            .collect();
        debug!("Fetched {} funds", funds.len());
        Ok(funds)
    }

    #[instrument(name = "FmarketNavHistory", skip(self), fields(fund = %fund_code))]
    async fn nav_history(&self, fund_code: &str) -> Result<NavSeries> {
        let code = normalize_code(fund_code);
        let Some(id) = self.resolve_id(&code).await? else {
            return Ok(NavSeries::new(&code, Vec::new()));
        };

        let url = format!("{}/res/product/get-nav-history", self.base_url);
        let request = NavHistoryRequest {
            is_all_data: 1,
            product_id: id,
            from_date: None,
            to_date: Utc::now().format("%Y%m%d").to_string(),
        };
        let envelope: Envelope<Vec<NavRecord>> =
            post_json(&self.client, &url, &request, &format!("NAV history {code}")).await?;

        let mut points = Vec::new();
        for record in envelope.data.unwrap_or_default() {
            if let Some(nav) = finite(record.nav) {
                points.push(NavPoint {
                    date: parse_nav_date(&record.nav_date)?,
                    nav_per_unit: nav,
                });
            }
        }
        debug!("Fetched {} NAV points for {}", points.len(), code);
        Ok(NavSeries::new(&code, points))
    }

    #[instrument(name = "FmarketTopHoldings", skip(self), fields(fund = %fund_code))]
    async fn top_holdings(&self, fund_code: &str) -> Result<Vec<SecurityHolding>> {
        let detail = self.fetch_detail(fund_code).await?;
        Ok(detail
            .product_top_holding_list
            .into_iter()
            .map(|h| SecurityHolding {
                stock_code: h.stock_code,
                industry: h.industry,
                net_asset_percent: finite(h.net_asset_percent),
                updated_at: h
                    .update_at
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(|dt| dt.date_naive()),
            })
            .collect())
    }

    #[instrument(name = "FmarketIndustryHoldings", skip(self), fields(fund = %fund_code))]
    async fn industry_holdings(&self, fund_code: &str) -> Result<Vec<IndustryHolding>> {
        let detail = self.fetch_detail(fund_code).await?;
        Ok(detail
            .product_industries_holding_list
            .into_iter()
            .map(|h| IndustryHolding {
                industry: h.industry,
                net_asset_percent: finite(h.asset_percent),
            })
            .collect())
    }

    #[instrument(name = "FmarketAssetHoldings", skip(self), fields(fund = %fund_code))]
    async fn asset_holdings(&self, fund_code: &str) -> Result<Vec<AssetHolding>> {
        let detail = self.fetch_detail(fund_code).await?;
        Ok(detail
            .product_asset_holding_list
            .into_iter()
            .map(|h| AssetHolding {
                asset_type: h
                    .asset_type
                    .name
                    .or(h.asset_type.code)
                    .unwrap_or_else(|| "Other".to_string()),
                net_asset_percent: finite(h.asset_percent),
            })
            .collect())
    }
}
