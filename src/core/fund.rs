//! Fund, holding and price series types

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundCategory {
    Equity,
    Bond,
    Balanced,
    /// Provider category outside the three the dashboard filters on.
    Other(String),
}

impl FundCategory {
    /// Maps a provider asset type code (`STOCK`, `BOND`, `BALANCED`).
    pub fn from_provider_code(code: &str) -> Self {
        match code.to_uppercase().as_str() {
            "STOCK" => FundCategory::Equity,
            "BOND" => FundCategory::Bond,
            "BALANCED" => FundCategory::Balanced,
            other => FundCategory::Other(other.to_string()),
        }
    }
}

impl Display for FundCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FundCategory::Equity => write!(f, "Equity"),
            FundCategory::Bond => write!(f, "Bond"),
            FundCategory::Balanced => write!(f, "Balanced"),
            FundCategory::Other(code) => write!(f, "{code}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Equity,
    Bond,
    Balanced,
}

impl CategoryFilter {
    pub fn category(&self) -> Option<FundCategory> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Equity => Some(FundCategory::Equity),
            CategoryFilter::Bond => Some(FundCategory::Bond),
            CategoryFilter::Balanced => Some(FundCategory::Balanced),
        }
    }
}

impl Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CategoryFilter::All => "all",
                CategoryFilter::Equity => "equity",
                CategoryFilter::Bond => "bond",
                CategoryFilter::Balanced => "balanced",
            }
        )
    }
}

impl FromStr for CategoryFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "" => Ok(CategoryFilter::All),
            "equity" | "stock" => Ok(CategoryFilter::Equity),
            "bond" => Ok(CategoryFilter::Bond),
            "balanced" => Ok(CategoryFilter::Balanced),
            _ => Err(anyhow!("Invalid fund category: {}", s)),
        }
    }
}

/// Trailing windows the provider reports NAV growth for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum GrowthWindow {
    OneDay,
    OneMonth,
    ThreeMonths,
    SixMonths,
    YearToDate,
    OneYear,
    TwoYears,
    ThreeYears,
    SinceInception,
}

impl Display for GrowthWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GrowthWindow::OneDay => "1D",
                GrowthWindow::OneMonth => "1M",
                GrowthWindow::ThreeMonths => "3M",
                GrowthWindow::SixMonths => "6M",
                GrowthWindow::YearToDate => "YTD",
                GrowthWindow::OneYear => "1Y",
                GrowthWindow::TwoYears => "2Y",
                GrowthWindow::ThreeYears => "3Y",
                GrowthWindow::SinceInception => "Inception",
            }
        )
    }
}

/// Snapshot of one fund from a listing fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundSummary {
    pub code: String,
    pub name: String,
    pub category: FundCategory,
    pub manager: Option<String>,
    pub management_fee: Option<f64>,
    pub nav: Option<f64>,
    /// Growth in percent per window. A missing key means the provider had no value.
    pub growth: BTreeMap<GrowthWindow, f64>,
    pub nav_updated_at: Option<DateTime<Utc>>,
}

impl FundSummary {
    pub fn growth(&self, window: GrowthWindow) -> Option<f64> {
        self.growth.get(&window).copied()
    }

    /// "CODE - Name", the label used in selectors and comparison headers.
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// A dated observation, shared by NAV and index series so the metrics work on both.
pub trait Observation {
    fn date(&self) -> NaiveDate;
    fn value(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav_per_unit: f64,
}

impl Observation for NavPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.nav_per_unit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPricePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub symbol: String,
}

impl Observation for IndexPricePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.close
    }
}

/// Sorts by date and keeps the last value seen for a repeated date.
fn sorted_unique<P: Observation>(mut points: Vec<P>) -> Vec<P> {
    points.reverse();
    points.sort_by_key(|p| p.date());
    points.dedup_by_key(|p| p.date());
    points
}

/// NAV history of one fund, ascending by date with unique dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavSeries {
    pub code: String,
    points: Vec<NavPoint>,
}

impl NavSeries {
    pub fn new(code: &str, points: Vec<NavPoint>) -> Self {
        Self {
            code: code.to_string(),
            points: sorted_unique(points),
        }
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&NavPoint> {
        self.points.last()
    }
}

/// Closing prices of one market index, ascending by date with unique dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSeries {
    pub symbol: String,
    points: Vec<IndexPricePoint>,
}

impl IndexSeries {
    pub fn new(symbol: &str, points: Vec<IndexPricePoint>) -> Self {
        Self {
            symbol: symbol.to_string(),
            points: sorted_unique(points),
        }
    }

    pub fn points(&self) -> &[IndexPricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityHolding {
    pub stock_code: String,
    pub industry: Option<String>,
    pub net_asset_percent: Option<f64>,
    pub updated_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryHolding {
    pub industry: String,
    pub net_asset_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetHolding {
    pub asset_type: String,
    pub net_asset_percent: Option<f64>,
}

/// One line of a fund's composition, whichever breakdown it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum HoldingEntry {
    Security(SecurityHolding),
    Industry(IndustryHolding),
    Asset(AssetHolding),
}

impl HoldingEntry {
    pub fn label(&self) -> &str {
        match self {
            HoldingEntry::Security(h) => &h.stock_code,
            HoldingEntry::Industry(h) => &h.industry,
            HoldingEntry::Asset(h) => &h.asset_type,
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            HoldingEntry::Security(h) => h.net_asset_percent,
            HoldingEntry::Industry(h) => h.net_asset_percent,
            HoldingEntry::Asset(h) => h.net_asset_percent,
        }
    }
}

impl From<SecurityHolding> for HoldingEntry {
    fn from(h: SecurityHolding) -> Self {
        HoldingEntry::Security(h)
    }
}

impl From<IndustryHolding> for HoldingEntry {
    fn from(h: IndustryHolding) -> Self {
        HoldingEntry::Industry(h)
    }
}

impl From<AssetHolding> for HoldingEntry {
    fn from(h: AssetHolding) -> Self {
        HoldingEntry::Asset(h)
    }
}

/// Drops NaN and infinities so they surface as missing rather than as bogus numbers.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
