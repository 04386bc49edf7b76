//! Core business logic abstractions

pub mod cache;
pub mod comparison;
pub mod config;
pub mod fund;
pub mod log;
pub mod metrics;
pub mod outcome;
pub mod provider;
pub mod service;
#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for cleaner imports
pub use fund::{
    AssetHolding, CategoryFilter, FundCategory, FundSummary, GrowthWindow, HoldingEntry,
    IndexPricePoint, IndexSeries, IndustryHolding, NavPoint, NavSeries, Observation,
    SecurityHolding,
};
pub use comparison::{Comparison, ComparisonRequest};
pub use metrics::{ComparisonTable, CumulativeReturnSeries, DateRange, Lookback};
pub use outcome::FetchOutcome;
pub use provider::{FundDataProvider, IndexDataProvider};
pub use service::FundDataService;
